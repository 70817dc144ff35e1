//! Entity ↔ domain model conversion for SeaOrmStorage

use migration::entities::{click, conversion, goal, registration, transaction};
use sea_orm::Set;

use crate::errors::{AfftrackError, Result};
use crate::storage::models::{
    Click, Conversion, ConversionStatus, Goal, LandingKind, Registration, Transaction,
};

pub fn click_from_model(model: click::Model) -> Click {
    Click {
        uuid: model.uuid,
        advertiser_id: model.advertiser_id,
        offer_id: model.offer_id,
        country_id: model.country_id,
        user_id: model.user_id,
        session_hash: model.session_hash,
        created_at: model.created_at,
    }
}

pub fn goal_from_model(model: goal::Model) -> Goal {
    Goal {
        id: model.id,
        offer_id: model.offer_id,
        user_id: model.user_id,
        country_id: model.country_id,
        goal_id: model.goal_id,
        created_at: model.created_at,
    }
}

pub fn registration_from_model(model: registration::Model) -> Registration {
    Registration {
        id: model.id,
        customer_id: model.customer_id,
        provider_ref: model.provider_ref,
        click_uuid: model.click_uuid,
        transaction_uuid: model.transaction_uuid,
        created_at: model.created_at,
    }
}

pub fn conversion_from_model(model: conversion::Model) -> Result<Conversion> {
    let status = ConversionStatus::parse(&model.status).ok_or_else(|| {
        AfftrackError::database_operation(format!(
            "conversions.status holds unknown value '{}' for click {}",
            model.status, model.click_uuid
        ))
    })?;

    Ok(Conversion {
        click_uuid: model.click_uuid,
        advertiser_id: model.advertiser_id,
        adv_internal_id: model.adv_internal_id,
        status,
        payout: model.payout,
        created_at: model.created_at,
        approved_at: model.approved_at,
        rejected_at: model.rejected_at,
    })
}

pub fn transaction_from_model(model: transaction::Model) -> Result<Transaction> {
    let payload = serde_json::from_str(&model.payload)
        .map_err(|e| AfftrackError::serialization(format!("transaction payload: {}", e)))?;
    let landing_kind =
        LandingKind::parse(&model.landing_kind).unwrap_or(LandingKind::Standard);

    Ok(Transaction {
        uuid: model.uuid,
        click_uuid: model.click_uuid,
        offer_id: model.offer_id,
        country_id: model.country_id,
        user_id: model.user_id,
        goal_id: model.goal_id,
        client_ip: model.client_ip,
        landing_kind,
        payload,
        created_at: model.created_at,
    })
}

pub fn transaction_to_active_model(tx: &Transaction) -> Result<transaction::ActiveModel> {
    let payload = serde_json::to_string(&tx.payload)
        .map_err(|e| AfftrackError::serialization(format!("transaction payload: {}", e)))?;

    Ok(transaction::ActiveModel {
        uuid: Set(tx.uuid.clone()),
        click_uuid: Set(tx.click_uuid.clone()),
        offer_id: Set(tx.offer_id),
        country_id: Set(tx.country_id),
        user_id: Set(tx.user_id),
        goal_id: Set(tx.goal_id),
        client_ip: Set(tx.client_ip.clone()),
        landing_kind: Set(tx.landing_kind.as_str().to_string()),
        payload: Set(payload),
        created_at: Set(tx.created_at),
    })
}
