//! Broker registration dispatch
//!
//! Builds the transaction for an inbound registration request, resolves
//! the goal, runs the broker round and classifies the result. Success
//! persists the Registration row and the Pending conversion.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, warn};

use crate::api::jwt::get_jwt_service;
use crate::client::{BrokerGateway, BrokerReplyStatus};
use crate::errors::{AfftrackError, Result};
use crate::services::GoalResolver;
use crate::storage::{
    ClickStore, ConversionStore, LandingKind, NewRegistration, Registration, RegistrationStore,
    Transaction, TransactionStore,
};

// ============ Request/Outcome DTOs ============

/// Validated registration submission
#[derive(Debug, Clone)]
pub struct RegistrationRequest {
    /// Click this registration attempt belongs to
    pub click_uuid: String,
    pub landing_kind: LandingKind,
    /// Real client IP, forwarded to the brokers for risk checks
    pub client_ip: Option<String>,
    /// Broker-specific fields, already validated at the edge
    pub fields: serde_json::Value,
}

/// Classified result of a broker dispatch
#[derive(Debug, Clone)]
pub enum RegistrationOutcome {
    Success {
        registration: Registration,
        /// One-time auto-login URL for landings that require it
        redirect_url: Option<String>,
    },
    NoBrokerAvailable,
    AllBrokersRejected,
    FraudDetected,
}

// ============ RegistrationService Implementation ============

pub struct RegistrationService {
    clicks: Arc<dyn ClickStore>,
    transactions: Arc<dyn TransactionStore>,
    registrations: Arc<dyn RegistrationStore>,
    conversions: Arc<dyn ConversionStore>,
    goal_resolver: GoalResolver,
    broker: Arc<dyn BrokerGateway>,
}

impl RegistrationService {
    pub fn new(
        clicks: Arc<dyn ClickStore>,
        transactions: Arc<dyn TransactionStore>,
        registrations: Arc<dyn RegistrationStore>,
        conversions: Arc<dyn ConversionStore>,
        goal_resolver: GoalResolver,
        broker: Arc<dyn BrokerGateway>,
    ) -> Self {
        Self {
            clicks,
            transactions,
            registrations,
            conversions,
            goal_resolver,
            broker,
        }
    }

    /// Handle a registration submission end to end
    pub async fn register(&self, req: RegistrationRequest) -> Result<RegistrationOutcome> {
        let click = self
            .clicks
            .find_click(&req.click_uuid)
            .await?
            .ok_or_else(|| {
                AfftrackError::validation(format!("Click '{}' is not known", req.click_uuid))
            })?;

        let mut tx = Transaction {
            uuid: uuid::Uuid::new_v4().to_string(),
            click_uuid: click.uuid.clone(),
            offer_id: click.offer_id,
            country_id: click.country_id,
            user_id: click.user_id,
            goal_id: None,
            client_ip: req.client_ip,
            landing_kind: req.landing_kind,
            payload: req.fields,
            created_at: Utc::now(),
        };
        self.transactions.insert_transaction(&tx).await?;

        // goal 在创建后补挂；找不到 goal 直接失败，不打扰 broker
        let goal_id = self
            .goal_resolver
            .resolve(click.offer_id, click.user_id, click.country_id)
            .await?;
        self.transactions.attach_goal(&tx.uuid, goal_id).await?;
        tx.goal_id = Some(goal_id);

        self.dispatch(&tx, click.advertiser_id).await
    }

    /// Run the broker round for an existing transaction and classify.
    ///
    /// Technical failures from the gateway propagate as errors — the
    /// HTTP layer logs them with the submitted payload and answers with
    /// a generic server error. Business outcomes come back as values.
    pub async fn dispatch(
        &self,
        tx: &Transaction,
        advertiser_id: i64,
    ) -> Result<RegistrationOutcome> {
        let reply = self.broker.register(tx, &tx.payload).await?;

        match reply.status {
            BrokerReplyStatus::NoBrokers => Ok(RegistrationOutcome::NoBrokerAvailable),
            BrokerReplyStatus::AllRejected => Ok(RegistrationOutcome::AllBrokersRejected),
            BrokerReplyStatus::Fraud => Ok(RegistrationOutcome::FraudDetected),
            BrokerReplyStatus::Registered => {
                let customer_id = reply.customer_id.ok_or_else(|| {
                    AfftrackError::broker_gateway(
                        "registered reply is missing customer_id".to_string(),
                    )
                })?;
                let provider_ref = reply.provider_ref.ok_or_else(|| {
                    AfftrackError::broker_gateway(
                        "registered reply is missing provider_ref".to_string(),
                    )
                })?;

                let registration = self
                    .registrations
                    .upsert_registration(NewRegistration {
                        customer_id,
                        provider_ref,
                        click_uuid: tx.click_uuid.clone(),
                        transaction_uuid: tx.uuid.clone(),
                    })
                    .await?;

                // Conversion 从 Pending 起步；deposit webhook 之后再推进
                self.conversions
                    .create_pending(&tx.click_uuid, advertiser_id)
                    .await?;

                let redirect_url = if tx.landing_kind.requires_auto_login() {
                    Some(self.auto_login_url(&registration)?)
                } else {
                    None
                };

                info!(
                    "Registration {} stored for click {} (transaction {})",
                    registration.id, tx.click_uuid, tx.uuid
                );

                Ok(RegistrationOutcome::Success {
                    registration,
                    redirect_url,
                })
            }
        }
    }

    /// One-time auto-login URL derived from the registration identity
    fn auto_login_url(&self, registration: &Registration) -> Result<String> {
        let token = get_jwt_service()
            .generate_auto_login_token(&registration.customer_id, &registration.provider_ref)
            .map_err(|e| {
                warn!("Auto-login token generation failed: {}", e);
                AfftrackError::broker_gateway("auto-login token generation failed".to_string())
            })?;

        let config = crate::config::get_config();
        let mut url = url::Url::parse(&config.autologin.base_url).map_err(|e| {
            AfftrackError::validation(format!("autologin.base_url is invalid: {}", e))
        })?;
        url.query_pairs_mut().append_pair("token", &token);

        Ok(url.to_string())
    }
}
