//! Authenticated conversion status update endpoint

use actix_web::{HttpMessage, HttpRequest, HttpResponse, Responder, web};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{error, trace};

use crate::api::middleware::AdvertiserIdentity;
use crate::errors::AfftrackError;
use crate::services::{ConversionService, StatusLabelMap};
use crate::storage::{Conversion, TransitionPatch};

/// Status update submitted by an advertiser, in their own vocabulary.
/// The four `*_status` fields are the caller's label map.
#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct StatusUpdateRequest {
    pub click_uuid: String,
    pub adv_internal_id: String,
    pub status: String,
    pub pending_status: String,
    pub approved_status: String,
    pub rejected_status: String,
    pub paid_status: String,
    pub payout: f64,
}

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct ConversionResponse {
    pub click_uuid: String,
    pub status: String,
    pub adv_internal_id: Option<String>,
    pub payout: Option<f64>,
    pub created_at: String,
    pub approved_at: Option<String>,
    pub rejected_at: Option<String>,
}

impl From<Conversion> for ConversionResponse {
    fn from(conversion: Conversion) -> Self {
        Self {
            click_uuid: conversion.click_uuid,
            status: conversion.status.as_str().to_string(),
            adv_internal_id: conversion.adv_internal_id,
            payout: conversion.payout,
            created_at: conversion.created_at.to_rfc3339(),
            approved_at: conversion.approved_at.map(|dt| dt.to_rfc3339()),
            rejected_at: conversion.rejected_at.map(|dt| dt.to_rfc3339()),
        }
    }
}

pub struct ConversionApiService;

impl ConversionApiService {
    /// POST /api/v1/conversions/status
    pub async fn update_status(
        req: HttpRequest,
        body: web::Json<StatusUpdateRequest>,
        service: web::Data<Arc<ConversionService>>,
    ) -> impl Responder {
        let Some(AdvertiserIdentity(advertiser_id)) =
            req.extensions().get::<AdvertiserIdentity>().copied()
        else {
            return HttpResponse::Unauthorized().json(serde_json::json!({
                "result": "error",
                "error": "Unauthorized"
            }));
        };

        let body = body.into_inner();
        trace!(
            "Status update for click {} by advertiser {}",
            body.click_uuid, advertiser_id
        );

        // 授权先行：点击必须存在且属于该 advertiser，否则不碰任何状态
        if let Err(e) = service.authorize(&body.click_uuid, advertiser_id).await {
            return match e {
                AfftrackError::Authorization(msg) => {
                    HttpResponse::Forbidden().json(serde_json::json!({
                        "result": "error",
                        "error": msg
                    }))
                }
                other => {
                    error!("Authorization lookup failed: {}", other);
                    HttpResponse::InternalServerError().json(serde_json::json!({
                        "result": "error",
                        "error": "Server error. Please contact our administrator"
                    }))
                }
            };
        }

        let labels = StatusLabelMap::from_request_labels(
            &body.pending_status,
            &body.approved_status,
            &body.rejected_status,
            &body.paid_status,
        );

        let requested = match labels.translate(&body.status) {
            Ok(status) => status,
            Err(e) => {
                return HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "result": "error",
                    "error": e.message()
                }));
            }
        };

        let patch = TransitionPatch {
            adv_internal_id: Some(body.adv_internal_id.clone()),
            payout: Some(body.payout),
        };

        match service.transition(&body.click_uuid, requested, patch).await {
            Ok(conversion) => HttpResponse::Ok().json(serde_json::json!({
                "result": "success",
                "data": ConversionResponse::from(conversion)
            })),
            Err(AfftrackError::NotFound(msg)) => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "result": "error",
                    "error": msg
                }))
            }
            Err(AfftrackError::InvalidTransition(msg)) => {
                HttpResponse::Conflict().json(serde_json::json!({
                    "result": "error",
                    "error": msg
                }))
            }
            Err(e) => {
                error!(
                    click_uuid = %body.click_uuid,
                    advertiser_id,
                    error = %e,
                    "Status update failed"
                );
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "result": "error",
                    "error": "Server error. Please contact our administrator"
                }))
            }
        }
    }
}

/// Conversion 路由配置（挂 AdvertiserAuth）
pub fn conversion_routes() -> actix_web::Scope {
    web::scope("/api/v1/conversions")
        .route(
            "/status",
            web::post().to(ConversionApiService::update_status),
        )
}
