//! Inbound broker webhooks: deposits and conversion-report forwarding

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::errors::AfftrackError;
use crate::services::{DepositOutcome, PROVIDER_ERROR_TARGET, WebhookService};

#[derive(Deserialize, Clone, Debug)]
pub struct DepositPayload {
    pub customer_id: String,
    pub provider_ref: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ConversionReportPayload {
    pub transaction_id: String,
}

pub struct WebhookApiService;

impl WebhookApiService {
    /// POST /api/v1/webhooks/deposit
    ///
    /// At-least-once delivery: the sender keeps retrying anything that
    /// is not success, so the answer is success even when processing
    /// failed. Only an unknown registration says so in the body.
    pub async fn deposit(
        body: web::Json<DepositPayload>,
        service: web::Data<Arc<WebhookService>>,
    ) -> impl Responder {
        let body = body.into_inner();

        if body.customer_id.is_empty() || body.provider_ref.is_empty() {
            return HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "result": "error",
                "error": "customer_id and provider_ref are required"
            }));
        }

        let outcome = service
            .ingest_deposit(
                &body.customer_id,
                &body.provider_ref,
                body.status.as_deref(),
            )
            .await;

        match outcome {
            DepositOutcome::Applied(_) | DepositOutcome::Acknowledged => {
                HttpResponse::Ok().json(serde_json::json!({
                    "result": "success"
                }))
            }
            DepositOutcome::NotFound => HttpResponse::Ok().json(serde_json::json!({
                "result": "error",
                "error": "Registration by combination of customer_id and provider_ref was not found"
            })),
        }
    }

    /// POST /api/v1/webhooks/conversion
    ///
    /// Synchronous forward: code 0 = classification failure (no broker
    /// took it), code 1 = unexpected exception.
    pub async fn conversion(
        body: web::Json<ConversionReportPayload>,
        service: web::Data<Arc<WebhookService>>,
    ) -> impl Responder {
        let body = body.into_inner();

        match service.ingest_conversion_report(&body.transaction_id).await {
            Ok(report) => HttpResponse::Ok().json(serde_json::json!({
                "result": "success",
                "response": report.response,
                "fraud": report.fraud
            })),
            Err(AfftrackError::NotFound(msg)) => {
                HttpResponse::NotFound().json(serde_json::json!({
                    "result": "error",
                    "error": msg
                }))
            }
            Err(AfftrackError::BrokerUnavailable(msg)) => {
                info!("Conversion report {}: {}", body.transaction_id, msg);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "result": "error",
                    "error": "A suitable broker was not found or each of them refused a register",
                    "code": 0
                }))
            }
            Err(e) => {
                error!(
                    target: PROVIDER_ERROR_TARGET,
                    transaction_id = %body.transaction_id,
                    error = %e,
                    error_code = e.code(),
                    "Conversion report forwarding failed"
                );
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "result": "error",
                    "error": "Failed registration (validation error or upstream request)",
                    "code": 1
                }))
            }
        }
    }
}

/// Webhook 路由配置（挂 WebhookAuth）
pub fn webhook_routes() -> actix_web::Scope {
    web::scope("/api/v1/webhooks")
        .route("/deposit", web::post().to(WebhookApiService::deposit))
        .route("/conversion", web::post().to(WebhookApiService::conversion))
}
