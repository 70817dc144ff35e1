//! Registration submission endpoint

use actix_web::{HttpRequest, HttpResponse, Responder, web};
use std::sync::Arc;
use tracing::{error, info, trace};

use crate::errors::AfftrackError;
use crate::services::{RegistrationOutcome, RegistrationRequest, RegistrationService};
use crate::storage::LandingKind;
use crate::utils::extract_client_ip;

pub struct RegistrationApiService;

impl RegistrationApiService {
    /// POST /api/v1/registrations
    ///
    /// Body: `click_uuid`, optional `landing_kind`, plus arbitrary
    /// validated broker-specific fields that pass through to the
    /// provider round.
    pub async fn submit(
        req: HttpRequest,
        body: web::Json<serde_json::Value>,
        service: web::Data<Arc<RegistrationService>>,
    ) -> impl Responder {
        let mut body = body.into_inner();

        let Some(click_uuid) = body
            .get("click_uuid")
            .and_then(|v| v.as_str())
            .filter(|s| !s.is_empty())
            .map(String::from)
        else {
            return HttpResponse::UnprocessableEntity().json(serde_json::json!({
                "result": "error",
                "error": "click_uuid is required"
            }));
        };

        let landing_kind = match body.get("landing_kind").and_then(|v| v.as_str()) {
            None => LandingKind::Standard,
            Some(raw) => match LandingKind::parse(raw) {
                Some(kind) => kind,
                None => {
                    return HttpResponse::UnprocessableEntity().json(serde_json::json!({
                        "result": "error",
                        "error": format!("unknown landing_kind '{}'", raw)
                    }));
                }
            },
        };

        // 控制字段不进 broker payload
        if let Some(object) = body.as_object_mut() {
            object.remove("click_uuid");
            object.remove("landing_kind");
        }

        let registration_request = RegistrationRequest {
            click_uuid: click_uuid.clone(),
            landing_kind,
            client_ip: extract_client_ip(&req),
            fields: body.clone(),
        };

        trace!("Registration submission for click {}", click_uuid);

        match service.register(registration_request).await {
            Ok(RegistrationOutcome::Success {
                registration,
                redirect_url,
            }) => {
                let mut response = serde_json::json!({
                    "result": "success",
                    "registration_id": registration.id,
                });
                if let Some(url) = redirect_url {
                    response["redirect_url"] = serde_json::Value::String(url);
                }
                HttpResponse::Ok().json(response)
            }
            Ok(RegistrationOutcome::NoBrokerAvailable)
            | Ok(RegistrationOutcome::AllBrokersRejected) => {
                info!("Registration for click {} found no willing broker", click_uuid);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "result": "error",
                    "message": "Registration failed. If you encounter a repeated error, please contact our administrator"
                }))
            }
            Ok(RegistrationOutcome::FraudDetected) => {
                info!("Registration for click {} flagged as duplicate", click_uuid);
                HttpResponse::Conflict().json(serde_json::json!({
                    "result": "error",
                    "message": "Registration duplicated"
                }))
            }
            Err(AfftrackError::Validation(msg)) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "result": "error",
                    "error": msg
                }))
            }
            Err(e) => {
                // 技术故障：带原始 payload 记录，返回不泄露内部细节的通用错误
                error!(
                    click_uuid = %click_uuid,
                    error = %e,
                    params = %body,
                    "Registration processing failed"
                );
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "result": "error",
                    "error": "Server error. Please contact our administrator"
                }))
            }
        }
    }
}

/// Registration 路由配置
pub fn registration_routes() -> actix_web::Scope {
    web::scope("/api/v1/registrations")
        .route("", web::post().to(RegistrationApiService::submit))
}
