//! Teaser ingest endpoint

use actix_web::{HttpResponse, Responder, web};
use serde::Deserialize;
use std::sync::Arc;
use tracing::error;

use crate::errors::AfftrackError;
use crate::services::TeaserService;

#[derive(Deserialize, Clone, Debug)]
pub struct TeaserIngestPayload {
    pub data: Vec<serde_json::Value>,
}

pub struct TeaserApiService;

impl TeaserApiService {
    /// POST /api/v1/teasers/ingest
    ///
    /// Annotates every record with its content hash; first ingest of a
    /// URL claims the cache entry, duplicates just get the same hash.
    pub async fn ingest(
        body: web::Json<TeaserIngestPayload>,
        service: web::Data<Arc<TeaserService>>,
    ) -> impl Responder {
        match service.ingest(body.into_inner().data).await {
            Ok(teasers) => HttpResponse::Ok().json(serde_json::json!({
                "result": "success",
                "data": teasers
            })),
            Err(AfftrackError::Validation(msg)) => {
                HttpResponse::UnprocessableEntity().json(serde_json::json!({
                    "result": "error",
                    "error": msg
                }))
            }
            Err(e) => {
                error!("Teaser ingest failed: {}", e);
                HttpResponse::InternalServerError().json(serde_json::json!({
                    "result": "error",
                    "error": "Server error. Please contact our administrator"
                }))
            }
        }
    }
}

/// Teaser 路由配置（挂 WebhookAuth）
pub fn teaser_routes() -> actix_web::Scope {
    web::scope("/api/v1/teasers").route("/ingest", web::post().to(TeaserApiService::ingest))
}
