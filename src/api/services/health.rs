//! Health check endpoint
//!
//! 直接探测 storage，不经过业务服务：k8s probes 要求快速响应。

use actix_web::{HttpResponse, Responder, web};
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;
use tracing::trace;

use crate::storage::SeaOrmStorage;

/// 应用启动时间
#[derive(Clone, Debug)]
pub struct AppStartTime {
    pub start_datetime: chrono::DateTime<chrono::Utc>,
}

#[derive(Serialize, Clone, Debug)]
pub struct HealthResponse {
    pub status: String,
    pub storage_backend: String,
    pub storage_ok: bool,
    pub uptime_secs: i64,
    pub latency_ms: u64,
}

pub struct HealthService;

impl HealthService {
    pub async fn health_check(
        storage: web::Data<Arc<SeaOrmStorage>>,
        app_start_time: web::Data<AppStartTime>,
    ) -> impl Responder {
        let started = Instant::now();
        trace!("Received health check request");

        let storage_ok = storage.get_db().ping().await.is_ok();
        let uptime_secs = (chrono::Utc::now() - app_start_time.start_datetime).num_seconds();

        let response = HealthResponse {
            status: if storage_ok { "ok" } else { "degraded" }.to_string(),
            storage_backend: storage.backend_name().to_string(),
            storage_ok,
            uptime_secs,
            latency_ms: started.elapsed().as_millis() as u64,
        };

        if storage_ok {
            HttpResponse::Ok().json(response)
        } else {
            HttpResponse::ServiceUnavailable().json(response)
        }
    }
}

/// Health 路由配置
pub fn health_routes() -> actix_web::Scope {
    web::scope("/health").route("", web::get().to(HealthService::health_check))
}
