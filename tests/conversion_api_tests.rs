//! Conversion status update HTTP surface tests
//!
//! Bearer auth plus the authorization invariant: a foreign click is
//! rejected with 403 before anything mutates.

use std::collections::HashMap;
use std::sync::{Arc, Once};

use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use afftrack::api::jwt::get_jwt_service;
use afftrack::api::middleware::AdvertiserAuth;
use afftrack::api::services::conversion_routes;
use afftrack::config::init_config;
use afftrack::errors::Result;
use afftrack::services::ConversionService;
use afftrack::storage::{
    Click, ClickStore, Conversion, ConversionStatus, ConversionStore, TransitionPatch,
};

// =============================================================================
// Test Setup
// =============================================================================

static INIT: Once = Once::new();

fn init_test_config() {
    INIT.call_once(|| {
        init_config();
    });
}

struct MockClickStore {
    clicks: HashMap<String, Click>,
}

#[async_trait]
impl ClickStore for MockClickStore {
    async fn find_click(&self, uuid: &str) -> Result<Option<Click>> {
        Ok(self.clicks.get(uuid).cloned())
    }
}

struct MockConversionStore {
    rows: RwLock<HashMap<String, Conversion>>,
}

#[async_trait]
impl ConversionStore for MockConversionStore {
    async fn find_conversion(&self, click_uuid: &str) -> Result<Option<Conversion>> {
        Ok(self.rows.read().await.get(click_uuid).cloned())
    }

    async fn create_pending(&self, _click_uuid: &str, _advertiser_id: i64) -> Result<Conversion> {
        unreachable!("status updates never create conversions")
    }

    async fn apply_transition(
        &self,
        click_uuid: &str,
        from: ConversionStatus,
        to: ConversionStatus,
        patch: &TransitionPatch,
    ) -> Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(click_uuid) {
            Some(row) if row.status == from => {
                row.status = to;
                if let Some(ref adv_internal_id) = patch.adv_internal_id {
                    row.adv_internal_id = Some(adv_internal_id.clone());
                }
                if let Some(payout) = patch.payout {
                    row.payout = Some(payout);
                }
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

fn create_conversion_service() -> Arc<ConversionService> {
    init_test_config();

    let clicks = Arc::new(MockClickStore {
        clicks: [(
            "click-1".to_string(),
            Click {
                uuid: "click-1".to_string(),
                advertiser_id: 5,
                offer_id: 10,
                country_id: 840,
                user_id: 7,
                session_hash: "sess-1".to_string(),
                created_at: Utc::now(),
            },
        )]
        .into_iter()
        .collect(),
    });

    let conversions = Arc::new(MockConversionStore {
        rows: RwLock::new(
            [(
                "click-1".to_string(),
                Conversion {
                    click_uuid: "click-1".to_string(),
                    advertiser_id: 5,
                    adv_internal_id: None,
                    status: ConversionStatus::Pending,
                    payout: None,
                    created_at: Utc::now(),
                    approved_at: None,
                    rejected_at: None,
                },
            )]
            .into_iter()
            .collect(),
        ),
    });

    Arc::new(ConversionService::new(clicks, conversions))
}

fn status_update_body(status: &str) -> serde_json::Value {
    serde_json::json!({
        "click_uuid": "click-1",
        "adv_internal_id": "ADV-55",
        "status": status,
        "pending_status": "wait",
        "approved_status": "ok",
        "rejected_status": "bad",
        "paid_status": "payout",
        "payout": 12.5
    })
}

// =============================================================================
// Tests
// =============================================================================

#[actix_web::test]
async fn test_missing_token_is_unauthorized() {
    let service = create_conversion_service();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(conversion_routes().wrap(AdvertiserAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/conversions/status")
        .set_json(status_update_body("ok"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_owning_advertiser_can_update_status() {
    let service = create_conversion_service();
    let token = get_jwt_service().generate_advertiser_token(5).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(conversion_routes().wrap(AdvertiserAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/conversions/status")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(status_update_body("ok"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["result"], "success");
    assert_eq!(body["data"]["status"], "approved");
    assert_eq!(body["data"]["payout"], 12.5);
}

#[actix_web::test]
async fn test_foreign_advertiser_gets_403() {
    let service = create_conversion_service();
    // click-1 属于 advertiser 5
    let token = get_jwt_service().generate_advertiser_token(6).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(conversion_routes().wrap(AdvertiserAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/conversions/status")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(status_update_body("ok"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 403);
}

#[actix_web::test]
async fn test_unmapped_label_is_unprocessable() {
    let service = create_conversion_service();
    let token = get_jwt_service().generate_advertiser_token(5).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(conversion_routes().wrap(AdvertiserAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/conversions/status")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(status_update_body("confirmed"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 422);
}

#[actix_web::test]
async fn test_terminal_conflict_is_409() {
    let service = create_conversion_service();
    let token = get_jwt_service().generate_advertiser_token(5).unwrap();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(conversion_routes().wrap(AdvertiserAuth)),
    )
    .await;

    // pending -> paid 不可达
    let req = test::TestRequest::post()
        .uri("/api/v1/conversions/status")
        .insert_header(("Authorization", format!("Bearer {}", token)))
        .set_json(status_update_body("payout"))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 409);
}
