//! Webhook HTTP surface tests
//!
//! Wire contract: deposits always acknowledge with HTTP 200, webhook
//! endpoints hide behind the shared token, conversion reports answer
//! with stable numeric codes.

use std::collections::HashMap;
use std::sync::{Arc, Once};

use actix_web::{App, test, web};
use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use afftrack::api::middleware::WebhookAuth;
use afftrack::api::services::webhook_routes;
use afftrack::client::{BrokerGateway, BrokerReply, BrokerReplyStatus};
use afftrack::config::init_config;
use afftrack::errors::Result;
use afftrack::services::{ConversionService, StatusLabelMap, WebhookService};
use afftrack::storage::{
    Click, ClickStore, Conversion, ConversionStatus, ConversionStore, NewRegistration,
    Registration, RegistrationStore, Transaction, TransactionStore, TransitionPatch,
};

// =============================================================================
// Test Setup
// =============================================================================

static INIT: Once = Once::new();

const TEST_WEBHOOK_TOKEN: &str = "test-webhook-token";

fn init_test_config() {
    INIT.call_once(|| {
        // SAFETY: 进程内测试启动期单线程调用，先于任何读取
        unsafe {
            std::env::set_var("WEBHOOK_TOKEN", TEST_WEBHOOK_TOKEN);
        }
        init_config();
    });
}

struct MockClickStore;

#[async_trait]
impl ClickStore for MockClickStore {
    async fn find_click(&self, _uuid: &str) -> Result<Option<Click>> {
        Ok(None)
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
        unreachable!("webhook flow never creates conversions")
    }

    async fn apply_transition(
        &self,
        click_uuid: &str,
        from: ConversionStatus,
        to: ConversionStatus,
        _patch: &TransitionPatch,
    ) -> Result<bool> {
        let mut rows = self.rows.write().await;
        match rows.get_mut(click_uuid) {
            Some(row) if row.status == from => {
                row.status = to;
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}

struct MockRegistrationStore {
    rows: Vec<Registration>,
}

#[async_trait]
impl RegistrationStore for MockRegistrationStore {
    async fn find_registration(
        &self,
        customer_id: &str,
        provider_ref: &str,
    ) -> Result<Option<Registration>> {
        Ok(self
            .rows
            .iter()
            .find(|r| r.customer_id == customer_id && r.provider_ref == provider_ref)
            .cloned())
    }

    async fn upsert_registration(&self, _reg: NewRegistration) -> Result<Registration> {
        unreachable!("webhook flow never inserts registrations")
    }
}

struct MockTransactionStore;

#[async_trait]
impl TransactionStore for MockTransactionStore {
    async fn insert_transaction(&self, _tx: &Transaction) -> Result<()> {
        unreachable!()
    }

    async fn attach_goal(&self, _uuid: &str, _goal_id: i64) -> Result<()> {
        unreachable!()
    }

    async fn find_transaction(&self, _uuid: &str) -> Result<Option<Transaction>> {
        Ok(None)
    }
}

struct RegisteredBroker;

#[async_trait]
impl BrokerGateway for RegisteredBroker {
    async fn register(
        &self,
        _tx: &Transaction,
        _payload: &serde_json::Value,
    ) -> Result<BrokerReply> {
        Ok(BrokerReply {
            status: BrokerReplyStatus::Registered,
            customer_id: Some("cust-100".to_string()),
            provider_ref: Some("prov-alpha".to_string()),
            provider_name: Some("alpha".to_string()),
            raw: serde_json::json!({"provider": "alpha"}),
        })
    }
}

fn create_webhook_service() -> Arc<WebhookService> {
    init_test_config();

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

    let conversion_service = Arc::new(ConversionService::new(
        Arc::new(MockClickStore),
        conversions,
    ));

    let labels: HashMap<String, String> = [("approved", "approved"), ("rejected", "rejected")]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Arc::new(WebhookService::new(
        Arc::new(MockRegistrationStore {
            rows: vec![Registration {
                id: 1,
                customer_id: "cust-100".to_string(),
                provider_ref: "prov-alpha".to_string(),
                click_uuid: "click-1".to_string(),
                transaction_uuid: "tx-1".to_string(),
                created_at: Utc::now(),
            }],
        }),
        Arc::new(MockTransactionStore),
        conversion_service,
        Arc::new(RegisteredBroker),
        StatusLabelMap::from_config(&labels).unwrap(),
        ConversionStatus::Approved,
    ))
}

// =============================================================================
// Wire contract
// =============================================================================

#[actix_web::test]
async fn test_deposit_without_token_is_unauthorized() {
    let service = create_webhook_service();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(webhook_routes().wrap(WebhookAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/webhooks/deposit")
        .set_json(serde_json::json!({
            "customer_id": "cust-100",
            "provider_ref": "prov-alpha"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 401);
}

#[actix_web::test]
async fn test_deposit_acknowledges_with_success() {
    let service = create_webhook_service();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(webhook_routes().wrap(WebhookAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/webhooks/deposit")
        .insert_header(("X-Webhook-Token", TEST_WEBHOOK_TOKEN))
        .set_json(serde_json::json!({
            "customer_id": "cust-100",
            "provider_ref": "prov-alpha",
            "status": "approved"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["result"], "success");
}

#[actix_web::test]
async fn test_deposit_for_unknown_registration_still_200() {
    let service = create_webhook_service();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(webhook_routes().wrap(WebhookAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/webhooks/deposit")
        .insert_header(("X-Webhook-Token", TEST_WEBHOOK_TOKEN))
        .set_json(serde_json::json!({
            "customer_id": "cust-999",
            "provider_ref": "prov-alpha"
        }))
        .to_request();

    let resp = test::call_service(&app, req).await;
    // webhook 发送方不能因未知身份陷入重试风暴
    assert_eq!(resp.status(), 200);

    let body: serde_json::Value = test::read_body_json(resp).await;
    assert_eq!(body["result"], "error");
}

#[actix_web::test]
async fn test_conversion_report_unknown_transaction_is_404() {
    let service = create_webhook_service();
    let app = test::init_service(
        App::new()
            .app_data(web::Data::new(service))
            .service(webhook_routes().wrap(WebhookAuth)),
    )
    .await;

    let req = test::TestRequest::post()
        .uri("/api/v1/webhooks/conversion")
        .insert_header(("X-Webhook-Token", TEST_WEBHOOK_TOKEN))
        .set_json(serde_json::json!({"transaction_id": "tx-missing"}))
        .to_request();

    let resp = test::call_service(&app, req).await;
    assert_eq!(resp.status(), 404);
}
