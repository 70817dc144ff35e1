//! RegistrationService tests
//!
//! Broker dispatch classification, persistence side effects and the
//! auto-login redirect, against mock stores and a scripted gateway.

use std::collections::HashMap;
use std::sync::Arc;
use std::sync::Once;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::RwLock;

use afftrack::client::{BrokerGateway, BrokerReply, BrokerReplyStatus};
use afftrack::config::init_config;
use afftrack::errors::{AfftrackError, Result};
use afftrack::services::{GoalResolver, RegistrationOutcome, RegistrationRequest, RegistrationService};
use afftrack::storage::{
    Click, ClickStore, Conversion, ConversionStatus, ConversionStore, Goal, GoalStore,
    LandingKind, NewRegistration, Registration, RegistrationStore, Transaction, TransactionStore,
    TransitionPatch,
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

struct MockGoalStore {
    goals: Vec<Goal>,
}

#[async_trait]
impl GoalStore for MockGoalStore {
    async fn find_goal(
        &self,
        offer_id: i64,
        user_id: Option<i64>,
        country_id: i64,
    ) -> Result<Option<Goal>> {
        Ok(self
            .goals
            .iter()
            .find(|g| g.offer_id == offer_id && g.user_id == user_id && g.country_id == country_id)
            .cloned())
    }
}

#[derive(Default)]
struct MockTransactionStore {
    rows: RwLock<HashMap<String, Transaction>>,
}

#[async_trait]
impl TransactionStore for MockTransactionStore {
    async fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        self.rows.write().await.insert(tx.uuid.clone(), tx.clone());
        Ok(())
    }

    async fn attach_goal(&self, uuid: &str, goal_id: i64) -> Result<()> {
        match self.rows.write().await.get_mut(uuid) {
            Some(tx) => {
                tx.goal_id = Some(goal_id);
                Ok(())
            }
            None => Err(AfftrackError::not_found(format!(
                "Transaction '{}' not found",
                uuid
            ))),
        }
    }

    async fn find_transaction(&self, uuid: &str) -> Result<Option<Transaction>> {
        Ok(self.rows.read().await.get(uuid).cloned())
    }
}

#[derive(Default)]
struct MockRegistrationStore {
    rows: RwLock<Vec<Registration>>,
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
            .read()
            .await
            .iter()
            .find(|r| r.customer_id == customer_id && r.provider_ref == provider_ref)
            .cloned())
    }

    async fn upsert_registration(&self, reg: NewRegistration) -> Result<Registration> {
        let mut rows = self.rows.write().await;
        if let Some(existing) = rows
            .iter()
            .find(|r| r.customer_id == reg.customer_id && r.provider_ref == reg.provider_ref)
        {
            return Ok(existing.clone());
        }
        let stored = Registration {
            id: rows.len() as i64 + 1,
            customer_id: reg.customer_id,
            provider_ref: reg.provider_ref,
            click_uuid: reg.click_uuid,
            transaction_uuid: reg.transaction_uuid,
            created_at: Utc::now(),
        };
        rows.push(stored.clone());
        Ok(stored)
    }
}

#[derive(Default)]
struct MockConversionStore {
    rows: RwLock<HashMap<String, Conversion>>,
}

#[async_trait]
impl ConversionStore for MockConversionStore {
    async fn find_conversion(&self, click_uuid: &str) -> Result<Option<Conversion>> {
        Ok(self.rows.read().await.get(click_uuid).cloned())
    }

    async fn create_pending(&self, click_uuid: &str, advertiser_id: i64) -> Result<Conversion> {
        let mut rows = self.rows.write().await;
        let conversion = rows.entry(click_uuid.to_string()).or_insert_with(|| Conversion {
            click_uuid: click_uuid.to_string(),
            advertiser_id,
            adv_internal_id: None,
            status: ConversionStatus::Pending,
            payout: None,
            created_at: Utc::now(),
            approved_at: None,
            rejected_at: None,
        });
        Ok(conversion.clone())
    }

    async fn apply_transition(
        &self,
        _click_uuid: &str,
        _from: ConversionStatus,
        _to: ConversionStatus,
        _patch: &TransitionPatch,
    ) -> Result<bool> {
        unreachable!("registration flow never transitions conversions")
    }
}

/// Scripted broker gateway
enum ScriptedReply {
    Reply(BrokerReplyStatus),
    TechnicalFailure,
    RegisteredWithoutIdentity,
}

struct ScriptedBroker {
    script: ScriptedReply,
}

#[async_trait]
impl BrokerGateway for ScriptedBroker {
    async fn register(
        &self,
        _tx: &Transaction,
        _payload: &serde_json::Value,
    ) -> Result<BrokerReply> {
        match &self.script {
            ScriptedReply::TechnicalFailure => Err(AfftrackError::broker_gateway(
                "provider 'alpha' unreachable: timed out".to_string(),
            )),
            ScriptedReply::RegisteredWithoutIdentity => Ok(BrokerReply {
                status: BrokerReplyStatus::Registered,
                customer_id: None,
                provider_ref: None,
                provider_name: Some("alpha".to_string()),
                raw: serde_json::Value::Null,
            }),
            ScriptedReply::Reply(BrokerReplyStatus::Registered) => Ok(BrokerReply {
                status: BrokerReplyStatus::Registered,
                customer_id: Some("cust-100".to_string()),
                provider_ref: Some("prov-alpha".to_string()),
                provider_name: Some("alpha".to_string()),
                raw: serde_json::json!({"provider": "alpha", "status": "registered"}),
            }),
            ScriptedReply::Reply(status) => Ok(BrokerReply {
                status: status.clone(),
                customer_id: None,
                provider_ref: None,
                provider_name: None,
                raw: serde_json::Value::Null,
            }),
        }
    }
}

struct TestHarness {
    service: RegistrationService,
    transactions: Arc<MockTransactionStore>,
    registrations: Arc<MockRegistrationStore>,
    conversions: Arc<MockConversionStore>,
}

fn create_harness(script: ScriptedReply) -> TestHarness {
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

    let goals = Arc::new(MockGoalStore {
        goals: vec![
            Goal {
                id: 1,
                offer_id: 10,
                user_id: Some(7),
                country_id: 840,
                goal_id: 111,
                created_at: Utc::now(),
            },
            Goal {
                id: 2,
                offer_id: 10,
                user_id: None,
                country_id: 840,
                goal_id: 222,
                created_at: Utc::now(),
            },
        ],
    });

    let transactions = Arc::new(MockTransactionStore::default());
    let registrations = Arc::new(MockRegistrationStore::default());
    let conversions = Arc::new(MockConversionStore::default());

    let service = RegistrationService::new(
        clicks,
        transactions.clone(),
        registrations.clone(),
        conversions.clone(),
        GoalResolver::new(goals),
        Arc::new(ScriptedBroker { script }),
    );

    TestHarness {
        service,
        transactions,
        registrations,
        conversions,
    }
}

fn request(landing_kind: LandingKind) -> RegistrationRequest {
    RegistrationRequest {
        click_uuid: "click-1".to_string(),
        landing_kind,
        client_ip: Some("203.0.113.10".to_string()),
        fields: serde_json::json!({"email": "user@example.com", "phone": "+15550100"}),
    }
}

// =============================================================================
// Classification
// =============================================================================

#[tokio::test]
async fn test_all_rejected_creates_no_rows() {
    let harness = create_harness(ScriptedReply::Reply(BrokerReplyStatus::AllRejected));

    let outcome = harness.service.register(request(LandingKind::Standard)).await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::AllBrokersRejected));

    // 被拒的注册不留 Registration / Conversion
    assert!(harness.registrations.rows.read().await.is_empty());
    assert!(harness.conversions.rows.read().await.is_empty());
}

#[tokio::test]
async fn test_no_broker_available_creates_no_rows() {
    let harness = create_harness(ScriptedReply::Reply(BrokerReplyStatus::NoBrokers));

    let outcome = harness.service.register(request(LandingKind::Standard)).await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::NoBrokerAvailable));
    assert!(harness.registrations.rows.read().await.is_empty());
}

#[tokio::test]
async fn test_fraud_is_classified_not_technical() {
    let harness = create_harness(ScriptedReply::Reply(BrokerReplyStatus::Fraud));

    let outcome = harness.service.register(request(LandingKind::Standard)).await.unwrap();
    assert!(matches!(outcome, RegistrationOutcome::FraudDetected));
    assert!(harness.registrations.rows.read().await.is_empty());
}

#[tokio::test]
async fn test_technical_failure_propagates_as_error() {
    let harness = create_harness(ScriptedReply::TechnicalFailure);

    let err = harness.service.register(request(LandingKind::Standard)).await.unwrap_err();
    assert!(matches!(err, AfftrackError::BrokerGateway(_)));
    assert!(harness.registrations.rows.read().await.is_empty());
    assert!(harness.conversions.rows.read().await.is_empty());
}

// =============================================================================
// Success path
// =============================================================================

#[tokio::test]
async fn test_success_persists_registration_and_pending_conversion() {
    let harness = create_harness(ScriptedReply::Reply(BrokerReplyStatus::Registered));

    let outcome = harness.service.register(request(LandingKind::Standard)).await.unwrap();

    let RegistrationOutcome::Success {
        registration,
        redirect_url,
    } = outcome
    else {
        panic!("expected success outcome");
    };
    assert_eq!(registration.customer_id, "cust-100");
    assert_eq!(registration.provider_ref, "prov-alpha");
    assert!(redirect_url.is_none());

    let conversions = harness.conversions.rows.read().await;
    let conversion = conversions.get("click-1").expect("conversion row");
    assert_eq!(conversion.status, ConversionStatus::Pending);
    assert_eq!(conversion.advertiser_id, 5);
}

#[tokio::test]
async fn test_trading_landing_gets_auto_login_redirect() {
    let harness = create_harness(ScriptedReply::Reply(BrokerReplyStatus::Registered));

    let outcome = harness.service.register(request(LandingKind::Trading)).await.unwrap();

    let RegistrationOutcome::Success { redirect_url, .. } = outcome else {
        panic!("expected success outcome");
    };
    let redirect_url = redirect_url.expect("trading landing must get a redirect URL");
    assert!(!redirect_url.is_empty());
    assert!(redirect_url.contains("token="));
}

#[tokio::test]
async fn test_exact_goal_attached_to_transaction() {
    let harness = create_harness(ScriptedReply::Reply(BrokerReplyStatus::Registered));

    harness.service.register(request(LandingKind::Standard)).await.unwrap();

    let transactions = harness.transactions.rows.read().await;
    assert_eq!(transactions.len(), 1);
    let tx = transactions.values().next().unwrap();
    // user 7 的精确 goal 优先于通配 goal 222
    assert_eq!(tx.goal_id, Some(111));
    assert_eq!(tx.client_ip.as_deref(), Some("203.0.113.10"));
}

#[tokio::test]
async fn test_registered_reply_without_identity_is_gateway_error() {
    let harness = create_harness(ScriptedReply::RegisteredWithoutIdentity);

    let err = harness.service.register(request(LandingKind::Standard)).await.unwrap_err();
    assert!(matches!(err, AfftrackError::BrokerGateway(_)));
    assert!(harness.registrations.rows.read().await.is_empty());
}

#[tokio::test]
async fn test_unknown_click_is_validation_error() {
    let harness = create_harness(ScriptedReply::Reply(BrokerReplyStatus::Registered));

    let mut req = request(LandingKind::Standard);
    req.click_uuid = "no-such-click".to_string();

    let err = harness.service.register(req).await.unwrap_err();
    assert!(matches!(err, AfftrackError::Validation(_)));
}
