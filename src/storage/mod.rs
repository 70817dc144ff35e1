//! Storage layer: narrow async repositories over SeaORM
//!
//! Each aggregate gets its own small trait so services can be tested
//! against in-memory mocks. `SeaOrmStorage` implements all of them.

use async_trait::async_trait;

use crate::errors::Result;

pub mod backend;
pub mod models;

pub use backend::SeaOrmStorage;
pub use models::{
    Click, Conversion, ConversionStatus, Goal, LandingKind, NewRegistration, Registration,
    Transaction, TransitionPatch,
};

/// Click lookup, read-only. Rows are owned by the statistics pipeline.
#[async_trait]
pub trait ClickStore: Send + Sync {
    async fn find_click(&self, uuid: &str) -> Result<Option<Click>>;
}

#[async_trait]
pub trait GoalStore: Send + Sync {
    /// Exact lookup on (offer, user, country). `user_id = None` selects
    /// the generic catch-all row.
    async fn find_goal(
        &self,
        offer_id: i64,
        user_id: Option<i64>,
        country_id: i64,
    ) -> Result<Option<Goal>>;
}

#[async_trait]
pub trait TransactionStore: Send + Sync {
    async fn insert_transaction(&self, tx: &Transaction) -> Result<()>;
    async fn attach_goal(&self, uuid: &str, goal_id: i64) -> Result<()>;
    async fn find_transaction(&self, uuid: &str) -> Result<Option<Transaction>>;
}

#[async_trait]
pub trait RegistrationStore: Send + Sync {
    /// Idempotency key lookup for deposit webhooks
    async fn find_registration(
        &self,
        customer_id: &str,
        provider_ref: &str,
    ) -> Result<Option<Registration>>;

    /// Insert-if-absent on the (customer_id, provider_ref) unique key;
    /// returns the stored row either way.
    async fn upsert_registration(&self, reg: NewRegistration) -> Result<Registration>;
}

#[async_trait]
pub trait ConversionStore: Send + Sync {
    async fn find_conversion(&self, click_uuid: &str) -> Result<Option<Conversion>>;

    /// Create the Pending row for a click; no-op if one already exists.
    async fn create_pending(&self, click_uuid: &str, advertiser_id: i64) -> Result<Conversion>;

    /// Guarded transition: UPDATE ... WHERE status = `from`. Returns
    /// false when no row matched, which means a concurrent writer got
    /// there first — the caller re-reads and re-decides.
    async fn apply_transition(
        &self,
        click_uuid: &str,
        from: ConversionStatus,
        to: ConversionStatus,
        patch: &TransitionPatch,
    ) -> Result<bool>;
}
