//! Registration entity — durable record of a successful broker enrollment.
//!
//! (customer_id, provider_ref) is the idempotency key for deposit
//! webhooks; it carries a unique index.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "registrations")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i64,
    pub customer_id: String,
    pub provider_ref: String,
    pub click_uuid: String,
    pub transaction_uuid: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
