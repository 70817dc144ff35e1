//! Transaction entity — one row per broker registration attempt.
//!
//! Immutable after creation except for `goal_id`, which is attached
//! once goal resolution has run.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: String,
    pub click_uuid: String,
    pub offer_id: i64,
    pub country_id: i64,
    pub user_id: i64,
    pub goal_id: Option<i64>,
    pub client_ip: Option<String>,
    pub landing_kind: String,
    /// Validated broker-specific fields, stored as-submitted
    #[sea_orm(column_type = "Text")]
    pub payload: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
