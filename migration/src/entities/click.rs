//! Click entity — traffic events ingested by the statistics pipeline.
//!
//! Read-only to the conversion core: rows are written by the click
//! tracker, conversions only ever look them up by uuid.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Eq)]
#[sea_orm(table_name = "clicks")]
pub struct Model {
    #[sea_orm(primary_key, auto_increment = false)]
    pub uuid: String,
    pub advertiser_id: i64,
    pub offer_id: i64,
    pub country_id: i64,
    pub user_id: i64,
    pub session_hash: String,
    pub created_at: DateTimeUtc,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
