use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "conversions")]
pub struct Model {
    /// 1:1 with clicks.uuid
    #[sea_orm(primary_key, auto_increment = false)]
    pub click_uuid: String,
    pub advertiser_id: i64,
    /// Advertiser-side identifier reported on status updates
    pub adv_internal_id: Option<String>,
    /// pending | approved | rejected | paid
    pub status: String,
    pub payout: Option<f64>,
    pub created_at: DateTimeUtc,
    pub approved_at: Option<DateTimeUtc>,
    pub rejected_at: Option<DateTimeUtc>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
