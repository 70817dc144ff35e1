//! Lookup indexes for the webhook and reporting paths

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 会话统计按 advertiser + status 查询
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_conversions_advertiser_status")
                    .table(Conversion::Table)
                    .col(Conversion::AdvertiserId)
                    .col(Conversion::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_conversions_created_at")
                    .table(Conversion::Table)
                    .col(Conversion::CreatedAt)
                    .to_owned(),
            )
            .await?;

        // deposit webhook 按 click_uuid 反查
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_registrations_click_uuid")
                    .table(Registration::Table)
                    .col(Registration::ClickUuid)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("idx_transactions_click_uuid")
                    .table(Transaction::Table)
                    .col(Transaction::ClickUuid)
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(
                Index::drop()
                    .name("idx_conversions_advertiser_status")
                    .table(Conversion::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_conversions_created_at")
                    .table(Conversion::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_registrations_click_uuid")
                    .table(Registration::Table)
                    .to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop()
                    .name("idx_transactions_click_uuid")
                    .table(Transaction::Table)
                    .to_owned(),
            )
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Conversion {
    #[sea_orm(iden = "conversions")]
    Table,
    AdvertiserId,
    Status,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Registration {
    #[sea_orm(iden = "registrations")]
    Table,
    ClickUuid,
}

#[derive(DeriveIden)]
enum Transaction {
    #[sea_orm(iden = "transactions")]
    Table,
    ClickUuid,
}
