use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 transactions 表
        manager
            .create_table(
                Table::create()
                    .table(Transaction::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transaction::Uuid)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transaction::ClickUuid).string().not_null())
                    .col(
                        ColumnDef::new(Transaction::OfferId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Transaction::CountryId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Transaction::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Transaction::GoalId).big_integer().null())
                    .col(ColumnDef::new(Transaction::ClientIp).string().null())
                    .col(
                        ColumnDef::new(Transaction::LandingKind)
                            .string()
                            .not_null()
                            .default("standard"),
                    )
                    .col(ColumnDef::new(Transaction::Payload).text().not_null())
                    .col(
                        ColumnDef::new(Transaction::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建 registrations 表
        manager
            .create_table(
                Table::create()
                    .table(Registration::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Registration::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Registration::CustomerId)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registration::ProviderRef)
                            .string()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Registration::ClickUuid).string().not_null())
                    .col(
                        ColumnDef::new(Registration::TransactionUuid)
                            .string()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Registration::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 幂等键：(customer_id, provider_ref) 唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_registrations_customer_provider")
                    .table(Registration::Table)
                    .col(Registration::CustomerId)
                    .col(Registration::ProviderRef)
                    .unique()
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Registration::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Transaction::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Transaction {
    #[sea_orm(iden = "transactions")]
    Table,
    Uuid,
    ClickUuid,
    OfferId,
    CountryId,
    UserId,
    GoalId,
    ClientIp,
    LandingKind,
    Payload,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Registration {
    #[sea_orm(iden = "registrations")]
    Table,
    Id,
    CustomerId,
    ProviderRef,
    ClickUuid,
    TransactionUuid,
    CreatedAt,
}
