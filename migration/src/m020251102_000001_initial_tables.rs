use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // 创建 clicks 表
        manager
            .create_table(
                Table::create()
                    .table(Click::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Click::Uuid)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Click::AdvertiserId).big_integer().not_null())
                    .col(ColumnDef::new(Click::OfferId).big_integer().not_null())
                    .col(ColumnDef::new(Click::CountryId).big_integer().not_null())
                    .col(ColumnDef::new(Click::UserId).big_integer().not_null())
                    .col(ColumnDef::new(Click::SessionHash).string().not_null())
                    .col(
                        ColumnDef::new(Click::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // 创建 goals 表
        manager
            .create_table(
                Table::create()
                    .table(Goal::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Goal::Id)
                            .big_integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Goal::OfferId).big_integer().not_null())
                    .col(ColumnDef::new(Goal::UserId).big_integer().null())
                    .col(ColumnDef::new(Goal::CountryId).big_integer().not_null())
                    .col(ColumnDef::new(Goal::GoalId).big_integer().not_null())
                    .col(
                        ColumnDef::new(Goal::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await?;

        // (offer, user, country) 组合唯一
        manager
            .create_index(
                Index::create()
                    .if_not_exists()
                    .name("uq_goals_offer_user_country")
                    .table(Goal::Table)
                    .col(Goal::OfferId)
                    .col(Goal::UserId)
                    .col(Goal::CountryId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // 创建 conversions 表
        manager
            .create_table(
                Table::create()
                    .table(Conversion::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Conversion::ClickUuid)
                            .string()
                            .not_null()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(Conversion::AdvertiserId)
                            .big_integer()
                            .not_null(),
                    )
                    .col(ColumnDef::new(Conversion::AdvInternalId).string().null())
                    .col(
                        ColumnDef::new(Conversion::Status)
                            .string()
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(Conversion::Payout).double().null())
                    .col(
                        ColumnDef::new(Conversion::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(Conversion::ApprovedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Conversion::RejectedAt)
                            .timestamp_with_time_zone()
                            .null(),
                    )
                    .to_owned(),
            )
            .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Conversion::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Goal::Table).to_owned())
            .await?;
        manager
            .drop_table(Table::drop().table(Click::Table).to_owned())
            .await?;
        Ok(())
    }
}

#[derive(DeriveIden)]
enum Click {
    #[sea_orm(iden = "clicks")]
    Table,
    Uuid,
    AdvertiserId,
    OfferId,
    CountryId,
    UserId,
    SessionHash,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Goal {
    #[sea_orm(iden = "goals")]
    Table,
    Id,
    OfferId,
    UserId,
    CountryId,
    GoalId,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Conversion {
    #[sea_orm(iden = "conversions")]
    Table,
    ClickUuid,
    AdvertiserId,
    AdvInternalId,
    Status,
    Payout,
    CreatedAt,
    ApprovedAt,
    RejectedAt,
}
