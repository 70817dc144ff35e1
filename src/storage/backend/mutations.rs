//! Mutation operations for SeaOrmStorage

use async_trait::async_trait;
use chrono::Utc;
use sea_orm::sea_query::{Expr, OnConflict};
use sea_orm::{ColumnTrait, DbErr, EntityTrait, QueryFilter, Set};
use tracing::debug;

use migration::entities::{conversion, registration, transaction};

use super::SeaOrmStorage;
use super::converters;
use super::retry;
use crate::errors::{AfftrackError, Result};
use crate::storage::models::{
    Conversion, ConversionStatus, NewRegistration, Registration, Transaction, TransitionPatch,
};
use crate::storage::{ConversionStore, RegistrationStore, TransactionStore};

/// `RecordNotInserted` 表示 on_conflict do_nothing 命中已有行，不算失败
fn ignore_not_inserted<T>(result: std::result::Result<T, DbErr>) -> std::result::Result<(), DbErr> {
    match result {
        Ok(_) | Err(DbErr::RecordNotInserted) => Ok(()),
        Err(e) => Err(e),
    }
}

#[async_trait]
impl TransactionStore for SeaOrmStorage {
    async fn insert_transaction(&self, tx: &Transaction) -> Result<()> {
        let db = &self.db;
        let active = converters::transaction_to_active_model(tx)?;

        retry::with_retry(
            &format!("insert_transaction({})", tx.uuid),
            self.retry_config,
            || async {
                transaction::Entity::insert(active.clone())
                    .exec(db)
                    .await
                    .map(|_| ())
            },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("写入 transaction 失败: {}", e)))?;

        Ok(())
    }

    async fn attach_goal(&self, uuid: &str, goal_id: i64) -> Result<()> {
        let db = &self.db;
        let uuid_owned = uuid.to_string();

        let result = retry::with_retry(
            &format!("attach_goal({})", uuid),
            self.retry_config,
            || async {
                transaction::Entity::update_many()
                    .col_expr(transaction::Column::GoalId, Expr::value(goal_id))
                    .filter(transaction::Column::Uuid.eq(uuid_owned.as_str()))
                    .exec(db)
                    .await
            },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("绑定 goal 失败: {}", e)))?;

        if result.rows_affected == 0 {
            return Err(AfftrackError::not_found(format!(
                "Transaction '{}' not found",
                uuid
            )));
        }
        Ok(())
    }

    async fn find_transaction(&self, uuid: &str) -> Result<Option<Transaction>> {
        self.query_transaction(uuid).await
    }
}

#[async_trait]
impl RegistrationStore for SeaOrmStorage {
    async fn find_registration(
        &self,
        customer_id: &str,
        provider_ref: &str,
    ) -> Result<Option<Registration>> {
        self.query_registration(customer_id, provider_ref).await
    }

    async fn upsert_registration(&self, reg: NewRegistration) -> Result<Registration> {
        let db = &self.db;

        let active = registration::ActiveModel {
            customer_id: Set(reg.customer_id.clone()),
            provider_ref: Set(reg.provider_ref.clone()),
            click_uuid: Set(reg.click_uuid.clone()),
            transaction_uuid: Set(reg.transaction_uuid.clone()),
            created_at: Set(Utc::now()),
            ..Default::default()
        };

        // (customer_id, provider_ref) 唯一键：冲突即已注册，保留首次写入
        retry::with_retry(
            &format!(
                "upsert_registration({}, {})",
                reg.customer_id, reg.provider_ref
            ),
            self.retry_config,
            || async {
                ignore_not_inserted(
                    registration::Entity::insert(active.clone())
                        .on_conflict(
                            OnConflict::columns([
                                registration::Column::CustomerId,
                                registration::Column::ProviderRef,
                            ])
                            .do_nothing()
                            .to_owned(),
                        )
                        .exec(db)
                        .await,
                )
            },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("写入 registration 失败: {}", e)))?;

        self.query_registration(&reg.customer_id, &reg.provider_ref)
            .await?
            .ok_or_else(|| {
                AfftrackError::database_operation(format!(
                    "registration ({}, {}) vanished after upsert",
                    reg.customer_id, reg.provider_ref
                ))
            })
    }
}

#[async_trait]
impl ConversionStore for SeaOrmStorage {
    async fn find_conversion(&self, click_uuid: &str) -> Result<Option<Conversion>> {
        self.query_conversion(click_uuid).await
    }

    async fn create_pending(&self, click_uuid: &str, advertiser_id: i64) -> Result<Conversion> {
        let db = &self.db;

        let active = conversion::ActiveModel {
            click_uuid: Set(click_uuid.to_string()),
            advertiser_id: Set(advertiser_id),
            adv_internal_id: Set(None),
            status: Set(ConversionStatus::Pending.as_str().to_string()),
            payout: Set(None),
            created_at: Set(Utc::now()),
            approved_at: Set(None),
            rejected_at: Set(None),
        };

        // click_uuid 为主键：已存在时保留现有行（webhook 可能先到）
        retry::with_retry(
            &format!("create_pending({})", click_uuid),
            self.retry_config,
            || async {
                ignore_not_inserted(
                    conversion::Entity::insert(active.clone())
                        .on_conflict(
                            OnConflict::column(conversion::Column::ClickUuid)
                                .do_nothing()
                                .to_owned(),
                        )
                        .exec(db)
                        .await,
                )
            },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("写入 conversion 失败: {}", e)))?;

        self.query_conversion(click_uuid).await?.ok_or_else(|| {
            AfftrackError::database_operation(format!(
                "conversion for click '{}' vanished after insert",
                click_uuid
            ))
        })
    }

    async fn apply_transition(
        &self,
        click_uuid: &str,
        from: ConversionStatus,
        to: ConversionStatus,
        patch: &TransitionPatch,
    ) -> Result<bool> {
        let db = &self.db;
        let uuid_owned = click_uuid.to_string();
        let now = Utc::now();
        let patch = patch.clone();

        let result = retry::with_retry(
            &format!("apply_transition({}, {} -> {})", click_uuid, from, to),
            self.retry_config,
            || async {
                let mut update = conversion::Entity::update_many()
                    .col_expr(conversion::Column::Status, Expr::value(to.as_str()))
                    .filter(conversion::Column::ClickUuid.eq(uuid_owned.as_str()))
                    // 条件更新：状态守卫使同 key 并发写串行化
                    .filter(conversion::Column::Status.eq(from.as_str()));

                match to {
                    ConversionStatus::Approved => {
                        update =
                            update.col_expr(conversion::Column::ApprovedAt, Expr::value(now));
                    }
                    ConversionStatus::Rejected => {
                        update =
                            update.col_expr(conversion::Column::RejectedAt, Expr::value(now));
                    }
                    _ => {}
                }

                if let Some(ref adv_internal_id) = patch.adv_internal_id {
                    update = update.col_expr(
                        conversion::Column::AdvInternalId,
                        Expr::value(adv_internal_id.clone()),
                    );
                }
                if let Some(payout) = patch.payout {
                    update = update.col_expr(conversion::Column::Payout, Expr::value(payout));
                }

                update.exec(db).await
            },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("转移 conversion 状态失败: {}", e)))?;

        let applied = result.rows_affected > 0;
        if !applied {
            debug!(
                "Guarded transition {} -> {} for click {} matched no row",
                from, to, click_uuid
            );
        }
        Ok(applied)
    }
}
