//! Read operations for SeaOrmStorage

use async_trait::async_trait;
use sea_orm::{ColumnTrait, EntityTrait, QueryFilter};

use migration::entities::{click, conversion, goal, registration, transaction};

use super::SeaOrmStorage;
use super::converters;
use super::retry;
use crate::errors::{AfftrackError, Result};
use crate::storage::models::{Click, Conversion, Goal, Registration, Transaction};
use crate::storage::{ClickStore, GoalStore};

#[async_trait]
impl ClickStore for SeaOrmStorage {
    async fn find_click(&self, uuid: &str) -> Result<Option<Click>> {
        let db = &self.db;
        let uuid_owned = uuid.to_string();

        let model = retry::with_retry(
            &format!("find_click({})", uuid),
            self.retry_config,
            || async { click::Entity::find_by_id(uuid_owned.clone()).one(db).await },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("查询 click 失败: {}", e)))?;

        Ok(model.map(converters::click_from_model))
    }
}

#[async_trait]
impl GoalStore for SeaOrmStorage {
    async fn find_goal(
        &self,
        offer_id: i64,
        user_id: Option<i64>,
        country_id: i64,
    ) -> Result<Option<Goal>> {
        let db = &self.db;

        let model = retry::with_retry(
            &format!("find_goal({}, {:?}, {})", offer_id, user_id, country_id),
            self.retry_config,
            || async {
                let mut query = goal::Entity::find()
                    .filter(goal::Column::OfferId.eq(offer_id))
                    .filter(goal::Column::CountryId.eq(country_id));

                // user_id = NULL 是 (offer, country) 的通配行
                query = match user_id {
                    Some(user) => query.filter(goal::Column::UserId.eq(user)),
                    None => query.filter(goal::Column::UserId.is_null()),
                };

                query.one(db).await
            },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("查询 goal 失败: {}", e)))?;

        Ok(model.map(converters::goal_from_model))
    }
}

impl SeaOrmStorage {
    pub(super) async fn query_transaction(&self, uuid: &str) -> Result<Option<Transaction>> {
        let db = &self.db;
        let uuid_owned = uuid.to_string();

        let model = retry::with_retry(
            &format!("find_transaction({})", uuid),
            self.retry_config,
            || async { transaction::Entity::find_by_id(uuid_owned.clone()).one(db).await },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("查询 transaction 失败: {}", e)))?;

        model.map(converters::transaction_from_model).transpose()
    }

    pub(super) async fn query_registration(
        &self,
        customer_id: &str,
        provider_ref: &str,
    ) -> Result<Option<Registration>> {
        let db = &self.db;
        let customer = customer_id.to_string();
        let provider = provider_ref.to_string();

        let model = retry::with_retry(
            &format!("find_registration({}, {})", customer_id, provider_ref),
            self.retry_config,
            || async {
                registration::Entity::find()
                    .filter(registration::Column::CustomerId.eq(customer.as_str()))
                    .filter(registration::Column::ProviderRef.eq(provider.as_str()))
                    .one(db)
                    .await
            },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("查询 registration 失败: {}", e)))?;

        Ok(model.map(converters::registration_from_model))
    }

    pub(super) async fn query_conversion(&self, click_uuid: &str) -> Result<Option<Conversion>> {
        let db = &self.db;
        let uuid_owned = click_uuid.to_string();

        let model = retry::with_retry(
            &format!("find_conversion({})", click_uuid),
            self.retry_config,
            || async { conversion::Entity::find_by_id(uuid_owned.clone()).one(db).await },
        )
        .await
        .map_err(|e| AfftrackError::database_operation(format!("查询 conversion 失败: {}", e)))?;

        model.map(converters::conversion_from_model).transpose()
    }
}
