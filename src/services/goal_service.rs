//! Commission goal resolution

use std::sync::Arc;

use tracing::debug;

use crate::errors::{AfftrackError, Result};
use crate::storage::GoalStore;

/// Resolves the commission goal for a (offer, user, country) triple.
///
/// Two-tier lookup: the exact (offer, user, country) row wins; otherwise
/// the generic (offer, NULL, country) row. There is no country-agnostic
/// third tier.
pub struct GoalResolver {
    goals: Arc<dyn GoalStore>,
}

impl GoalResolver {
    pub fn new(goals: Arc<dyn GoalStore>) -> Self {
        Self { goals }
    }

    pub async fn resolve(&self, offer_id: i64, user_id: i64, country_id: i64) -> Result<i64> {
        if let Some(goal) = self
            .goals
            .find_goal(offer_id, Some(user_id), country_id)
            .await?
        {
            return Ok(goal.goal_id);
        }

        if let Some(goal) = self.goals.find_goal(offer_id, None, country_id).await? {
            debug!(
                "Goal fallback: generic goal {} for offer {} country {}",
                goal.goal_id, offer_id, country_id
            );
            return Ok(goal.goal_id);
        }

        Err(AfftrackError::goal_not_found(format!(
            "No goal for offer {} user {} country {}",
            offer_id, user_id, country_id
        )))
    }
}
