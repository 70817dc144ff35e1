//! GoalResolver tests
//!
//! Two-tier lookup: exact (offer, user, country) beats the generic
//! (offer, NULL, country) row; neither present is an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;

use afftrack::errors::{AfftrackError, Result};
use afftrack::services::GoalResolver;
use afftrack::storage::{Goal, GoalStore};

/// Mock goal store backed by a plain Vec
struct MockGoalStore {
    goals: Vec<Goal>,
}

impl MockGoalStore {
    fn new(goals: Vec<Goal>) -> Self {
        Self { goals }
    }
}

#[async_trait]
impl GoalStore for MockGoalStore {
    async fn find_goal(
        &self,
        offer_id: i64,
        user_id: Option<i64>,
        country_id: i64,
    ) -> Result<Option<Goal>> {
        Ok(self
            .goals
            .iter()
            .find(|g| g.offer_id == offer_id && g.user_id == user_id && g.country_id == country_id)
            .cloned())
    }
}

fn goal(id: i64, offer_id: i64, user_id: Option<i64>, country_id: i64, goal_id: i64) -> Goal {
    Goal {
        id,
        offer_id,
        user_id,
        country_id,
        goal_id,
        created_at: Utc::now(),
    }
}

#[tokio::test]
async fn test_exact_match_beats_generic_fallback() {
    // 同一 (offer, country) 下同时有精确行和通配行
    let store = Arc::new(MockGoalStore::new(vec![
        goal(1, 10, Some(7), 840, 111),
        goal(2, 10, None, 840, 222),
    ]));
    let resolver = GoalResolver::new(store);

    let resolved = resolver.resolve(10, 7, 840).await.unwrap();
    assert_eq!(resolved, 111);
}

#[tokio::test]
async fn test_generic_fallback_applies_for_any_user() {
    let store = Arc::new(MockGoalStore::new(vec![goal(1, 10, None, 840, 222)]));
    let resolver = GoalResolver::new(store);

    for user_id in [1, 7, 9999] {
        let resolved = resolver.resolve(10, user_id, 840).await.unwrap();
        assert_eq!(resolved, 222);
    }
}

#[tokio::test]
async fn test_no_goal_is_goal_not_found() {
    let store = Arc::new(MockGoalStore::new(vec![goal(1, 10, None, 840, 222)]));
    let resolver = GoalResolver::new(store);

    // 其它 offer
    let err = resolver.resolve(11, 7, 840).await.unwrap_err();
    assert!(matches!(err, AfftrackError::GoalNotFound(_)));

    // 其它 country：不存在 country 无关的第三级回退
    let err = resolver.resolve(10, 7, 276).await.unwrap_err();
    assert!(matches!(err, AfftrackError::GoalNotFound(_)));
}

#[tokio::test]
async fn test_user_specific_goal_for_other_user_does_not_leak() {
    // 只有 user 7 的精确行，user 8 不能用它
    let store = Arc::new(MockGoalStore::new(vec![goal(1, 10, Some(7), 840, 111)]));
    let resolver = GoalResolver::new(store);

    let err = resolver.resolve(10, 8, 840).await.unwrap_err();
    assert!(matches!(err, AfftrackError::GoalNotFound(_)));
}
