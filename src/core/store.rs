use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use thiserror::Error;
use tokio::sync::Mutex;

use crate::models::{ActionKind, AppliedPreference, MatchOutcome, PreferenceAction, UserPair};

/// Errors raised by a preference store backend
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Storage backend error: {0}")]
    Backend(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

/// Persistence for preference actions and the matches they produce
#[async_trait]
pub trait PreferenceStore: Send + Sync {
    /// Upsert the action keyed by (actor, target) and, for positive kinds,
    /// record the match when the reciprocal positive action is on file.
    ///
    /// Implementations must perform the whole sequence atomically with
    /// respect to the unordered pair, and must never hold more than one
    /// outcome per pair.
    async fn apply_preference(
        &self,
        actor_id: &str,
        target_id: &str,
        action: ActionKind,
    ) -> Result<AppliedPreference, StoreError>;

    /// Positive action from `actor_id` toward `target_id`, if any
    async fn find_reciprocal(
        &self,
        actor_id: &str,
        target_id: &str,
    ) -> Result<Option<PreferenceAction>, StoreError>;

    /// Every target the user has acted on, in any way
    async fn acted_targets(&self, actor_id: &str) -> Result<Vec<String>, StoreError>;

    /// Matches involving the user, newest first
    async fn matches_for(&self, user_id: &str) -> Result<Vec<MatchOutcome>, StoreError>;

    async fn health_check(&self) -> Result<bool, StoreError> {
        Ok(true)
    }
}

#[derive(Default)]
struct MemoryState {
    actions: HashMap<(String, String), PreferenceAction>,
    outcomes: HashMap<UserPair, MatchOutcome>,
}

/// Process-local store used in tests and benchmarks
///
/// A single lock covers the read-then-write sequence, which gives the same
/// guarantees as the per-pair transaction of the Postgres store.
#[derive(Default)]
pub struct InMemoryStore {
    state: Mutex<MemoryState>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn action_count(&self) -> usize {
        self.state.lock().await.actions.len()
    }

    pub async fn outcome_count(&self) -> usize {
        self.state.lock().await.outcomes.len()
    }
}

#[async_trait]
impl PreferenceStore for InMemoryStore {
    async fn apply_preference(
        &self,
        actor_id: &str,
        target_id: &str,
        action: ActionKind,
    ) -> Result<AppliedPreference, StoreError> {
        if actor_id == target_id {
            return Err(StoreError::InvalidInput("actor and target are the same user".into()));
        }

        let mut state = self.state.lock().await;

        let recorded = PreferenceAction {
            actor_id: actor_id.to_string(),
            target_id: target_id.to_string(),
            action,
            created_at: Utc::now(),
        };
        state
            .actions
            .insert((actor_id.to_string(), target_id.to_string()), recorded.clone());

        if !action.is_positive() {
            return Ok(AppliedPreference { action: recorded, outcome: None });
        }

        let reciprocal = state
            .actions
            .get(&(target_id.to_string(), actor_id.to_string()))
            .map(|existing| existing.action.is_positive())
            .unwrap_or(false);

        if !reciprocal {
            return Ok(AppliedPreference { action: recorded, outcome: None });
        }

        let pair = UserPair::new(actor_id, target_id);
        let outcome = state
            .outcomes
            .entry(pair.clone())
            .or_insert_with(|| MatchOutcome {
                id: uuid::Uuid::new_v4(),
                pair,
                is_reciprocal: true,
                created_at: Utc::now(),
            })
            .clone();

        Ok(AppliedPreference { action: recorded, outcome: Some(outcome) })
    }

    async fn find_reciprocal(
        &self,
        actor_id: &str,
        target_id: &str,
    ) -> Result<Option<PreferenceAction>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .actions
            .get(&(actor_id.to_string(), target_id.to_string()))
            .filter(|existing| existing.action.is_positive())
            .cloned())
    }

    async fn acted_targets(&self, actor_id: &str) -> Result<Vec<String>, StoreError> {
        let state = self.state.lock().await;
        Ok(state
            .actions
            .keys()
            .filter(|(actor, _)| actor == actor_id)
            .map(|(_, target)| target.clone())
            .collect())
    }

    async fn matches_for(&self, user_id: &str) -> Result<Vec<MatchOutcome>, StoreError> {
        let state = self.state.lock().await;
        let mut matches: Vec<MatchOutcome> = state
            .outcomes
            .values()
            .filter(|outcome| outcome.pair.contains(user_id))
            .cloned()
            .collect();
        matches.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(matches)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_upsert_keeps_latest_action() {
        let store = InMemoryStore::new();
        store.apply_preference("u1", "u2", ActionKind::Like).await.unwrap();
        store.apply_preference("u1", "u2", ActionKind::Pass).await.unwrap();

        assert_eq!(store.action_count().await, 1);
        assert!(store.find_reciprocal("u1", "u2").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_pass_does_not_complete_match() {
        let store = InMemoryStore::new();
        store.apply_preference("u1", "u2", ActionKind::Pass).await.unwrap();
        let applied = store.apply_preference("u2", "u1", ActionKind::Like).await.unwrap();

        assert!(applied.outcome.is_none());
        assert_eq!(store.outcome_count().await, 0);
    }

    #[tokio::test]
    async fn test_self_action_rejected() {
        let store = InMemoryStore::new();
        let result = store.apply_preference("u1", "u1", ActionKind::Like).await;
        assert!(matches!(result, Err(StoreError::InvalidInput(_))));
        assert_eq!(store.action_count().await, 0);
    }
}
