use std::sync::Arc;
use thiserror::Error;

use crate::core::store::{PreferenceStore, StoreError};
use crate::models::{ActionKind, MatchOutcome, PreferenceAction};

/// Errors produced while applying a swipe
#[derive(Debug, Error)]
pub enum MatchError {
    #[error("{0}")]
    Validation(String),

    #[error("Preference store failed: {0}")]
    Store(#[from] StoreError),
}

/// Result of one swipe
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SwipeOutcome {
    pub swipe: PreferenceAction,
    pub is_match: bool,
    pub outcome: Option<MatchOutcome>,
}

/// Applies swipes and decides reciprocal matches
///
/// The decision is a pure function of what the store holds: a positive
/// swipe matches when the target already has a positive swipe on file
/// toward the actor. Passes never match.
#[derive(Clone)]
pub struct MatchEngine {
    store: Arc<dyn PreferenceStore>,
}

impl MatchEngine {
    pub fn new(store: Arc<dyn PreferenceStore>) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &Arc<dyn PreferenceStore> {
        &self.store
    }

    /// Record `actor`'s `kind` toward `target` and report whether it completed a match
    ///
    /// Validation runs before anything touches the store, in this order:
    /// unknown kind, self-action, missing participant.
    pub async fn submit_preference(
        &self,
        actor: &str,
        target: &str,
        kind: &str,
    ) -> Result<SwipeOutcome, MatchError> {
        let action = validate(actor, target, kind)?;

        let applied = self.store.apply_preference(actor, target, action).await?;

        match &applied.outcome {
            Some(outcome) => tracing::info!(
                "Match {} between {} and {}",
                outcome.id,
                outcome.pair.user_low,
                outcome.pair.user_high
            ),
            None => tracing::debug!("Recorded {} from {} to {}", action, actor, target),
        }

        Ok(SwipeOutcome {
            is_match: applied.outcome.is_some(),
            swipe: applied.action,
            outcome: applied.outcome,
        })
    }

    pub async fn matches_for(&self, user_id: &str) -> Result<Vec<MatchOutcome>, MatchError> {
        Ok(self.store.matches_for(user_id).await?)
    }
}

fn validate(actor: &str, target: &str, kind: &str) -> Result<ActionKind, MatchError> {
    let action: ActionKind = kind.parse().map_err(|_| {
        MatchError::Validation("action must be one of: like, pass, super_like".to_string())
    })?;

    if actor == target {
        return Err(MatchError::Validation("cannot act on self".to_string()));
    }

    if actor.trim().is_empty() || target.trim().is_empty() {
        return Err(MatchError::Validation("actor and target are required".to_string()));
    }

    Ok(action)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::store::InMemoryStore;

    fn engine() -> (MatchEngine, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (MatchEngine::new(store.clone()), store)
    }

    #[test]
    fn test_validation_order() {
        // Unknown kind is reported before self-action
        let err = validate("u1", "u1", "superlike").unwrap_err();
        assert!(err.to_string().contains("like, pass, super_like"));

        let err = validate("u1", "u1", "like").unwrap_err();
        assert_eq!(err.to_string(), "cannot act on self");

        let err = validate("u1", "", "pass").unwrap_err();
        assert_eq!(err.to_string(), "actor and target are required");
    }

    #[tokio::test]
    async fn test_first_like_is_not_a_match() {
        let (engine, store) = engine();
        let result = engine.submit_preference("u1", "u2", "like").await.unwrap();

        assert!(!result.is_match);
        assert!(result.outcome.is_none());
        assert_eq!(result.swipe.action, ActionKind::Like);
        assert_eq!(store.outcome_count().await, 0);
    }

    #[tokio::test]
    async fn test_super_like_completes_like() {
        let (engine, _) = engine();
        engine.submit_preference("u1", "u2", "like").await.unwrap();
        let result = engine.submit_preference("u2", "u1", "super_like").await.unwrap();

        assert!(result.is_match);
        let outcome = result.outcome.unwrap();
        assert!(outcome.is_reciprocal);
        assert_eq!(outcome.pair.user_low, "u1");
        assert_eq!(outcome.pair.user_high, "u2");
    }

    #[tokio::test]
    async fn test_invalid_kind_persists_nothing() {
        let (engine, store) = engine();
        let result = engine.submit_preference("u1", "u2", "superlike").await;

        assert!(matches!(result, Err(MatchError::Validation(_))));
        assert_eq!(store.action_count().await, 0);
    }
}
