use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use thiserror::Error;

use crate::core::{PreferenceStore, StoreError};
use crate::models::ProfileSummary;
use crate::services::cache::{CacheKey, CacheManager};
use crate::services::supabase::{SupabaseClient, SupabaseError};

#[derive(Debug, Error)]
pub enum CandidateError {
    #[error("Preference store failed: {0}")]
    Store(#[from] StoreError),

    #[error("Profile lookup failed: {0}")]
    Supabase(#[from] SupabaseError),
}

/// Supplies the swipe deck: profiles other than the caller that the caller
/// has not acted on yet
#[async_trait]
pub trait CandidateSupplier: Send + Sync {
    async fn candidates(&self, user_id: &str, limit: usize) -> Result<Vec<ProfileSummary>, CandidateError>;

    /// Drop anything cached for the user after their deck changed
    async fn invalidate(&self, _user_id: &str) {}
}

/// Cached deck for one user
///
/// `exhausted` records that the profile listing returned fewer rows than
/// asked for, so a smaller deck is the complete one.
#[derive(Debug, Clone, Serialize, Deserialize)]
struct CachedDeck {
    profiles: Vec<ProfileSummary>,
    exhausted: bool,
}

impl CachedDeck {
    /// Serve `limit` profiles from the cached deck, minus the caller and
    /// anything acted on since it was cached. `None` when the remaining
    /// deck is too short to trust.
    fn serve(self, user_id: &str, acted: &HashSet<String>, limit: usize) -> Option<Vec<ProfileSummary>> {
        let mut fresh: Vec<ProfileSummary> = self
            .profiles
            .into_iter()
            .filter(|profile| profile.id != user_id && !acted.contains(&profile.id))
            .collect();

        if self.exhausted || fresh.len() >= limit {
            fresh.truncate(limit);
            Some(fresh)
        } else {
            None
        }
    }
}

/// Candidate supplier reading profiles from Supabase, optionally cached per user
///
/// Acted targets are always read from the preference store. Cached decks are
/// re-filtered against them, so a swipe recorded through another instance
/// never resurfaces a profile from a stale cache entry.
pub struct SupabaseCandidates {
    supabase: Arc<SupabaseClient>,
    store: Arc<dyn PreferenceStore>,
    cache: Option<Arc<CacheManager>>,
}

impl SupabaseCandidates {
    pub fn new(supabase: Arc<SupabaseClient>, store: Arc<dyn PreferenceStore>) -> Self {
        Self { supabase, store, cache: None }
    }

    pub fn with_cache(mut self, cache: Arc<CacheManager>) -> Self {
        self.cache = Some(cache);
        self
    }

    async fn cached_deck(&self, user_id: &str) -> Option<CachedDeck> {
        let cache = self.cache.as_ref()?;
        match cache.get::<CachedDeck>(&CacheKey::candidates(user_id)).await {
            Ok(deck) => deck,
            Err(e) => {
                tracing::warn!("Candidate cache read failed for {}: {}", user_id, e);
                None
            }
        }
    }

    async fn store_deck(&self, user_id: &str, deck: &CachedDeck) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.set(&CacheKey::candidates(user_id), deck).await {
                tracing::warn!("Failed to cache candidates for {}: {}", user_id, e);
            }
        }
    }
}

#[async_trait]
impl CandidateSupplier for SupabaseCandidates {
    async fn candidates(&self, user_id: &str, limit: usize) -> Result<Vec<ProfileSummary>, CandidateError> {
        let acted: HashSet<String> = self.store.acted_targets(user_id).await?.into_iter().collect();

        if let Some(deck) = self.cached_deck(user_id).await {
            if let Some(profiles) = deck.serve(user_id, &acted, limit) {
                tracing::debug!("Candidate cache hit for {}", user_id);
                return Ok(profiles);
            }
        }

        // Sorted so the upstream filter is stable for the same deck
        let mut exclude: Vec<String> = acted.into_iter().collect();
        exclude.push(user_id.to_string());
        exclude.sort();

        let profiles = self.supabase.list_profiles(&exclude, limit).await?;

        let deck = CachedDeck {
            exhausted: profiles.len() < limit,
            profiles,
        };
        self.store_deck(user_id, &deck).await;

        tracing::debug!("Supplying {} candidates to {}", deck.profiles.len(), user_id);

        Ok(deck.profiles)
    }

    async fn invalidate(&self, user_id: &str) {
        if let Some(cache) = &self.cache {
            if let Err(e) = cache.delete(&CacheKey::candidates(user_id)).await {
                tracing::warn!("Failed to invalidate candidate cache: {}", e);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn profile(id: &str) -> ProfileSummary {
        ProfileSummary {
            id: id.to_string(),
            username: id.to_string(),
            display_name: None,
            avatar_url: None,
            bio: None,
            is_live: false,
        }
    }

    fn deck(ids: &[&str], exhausted: bool) -> CachedDeck {
        CachedDeck { profiles: ids.iter().map(|id| profile(id)).collect(), exhausted }
    }

    #[test]
    fn test_cached_deck_drops_acted_targets() {
        let acted: HashSet<String> = ["b".to_string()].into_iter().collect();
        let served = deck(&["a", "b", "c", "d"], false).serve("me", &acted, 2).unwrap();
        let ids: Vec<&str> = served.iter().map(|p| p.id.as_str()).collect();
        assert_eq!(ids, vec!["a", "c"]);
    }

    #[test]
    fn test_short_deck_served_only_when_exhausted() {
        let acted = HashSet::new();
        assert_eq!(deck(&["a", "b"], true).serve("me", &acted, 20).unwrap().len(), 2);
        assert!(deck(&["a", "b"], false).serve("me", &acted, 20).is_none());
    }

    #[test]
    fn test_stale_entry_falls_through_when_too_short() {
        let acted: HashSet<String> = ["a".to_string(), "b".to_string()].into_iter().collect();
        assert!(deck(&["a", "b", "c"], false).serve("me", &acted, 3).is_none());
    }
}
