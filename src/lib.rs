//! Mix & Mingle - access guard and swipe matching service
//!
//! This library holds the two decision procedures behind the Mix & Mingle
//! backend: the access guard that gates every request on a resolved
//! session, and the match engine that turns swipes into reciprocal matches.

pub mod config;
pub mod core;
pub mod error;
pub mod middleware_layer;
pub mod models;
pub mod routes;
pub mod services;

// Re-export commonly used types
pub use crate::core::{AccessDecision, AccessGuard, MatchEngine, RouteTable};
pub use models::{ActionKind, MatchOutcome, PreferenceAction, Session};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_exports() {
        let routes = RouteTable::from_prefixes(&["/dashboard".to_string()], &[]);
        assert_eq!(routes.rules().len(), 1);
        assert!(ActionKind::SuperLike.is_positive());
    }
}
