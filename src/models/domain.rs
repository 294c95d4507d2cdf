use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Resolved caller identity for a single request
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub subject: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub expires_at: Option<DateTime<Utc>>,
}

impl Session {
    pub fn new(subject: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            email: None,
            expires_at: None,
        }
    }

    /// A session is valid when it names a subject and has not expired
    pub fn is_valid(&self, now: DateTime<Utc>) -> bool {
        if self.subject.trim().is_empty() {
            return false;
        }
        match self.expires_at {
            Some(expires_at) => now < expires_at,
            None => true,
        }
    }
}

/// Access tier of a route prefix
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccessTier {
    Public,
    Protected,
}

/// Maps a path prefix to an access tier
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RouteRule {
    pub prefix: String,
    pub tier: AccessTier,
}

/// One-directional preference kind
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActionKind {
    Like,
    Pass,
    SuperLike,
}

impl ActionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ActionKind::Like => "like",
            ActionKind::Pass => "pass",
            ActionKind::SuperLike => "super_like",
        }
    }

    /// Positive kinds are the ones that can complete a match
    pub fn is_positive(&self) -> bool {
        matches!(self, ActionKind::Like | ActionKind::SuperLike)
    }
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Returned when a string is not one of the known action kinds
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownActionKind(pub String);

impl fmt::Display for UnknownActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown action kind: {:?}", self.0)
    }
}

impl std::error::Error for UnknownActionKind {}

impl FromStr for ActionKind {
    type Err = UnknownActionKind;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "like" => Ok(ActionKind::Like),
            "pass" => Ok(ActionKind::Pass),
            "super_like" => Ok(ActionKind::SuperLike),
            other => Err(UnknownActionKind(other.to_string())),
        }
    }
}

/// One actor's recorded interest (or disinterest) in another user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PreferenceAction {
    pub actor_id: String,
    pub target_id: String,
    pub action: ActionKind,
    pub created_at: DateTime<Utc>,
}

/// Unordered pair of user ids, stored as (low, high)
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct UserPair {
    pub user_low: String,
    pub user_high: String,
}

impl UserPair {
    pub fn new(a: &str, b: &str) -> Self {
        if a <= b {
            Self { user_low: a.to_string(), user_high: b.to_string() }
        } else {
            Self { user_low: b.to_string(), user_high: a.to_string() }
        }
    }

    pub fn contains(&self, user_id: &str) -> bool {
        self.user_low == user_id || self.user_high == user_id
    }

    /// Stable key used for per-pair locking
    pub fn key(&self) -> String {
        format!("{}:{}", self.user_low, self.user_high)
    }
}

/// Persisted reciprocal match between two users
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MatchOutcome {
    pub id: uuid::Uuid,
    #[serde(flatten)]
    pub pair: UserPair,
    pub is_reciprocal: bool,
    pub created_at: DateTime<Utc>,
}

/// Result of applying one preference action against stored state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AppliedPreference {
    pub action: PreferenceAction,
    pub outcome: Option<MatchOutcome>,
}

/// Profile card shown in the swipe deck
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProfileSummary {
    pub id: String,
    pub username: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub avatar_url: Option<String>,
    #[serde(default)]
    pub bio: Option<String>,
    #[serde(default)]
    pub is_live: bool,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_action_kind_parsing() {
        assert_eq!("like".parse::<ActionKind>(), Ok(ActionKind::Like));
        assert_eq!("super_like".parse::<ActionKind>(), Ok(ActionKind::SuperLike));
        assert!("superlike".parse::<ActionKind>().is_err());
        assert!("LIKE".parse::<ActionKind>().is_err());
    }

    #[test]
    fn test_user_pair_is_unordered() {
        assert_eq!(UserPair::new("u2", "u1"), UserPair::new("u1", "u2"));
        let pair = UserPair::new("b", "a");
        assert_eq!(pair.user_low, "a");
        assert_eq!(pair.key(), "a:b");
    }

    #[test]
    fn test_session_validity() {
        let now = Utc::now();
        let mut session = Session::new("user-1");
        assert!(session.is_valid(now));

        session.expires_at = Some(now - Duration::seconds(1));
        assert!(!session.is_valid(now));

        assert!(!Session::new("  ").is_valid(now));
    }
}
