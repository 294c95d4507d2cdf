use serde::{Deserialize, Serialize};
use validator::Validate;

/// Request to record a swipe
///
/// Both fields are optional at the wire level so that a missing value is
/// reported as a validation error instead of a JSON parse failure.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct SwipeRequest {
    #[validate(length(max = 128))]
    #[serde(default, alias = "targetId", alias = "target_id")]
    pub target: Option<String>,
    #[validate(length(max = 32))]
    #[serde(default)]
    pub action: Option<String>,
}

/// Query for the swipe candidate deck
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CandidatesQuery {
    #[validate(range(min = 1, max = 100))]
    #[serde(default)]
    pub limit: Option<u16>,
}
