use serde::{Deserialize, Serialize};
use crate::models::domain::{MatchOutcome, PreferenceAction, ProfileSummary};

/// Response for the swipe endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SwipeResponse {
    pub success: bool,
    pub swipe: PreferenceAction,
    pub is_match: bool,
    #[serde(rename = "match", skip_serializing_if = "Option::is_none", default)]
    pub outcome: Option<MatchOutcome>,
}

/// Response for the candidate deck endpoint
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CandidatesResponse {
    pub candidates: Vec<ProfileSummary>,
    pub count: usize,
}

/// Response listing the caller's matches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchesResponse {
    pub matches: Vec<MatchOutcome>,
    pub count: usize,
}

/// Health check response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub timestamp: chrono::DateTime<chrono::Utc>,
}

/// Error response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
    pub message: String,
    pub status_code: u16,
}
