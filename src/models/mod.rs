// Model exports
pub mod domain;
pub mod requests;
pub mod responses;

pub use domain::{
    AccessTier, ActionKind, AppliedPreference, MatchOutcome, PreferenceAction, ProfileSummary,
    RouteRule, Session, UnknownActionKind, UserPair,
};
pub use requests::{CandidatesQuery, SwipeRequest};
pub use responses::{CandidatesResponse, ErrorResponse, HealthResponse, MatchesResponse, SwipeResponse};
