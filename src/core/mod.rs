// Core decision procedures
pub mod access;
pub mod matcher;
pub mod session;
pub mod store;

pub use access::{AccessDecision, AccessGuard, RouteTable};
pub use matcher::{MatchEngine, MatchError, SwipeOutcome};
pub use session::{Credential, ResolveError, SessionResolver};
pub use store::{InMemoryStore, PreferenceStore, StoreError};
