use async_trait::async_trait;
use thiserror::Error;

use crate::models::Session;

/// Failures of the session backend itself
///
/// "No session" is not an error: resolvers return `Ok(None)` for it.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("Session backend unreachable: {0}")]
    Transport(String),

    #[error("Session backend returned error: {0}")]
    Backend(String),
}

/// Transport-level credential presented by the caller
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credential {
    Bearer(String),
    Cookie(String),
}

impl Credential {
    pub fn token(&self) -> &str {
        match self {
            Credential::Bearer(token) | Credential::Cookie(token) => token,
        }
    }

    /// Pick the credential from a raw `Authorization` header value and a
    /// session cookie value. The bearer header wins when both are present.
    pub fn from_parts(authorization: Option<&str>, cookie: Option<&str>) -> Option<Self> {
        let bearer = authorization
            .and_then(|value| {
                let (scheme, token) = value.trim().split_once(' ')?;
                scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
            })
            .filter(|token| !token.is_empty())
            .map(|token| Credential::Bearer(token.to_string()));

        bearer.or_else(|| {
            cookie
                .map(str::trim)
                .filter(|value| !value.is_empty())
                .map(|value| Credential::Cookie(value.to_string()))
        })
    }
}

/// Resolves a credential into a caller identity
#[async_trait]
pub trait SessionResolver: Send + Sync {
    async fn resolve(&self, credential: &Credential) -> Result<Option<Session>, ResolveError>;
}
