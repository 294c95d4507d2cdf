use async_trait::async_trait;
use chrono::{DateTime, Utc};
use jsonwebtoken::{decode, Algorithm, DecodingKey, Validation};
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use thiserror::Error;

use crate::core::{Credential, ResolveError, SessionResolver};
use crate::models::{ProfileSummary, Session};

/// Errors that can occur when interacting with Supabase
#[derive(Debug, Error)]
pub enum SupabaseError {
    #[error("HTTP request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("API returned error: {0}")]
    ApiError(String),

    #[error("Invalid response format: {0}")]
    InvalidResponse(String),
}

const PROFILE_COLUMNS: &str = "id,username,display_name,avatar_url,bio,is_live";

/// Supabase REST and auth client
///
/// Handles the calls this service makes to the hosted backend:
/// - Resolving access tokens into users (`/auth/v1/user`)
/// - Listing profile cards for the swipe deck (`/rest/v1/<profiles>`)
pub struct SupabaseClient {
    base_url: String,
    anon_key: String,
    service_role_key: String,
    profiles_table: String,
    client: Client,
}

impl SupabaseClient {
    pub fn new(
        base_url: String,
        anon_key: String,
        service_role_key: String,
        profiles_table: String,
    ) -> Result<Self, SupabaseError> {
        let client = Client::builder().timeout(Duration::from_secs(10)).build()?;

        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            anon_key,
            service_role_key,
            profiles_table,
            client,
        })
    }

    /// Look up the user that owns an access token
    ///
    /// Returns `Ok(None)` when the backend rejects the token.
    pub async fn get_user(&self, access_token: &str) -> Result<Option<Session>, SupabaseError> {
        let url = format!("{}/auth/v1/user", self.base_url);

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.anon_key)
            .bearer_auth(access_token)
            .send()
            .await?;

        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => return Ok(None),
            status if !status.is_success() => {
                return Err(SupabaseError::ApiError(format!("Failed to fetch user: {}", status)));
            }
            _ => {}
        }

        let user: AuthUser = response
            .json()
            .await
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse user: {}", e)))?;

        if user.id.is_empty() {
            return Ok(None);
        }

        Ok(Some(Session {
            subject: user.id,
            email: user.email,
            expires_at: None,
        }))
    }

    /// List profile cards, skipping the given user ids
    pub async fn list_profiles(
        &self,
        exclude_ids: &[String],
        limit: usize,
    ) -> Result<Vec<ProfileSummary>, SupabaseError> {
        let mut url = format!(
            "{}/rest/v1/{}?select={}&order=is_live.desc,created_at.desc&limit={}",
            self.base_url, self.profiles_table, PROFILE_COLUMNS, limit
        );

        if !exclude_ids.is_empty() {
            let list = exclude_ids
                .iter()
                .map(|id| format!("\"{}\"", id.replace('"', "")))
                .collect::<Vec<_>>()
                .join(",");
            let filter = format!("not.in.({})", list);
            url.push_str(&format!("&id={}", urlencoding::encode(&filter)));
        }

        tracing::debug!("Listing profiles excluding {} ids", exclude_ids.len());

        let response = self
            .client
            .get(&url)
            .header("apikey", &self.service_role_key)
            .bearer_auth(&self.service_role_key)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_else(|_| "Unable to read body".to_string());
            tracing::error!("Failed to list profiles: {} - {}", status, body);
            return Err(SupabaseError::ApiError(format!("Failed to list profiles: {}", status)));
        }

        let profiles: Vec<ProfileSummary> = response
            .json()
            .await
            .map_err(|e| SupabaseError::InvalidResponse(format!("Failed to parse profiles: {}", e)))?;

        // The filter is applied server-side; re-check in case a proxy drops it
        Ok(profiles
            .into_iter()
            .filter(|profile| !exclude_ids.contains(&profile.id))
            .collect())
    }
}

#[derive(Debug, Deserialize)]
struct AuthUser {
    #[serde(default)]
    id: String,
    #[serde(default)]
    email: Option<String>,
}

/// Claims carried by Supabase access tokens
#[derive(Debug, Deserialize)]
struct AccessClaims {
    sub: String,
    exp: i64,
    #[serde(default)]
    email: Option<String>,
}

/// Local HS256 verification of access tokens against the project secret
pub struct JwtVerifier {
    key: DecodingKey,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.set_audience(&["authenticated"]);
        validation.set_required_spec_claims(&["exp", "sub", "aud"]);

        Self {
            key: DecodingKey::from_secret(secret.as_bytes()),
            validation,
        }
    }

    pub fn verify(&self, token: &str) -> Option<Session> {
        match decode::<AccessClaims>(token, &self.key, &self.validation) {
            Ok(data) => Some(Session {
                subject: data.claims.sub,
                email: data.claims.email,
                expires_at: DateTime::<Utc>::from_timestamp(data.claims.exp, 0),
            }),
            Err(e) => {
                tracing::debug!("Rejected access token: {}", e);
                None
            }
        }
    }
}

/// Session resolver backed by Supabase auth
///
/// Verifies tokens locally when the project JWT secret is configured and
/// falls back to asking the auth server otherwise.
pub struct SupabaseAuth {
    client: std::sync::Arc<SupabaseClient>,
    verifier: Option<JwtVerifier>,
}

impl SupabaseAuth {
    pub fn new(client: std::sync::Arc<SupabaseClient>, jwt_secret: Option<&str>) -> Self {
        let verifier = jwt_secret
            .filter(|secret| !secret.is_empty())
            .map(JwtVerifier::new);

        Self { client, verifier }
    }
}

#[async_trait]
impl SessionResolver for SupabaseAuth {
    async fn resolve(&self, credential: &Credential) -> Result<Option<Session>, ResolveError> {
        if let Some(verifier) = &self.verifier {
            return Ok(verifier.verify(credential.token()));
        }

        self.client
            .get_user(credential.token())
            .await
            .map_err(|e| match e {
                SupabaseError::RequestError(e) => ResolveError::Transport(e.to_string()),
                other => ResolveError::Backend(other.to_string()),
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jsonwebtoken::{encode, EncodingKey, Header};
    use serde::Serialize;

    #[derive(Serialize)]
    struct TestClaims<'a> {
        sub: &'a str,
        aud: &'a str,
        exp: i64,
        email: &'a str,
    }

    fn token(secret: &str, aud: &str, exp: i64) -> String {
        let claims = TestClaims { sub: "user-123", aud, exp, email: "dj@example.com" };
        encode(&Header::default(), &claims, &EncodingKey::from_secret(secret.as_bytes())).unwrap()
    }

    #[test]
    fn test_verifier_accepts_valid_token() {
        let verifier = JwtVerifier::new("secret");
        let exp = Utc::now().timestamp() + 3600;
        let session = verifier.verify(&token("secret", "authenticated", exp)).unwrap();

        assert_eq!(session.subject, "user-123");
        assert_eq!(session.email.as_deref(), Some("dj@example.com"));
        assert_eq!(session.expires_at.map(|t| t.timestamp()), Some(exp));
    }

    #[test]
    fn test_verifier_rejects_wrong_secret_audience_and_expiry() {
        let verifier = JwtVerifier::new("secret");
        let exp = Utc::now().timestamp() + 3600;

        assert!(verifier.verify(&token("other", "authenticated", exp)).is_none());
        assert!(verifier.verify(&token("secret", "anon", exp)).is_none());
        assert!(verifier.verify(&token("secret", "authenticated", Utc::now().timestamp() - 3600)).is_none());
        assert!(verifier.verify("not-a-jwt").is_none());
    }

    #[test]
    fn test_client_trims_base_url() {
        let client = SupabaseClient::new(
            "https://project.supabase.co/".to_string(),
            "anon".to_string(),
            "service".to_string(),
            "profiles".to_string(),
        )
        .unwrap();

        assert_eq!(client.base_url, "https://project.supabase.co");
    }
}
