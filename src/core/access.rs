use std::sync::Arc;

use crate::core::session::{Credential, SessionResolver};
use crate::models::{AccessTier, RouteRule, Session};

/// Static classification of path prefixes into access tiers
///
/// Rules are kept sorted by prefix length (longest first) so the first
/// matching rule is also the most specific one. Prefixes match on path
/// segment boundaries: `/room` covers `/room` and `/room/42` but not
/// `/rooms`.
#[derive(Debug, Clone, Default)]
pub struct RouteTable {
    rules: Vec<RouteRule>,
}

impl RouteTable {
    pub fn new(rules: Vec<RouteRule>) -> Self {
        let mut rules: Vec<RouteRule> = rules
            .into_iter()
            .map(|rule| RouteRule {
                prefix: normalize_prefix(&rule.prefix),
                tier: rule.tier,
            })
            .collect();

        // Stable sort keeps configuration order among equal-length prefixes
        rules.sort_by(|a, b| b.prefix.len().cmp(&a.prefix.len()));

        Self { rules }
    }

    /// Build a table from protected prefixes plus public overrides
    ///
    /// Protected rules are listed first so that an identical public prefix
    /// cannot open a protected one.
    pub fn from_prefixes(protected: &[String], public: &[String]) -> Self {
        let rules = protected
            .iter()
            .map(|prefix| RouteRule { prefix: prefix.clone(), tier: AccessTier::Protected })
            .chain(
                public
                    .iter()
                    .map(|prefix| RouteRule { prefix: prefix.clone(), tier: AccessTier::Public }),
            )
            .collect();

        Self::new(rules)
    }

    pub fn classify(&self, path: &str) -> AccessTier {
        self.rules
            .iter()
            .find(|rule| prefix_matches(&rule.prefix, path))
            .map(|rule| rule.tier)
            .unwrap_or(AccessTier::Public)
    }

    pub fn rules(&self) -> &[RouteRule] {
        &self.rules
    }
}

fn normalize_prefix(prefix: &str) -> String {
    let trimmed = prefix.trim().trim_end_matches('/');
    if trimmed.starts_with('/') {
        trimmed.to_string()
    } else {
        format!("/{}", trimmed)
    }
}

/// Path in the form the router matches on
///
/// Percent escapes are decoded and runs of `/` collapse to one, so an
/// encoded or padded alias of a protected prefix classifies like the
/// prefix itself.
pub fn canonical_path(path: &str) -> String {
    let decoded = urlencoding::decode(path)
        .map(|decoded| decoded.into_owned())
        .unwrap_or_else(|_| path.to_string());

    let mut canonical = String::with_capacity(decoded.len() + 1);
    if !decoded.starts_with('/') {
        canonical.push('/');
    }
    for ch in decoded.chars() {
        if ch == '/' && canonical.ends_with('/') {
            continue;
        }
        canonical.push(ch);
    }
    canonical
}

/// Segment-boundary prefix test
pub fn prefix_matches(prefix: &str, path: &str) -> bool {
    if prefix == "/" {
        return true;
    }
    match path.strip_prefix(prefix) {
        Some(rest) => rest.is_empty() || rest.starts_with('/'),
        None => false,
    }
}

/// Outcome of gating one request
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AccessDecision {
    /// Let the request through, with the caller's session when one was resolved
    Forward(Option<Session>),
    /// Send a page request to the sign-in entry point
    Redirect(String),
    /// Refuse an API request with an authorization error
    Reject,
}

/// Request gate: classifies the path, then resolves identity for protected routes
#[derive(Clone)]
pub struct AccessGuard {
    routes: Arc<RouteTable>,
    resolver: Arc<dyn SessionResolver>,
    login_path: String,
    api_prefix: String,
}

impl AccessGuard {
    pub fn new(routes: RouteTable, resolver: Arc<dyn SessionResolver>) -> Self {
        Self {
            routes: Arc::new(routes),
            resolver,
            login_path: "/login".to_string(),
            api_prefix: "/api".to_string(),
        }
    }

    pub fn with_login_path(mut self, login_path: impl Into<String>) -> Self {
        self.login_path = login_path.into();
        self
    }

    pub fn with_api_prefix(mut self, api_prefix: impl Into<String>) -> Self {
        self.api_prefix = normalize_prefix(&api_prefix.into());
        self
    }

    pub fn routes(&self) -> &RouteTable {
        &self.routes
    }

    /// Decide whether a request for `path` may proceed
    ///
    /// `path` is canonicalised before classification.
    /// Public paths never consult the resolver. Protected paths fail closed:
    /// a missing credential, an unknown or expired session, and a resolver
    /// failure all deny.
    pub async fn check(&self, path: &str, credential: Option<&Credential>) -> AccessDecision {
        let path = canonical_path(path);
        let path = path.as_str();

        if self.routes.classify(path) == AccessTier::Public {
            return AccessDecision::Forward(None);
        }

        let session = match credential {
            Some(credential) => match self.resolver.resolve(credential).await {
                Ok(session) => session,
                Err(e) => {
                    tracing::warn!("Session resolution failed for {}: {}", path, e);
                    None
                }
            },
            None => None,
        };

        match session {
            Some(session) if session.is_valid(chrono::Utc::now()) => {
                AccessDecision::Forward(Some(session))
            }
            _ => {
                tracing::debug!("Denying unauthenticated request to {}", path);
                self.deny(path)
            }
        }
    }

    fn deny(&self, path: &str) -> AccessDecision {
        if prefix_matches(&self.api_prefix, path) {
            AccessDecision::Reject
        } else {
            AccessDecision::Redirect(self.login_path.clone())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::session::ResolveError;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct CountingResolver {
        calls: AtomicUsize,
        result: fn() -> Result<Option<Session>, ResolveError>,
    }

    #[async_trait]
    impl SessionResolver for CountingResolver {
        async fn resolve(&self, _credential: &Credential) -> Result<Option<Session>, ResolveError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            (self.result)()
        }
    }

    fn table() -> RouteTable {
        RouteTable::from_prefixes(
            &["/dashboard".to_string(), "/room".to_string(), "/api/swipe".to_string()],
            &["/room/lobby".to_string()],
        )
    }

    fn build_guard(result: fn() -> Result<Option<Session>, ResolveError>) -> (AccessGuard, Arc<CountingResolver>) {
        let resolver = Arc::new(CountingResolver { calls: AtomicUsize::new(0), result });
        (AccessGuard::new(table(), resolver.clone()), resolver)
    }

    #[test]
    fn test_classify_segment_boundaries() {
        let routes = table();
        assert_eq!(routes.classify("/dashboard"), AccessTier::Protected);
        assert_eq!(routes.classify("/dashboard/settings"), AccessTier::Protected);
        assert_eq!(routes.classify("/dashboards"), AccessTier::Public);
        assert_eq!(routes.classify("/terms"), AccessTier::Public);
        assert_eq!(routes.classify("/"), AccessTier::Public);
    }

    #[test]
    fn test_longer_public_prefix_overrides() {
        let routes = table();
        assert_eq!(routes.classify("/room/42"), AccessTier::Protected);
        assert_eq!(routes.classify("/room/lobby"), AccessTier::Public);
        assert_eq!(routes.classify("/room/lobby/chat"), AccessTier::Public);
    }

    #[test]
    fn test_protected_wins_identical_prefix() {
        let routes = RouteTable::from_prefixes(&["/admin".to_string()], &["/admin/".to_string()]);
        assert_eq!(routes.classify("/admin"), AccessTier::Protected);
    }

    #[tokio::test]
    async fn test_public_path_skips_resolver() {
        let (guard, resolver) = build_guard(|| Err(ResolveError::Transport("down".into())));
        let decision = guard.check("/terms", None).await;
        assert_eq!(decision, AccessDecision::Forward(None));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_protected_page_without_credential_redirects() {
        let (guard, resolver) = build_guard(|| Ok(Some(Session::new("u1"))));
        let decision = guard.check("/dashboard", None).await;
        assert_eq!(decision, AccessDecision::Redirect("/login".to_string()));
        assert_eq!(resolver.calls.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn test_protected_api_is_rejected() {
        let (guard, _) = build_guard(|| Ok(None));
        let credential = Credential::Bearer("bad".into());
        assert_eq!(guard.check("/api/swipe", Some(&credential)).await, AccessDecision::Reject);
    }

    #[tokio::test]
    async fn test_resolver_failure_fails_closed() {
        let (guard, _) = build_guard(|| Err(ResolveError::Backend("500".into())));
        let credential = Credential::Cookie("token".into());
        assert_eq!(
            guard.check("/room/7", Some(&credential)).await,
            AccessDecision::Redirect("/login".to_string())
        );
    }

    #[tokio::test]
    async fn test_valid_session_forwards() {
        let (guard, _) = build_guard(|| Ok(Some(Session::new("u1"))));
        let credential = Credential::Cookie("token".into());
        assert_eq!(
            guard.check("/dashboard", Some(&credential)).await,
            AccessDecision::Forward(Some(Session::new("u1")))
        );
    }

    #[test]
    fn test_canonical_path() {
        assert_eq!(canonical_path("/%64ashboard"), "/dashboard");
        assert_eq!(canonical_path("//room///42"), "/room/42");
        assert_eq!(canonical_path("/api/%73wipe"), "/api/swipe");
        assert_eq!(canonical_path(""), "/");
        assert_eq!(canonical_path("/%FF"), "/%FF");
    }

    #[tokio::test]
    async fn test_encoded_alias_of_protected_prefix_is_denied() {
        let (guard, _) = build_guard(|| Ok(None));
        assert_eq!(
            guard.check("/%64ashboard", None).await,
            AccessDecision::Redirect("/login".to_string())
        );
        assert_eq!(
            guard.check("//dashboard/settings", None).await,
            AccessDecision::Redirect("/login".to_string())
        );
        assert_eq!(guard.check("/api/%73wipe", None).await, AccessDecision::Reject);
    }
}
