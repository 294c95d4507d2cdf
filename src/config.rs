use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;

use crate::core::RouteTable;

/// Application configuration
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    pub server: ServerSettings,
    pub supabase: SupabaseSettings,
    #[serde(default)]
    pub auth: AuthSettings,
    pub database: DatabaseSettings,
    pub cache: CacheSettings,
    #[serde(default)]
    pub candidates: CandidateSettings,
    #[serde(default)]
    pub logging: LoggingSettings,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ServerSettings {
    pub host: String,
    pub port: u16,
    pub workers: Option<usize>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct SupabaseSettings {
    pub url: String,
    pub anon_key: String,
    pub service_role_key: String,
    /// Project JWT secret; when set, access tokens are verified locally
    #[serde(default)]
    pub jwt_secret: Option<String>,
    #[serde(default = "default_profiles_table")]
    pub profiles_table: String,
}

fn default_profiles_table() -> String { "profiles".to_string() }

/// Route gating configuration
#[derive(Debug, Clone, Deserialize)]
pub struct AuthSettings {
    #[serde(default = "default_protected_prefixes")]
    pub protected_prefixes: Vec<String>,
    #[serde(default)]
    pub public_prefixes: Vec<String>,
    #[serde(default = "default_login_path")]
    pub login_path: String,
    #[serde(default = "default_api_prefix")]
    pub api_prefix: String,
    #[serde(default = "default_cookie_name")]
    pub cookie_name: String,
}

impl Default for AuthSettings {
    fn default() -> Self {
        Self {
            protected_prefixes: default_protected_prefixes(),
            public_prefixes: Vec::new(),
            login_path: default_login_path(),
            api_prefix: default_api_prefix(),
            cookie_name: default_cookie_name(),
        }
    }
}

impl AuthSettings {
    pub fn route_table(&self) -> RouteTable {
        RouteTable::from_prefixes(&self.protected_prefixes, &self.public_prefixes)
    }
}

fn default_protected_prefixes() -> Vec<String> {
    [
        "/dashboard",
        "/create-profile",
        "/go-live",
        "/room",
        "/messages",
        "/notifications",
        "/admin",
        "/api/swipe",
        "/api/matches",
        "/api/session",
    ]
    .iter()
    .map(|prefix| prefix.to_string())
    .collect()
}

fn default_login_path() -> String { "/login".to_string() }
fn default_api_prefix() -> String { "/api".to_string() }
fn default_cookie_name() -> String { "sb-access-token".to_string() }

#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    pub url: String,
    pub max_connections: Option<u32>,
    pub min_connections: Option<u32>,
    pub acquire_timeout_secs: Option<u64>,
    pub idle_timeout_secs: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CacheSettings {
    pub redis_url: String,
    pub ttl_secs: Option<u64>,
    pub l1_cache_size: Option<u64>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateSettings {
    #[serde(default = "default_candidate_limit")]
    pub default_limit: u16,
    #[serde(default = "default_candidate_max_limit")]
    pub max_limit: u16,
}

impl Default for CandidateSettings {
    fn default() -> Self {
        Self {
            default_limit: default_candidate_limit(),
            max_limit: default_candidate_max_limit(),
        }
    }
}

fn default_candidate_limit() -> u16 { 20 }
fn default_candidate_max_limit() -> u16 { 100 }

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingSettings {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default = "default_log_format")]
    pub format: String,
}

impl Default for LoggingSettings {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            format: default_log_format(),
        }
    }
}

fn default_log_level() -> String { "info".to_string() }
fn default_log_format() -> String { "compact".to_string() }

impl Settings {
    /// Load configuration from file and environment variables
    ///
    /// Configuration is loaded in the following order (later overrides earlier):
    /// 1. Default values in the struct
    /// 2. Configuration file (config/default.toml)
    /// 3. Local overrides (config/local.toml)
    /// 4. Environment variables (prefixed with MIXMINGLE_)
    /// 5. Well-known variables such as DATABASE_URL, SUPABASE_URL and LOG_LEVEL
    pub fn load() -> Result<Self, ConfigError> {
        let settings = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name("config/local").required(false))
            // e.g., MIXMINGLE__SERVER__PORT -> server.port
            .add_source(env_source())
            .build()?;

        apply_env_overrides(settings)?.try_deserialize()
    }
}

fn env_source() -> Environment {
    Environment::with_prefix("MIXMINGLE")
        .prefix_separator("__")
        .separator("__")
        .list_separator(",")
        .with_list_parse_key("auth.protected_prefixes")
        .with_list_parse_key("auth.public_prefixes")
        .try_parsing(true)
}

/// Apply the conventional unprefixed variables used by hosting platforms
fn apply_env_overrides(settings: Config) -> Result<Config, ConfigError> {
    use std::env;

    let overrides = [
        ("DATABASE_URL", "database.url"),
        ("REDIS_URL", "cache.redis_url"),
        ("SUPABASE_URL", "supabase.url"),
        ("SUPABASE_ANON_KEY", "supabase.anon_key"),
        ("SUPABASE_SERVICE_ROLE_KEY", "supabase.service_role_key"),
        ("SUPABASE_JWT_SECRET", "supabase.jwt_secret"),
        ("LOG_LEVEL", "logging.level"),
        ("LOG_FORMAT", "logging.format"),
    ];

    let mut builder = Config::builder().add_source(settings);
    for (var, key) in overrides {
        if let Ok(value) = env::var(var) {
            builder = builder.set_override(key, value)?;
        }
    }

    builder.build()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::AccessTier;

    #[test]
    fn test_default_auth_settings() {
        let auth = AuthSettings::default();
        assert_eq!(auth.login_path, "/login");
        assert_eq!(auth.cookie_name, "sb-access-token");
        assert!(auth.protected_prefixes.contains(&"/go-live".to_string()));
        assert!(auth.public_prefixes.is_empty());
    }

    #[test]
    fn test_default_route_table() {
        let routes = AuthSettings::default().route_table();
        assert_eq!(routes.classify("/dashboard"), AccessTier::Protected);
        assert_eq!(routes.classify("/api/swipe/candidates"), AccessTier::Protected);
        assert_eq!(routes.classify("/api/health"), AccessTier::Public);
        assert_eq!(routes.classify("/terms"), AccessTier::Public);
    }

    #[test]
    fn test_default_logging() {
        let logging = LoggingSettings::default();
        assert_eq!(logging.level, "info");
        assert_eq!(logging.format, "compact");
    }

    #[test]
    fn test_log_variables_override_logging_section() {
        std::env::set_var("LOG_FORMAT", "pretty");
        let base = Config::builder()
            .set_default("logging.format", "compact")
            .unwrap()
            .build()
            .unwrap();
        let merged = apply_env_overrides(base);
        std::env::remove_var("LOG_FORMAT");

        assert_eq!(merged.unwrap().get_string("logging.format").unwrap(), "pretty");
    }
}
