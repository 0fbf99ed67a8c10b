//! Gateway configuration with validation.
//!
//! Values come from `Default`, optionally overlaid by environment variables
//! through [`GatewayConfig::from_env`]. Reading config files is left to the
//! embedding process.

use crate::domain::catalog::Locale;
use member_token::TokenSettings;
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Shortest accepted shared signing secret, in bytes.
pub const MIN_SECRET_LEN: usize = 16;

/// Main gateway configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct GatewayConfig {
    /// Session token settings
    pub token: TokenConfig,
    /// Code catalog location and locales
    pub catalog: CatalogConfig,
    /// Collaborator timeouts
    pub timeouts: TimeoutConfig,
    /// Signup rules
    pub signup: SignupConfig,
    /// Logging
    pub telemetry: TelemetryConfig,
}

impl GatewayConfig {
    /// Defaults overlaid with environment variables.
    ///
    /// # Environment Variables
    ///
    /// - `MEMBERS_JWT_SECRET`: shared token signing secret
    /// - `MEMBERS_TOKEN_AUDIENCE`: audience this deployment accepts
    /// - `MEMBERS_CATALOG_DIR`: directory holding `<locale>/code-msg.json`
    /// - `MEMBERS_LOG_LEVEL` or `RUST_LOG`: log filter (default: info)
    /// - `MEMBERS_JSON_LOGS`: JSON formatted logs (default: false)
    pub fn from_env() -> Self {
        let mut config = Self::default();

        if let Ok(secret) = env::var("MEMBERS_JWT_SECRET") {
            config.token.secret = secret;
        }
        if let Ok(audience) = env::var("MEMBERS_TOKEN_AUDIENCE") {
            config.token.service_audience = audience;
        }
        if let Ok(dir) = env::var("MEMBERS_CATALOG_DIR") {
            config.catalog.dir = PathBuf::from(dir);
        }
        config.telemetry = TelemetryConfig::from_env();

        config
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.token.secret.len() < MIN_SECRET_LEN {
            return Err(ConfigError::WeakSecret {
                min: MIN_SECRET_LEN,
                actual: self.token.secret.len(),
            });
        }

        if self.token.ttl_secs == 0 || self.token.keep_logged_in_ttl_secs == 0 {
            return Err(ConfigError::InvalidTtl("token lifetimes cannot be 0".into()));
        }

        if self.token.issuer.is_empty() || self.token.default_audience.is_empty() {
            return Err(ConfigError::InvalidToken(
                "issuer and default audience are required".into(),
            ));
        }

        if !self.catalog.locales.contains(&self.catalog.default_locale) {
            return Err(ConfigError::InvalidCatalog(format!(
                "default locale '{}' is not among configured locales",
                self.catalog.default_locale
            )));
        }

        if self.timeouts.principal_lookup_ms == 0 {
            return Err(ConfigError::InvalidTimeout(
                "principal lookup timeout cannot be 0".into(),
            ));
        }

        Ok(())
    }

    pub fn token_settings(&self) -> TokenSettings {
        TokenSettings {
            secret: self.token.secret.clone(),
            issuer: self.token.issuer.clone(),
            default_audience: self.token.default_audience.clone(),
            ttl_secs: self.token.ttl_secs,
            keep_logged_in_ttl_secs: self.token.keep_logged_in_ttl_secs,
        }
    }
}

/// Session token configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TokenConfig {
    /// Shared signing secret; never serialized back out
    #[serde(skip_serializing)]
    pub secret: String,
    /// `iss` of issued tokens
    pub issuer: String,
    /// `aud` written when a caller names none
    pub default_audience: String,
    /// Audience this deployment requires on presented tokens
    pub service_audience: String,
    /// Normal session lifetime
    pub ttl_secs: u64,
    /// Keep-logged-in session lifetime
    pub keep_logged_in_ttl_secs: u64,
}

impl Default for TokenConfig {
    fn default() -> Self {
        Self {
            secret: String::new(),
            issuer: member_token::service::DEFAULT_ISSUER.to_string(),
            default_audience: member_token::service::DEFAULT_AUDIENCE.to_string(),
            service_audience: "members.de4bi.com".to_string(),
            ttl_secs: member_token::service::DEFAULT_TTL_SECS,
            keep_logged_in_ttl_secs: member_token::service::DEFAULT_KEEP_LOGGED_IN_TTL_SECS,
        }
    }
}

impl std::fmt::Debug for TokenConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenConfig")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("default_audience", &self.default_audience)
            .field("service_audience", &self.service_audience)
            .field("ttl_secs", &self.ttl_secs)
            .field("keep_logged_in_ttl_secs", &self.keep_logged_in_ttl_secs)
            .finish()
    }
}

/// Code catalog configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    /// Directory holding one `<alias>/code-msg.json` per locale
    pub dir: PathBuf,
    /// Locales to load
    pub locales: Vec<Locale>,
    /// Locale whose file must exist
    pub default_locale: Locale,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            dir: PathBuf::from("resources/locale"),
            locales: Locale::ALL.to_vec(),
            default_locale: Locale::default(),
        }
    }
}

/// Timeout configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TimeoutConfig {
    /// Bound on the principal lookup made while authenticating
    pub principal_lookup_ms: u64,
}

impl TimeoutConfig {
    pub fn principal_lookup(&self) -> Duration {
        Duration::from_millis(self.principal_lookup_ms)
    }
}

impl Default for TimeoutConfig {
    fn default() -> Self {
        Self {
            principal_lookup_ms: 3_000,
        }
    }
}

/// Signup rules
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SignupConfig {
    /// Days a deregistered id must wait before signing up again
    pub rejoin_cooldown_days: u64,
    /// Minimum password length for direct signups
    pub min_password_len: usize,
}

impl SignupConfig {
    pub fn rejoin_cooldown_secs(&self) -> u64 {
        self.rejoin_cooldown_days.saturating_mul(24 * 60 * 60)
    }
}

impl Default for SignupConfig {
    fn default() -> Self {
        Self {
            rejoin_cooldown_days: 30,
            min_password_len: 8,
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    /// Log level filter (trace, debug, info, warn, error)
    pub log_level: String,
    /// Whether to enable JSON formatted logs
    pub json_logs: bool,
}

impl TelemetryConfig {
    pub fn from_env() -> Self {
        Self {
            log_level: env::var("MEMBERS_LOG_LEVEL")
                .or_else(|_| env::var("RUST_LOG"))
                .unwrap_or_else(|_| "info".to_string()),
            json_logs: env::var("MEMBERS_JSON_LOGS")
                .map(|v| v == "true" || v == "1")
                .unwrap_or(false),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
        }
    }
}

/// Configuration errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ConfigError {
    /// Signing secret missing or too short
    #[error("signing secret too short: need {min} bytes, got {actual}")]
    WeakSecret { min: usize, actual: usize },
    /// Invalid token lifetime
    #[error("invalid token lifetime: {0}")]
    InvalidTtl(String),
    /// Invalid token identity settings
    #[error("invalid token settings: {0}")]
    InvalidToken(String),
    /// Invalid catalog settings
    #[error("invalid catalog settings: {0}")]
    InvalidCatalog(String),
    /// Invalid timeout value
    #[error("invalid timeout: {0}")]
    InvalidTimeout(String),
}
