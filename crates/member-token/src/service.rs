//! Token service configured once at startup and shared by reference.

use crate::audience::match_audience;
use crate::claims::{now_secs, SessionClaims};
use crate::{token, TokenError};
use std::fmt;

/// Issuer written into every member token.
pub const DEFAULT_ISSUER: &str = "members.de4bi.com";

/// Audience used when a caller does not name one.
pub const DEFAULT_AUDIENCE: &str = "*.de4bi.com";

/// Lifetime of a normal session token (3 hours).
pub const DEFAULT_TTL_SECS: u64 = 3 * 60 * 60;

/// Lifetime of a keep-logged-in session token (30 days).
pub const DEFAULT_KEEP_LOGGED_IN_TTL_SECS: u64 = 30 * 24 * 60 * 60;

/// Static settings for [`TokenService`].
#[derive(Clone)]
pub struct TokenSettings {
    pub secret: String,
    pub issuer: String,
    pub default_audience: String,
    pub ttl_secs: u64,
    pub keep_logged_in_ttl_secs: u64,
}

impl TokenSettings {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
            issuer: DEFAULT_ISSUER.to_string(),
            default_audience: DEFAULT_AUDIENCE.to_string(),
            ttl_secs: DEFAULT_TTL_SECS,
            keep_logged_in_ttl_secs: DEFAULT_KEEP_LOGGED_IN_TTL_SECS,
        }
    }
}

impl fmt::Debug for TokenSettings {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("TokenSettings")
            .field("secret", &"<redacted>")
            .field("issuer", &self.issuer)
            .field("default_audience", &self.default_audience)
            .field("ttl_secs", &self.ttl_secs)
            .field("keep_logged_in_ttl_secs", &self.keep_logged_in_ttl_secs)
            .finish()
    }
}

/// Issues member tokens and authenticates presented ones.
#[derive(Debug, Clone)]
pub struct TokenService {
    settings: TokenSettings,
}

impl TokenService {
    pub fn new(settings: TokenSettings) -> Self {
        Self { settings }
    }

    pub fn settings(&self) -> &TokenSettings {
        &self.settings
    }

    /// Issue a token for `subject`, identified by the issuing request's trace id.
    pub fn issue_for(
        &self,
        subject: &str,
        trace_id: &str,
        audience: Option<&str>,
        keep_logged_in: bool,
    ) -> Result<String, TokenError> {
        self.issue_for_at(subject, trace_id, audience, keep_logged_in, now_secs())
    }

    pub fn issue_for_at(
        &self,
        subject: &str,
        trace_id: &str,
        audience: Option<&str>,
        keep_logged_in: bool,
        now: u64,
    ) -> Result<String, TokenError> {
        let ttl = if keep_logged_in {
            self.settings.keep_logged_in_ttl_secs
        } else {
            self.settings.ttl_secs
        };

        let claims = SessionClaims::builder(subject)
            .id(trace_id)
            .issuer(&self.settings.issuer)
            .audience(self.audience_or_default(audience))
            .issued_at(now)
            .ttl_secs(ttl)
            .build();

        token::issue(&claims, &self.settings.secret)
    }

    /// Validate a token and check that its audience covers `required_audience`.
    pub fn authenticate(
        &self,
        token: &str,
        required_audience: Option<&str>,
    ) -> Result<SessionClaims, TokenError> {
        self.authenticate_at(token, required_audience, now_secs())
    }

    pub fn authenticate_at(
        &self,
        token: &str,
        required_audience: Option<&str>,
        now: u64,
    ) -> Result<SessionClaims, TokenError> {
        let claims = token::validate_at(token, &self.settings.secret, None, now)?;
        match_audience(claims.audience(), self.audience_or_default(required_audience))?;
        Ok(claims)
    }

    fn audience_or_default<'a>(&'a self, audience: Option<&'a str>) -> &'a str {
        match audience {
            Some(aud) if !aud.is_empty() => aud,
            _ => &self.settings.default_audience,
        }
    }
}
