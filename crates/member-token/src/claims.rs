//! Session claim set and the claims a validator may require.

use serde::{Deserialize, Serialize};
use std::time::{SystemTime, UNIX_EPOCH};

/// Lifetime used when the builder is given neither `ttl` nor `expiration`.
pub const DEFAULT_TTL_SECS: u64 = 60 * 60;

/// Seconds since the Unix epoch.
pub fn now_secs() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Claims embedded in a signed session token.
///
/// Built once through [`SessionClaims::builder`] and never mutated afterwards.
/// `padding` travels in the token header, not the payload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionClaims {
    id: String,
    subject: String,
    issuer: String,
    audience: String,
    issued_at: u64,
    expiration: u64,
    not_before: u64,
    padding: Option<String>,
}

impl SessionClaims {
    /// Start building claims for `subject`.
    pub fn builder(subject: impl Into<String>) -> ClaimsBuilder {
        ClaimsBuilder::new(subject)
    }

    /// Token identifier (`jti`), the trace id of the issuing request.
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Principal identifier (`sub`).
    pub fn subject(&self) -> &str {
        &self.subject
    }

    /// Issuer (`iss`).
    pub fn issuer(&self) -> &str {
        &self.issuer
    }

    /// Dot-delimited audience pattern (`aud`).
    pub fn audience(&self) -> &str {
        &self.audience
    }

    /// `iat`, seconds since epoch.
    pub fn issued_at(&self) -> u64 {
        self.issued_at
    }

    /// `exp`, seconds since epoch.
    pub fn expiration(&self) -> u64 {
        self.expiration
    }

    /// `nbf`, seconds since epoch.
    pub fn not_before(&self) -> u64 {
        self.not_before
    }

    /// Header padding, if one was supplied or recovered from a token.
    pub fn padding(&self) -> Option<&str> {
        self.padding.as_deref()
    }

    pub(crate) fn from_wire(payload: ClaimPayload, subject: String, expiration: u64, padding: String) -> Self {
        Self {
            id: payload.jti.unwrap_or_default(),
            subject,
            issuer: payload.iss.unwrap_or_default(),
            audience: payload.aud.unwrap_or_default(),
            issued_at: payload.iat.unwrap_or(0),
            expiration,
            not_before: payload.nbf.unwrap_or(0),
            padding: Some(padding),
        }
    }

    pub(crate) fn to_wire(&self) -> ClaimPayload {
        let non_empty = |s: &str| (!s.is_empty()).then(|| s.to_string());
        ClaimPayload {
            jti: non_empty(&self.id),
            sub: Some(self.subject.clone()),
            iss: non_empty(&self.issuer),
            aud: non_empty(&self.audience),
            iat: Some(self.issued_at),
            exp: Some(self.expiration),
            nbf: Some(self.not_before),
        }
    }
}

/// Builder for [`SessionClaims`].
#[derive(Debug, Clone)]
pub struct ClaimsBuilder {
    id: String,
    subject: String,
    issuer: String,
    audience: String,
    issued_at: Option<u64>,
    ttl_secs: Option<u64>,
    expiration: Option<u64>,
    not_before: Option<u64>,
    padding: Option<String>,
}

impl ClaimsBuilder {
    fn new(subject: impl Into<String>) -> Self {
        Self {
            id: String::new(),
            subject: subject.into(),
            issuer: String::new(),
            audience: String::new(),
            issued_at: None,
            ttl_secs: None,
            expiration: None,
            not_before: None,
            padding: None,
        }
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = id.into();
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = issuer.into();
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = audience.into();
        self
    }

    /// Defaults to the current time.
    pub fn issued_at(mut self, secs: u64) -> Self {
        self.issued_at = Some(secs);
        self
    }

    /// Lifetime counted from `issued_at`. Ignored when `expiration` is set.
    pub fn ttl_secs(mut self, ttl: u64) -> Self {
        self.ttl_secs = Some(ttl);
        self
    }

    pub fn expiration(mut self, secs: u64) -> Self {
        self.expiration = Some(secs);
        self
    }

    /// Defaults to `issued_at`.
    pub fn not_before(mut self, secs: u64) -> Self {
        self.not_before = Some(secs);
        self
    }

    /// Header padding. Left unset, issuance generates one.
    pub fn padding(mut self, padding: impl Into<String>) -> Self {
        self.padding = Some(padding.into());
        self
    }

    pub fn build(self) -> SessionClaims {
        let issued_at = self.issued_at.unwrap_or_else(now_secs);
        let expiration = self.expiration.unwrap_or_else(|| {
            issued_at.saturating_add(self.ttl_secs.unwrap_or(DEFAULT_TTL_SECS))
        });

        SessionClaims {
            id: self.id,
            subject: self.subject,
            issuer: self.issuer,
            audience: self.audience,
            issued_at,
            expiration,
            not_before: self.not_before.unwrap_or(issued_at),
            padding: self.padding.filter(|p| !p.is_empty()),
        }
    }
}

/// Registered claim names as they appear on the wire.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub(crate) struct ClaimPayload {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub jti: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sub: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub aud: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iat: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<u64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nbf: Option<u64>,
}

/// Claims that must be present with an exact value.
///
/// Audience here is compared literally; wildcard matching is a separate step
/// (see [`crate::match_audience`]).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequiredClaims {
    pub id: Option<String>,
    pub subject: Option<String>,
    pub issuer: Option<String>,
    pub audience: Option<String>,
}

impl RequiredClaims {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn id(mut self, id: impl Into<String>) -> Self {
        self.id = Some(id.into());
        self
    }

    pub fn subject(mut self, subject: impl Into<String>) -> Self {
        self.subject = Some(subject.into());
        self
    }

    pub fn issuer(mut self, issuer: impl Into<String>) -> Self {
        self.issuer = Some(issuer.into());
        self
    }

    pub fn audience(mut self, audience: impl Into<String>) -> Self {
        self.audience = Some(audience.into());
        self
    }

    pub(crate) fn expectations<'a>(&'a self, claims: &'a SessionClaims) -> [(&'static str, Option<&'a str>, &'a str); 4] {
        [
            ("jti", self.id.as_deref(), claims.id()),
            ("sub", self.subject.as_deref(), claims.subject()),
            ("iss", self.issuer.as_deref(), claims.issuer()),
            ("aud", self.audience.as_deref(), claims.audience()),
        ]
    }
}
