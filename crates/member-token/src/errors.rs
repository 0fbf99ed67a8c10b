//! Token error types.

use thiserror::Error;

/// Session token issuance and validation errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TokenError {
    /// Caller input cannot produce a token (empty subject or secret)
    #[error("Invalid token input: {0}")]
    Validation(String),

    /// HMAC or serialization failure while signing
    #[error("Token signing failed: {0}")]
    Signing(String),

    /// Not a three-segment token, or a segment does not decode
    #[error("Malformed token: {0}")]
    Malformed(String),

    /// `exp` is at or before the validation time
    #[error("Token expired at {expired_at} (now {now})")]
    Expired {
        /// Expiration claim, seconds since epoch
        expired_at: u64,
        /// Validation time, seconds since epoch
        now: u64,
    },

    /// Signature does not match the derived key
    #[error("Token signature mismatch")]
    BadSignature,

    /// A required claim is absent or empty
    #[error("Missing required claim: {0}")]
    MissingClaim(&'static str),

    /// A claim is present but holds an unexpected value
    #[error("Incorrect claim: {0}")]
    IncorrectClaim(&'static str),

    /// Token audience does not cover the required audience
    #[error("Audience mismatch: token '{token}' does not cover '{required}'")]
    AudienceMismatch {
        /// Audience carried by the token
        token: String,
        /// Audience the caller requires
        required: String,
    },
}
