//! Error conversions from infrastructure types.
//!
//! These conversions involve collaborator error types and belong in the
//! adapters layer.

use crate::domain::catalog::CatalogError;
use crate::domain::config::ConfigError;
use crate::domain::error::{codes, ErrorKind, GatewayError, MemberError};
use member_token::TokenError;

impl From<TokenError> for MemberError {
    fn from(e: TokenError) -> Self {
        match e {
            TokenError::Validation(_) | TokenError::Signing(_) => {
                MemberError::new(ErrorKind::Unhandled, e.to_string())
                    .with_code(codes::MA_TOKEN_ISSUE_FAIL)
            }
            TokenError::AudienceMismatch { .. } => {
                MemberError::authentication(e.to_string()).with_code(codes::MA_TOKEN_INVALID_AUD)
            }
            TokenError::Malformed(_)
            | TokenError::Expired { .. }
            | TokenError::BadSignature
            | TokenError::MissingClaim(_)
            | TokenError::IncorrectClaim(_) => {
                MemberError::authentication(e.to_string()).with_code(codes::MA_TOKEN_VALIDATION_FAIL)
            }
        }
    }
}

impl From<ConfigError> for GatewayError {
    fn from(e: ConfigError) -> Self {
        GatewayError::Config(e.to_string())
    }
}

impl From<CatalogError> for GatewayError {
    fn from(e: CatalogError) -> Self {
        GatewayError::Catalog(e.to_string())
    }
}
