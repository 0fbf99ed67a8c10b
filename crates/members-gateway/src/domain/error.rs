//! Member error taxonomy and response codes.
//!
//! Every failure that can reach a caller is a [`MemberError`] tagged with an
//! [`ErrorKind`]. The boundary layer matches the kind once to pick the HTTP
//! status, and the code to look up the outward message.

use axum::http::StatusCode;
use std::fmt;

/// Response codes, grouped by domain prefix.
pub mod codes {
    // Generic API results (A)
    pub const A_SUCCESS: &str = "A0000";
    pub const A_FAIL: &str = "A0001";
    pub const A_ERROR: &str = "A9999";

    // Members (M)
    pub const M_SUCCESS: &str = "M0000";
    pub const M_FAIL: &str = "M0001";
    pub const M_DUPLICATED_MEMBER: &str = "M0002";
    pub const M_NOT_EXIST_MEMBER: &str = "M0003";
    pub const M_WRONG_PW: &str = "M0004";
    pub const M_NOT_EXIST_OR_WRONG_PW: &str = "M0005";
    pub const M_NO_PERMISSION: &str = "M0006";
    pub const M_DUPLICATED_EMAIL: &str = "M0007";
    pub const M_DUPLICATED_NICKNAME: &str = "M0008";
    pub const M_BANNED_MEMBER: &str = "M0009";
    pub const M_DEREGISTERED_MEMBER: &str = "M0010";
    pub const M_SLEEPING_MEMBER: &str = "M0011";
    pub const M_RECENTLY_DEREGISTERED: &str = "M0014";
    pub const M_ERROR: &str = "M9999";

    // Member authentication / session tokens (MA)
    pub const MA_SUCCESS: &str = "MA000";
    pub const MA_FAIL: &str = "MA001";
    pub const MA_TOKEN_ISSUE_FAIL: &str = "MA002";
    pub const MA_TOKEN_VALIDATION_FAIL: &str = "MA003";
    pub const MA_TOKEN_INVALID_AUD: &str = "MA004";
    pub const MA_ERROR: &str = "MA999";

    // Storage (DB)
    pub const DB_SUCCESS: &str = "DB000";
    pub const DB_FAIL: &str = "DB001";
    pub const DB_ERROR: &str = "DB999";

    /// Every code the catalog is expected to carry.
    pub const ALL: &[&str] = &[
        A_SUCCESS,
        A_FAIL,
        A_ERROR,
        M_SUCCESS,
        M_FAIL,
        M_DUPLICATED_MEMBER,
        M_NOT_EXIST_MEMBER,
        M_WRONG_PW,
        M_NOT_EXIST_OR_WRONG_PW,
        M_NO_PERMISSION,
        M_DUPLICATED_EMAIL,
        M_DUPLICATED_NICKNAME,
        M_BANNED_MEMBER,
        M_DEREGISTERED_MEMBER,
        M_SLEEPING_MEMBER,
        M_RECENTLY_DEREGISTERED,
        M_ERROR,
        MA_SUCCESS,
        MA_FAIL,
        MA_TOKEN_ISSUE_FAIL,
        MA_TOKEN_VALIDATION_FAIL,
        MA_TOKEN_INVALID_AUD,
        MA_ERROR,
        DB_SUCCESS,
        DB_FAIL,
        DB_ERROR,
    ];
}

/// Failure category, matched exhaustively at the boundary.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// Bad caller input
    Validation,
    /// Missing, expired, forged or malformed token; audience mismatch; bad login
    Authentication,
    /// Valid principal without the required role
    Authorization,
    /// Principal or resource absent
    NotFound,
    /// Duplicate unique field
    Conflict,
    /// Persistence failure
    Storage,
    /// Anything unexpected
    Unhandled,
}

impl ErrorKind {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation => StatusCode::BAD_REQUEST,
            Self::Authentication => StatusCode::UNAUTHORIZED,
            Self::Authorization => StatusCode::FORBIDDEN,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::Conflict => StatusCode::CONFLICT,
            Self::Storage | Self::Unhandled => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Code used when the error was raised without a more specific one.
    pub fn default_code(&self) -> &'static str {
        match self {
            Self::Validation => codes::A_FAIL,
            Self::Authentication => codes::MA_TOKEN_VALIDATION_FAIL,
            Self::Authorization => codes::M_NO_PERMISSION,
            Self::NotFound => codes::M_NOT_EXIST_MEMBER,
            Self::Conflict => codes::M_DUPLICATED_MEMBER,
            Self::Storage => codes::DB_ERROR,
            Self::Unhandled => codes::A_ERROR,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Validation => "validation",
            Self::Authentication => "authentication",
            Self::Authorization => "authorization",
            Self::NotFound => "not_found",
            Self::Conflict => "conflict",
            Self::Storage => "storage",
            Self::Unhandled => "unhandled",
        }
    }
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Domain failure carried up to the boundary layer.
///
/// `detail` is internal diagnostic text. It is logged against the trace id and
/// never copied into the outward `message`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{kind} [{code}]: {detail}")]
pub struct MemberError {
    pub kind: ErrorKind,
    pub code: &'static str,
    pub detail: String,
    pub params: Vec<String>,
}

impl MemberError {
    pub fn new(kind: ErrorKind, detail: impl Into<String>) -> Self {
        Self {
            kind,
            code: kind.default_code(),
            detail: detail.into(),
            params: Vec::new(),
        }
    }

    /// Override the response code.
    pub fn with_code(mut self, code: &'static str) -> Self {
        self.code = code;
        self
    }

    /// Positional parameters for the message template.
    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn validation(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Validation, detail)
    }

    pub fn authentication(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authentication, detail)
    }

    pub fn authorization(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Authorization, detail)
    }

    pub fn not_found(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::NotFound, detail)
    }

    pub fn conflict(code: &'static str, detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Conflict, detail).with_code(code)
    }

    pub fn storage(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Storage, detail)
    }

    pub fn unhandled(detail: impl Into<String>) -> Self {
        Self::new(ErrorKind::Unhandled, detail)
    }

    /// Login rejection. Unknown handle and wrong password share one code so
    /// callers cannot tell whether an account exists.
    pub fn login_rejected(detail: impl Into<String>) -> Self {
        Self::authentication(detail).with_code(codes::M_NOT_EXIST_OR_WRONG_PW)
    }

    pub fn status(&self) -> StatusCode {
        self.kind.status()
    }
}

/// Result type for member operations
pub type MemberResult<T> = Result<T, MemberError>;

/// Startup errors (not per-request)
#[derive(Debug, thiserror::Error)]
pub enum GatewayError {
    /// Configuration error
    #[error("configuration error: {0}")]
    Config(String),

    /// Code catalog could not be loaded
    #[error("code catalog error: {0}")]
    Catalog(String),

    /// Logging subscriber could not be installed
    #[error("telemetry error: {0}")]
    Telemetry(String),
}
