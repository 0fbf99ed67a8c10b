//! Trace id for request tracking.
//!
//! Uses UUID v7 for time-ordered, unique identifiers. The same value is echoed
//! in the response envelope and becomes the `jti` of any token issued while
//! serving the request.

use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Per-request correlation identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TraceId(Uuid);

impl TraceId {
    /// Generate a new trace id (UUID v7)
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Parse from string
    pub fn parse(s: &str) -> Result<Self, uuid::Error> {
        Uuid::parse_str(s).map(Self)
    }
}

impl Default for TraceId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for TraceId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
