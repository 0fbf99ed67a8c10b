//! Request and response types flowing through the layer stack.

use crate::domain::context::RequestContext;
use crate::domain::correlation::TraceId;
use crate::domain::envelope::ResultEnvelope;
use crate::domain::routes::RouteInfo;
use axum::http::StatusCode;
use serde_json::Value;
use std::collections::HashMap;

/// Header carrying the session token.
pub const TOKEN_HEADER: &str = "member_jwt";

/// What the transport hands to the boundary layer.
#[derive(Debug, Clone, Default)]
pub struct InboundRequest {
    pub route: String,
    /// Header names are stored lowercased.
    pub headers: HashMap<String, String>,
    pub payload: Value,
    /// Why the transport could not read the body; rejected as a validation
    /// failure once the caller is known.
    pub body_error: Option<String>,
}

impl InboundRequest {
    pub fn new(route: impl Into<String>, payload: Value) -> Self {
        Self {
            route: route.into(),
            headers: HashMap::new(),
            payload,
            body_error: None,
        }
    }

    pub fn with_body_error(mut self, reason: impl Into<String>) -> Self {
        self.body_error = Some(reason.into());
        self
    }

    pub fn with_header(mut self, name: &str, value: impl Into<String>) -> Self {
        self.headers.insert(name.to_ascii_lowercase(), value.into());
        self
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .get(&name.to_ascii_lowercase())
            .map(String::as_str)
    }

    /// Session token from `member_jwt`, else from `Authorization: Bearer`.
    pub fn session_token(&self) -> Option<&str> {
        self.header(TOKEN_HEADER)
            .or_else(|| {
                self.header("authorization")
                    .and_then(|v| v.strip_prefix("Bearer "))
            })
            .map(str::trim)
            .filter(|t| !t.is_empty())
    }
}

/// What the boundary layer hands to the business layer.
#[derive(Debug, Clone)]
pub struct Exchange {
    pub trace_id: TraceId,
    pub route: &'static RouteInfo,
    pub payload: Value,
    pub context: RequestContext,
}

/// Per-request pipeline state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Received,
    AuthChecked,
    HandlerExecuted,
    ResultNormalized,
    Logged,
    Responded,
}

/// Final output of the boundary layer.
#[derive(Debug, Clone)]
pub struct Responded {
    pub status: StatusCode,
    pub envelope: ResultEnvelope,
    /// Stages the request passed through, in order.
    pub stages: Vec<Stage>,
}
