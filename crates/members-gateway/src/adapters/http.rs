//! axum bridge.
//!
//! Mount [`handle_member_request`] under whatever path carries the route name,
//! e.g. `.route("/members/:route", post(handle_member_request))`.

use crate::domain::types::{InboundRequest, Responded};
use crate::service::MembersGateway;
use axum::body::Bytes;
use axum::extract::rejection::BytesRejection;
use axum::extract::{Path, State};
use axum::http::HeaderMap;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::Value;

impl IntoResponse for Responded {
    fn into_response(self) -> Response {
        (self.status, Json(self.envelope)).into_response()
    }
}

/// Copy the route, readable headers and JSON body into an [`InboundRequest`].
/// Headers whose values are not visible ASCII are skipped.
pub fn inbound_from_parts(route: impl Into<String>, headers: &HeaderMap, payload: Value) -> InboundRequest {
    headers
        .iter()
        .filter_map(|(name, value)| value.to_str().ok().map(|v| (name.as_str(), v)))
        .fold(InboundRequest::new(route, payload), |req, (name, value)| {
            req.with_header(name, value)
        })
}

/// axum handler running one request through the gateway.
///
/// The body is read as raw bytes so that a missing, empty or malformed body
/// still gets an envelope from the gateway rather than an extractor rejection.
pub async fn handle_member_request(
    State(gateway): State<MembersGateway>,
    Path(route): Path<String>,
    headers: HeaderMap,
    body: Result<Bytes, BytesRejection>,
) -> Responded {
    let payload = body
        .map_err(|rejection| rejection.body_text())
        .and_then(|bytes| payload_from_body(&bytes));

    let req = match payload {
        Ok(payload) => inbound_from_parts(route, &headers, payload),
        Err(reason) => inbound_from_parts(route, &headers, Value::Null).with_body_error(reason),
    };
    gateway.handle(req).await
}

/// Blank bodies read as `null`; anything else must be JSON whatever the
/// declared content type.
fn payload_from_body(body: &[u8]) -> Result<Value, String> {
    if body.iter().all(u8::is_ascii_whitespace) {
        return Ok(Value::Null);
    }
    serde_json::from_slice(body).map_err(|e| e.to_string())
}
