//! Member route handlers.
//!
//! Handlers see a parsed parameter struct and return `MemberResult`; the
//! router turns payloads into parameters and picks the handler by route name.

pub mod account;
pub mod session;

pub use account::AccountHandlers;
pub use session::SessionHandlers;

use crate::domain::config::GatewayConfig;
use crate::domain::error::{MemberError, MemberResult};
use crate::middleware::GuardedStore;
use crate::ports::outbound::{IdentityProvider, TimeSource};
use member_token::TokenService;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;

/// All member handlers
pub struct MemberHandlers {
    pub account: AccountHandlers,
    pub session: SessionHandlers,
}

impl MemberHandlers {
    pub fn new(
        config: &GatewayConfig,
        tokens: Arc<TokenService>,
        store: GuardedStore,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            account: AccountHandlers::new(store.clone(), Arc::clone(&clock), config.signup.clone()),
            session: SessionHandlers::new(tokens, store, identity, clock),
        }
    }
}

/// Deserialize route parameters, rejecting bad input as `Validation`.
pub fn params<T: DeserializeOwned>(payload: Value) -> MemberResult<T> {
    let payload = if payload.is_null() {
        Value::Object(Default::default())
    } else {
        payload
    };
    serde_json::from_value(payload).map_err(|e| MemberError::validation(format!("invalid parameters: {e}")))
}

/// Trimmed value, or a `Validation` error naming the empty field.
pub(crate) fn required<'a>(field: &'static str, value: &'a str) -> MemberResult<&'a str> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(MemberError::validation(format!("'{field}' is required")));
    }
    Ok(trimmed)
}
