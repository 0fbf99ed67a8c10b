//! Request-scoped key/value store.
//!
//! One [`RequestContext`] is created per inbound request and handed down the
//! layers explicitly. Clones share the same map so the boundary layer can clear
//! it after the handler has consumed its copy. The map is allocated on first
//! write.

use crate::domain::principal::Principal;
use parking_lot::Mutex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// Well-known context keys.
pub mod keys {
    pub const TRACE_ID: &str = "tid";
    pub const REQUEST_STARTED_AT: &str = "req_time";
    pub const PRINCIPAL: &str = "member";
    pub const ROUTE: &str = "route";
    pub const LOCALE: &str = "locale";
}

#[derive(Debug, Clone, PartialEq)]
pub enum ContextValue {
    Text(String),
    Int(i64),
    Json(Value),
    Principal(Arc<Principal>),
}

impl From<String> for ContextValue {
    fn from(s: String) -> Self {
        Self::Text(s)
    }
}

impl From<&str> for ContextValue {
    fn from(s: &str) -> Self {
        Self::Text(s.to_string())
    }
}

impl From<i64> for ContextValue {
    fn from(v: i64) -> Self {
        Self::Int(v)
    }
}

impl From<Value> for ContextValue {
    fn from(v: Value) -> Self {
        Self::Json(v)
    }
}

impl From<Arc<Principal>> for ContextValue {
    fn from(p: Arc<Principal>) -> Self {
        Self::Principal(p)
    }
}

/// Per-request store.
#[derive(Debug, Clone, Default)]
pub struct RequestContext {
    slots: Arc<Mutex<Option<HashMap<String, ContextValue>>>>,
}

impl RequestContext {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &str) -> Option<ContextValue> {
        self.slots.lock().as_ref().and_then(|m| m.get(key).cloned())
    }

    /// Text values as-is, integers rendered; other values are not strings.
    pub fn get_string(&self, key: &str) -> Option<String> {
        match self.get(key)? {
            ContextValue::Text(s) => Some(s),
            ContextValue::Int(v) => Some(v.to_string()),
            ContextValue::Json(Value::String(s)) => Some(s),
            ContextValue::Json(_) | ContextValue::Principal(_) => None,
        }
    }

    /// Store `value`, returning the previous value for `key`.
    pub fn put(&self, key: impl Into<String>, value: impl Into<ContextValue>) -> Option<ContextValue> {
        self.slots
            .lock()
            .get_or_insert_with(HashMap::new)
            .insert(key.into(), value.into())
    }

    pub fn put_all<I, K>(&self, entries: I)
    where
        I: IntoIterator<Item = (K, ContextValue)>,
        K: Into<String>,
    {
        let mut slots = self.slots.lock();
        let map = slots.get_or_insert_with(HashMap::new);
        map.extend(entries.into_iter().map(|(k, v)| (k.into(), v)));
    }

    pub fn clear(&self) {
        if let Some(map) = self.slots.lock().as_mut() {
            map.clear();
        }
    }

    pub fn is_empty(&self) -> bool {
        self.slots.lock().as_ref().map_or(true, HashMap::is_empty)
    }

    pub fn trace_id(&self) -> Option<String> {
        self.get_string(keys::TRACE_ID)
    }

    pub fn principal(&self) -> Option<Arc<Principal>> {
        match self.get(keys::PRINCIPAL)? {
            ContextValue::Principal(p) => Some(p),
            _ => None,
        }
    }

    /// Clears the context when dropped, including during unwinding.
    pub fn scope(&self) -> ContextScope {
        ContextScope {
            context: self.clone(),
        }
    }
}

/// Scope guard returned by [`RequestContext::scope`].
#[must_use = "the context is cleared when the scope is dropped"]
pub struct ContextScope {
    context: RequestContext,
}

impl ContextScope {
    pub fn context(&self) -> &RequestContext {
        &self.context
    }
}

impl Drop for ContextScope {
    fn drop(&mut self) {
        self.context.clear();
    }
}
