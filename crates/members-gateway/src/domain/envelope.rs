//! Canonical response envelope.
//!
//! Wire shape (snake_case, fixed order):
//!
//! ```json
//! {"tid": "...", "result": true, "code": "A0000", "message": "...", "data": null}
//! ```
//!
//! `message_params` are consumed when the boundary resolves the message and are
//! never serialized.

use crate::domain::catalog::{CodeCatalog, Locale};
use crate::domain::error::{codes, MemberError};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Success or failure payload returned for every request.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResultEnvelope {
    #[serde(rename = "tid")]
    pub trace_id: String,
    pub result: bool,
    pub code: String,
    pub message: String,
    #[serde(skip)]
    pub message_params: Vec<String>,
    pub data: Value,
}

impl ResultEnvelope {
    fn with_result(result: bool) -> Self {
        Self {
            trace_id: String::new(),
            result,
            code: String::new(),
            message: String::new(),
            message_params: Vec::new(),
            data: Value::Null,
        }
    }

    /// Successful outcome with no code yet; the boundary assigns the default.
    pub fn success() -> Self {
        Self::with_result(true)
    }

    /// Business-level failure with no code yet.
    pub fn failure() -> Self {
        Self::with_result(false)
    }

    /// Failure envelope for a domain error.
    pub fn from_error(err: &MemberError) -> Self {
        Self {
            code: err.code.to_string(),
            message_params: err.params.clone(),
            ..Self::failure()
        }
    }

    pub fn with_code(mut self, code: &str) -> Self {
        self.code = code.to_string();
        self
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = message.into();
        self
    }

    pub fn with_params<I, S>(mut self, params: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.message_params = params.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_data(mut self, data: Value) -> Self {
        self.data = data;
        self
    }

    /// Default code for an envelope that never had one set.
    pub fn default_code(result: bool) -> &'static str {
        if result {
            codes::A_SUCCESS
        } else {
            codes::A_FAIL
        }
    }

    /// Stamp the trace id, fill a missing code, and replace the message with
    /// the catalog text. Returns the message the business layer had set, if any,
    /// so the caller can log it as internal detail.
    pub fn finalize(
        &mut self,
        trace_id: &str,
        catalog: &CodeCatalog,
        locale: Locale,
    ) -> Option<String> {
        self.trace_id = trace_id.to_string();
        if self.code.is_empty() {
            self.code = Self::default_code(self.result).to_string();
        }

        let params = std::mem::take(&mut self.message_params);
        let resolved = catalog.message(&self.code, &params, locale);
        let internal = std::mem::replace(&mut self.message, resolved);
        (!internal.is_empty()).then_some(internal)
    }
}
