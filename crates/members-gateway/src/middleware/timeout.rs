//! Collaborator timeouts.
//!
//! The principal lookup sits on the path of every authenticated request, so it
//! is bounded.

use crate::domain::error::{MemberError, MemberResult};
use std::future::Future;
use std::time::Duration;
use tokio::time::timeout;
use tracing::warn;

/// Run `call`, failing with a `Storage` error if it takes longer than `limit`.
pub async fn bounded<T, F>(limit: Duration, operation: &'static str, call: F) -> MemberResult<T>
where
    F: Future<Output = MemberResult<T>>,
{
    match timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => {
            let timeout_ms = limit.as_millis() as u64;
            warn!(operation, timeout_ms, "Collaborator call timed out");
            Err(MemberError::storage(format!(
                "{operation} timed out after {timeout_ms}ms"
            )))
        }
    }
}
