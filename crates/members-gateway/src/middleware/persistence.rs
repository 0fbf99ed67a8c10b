//! Persistence layer.
//!
//! Wraps the [`PrincipalStore`] port. Whatever a store raises (driver errors,
//! panics) comes out as a single `Storage` kind; successful calls pass through
//! untouched. Each call is logged under the `MPR` tag with its duration.

use crate::domain::error::{MemberError, MemberResult};
use crate::domain::principal::Principal;
use crate::middleware::panic_message;
use crate::ports::outbound::{Insertion, PrincipalStore};
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, error};

/// Store decorator that normalizes every failure into [`ErrorKind::Storage`].
///
/// [`ErrorKind::Storage`]: crate::domain::error::ErrorKind::Storage
#[derive(Clone)]
pub struct GuardedStore {
    inner: Arc<dyn PrincipalStore>,
}

impl GuardedStore {
    pub fn new(inner: Arc<dyn PrincipalStore>) -> Self {
        Self { inner }
    }

    pub async fn find_by_id(&self, id: &str) -> MemberResult<Option<Principal>> {
        guard("find_by_id", self.inner.find_by_id(id)).await
    }

    pub async fn find_by_handle(&self, handle: &str) -> MemberResult<Option<Principal>> {
        guard("find_by_handle", self.inner.find_by_handle(handle)).await
    }

    pub async fn insert(&self, principal: Principal, replacing: Option<&Principal>) -> MemberResult<Insertion> {
        guard("insert", self.inner.insert(principal, replacing)).await
    }

    pub async fn save(&self, principal: Principal) -> MemberResult<()> {
        guard("save", self.inner.save(principal)).await
    }
}

async fn guard<T, F>(operation: &'static str, call: F) -> MemberResult<T>
where
    F: Future<Output = anyhow::Result<T>>,
{
    let started = Instant::now();
    let outcome = AssertUnwindSafe(call).catch_unwind().await;
    let elapsed_ms = started.elapsed().as_millis() as u64;

    let failure = match outcome {
        Ok(Ok(value)) => {
            debug!(layer = "MPR", operation, elapsed_ms, "Storage call completed");
            return Ok(value);
        }
        Ok(Err(e)) => format!("{e:#}"),
        Err(panic) => format!("panicked: {}", panic_message(panic.as_ref())),
    };

    error!(layer = "MPR", operation, elapsed_ms, error = %failure, "Storage call failed");
    Err(MemberError::storage(format!("{operation}: {failure}")))
}
