//! Business layer.
//!
//! Every handler call yields either an envelope or a [`MemberError`]. Domain
//! errors pass through unchanged; any other failure, panics included, becomes
//! `Unhandled` with the original text kept as internal detail.

use crate::domain::error::{MemberError, MemberResult};
use crate::domain::envelope::ResultEnvelope;
use crate::domain::types::Exchange;
use crate::middleware::panic_message;
use futures::FutureExt;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::task::{Context, Poll};
use std::time::Instant;
use tower::{Layer, Service, ServiceExt};
use tracing::{debug, warn};

/// Business layer
#[derive(Clone, Default)]
pub struct BusinessLayer;

impl BusinessLayer {
    pub fn new() -> Self {
        Self
    }
}

impl<S> Layer<S> for BusinessLayer {
    type Service = BusinessService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BusinessService { inner }
    }
}

/// Business service
#[derive(Clone)]
pub struct BusinessService<S> {
    inner: S,
}

impl<S> Service<Exchange> for BusinessService<S>
where
    S: Service<Exchange, Response = ResultEnvelope> + Clone + Send + 'static,
    S::Error: Into<anyhow::Error>,
    S::Future: Send,
{
    type Response = ResultEnvelope;
    type Error = MemberError;
    type Future = Pin<Box<dyn Future<Output = MemberResult<ResultEnvelope>> + Send>>;

    fn poll_ready(&mut self, cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.inner
            .poll_ready(cx)
            .map_err(|e| normalize(e.into()))
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        let inner = self.inner.clone();
        let route = exchange.route.name;

        Box::pin(async move {
            let started = Instant::now();
            let outcome = AssertUnwindSafe(inner.oneshot(exchange)).catch_unwind().await;
            let elapsed_ms = started.elapsed().as_millis() as u64;

            let result = match outcome {
                Ok(Ok(envelope)) => Ok(envelope),
                Ok(Err(e)) => Err(normalize(e.into())),
                Err(panic) => Err(MemberError::unhandled(format!(
                    "handler panicked: {}",
                    panic_message(panic.as_ref())
                ))),
            };

            match &result {
                Ok(envelope) => debug!(
                    layer = "SVC",
                    route,
                    elapsed_ms,
                    result = envelope.result,
                    "Handler completed"
                ),
                Err(e) => warn!(
                    layer = "SVC",
                    route,
                    elapsed_ms,
                    kind = %e.kind,
                    code = e.code,
                    "Handler failed"
                ),
            }
            result
        })
    }
}

/// Keep a [`MemberError`] as raised; wrap anything else as `Unhandled`.
pub fn normalize(error: anyhow::Error) -> MemberError {
    match error.downcast::<MemberError>() {
        Ok(member) => member,
        Err(other) => MemberError::unhandled(format!("{other:#}")),
    }
}
