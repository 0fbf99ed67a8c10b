//! Boundary layer: the outermost stage of every request.
//!
//! 1. Assign a trace id and seed a fresh [`RequestContext`].
//! 2. For routes that need a member: read the session token, validate it and
//!    its audience, look the principal up under a timeout, reject accounts that
//!    may not hold a session, check the role floor.
//! 3. Hand an [`Exchange`] to the business layer.
//! 4. Turn the outcome into a finalized envelope and HTTP status, log it under
//!    the `CTR` tag, clear the context.
//!
//! Every failure on the way, including a panic anywhere below, still ends in a
//! [`Responded`]; the service error type is `Infallible`.

use crate::domain::catalog::{CodeCatalog, Locale};
use crate::domain::context::{keys, ContextValue, RequestContext};
use crate::domain::correlation::TraceId;
use crate::domain::envelope::ResultEnvelope;
use crate::domain::error::{ErrorKind, MemberError, MemberResult};
use crate::domain::principal::Principal;
use crate::domain::routes::{get_route_info, Access};
use crate::domain::types::{Exchange, InboundRequest, Responded, Stage};
use crate::middleware::persistence::GuardedStore;
use crate::middleware::timeout::bounded;
use crate::middleware::panic_message;
use crate::ports::outbound::TimeSource;
use axum::http::StatusCode;
use futures::FutureExt;
use member_token::TokenService;
use std::convert::Infallible;
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use std::time::{Duration, Instant};
use tower::{Layer, Service, ServiceExt};
use tracing::{debug, error, field, info, info_span, warn, Instrument, Span};

/// Collaborators the boundary layer needs.
pub struct BoundaryState {
    pub tokens: Arc<TokenService>,
    pub store: GuardedStore,
    pub catalog: Arc<CodeCatalog>,
    pub clock: Arc<dyn TimeSource>,
    /// Audience presented tokens must cover
    pub service_audience: String,
    pub lookup_timeout: Duration,
}

impl BoundaryState {
    /// Resolve the caller of a protected route.
    async fn authenticate(&self, req: &InboundRequest, access: Access) -> MemberResult<Principal> {
        let token = req
            .session_token()
            .ok_or_else(|| MemberError::authentication("session token missing"))?;

        let claims =
            self.tokens
                .authenticate_at(token, Some(self.service_audience.as_str()), self.clock.now())?;

        let principal = bounded(
            self.lookup_timeout,
            "principal_lookup",
            self.store.find_by_id(claims.subject()),
        )
        .await?
        .ok_or_else(|| {
            MemberError::authentication(format!("no member for subject '{}'", claims.subject()))
        })?;

        principal.ensure_loginable()?;

        if let Some(required) = access.required_role() {
            if !principal.has_role(required) {
                return Err(MemberError::authorization(format!(
                    "member '{}' has role {}, route requires {}",
                    principal.id, principal.role, required
                )));
            }
        }

        debug!(member = %principal.id, role = %principal.role, "Caller authenticated");
        Ok(principal)
    }

    fn locale_for(&self, req: &InboundRequest) -> Locale {
        req.header("accept-language")
            .and_then(Locale::from_accept_language)
            .unwrap_or_else(|| self.catalog.default_locale())
    }
}

/// Boundary layer
#[derive(Clone)]
pub struct BoundaryLayer {
    state: Arc<BoundaryState>,
}

impl BoundaryLayer {
    pub fn new(state: BoundaryState) -> Self {
        Self {
            state: Arc::new(state),
        }
    }

    pub fn state(&self) -> Arc<BoundaryState> {
        Arc::clone(&self.state)
    }
}

impl<S> Layer<S> for BoundaryLayer {
    type Service = BoundaryService<S>;

    fn layer(&self, inner: S) -> Self::Service {
        BoundaryService {
            inner,
            state: Arc::clone(&self.state),
        }
    }
}

/// Boundary service
#[derive(Clone)]
pub struct BoundaryService<S> {
    inner: S,
    state: Arc<BoundaryState>,
}

impl<S> Service<InboundRequest> for BoundaryService<S>
where
    S: Service<Exchange, Response = ResultEnvelope, Error = MemberError> + Clone + Send + 'static,
    S::Future: Send,
{
    type Response = Responded;
    type Error = Infallible;
    type Future = Pin<Box<dyn Future<Output = Result<Responded, Infallible>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        // Readiness of the inner service is awaited per request by `oneshot`.
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: InboundRequest) -> Self::Future {
        let state = Arc::clone(&self.state);
        let inner = self.inner.clone();

        let trace_id = TraceId::new();
        let span = info_span!(
            "member_request",
            tid = %trace_id,
            route = %req.route,
            code = field::Empty,
            status = field::Empty,
        );

        Box::pin(async move { Ok(respond(state, inner, trace_id, req).await) }.instrument(span))
    }
}

async fn respond<S>(
    state: Arc<BoundaryState>,
    inner: S,
    trace_id: TraceId,
    req: InboundRequest,
) -> Responded
where
    S: Service<Exchange, Response = ResultEnvelope, Error = MemberError> + Send,
    S::Future: Send,
{
    let started = Instant::now();
    let tid = trace_id.to_string();
    let locale = state.locale_for(&req);
    let mut stages = vec![Stage::Received];

    let context = RequestContext::new();
    let _scope = context.scope();
    context.put_all([
        (keys::TRACE_ID, ContextValue::from(tid.as_str())),
        (
            keys::REQUEST_STARTED_AT,
            ContextValue::Int(state.clock.now_millis() as i64),
        ),
        (keys::ROUTE, ContextValue::from(req.route.as_str())),
        (keys::LOCALE, ContextValue::from(locale.alias())),
    ]);

    let outcome = AssertUnwindSafe(dispatch(&state, inner, trace_id, req, &context, &mut stages))
        .catch_unwind()
        .await
        .unwrap_or_else(|panic| {
            Err(MemberError::unhandled(format!(
                "request pipeline panicked: {}",
                panic_message(panic.as_ref())
            )))
        });

    let (status, mut envelope, failure) = match outcome {
        Ok(envelope) => (StatusCode::OK, envelope, None),
        Err(e) => (e.status(), ResultEnvelope::from_error(&e), Some(e)),
    };
    let internal = envelope.finalize(&tid, &state.catalog, locale);
    stages.push(Stage::ResultNormalized);

    log_outcome(status, &envelope, failure.as_ref(), internal, started);
    stages.push(Stage::Logged);
    stages.push(Stage::Responded);

    Responded {
        status,
        envelope,
        stages,
    }
}

async fn dispatch<S>(
    state: &BoundaryState,
    inner: S,
    trace_id: TraceId,
    req: InboundRequest,
    context: &RequestContext,
    stages: &mut Vec<Stage>,
) -> MemberResult<ResultEnvelope>
where
    S: Service<Exchange, Response = ResultEnvelope, Error = MemberError>,
{
    let route = get_route_info(&req.route)
        .ok_or_else(|| MemberError::validation(format!("unknown route '{}'", req.route)))?;

    if route.access.requires_auth() {
        let principal = state.authenticate(&req, route.access).await?;
        context.put(keys::PRINCIPAL, Arc::new(principal));
        stages.push(Stage::AuthChecked);
    }

    if let Some(reason) = req.body_error {
        return Err(MemberError::validation(format!("unreadable request body: {reason}")));
    }

    let exchange = Exchange {
        trace_id,
        route,
        payload: req.payload,
        context: context.clone(),
    };
    let result = inner.oneshot(exchange).await;
    stages.push(Stage::HandlerExecuted);
    result
}

fn log_outcome(
    status: StatusCode,
    envelope: &ResultEnvelope,
    failure: Option<&MemberError>,
    internal: Option<String>,
    started: Instant,
) {
    let span = Span::current();
    span.record("code", envelope.code.as_str());
    span.record("status", status.as_u16());
    let elapsed_ms = started.elapsed().as_millis() as u64;

    match failure {
        None => info!(
            layer = "CTR",
            elapsed_ms,
            result = envelope.result,
            "Request completed"
        ),
        Some(e) => match e.kind {
            ErrorKind::Storage | ErrorKind::Unhandled => error!(
                layer = "CTR",
                elapsed_ms,
                kind = %e.kind,
                detail = %e.detail,
                "Request failed"
            ),
            ErrorKind::Validation
            | ErrorKind::Authentication
            | ErrorKind::Authorization
            | ErrorKind::NotFound
            | ErrorKind::Conflict => warn!(
                layer = "CTR",
                elapsed_ms,
                kind = %e.kind,
                detail = %e.detail,
                "Request rejected"
            ),
        },
    }

    if let Some(message) = internal {
        debug!(layer = "CTR", internal_message = %message, "Business message replaced");
    }
}
