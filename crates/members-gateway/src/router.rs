use crate::domain::envelope::ResultEnvelope;
use crate::domain::routes::names;
use crate::domain::types::Exchange;
use crate::handlers::{params, MemberHandlers};
use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};
use tower::Service;

/// Innermost service: dispatches an [`Exchange`] to its handler.
///
/// Errors leave as `anyhow::Error`; the business layer above recovers any
/// [`MemberError`](crate::domain::error::MemberError) inside and wraps the rest.
#[derive(Clone)]
pub struct MembersService {
    handlers: Arc<MemberHandlers>,
}

impl MembersService {
    pub fn new(handlers: Arc<MemberHandlers>) -> Self {
        Self { handlers }
    }
}

impl Service<Exchange> for MembersService {
    type Response = ResultEnvelope;
    type Error = anyhow::Error;
    type Future = Pin<Box<dyn Future<Output = anyhow::Result<ResultEnvelope>> + Send>>;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, exchange: Exchange) -> Self::Future {
        let handlers = Arc::clone(&self.handlers);
        Box::pin(async move { route_request(&handlers, exchange).await })
    }
}

/// Route a member request to the appropriate handler.
///
/// Access requirements are enforced before this point, so handlers behind
/// member routes can rely on an authenticated principal in the context.
pub async fn route_request(
    handlers: &MemberHandlers,
    exchange: Exchange,
) -> anyhow::Result<ResultEnvelope> {
    let Exchange {
        trace_id,
        route,
        payload,
        context,
    } = exchange;

    let envelope = match route.name {
        names::SIGNUP => handlers.account.signup(params(payload)?).await?,
        names::LOGIN => handlers.session.login(trace_id, params(payload)?).await?,
        names::SOCIAL_LOGIN => {
            handlers
                .session
                .social_login(trace_id, params(payload)?)
                .await?
        }
        names::VERIFY_TOKEN => handlers.session.verify_token(params(payload)?).await?,
        names::ME => handlers.account.me(&context).await?,
        names::UPDATE => handlers.account.update(&context, params(payload)?).await?,
        names::DEREGISTER => handlers.account.deregister(&context, params(payload)?).await?,
        names::FIND_MEMBER => handlers.account.find(params(payload)?).await?,
        other => anyhow::bail!("route '{other}' is registered but has no handler"),
    };
    Ok(envelope)
}
