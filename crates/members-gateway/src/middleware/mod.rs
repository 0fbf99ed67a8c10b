//! Interception pipeline for member requests.
//!
//! Layer order: Request → Boundary → Business → Handler, with the persistence
//! guard wrapped around every store call the handlers or the boundary make.
//!
//! | Layer       | Tag | Failure it owns                        |
//! |-------------|-----|----------------------------------------|
//! | Boundary    | CTR | trace id, auth, final envelope, status |
//! | Business    | SVC | handler errors and panics → Unhandled  |
//! | Persistence | MPR | store errors and panics → Storage      |

pub mod boundary;
pub mod business;
pub mod persistence;
pub mod timeout;

pub use boundary::{BoundaryLayer, BoundaryService, BoundaryState};
pub use business::{BusinessLayer, BusinessService};
pub use persistence::GuardedStore;
pub use timeout::bounded;

use crate::domain::catalog::CodeCatalog;
use crate::domain::config::GatewayConfig;
use crate::ports::outbound::TimeSource;
use member_token::TokenService;
use std::any::Any;
use std::sync::Arc;

/// Middleware stack builder
pub struct MiddlewareStack {
    pub boundary: BoundaryLayer,
    pub business: BusinessLayer,
}

impl MiddlewareStack {
    /// Create middleware stack from gateway config
    pub fn from_config(
        config: &GatewayConfig,
        tokens: Arc<TokenService>,
        store: GuardedStore,
        catalog: Arc<CodeCatalog>,
        clock: Arc<dyn TimeSource>,
    ) -> Self {
        Self {
            boundary: BoundaryLayer::new(BoundaryState {
                tokens,
                store,
                catalog,
                clock,
                service_audience: config.token.service_audience.clone(),
                lookup_timeout: config.timeouts.principal_lookup(),
            }),
            business: BusinessLayer::new(),
        }
    }
}

/// Best-effort text of a panic payload.
pub(crate) fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "non-string panic payload".to_string()
    }
}
