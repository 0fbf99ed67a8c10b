//! Members gateway service - main entry point.
//!
//! Assembles the pipeline once at startup:
//! `BoundaryLayer → BusinessLayer → MembersService`.

use crate::domain::catalog::CodeCatalog;
use crate::domain::config::GatewayConfig;
use crate::domain::error::GatewayError;
use crate::domain::types::{InboundRequest, Responded};
use crate::handlers::MemberHandlers;
use crate::middleware::{BoundaryService, BusinessService, GuardedStore, MiddlewareStack};
use crate::ports::outbound::{IdentityProvider, PrincipalStore, TimeSource};
use crate::router::MembersService;
use member_token::TokenService;
use std::sync::Arc;
use tower::{ServiceBuilder, ServiceExt};
use tracing::info;

/// The assembled request pipeline.
pub type Pipeline = BoundaryService<BusinessService<MembersService>>;

/// Members gateway: the assembled pipeline plus the shared services it uses.
#[derive(Clone)]
pub struct MembersGateway {
    pipeline: Pipeline,
    tokens: Arc<TokenService>,
    catalog: Arc<CodeCatalog>,
}

impl MembersGateway {
    /// Build the gateway around an already loaded catalog.
    pub fn build(
        config: GatewayConfig,
        catalog: Arc<CodeCatalog>,
        store: Arc<dyn PrincipalStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, GatewayError> {
        config.validate()?;

        let tokens = Arc::new(TokenService::new(config.token_settings()));
        let store = GuardedStore::new(store);

        let handlers = Arc::new(MemberHandlers::new(
            &config,
            Arc::clone(&tokens),
            store.clone(),
            identity,
            Arc::clone(&clock),
        ));

        let stack = MiddlewareStack::from_config(
            &config,
            Arc::clone(&tokens),
            store,
            Arc::clone(&catalog),
            clock,
        );

        let pipeline = ServiceBuilder::new()
            .layer(stack.boundary)
            .layer(stack.business)
            .service(MembersService::new(handlers));

        info!(
            issuer = %config.token.issuer,
            service_audience = %config.token.service_audience,
            default_locale = %catalog.default_locale(),
            "Members gateway assembled"
        );

        Ok(Self {
            pipeline,
            tokens,
            catalog,
        })
    }

    /// Load the catalog named by `config`, then build.
    pub fn load(
        config: GatewayConfig,
        store: Arc<dyn PrincipalStore>,
        identity: Arc<dyn IdentityProvider>,
        clock: Arc<dyn TimeSource>,
    ) -> Result<Self, GatewayError> {
        let catalog = CodeCatalog::load(
            &config.catalog.dir,
            &config.catalog.locales,
            config.catalog.default_locale,
        )?;
        Self::build(config, Arc::new(catalog), store, identity, clock)
    }

    /// Run one request through the pipeline.
    pub async fn handle(&self, req: InboundRequest) -> Responded {
        match self.pipeline.clone().oneshot(req).await {
            Ok(responded) => responded,
            Err(never) => match never {},
        }
    }

    /// A handle on the pipeline for embedding in another tower stack.
    pub fn pipeline(&self) -> Pipeline {
        self.pipeline.clone()
    }

    pub fn tokens(&self) -> Arc<TokenService> {
        Arc::clone(&self.tokens)
    }

    pub fn catalog(&self) -> Arc<CodeCatalog> {
        Arc::clone(&self.catalog)
    }
}
