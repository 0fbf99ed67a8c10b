//! Domain types for the members gateway.
//!
//! Envelope, code catalog, request context, principal model, routes and
//! configuration. Nothing in here performs I/O except catalog loading at
//! startup.

pub mod catalog;
pub mod config;
pub mod context;
pub mod correlation;
pub mod envelope;
pub mod error;
pub mod principal;
pub mod routes;
pub mod types;

// Re-exports for convenience
pub use catalog::{CatalogError, CodeCatalog, Locale};
pub use config::{ConfigError, GatewayConfig};
pub use context::{keys, ContextScope, ContextValue, RequestContext};
pub use correlation::TraceId;
pub use envelope::ResultEnvelope;
pub use error::{codes, ErrorKind, GatewayError, MemberError, MemberResult};
pub use principal::{Agency, MemberStatus, MemberView, Principal, Role};
pub use routes::{get_route_info, is_route_supported, Access, RouteInfo};
pub use types::*;
