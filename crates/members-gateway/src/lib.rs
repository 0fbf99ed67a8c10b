// Allow missing docs for internal items in development
#![allow(missing_docs)]

//! Members gateway - session tokens and the request pipeline for member APIs.
//!
//! # Architecture
//!
//! ```text
//!   InboundRequest (route, headers, JSON payload)
//!          │
//!   ┌──────┴───────────────────────────────────────────────┐
//!   │ BoundaryLayer (CTR)                                   │
//!   │   trace id, context, token + audience, principal,     │
//!   │   role floor; envelope + status; context cleared      │
//!   └──────┬───────────────────────────────────────────────┘
//!   ┌──────┴───────────────────────────────────────────────┐
//!   │ BusinessLayer (SVC)                                   │
//!   │   MemberError passes, anything else → Unhandled       │
//!   └──────┬───────────────────────────────────────────────┘
//!   ┌──────┴───────────────────────────────────────────────┐
//!   │ MembersService → account / session handlers           │
//!   └──────┬───────────────────────────────────────────────┘
//!   ┌──────┴───────────────────────────────────────────────┐
//!   │ GuardedStore (MPR)                                    │
//!   │   any store failure → Storage                         │
//!   └──────┬───────────────────────────────────────────────┘
//!          ▼
//!   PrincipalStore / IdentityProvider (ports)
//! ```
//!
//! # Access levels
//!
//! - **Public**: signup, login, social login, token verification
//! - **Member**: any loginable member with a valid session token
//! - **AtLeast(role)**: member whose role is at or above the floor
//!
//! # Usage
//!
//! ```ignore
//! use members_gateway::{GatewayConfig, MembersGateway, InboundRequest};
//!
//! let config = GatewayConfig::from_env();
//! members_gateway::telemetry::init(&config.telemetry)?;
//! let gateway = MembersGateway::load(config, store, identity, Arc::new(SystemTimeSource))?;
//! let responded = gateway.handle(InboundRequest::new("members.me", json!({}))).await;
//! ```

#![warn(clippy::all)]
#![deny(unsafe_code)]

pub mod adapters;
pub mod domain;
pub mod handlers;
pub mod middleware;
pub mod ports;
pub mod router;
pub mod service;
pub mod telemetry;

// Re-exports for public API
pub use domain::catalog::{CodeCatalog, Locale};
pub use domain::config::GatewayConfig;
pub use domain::envelope::ResultEnvelope;
pub use domain::error::{codes, ErrorKind, GatewayError, MemberError, MemberResult};
pub use domain::principal::{Agency, MemberStatus, MemberView, Principal, Role};
pub use domain::routes::{get_route_info, is_route_supported, Access, RouteInfo};
pub use domain::types::*;
pub use ports::outbound::{
    IdentityAssertion, IdentityProvider, Insertion, PrincipalStore, SystemTimeSource, TimeSource,
};
pub use service::MembersGateway;

/// Crate version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
