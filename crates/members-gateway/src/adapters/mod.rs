//! Adapters for the members gateway.
//!
//! Infrastructure implementations: password hashing, in-process collaborators,
//! the axum response bridge, and error conversions from collaborator types.

pub mod error_conversions;
pub mod http;
pub mod memory;
pub mod password;

pub use http::{handle_member_request, inbound_from_parts};
pub use memory::{InMemoryPrincipalStore, ManualClock, StaticIdentityProvider};
