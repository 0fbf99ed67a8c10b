//! # Member Token - Signed Session Tokens
//!
//! ## Components
//!
//! | Module | Purpose |
//! |--------|---------|
//! | `claims` | `SessionClaims` builder and required-claim checks |
//! | `key` | Per-token 32-byte HMAC key derivation |
//! | `token` | Compact `header.payload.signature` issue / validate |
//! | `audience` | Dot-delimited audience matching with `*` wildcards |
//! | `service` | `TokenService` holding issuer, audience and TTL settings |
//!
//! ## Security Properties
//!
//! - **HMAC-SHA256** over the compact signing input, verified in constant time
//! - **Per-token keys**: secret mixed with subject and a random header padding
//! - **Key hygiene**: derived keys are zeroed when dropped
//!
//! Token work is pure CPU and never suspends; the crate holds no global state.

#![warn(clippy::all)]
#![deny(unsafe_code)]
#![allow(missing_docs)]

pub mod audience;
pub mod claims;
pub mod errors;
pub mod key;
pub mod service;
pub mod token;

// Re-exports
pub use audience::match_audience;
pub use claims::{now_secs, ClaimsBuilder, RequiredClaims, SessionClaims};
pub use errors::TokenError;
pub use key::SigningKey;
pub use service::{TokenService, TokenSettings};
pub use token::{issue, validate, validate_at};
