//! Ports (hexagonal boundaries) for the members gateway.

pub mod outbound;

pub use outbound::{
    IdentityAssertion, IdentityProvider, Insertion, PrincipalStore, SystemTimeSource, TimeSource,
};
