//! Outbound ports for the members gateway.
//!
//! Storage and identity-provider failures are reported as `anyhow::Error` so
//! adapters can surface whatever their driver raises; the persistence layer
//! normalizes them before they reach business code.

use crate::domain::principal::Principal;
use async_trait::async_trait;

/// Member account storage.
#[async_trait]
pub trait PrincipalStore: Send + Sync {
    /// Look up by login id (the token subject).
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Principal>>;

    /// Look up by public handle (nickname).
    async fn find_by_handle(&self, handle: &str) -> anyhow::Result<Option<Principal>>;

    /// Write `principal` as one atomic step.
    ///
    /// The write only happens when the record currently stored under the id
    /// equals `replacing` (`None`: no record at all) and no other member holds
    /// the nickname. New accounts pass `None`; rejoins and profile changes pass
    /// the record they read before the change.
    async fn insert(&self, principal: Principal, replacing: Option<&Principal>) -> anyhow::Result<Insertion>;

    /// Insert or replace by id.
    async fn save(&self, principal: Principal) -> anyhow::Result<()>;
}

/// Result of [`PrincipalStore::insert`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Insertion {
    Inserted,
    /// The id is held by a record other than the one being replaced.
    IdTaken,
    /// Another member holds the nickname.
    HandleTaken,
}

/// Verified identity handed over by an external provider.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IdentityAssertion {
    pub email: String,
    pub display_name: String,
}

/// External identity provider (authorization code exchange only).
#[async_trait]
pub trait IdentityProvider: Send + Sync {
    async fn exchange(&self, code: &str) -> anyhow::Result<IdentityAssertion>;
}

/// Time source trait for testability
pub trait TimeSource: Send + Sync {
    /// Seconds since Unix epoch.
    fn now(&self) -> u64;

    fn now_millis(&self) -> u64 {
        self.now().saturating_mul(1_000)
    }
}

/// System time implementation
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemTimeSource;

impl TimeSource for SystemTimeSource {
    fn now(&self) -> u64 {
        member_token::now_secs()
    }

    fn now_millis(&self) -> u64 {
        std::time::SystemTime::now()
            .duration_since(std::time::UNIX_EPOCH)
            .map(|d| d.as_millis() as u64)
            .unwrap_or(0)
    }
}
