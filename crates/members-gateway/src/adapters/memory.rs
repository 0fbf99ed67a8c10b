//! In-process adapters for the outbound ports.
//!
//! Used by tests and local runs. The store can be switched into a failing
//! state to exercise storage-failure handling.

use crate::domain::principal::Principal;
use crate::ports::outbound::{IdentityAssertion, IdentityProvider, Insertion, PrincipalStore, TimeSource};
use anyhow::{anyhow, bail};
use async_trait::async_trait;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// `HashMap`-backed principal store keyed by id.
#[derive(Debug, Default)]
pub struct InMemoryPrincipalStore {
    members: RwLock<HashMap<String, Principal>>,
    unavailable: AtomicBool,
}

impl InMemoryPrincipalStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_members(members: impl IntoIterator<Item = Principal>) -> Self {
        let store = Self::new();
        store
            .members
            .write()
            .extend(members.into_iter().map(|p| (p.id.clone(), p)));
        store
    }

    /// Make every call fail until switched back.
    pub fn set_unavailable(&self, unavailable: bool) {
        self.unavailable.store(unavailable, Ordering::SeqCst);
    }

    pub fn len(&self) -> usize {
        self.members.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.members.read().is_empty()
    }

    fn check_available(&self) -> anyhow::Result<()> {
        if self.unavailable.load(Ordering::SeqCst) {
            bail!("connection refused: member store offline");
        }
        Ok(())
    }
}

#[async_trait]
impl PrincipalStore for InMemoryPrincipalStore {
    async fn find_by_id(&self, id: &str) -> anyhow::Result<Option<Principal>> {
        self.check_available()?;
        Ok(self.members.read().get(id).cloned())
    }

    async fn find_by_handle(&self, handle: &str) -> anyhow::Result<Option<Principal>> {
        self.check_available()?;
        Ok(self
            .members
            .read()
            .values()
            .find(|p| p.nickname == handle)
            .cloned())
    }

    async fn insert(&self, principal: Principal, replacing: Option<&Principal>) -> anyhow::Result<Insertion> {
        self.check_available()?;
        let mut members = self.members.write();

        if members.get(&principal.id) != replacing {
            return Ok(Insertion::IdTaken);
        }
        if members
            .values()
            .any(|p| p.nickname == principal.nickname && p.id != principal.id)
        {
            return Ok(Insertion::HandleTaken);
        }

        members.insert(principal.id.clone(), principal);
        Ok(Insertion::Inserted)
    }

    async fn save(&self, principal: Principal) -> anyhow::Result<()> {
        self.check_available()?;
        self.members.write().insert(principal.id.clone(), principal);
        Ok(())
    }
}

/// Identity provider answering from a fixed code table.
#[derive(Debug, Default)]
pub struct StaticIdentityProvider {
    assertions: HashMap<String, IdentityAssertion>,
}

impl StaticIdentityProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_code(mut self, code: &str, email: &str, display_name: &str) -> Self {
        self.assertions.insert(
            code.to_string(),
            IdentityAssertion {
                email: email.to_string(),
                display_name: display_name.to_string(),
            },
        );
        self
    }
}

#[async_trait]
impl IdentityProvider for StaticIdentityProvider {
    async fn exchange(&self, code: &str) -> anyhow::Result<IdentityAssertion> {
        self.assertions
            .get(code)
            .cloned()
            .ok_or_else(|| anyhow!("authorization code rejected by provider"))
    }
}

/// Clock that only moves when told to.
#[derive(Debug, Default)]
pub struct ManualClock {
    now: AtomicU64,
}

impl ManualClock {
    pub fn new(now: u64) -> Self {
        Self {
            now: AtomicU64::new(now),
        }
    }

    pub fn advance(&self, secs: u64) {
        self.now.fetch_add(secs, Ordering::SeqCst);
    }

    pub fn set(&self, now: u64) {
        self.now.store(now, Ordering::SeqCst);
    }
}

impl TimeSource for ManualClock {
    fn now(&self) -> u64 {
        self.now.load(Ordering::SeqCst)
    }
}
