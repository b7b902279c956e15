//! In-memory store and oracle doubles for tests and simulation.

use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use async_trait::async_trait;

use crate::{
    policy::{CheckRequest, PolicyError, PolicyOracle, TagRequest},
    store::{SecretShare, SecretStore, StoreError, Tag},
};

/// In-memory [`SecretStore`] for testing and simulation.
///
/// Clones share state via `Arc`; persisted secrets can be inspected with
/// [`MemorySecretStore::created`].
#[derive(Clone, Default)]
pub struct MemorySecretStore {
    inner: Arc<Mutex<StoreInner>>,
}

#[derive(Default)]
struct StoreInner {
    secrets: HashMap<String, SecretShare>,
    created: Vec<SecretShare>,
}

impl MemorySecretStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed one secret.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned; acceptable for test code.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn with_secret(self, share: SecretShare) -> Self {
        self.inner.lock().expect("mutex poisoned").secrets.insert(share.id.clone(), share);
        self
    }

    /// Secrets persisted through [`SecretStore::create`], in order.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned; acceptable for test code.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn created(&self) -> Vec<SecretShare> {
        self.inner.lock().expect("mutex poisoned").created.clone()
    }
}

#[async_trait]
impl SecretStore for MemorySecretStore {
    #[allow(clippy::expect_used)]
    async fn get(&self, id: &str, _program: &str) -> Result<SecretShare, StoreError> {
        self.inner
            .lock()
            .expect("mutex poisoned")
            .secrets
            .get(id)
            .cloned()
            .ok_or_else(|| StoreError::new(format!("no secret with id {id}")))
    }

    #[allow(clippy::expect_used)]
    async fn create(&self, share: SecretShare) -> Result<(), StoreError> {
        let mut inner = self.inner.lock().expect("mutex poisoned");
        inner.secrets.insert(share.id.clone(), share.clone());
        inner.created.push(share);
        Ok(())
    }
}

/// In-memory [`PolicyOracle`] with a fixed decision and fixed tags.
///
/// Records every authorization request for inspection.
#[derive(Clone)]
pub struct MemoryPolicyOracle {
    decision: Result<bool, PolicyError>,
    tags: Vec<Tag>,
    checks: Arc<Mutex<Vec<CheckRequest>>>,
}

impl MemoryPolicyOracle {
    /// Oracle that approves everything and generates the given tags.
    #[must_use]
    pub fn allowing(tags: Vec<Tag>) -> Self {
        Self { decision: Ok(true), tags, checks: Arc::default() }
    }

    /// Oracle that denies everything.
    #[must_use]
    pub fn denying() -> Self {
        Self { decision: Ok(false), tags: Vec::new(), checks: Arc::default() }
    }

    /// Oracle whose authorization check errors.
    #[must_use]
    pub fn failing(message: &str) -> Self {
        Self { decision: Err(PolicyError::new(message)), tags: Vec::new(), checks: Arc::default() }
    }

    /// Authorization requests observed so far.
    ///
    /// # Panics
    ///
    /// Panics if the internal mutex is poisoned; acceptable for test code.
    #[allow(clippy::expect_used)]
    #[must_use]
    pub fn checks(&self) -> Vec<CheckRequest> {
        self.checks.lock().expect("mutex poisoned").clone()
    }
}

#[async_trait]
impl PolicyOracle for MemoryPolicyOracle {
    #[allow(clippy::expect_used)]
    async fn can_execute(&self, request: CheckRequest) -> Result<bool, PolicyError> {
        self.checks.lock().expect("mutex poisoned").push(request);
        self.decision.clone()
    }

    async fn generate_tags(&self, _request: TagRequest) -> Result<Vec<Tag>, PolicyError> {
        Ok(self.tags.clone())
    }
}
