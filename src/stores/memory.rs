//! In-memory reference backends with failure injection.
//!
//! These back the test suites and give hosts a working default while they
//! wire up real platform bindings. Failure injection is per item: a key,
//! cache, or database put on the fail list makes exactly that operation
//! error, which is how the best-effort batch semantics get exercised.

use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::core::errors::{GuardianError, Result};
use crate::stores::{
    ByteCacheStore, DatabaseInfo, DocumentStore, KeyValueStore, SessionStore, StorageEstimate,
    StorageEstimator, StoreSet,
};

// ──────────────────── estimator ────────────────────

#[derive(Debug, Clone)]
enum EstimatorState {
    Reporting(StorageEstimate),
    Unsupported,
    Failing(String),
}

/// Estimator reporting a settable `{used, quota}` pair.
#[derive(Debug)]
pub struct MemoryEstimator {
    state: Mutex<EstimatorState>,
}

impl MemoryEstimator {
    /// Estimator reporting the given usage.
    #[must_use]
    pub fn new(used_bytes: u64, quota_bytes: u64) -> Self {
        Self {
            state: Mutex::new(EstimatorState::Reporting(StorageEstimate {
                used_bytes,
                quota_bytes,
            })),
        }
    }

    /// Estimator behaving like a host without an estimation capability.
    #[must_use]
    pub fn unsupported() -> Self {
        Self {
            state: Mutex::new(EstimatorState::Unsupported),
        }
    }

    /// Estimator whose every query fails.
    #[must_use]
    pub fn failing(details: impl Into<String>) -> Self {
        Self {
            state: Mutex::new(EstimatorState::Failing(details.into())),
        }
    }

    /// Change the reported usage (e.g. to simulate growth between polls).
    pub fn set_usage(&self, used_bytes: u64, quota_bytes: u64) {
        *self.state.lock() = EstimatorState::Reporting(StorageEstimate {
            used_bytes,
            quota_bytes,
        });
    }

    /// Stop supporting estimation from now on.
    pub fn set_unsupported(&self) {
        *self.state.lock() = EstimatorState::Unsupported;
    }

    /// Fail every estimate query from now on.
    pub fn set_failing(&self, details: impl Into<String>) {
        *self.state.lock() = EstimatorState::Failing(details.into());
    }
}

#[async_trait]
impl StorageEstimator for MemoryEstimator {
    async fn estimate(&self) -> Result<StorageEstimate> {
        match self.state.lock().clone() {
            EstimatorState::Reporting(estimate) => Ok(estimate),
            EstimatorState::Unsupported => Err(GuardianError::EstimateUnsupported),
            EstimatorState::Failing(details) => Err(GuardianError::EstimateFailed { details }),
        }
    }
}

// ──────────────────── key-value store ────────────────────

/// String-keyed, string-valued store backed by a `BTreeMap`.
#[derive(Debug, Default)]
pub struct MemoryKeyValueStore {
    entries: Mutex<BTreeMap<String, String>>,
    fail_keys: Mutex<HashSet<String>>,
}

impl MemoryKeyValueStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Store seeded with the given entries.
    #[must_use]
    pub fn with_entries<K, V>(entries: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        let store = Self::new();
        {
            let mut guard = store.entries.lock();
            for (key, value) in entries {
                guard.insert(key.into(), value.into());
            }
        }
        store
    }

    /// Insert or replace one entry.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().insert(key.into(), value.into());
    }

    /// Current contents, for assertions.
    #[must_use]
    pub fn contents(&self) -> BTreeMap<String, String> {
        self.entries.lock().clone()
    }

    /// Make every future removal of `key` fail.
    pub fn fail_removal_of(&self, key: impl Into<String>) {
        self.fail_keys.lock().insert(key.into());
    }
}

#[async_trait]
impl KeyValueStore for MemoryKeyValueStore {
    async fn keys(&self) -> Result<Vec<String>> {
        Ok(self.entries.lock().keys().cloned().collect())
    }

    async fn remove(&self, key: &str) -> Result<()> {
        if self.fail_keys.lock().contains(key) {
            return Err(GuardianError::store_op(
                "key-value",
                Some(key.to_string()),
                "injected removal failure",
            ));
        }
        self.entries.lock().remove(key);
        Ok(())
    }

    async fn clear(&self) -> Result<()> {
        self.entries.lock().clear();
        Ok(())
    }
}

// ──────────────────── session store ────────────────────

/// Ephemeral store; supports whole-store clearing only.
#[derive(Debug, Default)]
pub struct MemorySessionStore {
    entries: Mutex<BTreeMap<String, String>>,
    fail_clear: AtomicBool,
}

impl MemorySessionStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert or replace one entry.
    pub fn insert(&self, key: impl Into<String>, value: impl Into<String>) {
        self.entries.lock().insert(key.into(), value.into());
    }

    /// Number of entries currently held.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    /// Whether the store holds no entries.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    /// Make every future clear fail.
    pub fn fail_clears(&self) {
        self.fail_clear.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl SessionStore for MemorySessionStore {
    async fn clear(&self) -> Result<()> {
        if self.fail_clear.load(Ordering::SeqCst) {
            return Err(GuardianError::store_op(
                "session",
                None,
                "injected clear failure",
            ));
        }
        self.entries.lock().clear();
        Ok(())
    }
}

// ──────────────────── byte-cache store ────────────────────

/// Named caches tracked as a name set; contents are irrelevant to cleanup.
#[derive(Debug, Default)]
pub struct MemoryByteCacheStore {
    caches: Mutex<BTreeSet<String>>,
    fail_names: Mutex<HashSet<String>>,
}

impl MemoryByteCacheStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a cache name.
    pub fn insert(&self, name: impl Into<String>) {
        self.caches.lock().insert(name.into());
    }

    /// Current cache names, for assertions.
    #[must_use]
    pub fn cache_names(&self) -> Vec<String> {
        self.caches.lock().iter().cloned().collect()
    }

    /// Make every future deletion of `name` fail.
    pub fn fail_deletion_of(&self, name: impl Into<String>) {
        self.fail_names.lock().insert(name.into());
    }
}

#[async_trait]
impl ByteCacheStore for MemoryByteCacheStore {
    async fn names(&self) -> Result<Vec<String>> {
        Ok(self.caches.lock().iter().cloned().collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        if self.fail_names.lock().contains(name) {
            return Err(GuardianError::store_op(
                "cache",
                Some(name.to_string()),
                "injected deletion failure",
            ));
        }
        Ok(self.caches.lock().remove(name))
    }
}

// ──────────────────── document store ────────────────────

/// Named document databases tracked as a name set.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    databases: Mutex<BTreeSet<String>>,
    fail_names: Mutex<HashSet<String>>,
}

impl MemoryDocumentStore {
    /// Empty store.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a database name.
    pub fn insert(&self, name: impl Into<String>) {
        self.databases.lock().insert(name.into());
    }

    /// Current database names, for assertions.
    #[must_use]
    pub fn database_names(&self) -> Vec<String> {
        self.databases.lock().iter().cloned().collect()
    }

    /// Make every future deletion of `name` fail.
    pub fn fail_deletion_of(&self, name: impl Into<String>) {
        self.fail_names.lock().insert(name.into());
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn databases(&self) -> Result<Vec<DatabaseInfo>> {
        Ok(self
            .databases
            .lock()
            .iter()
            .map(|name| DatabaseInfo { name: name.clone() })
            .collect())
    }

    async fn delete(&self, name: &str) -> Result<bool> {
        if self.fail_names.lock().contains(name) {
            return Err(GuardianError::store_op(
                "document",
                Some(name.to_string()),
                "injected deletion failure",
            ));
        }
        Ok(self.databases.lock().remove(name))
    }
}

// ──────────────────── bundled set ────────────────────

/// All five memory backends, kept as concrete types so tests can seed and
/// inspect them while the guardian sees only the trait objects.
#[derive(Debug, Clone)]
pub struct MemoryStores {
    #[allow(missing_docs)]
    pub estimator: Arc<MemoryEstimator>,
    #[allow(missing_docs)]
    pub key_value: Arc<MemoryKeyValueStore>,
    #[allow(missing_docs)]
    pub session: Arc<MemorySessionStore>,
    #[allow(missing_docs)]
    pub caches: Arc<MemoryByteCacheStore>,
    #[allow(missing_docs)]
    pub documents: Arc<MemoryDocumentStore>,
}

impl MemoryStores {
    /// Fresh empty backends with the given reported usage.
    #[must_use]
    pub fn new(used_bytes: u64, quota_bytes: u64) -> Self {
        Self {
            estimator: Arc::new(MemoryEstimator::new(used_bytes, quota_bytes)),
            key_value: Arc::new(MemoryKeyValueStore::new()),
            session: Arc::new(MemorySessionStore::new()),
            caches: Arc::new(MemoryByteCacheStore::new()),
            documents: Arc::new(MemoryDocumentStore::new()),
        }
    }

    /// The trait-object view handed to the guardian.
    #[must_use]
    pub fn store_set(&self) -> StoreSet {
        StoreSet {
            estimator: self.estimator.clone(),
            key_value: self.key_value.clone(),
            session: self.session.clone(),
            caches: self.caches.clone(),
            documents: self.documents.clone(),
        }
    }
}
