//! Trait seams for the host-provided storage backends.
//!
//! The guardian never talks to a platform API directly; hosts hand it one
//! implementation of each trait below. Every call is asynchronous and may
//! fail — the guardian treats each failure as local to that call and keeps
//! going. All mutations are delete-if-present, so repeating any of them is
//! harmless.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::core::errors::Result;

pub mod memory;

/// Raw `{used, quota}` pair as reported by the host platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageEstimate {
    /// Bytes currently consumed.
    pub used_bytes: u64,
    /// Total bytes available to the origin.
    pub quota_bytes: u64,
}

/// A named document database, as enumerated by the document store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DatabaseInfo {
    /// Database name; the retention policy inspects it for the essential marker.
    pub name: String,
}

/// Host capability reporting approximate usage against quota.
#[async_trait]
pub trait StorageEstimator: Send + Sync {
    /// Query the platform estimate. Implementations on hosts without an
    /// estimation capability return [`GuardianError::EstimateUnsupported`].
    ///
    /// [`GuardianError::EstimateUnsupported`]: crate::core::errors::GuardianError::EstimateUnsupported
    async fn estimate(&self) -> Result<StorageEstimate>;
}

/// Persistent string-keyed, string-valued store.
#[async_trait]
pub trait KeyValueStore: Send + Sync {
    /// All keys currently present.
    async fn keys(&self) -> Result<Vec<String>>;
    /// Delete one key. Removing an absent key is a no-op, not an error.
    async fn remove(&self, key: &str) -> Result<()>;
    /// Delete every key.
    async fn clear(&self) -> Result<()>;
}

/// Ephemeral per-session store; only ever cleared wholesale.
#[async_trait]
pub trait SessionStore: Send + Sync {
    /// Delete everything.
    async fn clear(&self) -> Result<()>;
}

/// Named byte caches, enumerated and deleted wholesale.
#[async_trait]
pub trait ByteCacheStore: Send + Sync {
    /// Names of all caches currently present.
    async fn names(&self) -> Result<Vec<String>>;
    /// Delete one cache by name; `false` when it did not exist.
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// Embedded document databases, enumerated and deleted by name.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// All databases currently present.
    async fn databases(&self) -> Result<Vec<DatabaseInfo>>;
    /// Delete one database by name; `false` when it did not exist.
    async fn delete(&self, name: &str) -> Result<bool>;
}

/// The full set of backends the guardian operates on.
#[derive(Clone)]
pub struct StoreSet {
    /// Storage estimation capability.
    pub estimator: Arc<dyn StorageEstimator>,
    /// Persistent key-value store.
    pub key_value: Arc<dyn KeyValueStore>,
    /// Ephemeral session store.
    pub session: Arc<dyn SessionStore>,
    /// Named byte-cache store.
    pub caches: Arc<dyn ByteCacheStore>,
    /// Embedded document database.
    pub documents: Arc<dyn DocumentStore>,
}

impl std::fmt::Debug for StoreSet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StoreSet").finish_non_exhaustive()
    }
}
