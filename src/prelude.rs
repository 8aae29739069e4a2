//! Convenience re-exports for library consumers.
//!
//! ```rust,no_run
//! use storage_quota_guardian::prelude::*;
//! ```

// Core
pub use crate::core::config::Config;
pub use crate::core::errors::{GuardianError, Result};

// Stores
pub use crate::stores::memory::MemoryStores;
pub use crate::stores::{
    ByteCacheStore, DatabaseInfo, DocumentStore, KeyValueStore, SessionStore, StorageEstimate,
    StorageEstimator, StoreSet,
};

// Monitor
pub use crate::monitor::pressure::{PressureLevel, PressureThresholds};
pub use crate::monitor::snapshot::{StorageSnapshot, format_bytes};

// Cleanup
pub use crate::cleanup::executor::CleanupExecutor;
pub use crate::cleanup::protection::RetentionPolicy;
pub use crate::cleanup::report::{CleanupReport, CleanupTarget, CleanupTier, StepReport};

// Guardian
pub use crate::guardian::fault::{FaultSignal, NO_SPACE_MARKER, QUOTA_EXCEEDED_MARKER};
pub use crate::guardian::{GuardianHandle, MonitorOutcome, StorageGuardian};

// Status
pub use crate::status::{StatusPanel, status_panel};
