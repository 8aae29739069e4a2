#![forbid(unsafe_code)]

//! Storage Quota Guardian — origin-storage pressure monitoring with tiered
//! best-effort cleanup.
//!
//! Three-tier response to storage pressure:
//! 1. **Monitoring** — periodic usage-vs-quota snapshots classified as
//!    Normal / High / Critical
//! 2. **Soft cleanup** — evicts caches and unprotected keys automatically at
//!    Critical pressure, sparing an allowlist and "essential" databases
//! 3. **Emergency cleanup** — maximal eviction when the host reports an
//!    actual quota-exhaustion fault
//!
//! # Library usage
//!
//! Use the [`prelude`] for convenient access to the most common types:
//!
//! ```rust,no_run
//! use storage_quota_guardian::prelude::*;
//! ```
//!
//! Individual modules can also be imported directly:
//!
//! ```rust,no_run
//! use storage_quota_guardian::core::config::Config;
//! use storage_quota_guardian::guardian::StorageGuardian;
//! ```

pub mod prelude;

pub mod cleanup;
pub mod core;
pub mod guardian;
pub mod monitor;
pub mod status;
pub mod stores;
