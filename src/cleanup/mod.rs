//! Tiered best-effort cleanup: retention policy, per-step reports, executor.

pub mod executor;
pub mod protection;
pub mod report;
