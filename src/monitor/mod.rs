//! Usage monitoring: point-in-time storage snapshots, pressure classification,
//! human-readable byte formatting.

pub mod pressure;
pub mod snapshot;
