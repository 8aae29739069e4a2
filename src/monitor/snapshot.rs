//! Point-in-time storage usage snapshots and byte formatting.
//!
//! A snapshot is an estimate, never authoritative: the host platform is
//! allowed to report approximate values, and `available_bytes` may come out
//! negative when the estimate lags actual usage.

#![allow(clippy::cast_precision_loss)]

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::stores::StorageEstimate;

/// Immutable usage-versus-quota reading, recomputed on each poll.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StorageSnapshot {
    /// Bytes currently consumed by the origin.
    pub used_bytes: u64,
    /// Total bytes available to the origin.
    pub quota_bytes: u64,
    /// When the estimate was taken.
    pub captured_at: DateTime<Utc>,
}

impl StorageSnapshot {
    /// Stamp a raw platform estimate with the current time.
    #[must_use]
    pub fn from_estimate(estimate: StorageEstimate) -> Self {
        Self {
            used_bytes: estimate.used_bytes,
            quota_bytes: estimate.quota_bytes,
            captured_at: Utc::now(),
        }
    }

    /// Remaining headroom. Negative when the usage estimate exceeds quota.
    #[must_use]
    #[allow(clippy::cast_possible_wrap)]
    pub fn available_bytes(&self) -> i64 {
        self.quota_bytes as i64 - self.used_bytes as i64
    }

    /// Usage as a percentage of quota; `0.0` when the quota is unknown/zero.
    #[must_use]
    pub fn percentage_used(&self) -> f64 {
        if self.quota_bytes == 0 {
            return 0.0;
        }
        (self.used_bytes as f64 / self.quota_bytes as f64) * 100.0
    }

    /// `"<used> / <quota>"` with scaled units, for log lines and status panels.
    #[must_use]
    pub fn usage_label(&self) -> String {
        format!(
            "{} / {}",
            format_bytes(self.used_bytes),
            format_bytes(self.quota_bytes)
        )
    }
}

const UNITS: [&str; 5] = ["B", "KB", "MB", "GB", "TB"];

/// Scale a byte count into B/KB/MB/GB/TB (base 1024), two decimal places
/// with trailing zeros trimmed.
#[must_use]
pub fn format_bytes(bytes: u64) -> String {
    if bytes == 0 {
        return "0 B".to_string();
    }
    let mut value = bytes as f64;
    let mut exponent = 0;
    while value >= 1024.0 && exponent < UNITS.len() - 1 {
        value /= 1024.0;
        exponent += 1;
    }
    let mut rendered = format!("{value:.2}");
    if rendered.contains('.') {
        while rendered.ends_with('0') {
            rendered.pop();
        }
        if rendered.ends_with('.') {
            rendered.pop();
        }
    }
    format!("{rendered} {}", UNITS[exponent])
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn snapshot(used: u64, quota: u64) -> StorageSnapshot {
        StorageSnapshot {
            used_bytes: used,
            quota_bytes: quota,
            captured_at: Utc::now(),
        }
    }

    #[test]
    fn percentage_for_half_full() {
        let snap = snapshot(500, 1000);
        assert!((snap.percentage_used() - 50.0).abs() < f64::EPSILON);
    }

    #[test]
    fn percentage_with_zero_quota_is_zero() {
        let snap = snapshot(500, 0);
        assert!((snap.percentage_used() - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn available_bytes_can_go_negative() {
        let snap = snapshot(1200, 1000);
        assert_eq!(snap.available_bytes(), -200);
    }

    #[test]
    fn from_estimate_copies_fields() {
        let snap = StorageSnapshot::from_estimate(StorageEstimate {
            used_bytes: 7,
            quota_bytes: 11,
        });
        assert_eq!(snap.used_bytes, 7);
        assert_eq!(snap.quota_bytes, 11);
    }

    #[test]
    fn usage_label_scales_both_sides() {
        let snap = snapshot(1536, 10 * 1024 * 1024);
        assert_eq!(snap.usage_label(), "1.5 KB / 10 MB");
    }

    #[test]
    fn format_bytes_zero() {
        assert_eq!(format_bytes(0), "0 B");
    }

    #[test]
    fn format_bytes_trims_trailing_zeros() {
        assert_eq!(format_bytes(1536), "1.5 KB");
        assert_eq!(format_bytes(1024), "1 KB");
        assert_eq!(format_bytes(1024 * 1024), "1 MB");
    }

    #[test]
    fn format_bytes_keeps_significant_decimals() {
        assert_eq!(format_bytes(1), "1 B");
        assert_eq!(format_bytes(1023), "1023 B");
        assert_eq!(format_bytes(1126), "1.1 KB");
        assert_eq!(format_bytes(1_288_490_189), "1.2 GB");
    }

    #[test]
    fn format_bytes_caps_at_terabytes() {
        let two_pb = 2 * 1024_u64.pow(5);
        assert_eq!(format_bytes(two_pb), "2048 TB");
    }

    proptest! {
        #[test]
        fn percentage_matches_ratio(used in 0_u64..1_u64 << 40, quota in 1_u64..1_u64 << 40) {
            let snap = snapshot(used, quota);
            let expected = (used as f64 / quota as f64) * 100.0;
            prop_assert!((snap.percentage_used() - expected).abs() < 1e-9);
        }

        #[test]
        fn format_bytes_never_panics_and_names_a_unit(bytes in any::<u64>()) {
            let rendered = format_bytes(bytes);
            prop_assert!(UNITS.iter().any(|unit| rendered.ends_with(unit)));
        }
    }
}
