//! Pressure classification: usage percentage → Normal / High / Critical.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::core::config::ThresholdConfig;
use crate::monitor::snapshot::StorageSnapshot;

/// Coarse pressure state derived from the latest snapshot, never stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PressureLevel {
    /// Usage at or below the high threshold.
    Normal,
    /// Usage above the high threshold, at or below the critical one.
    High,
    /// Usage above the critical threshold; soft cleanup fires automatically.
    Critical,
}

impl PressureLevel {
    /// Whether the monitor pass triggers automatic cleanup at this level.
    #[must_use]
    pub fn triggers_cleanup(self) -> bool {
        matches!(self, Self::Critical)
    }
}

impl fmt::Display for PressureLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Normal => write!(f, "normal"),
            Self::High => write!(f, "high"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

/// Classification boundaries, in percent used. Both are strictly-greater-than
/// boundaries: a reading exactly at a threshold stays in the lower level.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PressureThresholds {
    /// Boundary between Normal and High.
    pub high_pct: f64,
    /// Boundary between High and Critical.
    pub critical_pct: f64,
}

#[allow(missing_docs)]
impl PressureThresholds {
    #[must_use]
    pub fn new(high_pct: f64, critical_pct: f64) -> Self {
        Self {
            high_pct,
            critical_pct,
        }
    }

    #[must_use]
    pub fn from_config(config: &ThresholdConfig) -> Self {
        Self::new(config.high_pct, config.critical_pct)
    }

    /// Classify a usage percentage.
    #[must_use]
    pub fn classify_pct(&self, percentage_used: f64) -> PressureLevel {
        if percentage_used > self.critical_pct {
            PressureLevel::Critical
        } else if percentage_used > self.high_pct {
            PressureLevel::High
        } else {
            PressureLevel::Normal
        }
    }

    /// Classify a snapshot.
    #[must_use]
    pub fn classify(&self, snapshot: &StorageSnapshot) -> PressureLevel {
        self.classify_pct(snapshot.percentage_used())
    }
}

impl Default for PressureThresholds {
    fn default() -> Self {
        Self::from_config(&ThresholdConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn boundaries_are_strictly_greater_than() {
        let thresholds = PressureThresholds::default();
        assert_eq!(thresholds.classify_pct(80.0), PressureLevel::Normal);
        assert_eq!(thresholds.classify_pct(80.01), PressureLevel::High);
        assert_eq!(thresholds.classify_pct(95.0), PressureLevel::High);
        assert_eq!(thresholds.classify_pct(95.01), PressureLevel::Critical);
    }

    #[test]
    fn extremes_classify_sanely() {
        let thresholds = PressureThresholds::default();
        assert_eq!(thresholds.classify_pct(0.0), PressureLevel::Normal);
        assert_eq!(thresholds.classify_pct(100.0), PressureLevel::Critical);
        // Estimation slack can push usage past 100%.
        assert_eq!(thresholds.classify_pct(120.0), PressureLevel::Critical);
    }

    #[test]
    fn levels_order_by_severity() {
        assert!(PressureLevel::Normal < PressureLevel::High);
        assert!(PressureLevel::High < PressureLevel::Critical);
    }

    #[test]
    fn only_critical_triggers_cleanup() {
        assert!(!PressureLevel::Normal.triggers_cleanup());
        assert!(!PressureLevel::High.triggers_cleanup());
        assert!(PressureLevel::Critical.triggers_cleanup());
    }

    #[test]
    fn display_is_lowercase() {
        assert_eq!(PressureLevel::Normal.to_string(), "normal");
        assert_eq!(PressureLevel::High.to_string(), "high");
        assert_eq!(PressureLevel::Critical.to_string(), "critical");
    }

    #[test]
    fn custom_thresholds_are_respected() {
        let thresholds = PressureThresholds::new(50.0, 75.0);
        assert_eq!(thresholds.classify_pct(50.0), PressureLevel::Normal);
        assert_eq!(thresholds.classify_pct(60.0), PressureLevel::High);
        assert_eq!(thresholds.classify_pct(76.0), PressureLevel::Critical);
    }
}
