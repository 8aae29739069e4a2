//! Configuration system: TOML file + env var overrides + smart defaults.

#![allow(missing_docs)]

use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::errors::{GuardianError, Result};
use crate::guardian::fault::{NO_SPACE_MARKER, QUOTA_EXCEEDED_MARKER};

/// Full guardian configuration model.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Default)]
#[serde(default)]
pub struct Config {
    pub thresholds: ThresholdConfig,
    pub polling: PollingConfig,
    pub retention: RetentionConfig,
    pub faults: FaultConfig,
}

/// Pressure classification and low-space query thresholds, in percent used.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ThresholdConfig {
    /// Above this, usage is classified High.
    pub high_pct: f64,
    /// Above this, usage is classified Critical and soft cleanup fires.
    pub critical_pct: f64,
    /// Threshold backing the explicit low-space query.
    pub low_space_pct: f64,
}

/// Periodic monitor pass scheduling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct PollingConfig {
    pub interval_secs: u64,
    /// Run a monitor pass immediately when the polling task starts.
    pub run_on_start: bool,
}

/// Keys and database names that cleanup tiers must leave in place.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct RetentionConfig {
    /// Key-value entries that survive soft cleanup.
    pub protected_keys: Vec<String>,
    /// Key-value entries that survive even emergency cleanup.
    pub critical_keys: Vec<String>,
    /// Substring exempting a document database from soft cleanup.
    pub essential_marker: String,
}

/// Fault-signal classification.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct FaultConfig {
    /// Substrings in a fault message that indicate storage exhaustion.
    pub exhaustion_markers: Vec<String>,
}

impl Default for ThresholdConfig {
    fn default() -> Self {
        Self {
            high_pct: 80.0,
            critical_pct: 95.0,
            low_space_pct: 90.0,
        }
    }
}

impl Default for PollingConfig {
    fn default() -> Self {
        Self {
            interval_secs: 30,
            run_on_start: true,
        }
    }
}

impl Default for RetentionConfig {
    fn default() -> Self {
        Self {
            protected_keys: vec![
                "admin_session".to_string(),
                "language".to_string(),
                "theme".to_string(),
            ],
            critical_keys: vec!["admin_session".to_string()],
            essential_marker: "essential".to_string(),
        }
    }
}

impl Default for FaultConfig {
    fn default() -> Self {
        Self {
            exhaustion_markers: vec![
                QUOTA_EXCEEDED_MARKER.to_string(),
                NO_SPACE_MARKER.to_string(),
            ],
        }
    }
}

impl Config {
    /// Default configuration path.
    #[must_use]
    pub fn default_path() -> PathBuf {
        let home_dir = env::var_os("HOME").map_or_else(|| PathBuf::from("/tmp"), PathBuf::from);
        home_dir.join(".config").join("sqg").join("config.toml")
    }

    /// Load config from default or explicit path, then apply env overrides.
    ///
    /// Missing config file is not an error when loading from the default path;
    /// defaults are used.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let path_buf = path.map_or_else(Self::default_path, Path::to_path_buf);
        let is_explicit_path = path.is_some();

        let mut cfg = if path_buf.exists() {
            let raw = fs::read_to_string(&path_buf).map_err(|source| GuardianError::Io {
                path: path_buf.clone(),
                source,
            })?;
            let parsed: Self = toml::from_str(&raw)?;
            parsed
        } else if is_explicit_path {
            return Err(GuardianError::MissingConfig { path: path_buf });
        } else {
            Self::default()
        };

        cfg.apply_env_overrides_from(|key| env::var(key).ok())?;
        cfg.validate()?;
        Ok(cfg)
    }

    /// Parse config from a TOML string, without env overrides.
    pub fn from_toml_str(raw: &str) -> Result<Self> {
        let cfg: Self = toml::from_str(raw)?;
        cfg.validate()?;
        Ok(cfg)
    }

    fn apply_env_overrides_from<F>(&mut self, mut lookup: F) -> Result<()>
    where
        F: FnMut(&str) -> Option<String>,
    {
        // thresholds
        if let Some(raw) = lookup("SQG_THRESHOLDS_HIGH_PCT") {
            self.thresholds.high_pct = parse_env_f64("SQG_THRESHOLDS_HIGH_PCT", &raw)?;
        }
        if let Some(raw) = lookup("SQG_THRESHOLDS_CRITICAL_PCT") {
            self.thresholds.critical_pct = parse_env_f64("SQG_THRESHOLDS_CRITICAL_PCT", &raw)?;
        }
        if let Some(raw) = lookup("SQG_THRESHOLDS_LOW_SPACE_PCT") {
            self.thresholds.low_space_pct = parse_env_f64("SQG_THRESHOLDS_LOW_SPACE_PCT", &raw)?;
        }

        // polling
        if let Some(raw) = lookup("SQG_POLLING_INTERVAL_SECS") {
            self.polling.interval_secs = parse_env_u64("SQG_POLLING_INTERVAL_SECS", &raw)?;
        }
        if let Some(raw) = lookup("SQG_POLLING_RUN_ON_START") {
            self.polling.run_on_start = parse_env_bool("SQG_POLLING_RUN_ON_START", &raw)?;
        }

        // retention
        if let Some(raw) = lookup("SQG_RETENTION_PROTECTED_KEYS") {
            self.retention.protected_keys = parse_env_list(&raw);
        }
        if let Some(raw) = lookup("SQG_RETENTION_CRITICAL_KEYS") {
            self.retention.critical_keys = parse_env_list(&raw);
        }
        if let Some(raw) = lookup("SQG_RETENTION_ESSENTIAL_MARKER") {
            self.retention.essential_marker = raw;
        }

        // faults
        if let Some(raw) = lookup("SQG_FAULT_EXHAUSTION_MARKERS") {
            self.faults.exhaustion_markers = parse_env_list(&raw);
        }

        Ok(())
    }

    /// Reject threshold and scheduling values that make the policy unsound.
    pub fn validate(&self) -> Result<()> {
        for (name, val) in [
            ("high_pct", self.thresholds.high_pct),
            ("critical_pct", self.thresholds.critical_pct),
            ("low_space_pct", self.thresholds.low_space_pct),
        ] {
            if !(0.0..=100.0).contains(&val) {
                return Err(GuardianError::InvalidConfig {
                    details: format!("thresholds.{name} must be in [0, 100], got {val}"),
                });
            }
        }

        if self.thresholds.high_pct >= self.thresholds.critical_pct {
            return Err(GuardianError::InvalidConfig {
                details: format!(
                    "thresholds.high_pct ({}) must be < thresholds.critical_pct ({})",
                    self.thresholds.high_pct, self.thresholds.critical_pct
                ),
            });
        }

        if self.polling.interval_secs == 0 {
            return Err(GuardianError::InvalidConfig {
                details: "polling.interval_secs must be >= 1".to_string(),
            });
        }

        if self.retention.essential_marker.is_empty() {
            return Err(GuardianError::InvalidConfig {
                details: "retention.essential_marker must not be empty".to_string(),
            });
        }

        if self.faults.exhaustion_markers.iter().any(String::is_empty) {
            return Err(GuardianError::InvalidConfig {
                details: "faults.exhaustion_markers must not contain empty strings".to_string(),
            });
        }

        Ok(())
    }

    /// Deterministic FNV-1a hash of the effective config for logging.
    pub fn stable_hash(&self) -> Result<String> {
        let canonical = serde_json::to_string(self)?;
        let mut hash: u64 = 0xcbf2_9ce4_8422_2325;
        for byte in canonical.as_bytes() {
            hash ^= u64::from(*byte);
            hash = hash.wrapping_mul(0x0100_0000_01b3);
        }
        Ok(format!("{hash:016x}"))
    }
}

fn parse_env_f64(key: &str, raw: &str) -> Result<f64> {
    raw.trim()
        .parse::<f64>()
        .map_err(|_| GuardianError::InvalidConfig {
            details: format!("{key} must be a number, got {raw:?}"),
        })
}

fn parse_env_u64(key: &str, raw: &str) -> Result<u64> {
    raw.trim()
        .parse::<u64>()
        .map_err(|_| GuardianError::InvalidConfig {
            details: format!("{key} must be a non-negative integer, got {raw:?}"),
        })
}

fn parse_env_bool(key: &str, raw: &str) -> Result<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        _ => Err(GuardianError::InvalidConfig {
            details: format!("{key} must be a boolean, got {raw:?}"),
        }),
    }
}

/// Comma-separated list, entries trimmed, empties dropped.
fn parse_env_list(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(ToString::to_string)
        .collect()
}
