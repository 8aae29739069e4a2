//! SQG-prefixed error types with structured error codes.

#![allow(missing_docs)]

use std::path::PathBuf;

use thiserror::Error;

/// Shared `Result` alias for the project.
pub type Result<T> = std::result::Result<T, GuardianError>;

/// Top-level error type for the storage quota guardian.
#[derive(Debug, Error)]
pub enum GuardianError {
    #[error("[SQG-1001] invalid configuration: {details}")]
    InvalidConfig { details: String },

    #[error("[SQG-1002] missing configuration file: {path}")]
    MissingConfig { path: PathBuf },

    #[error("[SQG-1003] configuration parse failure in {context}: {details}")]
    ConfigParse {
        context: &'static str,
        details: String,
    },

    #[error("[SQG-2001] storage estimation not supported by this host")]
    EstimateUnsupported,

    #[error("[SQG-2002] storage estimation failed: {details}")]
    EstimateFailed { details: String },

    #[error("[SQG-2101] {store} store operation failed{}: {details}", item_suffix(.item))]
    StoreOp {
        store: &'static str,
        item: Option<String>,
        details: String,
    },

    #[error("[SQG-2201] serialization failure in {context}: {details}")]
    Serialization {
        context: &'static str,
        details: String,
    },

    #[error("[SQG-3001] IO failure at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

fn item_suffix(item: &Option<String>) -> String {
    item.as_ref()
        .map_or_else(String::new, |name| format!(" for {name}"))
}

impl GuardianError {
    /// Stable machine-parseable error code.
    #[must_use]
    pub const fn code(&self) -> &'static str {
        match self {
            Self::InvalidConfig { .. } => "SQG-1001",
            Self::MissingConfig { .. } => "SQG-1002",
            Self::ConfigParse { .. } => "SQG-1003",
            Self::EstimateUnsupported => "SQG-2001",
            Self::EstimateFailed { .. } => "SQG-2002",
            Self::StoreOp { .. } => "SQG-2101",
            Self::Serialization { .. } => "SQG-2201",
            Self::Io { .. } => "SQG-3001",
        }
    }

    /// Whether retrying might resolve the failure.
    #[must_use]
    pub const fn is_retryable(&self) -> bool {
        matches!(
            self,
            Self::EstimateFailed { .. } | Self::StoreOp { .. } | Self::Io { .. }
        )
    }

    /// Convenience constructor for per-item store failures.
    #[must_use]
    pub fn store_op(
        store: &'static str,
        item: impl Into<Option<String>>,
        details: impl Into<String>,
    ) -> Self {
        Self::StoreOp {
            store,
            item: item.into(),
            details: details.into(),
        }
    }
}

impl From<serde_json::Error> for GuardianError {
    fn from(value: serde_json::Error) -> Self {
        Self::Serialization {
            context: "serde_json",
            details: value.to_string(),
        }
    }
}

impl From<toml::de::Error> for GuardianError {
    fn from(value: toml::de::Error) -> Self {
        Self::ConfigParse {
            context: "toml",
            details: value.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all_variants() -> Vec<GuardianError> {
        vec![
            GuardianError::InvalidConfig {
                details: String::new(),
            },
            GuardianError::MissingConfig {
                path: PathBuf::new(),
            },
            GuardianError::ConfigParse {
                context: "",
                details: String::new(),
            },
            GuardianError::EstimateUnsupported,
            GuardianError::EstimateFailed {
                details: String::new(),
            },
            GuardianError::StoreOp {
                store: "key-value",
                item: None,
                details: String::new(),
            },
            GuardianError::Serialization {
                context: "",
                details: String::new(),
            },
            GuardianError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            },
        ]
    }

    #[test]
    fn error_codes_are_unique() {
        let codes: Vec<&str> = all_variants().iter().map(GuardianError::code).collect();
        let unique: std::collections::HashSet<&&str> = codes.iter().collect();
        assert_eq!(
            codes.len(),
            unique.len(),
            "error codes must be unique: {codes:?}"
        );
    }

    #[test]
    fn error_codes_have_sqg_prefix() {
        for err in &all_variants() {
            assert!(
                err.code().starts_with("SQG-"),
                "code {} must start with SQG-",
                err.code()
            );
        }
    }

    #[test]
    fn error_display_includes_code() {
        let err = GuardianError::InvalidConfig {
            details: "bad value".to_string(),
        };
        let msg = err.to_string();
        assert!(
            msg.contains("SQG-1001"),
            "display should contain error code: {msg}"
        );
        assert!(
            msg.contains("bad value"),
            "display should contain details: {msg}"
        );
    }

    #[test]
    fn store_op_display_names_the_item() {
        let err = GuardianError::store_op("cache", Some("assets-v2".to_string()), "delete failed");
        let msg = err.to_string();
        assert!(msg.contains("cache store"), "got: {msg}");
        assert!(msg.contains("assets-v2"), "got: {msg}");

        let bare = GuardianError::store_op("session", None, "clear failed");
        assert!(!bare.to_string().contains(" for "), "got: {bare}");
    }

    #[test]
    fn retryable_errors_are_correct() {
        assert!(
            GuardianError::EstimateFailed {
                details: String::new()
            }
            .is_retryable()
        );
        assert!(GuardianError::store_op("cache", None, "busy").is_retryable());
        assert!(
            GuardianError::Io {
                path: PathBuf::new(),
                source: std::io::Error::other("test"),
            }
            .is_retryable()
        );

        assert!(!GuardianError::EstimateUnsupported.is_retryable());
        assert!(
            !GuardianError::InvalidConfig {
                details: String::new()
            }
            .is_retryable()
        );
        assert!(
            !GuardianError::MissingConfig {
                path: PathBuf::new()
            }
            .is_retryable()
        );
    }

    #[test]
    fn from_serde_json_error() {
        let json_err = serde_json::from_str::<serde_json::Value>("not json").unwrap_err();
        let err: GuardianError = json_err.into();
        assert_eq!(err.code(), "SQG-2201");
    }

    #[test]
    fn from_toml_error() {
        let toml_err = toml::from_str::<toml::Value>("= invalid").unwrap_err();
        let err: GuardianError = toml_err.into();
        assert_eq!(err.code(), "SQG-1003");
    }
}
