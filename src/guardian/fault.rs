//! Fault-signal classification.
//!
//! The host forwards whatever error/event text its fault channel produces;
//! classification is a plain substring check against the configured marker
//! list, nothing more.

use serde::{Deserialize, Serialize};

/// Marker emitted by browser hosts when a write exceeds the origin quota.
pub const QUOTA_EXCEEDED_MARKER: &str = "QuotaExceededError";
/// Marker emitted at the platform level when the disk itself is out of space.
pub const NO_SPACE_MARKER: &str = "FILE_ERROR_NO_SPACE";

/// A fault event as reported by the hosting application.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FaultSignal {
    message: String,
}

impl FaultSignal {
    /// Wrap a fault message.
    #[must_use]
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }

    /// The raw message text.
    #[must_use]
    pub fn message(&self) -> &str {
        &self.message
    }

    /// Whether the message contains any of the given markers.
    #[must_use]
    pub fn matches_any(&self, markers: &[String]) -> bool {
        markers
            .iter()
            .any(|marker| self.message.contains(marker.as_str()))
    }
}

impl From<&str> for FaultSignal {
    fn from(message: &str) -> Self {
        Self::new(message)
    }
}

impl From<String> for FaultSignal {
    fn from(message: String) -> Self {
        Self::new(message)
    }
}
