//! View model for the storage status panel.
//!
//! Pure render contract for whatever widget the host uses: nothing is shown
//! while usage is Normal or unmeasurable; above the high threshold the panel
//! carries a pressure label, a human-formatted usage line, and a bar value
//! capped at 100% so estimation slack cannot overflow the widget.

use serde::Serialize;

use crate::monitor::pressure::{PressureLevel, PressureThresholds};
use crate::monitor::snapshot::StorageSnapshot;

/// Everything a status widget needs to render one panel.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StatusPanel {
    /// Pressure label.
    pub level: PressureLevel,
    /// Raw usage percentage; may exceed 100.
    pub percent_used: f64,
    /// Usage percentage clamped to [0, 100] for the proportional bar.
    pub bar_percent: f64,
    /// `"<used> / <quota>"` with scaled units.
    pub usage_label: String,
    /// Whether to render the manual "clear storage" action, which the host
    /// wires to [`StorageGuardian::perform_full_cleanup`].
    ///
    /// [`StorageGuardian::perform_full_cleanup`]: crate::guardian::StorageGuardian::perform_full_cleanup
    pub offer_cleanup: bool,
}

/// Derive the panel for the given snapshot, or `None` when nothing should
/// be rendered (no snapshot, or usage at or below the high threshold).
#[must_use]
pub fn status_panel(
    snapshot: Option<&StorageSnapshot>,
    thresholds: &PressureThresholds,
) -> Option<StatusPanel> {
    let snapshot = snapshot?;
    let level = thresholds.classify(snapshot);
    if level == PressureLevel::Normal {
        return None;
    }
    let percent_used = snapshot.percentage_used();
    Some(StatusPanel {
        level,
        percent_used,
        bar_percent: percent_used.min(100.0),
        usage_label: snapshot.usage_label(),
        offer_cleanup: level >= PressureLevel::High,
    })
}
