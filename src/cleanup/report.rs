//! Cleanup outcome reports.
//!
//! Cleanup never returns `Err`: each step catches its own failures and the
//! report carries what was attempted, what was removed, and what failed, so
//! callers and tests can distinguish "nothing to do" from "everything broke".

use std::fmt;

use chrono::{DateTime, Utc};
use serde::Serialize;

/// Which cleanup policy produced a report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupTier {
    /// Protected keys and essential databases survive.
    Soft,
    /// Soft cleanup plus the document-database sweep, run concurrently.
    Full,
    /// Only critical keys survive; essential databases are deleted too.
    Emergency,
}

impl fmt::Display for CleanupTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Soft => write!(f, "soft"),
            Self::Full => write!(f, "full"),
            Self::Emergency => write!(f, "emergency"),
        }
    }
}

/// The backing store a step operated on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CleanupTarget {
    #[allow(missing_docs)]
    KeyValue,
    #[allow(missing_docs)]
    Session,
    #[allow(missing_docs)]
    ByteCache,
    #[allow(missing_docs)]
    Documents,
}

impl fmt::Display for CleanupTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::KeyValue => write!(f, "key-value"),
            Self::Session => write!(f, "session"),
            Self::ByteCache => write!(f, "byte-cache"),
            Self::Documents => write!(f, "documents"),
        }
    }
}

/// One caught failure inside a step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StepFailure {
    /// The key/cache/database involved, when the failure was per-item.
    pub item: Option<String>,
    /// Rendered error.
    pub error: String,
}

/// Outcome of one store sweep.
#[derive(Debug, Clone, Serialize)]
pub struct StepReport {
    /// Store the step operated on.
    pub target: CleanupTarget,
    /// Items actually removed (for the session store, 1 per successful clear).
    pub removed: usize,
    /// Items deliberately left in place by the retention policy.
    pub retained: usize,
    /// Failures caught and skipped over.
    pub failures: Vec<StepFailure>,
}

impl StepReport {
    /// Fresh step with zero counts.
    #[must_use]
    pub fn new(target: CleanupTarget) -> Self {
        Self {
            target,
            removed: 0,
            retained: 0,
            failures: Vec::new(),
        }
    }

    /// Record a caught failure.
    pub fn record_failure(&mut self, item: Option<String>, error: &impl fmt::Display) {
        self.failures.push(StepFailure {
            item,
            error: error.to_string(),
        });
    }

    /// Whether the step completed without any caught failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty()
    }
}

/// Aggregate outcome of a cleanup run.
#[derive(Debug, Clone, Serialize)]
pub struct CleanupReport {
    /// Policy tier that ran.
    pub tier: CleanupTier,
    /// When the run started.
    pub started_at: DateTime<Utc>,
    /// Per-store outcomes, in completion order.
    pub steps: Vec<StepReport>,
}

impl CleanupReport {
    /// Fresh report for a run starting now.
    #[must_use]
    pub fn new(tier: CleanupTier) -> Self {
        Self {
            tier,
            started_at: Utc::now(),
            steps: Vec::new(),
        }
    }

    /// Append a finished step.
    pub fn push_step(&mut self, step: StepReport) {
        self.steps.push(step);
    }

    /// Fold another report's steps into this one (used to join the two
    /// concurrent halves of a full cleanup).
    pub fn absorb(&mut self, other: Self) {
        self.steps.extend(other.steps);
    }

    /// Total items removed across all steps.
    #[must_use]
    pub fn total_removed(&self) -> usize {
        self.steps.iter().map(|step| step.removed).sum()
    }

    /// Total caught failures across all steps.
    #[must_use]
    pub fn total_failures(&self) -> usize {
        self.steps.iter().map(|step| step.failures.len()).sum()
    }

    /// Whether every step completed without a caught failure.
    #[must_use]
    pub fn is_clean(&self) -> bool {
        self.steps.iter().all(StepReport::is_clean)
    }

    /// The step for a given target, if it ran.
    #[must_use]
    pub fn step(&self, target: CleanupTarget) -> Option<&StepReport> {
        self.steps.iter().find(|step| step.target == target)
    }
}
