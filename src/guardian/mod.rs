//! The storage guardian: snapshot queries, the periodic monitor pass,
//! fault-driven emergency cleanup, and the polling-task lifecycle.
//!
//! The guardian holds no persistent state of its own; it is a stateless
//! poller over the host-provided stores. Its only process-wide resource is
//! the polling task, created by an explicit [`StorageGuardian::start`] and
//! cancelled exactly once by [`GuardianHandle::stop`] (or on handle drop).

pub mod fault;

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::cleanup::executor::CleanupExecutor;
use crate::cleanup::protection::RetentionPolicy;
use crate::cleanup::report::{CleanupReport, CleanupTier};
use crate::core::config::Config;
use crate::core::errors::Result;
use crate::guardian::fault::FaultSignal;
use crate::monitor::pressure::{PressureLevel, PressureThresholds};
use crate::monitor::snapshot::StorageSnapshot;
use crate::stores::StoreSet;

/// What a single monitor pass observed and did.
#[derive(Debug)]
pub struct MonitorOutcome {
    /// Snapshot taken this pass, if the estimate was available.
    pub snapshot: Option<StorageSnapshot>,
    /// Classified pressure, when a snapshot was available.
    pub level: Option<PressureLevel>,
    /// Report of the automatic cleanup, when one fired.
    pub cleanup: Option<CleanupReport>,
}

/// Monitors origin-storage usage and runs tiered cleanup against the
/// host-provided stores.
#[derive(Debug)]
pub struct StorageGuardian {
    config: Config,
    thresholds: PressureThresholds,
    executor: CleanupExecutor,
    stores: StoreSet,
    snapshot_tx: watch::Sender<Option<StorageSnapshot>>,
}

impl StorageGuardian {
    /// Build a guardian over the given stores. Fails on invalid config.
    pub fn new(config: Config, stores: StoreSet) -> Result<Self> {
        config.validate()?;
        let retention = RetentionPolicy::from_config(&config.retention);
        let executor = CleanupExecutor::new(stores.clone(), retention);
        let (snapshot_tx, _) = watch::channel(None);
        Ok(Self {
            thresholds: PressureThresholds::from_config(&config.thresholds),
            config,
            executor,
            stores,
            snapshot_tx,
        })
    }

    /// Guardian with the default 80/95/90 policy.
    #[must_use]
    pub fn with_defaults(stores: StoreSet) -> Self {
        // Default config always validates.
        match Self::new(Config::default(), stores) {
            Ok(guardian) => guardian,
            Err(_) => unreachable!("default config is valid"),
        }
    }

    /// Effective configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Classification thresholds in use.
    #[must_use]
    pub fn thresholds(&self) -> PressureThresholds {
        self.thresholds
    }

    /// Query the platform estimate and publish it to subscribers.
    ///
    /// Any estimator failure is logged and reported as `None`; it never
    /// propagates. Subscribers see `None` too, so status surfaces go silent
    /// rather than showing stale numbers.
    pub async fn storage_info(&self) -> Option<StorageSnapshot> {
        match self.stores.estimator.estimate().await {
            Ok(estimate) => {
                let snapshot = StorageSnapshot::from_estimate(estimate);
                self.snapshot_tx.send_replace(Some(snapshot));
                Some(snapshot)
            }
            Err(err) => {
                warn!("failed to get storage estimate: {err}");
                self.snapshot_tx.send_replace(None);
                None
            }
        }
    }

    /// Most recently published snapshot, without querying the platform.
    #[must_use]
    pub fn latest_snapshot(&self) -> Option<StorageSnapshot> {
        *self.snapshot_tx.borrow()
    }

    /// Whether usage exceeds the configured low-space threshold (default 90%).
    ///
    /// Fails open: when no estimate is available this returns `false`, so an
    /// unmeasurable host never blocks functionality.
    pub async fn is_low_space(&self) -> bool {
        self.is_low_space_above(self.config.thresholds.low_space_pct)
            .await
    }

    /// [`Self::is_low_space`] against an explicit threshold.
    pub async fn is_low_space_above(&self, threshold_pct: f64) -> bool {
        self.storage_info()
            .await
            .is_some_and(|snapshot| snapshot.percentage_used() > threshold_pct)
    }

    /// One periodic policy evaluation: snapshot, classify, log, and at
    /// Critical pressure run soft cleanup automatically. Never fails.
    pub async fn run_monitor_pass(&self) -> MonitorOutcome {
        let Some(snapshot) = self.storage_info().await else {
            debug!("storage estimate unavailable, skipping monitor pass");
            return MonitorOutcome {
                snapshot: None,
                level: None,
                cleanup: None,
            };
        };

        let level = self.thresholds.classify(&snapshot);
        let pct = snapshot.percentage_used();
        let cleanup = match level {
            PressureLevel::Normal => {
                info!("storage usage: {pct:.1}% ({})", snapshot.usage_label());
                None
            }
            PressureLevel::High => {
                warn!("storage usage high: {pct:.1}% ({})", snapshot.usage_label());
                None
            }
            PressureLevel::Critical => {
                error!(
                    "storage critically full: {pct:.1}% ({})",
                    snapshot.usage_label()
                );
                info!("performing automatic cleanup");
                Some(self.executor.clear_caches().await)
            }
        };

        MonitorOutcome {
            snapshot: Some(snapshot),
            level: Some(level),
            cleanup,
        }
    }

    /// Soft cleanup; see [`CleanupExecutor::clear_caches`].
    pub async fn clear_caches(&self) -> CleanupReport {
        self.executor.clear_caches().await
    }

    /// Document-database cleanup; see [`CleanupExecutor::cleanup_databases`].
    pub async fn cleanup_databases(&self) -> CleanupReport {
        self.executor.cleanup_databases().await
    }

    /// Run soft cleanup and the document sweep concurrently, join both, and
    /// log a post-cleanup usage summary when one is available.
    pub async fn perform_full_cleanup(&self) -> CleanupReport {
        info!("performing full storage cleanup");
        let (soft, databases) = tokio::join!(
            self.executor.clear_caches(),
            self.executor.cleanup_databases(),
        );

        let mut report = CleanupReport::new(CleanupTier::Full);
        report.absorb(soft);
        report.absorb(databases);

        if let Some(snapshot) = self.storage_info().await {
            info!(
                "storage after cleanup: {:.1}% ({})",
                snapshot.percentage_used(),
                snapshot.usage_label()
            );
        }
        report
    }

    /// Emergency cleanup; see [`CleanupExecutor::emergency_cleanup`].
    pub async fn emergency_cleanup(&self) -> CleanupReport {
        self.executor.emergency_cleanup().await
    }

    /// Whether a fault signal carries one of the configured exhaustion markers.
    #[must_use]
    pub fn is_exhaustion_signal(&self, signal: &FaultSignal) -> bool {
        signal.matches_any(&self.config.faults.exhaustion_markers)
    }

    /// Handler the host invokes for every fault on its error channel.
    ///
    /// Non-matching signals are ignored. A matching signal triggers emergency
    /// cleanup; the report is returned and completion is logged, never thrown.
    pub async fn on_fault(&self, signal: &FaultSignal) -> Option<CleanupReport> {
        if !self.is_exhaustion_signal(signal) {
            return None;
        }
        error!(
            "storage exhaustion fault received ({}), performing emergency cleanup",
            signal.message()
        );
        let report = self.executor.emergency_cleanup().await;
        info!("emergency cleanup done, consider restarting the application");
        Some(report)
    }

    /// Subscribe to snapshot publications (for status widgets).
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<Option<StorageSnapshot>> {
        self.snapshot_tx.subscribe()
    }

    /// Spawn the periodic monitor task and hand back its lifecycle handle.
    ///
    /// The task runs a pass immediately when `polling.run_on_start` is set,
    /// then one per interval. A pass that overruns the interval delays the
    /// next tick rather than stacking; cleanup idempotency makes any residual
    /// overlap safe.
    #[must_use]
    pub fn start(self: &Arc<Self>) -> GuardianHandle {
        let guardian = Arc::clone(self);
        let (shutdown_tx, mut shutdown_rx) = watch::channel(false);
        let interval = Duration::from_secs(self.config.polling.interval_secs);
        let run_on_start = self.config.polling.run_on_start;

        let task = tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            if !run_on_start {
                // Swallow the interval's immediate first tick.
                ticker.tick().await;
            }
            info!(
                interval_secs = interval.as_secs(),
                "storage monitor started"
            );
            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        guardian.run_monitor_pass().await;
                    }
                    _ = shutdown_rx.changed() => {
                        debug!("storage monitor stopping");
                        break;
                    }
                }
            }
        });

        GuardianHandle {
            shutdown: shutdown_tx,
            task: Some(task),
        }
    }
}

/// Owns the polling task spawned by [`StorageGuardian::start`].
///
/// [`GuardianHandle::stop`] shuts the task down gracefully; dropping the
/// handle aborts it. Either way the task is cancelled exactly once.
#[derive(Debug)]
pub struct GuardianHandle {
    shutdown: watch::Sender<bool>,
    task: Option<JoinHandle<()>>,
}

impl GuardianHandle {
    /// Signal shutdown and wait for the task to finish.
    pub async fn stop(mut self) {
        let _ = self.shutdown.send(true);
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }

    /// Whether the polling task has exited.
    #[must_use]
    pub fn is_finished(&self) -> bool {
        self.task.as_ref().is_none_or(JoinHandle::is_finished)
    }
}

impl Drop for GuardianHandle {
    fn drop(&mut self) {
        if let Some(task) = &self.task {
            task.abort();
        }
    }
}
