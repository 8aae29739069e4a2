//! Cleanup executor: best-effort sweeps over the backing stores.
//!
//! Every sweep is isolated: an enumeration failure abandons only that store,
//! a per-item failure skips only that item. Nothing here returns `Err`, and
//! all deletions are delete-if-present, so re-running a sweep is harmless.

use futures::future::join_all;
use tokio::join;
use tracing::{debug, info, warn};

use crate::cleanup::protection::RetentionPolicy;
use crate::cleanup::report::{CleanupReport, CleanupTarget, CleanupTier, StepReport};
use crate::stores::StoreSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum KeyRetention {
    Soft,
    Emergency,
}

/// Runs the cleanup tiers against a [`StoreSet`] under a [`RetentionPolicy`].
#[derive(Debug, Clone)]
pub struct CleanupExecutor {
    stores: StoreSet,
    retention: RetentionPolicy,
}

impl CleanupExecutor {
    /// Bind an executor to its stores and policy.
    #[must_use]
    pub fn new(stores: StoreSet, retention: RetentionPolicy) -> Self {
        Self { stores, retention }
    }

    /// The policy this executor enforces.
    #[must_use]
    pub fn retention(&self) -> &RetentionPolicy {
        &self.retention
    }

    /// Soft cleanup: evict unprotected key-value entries, clear the session
    /// store, delete every byte cache. The three sweeps run concurrently.
    pub async fn clear_caches(&self) -> CleanupReport {
        debug!("clearing caches");
        let mut report = CleanupReport::new(CleanupTier::Soft);

        let (key_value, session, caches) = join!(
            self.evict_key_value(KeyRetention::Soft),
            self.clear_session(),
            self.purge_caches(),
        );
        report.push_step(key_value);
        report.push_step(session);
        report.push_step(caches);

        info!(
            removed = report.total_removed(),
            failures = report.total_failures(),
            "cache clearing completed"
        );
        report
    }

    /// Delete every document database not marked essential.
    pub async fn cleanup_databases(&self) -> CleanupReport {
        let mut report = CleanupReport::new(CleanupTier::Soft);
        report.push_step(self.purge_documents(false).await);
        info!(
            removed = report.total_removed(),
            failures = report.total_failures(),
            "document database cleanup completed"
        );
        report
    }

    /// Emergency tier: only critical keys survive, the essential-database
    /// exemption does not apply. All four sweeps run concurrently.
    pub async fn emergency_cleanup(&self) -> CleanupReport {
        warn!("emergency storage cleanup initiated");
        let mut report = CleanupReport::new(CleanupTier::Emergency);

        let (key_value, session, caches, documents) = join!(
            self.evict_key_value(KeyRetention::Emergency),
            self.clear_session(),
            self.purge_caches(),
            self.purge_documents(true),
        );
        report.push_step(key_value);
        report.push_step(session);
        report.push_step(caches);
        report.push_step(documents);

        info!(
            removed = report.total_removed(),
            failures = report.total_failures(),
            "emergency cleanup completed"
        );
        report
    }

    async fn evict_key_value(&self, mode: KeyRetention) -> StepReport {
        let mut step = StepReport::new(CleanupTarget::KeyValue);
        let keys = match self.stores.key_value.keys().await {
            Ok(keys) => keys,
            Err(err) => {
                warn!("failed to enumerate key-value store: {err}");
                step.record_failure(None, &err);
                return step;
            }
        };

        for key in keys {
            let retained = match mode {
                KeyRetention::Soft => self.retention.retains_in_soft(&key),
                KeyRetention::Emergency => self.retention.retains_in_emergency(&key),
            };
            if retained {
                step.retained += 1;
                continue;
            }
            match self.stores.key_value.remove(&key).await {
                Ok(()) => step.removed += 1,
                Err(err) => {
                    warn!("failed to remove key {key}: {err}");
                    step.record_failure(Some(key), &err);
                }
            }
        }

        debug!(
            removed = step.removed,
            retained = step.retained,
            "key-value sweep finished"
        );
        step
    }

    async fn clear_session(&self) -> StepReport {
        let mut step = StepReport::new(CleanupTarget::Session);
        match self.stores.session.clear().await {
            Ok(()) => {
                step.removed = 1;
                debug!("cleared session store");
            }
            Err(err) => {
                warn!("failed to clear session store: {err}");
                step.record_failure(None, &err);
            }
        }
        step
    }

    async fn purge_caches(&self) -> StepReport {
        let mut step = StepReport::new(CleanupTarget::ByteCache);
        let names = match self.stores.caches.names().await {
            Ok(names) => names,
            Err(err) => {
                warn!("failed to enumerate byte caches: {err}");
                step.record_failure(None, &err);
                return step;
            }
        };

        debug!(count = names.len(), "found byte caches to clear");
        let deletions = join_all(names.into_iter().map(|name| async move {
            let outcome = self.stores.caches.delete(&name).await;
            (name, outcome)
        }))
        .await;

        for (name, outcome) in deletions {
            match outcome {
                Ok(true) => step.removed += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!("failed to delete cache {name}: {err}");
                    step.record_failure(Some(name), &err);
                }
            }
        }
        step
    }

    async fn purge_documents(&self, include_essential: bool) -> StepReport {
        let mut step = StepReport::new(CleanupTarget::Documents);
        let databases = match self.stores.documents.databases().await {
            Ok(databases) => databases,
            Err(err) => {
                warn!("failed to enumerate document databases: {err}");
                step.record_failure(None, &err);
                return step;
            }
        };

        debug!(count = databases.len(), "found document databases");
        let (essential, deletable): (Vec<_>, Vec<_>) = databases
            .into_iter()
            .partition(|db| !include_essential && self.retention.is_essential_database(&db.name));
        step.retained = essential.len();

        let deletions = join_all(deletable.into_iter().map(|db| async move {
            let outcome = self.stores.documents.delete(&db.name).await;
            (db.name, outcome)
        }))
        .await;

        for (name, outcome) in deletions {
            match outcome {
                Ok(true) => step.removed += 1,
                Ok(false) => {}
                Err(err) => {
                    warn!("failed to delete database {name}: {err}");
                    step.record_failure(Some(name), &err);
                }
            }
        }
        step
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cleanup::report::CleanupTarget;
    use crate::stores::memory::MemoryStores;

    fn executor(stores: &MemoryStores) -> CleanupExecutor {
        CleanupExecutor::new(stores.store_set(), RetentionPolicy::default())
    }

    fn seeded_stores() -> MemoryStores {
        let stores = MemoryStores::new(960, 1000);
        stores.key_value.insert("admin_session", "x");
        stores.key_value.insert("language", "cs");
        stores.key_value.insert("theme", "dark");
        stores.key_value.insert("scratch", "y");
        stores.session.insert("draft", "1");
        stores.caches.insert("assets-v1");
        stores.caches.insert("pages-v1");
        stores.documents.insert("app-data");
        stores.documents.insert("essential-config");
        stores
    }

    #[tokio::test]
    async fn clear_caches_retains_protected_keys() {
        let stores = seeded_stores();
        let report = executor(&stores).clear_caches().await;

        let remaining: Vec<String> = stores.key_value.contents().into_keys().collect();
        assert_eq!(remaining, vec!["admin_session", "language", "theme"]);
        assert!(stores.session.is_empty());
        assert!(stores.caches.cache_names().is_empty());
        // Document databases are untouched by the soft cache tier.
        assert_eq!(stores.documents.database_names().len(), 2);

        assert!(report.is_clean());
        assert_eq!(report.tier, CleanupTier::Soft);
        // scratch key + session clear + two caches.
        assert_eq!(report.total_removed(), 4);
        let keys = report.step(CleanupTarget::KeyValue).expect("key step");
        assert_eq!(keys.retained, 3);
    }

    #[tokio::test]
    async fn clear_caches_twice_is_idempotent() {
        let stores = seeded_stores();
        let exec = executor(&stores);
        exec.clear_caches().await;
        let contents_after_first = stores.key_value.contents();

        let second = exec.clear_caches().await;
        assert_eq!(stores.key_value.contents(), contents_after_first);
        assert!(second.is_clean());
        // Second pass only re-clears the (already empty) session store.
        assert_eq!(second.total_removed(), 1);
    }

    #[tokio::test]
    async fn cleanup_databases_skips_essential() {
        let stores = seeded_stores();
        let report = executor(&stores).cleanup_databases().await;

        assert_eq!(stores.documents.database_names(), vec!["essential-config"]);
        let step = report.step(CleanupTarget::Documents).expect("doc step");
        assert_eq!(step.removed, 1);
        assert_eq!(step.retained, 1);
    }

    #[tokio::test]
    async fn emergency_cleanup_keeps_only_critical_keys() {
        let stores = seeded_stores();
        let report = executor(&stores).emergency_cleanup().await;

        let remaining = stores.key_value.contents();
        assert_eq!(remaining.len(), 1);
        assert_eq!(remaining.get("admin_session").map(String::as_str), Some("x"));
        assert!(stores.session.is_empty());
        assert!(stores.caches.cache_names().is_empty());
        // The essential exemption does not apply in the emergency tier.
        assert!(stores.documents.database_names().is_empty());

        assert_eq!(report.tier, CleanupTier::Emergency);
        assert!(report.is_clean());
    }

    #[tokio::test]
    async fn failed_key_removal_does_not_abort_sweep() {
        let stores = seeded_stores();
        stores.key_value.insert("also-scratch", "z");
        stores.key_value.fail_removal_of("also-scratch");

        let report = executor(&stores).clear_caches().await;

        // The failing key stays, the other unprotected key still went away.
        let remaining = stores.key_value.contents();
        assert!(remaining.contains_key("also-scratch"));
        assert!(!remaining.contains_key("scratch"));

        let step = report.step(CleanupTarget::KeyValue).expect("key step");
        assert_eq!(step.failures.len(), 1);
        assert_eq!(
            step.failures[0].item.as_deref(),
            Some("also-scratch"),
            "failure should name the key"
        );
        assert!(!report.is_clean());
    }

    #[tokio::test]
    async fn failed_cache_deletion_is_isolated() {
        let stores = seeded_stores();
        stores.caches.fail_deletion_of("assets-v1");

        let report = executor(&stores).clear_caches().await;

        assert_eq!(stores.caches.cache_names(), vec!["assets-v1"]);
        let step = report.step(CleanupTarget::ByteCache).expect("cache step");
        assert_eq!(step.removed, 1);
        assert_eq!(step.failures.len(), 1);
    }

    #[tokio::test]
    async fn failed_session_clear_is_reported_not_thrown() {
        let stores = seeded_stores();
        stores.session.fail_clears();

        let report = executor(&stores).clear_caches().await;

        let step = report.step(CleanupTarget::Session).expect("session step");
        assert_eq!(step.removed, 0);
        assert_eq!(step.failures.len(), 1);
        // The other sweeps still ran.
        assert!(stores.caches.cache_names().is_empty());
    }

    #[tokio::test]
    async fn failed_database_deletion_does_not_block_others() {
        let stores = seeded_stores();
        stores.documents.insert("session-cache");
        stores.documents.fail_deletion_of("app-data");

        let report = executor(&stores).emergency_cleanup().await;

        let names = stores.documents.database_names();
        assert_eq!(names, vec!["app-data"]);
        let step = report.step(CleanupTarget::Documents).expect("doc step");
        assert_eq!(step.removed, 2);
        assert_eq!(step.failures.len(), 1);
    }
}
