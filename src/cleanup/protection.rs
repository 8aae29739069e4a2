//! Retention policy: which keys and databases each cleanup tier must leave alone.

use std::collections::HashSet;

use crate::core::config::RetentionConfig;

/// Allowlists consulted before any deletion.
///
/// Soft cleanup retains the protected set plus the critical set; emergency
/// cleanup retains only the critical set. Document databases whose name
/// contains the essential marker are exempt from soft cleanup but not from
/// emergency cleanup.
#[derive(Debug, Clone)]
pub struct RetentionPolicy {
    protected_keys: HashSet<String>,
    critical_keys: HashSet<String>,
    essential_marker: String,
}

impl RetentionPolicy {
    /// Build from configuration.
    #[must_use]
    pub fn from_config(config: &RetentionConfig) -> Self {
        Self {
            protected_keys: config.protected_keys.iter().cloned().collect(),
            critical_keys: config.critical_keys.iter().cloned().collect(),
            essential_marker: config.essential_marker.clone(),
        }
    }

    /// Whether soft cleanup must keep this key-value entry.
    #[must_use]
    pub fn retains_in_soft(&self, key: &str) -> bool {
        self.protected_keys.contains(key) || self.critical_keys.contains(key)
    }

    /// Whether emergency cleanup must keep this key-value entry.
    #[must_use]
    pub fn retains_in_emergency(&self, key: &str) -> bool {
        self.critical_keys.contains(key)
    }

    /// Whether a document database is exempt from soft cleanup.
    #[must_use]
    pub fn is_essential_database(&self, name: &str) -> bool {
        name.contains(&self.essential_marker)
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self::from_config(&RetentionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_soft_retention_matches_allowlist() {
        let policy = RetentionPolicy::default();
        assert!(policy.retains_in_soft("admin_session"));
        assert!(policy.retains_in_soft("language"));
        assert!(policy.retains_in_soft("theme"));
        assert!(!policy.retains_in_soft("scratch"));
    }

    #[test]
    fn default_emergency_retention_keeps_only_session() {
        let policy = RetentionPolicy::default();
        assert!(policy.retains_in_emergency("admin_session"));
        assert!(!policy.retains_in_emergency("language"));
        assert!(!policy.retains_in_emergency("theme"));
    }

    #[test]
    fn critical_keys_are_implicitly_soft_protected() {
        let config = RetentionConfig {
            protected_keys: vec!["language".to_string()],
            critical_keys: vec!["auth_token".to_string()],
            essential_marker: "essential".to_string(),
        };
        let policy = RetentionPolicy::from_config(&config);
        assert!(policy.retains_in_soft("auth_token"));
        assert!(policy.retains_in_soft("language"));
        assert!(!policy.retains_in_emergency("language"));
    }

    #[test]
    fn essential_marker_matches_as_substring() {
        let policy = RetentionPolicy::default();
        assert!(policy.is_essential_database("essential-config"));
        assert!(policy.is_essential_database("app-essential-v2"));
        assert!(!policy.is_essential_database("app-data"));
    }
}
