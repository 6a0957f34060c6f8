//! Upgrade check: which variables in use are deprecated for a target series.

use crate::entry::{DeprecationEntry, ServerSeries, ServerVersion};
use crate::metrics::DeprecationMetrics;
use crate::registry::DeprecationRegistry;
use serde::Serialize;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, info};

/// A deprecated variable found in use.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Finding {
    pub variable: String,
    pub series: ServerSeries,
    /// Release the deprecation applies from, if pinned
    #[serde(skip_serializing_if = "Option::is_none")]
    pub since: Option<ServerVersion>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub replacement: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub note: Option<String>,
}

impl From<&DeprecationEntry> for Finding {
    fn from(entry: &DeprecationEntry) -> Self {
        Self {
            variable: entry.name().to_string(),
            series: entry.series(),
            since: entry.version(),
            replacement: entry.replacement().map(str::to_string),
            note: entry.note().map(str::to_string),
        }
    }
}

impl Finding {
    /// One-line description for display.
    pub fn message(&self) -> String {
        let mut message = format!("{} is deprecated in {}", self.variable, self.series);
        if let Some(since) = &self.since {
            message.push_str(&format!(" as of {}", since));
        }
        if let Some(replacement) = &self.replacement {
            message.push_str(&format!("; use {} instead", replacement));
        }
        if let Some(note) = &self.note {
            message.push_str(&format!(" ({})", note));
        }
        message
    }
}

/// Result of checking a set of variables against a series.
#[derive(Debug, Clone, Serialize)]
pub struct UpgradeReport {
    pub series: ServerSeries,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub version: Option<ServerVersion>,
    pub checked: usize,
    pub findings: Vec<Finding>,
}

impl UpgradeReport {
    pub fn is_clean(&self) -> bool {
        self.findings.is_empty()
    }

    /// Pretty-printed JSON form of the report.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }
}

/// Checks configured variables against the deprecation registry.
pub struct UpgradeChecker<'a> {
    registry: &'a DeprecationRegistry,
    metrics: Option<Arc<DeprecationMetrics>>,
}

impl<'a> UpgradeChecker<'a> {
    pub fn new(registry: &'a DeprecationRegistry) -> Self {
        Self {
            registry,
            metrics: None,
        }
    }

    pub fn with_metrics(mut self, metrics: Arc<DeprecationMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Check `variables` for `series`, optionally at a specific `version`.
    ///
    /// Findings follow input order; repeated names are checked once.
    pub fn check<I, S>(
        &self,
        variables: I,
        series: ServerSeries,
        version: Option<ServerVersion>,
    ) -> UpgradeReport
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let series_label = series.to_string();
        let mut seen = HashSet::new();
        let mut findings = Vec::new();

        for variable in variables {
            let name = variable.as_ref().trim();
            if name.is_empty() || !seen.insert(name.to_string()) {
                continue;
            }

            let deprecated = match &version {
                Some(v) => self.registry.is_deprecated_as_of(name, series, v),
                None => self.registry.is_deprecated(name, series),
            };

            if let Some(metrics) = &self.metrics {
                metrics.record_check(&series_label, deprecated);
            }

            if !deprecated {
                continue;
            }

            // Present whenever the deprecation check above passed.
            if let Ok(entry) = self.registry.get(name, series) {
                debug!(series = %series, variable = %name, "Deprecated variable in use");
                if let Some(metrics) = &self.metrics {
                    metrics.record_finding(&series_label, name);
                }
                findings.push(Finding::from(entry));
            }
        }

        info!(
            series = %series,
            version = ?version,
            checked = seen.len(),
            findings = findings.len(),
            "Upgrade check complete"
        );

        UpgradeReport {
            series,
            version,
            checked: seen.len(),
            findings,
        }
    }

    /// Every variable recorded for `series`, for a full review before upgrade.
    pub fn pending_review(&self, series: ServerSeries) -> Vec<Finding> {
        self.registry
            .variables_deprecated_in_series(&series)
            .map(Finding::from)
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_registry() -> DeprecationRegistry {
        DeprecationRegistry::from_entries(vec![
            DeprecationEntry::new("innodb_locks_unsafe_for_binlog", ServerSeries::V5_7).unwrap(),
            DeprecationEntry::since(
                "query_cache_size",
                ServerSeries::V5_7,
                ServerVersion::new(5, 7, 20),
            )
            .unwrap()
            .with_note("Query cache removed in 8.0"),
            DeprecationEntry::since(
                "tx_isolation",
                ServerSeries::V5_7,
                ServerVersion::new(5, 7, 20),
            )
            .unwrap()
            .with_replacement("transaction_isolation"),
        ])
        .unwrap()
    }

    #[test]
    fn test_check_without_version() {
        let registry = test_registry();
        let checker = UpgradeChecker::new(&registry);
        let report = checker.check(
            ["max_connections", "query_cache_size", "innodb_locks_unsafe_for_binlog"],
            ServerSeries::V5_7,
            None,
        );

        assert_eq!(report.checked, 3);
        let names: Vec<_> = report.findings.iter().map(|f| f.variable.as_str()).collect();
        assert_eq!(names, vec!["query_cache_size", "innodb_locks_unsafe_for_binlog"]);
        assert!(!report.is_clean());
    }

    #[test]
    fn test_check_with_version_before_threshold() {
        let registry = test_registry();
        let checker = UpgradeChecker::new(&registry);
        let report = checker.check(
            vec!["query_cache_size".to_string(), "innodb_locks_unsafe_for_binlog".to_string()],
            ServerSeries::V5_7,
            Some(ServerVersion::new(5, 7, 19)),
        );

        assert_eq!(report.findings.len(), 1);
        assert_eq!(report.findings[0].variable, "innodb_locks_unsafe_for_binlog");
    }

    #[test]
    fn test_duplicates_and_blanks_are_skipped() {
        let registry = test_registry();
        let checker = UpgradeChecker::new(&registry);
        let report = checker.check(
            ["tx_isolation", " tx_isolation ", "", "tx_isolation"],
            ServerSeries::V5_7,
            None,
        );

        assert_eq!(report.checked, 1);
        assert_eq!(report.findings.len(), 1);
        assert_eq!(
            report.findings[0].replacement.as_deref(),
            Some("transaction_isolation")
        );
    }

    #[test]
    fn test_other_series_is_clean() {
        let registry = test_registry();
        let checker = UpgradeChecker::new(&registry);
        let report = checker.check(["query_cache_size"], ServerSeries::V8_0, None);
        assert!(report.is_clean());
    }

    #[test]
    fn test_pending_review() {
        let registry = test_registry();
        let checker = UpgradeChecker::new(&registry);
        let pending = checker.pending_review(ServerSeries::V5_7);
        assert_eq!(pending.len(), 3);
        assert!(checker.pending_review(ServerSeries::V8_0).is_empty());
    }

    #[test]
    fn test_finding_message() {
        let registry = test_registry();
        let checker = UpgradeChecker::new(&registry);
        let report = checker.check(["tx_isolation", "query_cache_size"], ServerSeries::V5_7, None);

        let msg = report.findings[0].message();
        assert!(msg.contains("tx_isolation"));
        assert!(msg.contains("5.7.20"));
        assert!(msg.contains("transaction_isolation"));

        let msg = report.findings[1].message();
        assert!(msg.contains("Query cache removed"));
    }

    #[test]
    fn test_report_json() {
        let registry = test_registry();
        let checker = UpgradeChecker::new(&registry);
        let report = checker.check(
            ["query_cache_size"],
            ServerSeries::V5_7,
            Some(ServerVersion::new(5, 7, 30)),
        );

        let json = report.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(value["series"], "5.7");
        assert_eq!(value["version"], "5.7.30");
        assert_eq!(value["findings"][0]["variable"], "query_cache_size");
        assert_eq!(value["findings"][0]["since"], "5.7.20");
        assert!(value["findings"][0].get("replacement").is_none());
    }

    #[test]
    fn test_metrics_tracking() {
        let registry = test_registry();
        let metrics = Arc::new(DeprecationMetrics::new("test").unwrap());
        let checker = UpgradeChecker::new(&registry).with_metrics(metrics.clone());
        checker.check(["query_cache_size", "max_connections"], ServerSeries::V5_7, None);

        let output = metrics.encode().unwrap();
        assert!(output.contains("test_checks_total{outcome=\"deprecated\",series=\"5.7\"} 1"));
        assert!(output.contains("test_checks_total{outcome=\"ok\",series=\"5.7\"} 1"));
        assert!(output.contains("test_findings_total{series=\"5.7\",variable=\"query_cache_size\"} 1"));
    }
}
