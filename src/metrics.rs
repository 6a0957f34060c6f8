//! Metrics for deprecation checks.
//!
//! Provides Prometheus metrics for the registry contents and upgrade-check
//! outcomes.

use crate::config::MetricsConfig;
use crate::registry::DeprecationRegistry;
use prometheus::{IntCounterVec, IntGaugeVec, Opts, Registry};

/// Metrics collector for deprecation checks.
#[derive(Clone)]
pub struct DeprecationMetrics {
    /// Registry for all metrics
    registry: Registry,

    /// Number of deprecated variables known per series
    pub registered_variables: IntGaugeVec,

    /// Variables checked, by series and outcome
    pub checks_total: IntCounterVec,

    /// Deprecated variables found in use
    pub findings_total: IntCounterVec,
}

impl DeprecationMetrics {
    /// Create a new metrics collector with the given prefix.
    pub fn new(prefix: &str) -> prometheus::Result<Self> {
        Self::with_config(&MetricsConfig {
            prefix: prefix.to_string(),
            ..MetricsConfig::default()
        })
    }

    /// Create a collector using the prefix and constant labels from config.
    pub fn with_config(config: &MetricsConfig) -> prometheus::Result<Self> {
        let prefix = &config.prefix;
        let registry = Registry::new_custom(None, Some(config.labels.clone()))?;

        let registered_variables = IntGaugeVec::new(
            Opts::new(
                format!("{}_registered_variables", prefix),
                "Number of deprecated variables in the registry",
            ),
            &["series"],
        )?;

        let checks_total = IntCounterVec::new(
            Opts::new(
                format!("{}_checks_total", prefix),
                "Total number of variables checked for deprecation",
            ),
            &["series", "outcome"],
        )?;

        let findings_total = IntCounterVec::new(
            Opts::new(
                format!("{}_findings_total", prefix),
                "Total number of deprecated variables found in use",
            ),
            &["series", "variable"],
        )?;

        registry.register(Box::new(registered_variables.clone()))?;
        registry.register(Box::new(checks_total.clone()))?;
        registry.register(Box::new(findings_total.clone()))?;

        Ok(Self {
            registry,
            registered_variables,
            checks_total,
            findings_total,
        })
    }

    /// Set the per-series gauge from the registry contents.
    pub fn record_registry(&self, deprecations: &DeprecationRegistry) {
        for (series, count) in deprecations.counts_by_series() {
            self.registered_variables
                .with_label_values(&[&series.to_string()])
                .set(count as i64);
        }
    }

    /// Record one checked variable.
    pub fn record_check(&self, series: &str, deprecated: bool) {
        let outcome = if deprecated { "deprecated" } else { "ok" };
        self.checks_total
            .with_label_values(&[series, outcome])
            .inc();
    }

    /// Record a deprecated variable found in use.
    pub fn record_finding(&self, series: &str, variable: &str) {
        self.findings_total
            .with_label_values(&[series, variable])
            .inc();
    }

    /// Get the Prometheus registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Encode metrics in Prometheus text format.
    pub fn encode(&self) -> anyhow::Result<String> {
        use prometheus::Encoder;
        let encoder = prometheus::TextEncoder::new();
        let metric_families = self.registry.gather();
        let mut buffer = Vec::new();
        encoder.encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}
