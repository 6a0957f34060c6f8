//! Configuration for the server configurator.
//!
//! Defines the deprecated-variable table, the managed server instances, the
//! known client connections, and metrics options.

use crate::entry::{DeprecationEntry, ServerSeries, ServerVersion};
use crate::error::RegistryError;
use crate::target::ConnectionRef;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Deprecation table compiled into the binary.
pub const BUILTIN_TABLE: &str = include_str!("../data/deprecated-variables.yaml");

/// Main configuration for the configurator.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConfiguratorConfig {
    /// Deprecated server variables
    #[serde(default)]
    pub variables: Vec<DeprecatedVariable>,

    /// Managed server instances
    #[serde(default)]
    pub servers: Vec<ManagedServer>,

    /// Known client connections
    #[serde(default)]
    pub connections: Vec<ConnectionRef>,

    /// Metrics configuration
    #[serde(default)]
    pub metrics: MetricsConfig,
}

impl ConfiguratorConfig {
    /// Load configuration from a YAML file.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse and validate configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> anyhow::Result<Self> {
        let config: Self = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// The built-in deprecation table with no managed servers.
    pub fn builtin() -> anyhow::Result<Self> {
        Self::from_yaml(BUILTIN_TABLE)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> anyhow::Result<()> {
        let mut seen = HashSet::new();
        for variable in &self.variables {
            variable.to_entry()?;
            if !seen.insert((variable.series, variable.name.as_str())) {
                anyhow::bail!(
                    "Variable '{}' is listed twice for series {}",
                    variable.name,
                    variable.series
                );
            }
        }

        let mut names = HashSet::new();
        for server in &self.servers {
            server.validate()?;
            if !names.insert(server.name.as_str()) {
                anyhow::bail!("Managed server name '{}' is used twice", server.name);
            }
        }

        for connection in &self.connections {
            if connection.host_name.trim().is_empty() {
                anyhow::bail!("Connection '{}' has an empty host", connection.name);
            }
        }

        Ok(())
    }

    /// Merge in variables from the built-in table that this config does not
    /// already list for the same series.
    pub fn with_builtin_variables(mut self) -> anyhow::Result<Self> {
        let builtin = Self::builtin()?;
        let present: HashSet<(ServerSeries, String)> = self
            .variables
            .iter()
            .map(|v| (v.series, v.name.clone()))
            .collect();
        self.variables.extend(
            builtin
                .variables
                .into_iter()
                .filter(|v| !present.contains(&(v.series, v.name.clone()))),
        );
        Ok(self)
    }

    /// Find a managed server by name.
    pub fn find_server(&self, name: &str) -> Option<&ManagedServer> {
        self.servers.iter().find(|s| s.name == name)
    }
}

/// One row of the deprecation table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeprecatedVariable {
    /// Variable name as it appears in option files
    pub name: String,

    /// Release series the deprecation applies to
    pub series: ServerSeries,

    /// Release from which the deprecation applies (whole series if absent)
    #[serde(default)]
    pub version: Option<ServerVersion>,

    /// Variable that replaces this one
    #[serde(default)]
    pub replacement: Option<String>,

    /// Free-form note shown in upgrade reports
    #[serde(default)]
    pub note: Option<String>,
}

impl DeprecatedVariable {
    /// Build the registry entry for this row.
    pub fn to_entry(&self) -> Result<DeprecationEntry, RegistryError> {
        let mut entry = match self.version {
            Some(version) => DeprecationEntry::since(&self.name, self.series, version)?,
            None => DeprecationEntry::new(&self.name, self.series)?,
        };
        if let Some(replacement) = &self.replacement {
            entry = entry.with_replacement(replacement);
        }
        if let Some(note) = &self.note {
            entry = entry.with_note(note);
        }
        Ok(entry)
    }
}

/// A server instance managed by the configurator.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ManagedServer {
    /// Unique display name
    pub name: String,

    /// Host the instance runs on
    pub host: String,

    #[serde(default = "default_port")]
    pub port: u16,

    /// Path to the instance's option file
    #[serde(default)]
    pub config_file: Option<PathBuf>,

    /// Whether the instance is the server product itself
    #[serde(default = "default_true")]
    pub server_product: bool,

    /// Whether the instance belongs to another product of the family
    #[serde(default)]
    pub product_family: bool,
}

fn default_true() -> bool {
    true
}

fn default_port() -> u16 {
    3306
}

impl ManagedServer {
    pub fn validate(&self) -> anyhow::Result<()> {
        if self.name.is_empty() {
            anyhow::bail!("Managed server name cannot be empty");
        }
        if self.host.trim().is_empty() {
            anyhow::bail!("Host cannot be empty for managed server: {}", self.name);
        }
        if self.port == 0 {
            anyhow::bail!("Port cannot be 0 for managed server: {}", self.name);
        }
        Ok(())
    }
}

/// Metrics configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MetricsConfig {
    /// Whether to collect Prometheus metrics
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Prefix for metric names
    #[serde(default = "default_metrics_prefix")]
    pub prefix: String,

    /// Constant labels added to every metric
    #[serde(default)]
    pub labels: HashMap<String, String>,
}

impl Default for MetricsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            prefix: default_metrics_prefix(),
            labels: HashMap::new(),
        }
    }
}

fn default_metrics_prefix() -> String {
    "server_configurator".to_string()
}
