//! Registry of deprecated server variables.
//!
//! Entries are keyed by `(series, variable name)`. Population happens once at
//! startup and stops at the first bad row, so a corrupt table never yields a
//! registry that under-reports deprecations.

use crate::composite::CompositeKeyMap;
use crate::config::ConfiguratorConfig;
use crate::entry::{DeprecationEntry, ServerSeries, ServerVersion};
use crate::error::RegistryError;
use tracing::{debug, error, info};

/// Answers "is variable V deprecated in series S (as of version Ver)?".
#[derive(Debug, Clone, Default)]
pub struct DeprecationRegistry {
    entries: CompositeKeyMap<ServerSeries, String, DeprecationEntry>,
}

impl DeprecationRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a registry from entries, failing on the first duplicate.
    pub fn from_entries<I>(entries: I) -> Result<Self, RegistryError>
    where
        I: IntoIterator<Item = DeprecationEntry>,
    {
        let mut registry = Self::new();
        for entry in entries {
            let (series, name) = (entry.series(), entry.name().to_string());
            if let Err(e) = registry.register(entry) {
                error!(
                    series = %series,
                    variable = %name,
                    error = %e,
                    "Aborting deprecation registry population"
                );
                return Err(e);
            }
        }

        info!(
            variables = registry.len(),
            "Deprecation registry populated"
        );
        Ok(registry)
    }

    /// Build a registry from the variables listed in a configuration.
    pub fn from_config(config: &ConfiguratorConfig) -> Result<Self, RegistryError> {
        let mut entries = Vec::with_capacity(config.variables.len());
        for variable in &config.variables {
            match variable.to_entry() {
                Ok(entry) => entries.push(entry),
                Err(e) => {
                    error!(
                        series = %variable.series,
                        variable = %variable.name,
                        error = %e,
                        "Aborting deprecation registry population"
                    );
                    return Err(e);
                }
            }
        }
        Self::from_entries(entries)
    }

    /// Registry over the built-in deprecation table.
    pub fn builtin() -> anyhow::Result<Self> {
        let config = ConfiguratorConfig::builtin()?;
        Ok(Self::from_config(&config)?)
    }

    /// Add an entry. Each series holds at most one entry per variable.
    pub fn register(&mut self, entry: DeprecationEntry) -> Result<(), RegistryError> {
        debug!(
            series = %entry.series(),
            variable = %entry.name(),
            since = ?entry.version(),
            "Registering deprecated variable"
        );
        self.entries
            .insert(entry.series(), entry.name().to_string(), entry)
    }

    /// The entry for `name` in `series`.
    pub fn get(&self, name: &str, series: ServerSeries) -> Result<&DeprecationEntry, RegistryError> {
        self.entries.get(&series, &name.to_string())
    }

    /// True if `name` is recorded as deprecated anywhere in `series`.
    pub fn is_deprecated(&self, name: &str, series: ServerSeries) -> bool {
        self.entries.contains_pair(&series, &name.to_string())
    }

    /// True if `name` is deprecated in `series` as of `candidate`.
    ///
    /// An entry without a version covers the whole series; otherwise the
    /// candidate must be at or past the recorded version.
    pub fn is_deprecated_as_of(
        &self,
        name: &str,
        series: ServerSeries,
        candidate: &ServerVersion,
    ) -> bool {
        self.get(name, series)
            .map(|entry| entry.applies_to(candidate))
            .unwrap_or(false)
    }

    /// Every entry recorded for `series`, ordered by variable name.
    ///
    /// The iterator is lazy; clone it to walk the sequence again.
    pub fn variables_deprecated_in_series<'a>(
        &'a self,
        series: &'a ServerSeries,
    ) -> impl Iterator<Item = &'a DeprecationEntry> + Clone + 'a {
        self.entries.values_for_first(series)
    }

    /// Whether any entry exists for `series`.
    pub fn has_series(&self, series: ServerSeries) -> bool {
        self.entries.contains_first(&series)
    }

    /// Whether `name` is recorded in any series.
    pub fn is_known_variable(&self, name: &str) -> bool {
        self.entries.contains_second(&name.to_string())
    }

    /// Series in which `name` has an entry, oldest first.
    pub fn series_with<'a>(&'a self, name: &'a str) -> impl Iterator<Item = ServerSeries> + 'a {
        self.entries
            .iter()
            .filter(move |(_, variable, _)| variable.as_str() == name)
            .map(|(series, _, _)| *series)
    }

    /// Number of entries for each series that has at least one.
    pub fn counts_by_series(&self) -> Vec<(ServerSeries, usize)> {
        ServerSeries::ALL
            .into_iter()
            .map(|s| (s, self.variables_deprecated_in_series(&s).count()))
            .filter(|(_, count)| *count > 0)
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
