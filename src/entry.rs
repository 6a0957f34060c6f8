//! Deprecation records and the series/version types they are keyed on.

use crate::error::RegistryError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A `major.minor` release line of the server.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum ServerSeries {
    #[serde(rename = "5.1")]
    V5_1,
    #[serde(rename = "5.5")]
    V5_5,
    #[serde(rename = "5.6")]
    V5_6,
    #[serde(rename = "5.7")]
    V5_7,
    #[serde(rename = "8.0")]
    V8_0,
    #[serde(rename = "8.4")]
    V8_4,
}

impl ServerSeries {
    pub const ALL: [ServerSeries; 6] = [
        ServerSeries::V5_1,
        ServerSeries::V5_5,
        ServerSeries::V5_6,
        ServerSeries::V5_7,
        ServerSeries::V8_0,
        ServerSeries::V8_4,
    ];

    /// The `(major, minor)` pair of this release line.
    pub fn major_minor(self) -> (u32, u32) {
        match self {
            ServerSeries::V5_1 => (5, 1),
            ServerSeries::V5_5 => (5, 5),
            ServerSeries::V5_6 => (5, 6),
            ServerSeries::V5_7 => (5, 7),
            ServerSeries::V8_0 => (8, 0),
            ServerSeries::V8_4 => (8, 4),
        }
    }

    /// The series a version belongs to, if it is a known one.
    pub fn of(version: &ServerVersion) -> Option<Self> {
        Self::ALL
            .into_iter()
            .find(|s| s.major_minor() == (version.major, version.minor))
    }

    pub fn contains(self, version: &ServerVersion) -> bool {
        self.major_minor() == (version.major, version.minor)
    }
}

impl fmt::Display for ServerSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let (major, minor) = self.major_minor();
        write!(f, "{}.{}", major, minor)
    }
}

impl FromStr for ServerSeries {
    type Err = RegistryError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        Self::ALL
            .into_iter()
            .find(|series| series.to_string() == trimmed)
            .ok_or_else(|| RegistryError::UnknownSeries(s.to_string()))
    }
}

/// A `major.minor.patch` server version, ordered numerically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ServerVersion {
    pub major: u32,
    pub minor: u32,
    pub patch: u32,
}

impl ServerVersion {
    pub const fn new(major: u32, minor: u32, patch: u32) -> Self {
        Self {
            major,
            minor,
            patch,
        }
    }
}

impl fmt::Display for ServerVersion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.patch)
    }
}

impl FromStr for ServerVersion {
    type Err = RegistryError;

    /// Parse `"5.7.20"`; a missing patch component (`"8.0"`) reads as 0.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let invalid = |reason: &str| RegistryError::InvalidVersion {
            input: s.to_string(),
            reason: reason.to_string(),
        };

        let parts: Vec<&str> = s.trim().split('.').collect();
        if parts.len() < 2 || parts.len() > 3 {
            return Err(invalid("expected major.minor[.patch]"));
        }

        let mut numbers = [0u32; 3];
        for (slot, part) in numbers.iter_mut().zip(&parts) {
            if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
                return Err(invalid("components must be non-negative integers"));
            }
            *slot = part
                .parse()
                .map_err(|_| invalid("components must be non-negative integers"))?;
        }

        Ok(Self::new(numbers[0], numbers[1], numbers[2]))
    }
}

impl TryFrom<String> for ServerVersion {
    type Error = RegistryError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<ServerVersion> for String {
    fn from(version: ServerVersion) -> Self {
        version.to_string()
    }
}

/// One deprecated configuration variable within a release series.
///
/// Without a version the variable is deprecated for the whole series; with
/// one, from that version onward.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeprecationEntry {
    name: String,
    series: ServerSeries,
    version: Option<ServerVersion>,
    replacement: Option<String>,
    note: Option<String>,
}

impl DeprecationEntry {
    /// Deprecated throughout `series`.
    pub fn new(name: impl Into<String>, series: ServerSeries) -> Result<Self, RegistryError> {
        Self::build(name.into(), series, None)
    }

    /// Deprecated from `version` onward within `series`.
    pub fn since(
        name: impl Into<String>,
        series: ServerSeries,
        version: ServerVersion,
    ) -> Result<Self, RegistryError> {
        Self::build(name.into(), series, Some(version))
    }

    fn build(
        name: String,
        series: ServerSeries,
        version: Option<ServerVersion>,
    ) -> Result<Self, RegistryError> {
        if name.trim().is_empty() {
            return Err(RegistryError::InvalidEntry {
                name,
                reason: "variable name cannot be empty".to_string(),
            });
        }

        if name.trim() != name {
            return Err(RegistryError::InvalidEntry {
                name,
                reason: "variable name has leading or trailing whitespace".to_string(),
            });
        }

        if let Some(v) = &version {
            if !series.contains(v) {
                return Err(RegistryError::InvalidEntry {
                    name,
                    reason: format!("version {} is outside series {}", v, series),
                });
            }
        }

        Ok(Self {
            name,
            series,
            version,
            replacement: None,
            note: None,
        })
    }

    /// Name of the variable that supersedes this one.
    pub fn with_replacement(mut self, replacement: impl Into<String>) -> Self {
        self.replacement = Some(replacement.into());
        self
    }

    pub fn with_note(mut self, note: impl Into<String>) -> Self {
        self.note = Some(note.into());
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn series(&self) -> ServerSeries {
        self.series
    }

    pub fn version(&self) -> Option<ServerVersion> {
        self.version
    }

    pub fn replacement(&self) -> Option<&str> {
        self.replacement.as_deref()
    }

    pub fn note(&self) -> Option<&str> {
        self.note.as_deref()
    }

    /// Whether the deprecation is in effect for `candidate`.
    ///
    /// Does not check that `candidate` belongs to this entry's series.
    pub fn applies_to(&self, candidate: &ServerVersion) -> bool {
        match &self.version {
            None => true,
            Some(since) => candidate >= since,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_version() {
        let v: ServerVersion = "5.7.20".parse().unwrap();
        assert_eq!(v, ServerVersion::new(5, 7, 20));

        let v: ServerVersion = "8.0".parse().unwrap();
        assert_eq!(v, ServerVersion::new(8, 0, 0));
    }

    #[test]
    fn test_parse_invalid_version() {
        assert!("5".parse::<ServerVersion>().is_err());
        assert!("5.7.x".parse::<ServerVersion>().is_err());
        assert!("5.7.20.1".parse::<ServerVersion>().is_err());
        assert!("".parse::<ServerVersion>().is_err());
        assert!("5.+7.+20".parse::<ServerVersion>().is_err());
        assert!("5.7.-1".parse::<ServerVersion>().is_err());
        assert!("5. 7.20".parse::<ServerVersion>().is_err());
    }

    #[test]
    fn test_version_ordering_is_numeric() {
        let v9: ServerVersion = "5.7.9".parse().unwrap();
        let v10: ServerVersion = "5.7.10".parse().unwrap();
        // Lexically "5.7.10" < "5.7.9"
        assert!(v9 < v10);
        assert!(ServerVersion::new(5, 7, 44) < ServerVersion::new(8, 0, 0));
        assert!(ServerVersion::new(8, 0, 40) < ServerVersion::new(8, 4, 0));
    }

    #[test]
    fn test_series_round_trip_display() {
        for series in ServerSeries::ALL {
            assert_eq!(series.to_string().parse::<ServerSeries>().unwrap(), series);
        }
        assert!("9.9".parse::<ServerSeries>().is_err());
    }

    #[test]
    fn test_series_of_version() {
        assert_eq!(
            ServerSeries::of(&ServerVersion::new(5, 7, 20)),
            Some(ServerSeries::V5_7)
        );
        assert_eq!(ServerSeries::of(&ServerVersion::new(6, 0, 0)), None);
    }

    #[test]
    fn test_series_yaml_form() {
        let series: ServerSeries = serde_yaml::from_str("\"8.0\"").unwrap();
        assert_eq!(series, ServerSeries::V8_0);
    }

    #[test]
    fn test_version_yaml_form() {
        let version: ServerVersion = serde_yaml::from_str("\"5.7.20\"").unwrap();
        assert_eq!(version, ServerVersion::new(5, 7, 20));
        assert!(serde_yaml::from_str::<ServerVersion>("\"five\"").is_err());
    }

    #[test]
    fn test_entry_rejects_empty_name() {
        let err = DeprecationEntry::new("", ServerSeries::V5_7).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEntry { .. }));

        let err = DeprecationEntry::new("   ", ServerSeries::V5_7).unwrap_err();
        assert!(matches!(err, RegistryError::InvalidEntry { .. }));
    }

    #[test]
    fn test_entry_rejects_padded_name() {
        for padded in ["query_cache_size ", " query_cache_size", "\tquery_cache_size"] {
            let err = DeprecationEntry::new(padded, ServerSeries::V5_7).unwrap_err();
            assert!(matches!(err, RegistryError::InvalidEntry { .. }));
            assert!(err.to_string().contains("whitespace"));
        }
    }

    #[test]
    fn test_entry_rejects_version_outside_series() {
        let err = DeprecationEntry::since(
            "query_cache_size",
            ServerSeries::V5_7,
            ServerVersion::new(8, 0, 1),
        )
        .unwrap_err();
        assert!(err.to_string().contains("outside series 5.7"));
    }

    #[test]
    fn test_entry_applies_to() {
        let whole_series = DeprecationEntry::new("tx_isolation", ServerSeries::V5_7).unwrap();
        assert!(whole_series.applies_to(&ServerVersion::new(5, 7, 0)));

        let pinned = DeprecationEntry::since(
            "query_cache_size",
            ServerSeries::V5_7,
            ServerVersion::new(5, 7, 20),
        )
        .unwrap();
        assert!(!pinned.applies_to(&ServerVersion::new(5, 7, 19)));
        assert!(pinned.applies_to(&ServerVersion::new(5, 7, 20)));
        assert!(pinned.applies_to(&ServerVersion::new(5, 7, 25)));
    }

    #[test]
    fn test_entry_details() {
        let entry = DeprecationEntry::new("tx_isolation", ServerSeries::V5_7)
            .unwrap()
            .with_replacement("transaction_isolation")
            .with_note("Renamed in 5.7.20");
        assert_eq!(entry.name(), "tx_isolation");
        assert_eq!(entry.series(), ServerSeries::V5_7);
        assert_eq!(entry.version(), None);
        assert_eq!(entry.replacement(), Some("transaction_isolation"));
        assert_eq!(entry.note(), Some("Renamed in 5.7.20"));
    }
}
