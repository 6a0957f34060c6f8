//! Error types shared by the registry and startup target.

use thiserror::Error;

/// Errors raised while building or querying keyed collections and the
/// deprecation registry.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RegistryError {
    /// The `(first, second)` pair is already present.
    #[error("duplicate key ({first}, {second})")]
    DuplicateKey { first: String, second: String },

    /// The exact `(first, second)` pair is not present.
    #[error("key ({first}, {second}) not found")]
    KeyNotFound { first: String, second: String },

    /// A deprecation entry failed construction-time validation.
    #[error("invalid deprecation entry '{name}': {reason}")]
    InvalidEntry { name: String, reason: String },

    /// A version string could not be parsed.
    #[error("invalid server version '{input}': {reason}")]
    InvalidVersion { input: String, reason: String },

    /// A series string does not name a known release line.
    #[error("unknown server series '{0}'")]
    UnknownSeries(String),
}

/// Errors raised while resolving a startup target's host name.
///
/// Resolution failures are never cached, so callers may retry.
#[derive(Debug, Error)]
pub enum ResolutionError {
    #[error("host name is empty")]
    EmptyHostName,

    #[error("failed to resolve host '{host}': {source}")]
    Lookup {
        host: String,
        #[source]
        source: std::io::Error,
    },

    #[error("host '{host}' has no IPv4 address")]
    NoIpv4 { host: String },
}
