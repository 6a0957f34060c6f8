//! Server Configurator Core
//!
//! Tracks which server system variables are deprecated in which release
//! series, and resolves the startup target a configuration change applies to.
//!
//! # Features
//!
//! - **Composite keys**: a map keyed by `(series, variable)` with lookups on
//!   either half
//! - **Deprecation registry**: whole-series or from-version deprecations,
//!   compared by numeric version order
//! - **Upgrade checks**: report which variables in use need review
//! - **Startup targets**: cached host name resolution, invalidated on change,
//!   and related client connections
//! - **Metrics**: Prometheus counters for check outcomes
//!
//! # Example Table
//!
//! ```yaml
//! variables:
//!   - name: query_cache_size
//!     series: "5.7"
//!     version: "5.7.20"
//!     note: Query cache removed in 8.0
//!   - name: tx_isolation
//!     series: "5.7"
//!     version: "5.7.20"
//!     replacement: transaction_isolation
//! ```

pub mod checker;
pub mod composite;
pub mod config;
pub mod entry;
pub mod error;
pub mod metrics;
pub mod registry;
pub mod target;

pub use checker::{Finding, UpgradeChecker, UpgradeReport};
pub use composite::CompositeKeyMap;
pub use config::ConfiguratorConfig;
pub use entry::{DeprecationEntry, ServerSeries, ServerVersion};
pub use error::{RegistryError, ResolutionError};
pub use registry::DeprecationRegistry;
pub use target::{ConnectionRef, HostResolver, StartupTarget, SystemResolver};
