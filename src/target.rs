//! Startup targets: the server instance a configuration change applies to.
//!
//! A target is identified by host name. Its IPv4 address is resolved lazily
//! and cached until the host name changes. Related client connections are
//! picked out of an externally owned connection list by a
//! [`ConnectionMatcher`].

use crate::error::ResolutionError;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::net::{IpAddr, Ipv4Addr, ToSocketAddrs};
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Resolves a host name to an IPv4 address.
pub trait HostResolver {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolutionError>;
}

impl<R: HostResolver + ?Sized> HostResolver for &R {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolutionError> {
        (**self).resolve(host)
    }
}

/// Resolver backed by the operating system's name lookup.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemResolver;

impl HostResolver for SystemResolver {
    fn resolve(&self, host: &str) -> Result<Ipv4Addr, ResolutionError> {
        // Port is irrelevant; ToSocketAddrs needs one to perform the lookup.
        let addrs = (host, 0u16)
            .to_socket_addrs()
            .map_err(|source| ResolutionError::Lookup {
                host: host.to_string(),
                source,
            })?;

        addrs
            .filter_map(|addr| match addr.ip() {
                IpAddr::V4(v4) => Some(v4),
                IpAddr::V6(_) => None,
            })
            .next()
            .ok_or_else(|| ResolutionError::NoIpv4 {
                host: host.to_string(),
            })
    }
}

/// A client connection record owned by the connection store.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ConnectionRef {
    /// Display name of the connection
    pub name: String,

    /// Host the connection points at
    pub host_name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default)]
    pub user_name: Option<String>,
}

fn default_port() -> u16 {
    3306
}

impl ConnectionRef {
    pub fn new(name: impl Into<String>, host_name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            host_name: host_name.into(),
            port: default_port(),
            user_name: None,
        }
    }
}

/// Rule for picking the connections related to a target.
pub trait ConnectionMatcher: fmt::Debug {
    fn is_related(&self, target: &StartupTarget, connection: &ConnectionRef) -> bool;
}

/// Base rule: no connection is related.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoRelatedConnections;

impl ConnectionMatcher for NoRelatedConnections {
    fn is_related(&self, _target: &StartupTarget, _connection: &ConnectionRef) -> bool {
        false
    }
}

/// Connections whose host equals the target's host, ignoring ASCII case.
#[derive(Debug, Clone, Copy, Default)]
pub struct SameHostMatcher;

impl ConnectionMatcher for SameHostMatcher {
    fn is_related(&self, target: &StartupTarget, connection: &ConnectionRef) -> bool {
        connection
            .host_name
            .eq_ignore_ascii_case(target.host_name())
    }
}

/// The server instance being configured.
#[derive(Debug)]
pub struct StartupTarget {
    host_name: String,
    port: u16,
    resolved_address: Option<Ipv4Addr>,
    configuration_file_path: Option<PathBuf>,
    is_for_server_product: bool,
    is_for_product_family: bool,
    matcher: Box<dyn ConnectionMatcher + Send + Sync>,
}

impl StartupTarget {
    /// Target for a server product instance. Related connections are those
    /// pointing at the same host.
    pub fn for_server(host_name: impl Into<String>) -> Self {
        Self::new(host_name, None, true, false)
    }

    /// Create a target with explicit classification.
    ///
    /// Server product targets match connections by host; every other target
    /// starts with the base rule that relates nothing.
    pub fn new(
        host_name: impl Into<String>,
        configuration_file_path: Option<PathBuf>,
        is_for_server_product: bool,
        is_for_product_family: bool,
    ) -> Self {
        let matcher: Box<dyn ConnectionMatcher + Send + Sync> = if is_for_server_product {
            Box::new(SameHostMatcher)
        } else {
            Box::new(NoRelatedConnections)
        };

        Self {
            host_name: host_name.into(),
            port: default_port(),
            resolved_address: None,
            configuration_file_path,
            is_for_server_product,
            is_for_product_family,
            matcher,
        }
    }

    /// Build a target from a managed server entry.
    pub fn from_managed(server: &crate::config::ManagedServer) -> Self {
        Self::new(
            server.host.clone(),
            server.config_file.clone(),
            server.server_product,
            server.product_family,
        )
        .with_port(server.port)
    }

    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Replace the rule used by [`related_connections`](Self::related_connections).
    pub fn with_matcher(mut self, matcher: impl ConnectionMatcher + Send + Sync + 'static) -> Self {
        self.matcher = Box::new(matcher);
        self
    }

    pub fn host_name(&self) -> &str {
        &self.host_name
    }

    pub fn port(&self) -> u16 {
        self.port
    }

    /// Change the host name.
    ///
    /// The cached address is dropped only when the value actually changes.
    pub fn set_host_name(&mut self, host_name: impl Into<String>) {
        let host_name = host_name.into();
        if host_name != self.host_name {
            debug!(
                from = %self.host_name,
                to = %host_name,
                "Host name changed, clearing resolved address"
            );
            self.resolved_address = None;
        }
        self.host_name = host_name;
    }

    /// The cached address, without resolving.
    pub fn cached_address(&self) -> Option<Ipv4Addr> {
        self.resolved_address
    }

    /// Resolve the host name, using the cached address when present.
    ///
    /// Failures are returned as-is and leave the cache empty.
    pub fn resolved_address<R: HostResolver>(
        &mut self,
        resolver: R,
    ) -> Result<Ipv4Addr, ResolutionError> {
        if let Some(address) = self.resolved_address {
            return Ok(address);
        }

        if self.host_name.trim().is_empty() {
            return Err(ResolutionError::EmptyHostName);
        }

        match resolver.resolve(&self.host_name) {
            Ok(address) => {
                debug!(host = %self.host_name, address = %address, "Resolved host name");
                self.resolved_address = Some(address);
                Ok(address)
            }
            Err(e) => {
                warn!(host = %self.host_name, error = %e, "Host name resolution failed");
                Err(e)
            }
        }
    }

    pub fn configuration_file_path(&self) -> Option<&Path> {
        self.configuration_file_path.as_deref()
    }

    pub fn is_for_server_product(&self) -> bool {
        self.is_for_server_product
    }

    pub fn is_for_product_family(&self) -> bool {
        self.is_for_product_family
    }

    /// Connections from `all` that relate to this target.
    pub fn related_connections<'a>(&self, all: &'a [ConnectionRef]) -> Vec<&'a ConnectionRef> {
        all.iter()
            .filter(|c| self.matcher.is_related(self, c))
            .collect()
    }
}
