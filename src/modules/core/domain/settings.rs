//! Configuration section types

use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Ceiling for raw TCP reachability probes
pub const MAX_PROBE_TIMEOUT_SECS: u64 = 1;
/// Ceiling for authenticated connection tests
pub const MAX_CONNECT_TIMEOUT_SECS: u64 = 10;
/// Ceiling for a single backend query
pub const MAX_QUERY_TIMEOUT_SECS: u64 = 30;
/// Ceiling for the registry staleness window (one year)
pub const MAX_REGISTRY_TTL_HOURS: u64 = 24 * 365;

/// Per-call timeouts applied to probes, connection tests and queries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TimeoutConfig {
    /// TCP reachability probe timeout in milliseconds (default: 1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub probe_ms: Option<u64>,

    /// Connection test timeout in seconds (default: 10)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub connect_secs: Option<u64>,

    /// Query timeout in seconds (default: 30)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub query_secs: Option<u64>,
}

impl TimeoutConfig {
    pub fn probe(&self) -> Duration {
        Duration::from_millis(self.probe_ms.unwrap_or(MAX_PROBE_TIMEOUT_SECS * 1000))
    }

    pub fn connect(&self) -> Duration {
        Duration::from_secs(self.connect_secs.unwrap_or(MAX_CONNECT_TIMEOUT_SECS))
    }

    pub fn query(&self) -> Duration {
        Duration::from_secs(self.query_secs.unwrap_or(MAX_QUERY_TIMEOUT_SECS))
    }
}

/// Source registry configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RegistryConfig {
    /// Directory holding one JSON snapshot per environment.
    /// Unset means the registry lives in memory only.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,

    /// Hours before the registry is considered stale (default: 24)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ttl_hours: Option<u64>,
}

impl RegistryConfig {
    pub fn ttl(&self) -> Duration {
        Duration::from_secs(self.ttl_hours.unwrap_or(24).saturating_mul(3600))
    }
}

/// Localhost discovery configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DiscoveryConfig {
    /// Hosts to probe (default: ["localhost"])
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub hosts: Vec<String>,

    /// Ports probed for REST/CMDB APIs (default: [8000, 8080])
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub api_ports: Vec<u16>,

    /// Maximum probes in flight (default: 8)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_concurrent_probes: Option<usize>,

    #[serde(default)]
    pub timeouts: TimeoutConfig,
}

impl DiscoveryConfig {
    pub fn hosts(&self) -> Vec<String> {
        if self.hosts.is_empty() {
            vec!["localhost".to_string()]
        } else {
            self.hosts.clone()
        }
    }

    pub fn api_ports(&self) -> Vec<u16> {
        if self.api_ports.is_empty() {
            vec![8000, 8080]
        } else {
            self.api_ports.clone()
        }
    }

    pub fn max_concurrent_probes(&self) -> usize {
        self.max_concurrent_probes.unwrap_or(8).max(1)
    }
}

/// Router configuration
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RouterConfig {
    /// Run discovery when the registry is empty or stale (default: false)
    #[serde(default)]
    pub auto_discover: bool,

    /// Relational inventory table (default: "servers")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_table: Option<String>,

    /// Document-store inventory collection (default: "servers")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_collection: Option<String>,

    /// REST inventory endpoint (default: "/api/servers")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub inventory_endpoint: Option<String>,

    /// REST status endpoint (default: "/api/status")
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_endpoint: Option<String>,

    /// Row limit for relational listings (default: 1000)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub row_limit: Option<u32>,

    /// Command (argv) implementing the SSH scan
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub fallback_command: Vec<String>,
}

impl RouterConfig {
    pub fn inventory_table(&self) -> &str {
        self.inventory_table.as_deref().unwrap_or("servers")
    }

    pub fn inventory_collection(&self) -> &str {
        self.inventory_collection.as_deref().unwrap_or("servers")
    }

    pub fn inventory_endpoint(&self) -> &str {
        self.inventory_endpoint.as_deref().unwrap_or("/api/servers")
    }

    pub fn status_endpoint(&self) -> &str {
        self.status_endpoint.as_deref().unwrap_or("/api/status")
    }

    pub fn row_limit(&self) -> u32 {
        self.row_limit.unwrap_or(1000)
    }
}

/// Credentials for one source or source type
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Credentials {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub username: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub password: Option<String>,

    /// Bearer token for REST sources
    #[serde(skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,

    /// Database to connect to when the source does not name one
    #[serde(skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// Verify TLS certificates for REST sources (default: true)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub verify_tls: Option<bool>,
}

/// HTTP server configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Port to listen on (default: 8080)
    #[serde(skip_serializing_if = "Option::is_none")]
    pub port: Option<u16>,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self { port: Some(8080) }
    }
}
