//! Root configuration

use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::settings::{Credentials, DiscoveryConfig, RegistryConfig, RouterConfig, ServerConfig};
use super::source::SourceMetadata;

fn default_environment() -> String {
    "dev".to_string()
}

/// Root configuration that represents an Infraroute configuration file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Registry namespace (e.g. "dev", "prod")
    #[serde(default = "default_environment")]
    pub environment: String,

    #[serde(default)]
    pub registry: RegistryConfig,

    #[serde(default)]
    pub discovery: DiscoveryConfig,

    #[serde(default)]
    pub router: RouterConfig,

    /// Credentials keyed by source name or source type key
    #[serde(default)]
    pub credentials: HashMap<String, Credentials>,

    /// Manually registered sources
    #[serde(default)]
    pub sources: Vec<SourceMetadata>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub server: Option<ServerConfig>,
}

impl Config {
    /// Create a configuration with defaults for the given environment
    pub fn new(environment: impl Into<String>) -> Self {
        Self {
            environment: environment.into(),
            registry: RegistryConfig::default(),
            discovery: DiscoveryConfig::default(),
            router: RouterConfig::default(),
            credentials: HashMap::new(),
            sources: Vec::new(),
            server: None,
        }
    }

    /// Credentials for a source: by source name first, then by type key
    pub fn credentials_for(&self, source: &SourceMetadata) -> Option<&Credentials> {
        self.credentials
            .get(&source.name)
            .or_else(|| self.credentials.get(source.source_type.key()))
    }

    /// Get the server port, defaulting to 8080
    pub fn port(&self) -> u16 {
        self.server.as_ref().and_then(|s| s.port).unwrap_or(8080)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self::new(default_environment())
    }
}
