//! YAML configuration parser

use infraroute_core::{
    Config, Credentials, DiscoveryConfig, InfrarouteError, RegistryConfig, RouterConfig,
    ServerConfig, SourceMetadata,
};
use infraroute_types::SourceType;
use serde::Deserialize;
use std::collections::HashMap;

use crate::env::EnvSubstitutor;

/// Confidence given to manually registered sources that do not state one
const MANUAL_SOURCE_CONFIDENCE: f64 = 0.9;

/// YAML parser for Infraroute configuration files
pub struct YamlParser;

/// On-disk schema. `sources` may be a list of named entries or a map keyed by
/// source name.
#[derive(Debug, Deserialize)]
struct FileConfig {
    #[serde(default)]
    environment: Option<String>,

    #[serde(default)]
    registry: RegistryConfig,

    #[serde(default)]
    discovery: DiscoveryConfig,

    #[serde(default)]
    router: RouterConfig,

    #[serde(default)]
    credentials: HashMap<String, Credentials>,

    #[serde(default)]
    sources: Option<SourcesSection>,

    #[serde(default)]
    server: Option<ServerConfig>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum SourcesSection {
    List(Vec<NamedSourceEntry>),
    Map(HashMap<String, SourceEntry>),
}

#[derive(Debug, Deserialize)]
struct NamedSourceEntry {
    name: String,
    #[serde(flatten)]
    entry: SourceEntry,
}

#[derive(Debug, Deserialize)]
struct SourceEntry {
    #[serde(rename = "type")]
    source_type: SourceType,

    #[serde(default = "default_host")]
    host: String,

    /// Defaults to the type's well-known port
    #[serde(default)]
    port: Option<u16>,

    #[serde(default)]
    database: Option<String>,

    #[serde(default)]
    base_path: Option<String>,

    #[serde(default)]
    tls: bool,

    #[serde(default)]
    capabilities: Vec<String>,

    #[serde(default)]
    confidence: Option<f64>,
}

fn default_host() -> String {
    "localhost".to_string()
}

impl SourceEntry {
    fn into_metadata(self, name: String) -> Result<SourceMetadata, InfrarouteError> {
        if let Some(confidence) = self.confidence {
            if !(0.0..=1.0).contains(&confidence) {
                return Err(InfrarouteError::Validation(format!(
                    "Source '{}': confidence {} is outside 0.0..=1.0",
                    name, confidence
                )));
            }
        }

        let port = self.port.unwrap_or_else(|| self.source_type.default_port());
        let mut source = SourceMetadata::new(name, self.source_type, self.host, port)
            .with_tls(self.tls)
            .with_confidence(self.confidence.unwrap_or(MANUAL_SOURCE_CONFIDENCE));
        source.database = self.database;
        source.base_path = self.base_path;
        for capability in self.capabilities {
            source.add_capability(capability);
        }
        Ok(source)
    }
}

impl YamlParser {
    /// Parse a YAML string into a Config
    pub fn parse(content: &str) -> Result<Config, InfrarouteError> {
        let substitutor = EnvSubstitutor::new();
        let substituted = substitutor.substitute(content)?;
        Self::parse_raw(&substituted)
    }

    /// Parse a YAML string without environment variable substitution
    pub fn parse_raw(content: &str) -> Result<Config, InfrarouteError> {
        // An empty document is a valid, all-defaults configuration
        if content.trim().is_empty() {
            return Ok(Config::default());
        }

        let file = serde_yaml::from_str::<FileConfig>(content)
            .map_err(|e| InfrarouteError::Config(format!("YAML parse error: {}", e)))?;
        file_to_config(file)
    }
}

fn file_to_config(file: FileConfig) -> Result<Config, InfrarouteError> {
    let sources = match file.sources {
        None => Vec::new(),
        Some(SourcesSection::List(entries)) => entries
            .into_iter()
            .map(|e| e.entry.into_metadata(e.name))
            .collect::<Result<_, _>>()?,
        Some(SourcesSection::Map(entries)) => {
            // Map order is unspecified; sort so registration order is stable
            let mut entries: Vec<_> = entries.into_iter().collect();
            entries.sort_by(|a, b| a.0.cmp(&b.0));
            entries
                .into_iter()
                .map(|(name, entry)| entry.into_metadata(name))
                .collect::<Result<_, _>>()?
        }
    };

    let mut config = Config::new(file.environment.unwrap_or_else(|| "dev".to_string()));
    config.registry = file.registry;
    config.discovery = file.discovery;
    config.router = file.router;
    config.credentials = file.credentials;
    config.sources = sources;
    config.server = file.server;
    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_empty_config() {
        let config = YamlParser::parse("").unwrap();
        assert_eq!(config.environment, "dev");
        assert!(config.sources.is_empty());
    }

    #[test]
    fn test_parse_full_config() {
        let yaml = r#"
environment: prod
registry:
  path: /var/lib/infraroute
  ttl_hours: 6
discovery:
  hosts: [localhost, 10.0.0.5]
  api_ports: [8000]
  max_concurrent_probes: 4
  timeouts:
    connect_secs: 5
router:
  auto_discover: true
  inventory_table: hosts
  fallback_command: ["infra-scan", "--json"]
credentials:
  postgres:
    username: inventory
    password: secret
    database: cmdb
sources:
  - name: cmdb
    type: rest-api
    host: cmdb.internal
    port: 443
    base_path: /api
    tls: true
    capabilities: [inventory, cmdb]
  - name: assets-db
    type: postgres
    host: db.internal
    database: assets
    confidence: 0.75
server:
  port: 3000
"#;
        let config = YamlParser::parse(yaml).unwrap();
        assert_eq!(config.environment, "prod");
        assert_eq!(config.registry.ttl_hours, Some(6));
        assert_eq!(config.discovery.hosts.len(), 2);
        assert_eq!(config.discovery.timeouts.connect().as_secs(), 5);
        assert!(config.router.auto_discover);
        assert_eq!(config.router.inventory_table(), "hosts");
        assert_eq!(config.router.fallback_command.len(), 2);
        assert_eq!(config.port(), 3000);

        assert_eq!(config.sources.len(), 2);
        let cmdb = &config.sources[0];
        assert_eq!(cmdb.source_type, SourceType::RestApi);
        assert!(cmdb.tls);
        assert!(cmdb.has_capability("cmdb"));
        assert_eq!(cmdb.confidence.value(), MANUAL_SOURCE_CONFIDENCE);

        let db = &config.sources[1];
        assert_eq!(db.port, 5432);
        assert_eq!(db.database.as_deref(), Some("assets"));
        assert_eq!(db.confidence.value(), 0.75);
    }

    #[test]
    fn test_parse_map_sources_sorted_by_name() {
        let yaml = r#"
sources:
  zeta:
    type: mongodb
  alpha:
    type: mysql
"#;
        let config = YamlParser::parse(yaml).unwrap();
        let names: Vec<_> = config.sources.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["alpha", "zeta"]);
        assert_eq!(config.sources[0].port, 3306);
        assert_eq!(config.sources[1].port, 27017);
        assert_eq!(config.sources[1].host, "localhost");
    }

    #[test]
    fn test_parse_invalid_yaml() {
        let yaml = "invalid: yaml: content: [";
        assert!(YamlParser::parse(yaml).is_err());
    }

    #[test]
    fn test_parse_unknown_source_type() {
        let yaml = r#"
sources:
  cache:
    type: redis
"#;
        assert!(YamlParser::parse(yaml).is_err());
    }

    #[test]
    fn test_parse_rejects_out_of_range_confidence() {
        let yaml = r#"
sources:
  - name: assets
    type: postgres
    confidence: 1.5
"#;
        assert!(matches!(
            YamlParser::parse(yaml),
            Err(InfrarouteError::Validation(_))
        ));
    }
}
