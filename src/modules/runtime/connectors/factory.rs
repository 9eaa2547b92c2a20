//! Startup-time table mapping each source type to its detector and constructor

use async_trait::async_trait;
use infraroute_core::{Config, InfrarouteError, SourceMetadata};
use infraroute_types::SourceType;
use std::collections::HashMap;

use super::mongodb::MongoDbConnector;
use super::mysql::MySqlConnector;
use super::postgres::PostgresConnector;
use super::probe::tcp_reachable;
use super::rest::RestConnector;
use super::traits::{ConnectionSettings, Connector};

/// Base confidence for a reachable database port
pub const DATABASE_BASE_CONFIDENCE: f64 = 0.7;
/// Base confidence for a reachable API port
pub const API_BASE_CONFIDENCE: f64 = 0.6;

/// Builds connectors and finds unauthenticated candidates per source type
#[async_trait]
pub trait ConnectorFactory: Send + Sync {
    /// Static probe for `source_type` on the configured hosts. Candidates
    /// carry a provisional confidence and are not yet `detected`.
    async fn detect_on_localhost(&self, source_type: SourceType) -> Vec<SourceMetadata>;

    /// Construct the connector for `source`. No I/O happens here.
    fn create(&self, source: &SourceMetadata) -> Result<Box<dyn Connector>, InfrarouteError>;
}

/// Factory for the built-in Postgres, MySQL, MongoDB and REST connectors
pub struct NativeConnectorFactory {
    config: Config,
}

impl NativeConnectorFactory {
    pub fn from_config(config: &Config) -> Self {
        Self {
            config: config.clone(),
        }
    }

    fn settings(&self, source: &SourceMetadata) -> ConnectionSettings {
        ConnectionSettings::new(
            self.config.credentials_for(source),
            self.config.discovery.timeouts.clone(),
        )
    }

    fn candidate_ports(&self, source_type: SourceType) -> Vec<u16> {
        match source_type {
            SourceType::RestApi => self.config.discovery.api_ports(),
            other => vec![other.default_port()],
        }
    }
}

/// Candidate metadata for a reachable `host:port`
pub fn candidate(source_type: SourceType, host: &str, port: u16) -> SourceMetadata {
    let name = if port == source_type.default_port() {
        format!("{}_{}", source_type.key(), host)
    } else {
        format!("{}_{}_{}", source_type.key(), host, port)
    };
    let confidence = if source_type.is_database() {
        DATABASE_BASE_CONFIDENCE
    } else {
        API_BASE_CONFIDENCE
    };
    SourceMetadata::new(name, source_type, host, port).with_confidence(confidence)
}

#[async_trait]
impl ConnectorFactory for NativeConnectorFactory {
    async fn detect_on_localhost(&self, source_type: SourceType) -> Vec<SourceMetadata> {
        let timeout = self.config.discovery.timeouts.probe();
        let mut candidates = Vec::new();
        for host in self.config.discovery.hosts() {
            for port in self.candidate_ports(source_type) {
                if tcp_reachable(&host, port, timeout).await {
                    candidates.push(candidate(source_type, &host, port));
                }
            }
        }
        candidates
    }

    fn create(&self, source: &SourceMetadata) -> Result<Box<dyn Connector>, InfrarouteError> {
        let settings = self.settings(source);
        let connector: Box<dyn Connector> = match source.source_type {
            SourceType::Postgres => Box::new(PostgresConnector::new(source.clone(), &settings)),
            SourceType::Mysql => Box::new(MySqlConnector::new(source.clone(), &settings)),
            SourceType::Mongodb => Box::new(MongoDbConnector::new(source.clone(), &settings)?),
            SourceType::RestApi => Box::new(RestConnector::new(source.clone(), &settings)?),
        };
        Ok(connector)
    }
}

/// Source names grouped by type, for log summaries
pub fn names_by_type(sources: &[SourceMetadata]) -> HashMap<SourceType, Vec<&str>> {
    let mut grouped: HashMap<SourceType, Vec<&str>> = HashMap::new();
    for source in sources {
        grouped
            .entry(source.source_type)
            .or_default()
            .push(source.name.as_str());
    }
    grouped
}
