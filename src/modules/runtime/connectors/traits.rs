//! Connector trait definition

use async_trait::async_trait;
use infraroute_core::{Credentials, InfrarouteError, NativeQuery, Params, SourceMetadata, TimeoutConfig};
use infraroute_types::Row;

/// Result type for connector operations
pub type ConnectorResult = Vec<Row>;

/// Construction parameters for a connector, beyond what the metadata holds
#[derive(Debug, Clone, Default)]
pub struct ConnectionSettings {
    pub username: Option<String>,
    pub password: Option<String>,
    pub token: Option<String>,
    /// Database used when the metadata does not name one
    pub database: Option<String>,
    /// Verify TLS certificates (REST sources)
    pub verify_tls: bool,
    pub timeouts: TimeoutConfig,
}

impl ConnectionSettings {
    pub fn new(credentials: Option<&Credentials>, timeouts: TimeoutConfig) -> Self {
        let credentials = credentials.cloned().unwrap_or_default();
        Self {
            username: credentials.username,
            password: credentials.password,
            token: credentials.token,
            database: credentials.database,
            verify_tls: credentials.verify_tls.unwrap_or(true),
            timeouts,
        }
    }
}

/// Uniform capability contract implemented by every backend kind.
///
/// Reachability (`test_connection`) is kept apart from query success
/// (`query`) so discovery can grade candidates instead of accepting or
/// rejecting them outright.
#[async_trait]
pub trait Connector: Send + Sync {
    /// Lightweight, time-bounded reachability/auth probe.
    ///
    /// Never fails: any error is logged and reported as `false`.
    async fn test_connection(&self) -> bool;

    /// Execute a backend-native query.
    ///
    /// All-or-nothing: either every row is returned or a `QueryFailed`
    /// error is. A query form the backend does not speak is
    /// `UnsupportedSourceType`.
    async fn query(
        &self,
        query: &NativeQuery,
        params: &Params,
    ) -> Result<ConnectorResult, InfrarouteError>;

    /// Static identity of the source, independent of connection state
    fn metadata(&self) -> &SourceMetadata;

    /// Release held connections. Idempotent, safe when never opened.
    async fn close(&self);

    /// Secondary probe: names of inventory-shaped tables, collections or
    /// endpoints. Failure or absence only means "no evidence".
    async fn discover_inventory(&self) -> Result<Vec<String>, InfrarouteError> {
        Ok(Vec::new())
    }
}

/// Error for a query form the connector cannot execute
pub(crate) fn unsupported_query(source: &SourceMetadata, query: &NativeQuery) -> InfrarouteError {
    let kind = match query {
        NativeQuery::Sql { .. } => "sql",
        NativeQuery::Document { .. } => "document",
        NativeQuery::Http { .. } => "http",
        NativeQuery::SshScan(_) => "ssh_scan",
    };
    InfrarouteError::UnsupportedSourceType(format!(
        "{} source '{}' cannot execute a {} query",
        source.source_type, source.name, kind
    ))
}
