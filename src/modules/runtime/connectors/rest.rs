//! REST/CMDB API connector implementation

use async_trait::async_trait;
use infraroute_core::{InfrarouteError, NativeQuery, Params, SourceMetadata, TimeoutConfig};
use reqwest::{header, Client};
use tracing::debug;

use super::inventory::INVENTORY_ENDPOINTS;
use super::json::rows_from_json;
use super::traits::{unsupported_query, ConnectionSettings, Connector, ConnectorResult};

/// Connector for HTTP inventory and status APIs
pub struct RestConnector {
    metadata: SourceMetadata,
    client: Client,
    base_url: String,
    token: Option<String>,
    timeouts: TimeoutConfig,
}

impl RestConnector {
    pub fn new(
        metadata: SourceMetadata,
        settings: &ConnectionSettings,
    ) -> Result<Self, InfrarouteError> {
        let client = Client::builder()
            .connect_timeout(settings.timeouts.connect())
            .timeout(settings.timeouts.query())
            .danger_accept_invalid_certs(!settings.verify_tls)
            .build()
            .map_err(|e| {
                InfrarouteError::ConnectionProbeFailed(format!(
                    "HTTP client creation failed for '{}': {}",
                    metadata.name, e
                ))
            })?;

        let base_url = base_url(&metadata);
        Ok(Self {
            metadata,
            client,
            base_url,
            token: settings.token.clone(),
            timeouts: settings.timeouts.clone(),
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn get(&self, path: &str) -> reqwest::RequestBuilder {
        let url = format!("{}{}", self.base_url, path);
        let request = self
            .client
            .get(url)
            .header(header::ACCEPT, "application/json");
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }
}

/// `scheme://host:port[/base_path]` without a trailing slash
fn base_url(metadata: &SourceMetadata) -> String {
    let scheme = if metadata.tls { "https" } else { "http" };
    let base_path = metadata
        .base_path
        .as_deref()
        .unwrap_or("")
        .trim_end_matches('/');
    format!("{}://{}:{}{}", scheme, metadata.host, metadata.port, base_path)
}

#[async_trait]
impl Connector for RestConnector {
    /// Any HTTP answer below 500 counts as reachable; auth errors still
    /// prove an API is listening
    async fn test_connection(&self) -> bool {
        match self.get("/").timeout(self.timeouts.connect()).send().await {
            Ok(resp) => !resp.status().is_server_error(),
            Err(e) => {
                debug!(source = %self.metadata.name, "API connection test failed: {}", e);
                false
            }
        }
    }

    async fn query(
        &self,
        query: &NativeQuery,
        _params: &Params,
    ) -> Result<ConnectorResult, InfrarouteError> {
        let NativeQuery::Http { path, query } = query else {
            return Err(unsupported_query(&self.metadata, query));
        };

        let resp = self
            .get(path)
            .query(query)
            .send()
            .await
            .map_err(|e| InfrarouteError::QueryFailed(format!("GET {} failed: {}", path, e)))?;

        let status = resp.status();
        if !status.is_success() {
            return Err(InfrarouteError::QueryFailed(format!(
                "GET {} returned {}",
                path, status
            )));
        }

        let body: serde_json::Value = resp.json().await.map_err(|e| {
            InfrarouteError::QueryFailed(format!("GET {} returned invalid JSON: {}", path, e))
        })?;
        rows_from_json(body)
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    async fn close(&self) {}

    async fn discover_inventory(&self) -> Result<Vec<String>, InfrarouteError> {
        let mut found = Vec::new();
        for endpoint in INVENTORY_ENDPOINTS {
            match self.get(endpoint).timeout(self.timeouts.connect()).send().await {
                Ok(resp) if resp.status().is_success() => found.push(endpoint.to_string()),
                Ok(resp) => {
                    debug!(source = %self.metadata.name, endpoint, status = %resp.status(), "No inventory endpoint")
                }
                Err(e) => debug!(source = %self.metadata.name, endpoint, "Inventory probe failed: {}", e),
            }
        }
        Ok(found)
    }
}
