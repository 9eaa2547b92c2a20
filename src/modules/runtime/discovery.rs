//! Source discovery: probe for live backends and grade them

use futures::stream::{self, StreamExt};
use infraroute_core::{DiscoveryConfig, SourceMetadata, TimeoutConfig};
use infraroute_types::SourceType;
use std::cmp::Ordering;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::connectors::{names_by_type, Connector, ConnectorFactory};

/// Tag carried by every source that may answer inventory queries
pub const INVENTORY_CAPABILITY: &str = "inventory";

/// Discovers queryable backends and remembers the last pass
pub struct SourceDiscovery {
    factory: Arc<dyn ConnectorFactory>,
    max_concurrent: usize,
    timeouts: TimeoutConfig,
    discovered: RwLock<Vec<SourceMetadata>>,
}

impl SourceDiscovery {
    pub fn new(factory: Arc<dyn ConnectorFactory>, config: &DiscoveryConfig) -> Self {
        Self {
            factory,
            max_concurrent: config.max_concurrent_probes(),
            timeouts: config.timeouts.clone(),
            discovered: RwLock::new(Vec::new()),
        }
    }

    /// Run one discovery pass over every source type.
    ///
    /// Probes run concurrently but results keep candidate order (type, then
    /// host, then port). Failing candidates are dropped; the pass itself
    /// never fails.
    pub async fn discover_all(&self) -> Vec<SourceMetadata> {
        let candidates: Vec<SourceMetadata> = stream::iter(SourceType::all().iter().copied())
            .map(|source_type| self.factory.detect_on_localhost(source_type))
            .buffered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();
        debug!("Discovery found {} reachable candidates", candidates.len());

        let promoted: Vec<SourceMetadata> = stream::iter(candidates)
            .map(|candidate| self.probe_candidate(candidate))
            .buffered(self.max_concurrent)
            .collect::<Vec<_>>()
            .await
            .into_iter()
            .flatten()
            .collect();

        info!(
            "Discovered {} source(s): {:?}",
            promoted.len(),
            names_by_type(&promoted)
        );
        *self.discovered.write().await = promoted.clone();
        promoted
    }

    /// Test one candidate and refine its confidence.
    ///
    /// Returns `None` when the connector cannot be built or the connection
    /// test fails. The connector is closed on every path.
    pub async fn probe_candidate(&self, candidate: SourceMetadata) -> Option<SourceMetadata> {
        let connector = match self.factory.create(&candidate) {
            Ok(connector) => connector,
            Err(e) => {
                debug!(source = %candidate.name, "Skipping candidate: {}", e);
                return None;
            }
        };
        let result = self.refine(connector.as_ref(), candidate).await;
        connector.close().await;
        result
    }

    async fn refine(
        &self,
        connector: &dyn Connector,
        candidate: SourceMetadata,
    ) -> Option<SourceMetadata> {
        let connected = tokio::time::timeout(self.timeouts.connect(), connector.test_connection())
            .await
            .unwrap_or(false);
        if !connected {
            debug!(source = %candidate.name, "Connection test failed, dropping candidate");
            return None;
        }

        let mut source = candidate.with_detected(true);
        for tag in base_capabilities(source.source_type) {
            source.add_capability(*tag);
        }

        match tokio::time::timeout(self.timeouts.query(), connector.discover_inventory()).await {
            Ok(Ok(found)) if !found.is_empty() => {
                debug!(source = %source.name, ?found, "Inventory evidence found");
                source.mark_inventory_evidence();
            }
            Ok(Ok(_)) => debug!(source = %source.name, "No inventory-shaped data"),
            Ok(Err(e)) => debug!(source = %source.name, "Inventory probe failed: {}", e),
            Err(_) => debug!(source = %source.name, "Inventory probe timed out"),
        }
        Some(source)
    }

    /// Sources found by the most recent pass, in discovery order
    pub async fn discovered(&self) -> Vec<SourceMetadata> {
        self.discovered.read().await.clone()
    }

    pub async fn get_best_source_for_inventory(&self) -> Option<SourceMetadata> {
        best_inventory_source(&self.discovered.read().await)
    }
}

/// Tags every promoted source of a type starts with
pub fn base_capabilities(source_type: SourceType) -> &'static [&'static str] {
    if source_type.is_database() {
        &[INVENTORY_CAPABILITY, "database"]
    } else {
        &[INVENTORY_CAPABILITY, "api", "cmdb"]
    }
}

/// Composite inventory key: structural evidence, then confidence, then
/// database over API
fn inventory_key_cmp(a: &SourceMetadata, b: &SourceMetadata) -> Ordering {
    a.has_inventory_evidence()
        .cmp(&b.has_inventory_evidence())
        .then_with(|| a.confidence.total_cmp(&b.confidence))
        .then_with(|| a.source_type.is_database().cmp(&b.source_type.is_database()))
}

/// Inventory-tagged sources, best first. Full ties keep their input order.
pub fn rank_inventory_sources(sources: &[SourceMetadata]) -> Vec<SourceMetadata> {
    let mut ranked: Vec<SourceMetadata> = sources
        .iter()
        .filter(|s| s.has_capability(INVENTORY_CAPABILITY))
        .cloned()
        .collect();
    // Stable sort, descending
    ranked.sort_by(|a, b| inventory_key_cmp(b, a));
    ranked
}

pub fn best_inventory_source(sources: &[SourceMetadata]) -> Option<SourceMetadata> {
    rank_inventory_sources(sources).into_iter().next()
}
