//! Intelligent router
//!
//! Moves one query through `Received -> Classified -> SourceSelected ->
//! Translated -> Executed` and ends either with rows from a source or with
//! the SSH-scan fallback. Emitting a fallback is a normal outcome, not an
//! error.

mod classifier;
mod filters;
mod translator;

pub use classifier::IntentClassifier;
pub use filters::extract_filters;
pub use translator::QueryTranslator;

use infraroute_core::{
    Config, InfrarouteError, NativeQuery, QueryFilters, QueryPlan, RouterConfig, SourceMetadata,
    TimeoutConfig,
};
use infraroute_types::{QueryIntent, Row};
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info, warn};

use crate::connectors::{ConnectorFactory, NativeConnectorFactory};
use crate::discovery::{SourceDiscovery, INVENTORY_CAPABILITY};
use crate::fallback::{fallback_from_config, FallbackExecutor};
use crate::registry::SourceRegistry;

/// Outcome of routing and executing one query
#[derive(Debug, Clone, Serialize)]
pub struct RoutedResult {
    pub plan: QueryPlan,
    pub rows: Vec<Row>,
    /// True when the rows came from the SSH scan
    pub used_fallback: bool,
}

struct Execution {
    rows: Vec<Row>,
    used_fallback: bool,
}

pub struct IntelligentRouter {
    registry: Arc<SourceRegistry>,
    discovery: Arc<SourceDiscovery>,
    fallback: Arc<dyn FallbackExecutor>,
    classifier: IntentClassifier,
    translator: QueryTranslator,
    auto_discover: bool,
    timeouts: TimeoutConfig,
}

impl IntelligentRouter {
    pub fn new(
        registry: Arc<SourceRegistry>,
        discovery: Arc<SourceDiscovery>,
        fallback: Arc<dyn FallbackExecutor>,
        settings: &RouterConfig,
        timeouts: TimeoutConfig,
    ) -> Self {
        Self {
            registry,
            discovery,
            fallback,
            classifier: IntentClassifier::new(),
            translator: QueryTranslator::from_config(settings),
            auto_discover: settings.auto_discover,
            timeouts,
        }
    }

    /// Wire the router, registry, discovery and fallback from configuration
    pub async fn from_config(config: &Config) -> Result<Self, InfrarouteError> {
        let factory: Arc<dyn ConnectorFactory> = Arc::new(NativeConnectorFactory::from_config(config));
        let registry = Arc::new(SourceRegistry::from_config(config, factory.clone()).await?);
        let discovery = Arc::new(SourceDiscovery::new(factory, &config.discovery));
        let fallback = fallback_from_config(&config.router, &config.discovery.timeouts)?;
        Ok(Self::new(
            registry,
            discovery,
            fallback,
            &config.router,
            config.discovery.timeouts.clone(),
        ))
    }

    /// Longest one `ask` can take: a connect, the source query, then the
    /// fallback scan under the same query timeout
    pub fn request_budget(&self) -> Duration {
        self.timeouts
            .connect()
            .saturating_add(self.timeouts.query().saturating_mul(2))
    }

    pub fn registry(&self) -> &Arc<SourceRegistry> {
        &self.registry
    }

    pub fn discovery(&self) -> &Arc<SourceDiscovery> {
        &self.discovery
    }

    pub fn classify(&self, text: &str) -> QueryIntent {
        self.classifier.classify(text, &extract_filters(text))
    }

    pub fn extract_filters(&self, text: &str) -> QueryFilters {
        extract_filters(text)
    }

    /// Run discovery and merge the results into the registry
    pub async fn discover(&self) -> Result<Vec<SourceMetadata>, InfrarouteError> {
        let found = self.discovery.discover_all().await;
        self.registry.register_all(found.clone()).await?;
        Ok(found)
    }

    /// Produce a plan for `text` without executing it
    pub async fn route(&self, text: &str) -> Result<QueryPlan, InfrarouteError> {
        let filters = extract_filters(text);
        let intent = self.classifier.classify(text, &filters);
        debug!(%intent, ?filters, "Classified query");

        if self.auto_discover && self.registry.is_cache_expired().await {
            info!(env = %self.registry.environment(), "Registry empty or stale, running discovery");
            self.discover().await?;
        }

        match self.select_source(intent).await {
            Some(source) => {
                debug!(source = %source.name, %intent, "Selected source");
                self.translate(intent, &filters, source, text)
            }
            None => {
                warn!(%intent, "No source selected, emitting SSH scan plan");
                Ok(QueryPlan::ssh_scan(intent, text, filters.to_params()))
            }
        }
    }

    /// Translate for `source`, attaching the SSH-scan fallback
    pub fn translate(
        &self,
        intent: QueryIntent,
        filters: &QueryFilters,
        source: SourceMetadata,
        text: &str,
    ) -> Result<QueryPlan, InfrarouteError> {
        let query = self.translator.translate(intent, filters, &source)?;
        debug!(source = %source.name, ?query, "Translated query");
        Ok(QueryPlan::for_source(
            source,
            intent,
            query,
            filters.to_params(),
            text,
        ))
    }

    async fn select_source(&self, intent: QueryIntent) -> Option<SourceMetadata> {
        if intent.is_config() {
            debug!(%intent, "Config intents are answered by the SSH scan");
            return None;
        }

        if intent.is_inventory() {
            if let Some(best) = self.discovery.get_best_source_for_inventory().await {
                return Some(best);
            }
            let mut tagged = self
                .registry
                .get_sources_by_capability(INVENTORY_CAPABILITY)
                .await;
            // Databases before APIs, then by confidence; stable on ties
            tagged.sort_by(|a, b| {
                b.source_type
                    .is_database()
                    .cmp(&a.source_type.is_database())
                    .then_with(|| b.confidence.total_cmp(&a.confidence))
            });
            return tagged.into_iter().next();
        }

        if intent == QueryIntent::SystemStatus {
            let mut apis = self
                .registry
                .list_sources()
                .await
                .into_iter()
                .filter(|s| s.source_type.is_api())
                .collect::<Vec<_>>();
            apis.sort_by(|a, b| b.confidence.total_cmp(&a.confidence));
            return apis.into_iter().next();
        }

        None
    }

    /// Execute a plan, answering eligible failures with its fallback
    pub async fn execute_query(&self, plan: &QueryPlan) -> Result<Vec<Row>, InfrarouteError> {
        self.execute(plan).await.map(|execution| execution.rows)
    }

    /// Route and execute in one step
    pub async fn ask(&self, text: &str) -> Result<RoutedResult, InfrarouteError> {
        let plan = self.route(text).await?;
        let execution = self.execute(&plan).await?;
        Ok(RoutedResult {
            plan,
            rows: execution.rows,
            used_fallback: execution.used_fallback,
        })
    }

    async fn execute(&self, plan: &QueryPlan) -> Result<Execution, InfrarouteError> {
        let source = match (&plan.query, &plan.source) {
            (NativeQuery::SshScan(request), _) => {
                let rows = self.fallback.execute(request).await?;
                return Ok(Execution {
                    rows,
                    used_fallback: true,
                });
            }
            (_, Some(source)) => source,
            (_, None) => {
                return Err(InfrarouteError::Internal(
                    "plan has a native query but no source".to_string(),
                ))
            }
        };

        match self.run_on_source(source, plan).await {
            Ok(rows) => {
                info!(source = %source.name, rows = rows.len(), "Query served");
                Ok(Execution {
                    rows,
                    used_fallback: false,
                })
            }
            Err(e) if e.is_fallback_eligible() => match &plan.fallback {
                Some(fallback) => {
                    warn!(source = %source.name, "Source failed, running fallback: {}", e);
                    let rows = self.fallback.execute(&fallback.request).await?;
                    Ok(Execution {
                        rows,
                        used_fallback: true,
                    })
                }
                None => Err(e),
            },
            Err(e) => Err(e),
        }
    }

    /// One connector per execution, closed on every exit path
    async fn run_on_source(
        &self,
        source: &SourceMetadata,
        plan: &QueryPlan,
    ) -> Result<Vec<Row>, InfrarouteError> {
        let connector = self.registry.connector_for(source).map_err(|e| match e {
            InfrarouteError::UnsupportedSourceType(_) | InfrarouteError::ConnectionProbeFailed(_) => e,
            other => InfrarouteError::ConnectionProbeFailed(other.to_string()),
        })?;

        let timeout = self.timeouts.query();
        let result = tokio::time::timeout(timeout, connector.query(&plan.query, &plan.params))
            .await
            .unwrap_or_else(|_| {
                Err(InfrarouteError::Timeout(
                    timeout.as_secs(),
                    format!("query on '{}'", source.name),
                ))
            });
        connector.close().await;
        result
    }
}
