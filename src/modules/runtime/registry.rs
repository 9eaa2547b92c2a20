//! Source registry: per-environment, TTL-bound cache of known sources

use chrono::{DateTime, Utc};
use infraroute_core::{Config, InfrarouteError, SourceMetadata};
use infraroute_types::SourceType;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::RwLock;
use tracing::{debug, info};

use crate::connectors::{Connector, ConnectorFactory};

/// One registered source and when it was last written
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegistryEntry {
    pub metadata: SourceMetadata,
    pub refreshed_at: DateTime<Utc>,
}

/// On-disk form of one environment namespace
#[derive(Debug, Default, Serialize, Deserialize)]
struct Snapshot {
    environment: String,
    #[serde(default)]
    last_refreshed: Option<DateTime<Utc>>,
    #[serde(default)]
    entries: Vec<RegistryEntry>,
}

#[derive(Default)]
struct RegistryState {
    entries: Vec<RegistryEntry>,
    last_refreshed: Option<DateTime<Utc>>,
}

impl RegistryState {
    fn upsert(&mut self, metadata: SourceMetadata, now: DateTime<Utc>) {
        let entry = RegistryEntry {
            metadata,
            refreshed_at: now,
        };
        match self
            .entries
            .iter_mut()
            .find(|e| e.metadata.name == entry.metadata.name)
        {
            Some(existing) => *existing = entry,
            None => self.entries.push(entry),
        }
    }
}

/// Known sources for one environment.
///
/// Entries keep insertion order; re-registering a name replaces it in
/// place. All access goes through a single lock.
pub struct SourceRegistry {
    environment: String,
    ttl: Duration,
    path: Option<PathBuf>,
    factory: Arc<dyn ConnectorFactory>,
    state: RwLock<RegistryState>,
}

impl SourceRegistry {
    /// Registry that is never written to disk
    pub fn in_memory(
        environment: impl Into<String>,
        ttl: Duration,
        factory: Arc<dyn ConnectorFactory>,
    ) -> Self {
        Self {
            environment: environment.into(),
            ttl,
            path: None,
            factory,
            state: RwLock::new(RegistryState::default()),
        }
    }

    /// Registry persisted at `<dir>/<environment>.json`, loading any
    /// existing snapshot
    pub async fn open(
        dir: impl AsRef<Path>,
        environment: impl Into<String>,
        ttl: Duration,
        factory: Arc<dyn ConnectorFactory>,
    ) -> Result<Self, InfrarouteError> {
        let environment = environment.into();
        let path = dir.as_ref().join(format!("{}.json", environment));

        let state = match tokio::fs::read_to_string(&path).await {
            Ok(content) => {
                let snapshot: Snapshot = serde_json::from_str(&content).map_err(|e| {
                    InfrarouteError::Registry(format!(
                        "invalid registry snapshot '{}': {}",
                        path.display(),
                        e
                    ))
                })?;
                debug!(
                    "Loaded {} registry entries from {}",
                    snapshot.entries.len(),
                    path.display()
                );
                RegistryState {
                    entries: snapshot.entries,
                    last_refreshed: snapshot.last_refreshed,
                }
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => RegistryState::default(),
            Err(e) => {
                return Err(InfrarouteError::Registry(format!(
                    "failed to read '{}': {}",
                    path.display(),
                    e
                )))
            }
        };

        Ok(Self {
            environment,
            ttl,
            path: Some(path),
            factory,
            state: RwLock::new(state),
        })
    }

    /// Build the registry described by `config` and register its manual
    /// sources. Manual sources do not count as a discovery refresh.
    pub async fn from_config(
        config: &Config,
        factory: Arc<dyn ConnectorFactory>,
    ) -> Result<Self, InfrarouteError> {
        let ttl = config.registry.ttl();
        let registry = match &config.registry.path {
            Some(dir) => Self::open(dir, &config.environment, ttl, factory).await?,
            None => Self::in_memory(&config.environment, ttl, factory),
        };
        for source in &config.sources {
            registry.register(source.clone()).await?;
        }
        Ok(registry)
    }

    pub fn environment(&self) -> &str {
        &self.environment
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Upsert one source by name
    pub async fn register(&self, metadata: SourceMetadata) -> Result<(), InfrarouteError> {
        let mut state = self.state.write().await;
        debug!(source = %metadata.name, env = %self.environment, "Registering source");
        state.upsert(metadata, Utc::now());
        self.persist(&state).await
    }

    /// Upsert the results of a discovery pass and stamp the refresh time
    pub async fn register_all(&self, sources: Vec<SourceMetadata>) -> Result<(), InfrarouteError> {
        let mut state = self.state.write().await;
        let now = Utc::now();
        let count = sources.len();
        for metadata in sources {
            state.upsert(metadata, now);
        }
        state.last_refreshed = Some(now);
        info!(env = %self.environment, "Registry refreshed with {} source(s)", count);
        self.persist(&state).await
    }

    pub async fn list_sources(&self) -> Vec<SourceMetadata> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .map(|e| e.metadata.clone())
            .collect()
    }

    pub async fn get_source(&self, name: &str) -> Option<SourceMetadata> {
        self.state
            .read()
            .await
            .entries
            .iter()
            .find(|e| e.metadata.name == name)
            .map(|e| e.metadata.clone())
    }

    pub async fn get_sources_by_type(&self, source_type: SourceType) -> Vec<SourceMetadata> {
        self.filtered(|m| m.source_type == source_type).await
    }

    pub async fn get_sources_by_capability(&self, capability: &str) -> Vec<SourceMetadata> {
        self.filtered(|m| m.has_capability(capability)).await
    }

    async fn filtered<F>(&self, predicate: F) -> Vec<SourceMetadata>
    where
        F: Fn(&SourceMetadata) -> bool,
    {
        self.state
            .read()
            .await
            .entries
            .iter()
            .filter(|e| predicate(&e.metadata))
            .map(|e| e.metadata.clone())
            .collect()
    }

    /// Build the connector for a registered source; `None` for unknown names
    pub async fn get_connector(
        &self,
        name: &str,
    ) -> Result<Option<Box<dyn Connector>>, InfrarouteError> {
        match self.get_source(name).await {
            Some(metadata) => self.connector_for(&metadata).map(Some),
            None => Ok(None),
        }
    }

    pub fn connector_for(
        &self,
        metadata: &SourceMetadata,
    ) -> Result<Box<dyn Connector>, InfrarouteError> {
        self.factory.create(metadata)
    }

    pub async fn last_refreshed(&self) -> Option<DateTime<Utc>> {
        self.state.read().await.last_refreshed
    }

    pub async fn is_cache_expired(&self) -> bool {
        self.is_cache_expired_at(Utc::now()).await
    }

    /// Expired when empty, never refreshed, or older than the TTL at `now`
    pub async fn is_cache_expired_at(&self, now: DateTime<Utc>) -> bool {
        let state = self.state.read().await;
        if state.entries.is_empty() {
            return true;
        }
        match state.last_refreshed {
            None => true,
            // A refresh stamped in the future is treated as fresh
            Some(at) => (now - at).to_std().map(|age| age > self.ttl).unwrap_or(false),
        }
    }

    pub async fn remove(&self, name: &str) -> Result<bool, InfrarouteError> {
        let mut state = self.state.write().await;
        let before = state.entries.len();
        state.entries.retain(|e| e.metadata.name != name);
        let removed = state.entries.len() != before;
        if removed {
            self.persist(&state).await?;
        }
        Ok(removed)
    }

    pub async fn clear(&self) -> Result<(), InfrarouteError> {
        let mut state = self.state.write().await;
        *state = RegistryState::default();
        self.persist(&state).await
    }

    pub async fn len(&self) -> usize {
        self.state.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.state.read().await.entries.is_empty()
    }

    /// Write the snapshot through a temp file so readers never see a
    /// partial file
    async fn persist(&self, state: &RegistryState) -> Result<(), InfrarouteError> {
        let Some(path) = &self.path else {
            return Ok(());
        };

        let snapshot = Snapshot {
            environment: self.environment.clone(),
            last_refreshed: state.last_refreshed,
            entries: state.entries.clone(),
        };
        let content = serde_json::to_string_pretty(&snapshot)?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir).await.map_err(|e| {
                InfrarouteError::Registry(format!("failed to create '{}': {}", dir.display(), e))
            })?;
        }
        let tmp = path.with_extension("json.tmp");
        tokio::fs::write(&tmp, content).await.map_err(|e| {
            InfrarouteError::Registry(format!("failed to write '{}': {}", tmp.display(), e))
        })?;
        tokio::fs::rename(&tmp, path).await.map_err(|e| {
            InfrarouteError::Registry(format!("failed to replace '{}': {}", path.display(), e))
        })?;
        Ok(())
    }
}
