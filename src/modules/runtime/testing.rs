//! In-memory connector doubles shared by discovery, registry and router tests

use async_trait::async_trait;
use infraroute_core::{InfrarouteError, NativeQuery, Params, SourceMetadata};
use infraroute_types::{Row, SourceType};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use crate::connectors::{Connector, ConnectorFactory, ConnectorResult};

/// Scripted behaviour of one mock source, keyed by source name
#[derive(Clone, Default)]
pub struct MockBehaviour {
    pub reachable: bool,
    pub inventory: Vec<String>,
    pub rows: Vec<Row>,
    pub fail_query: bool,
}

#[derive(Default)]
pub struct MockFactory {
    pub candidates: HashMap<SourceType, Vec<SourceMetadata>>,
    pub behaviour: HashMap<String, MockBehaviour>,
    pub queries: Arc<Mutex<Vec<NativeQuery>>>,
    pub closed: Arc<AtomicUsize>,
    pub created: Arc<AtomicUsize>,
}

impl MockFactory {
    pub fn with_candidate(mut self, source: SourceMetadata, behaviour: MockBehaviour) -> Self {
        self.behaviour.insert(source.name.clone(), behaviour);
        self.candidates
            .entry(source.source_type)
            .or_default()
            .push(source);
        self
    }

    pub fn with_source(mut self, name: &str, behaviour: MockBehaviour) -> Self {
        self.behaviour.insert(name.to_string(), behaviour);
        self
    }

    pub fn closed(&self) -> usize {
        self.closed.load(Ordering::SeqCst)
    }

    pub fn created(&self) -> usize {
        self.created.load(Ordering::SeqCst)
    }

    pub fn recorded_queries(&self) -> Vec<NativeQuery> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ConnectorFactory for MockFactory {
    async fn detect_on_localhost(&self, source_type: SourceType) -> Vec<SourceMetadata> {
        self.candidates.get(&source_type).cloned().unwrap_or_default()
    }

    fn create(&self, source: &SourceMetadata) -> Result<Box<dyn Connector>, InfrarouteError> {
        let behaviour = self.behaviour.get(&source.name).cloned().ok_or_else(|| {
            InfrarouteError::ConnectionProbeFailed(format!("no mock for '{}'", source.name))
        })?;
        self.created.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MockConnector {
            metadata: source.clone(),
            behaviour,
            queries: self.queries.clone(),
            closed: self.closed.clone(),
        }))
    }
}

pub struct MockConnector {
    metadata: SourceMetadata,
    behaviour: MockBehaviour,
    queries: Arc<Mutex<Vec<NativeQuery>>>,
    closed: Arc<AtomicUsize>,
}

#[async_trait]
impl Connector for MockConnector {
    async fn test_connection(&self) -> bool {
        self.behaviour.reachable
    }

    async fn query(
        &self,
        query: &NativeQuery,
        _params: &Params,
    ) -> Result<ConnectorResult, InfrarouteError> {
        self.queries.lock().unwrap().push(query.clone());
        if self.behaviour.fail_query {
            return Err(InfrarouteError::QueryFailed(format!(
                "mock '{}' refused the query",
                self.metadata.name
            )));
        }
        Ok(self.behaviour.rows.clone())
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    async fn close(&self) {
        self.closed.fetch_add(1, Ordering::SeqCst);
    }

    async fn discover_inventory(&self) -> Result<Vec<String>, InfrarouteError> {
        Ok(self.behaviour.inventory.clone())
    }
}

pub fn row(pairs: &[(&str, serde_json::Value)]) -> Row {
    pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.clone()))
        .collect()
}
