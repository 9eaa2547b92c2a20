//! MongoDB connector implementation

use async_trait::async_trait;
use bson::{Bson, Document};
use futures::TryStreamExt;
use infraroute_core::{
    DocumentOperation, InfrarouteError, NativeQuery, Params, SourceMetadata, TimeoutConfig,
};
use infraroute_types::Row;
use mongodb::options::{ClientOptions, Credential, ServerAddress, Tls, TlsOptions};
use mongodb::{Client, Database};
use tokio::sync::RwLock;
use tracing::debug;

use super::inventory::is_inventory_name;
use super::traits::{unsupported_query, ConnectionSettings, Connector, ConnectorResult};

const DEFAULT_DATABASE: &str = "inventory";

/// MongoDB connector using the typed find/aggregate API
pub struct MongoDbConnector {
    metadata: SourceMetadata,
    client: RwLock<Option<Client>>,
    database: String,
    timeouts: TimeoutConfig,
}

impl MongoDbConnector {
    /// Build the connector. The driver connects lazily on first operation.
    pub fn new(
        metadata: SourceMetadata,
        settings: &ConnectionSettings,
    ) -> Result<Self, InfrarouteError> {
        let address = ServerAddress::parse(format!("{}:{}", metadata.host, metadata.port))
            .map_err(|e| {
                InfrarouteError::ConnectionProbeFailed(format!(
                    "invalid MongoDB address for '{}': {}",
                    metadata.name, e
                ))
            })?;

        let mut options = ClientOptions::builder().hosts(vec![address]).build();
        options.app_name = Some("infraroute".to_string());
        options.connect_timeout = Some(settings.timeouts.connect());
        options.server_selection_timeout = Some(settings.timeouts.connect());
        if settings.username.is_some() {
            options.credential = Some(
                Credential::builder()
                    .username(settings.username.clone())
                    .password(settings.password.clone())
                    .build(),
            );
        }
        if metadata.tls {
            options.tls = Some(Tls::Enabled(TlsOptions::default()));
        }

        let client = Client::with_options(options).map_err(|e| {
            InfrarouteError::ConnectionProbeFailed(format!(
                "MongoDB client creation failed for '{}': {}",
                metadata.name, e
            ))
        })?;

        let database = metadata
            .database
            .clone()
            .or_else(|| settings.database.clone())
            .unwrap_or_else(|| DEFAULT_DATABASE.to_string());

        Ok(Self {
            metadata,
            client: RwLock::new(Some(client)),
            database,
            timeouts: settings.timeouts.clone(),
        })
    }

    async fn database(&self) -> Result<Database, InfrarouteError> {
        self.client
            .read()
            .await
            .as_ref()
            .map(|client| client.database(&self.database))
            .ok_or_else(|| {
                InfrarouteError::QueryFailed(format!(
                    "MongoDB connector '{}' is closed",
                    self.metadata.name
                ))
            })
    }

    async fn run(
        &self,
        collection: &str,
        operation: &DocumentOperation,
    ) -> Result<Vec<Document>, InfrarouteError> {
        let collection = self.database().await?.collection::<Document>(collection);
        let failed = |e: mongodb::error::Error| {
            InfrarouteError::QueryFailed(format!(
                "MongoDB query on '{}' failed: {}",
                collection.name(),
                e
            ))
        };

        match operation {
            DocumentOperation::Find { filter } => {
                let filter = to_document(filter)?;
                let cursor = collection.find(filter, None).await.map_err(failed)?;
                cursor.try_collect().await.map_err(failed)
            }
            DocumentOperation::Aggregate { pipeline } => {
                let stages = pipeline
                    .iter()
                    .map(to_document)
                    .collect::<Result<Vec<_>, _>>()?;
                let cursor = collection.aggregate(stages, None).await.map_err(failed)?;
                cursor.try_collect().await.map_err(failed)
            }
        }
    }
}

fn to_document(value: &serde_json::Value) -> Result<Document, InfrarouteError> {
    match bson::to_bson(value) {
        Ok(Bson::Document(doc)) => Ok(doc),
        Ok(_) => Err(InfrarouteError::QueryFailed(
            "MongoDB filter and pipeline stages must be JSON objects".to_string(),
        )),
        Err(e) => Err(InfrarouteError::QueryFailed(format!(
            "JSON to BSON failed: {}",
            e
        ))),
    }
}

/// `$count` emits no document when nothing matched; SQL counts return a zero row
fn zero_count_row(operation: &DocumentOperation) -> Option<Row> {
    let DocumentOperation::Aggregate { pipeline } = operation else {
        return None;
    };
    let field = pipeline.last()?.get("$count")?.as_str()?;
    Some(Row::from([(field.to_string(), serde_json::Value::from(0))]))
}

fn document_to_row(doc: Document) -> Row {
    doc.into_iter()
        .map(|(key, value)| (key, bson_to_json(value)))
        .collect()
}

fn bson_to_json(bson: Bson) -> serde_json::Value {
    match bson {
        Bson::ObjectId(oid) => serde_json::Value::String(oid.to_hex()),
        Bson::DateTime(dt) => serde_json::Value::String(
            chrono::DateTime::from_timestamp_millis(dt.timestamp_millis())
                .map(|d| d.to_rfc3339())
                .unwrap_or_else(|| dt.to_string()),
        ),
        Bson::Document(doc) => serde_json::Value::Object(
            doc.into_iter()
                .map(|(key, value)| (key, bson_to_json(value)))
                .collect(),
        ),
        Bson::Array(arr) => serde_json::Value::Array(arr.into_iter().map(bson_to_json).collect()),
        Bson::Decimal128(d) => serde_json::Value::String(d.to_string()),
        other => bson::from_bson(other).unwrap_or(serde_json::Value::Null),
    }
}

#[async_trait]
impl Connector for MongoDbConnector {
    async fn test_connection(&self) -> bool {
        let client = match self.client.read().await.as_ref() {
            Some(client) => client.clone(),
            None => return false,
        };
        let admin = client.database("admin");
        let ping = admin.run_command(bson::doc! { "ping": 1 }, None);
        match tokio::time::timeout(self.timeouts.connect(), ping).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(source = %self.metadata.name, "MongoDB ping failed: {}", e);
                false
            }
            Err(_) => {
                debug!(source = %self.metadata.name, "MongoDB ping timed out");
                false
            }
        }
    }

    async fn query(
        &self,
        query: &NativeQuery,
        _params: &Params,
    ) -> Result<ConnectorResult, InfrarouteError> {
        let NativeQuery::Document {
            collection,
            operation,
        } = query
        else {
            return Err(unsupported_query(&self.metadata, query));
        };

        let docs = self.run(collection, operation).await?;
        if docs.is_empty() {
            if let Some(row) = zero_count_row(operation) {
                return Ok(vec![row]);
            }
        }

        Ok(docs.into_iter().map(document_to_row).collect())
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    async fn close(&self) {
        // Dropping the last Client handle shuts its pool down
        self.client.write().await.take();
    }

    async fn discover_inventory(&self) -> Result<Vec<String>, InfrarouteError> {
        let database = self.database().await?;
        let mut names = database.list_collection_names(None).await.map_err(|e| {
            InfrarouteError::QueryFailed(format!("MongoDB collection listing failed: {}", e))
        })?;
        names.retain(|name| is_inventory_name(name));
        names.sort();
        Ok(names)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraroute_types::SourceType;
    use serde_json::json;

    fn metadata() -> SourceMetadata {
        SourceMetadata::new("mongodb_localhost", SourceType::Mongodb, "localhost", 27017)
    }

    #[test]
    fn test_bson_to_json_nested() {
        let doc = bson::doc! {
            "hostname": "web-01",
            "tags": ["prod", "web"],
            "meta": { "cpus": 4 }
        };
        let row = document_to_row(doc);
        assert_eq!(row.get("hostname"), Some(&json!("web-01")));
        assert_eq!(row.get("tags"), Some(&json!(["prod", "web"])));
        assert_eq!(row.get("meta"), Some(&json!({"cpus": 4})));
    }

    #[test]
    fn test_object_id_becomes_hex() {
        let oid = bson::oid::ObjectId::new();
        assert_eq!(bson_to_json(Bson::ObjectId(oid)), json!(oid.to_hex()));
    }

    #[test]
    fn test_to_document_rejects_scalars() {
        assert!(to_document(&json!({"role": "web"})).is_ok());
        assert!(to_document(&json!("role")).is_err());
    }

    #[test]
    fn test_empty_count_becomes_zero_row() {
        let count = DocumentOperation::Aggregate {
            pipeline: vec![json!({"$match": {"role": "db"}}), json!({"$count": "count"})],
        };
        let row = zero_count_row(&count).unwrap();
        assert_eq!(row.get("count"), Some(&json!(0)));

        let find = DocumentOperation::Find { filter: json!({}) };
        assert!(zero_count_row(&find).is_none());
        let no_count = DocumentOperation::Aggregate {
            pipeline: vec![json!({"$match": {}})],
        };
        assert!(zero_count_row(&no_count).is_none());
    }

    #[tokio::test]
    async fn test_unreachable_server_fails_ping() {
        let port = {
            let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
            listener.local_addr().unwrap().port()
        };
        let settings = ConnectionSettings {
            timeouts: TimeoutConfig {
                connect_secs: Some(1),
                ..Default::default()
            },
            ..Default::default()
        };
        let metadata = SourceMetadata::new("mongodb_gone", SourceType::Mongodb, "127.0.0.1", port);
        let connector = MongoDbConnector::new(metadata, &settings).unwrap();
        assert!(!connector.test_connection().await);
    }

    #[tokio::test]
    async fn test_default_database_and_close() {
        let connector = MongoDbConnector::new(metadata(), &ConnectionSettings::default()).unwrap();
        assert_eq!(connector.database, DEFAULT_DATABASE);
        connector.close().await;
        connector.close().await;
        assert!(!connector.test_connection().await);
        assert!(connector.discover_inventory().await.is_err());
    }

    #[tokio::test]
    async fn test_rejects_sql_query() {
        let connector = MongoDbConnector::new(metadata(), &ConnectionSettings::default()).unwrap();
        let query = NativeQuery::Sql {
            statement: "SELECT 1".to_string(),
            binds: vec![],
        };
        let result = connector.query(&query, &Params::new()).await;
        assert!(matches!(result, Err(InfrarouteError::UnsupportedSourceType(_))));
    }

    #[tokio::test]
    #[ignore] // Requires a running MongoDB instance
    async fn test_mongodb_live_ping() {
        let connector = MongoDbConnector::new(metadata(), &ConnectionSettings::default()).unwrap();
        assert!(connector.test_connection().await);
    }
}
