//! MySQL connector implementation

use async_trait::async_trait;
use infraroute_core::{InfrarouteError, NativeQuery, Params, SourceMetadata, TimeoutConfig};
use infraroute_types::Row;
use serde_json::Value;
use sqlx::mysql::{MySqlColumn, MySqlConnectOptions, MySqlPool, MySqlPoolOptions, MySqlRow};
use sqlx::{Column, Row as _, TypeInfo};
use tracing::debug;

use super::inventory::inventory_tables;
use super::postgres::float_value;
use super::traits::{unsupported_query, ConnectionSettings, Connector, ConnectorResult};

const INVENTORY_COLUMNS_SQL: &str = "SELECT CAST(TABLE_NAME AS CHAR) AS table_name, CAST(COLUMN_NAME AS CHAR) AS column_name \
     FROM information_schema.COLUMNS \
     WHERE TABLE_SCHEMA = DATABASE()";

/// MySQL connector backed by a lazily connected single-connection pool
pub struct MySqlConnector {
    metadata: SourceMetadata,
    pool: MySqlPool,
    timeouts: TimeoutConfig,
}

impl MySqlConnector {
    /// Build the connector; no connection is opened until first use
    pub fn new(metadata: SourceMetadata, settings: &ConnectionSettings) -> Self {
        let mut options = MySqlConnectOptions::new()
            .host(&metadata.host)
            .port(metadata.port);
        if let Some(username) = &settings.username {
            options = options.username(username);
        }
        if let Some(password) = &settings.password {
            options = options.password(password);
        }
        if let Some(database) = metadata.database.as_ref().or(settings.database.as_ref()) {
            options = options.database(database);
        }

        let pool = MySqlPoolOptions::new()
            .max_connections(1)
            .min_connections(0)
            .acquire_timeout(settings.timeouts.connect())
            .connect_lazy_with(options);

        Self {
            metadata,
            pool,
            timeouts: settings.timeouts.clone(),
        }
    }

    fn row_to_map(row: &MySqlRow) -> Row {
        row.columns()
            .iter()
            .map(|column| (column.name().to_string(), Self::column_value(row, column)))
            .collect()
    }

    /// Decode one column by its MySQL type name; undecodable values become null
    fn column_value(row: &MySqlRow, column: &MySqlColumn) -> Value {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "BOOLEAN" => row.try_get::<bool, _>(idx).map(Value::from),
            "TINYINT" | "SMALLINT" => row.try_get::<i16, _>(idx).map(Value::from),
            "INT" | "MEDIUMINT" => row.try_get::<i32, _>(idx).map(Value::from),
            "BIGINT" => row.try_get::<i64, _>(idx).map(Value::from),
            "BIGINT UNSIGNED" => row.try_get::<u64, _>(idx).map(Value::from),
            "FLOAT" => row.try_get::<f32, _>(idx).map(|v| float_value(v as f64)),
            "DOUBLE" => row.try_get::<f64, _>(idx).map(float_value),
            "DATETIME" | "TIMESTAMP" => row
                .try_get::<chrono::NaiveDateTime, _>(idx)
                .map(|v| Value::String(v.format("%Y-%m-%dT%H:%M:%S").to_string())),
            "DATE" => row
                .try_get::<chrono::NaiveDate, _>(idx)
                .map(|v| Value::String(v.to_string())),
            "JSON" => row.try_get::<Value, _>(idx),
            _ => row.try_get::<String, _>(idx).map(Value::String),
        };
        value.unwrap_or(Value::Null)
    }
}

#[async_trait]
impl Connector for MySqlConnector {
    async fn test_connection(&self) -> bool {
        let probe = sqlx::query("SELECT 1").fetch_one(&self.pool);
        match tokio::time::timeout(self.timeouts.connect(), probe).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(source = %self.metadata.name, "MySQL connection test failed: {}", e);
                false
            }
            Err(_) => {
                debug!(source = %self.metadata.name, "MySQL connection test timed out");
                false
            }
        }
    }

    async fn query(
        &self,
        query: &NativeQuery,
        _params: &Params,
    ) -> Result<ConnectorResult, InfrarouteError> {
        let NativeQuery::Sql { statement, binds } = query else {
            return Err(unsupported_query(&self.metadata, query));
        };

        let mut sql = sqlx::query(statement);
        for bind in binds {
            sql = sql.bind(bind.as_str());
        }

        let rows = sql
            .fetch_all(&self.pool)
            .await
            .map_err(|e| InfrarouteError::QueryFailed(format!("MySQL query failed: {}", e)))?;

        Ok(rows.iter().map(Self::row_to_map).collect())
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    async fn close(&self) {
        self.pool.close().await;
    }

    async fn discover_inventory(&self) -> Result<Vec<String>, InfrarouteError> {
        let rows = sqlx::query(INVENTORY_COLUMNS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| InfrarouteError::QueryFailed(format!("MySQL schema probe failed: {}", e)))?;

        let columns = rows.iter().filter_map(|row| {
            let table = row.try_get::<String, _>("table_name").ok()?;
            let column = row.try_get::<String, _>("column_name").ok()?;
            Some((table, column))
        });
        Ok(inventory_tables(columns))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraroute_types::SourceType;

    fn metadata() -> SourceMetadata {
        SourceMetadata::new("mysql_localhost", SourceType::Mysql, "localhost", 3306)
            .with_database("inventory")
    }

    #[tokio::test]
    async fn test_rejects_document_query() {
        let connector = MySqlConnector::new(metadata(), &ConnectionSettings::default());
        let query = NativeQuery::Document {
            collection: "servers".to_string(),
            operation: infraroute_core::DocumentOperation::Find {
                filter: serde_json::json!({}),
            },
        };
        let result = connector.query(&query, &Params::new()).await;
        assert!(matches!(result, Err(InfrarouteError::UnsupportedSourceType(_))));
    }

    #[tokio::test]
    async fn test_close_twice() {
        let connector = MySqlConnector::new(metadata(), &ConnectionSettings::default());
        connector.close().await;
        connector.close().await;
    }

    #[tokio::test]
    #[ignore] // Requires a running MySQL instance
    async fn test_mysql_live_connection() {
        let connector = MySqlConnector::new(metadata(), &ConnectionSettings::default());
        assert!(connector.test_connection().await);
    }
}
