//! PostgreSQL connector implementation

use async_trait::async_trait;
use infraroute_core::{InfrarouteError, NativeQuery, Params, SourceMetadata, TimeoutConfig};
use infraroute_types::Row;
use serde_json::Value;
use sqlx::postgres::{PgColumn, PgConnectOptions, PgPool, PgPoolOptions, PgRow};
use sqlx::{Column, Row as _, TypeInfo};
use tracing::debug;

use super::inventory::inventory_tables;
use super::traits::{unsupported_query, ConnectionSettings, Connector, ConnectorResult};

const INVENTORY_COLUMNS_SQL: &str = "SELECT table_name::text AS table_name, column_name::text AS column_name \
     FROM information_schema.columns \
     WHERE table_schema NOT IN ('pg_catalog', 'information_schema')";

/// PostgreSQL connector backed by a lazily connected single-connection pool
pub struct PostgresConnector {
    metadata: SourceMetadata,
    pool: PgPool,
    timeouts: TimeoutConfig,
}

impl PostgresConnector {
    /// Build the connector; no connection is opened until first use
    pub fn new(metadata: SourceMetadata, settings: &ConnectionSettings) -> Self {
        let mut options = PgConnectOptions::new()
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

        let pool = PgPoolOptions::new()
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

    fn row_to_map(row: &PgRow) -> Row {
        row.columns()
            .iter()
            .map(|column| (column.name().to_string(), Self::column_value(row, column)))
            .collect()
    }

    /// Decode one column by its Postgres type name; undecodable values become null
    fn column_value(row: &PgRow, column: &PgColumn) -> Value {
        let idx = column.ordinal();
        let value = match column.type_info().name() {
            "BOOL" => row.try_get::<bool, _>(idx).map(Value::from),
            "INT2" => row.try_get::<i16, _>(idx).map(Value::from),
            "INT4" => row.try_get::<i32, _>(idx).map(Value::from),
            "INT8" => row.try_get::<i64, _>(idx).map(Value::from),
            "FLOAT4" => row.try_get::<f32, _>(idx).map(|v| float_value(v as f64)),
            "FLOAT8" => row.try_get::<f64, _>(idx).map(float_value),
            "UUID" => row
                .try_get::<uuid::Uuid, _>(idx)
                .map(|v| Value::String(v.to_string())),
            "TIMESTAMPTZ" | "TIMESTAMP" => row
                .try_get::<chrono::DateTime<chrono::Utc>, _>(idx)
                .map(|v| Value::String(v.to_rfc3339())),
            "DATE" => row
                .try_get::<chrono::NaiveDate, _>(idx)
                .map(|v| Value::String(v.to_string())),
            "JSON" | "JSONB" => row.try_get::<Value, _>(idx),
            "TEXT[]" | "VARCHAR[]" => row.try_get::<Vec<String>, _>(idx).map(Value::from),
            _ => row.try_get::<String, _>(idx).map(Value::String),
        };
        value.unwrap_or(Value::Null)
    }
}

pub(crate) fn float_value(v: f64) -> Value {
    serde_json::Number::from_f64(v)
        .map(Value::Number)
        .unwrap_or(Value::Null)
}

#[async_trait]
impl Connector for PostgresConnector {
    async fn test_connection(&self) -> bool {
        let probe = sqlx::query("SELECT 1").fetch_one(&self.pool);
        match tokio::time::timeout(self.timeouts.connect(), probe).await {
            Ok(Ok(_)) => true,
            Ok(Err(e)) => {
                debug!(source = %self.metadata.name, "PostgreSQL connection test failed: {}", e);
                false
            }
            Err(_) => {
                debug!(source = %self.metadata.name, "PostgreSQL connection test timed out");
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
            .map_err(|e| InfrarouteError::QueryFailed(format!("PostgreSQL query failed: {}", e)))?;

        Ok(rows.iter().map(Self::row_to_map).collect())
    }

    fn metadata(&self) -> &SourceMetadata {
        &self.metadata
    }

    async fn close(&self) {
        // Pool::close is idempotent and fine on a pool that never connected
        self.pool.close().await;
    }

    async fn discover_inventory(&self) -> Result<Vec<String>, InfrarouteError> {
        let rows = sqlx::query(INVENTORY_COLUMNS_SQL)
            .fetch_all(&self.pool)
            .await
            .map_err(|e| InfrarouteError::QueryFailed(format!("PostgreSQL schema probe failed: {}", e)))?;

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
        SourceMetadata::new("postgres_localhost", SourceType::Postgres, "localhost", 5432)
            .with_database("inventory")
    }

    #[tokio::test]
    async fn test_rejects_non_sql_query() {
        let connector = PostgresConnector::new(metadata(), &ConnectionSettings::default());
        let query = NativeQuery::Http {
            path: "/api/servers".to_string(),
            query: vec![],
        };
        let result = connector.query(&query, &Params::new()).await;
        assert!(matches!(result, Err(InfrarouteError::UnsupportedSourceType(_))));
    }

    #[tokio::test]
    async fn test_close_is_idempotent_without_connection() {
        let connector = PostgresConnector::new(metadata(), &ConnectionSettings::default());
        connector.close().await;
        connector.close().await;
        assert_eq!(connector.metadata().name, "postgres_localhost");
    }

    #[tokio::test]
    async fn test_unreachable_connection_test_is_false() {
        let unreachable = SourceMetadata::new("pg", SourceType::Postgres, "127.0.0.1", 1);
        let mut settings = ConnectionSettings::default();
        settings.timeouts.connect_secs = Some(1);
        let connector = PostgresConnector::new(unreachable, &settings);
        assert!(!connector.test_connection().await);
    }

    #[tokio::test]
    #[ignore] // Requires a running PostgreSQL instance
    async fn test_postgres_live_query() {
        let connector = PostgresConnector::new(metadata(), &ConnectionSettings::default());
        assert!(connector.test_connection().await);
        let query = NativeQuery::Sql {
            statement: "SELECT 1 AS one".to_string(),
            binds: vec![],
        };
        let rows = connector.query(&query, &Params::new()).await.unwrap();
        assert_eq!(rows[0].get("one"), Some(&Value::from(1)));
    }
}
