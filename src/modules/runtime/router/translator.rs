//! Translation of an intent and filters into a backend-native query

use infraroute_core::{
    DocumentOperation, InfrarouteError, NativeQuery, QueryFilters, RouterConfig, SourceMetadata,
};
use infraroute_types::{QueryIntent, SourceType};
use serde_json::{json, Value};

/// Columns/fields each filter is checked against, since schemas differ
/// between installations
const ENVIRONMENT_FIELDS: &[&str] = &["environment", "env", "tags"];
const ROLE_FIELDS: &[&str] = &["role", "service", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Placeholder {
    /// `$1`, `$2`, ...
    Numbered,
    /// `?`
    Positional,
}

/// Accumulates a WHERE clause and its binds
struct SqlBuilder {
    style: Placeholder,
    clauses: Vec<String>,
    binds: Vec<String>,
}

impl SqlBuilder {
    fn new(style: Placeholder) -> Self {
        Self {
            style,
            clauses: Vec::new(),
            binds: Vec::new(),
        }
    }

    fn bind(&mut self, value: impl Into<String>) -> String {
        self.binds.push(value.into());
        match self.style {
            Placeholder::Numbered => format!("${}", self.binds.len()),
            Placeholder::Positional => "?".to_string(),
        }
    }

    fn environment(&mut self, env: &str) {
        let environment = self.bind(env);
        let short = self.bind(env);
        let tags = self.bind(format!("%{}%", env));
        self.clauses.push(format!(
            "(environment = {} OR env = {} OR tags LIKE {})",
            environment, short, tags
        ));
    }

    fn role(&mut self, role: &str) {
        let placeholders: Vec<String> = ROLE_FIELDS
            .iter()
            .map(|field| format!("{} = {}", field, self.bind(role)))
            .collect();
        self.clauses.push(format!("({})", placeholders.join(" OR ")));
    }

    fn where_clause(&self) -> String {
        if self.clauses.is_empty() {
            String::new()
        } else {
            format!(" WHERE {}", self.clauses.join(" AND "))
        }
    }
}

/// Builds native queries using the configured naming conventions
#[derive(Debug, Clone)]
pub struct QueryTranslator {
    table: String,
    collection: String,
    endpoint: String,
    status_endpoint: String,
    row_limit: u32,
}

impl Default for QueryTranslator {
    fn default() -> Self {
        Self::from_config(&RouterConfig::default())
    }
}

impl QueryTranslator {
    pub fn from_config(config: &RouterConfig) -> Self {
        Self {
            table: config.inventory_table().to_string(),
            collection: config.inventory_collection().to_string(),
            endpoint: config.inventory_endpoint().to_string(),
            status_endpoint: config.status_endpoint().to_string(),
            row_limit: config.row_limit(),
        }
    }

    /// Build the native query for `intent` against `source`.
    ///
    /// Combinations without a rule are `UnsupportedSourceType`.
    pub fn translate(
        &self,
        intent: QueryIntent,
        filters: &QueryFilters,
        source: &SourceMetadata,
    ) -> Result<NativeQuery, InfrarouteError> {
        match (source.source_type, intent.is_inventory()) {
            (SourceType::Postgres, true) => Ok(self.sql(intent, filters, Placeholder::Numbered)),
            (SourceType::Mysql, true) => Ok(self.sql(intent, filters, Placeholder::Positional)),
            (SourceType::Mongodb, true) => Ok(self.document(intent, filters)),
            (SourceType::RestApi, true) => Ok(self.http(&self.endpoint, filters)),
            (SourceType::RestApi, false) if intent == QueryIntent::SystemStatus => {
                Ok(self.http(&self.status_endpoint, filters))
            }
            (source_type, _) => Err(InfrarouteError::UnsupportedSourceType(format!(
                "no translation for intent '{}' on {} source '{}'",
                intent, source_type, source.name
            ))),
        }
    }

    fn sql(&self, intent: QueryIntent, filters: &QueryFilters, style: Placeholder) -> NativeQuery {
        let mut builder = SqlBuilder::new(style);
        if let Some(env) = filters.environment {
            builder.environment(env.as_str());
        }
        if let Some(role) = filters.role {
            builder.role(role.as_str());
        }

        let statement = if intent == QueryIntent::InventoryCount {
            format!(
                "SELECT COUNT(*) AS count FROM {}{}",
                self.table,
                builder.where_clause()
            )
        } else {
            format!(
                "SELECT * FROM {}{} LIMIT {}",
                self.table,
                builder.where_clause(),
                self.row_limit
            )
        };

        NativeQuery::Sql {
            statement,
            binds: builder.binds,
        }
    }

    fn document(&self, intent: QueryIntent, filters: &QueryFilters) -> NativeQuery {
        let filter = document_filter(filters);
        let operation = if intent == QueryIntent::InventoryCount {
            DocumentOperation::Aggregate {
                pipeline: vec![json!({ "$match": filter }), json!({ "$count": "count" })],
            }
        } else {
            DocumentOperation::Find { filter }
        };
        NativeQuery::Document {
            collection: self.collection.clone(),
            operation,
        }
    }

    fn http(&self, path: &str, filters: &QueryFilters) -> NativeQuery {
        let mut query = Vec::new();
        if let Some(env) = filters.environment {
            query.push(("tags".to_string(), env.as_str().to_string()));
        }
        if let Some(role) = filters.role {
            query.push(("role".to_string(), role.as_str().to_string()));
        }
        NativeQuery::Http {
            path: path.to_string(),
            query,
        }
    }
}

fn or_group(fields: &[&str], value: &str) -> Value {
    let alternatives: Vec<Value> = fields
        .iter()
        .map(|field| {
            let mut condition = serde_json::Map::new();
            condition.insert(field.to_string(), Value::from(value));
            Value::Object(condition)
        })
        .collect();
    json!({ "$or": alternatives })
}

/// `$or` group per filter, combined with `$and` when both are present
fn document_filter(filters: &QueryFilters) -> Value {
    let mut groups = Vec::new();
    if let Some(env) = filters.environment {
        groups.push(or_group(ENVIRONMENT_FIELDS, env.as_str()));
    }
    if let Some(role) = filters.role {
        groups.push(or_group(ROLE_FIELDS, role.as_str()));
    }
    match groups.len() {
        0 => json!({}),
        1 => groups.remove(0),
        _ => json!({ "$and": groups }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraroute_core::{Environment, Role};

    fn source(source_type: SourceType) -> SourceMetadata {
        SourceMetadata::new("src", source_type, "localhost", source_type.default_port())
    }

    fn role_db() -> QueryFilters {
        QueryFilters {
            environment: None,
            role: Some(Role::Db),
        }
    }

    fn both() -> QueryFilters {
        QueryFilters {
            environment: Some(Environment::Prod),
            role: Some(Role::Web),
        }
    }

    #[test]
    fn test_sql_count_with_role() {
        let translator = QueryTranslator::default();
        let query = translator
            .translate(QueryIntent::InventoryCount, &role_db(), &source(SourceType::Postgres))
            .unwrap();
        let NativeQuery::Sql { statement, binds } = query else {
            panic!("expected SQL");
        };
        assert!(statement.starts_with("SELECT COUNT(*)"));
        assert_eq!(
            statement,
            "SELECT COUNT(*) AS count FROM servers WHERE (role = $1 OR service = $2 OR type = $3)"
        );
        assert_eq!(binds, vec!["db", "db", "db"]);
    }

    #[test]
    fn test_sql_listing_mysql_placeholders() {
        let translator = QueryTranslator::default();
        let query = translator
            .translate(QueryIntent::InventoryFilter, &both(), &source(SourceType::Mysql))
            .unwrap();
        let NativeQuery::Sql { statement, binds } = query else {
            panic!("expected SQL");
        };
        assert_eq!(
            statement,
            "SELECT * FROM servers WHERE (environment = ? OR env = ? OR tags LIKE ?) \
             AND (role = ? OR service = ? OR type = ?) LIMIT 1000"
        );
        assert_eq!(binds, vec!["prod", "prod", "%prod%", "web", "web", "web"]);
    }

    #[test]
    fn test_sql_without_filters() {
        let config = RouterConfig {
            inventory_table: Some("hosts".to_string()),
            row_limit: Some(50),
            ..Default::default()
        };
        let query = QueryTranslator::from_config(&config)
            .translate(
                QueryIntent::InventoryList,
                &QueryFilters::default(),
                &source(SourceType::Postgres),
            )
            .unwrap();
        assert_eq!(
            query,
            NativeQuery::Sql {
                statement: "SELECT * FROM hosts LIMIT 50".to_string(),
                binds: vec![],
            }
        );
    }

    #[test]
    fn test_document_count_is_match_then_count() {
        let translator = QueryTranslator::default();
        let query = translator
            .translate(QueryIntent::InventoryCount, &role_db(), &source(SourceType::Mongodb))
            .unwrap();
        let NativeQuery::Document {
            collection,
            operation,
        } = query
        else {
            panic!("expected document query");
        };
        assert_eq!(collection, "servers");
        let DocumentOperation::Aggregate { pipeline } = operation else {
            panic!("expected aggregation, not find");
        };
        assert_eq!(pipeline.len(), 2);
        assert!(pipeline[0].get("$match").is_some());
        assert_eq!(pipeline[1], json!({"$count": "count"}));
        assert_eq!(
            pipeline[0]["$match"],
            json!({"$or": [{"role": "db"}, {"service": "db"}, {"type": "db"}]})
        );
    }

    #[test]
    fn test_document_filter_combines_with_and() {
        let translator = QueryTranslator::default();
        let query = translator
            .translate(QueryIntent::InventoryFilter, &both(), &source(SourceType::Mongodb))
            .unwrap();
        let NativeQuery::Document {
            operation: DocumentOperation::Find { filter },
            ..
        } = query
        else {
            panic!("expected find");
        };
        assert_eq!(
            filter,
            json!({"$and": [
                {"$or": [{"environment": "prod"}, {"env": "prod"}, {"tags": "prod"}]},
                {"$or": [{"role": "web"}, {"service": "web"}, {"type": "web"}]}
            ]})
        );
    }

    #[test]
    fn test_http_inventory_and_status() {
        let translator = QueryTranslator::default();
        let api = source(SourceType::RestApi);

        let query = translator
            .translate(QueryIntent::InventoryFilter, &both(), &api)
            .unwrap();
        assert_eq!(
            query,
            NativeQuery::Http {
                path: "/api/servers".to_string(),
                query: vec![
                    ("tags".to_string(), "prod".to_string()),
                    ("role".to_string(), "web".to_string()),
                ],
            }
        );

        let query = translator
            .translate(QueryIntent::SystemStatus, &QueryFilters::default(), &api)
            .unwrap();
        assert!(matches!(query, NativeQuery::Http { ref path, .. } if path == "/api/status"));
    }

    #[test]
    fn test_unsupported_combinations() {
        let translator = QueryTranslator::default();
        let filters = QueryFilters::default();
        for intent in [
            QueryIntent::SystemStatus,
            QueryIntent::ConfigRead,
            QueryIntent::ConfigEdit,
            QueryIntent::Unknown,
        ] {
            let result = translator.translate(intent, &filters, &source(SourceType::Postgres));
            assert!(matches!(result, Err(InfrarouteError::UnsupportedSourceType(_))));
        }
        let result =
            translator.translate(QueryIntent::ConfigRead, &filters, &source(SourceType::RestApi));
        assert!(matches!(result, Err(InfrarouteError::UnsupportedSourceType(_))));
    }
}
