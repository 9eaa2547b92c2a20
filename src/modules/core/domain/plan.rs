//! Routing plans and backend-native query forms

use infraroute_types::QueryIntent;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

use super::source::SourceMetadata;

/// Plan parameters (the extracted filters, keyed by name)
pub type Params = HashMap<String, serde_json::Value>;

/// Document-store operation
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
pub enum DocumentOperation {
    /// Plain `find` with a filter document
    Find { filter: serde_json::Value },
    /// Aggregation pipeline (used for counts)
    Aggregate { pipeline: Vec<serde_json::Value> },
}

/// A query in the form the selected backend understands
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum NativeQuery {
    /// Parameterized SQL with positional string binds
    Sql { statement: String, binds: Vec<String> },
    /// Document-store command against one collection
    Document {
        collection: String,
        #[serde(flatten)]
        operation: DocumentOperation,
    },
    /// HTTP GET of `path` with query parameters
    Http {
        path: String,
        query: Vec<(String, String)>,
    },
    /// Live SSH scan handed to the external collaborator
    SshScan(SshScanRequest),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanKind {
    #[serde(rename = "ssh_scan")]
    SshScan,
}

/// Request handed to the SSH-scan collaborator:
/// `{"type": "ssh_scan", "intent": ..., "query": ...}`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SshScanRequest {
    #[serde(rename = "type")]
    pub kind: ScanKind,
    pub intent: QueryIntent,
    /// Original query text
    pub query: String,
}

impl SshScanRequest {
    pub fn new(intent: QueryIntent, query: impl Into<String>) -> Self {
        Self {
            kind: ScanKind::SshScan,
            intent,
            query: query.into(),
        }
    }
}

/// Fallback attached to a plan. It has no fallback of its own, so fallback
/// chains are always a single level deep.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FallbackPlan {
    pub intent: QueryIntent,
    pub request: SshScanRequest,
}

impl FallbackPlan {
    pub fn ssh_scan(intent: QueryIntent, query: impl Into<String>) -> Self {
        Self {
            intent,
            request: SshScanRequest::new(intent, query),
        }
    }
}

/// Result of routing a query
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueryPlan {
    /// Selected source; `None` means the plan itself is an SSH scan
    pub source: Option<SourceMetadata>,
    pub intent: QueryIntent,
    pub query: NativeQuery,
    #[serde(default)]
    pub params: Params,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback: Option<FallbackPlan>,
}

impl QueryPlan {
    /// Plan that goes straight to the SSH scan (no source selected)
    pub fn ssh_scan(intent: QueryIntent, query: impl Into<String>, params: Params) -> Self {
        Self {
            source: None,
            intent,
            query: NativeQuery::SshScan(SshScanRequest::new(intent, query)),
            params,
            fallback: None,
        }
    }

    /// Plan executed against `source`, with an SSH scan ready as fallback
    pub fn for_source(
        source: SourceMetadata,
        intent: QueryIntent,
        query: NativeQuery,
        params: Params,
        original: impl Into<String>,
    ) -> Self {
        Self {
            source: Some(source),
            intent,
            query,
            params,
            fallback: Some(FallbackPlan::ssh_scan(intent, original)),
        }
    }

    /// True when no source was selected
    pub fn is_fallback(&self) -> bool {
        self.source.is_none()
    }

    pub fn source_name(&self) -> Option<&str> {
        self.source.as_ref().map(|s| s.name.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraroute_types::SourceType;

    #[test]
    fn test_ssh_scan_request_shape() {
        let request = SshScanRequest::new(QueryIntent::InventoryList, "list web servers");
        let value = serde_json::to_value(&request).unwrap();
        assert_eq!(
            value,
            serde_json::json!({
                "type": "ssh_scan",
                "intent": "inventory-list",
                "query": "list web servers"
            })
        );
    }

    #[test]
    fn test_ssh_scan_plan_has_no_source_or_fallback() {
        let plan = QueryPlan::ssh_scan(QueryIntent::ConfigRead, "show nginx config", Params::new());
        assert!(plan.is_fallback());
        assert!(plan.fallback.is_none());
        assert!(matches!(plan.query, NativeQuery::SshScan(_)));
    }

    #[test]
    fn test_source_plan_carries_fallback() {
        let source = SourceMetadata::new("pg", SourceType::Postgres, "localhost", 5432);
        let plan = QueryPlan::for_source(
            source,
            QueryIntent::InventoryList,
            NativeQuery::Sql {
                statement: "SELECT * FROM servers".to_string(),
                binds: vec![],
            },
            Params::new(),
            "list servers",
        );
        assert_eq!(plan.source_name(), Some("pg"));
        let fallback = plan.fallback.unwrap();
        assert_eq!(fallback.request.query, "list servers");
        assert_eq!(fallback.request.intent, QueryIntent::InventoryList);
    }

    #[test]
    fn test_document_query_serde() {
        let query = NativeQuery::Document {
            collection: "servers".to_string(),
            operation: DocumentOperation::Aggregate {
                pipeline: vec![serde_json::json!({"$count": "count"})],
            },
        };
        let value = serde_json::to_value(&query).unwrap();
        assert_eq!(value["kind"], "document");
        assert_eq!(value["operation"], "aggregate");
        let parsed: NativeQuery = serde_json::from_value(value).unwrap();
        assert_eq!(parsed, query);
    }
}
