//! Runtime type definitions for request/response handling

use serde::{Deserialize, Serialize};

use crate::{QueryIntent, Row};

/// Routing request: a natural-language infrastructure query
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteRequest {
    /// Operator query text, e.g. "list production web servers"
    pub query: String,
}

/// Routing response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RouteResponse {
    /// Whether the query was answered
    pub success: bool,
    /// Error message if the query failed
    #[serde(default)]
    pub error: String,
    /// Classified intent
    #[serde(default)]
    pub intent: QueryIntent,
    /// Name of the source that answered, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
    /// Whether the SSH-scan fallback produced the rows
    #[serde(default)]
    pub used_fallback: bool,
    /// Result rows
    #[serde(default)]
    pub results: Vec<Row>,
}

impl RouteResponse {
    /// Create a successful response
    pub fn success(
        intent: QueryIntent,
        source: Option<String>,
        used_fallback: bool,
        results: Vec<Row>,
    ) -> Self {
        Self {
            success: true,
            error: String::new(),
            intent,
            source,
            used_fallback,
            results,
        }
    }

    /// Create an error response
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            error: message.into(),
            intent: QueryIntent::Unknown,
            source: None,
            used_fallback: false,
            results: Vec::new(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    #[test]
    fn test_route_response_success() {
        let results = vec![{
            let mut map = HashMap::new();
            map.insert("hostname".to_string(), serde_json::json!("web-01"));
            map
        }];

        let response = RouteResponse::success(
            QueryIntent::InventoryList,
            Some("postgres_localhost".to_string()),
            false,
            results.clone(),
        );
        assert!(response.success);
        assert!(response.error.is_empty());
        assert_eq!(response.results, results);
    }

    #[test]
    fn test_route_response_error() {
        let response = RouteResponse::error("Something went wrong");
        assert!(!response.success);
        assert_eq!(response.error, "Something went wrong");
        assert!(response.results.is_empty());
    }

    #[test]
    fn test_route_response_omits_missing_source() {
        let response = RouteResponse::success(QueryIntent::ConfigRead, None, true, vec![]);
        let json = serde_json::to_string(&response).unwrap();
        assert!(!json.contains("\"source\""));
        assert!(json.contains("\"intent\":\"config-read\""));
        assert!(json.contains("\"used_fallback\":true"));
    }
}
