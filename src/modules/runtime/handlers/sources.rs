//! Source listing and discovery handlers

use axum::{
    extract::{Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use infraroute_core::{InfrarouteError, SourceMetadata};
use infraroute_types::SourceType;
use serde::Deserialize;
use tracing::{info, warn};

use super::status_for;
use crate::state::AppState;

/// Optional filters for GET /sources
#[derive(Debug, Default, Deserialize)]
pub struct SourceFilter {
    #[serde(rename = "type")]
    pub source_type: Option<String>,
    pub capability: Option<String>,
}

pub struct SourcesHandler;

impl SourcesHandler {
    /// Handle GET /sources
    pub async fn list(
        State(state): State<AppState>,
        Query(filter): Query<SourceFilter>,
    ) -> impl IntoResponse {
        match filtered_sources(&state, &filter).await {
            Ok(sources) => (StatusCode::OK, Json(serde_json::json!(sources))),
            Err(e) => (status_for(&e), Json(serde_json::json!({ "error": e.sanitized_message() }))),
        }
    }

    /// Handle POST /discover
    pub async fn discover(State(state): State<AppState>) -> impl IntoResponse {
        match state.router.discover().await {
            Ok(sources) => {
                info!("Discovery via HTTP found {} source(s)", sources.len());
                (StatusCode::OK, Json(serde_json::json!(sources)))
            }
            Err(e) => {
                warn!("Discovery failed: {}", e);
                (status_for(&e), Json(serde_json::json!({ "error": e.sanitized_message() })))
            }
        }
    }
}

async fn filtered_sources(
    state: &AppState,
    filter: &SourceFilter,
) -> Result<Vec<SourceMetadata>, InfrarouteError> {
    let registry = state.router.registry();
    let mut sources = match &filter.source_type {
        Some(name) => {
            let source_type: SourceType = name.parse().map_err(InfrarouteError::Validation)?;
            registry.get_sources_by_type(source_type).await
        }
        None => registry.list_sources().await,
    };
    if let Some(capability) = &filter.capability {
        sources.retain(|s| s.has_capability(capability));
    }
    Ok(sources)
}
