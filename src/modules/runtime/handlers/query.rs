//! Query routing handlers

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use infraroute_core::InfrarouteError;
use infraroute_types::runtime::{RouteRequest, RouteResponse};
use tracing::{error, info, warn, Instrument};

use super::status_for;
use crate::state::AppState;

/// Handler for routed query requests
pub struct QueryHandler;

impl QueryHandler {
    /// Handle POST /query
    pub async fn execute(
        State(state): State<AppState>,
        Json(request): Json<RouteRequest>,
    ) -> impl IntoResponse {
        let span = tracing::info_span!("query", request_id = %AppState::request_id());
        async move {
            if let Err(e) = validate(&request) {
                return (status_for(&e), Json(RouteResponse::error(e.sanitized_message())));
            }
            info!("Routing query: {}", request.query);

            match state.router.ask(&request.query).await {
                Ok(result) => {
                    info!(
                        source = result.plan.source_name().unwrap_or("ssh_scan"),
                        used_fallback = result.used_fallback,
                        "Query answered, {} rows returned",
                        result.rows.len()
                    );
                    let source = result.plan.source_name().map(str::to_string);
                    (
                        StatusCode::OK,
                        Json(RouteResponse::success(
                            result.plan.intent,
                            source,
                            result.used_fallback,
                            result.rows,
                        )),
                    )
                }
                Err(e) => {
                    if e.is_error() {
                        error!("Query failed: {}", e);
                    } else {
                        warn!("Query failed: {}", e);
                    }
                    (status_for(&e), Json(RouteResponse::error(e.sanitized_message())))
                }
            }
        }
        .instrument(span)
        .await
    }

    /// Handle POST /plan: route without executing
    pub async fn plan(
        State(state): State<AppState>,
        Json(request): Json<RouteRequest>,
    ) -> impl IntoResponse {
        if let Err(e) = validate(&request) {
            return (status_for(&e), Json(serde_json::json!({ "error": e.sanitized_message() })));
        }
        match state.router.route(&request.query).await {
            Ok(plan) => match serde_json::to_value(&plan) {
                Ok(value) => (StatusCode::OK, Json(value)),
                Err(e) => {
                    let e = InfrarouteError::from(e);
                    (status_for(&e), Json(serde_json::json!({ "error": e.sanitized_message() })))
                }
            },
            Err(e) => {
                warn!("Planning failed: {}", e);
                (status_for(&e), Json(serde_json::json!({ "error": e.sanitized_message() })))
            }
        }
    }
}

fn validate(request: &RouteRequest) -> Result<(), InfrarouteError> {
    if request.query.trim().is_empty() {
        return Err(InfrarouteError::Validation("query must not be empty".to_string()));
    }
    Ok(())
}
