//! HTTP request handlers for the Infraroute server
//!
//! This module contains handlers for query routing, planning, source
//! listing and discovery.

mod query;
mod sources;

pub use query::QueryHandler;
pub use sources::{SourceFilter, SourcesHandler};

use axum::http::StatusCode;
use infraroute_core::InfrarouteError;

/// HTTP status for an error, per its taxonomy
pub(crate) fn status_for(e: &InfrarouteError) -> StatusCode {
    StatusCode::from_u16(e.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
}
