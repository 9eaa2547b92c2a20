//! Type definitions for Infraroute
//!
//! This crate contains the closed enumerations shared across the Infraroute
//! codebase (source kinds and query intents) and the request/response
//! envelope used by the HTTP surface.

pub mod intent;
pub mod runtime;
pub mod source;

pub use intent::QueryIntent;
pub use source::SourceType;

/// A single result row: column (or field) name to JSON value
pub type Row = std::collections::HashMap<String, serde_json::Value>;
