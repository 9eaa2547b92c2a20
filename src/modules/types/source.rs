//! Source type definitions

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Kinds of queryable backend a source can be
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SourceType {
    /// PostgreSQL database
    Postgres,
    /// MySQL database
    Mysql,
    /// MongoDB document store
    Mongodb,
    /// REST / CMDB API
    RestApi,
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceType::Postgres => write!(f, "postgres"),
            SourceType::Mysql => write!(f, "mysql"),
            SourceType::Mongodb => write!(f, "mongodb"),
            SourceType::RestApi => write!(f, "rest-api"),
        }
    }
}

impl FromStr for SourceType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "postgres" | "postgresql" => Ok(SourceType::Postgres),
            "mysql" => Ok(SourceType::Mysql),
            "mongodb" | "mongo" => Ok(SourceType::Mongodb),
            "rest-api" | "rest_api" | "rest" | "api" => Ok(SourceType::RestApi),
            _ => Err(format!("Unknown source type: {}", s)),
        }
    }
}

impl SourceType {
    /// Returns all supported source types, in discovery order
    pub fn all() -> &'static [SourceType] {
        &[
            SourceType::Postgres,
            SourceType::Mysql,
            SourceType::Mongodb,
            SourceType::RestApi,
        ]
    }

    /// Returns true if this source is queried directly (SQL or document store)
    pub fn is_database(&self) -> bool {
        !self.is_api()
    }

    /// Returns true if this source is reached through an HTTP API
    pub fn is_api(&self) -> bool {
        matches!(self, SourceType::RestApi)
    }

    /// Well-known port the backend listens on
    pub fn default_port(&self) -> u16 {
        match self {
            SourceType::Postgres => 5432,
            SourceType::Mysql => 3306,
            SourceType::Mongodb => 27017,
            SourceType::RestApi => 8080,
        }
    }

    /// Short key used as a source name prefix and credentials lookup key
    pub fn key(&self) -> &'static str {
        match self {
            SourceType::Postgres => "postgres",
            SourceType::Mysql => "mysql",
            SourceType::Mongodb => "mongodb",
            SourceType::RestApi => "api",
        }
    }

    /// Capability tag added when the secondary probe finds inventory data
    pub fn inventory_capability(&self) -> &'static str {
        match self {
            SourceType::Postgres | SourceType::Mysql => "has_inventory_tables",
            SourceType::Mongodb => "has_inventory_collections",
            SourceType::RestApi => "has_inventory_endpoints",
        }
    }

    /// Confidence increment granted when inventory data is found.
    ///
    /// Enumerable API endpoints are a stronger signal than table names.
    pub fn confidence_boost(&self) -> f64 {
        match self {
            SourceType::RestApi => 0.2,
            _ => 0.1,
        }
    }
}
