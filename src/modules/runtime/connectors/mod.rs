//! Backend connectors for Infraroute
//!
//! This module provides async connectors for PostgreSQL, MySQL, MongoDB
//! and REST/CMDB APIs, plus the factory table that detects and builds them.

mod factory;
mod inventory;
mod json;
mod mongodb;
mod mysql;
mod postgres;
mod probe;
mod rest;
mod traits;

pub use factory::{
    candidate, names_by_type, ConnectorFactory, NativeConnectorFactory, API_BASE_CONFIDENCE,
    DATABASE_BASE_CONFIDENCE,
};
pub use inventory::{is_inventory_name, INVENTORY_ENDPOINTS};
pub use json::rows_from_json;
pub use mongodb::MongoDbConnector;
pub use mysql::MySqlConnector;
pub use postgres::PostgresConnector;
pub use probe::tcp_reachable;
pub use rest::RestConnector;
pub use traits::{ConnectionSettings, Connector, ConnectorResult};
