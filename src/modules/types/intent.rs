//! Query intent definitions

use serde::{Deserialize, Serialize};
use std::fmt;

/// Classified purpose of an operator query.
///
/// Exactly one intent is assigned per query; `Unknown` is the default.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum QueryIntent {
    /// List hosts without filters
    InventoryList,
    /// List hosts narrowed by environment or role
    InventoryFilter,
    /// Count hosts
    InventoryCount,
    /// Live status of hosts (load, health, uptime)
    SystemStatus,
    /// Read a configuration file on hosts
    ConfigRead,
    /// Change a configuration file on hosts
    ConfigEdit,
    /// Nothing matched
    #[default]
    Unknown,
}

impl fmt::Display for QueryIntent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            QueryIntent::InventoryList => "inventory-list",
            QueryIntent::InventoryFilter => "inventory-filter",
            QueryIntent::InventoryCount => "inventory-count",
            QueryIntent::SystemStatus => "system-status",
            QueryIntent::ConfigRead => "config-read",
            QueryIntent::ConfigEdit => "config-edit",
            QueryIntent::Unknown => "unknown",
        };
        write!(f, "{}", name)
    }
}

impl QueryIntent {
    /// Returns true for the inventory family (list, filter, count)
    pub fn is_inventory(&self) -> bool {
        matches!(
            self,
            QueryIntent::InventoryList | QueryIntent::InventoryFilter | QueryIntent::InventoryCount
        )
    }

    /// Returns true for config read/edit
    pub fn is_config(&self) -> bool {
        matches!(self, QueryIntent::ConfigRead | QueryIntent::ConfigEdit)
    }
}
