//! What inventory-shaped data looks like across backends

use std::collections::BTreeSet;

/// Table and collection names that hold host inventory
pub const INVENTORY_NAMES: &[&str] = &[
    "servers",
    "hosts",
    "inventory",
    "machines",
    "nodes",
    "assets",
    "instances",
    "cmdb",
];

/// Columns whose presence marks a table as host inventory
pub const INVENTORY_COLUMNS: &[&str] = &["hostname", "ip_address", "fqdn"];

/// REST endpoints probed for enumerable inventory
pub const INVENTORY_ENDPOINTS: &[&str] = &[
    "/api/servers",
    "/api/hosts",
    "/api/inventory",
    "/api/v1/servers",
    "/api/v1/hosts",
];

/// True when any `_`-separated token of `name` is an inventory name,
/// e.g. `servers`, `prod_hosts`, `host_inventory`
pub fn is_inventory_name(name: &str) -> bool {
    let lower = name.to_lowercase();
    lower
        .split(|c: char| c == '_' || c == '-' || c == '.')
        .any(|token| INVENTORY_NAMES.contains(&token))
}

/// Inventory-shaped tables from `(table, column)` pairs, sorted and unique
pub fn inventory_tables<I>(columns: I) -> Vec<String>
where
    I: IntoIterator<Item = (String, String)>,
{
    let mut tables = BTreeSet::new();
    for (table, column) in columns {
        let column = column.to_lowercase();
        if is_inventory_name(&table) || INVENTORY_COLUMNS.contains(&column.as_str()) {
            tables.insert(table);
        }
    }
    tables.into_iter().collect()
}
