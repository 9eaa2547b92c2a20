//! JSON payloads to result rows

use infraroute_core::InfrarouteError;
use infraroute_types::Row;
use serde_json::Value;

use super::traits::ConnectorResult;

/// Keys under which APIs commonly wrap their result list
const WRAPPER_KEYS: &[&str] = &["results", "data", "items", "hosts", "servers"];

/// Convert a JSON payload into rows.
///
/// Accepts an array of objects, an object wrapping such an array under a
/// well-known key, or a single object (one row). Scalars inside an array
/// become `{"value": ...}` rows.
pub fn rows_from_json(value: Value) -> Result<ConnectorResult, InfrarouteError> {
    match value {
        Value::Array(items) => Ok(items.into_iter().map(item_to_row).collect()),
        Value::Object(mut map) => {
            for key in WRAPPER_KEYS {
                if matches!(map.get(*key), Some(Value::Array(_))) {
                    if let Some(Value::Array(items)) = map.remove(*key) {
                        return Ok(items.into_iter().map(item_to_row).collect());
                    }
                }
            }
            Ok(vec![map.into_iter().collect()])
        }
        Value::Null => Ok(Vec::new()),
        other => Err(InfrarouteError::QueryFailed(format!(
            "expected a JSON array or object, got: {}",
            other
        ))),
    }
}

fn item_to_row(item: Value) -> Row {
    match item {
        Value::Object(map) => map.into_iter().collect(),
        other => {
            let mut row = Row::new();
            row.insert("value".to_string(), other);
            row
        }
    }
}
