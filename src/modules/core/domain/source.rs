//! Discovered source metadata

use infraroute_types::SourceType;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Certainty that a source is a genuine, inventory-relevant backend.
///
/// Always within [0, 1]. Boosts saturate at 1.0 and never lower the score.
#[derive(Debug, Clone, Copy, PartialEq, PartialOrd, Serialize, Deserialize)]
#[serde(from = "f64", into = "f64")]
pub struct Confidence(f64);

impl Confidence {
    pub const MIN: Confidence = Confidence(0.0);
    pub const MAX: Confidence = Confidence(1.0);

    /// Create a confidence score, clamping into [0, 1]. NaN becomes 0.
    pub fn new(value: f64) -> Self {
        if value.is_nan() {
            return Self::MIN;
        }
        Self(value.clamp(0.0, 1.0))
    }

    pub fn value(&self) -> f64 {
        self.0
    }

    /// Raise the score by `delta`, capped at 1.0. Negative deltas are ignored.
    pub fn boost(&mut self, delta: f64) {
        if delta.is_nan() || delta <= 0.0 {
            return;
        }
        self.0 = (self.0 + delta).min(1.0);
    }

    /// Total ordering for ranking (scores are never NaN)
    pub fn total_cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.0.total_cmp(&other.0)
    }
}

impl From<f64> for Confidence {
    fn from(value: f64) -> Self {
        Self::new(value)
    }
}

impl From<Confidence> for f64 {
    fn from(value: Confidence) -> Self {
        value.0
    }
}

impl Default for Confidence {
    fn default() -> Self {
        Self::MIN
    }
}

impl fmt::Display for Confidence {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:.2}", self.0)
    }
}

/// Identity and classification of one discovered or registered backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SourceMetadata {
    /// Unique key, e.g. `postgres_localhost`
    pub name: String,

    /// Backend kind
    #[serde(rename = "type")]
    pub source_type: SourceType,

    pub host: String,

    pub port: u16,

    /// Schema or collection namespace, when applicable
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub database: Option<String>,

    /// URL path prefix for REST sources
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_path: Option<String>,

    /// Use TLS when talking to the source
    #[serde(default)]
    pub tls: bool,

    /// Free-form tags (`inventory`, `cmdb`, `has_inventory_tables`, ...).
    /// Insertion ordered, no duplicates.
    #[serde(default)]
    pub capabilities: Vec<String>,

    #[serde(default)]
    pub confidence: Confidence,

    /// True once a live connection test has succeeded
    #[serde(default)]
    pub detected: bool,
}

impl SourceMetadata {
    /// Create metadata with no capabilities and zero confidence
    pub fn new(
        name: impl Into<String>,
        source_type: SourceType,
        host: impl Into<String>,
        port: u16,
    ) -> Self {
        Self {
            name: name.into(),
            source_type,
            host: host.into(),
            port,
            database: None,
            base_path: None,
            tls: false,
            capabilities: Vec::new(),
            confidence: Confidence::MIN,
            detected: false,
        }
    }

    pub fn with_database(mut self, database: impl Into<String>) -> Self {
        self.database = Some(database.into());
        self
    }

    pub fn with_base_path(mut self, base_path: impl Into<String>) -> Self {
        self.base_path = Some(base_path.into());
        self
    }

    pub fn with_tls(mut self, tls: bool) -> Self {
        self.tls = tls;
        self
    }

    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = Confidence::new(confidence);
        self
    }

    pub fn with_capability(mut self, capability: impl Into<String>) -> Self {
        self.add_capability(capability);
        self
    }

    pub fn with_detected(mut self, detected: bool) -> Self {
        self.detected = detected;
        self
    }

    /// Append a capability tag; existing tags are kept as-is
    pub fn add_capability(&mut self, capability: impl Into<String>) {
        let capability = capability.into();
        if !self.capabilities.contains(&capability) {
            self.capabilities.push(capability);
        }
    }

    pub fn has_capability(&self, capability: &str) -> bool {
        self.capabilities.iter().any(|c| c == capability)
    }

    /// True when the secondary probe found inventory-shaped data
    pub fn has_inventory_evidence(&self) -> bool {
        self.has_capability(self.source_type.inventory_capability())
    }

    /// Record inventory evidence: tag the source and boost its confidence
    pub fn mark_inventory_evidence(&mut self) {
        self.add_capability(self.source_type.inventory_capability());
        self.confidence.boost(self.source_type.confidence_boost());
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_confidence_clamps() {
        assert_eq!(Confidence::new(1.7).value(), 1.0);
        assert_eq!(Confidence::new(-0.3).value(), 0.0);
        assert_eq!(Confidence::new(f64::NAN).value(), 0.0);
    }

    #[test]
    fn test_confidence_boost_saturates() {
        let mut c = Confidence::new(0.7);
        for _ in 0..10 {
            let before = c;
            c.boost(0.2);
            assert!(c >= before);
            assert!(c.value() <= 1.0);
        }
        assert_eq!(c.value(), 1.0);
    }

    #[test]
    fn test_confidence_ignores_negative_boost() {
        let mut c = Confidence::new(0.5);
        c.boost(-0.4);
        assert_eq!(c.value(), 0.5);
    }

    #[test]
    fn test_capabilities_are_deduplicated() {
        let source = SourceMetadata::new("pg", SourceType::Postgres, "localhost", 5432)
            .with_capability("inventory")
            .with_capability("database")
            .with_capability("inventory");
        assert_eq!(source.capabilities, vec!["inventory", "database"]);
    }

    #[test]
    fn test_mark_inventory_evidence() {
        let mut pg = SourceMetadata::new("pg", SourceType::Postgres, "localhost", 5432)
            .with_confidence(0.7);
        pg.mark_inventory_evidence();
        assert!(pg.has_capability("has_inventory_tables"));
        assert!((pg.confidence.value() - 0.8).abs() < 1e-9);

        let mut api = SourceMetadata::new("api", SourceType::RestApi, "localhost", 8080)
            .with_confidence(0.9);
        api.mark_inventory_evidence();
        assert!(api.has_inventory_evidence());
        assert_eq!(api.confidence.value(), 1.0);
    }

    #[test]
    fn test_source_metadata_serde() {
        let source = SourceMetadata::new("mongodb_localhost", SourceType::Mongodb, "localhost", 27017)
            .with_database("inventory")
            .with_confidence(0.8);
        let json = serde_json::to_string(&source).unwrap();
        assert!(json.contains("\"type\":\"mongodb\""));
        assert!(json.contains("\"confidence\":0.8"));

        let parsed: SourceMetadata = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed, source);
    }

    #[test]
    fn test_deserialized_confidence_is_clamped() {
        let json = r#"{"name":"x","type":"postgres","host":"h","port":1,"confidence":3.5}"#;
        let parsed: SourceMetadata = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.confidence.value(), 1.0);
    }
}
