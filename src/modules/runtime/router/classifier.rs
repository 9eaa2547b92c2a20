//! Keyword/pattern intent classification

use infraroute_core::QueryFilters;
use infraroute_types::QueryIntent;
use once_cell::sync::Lazy;
use regex::Regex;

/// Inventory nouns and listing phrases
static INVENTORY_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(servers?|hosts?|machines?|nodes?|instances?|vms?|boxes)\b",
        r"\binventory\b",
        // Plural role nouns name a fleet, not a service's configuration
        r"\b(list|show|find|get|which)\b.*\b(webservers|dbs|databases|caches)\b",
    ])
});

static COUNT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r"\bhow many\b", r"\bcount\b", r"\bnumber of\b", r"\btotal\b"])
});

static FILTER_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r"\b(where|with|in|running|tagged|matching)\b"])
});

static STATUS_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\bstatus\b",
        r"\b(health|healthy|uptime|up|down|alive|load|cpu|memory|disk|usage)\b",
        r"\bis\b.*\b(running|reachable|responding)\b",
    ])
});

static CONFIG_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[
        r"\b(config|configs|configuration|settings?)\b",
        r"\.(conf|cfg|ini|ya?ml|toml)\b",
        r"\b(nginx|apache|sshd|haproxy|systemd)\b",
    ])
});

static EDIT_PATTERNS: Lazy<Vec<Regex>> = Lazy::new(|| {
    compile(&[r"\b(edit|change|modify|update|set|replace|add|remove|write)\b"])
});

fn compile(patterns: &[&str]) -> Vec<Regex> {
    patterns
        .iter()
        .map(|p| Regex::new(p).expect("Invalid intent pattern"))
        .collect()
}

fn any_match(patterns: &[Regex], text: &str) -> bool {
    patterns.iter().any(|p| p.is_match(text))
}

/// Maps query text to exactly one intent.
///
/// Rule groups are checked in a fixed order: inventory, then status, then
/// config. The first matching group wins; nothing matching is `Unknown`.
#[derive(Debug, Clone, Copy, Default)]
pub struct IntentClassifier;

impl IntentClassifier {
    pub fn new() -> Self {
        Self
    }

    /// Classify `text`. `filters` are the filters extracted from the same
    /// text; any filter refines a listing into a filtered listing.
    pub fn classify(&self, text: &str, filters: &QueryFilters) -> QueryIntent {
        let text = text.to_lowercase();

        if any_match(&INVENTORY_PATTERNS, &text) {
            if any_match(&COUNT_PATTERNS, &text) {
                return QueryIntent::InventoryCount;
            }
            if !filters.is_empty() || any_match(&FILTER_PATTERNS, &text) {
                return QueryIntent::InventoryFilter;
            }
            return QueryIntent::InventoryList;
        }

        if any_match(&STATUS_PATTERNS, &text) {
            return QueryIntent::SystemStatus;
        }

        if any_match(&CONFIG_PATTERNS, &text) {
            if any_match(&EDIT_PATTERNS, &text) {
                return QueryIntent::ConfigEdit;
            }
            return QueryIntent::ConfigRead;
        }

        QueryIntent::Unknown
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::router::filters::extract_filters;

    fn classify(text: &str) -> QueryIntent {
        IntentClassifier::new().classify(text, &extract_filters(text))
    }

    #[test]
    fn test_inventory_family() {
        assert_eq!(classify("list all servers"), QueryIntent::InventoryList);
        assert_eq!(classify("Show me the inventory"), QueryIntent::InventoryList);
        assert_eq!(classify("how many hosts do we have"), QueryIntent::InventoryCount);
        assert_eq!(classify("count prod servers"), QueryIntent::InventoryCount);
        assert_eq!(classify("list production web servers"), QueryIntent::InventoryFilter);
        assert_eq!(classify("servers running nginx"), QueryIntent::InventoryFilter);
    }

    #[test]
    fn test_status_and_config() {
        assert_eq!(classify("what is the uptime"), QueryIntent::SystemStatus);
        assert_eq!(classify("cpu usage right now"), QueryIntent::SystemStatus);
        assert_eq!(classify("show nginx config"), QueryIntent::ConfigRead);
        assert_eq!(classify("cat /etc/app.yaml"), QueryIntent::ConfigRead);
        assert_eq!(classify("update the sshd configuration"), QueryIntent::ConfigEdit);
    }

    #[test]
    fn test_service_config_is_not_inventory() {
        assert_eq!(classify("show the mysql configuration"), QueryIntent::ConfigRead);
        assert_eq!(classify("get postgres settings"), QueryIntent::ConfigRead);
        assert_eq!(classify("change the web config"), QueryIntent::ConfigEdit);
        assert_eq!(classify("list prod databases"), QueryIntent::InventoryFilter);
    }

    #[test]
    fn test_inventory_beats_status_beats_config() {
        // inventory noun + status keyword
        assert_eq!(classify("status of web servers"), QueryIntent::InventoryFilter);
        assert_eq!(classify("hosts that are down"), QueryIntent::InventoryList);
        // status keyword + config keyword
        assert_eq!(classify("health of nginx config"), QueryIntent::SystemStatus);
    }

    #[test]
    fn test_unknown_is_default() {
        assert_eq!(classify(""), QueryIntent::Unknown);
        assert_eq!(classify("tell me a joke"), QueryIntent::Unknown);
    }

    #[test]
    fn test_classification_is_deterministic() {
        let text = "how many prod db servers are down";
        let first = classify(text);
        for _ in 0..10 {
            assert_eq!(classify(text), first);
        }
        assert_eq!(first, QueryIntent::InventoryCount);
    }
}
