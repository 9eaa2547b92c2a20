//! Configuration validation

use infraroute_core::{
    Config, InfrarouteError, TimeoutConfig, MAX_CONNECT_TIMEOUT_SECS, MAX_PROBE_TIMEOUT_SECS,
    MAX_QUERY_TIMEOUT_SECS, MAX_REGISTRY_TTL_HOURS,
};
use once_cell::sync::Lazy;
use regex::Regex;
use std::collections::HashSet;

/// Valid source and environment names: lower-kebab-case or lower_snake_case,
/// dots allowed for host-derived names
static NAME_PATTERN: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[a-z][a-z0-9]*(?:[-_.][a-z0-9]+)*$").unwrap()
});

/// Table and collection names are interpolated into native queries
static IDENTIFIER_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*(?:\.[A-Za-z_][A-Za-z0-9_]*)?$").unwrap());

/// Configuration validator
pub struct ConfigValidator {
    /// Whether to validate names strictly
    strict_names: bool,
}

impl ConfigValidator {
    /// Create a new validator with default settings
    pub fn new() -> Self {
        Self { strict_names: true }
    }

    /// Create a validator with lenient name checking
    pub fn lenient() -> Self {
        Self {
            strict_names: false,
        }
    }

    /// Validate the entire configuration
    pub fn validate(&self, config: &Config) -> Result<(), InfrarouteError> {
        self.validate_name("environment", &config.environment)?;
        self.validate_registry(config)?;
        self.validate_timeouts(&config.discovery.timeouts)?;
        self.validate_discovery(config)?;
        self.validate_router(config)?;
        self.validate_sources(config)?;
        Ok(())
    }

    fn validate_name(&self, what: &str, name: &str) -> Result<(), InfrarouteError> {
        if name.is_empty() {
            return Err(InfrarouteError::Validation(format!("{} name cannot be empty", what)));
        }

        if self.strict_names && !NAME_PATTERN.is_match(name) {
            return Err(InfrarouteError::Validation(format!(
                "Invalid {} name '{}': must be lower-kebab-case or lower_snake_case",
                what, name
            )));
        }

        Ok(())
    }

    fn validate_registry(&self, config: &Config) -> Result<(), InfrarouteError> {
        match config.registry.ttl_hours {
            Some(0) => {
                return Err(InfrarouteError::Validation(
                    "registry.ttl_hours must be greater than zero".to_string(),
                ))
            }
            Some(hours) if hours > MAX_REGISTRY_TTL_HOURS => {
                return Err(InfrarouteError::Validation(format!(
                    "registry.ttl_hours = {} exceeds the maximum of {}",
                    hours, MAX_REGISTRY_TTL_HOURS
                )))
            }
            _ => {}
        }
        if let Some(path) = &config.registry.path {
            if path.trim().is_empty() {
                return Err(InfrarouteError::Validation(
                    "registry.path cannot be empty".to_string(),
                ));
            }
        }
        Ok(())
    }

    /// Timeouts must be non-zero and within the per-call ceilings
    fn validate_timeouts(&self, timeouts: &TimeoutConfig) -> Result<(), InfrarouteError> {
        let checks = [
            ("probe_ms", timeouts.probe_ms, MAX_PROBE_TIMEOUT_SECS * 1000),
            ("connect_secs", timeouts.connect_secs, MAX_CONNECT_TIMEOUT_SECS),
            ("query_secs", timeouts.query_secs, MAX_QUERY_TIMEOUT_SECS),
        ];

        for (field, value, ceiling) in checks {
            match value {
                Some(0) => {
                    return Err(InfrarouteError::Validation(format!(
                        "discovery.timeouts.{} must be greater than zero",
                        field
                    )))
                }
                Some(v) if v > ceiling => {
                    return Err(InfrarouteError::Validation(format!(
                        "discovery.timeouts.{} = {} exceeds the maximum of {}",
                        field, v, ceiling
                    )))
                }
                _ => {}
            }
        }

        Ok(())
    }

    fn validate_discovery(&self, config: &Config) -> Result<(), InfrarouteError> {
        if config.discovery.hosts.iter().any(|h| h.trim().is_empty()) {
            return Err(InfrarouteError::Validation(
                "discovery.hosts cannot contain empty entries".to_string(),
            ));
        }
        if config.discovery.api_ports.contains(&0) {
            return Err(InfrarouteError::Validation(
                "discovery.api_ports cannot contain port 0".to_string(),
            ));
        }
        if config.discovery.max_concurrent_probes == Some(0) {
            return Err(InfrarouteError::Validation(
                "discovery.max_concurrent_probes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_router(&self, config: &Config) -> Result<(), InfrarouteError> {
        let router = &config.router;
        for (field, value) in [
            ("inventory_table", router.inventory_table()),
            ("inventory_collection", router.inventory_collection()),
        ] {
            if !IDENTIFIER_PATTERN.is_match(value) {
                return Err(InfrarouteError::Validation(format!(
                    "router.{} '{}' is not a valid identifier",
                    field, value
                )));
            }
        }

        for (field, value) in [
            ("inventory_endpoint", router.inventory_endpoint()),
            ("status_endpoint", router.status_endpoint()),
        ] {
            if !value.starts_with('/') {
                return Err(InfrarouteError::Validation(format!(
                    "router.{} must start with '/'",
                    field
                )));
            }
        }

        if router.row_limit == Some(0) {
            return Err(InfrarouteError::Validation(
                "router.row_limit must be greater than zero".to_string(),
            ));
        }
        if router.fallback_command.first().is_some_and(|p| p.trim().is_empty()) {
            return Err(InfrarouteError::Validation(
                "router.fallback_command must start with a program".to_string(),
            ));
        }
        Ok(())
    }

    fn validate_sources(&self, config: &Config) -> Result<(), InfrarouteError> {
        let mut names = HashSet::new();

        for source in &config.sources {
            self.validate_name("source", &source.name)?;

            if !names.insert(source.name.as_str()) {
                return Err(InfrarouteError::Validation(format!(
                    "Duplicate source name: '{}'",
                    source.name
                )));
            }

            if source.host.trim().is_empty() {
                return Err(InfrarouteError::Validation(format!(
                    "Source '{}' has an empty host",
                    source.name
                )));
            }

            if source.port == 0 {
                return Err(InfrarouteError::Validation(format!(
                    "Source '{}' has an invalid port 0",
                    source.name
                )));
            }

            if let Some(base_path) = &source.base_path {
                if !source.source_type.is_api() {
                    return Err(InfrarouteError::Validation(format!(
                        "Source '{}': base_path only applies to rest-api sources",
                        source.name
                    )));
                }
                if !base_path.starts_with('/') {
                    return Err(InfrarouteError::Validation(format!(
                        "Source '{}': base_path must start with '/'",
                        source.name
                    )));
                }
            }
        }

        Ok(())
    }
}

impl Default for ConfigValidator {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use infraroute_core::SourceMetadata;
    use infraroute_types::SourceType;

    fn config_with_source() -> Config {
        let mut config = Config::default();
        config.sources.push(
            SourceMetadata::new("inventory-db", SourceType::Postgres, "db.internal", 5432)
                .with_confidence(0.9),
        );
        config
    }

    #[test]
    fn test_valid_config() {
        let validator = ConfigValidator::new();
        assert!(validator.validate(&config_with_source()).is_ok());
    }

    #[test]
    fn test_invalid_environment_name() {
        let config = Config::new("Prod Env");
        assert!(ConfigValidator::new().validate(&config).is_err());
        assert!(ConfigValidator::lenient().validate(&config).is_ok());
    }

    #[test]
    fn test_duplicate_source_names() {
        let mut config = config_with_source();
        config.sources.push(SourceMetadata::new(
            "inventory-db",
            SourceType::Mysql,
            "other",
            3306,
        ));

        let result = ConfigValidator::new().validate(&config);
        assert!(result.unwrap_err().to_string().contains("Duplicate source name"));
    }

    #[test]
    fn test_zero_port_rejected() {
        let mut config = Config::default();
        config
            .sources
            .push(SourceMetadata::new("bad", SourceType::Mongodb, "localhost", 0));
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_timeout_ceiling() {
        let mut config = Config::default();
        config.discovery.timeouts.connect_secs = Some(60);
        let result = ConfigValidator::new().validate(&config);
        assert!(result.unwrap_err().to_string().contains("exceeds the maximum"));

        config.discovery.timeouts.connect_secs = Some(10);
        config.discovery.timeouts.query_secs = Some(0);
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_base_path_only_for_api_sources() {
        let mut config = Config::default();
        config.sources.push(
            SourceMetadata::new("pg", SourceType::Postgres, "localhost", 5432)
                .with_base_path("/api"),
        );
        assert!(ConfigValidator::new().validate(&config).is_err());

        let mut config = Config::default();
        config.sources.push(
            SourceMetadata::new("cmdb", SourceType::RestApi, "localhost", 8080)
                .with_base_path("api"),
        );
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_zero_ttl_rejected() {
        let mut config = Config::default();
        config.registry.ttl_hours = Some(0);
        assert!(ConfigValidator::new().validate(&config).is_err());
    }

    #[test]
    fn test_router_identifiers() {
        let validator = ConfigValidator::new();

        let mut config = Config::default();
        config.router.inventory_table = Some("inventory.hosts".to_string());
        assert!(validator.validate(&config).is_ok());

        config.router.inventory_table = Some("servers; DROP TABLE servers".to_string());
        assert!(matches!(
            validator.validate(&config),
            Err(InfrarouteError::Validation(_))
        ));

        let mut config = Config::default();
        config.router.status_endpoint = Some("api/status".to_string());
        assert!(validator.validate(&config).is_err());

        let mut config = Config::default();
        config.router.row_limit = Some(0);
        assert!(validator.validate(&config).is_err());
    }
}
