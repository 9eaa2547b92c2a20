//! Configuration parsing for Infraroute
//!
//! This crate handles parsing of YAML configuration files, validation, and
//! environment variable substitution.

pub mod env;
pub mod validator;
pub mod yaml;

pub use validator::ConfigValidator;
pub use yaml::YamlParser;

use infraroute_core::{Config, InfrarouteError};
use std::path::Path;

/// Parse a configuration file from a path
pub fn parse_file(path: &str) -> Result<Config, InfrarouteError> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| InfrarouteError::Config(format!("Failed to read file '{}': {}", path, e)))?;

    parse_string(&content)
}

/// Parse a configuration file if it exists, otherwise fall back to defaults
pub fn parse_file_or_default(path: &str) -> Result<Config, InfrarouteError> {
    if Path::new(path).exists() {
        parse_file(path)
    } else {
        tracing::debug!("No configuration at '{}', using defaults", path);
        Ok(Config::default())
    }
}

/// Parse a configuration from a string
pub fn parse_string(content: &str) -> Result<Config, InfrarouteError> {
    let config = YamlParser::parse(content)?;

    let validator = ConfigValidator::new();
    validator.validate(&config)?;

    Ok(config)
}
