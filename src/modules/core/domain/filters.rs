//! Structured filters extracted from query text

use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;

/// Deployment environment a host belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Environment {
    Prod,
    Preprod,
    Staging,
    Dev,
}

impl Environment {
    pub fn as_str(&self) -> &'static str {
        match self {
            Environment::Prod => "prod",
            Environment::Preprod => "preprod",
            Environment::Staging => "staging",
            Environment::Dev => "dev",
        }
    }
}

impl fmt::Display for Environment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Service role a host plays
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Web,
    Db,
    Cache,
    Mongo,
    Mysql,
    Postgres,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Web => "web",
            Role::Db => "db",
            Role::Cache => "cache",
            Role::Mongo => "mongo",
            Role::Mysql => "mysql",
            Role::Postgres => "postgres",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// At most one environment and one role filter
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct QueryFilters {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub environment: Option<Environment>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub role: Option<Role>,
}

impl QueryFilters {
    pub fn is_empty(&self) -> bool {
        self.environment.is_none() && self.role.is_none()
    }

    /// Filters as plan parameters (`environment`, `role`)
    pub fn to_params(&self) -> HashMap<String, serde_json::Value> {
        let mut params = HashMap::new();
        if let Some(env) = self.environment {
            params.insert("environment".to_string(), env.as_str().into());
        }
        if let Some(role) = self.role {
            params.insert("role".to_string(), role.as_str().into());
        }
        params
    }
}
