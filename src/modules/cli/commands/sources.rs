//! Sources command implementation

use clap::Args;
use infraroute_core::{Config, InfrarouteError, SourceMetadata};
use infraroute_runtime::{NativeConnectorFactory, SourceRegistry};
use infraroute_types::SourceType;
use std::sync::Arc;

use super::print_json;

/// Sources command arguments
#[derive(Args, Debug)]
pub struct SourcesCommand {
    /// Only list sources of this type (postgres, mysql, mongodb, rest-api)
    #[arg(long = "type")]
    pub source_type: Option<SourceType>,

    /// Only list sources with this capability
    #[arg(long)]
    pub capability: Option<String>,
}

impl SourcesCommand {
    /// Execute the sources command
    pub async fn execute(&self, config: &Config) -> Result<(), InfrarouteError> {
        let sources = self.run(config).await?;
        print_json(&sources)
    }

    async fn run(&self, config: &Config) -> Result<Vec<SourceMetadata>, InfrarouteError> {
        let factory = Arc::new(NativeConnectorFactory::from_config(config));
        let registry = SourceRegistry::from_config(config, factory).await?;

        let mut sources = match self.source_type {
            Some(source_type) => registry.get_sources_by_type(source_type).await,
            None => registry.list_sources().await,
        };
        if let Some(capability) = &self.capability {
            sources.retain(|s| s.has_capability(capability));
        }
        Ok(sources)
    }
}
