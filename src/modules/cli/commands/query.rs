//! Query command implementation

use clap::Args;
use infraroute_core::{Config, InfrarouteError};
use infraroute_runtime::IntelligentRouter;
use infraroute_types::runtime::RouteResponse;
use tracing::info;

use super::{print_json, question};

/// Query command arguments
#[derive(Args, Debug)]
pub struct QueryCommand {
    /// The question, e.g. `list prod web servers`
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl QueryCommand {
    /// Execute the query command
    pub async fn execute(&self, config: &Config) -> Result<(), InfrarouteError> {
        let response = self.run(config).await?;
        print_json(&response)
    }

    async fn run(&self, config: &Config) -> Result<RouteResponse, InfrarouteError> {
        let text = question(&self.text)?;
        let router = IntelligentRouter::from_config(config).await?;

        let result = router.ask(&text).await?;
        info!(
            source = result.plan.source_name().unwrap_or("ssh_scan"),
            used_fallback = result.used_fallback,
            "{} rows returned",
            result.rows.len()
        );

        let source = result.plan.source_name().map(str::to_string);
        Ok(RouteResponse::success(
            result.plan.intent,
            source,
            result.used_fallback,
            result.rows,
        ))
    }
}
