//! Plan command implementation

use clap::Args;
use infraroute_core::{Config, InfrarouteError, QueryPlan};
use infraroute_runtime::IntelligentRouter;

use super::{print_json, question};

/// Plan command arguments
#[derive(Args, Debug)]
pub struct PlanCommand {
    /// The question to plan
    #[arg(required = true, num_args = 1..)]
    pub text: Vec<String>,
}

impl PlanCommand {
    /// Execute the plan command
    pub async fn execute(&self, config: &Config) -> Result<(), InfrarouteError> {
        let plan = self.run(config).await?;
        print_json(&plan)
    }

    async fn run(&self, config: &Config) -> Result<QueryPlan, InfrarouteError> {
        let text = question(&self.text)?;
        let router = IntelligentRouter::from_config(config).await?;
        router.route(&text).await
    }
}
