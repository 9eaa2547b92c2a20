//! Discover command implementation

use clap::Args;
use infraroute_core::{Config, InfrarouteError};
use infraroute_runtime::IntelligentRouter;
use tracing::info;

use super::print_json;

/// Discover command arguments
#[derive(Args, Debug)]
pub struct DiscoverCommand {
    /// Print only the best inventory source instead of every discovery
    #[arg(long)]
    pub best: bool,
}

impl DiscoverCommand {
    /// Execute the discover command
    pub async fn execute(&self, config: &Config) -> Result<(), InfrarouteError> {
        let router = IntelligentRouter::from_config(config).await?;
        let found = router.discover().await?;
        info!(
            env = %router.registry().environment(),
            "Discovery found {} source(s)",
            found.len()
        );

        if self.best {
            let best = router.discovery().get_best_source_for_inventory().await;
            return print_json(&best);
        }
        print_json(&found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_discover_args() {
        let cli = crate::Cli::try_parse_from(["infraroute", "discover", "--best"]).unwrap();
        match cli.command {
            crate::Commands::Discover(cmd) => assert!(cmd.best),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
