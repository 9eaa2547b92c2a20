//! Serve command implementation

use clap::Args;
use infraroute_core::{Config, InfrarouteError};
use infraroute_runtime::Runtime;

/// Serve command arguments
#[derive(Args, Debug)]
pub struct ServeCommand {
    /// Override server port
    #[arg(short, long)]
    pub port: Option<u16>,
}

impl ServeCommand {
    /// Execute the serve command
    pub async fn execute(&self, config: &Config) -> Result<(), InfrarouteError> {
        let runtime = Runtime::with_port_override(config, self.port).await?;
        runtime.run().await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    #[test]
    fn test_serve_command_args() {
        let cli = crate::Cli::try_parse_from(["infraroute", "serve", "--port", "9090"]).unwrap();
        match cli.command {
            crate::Commands::Serve(cmd) => assert_eq!(cmd.port, Some(9090)),
            other => panic!("unexpected command: {:?}", other),
        }
    }
}
