//! CLI commands

mod completion;
mod discover;
mod init;
mod plan;
mod query;
mod serve;
mod sources;

pub use completion::CompletionCommand;
pub use discover::DiscoverCommand;
pub use init::InitCommand;
pub use plan::PlanCommand;
pub use query::QueryCommand;
pub use serve::ServeCommand;
pub use sources::SourcesCommand;

use clap::{Parser, Subcommand};
use infraroute_core::{Config, InfrarouteError};
use infraroute_parser::ConfigValidator;
use serde::Serialize;
use tracing::{debug, info};

/// Infraroute - route infrastructure questions to the best available backend
#[derive(Parser, Debug)]
#[command(name = "infraroute")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file path
    ///
    /// This is a *global* option so it can be specified after subcommands,
    /// e.g. `infraroute serve -f infraroute.yaml`.
    #[arg(
        short = 'f',
        long = "file",
        global = true,
        default_value = "infraroute.yaml"
    )]
    pub config: String,

    /// Environment namespace, overriding the one in the configuration
    #[arg(short = 'e', long = "env", global = true)]
    pub environment: Option<String>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Emit logs as JSON
    #[arg(long = "log-json", global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Available commands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Route a question and print the resulting rows
    Query(QueryCommand),

    /// Show how a question would be routed without running it
    Plan(PlanCommand),

    /// Probe for data sources and register them
    Discover(DiscoverCommand),

    /// List registered data sources
    Sources(SourcesCommand),

    /// Start the HTTP server
    Serve(ServeCommand),

    /// Write a starter configuration
    Init(InitCommand),

    /// Generate shell completion scripts
    #[command(hide = true)]
    Completion(CompletionCommand),
}

impl Cli {
    /// Parse CLI arguments
    pub fn parse_args() -> Self {
        Self::parse()
    }

    /// Load the configuration file, or defaults when it does not exist, and
    /// apply the `--env` override
    pub fn load_config(&self) -> Result<Config, InfrarouteError> {
        debug!("Loading configuration from: {}", self.config);
        let mut config = infraroute_parser::parse_file_or_default(&self.config)?;

        if let Some(environment) = &self.environment {
            config.environment = environment.clone();
            // The environment names the registry snapshot file
            ConfigValidator::new().validate(&config)?;
        }

        info!(env = %config.environment, "Using environment");
        Ok(config)
    }
}

/// Join free-form question words into one query string
pub(crate) fn question(words: &[String]) -> Result<String, InfrarouteError> {
    let text = words.join(" ");
    if text.trim().is_empty() {
        return Err(InfrarouteError::Validation(
            "query must not be empty".to_string(),
        ));
    }
    Ok(text)
}

/// Write a value to stdout as pretty JSON
pub(crate) fn print_json<T: Serialize>(value: &T) -> Result<(), InfrarouteError> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}
