//! Infraroute CLI
//!
//! Command-line interface for routing infrastructure questions.

use clap::Parser;
use infraroute_cli::{Cli, Commands};
use infraroute_core::InfrarouteError;
use tracing::Level;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

#[tokio::main]
async fn main() {
    if let Err(e) = run().await {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

async fn run() -> Result<(), InfrarouteError> {
    let cli = Cli::parse();

    // Initialize logging; stdout carries command output, so logs go to stderr
    let log_level = if cli.verbose {
        Level::DEBUG
    } else {
        Level::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(log_level.into())
        .from_env_lossy();

    let (json_layer, text_layer) = if cli.log_json {
        (Some(fmt::layer().json().with_writer(std::io::stderr)), None)
    } else {
        (None, Some(fmt::layer().with_writer(std::io::stderr)))
    };

    tracing_subscriber::registry()
        .with(json_layer)
        .with(text_layer)
        .with(filter)
        .init();

    // Execute command
    match &cli.command {
        Commands::Query(cmd) => cmd.execute(&cli.load_config()?).await?,
        Commands::Plan(cmd) => cmd.execute(&cli.load_config()?).await?,
        Commands::Discover(cmd) => cmd.execute(&cli.load_config()?).await?,
        Commands::Sources(cmd) => cmd.execute(&cli.load_config()?).await?,
        Commands::Serve(cmd) => cmd.execute(&cli.load_config()?).await?,
        Commands::Init(cmd) => cmd.execute(cli.environment.as_deref()).await?,
        Commands::Completion(cmd) => cmd.execute(),
    }

    Ok(())
}
