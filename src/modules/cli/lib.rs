//! Infraroute CLI
//!
//! This crate provides the command-line interface for Infraroute including:
//! - query: Route a question and print the rows
//! - plan: Print the query plan without executing it
//! - discover: Probe for sources and register them
//! - sources: List registered sources
//! - serve: Start the HTTP server
//! - init: Write a starter configuration

pub mod commands;

pub use commands::{Cli, Commands};
