//! Binary crate for the `weather` command-line client.
//!
//! This crate focuses on:
//! - Driving the weather-server query API (save, list, update, delete, export)
//! - Direct, unsaved current-weather and 5-day lookups
//! - Keeping the form state in a plain view model with pure transitions

use clap::Parser;
use tracing_subscriber::EnvFilter;

mod actions;
mod api;
mod cli;
mod config;
mod view;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cmd = cli::Cli::parse();
    cmd.run().await
}
