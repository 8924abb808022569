mod bookmark;
mod cli;
mod commands;
mod config;
mod error;
mod mcp;
mod pdf;
mod split;

use anyhow::Result;
use clap::Parser;
use cli::{Cli, Commands};
use config::{FileConfig, SplitSettings};
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Logs go to stderr; stdout carries command output and the MCP transport.
    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Mcp => {
            mcp::run_server().await?;
        }
        Commands::Bookmarks { path } => {
            commands::bookmarks::run(&path)?;
        }
        Commands::Plan { path, json } => {
            commands::plan::run(&path, json)?;
        }
        Commands::Split {
            path,
            output_dir,
            config,
            clean,
            json,
        } => {
            let file = config.map(FileConfig::load).transpose()?;
            let settings = SplitSettings::resolve(path, output_dir, file, clean)?;
            commands::split::run(&settings, json)?;
        }
    }

    Ok(())
}
