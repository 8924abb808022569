use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "bmsplit")]
#[command(about = "Split a PDF into one file per top-level bookmark, with MCP server support")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable debug logging (RUST_LOG takes precedence)
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Run as MCP server
    Mcp,

    /// List top-level bookmarks and their page references
    #[command(alias = "toc")]
    Bookmarks {
        /// PDF file to inspect
        path: PathBuf,
    },

    /// Show the children a split would produce, without writing anything
    Plan {
        /// PDF file to inspect
        path: PathBuf,

        /// Print the plan as JSON
        #[arg(long)]
        json: bool,
    },

    /// Split a PDF into one file per top-level bookmark
    Split {
        /// PDF file to split (defaults to original_pdf from the config file)
        #[arg(env = "BMSPLIT_SOURCE")]
        path: Option<PathBuf>,

        /// Output directory (defaults to destination_folder from the config file)
        #[arg(short, long, env = "BMSPLIT_DEST_DIR")]
        output_dir: Option<PathBuf>,

        /// JSON config file with original_pdf / destination_folder
        #[arg(short, long)]
        config: Option<PathBuf>,

        /// Delete existing PDFs in the output directory first
        #[arg(long)]
        clean: bool,

        /// Print the per-child report as JSON
        #[arg(long)]
        json: bool,
    },
}
