use anyhow::Result;
use rmcp::{
    ServerHandler, ServiceExt,
    handler::server::{router::tool::ToolRouter, wrapper::Parameters},
    model::{ServerCapabilities, ServerInfo},
    schemars, tool, tool_router,
};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use crate::bookmark::Bookmark;
use crate::commands::plan::load_plan;
use crate::commands::split::execute;
use crate::config::SplitSettings;
use crate::pdf::outline::read_bookmarks;
use crate::pdf::PdfDocument;
use crate::split::{validate_ranges, ChildSpec};

// Request structs for tools

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PathRequest {
    #[schemars(description = "Path to the PDF file")]
    pub path: String,
}

#[derive(Debug, Deserialize, schemars::JsonSchema)]
pub struct PdfSplitRequest {
    #[schemars(description = "Path to the PDF file to split on its bookmarks")]
    pub path: String,
    #[schemars(description = "Directory the child PDFs are written to")]
    pub output_dir: String,
    #[schemars(description = "Delete existing PDFs in the output directory first (default: false)")]
    #[serde(default)]
    pub clean: bool,
}

#[derive(Debug, Clone)]
pub struct PdfServer {
    #[allow(dead_code)]
    tool_router: ToolRouter<Self>,
}

impl PdfServer {
    pub fn new() -> Self {
        Self {
            tool_router: Self::tool_router(),
        }
    }
}

impl Default for PdfServer {
    fn default() -> Self {
        Self::new()
    }
}

#[tool_router]
impl PdfServer {
    #[tool(description = "List the top-level bookmarks of a PDF with their page references")]
    fn pdf_bookmarks(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        let bookmarks = PdfDocument::open(&path).and_then(|doc| read_bookmarks(&doc.doc));
        match bookmarks {
            Ok(bookmarks) => {
                let result = BookmarksResult { path, bookmarks };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {}", e),
        }
    }

    #[tool(description = "Show how a PDF would be split on its bookmarks: page range and file name of every child")]
    fn pdf_split_plan(&self, Parameters(PathRequest { path }): Parameters<PathRequest>) -> String {
        match load_plan(&path) {
            Ok(planned) => {
                let total_pages = planned.doc.page_count();
                let result = SplitPlanResult {
                    path,
                    total_pages,
                    invalid_ranges: validate_ranges(&planned.children, total_pages)
                        .iter()
                        .map(|e| e.to_string())
                        .collect(),
                    children: planned.children,
                };
                serde_json::to_string_pretty(&result).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Err(e) => format!("Error: {:#}", e),
        }
    }

    #[tool(description = "Split a PDF into one file per top-level bookmark and report the outcome of every child")]
    async fn pdf_split(&self, Parameters(req): Parameters<PdfSplitRequest>) -> String {
        let settings = SplitSettings {
            source: PathBuf::from(req.path),
            destination: PathBuf::from(req.output_dir),
            clean: req.clean,
        };

        match tokio::task::spawn_blocking(move || execute(&settings)).await {
            Ok(Ok(report)) => {
                serde_json::to_string_pretty(&report).unwrap_or_else(|e| format!("Error: {}", e))
            }
            Ok(Err(e)) => format!("Error: {:#}", e),
            Err(e) => format!("Error: split task failed: {}", e),
        }
    }
}

// Result types for MCP tools

#[derive(Debug, Serialize)]
pub struct BookmarksResult {
    pub path: String,
    pub bookmarks: Vec<Bookmark>,
}

#[derive(Debug, Serialize)]
pub struct SplitPlanResult {
    pub path: String,
    pub total_pages: u32,
    pub children: Vec<ChildSpec>,
    pub invalid_ranges: Vec<String>,
}

impl ServerHandler for PdfServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            instructions: Some(
                "Bookmark-driven PDF splitting. Use pdf_bookmarks to inspect the outline, \
                 pdf_split_plan to preview the child files, and pdf_split to write them."
                    .to_string(),
            ),
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            ..Default::default()
        }
    }
}

pub async fn run_server() -> Result<()> {
    let server = PdfServer::new();

    // Serve using stdin/stdout as a tuple
    let service = server.serve((tokio::io::stdin(), tokio::io::stdout())).await?;

    service.waiting().await?;

    Ok(())
}
