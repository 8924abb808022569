use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Contents of a JSON config file such as
/// `{ "original_pdf": "in/Report.pdf", "destination_folder": "out" }`.
/// Relative paths are taken relative to the config file.
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FileConfig {
    pub original_pdf: Option<PathBuf>,
    pub destination_folder: Option<PathBuf>,
}

impl FileConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: FileConfig = serde_json::from_str(&text)
            .with_context(|| format!("Invalid config: {}", path.display()))?;

        let base = path.parent().unwrap_or_else(|| Path::new(""));
        config.original_pdf = config.original_pdf.map(|p| base.join(p));
        config.destination_folder = config.destination_folder.map(|p| base.join(p));
        Ok(config)
    }
}

/// Fully resolved inputs of a split run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SplitSettings {
    pub source: PathBuf,
    pub destination: PathBuf,
    /// Delete existing `*.pdf` files in the destination before splitting.
    pub clean: bool,
}

impl SplitSettings {
    /// Command-line (and environment) values win over the config file.
    pub fn resolve(
        source: Option<PathBuf>,
        destination: Option<PathBuf>,
        file: Option<FileConfig>,
        clean: bool,
    ) -> Result<Self> {
        let file = file.unwrap_or_default();

        let Some(source) = source.or(file.original_pdf) else {
            bail!("No source PDF: pass a path, set BMSPLIT_SOURCE, or set original_pdf in the config file");
        };
        let Some(destination) = destination.or(file.destination_folder) else {
            bail!(
                "No destination directory: pass --output-dir, set BMSPLIT_DEST_DIR, \
                 or set destination_folder in the config file"
            );
        };

        Ok(SplitSettings {
            source,
            destination,
            clean,
        })
    }
}
