use crate::commands::plan::load_plan;
use crate::config::SplitSettings;
use crate::split::{self, ChildStatus, DirectoryOutputs, SplitReport};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::{debug, info, warn};
use walkdir::WalkDir;

/// Split the configured source into its destination directory.
///
/// Planning happens before the destination is touched, so a source that cannot
/// be planned leaves earlier outputs in place.
pub fn execute(settings: &SplitSettings) -> Result<SplitReport> {
    let planned = load_plan(&settings.source)?;
    let output_dir = &settings.destination;

    // Create output directory if it doesn't exist
    std::fs::create_dir_all(output_dir)
        .with_context(|| format!("Failed to create directory: {}", output_dir.display()))?;

    if settings.clean {
        let removed = clean_destination(output_dir, &settings.source)?;
        info!("Removed {} existing PDF(s) from {}", removed, output_dir.display());
    }

    info!(
        "Splitting {} ({} pages) into {} children",
        planned.doc.name,
        planned.doc.page_count(),
        planned.children.len()
    );

    let mut outputs = DirectoryOutputs::new(output_dir);
    match split::run(&planned.doc, &mut outputs, &planned.children) {
        Ok(report) => Ok(report),
        Err(aborted) => {
            for child in aborted.report.children.iter().filter(|c| c.is_success()) {
                warn!("Left in place: {}", output_dir.join(&child.output_name).display());
            }
            Err(aborted).with_context(|| format!("Split of {} aborted", settings.source.display()))
        }
    }
}

/// Delete `*.pdf` files directly inside `dir`, except `keep` (the source being
/// split). Returns how many were removed.
pub fn clean_destination<P: AsRef<Path>>(dir: P, keep: &Path) -> Result<usize> {
    let keep = keep.canonicalize().ok();
    let mut removed = 0;
    for entry in WalkDir::new(dir.as_ref()).min_depth(1).max_depth(1) {
        let entry = entry?;
        let is_pdf = entry
            .path()
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| e.eq_ignore_ascii_case("pdf"));
        if !entry.file_type().is_file() || !is_pdf {
            continue;
        }
        if keep.is_some() && entry.path().canonicalize().ok() == keep {
            debug!("Keeping source {}", entry.path().display());
            continue;
        }
        std::fs::remove_file(entry.path())
            .with_context(|| format!("Failed to remove {}", entry.path().display()))?;
        debug!("Removed {}", entry.path().display());
        removed += 1;
    }
    Ok(removed)
}

pub fn run(settings: &SplitSettings, json: bool) -> Result<()> {
    let report = execute(settings)?;

    if json {
        println!("{}", serde_json::to_string_pretty(&report)?);
    } else {
        for child in &report.children {
            match &child.status {
                ChildStatus::Success { pages_written } => println!(
                    "{:>3}  ok    {} ({} page(s))",
                    child.sequence_number, child.output_name, pages_written
                ),
                ChildStatus::Failure { message, .. } => println!(
                    "{:>3}  FAIL  {}: {}",
                    child.sequence_number, child.output_name, message
                ),
            }
        }
        println!(
            "Split {} of {} children into {}",
            report.succeeded(),
            report.children.len(),
            settings.destination.display()
        );
    }

    if !report.is_complete_success() {
        anyhow::bail!(
            "{} of {} children failed",
            report.failed(),
            report.children.len()
        );
    }

    Ok(())
}
