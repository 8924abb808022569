use crate::pdf::outline::read_bookmarks;
use crate::pdf::PdfDocument;
use crate::split::{plan, validate_ranges, ChildSpec};
use anyhow::{Context, Result};
use std::path::Path;
use tracing::warn;

/// A source document together with the children it splits into.
pub struct PlannedSplit {
    pub doc: PdfDocument,
    pub children: Vec<ChildSpec>,
}

pub fn load_plan<P: AsRef<Path>>(path: P) -> Result<PlannedSplit> {
    let path = path.as_ref();
    let doc = PdfDocument::open(path)?;
    let bookmarks = read_bookmarks(&doc.doc)?;
    let children = plan(&bookmarks, doc.page_count(), &doc.name)
        .with_context(|| format!("Cannot plan split of {}", path.display()))?;
    Ok(PlannedSplit { doc, children })
}

pub fn run<P: AsRef<Path>>(path: P, json: bool) -> Result<()> {
    let planned = load_plan(&path)?;
    let total_pages = planned.doc.page_count();
    let problems = validate_ranges(&planned.children, total_pages);

    for problem in &problems {
        warn!("{}", problem);
    }

    if json {
        println!("{}", serde_json::to_string_pretty(&planned.children)?);
        return Ok(());
    }

    println!("File: {}", path.as_ref().display());
    println!("Pages: {}", total_pages);
    for child in &planned.children {
        println!(
            "{:>3}  pages {:>4}-{:<4}  {}",
            child.sequence_number, child.start_page, child.end_page, child.output_name
        );
    }
    if !problems.is_empty() {
        println!("\n{} child(ren) have invalid page ranges and will fail.", problems.len());
    }

    Ok(())
}
