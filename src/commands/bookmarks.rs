use crate::pdf::outline::read_bookmarks;
use crate::pdf::PdfDocument;
use anyhow::Result;
use std::path::Path;

pub fn run<P: AsRef<Path>>(path: P) -> Result<()> {
    let doc = PdfDocument::open(&path)?;
    let bookmarks = read_bookmarks(&doc.doc)?;

    if bookmarks.is_empty() {
        println!("No bookmarks found.");
        return Ok(());
    }

    for bookmark in bookmarks {
        println!("{} ({})", bookmark.title, bookmark.page_reference);
    }

    Ok(())
}
