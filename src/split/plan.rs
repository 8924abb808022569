use crate::bookmark::Bookmark;
use crate::error::{Result, SplitError};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::Serialize;

static PUNCTUATION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\p{P}").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// One planned child document.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildSpec {
    pub sequence_number: u32,
    pub start_page: u32,
    pub end_page: u32,
    pub bookmark_title: String,
    pub output_name: String,
}

impl ChildSpec {
    /// A range is usable if it is non-empty and lies within the document.
    pub fn check_range(&self, total_pages: u32) -> Result<()> {
        if self.start_page == 0 || self.end_page < self.start_page || self.end_page > total_pages
        {
            return Err(SplitError::DegenerateRange {
                sequence: self.sequence_number,
                start: self.start_page,
                end: self.end_page,
                total: total_pages,
            });
        }
        Ok(())
    }

    pub fn page_count(&self) -> u32 {
        (self.end_page + 1).saturating_sub(self.start_page)
    }
}

/// Partition `[1, total_pages]` into one child per bookmark.
///
/// Every bookmark is parsed before anything is returned, so a single malformed
/// entry yields no plan at all. Start pages are not required to increase;
/// out-of-order bookmarks produce degenerate ranges that [`ChildSpec::check_range`]
/// reports when the child is used.
pub fn plan(bookmarks: &[Bookmark], total_pages: u32, source_name: &str) -> Result<Vec<ChildSpec>> {
    if bookmarks.is_empty() {
        return Err(SplitError::EmptyBookmarkList);
    }

    let mut children = bookmarks
        .iter()
        .enumerate()
        .map(|(i, bookmark)| {
            let sequence_number = i as u32 + 1;
            Ok(ChildSpec {
                sequence_number,
                start_page: bookmark.start_page()?,
                end_page: 0,
                bookmark_title: bookmark.title.clone(),
                output_name: child_file_name(source_name, &bookmark.title, sequence_number),
            })
        })
        .collect::<Result<Vec<_>>>()?;

    // Each child ends right before the next one starts, but never past the
    // last page: a start beyond the document only invalidates its own child.
    let mut last_page = total_pages;
    for child in children.iter_mut().rev() {
        child.end_page = last_page;
        last_page = child.start_page.min(total_pages.saturating_add(1)) - 1;
    }

    Ok(children)
}

/// All children whose range cannot be split out, in plan order.
pub fn validate_ranges(children: &[ChildSpec], total_pages: u32) -> Vec<SplitError> {
    children
        .iter()
        .filter_map(|child| child.check_range(total_pages).err())
        .collect()
}

/// Build the file name for a child: `"{stem}{sequence}_{title}"` with all
/// punctuation turned into spaces, whitespace runs turned into `_`, and the
/// source extension put back on.
pub fn child_file_name(source_name: &str, title: &str, sequence: u32) -> String {
    let (stem, extension) = match source_name.rfind('.') {
        Some(dot) if dot > 0 => (&source_name[..dot], &source_name[dot..]),
        _ => (source_name, ""),
    };

    let raw = format!("{}{}_{}", stem, sequence, title);
    let spaced = PUNCTUATION.replace_all(&raw, " ");
    let collapsed = WHITESPACE.replace_all(&spaced, "_");

    format!("{}{}", collapsed, extension)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bookmarks(pages: &[u32]) -> Vec<Bookmark> {
        pages
            .iter()
            .enumerate()
            .map(|(i, p)| Bookmark::new(format!("Section {}", i + 1), format!("{} XYZ null null null", p)))
            .collect()
    }

    #[test]
    fn test_child_file_name() {
        assert_eq!(
            child_file_name("MyFile.pdf", "the bookmark name", 1),
            "MyFile1_the_bookmark_name.pdf"
        );
    }

    #[test]
    fn test_child_file_name_strips_punctuation() {
        assert_eq!(
            child_file_name("HomeTest.pdf", "Home Supp App - Pg 1,2", 3),
            "HomeTest3_Home_Supp_App_Pg_1_2.pdf"
        );
    }

    #[test]
    fn test_child_file_name_all_punctuation_title() {
        assert_eq!(child_file_name("MyFile.pdf", "?!...", 2), "MyFile2_.pdf");
    }

    #[test]
    fn test_child_file_name_keeps_other_extensions() {
        assert_eq!(child_file_name("report.PDF", "A/B: c", 10), "report10_A_B_c.PDF");
        assert_eq!(child_file_name("notes", "x", 1), "notes1_x");
    }

    #[test]
    fn test_child_file_name_unicode_punctuation() {
        assert_eq!(
            child_file_name("Book.pdf", "«Chapitre» — un", 4),
            "Book4_Chapitre_un.pdf"
        );
    }

    #[test]
    fn test_plan_is_contiguous() {
        let children = plan(&bookmarks(&[1, 4, 9]), 12, "Doc.pdf").unwrap();
        let ranges: Vec<_> = children.iter().map(|c| (c.start_page, c.end_page)).collect();
        assert_eq!(ranges, vec![(1, 3), (4, 8), (9, 12)]);

        let sequence: Vec<_> = children.iter().map(|c| c.sequence_number).collect();
        assert_eq!(sequence, vec![1, 2, 3]);
        assert_eq!(children[1].output_name, "Doc2_Section_2.pdf");
        assert!(validate_ranges(&children, 12).is_empty());
    }

    #[test]
    fn test_plan_covers_every_page_once() {
        for (starts, total) in [(vec![1], 1), (vec![1, 2, 3], 3), (vec![1, 10, 11, 50], 80)] {
            let children = plan(&bookmarks(&starts), total, "Doc.pdf").unwrap();
            assert_eq!(children.len(), starts.len());

            let mut covered = Vec::new();
            for child in &children {
                covered.extend(child.start_page..=child.end_page);
            }
            assert_eq!(covered, (1..=total).collect::<Vec<_>>());
        }
    }

    #[test]
    fn test_plan_is_deterministic() {
        let input = bookmarks(&[1, 5]);
        assert_eq!(plan(&input, 9, "Same.pdf").unwrap(), plan(&input, 9, "Same.pdf").unwrap());
    }

    #[test]
    fn test_plan_empty() {
        assert!(matches!(plan(&[], 10, "Doc.pdf"), Err(SplitError::EmptyBookmarkList)));
    }

    #[test]
    fn test_plan_malformed_bookmark() {
        let mut input = bookmarks(&[1, 5]);
        input.push(Bookmark::new("Broken", "my bad format"));
        assert!(matches!(
            plan(&input, 10, "Doc.pdf"),
            Err(SplitError::MalformedBookmark { .. })
        ));
    }

    #[test]
    fn test_plan_out_of_order_is_degenerate() {
        let children = plan(&bookmarks(&[1, 6, 3]), 10, "Doc.pdf").unwrap();
        let ranges: Vec<_> = children.iter().map(|c| (c.start_page, c.end_page)).collect();
        assert_eq!(ranges, vec![(1, 5), (6, 2), (3, 10)]);

        let problems = validate_ranges(&children, 10);
        assert_eq!(problems.len(), 1);
        assert!(matches!(
            problems[0],
            SplitError::DegenerateRange { sequence: 2, start: 6, end: 2, total: 10 }
        ));
    }

    #[test]
    fn test_plan_start_past_end_is_degenerate() {
        let children = plan(&bookmarks(&[1, 15]), 10, "Doc.pdf").unwrap();
        let ranges: Vec<_> = children.iter().map(|c| (c.start_page, c.end_page)).collect();
        assert_eq!(ranges, vec![(1, 10), (15, 10)]);
        assert!(children[0].check_range(10).is_ok());
        assert!(children[1].check_range(10).is_err());

        let problems = validate_ranges(&children, 10);
        assert_eq!(problems.len(), 1);
        assert!(matches!(problems[0], SplitError::DegenerateRange { sequence: 2, .. }));
    }

    #[test]
    fn test_plan_middle_start_past_end() {
        let children = plan(&bookmarks(&[1, 12, 4]), 10, "Doc.pdf").unwrap();
        let ranges: Vec<_> = children.iter().map(|c| (c.start_page, c.end_page)).collect();
        assert_eq!(ranges, vec![(1, 10), (12, 3), (4, 10)]);
        assert_eq!(validate_ranges(&children, 10).len(), 1);
    }

    #[test]
    fn test_duplicate_start_pages() {
        let children = plan(&bookmarks(&[1, 3, 3]), 5, "Doc.pdf").unwrap();
        assert_eq!(children[1].end_page, 2);
        assert_eq!(children[1].page_count(), 0);
        assert!(children[1].check_range(5).is_err());
        assert!(children[2].check_range(5).is_ok());
    }
}
