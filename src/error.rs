use crate::split::report::SplitReport;
use serde::Serialize;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum SplitError {
    #[error("Bookmark '{title}' does not contain page information ({reference:?}); the PDF may be corrupt")]
    MalformedBookmark { title: String, reference: String },

    #[error("Document has no bookmarks to split on")]
    EmptyBookmarkList,

    #[error("Child {sequence} has an invalid page range {start}-{end} (document has {total} pages)")]
    DegenerateRange {
        sequence: u32,
        start: u32,
        end: u32,
        total: u32,
    },

    #[error("Output already exists: {}", path.display())]
    OutputConflict { path: PathBuf },

    #[error("Failed to copy page {page}: {reason}")]
    PageCopy { page: u32, reason: String },

    #[error("Source document is unreadable: {reason}")]
    SharedResource { reason: String },

    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Stable, serializable classification of a [`SplitError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    MalformedBookmark,
    EmptyBookmarkList,
    DegenerateRange,
    OutputConflict,
    PageCopy,
    SharedResource,
    Io,
}

impl SplitError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            SplitError::MalformedBookmark { .. } => ErrorKind::MalformedBookmark,
            SplitError::EmptyBookmarkList => ErrorKind::EmptyBookmarkList,
            SplitError::DegenerateRange { .. } => ErrorKind::DegenerateRange,
            SplitError::OutputConflict { .. } => ErrorKind::OutputConflict,
            SplitError::PageCopy { .. } => ErrorKind::PageCopy,
            SplitError::SharedResource { .. } => ErrorKind::SharedResource,
            SplitError::Io { .. } => ErrorKind::Io,
        }
    }

    /// Errors on the shared source abort the whole run.
    pub fn is_fatal(&self) -> bool {
        matches!(self, SplitError::SharedResource { .. })
    }

    pub fn page_copy(page: u32, reason: impl ToString) -> Self {
        SplitError::PageCopy {
            page,
            reason: reason.to_string(),
        }
    }

    pub fn shared(reason: impl ToString) -> Self {
        SplitError::SharedResource {
            reason: reason.to_string(),
        }
    }
}

/// A run stopped by a fault on the shared source.
///
/// `report` covers every child handled up to and including the one that hit
/// the fault; its successful children are already on disk.
#[derive(Error, Debug)]
#[error("{} child file(s) written before the abort", .report.succeeded())]
pub struct SplitAborted {
    pub report: SplitReport,
    #[source]
    pub error: SplitError,
}

pub type Result<T> = std::result::Result<T, SplitError>;
