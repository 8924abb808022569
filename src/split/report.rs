use crate::error::{ErrorKind, SplitError};
use crate::split::plan::ChildSpec;
use serde::Serialize;

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum ChildStatus {
    Success { pages_written: u32 },
    Failure { error_kind: ErrorKind, message: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ChildOutcome {
    pub sequence_number: u32,
    pub output_name: String,
    pub start_page: u32,
    pub end_page: u32,
    #[serde(flatten)]
    pub status: ChildStatus,
}

impl ChildOutcome {
    pub fn success(child: &ChildSpec, pages_written: u32) -> Self {
        Self::new(child, ChildStatus::Success { pages_written })
    }

    pub fn failure(child: &ChildSpec, error: &SplitError) -> Self {
        Self::new(
            child,
            ChildStatus::Failure {
                error_kind: error.kind(),
                message: error.to_string(),
            },
        )
    }

    fn new(child: &ChildSpec, status: ChildStatus) -> Self {
        ChildOutcome {
            sequence_number: child.sequence_number,
            output_name: child.output_name.clone(),
            start_page: child.start_page,
            end_page: child.end_page,
            status,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self.status, ChildStatus::Success { .. })
    }
}

/// Outcome of one split run, one entry per planned child in plan order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SplitReport {
    pub children: Vec<ChildOutcome>,
}

impl SplitReport {
    pub fn succeeded(&self) -> usize {
        self.children.iter().filter(|c| c.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.children.len() - self.succeeded()
    }

    pub fn is_complete_success(&self) -> bool {
        self.failed() == 0
    }
}
