pub mod orchestrator;
pub mod output;
pub mod plan;
pub mod report;
pub mod source;

pub use orchestrator::run;
pub use output::DirectoryOutputs;
pub use plan::{plan, validate_ranges, ChildSpec};
pub use report::{ChildStatus, SplitReport};
