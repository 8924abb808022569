pub mod child;
pub mod document;
pub mod outline;

pub use child::ChildDocument;
pub use document::PdfDocument;
