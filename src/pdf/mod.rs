//! PDF manipulation module

pub mod document;
pub mod extract;
pub mod merge;
pub mod metadata;
mod pages;

// Re-export commonly used items
pub use document::SourceDocument;
pub use extract::{extract_combined, extract_pages, extract_range, split_pdf};
pub use merge::{merge_documents, merge_into, MergeOptions};
pub use metadata::{count_pages, extract_metadata, format_file_size, PdfMetadata};
