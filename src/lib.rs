//! PDF Pages Library
//!
//! Split, merge and compress PDF files. This library provides functionality to:
//! - Parse page range expressions such as `"1-3,5"` against a page count
//! - Split a PDF into one file per page range
//! - Merge multiple PDF files, in order, into one
//! - Compress PDFs through Ghostscript
//! - Run any of the above over many files on a background worker
//!
//! # Example
//!
//! ```no_run
//! use pdf_pages::pdf::{split_pdf, merge_documents, MergeOptions};
//! use std::path::{Path, PathBuf};
//!
//! // report_pages_1-3.pdf and report_page_5.pdf
//! split_pdf(Path::new("report.pdf"), "1-3,5").expect("Failed to split PDF");
//!
//! let options = MergeOptions::new(vec![
//!     PathBuf::from("1. intro.pdf"),
//!     PathBuf::from("2. advanced.pdf"),
//! ]);
//! merge_documents(&options).expect("Failed to merge PDFs");
//! ```

pub mod batch;
pub mod compress;
pub mod error;
pub mod pdf;
pub mod range;
pub mod selection;

// Re-export commonly used items
pub use error::{Error, FailureCause, RangeError, Result};
pub use range::{parse_ranges, PageRange};
pub use selection::FileSelection;
