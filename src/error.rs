//! Error types for the pdf-pages library

use std::path::{Path, PathBuf};
use thiserror::Error;

/// Result type alias using our Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Errors raised while resolving page ranges, extracting pages or merging
/// documents.
///
/// Every variant carries enough detail to render a message without going
/// back to the input: the offending term, the document's page count, the
/// number of inputs, or the path that could not be read or written.
#[derive(Error, Debug)]
pub enum RangeError {
    /// A range term is not a page number or a `start-end` pair
    #[error("Invalid page range '{term}': use a page number like 5 or a range like 1-3")]
    NotANumber { term: String },

    /// A range term points outside the document, or runs backwards
    #[error("Page range '{term}' does not exist: the document has only {page_count} pages")]
    OutOfBounds { term: String, page_count: u32 },

    /// Merge needs at least two documents
    #[error("Merging needs at least 2 PDF files, got {0}")]
    TooFewInputs(usize),

    /// A merge output name that is not a plain file name
    #[error("Invalid output name '{name}': give a file name without folders")]
    InvalidOutputName { name: String },

    /// The output would replace one of the inputs
    #[error("Output {} would overwrite one of the input files", .path.display())]
    OutputIsInput { path: PathBuf },

    /// Reading a source or writing an output failed
    #[error("Failed to process {}: {cause}", .path.display())]
    IoFailure {
        path: PathBuf,
        #[source]
        cause: FailureCause,
    },
}

impl RangeError {
    pub(crate) fn io(path: &Path, cause: impl Into<FailureCause>) -> Self {
        RangeError::IoFailure {
            path: path.to_path_buf(),
            cause: cause.into(),
        }
    }
}

/// Underlying cause of a [`RangeError::IoFailure`]
#[derive(Error, Debug)]
pub enum FailureCause {
    /// File system error (missing file, permission denied, disk full)
    #[error(transparent)]
    Io(#[from] std::io::Error),

    /// The file could not be parsed or serialized as a PDF
    #[error(transparent)]
    Pdf(#[from] lopdf::Error),

    /// The PDF parsed but its structure is unusable
    #[error("{0}")]
    Malformed(String),
}

/// Main error type for the pdf-pages library
#[derive(Error, Debug)]
pub enum Error {
    /// Range parsing, extraction or merge error
    #[error(transparent)]
    Range(#[from] RangeError),

    /// IO error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// File not found
    #[error("File not found: {}", .0.display())]
    FileNotFound(PathBuf),

    /// No Ghostscript executable could be located
    #[error("Ghostscript not found. Install it or pass --ghostscript")]
    GhostscriptNotFound,

    /// Ghostscript exited with a failure status
    #[error("Ghostscript failed on {}: {stderr}", .path.display())]
    Ghostscript { path: PathBuf, stderr: String },

    /// Ghostscript ran past its deadline and was killed
    #[error("Ghostscript timed out after {secs}s on {}", .path.display())]
    GhostscriptTimeout { path: PathBuf, secs: u64 },

    /// Ghostscript reported success but produced nothing
    #[error("Output file empty: {}", .0.display())]
    EmptyOutput(PathBuf),

    /// General error
    #[error("{0}")]
    General(String),
}
