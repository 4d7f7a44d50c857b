//! PDF merging functionality using lopdf

use std::path::{Component, Path, PathBuf};
use chrono::{DateTime, Local};
use lopdf::Document;
use tracing::{debug, info};
use crate::error::RangeError;
use crate::pdf::document::{base_name, parent_dir, save_atomically, SourceDocument};
use crate::pdf::pages::{assemble, PageSelection};

/// Options for merging PDFs
#[derive(Debug, Clone, Default)]
pub struct MergeOptions {
    /// Input PDF file paths in the order they should be merged
    pub input_paths: Vec<PathBuf>,
    /// Base name for the merged file; `.pdf` is appended when missing.
    /// When unset, a timestamped `Merged_PDF_{YYYYmmdd_HHMMSS}.pdf` is used.
    pub output_name: Option<String>,
}

impl MergeOptions {
    /// Merge `input_paths` under the default timestamped name
    pub fn new(input_paths: Vec<PathBuf>) -> Self {
        Self {
            input_paths,
            output_name: None,
        }
    }

    /// Where the merged file will be written, using `now` for the default name
    ///
    /// Outputs go to the directory of the first input. A custom name must be
    /// a bare file name; anything with a folder component is rejected.
    pub fn output_path_at(&self, now: DateTime<Local>) -> Result<PathBuf, RangeError> {
        let first = self
            .input_paths
            .first()
            .ok_or(RangeError::TooFewInputs(0))?;
        let file_name = match self.output_name.as_deref().map(str::trim) {
            Some(name) if !name.is_empty() => {
                check_file_name(name)?;
                if name.to_ascii_lowercase().ends_with(".pdf") {
                    name.to_string()
                } else {
                    format!("{}.pdf", name)
                }
            }
            _ => format!("{}.pdf", default_stem(now)),
        };
        Ok(parent_dir(first).join(file_name))
    }
}

/// `Merged_PDF_{YYYYmmdd_HHMMSS}`
fn default_stem(now: DateTime<Local>) -> String {
    format!("Merged_PDF_{}", now.format("%Y%m%d_%H%M%S"))
}

/// A custom output name must stay inside the first input's folder
fn check_file_name(name: &str) -> Result<(), RangeError> {
    let mut components = Path::new(name).components();
    let plain = matches!(
        (components.next(), components.next()),
        (Some(Component::Normal(_)), None)
    );
    if !plain || name.contains(['/', '\\']) {
        return Err(RangeError::InvalidOutputName {
            name: name.to_string(),
        });
    }
    Ok(())
}

/// First of `path`, `{stem}_1.pdf`, `{stem}_2.pdf`, ... that does not exist yet
fn next_free_path(path: &Path) -> PathBuf {
    if !path.exists() {
        return path.to_path_buf();
    }
    let stem = base_name(path);
    let dir = parent_dir(path);
    (1..)
        .map(|n| dir.join(format!("{}_{}.pdf", stem, n)))
        .find(|candidate| !candidate.exists())
        .unwrap_or_else(|| path.to_path_buf())
}

/// Fail if writing `output` would replace one of `inputs`
fn check_not_an_input(inputs: &[PathBuf], output: &Path) -> Result<(), RangeError> {
    // A file that does not exist yet cannot be one of the inputs
    let Ok(target) = output.canonicalize() else {
        return Ok(());
    };
    if inputs
        .iter()
        .any(|input| input.canonicalize().map_or(false, |p| p == target))
    {
        return Err(RangeError::OutputIsInput {
            path: output.to_path_buf(),
        });
    }
    Ok(())
}

/// Merge multiple PDF files into a single PDF
///
/// Every page of every input is copied, inputs in the order given, pages in
/// their original order. At least two inputs are required. The output is
/// written to a temporary file and only renamed into place once the whole
/// merge succeeded, so a failure never leaves a truncated file behind.
/// A timestamped default name that is already taken gets a `_1`, `_2`, ...
/// suffix; an output that would replace one of the inputs is refused.
///
/// Returns the path of the merged file.
///
/// # Example
///
/// ```no_run
/// use pdf_pages::pdf::{MergeOptions, merge_documents};
/// use std::path::PathBuf;
///
/// let options = MergeOptions {
///     input_paths: vec![
///         PathBuf::from("1. first.pdf"),
///         PathBuf::from("2. second.pdf"),
///     ],
///     output_name: Some("handout".to_string()),
/// };
///
/// let merged = merge_documents(&options).expect("Failed to merge");
/// assert!(merged.ends_with("handout.pdf"));
/// ```
pub fn merge_documents(options: &MergeOptions) -> Result<PathBuf, RangeError> {
    let count = options.input_paths.len();
    if count < 2 {
        return Err(RangeError::TooFewInputs(count));
    }

    // Capture the timestamp up front so the name reflects when the merge began
    let mut output_path = options.output_path_at(Local::now())?;
    if options.output_name.as_deref().map_or(true, |name| name.trim().is_empty()) {
        output_path = next_free_path(&output_path);
    }

    merge_into(&options.input_paths, &output_path)?;
    Ok(output_path)
}

/// Merge `inputs` into a file at exactly `output_path`
///
/// Same guarantees as [`merge_documents`], for callers that choose the
/// destination themselves.
pub fn merge_into(inputs: &[PathBuf], output_path: &Path) -> Result<(), RangeError> {
    if inputs.len() < 2 {
        return Err(RangeError::TooFewInputs(inputs.len()));
    }
    check_not_an_input(inputs, output_path)?;

    let mut merged = merge_pages(inputs)?;
    save_atomically(&mut merged, output_path)?;

    info!(
        inputs = inputs.len(),
        pages = merged.get_pages().len(),
        output = %output_path.display(),
        "merged documents"
    );
    Ok(())
}

/// Load every input and concatenate their pages into one in-memory document
fn merge_pages(inputs: &[PathBuf]) -> Result<Document, RangeError> {
    let mut selections = Vec::with_capacity(inputs.len());
    for path in inputs {
        let source = SourceDocument::open(path)?;
        debug!(path = %path.display(), pages = source.page_count(), "queued for merge");
        selections.push(PageSelection::all(source.document().clone()));
    }

    assemble(selections).map_err(|cause| RangeError::io(&inputs[0], cause))
}
