//! Splitting a PDF into one file per page range, or pulling ranges into one

use std::path::{Path, PathBuf};
use lopdf::Document;
use tracing::{info, warn};
use crate::error::RangeError;
use crate::pdf::document::{save_atomically, SourceDocument};
use crate::pdf::pages::{assemble, PageSelection};
use crate::range::{find_overlaps, parse_ranges, PageRange};

/// Build a new document holding pages `range.start..=range.end` of `source`
///
/// The source is left untouched; pages keep their original order.
pub fn extract_pages(source: &SourceDocument, range: PageRange) -> Result<Document, RangeError> {
    check_bounds(source, range)?;

    assemble(vec![PageSelection {
        document: source.document().clone(),
        pages: range.pages().collect(),
    }])
    .map_err(|cause| RangeError::io(source.path(), cause))
}

/// Extract `range` from `source` and write it beside the source
///
/// The output is named `{base}_page_{n}.pdf` for a single page and
/// `{base}_pages_{start}-{end}.pdf` otherwise. Returns the written path.
pub fn extract_range(source: &SourceDocument, range: PageRange) -> Result<PathBuf, RangeError> {
    let mut output = extract_pages(source, range)?;
    let output_path = source
        .directory()
        .join(range.output_file_name(&source.base_name()));

    save_atomically(&mut output, &output_path)?;

    info!(
        source = %source.path().display(),
        range = %range,
        output = %output_path.display(),
        "extracted pages"
    );
    Ok(output_path)
}

/// Split the PDF at `path` into one file per term of `spec`
///
/// The whole range specification is validated against the document's page
/// count before any file is written, so a bad term leaves nothing behind.
///
/// # Example
///
/// ```no_run
/// use pdf_pages::pdf::split_pdf;
/// use std::path::Path;
///
/// // Writes report_pages_1-3.pdf and report_page_5.pdf next to report.pdf
/// let outputs = split_pdf(Path::new("report.pdf"), "1-3,5").expect("Failed to split");
/// assert_eq!(outputs.len(), 2);
/// ```
pub fn split_pdf(path: &Path, spec: &str) -> Result<Vec<PathBuf>, RangeError> {
    let source = SourceDocument::open(path)?;
    let ranges = parse_ranges(spec, source.page_count())?;

    for (a, b) in find_overlaps(&ranges) {
        warn!(
            source = %path.display(),
            "page ranges {} and {} overlap; both files will contain the shared pages",
            ranges[a], ranges[b]
        );
    }

    ranges
        .into_iter()
        .map(|range| extract_range(&source, range))
        .collect()
}

/// Extract every term of `spec` from the PDF at `path` into a single file
///
/// Pages follow the order of the terms, so `"5,1-2"` yields pages 5, 1, 2.
/// A page named by more than one term appears once per term. The output is
/// `{base}_extracted.pdf` beside the source, written atomically once the
/// whole specification has been validated.
pub fn extract_combined(path: &Path, spec: &str) -> Result<PathBuf, RangeError> {
    let source = SourceDocument::open(path)?;
    let ranges = parse_ranges(spec, source.page_count())?;

    // One selection per term; a page repeated across terms needs its own copy
    let selections = ranges
        .iter()
        .map(|range| PageSelection {
            document: source.document().clone(),
            pages: range.pages().collect(),
        })
        .collect();
    let mut output = assemble(selections).map_err(|cause| RangeError::io(path, cause))?;

    let output_path = source
        .directory()
        .join(format!("{}_extracted.pdf", source.base_name()));
    save_atomically(&mut output, &output_path)?;

    info!(
        source = %path.display(),
        terms = ranges.len(),
        output = %output_path.display(),
        "extracted pages into one file"
    );
    Ok(output_path)
}

fn check_bounds(source: &SourceDocument, range: PageRange) -> Result<(), RangeError> {
    if range.start < 1 || range.end > source.page_count() || range.start > range.end {
        return Err(RangeError::OutOfBounds {
            term: range.to_string(),
            page_count: source.page_count(),
        });
    }
    Ok(())
}
