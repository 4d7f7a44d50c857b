//! Page range parsing
//!
//! Turns a user-supplied range string such as `"1-3, 5, 7-10"` into an
//! ordered list of inclusive, 1-indexed page intervals, validated against
//! a document's page count.

use std::fmt;
use crate::error::RangeError;

/// An inclusive, 1-indexed page interval
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PageRange {
    /// First page (1-indexed)
    pub start: u32,
    /// Last page (1-indexed, inclusive)
    pub end: u32,
}

impl PageRange {
    /// A range covering a single page
    pub fn single(page: u32) -> Self {
        Self { start: page, end: page }
    }

    /// Whether the range covers exactly one page
    pub fn is_single(&self) -> bool {
        self.start == self.end
    }

    /// Number of pages in the range; zero for a backwards range
    pub fn page_count(&self) -> u32 {
        if self.end < self.start {
            return 0;
        }
        (self.end - self.start).saturating_add(1)
    }

    /// Iterate the 1-indexed page numbers in ascending order
    pub fn pages(&self) -> impl Iterator<Item = u32> {
        self.start..=self.end
    }

    /// Whether two ranges share at least one page
    pub fn overlaps(&self, other: &PageRange) -> bool {
        self.start <= other.end && other.start <= self.end
    }

    /// Output file name for this range cut from a document named `base`
    ///
    /// `report_page_5.pdf` for a single page, `report_pages_1-3.pdf` otherwise.
    pub fn output_file_name(&self, base: &str) -> String {
        if self.is_single() {
            format!("{}_page_{}.pdf", base, self.start)
        } else {
            format!("{}_pages_{}-{}.pdf", base, self.start, self.end)
        }
    }
}

impl fmt::Display for PageRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_single() {
            write!(f, "{}", self.start)
        } else {
            write!(f, "{}-{}", self.start, self.end)
        }
    }
}

/// Parse a range specification against a document with `page_count` pages
///
/// Supported terms, separated by commas:
/// - `"5"` → page 5
/// - `"1-3"` → pages 1 through 3
///
/// Terms are returned in the order given. Overlapping or repeated terms are
/// kept as-is, so `"1-3,2-4"` yields two intervals that share pages 2 and 3.
/// The first invalid term, scanning left to right, is reported.
///
/// # Example
///
/// ```
/// use pdf_pages::range::{parse_ranges, PageRange};
///
/// let ranges = parse_ranges("1-3, 5", 10).unwrap();
/// assert_eq!(ranges, vec![PageRange { start: 1, end: 3 }, PageRange::single(5)]);
/// ```
pub fn parse_ranges(spec: &str, page_count: u32) -> Result<Vec<PageRange>, RangeError> {
    spec.split(',')
        .map(|term| parse_term(term.trim(), page_count))
        .collect()
}

/// Parse and bounds-check one term
fn parse_term(term: &str, page_count: u32) -> Result<PageRange, RangeError> {
    let (start, end) = match term.split_once('-') {
        Some((start, end)) => (parse_page(start, term)?, parse_page(end, term)?),
        None => {
            let page = parse_page(term, term)?;
            (page, page)
        }
    };

    if start < 1 || end > page_count || start > end {
        return Err(RangeError::OutOfBounds {
            term: term.to_string(),
            page_count,
        });
    }

    Ok(PageRange { start, end })
}

/// Parse one side of a term; digits only, surrounding spaces allowed
fn parse_page(part: &str, term: &str) -> Result<u32, RangeError> {
    let part = part.trim();
    if part.is_empty() || !part.bytes().all(|b| b.is_ascii_digit()) {
        return Err(RangeError::NotANumber { term: term.to_string() });
    }

    // Digits only, so the sole remaining failure is overflow
    part.parse()
        .map_err(|_| RangeError::NotANumber { term: term.to_string() })
}

/// Pairs of term indices whose ranges overlap
///
/// Overlaps are legal but usually a typo, so callers may want to warn.
pub fn find_overlaps(ranges: &[PageRange]) -> Vec<(usize, usize)> {
    let mut overlaps = Vec::new();
    for (i, a) in ranges.iter().enumerate() {
        for (j, b) in ranges.iter().enumerate().skip(i + 1) {
            if a.overlaps(b) {
                overlaps.push((i, j));
            }
        }
    }
    overlaps
}
