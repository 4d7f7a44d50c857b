//! PDF metadata extraction

use std::path::Path;
use lopdf::{Document, Object};
use crate::error::RangeError;
use crate::pdf::document::SourceDocument;

/// PDF metadata
#[derive(Debug, Clone)]
pub struct PdfMetadata {
    /// Number of pages in the PDF
    pub page_count: u32,
    /// Document title (if present)
    pub title: Option<String>,
    /// Document author (if present)
    pub author: Option<String>,
    /// Size of the file on disk in bytes
    pub file_size: u64,
}

/// Extract metadata from a PDF file
pub fn extract_metadata(path: &Path) -> Result<PdfMetadata, RangeError> {
    let source = SourceDocument::open(path)?;
    let file_size = std::fs::metadata(path)
        .map_err(|e| RangeError::io(path, e))?
        .len();

    Ok(PdfMetadata {
        page_count: source.page_count(),
        title: info_string(source.document(), b"Title"),
        author: info_string(source.document(), b"Author"),
        file_size,
    })
}

/// Count the number of pages in a PDF file
pub fn count_pages(path: &Path) -> Result<u32, RangeError> {
    Ok(SourceDocument::open(path)?.page_count())
}

/// Read a text entry from the document's Info dictionary
fn info_string(doc: &Document, key: &[u8]) -> Option<String> {
    let info = match doc.trailer.get(b"Info").ok()? {
        Object::Reference(id) => doc.get_dictionary(*id).ok()?,
        Object::Dictionary(dict) => dict,
        _ => return None,
    };

    let bytes = info.get(key).ok()?.as_str().ok()?;
    decode_text_string(bytes)
}

/// Decode a PDF text string: UTF-16BE with a byte order mark, else UTF-8
fn decode_text_string(bytes: &[u8]) -> Option<String> {
    if let Some(utf16) = bytes.strip_prefix(&[0xFE, 0xFF]) {
        let units: Vec<u16> = utf16
            .chunks_exact(2)
            .map(|pair| u16::from_be_bytes([pair[0], pair[1]]))
            .collect();
        return String::from_utf16(&units).ok();
    }
    String::from_utf8(bytes.to_vec()).ok()
}

/// Human-readable file size, e.g. `1.5 MB`
pub fn format_file_size(bytes: u64) -> String {
    const UNITS: [&str; 4] = ["B", "KB", "MB", "GB"];
    let mut size = bytes as f64;
    let mut unit = 0;
    while size >= 1024.0 && unit < UNITS.len() - 1 {
        size /= 1024.0;
        unit += 1;
    }
    if unit == 0 {
        format!("{} {}", bytes, UNITS[0])
    } else {
        format!("{:.1} {}", size, UNITS[unit])
    }
}
