//! Loading source documents and writing outputs

use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use lopdf::{Document, ObjectId};
use tracing::debug;
use crate::error::{FailureCause, RangeError};

/// A PDF loaded from disk, with its page list resolved
///
/// The page list is read once at load time; it is what ranges are checked
/// against and what extraction copies from.
#[derive(Debug, Clone)]
pub struct SourceDocument {
    path: PathBuf,
    document: Document,
    page_ids: Vec<ObjectId>,
}

impl SourceDocument {
    /// Load a PDF, failing if it is missing, unreadable or has no pages
    pub fn open(path: &Path) -> Result<Self, RangeError> {
        if !path.exists() {
            return Err(RangeError::io(
                path,
                std::io::Error::new(ErrorKind::NotFound, "file not found"),
            ));
        }

        let document = Document::load(path).map_err(|e| RangeError::io(path, e))?;
        let page_ids: Vec<ObjectId> = document.get_pages().into_values().collect();

        if page_ids.is_empty() {
            return Err(RangeError::io(
                path,
                FailureCause::Malformed("document has no pages".to_string()),
            ));
        }

        debug!(path = %path.display(), pages = page_ids.len(), "loaded source document");

        Ok(Self {
            path: path.to_path_buf(),
            document,
            page_ids,
        })
    }

    /// Path the document was loaded from
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Number of pages
    pub fn page_count(&self) -> u32 {
        self.page_ids.len() as u32
    }

    /// Object ids of the pages, in page order
    pub fn page_ids(&self) -> &[ObjectId] {
        &self.page_ids
    }

    /// The parsed document
    pub fn document(&self) -> &Document {
        &self.document
    }

    /// File name without directory or extension, used to name outputs
    pub fn base_name(&self) -> String {
        base_name(&self.path)
    }

    /// Directory outputs derived from this document are written to
    pub fn directory(&self) -> PathBuf {
        parent_dir(&self.path)
    }
}

/// File stem of `path`, or `"document"` if it has none
pub(crate) fn base_name(path: &Path) -> String {
    path.file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| "document".to_string())
}

/// Directory containing `path`; `.` for bare file names
pub(crate) fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Save `doc` to `path` without ever exposing a partial file
///
/// The document is written to a temporary file in the destination directory
/// and renamed over `path` once fully written. On any failure the temporary
/// file is removed and `path` is left untouched.
pub(crate) fn save_atomically(doc: &mut Document, path: &Path) -> Result<(), RangeError> {
    let dir = parent_dir(path);

    let mut temp = tempfile::Builder::new()
        .prefix(".pdf-pages-")
        .suffix(".part")
        .tempfile_in(&dir)
        .map_err(|e| RangeError::io(path, e))?;

    doc.save_to(&mut temp).map_err(|e| RangeError::io(path, e))?;
    temp.as_file().sync_all().map_err(|e| RangeError::io(path, e))?;

    temp.persist(path).map_err(|e| RangeError::io(path, e.error))?;

    debug!(path = %path.display(), "output written");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_open_missing_file() {
        let err = SourceDocument::open(Path::new("nonexistent.pdf")).unwrap_err();
        match err {
            RangeError::IoFailure { path, cause: FailureCause::Io(e) } => {
                assert_eq!(path, Path::new("nonexistent.pdf"));
                assert_eq!(e.kind(), ErrorKind::NotFound);
            }
            other => panic!("expected IoFailure, got {:?}", other),
        }
    }

    #[test]
    fn test_open_garbage_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("garbage.pdf");
        std::fs::write(&path, b"this is not a pdf").unwrap();

        let err = SourceDocument::open(&path).unwrap_err();
        assert!(matches!(err, RangeError::IoFailure { ref path, .. } if path.ends_with("garbage.pdf")));
    }

    #[test]
    fn test_base_name_and_parent_dir() {
        assert_eq!(base_name(Path::new("/tmp/report.final.pdf")), "report.final");
        assert_eq!(parent_dir(Path::new("/tmp/report.pdf")), PathBuf::from("/tmp"));
        assert_eq!(parent_dir(Path::new("report.pdf")), PathBuf::from("."));
    }
}
