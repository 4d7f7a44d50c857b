//! Ordered list of input files
//!
//! The front-end builds one of these as the user picks files, then hands
//! the paths over by value to a merge or batch run.

use std::path::{Path, PathBuf};

/// User-ordered set of input paths without duplicates
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileSelection {
    paths: Vec<PathBuf>,
}

impl FileSelection {
    /// An empty selection
    pub fn new() -> Self {
        Self::default()
    }

    /// Append `path` unless it is already selected. Returns whether it was added.
    pub fn add(&mut self, path: impl Into<PathBuf>) -> bool {
        let path = path.into();
        if self.contains(&path) {
            return false;
        }
        self.paths.push(path);
        true
    }

    /// Append every path in order, skipping duplicates. Returns how many were added.
    pub fn extend<I, P>(&mut self, paths: I) -> usize
    where
        I: IntoIterator<Item = P>,
        P: Into<PathBuf>,
    {
        paths.into_iter().map(|p| self.add(p)).filter(|added| *added).count()
    }

    /// Remove and return the path at `index`
    pub fn remove(&mut self, index: usize) -> Option<PathBuf> {
        (index < self.paths.len()).then(|| self.paths.remove(index))
    }

    /// Swap the path at `index` with the one before it. Returns the new index.
    pub fn move_up(&mut self, index: usize) -> Option<usize> {
        if index == 0 || index >= self.paths.len() {
            return None;
        }
        self.paths.swap(index, index - 1);
        Some(index - 1)
    }

    /// Swap the path at `index` with the one after it. Returns the new index.
    pub fn move_down(&mut self, index: usize) -> Option<usize> {
        if index + 1 >= self.paths.len() {
            return None;
        }
        self.paths.swap(index, index + 1);
        Some(index + 1)
    }

    /// Drop every path
    pub fn clear(&mut self) {
        self.paths.clear();
    }

    pub fn contains(&self, path: &Path) -> bool {
        self.paths.iter().any(|p| p == path)
    }

    pub fn len(&self) -> usize {
        self.paths.len()
    }

    pub fn is_empty(&self) -> bool {
        self.paths.is_empty()
    }

    pub fn paths(&self) -> &[PathBuf] {
        &self.paths
    }

    /// Hand the ordered paths over to an operation
    pub fn into_paths(self) -> Vec<PathBuf> {
        self.paths
    }
}
