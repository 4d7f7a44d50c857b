//! Running an operation over many files on a background worker
//!
//! [`run`] does the work on the calling thread and reports progress through
//! a callback. [`spawn`] runs the same loop on one worker thread and turns
//! the callbacks into channel events, so a front-end can stay responsive and
//! render progress as it arrives. Cancellation is cooperative: the flag is
//! checked between files, never in the middle of one.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::thread::{self, JoinHandle};
use crossbeam_channel::{unbounded, Receiver};
use tracing::{debug, warn};
use crate::compress::{compress_pdf, CompressOptions};
use crate::error::{Error, Result};
use crate::pdf::{extract_combined, merge_documents, split_pdf, MergeOptions};

/// What to do with the selected files
#[derive(Debug, Clone)]
pub enum Operation {
    /// Compress each file with Ghostscript
    Compress(CompressOptions),
    /// Split each file by the same range specification
    Split { ranges: String },
    /// Pull the same range specification out of each file into one
    /// `{base}_extracted.pdf` per file
    Extract { ranges: String },
    /// Merge all files into one, in order. `input_paths` of the options is
    /// replaced by the batch's file list.
    Merge(MergeOptions),
}

/// Progress reported while a batch runs
#[derive(Debug)]
pub enum Progress {
    /// Work on a file (or, for merge, on the whole list) is starting
    Started {
        index: usize,
        total: usize,
        path: PathBuf,
    },
    /// A file finished and produced these outputs
    Completed {
        index: usize,
        total: usize,
        outputs: Vec<PathBuf>,
    },
    /// A file failed; the batch moves on to the next one
    Failed {
        index: usize,
        total: usize,
        path: PathBuf,
        message: String,
    },
}

/// Final result of a batch
#[derive(Debug, Default)]
pub struct BatchSummary {
    /// Number of files (or merges) that succeeded
    pub succeeded: usize,
    /// Every file written, in the order produced
    pub outputs: Vec<PathBuf>,
    /// Inputs that failed, with the reason
    pub failures: Vec<(PathBuf, Error)>,
    /// Whether the run stopped early on request
    pub cancelled: bool,
}

impl BatchSummary {
    /// True when nothing failed and the run was not cancelled
    pub fn is_clean(&self) -> bool {
        self.failures.is_empty() && !self.cancelled
    }
}

/// Run `operation` over `files` on the current thread
///
/// `cancel` is checked before each file; once set, the remaining files are
/// skipped and the summary is marked cancelled. Per-file failures are
/// collected, not returned early.
pub fn run<F>(files: Vec<PathBuf>, operation: &Operation, cancel: &AtomicBool, on_progress: F) -> BatchSummary
where
    F: FnMut(Progress),
{
    match operation {
        Operation::Merge(options) => run_merge(files, options, cancel, on_progress),
        Operation::Compress(options) => run_each(files, cancel, on_progress, |path| {
            compress_pdf(path, options).map(|report| vec![report.output])
        }),
        Operation::Split { ranges } => run_each(files, cancel, on_progress, |path| {
            split_pdf(path, ranges).map_err(Error::from)
        }),
        Operation::Extract { ranges } => run_each(files, cancel, on_progress, |path| {
            extract_combined(path, ranges)
                .map(|output| vec![output])
                .map_err(Error::from)
        }),
    }
}

/// A merge is one unit of work over the whole list
fn run_merge<F>(files: Vec<PathBuf>, options: &MergeOptions, cancel: &AtomicBool, mut on_progress: F) -> BatchSummary
where
    F: FnMut(Progress),
{
    let mut summary = BatchSummary::default();
    if cancel.load(Ordering::Relaxed) {
        summary.cancelled = true;
        return summary;
    }

    let options = MergeOptions {
        input_paths: files,
        ..options.clone()
    };
    let first = options.input_paths.first().cloned().unwrap_or_default();
    on_progress(Progress::Started { index: 0, total: 1, path: first.clone() });

    match merge_documents(&options) {
        Ok(output) => {
            summary.succeeded = 1;
            summary.outputs.push(output.clone());
            on_progress(Progress::Completed { index: 0, total: 1, outputs: vec![output] });
        }
        Err(e) => {
            let error = Error::from(e);
            warn!(error = %error, "merge failed");
            on_progress(Progress::Failed {
                index: 0,
                total: 1,
                path: first.clone(),
                message: error.to_string(),
            });
            summary.failures.push((first, error));
        }
    }
    summary
}

/// Apply `process` to each file in turn
fn run_each<F, P>(files: Vec<PathBuf>, cancel: &AtomicBool, mut on_progress: F, mut process: P) -> BatchSummary
where
    F: FnMut(Progress),
    P: FnMut(&Path) -> Result<Vec<PathBuf>>,
{
    let mut summary = BatchSummary::default();
    let total = files.len();

    for (index, path) in files.into_iter().enumerate() {
        if cancel.load(Ordering::Relaxed) {
            debug!(remaining = total - index, "batch cancelled");
            summary.cancelled = true;
            break;
        }

        on_progress(Progress::Started { index, total, path: path.clone() });

        match process(&path) {
            Ok(outputs) => {
                summary.succeeded += 1;
                summary.outputs.extend(outputs.iter().cloned());
                on_progress(Progress::Completed { index, total, outputs });
            }
            Err(e) => {
                warn!(path = %path.display(), error = %e, "batch item failed");
                on_progress(Progress::Failed {
                    index,
                    total,
                    path: path.clone(),
                    message: e.to_string(),
                });
                summary.failures.push((path, e));
            }
        }
    }

    summary
}

/// Handle to a batch running on a worker thread
#[derive(Debug)]
pub struct BatchHandle {
    events: Receiver<Progress>,
    cancel: Arc<AtomicBool>,
    worker: JoinHandle<BatchSummary>,
}

impl BatchHandle {
    /// Progress events; the channel closes when the worker finishes
    pub fn events(&self) -> &Receiver<Progress> {
        &self.events
    }

    /// Ask the worker to stop before the next file
    pub fn cancel(&self) {
        self.cancel.store(true, Ordering::Relaxed);
    }

    /// Wait for the worker and take its summary
    pub fn wait(self) -> Result<BatchSummary> {
        self.worker
            .join()
            .map_err(|_| Error::General("batch worker panicked".to_string()))
    }
}

/// Start `operation` over `files` on a background worker thread
///
/// # Example
///
/// ```no_run
/// use pdf_pages::batch::{spawn, Operation, Progress};
/// use std::path::PathBuf;
///
/// let handle = spawn(
///     vec![PathBuf::from("a.pdf"), PathBuf::from("b.pdf")],
///     Operation::Split { ranges: "1-2".to_string() },
/// );
/// for event in handle.events() {
///     if let Progress::Started { index, total, path } = event {
///         eprintln!("[{}/{}] {}", index + 1, total, path.display());
///     }
/// }
/// let summary = handle.wait().expect("worker panicked");
/// assert!(summary.is_clean());
/// ```
pub fn spawn(files: Vec<PathBuf>, operation: Operation) -> BatchHandle {
    let (sender, events) = unbounded();
    let cancel = Arc::new(AtomicBool::new(false));
    let worker_cancel = Arc::clone(&cancel);

    let worker = thread::spawn(move || {
        run(files, &operation, &worker_cancel, |event| {
            // The receiver may have been dropped; the batch still runs to completion
            let _ = sender.send(event);
        })
    });

    BatchHandle {
        events,
        cancel,
        worker,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_failures_are_collected() {
        let cancel = AtomicBool::new(false);
        let mut events = Vec::new();
        let summary = run(
            vec![PathBuf::from("missing1.pdf"), PathBuf::from("missing2.pdf")],
            &Operation::Split { ranges: "1".to_string() },
            &cancel,
            |event| events.push(event),
        );

        assert_eq!(summary.succeeded, 0);
        assert_eq!(summary.failures.len(), 2);
        assert!(!summary.cancelled);
        assert_eq!(events.len(), 4);
        assert!(matches!(events[0], Progress::Started { index: 0, total: 2, .. }));
        assert!(matches!(events[3], Progress::Failed { index: 1, total: 2, .. }));
    }

    #[test]
    fn test_cancelled_before_start_does_nothing() {
        let cancel = AtomicBool::new(true);
        let mut events = 0;
        let summary = run(
            vec![PathBuf::from("a.pdf")],
            &Operation::Split { ranges: "1".to_string() },
            &cancel,
            |_| events += 1,
        );

        assert!(summary.cancelled);
        assert_eq!(events, 0);
        assert!(summary.failures.is_empty());
    }

    #[test]
    fn test_merge_with_one_file_fails_once() {
        let cancel = AtomicBool::new(false);
        let summary = run(
            vec![PathBuf::from("only.pdf")],
            &Operation::Merge(MergeOptions::default()),
            &cancel,
            |_| {},
        );

        assert_eq!(summary.failures.len(), 1);
        assert!(matches!(
            summary.failures[0].1,
            Error::Range(crate::error::RangeError::TooFewInputs(1))
        ));
    }

    #[test]
    fn test_spawn_reports_through_channel() {
        let handle = spawn(
            vec![PathBuf::from("missing.pdf")],
            Operation::Split { ranges: "1".to_string() },
        );

        let events: Vec<Progress> = handle.events().iter().collect();
        let summary = handle.wait().unwrap();

        assert_eq!(events.len(), 2);
        assert_eq!(summary.failures.len(), 1);
        assert!(!summary.is_clean());
    }
}
