//! PDF compression through Ghostscript
//!
//! Compression is delegated to an external `gs` process using the
//! `pdfwrite` device. Nothing else in the crate depends on this module.

use std::ffi::OsString;
use std::fmt;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::str::FromStr;
use std::thread;
use std::time::{Duration, Instant};
use glob::glob;
use tracing::{debug, info, warn};
use crate::error::{Error, Result};
use crate::pdf::document::{base_name, parent_dir};

/// How long a single Ghostscript run may take before it is killed
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(300);

/// Ghostscript failure output is cut to this many characters
const STDERR_LIMIT: usize = 200;

/// Executable names tried on PATH, in order
const GHOSTSCRIPT_NAMES: [&str; 3] = ["gswin64c", "gswin32c", "gs"];

/// Ghostscript `-dPDFSETTINGS` preset
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Quality {
    /// 72 dpi. Smallest file, good for email and the web
    Screen,
    /// 150 dpi. Medium quality
    #[default]
    Ebook,
    /// 300 dpi. High quality, good for printing
    Printer,
}

impl Quality {
    /// Preset name as Ghostscript spells it
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Screen => "screen",
            Self::Ebook => "ebook",
            Self::Printer => "printer",
        }
    }
}

impl fmt::Display for Quality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quality {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "screen" => Ok(Self::Screen),
            "ebook" => Ok(Self::Ebook),
            "printer" => Ok(Self::Printer),
            _ => Err(Error::General(format!(
                "Invalid quality: {}. Must be one of: screen, ebook, printer",
                s
            ))),
        }
    }
}

/// Options for compressing PDFs
#[derive(Debug, Clone)]
pub struct CompressOptions {
    /// Ghostscript executable; located automatically when unset
    pub ghostscript: Option<PathBuf>,
    /// Quality preset
    pub quality: Quality,
    /// Per-file time limit
    pub timeout: Duration,
}

impl Default for CompressOptions {
    fn default() -> Self {
        Self {
            ghostscript: None,
            quality: Quality::default(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl CompressOptions {
    /// The configured executable, or the first one found on this system
    pub fn resolve_ghostscript(&self) -> Result<PathBuf> {
        match &self.ghostscript {
            Some(path) => Ok(path.clone()),
            None => find_ghostscript().ok_or(Error::GhostscriptNotFound),
        }
    }
}

/// Outcome of compressing one file
#[derive(Debug, Clone)]
pub struct CompressionReport {
    /// File that was compressed
    pub input: PathBuf,
    /// Compressed file written beside it
    pub output: PathBuf,
    /// Input size in bytes
    pub original_size: u64,
    /// Output size in bytes
    pub compressed_size: u64,
}

impl CompressionReport {
    /// Size reduction in percent; negative if the file grew
    pub fn reduction_percent(&self) -> f64 {
        if self.original_size == 0 {
            return 0.0;
        }
        (self.original_size as f64 - self.compressed_size as f64) / self.original_size as f64 * 100.0
    }
}

/// Locate a Ghostscript executable
///
/// Looks on `PATH` first, then in the usual install locations on Windows
/// (newest version wins) and macOS.
pub fn find_ghostscript() -> Option<PathBuf> {
    if let Some(path) = search_path(&GHOSTSCRIPT_NAMES) {
        return Some(path);
    }

    if cfg!(target_os = "windows") {
        let mut patterns = vec![
            r"C:\Program Files\gs\*\bin\gswin64c.exe".to_string(),
            r"C:\Program Files (x86)\gs\*\bin\gswin32c.exe".to_string(),
        ];
        if let Some(local) = std::env::var_os("LOCALAPPDATA") {
            patterns.push(format!(
                r"{}\Programs\gs\*\bin\gswin64c.exe",
                Path::new(&local).display()
            ));
        }
        for pattern in patterns {
            let Ok(entries) = glob(&pattern) else { continue };
            let mut matches: Vec<PathBuf> = entries.filter_map(|entry| entry.ok()).collect();
            matches.sort();
            if let Some(newest) = matches.pop() {
                return Some(newest);
            }
        }
    } else if cfg!(target_os = "macos") {
        for candidate in ["/usr/local/bin/gs", "/opt/homebrew/bin/gs"] {
            let path = PathBuf::from(candidate);
            if path.is_file() {
                return Some(path);
            }
        }
    }

    None
}

/// First of `names` found as a file in a `PATH` directory
fn search_path(names: &[&str]) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    let suffix = if cfg!(target_os = "windows") { ".exe" } else { "" };

    for name in names {
        for dir in std::env::split_paths(&path_var) {
            let candidate = dir.join(format!("{}{}", name, suffix));
            if candidate.is_file() {
                return Some(candidate);
            }
        }
    }
    None
}

/// Version string reported by `gs --version`
pub fn ghostscript_version(ghostscript: &Path) -> Option<String> {
    let output = Command::new(ghostscript).arg("--version").output().ok()?;
    if !output.status.success() {
        return None;
    }
    let version = String::from_utf8_lossy(&output.stdout).trim().to_string();
    (!version.is_empty()).then_some(version)
}

/// Where the compressed copy of `input` is written: `{base}_compressed.pdf`
pub fn compressed_output_path(input: &Path) -> PathBuf {
    parent_dir(input).join(format!("{}_compressed.pdf", base_name(input)))
}

/// Ghostscript arguments for compressing `input` into `output`
pub fn compress_args(input: &Path, output: &Path, quality: Quality) -> Vec<OsString> {
    let mut out_flag = OsString::from("-sOutputFile=");
    out_flag.push(output);

    vec![
        "-sDEVICE=pdfwrite".into(),
        "-dCompatibilityLevel=1.4".into(),
        format!("-dPDFSETTINGS=/{}", quality).into(),
        "-dNOPAUSE".into(),
        "-dBATCH".into(),
        out_flag,
        input.as_os_str().to_os_string(),
    ]
}

/// Compress `input` into `{base}_compressed.pdf` beside it
///
/// # Example
///
/// ```no_run
/// use pdf_pages::compress::{compress_pdf, CompressOptions, Quality};
/// use std::path::Path;
///
/// let options = CompressOptions { quality: Quality::Screen, ..Default::default() };
/// let report = compress_pdf(Path::new("scan.pdf"), &options).expect("Failed to compress");
/// println!("{:.1}% smaller", report.reduction_percent());
/// ```
pub fn compress_pdf(input: &Path, options: &CompressOptions) -> Result<CompressionReport> {
    if !input.is_file() {
        return Err(Error::FileNotFound(input.to_path_buf()));
    }

    let ghostscript = options.resolve_ghostscript()?;
    let output = compressed_output_path(input);
    let original_size = std::fs::metadata(input)?.len();

    debug!(
        ghostscript = %ghostscript.display(),
        input = %input.display(),
        quality = %options.quality,
        "running ghostscript"
    );

    let result = run_ghostscript(
        &ghostscript,
        compress_args(input, &output, options.quality),
        input,
        options.timeout,
    );

    if let Err(e) = result {
        let _ = std::fs::remove_file(&output);
        return Err(e);
    }

    let compressed_size = match std::fs::metadata(&output) {
        Ok(meta) if meta.len() > 0 => meta.len(),
        _ => {
            warn!(output = %output.display(), "ghostscript produced no output");
            let _ = std::fs::remove_file(&output);
            return Err(Error::EmptyOutput(output));
        }
    };

    let report = CompressionReport {
        input: input.to_path_buf(),
        output,
        original_size,
        compressed_size,
    };

    info!(
        output = %report.output.display(),
        reduction = %format!("{:.1}%", report.reduction_percent()),
        "compressed"
    );
    Ok(report)
}

/// Run Ghostscript, killing it once `timeout` passes
fn run_ghostscript(
    ghostscript: &Path,
    args: Vec<OsString>,
    input: &Path,
    timeout: Duration,
) -> Result<()> {
    let mut child = Command::new(ghostscript)
        .args(args)
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::piped())
        .spawn()?;

    // Drain stderr on its own thread so a chatty gs never blocks on a full pipe
    let stderr = child.stderr.take();
    let reader = thread::spawn(move || {
        let mut buf = String::new();
        if let Some(mut stderr) = stderr {
            let _ = stderr.read_to_string(&mut buf);
        }
        buf
    });

    let deadline = Instant::now() + timeout;
    let status = loop {
        if let Some(status) = child.try_wait()? {
            break status;
        }
        if Instant::now() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            let _ = reader.join();
            return Err(Error::GhostscriptTimeout {
                path: input.to_path_buf(),
                secs: timeout.as_secs(),
            });
        }
        thread::sleep(Duration::from_millis(50));
    };

    let stderr = reader.join().unwrap_or_default();
    if !status.success() {
        return Err(Error::Ghostscript {
            path: input.to_path_buf(),
            stderr: stderr.trim().chars().take(STDERR_LIMIT).collect(),
        });
    }

    Ok(())
}
