//! PDF Pages CLI tool
//!
//! A command-line tool for splitting, merging and compressing PDFs.

use anyhow::{bail, Context, Result};
use clap::{ArgAction, Parser, Subcommand};
use glob::glob;
use std::path::{Path, PathBuf};
use std::process;
use tracing::{debug, Level};

use pdf_pages::batch::{self, BatchSummary, Operation, Progress};
use pdf_pages::compress::{ghostscript_version, CompressOptions, Quality};
use pdf_pages::pdf::{extract_metadata, format_file_size, merge_documents, MergeOptions};
use pdf_pages::FileSelection;

/// How many failures are listed at the end of a batch
const ERRORS_SHOWN: usize = 3;

/// PDF Pages - Split, merge and compress PDF files
#[derive(Parser)]
#[command(name = "pdf-pages")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "EXAMPLES:
    # Split into report_pages_1-3.pdf, report_pages_4-6.pdf and report_page_7.pdf
    pdf-pages split report.pdf --ranges \"1-3,4-6,7\"

    # Pull pages 1-2 and 5 of every scan into one <name>_extracted.pdf each
    pdf-pages split \"scan*.pdf\" --ranges \"1-2,5\" --combine

    # Merge in the order given, output named Merged_PDF_<timestamp>.pdf
    pdf-pages merge cover.pdf body.pdf appendix.pdf

    # Merge numbered PDFs under a chosen name and open the folder
    pdf-pages merge \"[0-9]*.pdf\" --name handout --open

    # Compress every PDF in the folder for email
    pdf-pages compress \"*.pdf\" --quality screen")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Split PDF files into one file per page range
    Split {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Page ranges, e.g. "1-3,5" or "1-3, 4-6, 7-10"
        #[arg(short, long)]
        ranges: String,

        /// Put all ranges into one <name>_extracted.pdf per input
        #[arg(long)]
        combine: bool,

        /// Open the output folder afterwards
        #[arg(long)]
        open: bool,
    },

    /// Merge multiple PDF files into one, in the order given
    Merge {
        /// Input PDF files (in order). Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Output file name (".pdf" is added automatically).
        /// Defaults to Merged_PDF_<timestamp>.pdf
        #[arg(short, long)]
        name: Option<String>,

        /// Open the output folder afterwards
        #[arg(long)]
        open: bool,
    },

    /// Compress PDF files with Ghostscript
    Compress {
        /// Input PDF files. Supports glob patterns like "*.pdf"
        #[arg(required = true)]
        inputs: Vec<String>,

        /// Quality preset: screen (72dpi), ebook (150dpi) or printer (300dpi)
        #[arg(short, long, default_value = "ebook")]
        quality: Quality,

        /// Ghostscript executable (found automatically when omitted)
        #[arg(long, env = "PDF_PAGES_GHOSTSCRIPT")]
        ghostscript: Option<PathBuf>,

        /// Open the output folder afterwards
        #[arg(long)]
        open: bool,
    },

    /// Show information about a PDF file
    Info {
        /// PDF file to inspect
        input: PathBuf,
    },
}

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let result = match cli.command {
        Commands::Split { inputs, ranges, combine, open } => cmd_split(inputs, ranges, combine, open),
        Commands::Merge { inputs, name, open } => cmd_merge(inputs, name, open),
        Commands::Compress { inputs, quality, ghostscript, open } => {
            cmd_compress(inputs, quality, ghostscript, open)
        }
        Commands::Info { input } => cmd_info(input),
    };

    if let Err(e) = result {
        eprintln!("Error: {:#}", e);
        process::exit(1);
    }
}

/// Install the stderr log subscriber
fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => Level::WARN,
        1 => Level::DEBUG,
        _ => Level::TRACE,
    };
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// Expand glob patterns in input paths
///
/// Arguments keep their order; the matches of each pattern are sorted.
/// A file named twice is only kept the first time.
fn expand_globs(patterns: Vec<String>) -> Result<Vec<PathBuf>> {
    let mut selection = FileSelection::new();

    for pattern in patterns {
        // Check if pattern contains glob characters
        if pattern.contains('*') || pattern.contains('?') || pattern.contains('[') {
            let mut matches = Vec::new();
            for entry in glob(&pattern).with_context(|| format!("Invalid glob pattern: {}", pattern))? {
                match entry {
                    Ok(path) => matches.push(path),
                    Err(e) => eprintln!("Warning: glob error for {}: {}", pattern, e),
                }
            }
            if matches.is_empty() {
                bail!("No files matched pattern: {}", pattern);
            }
            matches.sort();
            selection.extend(matches);
        } else {
            // No glob characters, treat as literal path
            selection.add(PathBuf::from(pattern));
        }
    }

    Ok(selection.into_paths())
}

/// Fail if any input does not exist
fn check_inputs(inputs: &[PathBuf]) -> Result<()> {
    for path in inputs {
        if !path.exists() {
            bail!("Input file not found: {}", path.display());
        }
    }
    Ok(())
}

/// Open a folder with the system file manager
fn open_folder(path: &Path) -> Result<()> {
    #[cfg(target_os = "macos")]
    {
        std::process::Command::new("open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "linux")]
    {
        std::process::Command::new("xdg-open")
            .arg(path)
            .spawn()?;
    }
    #[cfg(target_os = "windows")]
    {
        std::process::Command::new("explorer")
            .arg(path)
            .spawn()?;
    }
    Ok(())
}

/// Folder holding the first written output
fn output_folder(outputs: &[PathBuf]) -> Option<PathBuf> {
    outputs
        .first()
        .and_then(|p| p.parent())
        .map(|dir| if dir.as_os_str().is_empty() { PathBuf::from(".") } else { dir.to_path_buf() })
}

/// Run a batch on the worker thread, printing progress as it arrives
fn run_batch(inputs: Vec<PathBuf>, operation: Operation) -> Result<BatchSummary> {
    let handle = batch::spawn(inputs, operation);

    for event in handle.events() {
        match event {
            Progress::Started { index, total, path } => {
                let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
                eprintln!("[{}/{}] Processing: {}", index + 1, total, name);
            }
            Progress::Completed { outputs, .. } => {
                for output in outputs {
                    eprintln!("  -> {}", output.display());
                }
            }
            Progress::Failed { message, .. } => {
                eprintln!("  failed: {}", message);
            }
        }
    }

    let summary = handle.wait()?;
    report_summary(&summary)?;
    Ok(summary)
}

/// Print the outcome of a batch; an error if anything failed
fn report_summary(summary: &BatchSummary) -> Result<()> {
    if summary.failures.is_empty() {
        eprintln!("Processed {} files successfully!", summary.succeeded);
        return Ok(());
    }

    eprintln!("Completed with errors. Success: {}", summary.succeeded);
    for (path, error) in summary.failures.iter().take(ERRORS_SHOWN) {
        let name = path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        eprintln!("  {}: {}", name, error);
    }
    if summary.failures.len() > ERRORS_SHOWN {
        eprintln!("  ... and {} more", summary.failures.len() - ERRORS_SHOWN);
    }
    bail!("{} of {} files failed", summary.failures.len(), summary.failures.len() + summary.succeeded)
}

/// Split each input by the same page ranges
fn cmd_split(inputs: Vec<String>, ranges: String, combine: bool, open: bool) -> Result<()> {
    let inputs = expand_globs(inputs)?;
    check_inputs(&inputs)?;

    let operation = if combine {
        Operation::Extract { ranges }
    } else {
        Operation::Split { ranges }
    };
    let summary = run_batch(inputs, operation)?;

    if open {
        if let Some(folder) = output_folder(&summary.outputs) {
            open_folder(&folder)?;
        }
    }

    Ok(())
}

/// Merge multiple PDFs into one
fn cmd_merge(inputs: Vec<String>, name: Option<String>, open: bool) -> Result<()> {
    let inputs = expand_globs(inputs)?;
    check_inputs(&inputs)?;

    eprintln!("Merging {} PDF files...", inputs.len());

    let options = MergeOptions {
        input_paths: inputs,
        output_name: name,
    };
    let output = merge_documents(&options)?;

    eprintln!("Merged to: {}", output.display());

    if open {
        if let Some(folder) = output_folder(&[output]) {
            open_folder(&folder)?;
        }
    }

    Ok(())
}

/// Compress each input with Ghostscript
fn cmd_compress(inputs: Vec<String>, quality: Quality, ghostscript: Option<PathBuf>, open: bool) -> Result<()> {
    let inputs = expand_globs(inputs)?;
    check_inputs(&inputs)?;

    let mut options = CompressOptions {
        ghostscript,
        quality,
        ..Default::default()
    };
    // Resolve once up front so a missing Ghostscript fails before the batch starts
    let gs = options.resolve_ghostscript()?;
    debug!(
        ghostscript = %gs.display(),
        version = ghostscript_version(&gs).as_deref().unwrap_or("unknown"),
        "using ghostscript"
    );
    options.ghostscript = Some(gs);

    let summary = run_batch(inputs, Operation::Compress(options))?;

    if open {
        if let Some(folder) = output_folder(&summary.outputs) {
            open_folder(&folder)?;
        }
    }

    Ok(())
}

/// Show information about a PDF
fn cmd_info(input: PathBuf) -> Result<()> {
    if !input.exists() {
        bail!("Input file not found: {}", input.display());
    }

    let metadata = extract_metadata(&input)?;

    println!("File: {}", input.display());
    println!("Pages: {}", metadata.page_count);
    println!("Size: {}", format_file_size(metadata.file_size));

    if let Some(title) = metadata.title {
        println!("Title: {}", title);
    }
    if let Some(author) = metadata.author {
        println!("Author: {}", author);
    }

    Ok(())
}
