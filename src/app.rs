// Top-level run: validate the source folder, scan it, upload the batch,
// then persist and summarize. `main` only builds the collaborators and
// maps the outcome to an exit code.

use anyhow::Result;
use chrono::Utc;
use log::{info, warn};
use std::io::{self, Write};
use std::path::PathBuf;

use crate::api::Uploader;
use crate::batch::{BatchResult, BatchUploader, CancelFlag, ProgressSink};
use crate::config::Config;
use crate::error::AppError;
use crate::report::{self, BatchReport};
use crate::scan::{self, SUPPORTED_FORMATS};

/// What a completed run produced.
#[derive(Debug)]
pub struct RunSummary {
    pub result: BatchResult,
    pub report: BatchReport,
    /// `None` when no eligible files were found and nothing was written.
    pub report_path: Option<PathBuf>,
}

/// Console output that never fails the run. The first write error is
/// logged and everything after it is dropped.
struct Console<W: Write> {
    out: W,
    broken: bool,
}

impl<W: Write> Console<W> {
    fn new(out: W) -> Self {
        Console { out, broken: false }
    }

    fn emit<F>(&mut self, f: F)
    where
        F: FnOnce(&mut W) -> io::Result<()>,
    {
        if self.broken {
            return;
        }
        if let Err(e) = f(&mut self.out).and_then(|()| self.out.flush()) {
            warn!("Console output stopped: {e}");
            self.broken = true;
        }
    }
}

/// Execute one batch. Only the fatal conditions (`AppError`) come back as
/// errors; console failures are logged and ignored.
pub fn run<U, P, W>(
    config: &Config,
    uploader: &U,
    progress: &P,
    cancel: CancelFlag,
    out: W,
) -> Result<RunSummary>
where
    U: Uploader + ?Sized,
    P: ProgressSink + ?Sized,
    W: Write,
{
    let mut console = Console::new(out);

    let folder = std::fs::canonicalize(&config.source_dir)
        .map_err(|e| AppError::directory(&config.source_dir, e))?;
    console.emit(|o| writeln!(o, "Scanning folder: {}", folder.display()));

    let files = scan::scan(&folder)?;
    if files.is_empty() {
        console.emit(|o| {
            writeln!(o, "No image files found in the specified folder")?;
            writeln!(o, "Supported formats: {}", SUPPORTED_FORMATS.join(", "))
        });
        return Ok(RunSummary {
            result: BatchResult::default(),
            report: BatchReport::default(),
            report_path: None,
        });
    }

    console.emit(|o| {
        writeln!(o, "Found {} image file(s)", files.len())?;
        writeln!(o, "Starting batch upload...")?;
        writeln!(o)
    });

    let result = BatchUploader::new(uploader, progress)
        .with_cancel(cancel)
        .run(&files, &config.credential);
    let report = report::summarize(&result);

    // Saved before anything else is printed so the links survive a dead console.
    let saved = report::write_report_file(&report, &config.output_dir, Utc::now());
    if let Ok(path) = &saved {
        info!("Wrote {} entries to {}", report.entries.len(), path.display());
    }

    console.emit(|o| report::display(&result, o));
    if let Ok(path) = &saved {
        console.emit(|o| writeln!(o, "Results saved to: {}", path.display()));
    }
    // Printed even when saving failed.
    console.emit(|o| {
        writeln!(o)?;
        writeln!(o, "JSON Output:")?;
        report::persist(&report, &mut *o)?;
        writeln!(o)
    });

    let report_path = Some(saved?);
    Ok(RunSummary {
        result,
        report,
        report_path,
    })
}
