// Result reporting. Only successful uploads are persisted (the file is a
// list of usable links); failures are still counted in the summary.

use chrono::{DateTime, Utc};
use serde::Serialize;
use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use crate::batch::{BatchResult, UploadOutcome};
use crate::error::AppError;

/// One persisted entry.
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ReportEntry {
    pub filename: String,
    pub url: String,
    #[serde(rename = "deleteUrl")]
    pub delete_url: String,
}

/// Successful uploads of one run, in upload order.
#[derive(Serialize, Debug, Clone, Default, PartialEq, Eq)]
#[serde(transparent)]
pub struct BatchReport {
    pub entries: Vec<ReportEntry>,
}

/// Keep the `Success` outcomes, preserving order.
pub fn summarize(batch: &BatchResult) -> BatchReport {
    let entries = batch
        .outcomes
        .iter()
        .filter_map(|outcome| match outcome {
            UploadOutcome::Success {
                filename,
                url,
                delete_url,
            } => Some(ReportEntry {
                filename: filename.clone(),
                url: url.clone(),
                delete_url: delete_url.clone(),
            }),
            UploadOutcome::Failure { .. } => None,
        })
        .collect();
    BatchReport { entries }
}

/// Serialize `report` into `sink` as a pretty-printed JSON array.
pub fn persist<W: Write>(report: &BatchReport, mut sink: W) -> io::Result<()> {
    serde_json::to_writer_pretty(&mut sink, report).map_err(io::Error::from)?;
    sink.flush()
}

/// Deterministic results file name for a run started at `at`.
pub fn report_file_name(at: DateTime<Utc>) -> String {
    format!("upload_results_{}.json", at.timestamp_millis())
}

/// Write the report to a fresh file in `dir`. Refuses to overwrite.
pub fn write_report_file(
    report: &BatchReport,
    dir: &Path,
    at: DateTime<Utc>,
) -> Result<PathBuf, AppError> {
    let path = dir.join(report_file_name(at));
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .map_err(|err| AppError::Persistence {
            path: path.clone(),
            err,
        })?;
    persist(report, file).map_err(|err| AppError::Persistence {
        path: path.clone(),
        err,
    })?;
    Ok(path)
}

/// Human-readable summary of a run.
pub fn display<W: Write>(batch: &BatchResult, mut out: W) -> io::Result<()> {
    writeln!(out, "======================")?;
    if batch.cancelled {
        writeln!(out, "Batch Upload Cancelled")?;
    } else {
        writeln!(out, "Batch Upload Complete!")?;
    }
    writeln!(out, "======================")?;
    writeln!(out, "Total files processed: {}", batch.total())?;
    if batch.cancelled {
        writeln!(out, "Not attempted: {}", batch.scheduled - batch.total())?;
    }
    writeln!(out, "Successful uploads: {}", batch.succeeded())?;
    writeln!(out, "Failed uploads: {}", batch.failed())?;
    Ok(())
}
