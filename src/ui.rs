// UI layer: console rendering of batch progress. Per-file lines go to
// stdout; an indicatif spinner runs while an upload is in flight.

use crossterm::style::Stylize;
use indicatif::{ProgressBar, ProgressStyle};
use log::warn;
use std::fmt;
use std::io::{self, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use crate::batch::{BatchEvent, ProgressSink};

/// Prints `Progress: i/n (pct%) - name` before each upload and a ✓/✗ line
/// after it. With `quiet` set every event is ignored. A closed console
/// never interrupts the batch: the first write error is logged and later
/// lines are dropped.
pub struct ConsoleProgress {
    quiet: bool,
    writer: Mutex<Box<dyn Write + Send>>,
    broken: AtomicBool,
    spinner: Mutex<Option<ProgressBar>>,
}

impl ConsoleProgress {
    /// Progress on stdout.
    pub fn stdout(quiet: bool) -> Self {
        Self::new(Box::new(io::stdout()), quiet)
    }

    pub fn new(writer: Box<dyn Write + Send>, quiet: bool) -> Self {
        ConsoleProgress {
            quiet,
            writer: Mutex::new(writer),
            broken: AtomicBool::new(false),
            spinner: Mutex::new(None),
        }
    }

    fn say(&self, line: fmt::Arguments<'_>) {
        if self.broken.load(Ordering::Relaxed) {
            return;
        }
        let written = match self.writer.lock() {
            Ok(mut w) => writeln!(w, "{line}").and_then(|()| w.flush()),
            Err(_) => Err(io::Error::new(io::ErrorKind::Other, "console lock poisoned")),
        };
        if let Err(e) = written {
            warn!("Progress output stopped: {e}");
            self.broken.store(true, Ordering::Relaxed);
        }
    }

    fn start_spinner(&self, filename: &str) {
        let spinner = ProgressBar::new_spinner();
        if let Ok(style) = ProgressStyle::with_template("{spinner} {msg}") {
            spinner.set_style(style);
        }
        spinner.set_message(format!("Uploading: {filename}..."));
        spinner.enable_steady_tick(Duration::from_millis(100));
        if let Ok(mut slot) = self.spinner.lock() {
            *slot = Some(spinner);
        }
    }

    fn stop_spinner(&self) {
        if let Some(spinner) = self.spinner.lock().ok().and_then(|mut s| s.take()) {
            spinner.finish_and_clear();
        }
    }
}

/// Rounded completion percentage for `current` out of `total`.
pub fn percentage(current: usize, total: usize) -> usize {
    if total == 0 {
        return 100;
    }
    (current * 100 + total / 2) / total
}

impl ProgressSink for ConsoleProgress {
    fn on_event(&self, event: BatchEvent) {
        if self.quiet {
            return;
        }

        match event {
            BatchEvent::Started {
                index,
                total,
                filename,
            } => {
                self.say(format_args!(
                    "Progress: {index}/{total} ({}%) - {filename}",
                    percentage(index, total)
                ));
                self.start_spinner(&filename);
            }
            BatchEvent::Uploaded { filename, url } => {
                self.stop_spinner();
                self.say(format_args!("{} Successfully uploaded: {filename}", "✓".green()));
                self.say(format_args!("  URL: {url}\n"));
            }
            BatchEvent::Failed { filename, reason } => {
                self.stop_spinner();
                self.say(format_args!("{} Failed to upload: {filename}", "✗".red()));
                self.say(format_args!("  Error: {reason}\n"));
            }
            BatchEvent::Finished { .. } => {}
            BatchEvent::Cancelled { completed, total } => {
                self.say(format_args!(
                    "{} Cancelled after {completed} of {total} file(s)",
                    "!".yellow()
                ));
            }
        }
    }
}
