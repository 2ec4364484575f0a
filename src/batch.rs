// Batch orchestration: walk the scanned files one at a time, hand each to
// the uploader, and record exactly one outcome per file. A failed upload is
// data, not control flow: it becomes a `Failure` outcome and the cursor
// moves on.

use log::{info, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use crate::api::Uploader;
use crate::scan::ImageFile;

/// Result of processing one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UploadOutcome {
    Success {
        filename: String,
        url: String,
        delete_url: String,
    },
    Failure {
        filename: String,
        error_message: String,
    },
}

impl UploadOutcome {
    pub fn filename(&self) -> &str {
        match self {
            UploadOutcome::Success { filename, .. } | UploadOutcome::Failure { filename, .. } => {
                filename
            }
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, UploadOutcome::Success { .. })
    }
}

/// Ordered outcomes of one run. `scheduled` is the number of files the run
/// was started with; it differs from `outcomes.len()` only when cancelled.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BatchResult {
    pub outcomes: Vec<UploadOutcome>,
    pub scheduled: usize,
    pub cancelled: bool,
}

impl BatchResult {
    pub fn total(&self) -> usize {
        self.outcomes.len()
    }

    pub fn succeeded(&self) -> usize {
        self.outcomes.iter().filter(|o| o.is_success()).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.succeeded()
    }
}

/// Notifications emitted while a batch runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BatchEvent {
    /// About to upload file `index` (1-based) of `total`.
    Started {
        index: usize,
        total: usize,
        filename: String,
    },
    Uploaded {
        filename: String,
        url: String,
    },
    Failed {
        filename: String,
        reason: String,
    },
    Finished {
        succeeded: usize,
        failed: usize,
    },
    /// Stopped between files; `completed` outcomes were recorded.
    Cancelled {
        completed: usize,
        total: usize,
    },
}

/// Receiver for batch progress.
pub trait ProgressSink {
    fn on_event(&self, event: BatchEvent);
}

/// Sink that drops every event.
pub struct NoProgress;

impl ProgressSink for NoProgress {
    fn on_event(&self, _event: BatchEvent) {}
}

/// Cooperative cancellation, checked between files and never mid-upload.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Arc<AtomicBool>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::SeqCst)
    }

    /// Route Ctrl-C to this flag. The upload in flight finishes, then the
    /// batch stops. Can be installed once per process.
    pub fn cancel_on_interrupt(&self) -> Result<(), ctrlc::Error> {
        let flag = self.clone();
        ctrlc::set_handler(move || {
            info!("Interrupt received, stopping after the current upload");
            flag.cancel();
        })
    }
}

/// Sequential uploader. Owns nothing but borrowed collaborators; the file
/// cursor lives in `run` and advances only after an outcome is recorded.
pub struct BatchUploader<'a, U: Uploader + ?Sized, P: ProgressSink + ?Sized> {
    uploader: &'a U,
    progress: &'a P,
    cancel: CancelFlag,
}

impl<'a, U: Uploader + ?Sized, P: ProgressSink + ?Sized> BatchUploader<'a, U, P> {
    pub fn new(uploader: &'a U, progress: &'a P) -> Self {
        BatchUploader {
            uploader,
            progress,
            cancel: CancelFlag::new(),
        }
    }

    pub fn with_cancel(mut self, cancel: CancelFlag) -> Self {
        self.cancel = cancel;
        self
    }

    /// Upload `files` in order. Never fails: per-file errors are captured
    /// in the returned result.
    pub fn run(&self, files: &[ImageFile], credential: &str) -> BatchResult {
        let total = files.len();
        let mut result = BatchResult {
            outcomes: Vec::with_capacity(total),
            scheduled: total,
            cancelled: false,
        };

        for (i, file) in files.iter().enumerate() {
            if self.cancel.is_cancelled() {
                info!("Cancelled after {} of {} file(s)", result.total(), total);
                result.cancelled = true;
                self.progress.on_event(BatchEvent::Cancelled {
                    completed: result.total(),
                    total,
                });
                return result;
            }

            let filename = file.file_name();
            self.progress.on_event(BatchEvent::Started {
                index: i + 1,
                total,
                filename: filename.clone(),
            });

            let outcome = self.upload_one(file, filename, credential);
            self.progress.on_event(match &outcome {
                UploadOutcome::Success { filename, url, .. } => BatchEvent::Uploaded {
                    filename: filename.clone(),
                    url: url.clone(),
                },
                UploadOutcome::Failure {
                    filename,
                    error_message,
                } => BatchEvent::Failed {
                    filename: filename.clone(),
                    reason: error_message.clone(),
                },
            });
            result.outcomes.push(outcome);
        }

        self.progress.on_event(BatchEvent::Finished {
            succeeded: result.succeeded(),
            failed: result.failed(),
        });
        result
    }

    fn upload_one(&self, file: &ImageFile, filename: String, credential: &str) -> UploadOutcome {
        match self.uploader.upload(credential, file.path()) {
            Ok(image) if image.url.trim().is_empty() => {
                warn!("{filename}: service returned an empty URL");
                UploadOutcome::Failure {
                    filename,
                    error_message: "Upload service returned an empty URL".to_string(),
                }
            }
            Ok(image) => {
                info!("{filename} -> {}", image.url);
                UploadOutcome::Success {
                    filename,
                    url: image.url,
                    delete_url: image.delete_url,
                }
            }
            Err(e) => {
                warn!("{filename}: {e:#}");
                UploadOutcome::Failure {
                    filename,
                    error_message: format!("{e:#}"),
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::UploadedImage;
    use std::path::Path;
    use std::sync::Mutex;

    /// Fails on every path whose name contains "bad".
    struct NameUploader;

    impl Uploader for NameUploader {
        fn upload(&self, _credential: &str, path: &Path) -> anyhow::Result<UploadedImage> {
            let name = path.file_name().unwrap().to_string_lossy().into_owned();
            if name.contains("bad") {
                anyhow::bail!("network timeout");
            }
            Ok(UploadedImage {
                url: format!("https://x/{name}"),
                delete_url: format!("https://x/del/{name}"),
            })
        }
    }

    #[derive(Default)]
    struct Recorder(Mutex<Vec<BatchEvent>>);

    impl ProgressSink for Recorder {
        fn on_event(&self, event: BatchEvent) {
            self.0.lock().unwrap().push(event);
        }
    }

    fn files(names: &[&str]) -> Vec<ImageFile> {
        names.iter().map(|n| ImageFile::new(format!("/img/{n}"))).collect()
    }

    #[test]
    fn middle_failure_is_isolated() {
        let batch = BatchUploader::new(&NameUploader, &NoProgress);
        let result = batch.run(&files(&["1.jpg", "bad.png", "3.gif"]), "key");

        assert_eq!(result.total(), 3);
        assert!(result.outcomes[0].is_success());
        assert_eq!(
            result.outcomes[1],
            UploadOutcome::Failure {
                filename: "bad.png".into(),
                error_message: "network timeout".into()
            }
        );
        assert!(result.outcomes[2].is_success());
        assert_eq!((result.succeeded(), result.failed()), (2, 1));
        assert!(!result.cancelled);
    }

    #[test]
    fn events_are_ordered_per_file() {
        let recorder = Recorder::default();
        BatchUploader::new(&NameUploader, &recorder).run(&files(&["a.jpg", "bad.jpg"]), "key");

        let events = recorder.0.into_inner().unwrap();
        assert_eq!(
            events,
            vec![
                BatchEvent::Started { index: 1, total: 2, filename: "a.jpg".into() },
                BatchEvent::Uploaded { filename: "a.jpg".into(), url: "https://x/a.jpg".into() },
                BatchEvent::Started { index: 2, total: 2, filename: "bad.jpg".into() },
                BatchEvent::Failed { filename: "bad.jpg".into(), reason: "network timeout".into() },
                BatchEvent::Finished { succeeded: 1, failed: 1 },
            ]
        );
    }

    #[test]
    fn empty_url_counts_as_failure() {
        struct Blank;
        impl Uploader for Blank {
            fn upload(&self, _: &str, _: &Path) -> anyhow::Result<UploadedImage> {
                Ok(UploadedImage { url: String::new(), delete_url: "d".into() })
            }
        }

        let result = BatchUploader::new(&Blank, &NoProgress).run(&files(&["a.png"]), "key");
        assert!(!result.outcomes[0].is_success());
    }

    #[test]
    fn cancel_between_files_keeps_completed_outcomes() {
        struct CancelAfterFirst(CancelFlag);
        impl Uploader for CancelAfterFirst {
            fn upload(&self, _: &str, _: &Path) -> anyhow::Result<UploadedImage> {
                self.0.cancel();
                Ok(UploadedImage { url: "https://x/1".into(), delete_url: "d".into() })
            }
        }

        let flag = CancelFlag::new();
        let uploader = CancelAfterFirst(flag.clone());
        let result = BatchUploader::new(&uploader, &NoProgress)
            .with_cancel(flag)
            .run(&files(&["1.png", "2.png", "3.png"]), "key");

        assert!(result.cancelled);
        assert_eq!(result.scheduled, 3);
        assert_eq!(result.total(), 1);
        assert!(result.outcomes[0].is_success());
    }
}
