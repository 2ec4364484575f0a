// Library root
// -----------
// This crate exposes the batch upload pipeline; the binary (`main.rs`)
// parses arguments and wires the real ImgBB client into it.
//
// Module responsibilities:
// - `config`: command-line and environment resolution into `Config`.
// - `scan`: supported-format filter and directory scanner.
// - `api`: the `Uploader` seam and the ImgBB HTTP client behind it.
// - `batch`: sequential uploader with per-file failure isolation.
// - `report`: success-only JSON report, results file, summary lines.
// - `ui`: console progress rendering.
// - `app`: one full run, from folder validation to persisted report.
pub mod api;
pub mod app;
pub mod batch;
pub mod config;
pub mod error;
pub mod report;
pub mod scan;
pub mod ui;
