// Entrypoint for the CLI application.
// - Keeps `main` small: resolve configuration, build the ImgBB client and
//   hand everything to `app::run`.
// - Every fatal condition prints an actionable message and exits non-zero.

use clap::Parser;
use log::warn;
use std::io::Write;
use std::process::ExitCode;

use imgbb_batch::api::ImgbbClient;
use imgbb_batch::app;
use imgbb_batch::batch::CancelFlag;
use imgbb_batch::config::{Cli, Config};
use imgbb_batch::ui::ConsoleProgress;

/// Conventional status for a run stopped by SIGINT.
const EXIT_INTERRUPTED: u8 = 130;

fn main() -> ExitCode {
    // Logging is controlled by RUST_LOG, e.g. RUST_LOG=debug imgbb-batch ./images
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    // --help / --version print and exit 0; usage errors exit 2.
    let cli = Cli::parse();

    // A closed stdout must not stop the run; errors here are ignored.
    let _ = writeln!(
        std::io::stdout().lock(),
        "ImageBB Batch Uploader\n======================"
    );

    let config = match Config::from_env(cli) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {e}");
            return ExitCode::FAILURE;
        }
    };

    let client = match ImgbbClient::from_config(&config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Fatal error: {e:#}");
            return ExitCode::FAILURE;
        }
    };

    // Ctrl-C stops the batch between files; completed uploads are still saved.
    let cancel = CancelFlag::new();
    if let Err(e) = cancel.cancel_on_interrupt() {
        warn!("Could not install Ctrl-C handler: {e}");
    }

    let progress = ConsoleProgress::stdout(config.quiet);
    match app::run(&config, &client, &progress, cancel, std::io::stdout()) {
        Ok(summary) if summary.result.cancelled => ExitCode::from(EXIT_INTERRUPTED),
        Ok(_) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}
