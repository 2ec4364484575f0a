// Configuration: command-line arguments and environment variables are
// resolved exactly once into a `Config` value which is then passed down
// explicitly. Nothing below `main` reads the environment on its own.

use clap::Parser;
use std::path::PathBuf;
use std::time::Duration;

use crate::api::DEFAULT_API_URL;
use crate::error::AppError;
use crate::scan::SUPPORTED_FORMATS;

pub const API_KEY_VAR: &str = "IMGBB_API_KEY";
pub const API_URL_VAR: &str = "IMGBB_API_URL";
pub const TIMEOUT_VAR: &str = "IMGBB_TIMEOUT_SECS";
pub const EXPIRATION_VAR: &str = "IMGBB_EXPIRATION";

const DEFAULT_TIMEOUT_SECS: u64 = 60;
/// ImgBB accepts auto-delete between one minute and 180 days.
const EXPIRATION_RANGE: std::ops::RangeInclusive<u64> = 60..=15_552_000;

/// Command-line surface.
#[derive(Parser, Debug, Clone)]
#[command(
    name = "imgbb-batch",
    version,
    about = "ImageBB Batch Uploader: upload every image in a folder to ImgBB",
    after_help = after_help()
)]
pub struct Cli {
    /// Path to folder containing images
    #[arg(value_name = "FOLDER_PATH", default_value = "./images")]
    pub source_dir: PathBuf,

    /// Directory the upload_results_<timestamp>.json file is written to
    #[arg(short, long, value_name = "DIR", default_value = ".")]
    pub output_dir: PathBuf,

    /// Only print the final summary and JSON output
    #[arg(short, long)]
    pub quiet: bool,
}

fn after_help() -> String {
    format!(
        "Environment Variables:\n  \
         {API_KEY_VAR}       Your ImageBB API key (required)\n  \
         {API_URL_VAR}       Upload endpoint (default: {DEFAULT_API_URL})\n  \
         {TIMEOUT_VAR}  Per-upload timeout in seconds (default: {DEFAULT_TIMEOUT_SECS})\n  \
         {EXPIRATION_VAR}    Auto-delete uploads after this many seconds\n\n\
         Examples:\n  \
         imgbb-batch ./my-images\n  \
         imgbb-batch /home/user/photos\n\n\
         Supported formats: {}",
        SUPPORTED_FORMATS.join(", ")
    )
}

/// Everything a run needs, resolved once at startup.
#[derive(Debug, Clone)]
pub struct Config {
    pub credential: String,
    pub source_dir: PathBuf,
    pub output_dir: PathBuf,
    pub api_url: String,
    pub timeout: Duration,
    pub expiration: Option<u64>,
    pub quiet: bool,
}

impl Config {
    /// Resolve configuration from parsed arguments and an environment
    /// lookup (`std::env::var(..).ok()` in production).
    pub fn resolve<F>(cli: Cli, lookup: F) -> Result<Self, AppError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let credential = lookup(API_KEY_VAR)
            .map(|v| v.trim().to_string())
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Configuration {
                message: format!("{API_KEY_VAR} environment variable is required"),
                hint: format!(
                    "Please set your ImageBB API key: export {API_KEY_VAR}=your_api_key_here"
                ),
            })?;

        let api_url = lookup(API_URL_VAR)
            .filter(|v| !v.trim().is_empty())
            .unwrap_or_else(|| DEFAULT_API_URL.to_string());

        let timeout = match lookup(TIMEOUT_VAR) {
            Some(raw) => Duration::from_secs(parse_secs(TIMEOUT_VAR, &raw)?),
            None => Duration::from_secs(DEFAULT_TIMEOUT_SECS),
        };

        let expiration = match lookup(EXPIRATION_VAR) {
            Some(raw) => {
                let secs = parse_secs(EXPIRATION_VAR, &raw)?;
                if !EXPIRATION_RANGE.contains(&secs) {
                    return Err(AppError::Configuration {
                        message: format!("{EXPIRATION_VAR}={secs} is out of range"),
                        hint: format!(
                            "Use a value between {} and {} seconds, or unset it",
                            EXPIRATION_RANGE.start(),
                            EXPIRATION_RANGE.end()
                        ),
                    });
                }
                Some(secs)
            }
            None => None,
        };

        Ok(Config {
            credential,
            source_dir: cli.source_dir,
            output_dir: cli.output_dir,
            api_url,
            timeout,
            expiration,
            quiet: cli.quiet,
        })
    }

    /// Convenience wrapper reading the process environment.
    pub fn from_env(cli: Cli) -> Result<Self, AppError> {
        Self::resolve(cli, |key| std::env::var(key).ok())
    }
}

fn parse_secs(var: &str, raw: &str) -> Result<u64, AppError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(secs),
        _ => Err(AppError::Configuration {
            message: format!("{var}={raw:?} is not a positive number of seconds"),
            hint: format!("Fix or unset {var}"),
        }),
    }
}
