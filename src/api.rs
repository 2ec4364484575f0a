// API client module: contains the blocking HTTP client that talks to the
// ImgBB upload endpoint, plus the `Uploader` trait the batch pipeline
// depends on. The pipeline only ever sees the trait, so tests can swap in
// a scripted uploader without touching the network.

use anyhow::{Context, Result};
use base64::{engine::general_purpose::STANDARD, Engine as _};
use log::debug;
use reqwest::blocking::{multipart, Client};
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

use crate::config::Config;

/// Public ImgBB v1 upload endpoint.
pub const DEFAULT_API_URL: &str = "https://api.imgbb.com/1/upload";

/// Location references returned by a successful upload.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UploadedImage {
    pub url: String,
    pub delete_url: String,
}

/// One upload, one call. Implementations report failures through the
/// returned `Result`; they must not panic on service errors.
pub trait Uploader {
    fn upload(&self, credential: &str, path: &Path) -> Result<UploadedImage>;
}

/// Blocking ImgBB client. Holds a reqwest client (with the configured
/// timeout), the endpoint URL and the optional expiration forwarded to
/// the service.
#[derive(Clone)]
pub struct ImgbbClient {
    client: Client,
    api_url: String,
    expiration: Option<u64>,
}

/// Envelope of a successful ImgBB response. Only the fields we keep are
/// declared; serde ignores the rest (display_url, thumb, medium, ...).
#[derive(Deserialize, Debug)]
struct UploadResponse {
    data: UploadData,
}

#[derive(Deserialize, Debug)]
struct UploadData {
    url: String,
    #[serde(default)]
    delete_url: String,
}

/// Error envelope: `{"status_code":400,"error":{"message":"..."}}`.
#[derive(Deserialize, Debug)]
struct ErrorResponse {
    error: ErrorBody,
}

#[derive(Deserialize, Debug)]
struct ErrorBody {
    message: String,
}

impl ImgbbClient {
    /// Build a client from the resolved configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        Self::new(&config.api_url, config.timeout, config.expiration)
    }

    pub fn new(api_url: &str, timeout: Duration, expiration: Option<u64>) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build HTTP client")?;
        Ok(ImgbbClient {
            client,
            api_url: api_url.to_string(),
            expiration,
        })
    }
}

impl Uploader for ImgbbClient {
    /// Upload a single image. The file is sent base64-encoded in the
    /// `image` form field, which ImgBB accepts for every supported format.
    fn upload(&self, credential: &str, path: &Path) -> Result<UploadedImage> {
        let bytes = std::fs::read(path)
            .with_context(|| format!("Failed to read image file {}", path.display()))?;
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("image")
            .to_string();
        debug!("POST {} ({} bytes from {})", self.api_url, bytes.len(), path.display());

        let form = multipart::Form::new()
            .text("image", STANDARD.encode(&bytes))
            .text("name", name);

        let mut query = vec![("key", credential.to_string())];
        if let Some(secs) = self.expiration {
            query.push(("expiration", secs.to_string()));
        }

        let res = self
            .client
            .post(&self.api_url)
            .query(&query)
            .multipart(form)
            .send()
            .context("Failed to send upload request")?;

        if !res.status().is_success() {
            let status = res.status();
            let txt = res.text().unwrap_or_else(|_| "".into());
            anyhow::bail!("Upload failed: {} - {}", status, error_reason(txt));
        }

        let resp: UploadResponse = res.json().context("Parsing upload response json")?;
        Ok(UploadedImage {
            url: resp.data.url,
            delete_url: resp.data.delete_url,
        })
    }
}

/// The service's own message when the body is an error envelope, else the
/// raw body.
fn error_reason(body: String) -> String {
    serde_json::from_str::<ErrorResponse>(&body)
        .map(|e| e.error.message)
        .unwrap_or(body)
}
