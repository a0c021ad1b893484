//! HTTP client for the conversion server.

use std::path::{Path, PathBuf};
use std::time::Duration;

use async_trait::async_trait;
use reqwest::multipart::{Form, Part};
use reqwest::Client;
use tracing::{debug, warn};
use vconv_models::api::{FIELD_FILE, FIELD_PRESET, FIELD_TARGET_FORMAT};
use vconv_models::{
    JobId, StatusEnvelope, SubmitOutcome, UploadResponse, UploadSelection, ValidationError,
};

use crate::config::ClientConfig;
use crate::error::{ClientError, ClientResult};
use crate::metrics;

/// Source of job status snapshots.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_status(&self, job_id: &JobId) -> ClientResult<StatusEnvelope>;
}

/// Full server surface used by the conversion flow.
#[async_trait]
pub trait JobsApi: StatusSource {
    /// Upload the selected file. `bytes` is the content of the single file in
    /// `selection`.
    async fn submit(&self, selection: &UploadSelection, bytes: Vec<u8>)
        -> ClientResult<SubmitOutcome>;
}

/// Client for the `/jobs` endpoints.
pub struct JobsClient {
    http: Client,
    config: ClientConfig,
}

impl JobsClient {
    /// Create a new jobs client.
    pub fn new(config: ClientConfig) -> ClientResult<Self> {
        let mut builder = Client::builder();
        if let Some(timeout) = config.request_timeout {
            builder = builder.timeout(timeout);
        }
        let http = builder.build().map_err(ClientError::Network)?;

        Ok(Self { http, config })
    }

    /// Create from environment variables.
    pub fn from_env() -> ClientResult<Self> {
        Self::new(ClientConfig::from_env())
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    fn base_url(&self) -> &str {
        self.config.base_url.trim_end_matches('/')
    }

    fn jobs_url(&self) -> String {
        format!("{}/jobs", self.base_url())
    }

    fn job_url(&self, job_id: &JobId) -> String {
        format!("{}/jobs/{}", self.base_url(), urlencoding::encode(job_id.as_str()))
    }

    fn download_file_url(&self, filename: &str) -> String {
        format!("{}/download_file/{}", self.base_url(), urlencoding::encode(filename))
    }

    /// Upload a file for conversion.
    ///
    /// A `fail` body is a regular outcome and maps to
    /// [`SubmitOutcome::Rejected`]; only unusable responses are errors.
    pub async fn submit_upload(
        &self,
        selection: &UploadSelection,
        bytes: Vec<u8>,
    ) -> ClientResult<SubmitOutcome> {
        let file = selection.file().ok_or(ValidationError::NoFile)?;
        let url = self.jobs_url();

        let mut form = Form::new().text(FIELD_TARGET_FORMAT, selection.target_format.clone());
        if let Some(preset) = &selection.preset {
            form = form.text(FIELD_PRESET, preset.clone());
        }
        form = form.part(FIELD_FILE, Part::bytes(bytes).file_name(file.name.clone()));

        debug!("Uploading {} ({} bytes) to {}", file.name, file.size_bytes, url);

        let response = self.http.post(&url).multipart(form).send().await?;
        let status = response.status();
        let body = response.text().await?;

        let outcome = serde_json::from_str::<UploadResponse>(&body)
            .ok()
            .and_then(|parsed| parsed.outcome());

        match outcome {
            Some(outcome) => {
                metrics::record_upload(match outcome {
                    SubmitOutcome::Accepted(_) => "accepted",
                    SubmitOutcome::Rejected(_) => "rejected",
                });
                Ok(outcome)
            }
            None if !status.is_success() => {
                metrics::record_upload("error");
                Err(ClientError::RequestFailed(format!(
                    "upload endpoint returned {}: {}",
                    status, body
                )))
            }
            None => {
                metrics::record_upload("error");
                Err(ClientError::InvalidResponse(format!(
                    "upload response has neither job_id nor a rejection: {}",
                    body
                )))
            }
        }
    }

    /// Fetch one status snapshot, retrying transport errors up to
    /// `max_retries` times.
    pub async fn job_status(&self, job_id: &JobId) -> ClientResult<StatusEnvelope> {
        let url = self.job_url(job_id);
        metrics::record_status_poll();

        let response = self
            .with_retry(|| async {
                self.http.get(&url).send().await.map_err(ClientError::Network)
            })
            .await?;

        let status = response.status();
        let body = response.text().await?;

        if !status.is_success() {
            return Err(ClientError::RequestFailed(format!(
                "status endpoint returned {}: {}",
                status, body
            )));
        }

        Ok(serde_json::from_str(&body)?)
    }

    /// Download a converted file into `dest_dir`, returning its path.
    pub async fn download(&self, filename: &str, dest_dir: &Path) -> ClientResult<PathBuf> {
        let local_name = Path::new(filename)
            .file_name()
            .ok_or_else(|| ClientError::InvalidResponse(format!("bad output filename '{}'", filename)))?;
        let url = self.download_file_url(filename);

        debug!("Downloading {} from {}", filename, url);

        let response = self.http.get(&url).send().await?;
        if !response.status().is_success() {
            return Err(ClientError::RequestFailed(format!(
                "download endpoint returned {}",
                response.status()
            )));
        }

        let bytes = response.bytes().await?;
        tokio::fs::create_dir_all(dest_dir).await?;
        let path = dest_dir.join(local_name);
        tokio::fs::write(&path, &bytes).await?;

        Ok(path)
    }

    /// Execute with retry logic.
    async fn with_retry<F, Fut, T>(&self, operation: F) -> ClientResult<T>
    where
        F: Fn() -> Fut,
        Fut: std::future::Future<Output = ClientResult<T>>,
    {
        let mut attempt = 0u32;

        loop {
            match operation().await {
                Ok(result) => return Ok(result),
                Err(e) if e.is_retryable() && attempt < self.config.max_retries => {
                    let delay = retry_delay(attempt);
                    warn!(
                        "Status request failed (attempt {}), retrying in {:?}: {}",
                        attempt + 1,
                        delay,
                        e
                    );
                    tokio::time::sleep(delay).await;
                    attempt += 1;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

/// Base delay before the first status retry.
const RETRY_BASE_DELAY_MS: u64 = 500;
/// Ceiling for the status retry delay.
const RETRY_MAX_DELAY_MS: u64 = 30_000;

/// Exponential delay before retry number `attempt + 1`, capped.
fn retry_delay(attempt: u32) -> Duration {
    let millis = 2u64
        .saturating_pow(attempt)
        .saturating_mul(RETRY_BASE_DELAY_MS)
        .min(RETRY_MAX_DELAY_MS);
    Duration::from_millis(millis)
}

#[async_trait]
impl StatusSource for JobsClient {
    async fn fetch_status(&self, job_id: &JobId) -> ClientResult<StatusEnvelope> {
        self.job_status(job_id).await
    }
}

#[async_trait]
impl JobsApi for JobsClient {
    async fn submit(
        &self,
        selection: &UploadSelection,
        bytes: Vec<u8>,
    ) -> ClientResult<SubmitOutcome> {
        self.submit_upload(selection, bytes).await
    }
}
