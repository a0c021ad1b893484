//! Client configuration.

use std::str::FromStr;
use std::time::Duration;

use crate::error::ClientError;

/// What the user sees when a job fails or the server cannot be reached.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum FailureNotice {
    /// Stop quietly and leave the page as it is
    #[default]
    Silent,
    /// Show the failure in the error panel
    Panel,
}

impl FromStr for FailureNotice {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "silent" => Ok(FailureNotice::Silent),
            "panel" => Ok(FailureNotice::Panel),
            other => Err(ClientError::Config(format!(
                "unknown failure notice '{}', expected 'silent' or 'panel'",
                other
            ))),
        }
    }
}

/// Status poll loop configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct PollConfig {
    /// Delay before the first re-poll
    pub interval: Duration,
    /// Multiplier applied per re-poll (1.0 keeps the interval fixed)
    pub backoff: f64,
    /// Ceiling for the backed-off delay
    pub max_delay: Duration,
    /// Give up after this many status requests
    pub max_attempts: Option<u32>,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_millis(2000),
            backoff: 1.0,
            max_delay: Duration::from_secs(30),
            max_attempts: None,
        }
    }
}

impl PollConfig {
    /// Fixed-interval polling.
    pub fn fixed(interval: Duration) -> Self {
        Self {
            interval,
            ..Default::default()
        }
    }

    /// Set the backoff multiplier.
    pub fn with_backoff(mut self, backoff: f64) -> Self {
        self.backoff = backoff;
        self
    }

    /// Set the attempt ceiling.
    pub fn with_max_attempts(mut self, max_attempts: u32) -> Self {
        self.max_attempts = Some(max_attempts);
        self
    }

    /// Delay to wait after the given (1-based) status request.
    pub fn delay_after(&self, attempt: u32) -> Duration {
        if self.backoff <= 1.0 || attempt <= 1 {
            return self.interval;
        }

        let factor = self.backoff.powi(attempt as i32 - 1);
        let millis = self.interval.as_millis() as f64 * factor;
        let max_millis = self.max_delay.as_millis() as f64;
        Duration::from_millis(millis.min(max_millis) as u64)
    }
}

/// Configuration for the jobs client.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Origin of the conversion server
    pub base_url: String,
    /// Per-request timeout; requests wait indefinitely when unset
    pub request_timeout: Option<Duration>,
    /// Retries of a failed status request
    pub max_retries: u32,
    /// Poll loop settings
    pub poll: PollConfig,
    /// Feedback for failed jobs and transport errors
    pub failure_notice: FailureNotice,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:5000".to_string(),
            request_timeout: None,
            max_retries: 0,
            poll: PollConfig::default(),
            failure_notice: FailureNotice::Silent,
        }
    }
}

impl ClientConfig {
    /// Create config from environment variables.
    pub fn from_env() -> Self {
        let defaults = PollConfig::default();

        Self {
            base_url: std::env::var("VCONV_BASE_URL")
                .unwrap_or_else(|_| "http://localhost:5000".to_string()),
            request_timeout: std::env::var("VCONV_REQUEST_TIMEOUT")
                .ok()
                .and_then(|s| s.parse().ok())
                .map(Duration::from_secs),
            max_retries: std::env::var("VCONV_MAX_RETRIES")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or(0),
            poll: PollConfig {
                interval: std::env::var("VCONV_POLL_INTERVAL_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.interval),
                backoff: std::env::var("VCONV_POLL_BACKOFF")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .unwrap_or(defaults.backoff),
                max_delay: std::env::var("VCONV_POLL_MAX_DELAY_MS")
                    .ok()
                    .and_then(|s| s.parse().ok())
                    .map(Duration::from_millis)
                    .unwrap_or(defaults.max_delay),
                max_attempts: std::env::var("VCONV_MAX_POLL_ATTEMPTS")
                    .ok()
                    .and_then(|s| s.parse().ok()),
            },
            failure_notice: std::env::var("VCONV_FAILURE_NOTICE")
                .ok()
                .and_then(|s| s.parse().ok())
                .unwrap_or_default(),
        }
    }

    /// Override the base URL.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }

    /// Override the poll settings.
    pub fn with_poll(mut self, poll: PollConfig) -> Self {
        self.poll = poll;
        self
    }

    /// Override the failure notice.
    pub fn with_failure_notice(mut self, failure_notice: FailureNotice) -> Self {
        self.failure_notice = failure_notice;
        self
    }
}
