//! Structured logging for conversion jobs.

use tracing::{error, info, warn, Span};
use vconv_models::JobId;

/// Logs job lifecycle events with the job id and the stage attached.
///
/// One logger per stage of a submission: `upload` before the server hands
/// out a job id, `poll` afterwards.
#[derive(Debug, Clone)]
pub struct JobLogger {
    job_id: String,
    stage: &'static str,
}

impl JobLogger {
    /// Logger for a known job.
    pub fn new(job_id: &JobId, stage: &'static str) -> Self {
        Self {
            job_id: job_id.to_string(),
            stage,
        }
    }

    /// Logger for a submission that has no job id yet.
    pub fn unassigned(stage: &'static str) -> Self {
        Self {
            job_id: "-".to_string(),
            stage,
        }
    }

    /// Log the start of a stage (upload, poll).
    pub fn log_start(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = self.stage,
            "Job started: {}", message
        );
    }

    /// Log a non-terminal status seen while polling.
    pub fn log_progress(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = self.stage,
            "Job progress: {}", message
        );
    }

    /// Log something odd that does not end the job.
    pub fn log_warning(&self, message: &str) {
        warn!(
            job_id = %self.job_id,
            stage = self.stage,
            "Job warning: {}", message
        );
    }

    /// Log a failure that ends the submission.
    pub fn log_error(&self, message: &str) {
        error!(
            job_id = %self.job_id,
            stage = self.stage,
            "Job error: {}", message
        );
    }

    /// Log the terminal outcome of the job.
    pub fn log_completion(&self, message: &str) {
        info!(
            job_id = %self.job_id,
            stage = self.stage,
            "Job completed: {}", message
        );
    }

    /// Job id, or `-` before the upload was accepted.
    pub fn job_id(&self) -> &str {
        &self.job_id
    }

    /// Stage name attached to every line.
    pub fn stage(&self) -> &'static str {
        self.stage
    }

    /// Span carrying the job id, for wrapping a whole poll loop.
    pub fn create_span(&self) -> Span {
        tracing::info_span!(
            "job",
            job_id = %self.job_id,
            stage = self.stage
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_logger_creation() {
        let job_id = JobId::from_string("5c1d2");
        let logger = JobLogger::new(&job_id, "poll");

        assert_eq!(logger.job_id(), "5c1d2");
        assert_eq!(logger.stage(), "poll");
    }

    #[test]
    fn test_unassigned_logger() {
        let logger = JobLogger::unassigned("upload");
        assert_eq!(logger.job_id(), "-");
        assert_eq!(logger.stage(), "upload");
    }
}
