//! Decision step of the status poll loop.
//!
//! `next_action` maps one status envelope to what the poller does next. It
//! performs no I/O so the loop's behaviour can be checked without a server.

use thiserror::Error;

use crate::api::{StatusEnvelope, STATUS_SUCCESS};
use crate::job::{JobId, JobStatus};
use crate::navigation::Navigation;

/// What to do after a status response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollAction {
    /// Job finished; go to its download page
    Navigate(Navigation),
    /// Job failed; stop without navigating
    Stop,
    /// Job still running; poll again with this id
    Repoll { job_id: JobId, status: JobStatus },
}

/// Status envelope that cannot be acted on.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StatusError {
    #[error("status endpoint reported '{0}'")]
    Unsuccessful(String),

    #[error("status response for job {0} carries no data")]
    MissingData(JobId),

    #[error("job {0} finished without an output filename")]
    MissingFilename(JobId),
}

/// Decide the next step for `current` given the envelope just received.
///
/// A pending job is polled again under the id the server echoed back, which
/// is the id the loop keeps using from then on. The current id is only used
/// when the server echoes none.
pub fn next_action(current: &JobId, envelope: &StatusEnvelope) -> Result<PollAction, StatusError> {
    if let Some(status) = envelope.status.as_deref() {
        if status != STATUS_SUCCESS {
            return Err(StatusError::Unsuccessful(status.to_string()));
        }
    }

    let data = envelope
        .data
        .as_ref()
        .ok_or_else(|| StatusError::MissingData(current.clone()))?;

    match &data.job_status {
        JobStatus::Finished => data
            .job_result
            .as_ref()
            .and_then(|result| result.filename.clone())
            .map(|filename| PollAction::Navigate(Navigation::download(filename)))
            .ok_or_else(|| StatusError::MissingFilename(current.clone())),
        JobStatus::Failed => Ok(PollAction::Stop),
        pending => Ok(PollAction::Repoll {
            job_id: data.job_id.clone().unwrap_or_else(|| current.clone()),
            status: pending.clone(),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::StatusData;

    fn job() -> JobId {
        JobId::from_string("job-1")
    }

    #[test]
    fn test_finished_navigates_to_download() {
        let action = next_action(&job(), &StatusEnvelope::finished(&job(), "out.mp4")).unwrap();
        assert_eq!(action, PollAction::Navigate(Navigation::download("out.mp4")));
    }

    #[test]
    fn test_failed_stops() {
        let action = next_action(&job(), &StatusEnvelope::new(&job(), JobStatus::Failed)).unwrap();
        assert_eq!(action, PollAction::Stop);
    }

    #[test]
    fn test_pending_repolls_with_same_id() {
        let action =
            next_action(&job(), &StatusEnvelope::new(&job(), JobStatus::from("queued"))).unwrap();
        assert_eq!(
            action,
            PollAction::Repoll {
                job_id: job(),
                status: JobStatus::from("queued")
            }
        );
    }

    #[test]
    fn test_repoll_uses_echoed_id() {
        let echoed = JobId::from_string("job-2");
        let action =
            next_action(&job(), &StatusEnvelope::new(&echoed, JobStatus::from("started"))).unwrap();
        assert!(matches!(action, PollAction::Repoll { job_id, .. } if job_id == echoed));
    }

    #[test]
    fn test_repoll_falls_back_to_current_id() {
        let envelope = StatusEnvelope {
            status: Some(STATUS_SUCCESS.to_string()),
            data: Some(StatusData {
                job_id: None,
                job_status: JobStatus::from("started"),
                job_result: None,
            }),
        };
        let action = next_action(&job(), &envelope).unwrap();
        assert!(matches!(action, PollAction::Repoll { job_id, .. } if job_id == job()));
    }

    #[test]
    fn test_error_envelope() {
        let envelope = StatusEnvelope {
            status: Some("error".to_string()),
            data: None,
        };
        assert_eq!(
            next_action(&job(), &envelope),
            Err(StatusError::Unsuccessful("error".into()))
        );
    }

    #[test]
    fn test_missing_status_field_is_not_an_error() {
        let envelope = StatusEnvelope {
            status: None,
            ..StatusEnvelope::finished(&job(), "out.mp4")
        };
        assert_eq!(
            next_action(&job(), &envelope),
            Ok(PollAction::Navigate(Navigation::download("out.mp4")))
        );
    }

    #[test]
    fn test_finished_without_filename() {
        let envelope = StatusEnvelope::new(&job(), JobStatus::Finished);
        assert_eq!(
            next_action(&job(), &envelope),
            Err(StatusError::MissingFilename(job()))
        );
    }
}
