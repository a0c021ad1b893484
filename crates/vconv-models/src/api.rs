//! Wire types of the upload and status endpoints.

use schemars::JsonSchema;
use serde::{Deserialize, Deserializer, Serialize};

use crate::job::{JobId, JobResult, JobStatus};
use crate::navigation::Navigation;

/// Multipart field carrying the target format.
pub const FIELD_TARGET_FORMAT: &str = "fileFormatSelect";
/// Multipart field carrying the quality preset.
pub const FIELD_PRESET: &str = "presetSelect";
/// Multipart field carrying the file bytes.
pub const FIELD_FILE: &str = "file";

/// Value of `status` on a rejected submission.
pub const STATUS_FAIL: &str = "fail";
/// Value of `status` on a well-formed status envelope.
pub const STATUS_SUCCESS: &str = "success";

/// Body returned by `POST /jobs`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct UploadResponse {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    /// Numeric error code; the server sends an empty string when it has none
    #[serde(
        default,
        deserialize_with = "lenient_error_code",
        skip_serializing_if = "Option::is_none"
    )]
    #[schemars(with = "Option<i64>")]
    pub error_code: Option<i64>,
}

/// What a submission led to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubmitOutcome {
    /// Job was queued; poll it
    Accepted(JobId),
    /// Server refused the upload; go where it says
    Rejected(Navigation),
}

impl UploadResponse {
    /// Decide the outcome of a submission, `None` when the body carries
    /// neither a rejection nor a job id.
    pub fn outcome(&self) -> Option<SubmitOutcome> {
        if self.status.as_deref() == Some(STATUS_FAIL) {
            let target = match self.error_code {
                Some(code) => Navigation::home(code),
                None => Navigation::UnauthorizedAccess,
            };
            return Some(SubmitOutcome::Rejected(target));
        }

        self.job_id.clone().map(SubmitOutcome::Accepted)
    }
}

fn lenient_error_code<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<serde_json::Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(serde_json::Value::Number(n)) => n.as_i64(),
        Some(serde_json::Value::String(s)) => s.trim().parse().ok(),
        _ => None,
    })
}

/// Body returned by `GET /jobs/{job_id}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusEnvelope {
    /// `"success"`, or an error marker; older servers omit it
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<StatusData>,
}

/// Job snapshot inside a status envelope.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, JsonSchema)]
pub struct StatusData {
    /// Job id echoed by the server
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub job_id: Option<JobId>,
    #[schemars(with = "String")]
    pub job_status: JobStatus,
    /// Present once the job has finished
    #[serde(default)]
    pub job_result: Option<JobResult>,
}

impl StatusEnvelope {
    /// Envelope for a job in the given state.
    pub fn new(job_id: &JobId, job_status: JobStatus) -> Self {
        Self {
            status: Some(STATUS_SUCCESS.to_string()),
            data: Some(StatusData {
                job_id: Some(job_id.clone()),
                job_status,
                job_result: None,
            }),
        }
    }

    /// Envelope for a finished job with its output file.
    pub fn finished(job_id: &JobId, filename: impl Into<String>) -> Self {
        let mut envelope = Self::new(job_id, JobStatus::Finished);
        if let Some(data) = envelope.data.as_mut() {
            data.job_result = Some(JobResult {
                filename: Some(filename.into()),
            });
        }
        envelope
    }
}
