//! Shared data models for the vconv client.
//!
//! This crate provides pure, I/O-free pieces:
//! - Upload selection and its validation rules
//! - Job handles and statuses
//! - Wire types of the upload and status endpoints
//! - Navigation targets and the poll decision step

pub mod api;
pub mod format;
pub mod job;
pub mod navigation;
pub mod poll;
pub mod selection;
pub mod validation;

// Re-export common types
pub use api::{StatusData, StatusEnvelope, SubmitOutcome, UploadResponse};
pub use format::{file_extension, is_supported, MAX_UPLOAD_BYTES, SUPPORTED_FORMATS};
pub use job::{JobId, JobResult, JobStatus};
pub use navigation::{Navigation, ServerErrorCode};
pub use poll::{next_action, PollAction, StatusError};
pub use selection::{FileMeta, UploadSelection};
pub use validation::{validate, ValidationError};
