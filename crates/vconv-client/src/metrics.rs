//! Client-side counters.
//!
//! Recorded through the `metrics` facade; nothing is exported unless the
//! embedding binary installs a recorder.

use metrics::counter;

/// Metric names as constants for consistency.
pub mod names {
    pub const UPLOADS_TOTAL: &str = "vconv_uploads_total";
    pub const STATUS_POLLS_TOTAL: &str = "vconv_status_polls_total";
    pub const JOBS_FINISHED_TOTAL: &str = "vconv_jobs_finished_total";
    pub const JOBS_FAILED_TOTAL: &str = "vconv_jobs_failed_total";
    pub const VALIDATION_REJECTIONS_TOTAL: &str = "vconv_validation_rejections_total";
}

/// Record an upload and how the server answered it.
pub fn record_upload(outcome: &'static str) {
    counter!(names::UPLOADS_TOTAL, "outcome" => outcome).increment(1);
}

pub fn record_status_poll() {
    counter!(names::STATUS_POLLS_TOTAL).increment(1);
}

pub fn record_job_finished() {
    counter!(names::JOBS_FINISHED_TOTAL).increment(1);
}

pub fn record_job_failed(reason: &'static str) {
    counter!(names::JOBS_FAILED_TOTAL, "reason" => reason).increment(1);
}

pub fn record_validation_rejection(reason: &'static str) {
    counter!(names::VALIDATION_REJECTIONS_TOTAL, "reason" => reason).increment(1);
}
