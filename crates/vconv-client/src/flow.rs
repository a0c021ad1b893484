//! End-to-end conversion flow.
//!
//! Validate the selection, upload it, poll the job and navigate, pushing
//! every visible effect through a [`UiSurface`]. Only one conversion runs per
//! flow at a time; a second submission is refused until the first reaches a
//! terminal outcome.

use std::sync::{Arc, Mutex};

use tracing::info;
use vconv_models::{validate, JobId, Navigation, SubmitOutcome, UploadSelection, ValidationError};

use crate::client::JobsApi;
use crate::config::{FailureNotice, PollConfig};
use crate::error::{ClientError, ClientResult};
use crate::logging::JobLogger;
use crate::metrics;
use crate::poller::{PollOutcome, Poller};
use crate::surface::UiSurface;
use crate::timer::{RepollTimer, StopHandle};

/// Panel text for a job that reported `failed`.
pub const JOB_FAILED_MESSAGE: &str = "The conversion failed, please try again";
/// Panel text when the server could not be reached or answered nonsense.
pub const TRANSPORT_FAILED_MESSAGE: &str =
    "Could not reach the conversion server, please try again";
/// Panel text when polling gave up.
pub const POLL_EXHAUSTED_MESSAGE: &str =
    "The conversion is taking longer than expected, please check back later";

/// How a submission ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FlowOutcome {
    /// Refused locally; the reason is in the error panel
    Invalid(ValidationError),
    /// Refused by the server; navigated to its error page
    Rejected(Navigation),
    /// Converted; navigated to the download page
    Finished(Navigation),
    /// Job reported `failed`
    Failed(JobId),
    /// Polling was stopped before a terminal status
    Cancelled(JobId),
    /// Polling gave up after the attempt ceiling
    Exhausted { job_id: JobId, attempts: u32 },
}

impl FlowOutcome {
    /// Whether the user ended up with a converted file.
    pub fn is_success(&self) -> bool {
        matches!(self, FlowOutcome::Finished(_))
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum ActiveJob {
    Uploading,
    Polling(JobId),
}

impl std::fmt::Display for ActiveJob {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ActiveJob::Uploading => write!(f, "upload in flight"),
            ActiveJob::Polling(job_id) => write!(f, "job {}", job_id),
        }
    }
}

/// Clears the active slot when the submission ends, however it ends.
struct ActiveGuard {
    slot: Arc<Mutex<Option<ActiveJob>>>,
}

impl ActiveGuard {
    fn acquire(slot: &Arc<Mutex<Option<ActiveJob>>>) -> ClientResult<Self> {
        let mut active = slot.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(current) = active.as_ref() {
            return Err(ClientError::JobInProgress(current.to_string()));
        }
        *active = Some(ActiveJob::Uploading);

        Ok(Self {
            slot: Arc::clone(slot),
        })
    }

    fn polling(&self, job_id: &JobId) {
        let mut active = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *active = Some(ActiveJob::Polling(job_id.clone()));
    }
}

impl Drop for ActiveGuard {
    fn drop(&mut self) {
        let mut active = self.slot.lock().unwrap_or_else(|e| e.into_inner());
        *active = None;
    }
}

/// Drives submissions against a jobs API.
pub struct ConversionFlow<A> {
    api: A,
    poll: PollConfig,
    failure_notice: FailureNotice,
    timer: RepollTimer,
    active: Arc<Mutex<Option<ActiveJob>>>,
}

impl<A: JobsApi> ConversionFlow<A> {
    pub fn new(api: A, poll: PollConfig, failure_notice: FailureNotice) -> Self {
        Self {
            api,
            poll,
            failure_notice,
            timer: RepollTimer::new(),
            active: Arc::new(Mutex::new(None)),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    /// Handle that stops the running submission before or during polling.
    /// A stop issued while no submission runs is cleared by the next one.
    pub fn stop_handle(&self) -> StopHandle {
        self.timer.stop_handle()
    }

    /// Whether a submission is between start and terminal outcome.
    pub fn is_busy(&self) -> bool {
        self.active
            .lock()
            .map(|active| active.is_some())
            .unwrap_or(true)
    }

    /// Run one submission from validation to navigation.
    ///
    /// Validation failures and server rejections are outcomes, shown through
    /// `ui`. Transport errors are returned; with [`FailureNotice::Panel`] they
    /// are also shown in the error panel.
    pub async fn submit<U: UiSurface>(
        &self,
        selection: &UploadSelection,
        bytes: Vec<u8>,
        ui: &mut U,
    ) -> ClientResult<FlowOutcome> {
        let guard = ActiveGuard::acquire(&self.active)?;
        self.timer.reset();
        ui.hide_errors();

        if let Err(reason) = validate(selection) {
            metrics::record_validation_rejection(validation_label(reason));
            ui.show_error(&reason.message());
            return Ok(FlowOutcome::Invalid(reason));
        }

        ui.set_loading(true);
        let logger = JobLogger::unassigned("upload");
        logger.log_start(&format!("uploading for conversion to {}", selection.target_format));

        let job_id = match self.api.submit(selection, bytes).await {
            Ok(SubmitOutcome::Accepted(job_id)) => job_id,
            Ok(SubmitOutcome::Rejected(target)) => {
                logger.log_warning(&format!("server rejected upload, going to {}", target));
                ui.navigate(&target);
                return Ok(FlowOutcome::Rejected(target));
            }
            Err(e) => {
                logger.log_error(&format!("upload failed: {}", e));
                self.report_failure(ui, TRANSPORT_FAILED_MESSAGE);
                return Err(e);
            }
        };

        info!(job_id = %job_id, "Upload accepted");
        if self.timer.is_stopped() {
            info!(job_id = %job_id, "Stopped during upload, not polling");
            ui.reset();
            return Ok(FlowOutcome::Cancelled(job_id));
        }
        guard.polling(&job_id);

        let outcome = Poller::new(&self.api, &self.timer, self.poll.clone())
            .run(job_id.clone())
            .await;

        match outcome {
            Ok(PollOutcome::Finished(target)) => {
                ui.navigate(&target);
                Ok(FlowOutcome::Finished(target))
            }
            Ok(PollOutcome::Failed) => {
                self.report_failure(ui, JOB_FAILED_MESSAGE);
                Ok(FlowOutcome::Failed(job_id))
            }
            Ok(PollOutcome::Cancelled) => {
                ui.reset();
                Ok(FlowOutcome::Cancelled(job_id))
            }
            Ok(PollOutcome::Exhausted { attempts }) => {
                self.report_failure(ui, POLL_EXHAUSTED_MESSAGE);
                Ok(FlowOutcome::Exhausted { job_id, attempts })
            }
            Err(e) => {
                self.report_failure(ui, TRANSPORT_FAILED_MESSAGE);
                Err(e)
            }
        }
    }

    /// Loader off; message shown only when failures are surfaced.
    fn report_failure<U: UiSurface>(&self, ui: &mut U, message: &str) {
        ui.set_loading(false);
        if self.failure_notice == FailureNotice::Panel {
            ui.show_error(message);
        }
    }
}

fn validation_label(reason: ValidationError) -> &'static str {
    match reason {
        ValidationError::NoFile => "no_file",
        ValidationError::SameFormat => "same_format",
        ValidationError::UnsupportedFormat => "unsupported_format",
        ValidationError::FileTooLarge => "file_too_large",
    }
}
