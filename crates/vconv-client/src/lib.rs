//! Client for the video conversion service.
//!
//! This crate provides:
//! - HTTP client for the upload, status and download endpoints
//! - Job status poll loop with a cancellable timer
//! - The submission flow wiring validation, upload, polling and navigation
//! - The `UiSurface` seam a front end implements

pub mod client;
pub mod config;
pub mod error;
pub mod flow;
pub mod logging;
pub mod metrics;
pub mod poller;
pub mod surface;
pub mod timer;

pub use client::{JobsApi, JobsClient, StatusSource};
pub use config::{ClientConfig, FailureNotice, PollConfig};
pub use error::{ClientError, ClientResult};
pub use flow::{ConversionFlow, FlowOutcome};
pub use poller::{PollOutcome, PollState, Poller};
pub use surface::{RecordingSurface, UiEvent, UiSurface};
pub use timer::{RepollTimer, StopHandle, Timer, TimerEvent};
