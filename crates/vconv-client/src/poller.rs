//! Job status poll loop.
//!
//! One poller drives one job through `Polling -> Finished | Failed`. Each
//! iteration fetches a snapshot, asks [`next_action`] what to do, and waits
//! on the [`Timer`] before the next fetch, so requests for a job never
//! overlap. Stopping the timer ends the loop as `Cancelled`; an attempt
//! ceiling ends it as `Exhausted`.

use tracing::Instrument;
use vconv_models::{next_action, JobId, Navigation, PollAction};

use crate::client::StatusSource;
use crate::config::PollConfig;
use crate::error::ClientResult;
use crate::logging::JobLogger;
use crate::metrics;
use crate::timer::{Timer, TimerEvent};

/// Where the poll loop currently is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollState {
    Idle,
    Polling { job_id: JobId, attempts: u32 },
    Finished(Navigation),
    Failed,
    Cancelled,
    Exhausted { attempts: u32 },
}

/// How a poll loop ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PollOutcome {
    /// Job finished; navigate here
    Finished(Navigation),
    /// Job reported `failed`
    Failed,
    /// Timer was stopped before a terminal status arrived
    Cancelled,
    /// Attempt ceiling reached before a terminal status arrived
    Exhausted { attempts: u32 },
}

impl From<&PollOutcome> for PollState {
    fn from(outcome: &PollOutcome) -> Self {
        match outcome {
            PollOutcome::Finished(target) => PollState::Finished(target.clone()),
            PollOutcome::Failed => PollState::Failed,
            PollOutcome::Cancelled => PollState::Cancelled,
            PollOutcome::Exhausted { attempts } => PollState::Exhausted {
                attempts: *attempts,
            },
        }
    }
}

pub struct Poller<'a, S: ?Sized, T: ?Sized> {
    source: &'a S,
    timer: &'a T,
    config: PollConfig,
    state: PollState,
}

impl<'a, S, T> Poller<'a, S, T>
where
    S: StatusSource + ?Sized,
    T: Timer + ?Sized,
{
    pub fn new(source: &'a S, timer: &'a T, config: PollConfig) -> Self {
        Self {
            source,
            timer,
            config,
            state: PollState::Idle,
        }
    }

    pub fn state(&self) -> &PollState {
        &self.state
    }

    /// Poll `job_id` until a terminal status, a stop or the attempt ceiling.
    ///
    /// Transport errors and unusable envelopes end the loop with an error;
    /// they are not retried here.
    pub async fn run(&mut self, job_id: JobId) -> ClientResult<PollOutcome> {
        let logger = JobLogger::new(&job_id, "poll");
        let span = logger.create_span();

        let result = self.run_loop(job_id, &logger).instrument(span).await;
        match &result {
            Ok(outcome) => self.state = PollState::from(outcome),
            Err(e) => {
                logger.log_error(&format!("polling stopped: {}", e));
                metrics::record_job_failed("transport");
                self.state = PollState::Failed;
            }
        }
        result
    }

    async fn run_loop(&mut self, job_id: JobId, logger: &JobLogger) -> ClientResult<PollOutcome> {
        let mut current = job_id;
        let mut attempts = 0u32;

        logger.log_start("polling job status");

        loop {
            attempts += 1;
            self.state = PollState::Polling {
                job_id: current.clone(),
                attempts,
            };

            let envelope = tokio::select! {
                envelope = self.source.fetch_status(&current) => envelope?,
                _ = self.timer.stopped() => {
                    logger.log_warning("polling cancelled during a status request");
                    return Ok(PollOutcome::Cancelled);
                }
            };

            match next_action(&current, &envelope)? {
                PollAction::Navigate(target) => {
                    logger.log_completion(&format!("output ready at {}", target));
                    metrics::record_job_finished();
                    return Ok(PollOutcome::Finished(target));
                }
                PollAction::Stop => {
                    logger.log_warning("job reported failed");
                    metrics::record_job_failed("job");
                    return Ok(PollOutcome::Failed);
                }
                PollAction::Repoll { job_id, status } => {
                    if job_id != current {
                        logger.log_warning(&format!(
                            "server echoed job id {} while polling {}",
                            job_id, current
                        ));
                    }
                    current = job_id;

                    if let Some(max) = self.config.max_attempts {
                        if attempts >= max {
                            logger.log_warning(&format!("gave up after {} status requests", attempts));
                            return Ok(PollOutcome::Exhausted { attempts });
                        }
                    }

                    let delay = self.config.delay_after(attempts);
                    logger.log_progress(&format!("status '{}', next poll in {:?}", status, delay));

                    if self.timer.start(delay).await == TimerEvent::Stopped {
                        logger.log_warning("polling cancelled");
                        return Ok(PollOutcome::Cancelled);
                    }
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::collections::VecDeque;
    use std::sync::Mutex;
    use std::time::Duration;

    use async_trait::async_trait;
    use vconv_models::{JobStatus, StatusEnvelope};

    use super::*;
    use crate::error::ClientError;
    use crate::timer::RepollTimer;

    /// Replays a fixed script of responses and records each request.
    struct ScriptedSource {
        script: Mutex<VecDeque<ClientResult<StatusEnvelope>>>,
        requests: Mutex<Vec<(JobId, tokio::time::Instant)>>,
    }

    impl ScriptedSource {
        fn new(script: Vec<ClientResult<StatusEnvelope>>) -> Self {
            Self {
                script: Mutex::new(script.into()),
                requests: Mutex::new(Vec::new()),
            }
        }

        fn requested_ids(&self) -> Vec<JobId> {
            self.requests.lock().unwrap().iter().map(|(id, _)| id.clone()).collect()
        }

        fn request_times(&self) -> Vec<tokio::time::Instant> {
            self.requests.lock().unwrap().iter().map(|(_, at)| *at).collect()
        }
    }

    #[async_trait]
    impl StatusSource for ScriptedSource {
        async fn fetch_status(&self, job_id: &JobId) -> ClientResult<StatusEnvelope> {
            self.requests
                .lock()
                .unwrap()
                .push((job_id.clone(), tokio::time::Instant::now()));
            self.script
                .lock()
                .unwrap()
                .pop_front()
                .unwrap_or_else(|| Err(ClientError::RequestFailed("script exhausted".into())))
        }
    }

    /// Timer that records requested delays and fires immediately.
    #[derive(Default)]
    struct RecordingTimer {
        delays: Mutex<Vec<Duration>>,
    }

    #[async_trait]
    impl Timer for RecordingTimer {
        async fn start(&self, delay: Duration) -> TimerEvent {
            self.delays.lock().unwrap().push(delay);
            TimerEvent::Fired
        }

        async fn stopped(&self) {
            std::future::pending::<()>().await
        }
    }

    fn job() -> JobId {
        JobId::from_string("job-1")
    }

    fn pending() -> ClientResult<StatusEnvelope> {
        Ok(StatusEnvelope::new(&job(), JobStatus::from("started")))
    }

    #[tokio::test]
    async fn test_pending_pending_finished() {
        let source = ScriptedSource::new(vec![
            pending(),
            pending(),
            Ok(StatusEnvelope::finished(&job(), "out.mp4")),
        ]);
        let timer = RecordingTimer::default();
        let mut poller = Poller::new(&source, &timer, PollConfig::default());

        let outcome = poller.run(job()).await.unwrap();

        assert_eq!(outcome, PollOutcome::Finished(Navigation::download("out.mp4")));
        assert_eq!(source.requested_ids().len(), 3);
        assert_eq!(
            *timer.delays.lock().unwrap(),
            vec![Duration::from_millis(2000), Duration::from_millis(2000)]
        );
        assert_eq!(
            poller.state(),
            &PollState::Finished(Navigation::download("out.mp4"))
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_poll_timing_with_real_timer() {
        let source = ScriptedSource::new(vec![
            pending(),
            pending(),
            Ok(StatusEnvelope::finished(&job(), "out.mp4")),
        ]);
        let timer = RepollTimer::new();
        let started = tokio::time::Instant::now();

        let outcome = Poller::new(&source, &timer, PollConfig::default())
            .run(job())
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Finished(Navigation::download("out.mp4")));
        let offsets: Vec<u128> = source
            .request_times()
            .iter()
            .map(|at| at.duration_since(started).as_millis())
            .collect();
        assert_eq!(offsets.len(), 3);
        assert!(offsets[0] < 10);
        assert!((2000..2010).contains(&offsets[1]));
        assert!((4000..4020).contains(&offsets[2]));
    }

    #[tokio::test]
    async fn test_failed_on_first_poll() {
        let source = ScriptedSource::new(vec![Ok(StatusEnvelope::new(&job(), JobStatus::Failed))]);
        let timer = RecordingTimer::default();

        let outcome = Poller::new(&source, &timer, PollConfig::default())
            .run(job())
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Failed);
        assert_eq!(source.requested_ids().len(), 1);
        assert!(timer.delays.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_repoll_follows_echoed_id() {
        let other = JobId::from_string("job-2");
        let source = ScriptedSource::new(vec![
            Ok(StatusEnvelope::new(&other, JobStatus::from("queued"))),
            Ok(StatusEnvelope::new(&other, JobStatus::Failed)),
        ]);
        let timer = RecordingTimer::default();

        Poller::new(&source, &timer, PollConfig::default())
            .run(job())
            .await
            .unwrap();

        assert_eq!(source.requested_ids(), vec![job(), other]);
    }

    #[tokio::test]
    async fn test_transport_error_stops_without_retry() {
        let source = ScriptedSource::new(vec![
            pending(),
            Err(ClientError::RequestFailed("connection reset".into())),
            Ok(StatusEnvelope::finished(&job(), "never.mp4")),
        ]);
        let timer = RecordingTimer::default();
        let mut poller = Poller::new(&source, &timer, PollConfig::default());

        let err = poller.run(job()).await.unwrap_err();

        assert!(matches!(err, ClientError::RequestFailed(_)));
        assert_eq!(source.requested_ids().len(), 2);
        assert_eq!(poller.state(), &PollState::Failed);
    }

    #[tokio::test]
    async fn test_error_envelope_stops() {
        let source = ScriptedSource::new(vec![Ok(StatusEnvelope {
            status: Some("error".into()),
            data: None,
        })]);
        let timer = RecordingTimer::default();

        let err = Poller::new(&source, &timer, PollConfig::default())
            .run(job())
            .await
            .unwrap_err();

        assert!(matches!(err, ClientError::InvalidResponse(_)));
    }

    #[tokio::test]
    async fn test_max_attempts() {
        let source = ScriptedSource::new(vec![pending(), pending(), pending(), pending()]);
        let timer = RecordingTimer::default();
        let config = PollConfig::default().with_max_attempts(3);

        let outcome = Poller::new(&source, &timer, config).run(job()).await.unwrap();

        assert_eq!(outcome, PollOutcome::Exhausted { attempts: 3 });
        assert_eq!(source.requested_ids().len(), 3);
        assert_eq!(timer.delays.lock().unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_backoff_delays() {
        let source = ScriptedSource::new(vec![
            pending(),
            pending(),
            pending(),
            Ok(StatusEnvelope::new(&job(), JobStatus::Failed)),
        ]);
        let timer = RecordingTimer::default();
        let config = PollConfig::fixed(Duration::from_millis(1000)).with_backoff(2.0);

        Poller::new(&source, &timer, config).run(job()).await.unwrap();

        assert_eq!(
            *timer.delays.lock().unwrap(),
            vec![
                Duration::from_millis(1000),
                Duration::from_millis(2000),
                Duration::from_millis(4000)
            ]
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_stop_cancels_loop() {
        let source = ScriptedSource::new(vec![pending(), pending(), pending()]);
        let timer = RepollTimer::new();
        let handle = timer.stop_handle();

        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(3000)).await;
            handle.stop();
        });

        let outcome = Poller::new(&source, &timer, PollConfig::default())
            .run(job())
            .await
            .unwrap();

        assert_eq!(outcome, PollOutcome::Cancelled);
        assert_eq!(source.requested_ids().len(), 2);
    }
}
