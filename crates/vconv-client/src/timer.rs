//! Cancellable re-poll timer.
//!
//! The poll loop never sleeps directly; it goes through a [`Timer`] so a
//! pending wait can be stopped from outside (navigation, Ctrl+C) and so tests
//! can observe the requested delays without waiting for them.

use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::watch;

/// How a timer wait ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimerEvent {
    Fired,
    Stopped,
}

#[async_trait]
pub trait Timer: Send + Sync {
    /// Start a wait of `delay`.
    async fn start(&self, delay: Duration) -> TimerEvent;

    /// Resolve once the timer is stopped. Never resolves for a timer that
    /// cannot be stopped.
    async fn stopped(&self);
}

/// Handle that stops a [`RepollTimer`] from another task.
#[derive(Debug, Clone)]
pub struct StopHandle {
    cancel_tx: Arc<watch::Sender<bool>>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.cancel_tx.send_replace(true);
    }

    pub fn is_stopped(&self) -> bool {
        *self.cancel_tx.borrow()
    }
}

/// Tokio-backed timer with a stop/reset switch.
///
/// Once stopped, every wait returns [`TimerEvent::Stopped`] until
/// [`RepollTimer::reset`] is called.
#[derive(Debug, Clone)]
pub struct RepollTimer {
    cancel_tx: Arc<watch::Sender<bool>>,
    cancel_rx: watch::Receiver<bool>,
}

impl Default for RepollTimer {
    fn default() -> Self {
        Self::new()
    }
}

impl RepollTimer {
    pub fn new() -> Self {
        let (cancel_tx, cancel_rx) = watch::channel(false);
        Self {
            cancel_tx: Arc::new(cancel_tx),
            cancel_rx,
        }
    }

    /// Stop pending and future waits.
    pub fn stop(&self) {
        self.cancel_tx.send_replace(true);
    }

    /// Re-arm the timer after a stop.
    pub fn reset(&self) {
        self.cancel_tx.send_replace(false);
    }

    pub fn is_stopped(&self) -> bool {
        *self.cancel_rx.borrow()
    }

    pub fn stop_handle(&self) -> StopHandle {
        StopHandle {
            cancel_tx: Arc::clone(&self.cancel_tx),
        }
    }
}

#[async_trait]
impl Timer for RepollTimer {
    async fn start(&self, delay: Duration) -> TimerEvent {
        if self.is_stopped() {
            return TimerEvent::Stopped;
        }

        tokio::select! {
            _ = tokio::time::sleep(delay) => {
                if self.is_stopped() {
                    TimerEvent::Stopped
                } else {
                    TimerEvent::Fired
                }
            }
            _ = self.stopped() => TimerEvent::Stopped,
        }
    }

    async fn stopped(&self) {
        let mut rx = self.cancel_rx.clone();
        // The sender lives as long as the timer, so this only ends on a stop
        let outcome = rx.wait_for(|stopped| *stopped).await.map(|_| ());
        if outcome.is_err() {
            std::future::pending::<()>().await;
        }
    }
}
