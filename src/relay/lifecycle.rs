use std::fmt::{Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::{sync::watch, task::JoinHandle};
use tokio_util::sync::CancellationToken;

use crate::RelayError;
use crate::relay::{
    capture::{CaptureExit, FrameSource, run_capture},
    forward::{DrainPolicy, ForwardExit, ForwardOptions, Forwarder},
    queue::{FrameQueue, QueueConfig},
    sink::DatagramSink,
    stats::{RelayStats, RelaySummary},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RelayState {
    Idle,
    Running,
    Draining,
    Stopped,
}

impl Display for RelayState {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            RelayState::Idle => "idle",
            RelayState::Running => "running",
            RelayState::Draining => "draining",
            RelayState::Stopped => "stopped",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct RelayOptions {
    pub queue: QueueConfig,
    pub forward: ForwardOptions,
}

impl RelayOptions {
    /// How long shutdown waits for the capture worker to leave its pull.
    fn capture_join_timeout(&self) -> Duration {
        match self.forward.drain {
            DrainPolicy::Drain { timeout } => timeout,
            DrainPolicy::Discard => self.forward.poll_interval,
        }
    }
}

struct Workers {
    capture: JoinHandle<CaptureExit>,
    forward: JoinHandle<ForwardExit>,
}

/// Owns the frame queue, the stop signal and both workers.
///
/// ```text
/// Idle ──start──► Running ──stop requested──► Draining ──workers joined──► Stopped
/// ```
///
/// The stop signal is set by [`Relay::request_stop`], by [`Relay::shutdown`],
/// or by the capture worker when the source ends or fails.
pub struct Relay {
    options: RelayOptions,
    queue: Arc<FrameQueue>,
    stats: Arc<RelayStats>,
    stop: CancellationToken,
    state: watch::Sender<RelayState>,
    workers: Mutex<Option<Workers>>,
}

impl Relay {
    pub fn new(options: RelayOptions) -> Self {
        let (state, _) = watch::channel(RelayState::Idle);
        Self {
            queue: Arc::new(FrameQueue::new(options.queue)),
            stats: Arc::new(RelayStats::new()),
            stop: CancellationToken::new(),
            state,
            workers: Mutex::new(None),
            options,
        }
    }

    pub fn state(&self) -> RelayState {
        *self.state.borrow()
    }

    pub fn subscribe(&self) -> watch::Receiver<RelayState> {
        self.state.subscribe()
    }

    pub fn queue(&self) -> &Arc<FrameQueue> {
        &self.queue
    }

    pub fn stats(&self) -> &Arc<RelayStats> {
        &self.stats
    }

    pub fn summary(&self) -> RelaySummary {
        self.stats.snapshot(self.queue.evicted())
    }

    /// Start both workers. Must be called from inside a tokio runtime.
    pub fn start<S, D>(&self, source: S, sink: D) -> Result<(), RelayError>
    where
        S: FrameSource,
        D: DatagramSink,
    {
        let mut workers = self.workers.lock();
        self.transition(RelayState::Idle, RelayState::Running)?;

        let capture_done = CancellationToken::new();

        let capture = {
            let queue = self.queue.clone();
            let stats = self.stats.clone();
            let stop = self.stop.clone();
            let done = capture_done.clone().drop_guard();
            tokio::task::spawn_blocking(move || {
                let _done = done;
                run_capture(source, queue, stats, stop)
            })
        };

        let forwarder = Forwarder::new(
            self.queue.clone(),
            sink,
            self.stats.clone(),
            self.stop.clone(),
            capture_done,
            self.options.forward,
        );
        let forward = tokio::spawn(forwarder.run());

        *workers = Some(Workers { capture, forward });
        log::info!("relay running");
        Ok(())
    }

    /// Set the stop signal without waiting. Idempotent.
    pub fn request_stop(&self) {
        self.stop.cancel();
    }

    /// Resolves once the stop signal is set, by anyone.
    pub async fn stopped(&self) {
        self.stop.cancelled().await
    }

    /// Stop both workers and wait for them, draining per the configured
    /// [`DrainPolicy`]. Calling it again after the relay stopped just returns
    /// the summary.
    pub async fn shutdown(&self) -> Result<RelaySummary, RelayError> {
        let workers = {
            let mut workers = self.workers.lock();
            match self.state() {
                RelayState::Stopped => return Ok(self.summary()),
                RelayState::Running => {}
                actual => {
                    return Err(RelayError::InvalidState {
                        actual,
                        expected: RelayState::Running,
                    });
                }
            }
            self.state.send_replace(RelayState::Draining);
            workers.take()
        };

        log::info!("relay draining");
        self.stop.cancel();

        if let Some(Workers {
            mut capture,
            forward,
        }) = workers
        {
            let join_timeout = self.options.capture_join_timeout();
            match tokio::time::timeout(join_timeout, &mut capture).await {
                Ok(Ok(exit)) => log::info!("capture worker exited: {:?}", exit),
                Ok(Err(e)) => log::error!("capture worker panicked: {}", e),
                Err(_) => log::warn!(
                    "capture worker still blocked in the pipeline after {:?}, leaving it behind",
                    join_timeout
                ),
            }

            match forward.await {
                Ok(exit) => log::info!("forwarding worker exited: {:?}", exit),
                Err(e) => log::error!("forwarding worker panicked: {}", e),
            }
        }

        self.state.send_replace(RelayState::Stopped);
        let summary = self.summary();
        log::info!("relay stopped");
        Ok(summary)
    }

    fn transition(&self, from: RelayState, to: RelayState) -> Result<(), RelayError> {
        let actual = self.state();
        if actual != from {
            return Err(RelayError::InvalidState {
                actual,
                expected: from,
            });
        }
        self.state.send_replace(to);
        Ok(())
    }
}

#[cfg(test)]
#[path = "lifecycle_test.rs"]
mod lifecycle_test;
