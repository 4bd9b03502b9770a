use std::sync::Arc;
use std::time::Duration;

use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

use crate::RelayError;
use crate::relay::{
    frame::Frame,
    queue::FrameQueue,
    sink::DatagramSink,
    stats::RelayStats,
    wire::{self, ByteOrder},
};

/// Idle re-check interval when no push wakes the worker.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(100);
pub const DEFAULT_DRAIN_TIMEOUT: Duration = Duration::from_secs(2);

/// What the forwarding worker does with queued frames once stop is requested.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum DrainPolicy {
    /// Keep sending until capture has exited and the queue is empty, or the
    /// timeout runs out.
    Drain { timeout: Duration },
    /// Exit at once; whatever is queued is abandoned.
    Discard,
}

impl Default for DrainPolicy {
    fn default() -> Self {
        DrainPolicy::Drain {
            timeout: DEFAULT_DRAIN_TIMEOUT,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct ForwardOptions {
    pub byte_order: ByteOrder,
    pub poll_interval: Duration,
    pub drain: DrainPolicy,
}

impl Default for ForwardOptions {
    fn default() -> Self {
        Self {
            byte_order: ByteOrder::default(),
            poll_interval: DEFAULT_POLL_INTERVAL,
            drain: DrainPolicy::default(),
        }
    }
}

/// Why the forwarding worker returned.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ForwardExit {
    /// Capture finished and every queued frame was sent.
    Drained,
    /// The drain timeout ran out with frames still queued.
    DrainTimedOut { abandoned: usize },
    /// Stopped under [`DrainPolicy::Discard`].
    Discarded { abandoned: usize },
}

/// Consumer side of the relay: pops frames, numbers them and sends each one
/// as a sequence / length / payload datagram triple.
pub struct Forwarder<S> {
    queue: Arc<FrameQueue>,
    sink: S,
    stats: Arc<RelayStats>,
    stop: CancellationToken,
    capture_done: CancellationToken,
    options: ForwardOptions,
    next_sequence: u32,
}

impl<S: DatagramSink> Forwarder<S> {
    /// `capture_done` must be cancelled once the capture worker can no longer
    /// push; draining waits for it.
    pub fn new(
        queue: Arc<FrameQueue>,
        sink: S,
        stats: Arc<RelayStats>,
        stop: CancellationToken,
        capture_done: CancellationToken,
        options: ForwardOptions,
    ) -> Self {
        Self {
            queue,
            sink,
            stats,
            stop,
            capture_done,
            options,
            next_sequence: 0,
        }
    }

    pub async fn run(mut self) -> ForwardExit {
        log::info!(
            "forwarding worker started (byte order: {}, poll: {:?}, drain: {:?})",
            self.options.byte_order,
            self.options.poll_interval,
            self.options.drain
        );
        let mut drain_deadline: Option<Instant> = None;
        let exit = loop {
            let stopping = self.stop.is_cancelled();
            if stopping {
                match self.options.drain {
                    DrainPolicy::Discard => {
                        break ForwardExit::Discarded {
                            abandoned: self.queue.clear(),
                        };
                    }
                    DrainPolicy::Drain { timeout } => {
                        let deadline = *drain_deadline.get_or_insert_with(|| {
                            log::info!("draining {} queued frames", self.queue.len());
                            Instant::now() + timeout
                        });
                        if Instant::now() >= deadline {
                            break ForwardExit::DrainTimedOut {
                                abandoned: self.queue.clear(),
                            };
                        }
                        if self.capture_done.is_cancelled() && self.queue.is_empty() {
                            break ForwardExit::Drained;
                        }
                    }
                }
            }

            if let Some(frame) = self.queue.pop_front() {
                self.forward(frame).await;
                continue;
            }

            let capture_running = !self.capture_done.is_cancelled();
            tokio::select! {
                _ = self.queue.notified() => {},
                _ = tokio::time::sleep(self.options.poll_interval) => {},
                _ = self.stop.cancelled(), if !stopping => {},
                _ = self.capture_done.cancelled(), if stopping && capture_running => {},
            }
        };

        match exit {
            ForwardExit::Drained => log::info!("forwarding worker drained, exiting"),
            ForwardExit::DrainTimedOut { abandoned } => log::warn!(
                "forwarding worker drain timed out, {} frames abandoned",
                abandoned
            ),
            ForwardExit::Discarded { abandoned } => {
                log::info!("forwarding worker stopped, {} frames discarded", abandoned)
            }
        }
        if let ForwardExit::DrainTimedOut { abandoned } | ForwardExit::Discarded { abandoned } =
            exit
        {
            self.stats.record_abandoned(abandoned);
        }
        exit
    }

    /// Sends one frame. The sequence number is consumed even when sending
    /// fails, so receivers see a gap instead of a reused number.
    async fn forward(&mut self, frame: Frame) {
        let sequence = self.next_sequence;
        self.next_sequence = self.next_sequence.wrapping_add(1);

        match self.send_triple(sequence, &frame).await {
            Ok(()) => self.stats.record_forwarded(frame.len()),
            Err(e) => {
                log::warn!("frame {} not sent: {}", sequence, e);
                self.stats.record_send_error();
            }
        }
    }

    /// Nothing goes out for a frame that cannot be framed; the first failed
    /// datagram aborts the rest of the triple.
    async fn send_triple(&mut self, sequence: u32, frame: &Frame) -> Result<(), RelayError> {
        let datagrams = wire::encode(sequence, frame, self.options.byte_order)?;
        log::debug!("frame: {} length: {}", sequence, frame.len());
        for datagram in datagrams.iter() {
            self.sink.send(datagram).await?;
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "forward_test.rs"]
mod forward_test;
