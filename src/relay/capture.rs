use std::sync::Arc;

use bytes::Bytes;
use tokio_util::sync::CancellationToken;

use crate::relay::{queue::FrameQueue, stats::RelayStats};

/// Result of one blocking pull on a [`FrameSource`].
#[derive(Debug)]
pub enum Pull {
    /// One complete encoded still, copied out of the pipeline.
    Frame(Bytes),
    /// Nothing available yet; pull again.
    Pending,
    /// The stream ended.
    End,
}

/// The media pipeline the capture worker drains.
///
/// `pull` may block. An `Err` is a fatal pipeline error.
pub trait FrameSource: Send + 'static {
    fn pull(&mut self) -> anyhow::Result<Pull>;

    fn name(&self) -> &str {
        "source"
    }
}

impl<S: FrameSource + ?Sized> FrameSource for Box<S> {
    fn pull(&mut self) -> anyhow::Result<Pull> {
        (**self).pull()
    }

    fn name(&self) -> &str {
        (**self).name()
    }
}

/// Why the capture worker returned.
#[derive(Debug)]
pub enum CaptureExit {
    /// The stop signal was observed.
    Stopped,
    EndOfStream,
    Failed(anyhow::Error),
}

/// Capture loop: runs on a blocking thread until the stop signal is set or
/// the source ends or fails. Ending or failing sets the stop signal itself.
///
/// The only suspension point is `source.pull()`; the queue push never waits
/// on the forwarding side.
pub(crate) fn run_capture<S: FrameSource>(
    mut source: S,
    queue: Arc<FrameQueue>,
    stats: Arc<RelayStats>,
    stop: CancellationToken,
) -> CaptureExit {
    log::info!("capture worker started: {}", source.name());
    let mut frame_count: u64 = 0;
    let exit = loop {
        if stop.is_cancelled() {
            break CaptureExit::Stopped;
        }
        match source.pull() {
            Ok(Pull::Frame(payload)) => {
                log::trace!("captured frame {} ({} bytes)", frame_count, payload.len());
                queue.push(payload);
                stats.record_captured();
                frame_count += 1;
            }
            Ok(Pull::Pending) => continue,
            Ok(Pull::End) => {
                log::info!("{}: end of stream", source.name());
                stop.cancel();
                break CaptureExit::EndOfStream;
            }
            Err(e) => {
                log::error!("{}: pipeline error: {:#}", source.name(), e);
                stop.cancel();
                break CaptureExit::Failed(e);
            }
        }
    };
    log::info!("capture worker finished after {} frames", frame_count);
    exit
}

#[cfg(test)]
#[path = "capture_test.rs"]
mod capture_test;
