use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};

use bytes::Bytes;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use tokio::sync::Notify;

use crate::relay::frame::Frame;

/// What to throw away when a bounded queue is full.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Overflow {
    /// Evict the oldest queued frame to make room (keeps the stream fresh).
    #[default]
    DropOldest,
    /// Discard the frame being pushed.
    DropNewest,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct QueueConfig {
    /// None = unbounded
    pub capacity: Option<usize>,
    pub overflow: Overflow,
}

impl QueueConfig {
    pub fn unbounded() -> Self {
        Self::default()
    }

    pub fn bounded(capacity: usize, overflow: Overflow) -> Self {
        Self {
            capacity: Some(capacity.max(1)),
            overflow,
        }
    }
}

/// FIFO hand-off between the capture worker and the forwarding worker.
///
/// `push` never blocks on the consumer and never fails. With a capacity
/// configured, overflowing frames are evicted according to [`Overflow`] and
/// counted; otherwise the queue grows without bound.
pub struct FrameQueue {
    frames: Mutex<VecDeque<Frame>>,
    notify: Notify,
    config: QueueConfig,
    evicted: AtomicU64,
}

impl FrameQueue {
    pub fn new(config: QueueConfig) -> Self {
        Self {
            frames: Mutex::new(VecDeque::new()),
            notify: Notify::new(),
            config,
            evicted: AtomicU64::new(0),
        }
    }

    pub fn unbounded() -> Self {
        Self::new(QueueConfig::unbounded())
    }

    /// Append a frame at the tail and wake the consumer.
    pub fn push(&self, payload: impl Into<Bytes>) {
        let frame = Frame::new(payload);
        {
            let mut frames = self.frames.lock();
            if let Some(capacity) = self.config.capacity {
                if frames.len() >= capacity {
                    self.evicted.fetch_add(1, Ordering::Relaxed);
                    match self.config.overflow {
                        Overflow::DropOldest => {
                            frames.pop_front();
                        }
                        Overflow::DropNewest => return,
                    }
                }
            }
            frames.push_back(frame);
        }
        self.notify.notify_one();
    }

    /// Remove the oldest frame, or `None` right away when the queue is empty.
    pub fn pop_front(&self) -> Option<Frame> {
        self.frames.lock().pop_front()
    }

    pub fn len(&self) -> usize {
        self.frames.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.frames.lock().is_empty()
    }

    /// Drop everything still queued, returning how many frames were discarded.
    pub fn clear(&self) -> usize {
        let mut frames = self.frames.lock();
        let n = frames.len();
        frames.clear();
        n
    }

    /// Frames discarded by the overflow policy so far.
    pub fn evicted(&self) -> u64 {
        self.evicted.load(Ordering::Relaxed)
    }

    pub fn config(&self) -> QueueConfig {
        self.config
    }

    /// Resolves after the next `push` (or immediately if one happened since the
    /// last wake-up).
    pub async fn notified(&self) {
        self.notify.notified().await
    }
}

impl Default for FrameQueue {
    fn default() -> Self {
        Self::unbounded()
    }
}

#[cfg(test)]
#[path = "queue_test.rs"]
mod queue_test;
