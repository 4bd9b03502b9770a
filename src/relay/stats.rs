use std::sync::atomic::{AtomicU64, Ordering};

use serde::Serialize;

/// Counters shared by both workers and the controller.
#[derive(Debug, Default)]
pub struct RelayStats {
    captured: AtomicU64,
    forwarded: AtomicU64,
    bytes_sent: AtomicU64,
    send_errors: AtomicU64,
    abandoned: AtomicU64,
}

impl RelayStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub(crate) fn record_captured(&self) {
        self.captured.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_forwarded(&self, bytes: usize) {
        self.forwarded.fetch_add(1, Ordering::Relaxed);
        self.bytes_sent.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn record_send_error(&self) {
        self.send_errors.fetch_add(1, Ordering::Relaxed);
    }

    pub(crate) fn record_abandoned(&self, frames: usize) {
        self.abandoned.fetch_add(frames as u64, Ordering::Relaxed);
    }

    pub fn captured(&self) -> u64 {
        self.captured.load(Ordering::Relaxed)
    }

    pub fn forwarded(&self) -> u64 {
        self.forwarded.load(Ordering::Relaxed)
    }

    pub fn send_errors(&self) -> u64 {
        self.send_errors.load(Ordering::Relaxed)
    }

    /// `evicted` comes from the queue, which owns the overflow policy.
    pub fn snapshot(&self, evicted: u64) -> RelaySummary {
        RelaySummary {
            captured: self.captured(),
            forwarded: self.forwarded(),
            bytes_sent: self.bytes_sent.load(Ordering::Relaxed),
            send_errors: self.send_errors(),
            evicted,
            abandoned: self.abandoned.load(Ordering::Relaxed),
        }
    }
}

/// Point-in-time copy of [`RelayStats`], logged as JSON on exit.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize)]
pub struct RelaySummary {
    pub captured: u64,
    pub forwarded: u64,
    pub bytes_sent: u64,
    pub send_errors: u64,
    pub evicted: u64,
    pub abandoned: u64,
}
