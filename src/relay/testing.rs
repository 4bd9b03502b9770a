//! Test doubles for the relay workers.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use bytes::Bytes;
use parking_lot::Mutex;

use crate::relay::{
    capture::{FrameSource, Pull},
    sink::DatagramSink,
};

pub(crate) enum Step {
    Frame(Vec<u8>),
    Pending,
    End,
    Fail(&'static str),
}

/// Replays a fixed script, then keeps reporting `Pending` (like a live
/// input with no traffic) unless the script ended the stream.
pub(crate) struct ScriptedSource {
    steps: VecDeque<Step>,
    pulls: Arc<AtomicUsize>,
}

impl ScriptedSource {
    pub(crate) fn new(steps: Vec<Step>) -> Self {
        Self {
            steps: steps.into(),
            pulls: Arc::new(AtomicUsize::new(0)),
        }
    }

    pub(crate) fn frames<I: IntoIterator<Item = Vec<u8>>>(payloads: I) -> Self {
        Self::new(payloads.into_iter().map(Step::Frame).collect())
    }

    pub(crate) fn pull_counter(&self) -> Arc<AtomicUsize> {
        self.pulls.clone()
    }
}

impl FrameSource for ScriptedSource {
    fn pull(&mut self) -> anyhow::Result<Pull> {
        self.pulls.fetch_add(1, Ordering::Relaxed);
        match self.steps.pop_front() {
            Some(Step::Frame(payload)) => Ok(Pull::Frame(Bytes::from(payload))),
            Some(Step::Pending) => Ok(Pull::Pending),
            Some(Step::End) => {
                self.steps.push_front(Step::End);
                Ok(Pull::End)
            }
            Some(Step::Fail(msg)) => Err(anyhow::anyhow!(msg)),
            None => {
                std::thread::sleep(Duration::from_millis(1));
                Ok(Pull::Pending)
            }
        }
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

/// Records every datagram; optionally fails the n-th send (0-based).
#[derive(Clone, Default)]
pub(crate) struct RecordingSink {
    datagrams: Arc<Mutex<Vec<Vec<u8>>>>,
    fail_on: Arc<Mutex<Vec<usize>>>,
    sends: Arc<AtomicUsize>,
}

impl RecordingSink {
    pub(crate) fn new() -> Self {
        Self::default()
    }

    pub(crate) fn failing_on(sends: Vec<usize>) -> Self {
        let sink = Self::default();
        *sink.fail_on.lock() = sends;
        sink
    }

    pub(crate) fn datagrams(&self) -> Vec<Vec<u8>> {
        self.datagrams.lock().clone()
    }
}

impl DatagramSink for RecordingSink {
    async fn send(&mut self, datagram: &[u8]) -> std::io::Result<()> {
        let attempt = self.sends.fetch_add(1, Ordering::Relaxed);
        if self.fail_on.lock().contains(&attempt) {
            return Err(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                "injected send failure",
            ));
        }
        self.datagrams.lock().push(datagram.to_vec());
        Ok(())
    }
}
