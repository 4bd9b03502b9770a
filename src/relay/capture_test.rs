use std::sync::Arc;
use std::sync::atomic::Ordering;
use std::time::Duration;

use tokio_util::sync::CancellationToken;

use super::{CaptureExit, run_capture};
use crate::relay::{
    queue::FrameQueue,
    stats::RelayStats,
    testing::{ScriptedSource, Step},
};

fn harness() -> (Arc<FrameQueue>, Arc<RelayStats>, CancellationToken) {
    (
        Arc::new(FrameQueue::unbounded()),
        Arc::new(RelayStats::new()),
        CancellationToken::new(),
    )
}

#[test]
fn test_capture_pushes_in_order_until_end() {
    let (queue, stats, stop) = harness();
    let source = ScriptedSource::new(vec![
        Step::Frame(vec![1; 10]),
        Step::Pending,
        Step::Frame(vec![]),
        Step::Pending,
        Step::Pending,
        Step::Frame(vec![3; 4096]),
        Step::End,
    ]);

    let exit = run_capture(source, queue.clone(), stats.clone(), stop.clone());

    assert!(matches!(exit, CaptureExit::EndOfStream));
    assert!(stop.is_cancelled(), "end of stream sets the stop signal");
    assert_eq!(stats.captured(), 3);
    assert_eq!(queue.pop_front().unwrap().len(), 10);
    assert_eq!(queue.pop_front().unwrap().len(), 0);
    assert_eq!(queue.pop_front().unwrap().len(), 4096);
    assert!(queue.pop_front().is_none());
}

#[test]
fn test_capture_fatal_error_stops_within_one_iteration() {
    let (queue, stats, stop) = harness();
    let source = ScriptedSource::new(vec![
        Step::Frame(vec![1, 2, 3]),
        Step::Fail("decoder exploded"),
        Step::Frame(vec![9; 100]),
    ]);
    let pulls = source.pull_counter();

    let exit = run_capture(source, queue.clone(), stats.clone(), stop.clone());

    match exit {
        CaptureExit::Failed(e) => assert!(e.to_string().contains("decoder exploded")),
        other => panic!("expected Failed, got {:?}", other),
    }
    assert!(stop.is_cancelled());
    assert_eq!(pulls.load(Ordering::Relaxed), 2, "no pull after the fatal one");
    // only the complete frame before the failure is queued
    assert_eq!(queue.len(), 1);
    assert_eq!(queue.pop_front().unwrap().payload().as_ref(), &[1, 2, 3]);
    assert_eq!(stats.captured(), 1);
}

#[test]
fn test_capture_observes_stop_signal() {
    let (queue, stats, stop) = harness();
    // script runs out and keeps reporting Pending
    let source = ScriptedSource::frames(vec![vec![0u8; 8]]);

    let worker = {
        let queue = queue.clone();
        let stats = stats.clone();
        let stop = stop.clone();
        std::thread::spawn(move || run_capture(source, queue, stats, stop))
    };

    std::thread::sleep(Duration::from_millis(30));
    stop.cancel();
    let exit = worker.join().unwrap();

    assert!(matches!(exit, CaptureExit::Stopped));
    assert_eq!(queue.len(), 1);
}

#[test]
fn test_capture_does_not_start_when_already_stopped() {
    let (queue, stats, stop) = harness();
    stop.cancel();
    let source = ScriptedSource::frames(vec![vec![1u8]]);
    let pulls = source.pull_counter();

    let exit = run_capture(source, queue.clone(), stats, stop);

    assert!(matches!(exit, CaptureExit::Stopped));
    assert_eq!(pulls.load(Ordering::Relaxed), 0);
    assert!(queue.is_empty());
}
