//! Frame source and session runner tests
//!
//! Tests:
//! - The latest-frame slot keeps only the newest frame and counts the rest
//! - Streams end when the publisher goes away
//! - Stop ends a run without a partial commit, even mid-wait
//! - A frame left pending at stop is never processed after restart
//! - Classifier failure ends a run with an error

mod helpers;

use std::collections::VecDeque;
use std::time::Duration;

use fsr_common::events::SpellEvent;
use fsr_rec::confirm::ConfirmationState;
use fsr_rec::landmarks::LandmarkFrame;
use fsr_rec::source::{
    latest_frame_channel, run_session, stop_signal, FrameQueue, FrameSource, StopHandle,
};
use fsr_rec::{Error, RecognitionSession, Symbol};
use helpers::{config, drain, event_bus, FailingClassifier, FrameScript};

fn frame(sequence: u64) -> LandmarkFrame {
    LandmarkFrame::empty(sequence, sequence * 33)
}

/// Serves its frames, then requests a stop and waits forever
struct StoppingSource {
    frames: VecDeque<LandmarkFrame>,
    stop: StopHandle,
}

impl FrameSource for StoppingSource {
    async fn next_frame(&mut self) -> Option<LandmarkFrame> {
        if let Some(frame) = self.frames.pop_front() {
            return Some(frame);
        }
        self.stop.stop();
        std::future::pending().await
    }
}

#[tokio::test]
async fn test_latest_slot_replaces_stale_frames() {
    let (publisher, mut receiver) = latest_frame_channel();

    publisher.publish(frame(0));
    assert_eq!(receiver.next_frame().await.unwrap().sequence, 0);

    // Pipeline busy: three frames arrive, only the newest survives
    publisher.publish(frame(1));
    publisher.publish(frame(2));
    publisher.publish(frame(3));
    assert_eq!(receiver.next_frame().await.unwrap().sequence, 3);
    assert_eq!(receiver.dropped_frames(), 2);

    publisher.publish(frame(4));
    assert_eq!(receiver.next_frame().await.unwrap().sequence, 4);
    assert_eq!(receiver.dropped_frames(), 2);
}

#[tokio::test]
async fn test_latest_slot_ends_when_publisher_dropped() {
    let (publisher, mut receiver) = latest_frame_channel();
    publisher.publish(frame(7));
    drop(publisher);

    // The pending frame is still delivered
    assert_eq!(receiver.next_frame().await.unwrap().sequence, 7);
    assert!(receiver.next_frame().await.is_none());
}

#[tokio::test]
async fn test_latest_slot_waits_for_publisher() {
    let (publisher, mut receiver) = latest_frame_channel();

    let capture = tokio::spawn(async move {
        tokio::time::sleep(Duration::from_millis(20)).await;
        publisher.publish(frame(1));
        tokio::time::sleep(Duration::from_millis(20)).await;
    });

    let received = tokio::time::timeout(Duration::from_secs(5), receiver.next_frame())
        .await
        .expect("frame should arrive");
    assert_eq!(received.unwrap().sequence, 1);

    capture.await.unwrap();
    assert!(receiver.next_frame().await.is_none());
}

#[tokio::test]
async fn test_sequence_gaps_saturate() {
    let (publisher, mut receiver) = latest_frame_channel();

    publisher.publish(frame(5));
    receiver.next_frame().await.unwrap();

    // Capture restarted its numbering: not a gap
    publisher.publish(frame(2));
    assert_eq!(receiver.next_frame().await.unwrap().sequence, 2);
    assert_eq!(receiver.dropped_frames(), 0);

    publisher.publish(LandmarkFrame::empty(u64::MAX, 0));
    assert_eq!(receiver.next_frame().await.unwrap().sequence, u64::MAX);
    assert_eq!(receiver.dropped_frames(), u64::MAX - 3);

    publisher.publish(frame(0));
    receiver.next_frame().await.unwrap();
    assert_eq!(receiver.dropped_frames(), u64::MAX - 3);
}

#[tokio::test]
async fn test_discard_pending_skips_unpulled_frame() {
    let (publisher, mut receiver) = latest_frame_channel();

    publisher.publish(frame(0));
    receiver.next_frame().await.unwrap();

    // Already delivered: nothing to discard
    receiver.discard_pending();
    assert_eq!(receiver.dropped_frames(), 0);

    publisher.publish(frame(1));
    receiver.discard_pending();
    assert_eq!(receiver.dropped_frames(), 1);

    publisher.publish(frame(2));
    assert_eq!(receiver.next_frame().await.unwrap().sequence, 2);
    assert_eq!(receiver.dropped_frames(), 1);
}

#[tokio::test]
async fn test_publisher_sees_closed_receiver() {
    let (publisher, receiver) = latest_frame_channel();
    assert!(!publisher.is_closed());
    drop(receiver);
    assert!(publisher.is_closed());
}

#[tokio::test]
async fn test_queue_run_commits_in_order() {
    let (bus, _rx) = event_bus();
    let script = FrameScript::new()
        .hold(Symbol::Letter('A'), 3)
        .hold(Symbol::Letter('B'), 3);
    let mut session = RecognitionSession::new(&config(3, 1), script.classifier.clone(), bus);
    let mut queue = FrameQueue::new(script.frames.clone());
    let (_stop, mut stop_rx) = stop_signal();

    let summary = run_session(&mut session, &mut queue, &mut stop_rx)
        .await
        .unwrap();

    assert_eq!(summary.frames, 6);
    assert_eq!(summary.skipped, 0);
    assert_eq!(summary.commits, vec![Symbol::Letter('A'), Symbol::Letter('B')]);
    assert_eq!(summary.dropped_frames, 0);
    assert!(!summary.stopped);
    assert_eq!(queue.remaining(), 0);
    assert_eq!(session.sentence(), "AB");
}

#[tokio::test]
async fn test_stop_before_run() {
    let (bus, mut rx) = event_bus();
    let script = FrameScript::new().hold(Symbol::Letter('A'), 3);
    let mut session = RecognitionSession::new(&config(3, 1), script.classifier.clone(), bus);
    let mut queue = FrameQueue::new(script.frames.clone());

    let (stop, mut stop_rx) = stop_signal();
    stop.stop();
    assert!(stop_rx.is_stopped());

    let summary = run_session(&mut session, &mut queue, &mut stop_rx)
        .await
        .unwrap();

    assert!(summary.stopped);
    assert_eq!(summary.frames, 0);
    assert!(summary.commits.is_empty());
    assert_eq!(queue.remaining(), 3);
    assert!(session.is_stopped());

    let events = drain(&mut rx);
    assert!(matches!(events.as_slice(), [SpellEvent::RecognitionStopped { .. }]));
}

#[tokio::test]
async fn test_stop_while_waiting_discards_progress() {
    let (bus, mut rx) = event_bus();
    let script = FrameScript::new().hold(Symbol::Letter('A'), 2);
    let mut session = RecognitionSession::new(&config(3, 1), script.classifier.clone(), bus);

    let (stop, mut stop_rx) = stop_signal();
    let mut source = StoppingSource {
        frames: script.frames.iter().cloned().collect(),
        stop,
    };

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        run_session(&mut session, &mut source, &mut stop_rx),
    )
    .await
    .expect("stop should end the run")
    .unwrap();

    assert!(summary.stopped);
    assert_eq!(summary.frames, 2);
    assert!(summary.commits.is_empty());
    assert_eq!(session.confirmation_state(), ConfirmationState::Idle);
    assert_eq!(session.sentence(), "");

    let types: Vec<String> = drain(&mut rx)
        .iter()
        .map(|e| e.event_type().to_string())
        .collect();
    assert_eq!(types, vec!["RecognitionStopped"]);
}

#[tokio::test]
async fn test_stale_frame_not_committed_after_restart() {
    let (bus, _rx) = event_bus();
    let script = FrameScript::new().hold(Symbol::Letter('A'), 1);
    let mut session = RecognitionSession::new(&config(1, 0), script.classifier.clone(), bus);
    let (publisher, mut receiver) = latest_frame_channel();

    // A frame arrives, but stop wins the race
    publisher.publish(script.frames[0].clone());
    let (stop, mut stop_rx) = stop_signal();
    stop.stop();
    let summary = run_session(&mut session, &mut receiver, &mut stop_rx)
        .await
        .unwrap();
    assert!(summary.stopped);
    assert_eq!(summary.frames, 0);
    assert_eq!(summary.dropped_frames, 1);

    // Capture has ended; the next run must not see the old frame
    session.restart();
    drop(publisher);
    let (_stop, mut stop_rx) = stop_signal();
    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        run_session(&mut session, &mut receiver, &mut stop_rx),
    )
    .await
    .expect("run should end with the publisher")
    .unwrap();

    assert_eq!(summary.frames, 0);
    assert!(summary.commits.is_empty());
    assert_eq!(session.sentence(), "");
}

#[tokio::test]
async fn test_classifier_failure_ends_run() {
    let (bus, mut rx) = event_bus();
    let script = FrameScript::new().hold(Symbol::Letter('A'), 5);
    let mut session = RecognitionSession::new(&config(3, 1), FailingClassifier::default(), bus);
    let mut queue = FrameQueue::new(script.frames.clone());
    let (_stop, mut stop_rx) = stop_signal();

    let result = run_session(&mut session, &mut queue, &mut stop_rx).await;

    assert!(matches!(result, Err(Error::RecognitionUnavailable(_))));
    // The failing frame was pulled; the rest stay queued
    assert_eq!(queue.remaining(), 4);
    assert!(session.is_unavailable());

    let events = drain(&mut rx);
    assert!(matches!(
        events.as_slice(),
        [SpellEvent::RecognitionUnavailable { .. }]
    ));
}

#[tokio::test]
async fn test_live_capture_run() {
    let (bus, _rx) = event_bus();
    let script = FrameScript::new()
        .hold(Symbol::Letter('C'), 3)
        .hold(Symbol::NoMatch, 2)
        .hold(Symbol::Letter('O'), 3);
    let mut session = RecognitionSession::new(&config(3, 1), script.classifier.clone(), bus);

    let (publisher, mut receiver) = latest_frame_channel();
    let (_stop, mut stop_rx) = stop_signal();
    let frames = script.frames.clone();

    // Publish each frame only after the previous one was consumed
    let capture = tokio::spawn(async move {
        for frame in frames {
            publisher.publish(frame);
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    });

    let summary = tokio::time::timeout(
        Duration::from_secs(5),
        run_session(&mut session, &mut receiver, &mut stop_rx),
    )
    .await
    .expect("run should end with the capture task")
    .unwrap();
    capture.await.unwrap();

    assert!(summary.frames >= 1);
    assert!(summary.frames + summary.dropped_frames <= 8);
    assert!(!summary.stopped);
    if summary.dropped_frames == 0 {
        assert_eq!(session.sentence(), "CO");
    }
}
