//! Frame sources and the session runner
//!
//! Frame delivery is pull-based: [`run_session`] asks its [`FrameSource`] for
//! the next frame, runs one synchronous pipeline pass, then asks again. The
//! wait for the next frame is the only suspension point, and the runner
//! checks for cancellation there.
//!
//! # Sources
//!
//! - [`latest_frame_channel`]: live capture. Holds at most one pending frame;
//!   a newer frame replaces an unconsumed older one, so a slow pipeline always
//!   sees the freshest observation instead of a growing backlog.
//! - [`FrameQueue`]: a pre-recorded frame list delivered in order.

use crate::classifier::GroupClassifier;
use crate::error::Result;
use crate::landmarks::LandmarkFrame;
use crate::session::{FrameOutcome, RecognitionSession};
use crate::symbol::Symbol;
use std::collections::VecDeque;
use std::future::Future;
use tokio::sync::watch;
use tracing::{debug, info};

/// Pull-based supplier of landmark frames
pub trait FrameSource {
    /// Wait for the next frame; `None` when the source is exhausted
    fn next_frame(&mut self) -> impl Future<Output = Option<LandmarkFrame>> + Send;

    /// Frames the source discarded before they were pulled
    fn dropped_frames(&self) -> u64 {
        0
    }

    /// Throw away any frame waiting to be pulled
    fn discard_pending(&mut self) {}
}

/// Create a single-slot channel that always holds the latest frame
pub fn latest_frame_channel() -> (FramePublisher, LatestFrameReceiver) {
    let (tx, rx) = watch::channel(None);
    (
        FramePublisher { tx },
        LatestFrameReceiver {
            rx,
            last_sequence: None,
            dropped: 0,
        },
    )
}

/// Capture-side half of [`latest_frame_channel`]
///
/// Dropping the publisher ends the stream once the last frame is consumed.
#[derive(Debug)]
pub struct FramePublisher {
    tx: watch::Sender<Option<LandmarkFrame>>,
}

impl FramePublisher {
    /// Replace the pending frame; never blocks
    pub fn publish(&self, frame: LandmarkFrame) {
        self.tx.send_replace(Some(frame));
    }

    /// True once the receiver is gone
    pub fn is_closed(&self) -> bool {
        self.tx.is_closed()
    }
}

/// Pipeline-side half of [`latest_frame_channel`]
#[derive(Debug)]
pub struct LatestFrameReceiver {
    rx: watch::Receiver<Option<LandmarkFrame>>,
    last_sequence: Option<u64>,
    dropped: u64,
}

impl FrameSource for LatestFrameReceiver {
    async fn next_frame(&mut self) -> Option<LandmarkFrame> {
        loop {
            // Err only once the publisher is gone and the last value was seen
            self.rx.changed().await.ok()?;

            let pending = self.rx.borrow_and_update().clone();
            let Some(frame) = pending else {
                continue;
            };

            self.advance(frame.sequence);
            return Some(frame);
        }
    }

    fn dropped_frames(&self) -> u64 {
        self.dropped
    }

    fn discard_pending(&mut self) {
        let pending = self.rx.borrow_and_update().as_ref().map(|frame| frame.sequence);
        if let Some(sequence) = pending {
            if self.last_sequence != Some(sequence) {
                debug!(frame = sequence, "Discarding pending frame");
                self.advance(sequence);
                self.dropped = self.dropped.saturating_add(1);
            }
        }
    }
}

impl LatestFrameReceiver {
    /// Count the sequence gap up to `sequence` as dropped frames
    fn advance(&mut self, sequence: u64) {
        if let Some(last) = self.last_sequence {
            let gap = sequence.saturating_sub(last).saturating_sub(1);
            self.dropped = self.dropped.saturating_add(gap);
        }
        self.last_sequence = Some(sequence);
    }
}

/// In-order source over a pre-recorded frame list
#[derive(Debug, Default)]
pub struct FrameQueue {
    frames: VecDeque<LandmarkFrame>,
}

impl FrameQueue {
    pub fn new(frames: impl IntoIterator<Item = LandmarkFrame>) -> Self {
        Self {
            frames: frames.into_iter().collect(),
        }
    }

    pub fn remaining(&self) -> usize {
        self.frames.len()
    }
}

impl FrameSource for FrameQueue {
    async fn next_frame(&mut self) -> Option<LandmarkFrame> {
        self.frames.pop_front()
    }
}

/// Create a stop handle and the signal it controls
pub fn stop_signal() -> (StopHandle, StopSignal) {
    let (tx, rx) = watch::channel(false);
    (StopHandle { tx }, StopSignal { rx })
}

/// Requests that a running session stop
#[derive(Debug, Clone)]
pub struct StopHandle {
    tx: watch::Sender<bool>,
}

impl StopHandle {
    pub fn stop(&self) {
        self.tx.send_replace(true);
    }
}

/// Observed by [`run_session`]
#[derive(Debug, Clone)]
pub struct StopSignal {
    rx: watch::Receiver<bool>,
}

impl StopSignal {
    pub fn is_stopped(&self) -> bool {
        *self.rx.borrow()
    }

    /// Resolve once stop is requested
    ///
    /// If every [`StopHandle`] is dropped without stopping, this never resolves.
    pub async fn wait(&mut self) {
        loop {
            if *self.rx.borrow_and_update() {
                return;
            }
            if self.rx.changed().await.is_err() {
                std::future::pending::<()>().await;
            }
        }
    }
}

/// Totals for one [`run_session`] call
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunSummary {
    /// Frames pulled from the source
    pub frames: u64,
    pub skipped: u64,
    /// Committed symbols in commit order
    pub commits: Vec<Symbol>,
    /// Frames the source replaced before they were pulled
    pub dropped_frames: u64,
    /// True when the run ended because stop was requested
    pub stopped: bool,
}

/// Drive `session` until `source` is exhausted or `stop` fires
///
/// Stop resets the session's confirmation state without a partial commit
/// and discards any frame the source still holds, so a later run starts
/// from fresh input. A classifier failure ends
/// the run with [`crate::Error::RecognitionUnavailable`].
pub async fn run_session<C, S>(
    session: &mut RecognitionSession<C>,
    source: &mut S,
    stop: &mut StopSignal,
) -> Result<RunSummary>
where
    C: GroupClassifier,
    S: FrameSource,
{
    let mut summary = RunSummary::default();

    loop {
        let next = tokio::select! {
            biased;
            _ = stop.wait() => None,
            frame = source.next_frame() => Some(frame),
        };

        let frame = match next {
            None => {
                session.stop();
                source.discard_pending();
                summary.stopped = true;
                break;
            }
            Some(None) => {
                debug!("Frame source exhausted");
                break;
            }
            Some(Some(frame)) => frame,
        };

        summary.frames += 1;
        match session.process_frame(&frame)? {
            FrameOutcome::Skipped(_) => summary.skipped += 1,
            FrameOutcome::Committed(symbol) => summary.commits.push(symbol),
            FrameOutcome::Observed(_) => {}
        }
    }

    summary.dropped_frames = source.dropped_frames();
    info!(
        "Run finished: {} frames, {} skipped, {} commits, {} dropped",
        summary.frames,
        summary.skipped,
        summary.commits.len(),
        summary.dropped_frames
    );
    Ok(summary)
}
