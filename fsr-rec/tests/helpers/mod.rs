//! Test helpers for fsr-rec integration tests
//!
//! Provides reusable building blocks:
//! - Configs with a chosen stability threshold and tolerance
//! - Canonical skeletons and frames for synthetic symbol poses
//! - Classifiers that record predictions or always fail

#![allow(dead_code)]

use fsr_common::config::{ReferenceBone, TomlConfig};
use fsr_common::events::{EventBus, SpellEvent};
use fsr_rec::classifier::{ClassifierError, GroupClassifier, GroupPrediction, RecordedClassifier};
use fsr_rec::config::RecognizerConfig;
use fsr_rec::disambiguate::GroupTable;
use fsr_rec::landmarks::{Handedness, LandmarkFrame, Point3};
use fsr_rec::normalize::{CanonicalSkeleton, Normalizer};
use fsr_rec::synthetic::{symbol_pose, transition_pose, HandPose};
use fsr_rec::Symbol;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tokio::sync::broadcast;

/// Default configuration with T and K overridden
pub fn config(threshold: u32, tolerance: u32) -> RecognizerConfig {
    let mut toml = TomlConfig::default();
    toml.recognition.stability_threshold = threshold;
    toml.recognition.invalid_tolerance = tolerance;
    RecognizerConfig::from_toml(&toml).unwrap()
}

pub fn standard_table() -> GroupTable {
    GroupTable::standard().unwrap()
}

pub fn pose_for(symbol: Symbol) -> HandPose {
    symbol_pose(symbol).unwrap_or_else(|| panic!("no synthetic pose for {}", symbol))
}

pub fn skeleton(pose: &HandPose) -> CanonicalSkeleton {
    let frame = pose.to_frame(0, Handedness::Right, Point3::ORIGIN, 1.0);
    Normalizer::new(ReferenceBone::MiddleMcp).normalize(&frame).unwrap()
}

/// Records frames for `symbol` with the group the default table assigns it
pub struct FrameScript {
    pub frames: Vec<LandmarkFrame>,
    pub classifier: RecordedClassifier,
    table: GroupTable,
    next_sequence: u64,
}

impl FrameScript {
    pub fn new() -> Self {
        Self {
            frames: Vec::new(),
            classifier: RecordedClassifier::new(),
            table: standard_table(),
            next_sequence: 0,
        }
    }

    /// Append `count` frames of `symbol` (NoMatch appends transition frames)
    pub fn hold(mut self, symbol: Symbol, count: usize) -> Self {
        let (pose, group) = match symbol {
            Symbol::NoMatch => (transition_pose(), self.table.group_of('G').unwrap()),
            symbol => (pose_for(symbol), self.table.group_of_symbol(symbol).unwrap()),
        };
        for _ in 0..count {
            let sequence = self.next_sequence;
            let frame = pose.to_frame(
                sequence,
                Handedness::Right,
                Point3::new(0.4, 0.7, 0.0),
                0.25,
            );
            self.frames.push(frame);
            self.classifier.record(sequence, group.get(), 0.9);
            self.next_sequence += 1;
        }
        self
    }

    /// Append `count` frames flagged as carrying no hand
    pub fn empty(mut self, count: usize) -> Self {
        for _ in 0..count {
            self.frames
                .push(LandmarkFrame::empty(self.next_sequence, self.next_sequence * 33));
            self.next_sequence += 1;
        }
        self
    }
}

/// Classifier that always fails and counts how often it was asked
#[derive(Clone, Default)]
pub struct FailingClassifier {
    pub calls: Arc<AtomicUsize>,
}

impl GroupClassifier for FailingClassifier {
    fn classify(&self, _skeleton: &CanonicalSkeleton) -> Result<GroupPrediction, ClassifierError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(ClassifierError::Unavailable("model not loaded".to_string()))
    }
}

/// Drain every event currently queued on a receiver
pub fn drain(rx: &mut broadcast::Receiver<SpellEvent>) -> Vec<SpellEvent> {
    let mut events = Vec::new();
    while let Ok(event) = rx.try_recv() {
        events.push(event);
    }
    events
}

pub fn event_bus() -> (EventBus, broadcast::Receiver<SpellEvent>) {
    let bus = EventBus::new(1024);
    let rx = bus.subscribe();
    (bus, rx)
}
