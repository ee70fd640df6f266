//! Coarse classifier contract
//!
//! The neural classifier maps a canonical skeleton to one of eight coarse
//! letter groups. Its internals are never inspected: the pipeline only sees
//! the [`GroupClassifier`] trait, which is treated as a pure function with
//! bounded latency.
//!
//! [`RecordedClassifier`] replays predictions captured alongside a landmark
//! stream, keyed by frame sequence number.

use crate::normalize::CanonicalSkeleton;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::fmt;
use thiserror::Error;

/// Validated coarse group id in `[0, 8)`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct GroupId(u8);

impl GroupId {
    /// Number of coarse groups the classifier distinguishes
    pub const COUNT: usize = 8;

    pub fn new(raw: u8) -> Option<Self> {
        ((raw as usize) < Self::COUNT).then_some(Self(raw))
    }

    pub fn get(self) -> u8 {
        self.0
    }

    pub fn index(self) -> usize {
        self.0 as usize
    }

    /// All group ids in ascending order
    pub fn all() -> impl Iterator<Item = GroupId> {
        (0..Self::COUNT as u8).map(GroupId)
    }
}

impl TryFrom<u8> for GroupId {
    type Error = String;

    fn try_from(raw: u8) -> Result<Self, Self::Error> {
        GroupId::new(raw).ok_or_else(|| format!("group id {} out of range 0-7", raw))
    }
}

impl From<GroupId> for u8 {
    fn from(id: GroupId) -> u8 {
        id.0
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One classifier output
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct GroupPrediction {
    pub group: GroupId,
    /// Confidence in `[0, 1]`
    pub confidence: f32,
}

impl GroupPrediction {
    /// Validate raw classifier output
    pub fn from_raw(group: u8, confidence: f32) -> Result<Self, ClassifierError> {
        let group = GroupId::new(group).ok_or_else(|| {
            ClassifierError::InvalidOutput(format!("group id {} out of range", group))
        })?;
        if !confidence.is_finite() || !(0.0..=1.0).contains(&confidence) {
            return Err(ClassifierError::InvalidOutput(format!(
                "confidence {} outside [0, 1]",
                confidence
            )));
        }
        Ok(Self { group, confidence })
    }
}

/// Classifier failure
///
/// Any failure pauses recognition until the session is restarted.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ClassifierError {
    #[error("classifier unavailable: {0}")]
    Unavailable(String),

    #[error("classifier returned invalid output: {0}")]
    InvalidOutput(String),
}

/// Coarse hand-shape classifier
pub trait GroupClassifier {
    fn classify(&self, skeleton: &CanonicalSkeleton) -> Result<GroupPrediction, ClassifierError>;
}

impl<C: GroupClassifier + ?Sized> GroupClassifier for Box<C> {
    fn classify(&self, skeleton: &CanonicalSkeleton) -> Result<GroupPrediction, ClassifierError> {
        (**self).classify(skeleton)
    }
}

/// Classifier backed by predictions recorded per frame sequence number
///
/// Raw values are stored as captured and validated when looked up, so a
/// corrupted recording surfaces as [`ClassifierError::InvalidOutput`] at the
/// frame that carries it.
#[derive(Debug, Clone, Default)]
pub struct RecordedClassifier {
    predictions: HashMap<u64, (u8, f32)>,
}

impl RecordedClassifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record the prediction for one frame, replacing any earlier one
    pub fn record(&mut self, sequence: u64, group: u8, confidence: f32) {
        self.predictions.insert(sequence, (group, confidence));
    }

    pub fn get(&self, sequence: u64) -> Option<(u8, f32)> {
        self.predictions.get(&sequence).copied()
    }

    pub fn len(&self) -> usize {
        self.predictions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.predictions.is_empty()
    }
}

impl GroupClassifier for RecordedClassifier {
    fn classify(&self, skeleton: &CanonicalSkeleton) -> Result<GroupPrediction, ClassifierError> {
        let (group, confidence) = self.get(skeleton.sequence).ok_or_else(|| {
            ClassifierError::Unavailable(format!(
                "no recorded prediction for frame {}",
                skeleton.sequence
            ))
        })?;
        GroupPrediction::from_raw(group, confidence)
    }
}
