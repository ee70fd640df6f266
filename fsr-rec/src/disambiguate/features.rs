//! Primitive hand features used by the disambiguation rules
//!
//! All features are O(1) reads over a canonical skeleton:
//! - finger extension booleans
//! - a fixed set of landmark-to-landmark distances
//! - raw coordinates for ordinal comparisons

use crate::landmarks::{Finger, Landmark};
use crate::normalize::CanonicalSkeleton;
use fsr_common::config::ThresholdSection;

/// Named rule thresholds in canonical units (reference bone = 1.0)
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct RuleThresholds {
    /// Tip beyond PIP along the palm's forward axis for a finger to count as extended
    pub extension_margin: f32,
    /// Thumb tip beyond the index MCP along the palm's lateral axis
    pub thumb_extension_margin: f32,
    /// Thumb tip to index MCP split between M and N
    pub thumb_index_split: f32,
    /// Thumb tip to middle tip split between O and C
    pub curve_split: f32,
    /// Index tip to middle tip split between U/H and V
    pub spread_split: f32,
}

impl Default for RuleThresholds {
    fn default() -> Self {
        Self::from(&ThresholdSection::default())
    }
}

impl From<&ThresholdSection> for RuleThresholds {
    fn from(section: &ThresholdSection) -> Self {
        Self {
            extension_margin: section.extension_margin,
            thumb_extension_margin: section.thumb_extension_margin,
            thumb_index_split: section.thumb_index_split,
            curve_split: section.curve_split,
            spread_split: section.spread_split,
        }
    }
}

impl RuleThresholds {
    /// Name/value pairs, for validation and logging
    pub fn named(&self) -> [(&'static str, f32); 5] {
        [
            ("extension_margin", self.extension_margin),
            ("thumb_extension_margin", self.thumb_extension_margin),
            ("thumb_index_split", self.thumb_index_split),
            ("curve_split", self.curve_split),
            ("spread_split", self.spread_split),
        ]
    }
}

/// Landmark pairs whose distance the rules consult
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Span {
    /// Thumb tip to index MCP
    ThumbIndexBase,
    /// Thumb tip to middle fingertip
    ThumbMiddleTip,
    /// Index fingertip to middle fingertip
    IndexMiddleTip,
}

impl Span {
    pub const ALL: [Span; 3] = [Span::ThumbIndexBase, Span::ThumbMiddleTip, Span::IndexMiddleTip];

    pub const fn endpoints(self) -> (Landmark, Landmark) {
        match self {
            Span::ThumbIndexBase => (Landmark::ThumbTip, Landmark::IndexMcp),
            Span::ThumbMiddleTip => (Landmark::ThumbTip, Landmark::MiddleTip),
            Span::IndexMiddleTip => (Landmark::IndexTip, Landmark::MiddleTip),
        }
    }

    const fn slot(self) -> usize {
        self as usize
    }
}

/// Canonical coordinate axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    /// Grows towards the thumb side
    X,
    /// Grows downward (towards the wrist for an upright hand)
    Y,
    /// Depth
    Z,
}

/// Features extracted once per skeleton
#[derive(Debug, Clone, Copy)]
pub struct HandFeatures<'a> {
    skeleton: &'a CanonicalSkeleton,
    extended: [bool; 5],
    spans: [f32; 3],
}

impl<'a> HandFeatures<'a> {
    pub fn extract(skeleton: &'a CanonicalSkeleton, thresholds: &RuleThresholds) -> Self {
        let palm = skeleton.palm();

        let extended = Finger::ALL.map(|finger| match finger {
            Finger::Thumb => {
                let reach = (skeleton[Landmark::ThumbTip] - skeleton[Landmark::IndexMcp])
                    .dot(palm.lateral);
                reach > thresholds.thumb_extension_margin
            }
            finger => {
                let reach = (skeleton[finger.tip()] - skeleton[finger.pip()]).dot(palm.forward);
                reach > thresholds.extension_margin
            }
        });

        let spans = Span::ALL.map(|span| {
            let (a, b) = span.endpoints();
            skeleton.distance(a, b)
        });

        Self {
            skeleton,
            extended,
            spans,
        }
    }

    pub fn is_extended(&self, finger: Finger) -> bool {
        self.extended[finger as usize]
    }

    pub fn span(&self, span: Span) -> f32 {
        self.spans[span.slot()]
    }

    pub fn coordinate(&self, landmark: Landmark, axis: Axis) -> f32 {
        let point = self.skeleton[landmark];
        match axis {
            Axis::X => point.x,
            Axis::Y => point.y,
            Axis::Z => point.z,
        }
    }

    /// Extension flags in thumb..pinky order
    pub fn extension_pattern(&self) -> [bool; 5] {
        self.extended
    }
}
