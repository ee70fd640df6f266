//! Feature normalizer
//!
//! Converts a raw [`LandmarkFrame`] into a [`CanonicalSkeleton`]:
//!
//! 1. Left hands are mirrored (x negated) onto the right-hand orientation
//! 2. Points are translated so the wrist is the origin
//! 3. Points are scaled so the reference bone has unit length
//! 4. A palm frame (forward, lateral, normal) is derived
//! 5. The fixed 21-segment hand topology is materialized
//!
//! Canonical axes keep the detector's image convention, so with the hand
//! upright the fingers point towards negative `y` and the thumb lies on the
//! positive `x` side.

use crate::landmarks::{Handedness, Landmark, LandmarkFrame, Point3, LANDMARK_COUNT};
use fsr_common::config::ReferenceBone;
use std::ops::Index;
use thiserror::Error;

/// Shortest reference bone accepted before the frame is considered degenerate
const MIN_REFERENCE_LENGTH: f32 = 1e-6;

/// Number of segments in the hand topology
pub const SEGMENT_COUNT: usize = 21;

/// Fixed hand topology: palm outline, thumb chain, four finger chains
pub const HAND_SEGMENTS: [(Landmark, Landmark); SEGMENT_COUNT] = [
    // Palm
    (Landmark::Wrist, Landmark::IndexMcp),
    (Landmark::IndexMcp, Landmark::MiddleMcp),
    (Landmark::MiddleMcp, Landmark::RingMcp),
    (Landmark::RingMcp, Landmark::PinkyMcp),
    (Landmark::PinkyMcp, Landmark::Wrist),
    // Thumb
    (Landmark::Wrist, Landmark::ThumbCmc),
    (Landmark::ThumbCmc, Landmark::ThumbMcp),
    (Landmark::ThumbMcp, Landmark::ThumbIp),
    (Landmark::ThumbIp, Landmark::ThumbTip),
    // Index
    (Landmark::IndexMcp, Landmark::IndexPip),
    (Landmark::IndexPip, Landmark::IndexDip),
    (Landmark::IndexDip, Landmark::IndexTip),
    // Middle
    (Landmark::MiddleMcp, Landmark::MiddlePip),
    (Landmark::MiddlePip, Landmark::MiddleDip),
    (Landmark::MiddleDip, Landmark::MiddleTip),
    // Ring
    (Landmark::RingMcp, Landmark::RingPip),
    (Landmark::RingPip, Landmark::RingDip),
    (Landmark::RingDip, Landmark::RingTip),
    // Pinky
    (Landmark::PinkyMcp, Landmark::PinkyPip),
    (Landmark::PinkyPip, Landmark::PinkyDip),
    (Landmark::PinkyDip, Landmark::PinkyTip),
];

/// Why a frame could not be normalized
///
/// An invalid frame is skipped by the pipeline; it is never fatal.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum InvalidFrame {
    #[error("frame flagged as not containing a hand")]
    NotValid,

    #[error("expected 21 landmarks, got {count}")]
    TooFewLandmarks { count: usize },

    #[error("landmark coordinates are not finite")]
    NonFinite,

    #[error("hand geometry is degenerate")]
    DegenerateGeometry,
}

/// Orthonormal axes attached to the palm
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PalmFrame {
    /// Wrist towards the middle-finger MCP
    pub forward: Point3,
    /// Pinky side towards thumb side, orthogonal to `forward`
    pub lateral: Point3,
    /// `forward x lateral`
    pub normal: Point3,
}

/// One line segment of the hand topology
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Segment {
    pub from: Landmark,
    pub to: Landmark,
    pub start: Point3,
    pub end: Point3,
}

impl Segment {
    pub fn vector(&self) -> Point3 {
        self.end - self.start
    }
}

/// Landmarks in the canonical reference frame
///
/// Frame-scoped: built once per frame and discarded after the pipeline pass.
#[derive(Debug, Clone, PartialEq)]
pub struct CanonicalSkeleton {
    /// Sequence number of the originating frame
    pub sequence: u64,
    points: [Point3; LANDMARK_COUNT],
    palm: PalmFrame,
    segments: [Segment; SEGMENT_COUNT],
}

impl CanonicalSkeleton {
    pub fn points(&self) -> &[Point3; LANDMARK_COUNT] {
        &self.points
    }

    pub fn palm(&self) -> &PalmFrame {
        &self.palm
    }

    /// The classifier's input representation
    pub fn segments(&self) -> &[Segment; SEGMENT_COUNT] {
        &self.segments
    }

    /// Distance between two landmarks in canonical units
    pub fn distance(&self, a: Landmark, b: Landmark) -> f32 {
        self[a].distance(self[b])
    }
}

impl Index<Landmark> for CanonicalSkeleton {
    type Output = Point3;

    fn index(&self, landmark: Landmark) -> &Point3 {
        &self.points[landmark.index()]
    }
}

/// Landmark at the far end of the reference bone (the near end is the wrist)
pub fn reference_landmark(bone: ReferenceBone) -> Landmark {
    match bone {
        ReferenceBone::IndexMcp => Landmark::IndexMcp,
        ReferenceBone::MiddleMcp => Landmark::MiddleMcp,
        ReferenceBone::RingMcp => Landmark::RingMcp,
        ReferenceBone::PinkyMcp => Landmark::PinkyMcp,
    }
}

/// Converts raw frames into canonical skeletons
#[derive(Debug, Clone, Copy)]
pub struct Normalizer {
    reference_bone: ReferenceBone,
}

impl Normalizer {
    pub fn new(reference_bone: ReferenceBone) -> Self {
        Self { reference_bone }
    }

    pub fn reference_bone(&self) -> ReferenceBone {
        self.reference_bone
    }

    /// Normalize one frame
    ///
    /// Points beyond the first 21 are ignored.
    pub fn normalize(&self, frame: &LandmarkFrame) -> Result<CanonicalSkeleton, InvalidFrame> {
        if !frame.valid {
            return Err(InvalidFrame::NotValid);
        }
        if frame.landmarks.len() < LANDMARK_COUNT {
            return Err(InvalidFrame::TooFewLandmarks {
                count: frame.landmarks.len(),
            });
        }

        let mut points = [Point3::ORIGIN; LANDMARK_COUNT];
        for (slot, raw) in points.iter_mut().zip(&frame.landmarks) {
            if !raw.is_finite() {
                return Err(InvalidFrame::NonFinite);
            }
            *slot = match frame.handedness {
                Handedness::Left => Point3::new(-raw.x, raw.y, raw.z),
                Handedness::Right => *raw,
            };
        }

        let wrist = points[Landmark::Wrist.index()];
        let reference = points[reference_landmark(self.reference_bone).index()] - wrist;
        let reference_length = reference.length();
        if !reference_length.is_finite() || reference_length < MIN_REFERENCE_LENGTH {
            return Err(InvalidFrame::DegenerateGeometry);
        }

        let scale = 1.0 / reference_length;
        for point in points.iter_mut() {
            *point = (*point - wrist) * scale;
        }

        let palm = palm_frame(&points).ok_or(InvalidFrame::DegenerateGeometry)?;

        let segments = HAND_SEGMENTS.map(|(from, to)| Segment {
            from,
            to,
            start: points[from.index()],
            end: points[to.index()],
        });

        Ok(CanonicalSkeleton {
            sequence: frame.sequence,
            points,
            palm,
            segments,
        })
    }
}

fn palm_frame(points: &[Point3; LANDMARK_COUNT]) -> Option<PalmFrame> {
    let forward = points[Landmark::MiddleMcp.index()].normalized()?;

    let across = points[Landmark::IndexMcp.index()] - points[Landmark::PinkyMcp.index()];
    let lateral = (across - forward * across.dot(forward)).normalized()?;

    Some(PalmFrame {
        forward,
        lateral,
        normal: forward.cross(lateral),
    })
}
