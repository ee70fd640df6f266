//! Hand landmark types
//!
//! A detector reports 21 points per hand in image-normalized coordinates:
//! `x` grows to the right, `y` grows downward, `z` is relative depth.
//! This module gives every point a typed name so skeletons are indexed by
//! [`Landmark`] instead of raw integers.

use serde::{Deserialize, Serialize};
use std::ops::{Add, Mul, Neg, Sub};

/// Number of landmarks in a complete hand
pub const LANDMARK_COUNT: usize = 21;

/// A point (or vector) in 3D space
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point3 {
    pub x: f32,
    pub y: f32,
    pub z: f32,
}

impl Point3 {
    pub const ORIGIN: Point3 = Point3 { x: 0.0, y: 0.0, z: 0.0 };

    pub const fn new(x: f32, y: f32, z: f32) -> Self {
        Self { x, y, z }
    }

    pub fn dot(self, other: Point3) -> f32 {
        self.x * other.x + self.y * other.y + self.z * other.z
    }

    pub fn cross(self, other: Point3) -> Point3 {
        Point3::new(
            self.y * other.z - self.z * other.y,
            self.z * other.x - self.x * other.z,
            self.x * other.y - self.y * other.x,
        )
    }

    pub fn length(self) -> f32 {
        self.dot(self).sqrt()
    }

    pub fn distance(self, other: Point3) -> f32 {
        (self - other).length()
    }

    /// Unit vector in the same direction, or `None` for a (near) zero vector
    pub fn normalized(self) -> Option<Point3> {
        let length = self.length();
        if length.is_finite() && length > f32::EPSILON {
            Some(self * (1.0 / length))
        } else {
            None
        }
    }

    pub fn is_finite(self) -> bool {
        self.x.is_finite() && self.y.is_finite() && self.z.is_finite()
    }
}

impl Add for Point3 {
    type Output = Point3;

    fn add(self, rhs: Point3) -> Point3 {
        Point3::new(self.x + rhs.x, self.y + rhs.y, self.z + rhs.z)
    }
}

impl Sub for Point3 {
    type Output = Point3;

    fn sub(self, rhs: Point3) -> Point3 {
        Point3::new(self.x - rhs.x, self.y - rhs.y, self.z - rhs.z)
    }
}

impl Mul<f32> for Point3 {
    type Output = Point3;

    fn mul(self, rhs: f32) -> Point3 {
        Point3::new(self.x * rhs, self.y * rhs, self.z * rhs)
    }
}

impl Neg for Point3 {
    type Output = Point3;

    fn neg(self) -> Point3 {
        Point3::new(-self.x, -self.y, -self.z)
    }
}

/// Which hand the detector reported
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Handedness {
    Left,
    Right,
}

/// The 21 tracked hand landmarks, in detector order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(usize)]
pub enum Landmark {
    Wrist = 0,
    ThumbCmc,
    ThumbMcp,
    ThumbIp,
    ThumbTip,
    IndexMcp,
    IndexPip,
    IndexDip,
    IndexTip,
    MiddleMcp,
    MiddlePip,
    MiddleDip,
    MiddleTip,
    RingMcp,
    RingPip,
    RingDip,
    RingTip,
    PinkyMcp,
    PinkyPip,
    PinkyDip,
    PinkyTip,
}

impl Landmark {
    /// All landmarks in detector order
    pub const ALL: [Landmark; LANDMARK_COUNT] = [
        Landmark::Wrist,
        Landmark::ThumbCmc,
        Landmark::ThumbMcp,
        Landmark::ThumbIp,
        Landmark::ThumbTip,
        Landmark::IndexMcp,
        Landmark::IndexPip,
        Landmark::IndexDip,
        Landmark::IndexTip,
        Landmark::MiddleMcp,
        Landmark::MiddlePip,
        Landmark::MiddleDip,
        Landmark::MiddleTip,
        Landmark::RingMcp,
        Landmark::RingPip,
        Landmark::RingDip,
        Landmark::RingTip,
        Landmark::PinkyMcp,
        Landmark::PinkyPip,
        Landmark::PinkyDip,
        Landmark::PinkyTip,
    ];

    /// Position of this landmark in a detector frame
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// The five digits
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Finger {
    Thumb,
    Index,
    Middle,
    Ring,
    Pinky,
}

impl Finger {
    pub const ALL: [Finger; 5] = [
        Finger::Thumb,
        Finger::Index,
        Finger::Middle,
        Finger::Ring,
        Finger::Pinky,
    ];

    /// The finger's four joints from base to tip
    ///
    /// For the thumb this is CMC, MCP, IP, tip.
    pub const fn joints(self) -> [Landmark; 4] {
        match self {
            Finger::Thumb => [
                Landmark::ThumbCmc,
                Landmark::ThumbMcp,
                Landmark::ThumbIp,
                Landmark::ThumbTip,
            ],
            Finger::Index => [
                Landmark::IndexMcp,
                Landmark::IndexPip,
                Landmark::IndexDip,
                Landmark::IndexTip,
            ],
            Finger::Middle => [
                Landmark::MiddleMcp,
                Landmark::MiddlePip,
                Landmark::MiddleDip,
                Landmark::MiddleTip,
            ],
            Finger::Ring => [
                Landmark::RingMcp,
                Landmark::RingPip,
                Landmark::RingDip,
                Landmark::RingTip,
            ],
            Finger::Pinky => [
                Landmark::PinkyMcp,
                Landmark::PinkyPip,
                Landmark::PinkyDip,
                Landmark::PinkyTip,
            ],
        }
    }

    pub const fn mcp(self) -> Landmark {
        match self {
            Finger::Thumb => Landmark::ThumbMcp,
            other => other.joints()[0],
        }
    }

    /// Middle knuckle (the IP joint for the thumb)
    pub const fn pip(self) -> Landmark {
        match self {
            Finger::Thumb => Landmark::ThumbIp,
            other => other.joints()[1],
        }
    }

    pub const fn tip(self) -> Landmark {
        self.joints()[3]
    }
}

/// One detector observation of a hand
///
/// Immutable once created. `landmarks` is normally [`LANDMARK_COUNT`] points
/// in detector order; frames with fewer points are rejected by the normalizer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LandmarkFrame {
    /// Monotonic frame counter assigned by the capture side
    pub sequence: u64,

    /// Capture time in milliseconds
    pub timestamp_ms: u64,

    pub handedness: Handedness,

    /// False when the detector found no usable hand
    #[serde(default = "default_valid")]
    pub valid: bool,

    pub landmarks: Vec<Point3>,
}

fn default_valid() -> bool {
    true
}

impl LandmarkFrame {
    /// A frame flagged as carrying no hand
    pub fn empty(sequence: u64, timestamp_ms: u64) -> Self {
        Self {
            sequence,
            timestamp_ms,
            handedness: Handedness::Right,
            valid: false,
            landmarks: Vec::new(),
        }
    }
}
