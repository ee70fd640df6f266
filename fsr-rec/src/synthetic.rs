//! Synthetic hands
//!
//! Deterministic hand poses in canonical units (wrist at the origin, wrist to
//! middle MCP = 1.0, fingers towards negative `y`, thumb on the positive `x`
//! side). Every letter and control gesture of the default group table has a
//! pose that its group's rules resolve to that symbol.
//!
//! [`SpellingScript`] turns text into a replay: a run of frames per symbol,
//! each followed by a run of neutral frames that resolve to NoMatch so
//! repeated letters commit separately.

use crate::classifier::GroupId;
use crate::config::RecognizerConfig;
use crate::disambiguate::GroupTable;
use crate::error::{Error, Result};
use crate::landmarks::{Finger, Handedness, Landmark, LandmarkFrame, Point3, LANDMARK_COUNT};
use crate::replay::ReplayRecord;
use crate::symbol::Symbol;
use fsr_common::events::ControlAction;

/// Nominal capture period used for synthetic timestamps
pub const FRAME_PERIOD_MS: u64 = 33;

const THUMB_CMC: Point3 = Point3::new(0.20, -0.15, 0.0);
const THUMB_MCP: Point3 = Point3::new(0.35, -0.35, 0.0);

/// How a finger is bent
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Bend {
    /// Straight along the palm
    Extended,
    /// Folded into the palm
    Curled,
    /// Half bent, as for C
    Curved,
}

/// Where the thumb tip sits
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ThumbPose {
    /// Sticking out sideways
    Out,
    /// Along the side of the index finger
    Alongside,
    /// Across the front of the curled fingers
    Across,
    /// Tucked low under the fingertips
    TuckedLow,
    /// Folded against the palm
    Folded,
}

impl ThumbPose {
    fn tip(self) -> (f32, f32) {
        match self {
            ThumbPose::Out => (0.85, -0.60),
            ThumbPose::Alongside => (0.45, -1.10),
            ThumbPose::Across => (0.0, -1.05),
            ThumbPose::TuckedLow => (0.05, -0.60),
            ThumbPose::Folded => (-0.05, -0.55),
        }
    }
}

/// Canonical hand pose builder
#[derive(Debug, Clone, PartialEq)]
pub struct HandPose {
    points: [Point3; LANDMARK_COUNT],
}

impl HandPose {
    /// Open hand with the thumb resting alongside
    pub fn relaxed() -> Self {
        let mut pose = Self {
            points: [Point3::ORIGIN; LANDMARK_COUNT],
        };
        pose.points[Landmark::ThumbCmc.index()] = THUMB_CMC;
        pose.points[Landmark::ThumbMcp.index()] = THUMB_MCP;
        for finger in [Finger::Index, Finger::Middle, Finger::Ring, Finger::Pinky] {
            pose.points[finger.mcp().index()] = mcp_position(finger);
            pose = pose.with_finger(finger, Bend::Extended);
        }
        pose.with_thumb(ThumbPose::Alongside)
    }

    /// All four fingers curled, thumb across the front
    pub fn fist() -> Self {
        Self::relaxed()
            .with_finger(Finger::Index, Bend::Curled)
            .with_finger(Finger::Middle, Bend::Curled)
            .with_finger(Finger::Ring, Bend::Curled)
            .with_finger(Finger::Pinky, Bend::Curled)
            .with_thumb(ThumbPose::Across)
    }

    /// Bend one finger; the thumb is positioned with [`HandPose::with_thumb`]
    pub fn with_finger(mut self, finger: Finger, bend: Bend) -> Self {
        if finger == Finger::Thumb {
            return self;
        }
        let mcp = mcp_position(finger);
        let (pip, dip, tip) = match bend {
            Bend::Extended => (0.40, 0.65, 0.85),
            Bend::Curled => (0.30, 0.15, 0.05),
            Bend::Curved => (0.35, 0.55, 0.60),
        };
        let [_, pip_l, dip_l, tip_l] = finger.joints();
        self.points[pip_l.index()] = Point3::new(mcp.x, mcp.y - pip, 0.0);
        self.points[dip_l.index()] = Point3::new(mcp.x, mcp.y - dip, 0.0);
        self.points[tip_l.index()] = Point3::new(mcp.x, mcp.y - tip, 0.0);
        self
    }

    pub fn with_thumb(self, pose: ThumbPose) -> Self {
        let (x, y) = pose.tip();
        self.with_thumb_tip(x, y)
    }

    /// Place the thumb tip; the IP joint follows halfway from the MCP
    pub fn with_thumb_tip(mut self, x: f32, y: f32) -> Self {
        let tip = Point3::new(x, y, 0.0);
        self.points[Landmark::ThumbTip.index()] = tip;
        self.points[Landmark::ThumbIp.index()] = (THUMB_MCP + tip) * 0.5;
        self
    }

    pub fn with_point(mut self, landmark: Landmark, point: Point3) -> Self {
        self.points[landmark.index()] = point;
        self
    }

    /// Rotate 180 degrees in the image plane (hand pointing down)
    pub fn rotated_half_turn(mut self) -> Self {
        for point in self.points.iter_mut() {
            *point = Point3::new(-point.x, -point.y, point.z);
        }
        self
    }

    pub fn point(&self, landmark: Landmark) -> Point3 {
        self.points[landmark.index()]
    }

    /// Place the pose in detector space
    ///
    /// The wrist lands on `offset` and every canonical unit becomes `scale`
    /// detector units. Left hands are mirrored, as a detector would report
    /// them.
    pub fn to_frame(
        &self,
        sequence: u64,
        handedness: Handedness,
        offset: Point3,
        scale: f32,
    ) -> LandmarkFrame {
        let landmarks = self
            .points
            .iter()
            .map(|p| {
                let p = match handedness {
                    Handedness::Left => Point3::new(-p.x, p.y, p.z),
                    Handedness::Right => *p,
                };
                offset + p * scale
            })
            .collect();

        LandmarkFrame {
            sequence,
            timestamp_ms: sequence * FRAME_PERIOD_MS,
            handedness,
            valid: true,
            landmarks,
        }
    }
}

fn mcp_position(finger: Finger) -> Point3 {
    match finger {
        Finger::Index => Point3::new(0.30, -0.95, 0.0),
        Finger::Middle => Point3::new(0.0, -1.0, 0.0),
        Finger::Ring => Point3::new(-0.25, -0.95, 0.0),
        Finger::Pinky => Point3::new(-0.48, -0.85, 0.0),
        Finger::Thumb => THUMB_MCP,
    }
}

fn fist_with(fingers: &[Finger]) -> HandPose {
    fingers
        .iter()
        .fold(HandPose::fist(), |pose, &f| pose.with_finger(f, Bend::Extended))
}

/// Pose that the default table resolves to `symbol`; `None` for NoMatch
pub fn symbol_pose(symbol: Symbol) -> Option<HandPose> {
    use Finger::{Index, Middle, Pinky, Ring};

    let pose = match symbol {
        Symbol::NoMatch => return None,
        Symbol::Control(ControlAction::Space) => HandPose::fist().with_thumb(ThumbPose::Out),
        Symbol::Control(ControlAction::Backspace) => {
            HandPose::fist().with_thumb(ThumbPose::Out).rotated_half_turn()
        }
        Symbol::Control(ControlAction::Next) => HandPose::relaxed().with_thumb(ThumbPose::Out),
        Symbol::Letter(c) => match c {
            'A' => HandPose::fist().with_thumb(ThumbPose::Alongside),
            'E' => HandPose::fist().with_thumb(ThumbPose::TuckedLow),
            'S' => HandPose::fist(),
            'M' => HandPose::fist().with_thumb_tip(0.0, -0.80),
            'N' => HandPose::fist().with_thumb_tip(-0.25, -0.80),
            'T' => HandPose::fist().with_thumb_tip(0.15, -1.35),
            'B' => HandPose::relaxed().with_thumb(ThumbPose::Folded),
            'W' => HandPose::relaxed()
                .with_thumb(ThumbPose::Folded)
                .with_finger(Pinky, Bend::Curled),
            'F' => HandPose::relaxed()
                .with_finger(Index, Bend::Curled)
                .with_thumb_tip(0.30, -1.00),
            'D' => fist_with(&[Index]).with_thumb_tip(0.05, -1.05),
            'C' => HandPose::relaxed()
                .with_finger(Index, Bend::Curved)
                .with_finger(Middle, Bend::Curved)
                .with_finger(Ring, Bend::Curved)
                .with_finger(Pinky, Bend::Curved)
                .with_thumb_tip(0.55, -0.55),
            'O' => HandPose::fist().with_thumb_tip(0.10, -1.05),
            'L' => fist_with(&[Index]).with_thumb(ThumbPose::Out),
            'G' => fist_with(&[Index]).with_thumb(ThumbPose::Alongside),
            'H' => fist_with(&[Index, Middle])
                .with_point(Landmark::IndexTip, Point3::new(0.15, -1.80, 0.0))
                .with_thumb(ThumbPose::Folded),
            'X' => HandPose::fist(),
            'K' => fist_with(&[Index, Middle]).with_thumb_tip(0.15, -1.30),
            'P' => fist_with(&[Index, Middle])
                .with_thumb_tip(0.15, -1.30)
                .rotated_half_turn(),
            'Z' => fist_with(&[Index]),
            'Q' => fist_with(&[Index]).rotated_half_turn(),
            'R' => fist_with(&[Index, Middle])
                .with_point(Landmark::IndexTip, Point3::new(-0.10, -1.75, 0.0))
                .with_thumb(ThumbPose::Folded),
            'U' => fist_with(&[Index, Middle])
                .with_point(Landmark::IndexTip, Point3::new(0.15, -1.80, 0.0))
                .with_thumb(ThumbPose::Folded),
            'V' => fist_with(&[Index, Middle])
                .with_point(Landmark::IndexTip, Point3::new(0.50, -1.75, 0.0))
                .with_thumb(ThumbPose::Folded),
            'I' => fist_with(&[Pinky]),
            'Y' => fist_with(&[Pinky]).with_thumb(ThumbPose::Out),
            'J' => fist_with(&[Pinky]).rotated_half_turn(),
            _ => return None,
        },
    };
    Some(pose)
}

/// Neutral pose between symbols; resolves to NoMatch in [`transition_group`]
pub fn transition_pose() -> HandPose {
    fist_with(&[Finger::Middle]).with_thumb(ThumbPose::Folded)
}

/// Group reported for transition frames (the group holding G, H, L and X)
pub fn transition_group(table: &GroupTable) -> Option<GroupId> {
    table.group_of('G')
}

/// Frame timing and placement for a [`SpellingScript`]
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ScriptOptions {
    /// Frames each symbol is held
    pub hold_frames: u32,
    /// Neutral frames after each symbol
    pub gap_frames: u32,
    pub handedness: Handedness,
    /// Wrist position in detector space
    pub offset: Point3,
    /// Detector units per canonical unit
    pub scale: f32,
    /// Confidence recorded for every prediction
    pub confidence: f32,
}

impl ScriptOptions {
    /// Hold each symbol exactly T frames and gap with K + 1 neutral frames
    pub fn for_config(config: &RecognizerConfig) -> Self {
        Self {
            hold_frames: config.stability_threshold,
            gap_frames: config.invalid_tolerance + 1,
            ..Self::default()
        }
    }
}

impl Default for ScriptOptions {
    fn default() -> Self {
        Self {
            hold_frames: 15,
            gap_frames: 6,
            handedness: Handedness::Right,
            offset: Point3::new(0.5, 0.75, 0.0),
            scale: 0.2,
            confidence: 0.95,
        }
    }
}

/// Synthetic landmark stream spelling a text
#[derive(Debug, Clone, PartialEq)]
pub struct SpellingScript {
    symbols: Vec<Symbol>,
    records: Vec<ReplayRecord>,
}

impl SpellingScript {
    /// Build a script for `text` (letters and spaces)
    pub fn new(text: &str, table: &GroupTable, options: &ScriptOptions) -> Result<Self> {
        let symbols = text
            .chars()
            .map(|c| match c {
                ' ' => Ok(Symbol::Control(ControlAction::Space)),
                c => Symbol::letter(c).ok_or_else(|| {
                    Error::InvalidInput(format!("cannot spell {:?}: letters and spaces only", c))
                }),
            })
            .collect::<Result<Vec<_>>>()?;

        Self::from_symbols(&symbols, table, options)
    }

    /// Build a script for an explicit symbol sequence (controls included)
    pub fn from_symbols(
        symbols: &[Symbol],
        table: &GroupTable,
        options: &ScriptOptions,
    ) -> Result<Self> {
        let gap_group = transition_group(table)
            .ok_or_else(|| Error::InvalidInput("group table has no letter G".to_string()))?;
        let gap_pose = transition_pose();

        let mut records = Vec::new();
        let mut sequence = 0u64;
        let mut push = |pose: &HandPose, group: GroupId| {
            records.push(ReplayRecord {
                frame: pose.to_frame(sequence, options.handedness, options.offset, options.scale),
                group: Some(group.get()),
                confidence: Some(options.confidence),
            });
            sequence += 1;
        };

        for &symbol in symbols {
            let pose = symbol_pose(symbol)
                .ok_or_else(|| Error::InvalidInput(format!("no pose for {}", symbol)))?;
            let group = table.group_of_symbol(symbol).ok_or_else(|| {
                Error::InvalidInput(format!("{} is not in the group table", symbol))
            })?;

            for _ in 0..options.hold_frames {
                push(&pose, group);
            }
            for _ in 0..options.gap_frames {
                push(&gap_pose, gap_group);
            }
        }

        Ok(Self {
            symbols: symbols.to_vec(),
            records,
        })
    }

    pub fn symbols(&self) -> &[Symbol] {
        &self.symbols
    }

    pub fn records(&self) -> &[ReplayRecord] {
        &self.records
    }

    pub fn into_records(self) -> Vec<ReplayRecord> {
        self.records
    }
}
