//! Recognition-related type definitions
//!
//! Supporting types shared between the recognizer and event consumers.

use serde::{Deserialize, Serialize};

/// Control gestures that trigger buffer operations instead of a character append
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum ControlAction {
    /// Append a space
    Space,
    /// Finalize the in-progress word for the suggestion collaborator
    Next,
    /// Remove the last character (no-op on an empty buffer)
    Backspace,
}

impl ControlAction {
    /// All control actions, in display order
    pub const ALL: [ControlAction; 3] = [
        ControlAction::Space,
        ControlAction::Next,
        ControlAction::Backspace,
    ];

    /// Upper-case label used in logs and status displays
    pub fn label(&self) -> &'static str {
        match self {
            ControlAction::Space => "SPACE",
            ControlAction::Next => "NEXT",
            ControlAction::Backspace => "BACKSPACE",
        }
    }
}

impl std::fmt::Display for ControlAction {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.label())
    }
}

impl std::str::FromStr for ControlAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "space" => Ok(ControlAction::Space),
            "next" => Ok(ControlAction::Next),
            "backspace" => Ok(ControlAction::Backspace),
            other => Err(format!("Unknown control action: {}", other)),
        }
    }
}

/// Coarse phase of the confirmation state machine, for status displays
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum RecognitionPhase {
    /// No candidate symbol
    Idle,
    /// A candidate is being confirmed
    Accumulating,
    /// A symbol was just committed and is still held
    Cooldown,
    /// Classifier failed; waiting for restart
    Unavailable,
    /// Recognition stopped; waiting for restart
    Stopped,
}

impl std::fmt::Display for RecognitionPhase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RecognitionPhase::Idle => write!(f, "idle"),
            RecognitionPhase::Accumulating => write!(f, "accumulating"),
            RecognitionPhase::Cooldown => write!(f, "cooldown"),
            RecognitionPhase::Unavailable => write!(f, "unavailable"),
            RecognitionPhase::Stopped => write!(f, "stopped"),
        }
    }
}

/// What happens when a commit would push the sentence past its maximum length
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum OverflowPolicy {
    /// Drop characters from the front to make room
    #[default]
    TruncateOldest,
    /// Refuse the append and keep the buffer unchanged
    RejectAppend,
}

impl std::fmt::Display for OverflowPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OverflowPolicy::TruncateOldest => write!(f, "truncate_oldest"),
            OverflowPolicy::RejectAppend => write!(f, "reject_append"),
        }
    }
}
