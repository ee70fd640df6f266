//! Configuration loading and config file resolution
//!
//! The recognizer reads a single TOML file. Every section and field is
//! optional; anything missing falls back to the compiled defaults below.
//!
//! # Resolution priority
//!
//! 1. Command-line argument (highest priority)
//! 2. `FSR_CONFIG` environment variable
//! 3. `<user config dir>/fsr/config.toml` if it exists
//! 4. Compiled defaults (no file)
//!
//! A missing file is not fatal: a warning is logged and defaults are used.
//! A file that exists but does not parse is a configuration error.

use crate::events::{ControlAction, OverflowPolicy};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Environment variable naming the config file
pub const CONFIG_ENV_VAR: &str = "FSR_CONFIG";

/// Complete TOML configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct TomlConfig {
    /// Confirmation timing and classifier gating
    #[serde(default)]
    pub recognition: RecognitionSection,

    /// Sentence buffer limits
    #[serde(default)]
    pub buffer: BufferSection,

    /// Geometric rule thresholds (canonical units, reference bone = 1.0)
    #[serde(default)]
    pub thresholds: ThresholdSection,

    /// Group id -> candidate letters table
    #[serde(default = "default_groups")]
    pub groups: Vec<GroupEntry>,

    /// Logging configuration
    #[serde(default)]
    pub logging: LoggingConfig,

    /// Event bus configuration
    #[serde(default)]
    pub events: EventsSection,
}

impl Default for TomlConfig {
    fn default() -> Self {
        Self {
            recognition: RecognitionSection::default(),
            buffer: BufferSection::default(),
            thresholds: ThresholdSection::default(),
            groups: default_groups(),
            logging: LoggingConfig::default(),
            events: EventsSection::default(),
        }
    }
}

/// `[recognition]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecognitionSection {
    /// Consecutive matching frames required to commit (T)
    #[serde(default = "default_stability_threshold")]
    pub stability_threshold: u32,

    /// NoMatch frames absorbed before the state machine resets (K)
    #[serde(default = "default_invalid_tolerance")]
    pub invalid_tolerance: u32,

    /// Classifier confidence below this skips the frame
    #[serde(default = "default_min_confidence")]
    pub min_confidence: f32,

    /// Bone used to normalize skeleton scale
    #[serde(default)]
    pub reference_bone: ReferenceBone,
}

impl Default for RecognitionSection {
    fn default() -> Self {
        Self {
            stability_threshold: default_stability_threshold(),
            invalid_tolerance: default_invalid_tolerance(),
            min_confidence: default_min_confidence(),
            reference_bone: ReferenceBone::default(),
        }
    }
}

/// Reference bone for scale normalization (always measured from the wrist)
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum ReferenceBone {
    /// Wrist to index-finger MCP
    IndexMcp,
    /// Wrist to middle-finger MCP
    #[default]
    MiddleMcp,
    /// Wrist to ring-finger MCP
    RingMcp,
    /// Wrist to pinky MCP
    PinkyMcp,
}

/// `[buffer]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct BufferSection {
    /// Maximum sentence length in characters
    #[serde(default = "default_max_length")]
    pub max_length: usize,

    /// Behaviour when a commit would exceed `max_length`
    #[serde(default)]
    pub overflow: OverflowPolicy,
}

impl Default for BufferSection {
    fn default() -> Self {
        Self {
            max_length: default_max_length(),
            overflow: OverflowPolicy::default(),
        }
    }
}

/// `[thresholds]` section
///
/// Distances are in canonical units where the reference bone has length 1.0.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ThresholdSection {
    /// How far a fingertip must pass its PIP joint along the palm's forward axis
    #[serde(default = "default_extension_margin")]
    pub extension_margin: f32,

    /// How far the thumb tip must pass the index MCP along the palm's lateral axis
    #[serde(default = "default_thumb_extension_margin")]
    pub thumb_extension_margin: f32,

    /// Thumb tip to index MCP split (M below, N above)
    #[serde(default = "default_thumb_index_split")]
    pub thumb_index_split: f32,

    /// Thumb tip to middle tip split (O below, C above)
    #[serde(default = "default_curve_split")]
    pub curve_split: f32,

    /// Index tip to middle tip split (H/U below, V above)
    #[serde(default = "default_spread_split")]
    pub spread_split: f32,
}

impl Default for ThresholdSection {
    fn default() -> Self {
        Self {
            extension_margin: default_extension_margin(),
            thumb_extension_margin: default_thumb_extension_margin(),
            thumb_index_split: default_thumb_index_split(),
            curve_split: default_curve_split(),
            spread_split: default_spread_split(),
        }
    }
}

/// One `[[groups]]` entry
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct GroupEntry {
    /// Classifier group id (0-7)
    pub id: u8,

    /// Candidate letters, e.g. "MNT"
    pub letters: String,

    /// Control gestures resolved inside this group
    #[serde(default)]
    pub controls: Vec<ControlAction>,
}

impl GroupEntry {
    fn new(id: u8, letters: &str, controls: &[ControlAction]) -> Self {
        Self {
            id,
            letters: letters.to_string(),
            controls: controls.to_vec(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// `[events]` section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct EventsSection {
    /// Broadcast channel capacity
    #[serde(default = "default_event_capacity")]
    pub capacity: usize,
}

impl Default for EventsSection {
    fn default() -> Self {
        Self {
            capacity: default_event_capacity(),
        }
    }
}

fn default_stability_threshold() -> u32 {
    15
}

fn default_invalid_tolerance() -> u32 {
    5
}

fn default_min_confidence() -> f32 {
    0.5
}

fn default_max_length() -> usize {
    500
}

fn default_extension_margin() -> f32 {
    0.1
}

fn default_thumb_extension_margin() -> f32 {
    0.35
}

fn default_thumb_index_split() -> f32 {
    0.45
}

fn default_curve_split() -> f32 {
    0.5
}

fn default_spread_split() -> f32 {
    0.3
}

fn default_log_level() -> String {
    "info".to_string()
}

fn default_event_capacity() -> usize {
    256
}

/// Default group table: eight visually similar letter families
pub fn default_groups() -> Vec<GroupEntry> {
    vec![
        GroupEntry::new(0, "AES", &[ControlAction::Space]),
        GroupEntry::new(1, "MNT", &[]),
        GroupEntry::new(2, "BDFW", &[ControlAction::Next]),
        GroupEntry::new(3, "CO", &[]),
        GroupEntry::new(4, "GHLX", &[]),
        GroupEntry::new(5, "KPQZ", &[ControlAction::Backspace]),
        GroupEntry::new(6, "RUV", &[]),
        GroupEntry::new(7, "IJY", &[]),
    ]
}

impl TomlConfig {
    /// Parse a configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        toml::from_str(content).map_err(|e| Error::Config(format!("Invalid TOML: {}", e)))
    }

    /// Render this configuration as TOML text
    pub fn to_toml_string(&self) -> Result<String> {
        toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Cannot render TOML: {}", e)))
    }

    /// Load configuration from an optional path
    ///
    /// `None` or a path that does not exist yields the compiled defaults.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let Some(path) = path else {
            info!("No config file; using compiled defaults");
            return Ok(Self::default());
        };

        if !path.exists() {
            warn!("Config file {} not found; using compiled defaults", path.display());
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config = Self::from_toml_str(&content)
            .map_err(|e| Error::Config(format!("{}: {}", path.display(), e)))?;
        info!("Loaded configuration from {}", path.display());
        Ok(config)
    }
}

/// Config file resolution following the priority order in the module docs
pub fn resolve_config_path(cli_arg: Option<&Path>, env_var_name: &str) -> Option<PathBuf> {
    // Priority 1: Command-line argument
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }

    // Priority 2: Environment variable
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.trim().is_empty() {
            return Some(PathBuf::from(path));
        }
    }

    // Priority 3: User config file, only if present
    user_config_path().filter(|path| path.exists())
}

/// `<user config dir>/fsr/config.toml` for the current platform
pub fn user_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|d| d.join("fsr").join("config.toml"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_groups_cover_alphabet_once() {
        let mut letters: Vec<char> = default_groups()
            .iter()
            .flat_map(|g| g.letters.chars().collect::<Vec<_>>())
            .collect();
        letters.sort_unstable();
        let alphabet: Vec<char> = ('A'..='Z').collect();
        assert_eq!(letters, alphabet);
    }

    #[test]
    fn test_default_groups_ids_and_sizes() {
        let groups = default_groups();
        assert_eq!(groups.len(), 8);
        for (i, group) in groups.iter().enumerate() {
            assert_eq!(group.id as usize, i);
            assert!((2..=4).contains(&group.letters.len()), "group {} size", i);
        }
    }

    #[test]
    fn test_render_and_parse_defaults() {
        let rendered = TomlConfig::default().to_toml_string().unwrap();
        let parsed = TomlConfig::from_toml_str(&rendered).unwrap();
        assert_eq!(parsed, TomlConfig::default());
    }
}
