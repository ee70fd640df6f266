//! Recognizer configuration
//!
//! Converts the shared TOML configuration into validated domain types.
//! Validation happens once, at session construction; invalid values are
//! fatal configuration errors.
//!
//! # Validated invariants
//!
//! - `stability_threshold >= 1`
//! - `min_confidence` within `[0, 1]`
//! - `max_length >= 1`
//! - every rule threshold finite and non-negative
//! - group table partitions A-Z (see [`GroupTable`])
//! - event bus capacity `>= 1`

use crate::disambiguate::{GroupTable, RuleThresholds};
use crate::error::{Error, Result};
use fsr_common::config::{ReferenceBone, TomlConfig};
use fsr_common::events::OverflowPolicy;

/// Validated recognizer settings
#[derive(Debug, Clone, PartialEq)]
pub struct RecognizerConfig {
    /// Consecutive matching frames required to commit (T)
    pub stability_threshold: u32,

    /// NoMatch frames absorbed before resetting to idle (K)
    pub invalid_tolerance: u32,

    /// Predictions below this confidence skip the frame
    pub min_confidence: f32,

    pub reference_bone: ReferenceBone,

    pub max_length: usize,

    pub overflow: OverflowPolicy,

    pub thresholds: RuleThresholds,

    pub groups: GroupTable,

    /// Event bus channel capacity
    pub event_capacity: usize,
}

impl RecognizerConfig {
    /// Validate and convert a loaded TOML configuration
    pub fn from_toml(config: &TomlConfig) -> Result<Self> {
        let recognition = &config.recognition;

        if recognition.stability_threshold < 1 {
            return Err(Error::Config(
                "recognition.stability_threshold must be at least 1".to_string(),
            ));
        }

        if !(0.0..=1.0).contains(&recognition.min_confidence) {
            return Err(Error::Config(format!(
                "recognition.min_confidence must be within [0, 1], got {}",
                recognition.min_confidence
            )));
        }

        if config.buffer.max_length < 1 {
            return Err(Error::Config(
                "buffer.max_length must be at least 1".to_string(),
            ));
        }

        if config.events.capacity < 1 {
            return Err(Error::Config("events.capacity must be at least 1".to_string()));
        }

        let thresholds = RuleThresholds::from(&config.thresholds);
        for (name, value) in thresholds.named() {
            if !value.is_finite() || value < 0.0 {
                return Err(Error::Config(format!(
                    "thresholds.{} must be finite and non-negative, got {}",
                    name, value
                )));
            }
        }

        let groups = GroupTable::new(&config.groups)
            .map_err(|e| Error::Config(format!("groups: {}", e)))?;

        Ok(Self {
            stability_threshold: recognition.stability_threshold,
            invalid_tolerance: recognition.invalid_tolerance,
            min_confidence: recognition.min_confidence,
            reference_bone: recognition.reference_bone,
            max_length: config.buffer.max_length,
            overflow: config.buffer.overflow,
            thresholds,
            groups,
            event_capacity: config.events.capacity,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_validate() {
        let config = RecognizerConfig::from_toml(&TomlConfig::default()).unwrap();
        assert_eq!(config.stability_threshold, 15);
        assert_eq!(config.invalid_tolerance, 5);
        assert_eq!(config.thresholds, RuleThresholds::default());
        assert_eq!(config.groups, GroupTable::standard().unwrap());
    }

    #[test]
    fn test_rejects_zero_threshold() {
        let mut toml = TomlConfig::default();
        toml.recognition.stability_threshold = 0;
        assert!(matches!(RecognizerConfig::from_toml(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_confidence_out_of_range() {
        let mut toml = TomlConfig::default();
        toml.recognition.min_confidence = 1.2;
        assert!(matches!(RecognizerConfig::from_toml(&toml), Err(Error::Config(_))));

        toml.recognition.min_confidence = f32::NAN;
        assert!(matches!(RecognizerConfig::from_toml(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_zero_max_length() {
        let mut toml = TomlConfig::default();
        toml.buffer.max_length = 0;
        assert!(matches!(RecognizerConfig::from_toml(&toml), Err(Error::Config(_))));
    }

    #[test]
    fn test_rejects_negative_threshold() {
        let mut toml = TomlConfig::default();
        toml.thresholds.spread_split = -0.1;
        let err = RecognizerConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("spread_split"));
    }

    #[test]
    fn test_rejects_broken_group_table() {
        let mut toml = TomlConfig::default();
        toml.groups[0].letters = "AE".to_string();
        let err = RecognizerConfig::from_toml(&toml).unwrap_err();
        assert!(err.to_string().contains("missing"));
    }
}
