//! Replay files
//!
//! A replay file is JSON Lines: one landmark frame per line, optionally
//! carrying the coarse prediction recorded for it.
//!
//! ```text
//! {"sequence":0,"timestamp_ms":0,"handedness":"right","valid":true,"landmarks":[...],"group":0,"confidence":0.95}
//! ```
//!
//! Blank lines and lines starting with `#` are ignored.

use crate::classifier::RecordedClassifier;
use crate::error::{Error, Result};
use crate::landmarks::LandmarkFrame;
use serde::{Deserialize, Serialize};
use std::fs::File;
use std::io::{BufWriter, Write};
use std::path::Path;
use tracing::info;

/// Confidence assumed for a recorded group with no confidence field
const DEFAULT_CONFIDENCE: f32 = 1.0;

/// One line of a replay file
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReplayRecord {
    #[serde(flatten)]
    pub frame: LandmarkFrame,

    /// Raw coarse group reported by the classifier for this frame
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group: Option<u8>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f32>,
}

/// Parsed replay file
#[derive(Debug, Clone, Default)]
pub struct Replay {
    pub records: Vec<ReplayRecord>,
}

impl Replay {
    /// Frames in file order plus a classifier answering from the recorded predictions
    pub fn into_parts(self) -> (Vec<LandmarkFrame>, RecordedClassifier) {
        let mut classifier = RecordedClassifier::new();
        let frames = self
            .records
            .into_iter()
            .map(|record| {
                if let Some(group) = record.group {
                    classifier.record(
                        record.frame.sequence,
                        group,
                        record.confidence.unwrap_or(DEFAULT_CONFIDENCE),
                    );
                }
                record.frame
            })
            .collect();
        (frames, classifier)
    }
}

/// Parse replay records from JSON Lines text
pub fn parse_replay(content: &str) -> Result<Replay> {
    let mut records = Vec::new();
    for (number, line) in content.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let record = serde_json::from_str(line)
            .map_err(|e| Error::Replay(format!("line {}: {}", number + 1, e)))?;
        records.push(record);
    }
    Ok(Replay { records })
}

/// Load a replay file
pub fn load_replay(path: &Path) -> Result<Replay> {
    let content = std::fs::read_to_string(path)?;
    let replay = parse_replay(&content).map_err(|e| match e {
        Error::Replay(msg) => Error::Replay(format!("{}: {}", path.display(), msg)),
        other => other,
    })?;

    info!("Loaded {} frames from {}", replay.records.len(), path.display());
    Ok(replay)
}

/// Write records as a replay file, replacing any existing file
pub fn write_replay(path: &Path, records: &[ReplayRecord]) -> Result<()> {
    let mut writer = BufWriter::new(File::create(path)?);
    for record in records {
        serde_json::to_writer(&mut writer, record)?;
        writer.write_all(b"\n")?;
    }
    writer.flush()?;

    info!("Wrote {} frames to {}", records.len(), path.display());
    Ok(())
}
