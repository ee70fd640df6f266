//! Recognition session
//!
//! One explicit state object per session: normalizer, classifier,
//! disambiguator, confirmation machine, sentence buffer and event bus. No
//! process-wide singletons; two sessions never share state.
//!
//! # Frame pipeline
//!
//! ```text
//! LandmarkFrame -> Normalize -> Classify -> Disambiguate -> Confirm -> commit
//! ```
//!
//! Each call to [`RecognitionSession::process_frame`] runs one synchronous
//! pass. Invalid frames and low-confidence predictions are skipped without
//! touching the confirmation state. A classifier failure pauses the session
//! until [`RecognitionSession::restart`] is called.

use crate::classifier::GroupClassifier;
use crate::config::RecognizerConfig;
use crate::confirm::{ConfirmationMachine, ConfirmationState};
use crate::disambiguate::Disambiguator;
use crate::error::{Error, Result};
use crate::landmarks::LandmarkFrame;
use crate::normalize::{InvalidFrame, Normalizer};
use crate::sentence::{AppendOutcome, SentenceBuffer, SharedSentence};
use crate::symbol::Symbol;
use fsr_common::events::{ControlAction, EventBus, RecognitionPhase, SpellEvent};
use serde::Serialize;
use tracing::{debug, error, info, trace, warn};
use uuid::Uuid;

/// Why a frame produced no observation
#[derive(Debug, Clone, PartialEq)]
pub enum SkipReason {
    /// Missing, incomplete or degenerate landmarks
    InvalidFrame(InvalidFrame),
    /// Prediction below the configured minimum confidence
    LowConfidence { confidence: f32 },
    /// Session stopped; waiting for restart
    Stopped,
}

/// Result of one pipeline pass
#[derive(Debug, Clone, PartialEq)]
pub enum FrameOutcome {
    Skipped(SkipReason),
    /// Symbol seen this frame, nothing committed
    Observed(Symbol),
    /// Symbol committed this frame
    Committed(Symbol),
}

/// Snapshot of session state for status displays
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RecognitionStatus {
    pub session_id: Uuid,
    pub phase: RecognitionPhase,
    /// Symbol resolved on the most recent processed frame
    pub current_symbol: Option<Symbol>,
    /// Symbol being confirmed, if accumulating
    pub candidate: Option<Symbol>,
    /// Matching frames so far for `candidate`
    pub progress: u32,
    pub threshold: u32,
    pub sentence: String,
    pub trailing_word: String,
}

/// Per-session recognition pipeline
pub struct RecognitionSession<C> {
    session_id: Uuid,
    normalizer: Normalizer,
    classifier: C,
    disambiguator: Disambiguator,
    machine: ConfirmationMachine,
    min_confidence: f32,
    sentence: SharedSentence,
    events: EventBus,
    current_symbol: Option<Symbol>,
    unavailable: Option<String>,
    stopped: bool,
}

impl<C: GroupClassifier> RecognitionSession<C> {
    pub fn new(config: &RecognizerConfig, classifier: C, events: EventBus) -> Self {
        let session_id = Uuid::new_v4();
        let sentence = SharedSentence::new(SentenceBuffer::new(config.max_length, config.overflow))
            .with_events(events.clone(), session_id);

        info!(
            "Recognition session {} started (T={}, K={}, min confidence {})",
            session_id, config.stability_threshold, config.invalid_tolerance, config.min_confidence
        );

        Self {
            session_id,
            normalizer: Normalizer::new(config.reference_bone),
            classifier,
            disambiguator: Disambiguator::with_thresholds(config.groups.clone(), config.thresholds),
            machine: ConfirmationMachine::new(config.stability_threshold, config.invalid_tolerance),
            min_confidence: config.min_confidence,
            sentence,
            events,
            current_symbol: None,
            unavailable: None,
            stopped: false,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Shared handle for external consumers (snapshot, clear, replace)
    pub fn sentence_handle(&self) -> SharedSentence {
        self.sentence.clone()
    }

    pub fn sentence(&self) -> String {
        self.sentence.snapshot()
    }

    pub fn confirmation_state(&self) -> ConfirmationState {
        self.machine.state()
    }

    /// Symbol resolved on the most recent processed frame
    pub fn current_symbol(&self) -> Option<Symbol> {
        self.current_symbol
    }

    pub fn is_unavailable(&self) -> bool {
        self.unavailable.is_some()
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped
    }

    /// Run one frame through the pipeline
    pub fn process_frame(&mut self, frame: &LandmarkFrame) -> Result<FrameOutcome> {
        if let Some(reason) = &self.unavailable {
            return Err(Error::RecognitionUnavailable(reason.clone()));
        }
        if self.stopped {
            return Ok(FrameOutcome::Skipped(SkipReason::Stopped));
        }

        let skeleton = match self.normalizer.normalize(frame) {
            Ok(skeleton) => skeleton,
            Err(invalid) => {
                trace!(frame = frame.sequence, "Skipping frame: {}", invalid);
                return Ok(FrameOutcome::Skipped(SkipReason::InvalidFrame(invalid)));
            }
        };

        let prediction = match self.classifier.classify(&skeleton) {
            Ok(prediction) => prediction,
            Err(e) => {
                let reason = e.to_string();
                error!("Classifier failed on frame {}: {}", frame.sequence, reason);
                // Confirmation progress is held until restart
                self.unavailable = Some(reason.clone());
                self.events.emit_lossy(SpellEvent::RecognitionUnavailable {
                    session_id: self.session_id,
                    reason: reason.clone(),
                    timestamp: fsr_common::time::now(),
                });
                return Err(Error::RecognitionUnavailable(reason));
            }
        };

        if prediction.confidence < self.min_confidence {
            trace!(
                frame = frame.sequence,
                confidence = prediction.confidence,
                "Skipping low-confidence prediction"
            );
            return Ok(FrameOutcome::Skipped(SkipReason::LowConfidence {
                confidence: prediction.confidence,
            }));
        }

        let symbol = self.disambiguator.disambiguate(prediction.group, &skeleton);
        self.current_symbol = Some(symbol);
        trace!(frame = frame.sequence, group = %prediction.group, symbol = %symbol, "Observed");

        match self.machine.step(symbol) {
            Some(committed) => {
                self.apply_commit(committed);
                Ok(FrameOutcome::Committed(committed))
            }
            None => Ok(FrameOutcome::Observed(symbol)),
        }
    }

    /// Stop recognition, discarding confirmation progress without committing
    pub fn stop(&mut self) {
        self.machine.reset();
        self.current_symbol = None;
        self.stopped = true;
        info!("Recognition session {} stopped", self.session_id);
        self.events.emit_lossy(SpellEvent::RecognitionStopped {
            session_id: self.session_id,
            timestamp: fsr_common::time::now(),
        });
    }

    /// Resume after a stop or a classifier failure
    pub fn restart(&mut self) {
        self.machine.reset();
        self.current_symbol = None;
        self.unavailable = None;
        self.stopped = false;
        info!("Recognition session {} restarted", self.session_id);
        self.events.emit_lossy(SpellEvent::RecognitionRestarted {
            session_id: self.session_id,
            timestamp: fsr_common::time::now(),
        });
    }

    pub fn clear_buffer(&self) {
        self.sentence.clear();
    }

    /// Accept a suggested word in place of the trailing word
    ///
    /// Returns the sentence after the replacement.
    pub fn replace_trailing_word(&self, word: &str) -> Result<String> {
        self.sentence
            .replace_trailing_word(word)
            .map_err(|e| Error::InvalidInput(e.to_string()))
    }

    pub fn status(&self) -> RecognitionStatus {
        let state = self.machine.state();
        let phase = if self.unavailable.is_some() {
            RecognitionPhase::Unavailable
        } else if self.stopped {
            RecognitionPhase::Stopped
        } else {
            state.phase()
        };
        let (candidate, progress) = match state {
            ConfirmationState::Accumulating {
                candidate, matches, ..
            } => (Some(candidate), matches),
            _ => (None, 0),
        };

        let buffer = self.sentence.read();
        RecognitionStatus {
            session_id: self.session_id,
            phase,
            current_symbol: self.current_symbol,
            candidate,
            progress,
            threshold: self.machine.threshold(),
            sentence: buffer.as_str().to_string(),
            trailing_word: buffer.trailing_word().to_string(),
        }
    }

    fn apply_commit(&mut self, symbol: Symbol) {
        let mut buffer = self.sentence.write();
        let timestamp = fsr_common::time::now();

        let appended = match symbol {
            Symbol::Letter(c) => Some(buffer.push_char(c)),
            Symbol::Control(ControlAction::Space) => Some(buffer.push_space()),
            Symbol::Control(ControlAction::Backspace) => {
                buffer.backspace();
                None
            }
            Symbol::Control(ControlAction::Next) => {
                let word = buffer.trailing_word().to_string();
                debug!("Word finalized: {:?}", word);
                self.events.emit_lossy(SpellEvent::WordFinalized {
                    session_id: self.session_id,
                    word,
                    timestamp,
                });
                None
            }
            // The machine never confirms NoMatch
            Symbol::NoMatch => return,
        };

        match appended {
            Some(AppendOutcome::Rejected) => {
                warn!(
                    "Sentence full ({} characters); dropped commit {}",
                    buffer.max_length(),
                    symbol
                );
                self.events.emit_lossy(SpellEvent::BufferOverflow {
                    session_id: self.session_id,
                    policy: buffer.policy(),
                    dropped: 0,
                    timestamp,
                });
                return;
            }
            Some(AppendOutcome::Truncated { dropped }) => {
                warn!("Sentence full; dropped {} leading characters", dropped);
                self.events.emit_lossy(SpellEvent::BufferOverflow {
                    session_id: self.session_id,
                    policy: buffer.policy(),
                    dropped,
                    timestamp,
                });
            }
            Some(AppendOutcome::Appended) | None => {}
        }

        let sentence = buffer.as_str().to_string();
        drop(buffer);

        debug!("Committed {} -> {:?}", symbol, sentence);
        let event = match symbol {
            Symbol::Letter(character) => SpellEvent::CharacterCommitted {
                session_id: self.session_id,
                character,
                sentence,
                timestamp,
            },
            Symbol::Control(action) => SpellEvent::ControlActionCommitted {
                session_id: self.session_id,
                action,
                sentence,
                timestamp,
            },
            Symbol::NoMatch => return,
        };
        self.events.emit_lossy(event);
    }
}
