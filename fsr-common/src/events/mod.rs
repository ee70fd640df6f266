//! Event types for the FSR event system
//!
//! Provides the shared event definitions and the EventBus used to deliver
//! commit events to UI, speech and text consumers.

mod recognition_types;

pub use recognition_types::{ControlAction, OverflowPolicy, RecognitionPhase};

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use uuid::Uuid;

/// FSR event types
///
/// Events are broadcast via EventBus and can be serialized for transport to
/// out-of-process consumers. Every event carries the id of the recognition
/// session that produced it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type")]
pub enum SpellEvent {
    /// A letter was confirmed and appended to the sentence
    ///
    /// Triggers:
    /// - UI: Update sentence display
    /// - Speech: Optionally speak the letter
    CharacterCommitted {
        /// Session that committed the character
        session_id: Uuid,
        /// Committed letter ('A'..='Z')
        character: char,
        /// Sentence after the append
        sentence: String,
        /// When the character was committed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A control gesture was confirmed
    ///
    /// Emitted for SPACE, NEXT and BACKSPACE after the corresponding buffer
    /// operation has been applied.
    ControlActionCommitted {
        /// Session that committed the action
        session_id: Uuid,
        /// Which control gesture
        action: ControlAction,
        /// Sentence after the buffer operation
        sentence: String,
        /// When the action was committed
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The trailing word was finalized by a NEXT gesture
    ///
    /// Triggers:
    /// - Suggestions: Look up completions for `word`
    WordFinalized {
        /// Session that finalized the word
        session_id: Uuid,
        /// Trailing word at the time of the gesture (may be empty)
        word: String,
        /// When the word was finalized
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The sentence buffer was cleared by an external request
    BufferCleared {
        /// Session whose buffer was cleared
        session_id: Uuid,
        /// When the buffer was cleared
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The trailing word was swapped (suggestion accepted)
    TrailingWordReplaced {
        /// Session whose buffer changed
        session_id: Uuid,
        /// Word that was replaced
        old_word: String,
        /// Word that replaced it
        new_word: String,
        /// Sentence after the replacement
        sentence: String,
        /// When the replacement happened
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// A buffer mutation hit the maximum sentence length
    BufferOverflow {
        /// Session whose buffer overflowed
        session_id: Uuid,
        /// Policy that was applied
        policy: OverflowPolicy,
        /// Characters dropped from the front (0 when the append was rejected)
        dropped: usize,
        /// When the overflow occurred
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// The classifier failed; recognition is paused until restarted
    RecognitionUnavailable {
        /// Session that paused
        session_id: Uuid,
        /// Human-readable failure reason
        reason: String,
        /// When the failure was detected
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition was stopped; confirmation progress was discarded
    RecognitionStopped {
        /// Session that stopped
        session_id: Uuid,
        /// When recognition stopped
        timestamp: chrono::DateTime<chrono::Utc>,
    },

    /// Recognition was restarted after a stop or a classifier failure
    RecognitionRestarted {
        /// Session that restarted
        session_id: Uuid,
        /// When recognition restarted
        timestamp: chrono::DateTime<chrono::Utc>,
    },
}

impl SpellEvent {
    /// Get event type as string for filtering
    pub fn event_type(&self) -> &str {
        match self {
            SpellEvent::CharacterCommitted { .. } => "CharacterCommitted",
            SpellEvent::ControlActionCommitted { .. } => "ControlActionCommitted",
            SpellEvent::WordFinalized { .. } => "WordFinalized",
            SpellEvent::BufferCleared { .. } => "BufferCleared",
            SpellEvent::TrailingWordReplaced { .. } => "TrailingWordReplaced",
            SpellEvent::BufferOverflow { .. } => "BufferOverflow",
            SpellEvent::RecognitionUnavailable { .. } => "RecognitionUnavailable",
            SpellEvent::RecognitionStopped { .. } => "RecognitionStopped",
            SpellEvent::RecognitionRestarted { .. } => "RecognitionRestarted",
        }
    }

    /// Session that produced the event
    pub fn session_id(&self) -> Uuid {
        match self {
            SpellEvent::CharacterCommitted { session_id, .. }
            | SpellEvent::ControlActionCommitted { session_id, .. }
            | SpellEvent::WordFinalized { session_id, .. }
            | SpellEvent::BufferCleared { session_id, .. }
            | SpellEvent::TrailingWordReplaced { session_id, .. }
            | SpellEvent::BufferOverflow { session_id, .. }
            | SpellEvent::RecognitionUnavailable { session_id, .. }
            | SpellEvent::RecognitionStopped { session_id, .. }
            | SpellEvent::RecognitionRestarted { session_id, .. } => *session_id,
        }
    }

    /// Whether this event is one of the two commit events
    pub fn is_commit(&self) -> bool {
        matches!(
            self,
            SpellEvent::CharacterCommitted { .. } | SpellEvent::ControlActionCommitted { .. }
        )
    }
}

// ========================================
// EventBus Implementation
// ========================================

/// Central event distribution bus for recognition events
///
/// The EventBus uses tokio::broadcast internally, providing:
/// - Non-blocking publish (slow subscribers don't block the frame pipeline)
/// - Multiple concurrent subscribers
/// - Automatic cleanup when subscribers drop
/// - Lagged message detection for slow subscribers
///
/// # Examples
///
/// ```
/// use fsr_common::events::{EventBus, SpellEvent};
///
/// let event_bus = EventBus::new(100);
/// let mut rx = event_bus.subscribe();
///
/// event_bus.emit_lossy(SpellEvent::BufferCleared {
///     session_id: uuid::Uuid::new_v4(),
///     timestamp: chrono::Utc::now(),
/// });
///
/// assert!(matches!(rx.try_recv(), Ok(SpellEvent::BufferCleared { .. })));
/// ```
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SpellEvent>,
    capacity: usize,
}

impl EventBus {
    /// Creates a new EventBus with specified channel capacity
    ///
    /// # Arguments
    ///
    /// * `capacity` - Number of events to buffer before slow subscribers lag
    pub fn new(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity.max(1));
        Self { tx, capacity: capacity.max(1) }
    }

    /// Subscribe to all future events
    ///
    /// Events emitted before subscription are not received.
    pub fn subscribe(&self) -> broadcast::Receiver<SpellEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers
    ///
    /// Returns `Ok(subscriber_count)` if at least one subscriber exists.
    /// Returns `Err` if no subscribers are listening.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: SpellEvent,
    ) -> Result<usize, broadcast::error::SendError<SpellEvent>> {
        self.tx.send(event)
    }

    /// Emit an event, ignoring if no subscribers are listening
    pub fn emit_lossy(&self, event: SpellEvent) {
        let _ = self.tx.send(event);
    }

    /// Get the current number of active subscribers
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Get the configured channel capacity
    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn committed(character: char) -> SpellEvent {
        SpellEvent::CharacterCommitted {
            session_id: Uuid::nil(),
            character,
            sentence: character.to_string(),
            timestamp: chrono::Utc::now(),
        }
    }

    #[test]
    fn test_emit_without_subscribers_fails() {
        let bus = EventBus::new(10);
        assert!(bus.emit(committed('A')).is_err());
        // Lossy emit never fails
        bus.emit_lossy(committed('A'));
    }

    #[test]
    fn test_emit_reaches_all_subscribers() {
        let bus = EventBus::new(10);
        let mut rx1 = bus.subscribe();
        let mut rx2 = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 2);

        let delivered = bus.emit(committed('B')).unwrap();
        assert_eq!(delivered, 2);

        for rx in [&mut rx1, &mut rx2] {
            match rx.try_recv().unwrap() {
                SpellEvent::CharacterCommitted { character, .. } => assert_eq!(character, 'B'),
                other => panic!("Unexpected event: {:?}", other),
            }
        }
    }

    #[test]
    fn test_zero_capacity_is_clamped() {
        let bus = EventBus::new(0);
        assert_eq!(bus.capacity(), 1);
    }

    #[test]
    fn test_event_serialization_is_tagged() {
        let event = SpellEvent::ControlActionCommitted {
            session_id: Uuid::nil(),
            action: ControlAction::Backspace,
            sentence: "HEL".to_string(),
            timestamp: chrono::Utc::now(),
        };

        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["type"], "ControlActionCommitted");
        assert_eq!(json["action"], "backspace");
        assert_eq!(json["sentence"], "HEL");

        let back: SpellEvent = serde_json::from_value(json).unwrap();
        assert_eq!(back.event_type(), "ControlActionCommitted");
    }

    #[test]
    fn test_is_commit() {
        assert!(committed('C').is_commit());
        let cleared = SpellEvent::BufferCleared {
            session_id: Uuid::nil(),
            timestamp: chrono::Utc::now(),
        };
        assert!(!cleared.is_commit());
        assert_eq!(cleared.session_id(), Uuid::nil());
    }

    #[test]
    fn test_control_action_parsing() {
        assert_eq!("SPACE".parse::<ControlAction>().unwrap(), ControlAction::Space);
        assert_eq!("next".parse::<ControlAction>().unwrap(), ControlAction::Next);
        assert_eq!("Backspace".parse::<ControlAction>().unwrap(), ControlAction::Backspace);
        assert!("enter".parse::<ControlAction>().is_err());
        assert_eq!(ControlAction::Next.to_string(), "NEXT");
    }
}
