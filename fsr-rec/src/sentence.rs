//! Sentence buffer
//!
//! Holds the committed text for a recognition session. The buffer is mutated
//! only by the commit path and by two external requests (clear, replace the
//! trailing word). [`SharedSentence`] wraps it in a lock so those requests can
//! arrive from other tasks while frames are being processed; every mutation
//! holds the write lock for its whole duration.

use fsr_common::events::{EventBus, OverflowPolicy, SpellEvent};
use std::sync::{Arc, RwLock, RwLockReadGuard, RwLockWriteGuard};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

/// Result of an append
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppendOutcome {
    Appended,
    /// Appended after dropping `dropped` characters from the front
    Truncated { dropped: usize },
    /// Buffer full and the policy refuses appends; text unchanged
    Rejected,
}

/// Result of a trailing-word replacement
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Replacement {
    pub old_word: String,
    pub new_word: String,
    /// Characters dropped from the front to stay within the maximum length
    pub dropped: usize,
}

/// Rejected buffer mutation
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SentenceError {
    #[error("replacement word is empty")]
    EmptyWord,

    #[error("replacement word {0:?} contains non-alphabetic characters")]
    NotAlphabetic(String),

    #[error("replacement would grow the sentence to {length} characters (max {max})")]
    Overflow { length: usize, max: usize },
}

/// Committed text with a maximum length
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SentenceBuffer {
    text: String,
    max_length: usize,
    policy: OverflowPolicy,
}

impl SentenceBuffer {
    /// `max_length` below 1 is treated as 1
    pub fn new(max_length: usize, policy: OverflowPolicy) -> Self {
        Self {
            text: String::new(),
            max_length: max_length.max(1),
            policy,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.text
    }

    /// Length in characters
    pub fn len(&self) -> usize {
        self.text.chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.text.is_empty()
    }

    pub fn max_length(&self) -> usize {
        self.max_length
    }

    pub fn policy(&self) -> OverflowPolicy {
        self.policy
    }

    pub fn push_char(&mut self, c: char) -> AppendOutcome {
        self.append(c)
    }

    pub fn push_space(&mut self) -> AppendOutcome {
        self.append(' ')
    }

    /// Remove the last character; returns it, or `None` on an empty buffer
    pub fn backspace(&mut self) -> Option<char> {
        self.text.pop()
    }

    /// Characters after the last space (empty right after a space)
    pub fn trailing_word(&self) -> &str {
        match self.text.rfind(' ') {
            Some(pos) => &self.text[pos + 1..],
            None => &self.text,
        }
    }

    pub fn clear(&mut self) {
        self.text.clear();
    }

    /// Swap the trailing word for `word`, upper-cased
    ///
    /// The word must be non-empty ASCII letters. If the result exceeds the
    /// maximum length, `truncate_oldest` drops characters from the front and
    /// `reject_append` refuses the replacement.
    pub fn replace_trailing_word(&mut self, word: &str) -> Result<Replacement, SentenceError> {
        let new_word = word.trim();
        if new_word.is_empty() {
            return Err(SentenceError::EmptyWord);
        }
        if !new_word.chars().all(|c| c.is_ascii_alphabetic()) {
            return Err(SentenceError::NotAlphabetic(word.to_string()));
        }
        let new_word = new_word.to_ascii_uppercase();
        // Truncation could only keep part of the word
        if new_word.len() > self.max_length {
            return Err(SentenceError::Overflow {
                length: new_word.len(),
                max: self.max_length,
            });
        }

        let old_word = self.trailing_word().to_string();
        let prefix_len = self.len() - old_word.chars().count();
        let length = prefix_len + new_word.len();

        let dropped = if length > self.max_length {
            match self.policy {
                OverflowPolicy::RejectAppend => {
                    return Err(SentenceError::Overflow {
                        length,
                        max: self.max_length,
                    })
                }
                OverflowPolicy::TruncateOldest => length - self.max_length,
            }
        } else {
            0
        };

        let cut = self.text.len() - old_word.len();
        self.text.truncate(cut);
        self.text.push_str(&new_word);
        self.drop_front(dropped);

        Ok(Replacement {
            old_word,
            new_word,
            dropped,
        })
    }

    fn append(&mut self, c: char) -> AppendOutcome {
        let len = self.len();
        if len < self.max_length {
            self.text.push(c);
            return AppendOutcome::Appended;
        }

        match self.policy {
            OverflowPolicy::RejectAppend => AppendOutcome::Rejected,
            OverflowPolicy::TruncateOldest => {
                let dropped = len + 1 - self.max_length;
                self.drop_front(dropped);
                self.text.push(c);
                AppendOutcome::Truncated { dropped }
            }
        }
    }

    fn drop_front(&mut self, count: usize) {
        if count == 0 {
            return;
        }
        let cut = self
            .text
            .char_indices()
            .nth(count)
            .map(|(i, _)| i)
            .unwrap_or(self.text.len());
        self.text.drain(..cut);
    }
}

/// Where external mutations are announced
#[derive(Clone)]
struct Announcer {
    events: EventBus,
    session_id: Uuid,
}

/// Shared handle to a session's sentence buffer
///
/// Cloning is cheap; all clones see the same buffer. Handles created by a
/// recognition session announce external mutations on the session's event
/// bus (`BufferCleared`, `TrailingWordReplaced`, `BufferOverflow`).
#[derive(Clone)]
pub struct SharedSentence {
    inner: Arc<RwLock<SentenceBuffer>>,
    announcer: Option<Announcer>,
}

impl SharedSentence {
    pub fn new(buffer: SentenceBuffer) -> Self {
        Self {
            inner: Arc::new(RwLock::new(buffer)),
            announcer: None,
        }
    }

    /// Announce external mutations on `events` on behalf of `session_id`
    pub fn with_events(mut self, events: EventBus, session_id: Uuid) -> Self {
        self.announcer = Some(Announcer { events, session_id });
        self
    }

    /// Current text
    pub fn snapshot(&self) -> String {
        self.read().as_str().to_string()
    }

    pub fn trailing_word(&self) -> String {
        self.read().trailing_word().to_string()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn clear(&self) {
        self.write().clear();
        debug!("Sentence buffer cleared");

        if let Some(announcer) = &self.announcer {
            announcer.events.emit_lossy(SpellEvent::BufferCleared {
                session_id: announcer.session_id,
                timestamp: fsr_common::time::now(),
            });
        }
    }

    /// Replace the trailing word; returns the sentence afterwards
    pub fn replace_trailing_word(&self, word: &str) -> Result<String, SentenceError> {
        let (replacement, sentence, policy) = {
            let mut buffer = self.write();
            let result = buffer.replace_trailing_word(word);
            if let Err(SentenceError::Overflow { length, max }) = &result {
                warn!("Trailing word replacement rejected: {} > {} characters", length, max);
                if let Some(announcer) = &self.announcer {
                    announcer.events.emit_lossy(SpellEvent::BufferOverflow {
                        session_id: announcer.session_id,
                        policy: buffer.policy(),
                        dropped: 0,
                        timestamp: fsr_common::time::now(),
                    });
                }
            }
            (result?, buffer.as_str().to_string(), buffer.policy())
        };

        debug!(
            "Trailing word {:?} replaced with {:?}",
            replacement.old_word, replacement.new_word
        );

        if let Some(announcer) = &self.announcer {
            if replacement.dropped > 0 {
                announcer.events.emit_lossy(SpellEvent::BufferOverflow {
                    session_id: announcer.session_id,
                    policy,
                    dropped: replacement.dropped,
                    timestamp: fsr_common::time::now(),
                });
            }
            announcer.events.emit_lossy(SpellEvent::TrailingWordReplaced {
                session_id: announcer.session_id,
                old_word: replacement.old_word,
                new_word: replacement.new_word,
                sentence: sentence.clone(),
                timestamp: fsr_common::time::now(),
            });
        }

        Ok(sentence)
    }

    pub(crate) fn read(&self) -> RwLockReadGuard<'_, SentenceBuffer> {
        // A panic while holding the lock cannot leave the text half-written
        self.inner.read().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub(crate) fn write(&self) -> RwLockWriteGuard<'_, SentenceBuffer> {
        self.inner.write().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

impl std::fmt::Debug for SharedSentence {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SharedSentence")
            .field("text", &self.snapshot())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn buffer(max: usize, policy: OverflowPolicy) -> SentenceBuffer {
        let mut buffer = SentenceBuffer::new(max, policy);
        for c in "HELLO WOR".chars() {
            buffer.push_char(c);
        }
        buffer
    }

    #[test]
    fn test_trailing_word() {
        let mut buffer = buffer(100, OverflowPolicy::TruncateOldest);
        assert_eq!(buffer.trailing_word(), "WOR");
        buffer.push_space();
        assert_eq!(buffer.trailing_word(), "");
        buffer.clear();
        assert_eq!(buffer.trailing_word(), "");
    }

    #[test]
    fn test_backspace_on_empty_is_noop() {
        let mut buffer = SentenceBuffer::new(10, OverflowPolicy::TruncateOldest);
        assert_eq!(buffer.backspace(), None);
        assert!(buffer.is_empty());
    }

    #[test]
    fn test_replace_trailing_word_uppercases() {
        let mut buffer = buffer(100, OverflowPolicy::TruncateOldest);
        let replacement = buffer.replace_trailing_word("world").unwrap();
        assert_eq!(buffer.as_str(), "HELLO WORLD");
        assert_eq!(replacement.old_word, "WOR");
        assert_eq!(replacement.new_word, "WORLD");
    }

    #[test]
    fn test_replace_rejects_bad_words() {
        let mut buffer = buffer(100, OverflowPolicy::TruncateOldest);
        assert_eq!(buffer.replace_trailing_word("  "), Err(SentenceError::EmptyWord));
        assert!(matches!(
            buffer.replace_trailing_word("w0rld"),
            Err(SentenceError::NotAlphabetic(_))
        ));
        assert_eq!(buffer.as_str(), "HELLO WOR");
    }

    #[test]
    fn test_truncate_oldest_drops_front() {
        let mut buffer = SentenceBuffer::new(3, OverflowPolicy::TruncateOldest);
        for c in ['A', 'B', 'C'] {
            assert_eq!(buffer.push_char(c), AppendOutcome::Appended);
        }
        assert_eq!(buffer.push_char('D'), AppendOutcome::Truncated { dropped: 1 });
        assert_eq!(buffer.as_str(), "BCD");
    }

    #[test]
    fn test_reject_append_keeps_text() {
        let mut buffer = SentenceBuffer::new(2, OverflowPolicy::RejectAppend);
        buffer.push_char('A');
        buffer.push_char('B');
        assert_eq!(buffer.push_space(), AppendOutcome::Rejected);
        assert_eq!(buffer.as_str(), "AB");
    }

    #[test]
    fn test_replace_respects_policy() {
        let mut truncating = buffer(10, OverflowPolicy::TruncateOldest);
        let replacement = truncating.replace_trailing_word("WORLDS").unwrap();
        assert_eq!(replacement.dropped, 2);
        assert_eq!(truncating.as_str(), "LLO WORLDS");

        let mut rejecting = buffer(10, OverflowPolicy::RejectAppend);
        assert_eq!(
            rejecting.replace_trailing_word("WORLDS"),
            Err(SentenceError::Overflow { length: 12, max: 10 })
        );
        assert_eq!(rejecting.as_str(), "HELLO WOR");
    }

    #[test]
    fn test_replace_rejects_word_longer_than_max() {
        let mut buffer = SentenceBuffer::new(3, OverflowPolicy::TruncateOldest);
        buffer.push_char('A');
        buffer.push_char('B');

        assert_eq!(
            buffer.replace_trailing_word("hello"),
            Err(SentenceError::Overflow { length: 5, max: 3 })
        );
        assert_eq!(buffer.as_str(), "AB");

        // A word that fits exactly still replaces
        let replacement = buffer.replace_trailing_word("yes").unwrap();
        assert_eq!(replacement.dropped, 0);
        assert_eq!(buffer.as_str(), "YES");
    }

    #[test]
    fn test_shared_handle_announces_mutations() {
        let events = EventBus::new(10);
        let mut rx = events.subscribe();
        let session_id = Uuid::new_v4();
        let shared = SharedSentence::new(buffer(100, OverflowPolicy::TruncateOldest))
            .with_events(events, session_id);

        let sentence = shared.replace_trailing_word("world").unwrap();
        assert_eq!(sentence, "HELLO WORLD");
        match rx.try_recv().unwrap() {
            SpellEvent::TrailingWordReplaced {
                session_id: id,
                old_word,
                new_word,
                ..
            } => {
                assert_eq!(id, session_id);
                assert_eq!(old_word, "WOR");
                assert_eq!(new_word, "WORLD");
            }
            other => panic!("Unexpected event: {:?}", other),
        }

        shared.clear();
        assert!(matches!(rx.try_recv().unwrap(), SpellEvent::BufferCleared { .. }));
        assert_eq!(shared.snapshot(), "");
    }

    #[test]
    fn test_clones_share_the_buffer() {
        let shared = SharedSentence::new(SentenceBuffer::new(10, OverflowPolicy::TruncateOldest));
        let other = shared.clone();
        other.write().push_char('Q');
        assert_eq!(shared.snapshot(), "Q");
    }
}
