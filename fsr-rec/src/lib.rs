//! # Fingerspelling Recognizer Library (fsr-rec)
//!
//! Turns a live stream of hand-landmark observations into committed text.
//!
//! **Purpose:** Normalize landmark geometry, resolve the coarse classifier's
//! 8-way group prediction to a letter or control gesture with deterministic
//! geometric rules, and debounce the per-frame symbol stream into discrete
//! commits appended to a sentence buffer.
//!
//! **Architecture:** One [`session::RecognitionSession`] per user session,
//! driven frame by frame by [`source::run_session`]; commits are broadcast on
//! the shared [`fsr_common::events::EventBus`].

pub mod classifier;
pub mod config;
pub mod confirm;
pub mod disambiguate;
pub mod error;
pub mod landmarks;
pub mod normalize;
pub mod replay;
pub mod sentence;
pub mod session;
pub mod source;
pub mod symbol;
pub mod synthetic;

pub use error::{Error, Result};
pub use session::RecognitionSession;
pub use symbol::Symbol;
