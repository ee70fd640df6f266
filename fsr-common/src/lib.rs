//! # FSR Common Library
//!
//! Shared code for the fingerspelling recognizer crates:
//! - Error types
//! - Event types (SpellEvent enum) and the EventBus
//! - TOML configuration loading and resolution
//! - Timestamp helpers

pub mod config;
pub mod error;
pub mod events;
pub mod time;

pub use error::{Error, Result};
