//! Temporal confirmation state machine
//!
//! Debounces the noisy per-frame symbol stream into discrete commits. A
//! symbol must be observed for `threshold` consecutive frames (T) before it is
//! committed; up to `tolerance` (K) NoMatch frames are absorbed without losing
//! progress.
//!
//! # Transitions
//!
//! | State | Input | Next state | Commit |
//! |-------|-------|------------|--------|
//! | Idle | NoMatch | Idle | - |
//! | Idle | s | Accumulating(s, 1) | s if T = 1 |
//! | Accumulating(c, n) | c | Accumulating(c, n+1) or Cooldown(c) at T | c at T |
//! | Accumulating(c, _) | s != c | Accumulating(s, 1) | - |
//! | Cooldown(c) | c | Cooldown(c) | - |
//! | Cooldown(c) | s != c | Accumulating(s, 1) | - |
//! | Accumulating / Cooldown | NoMatch | held, or Idle once more than K | - |
//!
//! A matching symbol resets the NoMatch counter.

use crate::symbol::Symbol;
use fsr_common::events::RecognitionPhase;
use tracing::debug;

/// Confirmation state, owned exclusively by [`ConfirmationMachine`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ConfirmationState {
    #[default]
    Idle,
    Accumulating {
        candidate: Symbol,
        matches: u32,
        invalid: u32,
    },
    Cooldown {
        last: Symbol,
        invalid: u32,
    },
}

impl ConfirmationState {
    pub fn phase(&self) -> RecognitionPhase {
        match self {
            ConfirmationState::Idle => RecognitionPhase::Idle,
            ConfirmationState::Accumulating { .. } => RecognitionPhase::Accumulating,
            ConfirmationState::Cooldown { .. } => RecognitionPhase::Cooldown,
        }
    }
}

/// Debouncer turning per-frame symbols into commits
#[derive(Debug, Clone)]
pub struct ConfirmationMachine {
    threshold: u32,
    tolerance: u32,
    state: ConfirmationState,
}

impl ConfirmationMachine {
    /// `threshold` below 1 is treated as 1
    pub fn new(threshold: u32, tolerance: u32) -> Self {
        Self {
            threshold: threshold.max(1),
            tolerance,
            state: ConfirmationState::Idle,
        }
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }

    pub fn tolerance(&self) -> u32 {
        self.tolerance
    }

    pub fn state(&self) -> ConfirmationState {
        self.state
    }

    pub fn phase(&self) -> RecognitionPhase {
        self.state.phase()
    }

    /// Drop all progress without committing
    pub fn reset(&mut self) {
        self.state = ConfirmationState::Idle;
    }

    /// Feed one frame's symbol; returns the committed symbol, if any
    pub fn step(&mut self, symbol: Symbol) -> Option<Symbol> {
        use ConfirmationState::*;

        let (next, committed) = match (self.state, symbol) {
            (state, Symbol::NoMatch) => (self.absorb_no_match(state), None),

            (Idle, s) => self.enter(s),

            (Accumulating { candidate, matches, .. }, s) if s == candidate => {
                let matches = matches + 1;
                if matches >= self.threshold {
                    (Cooldown { last: s, invalid: 0 }, Some(s))
                } else {
                    (
                        Accumulating {
                            candidate,
                            matches,
                            invalid: 0,
                        },
                        None,
                    )
                }
            }
            (Accumulating { .. }, s) => self.enter(s),

            (Cooldown { last, .. }, s) if s == last => (Cooldown { last, invalid: 0 }, None),
            (Cooldown { .. }, s) => self.enter(s),
        };

        if next.phase() != self.state.phase() {
            debug!("Confirmation {} -> {}", self.state.phase(), next.phase());
        }
        self.state = next;
        committed
    }

    /// First observation of a new candidate
    fn enter(&self, symbol: Symbol) -> (ConfirmationState, Option<Symbol>) {
        if self.threshold <= 1 {
            (
                ConfirmationState::Cooldown {
                    last: symbol,
                    invalid: 0,
                },
                Some(symbol),
            )
        } else {
            (
                ConfirmationState::Accumulating {
                    candidate: symbol,
                    matches: 1,
                    invalid: 0,
                },
                None,
            )
        }
    }

    fn absorb_no_match(&self, state: ConfirmationState) -> ConfirmationState {
        match state {
            ConfirmationState::Idle => ConfirmationState::Idle,
            ConfirmationState::Accumulating {
                candidate,
                matches,
                invalid,
            } => {
                if invalid + 1 > self.tolerance {
                    ConfirmationState::Idle
                } else {
                    ConfirmationState::Accumulating {
                        candidate,
                        matches,
                        invalid: invalid + 1,
                    }
                }
            }
            ConfirmationState::Cooldown { last, invalid } => {
                if invalid + 1 > self.tolerance {
                    ConfirmationState::Idle
                } else {
                    ConfirmationState::Cooldown {
                        last,
                        invalid: invalid + 1,
                    }
                }
            }
        }
    }
}
