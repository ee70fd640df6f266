//! Recognized symbols

use fsr_common::events::ControlAction;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Per-frame recognition result
///
/// `NoMatch` is an expected outcome (no rule in the predicted group matched),
/// not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Symbol {
    /// Upper-case letter 'A'..='Z'
    Letter(char),
    /// Control gesture
    Control(ControlAction),
    NoMatch,
}

impl Symbol {
    /// Letter symbol, upper-casing ASCII input; `None` outside A-Z
    pub fn letter(c: char) -> Option<Symbol> {
        let upper = c.to_ascii_uppercase();
        upper.is_ascii_uppercase().then_some(Symbol::Letter(upper))
    }

    pub fn is_match(&self) -> bool {
        !matches!(self, Symbol::NoMatch)
    }
}

impl From<ControlAction> for Symbol {
    fn from(action: ControlAction) -> Self {
        Symbol::Control(action)
    }
}

impl fmt::Display for Symbol {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Symbol::Letter(c) => write!(f, "{}", c),
            Symbol::Control(action) => write!(f, "{}", action),
            Symbol::NoMatch => write!(f, "NONE"),
        }
    }
}
