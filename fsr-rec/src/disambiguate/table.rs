//! Group table: coarse group id to candidate letters and control gestures
//!
//! Invariants enforced at construction:
//! - exactly eight groups, ids 0-7 each used once
//! - 2-4 upper-case letters per group
//! - the letter sets partition A-Z (no overlaps, no gaps)
//! - each control gesture belongs to at most one group

use crate::classifier::GroupId;
use crate::symbol::Symbol;
use fsr_common::config::{default_groups, GroupEntry};
use fsr_common::events::ControlAction;
use thiserror::Error;

const MIN_GROUP_SIZE: usize = 2;
const MAX_GROUP_SIZE: usize = 4;

/// Group table violations
#[derive(Debug, Clone, PartialEq, Error)]
pub enum TableError {
    #[error("expected 8 groups, found {0}")]
    GroupCount(usize),

    #[error("group id {0} is out of range 0-7")]
    InvalidGroupId(u8),

    #[error("group id {0} is defined more than once")]
    DuplicateGroupId(u8),

    #[error("group {id} has {size} letters (expected 2-4)")]
    GroupSize { id: u8, size: usize },

    #[error("group {id} contains invalid letter {letter:?}")]
    InvalidLetter { id: u8, letter: char },

    #[error("letter {0} appears in more than one group")]
    DuplicateLetter(char),

    #[error("letters missing from the table: {0}")]
    MissingLetters(String),

    #[error("control gesture {0} appears in more than one group")]
    DuplicateControl(ControlAction),
}

/// One validated group
#[derive(Debug, Clone, PartialEq)]
pub struct GroupSpec {
    pub id: GroupId,
    pub letters: Vec<char>,
    pub controls: Vec<ControlAction>,
}

impl GroupSpec {
    pub fn contains(&self, symbol: Symbol) -> bool {
        match symbol {
            Symbol::Letter(c) => self.letters.contains(&c),
            Symbol::Control(action) => self.controls.contains(&action),
            Symbol::NoMatch => false,
        }
    }
}

/// Validated mapping from group id to candidate symbols
#[derive(Debug, Clone, PartialEq)]
pub struct GroupTable {
    /// Indexed by group id
    groups: Vec<GroupSpec>,
}

impl GroupTable {
    pub fn new(entries: &[GroupEntry]) -> Result<Self, TableError> {
        if entries.len() != GroupId::COUNT {
            return Err(TableError::GroupCount(entries.len()));
        }

        let mut slots: Vec<Option<GroupSpec>> = vec![None; GroupId::COUNT];
        let mut seen_letters = [false; 26];
        let mut seen_controls: Vec<ControlAction> = Vec::new();

        for entry in entries {
            let id = GroupId::new(entry.id).ok_or(TableError::InvalidGroupId(entry.id))?;
            if slots[id.index()].is_some() {
                return Err(TableError::DuplicateGroupId(entry.id));
            }

            let letters: Vec<char> = entry.letters.chars().collect();
            if !(MIN_GROUP_SIZE..=MAX_GROUP_SIZE).contains(&letters.len()) {
                return Err(TableError::GroupSize {
                    id: entry.id,
                    size: letters.len(),
                });
            }
            for &letter in &letters {
                if !letter.is_ascii_uppercase() {
                    return Err(TableError::InvalidLetter { id: entry.id, letter });
                }
                let slot = &mut seen_letters[(letter as u8 - b'A') as usize];
                if *slot {
                    return Err(TableError::DuplicateLetter(letter));
                }
                *slot = true;
            }

            for &action in &entry.controls {
                if seen_controls.contains(&action) {
                    return Err(TableError::DuplicateControl(action));
                }
                seen_controls.push(action);
            }

            slots[id.index()] = Some(GroupSpec {
                id,
                letters,
                controls: entry.controls.clone(),
            });
        }

        let missing: String = ('A'..='Z')
            .zip(seen_letters)
            .filter(|(_, seen)| !seen)
            .map(|(c, _)| c)
            .collect();
        if !missing.is_empty() {
            return Err(TableError::MissingLetters(missing));
        }

        // Eight distinct in-range ids fill every slot
        let groups = slots.into_iter().flatten().collect();
        Ok(Self { groups })
    }

    /// The built-in eight-group table
    pub fn standard() -> Result<Self, TableError> {
        Self::new(&default_groups())
    }

    pub fn group(&self, id: GroupId) -> &GroupSpec {
        &self.groups[id.index()]
    }

    pub fn groups(&self) -> &[GroupSpec] {
        &self.groups
    }

    pub fn group_of(&self, letter: char) -> Option<GroupId> {
        self.group_of_symbol(Symbol::Letter(letter.to_ascii_uppercase()))
    }

    pub fn group_of_control(&self, action: ControlAction) -> Option<GroupId> {
        self.group_of_symbol(Symbol::Control(action))
    }

    pub fn group_of_symbol(&self, symbol: Symbol) -> Option<GroupId> {
        self.groups.iter().find(|g| g.contains(symbol)).map(|g| g.id)
    }
}
