//! Geometric disambiguator
//!
//! Resolves a coarse group prediction to one symbol by evaluating the
//! group's ordered rule list against primitive hand features. The first
//! matching rule wins; when none match the result is [`Symbol::NoMatch`].
//!
//! Pure and deterministic: the same group and skeleton always produce the
//! same symbol.

mod features;
mod rules;
mod table;

pub use features::{Axis, HandFeatures, RuleThresholds, Span};
pub use rules::{Condition, Rule, RuleBook};
pub use table::{GroupSpec, GroupTable, TableError};

use crate::classifier::GroupId;
use crate::normalize::CanonicalSkeleton;
use crate::symbol::Symbol;
use tracing::trace;

/// Per-group ordered rule lists
#[derive(Debug, Clone)]
pub struct Disambiguator {
    table: GroupTable,
    thresholds: RuleThresholds,
    /// Indexed by group id; each list keeps rule book declaration order
    rules: Vec<Vec<Rule>>,
}

impl Disambiguator {
    /// Build per-group rule lists by filtering the rule book through the table
    pub fn new(table: GroupTable, book: &RuleBook, thresholds: RuleThresholds) -> Self {
        let rules = table
            .groups()
            .iter()
            .map(|group| {
                book.rules()
                    .iter()
                    .filter(|rule| group.contains(rule.symbol))
                    .cloned()
                    .collect()
            })
            .collect();

        Self {
            table,
            thresholds,
            rules,
        }
    }

    /// Standard rule book with the given thresholds
    pub fn with_thresholds(table: GroupTable, thresholds: RuleThresholds) -> Self {
        Self::new(table, &RuleBook::standard(&thresholds), thresholds)
    }

    pub fn table(&self) -> &GroupTable {
        &self.table
    }

    pub fn thresholds(&self) -> &RuleThresholds {
        &self.thresholds
    }

    /// Ordered rules consulted for one group
    pub fn rules_for(&self, group: GroupId) -> &[Rule] {
        &self.rules[group.index()]
    }

    pub fn disambiguate(&self, group: GroupId, skeleton: &CanonicalSkeleton) -> Symbol {
        let features = HandFeatures::extract(skeleton, &self.thresholds);
        match self.rules_for(group).iter().find(|rule| rule.matches(&features)) {
            Some(rule) => {
                trace!(frame = skeleton.sequence, group = %group, rule = rule.name, "Rule matched");
                rule.symbol
            }
            None => {
                trace!(frame = skeleton.sequence, group = %group, "No rule matched");
                Symbol::NoMatch
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use fsr_common::events::ControlAction;

    fn disambiguator() -> Disambiguator {
        Disambiguator::with_thresholds(GroupTable::standard().unwrap(), RuleThresholds::default())
    }

    #[test]
    fn test_group_rule_lists_follow_declaration_order() {
        let d = disambiguator();
        let order = |id: u8| -> Vec<Symbol> {
            d.rules_for(GroupId::new(id).unwrap())
                .iter()
                .map(|r| r.symbol)
                .collect()
        };

        assert_eq!(
            order(0),
            vec![
                Symbol::Control(ControlAction::Space),
                Symbol::Letter('E'),
                Symbol::Letter('A'),
                Symbol::Letter('S'),
            ]
        );
        assert_eq!(
            order(1),
            vec![Symbol::Letter('M'), Symbol::Letter('N'), Symbol::Letter('T')]
        );
        assert_eq!(
            order(5),
            vec![
                Symbol::Control(ControlAction::Backspace),
                Symbol::Letter('P'),
                Symbol::Letter('Q'),
                Symbol::Letter('K'),
                Symbol::Letter('Z'),
            ]
        );
    }

    #[test]
    fn test_every_group_has_a_rule_per_symbol() {
        let d = disambiguator();
        for group in d.table().groups() {
            let expected = group.letters.len() + group.controls.len();
            assert_eq!(d.rules_for(group.id).len(), expected, "group {}", group.id);
        }
    }
}
