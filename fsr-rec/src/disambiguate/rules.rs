//! Declarative disambiguation rules
//!
//! A [`Rule`] names a symbol and the conditions that must all hold for it.
//! The [`RuleBook`] lists rules for every letter and control gesture in one
//! fixed declaration order; the disambiguator filters it per group, so the
//! declaration order is also the priority order inside each group.
//!
//! Boundary convention: span conditions are inclusive (`<=` / `>=`), ordinal
//! comparisons are strict.

use super::features::{Axis, HandFeatures, RuleThresholds, Span};
use crate::landmarks::{Finger, Landmark};
use crate::symbol::Symbol;
use fsr_common::events::ControlAction;
use std::cmp::Ordering;

/// A single geometric predicate
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Condition {
    Extended(Finger),
    Curled(Finger),
    /// Span length `<=` threshold
    SpanAtMost(Span, f32),
    /// Span length `>=` threshold
    SpanAtLeast(Span, f32),
    /// `a` compared with `b` on one axis must have exactly `order`
    Ordinal {
        a: Landmark,
        axis: Axis,
        order: Ordering,
        b: Landmark,
    },
}

impl Condition {
    /// `a` lies below `b` (larger canonical y)
    pub const fn below(a: Landmark, b: Landmark) -> Self {
        Condition::Ordinal {
            a,
            axis: Axis::Y,
            order: Ordering::Greater,
            b,
        }
    }

    /// `a` lies above `b` (smaller canonical y)
    pub const fn above(a: Landmark, b: Landmark) -> Self {
        Condition::Ordinal {
            a,
            axis: Axis::Y,
            order: Ordering::Less,
            b,
        }
    }

    /// `a` lies further towards the thumb than `b`
    pub const fn thumb_side_of(a: Landmark, b: Landmark) -> Self {
        Condition::Ordinal {
            a,
            axis: Axis::X,
            order: Ordering::Greater,
            b,
        }
    }

    /// `a` lies further towards the pinky than `b`
    pub const fn pinky_side_of(a: Landmark, b: Landmark) -> Self {
        Condition::Ordinal {
            a,
            axis: Axis::X,
            order: Ordering::Less,
            b,
        }
    }

    pub fn holds(&self, features: &HandFeatures<'_>) -> bool {
        match *self {
            Condition::Extended(finger) => features.is_extended(finger),
            Condition::Curled(finger) => !features.is_extended(finger),
            Condition::SpanAtMost(span, limit) => features.span(span) <= limit,
            Condition::SpanAtLeast(span, limit) => features.span(span) >= limit,
            Condition::Ordinal { a, axis, order, b } => features
                .coordinate(a, axis)
                .partial_cmp(&features.coordinate(b, axis))
                == Some(order),
        }
    }
}

/// Conjunction of conditions resolving to one symbol
#[derive(Debug, Clone, PartialEq)]
pub struct Rule {
    pub symbol: Symbol,
    /// Short description used in trace logs
    pub name: &'static str,
    pub conditions: Vec<Condition>,
}

impl Rule {
    pub fn new(symbol: Symbol, name: &'static str, conditions: Vec<Condition>) -> Self {
        Self {
            symbol,
            name,
            conditions,
        }
    }

    pub fn matches(&self, features: &HandFeatures<'_>) -> bool {
        self.conditions.iter().all(|c| c.holds(features))
    }
}

/// Declaration-ordered rules for all letters and control gestures
#[derive(Debug, Clone, PartialEq)]
pub struct RuleBook {
    rules: Vec<Rule>,
}

impl RuleBook {
    pub fn new(rules: Vec<Rule>) -> Self {
        Self { rules }
    }

    pub fn rules(&self) -> &[Rule] {
        &self.rules
    }

    /// First rule declared for `symbol`
    pub fn rule_for(&self, symbol: Symbol) -> Option<&Rule> {
        self.rules.iter().find(|r| r.symbol == symbol)
    }

    /// The built-in fingerspelling rules
    ///
    /// Inside a group the earlier rule wins, so the more specific shape of
    /// each pair is declared first (SPACE before the fist letters, NEXT before
    /// B, BACKSPACE and P/Q before K/Z).
    pub fn standard(thresholds: &RuleThresholds) -> Self {
        use Condition::*;
        use Finger::*;
        use Landmark as L;

        let letter = |c: char| Symbol::Letter(c);
        let control = |a: ControlAction| Symbol::Control(a);

        let rules = vec![
            // Fist family: thumb placement decides
            Rule::new(
                control(ControlAction::Space),
                "fist with thumb out",
                vec![Curled(Index), Curled(Middle), Extended(Thumb)],
            ),
            Rule::new(
                letter('E'),
                "thumb tucked under the fingertips",
                vec![
                    Condition::below(L::ThumbTip, L::IndexTip),
                    Condition::below(L::ThumbTip, L::MiddleTip),
                ],
            ),
            Rule::new(
                letter('A'),
                "thumb beside the index finger",
                vec![Condition::thumb_side_of(L::ThumbTip, L::IndexMcp)],
            ),
            Rule::new(
                letter('S'),
                "thumb across the fingers",
                vec![Condition::pinky_side_of(L::ThumbTip, L::IndexMcp)],
            ),
            // Thumb under the fingers
            Rule::new(
                letter('M'),
                "thumb under fingers, close to index base",
                vec![
                    Curled(Index),
                    Condition::below(L::ThumbTip, L::IndexPip),
                    SpanAtMost(Span::ThumbIndexBase, thresholds.thumb_index_split),
                ],
            ),
            Rule::new(
                letter('N'),
                "thumb under fingers, away from index base",
                vec![
                    Curled(Index),
                    Condition::below(L::ThumbTip, L::IndexPip),
                    SpanAtLeast(Span::ThumbIndexBase, thresholds.thumb_index_split),
                ],
            ),
            Rule::new(
                letter('T'),
                "thumb poking between index and middle",
                vec![Curled(Index), Condition::above(L::ThumbTip, L::IndexPip)],
            ),
            // Flat hand family
            Rule::new(
                control(ControlAction::Next),
                "open hand",
                vec![
                    Extended(Index),
                    Extended(Middle),
                    Extended(Ring),
                    Extended(Pinky),
                    Extended(Thumb),
                ],
            ),
            Rule::new(
                letter('B'),
                "four fingers up, thumb folded",
                vec![Extended(Index), Extended(Middle), Extended(Ring), Extended(Pinky)],
            ),
            Rule::new(
                letter('W'),
                "three fingers up",
                vec![Extended(Index), Extended(Middle), Extended(Ring), Curled(Pinky)],
            ),
            Rule::new(
                letter('F'),
                "index touches thumb, others up",
                vec![Curled(Index), Extended(Middle), Extended(Ring), Extended(Pinky)],
            ),
            Rule::new(
                letter('D'),
                "index up, others closed",
                vec![Extended(Index), Curled(Middle), Curled(Ring), Curled(Pinky)],
            ),
            // Curved family
            Rule::new(
                letter('C'),
                "open curve",
                vec![SpanAtLeast(Span::ThumbMiddleTip, thresholds.curve_split)],
            ),
            Rule::new(
                letter('O'),
                "closed curve",
                vec![SpanAtMost(Span::ThumbMiddleTip, thresholds.curve_split)],
            ),
            // Index pointer family
            Rule::new(
                letter('L'),
                "index up, thumb out",
                vec![Extended(Index), Extended(Thumb), Curled(Middle)],
            ),
            Rule::new(
                letter('H'),
                "index and middle together",
                vec![
                    Extended(Index),
                    Extended(Middle),
                    SpanAtMost(Span::IndexMiddleTip, thresholds.spread_split),
                ],
            ),
            Rule::new(
                letter('G'),
                "index pointing alone",
                vec![Extended(Index), Curled(Middle)],
            ),
            Rule::new(
                letter('X'),
                "hooked index",
                vec![Curled(Index), Curled(Middle)],
            ),
            // Downward-facing family
            Rule::new(
                control(ControlAction::Backspace),
                "inverted fist with thumb out",
                vec![
                    Curled(Index),
                    Curled(Middle),
                    Extended(Thumb),
                    Condition::below(L::ThumbTip, L::Wrist),
                ],
            ),
            Rule::new(
                letter('P'),
                "K pointing down",
                vec![
                    Extended(Index),
                    Extended(Middle),
                    Condition::below(L::IndexTip, L::IndexMcp),
                ],
            ),
            Rule::new(
                letter('Q'),
                "G pointing down",
                vec![
                    Extended(Index),
                    Curled(Middle),
                    Condition::below(L::IndexTip, L::IndexMcp),
                ],
            ),
            Rule::new(
                letter('K'),
                "index and middle up, thumb between",
                vec![Extended(Index), Extended(Middle)],
            ),
            Rule::new(
                letter('Z'),
                "index tracing",
                vec![Extended(Index), Curled(Middle)],
            ),
            // Two-finger family
            Rule::new(
                letter('R'),
                "index crossed over middle",
                vec![
                    Extended(Index),
                    Extended(Middle),
                    Condition::pinky_side_of(L::IndexTip, L::MiddleTip),
                ],
            ),
            Rule::new(
                letter('U'),
                "index and middle together",
                vec![
                    Extended(Index),
                    Extended(Middle),
                    SpanAtMost(Span::IndexMiddleTip, thresholds.spread_split),
                ],
            ),
            Rule::new(
                letter('V'),
                "index and middle spread",
                vec![
                    Extended(Index),
                    Extended(Middle),
                    SpanAtLeast(Span::IndexMiddleTip, thresholds.spread_split),
                ],
            ),
            // Pinky family
            Rule::new(
                letter('Y'),
                "pinky and thumb out",
                vec![Extended(Pinky), Extended(Thumb)],
            ),
            Rule::new(
                letter('J'),
                "pinky hooked down",
                vec![Extended(Pinky), Condition::below(L::PinkyTip, L::PinkyMcp)],
            ),
            Rule::new(
                letter('I'),
                "pinky up",
                vec![Extended(Pinky), Curled(Index)],
            ),
        ];

        Self { rules }
    }
}
