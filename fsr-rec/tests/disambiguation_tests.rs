//! Integration tests for the geometric disambiguator
//!
//! Tests:
//! - Every synthetic symbol pose resolves to its own symbol in its group
//! - Resolution is invariant to translation, scale and handedness
//! - Declaration order breaks ties exactly on a split threshold (M over N)
//! - Poses no rule accepts resolve to NoMatch

mod helpers;

use fsr_common::config::ReferenceBone;
use fsr_common::events::ControlAction;
use fsr_rec::classifier::GroupId;
use fsr_rec::disambiguate::{Disambiguator, HandFeatures, RuleThresholds, Span};
use fsr_rec::landmarks::{Handedness, Point3};
use fsr_rec::normalize::Normalizer;
use fsr_rec::synthetic::{symbol_pose, transition_pose};
use fsr_rec::Symbol;
use helpers::{pose_for, skeleton, standard_table};

fn all_symbols() -> Vec<Symbol> {
    let mut symbols: Vec<Symbol> = ('A'..='Z').map(Symbol::Letter).collect();
    symbols.extend(ControlAction::ALL.map(Symbol::Control));
    symbols
}

fn disambiguator() -> Disambiguator {
    Disambiguator::with_thresholds(standard_table(), RuleThresholds::default())
}

#[test]
fn test_every_pose_resolves_to_its_symbol() {
    let d = disambiguator();
    for symbol in all_symbols() {
        let group = d.table().group_of_symbol(symbol).unwrap();
        let resolved = d.disambiguate(group, &skeleton(&pose_for(symbol)));
        assert_eq!(resolved, symbol, "pose for {} resolved in group {}", symbol, group);
    }
}

#[test]
fn test_resolution_ignores_placement_and_handedness() {
    let d = disambiguator();
    let normalizer = Normalizer::new(ReferenceBone::MiddleMcp);

    for symbol in all_symbols() {
        let group = d.table().group_of_symbol(symbol).unwrap();
        let pose = symbol_pose(symbol).unwrap();
        for (handedness, offset, scale) in [
            (Handedness::Left, Point3::new(0.6, 0.7, -0.05), 0.2),
            (Handedness::Right, Point3::new(0.3, 0.9, 0.1), 0.35),
        ] {
            let frame = pose.to_frame(1, handedness, offset, scale);
            let skeleton = normalizer.normalize(&frame).unwrap();
            assert_eq!(
                d.disambiguate(group, &skeleton),
                symbol,
                "{} as {:?} hand at scale {}",
                symbol,
                handedness,
                scale
            );
        }
    }
}

#[test]
fn test_disambiguate_is_deterministic() {
    let d = disambiguator();
    let group = GroupId::new(6).unwrap();
    let skeleton = skeleton(&pose_for(Symbol::Letter('V')));

    let first = d.disambiguate(group, &skeleton);
    for _ in 0..100 {
        assert_eq!(d.disambiguate(group, &skeleton), first);
    }
}

#[test]
fn test_m_n_split_on_thumb_index_distance() {
    let group = GroupId::new(1).unwrap();
    let skeleton = skeleton(&pose_for(Symbol::Letter('N')));
    let span = HandFeatures::extract(&skeleton, &RuleThresholds::default())
        .span(Span::ThumbIndexBase);

    let with_split = |split: f32| {
        let thresholds = RuleThresholds {
            thumb_index_split: split,
            ..RuleThresholds::default()
        };
        Disambiguator::with_thresholds(standard_table(), thresholds).disambiguate(group, &skeleton)
    };

    // Verify: distance above the split -> N, below -> M
    assert_eq!(with_split(span - 0.05), Symbol::Letter('N'));
    assert_eq!(with_split(span + 0.05), Symbol::Letter('M'));
    // Exactly on the split both rules hold; M is declared first
    assert_eq!(with_split(span), Symbol::Letter('M'));
}

#[test]
fn test_u_v_split_on_index_middle_spread() {
    let group = GroupId::new(6).unwrap();
    let skeleton = skeleton(&pose_for(Symbol::Letter('V')));
    let spread = HandFeatures::extract(&skeleton, &RuleThresholds::default())
        .span(Span::IndexMiddleTip);

    let with_split = |split: f32| {
        let thresholds = RuleThresholds {
            spread_split: split,
            ..RuleThresholds::default()
        };
        Disambiguator::with_thresholds(standard_table(), thresholds).disambiguate(group, &skeleton)
    };

    assert_eq!(with_split(spread - 0.05), Symbol::Letter('V'));
    assert_eq!(with_split(spread), Symbol::Letter('U'));
}

#[test]
fn test_transition_pose_has_no_match() {
    let d = disambiguator();
    let group = d.table().group_of('G').unwrap();
    assert_eq!(d.disambiguate(group, &skeleton(&transition_pose())), Symbol::NoMatch);
}

#[test]
fn test_open_hand_outside_its_group_has_no_match() {
    // An open hand has no curled finger and no thumb under the fingers
    let d = disambiguator();
    let group = GroupId::new(1).unwrap();
    let open = skeleton(&pose_for(Symbol::Control(ControlAction::Next)));
    assert_eq!(d.disambiguate(group, &open), Symbol::NoMatch);
}

#[test]
fn test_extension_features() {
    let thresholds = RuleThresholds::default();

    let open = skeleton(&pose_for(Symbol::Control(ControlAction::Next)));
    assert_eq!(
        HandFeatures::extract(&open, &thresholds).extension_pattern(),
        [true; 5]
    );

    let fist = skeleton(&pose_for(Symbol::Letter('S')));
    assert_eq!(
        HandFeatures::extract(&fist, &thresholds).extension_pattern(),
        [false; 5]
    );

    // Rotating the hand does not change which fingers are extended
    let down = skeleton(&pose_for(Symbol::Letter('J')));
    let up = skeleton(&pose_for(Symbol::Letter('I')));
    assert_eq!(
        HandFeatures::extract(&down, &thresholds).extension_pattern(),
        HandFeatures::extract(&up, &thresholds).extension_pattern()
    );
}
