//! Property tests for kernel invariants under arbitrary host input.

use cellguard_core::combat::CombatResolver;
use cellguard_core::gestures::{GestureOutcome, GestureRejection, Shape};
use cellguard_core::orchestrator::{GameplayOrchestrator, InputSignal};
use cellguard_test_utils::determinism::strategies::{arb_combatant, arb_delta_ms, arb_frame_inputs};
use cellguard_test_utils::fixtures::{bloodstream_zone, lungs_zone, run_scripted};
use proptest::prelude::*;

/// Operations applied to a lone combatant.
#[derive(Debug, Clone, Copy)]
enum StatOp {
    Damage(u32),
    Heal(u32),
    Spend(u32),
    Restore(u32),
}

fn arb_stat_op() -> impl Strategy<Value = StatOp> {
    prop_oneof![
        (0u32..300).prop_map(StatOp::Damage),
        (0u32..300).prop_map(StatOp::Heal),
        (0u32..150).prop_map(StatOp::Spend),
        (0u32..150).prop_map(StatOp::Restore),
    ]
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(48))]

    /// Health and energy stay within `[0, max]` whatever happens.
    #[test]
    fn prop_combatant_values_stay_clamped(
        mut combatant in arb_combatant(),
        ops in prop::collection::vec(arb_stat_op(), 0..60),
    ) {
        let resolver = CombatResolver::default();
        for op in ops {
            let before = combatant;
            match op {
                StatOp::Damage(raw) => {
                    let report = resolver.resolve_damage(&mut combatant, raw);
                    prop_assert_eq!(before.health() - combatant.health(), report.dealt);
                    if before.is_alive() {
                        prop_assert!(report.dealt >= 1);
                    }
                }
                StatOp::Heal(amount) => {
                    let healed = resolver.heal(&mut combatant, amount);
                    prop_assert_eq!(combatant.health() - before.health(), healed);
                    if before.is_dead() {
                        prop_assert_eq!(healed, 0);
                    }
                }
                StatOp::Spend(cost) => {
                    let paid = combatant.spend_energy(cost);
                    prop_assert_eq!(paid, before.energy() >= cost);
                    if !paid {
                        prop_assert_eq!(combatant.energy(), before.energy());
                    }
                }
                StatOp::Restore(amount) => {
                    resolver.restore_energy(&mut combatant, amount);
                }
            }
            prop_assert!(combatant.health() <= combatant.max_health());
            prop_assert!(combatant.energy() <= combatant.max_energy());
        }
    }

    /// A rejected gesture never changes session state.
    #[test]
    fn prop_rejected_gestures_change_nothing(
        seed in any::<u64>(),
        frames in prop::collection::vec((arb_frame_inputs(), arb_delta_ms()), 1..80),
    ) {
        let mut session = GameplayOrchestrator::new(lungs_zone(), seed);
        for (inputs, delta_ms) in frames {
            for input in &inputs {
                let before = session.state_hash();
                let outcome = session.apply_input(input);
                if let Some(GestureOutcome::Rejected(reason)) = outcome {
                    prop_assert_eq!(session.state_hash(), before, "rejection {:?} mutated state", reason);
                }
            }
            let time = session.game_time_ms();
            session.update(time, delta_ms);
        }
    }

    /// Player and enemies stay on the playfield and the player's stats stay sane.
    #[test]
    fn prop_session_invariants_hold(
        seed in any::<u64>(),
        frames in prop::collection::vec((arb_frame_inputs(), arb_delta_ms()), 1..100),
    ) {
        let mut session = GameplayOrchestrator::new(bloodstream_zone(), seed);
        for (inputs, delta_ms) in frames {
            for input in &inputs {
                session.apply_input(input);
            }
            let time = session.game_time_ms();
            let was_over = session.is_game_over();
            session.update(time, delta_ms);

            let bounds = *session.bounds();
            prop_assert!(bounds.contains(session.player_position()));
            for enemy in session.enemies() {
                prop_assert!(bounds.contains(enemy.position));
            }
            let player = session.player();
            prop_assert!(player.health() <= player.max_health());
            prop_assert!(player.energy() <= player.max_energy());

            let expected = if was_over { time } else { time + u64::from(delta_ms) };
            prop_assert_eq!(session.game_time_ms(), expected);
        }
    }
}

#[test]
fn test_energy_gate_rejects_without_side_effects() {
    let mut session = GameplayOrchestrator::new(bloodstream_zone(), 17);
    run_scripted(&mut session, 120);

    // Chain lightning needs no target; spam it until energy runs dry.
    let mut rejected = None;
    for _ in 0..10 {
        let before = session.state_hash();
        let energy = session.player().energy();
        match session.on_gesture(Shape::Zigzag, None) {
            GestureOutcome::Performed { .. } => assert!(session.player().energy() < energy),
            GestureOutcome::Rejected(reason) => {
                assert_eq!(session.state_hash(), before);
                assert_eq!(session.player().energy(), energy);
                rejected = Some(reason);
                break;
            }
        }
    }
    assert_eq!(rejected, Some(GestureRejection::InsufficientEnergy));
}

#[test]
fn test_unknown_shape_rejected() {
    let mut session = GameplayOrchestrator::new(bloodstream_zone(), 17);
    let before = session.state_hash();
    let outcome = session.apply_input(&InputSignal::Gesture {
        shape: Shape::Unknown,
        target: None,
    });
    assert_eq!(outcome, Some(GestureOutcome::Rejected(GestureRejection::Unrecognized)));
    assert_eq!(session.state_hash(), before);
}
