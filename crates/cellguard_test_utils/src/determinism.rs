//! Determinism testing utilities.
//!
//! Provides a harness for verifying that a session produces identical
//! results given an identical zone, seed and input stream.
//!
//! # Testing Strategy
//!
//! Replays and batch comparisons only work if sessions are 100%
//! deterministic. Sources of non-determinism include:
//!
//! - **Floating-point math**: positions, speeds and multipliers use
//!   [`cellguard_core::math::Fixed`] throughout.
//!
//! - **HashMap iteration order**: enemies live in a `BTreeMap` and are
//!   always visited in ascending id order.
//!
//! - **System randomness**: the session's `ChaCha8Rng` is seeded from the
//!   session seed and is the only source of randomness.
//!
//! - **Wall clock**: game timers run on accumulated frame deltas; the host
//!   clock is only used for tracing.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use std::thread;

use cellguard_core::data::ZoneData;
use cellguard_core::orchestrator::GameplayOrchestrator;
use cellguard_core::replay::{Replay, ReplayPlayer};
use tracing::warn;

use crate::fixtures::{drive_frame, FRAME_MS};

/// Result of a determinism test.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DeterminismResult {
    /// Whether all runs produced identical results.
    pub is_deterministic: bool,
    /// Hashes from each run.
    pub hashes: Vec<u64>,
    /// Number of frames simulated per run.
    pub frames: u64,
}

impl DeterminismResult {
    fn from_hashes(hashes: Vec<u64>, frames: u64) -> Self {
        Self {
            is_deterministic: hashes.windows(2).all(|w| w[0] == w[1]),
            hashes,
            frames,
        }
    }

    /// Distinct hashes seen (exactly 1 for a deterministic session).
    #[must_use]
    pub fn unique_hashes(&self) -> Vec<u64> {
        let mut unique = self.hashes.clone();
        unique.sort_unstable();
        unique.dedup();
        unique
    }

    /// Assert that every run matched, with a detailed error message.
    ///
    /// # Panics
    ///
    /// Panics if the runs produced different hashes.
    pub fn assert_deterministic(&self) {
        if !self.is_deterministic {
            panic!(
                "Session is non-deterministic!\n\
                 Runs: {}\n\
                 Frames: {}\n\
                 Unique hashes: {} (expected 1)\n\
                 All hashes: {:?}",
                self.hashes.len(),
                self.frames,
                self.unique_hashes().len(),
                self.hashes
            );
        }
    }
}

/// Run a state machine several times and compare final hashes.
///
/// `step` receives the frame index so scripted inputs can depend on it.
pub fn verify_determinism<S, Setup, Step, HashFn>(
    runs: usize,
    frames: u64,
    setup: Setup,
    step: Step,
    hash: HashFn,
) -> DeterminismResult
where
    Setup: Fn() -> S,
    Step: Fn(&mut S, u64),
    HashFn: Fn(&S) -> u64,
{
    let hashes = (0..runs)
        .map(|_| {
            let mut state = setup();
            for frame in 0..frames {
                step(&mut state, frame);
            }
            hash(&state)
        })
        .collect();

    DeterminismResult::from_hashes(hashes, frames)
}

/// Run the scripted session in `zone` twice with `seed` and compare.
#[must_use]
pub fn verify_session_determinism(zone: &ZoneData, seed: u64, frames: u64) -> bool {
    verify_determinism(
        2,
        frames,
        || GameplayOrchestrator::new(zone.clone(), seed),
        |session, frame| {
            drive_frame(session, frame);
        },
        GameplayOrchestrator::state_hash,
    )
    .is_deterministic
}

/// Run `num_sessions` identical scripted sessions on separate threads.
///
/// # Panics
///
/// Panics if a session thread panics.
#[must_use]
pub fn run_parallel_sessions(zone: &ZoneData, seed: u64, frames: u64, num_sessions: usize) -> DeterminismResult {
    let hashes = thread::scope(|scope| {
        let handles: Vec<_> = (0..num_sessions)
            .map(|_| {
                scope.spawn(|| {
                    let mut session = GameplayOrchestrator::new(zone.clone(), seed);
                    for frame in 0..frames {
                        drive_frame(&mut session, frame);
                    }
                    session.state_hash()
                })
            })
            .collect();

        handles
            .into_iter()
            .map(|h| h.join().unwrap_or_else(|_| panic!("session thread panicked")))
            .collect()
    });

    DeterminismResult::from_hashes(hashes, frames)
}

/// Step two sessions in lockstep and report the first frame whose hashes
/// differ, or `None` if they never do. Frame 0 is the initial state.
pub fn find_first_divergence<F>(setup_fn: F, frames: u64) -> Option<u64>
where
    F: Fn() -> GameplayOrchestrator,
{
    let mut a = setup_fn();
    let mut b = setup_fn();

    if a.state_hash() != b.state_hash() {
        return Some(0);
    }

    for frame in 0..frames {
        drive_frame(&mut a, frame);
        drive_frame(&mut b, frame);
        if a.state_hash() != b.state_hash() {
            warn!(frame = frame + 1, game_time_ms = a.game_time_ms(), "Sessions diverged");
            return Some(frame + 1);
        }
    }

    None
}

/// Record a scripted session, round-trip the replay through bytes and
/// check that playback lands on the recorded hash.
#[must_use]
pub fn verify_replay_determinism(zone: &ZoneData, seed: u64, frames: u64) -> bool {
    let mut session = GameplayOrchestrator::new(zone.clone(), seed);
    let mut replay = Replay::new(zone.id.clone(), seed);
    for frame in 0..frames {
        let inputs = drive_frame(&mut session, frame);
        replay.record_frame(inputs, FRAME_MS);
    }
    replay.finalize(session.game_time_ms(), session.state_hash());

    let player = replay
        .to_bytes()
        .and_then(|bytes| Replay::from_bytes(&bytes))
        .and_then(|restored| ReplayPlayer::new(restored, zone.clone()));
    let mut player = match player {
        Ok(player) => player,
        Err(e) => {
            warn!("Replay round-trip failed: {e}");
            return false;
        }
    };
    player.run_to_end();
    player.verify()
}

/// Compute a simple hash for any hashable value.
pub fn compute_hash<T: Hash>(value: &T) -> u64 {
    let mut hasher = DefaultHasher::new();
    value.hash(&mut hasher);
    hasher.finish()
}

/// Proptest strategies for session inputs.
///
/// These strategies generate random but reproducible inputs for
/// property-based testing.
pub mod strategies {
    use cellguard_core::combatant::Combatant;
    use cellguard_core::gestures::Shape;
    use cellguard_core::math::{Fixed, Vec2Fixed};
    use cellguard_core::orchestrator::{HazardOccupant, InputSignal, TargetRef};
    use cellguard_core::powerups::PowerUpKind;
    use proptest::prelude::*;

    /// A coordinate somewhat beyond a default 800x600 world, so clamping
    /// gets exercised.
    pub fn arb_coordinate() -> impl Strategy<Value = Fixed> {
        (-200i32..1000i32).prop_map(Fixed::from_num)
    }

    /// A 2D position, possibly out of bounds.
    pub fn arb_position() -> impl Strategy<Value = Vec2Fixed> {
        (arb_coordinate(), arb_coordinate()).prop_map(|(x, y)| Vec2Fixed::new(x, y))
    }

    /// Any gesture shape, including unrecognized ones.
    pub fn arb_shape() -> impl Strategy<Value = Shape> {
        prop_oneof![
            Just(Shape::Line),
            Just(Shape::Circle),
            Just(Shape::Triangle),
            Just(Shape::Square),
            Just(Shape::Zigzag),
            Just(Shape::Unknown),
        ]
    }

    /// Any power-up kind.
    pub fn arb_power_up() -> impl Strategy<Value = PowerUpKind> {
        prop_oneof![
            Just(PowerUpKind::Health),
            Just(PowerUpKind::Energy),
            Just(PowerUpKind::Shield),
            Just(PowerUpKind::DamageBoost),
            Just(PowerUpKind::SpeedBoost),
        ]
    }

    /// A target reference; enemy ids may or may not exist.
    pub fn arb_target() -> impl Strategy<Value = TargetRef> {
        prop_oneof![(0u32..20).prop_map(TargetRef::Enemy), Just(TargetRef::Boss)]
    }

    /// The player or a target reference.
    pub fn arb_occupant() -> impl Strategy<Value = HazardOccupant> {
        prop_oneof![Just(HazardOccupant::Player), arb_target().prop_map(HazardOccupant::Target)]
    }

    /// Any input signal a host could send.
    pub fn arb_input() -> impl Strategy<Value = InputSignal> {
        prop_oneof![
            arb_position().prop_map(InputSignal::SetPlayerPosition),
            (0u32..20, arb_position())
                .prop_map(|(enemy_id, position)| InputSignal::SetEnemyPosition { enemy_id, position }),
            arb_position().prop_map(InputSignal::SetBossPosition),
            (arb_shape(), proptest::option::of(arb_target()))
                .prop_map(|(shape, target)| InputSignal::Gesture { shape, target }),
            arb_power_up().prop_map(InputSignal::PowerUp),
            arb_target().prop_map(|target| InputSignal::AttackHit { target }),
            (0u32..20).prop_map(|enemy_id| InputSignal::EnemyContact { enemy_id }),
            (0u32..4, arb_occupant())
                .prop_map(|(hazard_id, occupant)| InputSignal::HazardOverlap { hazard_id, occupant }),
            (0u32..20).prop_map(|enemy_id| InputSignal::RemoveEnemy { enemy_id }),
        ]
    }

    /// A frame's worth of inputs.
    pub fn arb_frame_inputs() -> impl Strategy<Value = Vec<InputSignal>> {
        prop::collection::vec(arb_input(), 0..4)
    }

    /// A frame delta between 1ms and a long hitch.
    pub fn arb_delta_ms() -> impl Strategy<Value = u32> {
        1u32..250
    }

    /// A combatant with arbitrary but sane stats.
    pub fn arb_combatant() -> impl Strategy<Value = Combatant> {
        (1u32..500, 0u32..200, 0u32..60, 0u32..30)
            .prop_map(|(health, energy, attack, defense)| Combatant::new(health, energy, attack, defense))
    }
}
