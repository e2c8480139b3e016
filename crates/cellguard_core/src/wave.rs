//! Wave scheduling and difficulty escalation.
//!
//! A wave moves `Idle -> Spawning -> Spawned`, and is complete once it is
//! `Spawned` with no live enemies left. The director only decides *when*
//! and *what* to spawn; placing the enemy and tracking it is up to the
//! orchestrator.
//!
//! # Difficulty curve
//!
//! | wave | enemies | interval |
//! |------|---------|----------|
//! | 1    | 5       | 2000ms   |
//! | 2    | 7       | 1900ms   |
//! | 13+  | 29..30  | ≤ 800ms  |
//!
//! Zone multipliers are fixed at construction and scale every wave;
//! the cap and floor are applied after scaling.

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::math::{decimal_serde, scale_u32, Fixed};
use crate::rng::weighted_index;

/// Enemies in wave 1 before zone scaling.
pub const BASE_ENEMIES_PER_WAVE: u32 = 5;
/// Extra enemies per subsequent wave.
pub const ENEMIES_PER_WAVE_STEP: u32 = 2;
/// Hard cap on enemies per wave.
pub const MAX_ENEMIES_PER_WAVE: u32 = 30;
/// Spawn interval in wave 1 before zone scaling.
pub const BASE_SPAWN_INTERVAL_MS: u64 = 2000;
/// Interval reduction per subsequent wave.
pub const SPAWN_INTERVAL_STEP_MS: u64 = 100;
/// Shortest allowed spawn interval.
pub const MIN_SPAWN_INTERVAL_MS: u64 = 500;
/// Live enemy cap before zone scaling.
pub const BASE_MAX_ENEMIES: u32 = 10;

/// Zone difficulty multipliers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveDifficulty {
    /// Scales enemies per wave.
    #[serde(with = "decimal_serde", default = "one")]
    pub enemy_count: Fixed,
    /// Scales the spawn interval (below 1 means faster spawns).
    #[serde(with = "decimal_serde", default = "one")]
    pub spawn_interval: Fixed,
    /// Scales the live enemy cap.
    #[serde(with = "decimal_serde", default = "one")]
    pub max_enemies: Fixed,
}

fn one() -> Fixed {
    Fixed::ONE
}

impl Default for WaveDifficulty {
    fn default() -> Self {
        Self {
            enemy_count: Fixed::ONE,
            spawn_interval: Fixed::ONE,
            max_enemies: Fixed::ONE,
        }
    }
}

/// Lifecycle of the current wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum WavePhase {
    /// Waiting for `start_wave`.
    Idle,
    /// Spawning enemies.
    Spawning,
    /// All enemies spawned (or nothing to spawn); waiting for the field to clear.
    Spawned,
}

/// Snapshot of the current wave.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct WaveState {
    /// Wave number (1-based).
    pub wave_number: u32,
    /// Enemies this wave will spawn.
    pub enemies_per_wave: u32,
    /// Enemies spawned so far this wave.
    pub enemies_spawned: u32,
    /// Whether the wave is still spawning.
    pub in_progress: bool,
    /// Current spawn interval.
    pub spawn_interval_ms: u64,
}

/// A request to spawn one enemy from the zone's enemy table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SpawnRequest {
    /// Index into the weight table given at construction.
    pub spec_index: usize,
    /// Wave the enemy belongs to.
    pub wave_number: u32,
}

/// Schedules spawns for successive waves.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct WaveDirector {
    weights: Vec<Fixed>,
    difficulty: WaveDifficulty,
    max_enemies: u32,
    wave_number: u32,
    enemies_per_wave: u32,
    enemies_spawned: u32,
    spawn_interval_ms: u64,
    spawn_timer_ms: u64,
    phase: WavePhase,
}

impl WaveDirector {
    /// Create a director at wave 1, idle.
    ///
    /// `weights` are the spawn weights of the zone's enemy table in
    /// declaration order.
    #[must_use]
    pub fn new(weights: Vec<Fixed>, difficulty: WaveDifficulty) -> Self {
        let max_enemies = scale_u32(BASE_MAX_ENEMIES, difficulty.max_enemies).max(1);

        let mut director = Self {
            weights,
            difficulty,
            max_enemies,
            wave_number: 1,
            enemies_per_wave: 0,
            enemies_spawned: 0,
            spawn_interval_ms: 0,
            spawn_timer_ms: 0,
            phase: WavePhase::Idle,
        };
        director.recompute();
        if director.is_degenerate() {
            warn!("Wave director has no spawnable enemies; waves will auto-complete");
        }
        director
    }

    /// Whether no enemy can ever be spawned.
    #[must_use]
    pub fn is_degenerate(&self) -> bool {
        !self.weights.iter().any(|w| *w > Fixed::ZERO)
    }

    /// Current wave number (1-based).
    #[must_use]
    pub const fn wave_number(&self) -> u32 {
        self.wave_number
    }

    /// Lifecycle phase of the current wave.
    #[must_use]
    pub const fn phase(&self) -> WavePhase {
        self.phase
    }

    /// Live enemy cap.
    #[must_use]
    pub const fn max_enemies(&self) -> u32 {
        self.max_enemies
    }

    /// Snapshot of the current wave.
    #[must_use]
    pub fn state(&self) -> WaveState {
        WaveState {
            wave_number: self.wave_number,
            enemies_per_wave: self.enemies_per_wave,
            enemies_spawned: self.enemies_spawned,
            in_progress: self.phase == WavePhase::Spawning,
            spawn_interval_ms: self.spawn_interval_ms,
        }
    }

    /// Begin spawning the current wave.
    pub fn start_wave(&mut self) {
        self.enemies_spawned = 0;
        self.spawn_timer_ms = 0;
        if self.is_degenerate() || self.enemies_per_wave == 0 {
            self.phase = WavePhase::Spawned;
        } else {
            self.phase = WavePhase::Spawning;
        }
        debug!(
            wave = self.wave_number,
            enemies = self.enemies_per_wave,
            interval_ms = self.spawn_interval_ms,
            "Wave started"
        );
    }

    /// Advance the spawn timer; at most one spawn per call.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        delta_ms: u32,
        live_count: u32,
        rng: &mut R,
    ) -> Option<SpawnRequest> {
        if self.phase != WavePhase::Spawning {
            return None;
        }
        self.spawn_timer_ms += u64::from(delta_ms);
        if self.spawn_timer_ms < self.spawn_interval_ms || live_count >= self.max_enemies {
            return None;
        }

        let Some(spec_index) = weighted_index(&self.weights, rng) else {
            self.phase = WavePhase::Spawned;
            return None;
        };
        self.spawn_timer_ms = 0;
        self.enemies_spawned += 1;
        if self.enemies_spawned >= self.enemies_per_wave {
            self.phase = WavePhase::Spawned;
        }
        Some(SpawnRequest {
            spec_index,
            wave_number: self.wave_number,
        })
    }

    /// Whether the wave has spawned everything and the field is clear.
    #[must_use]
    pub fn is_wave_complete(&self, live_count: u32) -> bool {
        self.phase == WavePhase::Spawned && live_count == 0
    }

    /// Move to the next wave and recompute its size and pace.
    ///
    /// Leaves the director idle; call [`start_wave`](Self::start_wave) to begin.
    pub fn next_wave(&mut self) {
        self.wave_number += 1;
        self.recompute();
        self.enemies_spawned = 0;
        self.spawn_timer_ms = 0;
        self.phase = WavePhase::Idle;
    }

    fn recompute(&mut self) {
        self.enemies_per_wave = enemies_for_wave(self.wave_number, self.difficulty.enemy_count);
        self.spawn_interval_ms = interval_for_wave(self.wave_number, self.difficulty.spawn_interval);
    }
}

/// Enemies in `wave` after scaling, capped at [`MAX_ENEMIES_PER_WAVE`].
#[must_use]
pub fn enemies_for_wave(wave: u32, multiplier: Fixed) -> u32 {
    let raw = BASE_ENEMIES_PER_WAVE.saturating_add(ENEMIES_PER_WAVE_STEP.saturating_mul(wave.saturating_sub(1)));
    let raw = raw.min(MAX_ENEMIES_PER_WAVE);
    scale_u32(raw, multiplier).clamp(1, MAX_ENEMIES_PER_WAVE)
}

/// Spawn interval for `wave` after scaling, floored at [`MIN_SPAWN_INTERVAL_MS`].
#[must_use]
pub fn interval_for_wave(wave: u32, multiplier: Fixed) -> u64 {
    let reduction = SPAWN_INTERVAL_STEP_MS.saturating_mul(u64::from(wave.saturating_sub(1)));
    let raw = BASE_SPAWN_INTERVAL_MS.saturating_sub(reduction);
    let scaled = Fixed::saturating_from_num(raw)
        .saturating_mul(multiplier)
        .to_num::<i64>()
        .max(0) as u64;
    scaled.max(MIN_SPAWN_INTERVAL_MS)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;
    use crate::rng::seeded;

    fn director() -> WaveDirector {
        WaveDirector::new(vec![ratio(3, 10), ratio(5, 10), ratio(2, 10)], WaveDifficulty::default())
    }

    /// Drive the director until the wave stops spawning, never killing anything.
    fn spawn_all(director: &mut WaveDirector) -> u32 {
        let mut rng = seeded(5);
        let mut spawned = 0;
        for _ in 0..1_000 {
            if director.update(100, 0, &mut rng).is_some() {
                spawned += 1;
            }
        }
        spawned
    }

    #[test]
    fn test_curve_is_monotonic_and_bounded() {
        let mut last_count = 0;
        let mut last_interval = u64::MAX;
        for wave in 1..40 {
            let count = enemies_for_wave(wave, Fixed::ONE);
            let interval = interval_for_wave(wave, Fixed::ONE);
            assert!(count >= last_count && count <= MAX_ENEMIES_PER_WAVE);
            assert!(interval <= last_interval && interval >= MIN_SPAWN_INTERVAL_MS);
            last_count = count;
            last_interval = interval;
        }
        assert_eq!(enemies_for_wave(1, Fixed::ONE), 5);
        assert_eq!(interval_for_wave(2, Fixed::ONE), 1900);
    }

    #[test]
    fn test_difficulty_scales_then_clamps() {
        assert_eq!(enemies_for_wave(1, Fixed::from_num(2)), 10);
        assert_eq!(enemies_for_wave(20, Fixed::from_num(2)), MAX_ENEMIES_PER_WAVE);
        assert_eq!(interval_for_wave(1, ratio(1, 2)), 1000);
        assert_eq!(interval_for_wave(20, ratio(1, 2)), MIN_SPAWN_INTERVAL_MS);

        let difficulty = WaveDifficulty {
            max_enemies: ratio(3, 2),
            ..WaveDifficulty::default()
        };
        assert_eq!(WaveDirector::new(vec![Fixed::ONE], difficulty).max_enemies(), 15);
    }

    #[test]
    fn test_idle_director_does_not_spawn() {
        let mut director = director();
        let mut rng = seeded(1);
        assert_eq!(director.update(10_000, 0, &mut rng), None);
        assert!(!director.is_wave_complete(0));
    }

    #[test]
    fn test_spawns_exactly_per_wave() {
        let mut director = director();
        director.start_wave();
        assert_eq!(spawn_all(&mut director), 5);
        assert_eq!(director.state().enemies_spawned, 5);
        assert!(!director.state().in_progress);
    }

    #[test]
    fn test_wave_complete_iff_all_spawned_and_clear() {
        let mut director = director();
        director.start_wave();
        let mut rng = seeded(2);

        // First spawn lands after one full interval.
        assert!(director.update(1_999, 0, &mut rng).is_none());
        assert!(director.update(1, 0, &mut rng).is_some());
        assert!(!director.is_wave_complete(0));

        spawn_all(&mut director);
        assert!(!director.is_wave_complete(3));
        assert!(director.is_wave_complete(0));
    }

    #[test]
    fn test_live_cap_blocks_spawn() {
        let mut director = director();
        director.start_wave();
        let mut rng = seeded(3);
        assert_eq!(director.update(5_000, BASE_MAX_ENEMIES, &mut rng), None);
        // Timer kept running; spawns as soon as a slot frees up.
        assert!(director.update(0, BASE_MAX_ENEMIES - 1, &mut rng).is_some());
    }

    #[test]
    fn test_degenerate_auto_completes() {
        let mut director = WaveDirector::new(vec![], WaveDifficulty::default());
        director.start_wave();
        let mut rng = seeded(4);
        assert_eq!(director.update(10_000, 0, &mut rng), None);
        assert!(director.is_wave_complete(0));

        let mut zero = WaveDirector::new(vec![Fixed::ZERO, Fixed::ZERO], WaveDifficulty::default());
        zero.start_wave();
        assert!(zero.is_wave_complete(0));
    }

    #[test]
    fn test_next_wave_escalates() {
        let mut director = director();
        director.start_wave();
        spawn_all(&mut director);
        director.next_wave();

        let state = director.state();
        assert_eq!(state.wave_number, 2);
        assert_eq!(state.enemies_per_wave, 7);
        assert_eq!(state.spawn_interval_ms, 1900);
        assert_eq!(state.enemies_spawned, 0);
        assert_eq!(director.phase(), WavePhase::Idle);
    }
}
