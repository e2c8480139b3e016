//! Damage, healing and combo resolution.
//!
//! This module implements:
//! - Basic and energy-gated special attacks with a random variation band
//! - Flat-defense mitigation with a minimum of 1 damage
//! - Combo streaks whose multiplier is re-derived from elapsed time on
//!   every call, so an expired streak can never leak into a new hit
//!
//! The resolver is stateless per call: it mutates only the combatant and
//! combo state passed to it and emits no events.

use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::math::{fixed_serde, ratio, Fixed};
use crate::rng::uniform_fixed;

/// Idle gap (ms) after which a combo streak resets.
pub const COMBO_TIMEOUT_MS: u64 = 2000;

/// Minimum damage any landed hit deals.
pub const MIN_DAMAGE: u32 = 1;

/// Multiplier added per additional hit in a streak (K).
#[must_use]
pub fn combo_step() -> Fixed {
    ratio(1, 10)
}

/// Tunable combat constants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatTuning {
    /// Idle gap (ms) that resets a combo.
    pub combo_timeout_ms: u64,
    /// Multiplier gained per extra hit in a streak.
    #[serde(with = "fixed_serde")]
    pub combo_step: Fixed,
    /// Lower bound of the damage variation factor.
    #[serde(with = "fixed_serde")]
    pub variation_min: Fixed,
    /// Width of the damage variation band.
    #[serde(with = "fixed_serde")]
    pub variation_spread: Fixed,
    /// Base multiplier applied to special attacks.
    #[serde(with = "fixed_serde")]
    pub special_multiplier: Fixed,
}

impl Default for CombatTuning {
    fn default() -> Self {
        Self {
            combo_timeout_ms: COMBO_TIMEOUT_MS,
            combo_step: combo_step(),
            variation_min: ratio(8, 10),
            variation_spread: ratio(4, 10),
            special_multiplier: Fixed::from_num(2),
        }
    }
}

/// A streak of successful hits.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ComboState {
    /// Hits in the current streak (0 before the first hit).
    pub count: u32,
    /// Multiplier for the current streak.
    #[serde(with = "fixed_serde")]
    pub multiplier: Fixed,
    /// Game time (ms) of the last hit.
    pub last_hit_ms: u64,
    /// Longest streak seen this session.
    pub max_combo_seen: u32,
}

impl ComboState {
    /// Create an empty combo state.
    #[must_use]
    pub fn new() -> Self {
        Self {
            count: 0,
            multiplier: Fixed::ONE,
            last_hit_ms: 0,
            max_combo_seen: 0,
        }
    }

    /// Whether the streak is still live at `now_ms`.
    #[must_use]
    pub fn is_active(&self, now_ms: u64, timeout_ms: u64) -> bool {
        self.count > 0 && now_ms.saturating_sub(self.last_hit_ms) < timeout_ms
    }

    /// Streak length as seen at `now_ms` (0 once expired).
    #[must_use]
    pub fn count_at(&self, now_ms: u64, timeout_ms: u64) -> u32 {
        if self.is_active(now_ms, timeout_ms) {
            self.count
        } else {
            0
        }
    }

    /// Multiplier as seen at `now_ms` (1 once expired).
    #[must_use]
    pub fn multiplier_at(&self, now_ms: u64, timeout_ms: u64) -> Fixed {
        if self.is_active(now_ms, timeout_ms) {
            self.multiplier
        } else {
            Fixed::ONE
        }
    }

    /// Record a hit at `now_ms` and return the resulting multiplier.
    pub fn register_hit(&mut self, now_ms: u64, tuning: &CombatTuning) -> Fixed {
        if self.is_active(now_ms, tuning.combo_timeout_ms) {
            self.count += 1;
        } else {
            self.count = 1;
        }
        self.last_hit_ms = now_ms;
        self.multiplier = Fixed::ONE.saturating_add(tuning.combo_step.saturating_mul_int(i64::from(self.count - 1)));
        self.max_combo_seen = self.max_combo_seen.max(self.count);
        self.multiplier
    }

    /// Drop the streak (e.g. when the player is hit hard or dies).
    pub fn reset(&mut self) {
        self.count = 0;
        self.multiplier = Fixed::ONE;
    }
}

impl Default for ComboState {
    fn default() -> Self {
        Self::new()
    }
}

/// Outcome of applying damage to a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DamageReport {
    /// Health actually removed.
    pub dealt: u32,
    /// Whether the target still lives.
    pub still_alive: bool,
    /// Whether the hit was ignored (shield or already dead).
    pub blocked: bool,
}

/// Stateless-per-call damage and combo arithmetic.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct CombatResolver {
    tuning: CombatTuning,
}

impl CombatResolver {
    /// Create a resolver with the given tuning.
    #[must_use]
    pub const fn new(tuning: CombatTuning) -> Self {
        Self { tuning }
    }

    /// Access the tuning constants.
    #[must_use]
    pub const fn tuning(&self) -> &CombatTuning {
        &self.tuning
    }

    /// Roll `floor(base * multiplier * U)` with `U` from the variation band.
    pub fn roll_damage<R: Rng + ?Sized>(&self, base: u32, multiplier: Fixed, rng: &mut R) -> u32 {
        let variation = uniform_fixed(self.tuning.variation_min, self.tuning.variation_spread, rng);
        let raw = Fixed::saturating_from_num(base)
            .saturating_mul(multiplier)
            .saturating_mul(variation);
        raw.to_num::<i64>().clamp(0, i64::from(u32::MAX)) as u32
    }

    /// Basic attack: advances the combo and returns raw damage.
    pub fn perform_basic_attack<R: Rng + ?Sized>(
        &self,
        attacker: &Combatant,
        combo: &mut ComboState,
        now_ms: u64,
        rng: &mut R,
    ) -> u32 {
        let multiplier = combo.register_hit(now_ms, &self.tuning);
        self.roll_damage(attacker.attack_power, multiplier, rng)
    }

    /// Energy-gated special attack.
    ///
    /// Returns `None` with no state change when the attacker cannot pay
    /// `energy_cost`.
    pub fn perform_special_attack<R: Rng + ?Sized>(
        &self,
        attacker: &mut Combatant,
        combo: &mut ComboState,
        energy_cost: u32,
        now_ms: u64,
        rng: &mut R,
    ) -> Option<u32> {
        if !attacker.spend_energy(energy_cost) {
            return None;
        }
        let multiplier = combo.register_hit(now_ms, &self.tuning);
        Some(self.roll_damage(
            attacker.attack_power,
            multiplier * self.tuning.special_multiplier,
            rng,
        ))
    }

    /// Mitigate `raw` by defense (minimum 1) and apply it.
    pub fn resolve_damage(&self, target: &mut Combatant, raw: u32) -> DamageReport {
        if target.is_dead() || target.status.shielded {
            return DamageReport {
                dealt: 0,
                still_alive: target.is_alive(),
                blocked: true,
            };
        }
        let effective = raw.saturating_sub(target.defense).max(MIN_DAMAGE);
        let dealt = target.take_damage(effective);
        DamageReport {
            dealt,
            still_alive: target.is_alive(),
            blocked: false,
        }
    }

    /// Apply damage and report whether the target survived.
    pub fn apply_damage(&self, target: &mut Combatant, raw: u32) -> bool {
        self.resolve_damage(target, raw).still_alive
    }

    /// Heal, clamped at max health. Returns the amount restored.
    pub fn heal(&self, target: &mut Combatant, amount: u32) -> u32 {
        target.heal(amount)
    }

    /// Restore energy, clamped at max energy. Returns the amount restored.
    pub fn restore_energy(&self, target: &mut Combatant, amount: u32) -> u32 {
        target.restore_energy(amount)
    }
}
