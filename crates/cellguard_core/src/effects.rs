//! Timed buffs and debuffs attached to a combatant.
//!
//! Applying an effect immediately adjusts the combatant; expiry performs
//! exactly one compensating un-apply. Re-applying a kind that is already
//! active refreshes its timer and keeps the larger magnitude instead of
//! stacking, so the un-apply always mirrors a single application.

use serde::{Deserialize, Serialize};

use crate::combatant::Combatant;
use crate::math::{fixed_serde, scale_u32, Fixed};

/// Damage-over-time tick interval for burn and poison.
pub const DOT_TICK_MS: u64 = 1000;

/// Kind of timed effect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum EffectKind {
    /// Ignore all incoming damage.
    Shield,
    /// Attack power multiplied by `magnitude`.
    DamageBoost,
    /// Speed multiplied by `magnitude` (> 1).
    SpeedBoost,
    /// Speed multiplied by `magnitude` (< 1).
    Slow,
    /// Speed set to zero.
    Freeze,
    /// Actions rejected.
    Stun,
    /// `magnitude` damage per tick, ignoring defense.
    Burn,
    /// `magnitude` damage per tick, ignoring defense.
    Poison,
}

impl EffectKind {
    /// Whether this effect deals periodic damage.
    #[must_use]
    pub const fn is_damage_over_time(self) -> bool {
        matches!(self, Self::Burn | Self::Poison)
    }

    /// Whether this effect is harmful to its holder.
    #[must_use]
    pub const fn is_debuff(self) -> bool {
        matches!(
            self,
            Self::Slow | Self::Freeze | Self::Stun | Self::Burn | Self::Poison
        )
    }
}

/// A timed effect on a combatant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ActiveEffect {
    /// What the effect does.
    pub kind: EffectKind,
    /// Strength; meaning depends on `kind`.
    #[serde(with = "fixed_serde")]
    pub magnitude: Fixed,
    /// Game time (ms) the effect started or was last refreshed.
    pub start_ms: u64,
    /// How long the effect lasts.
    pub duration_ms: u64,
    /// Attack power added on apply, removed on expiry.
    applied_attack_bonus: u32,
    /// Game time (ms) of the last damage-over-time tick.
    last_tick_ms: u64,
}

impl ActiveEffect {
    /// Create an effect starting at `start_ms`.
    #[must_use]
    pub const fn new(kind: EffectKind, magnitude: Fixed, start_ms: u64, duration_ms: u64) -> Self {
        Self {
            kind,
            magnitude,
            start_ms,
            duration_ms,
            applied_attack_bonus: 0,
            last_tick_ms: start_ms,
        }
    }

    /// Whether the effect has run its course at `now_ms`.
    #[must_use]
    pub fn is_expired(&self, now_ms: u64) -> bool {
        now_ms.saturating_sub(self.start_ms) >= self.duration_ms
    }

    /// Remaining time at `now_ms`.
    #[must_use]
    pub fn remaining_ms(&self, now_ms: u64) -> u64 {
        (self.start_ms + self.duration_ms).saturating_sub(now_ms)
    }
}

/// Result of a sweep over the active effects.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SweepReport {
    /// Effects removed this sweep.
    pub expired: Vec<EffectKind>,
    /// Damage dealt by damage-over-time ticks, per kind.
    pub dot_damage: Vec<(EffectKind, u32)>,
}

/// The set of active effects on one combatant.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EffectTracker {
    effects: Vec<ActiveEffect>,
}

impl EffectTracker {
    /// Create an empty tracker.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Currently active effects, in application order.
    #[must_use]
    pub fn active(&self) -> &[ActiveEffect] {
        &self.effects
    }

    /// Whether an effect of `kind` is active.
    #[must_use]
    pub fn has(&self, kind: EffectKind) -> bool {
        self.effects.iter().any(|e| e.kind == kind)
    }

    /// Apply an effect, or refresh it if the kind is already active.
    pub fn apply(&mut self, target: &mut Combatant, effect: ActiveEffect) {
        if let Some(existing) = self.effects.iter_mut().find(|e| e.kind == effect.kind) {
            existing.start_ms = effect.start_ms;
            existing.duration_ms = effect.duration_ms;
            if effect.magnitude > existing.magnitude {
                existing.magnitude = effect.magnitude;
                if existing.kind == EffectKind::DamageBoost {
                    // Swap the old bonus for one at the new magnitude.
                    target.attack_power = target.attack_power.saturating_sub(existing.applied_attack_bonus);
                    existing.applied_attack_bonus = attack_bonus(target.attack_power, existing.magnitude);
                    target.attack_power = target.attack_power.saturating_add(existing.applied_attack_bonus);
                }
            }
            recompute_status(target, &self.effects);
            return;
        }

        let mut effect = effect;
        if effect.kind == EffectKind::DamageBoost {
            effect.applied_attack_bonus = attack_bonus(target.attack_power, effect.magnitude);
            target.attack_power = target.attack_power.saturating_add(effect.applied_attack_bonus);
        }
        self.effects.push(effect);
        recompute_status(target, &self.effects);
        tracing::trace!(kind = ?effect.kind, duration_ms = effect.duration_ms, "Effect applied");
    }

    /// Tick damage-over-time effects and remove expired ones.
    ///
    /// Each expired effect is un-applied exactly once.
    pub fn sweep(&mut self, target: &mut Combatant, now_ms: u64) -> SweepReport {
        let mut report = SweepReport::default();

        for effect in &mut self.effects {
            if !effect.kind.is_damage_over_time() {
                continue;
            }
            let end = now_ms.min(effect.start_ms + effect.duration_ms);
            let ticks = end.saturating_sub(effect.last_tick_ms) / DOT_TICK_MS;
            if ticks == 0 {
                continue;
            }
            effect.last_tick_ms += ticks * DOT_TICK_MS;
            let per_tick = effect.magnitude.to_num::<i64>().clamp(0, i64::from(u32::MAX)) as u32;
            let amount = per_tick.saturating_mul(ticks as u32);
            if amount > 0 && !target.status.shielded {
                let dealt = target.take_damage(amount);
                if dealt > 0 {
                    report.dot_damage.push((effect.kind, dealt));
                }
            }
        }

        let mut index = 0;
        while index < self.effects.len() {
            if self.effects[index].is_expired(now_ms) {
                let effect = self.effects.remove(index);
                if effect.kind == EffectKind::DamageBoost {
                    target.attack_power = target.attack_power.saturating_sub(effect.applied_attack_bonus);
                }
                report.expired.push(effect.kind);
                tracing::trace!(kind = ?effect.kind, "Effect expired");
            } else {
                index += 1;
            }
        }

        if !report.expired.is_empty() {
            recompute_status(target, &self.effects);
        }
        report
    }

    /// Remove every effect, un-applying each once.
    pub fn clear(&mut self, target: &mut Combatant) {
        for effect in self.effects.drain(..) {
            if effect.kind == EffectKind::DamageBoost {
                target.attack_power = target.attack_power.saturating_sub(effect.applied_attack_bonus);
            }
        }
        recompute_status(target, &self.effects);
    }
}

/// Extra attack power granted by a boost of `magnitude` (e.g. 1.5 → +50%).
fn attack_bonus(base: u32, magnitude: Fixed) -> u32 {
    scale_u32(base, magnitude.saturating_sub(Fixed::ONE))
}

/// Derive status flags from the remaining effects.
fn recompute_status(target: &mut Combatant, effects: &[ActiveEffect]) {
    let mut shielded = false;
    let mut stunned = false;
    let mut speed = Fixed::ONE;
    let mut frozen = false;

    for effect in effects {
        match effect.kind {
            EffectKind::Shield => shielded = true,
            EffectKind::Stun => stunned = true,
            EffectKind::Freeze => frozen = true,
            EffectKind::SpeedBoost | EffectKind::Slow => speed *= effect.magnitude,
            EffectKind::DamageBoost | EffectKind::Burn | EffectKind::Poison => {}
        }
    }

    target.status.shielded = shielded;
    target.status.stunned = stunned;
    target.status.speed_multiplier = if frozen { Fixed::ZERO } else { speed.max(Fixed::ZERO) };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    #[test]
    fn test_shield_applies_and_expires_once() {
        let mut target = Combatant::new(100, 0, 10, 0);
        let mut tracker = EffectTracker::new();

        tracker.apply(&mut target, ActiveEffect::new(EffectKind::Shield, Fixed::ONE, 0, 3000));
        assert!(target.status.shielded);

        let early = tracker.sweep(&mut target, 2999);
        assert!(early.expired.is_empty());
        assert!(target.status.shielded);

        let report = tracker.sweep(&mut target, 3000);
        assert_eq!(report.expired, vec![EffectKind::Shield]);
        assert!(!target.status.shielded);

        let again = tracker.sweep(&mut target, 5000);
        assert!(again.expired.is_empty());
    }

    #[test]
    fn test_damage_boost_reverts_exactly() {
        let mut target = Combatant::new(100, 0, 20, 0);
        let mut tracker = EffectTracker::new();

        tracker.apply(&mut target, ActiveEffect::new(EffectKind::DamageBoost, ratio(3, 2), 0, 1000));
        assert_eq!(target.attack_power, 30);

        tracker.sweep(&mut target, 1000);
        assert_eq!(target.attack_power, 20);
    }

    #[test]
    fn test_refresh_does_not_stack() {
        let mut target = Combatant::new(100, 0, 20, 0);
        let mut tracker = EffectTracker::new();

        tracker.apply(&mut target, ActiveEffect::new(EffectKind::DamageBoost, ratio(3, 2), 0, 1000));
        tracker.apply(&mut target, ActiveEffect::new(EffectKind::DamageBoost, ratio(3, 2), 500, 1000));
        assert_eq!(target.attack_power, 30);
        assert_eq!(tracker.active().len(), 1);

        // Refreshed at 500, so still active at 1000
        assert!(tracker.sweep(&mut target, 1000).expired.is_empty());
        tracker.sweep(&mut target, 1500);
        assert_eq!(target.attack_power, 20);
    }

    #[test]
    fn test_burn_ticks_per_second() {
        let mut target = Combatant::new(100, 0, 0, 50);
        let mut tracker = EffectTracker::new();

        tracker.apply(&mut target, ActiveEffect::new(EffectKind::Burn, Fixed::from_num(5), 0, 3000));
        let report = tracker.sweep(&mut target, 2500);
        // Two full ticks, defense ignored
        assert_eq!(report.dot_damage, vec![(EffectKind::Burn, 10)]);
        assert_eq!(target.health(), 90);

        let report = tracker.sweep(&mut target, 4000);
        assert_eq!(report.dot_damage, vec![(EffectKind::Burn, 5)]);
        assert_eq!(report.expired, vec![EffectKind::Burn]);
        assert_eq!(target.health(), 85);
    }

    #[test]
    fn test_freeze_overrides_speed() {
        let mut target = Combatant::new(100, 0, 0, 0);
        let mut tracker = EffectTracker::new();

        tracker.apply(&mut target, ActiveEffect::new(EffectKind::Slow, ratio(1, 2), 0, 5000));
        assert_eq!(target.status.speed_multiplier, ratio(1, 2));

        tracker.apply(&mut target, ActiveEffect::new(EffectKind::Freeze, Fixed::ONE, 0, 1000));
        assert_eq!(target.status.speed_multiplier, Fixed::ZERO);

        tracker.sweep(&mut target, 1000);
        assert_eq!(target.status.speed_multiplier, ratio(1, 2));
    }

    #[test]
    fn test_clear_reverts_everything() {
        let mut target = Combatant::new(100, 0, 10, 0);
        let mut tracker = EffectTracker::new();
        tracker.apply(&mut target, ActiveEffect::new(EffectKind::DamageBoost, Fixed::from_num(2), 0, 9000));
        tracker.apply(&mut target, ActiveEffect::new(EffectKind::Stun, Fixed::ONE, 0, 9000));

        tracker.clear(&mut target);
        assert_eq!(target.attack_power, 10);
        assert!(!target.status.stunned);
        assert!(tracker.active().is_empty());
    }
}
