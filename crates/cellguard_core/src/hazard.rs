//! Environmental hazards.
//!
//! Each hazard cycles between active and inactive on an
//! `active_duration_ms` / `cooldown_ms` rhythm, or stays active forever
//! when `cooldown_ms == 0`. Movement patterns only change position,
//! rotation and scale; they never touch activity or damage.
//!
//! Overlap testing belongs to the host's collision layer. The field only
//! answers "what would this hazard do right now?".

use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::math::{decimal_serde, per_second, Fixed, Vec2Fixed};

/// Thematic hazard kind.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardKind {
    /// Spikes or barbs.
    Spikes,
    /// Acid pools.
    Acid,
    /// Open flames.
    Fire,
    /// Ice patches.
    Ice,
    /// Toxin clouds.
    Toxin,
    /// Electric discharges.
    Electric,
}

/// Effect a hazard applies on contact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardEffectKind {
    /// Direct damage only.
    Damage,
    /// Movement slowed.
    Slow,
    /// Damage over time (fire).
    Burn,
    /// Movement stopped.
    Freeze,
    /// Damage over time (toxin).
    Poison,
    /// Actions blocked.
    Stun,
}

impl HazardEffectKind {
    /// The timed effect this hazard leaves behind, if any.
    #[must_use]
    pub const fn lingering_effect(self) -> Option<EffectKind> {
        match self {
            Self::Damage => None,
            Self::Slow => Some(EffectKind::Slow),
            Self::Burn => Some(EffectKind::Burn),
            Self::Freeze => Some(EffectKind::Freeze),
            Self::Poison => Some(EffectKind::Poison),
            Self::Stun => Some(EffectKind::Stun),
        }
    }
}

/// How a hazard moves over time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum HazardPattern {
    /// Never moves.
    Static,
    /// Sweeps back and forth along x, `range` either side of its origin.
    Moving {
        /// Half-width of the sweep.
        #[serde(with = "decimal_serde")]
        range: Fixed,
        /// Units per second.
        #[serde(with = "decimal_serde")]
        speed: Fixed,
    },
    /// Spins in place.
    Rotating {
        /// Degrees per second.
        #[serde(with = "decimal_serde")]
        degrees_per_second: Fixed,
    },
    /// Grows and shrinks between `min_scale` and `max_scale`.
    Pulsing {
        /// Smallest scale.
        #[serde(with = "decimal_serde")]
        min_scale: Fixed,
        /// Largest scale.
        #[serde(with = "decimal_serde")]
        max_scale: Fixed,
        /// Full grow+shrink cycle length.
        period_ms: u64,
    },
}

/// What a hazard does to a combatant found overlapping it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HazardEffect {
    /// Hazard that produced the effect.
    pub hazard_id: u32,
    /// Thematic kind of the hazard.
    pub hazard_kind: HazardKind,
    /// Immediate damage.
    pub damage: u32,
    /// Effect kind.
    pub kind: HazardEffectKind,
    /// Duration of the lingering effect.
    pub duration_ms: u64,
    /// Strength of the lingering effect.
    pub magnitude: Fixed,
}

/// Placement request for one hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct HazardSpec {
    /// Thematic kind.
    pub kind: HazardKind,
    /// Spawn position.
    pub position: Vec2Fixed,
    /// Damage on contact.
    pub damage: u32,
    /// How long each active window lasts.
    pub active_duration_ms: u64,
    /// Inactive gap between windows; 0 means always active.
    pub cooldown_ms: u64,
    /// Movement pattern.
    pub pattern: HazardPattern,
    /// Effect applied on contact.
    pub effect: HazardEffectKind,
    /// Lingering effect duration.
    pub effect_duration_ms: u64,
    /// Lingering effect strength (slow factor or damage per tick).
    pub effect_magnitude: Fixed,
}

/// Runtime state of one hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Hazard {
    /// Identifier unique within the field.
    pub id: u32,
    spec: HazardSpec,
    active: bool,
    phase_elapsed_ms: u64,
    pattern_elapsed_ms: u64,
    travel: Fixed,
    position: Vec2Fixed,
    rotation_degrees: Fixed,
    scale: Fixed,
}

impl Hazard {
    /// Create a hazard in its active state.
    #[must_use]
    pub fn new(id: u32, spec: HazardSpec) -> Self {
        let scale = match spec.pattern {
            HazardPattern::Pulsing { min_scale, .. } => min_scale,
            _ => Fixed::ONE,
        };
        Self {
            id,
            spec,
            active: spec.cooldown_ms == 0 || spec.active_duration_ms > 0,
            phase_elapsed_ms: 0,
            pattern_elapsed_ms: 0,
            travel: Fixed::ZERO,
            position: spec.position,
            rotation_degrees: Fixed::ZERO,
            scale,
        }
    }

    /// The placement this hazard was created from.
    #[must_use]
    pub const fn spec(&self) -> &HazardSpec {
        &self.spec
    }

    /// Whether the hazard currently hurts.
    #[must_use]
    pub const fn is_active(&self) -> bool {
        self.active
    }

    /// Whether the hazard never toggles.
    #[must_use]
    pub const fn is_static(&self) -> bool {
        self.spec.cooldown_ms == 0
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Current rotation in degrees, `[0, 360)`.
    #[must_use]
    pub const fn rotation_degrees(&self) -> Fixed {
        self.rotation_degrees
    }

    /// Current scale.
    #[must_use]
    pub const fn scale(&self) -> Fixed {
        self.scale
    }

    /// Advance timers. Returns `true` if the hazard just became active.
    pub fn update(&mut self, delta_ms: u32) -> bool {
        let delta = u64::from(delta_ms);
        self.pattern_elapsed_ms += delta;
        self.update_pattern(delta_ms);

        if self.is_static() {
            self.active = true;
            return false;
        }

        if self.spec.active_duration_ms == 0 {
            self.active = false;
            return false;
        }

        let was_active = self.active;
        self.phase_elapsed_ms += delta;
        loop {
            let window = if self.active {
                self.spec.active_duration_ms
            } else {
                self.spec.cooldown_ms
            };
            if self.phase_elapsed_ms < window {
                break;
            }
            self.phase_elapsed_ms -= window;
            self.active = !self.active;
        }
        !was_active && self.active
    }

    fn update_pattern(&mut self, delta_ms: u32) {
        match self.spec.pattern {
            HazardPattern::Static => {}
            HazardPattern::Moving { range, speed } => {
                if range <= Fixed::ZERO {
                    return;
                }
                // origin -> +range -> -range -> origin
                let cycle = range * Fixed::from_num(4);
                self.travel = (self.travel + per_second(speed.abs(), delta_ms)) % cycle;
                let t = self.travel;
                let offset = if t < range {
                    t
                } else if t < range * Fixed::from_num(3) {
                    range * Fixed::from_num(2) - t
                } else {
                    t - cycle
                };
                self.position = Vec2Fixed::new(self.spec.position.x + offset, self.spec.position.y);
            }
            HazardPattern::Rotating { degrees_per_second } => {
                let full = Fixed::from_num(360);
                let step = per_second(degrees_per_second, delta_ms);
                let mut angle = (self.rotation_degrees + step) % full;
                if angle < Fixed::ZERO {
                    angle += full;
                }
                self.rotation_degrees = angle;
            }
            HazardPattern::Pulsing {
                min_scale,
                max_scale,
                period_ms,
            } => {
                if period_ms == 0 {
                    return;
                }
                let half = period_ms / 2;
                let t = self.pattern_elapsed_ms % period_ms;
                let rising = if t < half { t } else { period_ms - t };
                let progress = if half == 0 {
                    Fixed::ZERO
                } else {
                    Fixed::from_num(rising) / Fixed::from_num(half)
                };
                self.scale = min_scale + (max_scale - min_scale) * progress;
            }
        }
    }

    /// The effect to apply against an overlapping combatant, or `None` when inactive.
    #[must_use]
    pub fn effect(&self) -> Option<HazardEffect> {
        if !self.active {
            return None;
        }
        Some(HazardEffect {
            hazard_id: self.id,
            hazard_kind: self.spec.kind,
            damage: self.spec.damage,
            kind: self.spec.effect,
            duration_ms: self.spec.effect_duration_ms,
            magnitude: self.spec.effect_magnitude,
        })
    }
}

/// All hazards placed in a zone.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct HazardField {
    hazards: Vec<Hazard>,
    next_id: u32,
}

impl HazardField {
    /// Create an empty field.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a field from placement requests.
    #[must_use]
    pub fn from_specs(specs: &[HazardSpec]) -> Self {
        let mut field = Self::new();
        for spec in specs {
            field.place(*spec);
        }
        field
    }

    /// Place a hazard and return its id.
    pub fn place(&mut self, spec: HazardSpec) -> u32 {
        self.next_id += 1;
        let id = self.next_id;
        self.hazards.push(Hazard::new(id, spec));
        id
    }

    /// Remove a hazard.
    pub fn remove(&mut self, id: u32) -> Option<Hazard> {
        let index = self.hazards.iter().position(|h| h.id == id)?;
        Some(self.hazards.remove(index))
    }

    /// Look up a hazard.
    #[must_use]
    pub fn get(&self, id: u32) -> Option<&Hazard> {
        self.hazards.iter().find(|h| h.id == id)
    }

    /// All hazards in placement order.
    #[must_use]
    pub fn hazards(&self) -> &[Hazard] {
        &self.hazards
    }

    /// Advance every hazard. Returns ids of hazards that just activated.
    pub fn update(&mut self, delta_ms: u32) -> Vec<u32> {
        self.hazards
            .iter_mut()
            .filter_map(|h| h.update(delta_ms).then_some(h.id))
            .collect()
    }

    /// Effect of a hazard, or `None` if it is unknown or inactive.
    #[must_use]
    pub fn hazard_effect(&self, id: u32) -> Option<HazardEffect> {
        self.get(id).and_then(Hazard::effect)
    }

    /// Number of hazards currently active.
    #[must_use]
    pub fn active_count(&self) -> usize {
        self.hazards.iter().filter(|h| h.is_active()).count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    fn spec(active_ms: u64, cooldown_ms: u64, pattern: HazardPattern) -> HazardSpec {
        HazardSpec {
            kind: HazardKind::Acid,
            position: Vec2Fixed::from_ints(100, 100),
            damage: 7,
            active_duration_ms: active_ms,
            cooldown_ms,
            pattern,
            effect: HazardEffectKind::Poison,
            effect_duration_ms: 2000,
            effect_magnitude: Fixed::from_num(2),
        }
    }

    #[test]
    fn test_static_hazard_always_active() {
        let mut hazard = Hazard::new(1, spec(1000, 0, HazardPattern::Static));
        for _ in 0..10 {
            hazard.update(700);
            assert!(hazard.is_active());
            assert!(hazard.effect().is_some());
        }
    }

    #[test]
    fn test_cycle_toggles() {
        let mut hazard = Hazard::new(1, spec(1000, 500, HazardPattern::Static));
        assert!(hazard.is_active());

        hazard.update(999);
        assert!(hazard.is_active());

        hazard.update(1);
        assert!(!hazard.is_active());
        assert_eq!(hazard.effect(), None);

        let activated = hazard.update(500);
        assert!(activated);
        assert!(hazard.is_active());
    }

    #[test]
    fn test_large_delta_crosses_multiple_windows() {
        let mut hazard = Hazard::new(1, spec(1000, 500, HazardPattern::Static));
        // 1000 active + 500 idle + 1000 active + 200 into idle
        hazard.update(2700);
        assert!(!hazard.is_active());
    }

    #[test]
    fn test_effect_descriptor() {
        let hazard = Hazard::new(3, spec(1000, 0, HazardPattern::Static));
        let effect = hazard.effect().unwrap();
        assert_eq!(effect.hazard_id, 3);
        assert_eq!(effect.damage, 7);
        assert_eq!(effect.kind, HazardEffectKind::Poison);
        assert_eq!(effect.duration_ms, 2000);
    }

    #[test]
    fn test_moving_pattern_changes_position_only() {
        let pattern = HazardPattern::Moving {
            range: Fixed::from_num(50),
            speed: Fixed::from_num(100),
        };
        let mut hazard = Hazard::new(1, spec(1000, 0, pattern));

        hazard.update(250);
        assert_eq!(hazard.position(), Vec2Fixed::from_ints(125, 100));

        // turned around at +50 and heading back
        hazard.update(500);
        assert_eq!(hazard.position(), Vec2Fixed::from_ints(125, 100));

        hazard.update(1000);
        assert_eq!(hazard.position(), Vec2Fixed::from_ints(75, 100));
        assert_eq!(hazard.effect().unwrap().damage, 7);
    }

    #[test]
    fn test_rotating_wraps() {
        let pattern = HazardPattern::Rotating {
            degrees_per_second: Fixed::from_num(180),
        };
        let mut hazard = Hazard::new(1, spec(1000, 0, pattern));
        hazard.update(1500);
        assert_eq!(hazard.rotation_degrees(), Fixed::from_num(270));
        hazard.update(1000);
        assert_eq!(hazard.rotation_degrees(), Fixed::from_num(90));
    }

    #[test]
    fn test_pulsing_scale() {
        let pattern = HazardPattern::Pulsing {
            min_scale: Fixed::ONE,
            max_scale: Fixed::from_num(2),
            period_ms: 1000,
        };
        let mut hazard = Hazard::new(1, spec(1000, 0, pattern));
        hazard.update(250);
        assert_eq!(hazard.scale(), ratio(3, 2));
        hazard.update(250);
        assert_eq!(hazard.scale(), Fixed::from_num(2));
        hazard.update(500);
        assert_eq!(hazard.scale(), Fixed::ONE);
    }

    #[test]
    fn test_field_queries() {
        let mut field = HazardField::new();
        let a = field.place(spec(1000, 0, HazardPattern::Static));
        let b = field.place(spec(100, 100, HazardPattern::Static));

        field.update(150);
        assert!(field.hazard_effect(a).is_some());
        assert!(field.hazard_effect(b).is_none());
        assert_eq!(field.active_count(), 1);
        assert!(field.hazard_effect(99).is_none());
    }
}
