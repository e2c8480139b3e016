//! Multi-phase boss encounters.
//!
//! A [`BossEncounter`] wraps a [`Combatant`] with a phase table. Phases
//! are entered in order when health drops to the next phase's
//! threshold, each entry preceded by an invulnerable, non-acting
//! transition window. Independently of phases, a one-way enrage latch
//! multiplies attack power and speed once.
//!
//! ```text
//! Active(0) -> Transitioning -> Active(1) -> ... -> Defeated
//! ```

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::combat::{CombatResolver, DamageReport};
use crate::combatant::Combatant;
use crate::events::{EventQueue, GameEvent};
use crate::math::{decimal_serde, per_second, ratio, scale_u32, Fixed, Vec2Fixed, WorldBounds};

/// Length of the invulnerable window between phases.
pub const PHASE_TRANSITION_MS: u64 = 2000;
/// Health percentage at or below which a boss enrages.
pub const DEFAULT_ENRAGE_THRESHOLD: u32 = 30;
/// Health percentage at or below which a `Rage` phase enrages early.
pub const RAGE_THRESHOLD: u32 = 50;
/// Length of one shield pulse.
pub const SHIELD_PULSE_MS: u64 = 2000;
/// Time between shield pulses.
pub const SHIELD_INTERVAL_MS: u64 = 8000;
/// Time between heals.
pub const HEAL_INTERVAL_MS: u64 = 5000;
/// Health restored per heal.
pub const HEAL_AMOUNT: u32 = 25;
/// Time between teleports.
pub const TELEPORT_INTERVAL_MS: u64 = 3000;
/// Distance from the target a teleport lands at.
pub const TELEPORT_DISTANCE: i32 = 150;

/// How the boss moves during a phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BossMovement {
    /// Stays put.
    Stationary,
    /// Sweeps along x, reversing at the bounds.
    Patrol,
    /// Walks toward the target.
    Chase,
    /// Jumps next to the target on a fixed cadence.
    Teleport,
}

/// What an attack pattern does when it fires.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AttackEffect {
    /// Melee hit.
    Strike,
    /// Single projectile.
    Projectile,
    /// Damage around the boss.
    AreaBlast,
    /// Spawn minions from the zone's enemy table.
    Summon {
        /// Minions per use.
        count: u32,
    },
}

/// Extra behavior a phase can carry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SpecialAbility {
    /// Periodic invulnerability pulses.
    Shield,
    /// Periodic self-heal.
    Heal,
    /// Enrage early, at [`RAGE_THRESHOLD`].
    Rage,
}

/// One attack a phase can use.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AttackPattern {
    /// Pattern identifier.
    pub id: String,
    /// Base damage before phase and enrage scaling.
    pub damage: u32,
    /// Maximum distance to the target.
    #[serde(with = "decimal_serde")]
    pub range: Fixed,
    /// Time between uses.
    pub cooldown_ms: u64,
    /// What the attack does.
    pub effect: AttackEffect,
    /// Time since last use. Patterns start ready.
    #[serde(skip)]
    pub elapsed_since_use_ms: u64,
}

impl AttackPattern {
    /// Whether the cooldown has elapsed.
    #[must_use]
    pub fn is_ready(&self) -> bool {
        self.elapsed_since_use_ms >= self.cooldown_ms
    }
}

/// A boss's behavior and stat configuration between two thresholds.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BossPhase {
    /// Phase identifier.
    pub id: String,
    /// Health percentage at which this phase is entered.
    pub health_threshold_percent: u32,
    /// Attacks available in this phase.
    #[serde(default)]
    pub attack_patterns: Vec<AttackPattern>,
    /// Movement during this phase.
    pub movement: BossMovement,
    /// Movement speed in units per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,
    /// Scales pattern damage.
    #[serde(with = "decimal_serde")]
    pub damage_multiplier: Fixed,
    /// Special abilities active in this phase.
    #[serde(default)]
    pub special_abilities: Vec<SpecialAbility>,
}

impl BossPhase {
    /// A phase that does nothing; used when a boss has no usable phases.
    #[must_use]
    pub fn inert() -> Self {
        Self {
            id: "inert".to_string(),
            health_threshold_percent: 100,
            attack_patterns: Vec::new(),
            movement: BossMovement::Stationary,
            speed: Fixed::ZERO,
            damage_multiplier: Fixed::ONE,
            special_abilities: Vec::new(),
        }
    }

    fn has(&self, ability: SpecialAbility) -> bool {
        self.special_abilities.contains(&ability)
    }
}

/// Tunable boss timings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct BossTuning {
    /// Length of the transition window.
    pub transition_ms: u64,
    /// Health percentage that triggers enrage.
    pub enrage_threshold_percent: u32,
    /// Health percentage that triggers early enrage via `Rage`.
    pub rage_threshold_percent: u32,
    /// Attack power and speed multiplier when enraged.
    pub enrage_multiplier: Fixed,
    /// Shield pulse length.
    pub shield_pulse_ms: u64,
    /// Time between shield pulses.
    pub shield_interval_ms: u64,
    /// Time between heals.
    pub heal_interval_ms: u64,
    /// Health restored per heal.
    pub heal_amount: u32,
    /// Time between teleports.
    pub teleport_interval_ms: u64,
}

impl Default for BossTuning {
    fn default() -> Self {
        Self {
            transition_ms: PHASE_TRANSITION_MS,
            enrage_threshold_percent: DEFAULT_ENRAGE_THRESHOLD,
            rage_threshold_percent: RAGE_THRESHOLD,
            enrage_multiplier: ratio(3, 2),
            shield_pulse_ms: SHIELD_PULSE_MS,
            shield_interval_ms: SHIELD_INTERVAL_MS,
            heal_interval_ms: HEAL_INTERVAL_MS,
            heal_amount: HEAL_AMOUNT,
            teleport_interval_ms: TELEPORT_INTERVAL_MS,
        }
    }
}

/// Encounter lifecycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BossState {
    /// Acting in the current phase.
    Active,
    /// Between phases; invulnerable and idle.
    Transitioning {
        /// Time left in the window.
        remaining_ms: u64,
    },
    /// Health reached zero.
    Defeated,
}

/// Result of hitting the boss.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TakeDamageOutcome {
    /// The hit was ignored (transitioning, shielded or already dead).
    Blocked,
    /// The boss took damage and survived.
    Damaged {
        /// Health removed.
        dealt: u32,
    },
    /// This hit killed the boss.
    Defeated {
        /// Health removed.
        dealt: u32,
    },
}

/// An attack the boss performed this tick.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BossAttack {
    /// Pattern that fired.
    pub pattern_id: String,
    /// What it does.
    pub effect: AttackEffect,
    /// Damage after phase and enrage scaling.
    pub damage: u32,
}

/// Runtime state of one boss fight.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BossEncounter {
    id: String,
    combatant: Combatant,
    phases: Vec<BossPhase>,
    phase_index: usize,
    state: BossState,
    enraged: bool,
    speed_multiplier: Fixed,
    position: Vec2Fixed,
    patrol_sign: i32,
    tuning: BossTuning,
    shield_timer_ms: u64,
    shield_remaining_ms: u64,
    heal_timer_ms: u64,
    teleport_timer_ms: u64,
}

impl BossEncounter {
    /// Create an encounter in its first phase.
    ///
    /// Phases whose threshold is not strictly below the previous one are
    /// dropped; with nothing left the boss gets a single inert phase.
    #[must_use]
    pub fn new(
        id: impl Into<String>,
        combatant: Combatant,
        phases: Vec<BossPhase>,
        position: Vec2Fixed,
        tuning: BossTuning,
    ) -> Self {
        let id = id.into();
        let mut ordered: Vec<BossPhase> = Vec::with_capacity(phases.len());
        for mut phase in phases {
            if let Some(last) = ordered.last() {
                if phase.health_threshold_percent >= last.health_threshold_percent {
                    warn!(
                        boss = %id,
                        phase = %phase.id,
                        threshold = phase.health_threshold_percent,
                        "Dropping boss phase with out-of-order threshold"
                    );
                    continue;
                }
            }
            for pattern in &mut phase.attack_patterns {
                pattern.elapsed_since_use_ms = pattern.cooldown_ms;
            }
            ordered.push(phase);
        }
        if ordered.is_empty() {
            warn!(boss = %id, "Boss has no usable phases; using inert phase");
            ordered.push(BossPhase::inert());
        }

        Self {
            id,
            combatant,
            phases: ordered,
            phase_index: 0,
            state: BossState::Active,
            enraged: false,
            speed_multiplier: Fixed::ONE,
            position,
            patrol_sign: 1,
            tuning,
            shield_timer_ms: 0,
            shield_remaining_ms: 0,
            heal_timer_ms: 0,
            teleport_timer_ms: 0,
        }
    }

    /// Boss template id.
    #[must_use]
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Stat block.
    #[must_use]
    pub const fn combatant(&self) -> &Combatant {
        &self.combatant
    }

    /// Index of the current phase.
    #[must_use]
    pub const fn phase_index(&self) -> usize {
        self.phase_index
    }

    /// Number of phases.
    #[must_use]
    pub fn phase_count(&self) -> usize {
        self.phases.len()
    }

    /// The current phase.
    #[must_use]
    pub fn current_phase(&self) -> &BossPhase {
        &self.phases[self.phase_index]
    }

    /// Lifecycle state.
    #[must_use]
    pub const fn state(&self) -> BossState {
        self.state
    }

    /// Whether the enrage latch is set.
    #[must_use]
    pub const fn is_enraged(&self) -> bool {
        self.enraged
    }

    /// Whether the boss is between phases.
    #[must_use]
    pub const fn is_transitioning(&self) -> bool {
        matches!(self.state, BossState::Transitioning { .. })
    }

    /// Whether the boss has been killed.
    #[must_use]
    pub const fn is_defeated(&self) -> bool {
        matches!(self.state, BossState::Defeated)
    }

    /// Whether a shield pulse is up.
    #[must_use]
    pub const fn is_shielded(&self) -> bool {
        self.shield_remaining_ms > 0
    }

    /// Current position.
    #[must_use]
    pub const fn position(&self) -> Vec2Fixed {
        self.position
    }

    /// Move the boss (host-driven physics correction).
    pub fn set_position(&mut self, position: Vec2Fixed) {
        self.position = position;
    }

    /// Apply a hit through the resolver.
    pub fn take_damage(&mut self, resolver: &CombatResolver, raw: u32) -> TakeDamageOutcome {
        if self.state != BossState::Active || self.is_shielded() {
            return TakeDamageOutcome::Blocked;
        }
        let DamageReport { dealt, still_alive, blocked } = resolver.resolve_damage(&mut self.combatant, raw);
        if blocked {
            return TakeDamageOutcome::Blocked;
        }
        if still_alive {
            TakeDamageOutcome::Damaged { dealt }
        } else {
            self.state = BossState::Defeated;
            debug!(boss = %self.id, "Boss defeated");
            TakeDamageOutcome::Defeated { dealt }
        }
    }

    /// Advance one tick; returns the attacks performed.
    pub fn update<R: Rng + ?Sized>(
        &mut self,
        delta_ms: u32,
        target: Option<Vec2Fixed>,
        bounds: &WorldBounds,
        rng: &mut R,
        events: &mut EventQueue,
    ) -> Vec<BossAttack> {
        if self.is_defeated() {
            return Vec::new();
        }
        let delta = u64::from(delta_ms);

        if self.combatant.health_at_or_below_percent(self.tuning.enrage_threshold_percent) {
            self.enrage(events);
        }

        if let BossState::Transitioning { remaining_ms } = self.state {
            let remaining_ms = remaining_ms.saturating_sub(delta);
            if remaining_ms == 0 {
                self.enter_next_phase(events);
            } else {
                self.state = BossState::Transitioning { remaining_ms };
            }
            return Vec::new();
        }

        if let Some(next) = self.phases.get(self.phase_index + 1) {
            if self.combatant.health_at_or_below_percent(next.health_threshold_percent) {
                self.state = BossState::Transitioning {
                    remaining_ms: self.tuning.transition_ms,
                };
                self.shield_remaining_ms = 0;
                debug!(boss = %self.id, from = self.phase_index, "Boss phase transition started");
                return Vec::new();
            }
        }

        if self.current_phase().has(SpecialAbility::Rage)
            && self.combatant.health_at_or_below_percent(self.tuning.rage_threshold_percent)
        {
            self.enrage(events);
        }

        self.update_abilities(delta);
        self.update_movement(delta_ms, target, bounds, rng);
        self.update_attacks(delta, target)
    }

    fn enrage(&mut self, events: &mut EventQueue) {
        if self.enraged {
            return;
        }
        self.enraged = true;
        self.combatant.scale_attack_power(self.tuning.enrage_multiplier);
        self.speed_multiplier = self.tuning.enrage_multiplier;
        debug!(boss = %self.id, health = self.combatant.health(), "Boss enraged");
        events.push(GameEvent::BossEnraged);
    }

    fn enter_next_phase(&mut self, events: &mut EventQueue) {
        self.phase_index = (self.phase_index + 1).min(self.phases.len() - 1);
        self.state = BossState::Active;
        self.shield_timer_ms = 0;
        self.heal_timer_ms = 0;
        self.teleport_timer_ms = 0;
        debug!(boss = %self.id, phase = self.phase_index, "Boss entered phase");
        events.push(GameEvent::BossPhaseChanged {
            phase_index: self.phase_index,
        });
    }

    fn update_abilities(&mut self, delta: u64) {
        let (shield, heal) = {
            let phase = self.current_phase();
            (phase.has(SpecialAbility::Shield), phase.has(SpecialAbility::Heal))
        };

        self.shield_remaining_ms = self.shield_remaining_ms.saturating_sub(delta);
        if shield && self.tuning.shield_interval_ms > 0 {
            self.shield_timer_ms += delta;
            if self.shield_timer_ms >= self.tuning.shield_interval_ms {
                self.shield_timer_ms -= self.tuning.shield_interval_ms;
                self.shield_remaining_ms = self.tuning.shield_pulse_ms;
            }
        }

        if heal && self.tuning.heal_interval_ms > 0 {
            self.heal_timer_ms += delta;
            if self.heal_timer_ms >= self.tuning.heal_interval_ms {
                self.heal_timer_ms -= self.tuning.heal_interval_ms;
                self.combatant.heal(self.tuning.heal_amount);
            }
        }
    }

    fn update_movement<R: Rng + ?Sized>(
        &mut self,
        delta_ms: u32,
        target: Option<Vec2Fixed>,
        bounds: &WorldBounds,
        rng: &mut R,
    ) {
        let phase = self.current_phase();
        let step = per_second(phase.speed * self.speed_multiplier, delta_ms);
        let movement = phase.movement;

        match movement {
            BossMovement::Stationary => {}
            BossMovement::Patrol => {
                if self.position.x <= bounds.min.x {
                    self.patrol_sign = 1;
                } else if self.position.x >= bounds.max.x {
                    self.patrol_sign = -1;
                }
                let dx = step * Fixed::from_num(self.patrol_sign);
                self.position = bounds.clamp(Vec2Fixed::new(self.position.x + dx, self.position.y));
            }
            BossMovement::Chase => {
                if let Some(target) = target {
                    if self.position.within_range(target, step) {
                        self.position = target;
                    } else {
                        let offset = self.position.direction_to(target).scale(step);
                        self.position = bounds.clamp(self.position + offset);
                    }
                }
            }
            BossMovement::Teleport => {
                self.teleport_timer_ms += u64::from(delta_ms);
                if self.teleport_timer_ms >= self.tuning.teleport_interval_ms {
                    self.teleport_timer_ms = 0;
                    let anchor = target.unwrap_or_else(|| bounds.center());
                    let (dx, dy) = COMPASS[rng.gen_range(0..COMPASS.len())];
                    let offset = Vec2Fixed::from_ints(dx * TELEPORT_DISTANCE, dy * TELEPORT_DISTANCE);
                    self.position = bounds.clamp(anchor + offset);
                }
            }
        }
    }

    fn update_attacks(&mut self, delta: u64, target: Option<Vec2Fixed>) -> Vec<BossAttack> {
        let position = self.position;
        let enrage = if self.enraged {
            self.tuning.enrage_multiplier
        } else {
            Fixed::ONE
        };
        let phase = &mut self.phases[self.phase_index];
        let multiplier = enrage * phase.damage_multiplier;

        let mut attacks = Vec::new();
        for pattern in &mut phase.attack_patterns {
            pattern.elapsed_since_use_ms = pattern.elapsed_since_use_ms.saturating_add(delta);
            let Some(target) = target else { continue };
            if !pattern.is_ready() || !position.within_range(target, pattern.range) {
                continue;
            }
            pattern.elapsed_since_use_ms = 0;
            attacks.push(BossAttack {
                pattern_id: pattern.id.clone(),
                effect: pattern.effect,
                damage: scale_u32(pattern.damage, multiplier),
            });
        }
        attacks
    }
}

/// Unit offsets for the eight compass directions.
const COMPASS: [(i32, i32); 8] = [
    (0, -1),
    (1, -1),
    (1, 0),
    (1, 1),
    (0, 1),
    (-1, 1),
    (-1, 0),
    (-1, -1),
];
