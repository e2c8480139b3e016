//! Top-level gameplay coordinator.
//!
//! The [`GameplayOrchestrator`] owns every subsystem and exposes a single
//! per-frame entry point, [`update`](GameplayOrchestrator::update).
//! External signals (positions, contacts, gestures, pickups) arrive as
//! [`InputSignal`]s and events leave through an [`EventQueue`].
//!
//! # Tick Order
//!
//! Each call to `update` runs, in this order:
//! 1. **Effects** - damage-over-time ticks and expiry on the player
//! 2. **Spawning** - at most one enemy from the wave director
//! 3. **Enemy AI** - movement and attacks, in ascending enemy id
//! 4. **Boss** - phase logic, movement, attacks and summons
//! 5. **Hazards** - activity cycles and patterns
//! 6. **Waves** - completion, boss gating and intermission
//! 7. **Regeneration** - player energy per elapsed second

use std::collections::hash_map::DefaultHasher;
use std::collections::BTreeMap;
use std::hash::{Hash, Hasher};

use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{debug, trace, warn};

use crate::ai::EnemyAiAgent;
use crate::boss::{AttackEffect, BossEncounter, TakeDamageOutcome};
use crate::combat::{CombatResolver, CombatTuning, ComboState};
use crate::combatant::Combatant;
use crate::data::ZoneData;
use crate::effects::{ActiveEffect, EffectKind, EffectTracker};
use crate::events::{EventQueue, GameEvent};
use crate::gestures::{binding_for, GestureAction, GestureOutcome, GestureRejection, Shape};
use crate::hazard::HazardField;
use crate::math::{per_second, Fixed, Vec2Fixed, WorldBounds};
use crate::powerups::{PowerUpGrant, PowerUpKind, POWER_UP_POINTS};
use crate::rng::{seeded, weighted_index, SimRng};
use crate::scoring::{
    Achievement, AchievementTracker, ScoreTracker, COMBO_MASTER_STREAK, WAVE_SURVIVOR_WAVE,
};
use crate::wave::{WaveDirector, WaveState};

/// A boss appears after every wave that is a multiple of this.
pub const BOSS_WAVE_INTERVAL: u32 = 5;
/// Pause between a completed wave and the next one.
pub const WAVE_INTERMISSION_MS: u64 = 3000;
/// Milliseconds per energy regeneration step.
const REGEN_STEP_MS: u64 = 1000;

/// What a player attack is aimed at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum TargetRef {
    /// A live enemy by runtime id.
    Enemy(u32),
    /// The active boss.
    Boss,
}

/// Who is standing in a hazard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum HazardOccupant {
    /// The player.
    Player,
    /// An enemy or the boss.
    Target(TargetRef),
}

/// A signal from the host into the kernel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum InputSignal {
    /// The player moved.
    SetPlayerPosition(Vec2Fixed),
    /// An enemy was moved by host physics.
    SetEnemyPosition {
        /// Enemy id.
        enemy_id: u32,
        /// New position.
        position: Vec2Fixed,
    },
    /// The boss was moved by host physics.
    SetBossPosition(Vec2Fixed),
    /// The recognizer classified a drawn gesture.
    Gesture {
        /// Recognized shape.
        shape: Shape,
        /// Selected target, if any.
        target: Option<TargetRef>,
    },
    /// The player touched a power-up.
    PowerUp(PowerUpKind),
    /// A player attack connected with a target.
    AttackHit {
        /// Target hit.
        target: TargetRef,
    },
    /// An enemy touched the player.
    EnemyContact {
        /// Enemy id.
        enemy_id: u32,
    },
    /// A combatant is overlapping a hazard.
    HazardOverlap {
        /// Hazard id.
        hazard_id: u32,
        /// Who is in it.
        occupant: HazardOccupant,
    },
    /// An enemy left play without being killed.
    RemoveEnemy {
        /// Enemy id.
        enemy_id: u32,
    },
}

/// A live enemy.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Enemy {
    /// Runtime id, unique for the session.
    pub id: u32,
    /// Template id.
    pub spec_id: String,
    /// Stats.
    pub combatant: Combatant,
    /// Current position.
    pub position: Vec2Fixed,
    /// Base points on kill.
    pub points: u32,
    agent: EnemyAiAgent,
}

impl Enemy {
    /// Behavior state.
    #[must_use]
    pub const fn agent(&self) -> &EnemyAiAgent {
        &self.agent
    }
}

/// Coordinates waves, enemies, the boss, hazards and scoring for one session.
#[derive(Debug, Clone)]
pub struct GameplayOrchestrator {
    zone: ZoneData,
    bounds: WorldBounds,
    seed: u64,
    rng: SimRng,
    resolver: CombatResolver,
    game_time_ms: u64,
    player: Combatant,
    player_position: Vec2Fixed,
    player_effects: EffectTracker,
    combo: ComboState,
    enemies: BTreeMap<u32, Enemy>,
    next_enemy_id: u32,
    director: WaveDirector,
    boss: Option<BossEncounter>,
    bosses_spawned: u32,
    awaiting_boss: bool,
    intermission_remaining_ms: Option<u64>,
    hazards: HazardField,
    events: EventQueue,
    score: ScoreTracker,
    achievements: AchievementTracker,
    wave_damage_taken: bool,
    regen_accumulator_ms: u64,
    game_over: bool,
}

impl GameplayOrchestrator {
    /// Start a session in `zone` seeded with `seed`. Wave 1 begins immediately.
    ///
    /// Validation problems are logged, not fatal; subsystems degrade instead.
    #[must_use]
    pub fn new(zone: ZoneData, seed: u64) -> Self {
        Self::with_tuning(zone, seed, CombatTuning::default())
    }

    /// Like [`new`](Self::new) with custom combat tuning.
    #[must_use]
    pub fn with_tuning(zone: ZoneData, seed: u64, tuning: CombatTuning) -> Self {
        for problem in zone.validate() {
            warn!(zone = %zone.id, "{problem}");
        }

        let bounds = zone.bounds();
        let director = WaveDirector::new(zone.spawn_weights(), zone.difficulty);
        let hazards = HazardField::from_specs(
            &zone.hazards.iter().map(|h| h.to_spec()).collect::<Vec<_>>(),
        );

        let mut orchestrator = Self {
            player: zone.player.stats.to_combatant(),
            player_position: bounds.center(),
            bounds,
            seed,
            rng: seeded(seed),
            resolver: CombatResolver::new(tuning),
            game_time_ms: 0,
            player_effects: EffectTracker::new(),
            combo: ComboState::new(),
            enemies: BTreeMap::new(),
            next_enemy_id: 0,
            director,
            boss: None,
            bosses_spawned: 0,
            awaiting_boss: false,
            intermission_remaining_ms: None,
            hazards,
            events: EventQueue::new(),
            score: ScoreTracker::new(),
            achievements: AchievementTracker::new(),
            wave_damage_taken: false,
            regen_accumulator_ms: 0,
            game_over: false,
            zone,
        };
        orchestrator.begin_wave();
        orchestrator
    }

    /// Advance the session by `delta_ms`.
    ///
    /// `time_ms` is the host clock and is only used for tracing; all game
    /// timers run on accumulated deltas. Does nothing once the player is dead.
    pub fn update(&mut self, time_ms: u64, delta_ms: u32) {
        if self.game_over {
            return;
        }
        self.game_time_ms += u64::from(delta_ms);
        trace!(host_time_ms = time_ms, game_time_ms = self.game_time_ms, "Orchestrator tick");

        self.run_effect_sweep();
        self.run_spawning(delta_ms);
        self.run_enemy_ai(delta_ms);
        self.run_boss(delta_ms);
        self.run_hazards(delta_ms);
        self.run_wave_progress(delta_ms);
        self.run_regeneration(delta_ms);
    }

    // ------------------------------------------------------------------
    // Tick systems
    // ------------------------------------------------------------------

    fn run_effect_sweep(&mut self) {
        let report = self.player_effects.sweep(&mut self.player, self.game_time_ms);
        for kind in report.expired {
            self.events.push(GameEvent::EffectExpired { kind });
        }
        for (_, amount) in report.dot_damage {
            self.record_player_damage(amount);
        }
        self.check_player_death();
    }

    fn run_spawning(&mut self, delta_ms: u32) {
        let live = self.live_enemy_count();
        if let Some(request) = self.director.update(delta_ms, live, &mut self.rng) {
            let position = self.edge_spawn_position();
            self.spawn_enemy(request.spec_index, position);
        }
    }

    fn run_enemy_ai(&mut self, delta_ms: u32) {
        let target = self.player.is_alive().then_some(self.player_position);
        let ids: Vec<u32> = self.enemies.keys().copied().collect();

        for id in ids {
            let Some(enemy) = self.enemies.get_mut(&id) else {
                continue;
            };
            let decision = enemy.agent.update(enemy.position, target, delta_ms, &self.bounds);
            let step = Vec2Fixed::new(
                per_second(decision.velocity.x, delta_ms),
                per_second(decision.velocity.y, delta_ms),
            );
            enemy.position = self.bounds.clamp(enemy.position + step);

            if decision.attack_ready {
                let raw = enemy.combatant.attack_power;
                self.damage_player(raw);
            }
            if self.game_over {
                return;
            }
        }
    }

    fn run_boss(&mut self, delta_ms: u32) {
        let target = self.player.is_alive().then_some(self.player_position);
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        let attacks = boss.update(delta_ms, target, &self.bounds, &mut self.rng, &mut self.events);
        let boss_position = boss.position();

        for attack in attacks {
            match attack.effect {
                AttackEffect::Summon { count } => {
                    for _ in 0..count {
                        self.summon_minion(boss_position);
                    }
                }
                AttackEffect::Strike | AttackEffect::Projectile | AttackEffect::AreaBlast => {
                    trace!(pattern = %attack.pattern_id, damage = attack.damage, "Boss attack");
                    self.damage_player(attack.damage);
                }
            }
        }
    }

    fn run_hazards(&mut self, delta_ms: u32) {
        for hazard_id in self.hazards.update(delta_ms) {
            trace!(hazard_id, "Hazard activated");
            self.events.push(GameEvent::HazardActivated { hazard_id });
        }
    }

    fn run_wave_progress(&mut self, delta_ms: u32) {
        if let Some(remaining) = self.intermission_remaining_ms {
            let remaining = remaining.saturating_sub(u64::from(delta_ms));
            if remaining == 0 {
                self.intermission_remaining_ms = None;
                self.begin_wave();
            } else {
                self.intermission_remaining_ms = Some(remaining);
            }
            return;
        }

        if self.awaiting_boss {
            if self.boss.is_none() {
                self.awaiting_boss = false;
                self.intermission_remaining_ms = Some(WAVE_INTERMISSION_MS);
            }
            return;
        }

        if !self.director.is_wave_complete(self.live_enemy_count()) {
            return;
        }

        let completed = self.director.wave_number();
        let no_damage_taken = !self.wave_damage_taken;
        self.events.push(GameEvent::WaveCompleted {
            wave_number: completed,
            no_damage_taken,
        });
        self.score.record_wave(completed);
        if no_damage_taken {
            self.unlock(Achievement::Untouchable);
        }
        if completed >= WAVE_SURVIVOR_WAVE {
            self.unlock(Achievement::WaveSurvivor);
        }
        debug!(wave = completed, no_damage_taken, "Wave completed");

        self.director.next_wave();
        if completed % BOSS_WAVE_INTERVAL == 0 && self.boss.is_none() && self.spawn_boss() {
            self.awaiting_boss = true;
        } else {
            self.intermission_remaining_ms = Some(WAVE_INTERMISSION_MS);
        }
    }

    fn run_regeneration(&mut self, delta_ms: u32) {
        self.regen_accumulator_ms += u64::from(delta_ms);
        let steps = self.regen_accumulator_ms / REGEN_STEP_MS;
        if steps == 0 {
            return;
        }
        self.regen_accumulator_ms -= steps * REGEN_STEP_MS;
        let amount = self
            .zone
            .player
            .energy_regen_per_second
            .saturating_mul(steps as u32);
        self.resolver.restore_energy(&mut self.player, amount);
    }

    // ------------------------------------------------------------------
    // Spawning
    // ------------------------------------------------------------------

    fn begin_wave(&mut self) {
        self.director.start_wave();
        self.wave_damage_taken = false;
        self.events.push(GameEvent::WaveStarted {
            wave_number: self.director.wave_number(),
        });
    }

    fn spawn_enemy(&mut self, spec_index: usize, position: Vec2Fixed) -> Option<u32> {
        let spec = self.zone.enemies.get(spec_index)?;
        self.next_enemy_id += 1;
        let id = self.next_enemy_id;
        let enemy = Enemy {
            id,
            spec_id: spec.id.clone(),
            combatant: spec.stats.to_combatant(),
            position,
            points: spec.points,
            agent: EnemyAiAgent::new(spec.ai_profile()),
        };
        debug!(enemy_id = id, spec = %spec.id, wave = self.director.wave_number(), "Enemy spawned");
        self.events.push(GameEvent::EnemySpawned {
            enemy_id: id,
            spec_id: spec.id.clone(),
        });
        self.enemies.insert(id, enemy);
        Some(id)
    }

    fn summon_minion(&mut self, near: Vec2Fixed) {
        let weights = self.zone.spawn_weights();
        let Some(index) = weighted_index(&weights, &mut self.rng) else {
            return;
        };
        let offset = Vec2Fixed::from_ints(self.rng.gen_range(-40..=40), self.rng.gen_range(-40..=40));
        let position = self.bounds.clamp(near + offset);
        self.spawn_enemy(index, position);
    }

    /// A random point on one of the four playfield edges.
    fn edge_spawn_position(&mut self) -> Vec2Fixed {
        let min = self.bounds.min;
        let max = self.bounds.max;
        let along_x = min.x + (max.x - min.x) * Fixed::from_bits(self.rng.gen_range(0..=Fixed::ONE.to_bits()));
        let along_y = min.y + (max.y - min.y) * Fixed::from_bits(self.rng.gen_range(0..=Fixed::ONE.to_bits()));
        match self.rng.gen_range(0..4) {
            0 => Vec2Fixed::new(along_x, min.y),
            1 => Vec2Fixed::new(max.x, along_y),
            2 => Vec2Fixed::new(along_x, max.y),
            _ => Vec2Fixed::new(min.x, along_y),
        }
    }

    /// Spawn the next boss. Returns `false` if the zone has none.
    fn spawn_boss(&mut self) -> bool {
        let Some(data) = self.zone.boss.as_ref() else {
            return false;
        };
        let encounter = self.bosses_spawned;
        let position = Vec2Fixed::new(
            self.bounds.center().x,
            self.bounds.min.y + (self.bounds.max.y - self.bounds.min.y) / Fixed::from_num(4),
        );
        let boss = BossEncounter::new(
            data.id.clone(),
            data.combatant_for(encounter),
            data.phases_for(encounter),
            position,
            data.tuning(),
        );
        debug!(
            boss = %data.id,
            encounter,
            phases = boss.phase_count(),
            health = boss.combatant().max_health(),
            "Boss spawned"
        );
        self.events.push(GameEvent::BossSpawned {
            boss_id: data.id.clone(),
            phase_count: boss.phase_count(),
        });
        self.bosses_spawned += 1;
        self.boss = Some(boss);
        true
    }

    // ------------------------------------------------------------------
    // Player damage
    // ------------------------------------------------------------------

    fn damage_player(&mut self, raw: u32) {
        if self.player.is_dead() {
            return;
        }
        let report = self.resolver.resolve_damage(&mut self.player, raw);
        self.record_player_damage(report.dealt);
        self.check_player_death();
    }

    fn record_player_damage(&mut self, amount: u32) {
        if amount == 0 {
            return;
        }
        self.wave_damage_taken = true;
        self.events.push(GameEvent::PlayerDamaged { amount });
    }

    fn check_player_death(&mut self) {
        if self.game_over || self.player.is_alive() {
            return;
        }
        self.game_over = true;
        self.combo.reset();
        self.player_effects.clear(&mut self.player);
        debug!(game_time_ms = self.game_time_ms, wave = self.director.wave_number(), "Player defeated");
        self.events.push(GameEvent::PlayerDefeated);
    }

    fn apply_player_effect(&mut self, effect: ActiveEffect) {
        self.player_effects.apply(&mut self.player, effect);
        self.events.push(GameEvent::EffectApplied {
            kind: effect.kind,
            duration_ms: effect.duration_ms,
        });
    }

    // ------------------------------------------------------------------
    // Player attacks
    // ------------------------------------------------------------------

    fn target_is_live(&self, target: TargetRef) -> bool {
        match target {
            TargetRef::Enemy(id) => self.enemies.contains_key(&id),
            TargetRef::Boss => self.boss.as_ref().is_some_and(|b| !b.is_defeated()),
        }
    }

    /// Land `raw` damage on a target. Returns health removed.
    fn hit_target(&mut self, target: TargetRef, raw: u32) -> u32 {
        match target {
            TargetRef::Enemy(id) => {
                let Some(enemy) = self.enemies.get_mut(&id) else {
                    return 0;
                };
                let report = self.resolver.resolve_damage(&mut enemy.combatant, raw);
                if !report.blocked && !report.still_alive {
                    self.defeat_enemy(id);
                }
                report.dealt
            }
            TargetRef::Boss => {
                let Some(boss) = self.boss.as_mut() else {
                    return 0;
                };
                match boss.take_damage(&self.resolver, raw) {
                    TakeDamageOutcome::Blocked => 0,
                    TakeDamageOutcome::Damaged { dealt } => dealt,
                    TakeDamageOutcome::Defeated { dealt } => {
                        self.defeat_boss();
                        dealt
                    }
                }
            }
        }
    }

    fn defeat_enemy(&mut self, id: u32) {
        let Some(enemy) = self.enemies.remove(&id) else {
            return;
        };
        let multiplier = self
            .combo
            .multiplier_at(self.game_time_ms, self.resolver.tuning().combo_timeout_ms);
        let points = self.score.record_kill(enemy.points, multiplier);
        debug!(enemy_id = id, spec = %enemy.spec_id, points, "Enemy defeated");
        self.events.push(GameEvent::EnemyDefeated {
            enemy_id: id,
            spec_id: enemy.spec_id,
            points,
        });
        self.unlock(Achievement::FirstBlood);
    }

    fn defeat_boss(&mut self) {
        let Some(boss) = self.boss.take() else {
            return;
        };
        let base = self.zone.boss.as_ref().map_or(0, |b| b.points);
        let points = self.score.record_boss(base);
        self.events.push(GameEvent::BossDefeated {
            boss_id: boss.id().to_string(),
            points,
        });
        self.unlock(Achievement::BossSlayer);
    }

    fn check_combo_achievement(&mut self) {
        if self.combo.count >= COMBO_MASTER_STREAK {
            self.unlock(Achievement::ComboMaster);
        }
    }

    fn unlock(&mut self, achievement: Achievement) {
        if self.achievements.unlock(achievement) {
            debug!(?achievement, "Achievement unlocked");
            self.events.push(GameEvent::AchievementUnlocked { achievement });
        }
    }

    // ------------------------------------------------------------------
    // Inputs
    // ------------------------------------------------------------------

    /// Dispatch an external signal.
    ///
    /// Returns the gesture outcome for [`InputSignal::Gesture`], `None` otherwise.
    pub fn apply_input(&mut self, input: &InputSignal) -> Option<GestureOutcome> {
        match *input {
            InputSignal::SetPlayerPosition(position) => self.set_player_position(position),
            InputSignal::SetEnemyPosition { enemy_id, position } => {
                self.set_enemy_position(enemy_id, position);
            }
            InputSignal::SetBossPosition(position) => self.set_boss_position(position),
            InputSignal::Gesture { shape, target } => return Some(self.on_gesture(shape, target)),
            InputSignal::PowerUp(kind) => self.on_power_up(kind),
            InputSignal::AttackHit { target } => {
                self.on_attack_hit(target);
            }
            InputSignal::EnemyContact { enemy_id } => self.on_enemy_contact(enemy_id),
            InputSignal::HazardOverlap { hazard_id, occupant } => {
                self.on_hazard_overlap(hazard_id, occupant);
            }
            InputSignal::RemoveEnemy { enemy_id } => self.remove_enemy(enemy_id),
        }
        None
    }

    /// Move the player.
    pub fn set_player_position(&mut self, position: Vec2Fixed) {
        self.player_position = self.bounds.clamp(position);
    }

    /// Move an enemy. Unknown ids are ignored.
    pub fn set_enemy_position(&mut self, enemy_id: u32, position: Vec2Fixed) {
        if let Some(enemy) = self.enemies.get_mut(&enemy_id) {
            enemy.position = self.bounds.clamp(position);
        }
    }

    /// Move the boss, if one is active.
    pub fn set_boss_position(&mut self, position: Vec2Fixed) {
        let clamped = self.bounds.clamp(position);
        if let Some(boss) = self.boss.as_mut() {
            boss.set_position(clamped);
        }
    }

    /// Perform the action bound to a recognized shape.
    ///
    /// Rejected gestures leave all state unchanged.
    pub fn on_gesture(&mut self, shape: Shape, target: Option<TargetRef>) -> GestureOutcome {
        if self.game_over {
            return GestureOutcome::Rejected(GestureRejection::PlayerDefeated);
        }
        let Some(binding) = binding_for(shape) else {
            return GestureOutcome::Rejected(GestureRejection::Unrecognized);
        };
        if self.player.status.stunned {
            return GestureOutcome::Rejected(GestureRejection::Stunned);
        }
        let live_target = target.filter(|t| self.target_is_live(*t));
        if binding.action.needs_target() && live_target.is_none() {
            return GestureOutcome::Rejected(GestureRejection::NoTarget);
        }
        if self.player.energy() < binding.energy_cost {
            return GestureOutcome::Rejected(GestureRejection::InsufficientEnergy);
        }

        let now = self.game_time_ms;
        let (damage_dealt, targets_hit) = match binding.action {
            GestureAction::Slash => {
                let Some(target) = live_target else {
                    return GestureOutcome::Rejected(GestureRejection::NoTarget);
                };
                self.player.spend_energy(binding.energy_cost);
                let raw = self
                    .resolver
                    .perform_basic_attack(&self.player, &mut self.combo, now, &mut self.rng);
                self.check_combo_achievement();
                (self.hit_target(target, raw), 1)
            }
            GestureAction::Pierce => {
                let Some(target) = live_target else {
                    return GestureOutcome::Rejected(GestureRejection::NoTarget);
                };
                let Some(raw) = self.resolver.perform_special_attack(
                    &mut self.player,
                    &mut self.combo,
                    binding.energy_cost,
                    now,
                    &mut self.rng,
                ) else {
                    return GestureOutcome::Rejected(GestureRejection::InsufficientEnergy);
                };
                self.check_combo_achievement();
                (self.hit_target(target, raw), 1)
            }
            GestureAction::ChainLightning => {
                let Some(raw) = self.resolver.perform_special_attack(
                    &mut self.player,
                    &mut self.combo,
                    binding.energy_cost,
                    now,
                    &mut self.rng,
                ) else {
                    return GestureOutcome::Rejected(GestureRejection::InsufficientEnergy);
                };
                self.check_combo_achievement();
                let mut targets: Vec<TargetRef> = self.enemies.keys().map(|id| TargetRef::Enemy(*id)).collect();
                if self.boss.is_some() {
                    targets.push(TargetRef::Boss);
                }
                let mut dealt = 0;
                for target in &targets {
                    dealt += self.hit_target(*target, raw);
                }
                (dealt, targets.len() as u32)
            }
            GestureAction::Shield { duration_ms } => {
                self.player.spend_energy(binding.energy_cost);
                self.apply_player_effect(ActiveEffect::new(EffectKind::Shield, Fixed::ONE, now, duration_ms));
                (0, 0)
            }
            GestureAction::Heal { amount } => {
                self.player.spend_energy(binding.energy_cost);
                let healed = self.resolver.heal(&mut self.player, amount);
                if healed > 0 {
                    self.events.push(GameEvent::PlayerHealed { amount: healed });
                }
                (0, 0)
            }
        };

        trace!(?shape, action = ?binding.action, damage_dealt, targets_hit, "Gesture performed");
        GestureOutcome::Performed {
            action: binding.action,
            damage_dealt,
            targets_hit,
        }
    }

    /// A basic attack connected. Returns health removed, or `None` if the
    /// target is gone or the player cannot act.
    pub fn on_attack_hit(&mut self, target: TargetRef) -> Option<u32> {
        if self.game_over || self.player.status.stunned || !self.target_is_live(target) {
            return None;
        }
        let raw = self.resolver.perform_basic_attack(
            &self.player,
            &mut self.combo,
            self.game_time_ms,
            &mut self.rng,
        );
        self.check_combo_achievement();
        Some(self.hit_target(target, raw))
    }

    /// An enemy touched the player; deals its attack power if off cooldown.
    pub fn on_enemy_contact(&mut self, enemy_id: u32) {
        if self.game_over {
            return;
        }
        let Some(enemy) = self.enemies.get_mut(&enemy_id) else {
            return;
        };
        if enemy.agent.try_consume_attack() {
            let raw = enemy.combatant.attack_power;
            self.damage_player(raw);
        }
    }

    /// A combatant is overlapping a hazard; applies it if active.
    ///
    /// Enemies and the boss take the hazard's damage and can die to it,
    /// credited like a player kill. Lingering effects land on the player only.
    pub fn on_hazard_overlap(&mut self, hazard_id: u32, occupant: HazardOccupant) {
        if self.game_over {
            return;
        }
        if let HazardOccupant::Target(target) = occupant {
            if !self.target_is_live(target) {
                return;
            }
        }
        let Some(effect) = self.hazards.hazard_effect(hazard_id) else {
            return;
        };
        self.events.push(GameEvent::HazardTriggered {
            hazard_id,
            occupant,
            kind: effect.hazard_kind,
            effect: effect.kind,
            damage: effect.damage,
        });
        if let HazardOccupant::Target(target) = occupant {
            if effect.damage > 0 {
                let dealt = self.hit_target(target, effect.damage);
                trace!(hazard_id, ?target, dealt, "Hazard damaged target");
            }
            return;
        }
        if effect.damage > 0 {
            self.damage_player(effect.damage);
        }
        if self.game_over {
            return;
        }
        if let Some(kind) = effect.kind.lingering_effect() {
            if effect.duration_ms > 0 {
                let lingering = ActiveEffect::new(kind, effect.magnitude, self.game_time_ms, effect.duration_ms);
                self.apply_player_effect(lingering);
            }
        }
    }

    /// Collect a power-up.
    pub fn on_power_up(&mut self, kind: PowerUpKind) {
        if self.game_over {
            return;
        }
        match kind.grant(self.game_time_ms) {
            PowerUpGrant::Heal(amount) => {
                let healed = self.resolver.heal(&mut self.player, amount);
                if healed > 0 {
                    self.events.push(GameEvent::PlayerHealed { amount: healed });
                }
            }
            PowerUpGrant::Energy(amount) => {
                self.resolver.restore_energy(&mut self.player, amount);
            }
            PowerUpGrant::Effect(effect) => self.apply_player_effect(effect),
        }
        self.score.record_power_up(POWER_UP_POINTS);
        self.events.push(GameEvent::PowerUpCollected { kind });
    }

    /// Remove an enemy that left play; awards nothing.
    pub fn remove_enemy(&mut self, enemy_id: u32) {
        if self.enemies.remove(&enemy_id).is_some() {
            trace!(enemy_id, "Enemy removed");
        }
    }

    /// Take every event produced since the last drain.
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        self.events.drain()
    }

    // ------------------------------------------------------------------
    // Queries
    // ------------------------------------------------------------------

    /// Current wave number (1-based).
    #[must_use]
    pub const fn current_wave(&self) -> u32 {
        self.director.wave_number()
    }

    /// Snapshot of the current wave.
    #[must_use]
    pub fn wave_state(&self) -> WaveState {
        self.director.state()
    }

    /// Whether a boss is in play.
    #[must_use]
    pub const fn boss_active(&self) -> bool {
        self.boss.is_some()
    }

    /// The active boss.
    #[must_use]
    pub const fn boss(&self) -> Option<&BossEncounter> {
        self.boss.as_ref()
    }

    /// Accumulated game time.
    #[must_use]
    pub const fn game_time_ms(&self) -> u64 {
        self.game_time_ms
    }

    /// Whether the player has died.
    #[must_use]
    pub const fn is_game_over(&self) -> bool {
        self.game_over
    }

    /// Whether the session is between waves.
    #[must_use]
    pub const fn in_intermission(&self) -> bool {
        self.intermission_remaining_ms.is_some()
    }

    /// Player stats.
    #[must_use]
    pub const fn player(&self) -> &Combatant {
        &self.player
    }

    /// Player position.
    #[must_use]
    pub const fn player_position(&self) -> Vec2Fixed {
        self.player_position
    }

    /// Active effects on the player.
    #[must_use]
    pub fn player_effects(&self) -> &[ActiveEffect] {
        self.player_effects.active()
    }

    /// Player combo state.
    #[must_use]
    pub const fn combo(&self) -> &ComboState {
        &self.combo
    }

    /// Live enemies in ascending id order.
    pub fn enemies(&self) -> impl Iterator<Item = &Enemy> {
        self.enemies.values()
    }

    /// Look up a live enemy.
    #[must_use]
    pub fn enemy(&self, id: u32) -> Option<&Enemy> {
        self.enemies.get(&id)
    }

    /// Number of live enemies.
    #[must_use]
    pub fn live_enemy_count(&self) -> u32 {
        self.enemies.len() as u32
    }

    /// Hazards in the zone.
    #[must_use]
    pub const fn hazards(&self) -> &HazardField {
        &self.hazards
    }

    /// Score so far.
    #[must_use]
    pub const fn score(&self) -> &ScoreTracker {
        &self.score
    }

    /// Achievements so far.
    #[must_use]
    pub const fn achievements(&self) -> &AchievementTracker {
        &self.achievements
    }

    /// Zone being played.
    #[must_use]
    pub const fn zone(&self) -> &ZoneData {
        &self.zone
    }

    /// Playfield bounds.
    #[must_use]
    pub const fn bounds(&self) -> &WorldBounds {
        &self.bounds
    }

    /// Session seed.
    #[must_use]
    pub const fn seed(&self) -> u64 {
        self.seed
    }

    /// Hash of the observable session state.
    ///
    /// Two sessions fed the same zone, seed and inputs produce the same
    /// hash after every tick.
    #[must_use]
    pub fn state_hash(&self) -> u64 {
        let mut hasher = DefaultHasher::new();

        self.game_time_ms.hash(&mut hasher);
        self.rng.get_word_pos().hash(&mut hasher);
        self.player.hash(&mut hasher);
        self.player_position.hash(&mut hasher);
        self.player_effects.hash(&mut hasher);
        self.combo.hash(&mut hasher);
        self.enemies.len().hash(&mut hasher);
        for enemy in self.enemies.values() {
            enemy.hash(&mut hasher);
        }
        self.director.hash(&mut hasher);
        self.boss.hash(&mut hasher);
        self.awaiting_boss.hash(&mut hasher);
        self.intermission_remaining_ms.hash(&mut hasher);
        self.hazards.hash(&mut hasher);
        self.score.hash(&mut hasher);
        self.achievements.hash(&mut hasher);
        self.game_over.hash(&mut hasher);

        hasher.finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ai::BehaviorKind;
    use crate::boss::{AttackPattern, BossMovement, BossPhase};
    use crate::data::{BossData, EnemySpec, HazardData, StatBlock};
    use crate::hazard::{HazardEffectKind, HazardKind, HazardPattern};

    fn zone() -> ZoneData {
        ZoneData::from_ron_str(
            "test",
            r#"ZoneData(
                id: "test",
                display_name: "zone.test.name",
                enemies: [
                    EnemySpec(
                        id: "virus",
                        display_name: "enemy.virus.name",
                        stats: StatBlock(health: 10, attack_power: 8),
                        behavior: Chase,
                        speed: 50.0,
                        spawn_weight: 1.0,
                        points: 10,
                    ),
                ],
            )"#,
        )
        .unwrap()
    }

    fn spawn_one(orchestrator: &mut GameplayOrchestrator) -> u32 {
        for _ in 0..200 {
            orchestrator.update(0, 16);
            if let Some(enemy) = orchestrator.enemies().next() {
                return enemy.id;
            }
        }
        panic!("no enemy spawned");
    }

    #[test]
    fn test_starts_in_wave_one() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 1);
        assert_eq!(orchestrator.current_wave(), 1);
        assert!(!orchestrator.boss_active());
        assert_eq!(
            orchestrator.drain_events(),
            vec![GameEvent::WaveStarted { wave_number: 1 }]
        );
    }

    #[test]
    fn test_game_time_accumulates_delta_only() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 1);
        orchestrator.update(999_999, 16);
        orchestrator.update(5, 16);
        assert_eq!(orchestrator.game_time_ms(), 32);
    }

    #[test]
    fn test_unknown_shape_rejected() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 1);
        assert_eq!(
            orchestrator.on_gesture(Shape::Unknown, None),
            GestureOutcome::Rejected(GestureRejection::Unrecognized)
        );
    }

    #[test]
    fn test_targeted_gesture_needs_live_target() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 1);
        assert_eq!(
            orchestrator.on_gesture(Shape::Line, Some(TargetRef::Enemy(42))),
            GestureOutcome::Rejected(GestureRejection::NoTarget)
        );
        assert_eq!(
            orchestrator.on_gesture(Shape::Triangle, Some(TargetRef::Boss)),
            GestureOutcome::Rejected(GestureRejection::NoTarget)
        );
    }

    #[test]
    fn test_insufficient_energy_changes_nothing() {
        let mut z = zone();
        z.player.stats.energy = 10;
        let mut orchestrator = GameplayOrchestrator::new(z, 1);
        let before = orchestrator.state_hash();

        assert_eq!(
            orchestrator.on_gesture(Shape::Zigzag, None),
            GestureOutcome::Rejected(GestureRejection::InsufficientEnergy)
        );
        assert_eq!(orchestrator.state_hash(), before);
    }

    #[test]
    fn test_slash_kills_and_scores() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 3);
        let id = spawn_one(&mut orchestrator);
        orchestrator.drain_events();

        let mut outcome = orchestrator.on_gesture(Shape::Line, Some(TargetRef::Enemy(id)));
        while orchestrator.enemy(id).is_some() {
            outcome = orchestrator.on_gesture(Shape::Line, Some(TargetRef::Enemy(id)));
        }
        assert!(matches!(outcome, GestureOutcome::Performed { action: GestureAction::Slash, .. }));

        let events = orchestrator.drain_events();
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyDefeated { enemy_id, .. } if *enemy_id == id)));
        assert!(events.contains(&GameEvent::AchievementUnlocked {
            achievement: Achievement::FirstBlood
        }));
        assert!(orchestrator.score().score >= 10);
    }

    #[test]
    fn test_power_up_shield_blocks_contact() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 5);
        let id = spawn_one(&mut orchestrator);
        orchestrator.on_power_up(PowerUpKind::Shield);
        orchestrator.drain_events();

        orchestrator.on_enemy_contact(id);
        assert_eq!(orchestrator.player().health(), 100);
        assert!(!orchestrator
            .drain_events()
            .iter()
            .any(|e| matches!(e, GameEvent::PlayerDamaged { .. })));
    }

    #[test]
    fn test_contact_respects_cooldown() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 5);
        let id = spawn_one(&mut orchestrator);
        let start = orchestrator.player().health();

        orchestrator.on_enemy_contact(id);
        let after_first = orchestrator.player().health();
        orchestrator.on_enemy_contact(id);

        // 8 attack - 5 defense
        assert_eq!(start - after_first, 3);
        assert_eq!(orchestrator.player().health(), after_first);
    }

    #[test]
    fn test_energy_regenerates_per_second() {
        let mut orchestrator = GameplayOrchestrator::new(zone(), 1);
        orchestrator.on_gesture(Shape::Zigzag, None);
        let spent = orchestrator.player().energy();
        assert_eq!(spent, 60);

        orchestrator.update(0, 999);
        assert_eq!(orchestrator.player().energy(), 60);
        orchestrator.update(0, 1);
        assert_eq!(orchestrator.player().energy(), 65);
    }

    #[test]
    fn test_player_death_ends_session() {
        let mut z = zone();
        z.player.stats = StatBlock {
            health: 1,
            energy: 0,
            attack_power: 1,
            defense: 0,
        };
        z.enemies.push(EnemySpec {
            id: "brute".to_string(),
            display_name: "enemy.brute.name".to_string(),
            stats: StatBlock {
                health: 50,
                energy: 0,
                attack_power: 50,
                defense: 0,
            },
            behavior: BehaviorKind::Chase,
            speed: Fixed::from_num(50),
            attack_range: Fixed::from_num(30),
            optimal_range: Fixed::ZERO,
            attack_cooldown_ms: 1000,
            spawn_weight: Fixed::ZERO,
            points: 50,
        });
        let mut orchestrator = GameplayOrchestrator::new(z, 1);
        let id = spawn_one(&mut orchestrator);
        orchestrator.on_enemy_contact(id);

        assert!(orchestrator.is_game_over());
        assert!(orchestrator.drain_events().contains(&GameEvent::PlayerDefeated));

        let time = orchestrator.game_time_ms();
        orchestrator.update(0, 1000);
        assert_eq!(orchestrator.game_time_ms(), time);
        assert_eq!(
            orchestrator.on_gesture(Shape::Line, Some(TargetRef::Enemy(id))),
            GestureOutcome::Rejected(GestureRejection::PlayerDefeated)
        );
    }

    /// Step until hazard 1 reaches the wanted state; returns events seen.
    fn wait_for_hazard(orchestrator: &mut GameplayOrchestrator, active: bool) -> Vec<GameEvent> {
        let mut events = Vec::new();
        for _ in 0..500 {
            if orchestrator.hazards().get(1).is_some_and(|h| h.is_active() == active) {
                return events;
            }
            orchestrator.update(0, 16);
            events.extend(orchestrator.drain_events());
        }
        panic!("hazard never became active={active}");
    }

    fn acid_pool() -> HazardData {
        HazardData {
            kind: HazardKind::Acid,
            x: Fixed::from_num(100),
            y: Fixed::from_num(100),
            damage: 50,
            active_duration_ms: 1000,
            cooldown_ms: 1000,
            pattern: HazardPattern::Static,
            effect: HazardEffectKind::Damage,
            effect_duration_ms: 0,
            effect_magnitude: Fixed::ONE,
        }
    }

    #[test]
    fn test_hazard_kills_enemy_only_while_active() {
        let mut z = zone();
        z.hazards.push(acid_pool());
        let mut orchestrator = GameplayOrchestrator::new(z, 3);
        let id = spawn_one(&mut orchestrator);
        let in_acid = HazardOccupant::Target(TargetRef::Enemy(id));

        wait_for_hazard(&mut orchestrator, false);
        orchestrator.drain_events();
        let before = orchestrator.state_hash();
        orchestrator.on_hazard_overlap(1, in_acid);
        assert_eq!(orchestrator.state_hash(), before);
        assert!(orchestrator.drain_events().is_empty());

        let seen = wait_for_hazard(&mut orchestrator, true);
        assert!(seen.contains(&GameEvent::HazardActivated { hazard_id: 1 }));
        let health = orchestrator.player().health();
        orchestrator.on_hazard_overlap(1, in_acid);

        assert!(orchestrator.enemy(id).is_none());
        assert_eq!(orchestrator.player().health(), health);
        let events = orchestrator.drain_events();
        assert!(events.contains(&GameEvent::HazardTriggered {
            hazard_id: 1,
            occupant: in_acid,
            kind: HazardKind::Acid,
            effect: HazardEffectKind::Damage,
            damage: 50,
        }));
        assert!(events
            .iter()
            .any(|e| matches!(e, GameEvent::EnemyDefeated { enemy_id, .. } if *enemy_id == id)));
        assert_eq!(orchestrator.score().enemies_defeated, 1);
    }

    #[test]
    fn test_hazard_ignores_missing_targets() {
        let mut z = zone();
        z.hazards.push(acid_pool());
        let mut orchestrator = GameplayOrchestrator::new(z, 3);
        orchestrator.drain_events();
        let before = orchestrator.state_hash();

        orchestrator.on_hazard_overlap(1, HazardOccupant::Target(TargetRef::Boss));
        orchestrator.on_hazard_overlap(1, HazardOccupant::Target(TargetRef::Enemy(42)));
        assert_eq!(orchestrator.state_hash(), before);
        assert!(orchestrator.drain_events().is_empty());

        orchestrator.on_hazard_overlap(1, HazardOccupant::Player);
        // 50 damage - 5 defense
        assert_eq!(orchestrator.player().health(), 55);
    }

    #[test]
    fn test_oversized_attack_power_saturates() {
        let mut z = zone();
        z.player.stats.attack_power = 3_000_000_000;
        assert!(z.validate().iter().any(|e| e.contains("attack_power 3000000000")));

        let mut orchestrator = GameplayOrchestrator::new(z, 1);
        let id = spawn_one(&mut orchestrator);
        assert_eq!(orchestrator.on_attack_hit(TargetRef::Enemy(id)), Some(10));
        assert!(orchestrator.enemy(id).is_none());
    }

    #[test]
    fn test_boss_summons_minions_beside_itself() {
        let mut z = zone();
        z.boss = Some(BossData {
            id: "macrophage".to_string(),
            display_name: "boss.macrophage.name".to_string(),
            stats: StatBlock {
                health: 200,
                energy: 0,
                attack_power: 10,
                defense: 0,
            },
            phases: vec![BossPhase {
                id: "brood".to_string(),
                health_threshold_percent: 100,
                attack_patterns: vec![AttackPattern {
                    id: "spawn".to_string(),
                    damage: 0,
                    range: Fixed::from_num(1000),
                    cooldown_ms: 5000,
                    effect: AttackEffect::Summon { count: 3 },
                    elapsed_since_use_ms: 0,
                }],
                movement: BossMovement::Stationary,
                speed: Fixed::ZERO,
                damage_multiplier: Fixed::ONE,
                special_abilities: Vec::new(),
            }],
            points: 100,
            enrage_threshold_percent: 30,
            health_growth: Fixed::ZERO,
        });
        let mut orchestrator = GameplayOrchestrator::new(z, 8);
        assert!(orchestrator.spawn_boss());
        orchestrator.drain_events();
        let health = orchestrator.player().health();

        orchestrator.update(0, 16);

        let near = orchestrator.boss().map(BossEncounter::position).unwrap();
        let reach = Fixed::from_num(40);
        let minions: Vec<u32> = orchestrator
            .enemies()
            .filter(|e| (e.position.x - near.x).abs() <= reach && (e.position.y - near.y).abs() <= reach)
            .map(|e| e.id)
            .collect();
        assert_eq!(minions.len(), 3);

        let events = orchestrator.drain_events();
        for id in &minions {
            assert!(events
                .iter()
                .any(|e| matches!(e, GameEvent::EnemySpawned { enemy_id, .. } if enemy_id == id)));
        }
        assert_eq!(orchestrator.player().health(), health);

        // Cooldown holds the next brood.
        let live = orchestrator.live_enemy_count();
        orchestrator.update(0, 16);
        assert_eq!(orchestrator.live_enemy_count(), live);
    }

    #[test]
    fn test_same_seed_same_hash() {
        let mut a = GameplayOrchestrator::new(zone(), 77);
        let mut b = GameplayOrchestrator::new(zone(), 77);
        for frame in 0..600u64 {
            a.update(frame * 16, 16);
            b.update(frame * 16, 16);
            assert_eq!(a.state_hash(), b.state_hash(), "diverged at frame {frame}");
        }
    }
}
