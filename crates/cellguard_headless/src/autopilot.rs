//! Scripted player behavior for headless playtesting.
//!
//! An [`Autopilot`] is the tunable profile (how fast to move, how often
//! to swing, which gestures to draw); an [`AutopilotState`] carries the
//! timers for one session and turns the current orchestrator state into
//! the [`InputSignal`]s a real host would send: movement, attack hits,
//! enemy contacts, hazard overlaps, gestures and power-up pickups.

use std::collections::BTreeMap;
use std::path::Path;

use cellguard_core::gestures::Shape;
use cellguard_core::math::{decimal_serde, per_second, Fixed, Vec2Fixed};
use cellguard_core::orchestrator::{GameplayOrchestrator, HazardOccupant, InputSignal, TargetRef};
use cellguard_core::powerups::PowerUpKind;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error type for autopilot profile loading.
#[derive(Error, Debug)]
pub enum AutopilotError {
    /// File not found.
    #[error("Autopilot file not found: {0}")]
    FileNotFound(String),
    /// Failed to read file.
    #[error("Failed to read autopilot file: {0}")]
    ReadError(#[from] std::io::Error),
    /// Failed to parse RON.
    #[error("Failed to parse autopilot: {0}")]
    ParseError(#[from] ron::error::SpannedError),
    /// No built-in profile with that name.
    #[error("Unknown autopilot '{0}' (expected balanced, aggressive, cautious or idle)")]
    UnknownProfile(String),
}

/// How the autopilot positions itself relative to its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Stance {
    /// Close to melee reach.
    Engage,
    /// Keep `kite_distance` away and rely on gestures.
    Kite,
    /// Never move.
    Hold,
}

/// Power-ups handed out in rotation.
const POWER_UP_ROTATION: [PowerUpKind; 5] = [
    PowerUpKind::Health,
    PowerUpKind::Energy,
    PowerUpKind::Shield,
    PowerUpKind::DamageBoost,
    PowerUpKind::SpeedBoost,
];

/// A playtesting profile.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Autopilot {
    /// Profile name.
    pub name: String,
    /// Human-readable description.
    pub description: String,
    /// Positioning.
    pub stance: Stance,
    /// Player movement speed in units per second.
    #[serde(with = "decimal_serde")]
    pub move_speed: Fixed,
    /// Distance at which basic attacks connect.
    #[serde(with = "decimal_serde")]
    pub melee_reach: Fixed,
    /// Distance kept while kiting.
    #[serde(with = "decimal_serde")]
    pub kite_distance: Fixed,
    /// Distance at which an enemy touches the player.
    #[serde(with = "decimal_serde")]
    pub contact_radius: Fixed,
    /// Hazard footprint radius at scale 1.
    #[serde(with = "decimal_serde")]
    pub hazard_radius: Fixed,
    /// Time between basic attacks.
    pub attack_interval_ms: u64,
    /// Time between gestures.
    pub gesture_interval_ms: u64,
    /// Gestures drawn in order, wrapping around.
    pub gesture_rotation: Vec<Shape>,
    /// Draw a heal when health falls below this percentage (0 = never).
    pub heal_below_percent: u32,
    /// Time between power-up pickups (0 = never).
    pub power_up_interval_ms: u64,
    /// Refuse to step onto active hazards.
    pub avoid_hazards: bool,
}

impl Default for Autopilot {
    fn default() -> Self {
        Self::balanced()
    }
}

impl Autopilot {
    /// Standard melee play with the occasional special.
    #[must_use]
    pub fn balanced() -> Self {
        Self {
            name: "balanced".to_string(),
            description: "Melee with periodic pierce and shield".to_string(),
            stance: Stance::Engage,
            move_speed: Fixed::from_num(150),
            melee_reach: Fixed::from_num(50),
            kite_distance: Fixed::from_num(150),
            contact_radius: Fixed::from_num(24),
            hazard_radius: Fixed::from_num(32),
            attack_interval_ms: 400,
            gesture_interval_ms: 2500,
            gesture_rotation: vec![Shape::Triangle, Shape::Circle, Shape::Line],
            heal_below_percent: 40,
            power_up_interval_ms: 20_000,
            avoid_hazards: true,
        }
    }

    /// Fast swings and energy dumped into chain lightning.
    #[must_use]
    pub fn aggressive() -> Self {
        Self {
            name: "aggressive".to_string(),
            description: "Rapid melee, chain lightning on cooldown, ignores hazards".to_string(),
            move_speed: Fixed::from_num(180),
            attack_interval_ms: 250,
            gesture_interval_ms: 1500,
            gesture_rotation: vec![Shape::Zigzag, Shape::Triangle],
            heal_below_percent: 20,
            avoid_hazards: false,
            ..Self::balanced()
        }
    }

    /// Keeps its distance and fights with gestures.
    #[must_use]
    pub fn cautious() -> Self {
        Self {
            name: "cautious".to_string(),
            description: "Kites at range, shields often, heals early".to_string(),
            stance: Stance::Kite,
            attack_interval_ms: 600,
            gesture_interval_ms: 1200,
            gesture_rotation: vec![Shape::Triangle, Shape::Circle],
            heal_below_percent: 60,
            ..Self::balanced()
        }
    }

    /// Stands still and does nothing but get hit. Useful as a baseline.
    #[must_use]
    pub fn idle() -> Self {
        Self {
            name: "idle".to_string(),
            description: "Never moves or attacks".to_string(),
            stance: Stance::Hold,
            attack_interval_ms: 0,
            gesture_interval_ms: 0,
            gesture_rotation: Vec::new(),
            heal_below_percent: 0,
            power_up_interval_ms: 0,
            avoid_hazards: false,
            ..Self::balanced()
        }
    }

    /// Built-in profile by name.
    pub fn by_name(name: &str) -> Result<Self, AutopilotError> {
        match name {
            "balanced" => Ok(Self::balanced()),
            "aggressive" | "aggro" => Ok(Self::aggressive()),
            "cautious" => Ok(Self::cautious()),
            "idle" => Ok(Self::idle()),
            other => Err(AutopilotError::UnknownProfile(other.to_string())),
        }
    }

    /// Built-in name, or a path to a RON profile.
    pub fn resolve(name_or_path: &str) -> Result<Self, AutopilotError> {
        if Path::new(name_or_path).extension().is_some_and(|ext| ext == "ron") {
            Self::load(name_or_path)
        } else {
            Self::by_name(name_or_path)
        }
    }

    /// Load a profile from a RON file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, AutopilotError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(AutopilotError::FileNotFound(path.display().to_string()));
        }
        let contents = std::fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }

    /// Load from a RON string.
    pub fn from_ron_str(ron: &str) -> Result<Self, AutopilotError> {
        Ok(ron::from_str(ron)?)
    }
}

/// Per-session autopilot timers.
#[derive(Debug, Clone, Default)]
pub struct AutopilotState {
    since_attack_ms: u64,
    since_gesture_ms: u64,
    since_power_up_ms: u64,
    gesture_cursor: usize,
    power_up_cursor: usize,
    /// Hazards the player overlapped last frame, with their active flag.
    overlapping: BTreeMap<(u32, HazardOccupant), bool>,
}

struct Target {
    target: TargetRef,
    position: Vec2Fixed,
    distance: Fixed,
}

impl AutopilotState {
    /// Fresh timers.
    pub fn new() -> Self {
        Self::default()
    }

    /// Inputs to apply before the next `delta_ms` update.
    pub fn plan(&mut self, pilot: &Autopilot, orchestrator: &GameplayOrchestrator, delta_ms: u32) -> Vec<InputSignal> {
        let mut inputs = Vec::new();
        if orchestrator.is_game_over() {
            return inputs;
        }

        let delta = u64::from(delta_ms);
        self.since_attack_ms += delta;
        self.since_gesture_ms += delta;
        self.since_power_up_ms += delta;

        let mut position = orchestrator.player_position();
        let target = nearest_target(orchestrator, position);

        if let Some(moved) = step_toward(pilot, orchestrator, position, target.as_ref(), delta_ms) {
            position = moved;
            inputs.push(InputSignal::SetPlayerPosition(moved));
        }

        for enemy in orchestrator.enemies() {
            if enemy.position.within_range(position, pilot.contact_radius) {
                inputs.push(InputSignal::EnemyContact { enemy_id: enemy.id });
            }
        }

        self.plan_hazards(pilot, orchestrator, position, &mut inputs);

        // Distance from the possibly moved position.
        let target = target.map(|t| Target {
            distance: t.position.distance(position),
            ..t
        });

        if pilot.attack_interval_ms > 0 && self.since_attack_ms >= pilot.attack_interval_ms {
            if let Some(t) = target.as_ref().filter(|t| t.distance <= pilot.melee_reach) {
                inputs.push(InputSignal::AttackHit { target: t.target });
                self.since_attack_ms = 0;
            }
        }

        if pilot.gesture_interval_ms > 0 && self.since_gesture_ms >= pilot.gesture_interval_ms {
            if let Some(gesture) = self.next_gesture(pilot, orchestrator, target.as_ref()) {
                inputs.push(gesture);
                self.since_gesture_ms = 0;
            }
        }

        if pilot.power_up_interval_ms > 0 && self.since_power_up_ms >= pilot.power_up_interval_ms {
            let kind = POWER_UP_ROTATION[self.power_up_cursor % POWER_UP_ROTATION.len()];
            self.power_up_cursor += 1;
            self.since_power_up_ms = 0;
            inputs.push(InputSignal::PowerUp(kind));
        }

        inputs
    }

    /// Overlaps are edge-triggered per occupant: on entering a hazard,
    /// and again when a hazard it is standing in switches on.
    fn plan_hazards(
        &mut self,
        pilot: &Autopilot,
        orchestrator: &GameplayOrchestrator,
        position: Vec2Fixed,
        inputs: &mut Vec<InputSignal>,
    ) {
        let mut occupants = vec![(HazardOccupant::Player, position)];
        occupants.extend(
            orchestrator
                .enemies()
                .map(|e| (HazardOccupant::Target(TargetRef::Enemy(e.id)), e.position)),
        );
        if let Some(boss) = orchestrator.boss() {
            occupants.push((HazardOccupant::Target(TargetRef::Boss), boss.position()));
        }

        let mut now_overlapping = BTreeMap::new();
        for hazard in orchestrator.hazards().hazards() {
            let radius = pilot.hazard_radius * hazard.scale();
            let active = hazard.is_active();
            for &(occupant, at) in &occupants {
                if !hazard.position().within_range(at, radius) {
                    continue;
                }
                let key = (hazard.id, occupant);
                let was_active = self.overlapping.get(&key).copied().unwrap_or(false);
                if active && !was_active {
                    inputs.push(InputSignal::HazardOverlap {
                        hazard_id: hazard.id,
                        occupant,
                    });
                }
                now_overlapping.insert(key, active);
            }
        }
        self.overlapping = now_overlapping;
    }

    fn next_gesture(
        &mut self,
        pilot: &Autopilot,
        orchestrator: &GameplayOrchestrator,
        target: Option<&Target>,
    ) -> Option<InputSignal> {
        let player = orchestrator.player();
        if pilot.heal_below_percent > 0 && player.health_percent() < pilot.heal_below_percent {
            return Some(InputSignal::Gesture {
                shape: Shape::Square,
                target: None,
            });
        }
        if pilot.gesture_rotation.is_empty() {
            return None;
        }
        let shape = pilot.gesture_rotation[self.gesture_cursor % pilot.gesture_rotation.len()];
        self.gesture_cursor += 1;
        Some(InputSignal::Gesture {
            shape,
            target: target.map(|t| t.target),
        })
    }
}

/// Closest live enemy or boss; ties go to the lowest enemy id.
fn nearest_target(orchestrator: &GameplayOrchestrator, from: Vec2Fixed) -> Option<Target> {
    let mut best: Option<Target> = None;
    let mut consider = |target: TargetRef, position: Vec2Fixed| {
        let distance = position.distance(from);
        if best.as_ref().map_or(true, |b| distance < b.distance) {
            best = Some(Target {
                target,
                position,
                distance,
            });
        }
    };

    for enemy in orchestrator.enemies() {
        consider(TargetRef::Enemy(enemy.id), enemy.position);
    }
    if let Some(boss) = orchestrator.boss().filter(|b| !b.is_defeated()) {
        consider(TargetRef::Boss, boss.position());
    }
    best
}

fn step_toward(
    pilot: &Autopilot,
    orchestrator: &GameplayOrchestrator,
    position: Vec2Fixed,
    target: Option<&Target>,
    delta_ms: u32,
) -> Option<Vec2Fixed> {
    let target = target?;
    let direction = match pilot.stance {
        Stance::Hold => return None,
        Stance::Engage if target.distance > pilot.melee_reach * Fixed::from_num(3) / Fixed::from_num(4) => {
            position.direction_to(target.position)
        }
        Stance::Kite if target.distance < pilot.kite_distance => target.position.direction_to(position),
        Stance::Engage | Stance::Kite => return None,
    };
    if direction.is_zero() {
        return None;
    }

    let speed = pilot.move_speed * orchestrator.player().status.speed_multiplier;
    let step = per_second(speed, delta_ms);
    if step <= Fixed::ZERO {
        return None;
    }
    let next = orchestrator.bounds().clamp(position + direction.scale(step));

    if pilot.avoid_hazards && hazard_at(pilot, orchestrator, next).is_some() {
        return None;
    }
    (next != position).then_some(next)
}

fn hazard_at(pilot: &Autopilot, orchestrator: &GameplayOrchestrator, position: Vec2Fixed) -> Option<u32> {
    orchestrator
        .hazards()
        .hazards()
        .iter()
        .find(|h| h.is_active() && h.position().within_range(position, pilot.hazard_radius * h.scale()))
        .map(|h| h.id)
}
