//! Per-enemy behavior selection.
//!
//! An [`EnemyAiAgent`] turns "where am I, where is my target" into a
//! velocity and an attack-ready flag. It never applies damage itself;
//! the orchestrator reads `attack_ready` and routes it through the
//! combat resolver.

use serde::{Deserialize, Serialize};

use crate::math::{decimal_serde, Fixed, Vec2Fixed, WorldBounds};

/// Movement and attack behavior, fixed per enemy at spawn.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum BehaviorKind {
    /// Oscillate along x; never attacks.
    Patrol,
    /// Close to melee range and strike.
    Chase,
    /// Hold a distance band and fire.
    Ranged,
}

/// What the agent decided to do this tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AiState {
    /// Wandering along x (patrol, or no target).
    Patrolling,
    /// Closing distance.
    Chasing,
    /// Backing away to regain range.
    Retreating,
    /// In position, waiting on cooldown.
    Holding,
    /// In position and attacking this tick.
    Attacking,
}

/// Tuning for one agent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AiProfile {
    /// Behavior kind.
    pub behavior: BehaviorKind,
    /// Movement speed in units per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,
    /// Maximum distance at which an attack lands.
    #[serde(with = "decimal_serde")]
    pub attack_range: Fixed,
    /// Preferred distance for ranged agents.
    #[serde(with = "decimal_serde")]
    pub optimal_range: Fixed,
    /// Time between attacks.
    pub attack_cooldown_ms: u64,
}

/// Output of one AI tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct AiDecision {
    /// Desired velocity in units per second.
    pub velocity: Vec2Fixed,
    /// The agent wants to attack its target now.
    pub attack_ready: bool,
    /// Behavior state chosen this tick.
    pub state: AiState,
}

/// Behavior state for one enemy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EnemyAiAgent {
    profile: AiProfile,
    cooldown_remaining_ms: u64,
    patrol_sign: i32,
    state: AiState,
}

impl EnemyAiAgent {
    /// Create an agent that starts patrolling with its attack ready.
    #[must_use]
    pub const fn new(profile: AiProfile) -> Self {
        Self {
            profile,
            cooldown_remaining_ms: 0,
            patrol_sign: 1,
            state: AiState::Patrolling,
        }
    }

    /// The agent's tuning.
    #[must_use]
    pub const fn profile(&self) -> &AiProfile {
        &self.profile
    }

    /// State chosen on the last update.
    #[must_use]
    pub const fn state(&self) -> AiState {
        self.state
    }

    /// Whether the attack cooldown has elapsed.
    #[must_use]
    pub const fn attack_off_cooldown(&self) -> bool {
        self.cooldown_remaining_ms == 0
    }

    /// Consume the attack if it is off cooldown.
    ///
    /// Used for contact damage, which shares the attack cooldown.
    pub fn try_consume_attack(&mut self) -> bool {
        if self.attack_off_cooldown() {
            self.cooldown_remaining_ms = self.profile.attack_cooldown_ms;
            true
        } else {
            false
        }
    }

    /// Decide movement and attack readiness for this tick.
    pub fn update(
        &mut self,
        position: Vec2Fixed,
        target: Option<Vec2Fixed>,
        delta_ms: u32,
        bounds: &WorldBounds,
    ) -> AiDecision {
        self.cooldown_remaining_ms = self.cooldown_remaining_ms.saturating_sub(u64::from(delta_ms));

        let decision = match (self.profile.behavior, target) {
            (BehaviorKind::Patrol, _) | (_, None) => self.patrol(position, bounds),
            (BehaviorKind::Chase, Some(target)) => self.chase(position, target),
            (BehaviorKind::Ranged, Some(target)) => self.ranged(position, target),
        };
        self.state = decision.state;
        decision
    }

    fn patrol(&mut self, position: Vec2Fixed, bounds: &WorldBounds) -> AiDecision {
        if position.x <= bounds.min.x {
            self.patrol_sign = 1;
        } else if position.x >= bounds.max.x {
            self.patrol_sign = -1;
        }
        let vx = self.profile.speed * Fixed::from_num(self.patrol_sign);
        AiDecision {
            velocity: Vec2Fixed::new(vx, Fixed::ZERO),
            attack_ready: false,
            state: AiState::Patrolling,
        }
    }

    fn chase(&mut self, position: Vec2Fixed, target: Vec2Fixed) -> AiDecision {
        if !position.within_range(target, self.profile.attack_range) {
            return AiDecision {
                velocity: position.direction_to(target).scale(self.profile.speed),
                attack_ready: false,
                state: AiState::Chasing,
            };
        }
        self.hold_and_attack()
    }

    fn ranged(&mut self, position: Vec2Fixed, target: Vec2Fixed) -> AiDecision {
        let direction = position.direction_to(target);
        if !position.within_range(target, self.profile.attack_range) {
            return AiDecision {
                velocity: direction.scale(self.profile.speed),
                attack_ready: false,
                state: AiState::Chasing,
            };
        }
        if !position.within_range(target, self.profile.optimal_range)
            || self.profile.optimal_range <= Fixed::ZERO
        {
            return self.hold_and_attack();
        }
        // Inside optimal range: back off unless already exactly on it.
        if position.distance_squared(target)
            < self.profile.optimal_range.saturating_mul(self.profile.optimal_range)
        {
            return AiDecision {
                velocity: direction.scale(-self.profile.speed),
                attack_ready: false,
                state: AiState::Retreating,
            };
        }
        self.hold_and_attack()
    }

    fn hold_and_attack(&mut self) -> AiDecision {
        let attack_ready = self.try_consume_attack();
        AiDecision {
            velocity: Vec2Fixed::ZERO,
            attack_ready,
            state: if attack_ready {
                AiState::Attacking
            } else {
                AiState::Holding
            },
        }
    }
}
