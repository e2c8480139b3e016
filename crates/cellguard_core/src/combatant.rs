//! Shared stat container for the player, enemies and bosses.
//!
//! Health and energy are clamped on every mutation, so
//! `0 <= health <= max_health` and `0 <= energy <= max_energy` hold for
//! every sequence of calls. A combatant at zero health is dead and
//! ignores further damage and healing.

use serde::{Deserialize, Serialize};

use crate::math::{fixed_serde, scale_u32, Fixed};

/// Status flags driven by active effects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Status {
    /// Incoming damage is ignored while set.
    pub shielded: bool,
    /// Actions are rejected while set.
    pub stunned: bool,
    /// Movement speed multiplier (1.0 = normal, 0 = frozen).
    #[serde(with = "fixed_serde")]
    pub speed_multiplier: Fixed,
}

impl Default for Status {
    fn default() -> Self {
        Self {
            shielded: false,
            stunned: false,
            speed_multiplier: Fixed::ONE,
        }
    }
}

/// Health, energy and combat stats for one entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Combatant {
    health: u32,
    max_health: u32,
    energy: u32,
    max_energy: u32,
    /// Base attack power.
    pub attack_power: u32,
    /// Flat damage reduction.
    pub defense: u32,
    /// Effect-driven status flags.
    pub status: Status,
}

impl Combatant {
    /// Create a combatant at full health and energy.
    #[must_use]
    pub fn new(max_health: u32, max_energy: u32, attack_power: u32, defense: u32) -> Self {
        Self {
            health: max_health,
            max_health,
            energy: max_energy,
            max_energy,
            attack_power,
            defense,
            status: Status::default(),
        }
    }

    /// Current health.
    #[must_use]
    pub const fn health(&self) -> u32 {
        self.health
    }

    /// Maximum health.
    #[must_use]
    pub const fn max_health(&self) -> u32 {
        self.max_health
    }

    /// Current energy.
    #[must_use]
    pub const fn energy(&self) -> u32 {
        self.energy
    }

    /// Maximum energy.
    #[must_use]
    pub const fn max_energy(&self) -> u32 {
        self.max_energy
    }

    /// Check if the combatant is alive (health > 0).
    #[must_use]
    pub const fn is_alive(&self) -> bool {
        self.health > 0
    }

    /// Check if the combatant is dead (health == 0).
    #[must_use]
    pub const fn is_dead(&self) -> bool {
        self.health == 0
    }

    /// Health as an integer percentage (0-100), rounded down.
    #[must_use]
    pub fn health_percent(&self) -> u32 {
        if self.max_health == 0 {
            0
        } else {
            ((u64::from(self.health) * 100) / u64::from(self.max_health)) as u32
        }
    }

    /// Exact test for `health / max_health <= percent / 100`.
    ///
    /// Avoids the rounding of [`health_percent`](Self::health_percent) so
    /// threshold checks never fire early.
    #[must_use]
    pub fn health_at_or_below_percent(&self, percent: u32) -> bool {
        u64::from(self.health) * 100 <= u64::from(self.max_health) * u64::from(percent)
    }

    /// Subtract already-mitigated damage, returning the amount removed.
    ///
    /// Dead combatants take nothing.
    pub fn take_damage(&mut self, amount: u32) -> u32 {
        if self.is_dead() {
            return 0;
        }
        let actual = amount.min(self.health);
        self.health -= actual;
        actual
    }

    /// Heal up to max health, returning the amount actually restored.
    ///
    /// Dead combatants cannot be healed.
    pub fn heal(&mut self, amount: u32) -> u32 {
        if self.is_dead() {
            return 0;
        }
        let actual = amount.min(self.max_health - self.health);
        self.health += actual;
        actual
    }

    /// Spend energy if enough is available.
    ///
    /// Returns `false` and leaves energy unchanged otherwise.
    pub fn spend_energy(&mut self, cost: u32) -> bool {
        if self.energy < cost {
            return false;
        }
        self.energy -= cost;
        true
    }

    /// Restore energy up to max, returning the amount actually restored.
    pub fn restore_energy(&mut self, amount: u32) -> u32 {
        if self.is_dead() {
            return 0;
        }
        let actual = amount.min(self.max_energy - self.energy);
        self.energy += actual;
        actual
    }

    /// Multiply attack power by `factor`, rounding down.
    pub fn scale_attack_power(&mut self, factor: Fixed) {
        self.attack_power = scale_u32(self.attack_power, factor);
    }
}
