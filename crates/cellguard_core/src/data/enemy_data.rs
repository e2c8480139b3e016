//! Enemy templates.

use serde::{Deserialize, Serialize};

use crate::ai::{AiProfile, BehaviorKind};
use crate::combatant::Combatant;
use crate::math::{decimal_serde, Fixed};

/// Base stats shared by players, enemies and bosses.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatBlock {
    /// Maximum health.
    pub health: u32,

    /// Maximum energy.
    #[serde(default)]
    pub energy: u32,

    /// Attack power.
    pub attack_power: u32,

    /// Flat damage reduction.
    #[serde(default)]
    pub defense: u32,
}

/// Largest authored stat, point or damage value. Simulation arithmetic
/// is 32.32 fixed-point, so anything above this cannot be scaled.
pub const MAX_STAT_VALUE: u32 = i32::MAX as u32;

impl StatBlock {
    /// A fresh combatant with these stats.
    #[must_use]
    pub fn to_combatant(&self) -> Combatant {
        Combatant::new(self.health, self.energy, self.attack_power, self.defense)
    }

    /// Problems with these stats, prefixed with `owner`.
    #[must_use]
    pub fn validate(&self, owner: &str) -> Vec<String> {
        [
            ("health", self.health),
            ("energy", self.energy),
            ("attack_power", self.attack_power),
            ("defense", self.defense),
        ]
        .into_iter()
        .filter_map(|(name, value)| check_stat_range(owner, name, value))
        .collect()
    }
}

/// An error message when `value` is above [`MAX_STAT_VALUE`].
pub(crate) fn check_stat_range(owner: &str, name: &str, value: u32) -> Option<String> {
    (value > MAX_STAT_VALUE).then(|| format!("{owner} {name} {value} exceeds {MAX_STAT_VALUE}"))
}

/// Static enemy template from zone configuration.
///
/// # Example RON
///
/// ```ron
/// EnemySpec(
///     id: "virus",
///     display_name: "enemy.virus.name",
///     stats: StatBlock(health: 30, attack_power: 6),
///     behavior: Chase,
///     speed: 70.0,
///     spawn_weight: 0.3,
///     points: 10,
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EnemySpec {
    /// Unique identifier within the zone.
    pub id: String,

    /// Localization key for the display name.
    pub display_name: String,

    /// Base stats.
    pub stats: StatBlock,

    /// Behavior kind, fixed at spawn.
    pub behavior: BehaviorKind,

    /// Movement speed in units per second.
    #[serde(with = "decimal_serde")]
    pub speed: Fixed,

    /// Maximum attack distance.
    #[serde(with = "decimal_serde", default = "default_attack_range")]
    pub attack_range: Fixed,

    /// Preferred distance for ranged enemies.
    #[serde(with = "decimal_serde", default = "default_optimal_range")]
    pub optimal_range: Fixed,

    /// Time between attacks.
    #[serde(default = "default_attack_cooldown_ms")]
    pub attack_cooldown_ms: u64,

    /// Relative spawn weight.
    #[serde(with = "decimal_serde")]
    pub spawn_weight: Fixed,

    /// Points awarded on kill.
    pub points: u32,
}

fn default_attack_range() -> Fixed {
    Fixed::from_num(30)
}

fn default_optimal_range() -> Fixed {
    Fixed::ZERO
}

const fn default_attack_cooldown_ms() -> u64 {
    1000
}

impl EnemySpec {
    /// AI tuning derived from this template.
    #[must_use]
    pub fn ai_profile(&self) -> AiProfile {
        AiProfile {
            behavior: self.behavior,
            speed: self.speed,
            attack_range: self.attack_range,
            optimal_range: self.optimal_range,
            attack_cooldown_ms: self.attack_cooldown_ms,
        }
    }

    /// Problems with this template, prefixed with its id.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.id.is_empty() {
            errors.push("Enemy has an empty id".to_string());
        }
        if self.stats.health == 0 {
            errors.push(format!("Enemy '{}' has zero health", self.id));
        }
        let owner = format!("Enemy '{}'", self.id);
        errors.extend(self.stats.validate(&owner));
        errors.extend(check_stat_range(&owner, "points", self.points));
        if self.spawn_weight < Fixed::ZERO {
            errors.push(format!("Enemy '{}' has negative spawn weight", self.id));
        }
        if self.speed < Fixed::ZERO {
            errors.push(format!("Enemy '{}' has negative speed", self.id));
        }
        if self.behavior == BehaviorKind::Ranged && self.optimal_range > self.attack_range {
            errors.push(format!(
                "Enemy '{}' has optimal_range greater than attack_range",
                self.id
            ));
        }
        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_defaults() {
        let spec: EnemySpec = ron::from_str(
            r#"EnemySpec(
                id: "virus",
                display_name: "enemy.virus.name",
                stats: StatBlock(health: 30, attack_power: 6),
                behavior: Chase,
                speed: 70.0,
                spawn_weight: 0.3,
                points: 10,
            )"#,
        )
        .unwrap();

        assert_eq!(spec.stats.defense, 0);
        assert_eq!(spec.attack_cooldown_ms, 1000);
        assert_eq!(spec.attack_range, Fixed::from_num(30));
        assert!(spec.validate().is_empty());
    }

    #[test]
    fn test_ranged_band_validation() {
        let mut spec: EnemySpec = ron::from_str(
            r#"EnemySpec(
                id: "fungus",
                display_name: "enemy.fungus.name",
                stats: StatBlock(health: 20, attack_power: 4),
                behavior: Ranged,
                speed: 40.0,
                attack_range: 120.0,
                optimal_range: 80.0,
                spawn_weight: 0.2,
                points: 15,
            )"#,
        )
        .unwrap();
        assert!(spec.validate().is_empty());

        spec.optimal_range = Fixed::from_num(200);
        assert_eq!(spec.validate().len(), 1);
    }

    #[test]
    fn test_stats_beyond_fixed_range_rejected() {
        let stats = StatBlock {
            health: 30,
            energy: 0,
            attack_power: 3_000_000_000,
            defense: MAX_STAT_VALUE,
        };
        let errors = stats.validate("Player");
        assert_eq!(errors.len(), 1);
        assert!(errors[0].starts_with("Player attack_power 3000000000"));
    }
}
