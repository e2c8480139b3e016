//! Zone definitions: the top-level configuration for one themed area.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use super::boss_data::BossData;
use super::enemy_data::{EnemySpec, StatBlock};
use super::hazard_data::HazardData;
use crate::error::{GameError, Result};
use crate::math::{decimal_serde, Fixed, WorldBounds};
use crate::wave::WaveDifficulty;

/// Complete zone definition.
///
/// Loaded from a RON file by the host; the kernel never reads files.
///
/// # Example RON
///
/// ```ron
/// ZoneData(
///     id: "bloodstream",
///     display_name: "zone.bloodstream.name",
///     difficulty: WaveDifficulty(enemy_count: 1.0, spawn_interval: 1.0, max_enemies: 1.0),
///     enemies: [...],
///     hazards: [...],
///     boss: Some(BossData(...)),
/// )
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ZoneData {
    /// Unique identifier.
    pub id: String,

    /// Localization key for the display name.
    pub display_name: String,

    /// Wave difficulty multipliers.
    #[serde(default)]
    pub difficulty: WaveDifficulty,

    /// Playfield size.
    #[serde(default)]
    pub world: WorldData,

    /// Player stats for this zone.
    #[serde(default)]
    pub player: PlayerData,

    /// Enemy table in declaration order.
    pub enemies: Vec<EnemySpec>,

    /// Hazards placed at zone start.
    #[serde(default)]
    pub hazards: Vec<HazardData>,

    /// Boss fought every fifth wave.
    #[serde(default)]
    pub boss: Option<BossData>,
}

/// Playfield dimensions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorldData {
    /// Width in world units.
    #[serde(with = "decimal_serde")]
    pub width: Fixed,

    /// Height in world units.
    #[serde(with = "decimal_serde")]
    pub height: Fixed,
}

impl Default for WorldData {
    fn default() -> Self {
        Self {
            width: Fixed::from_num(800),
            height: Fixed::from_num(600),
        }
    }
}

/// Player configuration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerData {
    /// Base stats.
    #[serde(default = "default_player_stats")]
    pub stats: StatBlock,

    /// Energy regained per second.
    #[serde(default = "default_energy_regen")]
    pub energy_regen_per_second: u32,
}

fn default_player_stats() -> StatBlock {
    StatBlock {
        health: 100,
        energy: 100,
        attack_power: 20,
        defense: 5,
    }
}

const fn default_energy_regen() -> u32 {
    5
}

impl Default for PlayerData {
    fn default() -> Self {
        Self {
            stats: default_player_stats(),
            energy_regen_per_second: default_energy_regen(),
        }
    }
}

impl ZoneData {
    /// Parse a zone from RON text.
    ///
    /// `source_name` labels errors (usually the file name).
    pub fn from_ron_str(source_name: &str, text: &str) -> Result<Self> {
        ron::from_str(text).map_err(|e| GameError::DataParseError {
            source_name: source_name.to_string(),
            message: e.to_string(),
        })
    }

    /// Parse and validate, failing on any problem.
    pub fn from_ron_str_strict(source_name: &str, text: &str) -> Result<Self> {
        let zone = Self::from_ron_str(source_name, text)?;
        let problems = zone.validate();
        if problems.is_empty() {
            Ok(zone)
        } else {
            Err(GameError::InvalidZone {
                zone: zone.id,
                problems,
            })
        }
    }

    /// Playfield bounds.
    #[must_use]
    pub fn bounds(&self) -> WorldBounds {
        WorldBounds::from_size(self.world.width, self.world.height)
    }

    /// Find an enemy template by id.
    #[must_use]
    pub fn get_enemy(&self, id: &str) -> Option<&EnemySpec> {
        self.enemies.iter().find(|e| e.id == id)
    }

    /// Spawn weights in declaration order.
    #[must_use]
    pub fn spawn_weights(&self) -> Vec<Fixed> {
        self.enemies.iter().map(|e| e.spawn_weight).collect()
    }

    /// Validate internal consistency.
    ///
    /// Checks for:
    /// - Duplicate or empty enemy ids
    /// - Negative weights and no spawnable enemy
    /// - Ranged bands with `optimal_range > attack_range`
    /// - Boss thresholds that are not strictly decreasing
    /// - Non-positive world size and difficulty multipliers
    ///
    /// Returns a list of validation errors. The runtime degrades on these
    /// instead of failing.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();

        if self.id.is_empty() {
            errors.push("Zone has an empty id".to_string());
        }
        if self.world.width <= Fixed::ZERO || self.world.height <= Fixed::ZERO {
            errors.push(format!("Zone '{}' has a non-positive world size", self.id));
        }
        if self.player.stats.health == 0 {
            errors.push(format!("Zone '{}' player has zero health", self.id));
        }
        errors.extend(self.player.stats.validate(&format!("Zone '{}' player", self.id)));

        let multipliers = [
            ("enemy_count", self.difficulty.enemy_count),
            ("spawn_interval", self.difficulty.spawn_interval),
            ("max_enemies", self.difficulty.max_enemies),
        ];
        for (name, value) in multipliers {
            if value <= Fixed::ZERO {
                errors.push(format!(
                    "Zone '{}' difficulty multiplier '{name}' must be positive",
                    self.id
                ));
            }
        }

        let mut seen = HashSet::new();
        for enemy in &self.enemies {
            if !seen.insert(enemy.id.as_str()) {
                errors.push(format!("Duplicate enemy id '{}'", enemy.id));
            }
            errors.extend(enemy.validate());
        }
        if !self.enemies.iter().any(|e| e.spawn_weight > Fixed::ZERO) {
            errors.push(format!("Zone '{}' has no enemy with a positive spawn weight", self.id));
        }

        for (index, hazard) in self.hazards.iter().enumerate() {
            errors.extend(hazard.validate(index));
        }

        if let Some(boss) = &self.boss {
            errors.extend(boss.validate());
        }

        errors
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        ZoneData(
            id: "test",
            display_name: "zone.test.name",
            enemies: [
                EnemySpec(
                    id: "virus",
                    display_name: "enemy.virus.name",
                    stats: StatBlock(health: 30, attack_power: 6),
                    behavior: Chase,
                    speed: 70.0,
                    spawn_weight: 1.0,
                    points: 10,
                ),
            ],
        )
    "#;

    #[test]
    fn test_defaults_fill_missing_sections() {
        let zone = ZoneData::from_ron_str("minimal.ron", MINIMAL).unwrap();
        assert_eq!(zone.difficulty, WaveDifficulty::default());
        assert_eq!(zone.player.stats.health, 100);
        assert_eq!(zone.bounds(), WorldBounds::default());
        assert!(zone.hazards.is_empty());
        assert!(zone.boss.is_none());
        assert!(zone.validate().is_empty());
    }

    #[test]
    fn test_parse_error_names_source() {
        let err = ZoneData::from_ron_str("broken.ron", "ZoneData(").unwrap_err();
        assert!(matches!(err, GameError::DataParseError { ref source_name, .. } if source_name == "broken.ron"));
    }

    #[test]
    fn test_duplicate_ids_reported() {
        let mut zone = ZoneData::from_ron_str("minimal.ron", MINIMAL).unwrap();
        zone.enemies.push(zone.enemies[0].clone());
        let errors = zone.validate();
        assert!(errors.iter().any(|e| e.contains("Duplicate enemy id 'virus'")));
    }

    #[test]
    fn test_strict_rejects_invalid() {
        let text = MINIMAL.replace("spawn_weight: 1.0", "spawn_weight: 0.0");
        let err = ZoneData::from_ron_str_strict("zero.ron", &text).unwrap_err();
        assert!(matches!(err, GameError::InvalidZone { .. }));
    }
}
