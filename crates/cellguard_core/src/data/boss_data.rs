//! Boss templates.

use serde::{Deserialize, Serialize};

use super::enemy_data::{check_stat_range, StatBlock};
use crate::boss::{BossPhase, BossTuning};
use crate::combatant::Combatant;
use crate::math::{decimal_serde, scale_u32, Fixed};

/// Boss template from zone configuration.
///
/// The phase table lists every phase the boss can have; earlier
/// encounters use a prefix of it (see [`BossData::phases_for`]).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BossData {
    /// Unique identifier.
    pub id: String,

    /// Localization key for the display name.
    pub display_name: String,

    /// Stats of the first encounter.
    pub stats: StatBlock,

    /// Phase table, thresholds strictly decreasing.
    pub phases: Vec<BossPhase>,

    /// Points awarded on kill.
    pub points: u32,

    /// Health percentage at which the boss enrages.
    #[serde(default = "default_enrage_threshold")]
    pub enrage_threshold_percent: u32,

    /// Extra health per subsequent encounter (0.25 = +25% each).
    #[serde(with = "decimal_serde", default = "default_health_growth")]
    pub health_growth: Fixed,
}

const fn default_enrage_threshold() -> u32 {
    crate::boss::DEFAULT_ENRAGE_THRESHOLD
}

fn default_health_growth() -> Fixed {
    Fixed::from_num(0.25)
}

impl BossData {
    /// Phases used by the `encounter`th boss (0-based): one more per
    /// encounter, starting from two, capped at the table length.
    #[must_use]
    pub fn phases_for(&self, encounter: u32) -> Vec<BossPhase> {
        let count = (encounter as usize + 2).min(self.phases.len());
        self.phases[..count].to_vec()
    }

    /// Stat block for the `encounter`th boss (0-based), health scaled up.
    #[must_use]
    pub fn combatant_for(&self, encounter: u32) -> Combatant {
        let growth = Fixed::ONE.saturating_add(self.health_growth.saturating_mul_int(i64::from(encounter)));
        let health = scale_u32(self.stats.health, growth).max(1);
        Combatant::new(health, self.stats.energy, self.stats.attack_power, self.stats.defense)
    }

    /// Boss tuning with this template's enrage threshold.
    #[must_use]
    pub fn tuning(&self) -> BossTuning {
        BossTuning {
            enrage_threshold_percent: self.enrage_threshold_percent,
            ..BossTuning::default()
        }
    }

    /// Problems with this template.
    #[must_use]
    pub fn validate(&self) -> Vec<String> {
        let mut errors = Vec::new();
        if self.stats.health == 0 {
            errors.push(format!("Boss '{}' has zero health", self.id));
        }
        if self.phases.is_empty() {
            errors.push(format!("Boss '{}' has no phases", self.id));
        }
        let owner = format!("Boss '{}'", self.id);
        errors.extend(self.stats.validate(&owner));
        errors.extend(check_stat_range(&owner, "points", self.points));
        for pattern in self.phases.iter().flat_map(|p| &p.attack_patterns) {
            errors.extend(check_stat_range(&owner, &format!("pattern '{}' damage", pattern.id), pattern.damage));
        }
        if self.enrage_threshold_percent > 100 {
            errors.push(format!("Boss '{}' enrage threshold above 100%", self.id));
        }
        let mut previous: Option<u32> = None;
        for phase in &self.phases {
            if phase.health_threshold_percent > 100 {
                errors.push(format!(
                    "Boss '{}' phase '{}' threshold above 100%",
                    self.id, phase.id
                ));
            }
            if let Some(prev) = previous {
                if phase.health_threshold_percent >= prev {
                    errors.push(format!(
                        "Boss '{}' phase '{}' threshold {} is not below previous {}",
                        self.id, phase.id, phase.health_threshold_percent, prev
                    ));
                }
            }
            previous = Some(phase.health_threshold_percent);
        }
        errors
    }
}
