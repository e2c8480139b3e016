//! Hazard placements.

use serde::{Deserialize, Serialize};

use crate::hazard::{HazardEffectKind, HazardKind, HazardPattern, HazardSpec};
use crate::math::{decimal_serde, Fixed, Vec2Fixed};

/// One hazard placed in a zone.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HazardData {
    /// Thematic kind.
    pub kind: HazardKind,

    /// Spawn x.
    #[serde(with = "decimal_serde")]
    pub x: Fixed,

    /// Spawn y.
    #[serde(with = "decimal_serde")]
    pub y: Fixed,

    /// Damage on contact.
    pub damage: u32,

    /// Length of each active window.
    #[serde(default = "default_active_duration_ms")]
    pub active_duration_ms: u64,

    /// Gap between windows; 0 keeps the hazard always active.
    #[serde(default)]
    pub cooldown_ms: u64,

    /// Movement pattern.
    #[serde(default = "default_pattern")]
    pub pattern: HazardPattern,

    /// Effect applied on contact.
    #[serde(default = "default_effect")]
    pub effect: HazardEffectKind,

    /// Lingering effect length.
    #[serde(default)]
    pub effect_duration_ms: u64,

    /// Lingering effect strength.
    #[serde(with = "decimal_serde", default = "default_effect_magnitude")]
    pub effect_magnitude: Fixed,
}

const fn default_active_duration_ms() -> u64 {
    1000
}

const fn default_pattern() -> HazardPattern {
    HazardPattern::Static
}

const fn default_effect() -> HazardEffectKind {
    HazardEffectKind::Damage
}

fn default_effect_magnitude() -> Fixed {
    Fixed::ONE
}

impl HazardData {
    /// Runtime placement for this hazard.
    #[must_use]
    pub fn to_spec(&self) -> HazardSpec {
        HazardSpec {
            kind: self.kind,
            position: Vec2Fixed::new(self.x, self.y),
            damage: self.damage,
            active_duration_ms: self.active_duration_ms,
            cooldown_ms: self.cooldown_ms,
            pattern: self.pattern,
            effect: self.effect,
            effect_duration_ms: self.effect_duration_ms,
            effect_magnitude: self.effect_magnitude,
        }
    }

    /// Problems with this placement.
    #[must_use]
    pub fn validate(&self, index: usize) -> Vec<String> {
        let mut errors = Vec::new();
        if self.cooldown_ms > 0 && self.active_duration_ms == 0 {
            errors.push(format!(
                "Hazard #{index} ({:?}) cycles but has a zero active duration",
                self.kind
            ));
        }
        if self.effect.lingering_effect().is_some() && self.effect_duration_ms == 0 {
            errors.push(format!(
                "Hazard #{index} ({:?}) has a {:?} effect with zero duration",
                self.kind, self.effect
            ));
        }
        if let HazardPattern::Pulsing {
            min_scale, max_scale, ..
        } = self.pattern
        {
            if min_scale > max_scale {
                errors.push(format!("Hazard #{index} ({:?}) has min_scale > max_scale", self.kind));
            }
        }
        errors
    }
}
