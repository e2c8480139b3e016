//! Collectible power-ups.

use serde::{Deserialize, Serialize};

use crate::effects::{ActiveEffect, EffectKind};
use crate::math::{ratio, Fixed};

/// Points awarded per pickup.
pub const POWER_UP_POINTS: u32 = 10;

/// Kind of power-up.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PowerUpKind {
    /// Restores 30 health.
    Health,
    /// Restores 40 energy.
    Energy,
    /// 5 seconds of shield.
    Shield,
    /// +50% attack power for 8 seconds.
    DamageBoost,
    /// +50% speed for 6 seconds.
    SpeedBoost,
}

/// What a power-up does when collected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PowerUpGrant {
    /// Instant heal.
    Heal(u32),
    /// Instant energy.
    Energy(u32),
    /// Timed effect starting at pickup.
    Effect(ActiveEffect),
}

impl PowerUpKind {
    /// The grant for this power-up collected at `now_ms`.
    #[must_use]
    pub fn grant(self, now_ms: u64) -> PowerUpGrant {
        match self {
            Self::Health => PowerUpGrant::Heal(30),
            Self::Energy => PowerUpGrant::Energy(40),
            Self::Shield => PowerUpGrant::Effect(ActiveEffect::new(EffectKind::Shield, Fixed::ONE, now_ms, 5000)),
            Self::DamageBoost => {
                PowerUpGrant::Effect(ActiveEffect::new(EffectKind::DamageBoost, ratio(3, 2), now_ms, 8000))
            }
            Self::SpeedBoost => {
                PowerUpGrant::Effect(ActiveEffect::new(EffectKind::SpeedBoost, ratio(3, 2), now_ms, 6000))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_timed_powerups_start_at_pickup() {
        match PowerUpKind::DamageBoost.grant(1234) {
            PowerUpGrant::Effect(effect) => {
                assert_eq!(effect.kind, EffectKind::DamageBoost);
                assert_eq!(effect.start_ms, 1234);
                assert_eq!(effect.duration_ms, 8000);
            }
            other => panic!("unexpected grant {other:?}"),
        }
        assert_eq!(PowerUpKind::Health.grant(0), PowerUpGrant::Heal(30));
    }
}
