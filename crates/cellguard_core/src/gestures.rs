//! Mapping from recognized gesture shapes to combat actions.
//!
//! Shape recognition happens outside the kernel; this table decides what
//! a recognized shape does and what it costs.

use serde::{Deserialize, Serialize};

/// Shape reported by the host's gesture recognizer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Shape {
    /// Straight stroke.
    Line,
    /// Closed loop.
    Circle,
    /// Three-cornered stroke.
    Triangle,
    /// Four-cornered stroke.
    Square,
    /// Back-and-forth stroke.
    Zigzag,
    /// Anything the recognizer could not classify.
    Unknown,
}

/// What a gesture does.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureAction {
    /// Basic attack on one target.
    Slash,
    /// Timed shield on the player.
    Shield {
        /// Shield length.
        duration_ms: u64,
    },
    /// Special attack on one target.
    Pierce,
    /// Instant self-heal.
    Heal {
        /// Health restored.
        amount: u32,
    },
    /// Special attack on every enemy and the boss.
    ChainLightning,
}

impl GestureAction {
    /// Whether the action needs a target to be useful.
    #[must_use]
    pub const fn needs_target(self) -> bool {
        matches!(self, Self::Slash | Self::Pierce)
    }
}

/// A table entry: action plus energy cost.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct GestureBinding {
    /// What the gesture does.
    pub action: GestureAction,
    /// Energy spent on use.
    pub energy_cost: u32,
}

/// Why a gesture did nothing.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GestureRejection {
    /// The shape maps to no action.
    Unrecognized,
    /// Not enough energy.
    InsufficientEnergy,
    /// A targeted action was drawn with no live target.
    NoTarget,
    /// The player is stunned.
    Stunned,
    /// The player is dead.
    PlayerDefeated,
}

/// Result of handling a gesture.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GestureOutcome {
    /// The action ran.
    Performed {
        /// Action performed.
        action: GestureAction,
        /// Total health removed from targets.
        damage_dealt: u32,
        /// Number of targets hit.
        targets_hit: u32,
    },
    /// Nothing happened.
    Rejected(GestureRejection),
}

/// Look up the binding for a shape.
#[must_use]
pub const fn binding_for(shape: Shape) -> Option<GestureBinding> {
    let binding = match shape {
        Shape::Line => GestureBinding {
            action: GestureAction::Slash,
            energy_cost: 0,
        },
        Shape::Circle => GestureBinding {
            action: GestureAction::Shield { duration_ms: 3000 },
            energy_cost: 15,
        },
        Shape::Triangle => GestureBinding {
            action: GestureAction::Pierce,
            energy_cost: 25,
        },
        Shape::Square => GestureBinding {
            action: GestureAction::Heal { amount: 25 },
            energy_cost: 20,
        },
        Shape::Zigzag => GestureBinding {
            action: GestureAction::ChainLightning,
            energy_cost: 40,
        },
        Shape::Unknown => return None,
    };
    Some(binding)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table() {
        assert_eq!(binding_for(Shape::Line).map(|b| b.energy_cost), Some(0));
        assert_eq!(
            binding_for(Shape::Circle).map(|b| b.action),
            Some(GestureAction::Shield { duration_ms: 3000 })
        );
        assert_eq!(binding_for(Shape::Zigzag).map(|b| b.energy_cost), Some(40));
        assert_eq!(binding_for(Shape::Unknown), None);
    }

    #[test]
    fn test_needs_target() {
        assert!(GestureAction::Slash.needs_target());
        assert!(GestureAction::Pierce.needs_target());
        assert!(!GestureAction::ChainLightning.needs_target());
        assert!(!GestureAction::Heal { amount: 1 }.needs_target());
    }
}
