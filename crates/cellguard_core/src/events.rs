//! Gameplay events surfaced to the host.
//!
//! Subsystems push into an [`EventQueue`] owned by the orchestrator; the
//! host drains it once per frame and forwards events to scoring UI, audio
//! and anything else listening.

use serde::{Deserialize, Serialize};

use crate::effects::EffectKind;
use crate::hazard::{HazardEffectKind, HazardKind};
use crate::orchestrator::HazardOccupant;
use crate::powerups::PowerUpKind;
use crate::scoring::Achievement;

/// Something that happened during a tick.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum GameEvent {
    /// A wave began spawning.
    WaveStarted {
        /// Wave number (1-based).
        wave_number: u32,
    },
    /// An enemy entered play.
    EnemySpawned {
        /// Runtime id of the enemy.
        enemy_id: u32,
        /// Template id.
        spec_id: String,
    },
    /// An enemy was killed by the player.
    EnemyDefeated {
        /// Runtime id of the enemy.
        enemy_id: u32,
        /// Template id.
        spec_id: String,
        /// Points awarded after the combo multiplier.
        points: u32,
    },
    /// Every enemy of a wave has been spawned and cleared.
    WaveCompleted {
        /// Wave number (1-based).
        wave_number: u32,
        /// Whether the player took no damage during the wave.
        no_damage_taken: bool,
    },
    /// A boss encounter started.
    BossSpawned {
        /// Boss template id.
        boss_id: String,
        /// Number of phases in the encounter.
        phase_count: usize,
    },
    /// The boss entered a new phase.
    BossPhaseChanged {
        /// Index of the phase just entered.
        phase_index: usize,
    },
    /// The boss latched into enrage.
    BossEnraged,
    /// The boss was killed.
    BossDefeated {
        /// Boss template id.
        boss_id: String,
        /// Points awarded.
        points: u32,
    },
    /// The player lost health.
    PlayerDamaged {
        /// Health actually removed.
        amount: u32,
    },
    /// The player regained health.
    PlayerHealed {
        /// Health actually restored.
        amount: u32,
    },
    /// The player reached zero health.
    PlayerDefeated,
    /// A hazard switched on.
    HazardActivated {
        /// Hazard id within the field.
        hazard_id: u32,
    },
    /// A hazard hit a combatant standing in it.
    HazardTriggered {
        /// Hazard id within the field.
        hazard_id: u32,
        /// Who was hit.
        occupant: HazardOccupant,
        /// Thematic kind of the hazard.
        kind: HazardKind,
        /// Effect kind applied.
        effect: HazardEffectKind,
        /// Raw damage of the hazard.
        damage: u32,
    },
    /// A timed effect started (or was refreshed) on the player.
    EffectApplied {
        /// Effect kind.
        kind: EffectKind,
        /// Duration in milliseconds.
        duration_ms: u64,
    },
    /// A timed effect ran out on the player.
    EffectExpired {
        /// Effect kind.
        kind: EffectKind,
    },
    /// The player picked up a power-up.
    PowerUpCollected {
        /// Power-up kind.
        kind: PowerUpKind,
    },
    /// An achievement was unlocked for the first time.
    AchievementUnlocked {
        /// Which achievement.
        achievement: Achievement,
    },
}

/// FIFO buffer of events produced since the last drain.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct EventQueue {
    events: Vec<GameEvent>,
}

impl EventQueue {
    /// Create an empty queue.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Append an event.
    pub fn push(&mut self, event: GameEvent) {
        self.events.push(event);
    }

    /// Pending events, oldest first.
    #[must_use]
    pub fn pending(&self) -> &[GameEvent] {
        &self.events
    }

    /// Number of pending events.
    #[must_use]
    pub fn len(&self) -> usize {
        self.events.len()
    }

    /// Whether no events are pending.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.events.is_empty()
    }

    /// Take all pending events, leaving the queue empty.
    pub fn drain(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drain_preserves_order_and_empties() {
        let mut queue = EventQueue::new();
        queue.push(GameEvent::WaveStarted { wave_number: 1 });
        queue.push(GameEvent::PlayerDamaged { amount: 4 });
        assert_eq!(queue.len(), 2);

        let drained = queue.drain();
        assert_eq!(
            drained,
            vec![
                GameEvent::WaveStarted { wave_number: 1 },
                GameEvent::PlayerDamaged { amount: 4 },
            ]
        );
        assert!(queue.is_empty());
    }
}
