//! Session metrics collection for balance analysis.
//!
//! A [`MetricsCollector`] watches the event stream and gesture outcomes
//! of one session and produces a [`SessionMetrics`] record; a
//! [`BatchSummary`] aggregates many of them.

use std::collections::BTreeMap;

use cellguard_core::events::GameEvent;
use cellguard_core::gestures::GestureOutcome;
use cellguard_core::orchestrator::GameplayOrchestrator;
use cellguard_core::scoring::Achievement;
use serde::{Deserialize, Serialize};

/// How a session ended.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SessionOutcome {
    /// The player reached zero health.
    PlayerDefeated,
    /// The time limit ran out with the player alive.
    #[default]
    TimeLimit,
}

/// A notable moment in a session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Milestone {
    /// Game time in milliseconds.
    pub time_ms: u64,
    /// What happened.
    pub description: String,
}

/// Complete metrics for a single session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionMetrics {
    /// Unique session identifier.
    pub session_id: String,
    /// Zone id.
    pub zone: String,
    /// Autopilot profile name.
    pub autopilot: String,
    /// Session seed.
    pub seed: u64,
    /// How the session ended.
    pub outcome: SessionOutcome,
    /// Game time played.
    pub duration_ms: u64,
    /// Frames simulated.
    pub frames: u64,

    // === Progression ===
    /// Highest wave started.
    pub waves_reached: u32,
    /// Waves cleared.
    pub waves_cleared: u32,
    /// Waves cleared without taking damage.
    pub untouched_waves: u32,
    /// Enemies that entered play.
    pub enemies_spawned: u32,
    /// Enemies killed.
    pub enemies_defeated: u32,
    /// Boss encounters started.
    pub bosses_spawned: u32,
    /// Bosses killed.
    pub bosses_defeated: u32,
    /// Boss phase transitions seen.
    pub boss_phase_changes: u32,
    /// Times a boss enraged.
    pub boss_enrages: u32,

    // === Player ===
    /// Health lost.
    pub damage_taken: u64,
    /// Health restored.
    pub health_healed: u64,
    /// Health at the end.
    pub final_health: u32,
    /// Hazard hits.
    pub hazards_triggered: u32,
    /// Power-ups collected.
    pub power_ups_collected: u32,
    /// Gestures that went through.
    pub gestures_performed: u32,
    /// Rejected gestures by reason.
    pub gestures_rejected: BTreeMap<String, u32>,
    /// Longest combo.
    pub peak_combo: u32,

    // === Result ===
    /// Final score.
    pub final_score: u64,
    /// Achievements unlocked, in unlock order.
    pub achievements: Vec<Achievement>,
    /// Timeline of waves, bosses and achievements.
    pub milestones: Vec<Milestone>,
    /// Final orchestrator state hash (for determinism validation).
    pub final_state_hash: u64,
}

impl SessionMetrics {
    /// Create a new metrics record.
    #[must_use]
    pub fn new(session_id: impl Into<String>, zone: impl Into<String>, autopilot: impl Into<String>, seed: u64) -> Self {
        Self {
            session_id: session_id.into(),
            zone: zone.into(),
            autopilot: autopilot.into(),
            seed,
            ..Default::default()
        }
    }

    /// Whether the player was alive at the end.
    #[must_use]
    pub fn survived(&self) -> bool {
        self.outcome == SessionOutcome::TimeLimit
    }

    /// Serialize as pretty JSON.
    pub fn to_json(&self) -> serde_json::Result<String> {
        serde_json::to_string_pretty(self)
    }

    /// Write as pretty JSON.
    pub fn save(&self, path: &std::path::Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = self.to_json().map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }
}

/// Aggregate over a batch of sessions.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct BatchSummary {
    /// Sessions summarized.
    pub total_sessions: u32,
    /// Fraction of sessions that hit the time limit alive.
    pub survival_rate: f64,
    /// Mean highest wave.
    pub avg_waves_reached: f64,
    /// Best highest wave.
    pub max_wave_reached: u32,
    /// Mean final score.
    pub avg_score: f64,
    /// Mean session length.
    pub avg_duration_ms: f64,
    /// Mean kills.
    pub avg_enemies_defeated: f64,
    /// Bosses killed per boss spawned.
    pub boss_defeat_rate: f64,
    /// Wave the player died on -> sessions.
    pub deaths_by_wave: BTreeMap<u32, u32>,
    /// Achievement -> fraction of sessions that unlocked it.
    pub achievement_rates: BTreeMap<String, f64>,
}

impl BatchSummary {
    /// Summarize `sessions`.
    #[must_use]
    pub fn from_sessions(sessions: &[SessionMetrics]) -> Self {
        if sessions.is_empty() {
            return Self::default();
        }
        let n = sessions.len() as f64;
        let mean = |f: fn(&SessionMetrics) -> f64| sessions.iter().map(f).sum::<f64>() / n;

        let mut deaths_by_wave = BTreeMap::new();
        let mut achievement_counts: BTreeMap<String, u32> = BTreeMap::new();
        for session in sessions {
            if !session.survived() {
                *deaths_by_wave.entry(session.waves_reached).or_insert(0) += 1;
            }
            for achievement in &session.achievements {
                *achievement_counts.entry(format!("{achievement:?}")).or_insert(0) += 1;
            }
        }

        let bosses_spawned: u32 = sessions.iter().map(|s| s.bosses_spawned).sum();
        let bosses_defeated: u32 = sessions.iter().map(|s| s.bosses_defeated).sum();

        Self {
            total_sessions: sessions.len() as u32,
            survival_rate: mean(|s| if s.survived() { 1.0 } else { 0.0 }),
            avg_waves_reached: mean(|s| f64::from(s.waves_reached)),
            max_wave_reached: sessions.iter().map(|s| s.waves_reached).max().unwrap_or(0),
            avg_score: mean(|s| s.final_score as f64),
            avg_duration_ms: mean(|s| s.duration_ms as f64),
            avg_enemies_defeated: mean(|s| f64::from(s.enemies_defeated)),
            boss_defeat_rate: if bosses_spawned == 0 {
                0.0
            } else {
                f64::from(bosses_defeated) / f64::from(bosses_spawned)
            },
            deaths_by_wave,
            achievement_rates: achievement_counts
                .into_iter()
                .map(|(name, count)| (name, f64::from(count) / n))
                .collect(),
        }
    }

    /// Whether the survival rate falls inside `[min_rate, max_rate]`.
    #[must_use]
    pub fn is_balanced(&self, min_rate: f64, max_rate: f64) -> bool {
        self.survival_rate >= min_rate && self.survival_rate <= max_rate
    }

    /// Wave that killed the most players, if any died.
    #[must_use]
    pub fn deadliest_wave(&self) -> Option<u32> {
        self.deaths_by_wave
            .iter()
            .max_by_key(|(wave, count)| (**count, std::cmp::Reverse(**wave)))
            .map(|(wave, _)| *wave)
    }
}

/// Metrics collector that watches one session.
#[derive(Debug, Default)]
pub struct MetricsCollector {
    metrics: SessionMetrics,
    current_time_ms: u64,
}

impl MetricsCollector {
    /// Create a new metrics collector.
    #[must_use]
    pub fn new(session_id: &str, zone: &str, autopilot: &str, seed: u64) -> Self {
        Self {
            metrics: SessionMetrics::new(session_id, zone, autopilot, seed),
            current_time_ms: 0,
        }
    }

    /// Update the current game time.
    pub fn set_time(&mut self, time_ms: u64) {
        self.current_time_ms = time_ms;
    }

    fn milestone(&mut self, description: String) {
        self.metrics.milestones.push(Milestone {
            time_ms: self.current_time_ms,
            description,
        });
    }

    /// Record one drained event.
    pub fn on_event(&mut self, event: &GameEvent) {
        let m = &mut self.metrics;
        match event {
            GameEvent::WaveStarted { wave_number } => {
                m.waves_reached = m.waves_reached.max(*wave_number);
                self.milestone(format!("Wave {wave_number} started"));
            }
            GameEvent::WaveCompleted {
                wave_number,
                no_damage_taken,
            } => {
                m.waves_cleared += 1;
                if *no_damage_taken {
                    m.untouched_waves += 1;
                }
                self.milestone(format!("Wave {wave_number} cleared"));
            }
            GameEvent::EnemySpawned { .. } => m.enemies_spawned += 1,
            GameEvent::EnemyDefeated { .. } => m.enemies_defeated += 1,
            GameEvent::BossSpawned { boss_id, phase_count } => {
                m.bosses_spawned += 1;
                self.milestone(format!("Boss {boss_id} spawned with {phase_count} phases"));
            }
            GameEvent::BossPhaseChanged { phase_index } => {
                m.boss_phase_changes += 1;
                self.milestone(format!("Boss entered phase {phase_index}"));
            }
            GameEvent::BossEnraged => {
                m.boss_enrages += 1;
                self.milestone("Boss enraged".to_string());
            }
            GameEvent::BossDefeated { boss_id, .. } => {
                m.bosses_defeated += 1;
                self.milestone(format!("Boss {boss_id} defeated"));
            }
            GameEvent::PlayerDamaged { amount } => m.damage_taken += u64::from(*amount),
            GameEvent::PlayerHealed { amount } => m.health_healed += u64::from(*amount),
            GameEvent::PlayerDefeated => {
                m.outcome = SessionOutcome::PlayerDefeated;
                self.milestone("Player defeated".to_string());
            }
            GameEvent::HazardTriggered { .. } => m.hazards_triggered += 1,
            GameEvent::PowerUpCollected { .. } => m.power_ups_collected += 1,
            GameEvent::AchievementUnlocked { achievement } => {
                m.achievements.push(*achievement);
                self.milestone(format!("Achievement {achievement:?}"));
            }
            GameEvent::EffectApplied { .. } | GameEvent::EffectExpired { .. } | GameEvent::HazardActivated { .. } => {}
        }
    }

    /// Record a gesture result.
    pub fn on_gesture(&mut self, outcome: &GestureOutcome) {
        match outcome {
            GestureOutcome::Performed { .. } => self.metrics.gestures_performed += 1,
            GestureOutcome::Rejected(reason) => {
                *self.metrics.gestures_rejected.entry(format!("{reason:?}")).or_insert(0) += 1;
            }
        }
    }

    /// Finalize from the session's end state.
    #[must_use]
    pub fn finalize(mut self, orchestrator: &GameplayOrchestrator, frames: u64) -> SessionMetrics {
        let m = &mut self.metrics;
        m.duration_ms = orchestrator.game_time_ms();
        m.frames = frames;
        m.final_health = orchestrator.player().health();
        m.final_score = orchestrator.score().score;
        m.peak_combo = orchestrator.combo().max_combo_seen;
        m.final_state_hash = orchestrator.state_hash();
        if orchestrator.is_game_over() {
            m.outcome = SessionOutcome::PlayerDefeated;
        }
        self.metrics
    }

    /// Metrics so far.
    #[must_use]
    pub fn current(&self) -> &SessionMetrics {
        &self.metrics
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellguard_core::gestures::{GestureAction, GestureRejection};

    fn session(waves: u32, survived: bool, achievements: Vec<Achievement>) -> SessionMetrics {
        SessionMetrics {
            waves_reached: waves,
            outcome: if survived {
                SessionOutcome::TimeLimit
            } else {
                SessionOutcome::PlayerDefeated
            },
            final_score: u64::from(waves) * 100,
            achievements,
            ..SessionMetrics::new("s", "zone", "balanced", 0)
        }
    }

    #[test]
    fn test_collector_counts_events() {
        let mut collector = MetricsCollector::new("s", "zone", "balanced", 1);
        collector.on_event(&GameEvent::WaveStarted { wave_number: 1 });
        collector.set_time(5000);
        collector.on_event(&GameEvent::PlayerDamaged { amount: 7 });
        collector.on_event(&GameEvent::WaveCompleted {
            wave_number: 1,
            no_damage_taken: false,
        });
        collector.on_event(&GameEvent::WaveStarted { wave_number: 2 });
        collector.on_gesture(&GestureOutcome::Rejected(GestureRejection::NoTarget));
        collector.on_gesture(&GestureOutcome::Performed {
            action: GestureAction::Slash,
            damage_dealt: 9,
            targets_hit: 1,
        });

        let m = collector.current();
        assert_eq!(m.waves_reached, 2);
        assert_eq!(m.waves_cleared, 1);
        assert_eq!(m.untouched_waves, 0);
        assert_eq!(m.damage_taken, 7);
        assert_eq!(m.gestures_performed, 1);
        assert_eq!(m.gestures_rejected["NoTarget"], 1);
        assert_eq!(m.milestones[1].time_ms, 5000);
    }

    #[test]
    fn test_summary_rates() {
        let sessions = vec![
            session(3, false, vec![Achievement::FirstBlood]),
            session(3, false, vec![Achievement::FirstBlood]),
            session(6, true, vec![Achievement::FirstBlood, Achievement::BossSlayer]),
            session(5, false, Vec::new()),
        ];
        let summary = BatchSummary::from_sessions(&sessions);

        assert_eq!(summary.total_sessions, 4);
        assert!((summary.survival_rate - 0.25).abs() < 1e-9);
        assert_eq!(summary.max_wave_reached, 6);
        assert!((summary.avg_waves_reached - 4.25).abs() < 1e-9);
        assert!((summary.achievement_rates["FirstBlood"] - 0.75).abs() < 1e-9);
        assert_eq!(summary.deadliest_wave(), Some(3));
        assert!(summary.is_balanced(0.2, 0.8));
    }

    #[test]
    fn test_empty_summary() {
        let summary = BatchSummary::from_sessions(&[]);
        assert_eq!(summary.total_sessions, 0);
        assert_eq!(summary.deadliest_wave(), None);
    }

    #[test]
    fn test_metrics_json_round_trip() {
        let metrics = session(4, true, vec![Achievement::ComboMaster]);
        let json = metrics.to_json().unwrap();
        let back: SessionMetrics = serde_json::from_str(&json).unwrap();
        assert_eq!(back, metrics);
    }
}
