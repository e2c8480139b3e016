//! Single-session runner.
//!
//! Plays one zone with an autopilot for a bounded amount of game time,
//! optionally recording a replay.

use std::time::Instant;

use cellguard_core::data::ZoneData;
use cellguard_core::orchestrator::{GameplayOrchestrator, InputSignal};
use cellguard_core::replay::Replay;
use tracing::{debug, info};

use crate::autopilot::{Autopilot, AutopilotState};
use crate::metrics::{MetricsCollector, SessionMetrics};

/// Default frame length (~60 fps).
pub const DEFAULT_FRAME_MS: u32 = 16;

/// Default time limit: five minutes of game time.
pub const DEFAULT_MAX_DURATION_MS: u64 = 5 * 60 * 1000;

/// Configuration for one session.
#[derive(Debug, Clone)]
pub struct SessionConfig {
    /// Session identifier used in logs and metrics.
    pub session_id: String,
    /// Zone to play.
    pub zone: ZoneData,
    /// Session seed.
    pub seed: u64,
    /// Player profile.
    pub autopilot: Autopilot,
    /// Frame delta.
    pub frame_ms: u32,
    /// Game-time limit.
    pub max_duration_ms: u64,
    /// Record a replay.
    pub record_replay: bool,
}

impl SessionConfig {
    /// Default settings for `zone` and `seed`.
    pub fn new(zone: ZoneData, seed: u64) -> Self {
        Self {
            session_id: format!("{}_{seed}", zone.id),
            zone,
            seed,
            autopilot: Autopilot::default(),
            frame_ms: DEFAULT_FRAME_MS,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            record_replay: false,
        }
    }

    /// Set the autopilot.
    pub fn with_autopilot(mut self, autopilot: Autopilot) -> Self {
        self.autopilot = autopilot;
        self
    }

    /// Set the time limit.
    pub fn with_max_duration_ms(mut self, max_duration_ms: u64) -> Self {
        self.max_duration_ms = max_duration_ms;
        self
    }

    /// Enable replay recording.
    pub fn with_replay(mut self) -> Self {
        self.record_replay = true;
        self
    }
}

/// Outcome of one session.
#[derive(Debug, Clone)]
pub struct SessionResult {
    /// Collected metrics.
    pub metrics: SessionMetrics,
    /// Recorded replay, if requested.
    pub replay: Option<Replay>,
    /// Final orchestrator state hash.
    pub final_state_hash: u64,
}

/// Play a session to the time limit or the player's death.
pub fn run_session(config: SessionConfig) -> SessionResult {
    let wall_start = Instant::now();
    info!(
        session = %config.session_id,
        zone = %config.zone.id,
        seed = config.seed,
        autopilot = %config.autopilot.name,
        max_duration_ms = config.max_duration_ms,
        "Starting session"
    );

    let frame_ms = config.frame_ms.max(1);
    let mut orchestrator = GameplayOrchestrator::new(config.zone.clone(), config.seed);
    let mut pilot_state = AutopilotState::new();
    let mut collector = MetricsCollector::new(
        &config.session_id,
        &config.zone.id,
        &config.autopilot.name,
        config.seed,
    );
    let mut replay = config
        .record_replay
        .then(|| Replay::new(config.zone.id.clone(), config.seed));

    // Wave 1 starts in the constructor.
    for event in orchestrator.drain_events() {
        collector.on_event(&event);
    }

    let mut frames = 0u64;
    while orchestrator.game_time_ms() < config.max_duration_ms && !orchestrator.is_game_over() {
        let inputs = pilot_state.plan(&config.autopilot, &orchestrator, frame_ms);
        for input in &inputs {
            let outcome = orchestrator.apply_input(input);
            if let (InputSignal::Gesture { .. }, Some(outcome)) = (input, outcome) {
                collector.on_gesture(&outcome);
            }
        }

        let time = orchestrator.game_time_ms();
        orchestrator.update(time, frame_ms);
        frames += 1;

        collector.set_time(orchestrator.game_time_ms());
        for event in orchestrator.drain_events() {
            collector.on_event(&event);
        }

        if let Some(replay) = replay.as_mut() {
            replay.record_frame(inputs, frame_ms);
        }

        if frames % 3600 == 0 {
            debug!(
                session = %config.session_id,
                time_ms = orchestrator.game_time_ms(),
                wave = orchestrator.current_wave(),
                enemies = orchestrator.live_enemy_count(),
                health = orchestrator.player().health(),
                "Session progress"
            );
        }
    }

    // Inputs applied in the final frame can kill the player before update.
    collector.set_time(orchestrator.game_time_ms());
    for event in orchestrator.drain_events() {
        collector.on_event(&event);
    }

    let final_state_hash = orchestrator.state_hash();
    if let Some(replay) = replay.as_mut() {
        replay.finalize(orchestrator.game_time_ms(), final_state_hash);
    }
    let metrics = collector.finalize(&orchestrator, frames);

    info!(
        session = %config.session_id,
        outcome = ?metrics.outcome,
        waves = metrics.waves_reached,
        score = metrics.final_score,
        game_time_ms = metrics.duration_ms,
        wall_ms = wall_start.elapsed().as_millis() as u64,
        hash = format!("{final_state_hash:016x}"),
        "Session finished"
    );

    SessionResult {
        metrics,
        replay,
        final_state_hash,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cellguard_core::replay::ReplayPlayer;
    use cellguard_test_utils::fixtures::{bloodstream_zone, minimal_zone};

    use crate::metrics::SessionOutcome;

    #[test]
    fn test_session_respects_time_limit() {
        let config = SessionConfig::new(minimal_zone(), 5).with_max_duration_ms(10_000);
        let result = run_session(config);

        assert!(result.metrics.duration_ms >= 10_000 || result.metrics.outcome == SessionOutcome::PlayerDefeated);
        assert!(result.metrics.duration_ms < 10_000 + u64::from(DEFAULT_FRAME_MS));
        assert!(result.metrics.waves_reached >= 1);
        assert!(result.replay.is_none());
    }

    #[test]
    fn test_idle_player_eventually_dies() {
        let config = SessionConfig::new(minimal_zone(), 5)
            .with_autopilot(Autopilot::idle())
            .with_max_duration_ms(30 * 60 * 1000);
        let result = run_session(config);
        assert_eq!(result.metrics.outcome, SessionOutcome::PlayerDefeated);
        assert_eq!(result.metrics.final_health, 0);
    }

    #[test]
    fn test_recorded_replay_verifies() {
        let zone = bloodstream_zone();
        let config = SessionConfig::new(zone.clone(), 21)
            .with_max_duration_ms(20_000)
            .with_replay();
        let result = run_session(config);
        let replay = result.replay.unwrap();
        assert_eq!(replay.final_hash, result.final_state_hash);

        let mut player = ReplayPlayer::new(replay, zone).unwrap();
        player.run_to_end();
        assert!(player.verify());
    }

    #[test]
    fn test_same_seed_same_metrics() {
        let a = run_session(SessionConfig::new(bloodstream_zone(), 3).with_max_duration_ms(15_000));
        let b = run_session(SessionConfig::new(bloodstream_zone(), 3).with_max_duration_ms(15_000));
        assert_eq!(a.metrics, b.metrics);
    }
}
