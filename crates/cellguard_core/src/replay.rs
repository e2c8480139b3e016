//! Replay system for recording and playing back sessions.
//!
//! A session is fully determined by its zone, its seed and the stream of
//! frames (delta plus the inputs applied before that delta). Replays
//! store exactly that, plus the final state hash for verification.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::data::ZoneData;
use crate::error::{GameError, Result};
use crate::orchestrator::{GameplayOrchestrator, InputSignal};

/// Replay file format version for compatibility.
pub const REPLAY_VERSION: u32 = 1;

/// One recorded frame.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReplayFrame {
    /// Inputs applied before the update.
    pub inputs: Vec<InputSignal>,
    /// Delta passed to the update.
    pub delta_ms: u32,
}

/// Complete replay data structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Replay {
    /// Replay format version.
    pub version: u32,
    /// Zone identifier.
    pub zone_id: String,
    /// Session seed.
    pub seed: u64,
    /// Frames in order.
    pub frames: Vec<ReplayFrame>,
    /// Game time when recording stopped.
    pub final_time_ms: u64,
    /// State hash when recording stopped.
    pub final_hash: u64,
}

impl Replay {
    /// Create an empty replay.
    #[must_use]
    pub fn new(zone_id: impl Into<String>, seed: u64) -> Self {
        Self {
            version: REPLAY_VERSION,
            zone_id: zone_id.into(),
            seed,
            frames: Vec::new(),
            final_time_ms: 0,
            final_hash: 0,
        }
    }

    /// Record one frame.
    pub fn record_frame(&mut self, inputs: Vec<InputSignal>, delta_ms: u32) {
        self.frames.push(ReplayFrame { inputs, delta_ms });
    }

    /// Finalize the replay with end-of-session state.
    pub fn finalize(&mut self, final_time_ms: u64, final_hash: u64) {
        self.final_time_ms = final_time_ms;
        self.final_hash = final_hash;
    }

    /// Number of recorded frames.
    #[must_use]
    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }

    /// Total number of recorded inputs.
    #[must_use]
    pub fn input_count(&self) -> usize {
        self.frames.iter().map(|f| f.inputs.len()).sum()
    }

    /// Serialize to bytes.
    pub fn to_bytes(&self) -> Result<Vec<u8>> {
        bincode::serialize(self).map_err(|e| GameError::ReplayError(format!("Failed to serialize replay: {e}")))
    }

    /// Deserialize from bytes, checking the format version.
    pub fn from_bytes(bytes: &[u8]) -> Result<Self> {
        let replay: Self = bincode::deserialize(bytes)
            .map_err(|e| GameError::ReplayError(format!("Failed to deserialize replay: {e}")))?;
        if replay.version != REPLAY_VERSION {
            return Err(GameError::ReplayVersionMismatch {
                expected: REPLAY_VERSION,
                found: replay.version,
            });
        }
        Ok(replay)
    }

    /// Save the replay to a file.
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path.as_ref(), self.to_bytes()?)?;
        Ok(())
    }

    /// Load a replay from a file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let bytes = std::fs::read(path.as_ref())?;
        Self::from_bytes(&bytes)
    }
}

/// Replay playback controller.
#[derive(Debug)]
pub struct ReplayPlayer {
    replay: Replay,
    orchestrator: GameplayOrchestrator,
    frame_index: usize,
}

impl ReplayPlayer {
    /// Start playback against `zone`.
    pub fn new(replay: Replay, zone: ZoneData) -> Result<Self> {
        if zone.id != replay.zone_id {
            return Err(GameError::ReplayError(format!(
                "Replay recorded in zone '{}' but zone '{}' was supplied",
                replay.zone_id, zone.id
            )));
        }
        let orchestrator = GameplayOrchestrator::new(zone, replay.seed);
        Ok(Self {
            replay,
            orchestrator,
            frame_index: 0,
        })
    }

    /// Play one frame. Returns `true` if more frames remain.
    pub fn advance(&mut self) -> bool {
        let Some(frame) = self.replay.frames.get(self.frame_index) else {
            return false;
        };
        for input in &frame.inputs {
            self.orchestrator.apply_input(input);
        }
        let time = self.orchestrator.game_time_ms();
        self.orchestrator.update(time, frame.delta_ms);
        self.frame_index += 1;
        self.frame_index < self.replay.frames.len()
    }

    /// Play every remaining frame.
    pub fn run_to_end(&mut self) {
        while self.advance() {}
    }

    /// Whether the current state matches the recorded final hash.
    ///
    /// Only meaningful once every frame has been played.
    #[must_use]
    pub fn verify(&self) -> bool {
        self.frame_index == self.replay.frames.len()
            && self.orchestrator.state_hash() == self.replay.final_hash
    }

    /// Index of the next frame to play.
    #[must_use]
    pub const fn frame_index(&self) -> usize {
        self.frame_index
    }

    /// The session being replayed.
    #[must_use]
    pub const fn orchestrator(&self) -> &GameplayOrchestrator {
        &self.orchestrator
    }

    /// The replay being played.
    #[must_use]
    pub const fn replay(&self) -> &Replay {
        &self.replay
    }
}
