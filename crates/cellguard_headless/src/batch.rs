//! Batch session runner for balance testing.
//!
//! Runs many seeds of one zone in parallel using rayon and summarizes
//! the outcomes.

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicU32, Ordering};
use std::time::Instant;

use cellguard_core::data::ZoneData;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::autopilot::Autopilot;
use crate::metrics::{BatchSummary, SessionMetrics};
use crate::runner::{run_session, SessionConfig, DEFAULT_MAX_DURATION_MS};

/// Configuration for a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchConfig {
    /// Zone name or path, for the record.
    pub zone: String,
    /// Number of sessions to run.
    pub session_count: u32,
    /// Maximum parallel sessions (0 = use rayon default).
    pub parallel_sessions: u32,
    /// Output directory for results.
    pub output_dir: PathBuf,
    /// First seed; session `i` uses `seed_start + i`.
    pub seed_start: u64,
    /// Game-time limit per session.
    pub max_duration_ms: u64,
    /// Autopilot profile for every session.
    pub autopilot: Autopilot,
}

impl Default for BatchConfig {
    fn default() -> Self {
        Self {
            zone: "bloodstream".to_string(),
            session_count: 100,
            parallel_sessions: 0,
            output_dir: PathBuf::from("results"),
            seed_start: 0,
            max_duration_ms: DEFAULT_MAX_DURATION_MS,
            autopilot: Autopilot::default(),
        }
    }
}

impl BatchConfig {
    /// Create config for a zone.
    pub fn new(zone: &str, session_count: u32) -> Self {
        Self {
            zone: zone.to_string(),
            session_count,
            ..Default::default()
        }
    }

    /// Set output directory.
    pub fn with_output(mut self, dir: PathBuf) -> Self {
        self.output_dir = dir;
        self
    }

    /// Set seed start.
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed_start = seed;
        self
    }

    /// Set the per-session time limit.
    pub fn with_max_duration_ms(mut self, max_duration_ms: u64) -> Self {
        self.max_duration_ms = max_duration_ms;
        self
    }

    /// Set the autopilot.
    pub fn with_autopilot(mut self, autopilot: Autopilot) -> Self {
        self.autopilot = autopilot;
        self
    }
}

/// Results from a batch run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BatchResults {
    /// Configuration used.
    pub config: BatchConfig,
    /// Individual session metrics, in seed order.
    pub sessions: Vec<SessionMetrics>,
    /// Aggregate summary.
    pub summary: BatchSummary,
    /// Total wall-clock runtime.
    pub duration_seconds: f64,
}

impl BatchResults {
    /// Save results to a JSON file.
    pub fn save(&self, path: &Path) -> std::io::Result<()> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }
        let json = serde_json::to_string_pretty(self).map_err(std::io::Error::other)?;
        std::fs::write(path, json)
    }

    /// Load results from a JSON file.
    pub fn load(path: &Path) -> std::io::Result<Self> {
        let json = std::fs::read_to_string(path)?;
        serde_json::from_str(&json).map_err(std::io::Error::other)
    }
}

/// Run a batch of sessions in `zone`.
pub fn run_batch(config: BatchConfig, zone: &ZoneData) -> BatchResults {
    let start = Instant::now();
    let completed = AtomicU32::new(0);

    info!(
        "Starting batch run: {} sessions of '{}' with autopilot '{}'",
        config.session_count, zone.id, config.autopilot.name
    );

    if config.parallel_sessions > 0 {
        if let Err(e) = rayon::ThreadPoolBuilder::new()
            .num_threads(config.parallel_sessions as usize)
            .build_global()
        {
            warn!("Could not size the thread pool: {e}");
        }
    }

    let sessions: Vec<SessionMetrics> = (0..config.session_count)
        .into_par_iter()
        .map(|i| {
            let seed = config.seed_start.wrapping_add(u64::from(i));
            let session = SessionConfig::new(zone.clone(), seed)
                .with_autopilot(config.autopilot.clone())
                .with_max_duration_ms(config.max_duration_ms);

            let result = run_session(session);
            let done = completed.fetch_add(1, Ordering::Relaxed) + 1;
            if done % 10 == 0 {
                debug!("Progress: {}/{}", done, config.session_count);
            }
            result.metrics
        })
        .collect();

    let summary = BatchSummary::from_sessions(&sessions);
    let duration_seconds = start.elapsed().as_secs_f64();

    info!(
        "Batch complete: {} sessions in {:.1}s, survival {:.1}%, deadliest wave {:?}",
        sessions.len(),
        duration_seconds,
        summary.survival_rate * 100.0,
        summary.deadliest_wave()
    );

    BatchResults {
        config,
        sessions,
        summary,
        duration_seconds,
    }
}

/// Run the same seed `runs` times and check every final hash matches.
pub fn verify_determinism(zone: &ZoneData, seed: u64, runs: u32, max_duration_ms: u64, autopilot: &Autopilot) -> bool {
    let hashes: Vec<u64> = (0..runs)
        .into_par_iter()
        .map(|_| {
            let config = SessionConfig::new(zone.clone(), seed)
                .with_autopilot(autopilot.clone())
                .with_max_duration_ms(max_duration_ms);
            run_session(config).final_state_hash
        })
        .collect();

    let deterministic = hashes.windows(2).all(|w| w[0] == w[1]);
    if !deterministic {
        warn!(?hashes, seed, "Sessions diverged");
    }
    deterministic
}
