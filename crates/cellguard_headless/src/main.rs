//! Headless Cellguard session runner.
//!
//! Plays zones without a renderer using a scripted autopilot. Designed for
//! balance batches, CI determinism checks and replay verification.
//!
//! # Usage
//!
//! ```bash
//! # Play one session and print its metrics as JSON
//! cargo run -p cellguard_headless -- run --zone bloodstream --seed 7
//!
//! # Record a replay and write metrics to a file
//! cargo run -p cellguard_headless -- run --zone lungs --record lungs.replay --metrics lungs.json
//!
//! # Run a balance batch
//! cargo run -p cellguard_headless -- batch --zone bloodstream --count 500 --output results/
//!
//! # Verify determinism
//! cargo run -p cellguard_headless -- verify --zone lungs --seed 12345 --runs 5
//!
//! # Verify a replay
//! cargo run -p cellguard_headless -- replay --file lungs.replay --verify
//! ```
//!
//! Metrics go to stdout (or a file); logs go to stderr.

use std::path::{Path, PathBuf};

use clap::{Parser, Subcommand};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use cellguard_core::data::ZoneData;
use cellguard_core::replay::{Replay, ReplayPlayer};
use cellguard_headless::{
    autopilot::Autopilot,
    batch::{run_batch, verify_determinism, BatchConfig},
    runner::{run_session, SessionConfig},
    zone_loader::load_zone,
};

#[derive(Parser)]
#[command(name = "cellguard_headless")]
#[command(about = "Headless Cellguard session runner for playtesting and CI")]
#[command(version)]
struct Cli {
    /// Enable verbose logging to stderr
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Directory holding zone RON files (defaults to assets/zones)
    #[arg(long, global = true)]
    zone_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Play a single session
    Run {
        /// Zone name or path to a zone RON file
        #[arg(short, long, default_value = "bloodstream")]
        zone: String,

        /// Session seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Autopilot profile name or path to a RON profile
        #[arg(short, long, default_value = "balanced")]
        autopilot: String,

        /// Game-time limit in seconds
        #[arg(long, default_value = "300")]
        duration_seconds: u64,

        /// Write metrics JSON here instead of stdout
        #[arg(long)]
        metrics: Option<PathBuf>,

        /// Record a replay to this file
        #[arg(long)]
        record: Option<PathBuf>,
    },

    /// Run a batch of sessions for balance testing
    Batch {
        /// Zone name or path to a zone RON file
        #[arg(short, long, default_value = "bloodstream")]
        zone: String,

        /// Number of sessions
        #[arg(short, long, default_value = "100")]
        count: u32,

        /// Maximum parallel sessions (0 = auto)
        #[arg(short, long, default_value = "0")]
        parallel: u32,

        /// Output directory for results
        #[arg(short, long, default_value = "results")]
        output: PathBuf,

        /// Starting seed
        #[arg(long, default_value = "0")]
        seed: u64,

        /// Autopilot profile name or path to a RON profile
        #[arg(short, long, default_value = "balanced")]
        autopilot: String,

        /// Game-time limit per session in seconds
        #[arg(long, default_value = "300")]
        duration_seconds: u64,
    },

    /// Verify determinism by running the same seed multiple times
    Verify {
        /// Zone name or path to a zone RON file
        #[arg(short, long, default_value = "bloodstream")]
        zone: String,

        /// Seed to verify
        #[arg(long, default_value = "12345")]
        seed: u64,

        /// Number of verification runs
        #[arg(short, long, default_value = "5")]
        runs: u32,

        /// Game-time limit per run in seconds
        #[arg(long, default_value = "120")]
        duration_seconds: u64,

        /// Autopilot profile name or path to a RON profile
        #[arg(short, long, default_value = "aggressive")]
        autopilot: String,
    },

    /// Play back a recorded replay
    Replay {
        /// Replay file path
        #[arg(short, long)]
        file: PathBuf,

        /// Zone name or path (defaults to the zone id stored in the replay)
        #[arg(short, long)]
        zone: Option<String>,

        /// Verify the replay reproduces its recorded hash
        #[arg(long)]
        verify: bool,
    },
}

fn main() {
    let cli = Cli::parse();

    // Logs to stderr; stdout carries metrics JSON.
    let log_level = if cli.verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::INFO
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_ansi(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(log_level))
        .init();

    let zone_dir = cli.zone_dir.as_deref();
    match cli.command {
        Commands::Run {
            zone,
            seed,
            autopilot,
            duration_seconds,
            metrics,
            record,
        } => cmd_run(zone_dir, &zone, seed, &autopilot, duration_seconds, metrics, record),
        Commands::Batch {
            zone,
            count,
            parallel,
            output,
            seed,
            autopilot,
            duration_seconds,
        } => cmd_batch(zone_dir, &zone, count, parallel, output, seed, &autopilot, duration_seconds),
        Commands::Verify {
            zone,
            seed,
            runs,
            duration_seconds,
            autopilot,
        } => cmd_verify(zone_dir, &zone, seed, runs, duration_seconds, &autopilot),
        Commands::Replay { file, zone, verify } => cmd_replay(zone_dir, &file, zone.as_deref(), verify),
    }
}

fn fatal(message: impl std::fmt::Display) -> ! {
    tracing::error!("{message}");
    eprintln!("FATAL: {message}");
    std::process::exit(1);
}

fn load_zone_or_exit(zone_dir: Option<&Path>, zone: &str) -> ZoneData {
    load_zone(zone, zone_dir).unwrap_or_else(|e| fatal(format!("Failed to load zone '{zone}': {e}")))
}

fn load_autopilot_or_exit(autopilot: &str) -> Autopilot {
    Autopilot::resolve(autopilot).unwrap_or_else(|e| fatal(e))
}

/// Play a single session.
fn cmd_run(
    zone_dir: Option<&Path>,
    zone: &str,
    seed: u64,
    autopilot: &str,
    duration_seconds: u64,
    metrics_path: Option<PathBuf>,
    record: Option<PathBuf>,
) {
    let zone = load_zone_or_exit(zone_dir, zone);
    let mut config = SessionConfig::new(zone, seed)
        .with_autopilot(load_autopilot_or_exit(autopilot))
        .with_max_duration_ms(duration_seconds * 1000);
    if record.is_some() {
        config = config.with_replay();
    }

    let result = run_session(config);

    if let (Some(path), Some(replay)) = (record, result.replay.as_ref()) {
        if let Err(e) = replay.save(&path) {
            fatal(format!("Failed to save replay to {}: {e}", path.display()));
        }
        eprintln!(
            "Replay saved: {} ({} frames, {} inputs)",
            path.display(),
            replay.frame_count(),
            replay.input_count()
        );
    }

    match metrics_path {
        Some(path) => {
            if let Err(e) = result.metrics.save(&path) {
                fatal(format!("Failed to write metrics to {}: {e}", path.display()));
            }
            eprintln!("Metrics written to {}", path.display());
        }
        None => match result.metrics.to_json() {
            Ok(json) => println!("{json}"),
            Err(e) => fatal(format!("Failed to serialize metrics: {e}")),
        },
    }
}

/// Run a batch of sessions.
#[allow(clippy::too_many_arguments)]
fn cmd_batch(
    zone_dir: Option<&Path>,
    zone_name: &str,
    count: u32,
    parallel: u32,
    output: PathBuf,
    seed: u64,
    autopilot: &str,
    duration_seconds: u64,
) {
    let zone = load_zone_or_exit(zone_dir, zone_name);
    let num_cpus = std::thread::available_parallelism().map_or(1, |p| p.get());

    tracing::info!(
        zone = %zone.id,
        count = count,
        parallel = parallel,
        seed = seed,
        output = %output.display(),
        cpus_available = num_cpus,
        autopilot = %autopilot,
        duration_seconds = duration_seconds,
        "Batch configuration"
    );

    if let Err(e) = std::fs::create_dir_all(&output) {
        fatal(format!("Cannot create output directory '{}': {e}", output.display()));
    }

    let config = BatchConfig {
        parallel_sessions: parallel,
        ..BatchConfig::new(zone_name, count)
    }
    .with_output(output.clone())
    .with_seed(seed)
    .with_max_duration_ms(duration_seconds * 1000)
    .with_autopilot(load_autopilot_or_exit(autopilot));

    let results = run_batch(config, &zone);

    let results_path = output.join("batch_results.json");
    if let Err(e) = results.save(&results_path) {
        fatal(format!("Failed to save results: {e}"));
    }

    let summary = &results.summary;
    eprintln!("\n{}", "=".repeat(50));
    eprintln!("BATCH COMPLETE");
    eprintln!("{}", "=".repeat(50));
    eprintln!("Sessions played:    {}", summary.total_sessions);
    eprintln!("Survival rate:      {:.1}%", summary.survival_rate * 100.0);
    eprintln!("Avg waves reached:  {:.2}", summary.avg_waves_reached);
    eprintln!("Max wave reached:   {}", summary.max_wave_reached);
    eprintln!("Avg score:          {:.1}", summary.avg_score);
    eprintln!("Boss defeat rate:   {:.1}%", summary.boss_defeat_rate * 100.0);
    if let Some(wave) = summary.deadliest_wave() {
        eprintln!("Deadliest wave:     {wave}");
    }
    for (achievement, rate) in &summary.achievement_rates {
        eprintln!("  {achievement:<14} {:>5.1}%", rate * 100.0);
    }
    eprintln!("Results: {}", results_path.display());
    eprintln!("Duration: {:.1}s", results.duration_seconds);
}

/// Verify determinism.
fn cmd_verify(zone_dir: Option<&Path>, zone: &str, seed: u64, runs: u32, duration_seconds: u64, autopilot: &str) {
    let zone = load_zone_or_exit(zone_dir, zone);
    let autopilot = load_autopilot_or_exit(autopilot);

    tracing::info!(
        "Verifying determinism: zone={}, seed={}, runs={}",
        zone.id,
        seed,
        runs
    );

    if verify_determinism(&zone, seed, runs.max(2), duration_seconds * 1000, &autopilot) {
        eprintln!("PASS: {} runs of seed {seed} produced identical state", runs.max(2));
    } else {
        eprintln!("FAIL: runs of seed {seed} diverged");
        std::process::exit(1);
    }
}

/// Play back a replay.
fn cmd_replay(zone_dir: Option<&Path>, file: &Path, zone: Option<&str>, verify: bool) {
    let replay = Replay::load(file).unwrap_or_else(|e| fatal(format!("Failed to load replay: {e}")));

    eprintln!("Loaded replay:");
    eprintln!("  Zone: {}", replay.zone_id);
    eprintln!("  Seed: {}", replay.seed);
    eprintln!("  Frames: {}", replay.frame_count());
    eprintln!("  Inputs: {}", replay.input_count());
    eprintln!("  Duration: {} ms", replay.final_time_ms);

    let zone_name = zone.map_or_else(|| replay.zone_id.clone(), str::to_string);
    let zone = load_zone_or_exit(zone_dir, &zone_name);
    let expected_hash = replay.final_hash;

    let mut player = ReplayPlayer::new(replay, zone)
        .unwrap_or_else(|e| fatal(format!("Failed to create replay player: {e}")));

    let total = player.replay().frame_count().max(1);
    let mut last_percent = 0;
    while player.advance() {
        let percent = player.frame_index() * 100 / total;
        if percent >= last_percent + 10 {
            tracing::debug!("Progress: {percent}%");
            last_percent = percent;
        }
    }

    let session = player.orchestrator();
    let actual_hash = session.state_hash();
    eprintln!("Replay complete at {} ms", session.game_time_ms());
    eprintln!("  Wave: {}", session.current_wave());
    eprintln!("  Score: {}", session.score().score);
    eprintln!("  Player health: {}", session.player().health());

    if verify {
        if player.verify() {
            eprintln!("PASS: Replay verification successful");
            eprintln!("  Hash: {actual_hash:016x}");
        } else {
            eprintln!("FAIL: Replay produced different hash!");
            eprintln!("  Expected: {expected_hash:016x}");
            eprintln!("  Actual:   {actual_hash:016x}");
            std::process::exit(1);
        }
    } else {
        eprintln!("Final state hash: {actual_hash:016x}");
    }
}
