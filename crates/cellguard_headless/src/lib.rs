//! Headless session runner for playtesting and CI verification.
//!
//! This crate drives [`cellguard_core`] sessions without a renderer:
//!
//! - **Autopilot playtesting**: a scripted player plays a zone end to end
//! - **Balance batches**: many seeds in parallel, summarized as JSON
//! - **Replay verification**: recorded sessions must reproduce their hash
//!
//! # Example
//!
//! ```bash
//! # Play one session and print its metrics
//! cargo run -p cellguard_headless -- run --zone bloodstream --seed 7
//!
//! # Run 200 seeds in parallel
//! cargo run -p cellguard_headless -- batch --zone lungs --count 200 --output results/
//!
//! # Record, then verify a replay
//! cargo run -p cellguard_headless -- run --zone bloodstream --record session.replay
//! cargo run -p cellguard_headless -- replay --file session.replay --verify
//! ```

pub mod autopilot;
pub mod batch;
pub mod metrics;
pub mod runner;
pub mod zone_loader;

pub use autopilot::{Autopilot, AutopilotError, AutopilotState};
pub use batch::{run_batch, verify_determinism, BatchConfig, BatchResults};
pub use metrics::{BatchSummary, MetricsCollector, SessionMetrics, SessionOutcome};
pub use runner::{run_session, SessionConfig, SessionResult};
pub use zone_loader::{default_zone_dir, load_zone, ZoneLoadError, ZoneRegistry};
