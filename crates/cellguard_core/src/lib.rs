//! # Cellguard Core
//!
//! Deterministic combat and encounter simulation kernel for Cellguard.
//!
//! This crate contains **only** deterministic logic:
//! - No rendering
//! - No IO (zone files are parsed from strings handed in by the host)
//! - No system randomness
//! - No floating-point math at runtime (uses fixed-point)
//!
//! This separation enables:
//! - Headless batch runs
//! - Replay recording and verification
//! - Determinism testing
//!
//! ## Crate Structure
//!
//! - [`combat`] / [`combatant`] / [`effects`] - stats, damage and combos
//! - [`ai`] - per-enemy behavior selection
//! - [`wave`] - spawn scheduling and difficulty curve
//! - [`boss`] - multi-phase boss state machine
//! - [`hazard`] - environmental hazards
//! - [`orchestrator`] - per-frame coordinator
//! - [`data`] - zone configuration types
//! - [`replay`] - session recording and playback

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all, clippy::pedantic)]

pub mod ai;
pub mod boss;
pub mod combat;
pub mod combatant;
pub mod data;
pub mod effects;
pub mod error;
pub mod events;
pub mod gestures;
pub mod hazard;
pub mod math;
pub mod orchestrator;
pub mod powerups;
pub mod replay;
pub mod rng;
pub mod scoring;
pub mod wave;

/// Re-export commonly used types
pub mod prelude {
    pub use crate::ai::{AiDecision, AiProfile, AiState, BehaviorKind, EnemyAiAgent};
    pub use crate::boss::{
        AttackEffect, AttackPattern, BossEncounter, BossMovement, BossPhase, BossState, BossTuning,
        SpecialAbility, TakeDamageOutcome,
    };
    pub use crate::combat::{CombatResolver, CombatTuning, ComboState, DamageReport};
    pub use crate::combatant::{Combatant, Status};
    pub use crate::data::{BossData, EnemySpec, HazardData, StatBlock, ZoneData};
    pub use crate::effects::{ActiveEffect, EffectKind, EffectTracker};
    pub use crate::error::{GameError, Result};
    pub use crate::events::{EventQueue, GameEvent};
    pub use crate::gestures::{GestureAction, GestureOutcome, GestureRejection, Shape};
    pub use crate::hazard::{Hazard, HazardEffect, HazardEffectKind, HazardField, HazardKind, HazardPattern};
    pub use crate::math::{Fixed, Vec2Fixed, WorldBounds};
    pub use crate::orchestrator::{Enemy, GameplayOrchestrator, HazardOccupant, InputSignal, TargetRef};
    pub use crate::powerups::PowerUpKind;
    pub use crate::replay::{Replay, ReplayPlayer};
    pub use crate::rng::SimRng;
    pub use crate::scoring::{Achievement, AchievementTracker, ScoreTracker};
    pub use crate::wave::{SpawnRequest, WaveDifficulty, WaveDirector, WaveState};
}
