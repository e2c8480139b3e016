//! Data structures for zone configuration.
//!
//! Pure data types deserialized from RON. Decimal fields are authored as
//! plain decimals and converted to fixed-point on load.
//!
//! **Note:** This module contains no IO - file loading is handled by the
//! headless runner and the tools crate.

mod boss_data;
mod enemy_data;
mod hazard_data;
mod zone_data;

pub use boss_data::BossData;
pub use enemy_data::{EnemySpec, StatBlock, MAX_STAT_VALUE};
pub use hazard_data::HazardData;
pub use zone_data::{PlayerData, WorldData, ZoneData};
