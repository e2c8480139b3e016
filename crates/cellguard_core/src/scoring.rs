//! Score keeping and achievements.

use std::collections::BTreeSet;

use serde::{Deserialize, Serialize};

use crate::math::{scale_u32, Fixed};

/// Bonus per cleared wave, multiplied by the wave number.
pub const WAVE_CLEAR_BONUS: u32 = 50;
/// Flat bonus on top of a boss's own points.
pub const BOSS_DEFEAT_BONUS: u32 = 500;
/// Combo length for [`Achievement::ComboMaster`].
pub const COMBO_MASTER_STREAK: u32 = 10;
/// Wave number for [`Achievement::WaveSurvivor`].
pub const WAVE_SURVIVOR_WAVE: u32 = 10;

/// One-time achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum Achievement {
    /// First enemy killed.
    FirstBlood,
    /// A 10-hit combo.
    ComboMaster,
    /// A wave cleared without taking damage.
    Untouchable,
    /// Wave 10 cleared.
    WaveSurvivor,
    /// A boss killed.
    BossSlayer,
}

/// Running score for a session.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScoreTracker {
    /// Total points.
    pub score: u64,
    /// Enemies killed.
    pub enemies_defeated: u32,
    /// Bosses killed.
    pub bosses_defeated: u32,
    /// Waves cleared.
    pub waves_cleared: u32,
    /// Power-ups collected.
    pub power_ups_collected: u32,
}

impl ScoreTracker {
    /// Create an empty score.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a kill; returns points awarded after the combo multiplier.
    pub fn record_kill(&mut self, base_points: u32, combo_multiplier: Fixed) -> u32 {
        let points = scale_u32(base_points, combo_multiplier);
        self.enemies_defeated += 1;
        self.score += u64::from(points);
        points
    }

    /// Record a cleared wave; returns the bonus.
    pub fn record_wave(&mut self, wave_number: u32) -> u32 {
        let bonus = WAVE_CLEAR_BONUS.saturating_mul(wave_number);
        self.waves_cleared += 1;
        self.score += u64::from(bonus);
        bonus
    }

    /// Record a boss kill; returns points awarded.
    pub fn record_boss(&mut self, boss_points: u32) -> u32 {
        let points = boss_points.saturating_add(BOSS_DEFEAT_BONUS);
        self.bosses_defeated += 1;
        self.score += u64::from(points);
        points
    }

    /// Record a power-up pickup.
    pub fn record_power_up(&mut self, points: u32) {
        self.power_ups_collected += 1;
        self.score += u64::from(points);
    }
}

/// Achievements unlocked so far.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AchievementTracker {
    unlocked: BTreeSet<Achievement>,
}

impl AchievementTracker {
    /// Create a tracker with nothing unlocked.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Unlock an achievement. Returns `true` only the first time.
    pub fn unlock(&mut self, achievement: Achievement) -> bool {
        self.unlocked.insert(achievement)
    }

    /// Whether an achievement is unlocked.
    #[must_use]
    pub fn is_unlocked(&self, achievement: Achievement) -> bool {
        self.unlocked.contains(&achievement)
    }

    /// Unlocked achievements in declaration order.
    pub fn unlocked(&self) -> impl Iterator<Item = Achievement> + '_ {
        self.unlocked.iter().copied()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::math::ratio;

    #[test]
    fn test_kill_points_scale_with_combo() {
        let mut score = ScoreTracker::new();
        assert_eq!(score.record_kill(10, ratio(3, 2)), 15);
        assert_eq!(score.record_kill(10, Fixed::ONE), 10);
        assert_eq!(score.score, 25);
        assert_eq!(score.enemies_defeated, 2);
    }

    #[test]
    fn test_bonuses() {
        let mut score = ScoreTracker::new();
        assert_eq!(score.record_wave(3), 150);
        assert_eq!(score.record_boss(200), 700);
        score.record_power_up(10);
        assert_eq!(score.score, 860);
    }

    #[test]
    fn test_achievement_unlocks_once() {
        let mut achievements = AchievementTracker::new();
        assert!(achievements.unlock(Achievement::FirstBlood));
        assert!(!achievements.unlock(Achievement::FirstBlood));
        assert!(achievements.is_unlocked(Achievement::FirstBlood));
        assert_eq!(achievements.unlocked().count(), 1);
    }
}
