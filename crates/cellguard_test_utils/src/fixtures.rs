//! Test fixtures and helpers.
//!
//! Pre-built zones and a scripted input driver for consistent testing.

use cellguard_core::data::ZoneData;
use cellguard_core::gestures::Shape;
use cellguard_core::math::{Fixed, Vec2Fixed};
use cellguard_core::orchestrator::{GameplayOrchestrator, InputSignal, TargetRef};
use cellguard_core::powerups::PowerUpKind;

/// Frame length used by scripted sessions (~60 fps).
pub const FRAME_MS: u32 = 16;

const BLOODSTREAM_RON: &str = include_str!("../../../assets/zones/bloodstream.ron");
const LUNGS_RON: &str = include_str!("../../../assets/zones/lungs.ron");

const MINIMAL_RON: &str = r#"ZoneData(
    id: "minimal",
    display_name: "zone.minimal.name",
    enemies: [
        EnemySpec(
            id: "virus",
            display_name: "enemy.virus.name",
            stats: StatBlock(health: 10, attack_power: 8),
            behavior: Chase,
            speed: 60.0,
            spawn_weight: 1.0,
            points: 10,
        ),
    ],
)"#;

/// Create a fixed-point number from an integer.
#[must_use]
pub fn fixed(n: i32) -> Fixed {
    Fixed::from_num(n)
}

/// Create a fixed-point number from a float (for tests only).
///
/// Runtime code never touches floats; this only shortens test setup.
#[must_use]
pub fn fixed_f(n: f64) -> Fixed {
    Fixed::from_num(n)
}

fn parse(source_name: &str, text: &str) -> ZoneData {
    ZoneData::from_ron_str_strict(source_name, text)
        .unwrap_or_else(|e| panic!("fixture zone {source_name} is broken: {e}"))
}

/// One chase enemy type, no hazards, no boss.
///
/// # Panics
///
/// Panics if the embedded fixture fails to parse.
#[must_use]
pub fn minimal_zone() -> ZoneData {
    parse("minimal", MINIMAL_RON)
}

/// The shipped bloodstream zone.
///
/// # Panics
///
/// Panics if the asset fails to parse or validate.
#[must_use]
pub fn bloodstream_zone() -> ZoneData {
    parse("bloodstream.ron", BLOODSTREAM_RON)
}

/// The shipped lungs zone.
///
/// # Panics
///
/// Panics if the asset fails to parse or validate.
#[must_use]
pub fn lungs_zone() -> ZoneData {
    parse("lungs.ron", LUNGS_RON)
}

/// Positions the scripted player walks between.
const WAYPOINTS: [(i32, i32); 4] = [(300, 200), (500, 200), (500, 400), (300, 400)];

/// Deterministic inputs for `frame`, derived only from observable state.
///
/// The script walks the player around a square, swings at the nearest
/// enemy, lets enemies touch the player now and then, draws a gesture
/// at the boss and picks up an occasional power-up. Feeding the same
/// orchestrator state and frame always yields the same inputs.
#[must_use]
pub fn scripted_inputs(orchestrator: &GameplayOrchestrator, frame: u64) -> Vec<InputSignal> {
    let mut inputs = Vec::new();

    if frame % 60 == 0 {
        let (x, y) = WAYPOINTS[((frame / 60) % WAYPOINTS.len() as u64) as usize];
        inputs.push(InputSignal::SetPlayerPosition(Vec2Fixed::from_ints(x, y)));
    }

    if let Some(enemy_id) = nearest_enemy(orchestrator) {
        if frame % 8 == 0 {
            inputs.push(InputSignal::AttackHit {
                target: TargetRef::Enemy(enemy_id),
            });
        }
        if frame % 25 == 0 {
            inputs.push(InputSignal::EnemyContact { enemy_id });
        }
    }

    if orchestrator.boss_active() && frame % 40 == 0 {
        let shape = if frame % 120 == 0 { Shape::Triangle } else { Shape::Line };
        inputs.push(InputSignal::Gesture {
            shape,
            target: Some(TargetRef::Boss),
        });
    }

    if frame % 300 == 150 {
        let kinds = [PowerUpKind::Health, PowerUpKind::Energy, PowerUpKind::DamageBoost];
        inputs.push(InputSignal::PowerUp(kinds[((frame / 300) % 3) as usize]));
    }

    inputs
}

/// Live enemy closest to the player; ties go to the lowest id.
#[must_use]
pub fn nearest_enemy(orchestrator: &GameplayOrchestrator) -> Option<u32> {
    let player = orchestrator.player_position();
    let mut best: Option<(u32, Fixed)> = None;
    for enemy in orchestrator.enemies() {
        let distance = enemy.position.distance_squared(player);
        if best.map_or(true, |(_, d)| distance < d) {
            best = Some((enemy.id, distance));
        }
    }
    best.map(|(id, _)| id)
}

/// Apply one scripted frame and advance by [`FRAME_MS`].
///
/// Returns the inputs applied, for recording.
pub fn drive_frame(orchestrator: &mut GameplayOrchestrator, frame: u64) -> Vec<InputSignal> {
    let inputs = scripted_inputs(orchestrator, frame);
    for input in &inputs {
        orchestrator.apply_input(input);
    }
    let time = orchestrator.game_time_ms();
    orchestrator.update(time, FRAME_MS);
    inputs
}

/// Run `frames` scripted frames.
pub fn run_scripted(orchestrator: &mut GameplayOrchestrator, frames: u64) {
    for frame in 0..frames {
        drive_frame(orchestrator, frame);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shipped_zones_parse() {
        let blood = bloodstream_zone();
        assert_eq!(blood.enemies.len(), 3);
        assert!(blood.boss.is_some());
        assert!(blood.validate().is_empty());

        let lungs = lungs_zone();
        assert_eq!(lungs.id, "lungs");
        assert!(lungs.validate().is_empty());
    }

    #[test]
    fn test_script_is_pure() {
        let orchestrator = GameplayOrchestrator::new(minimal_zone(), 3);
        assert_eq!(scripted_inputs(&orchestrator, 120), scripted_inputs(&orchestrator, 120));
    }

    #[test]
    fn test_scripted_session_advances_time() {
        let mut orchestrator = GameplayOrchestrator::new(minimal_zone(), 3);
        run_scripted(&mut orchestrator, 100);
        assert_eq!(orchestrator.game_time_ms(), 1600);
    }
}
