//! Wave progression tests.
//!
//! Drives the orchestrator through whole waves: spawning, clearing,
//! intermission and the boss wave that holds the next one back.

use cellguard_core::data::ZoneData;
use cellguard_core::events::GameEvent;
use cellguard_core::orchestrator::{
    GameplayOrchestrator, TargetRef, BOSS_WAVE_INTERVAL, WAVE_INTERMISSION_MS,
};
use cellguard_core::scoring::{Achievement, BOSS_DEFEAT_BONUS};
use cellguard_test_utils::fixtures::FRAME_MS;

/// One enemy per early wave, spawned at the 500ms floor, and a one-phase
/// boss that never attacks.
const SPRINT_RON: &str = r#"ZoneData(
    id: "sprint",
    display_name: "zone.sprint.name",
    difficulty: WaveDifficulty(enemy_count: 0.2, spawn_interval: 0.1, max_enemies: 1.0),
    enemies: [
        EnemySpec(
            id: "drifter",
            display_name: "enemy.drifter.name",
            stats: StatBlock(health: 10, attack_power: 1),
            behavior: Patrol,
            speed: 20.0,
            spawn_weight: 1.0,
            points: 10,
        ),
    ],
    boss: Some(BossData(
        id: "sentinel",
        display_name: "boss.sentinel.name",
        stats: StatBlock(health: 40, attack_power: 1),
        points: 250,
        phases: [
            BossPhase(
                id: "idle",
                health_threshold_percent: 100,
                movement: Stationary,
                speed: 0.0,
                damage_multiplier: 1.0,
            ),
        ],
    )),
)"#;

fn sprint_zone() -> ZoneData {
    ZoneData::from_ron_str_strict("sprint", SPRINT_RON).unwrap()
}

/// Kill every live enemy with basic attacks.
fn clear_enemies(orchestrator: &mut GameplayOrchestrator) {
    let ids: Vec<u32> = orchestrator.enemies().map(|e| e.id).collect();
    for id in ids {
        for _ in 0..20 {
            if orchestrator.enemy(id).is_none() {
                break;
            }
            orchestrator.on_attack_hit(TargetRef::Enemy(id));
        }
    }
}

/// Advance one frame, clearing the field first. Returns the frame's events.
fn step(orchestrator: &mut GameplayOrchestrator) -> Vec<GameEvent> {
    clear_enemies(orchestrator);
    let time = orchestrator.game_time_ms();
    orchestrator.update(time, FRAME_MS);
    orchestrator.drain_events()
}

/// Step until `predicate` matches an event or `limit_ms` of game time passes.
fn step_until<F>(orchestrator: &mut GameplayOrchestrator, limit_ms: u64, predicate: F) -> Option<GameEvent>
where
    F: Fn(&GameEvent) -> bool,
{
    let deadline = orchestrator.game_time_ms() + limit_ms;
    while orchestrator.game_time_ms() < deadline {
        if let Some(event) = step(orchestrator).into_iter().find(|e| predicate(e)) {
            return Some(event);
        }
    }
    None
}

// ============================================================================
// Wave lifecycle
// ============================================================================

#[test]
fn test_first_wave_starts_immediately() {
    let mut orchestrator = GameplayOrchestrator::new(sprint_zone(), 1);
    let events = orchestrator.drain_events();

    assert!(events.contains(&GameEvent::WaveStarted { wave_number: 1 }));
    assert_eq!(orchestrator.current_wave(), 1);
    assert!(orchestrator.wave_state().in_progress);
    assert!(!orchestrator.in_intermission());
}

#[test]
fn test_cleared_wave_completes_then_intermission() {
    let mut orchestrator = GameplayOrchestrator::new(sprint_zone(), 1);
    orchestrator.drain_events();

    let completed = step_until(&mut orchestrator, 10_000, |e| matches!(e, GameEvent::WaveCompleted { .. }));
    assert!(
        matches!(completed, Some(GameEvent::WaveCompleted { wave_number: 1, .. })),
        "wave 1 never completed: {completed:?}"
    );
    let completed_at = orchestrator.game_time_ms();

    assert_eq!(orchestrator.current_wave(), 2);
    assert!(orchestrator.in_intermission());
    assert_eq!(orchestrator.score().waves_cleared, 1);

    let started = step_until(&mut orchestrator, WAVE_INTERMISSION_MS * 2, |e| {
        matches!(e, GameEvent::WaveStarted { .. })
    });
    assert_eq!(started, Some(GameEvent::WaveStarted { wave_number: 2 }));

    let gap = orchestrator.game_time_ms() - completed_at;
    assert!(gap >= WAVE_INTERMISSION_MS, "intermission too short: {gap}ms");
    assert!(gap <= WAVE_INTERMISSION_MS + u64::from(FRAME_MS), "intermission too long: {gap}ms");
    assert!(!orchestrator.in_intermission());
}

#[test]
fn test_wave_not_complete_while_enemies_live() {
    let mut orchestrator = GameplayOrchestrator::new(sprint_zone(), 4);
    orchestrator.drain_events();

    // Never clear the field: the first spawn keeps wave 1 open.
    let mut spawned = false;
    for _ in 0..600 {
        let time = orchestrator.game_time_ms();
        orchestrator.update(time, FRAME_MS);
        for event in orchestrator.drain_events() {
            assert!(!matches!(event, GameEvent::WaveCompleted { .. }));
            spawned |= matches!(event, GameEvent::EnemySpawned { .. });
        }
    }
    assert!(spawned);
    assert_eq!(orchestrator.current_wave(), 1);
}

#[test]
fn test_untouched_wave_unlocks_untouchable() {
    let mut orchestrator = GameplayOrchestrator::new(sprint_zone(), 2);
    orchestrator.drain_events();

    let mut damaged = false;
    let mut completed = None;
    while orchestrator.game_time_ms() < 10_000 && completed.is_none() {
        for event in step(&mut orchestrator) {
            match event {
                GameEvent::PlayerDamaged { .. } => damaged = true,
                GameEvent::WaveCompleted { no_damage_taken, .. } => completed = Some(no_damage_taken),
                _ => {}
            }
        }
    }

    let no_damage_taken = completed.unwrap();
    assert_eq!(no_damage_taken, !damaged);
    assert_eq!(orchestrator.achievements().is_unlocked(Achievement::Untouchable), no_damage_taken);
}

// ============================================================================
// Boss waves
// ============================================================================

#[test]
fn test_boss_wave_holds_next_wave_until_defeat() {
    let mut orchestrator = GameplayOrchestrator::new(sprint_zone(), 9);
    orchestrator.drain_events();

    let spawned = step_until(&mut orchestrator, 120_000, |e| matches!(e, GameEvent::BossSpawned { .. }));
    assert_eq!(
        spawned,
        Some(GameEvent::BossSpawned {
            boss_id: "sentinel".to_string(),
            phase_count: 1,
        })
    );
    assert!(orchestrator.boss_active());
    assert_eq!(orchestrator.score().waves_cleared, BOSS_WAVE_INTERVAL);
    assert_eq!(orchestrator.current_wave(), BOSS_WAVE_INTERVAL + 1);

    // Well past an intermission: the next wave must not start.
    for _ in 0..400 {
        for event in step(&mut orchestrator) {
            assert!(!matches!(event, GameEvent::WaveStarted { .. }), "wave started during boss: {event:?}");
        }
    }
    assert!(!orchestrator.in_intermission());

    let mut hits = 0;
    while orchestrator.boss_active() && hits < 50 {
        orchestrator.on_attack_hit(TargetRef::Boss);
        hits += 1;
    }
    assert!(!orchestrator.boss_active(), "boss survived {hits} hits");

    let events = orchestrator.drain_events();
    assert!(events.contains(&GameEvent::BossDefeated {
        boss_id: "sentinel".to_string(),
        points: 250 + BOSS_DEFEAT_BONUS,
    }));
    assert_eq!(orchestrator.score().bosses_defeated, 1);
    assert!(orchestrator.achievements().is_unlocked(Achievement::BossSlayer));

    let started = step_until(&mut orchestrator, WAVE_INTERMISSION_MS * 2, |e| {
        matches!(e, GameEvent::WaveStarted { .. })
    });
    assert_eq!(
        started,
        Some(GameEvent::WaveStarted {
            wave_number: BOSS_WAVE_INTERVAL + 1
        })
    );
}

#[test]
fn test_zone_without_boss_skips_boss_wave() {
    let mut zone = sprint_zone();
    zone.boss = None;
    let mut orchestrator = GameplayOrchestrator::new(zone, 9);
    orchestrator.drain_events();

    let started = step_until(&mut orchestrator, 120_000, |e| {
        matches!(e, GameEvent::WaveStarted { wave_number } if *wave_number == BOSS_WAVE_INTERVAL + 1)
    });
    assert!(started.is_some());
    assert!(!orchestrator.boss_active());
    assert_eq!(orchestrator.score().bosses_defeated, 0);
}
