//! Replays written to disk by a headless session must load and verify.

use cellguard_core::error::GameError;
use cellguard_core::replay::{Replay, ReplayPlayer};
use cellguard_headless::autopilot::Autopilot;
use cellguard_headless::runner::{run_session, SessionConfig};
use cellguard_headless::zone_loader::read_zone_file;
use cellguard_test_utils::fixtures::lungs_zone;

#[test]
fn test_saved_replay_verifies_after_reload() {
    let zone = lungs_zone();
    let config = SessionConfig::new(zone.clone(), 99)
        .with_autopilot(Autopilot::cautious())
        .with_max_duration_ms(30_000)
        .with_replay();
    let result = run_session(config);
    let replay = result.replay.expect("replay was requested");

    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("lungs.replay");
    replay.save(&path).unwrap();

    let loaded = Replay::load(&path).unwrap();
    assert_eq!(loaded, replay);

    let mut player = ReplayPlayer::new(loaded, zone).unwrap();
    player.run_to_end();
    assert!(player.verify());
    assert_eq!(player.orchestrator().state_hash(), result.final_state_hash);
}

#[test]
fn test_truncated_replay_file_is_an_error() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("broken.replay");
    std::fs::write(&path, [1u8, 0, 0]).unwrap();

    assert!(matches!(Replay::load(&path), Err(GameError::ReplayError(_))));
}

#[test]
fn test_missing_replay_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    assert!(matches!(
        Replay::load(dir.path().join("nope.replay")),
        Err(GameError::Io(_))
    ));
}

#[test]
fn test_shipped_zone_files_load() {
    let root = std::path::Path::new(env!("CARGO_MANIFEST_DIR")).join("../../assets/zones");
    for name in ["bloodstream", "lungs"] {
        let zone = read_zone_file(&root.join(format!("{name}.ron"))).unwrap();
        assert_eq!(zone.id, name);
    }
}
