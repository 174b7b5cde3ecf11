//! Configuration files and live reloads.

use std::fs;
use std::sync::Arc;
use tempfile::TempDir;
use trove::{
    load_from_path, ConfigHandle, GridWorld, Position, TreasureConfig, TreasureCoordinator,
    TroveError, TroveResult,
};

#[test]
fn test_reload_swaps_snapshot() -> TroveResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("treasure.json");
    fs::write(&path, r#"{"wear_markers": false, "lock_chance": 0, "mystery": 3}"#)?;

    let handle = ConfigHandle::new(TreasureConfig::for_testing());
    let before = handle.snapshot();
    let warnings = handle.reload_from_path(&path)?;

    assert_eq!(warnings.len(), 1);
    assert!(warnings[0].contains("mystery"));
    let after = handle.snapshot();
    assert!(!after.wear_markers);
    assert_eq!(after.lock_chance, 0.0);
    assert_eq!(after.digging_chance, 1);
    // Old snapshots are untouched.
    assert!(before.wear_markers);
    assert!(!Arc::ptr_eq(&before, &after));
    Ok(())
}

#[test]
fn test_broken_file_keeps_current_options() -> TroveResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("treasure.json");
    fs::write(&path, "{ not json")?;

    let handle = ConfigHandle::new(TreasureConfig::for_testing());
    let result = handle.reload_from_path(&path);
    assert!(matches!(result, Err(TroveError::Serde(_))));
    assert_eq!(handle.snapshot().digging_chance, 1);

    let missing = handle.reload_from_path(dir.path().join("absent.json"));
    assert!(matches!(missing, Err(TroveError::Io(_))));
    Ok(())
}

#[test]
fn test_out_of_range_options_are_clamped() -> TroveResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("treasure.json");
    fs::write(&path, r#"{"creation_tries": 50000, "lock_chance": 250.0}"#)?;

    let load = load_from_path(&path, &TreasureConfig::new())?;
    assert_eq!(load.config.creation_tries, 1000);
    assert_eq!(load.config.lock_chance, 100.0);
    Ok(())
}

#[test]
fn test_coordinator_sees_reloaded_options() -> TroveResult<()> {
    let dir = TempDir::new()?;
    let path = dir.path().join("treasure.json");
    fs::write(&path, r#"{"wear_markers": false}"#)?;

    let mut coordinator = TreasureCoordinator::new(
        GridWorld::flat(64, 10, 4),
        ConfigHandle::new(TreasureConfig::for_testing()),
        4,
    );
    let mut marker = coordinator
        .create_marker_at(Position::new(20, 20), Some(40.0), None)
        .expect("marker");
    assert!(coordinator.read_marker(&mut marker, Position::new(0, 0)).damage_taken > 0.0);

    coordinator.reload_config(&path)?;
    let reading = coordinator.read_marker(&mut marker, Position::new(0, 0));
    assert_eq!(reading.damage_taken, 0.0);
    Ok(())
}
