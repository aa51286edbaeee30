//! Registry round-trips against a temporary directory

use pretty_assertions::assert_eq;
use serde_json::json;
use shelfard_core::{Column, ColumnType, Schema};
use shelfard_registry::{RegistryError, SnapshotRegistry};
use std::fs;

fn users_root() -> Column {
    Column::struct_of(
        "",
        vec![
            Column::new("id", ColumnType::Int),
            Column::new("email", ColumnType::bounded_string(12)).with_nullable(true),
            Column::array_of("tags", Column::new("", ColumnType::bounded_string(3))),
            Column::struct_of("profile", vec![Column::new("age", ColumnType::Int).with_default(json!(0))]),
        ],
    )
}

#[test]
fn saved_snapshot_loads_back_unchanged() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path()).unwrap();

    let saved = registry.save("users", users_root()).unwrap();
    let loaded = registry.latest("users").unwrap().unwrap();

    assert_eq!(loaded, saved);
    assert_eq!(loaded.fingerprint().unwrap(), saved.fingerprint().unwrap());
    assert!(dir.path().join("users").join("v1.json").is_file());
}

#[test]
fn missing_baseline_is_none() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path().join("nested").join("registry")).unwrap();

    assert!(registry.latest("users").unwrap().is_none());
    assert!(registry.versions("users").unwrap().is_empty());
    assert!(registry.names().unwrap().is_empty());
}

#[test]
fn get_distinguishes_missing_name_and_version() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path()).unwrap();
    registry.save("users", users_root()).unwrap();

    assert!(matches!(registry.get("orders", 1), Err(RegistryError::NotFound(_))));
    assert!(matches!(
        registry.get("users", 7),
        Err(RegistryError::VersionNotFound { version: 7, .. })
    ));
    assert_eq!(registry.get("users", 1).unwrap().version, 1);
}

#[test]
fn existing_versions_are_never_overwritten() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path()).unwrap();
    let first = registry.save("users", users_root()).unwrap();

    let replacement = Schema::new("users", 1, Column::struct_of("", vec![]));
    assert!(matches!(
        registry.store(&replacement),
        Err(RegistryError::VersionExists { version: 1, .. })
    ));
    assert_eq!(registry.get("users", 1).unwrap(), first);
}

#[test]
fn names_and_history_are_sorted() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path()).unwrap();

    registry.save("orders", users_root()).unwrap();
    registry.save("users", users_root()).unwrap();
    registry.save("users", Column::struct_of("", vec![Column::new("id", ColumnType::BigInt)])).unwrap();
    fs::create_dir_all(dir.path().join("empty")).unwrap();

    assert_eq!(registry.names().unwrap(), vec!["orders".to_string(), "users".to_string()]);

    let history = registry.history("users").unwrap();
    let summary: Vec<(u32, usize)> = history.iter().map(|h| (h.version, h.top_level_columns)).collect();
    assert_eq!(summary, vec![(1, 4), (2, 1)]);
    assert_ne!(history[0].fingerprint, history[1].fingerprint);

    assert!(matches!(registry.history("empty"), Err(RegistryError::NotFound(_))));
}

#[test]
fn unreadable_snapshot_is_reported_as_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path()).unwrap();
    registry.save("users", users_root()).unwrap();

    fs::write(dir.path().join("users").join("v2.json"), "{ not json").unwrap();

    assert!(matches!(registry.latest("users"), Err(RegistryError::Corrupt { .. })));
}

#[test]
fn snapshot_filed_under_wrong_version_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path()).unwrap();
    let saved = registry.save("users", users_root()).unwrap();

    fs::write(dir.path().join("users").join("v5.json"), saved.to_json().unwrap()).unwrap();

    match registry.get("users", 5) {
        Err(RegistryError::Corrupt { reason, .. }) => {
            assert!(reason.contains("expected 'users' version 5"), "{}", reason)
        }
        other => panic!("expected corrupt snapshot, got {:?}", other),
    }
}

#[test]
fn invalid_stored_schema_is_corrupt() {
    let dir = tempfile::tempdir().unwrap();
    let registry = SnapshotRegistry::open(dir.path()).unwrap();

    let mut schema = Schema::new("users", 1, users_root());
    let mut json: serde_json::Value = serde_json::from_str(&schema.to_json().unwrap()).unwrap();
    json["root"]["fields"][1]["position"] = json!(0);
    fs::create_dir_all(dir.path().join("users")).unwrap();
    fs::write(dir.path().join("users").join("v1.json"), json.to_string()).unwrap();

    assert!(matches!(registry.get("users", 1), Err(RegistryError::Corrupt { .. })));

    // An invalid in-memory schema is refused before anything is written
    schema.version = 2;
    if let ColumnType::Struct { fields } = &mut schema.root.column_type {
        fields[1].position = 0;
    }
    assert!(matches!(registry.store(&schema), Err(RegistryError::Schema(_))));
    assert!(!dir.path().join("users").join("v2.json").exists());
}
