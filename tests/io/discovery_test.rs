// tests/io/discovery_test.rs
use std::fs;
use std::path::Path;

use lookml_lineage::discovery::{discover_project, DiscoveryError, DiscoveryOptions};
use lookml_lineage::lookml::UNKNOWN_MODEL;
use tempfile::TempDir;

fn write(root: &Path, relative: &str, content: &str) {
    let path = root.join(relative);
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).unwrap();
    }
    fs::write(path, content).unwrap();
}

fn project() -> TempDir {
    let dir = TempDir::new().unwrap();
    let root = dir.path();
    write(
        root,
        "views/orders.view.lkml",
        "view: orders {\n  sql_table_name: ds.orders ;;\n}\n",
    );
    write(
        root,
        "views/snapshots/orders_snapshot.view.lkml",
        "view: orders_snapshot {\n  sql_table_name: orders ;;\n}\n",
    );
    write(
        root,
        "ecommerce.model.lkml",
        "connection: \"dwh\"\nexplore: orders { }\n",
    );
    write(root, "models/finance.lkml", "explore: ledger { }\n");
    write(
        root,
        "explores/shared.lkml",
        "explore: shared { join: orders { } }\nview: inline_view { sql_table_name: ds.inline ;; }\n",
    );
    write(root, ".git/hidden.view.lkml", "view: hidden { }\n");
    write(root, "README.md", "view: not_lookml { }\n");
    dir
}

// ============================================================================
// Walking
// ============================================================================

#[test]
fn test_discovers_views_in_every_lkml_file() {
    let dir = project();
    let sources = discover_project(dir.path(), &DiscoveryOptions::default()).unwrap();

    let names: Vec<&str> = sources.views.keys().map(String::as_str).collect();
    assert_eq!(names, ["inline_view", "orders", "orders_snapshot"]);
    assert_eq!(sources.views["orders"].file, "views/orders.view.lkml");
}

#[test]
fn test_model_files_own_their_explores() {
    let dir = project();
    let sources = discover_project(dir.path(), &DiscoveryOptions::default()).unwrap();

    let mut models: Vec<&str> = sources.models.iter().map(|m| m.name.as_str()).collect();
    models.sort();
    assert_eq!(models, ["ecommerce", "finance", UNKNOWN_MODEL]);
}

#[test]
fn test_snapshot_marker_flags_views() {
    let dir = project();
    let options = DiscoveryOptions {
        snapshot_marker: Some("_snapshot".to_string()),
        ..Default::default()
    };
    let sources = discover_project(dir.path(), &options).unwrap();
    assert!(sources.views["orders_snapshot"].snapshot_origin);
    assert!(!sources.views["orders"].snapshot_origin);
}

#[test]
fn test_model_filter() {
    let dir = project();
    let options = DiscoveryOptions {
        model: Some("finance".to_string()),
        ..Default::default()
    };
    let sources = discover_project(dir.path(), &options).unwrap();
    assert_eq!(sources.models.len(), 1);
    assert_eq!(sources.models[0].name, "finance");
    // views are still scanned everywhere
    assert_eq!(sources.views.len(), 3);
}

// ============================================================================
// Errors
// ============================================================================

#[test]
fn test_missing_root() {
    let dir = TempDir::new().unwrap();
    let missing = dir.path().join("nope");
    let err = discover_project(&missing, &DiscoveryOptions::default()).unwrap_err();
    assert!(matches!(err, DiscoveryError::DirectoryNotFound { .. }));
}

#[test]
fn test_root_is_a_file() {
    let dir = TempDir::new().unwrap();
    write(dir.path(), "file.lkml", "");
    let err =
        discover_project(&dir.path().join("file.lkml"), &DiscoveryOptions::default()).unwrap_err();
    assert!(matches!(err, DiscoveryError::NotADirectory { .. }));
}
