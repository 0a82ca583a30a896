// tests/analysis/usage_test.rs
use std::collections::{BTreeMap, BTreeSet};
use std::fs;

use lookml_lineage::analysis::{propagate_usage, ExploreKey, UsageData};
use lookml_lineage::usage_data::{load_usage_file, read_usage, UsageDataError};
use tempfile::TempDir;

fn explores(entries: &[(&str, &str, &[&str])]) -> BTreeMap<ExploreKey, BTreeSet<String>> {
    entries
        .iter()
        .map(|(model, explore, views)| {
            (
                ExploreKey::new(*model, *explore),
                views.iter().map(|v| v.to_string()).collect(),
            )
        })
        .collect()
}

// ============================================================================
// Propagation
// ============================================================================

#[test]
fn test_shared_view_gets_sum() {
    let explores = explores(&[
        ("m", "e1", &["shared", "only_one"]),
        ("m", "e2", &["shared"]),
        ("m", "e3", &["shared", "only_three"]),
    ]);
    let mut usage = UsageData::new();
    usage.insert(Some("m"), "e1", 7);
    usage.insert(Some("m"), "e2", 11);
    usage.insert(Some("m"), "e3", 13);

    let by_view = propagate_usage(&explores, Some(&usage)).unwrap();
    assert_eq!(by_view["shared"], 31);
    assert_eq!(by_view["only_one"], 7);
    assert_eq!(by_view["only_three"], 13);
}

#[test]
fn test_no_usage_source_is_none() {
    let explores = explores(&[("m", "e1", &["v"])]);
    assert!(propagate_usage(&explores, None).is_none());
    assert!(propagate_usage(&explores, Some(&UsageData::new()))
        .unwrap()
        .is_empty());
}

#[test]
fn test_model_less_count_applies_to_every_model() {
    let explores = explores(&[("a", "orders", &["x"]), ("b", "orders", &["x", "y"])]);
    let mut usage = UsageData::new();
    usage.insert(None, "orders", 5);

    let by_view = propagate_usage(&explores, Some(&usage)).unwrap();
    assert_eq!(by_view["x"], 10);
    assert_eq!(by_view["y"], 5);
}

#[test]
fn test_exact_model_beats_model_less() {
    let mut usage = UsageData::new();
    usage.insert(None, "orders", 5);
    usage.insert(Some("a"), "orders", 9);
    assert_eq!(usage.get(&ExploreKey::new("a", "orders")), Some(9));
    assert_eq!(usage.get(&ExploreKey::new("b", "orders")), Some(5));
}

// ============================================================================
// Usage files
// ============================================================================

#[test]
fn test_load_header_file() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("usage.csv");
    fs::write(
        &path,
        "model,explore,count\necommerce,sales,100\necommerce,sales_v2,50\necommerce,sales,1\n",
    )
    .unwrap();

    let usage = load_usage_file(&path).unwrap().unwrap();
    assert_eq!(usage.get(&ExploreKey::new("ecommerce", "sales")), Some(101));
    assert_eq!(usage.get(&ExploreKey::new("ecommerce", "sales_v2")), Some(50));
}

#[test]
fn test_load_positional_file_with_separators() {
    let dir = TempDir::new().unwrap();
    let path = dir.path().join("activities.csv");
    fs::write(&path, "Explore,Label,Runs\nsales,Sales,\"12,345\"\n").unwrap();

    let usage = load_usage_file(&path).unwrap().unwrap();
    assert_eq!(usage.get(&ExploreKey::new("anything", "sales")), Some(12_345));
}

#[test]
fn test_missing_file_means_unknown_usage() {
    let dir = TempDir::new().unwrap();
    assert!(load_usage_file(&dir.path().join("absent.csv"))
        .unwrap()
        .is_none());
}

#[test]
fn test_non_numeric_count_is_an_error() {
    let err = read_usage("explore,usage\nsales,n/a\n".as_bytes()).unwrap_err();
    assert!(matches!(err, UsageDataError::InvalidCount { .. }));
    assert!(err.to_string().contains("n/a"));
}
