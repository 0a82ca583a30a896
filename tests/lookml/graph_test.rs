// tests/lookml/graph_test.rs
use std::collections::BTreeMap;

use lookml_lineage::analysis::{Diagnostic, ExploreKey};
use lookml_lineage::lookml::{ModelSource, RelationshipGraph, ViewSource};

const MODEL: &str = r#"
connection: "warehouse"
include: "/views/*.view.lkml"

explore: sales {
  label: "Sales"
  join: customers {
    sql_on: ${orders.customer_id} = ${customers.id} ;;
    relationship: many_to_one
  }
  view_name: orders
}

explore: sales_v2 {
  from: orders
}

explore: inventory {
  join: flat_items {
    sql: LEFT JOIN UNNEST(${inventory.items}) AS flat_items ;;
    relationship: one_to_many
  }
  join: warehouse_items {
    sql: CROSS JOIN UNNEST(${inventory.items}) AS warehouse_items ;;
  }
}
"#;

fn views() -> BTreeMap<String, ViewSource> {
    let mut views = BTreeMap::new();
    views.insert(
        "warehouse_items".to_string(),
        ViewSource::new("sql_table_name: ds.warehouse_items ;;", "views/wh.view.lkml"),
    );
    views
}

fn graph(models: &[(&str, &str)]) -> RelationshipGraph {
    let models: Vec<ModelSource> = models
        .iter()
        .map(|(name, text)| ModelSource::new(*name, *text, format!("{name}.model.lkml")))
        .collect();
    RelationshipGraph::build(&models, &views())
}

fn members(graph: &RelationshipGraph, model: &str, explore: &str) -> Vec<String> {
    graph.explores[&ExploreKey::new(model, explore)]
        .iter()
        .cloned()
        .collect()
}

// ============================================================================
// View sets
// ============================================================================

#[test]
fn test_explore_view_sets() {
    let g = graph(&[("ecommerce", MODEL)]);
    assert_eq!(g.explores.len(), 3);
    assert_eq!(members(&g, "ecommerce", "sales"), ["customers", "orders"]);
    assert_eq!(members(&g, "ecommerce", "sales_v2"), ["orders"]);
    assert_eq!(
        members(&g, "ecommerce", "inventory"),
        ["flat_items", "inventory", "warehouse_items"]
    );
    assert_eq!(g.explore_count("orders"), 2);
    assert_eq!(g.explore_count("customers"), 1);
}

#[test]
fn test_same_explore_in_two_models_is_two_explores() {
    let g = graph(&[("a", "explore: shared { }"), ("b", "explore: shared { }")]);
    assert_eq!(g.explores.len(), 2);
    assert_eq!(g.explore_count("shared"), 2);
}

// ============================================================================
// Aliases and unnest
// ============================================================================

#[test]
fn test_explore_from_records_alias() {
    let g = graph(&[("ecommerce", MODEL)]);
    assert_eq!(g.aliases.target("sales_v2"), Some("orders"));
    // view_name: is not an alias
    assert_eq!(g.aliases.target("sales"), None);
}

#[test]
fn test_unnest_requires_no_own_source() {
    let g = graph(&[("ecommerce", MODEL)]);
    assert!(g.unnest_views.contains("flat_items"));
    assert!(!g.unnest_views.contains("warehouse_items"));
}

#[test]
fn test_alias_chain_keeps_immediate_target() {
    let model = "explore: base { join: mid { from: base } join: top { from: mid } }";
    let g = graph(&[("m", model)]);
    assert_eq!(g.aliases.target("top"), Some("mid"));
    assert_eq!(g.aliases.target("mid"), Some("base"));
    assert!(g.diagnostics.is_empty());
}

#[test]
fn test_alias_cycle_broken_with_diagnostic() {
    let model = "explore: e { join: a { from: b } join: b { from: a } }";
    let g = graph(&[("m", model)]);

    assert!(g.aliases.detect_cycles().is_empty());
    assert_eq!(g.diagnostics.len(), 1);
    assert!(matches!(
        &g.diagnostics[0],
        Diagnostic::AliasCycle { members, .. } if members == &["a".to_string(), "b".to_string()]
    ));
    assert_eq!(g.aliases.target("a"), Some("b"));
    assert_eq!(g.aliases.target("b"), None);
}

#[test]
fn test_conflicting_alias_keeps_first() {
    let model = "explore: e1 { join: x { from: first } }\n\
                 explore: e2 { join: x { from: second } }";
    let g = graph(&[("m", model)]);
    assert_eq!(g.aliases.target("x"), Some("first"));
    assert!(matches!(&g.diagnostics[0], Diagnostic::ConflictingAlias { view, .. } if view == "x"));
}
