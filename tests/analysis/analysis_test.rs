// tests/analysis/analysis_test.rs
use lookml_lineage::analysis::{
    analyze, AnalysisOutput, CitationType, Diagnostic, Usage, UsageData,
};
use lookml_lineage::config::AnalysisConfig;
use lookml_lineage::lookml::{ModelSource, ProjectSources};

const VIEWS: &str = r#"
view: orders {
  sql_table_name: `proj.ds.orders_20240101` ;;
}

view: customers {
  sql_table_name: crm.customers ;;
}

view: order_items {
  derived_table: {
    sql: SELECT * FROM order_items_raw JOIN proj.ds.orders_streaming USING (order_id) ;;
  }
}

view: orders__lines {
  dimension: sku { sql: ${TABLE}.sku ;; }
}

view: inventory {
  sql_table_name: ops.inventory ;;
}
"#;

const MODEL: &str = r#"
explore: sales {
  view_name: orders
  join: customers { sql_on: ${orders.cid} = ${customers.id} ;; }
  join: legacy_orders { from: orders }
}

explore: sales_v2 {
  view_name: orders
  join: order_items { sql_on: TRUE ;; }
}

explore: inventory {
  join: flat_items {
    sql: LEFT JOIN UNNEST(${inventory.items}) AS flat_items ;;
  }
}
"#;

fn sources() -> ProjectSources {
    let mut sources = ProjectSources::new();
    sources.add_views_from_text(VIEWS, "views/all.view.lkml", None);
    sources.add_model(ModelSource::new("ecommerce", MODEL, "ecommerce.model.lkml"));
    sources
}

fn run(usage: Option<&UsageData>) -> AnalysisOutput {
    analyze(&sources(), usage, &AnalysisConfig::new("dwh", "analytics")).unwrap()
}

fn tables(output: &AnalysisOutput, view: &str) -> Vec<String> {
    output
        .view(view)
        .unwrap()
        .tables()
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Classification scenarios
// ============================================================================

#[test]
fn test_native_table_with_date_suffix() {
    let output = run(None);
    let orders = output.view("orders").unwrap();
    assert_eq!(orders.citation, Some(CitationType::Native));
    assert_eq!(orders.primary_table.as_ref().unwrap().to_string(), "proj.ds.orders");
    assert_eq!(orders.location.as_deref(), Some("views/all.view.lkml"));
}

#[test]
fn test_unnest_view_has_no_tables() {
    let output = run(None);
    let flat = output.view("flat_items").unwrap();
    assert_eq!(flat.citation, Some(CitationType::Unnest));
    assert_eq!(flat.tables().count(), 0);
    assert!(flat.location.is_none());
}

#[test]
fn test_join_alias_is_derived_from() {
    let output = run(None);
    let legacy = output.view("legacy_orders").unwrap();
    assert_eq!(legacy.citation, Some(CitationType::DerivedFrom));
    assert_eq!(legacy.alias_target.as_deref(), Some("orders"));
    assert_eq!(legacy.tables().count(), 0);
}

#[test]
fn test_nested_view_inherits_parent_tables() {
    let output = run(None);
    let lines = output.view("orders__lines").unwrap();
    assert_eq!(lines.citation, Some(CitationType::Nested));
    assert_eq!(lines.parent_view.as_deref(), Some("orders"));
    assert_eq!(tables(&output, "orders__lines"), ["proj.ds.orders"]);
}

// ============================================================================
// Qualification
// ============================================================================

#[test]
fn test_every_table_fully_qualified() {
    let output = run(None);
    assert_eq!(tables(&output, "customers"), ["dwh.crm.customers"]);
    assert_eq!(
        tables(&output, "order_items"),
        ["dwh.analytics.order_items_raw", "proj.ds.orders"]
    );
    for record in &output.views {
        assert!(record.tables().all(|t| t.is_fully_qualified()), "{}", record.name);
    }
}

#[test]
fn test_missing_defaults_become_configuration_errors() {
    let config = AnalysisConfig {
        default_project: None,
        ..AnalysisConfig::new("unused", "analytics")
    };
    let output = analyze(&sources(), None, &config).unwrap();

    assert_eq!(tables(&output, "order_items"), ["proj.ds.orders"]);
    assert!(tables(&output, "customers").is_empty());
    let errors: Vec<&str> = output
        .diagnostics
        .iter()
        .filter(|d| matches!(d, Diagnostic::ConfigurationError { .. }))
        .map(Diagnostic::view)
        .collect();
    assert!(errors.contains(&"customers"));
    assert!(errors.contains(&"order_items"));
}

// ============================================================================
// Usage
// ============================================================================

#[test]
fn test_usage_sums_across_explores() {
    let mut usage = UsageData::new();
    usage.insert(Some("ecommerce"), "sales", 100);
    usage.insert(Some("ecommerce"), "sales_v2", 50);

    let output = run(Some(&usage));
    assert!(output.usage_available);
    assert_eq!(output.view("orders").unwrap().usage, Usage::Known(150));
    assert_eq!(output.view("customers").unwrap().usage, Usage::Known(100));
    assert_eq!(output.view("order_items").unwrap().usage, Usage::Known(50));
    // known usage source, no counted explore
    assert_eq!(output.view("inventory").unwrap().usage, Usage::Known(0));
}

#[test]
fn test_no_usage_source_is_unknown_everywhere() {
    let output = run(None);
    assert!(!output.usage_available);
    assert!(output.views.iter().all(|v| v.usage == Usage::Unknown));
    assert!(output.explores.iter().all(|e| e.usage.is_none()));
}

#[test]
fn test_explore_records() {
    let output = run(None);
    let names: Vec<String> = output.explores.iter().map(|e| e.key.to_string()).collect();
    assert_eq!(
        names,
        ["ecommerce.inventory", "ecommerce.sales", "ecommerce.sales_v2"]
    );
    assert_eq!(output.explore_count("orders"), 2);
}

#[test]
fn test_records_sorted_and_unique() {
    let output = run(None);
    let names: Vec<&str> = output.views.iter().map(|v| v.name.as_str()).collect();
    let mut sorted = names.clone();
    sorted.sort();
    sorted.dedup();
    assert_eq!(names, sorted);
}
