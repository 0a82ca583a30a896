// tests/sql/liquid_test.rs
use lookml_lineage::sql::liquid::branch_fragments;
use lookml_lineage::sql::{extract_templated_references, has_conditionals, normalize};

fn names(sql: &str) -> Vec<String> {
    extract_templated_references(&normalize(sql))
        .iter()
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// Branch union
// ============================================================================

#[test]
fn test_mutually_exclusive_branches_all_reported() {
    let sql = r#"
        SELECT *
        FROM {% if _user_attributes['region'] == 'eu' %}
          eu.orders
        {% elsif _user_attributes['region'] == 'us' %}
          us.orders
        {% else %}
          global.orders
        {% endif %}
    "#;
    assert_eq!(names(sql), ["eu.orders", "us.orders", "global.orders"]);
}

#[test]
fn test_condition_that_is_always_false_still_extracted() {
    let sql = "SELECT * FROM ds.base {% if 1 == 2 %} JOIN ds.never ON TRUE {% endif %}";
    assert_eq!(names(sql), ["ds.base", "ds.never"]);
}

#[test]
fn test_nested_conditionals_recurse_past_first_endif() {
    let sql = "SELECT * FROM ds.a \
               {% if x %} JOIN {% if y %} ds.b {% endif %} ON TRUE JOIN ds.c ON TRUE {% endif %}";
    let mut found = names(sql);
    found.sort();
    assert_eq!(found, ["ds.a", "ds.b", "ds.c"]);
}

#[test]
fn test_outer_text_around_conditional() {
    let fragments = branch_fragments("A {% if x %}B{% else %}C{% endif %} D");
    assert_eq!(fragments, ["A   D", "B", "C"]);
}

#[test]
fn test_plain_sql_has_no_conditionals() {
    let sql = "SELECT {{ _user_attributes['x'] }} FROM ds.t";
    assert!(!has_conditionals(sql));
    assert_eq!(names(sql), ["ds.t"]);
}

// ============================================================================
// CTEs across branches
// ============================================================================

#[test]
fn test_cte_defined_outside_conditional() {
    let sql = "WITH recent AS (SELECT * FROM ds.events) \
               SELECT * FROM {% if a %} recent {% else %} ds.archive {% endif %}";
    assert_eq!(names(sql), ["ds.events", "ds.archive"]);
}

// ============================================================================
// Conditionals inside identifiers
// ============================================================================

#[test]
fn test_conditional_table_suffix_keeps_dataset() {
    let sql = "SELECT * FROM proj.ds.{% if env == 'dev' %}orders_dev{% else %}orders{% endif %} o \
               JOIN ds.customers c ON c.id = o.customer_id";
    assert_eq!(
        names(sql),
        ["ds.customers", "proj.ds.orders_dev", "proj.ds.orders"]
    );
}

#[test]
fn test_conditional_dataset_keeps_table() {
    let sql = "SELECT * FROM `proj.{% if env == 'dev' %}staging{% else %}prod{% endif %}.orders`";
    assert_eq!(names(sql), ["proj.staging.orders", "proj.prod.orders"]);
}
