// tests/sql/extract_test.rs
use lookml_lineage::sql::{
    cte_names, extract_table_references, normalize, QualifyError, SuffixVariant, TableReference,
};

fn names(sql: &str) -> Vec<String> {
    extract_table_references(&normalize(sql))
        .iter()
        .map(ToString::to_string)
        .collect()
}

// ============================================================================
// CTE exclusion
// ============================================================================

#[test]
fn test_cte_alias_never_reported() {
    let cases = [
        "WITH x AS (SELECT * FROM ds.a) SELECT * FROM x",
        "WITH y AS (SELECT 1), x AS (SELECT * FROM ds.a) SELECT * FROM x JOIN y ON TRUE",
        "with x as (select * from ds.a) select * from ds.b join x using (id)",
        "WITH `x` AS (SELECT * FROM ds.a) SELECT * FROM x",
    ];
    for sql in cases {
        let found = names(sql);
        assert!(!found.iter().any(|n| n.eq_ignore_ascii_case("x")), "{sql}: {found:?}");
        assert!(found.contains(&"ds.a".to_string()), "{sql}: {found:?}");
    }
}

#[test]
fn test_cte_names_lowercased() {
    let ctes = cte_names("WITH Base AS (SELECT 1), Agg AS (SELECT 2) SELECT 3");
    assert!(ctes.contains("base"));
    assert!(ctes.contains("agg"));
    assert_eq!(ctes.len(), 2);
}

// ============================================================================
// Normalized input
// ============================================================================

#[test]
fn test_ansi_quotes_and_comments_normalized() {
    let sql = "SELECT *\n\
               -- FROM commented.out\n\
               FROM \"analytics\".\"orders\" o\n\
               /* JOIN also.commented */\n\
               JOIN `proj.ds.customers` c ON o.cid = c.id";
    assert_eq!(names(sql), ["analytics.orders", "proj.ds.customers"]);
}

#[test]
fn test_segment_forms() {
    assert_eq!(
        names("SELECT * FROM orders JOIN sales.items JOIN p.sales.refunds"),
        ["orders", "sales.items", "p.sales.refunds"]
    );
}

// ============================================================================
// Table references
// ============================================================================

#[test]
fn test_date_suffix_variant() {
    let r = TableReference::parse("`proj.ds.orders_20240101`").unwrap();
    assert_eq!(r.to_string(), "proj.ds.orders");
    assert_eq!(r.variant(), SuffixVariant::DatePartitioned);
}

#[test]
fn test_qualification_idempotent() {
    for ident in ["orders", "ds.orders", "p.ds.orders"] {
        let once = TableReference::parse(ident)
            .unwrap()
            .qualify(Some("p"), Some("ds"))
            .unwrap();
        assert!(once.is_fully_qualified());
        assert_eq!(once.to_string(), "p.ds.orders");
        assert_eq!(once.qualify(Some("other"), Some("x")).unwrap(), once);
    }
}

#[test]
fn test_qualification_without_defaults() {
    let bare = TableReference::parse("orders").unwrap();
    assert_eq!(bare.qualify(None, Some("ds")), Err(QualifyError::MissingProject));
    assert_eq!(bare.qualify(Some("p"), None), Err(QualifyError::MissingDataset));

    let full = TableReference::parse("p.ds.orders").unwrap();
    assert_eq!(full.qualify(None, None).unwrap(), full);
}
