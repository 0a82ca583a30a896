//! Table reference extraction from SQL text.
//!
//! Each directive shape has its own small matcher:
//!
//! - [`TABLE_CLAUSE`] finds the identifier after `FROM` / `JOIN`
//! - [`CTE_ALIAS`] finds names introduced by `WITH name AS (` and `), name AS (`
//! - [`EXPRESSION_FROM`] and a `(` check reject `FROM UNNEST(...)`,
//!   `EXTRACT(YEAR FROM x)`, `IS DISTINCT FROM x` and `TRIM(... FROM x)`
//!
//! Results keep first-occurrence order and are deduplicated by
//! [`TableReference::key`], so suffix variants of one table collapse to the
//! first one seen.

use std::collections::HashSet;
use std::sync::LazyLock;

use regex::Regex;

use super::similarity::name_similarity;
use super::table_ref::TableReference;

/// One identifier segment: backticked, bracketed or bare.
const SEGMENT: &str = r"(?:`[^`]+`|\[[^\]]+\]|[A-Za-z0-9_\-*]+)";
const QUOTED_SEGMENT: &str = r"(?:`[^`]+`|\[[^\]]+\])";

/// `FROM <ref>` / `JOIN <ref>` where `<ref>` is 1+ dotted segments. Space
/// around a dot is allowed only before a quoted segment.
static TABLE_CLAUSE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)\b(?:FROM|JOIN)\s+({SEGMENT}(?:\.{SEGMENT}|\s*\.\s*{QUOTED_SEGMENT})*)"
    ))
    .unwrap()
});

/// `WITH [RECURSIVE] name AS (` and the `, name AS (` continuations.
static CTE_ALIAS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)(?:\bWITH\s+(?:RECURSIVE\s+)?|\)\s*,\s*)`?([A-Za-z_][A-Za-z0-9_]*)`?\s+AS\s*\(")
        .unwrap()
});

/// Date parts that may precede `FROM` inside `EXTRACT(...)`.
const DATE_PARTS: &[&str] = &[
    "YEAR",
    "QUARTER",
    "MONTH",
    "WEEK",
    "ISOWEEK",
    "ISOYEAR",
    "DAY",
    "DAYOFWEEK",
    "DAYOFYEAR",
    "DATE",
    "DATETIME",
    "TIME",
    "HOUR",
    "MINUTE",
    "SECOND",
    "MILLISECOND",
    "MICROSECOND",
    "EPOCH",
];

/// Text ending where a `FROM` belongs to an expression rather than a clause.
static EXPRESSION_FROM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(&format!(
        r"(?i)(?:\(\s*(?:{})|\bIS\s+(?:NOT\s+)?DISTINCT|\b(?:TRIM|SUBSTR|SUBSTRING)\s*\([^()]*)\s*$",
        DATE_PARTS.join("|")
    ))
    .unwrap()
});

/// Single-segment matches that are keywords, not tables.
const RESERVED: &[&str] = &[
    "select", "lateral", "unnest", "values", "where", "on", "as", "with", "from", "join",
];

/// Names introduced as common table expressions, lowercased.
pub fn cte_names(sql: &str) -> HashSet<String> {
    CTE_ALIAS
        .captures_iter(sql)
        .filter_map(|cap| cap.get(1))
        .map(|m| m.as_str().to_lowercase())
        .collect()
}

/// Extract every syntactically referenced table from normalized SQL.
///
/// CTE names defined anywhere in `sql` are excluded, even where they
/// reappear after `FROM`.
pub fn extract_table_references(sql: &str) -> Vec<TableReference> {
    extract_excluding(sql, &cte_names(sql))
}

/// Extraction with an explicit CTE exclusion set (lowercased names).
pub fn extract_excluding(sql: &str, ctes: &HashSet<String>) -> Vec<TableReference> {
    let mut refs: Vec<TableReference> = Vec::new();
    let mut seen = HashSet::new();

    for cap in TABLE_CLAUSE.captures_iter(sql) {
        let (Some(whole), Some(ident)) = (cap.get(0), cap.get(1)) else {
            continue;
        };

        if is_non_table_from(&sql[..whole.start()]) || is_function_position(&sql[ident.end()..])
        {
            continue;
        }

        let Some(reference) = TableReference::parse(ident.as_str()) else {
            continue;
        };

        if reference.segments().len() == 1 {
            let name = reference.table().to_lowercase();
            if ctes.contains(&name) || RESERVED.contains(&name.as_str()) {
                continue;
            }
        }

        if seen.insert(reference.key()) {
            refs.push(reference);
        }
    }

    refs
}

/// Pick the primary table: highest name similarity to the view, first occurrence on ties.
pub fn choose_primary(refs: &[TableReference], view_name: &str) -> Option<usize> {
    let mut best: Option<(usize, f64)> = None;
    for (idx, reference) in refs.iter().enumerate() {
        let score = name_similarity(reference.table(), view_name);
        match best {
            Some((_, best_score)) if score <= best_score => {}
            _ => best = Some((idx, score)),
        }
    }
    best.map(|(idx, _)| idx)
}

/// Split `refs` into (primary, remaining) with the similarity rule.
pub fn split_primary(
    mut refs: Vec<TableReference>,
    view_name: &str,
) -> (Option<TableReference>, Vec<TableReference>) {
    match choose_primary(&refs, view_name) {
        Some(idx) => {
            let primary = refs.remove(idx);
            (Some(primary), refs)
        }
        None => (None, refs),
    }
}

/// True when the text before a `FROM`/`JOIN` makes it part of an expression.
fn is_non_table_from(before: &str) -> bool {
    EXPRESSION_FROM.is_match(before)
}

/// True when the identifier is immediately followed by `(`, i.e. a function call.
fn is_function_position(after: &str) -> bool {
    after.trim_start().starts_with('(')
}
