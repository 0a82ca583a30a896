//! View source classification.
//!
//! A view's own definition decides its citation type. The first rule that
//! matches wins:
//!
//! 1. `explore_source:` anywhere in the definition: `derived_explore`
//! 2. `sql_table_name:` at the view's top level: `native`
//! 3. `derived_table: { sql: ... ;; }`: `derived`
//! 4. the view is populated by an unnest join: `unnest`
//! 5. otherwise unresolved here; consolidation may still find an alias
//!
//! Rules 2 and 3 yield table candidates. The primary is picked by name
//! similarity to the view.

use tracing::debug;

use super::blocks::{
    has_directive, keyed_block, name_directive, sql_directive, top_level_text, Directive,
};
use crate::analysis::{CitationType, Diagnostic, SourceDetail, SourceKind};
use crate::sql::extract::split_primary;
use crate::sql::liquid::branch_fragments;
use crate::sql::{
    extract_table_references, extract_templated_references, has_conditionals, normalize,
    TableReference,
};

/// Classifier output for one view, before alias resolution and qualification.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Classification {
    pub citation: Option<CitationType>,
    pub primary: Option<TableReference>,
    pub additional: Vec<TableReference>,
    pub explore_source: Option<String>,
    pub detail: SourceDetail,
    pub diagnostics: Vec<Diagnostic>,
}

impl Classification {
    fn with_tables(&mut self, refs: Vec<TableReference>, view: &str) {
        let (primary, additional) = split_primary(refs, view);
        self.primary = primary;
        self.additional = additional;
    }
}

/// Classify one view from its comment-stripped definition body.
pub fn classify_view(name: &str, definition: &str, is_unnest: bool) -> Classification {
    let mut out = Classification {
        detail: source_detail(definition),
        ..Default::default()
    };

    if has_directive(definition, Directive::ExploreSource) {
        out.citation = Some(CitationType::DerivedExplore);
        out.explore_source = name_directive(definition, Directive::ExploreSource);
        debug!(view = name, explore = ?out.explore_source, "derived_explore");
        return out;
    }

    let top = top_level_text(definition);
    let derived = keyed_block(definition, Directive::DerivedTable);

    if let Some(value) = sql_directive(&top, Directive::SqlTableName) {
        if derived.is_some() {
            out.diagnostics.push(Diagnostic::AmbiguousSource {
                view: name.to_string(),
            });
        }

        let refs = parse_table_name(&value);
        if refs.is_empty() {
            out.diagnostics.push(Diagnostic::malformed(
                name,
                format!("sql_table_name `{value}` is not a table identifier"),
            ));
            return out;
        }

        out.citation = Some(CitationType::Native);
        out.with_tables(refs, name);
        debug!(view = name, primary = ?out.primary.as_ref().map(|t| t.to_string()), "native");
        return out;
    }

    if let Some(derived) = derived {
        let Some(sql) = sql_directive(derived, Directive::Sql) else {
            out.diagnostics.push(Diagnostic::malformed(
                name,
                "derived_table has neither sql nor explore_source",
            ));
            return out;
        };

        let sql = normalize(&sql);
        let refs = if has_conditionals(&sql) {
            extract_templated_references(&sql)
        } else {
            extract_table_references(&sql)
        };
        if refs.is_empty() {
            out.diagnostics.push(Diagnostic::malformed(
                name,
                "derived_table sql references no tables",
            ));
        }

        out.citation = Some(CitationType::Derived);
        out.with_tables(refs, name);
        debug!(view = name, tables = out.additional.len() + usize::from(out.primary.is_some()), "derived");
        return out;
    }

    if is_unnest {
        out.citation = Some(CitationType::Unnest);
    }
    out
}

/// Identifiers named by a `sql_table_name` value, one per Liquid branch.
fn parse_table_name(value: &str) -> Vec<TableReference> {
    let value = normalize(value);
    if !has_conditionals(&value) {
        return TableReference::parse(&value).into_iter().collect();
    }

    let mut refs: Vec<TableReference> = Vec::new();
    for fragment in branch_fragments(&value) {
        if let Some(reference) = TableReference::parse(&fragment) {
            if !refs.iter().any(|r| r.same_table(&reference)) {
                refs.push(reference);
            }
        }
    }
    refs
}

/// The directive a view's source comes from, as written.
pub fn source_detail(definition: &str) -> SourceDetail {
    if let Some(explore) = name_directive(definition, Directive::ExploreSource) {
        return SourceDetail {
            kind: SourceKind::ExploreSource,
            definition: explore,
        };
    }

    if let Some(value) = sql_directive(&top_level_text(definition), Directive::SqlTableName) {
        return SourceDetail {
            kind: SourceKind::SqlTableName,
            definition: value,
        };
    }

    if let Some(sql) = keyed_block(definition, Directive::DerivedTable)
        .and_then(|d| sql_directive(d, Directive::Sql))
    {
        return SourceDetail {
            kind: SourceKind::DerivedTableSql,
            definition: sql,
        };
    }

    SourceDetail::default()
}

/// Quote- and comment-normalized copy of a source definition, on one line.
pub fn normalized_definition(detail: &SourceDetail) -> String {
    normalize(&detail.definition)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}
