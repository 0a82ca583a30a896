//! Merge classification, alias edges and unnest membership into one record per view.

use std::collections::{BTreeMap, BTreeSet};

use tracing::debug;

use super::diagnostics::Diagnostic;
use super::record::{CitationType, ViewRecord};
use crate::config::AnalysisConfig;
use crate::lookml::{classify_view, ProjectSources, RelationshipGraph};
use crate::sql::TableReference;

/// Separator between a parent view and an embedded child view's name.
const NESTED_SEPARATOR: &str = "__";

/// Build the final, qualified record for every view the project mentions.
///
/// Views come from source files, explore view sets and both ends of alias
/// edges. Records are returned sorted by name.
pub fn consolidate(
    sources: &ProjectSources,
    graph: &RelationshipGraph,
    config: &AnalysisConfig,
) -> (Vec<ViewRecord>, Vec<Diagnostic>) {
    let mut names: BTreeSet<String> = sources.views.keys().cloned().collect();
    names.extend(graph.referenced_views());

    let mut diagnostics = Vec::new();
    let mut records: BTreeMap<String, ViewRecord> = BTreeMap::new();
    // Views that already carry a diagnostic from classification.
    let mut flagged: BTreeSet<String> = BTreeSet::new();

    for name in names {
        let mut record = ViewRecord::new(name.as_str());
        let source = sources.views.get(&name);
        let definition = source.map(|s| s.text.as_str()).unwrap_or_default();
        let classification =
            classify_view(&name, definition, graph.unnest_views.contains(&name));

        if let Some(source) = source {
            record.location = Some(source.file.clone());
            if config.include_source_detail {
                record.source = Some(classification.detail.clone());
            }
        }

        if let Some(target) = graph.aliases.target(&name) {
            debug!(view = %name, alias = target, "derived_from");
            record.citation = Some(CitationType::DerivedFrom);
            record.alias_target = Some(target.to_string());
            records.insert(name, record);
            continue;
        }

        if !classification.diagnostics.is_empty() {
            flagged.insert(name.clone());
            diagnostics.extend(classification.diagnostics);
        }

        let snapshot = source.is_some_and(|s| s.snapshot_origin);
        let (primary, additional) = qualify_tables(
            &name,
            classification.primary,
            classification.additional,
            snapshot,
            config,
            &mut diagnostics,
        );
        record.citation = classification.citation;
        record.primary_table = primary;
        record.additional_tables = additional;
        record.explore_source = classification.explore_source;

        records.insert(name, record);
    }

    resolve_nested(&mut records);

    for record in records.values() {
        if record.citation.is_none() && !flagged.contains(&record.name) {
            diagnostics.push(Diagnostic::malformed(
                &record.name,
                "no sql_table_name, derived_table, from: alias or unnest join",
            ));
        }
    }

    (records.into_values().collect(), diagnostics)
}

/// Classify unresolved `parent__child` views whose parent exists as `nested`.
fn resolve_nested(records: &mut BTreeMap<String, ViewRecord>) {
    let candidates: Vec<(String, String)> = records
        .values()
        .filter(|r| r.citation.is_none())
        .filter_map(|r| {
            let (parent, child) = r.name.split_once(NESTED_SEPARATOR)?;
            if parent.is_empty() || child.is_empty() || !records.contains_key(parent) {
                return None;
            }
            Some((r.name.clone(), parent.to_string()))
        })
        .collect();

    for (name, parent) in candidates {
        let (primary, additional) = match records.get(&parent) {
            Some(p) => (p.primary_table.clone(), p.additional_tables.clone()),
            None => continue,
        };
        if let Some(record) = records.get_mut(&name) {
            debug!(view = %name, parent = %parent, "nested");
            record.citation = Some(CitationType::Nested);
            record.parent_view = Some(parent);
            record.primary_table = primary;
            record.additional_tables = additional;
        }
    }
}

/// Qualify every table, dropping ones that cannot be completed, then deduplicate.
///
/// If the primary cannot be qualified the next table takes its place.
fn qualify_tables(
    view: &str,
    primary: Option<TableReference>,
    additional: Vec<TableReference>,
    snapshot: bool,
    config: &AnalysisConfig,
    diagnostics: &mut Vec<Diagnostic>,
) -> (Option<TableReference>, Vec<TableReference>) {
    let (project, dataset) = config.qualification_pair(snapshot);
    let mut qualified: Vec<TableReference> = Vec::new();

    for table in primary.into_iter().chain(additional) {
        match table.qualify(project, dataset) {
            Ok(full) => {
                if !qualified.iter().any(|q| q.same_table(&full)) {
                    qualified.push(full);
                }
            }
            Err(err) => diagnostics.push(Diagnostic::ConfigurationError {
                view: view.to_string(),
                table: table.to_string(),
                reason: err.to_string(),
            }),
        }
    }

    let mut tables = qualified.into_iter();
    (tables.next(), tables.collect())
}
