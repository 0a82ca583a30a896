//! The analysis run.
//!
//! [`analyze`] takes the whole project snapshot and produces one record per
//! view:
//!
//! ```text
//! ProjectSources ──► RelationshipGraph ──┐
//!        │                               ▼
//!        └──────► classify_view ──► consolidate ──► propagate_usage ──► AnalysisOutput
//! ```
//!
//! Graph facts are gathered once before any view is classified and are
//! read-only afterwards. Per-view problems become [`Diagnostic`]s; only an
//! empty project fails the run.

pub mod consolidate;
pub mod diagnostics;
pub mod record;
pub mod usage;

use std::collections::BTreeMap;

use serde::Serialize;
use thiserror::Error;
use tracing::{info, warn};

use crate::config::AnalysisConfig;
use crate::lookml::{ProjectSources, RelationshipGraph};

pub use consolidate::consolidate;
pub use diagnostics::Diagnostic;
pub use record::{
    CitationType, ExploreKey, ExploreRecord, SourceDetail, SourceKind, Usage, ViewRecord,
};
pub use usage::{propagate_usage, UsageData};

/// Run-level failures.
#[derive(Debug, Error)]
pub enum AnalysisError {
    #[error("no views or explores found in project")]
    EmptyProject,
}

pub type AnalysisResult<T> = Result<T, AnalysisError>;

/// Everything reporting needs from one run.
#[derive(Debug, Clone, Serialize)]
pub struct AnalysisOutput {
    /// One record per view, sorted by name.
    pub views: Vec<ViewRecord>,
    pub explores: Vec<ExploreRecord>,
    /// False when no usage source was supplied; every view's usage is then unknown.
    pub usage_available: bool,
    pub diagnostics: Vec<Diagnostic>,
}

impl AnalysisOutput {
    pub fn view(&self, name: &str) -> Option<&ViewRecord> {
        self.views
            .binary_search_by(|r| r.name.as_str().cmp(name))
            .ok()
            .map(|idx| &self.views[idx])
    }

    /// Number of explores that touch a view.
    pub fn explore_count(&self, view: &str) -> usize {
        self.explores
            .iter()
            .filter(|e| e.views.iter().any(|v| v == view))
            .count()
    }

    /// Views per citation type, zero for unused types. Unresolved views
    /// count under `unknown`.
    pub fn citation_counts(&self) -> BTreeMap<&'static str, usize> {
        let mut counts: BTreeMap<&'static str, usize> =
            CitationType::ALL.iter().map(|c| (c.as_str(), 0)).collect();
        for record in &self.views {
            let label = record.citation.map(|c| c.as_str()).unwrap_or("unknown");
            *counts.entry(label).or_insert(0) += 1;
        }
        counts
    }
}

/// Analyze a project snapshot.
///
/// `usage` of None means no usage source was given, which is different
/// from a usage source that mentions no explores.
pub fn analyze(
    sources: &ProjectSources,
    usage: Option<&UsageData>,
    config: &AnalysisConfig,
) -> AnalysisResult<AnalysisOutput> {
    let graph = RelationshipGraph::build(&sources.models, &sources.views);
    if sources.views.is_empty() && graph.explores.is_empty() {
        return Err(AnalysisError::EmptyProject);
    }

    let (mut views, view_diagnostics) = consolidate(sources, &graph, config);
    let mut diagnostics = graph.diagnostics.clone();
    diagnostics.extend(view_diagnostics);

    let by_view = propagate_usage(&graph.explores, usage);
    for record in &mut views {
        record.usage = match &by_view {
            Some(counts) => Usage::Known(counts.get(&record.name).copied().unwrap_or(0)),
            None => Usage::Unknown,
        };
    }

    let explores: Vec<ExploreRecord> = graph
        .explores
        .iter()
        .map(|(key, members)| ExploreRecord {
            key: key.clone(),
            views: members.iter().cloned().collect(),
            usage: usage.and_then(|u| u.get(key)),
        })
        .collect();

    if let Some(usage) = usage {
        let matched = explores.iter().filter(|e| e.usage.is_some()).count();
        info!(entries = usage.len(), matched, "usage applied");
    }

    for diagnostic in &diagnostics {
        warn!("{diagnostic}");
    }

    info!(
        views = views.len(),
        explores = explores.len(),
        diagnostics = diagnostics.len(),
        "analysis complete"
    );

    Ok(AnalysisOutput {
        views,
        explores,
        usage_available: usage.is_some(),
        diagnostics,
    })
}
