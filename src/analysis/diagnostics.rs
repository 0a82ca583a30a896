//! Per-record problems found during analysis.
//!
//! None of these stop a run. The affected view is degraded and kept.

use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Error)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Diagnostic {
    #[error("view `{view}`: malformed source: {reason}")]
    MalformedSource { view: String, reason: String },

    #[error("alias cycle {}: dropped `{from}` -> `{to}`", .members.join(" -> "))]
    AliasCycle {
        members: Vec<String>,
        from: String,
        to: String,
    },

    #[error("view `{view}`: cannot qualify `{table}`: {reason}")]
    ConfigurationError {
        view: String,
        table: String,
        reason: String,
    },

    #[error("view `{view}`: both sql_table_name and derived_table present, using sql_table_name")]
    AmbiguousSource { view: String },

    #[error("view `{view}`: aliased to `{kept}` and `{ignored}`, keeping `{kept}`")]
    ConflictingAlias {
        view: String,
        kept: String,
        ignored: String,
    },
}

impl Diagnostic {
    /// View the diagnostic is about. Alias cycles report the edge's source.
    pub fn view(&self) -> &str {
        match self {
            Diagnostic::MalformedSource { view, .. }
            | Diagnostic::ConfigurationError { view, .. }
            | Diagnostic::AmbiguousSource { view }
            | Diagnostic::ConflictingAlias { view, .. } => view,
            Diagnostic::AliasCycle { from, .. } => from,
        }
    }

    pub(crate) fn malformed(view: &str, reason: impl Into<String>) -> Self {
        Diagnostic::MalformedSource {
            view: view.to_string(),
            reason: reason.into(),
        }
    }
}
