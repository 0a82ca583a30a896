//! Per-view and per-explore result records.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::sql::TableReference;

/// How a view obtains its data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CitationType {
    /// `sql_table_name` names a table directly.
    Native,
    /// A `derived_table` computes the view with SQL.
    Derived,
    /// Populated by an array-flattening join, no table of its own.
    Unnest,
    /// A native derived table sourced from another explore.
    DerivedExplore,
    /// Alias of another view through `from:`.
    DerivedFrom,
    /// `parent__child` view embedded in its parent.
    Nested,
}

impl CitationType {
    pub const ALL: [CitationType; 6] = [
        CitationType::Native,
        CitationType::Derived,
        CitationType::Unnest,
        CitationType::DerivedExplore,
        CitationType::DerivedFrom,
        CitationType::Nested,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CitationType::Native => "native",
            CitationType::Derived => "derived",
            CitationType::Unnest => "unnest",
            CitationType::DerivedExplore => "derived_explore",
            CitationType::DerivedFrom => "derived_from",
            CitationType::Nested => "nested",
        }
    }
}

impl fmt::Display for CitationType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Usage of a view. `Unknown` means no usage source was supplied at all.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status", content = "count")]
pub enum Usage {
    #[default]
    Unknown,
    Known(u64),
}

impl Usage {
    pub fn count(&self) -> Option<u64> {
        match self {
            Usage::Unknown => None,
            Usage::Known(n) => Some(*n),
        }
    }

    pub fn is_known(&self) -> bool {
        matches!(self, Usage::Known(_))
    }
}

impl fmt::Display for Usage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Usage::Unknown => f.write_str("NULL"),
            Usage::Known(n) => write!(f, "{n}"),
        }
    }
}

/// Which directive a view's source text came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SourceKind {
    SqlTableName,
    DerivedTableSql,
    ExploreSource,
    #[default]
    Unknown,
}

impl SourceKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            SourceKind::SqlTableName => "sql_table_name",
            SourceKind::DerivedTableSql => "derived_table_sql",
            SourceKind::ExploreSource => "explore_source",
            SourceKind::Unknown => "unknown",
        }
    }
}

/// Raw source directive, kept for reporting when source detail is requested.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SourceDetail {
    pub kind: SourceKind,
    pub definition: String,
}

/// Finalized analysis result for one view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ViewRecord {
    pub name: String,
    /// File the view was defined in, absent for views only seen in joins.
    pub location: Option<String>,
    /// None when no rule could classify the view.
    pub citation: Option<CitationType>,
    pub primary_table: Option<TableReference>,
    pub additional_tables: Vec<TableReference>,
    /// Immediate `from:` target, only for `derived_from`.
    pub alias_target: Option<String>,
    /// Parent view, only for `nested`.
    pub parent_view: Option<String>,
    /// Explore a `derived_explore` view is built from.
    pub explore_source: Option<String>,
    pub source: Option<SourceDetail>,
    pub usage: Usage,
}

impl ViewRecord {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            location: None,
            citation: None,
            primary_table: None,
            additional_tables: Vec::new(),
            alias_target: None,
            parent_view: None,
            explore_source: None,
            source: None,
            usage: Usage::Unknown,
        }
    }

    /// Primary table followed by additional tables.
    pub fn tables(&self) -> impl Iterator<Item = &TableReference> {
        self.primary_table.iter().chain(self.additional_tables.iter())
    }
}

/// Identity of an explore.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ExploreKey {
    pub model: String,
    pub explore: String,
}

impl ExploreKey {
    pub fn new(model: impl Into<String>, explore: impl Into<String>) -> Self {
        Self {
            model: model.into(),
            explore: explore.into(),
        }
    }
}

impl fmt::Display for ExploreKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.model, self.explore)
    }
}

/// An explore, the views it touches and its raw usage count if known.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExploreRecord {
    pub key: ExploreKey,
    /// Base view plus every joined view, sorted.
    pub views: Vec<String>,
    pub usage: Option<u64>,
}
