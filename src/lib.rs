//! # LookML Lineage
//!
//! Derives, for every view in a LookML project, the physical tables it reads
//! from, how it obtains its data, and how heavily it is used through explores.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────┐
//! │         LookML project (views, models, explores)         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [discovery]
//! ┌─────────────────────────────────────────────────────────┐
//! │                   ProjectSources                         │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [lookml graph + classifier, sql extraction]
//! ┌─────────────────────────────────────────────────────────┐
//! │        ViewRecord per view (tables, citation type)       │
//! │        + explore usage from [usage_data]                 │
//! └─────────────────────────────────────────────────────────┘
//!                          │
//!                          ▼ [report]
//! ┌─────────────────────────────────────────────────────────┐
//! │   view_analysis.csv, export commands, analysis.json      │
//! └─────────────────────────────────────────────────────────┘
//! ```
//!
//! SQL inspection is heuristic: identifiers after `FROM`/`JOIN` are read
//! with regexes, CTE aliases are excluded and every Liquid branch is kept.

pub mod analysis;
pub mod config;
pub mod discovery;
pub mod logging;
pub mod lookml;
pub mod report;
pub mod sql;
pub mod usage_data;

pub use analysis::{
    analyze, AnalysisError, AnalysisOutput, CitationType, Diagnostic, ExploreKey, ExploreRecord,
    Usage, UsageData, ViewRecord,
};
pub use config::{AnalysisConfig, Settings};
pub use discovery::{discover_project, DiscoveryOptions};
pub use lookml::{ModelSource, ProjectSources, ViewSource};
pub use sql::TableReference;
pub use usage_data::load_usage_file;
