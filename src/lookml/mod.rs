//! LookML project scanning.
//!
//! - [`blocks`] - comment stripping, block and directive matching
//! - [`project`] - the in-memory project snapshot analysis runs over
//! - [`classify`] - per-view source classification
//! - [`graph`] - explore/join structure, alias edges and unnest views

pub mod blocks;
pub mod classify;
pub mod graph;
pub mod project;

pub use classify::{classify_view, normalized_definition, source_detail, Classification};
pub use graph::{AliasGraph, RelationshipGraph, UNKNOWN_MODEL};
pub use project::{ModelSource, ProjectSources, ViewSource};
