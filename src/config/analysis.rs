//! Qualification defaults and feature flags for one analysis run.

use serde::{Deserialize, Serialize};

pub const DEFAULT_PROJECT: &str = "company-dwh";
pub const DEFAULT_DATASET: &str = "analytics_prod";
pub const SNAPSHOT_PROJECT: &str = "company-dwh-snapshot";
pub const SNAPSHOT_DATASET: &str = "analytics_prod_snapshots";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisConfig {
    /// Prepended to 1- and 2-segment table references.
    pub default_project: Option<String>,
    /// Prepended to 1-segment table references.
    pub default_dataset: Option<String>,
    /// Used instead of the defaults for snapshot-origin views.
    pub snapshot_project: Option<String>,
    pub snapshot_dataset: Option<String>,
    /// Keep each view's raw source directive on its record.
    pub include_source_detail: bool,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            default_project: Some(DEFAULT_PROJECT.to_string()),
            default_dataset: Some(DEFAULT_DATASET.to_string()),
            snapshot_project: Some(SNAPSHOT_PROJECT.to_string()),
            snapshot_dataset: Some(SNAPSHOT_DATASET.to_string()),
            include_source_detail: false,
        }
    }
}

impl AnalysisConfig {
    /// Defaults with a custom project/dataset pair.
    pub fn new(project: impl Into<String>, dataset: impl Into<String>) -> Self {
        Self {
            default_project: Some(project.into()),
            default_dataset: Some(dataset.into()),
            ..Self::default()
        }
    }

    /// The (project, dataset) pair used to qualify a view's tables.
    pub fn qualification_pair(&self, snapshot: bool) -> (Option<&str>, Option<&str>) {
        if snapshot {
            (
                self.snapshot_project.as_deref(),
                self.snapshot_dataset.as_deref(),
            )
        } else {
            (
                self.default_project.as_deref(),
                self.default_dataset.as_deref(),
            )
        }
    }
}
