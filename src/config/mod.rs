//! Configuration for lookml-lineage.
//!
//! [`AnalysisConfig`] is the value threaded through analysis. [`Settings`]
//! is the optional TOML file it can be built from.

mod analysis;
mod settings;

pub use analysis::{
    AnalysisConfig, DEFAULT_DATASET, DEFAULT_PROJECT, SNAPSHOT_DATASET, SNAPSHOT_PROJECT,
};
pub use settings::{
    expand_env_vars, DiscoverySettings, OutputSettings, ProjectSettings, Settings, SettingsError,
    CONFIG_ENV_VAR, DEFAULT_SNAPSHOT_MARKER,
};
