//! TOML-based configuration for lookml-lineage.
//!
//! Supports a config file (lookml-lineage.toml) with environment variable expansion.
//!
//! Example configuration:
//! ```toml
//! [project]
//! default_project = "company-dwh"
//! default_dataset = "analytics_prod"
//! snapshot_project = "company-dwh-snapshot"
//! snapshot_dataset = "${SNAPSHOT_DATASET}"
//!
//! [discovery]
//! snapshot_marker = "_snapshot"
//! model = "ecommerce"
//!
//! [output]
//! include_source_detail = true
//! directory = "./reports"
//! export_bucket = "gs://exports/looker"
//! usage_file = "explore_usage.csv"
//! ```

use serde::{Deserialize, Serialize};
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

use super::analysis::{
    AnalysisConfig, DEFAULT_DATASET, DEFAULT_PROJECT, SNAPSHOT_DATASET, SNAPSHOT_PROJECT,
};

/// Environment variable naming an explicit config file.
pub const CONFIG_ENV_VAR: &str = "LOOKML_LINEAGE_CONFIG";

pub const DEFAULT_SNAPSHOT_MARKER: &str = "_snapshot";

/// Error type for settings.
#[derive(Debug, thiserror::Error)]
pub enum SettingsError {
    #[error("Config file not found: {0}")]
    FileNotFound(PathBuf),

    #[error("Failed to read config file: {0}")]
    ReadError(#[from] std::io::Error),

    #[error("Failed to parse config file: {0}")]
    ParseError(#[from] toml::de::Error),

    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
}

/// Root configuration structure.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct Settings {
    /// Qualification defaults.
    pub project: ProjectSettings,

    /// Which files and views are analyzed.
    pub discovery: DiscoverySettings,

    /// Report destinations.
    pub output: OutputSettings,
}

/// Default project/dataset names. An empty string means "not configured".
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct ProjectSettings {
    pub default_project: String,
    pub default_dataset: String,
    pub snapshot_project: String,
    pub snapshot_dataset: String,
}

impl Default for ProjectSettings {
    fn default() -> Self {
        Self {
            default_project: DEFAULT_PROJECT.to_string(),
            default_dataset: DEFAULT_DATASET.to_string(),
            snapshot_project: SNAPSHOT_PROJECT.to_string(),
            snapshot_dataset: SNAPSHOT_DATASET.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct DiscoverySettings {
    /// Substring of a view name or path that marks it as snapshot-origin.
    pub snapshot_marker: String,

    /// Only scan explores from this model.
    pub model: Option<String>,
}

impl Default for DiscoverySettings {
    fn default() -> Self {
        Self {
            snapshot_marker: DEFAULT_SNAPSHOT_MARKER.to_string(),
            model: None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Keep raw source directives in the report.
    pub include_source_detail: bool,

    /// Directory reports are written to (defaults to the working directory).
    pub directory: Option<String>,

    /// `gs://` prefix for export commands. No export files without it.
    pub export_bucket: Option<String>,

    /// Explore usage CSV.
    pub usage_file: Option<String>,
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, SettingsError> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(SettingsError::FileNotFound(path.to_path_buf()));
        }

        let content = fs::read_to_string(path)?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Load settings from the default location.
    ///
    /// Searches in order:
    /// 1. `LOOKML_LINEAGE_CONFIG` environment variable
    /// 2. `./lookml-lineage.toml`
    /// 3. `~/.config/lookml-lineage/config.toml`
    pub fn load() -> Result<Self, SettingsError> {
        // Check environment variable first
        if let Ok(path) = env::var(CONFIG_ENV_VAR) {
            return Self::from_file(&path);
        }

        // Check local directory
        let local_config = PathBuf::from("lookml-lineage.toml");
        if local_config.exists() {
            return Self::from_file(&local_config);
        }

        // Check user config directory
        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("lookml-lineage").join("config.toml");
            if user_config.exists() {
                return Self::from_file(&user_config);
            }
        }

        // Return defaults if no config file found
        Ok(Settings::default())
    }

    /// Build the analysis configuration, expanding environment variables.
    pub fn to_analysis_config(&self) -> Result<AnalysisConfig, SettingsError> {
        Ok(AnalysisConfig {
            default_project: non_empty(&self.project.default_project)?,
            default_dataset: non_empty(&self.project.default_dataset)?,
            snapshot_project: non_empty(&self.project.snapshot_project)?,
            snapshot_dataset: non_empty(&self.project.snapshot_dataset)?,
            include_source_detail: self.output.include_source_detail,
        })
    }

    /// Export bucket with environment variables expanded.
    pub fn export_bucket(&self) -> Result<Option<String>, SettingsError> {
        self.output
            .export_bucket
            .as_deref()
            .map(expand_env_vars)
            .transpose()
    }

    /// Snapshot marker, or None when disabled with an empty string.
    pub fn snapshot_marker(&self) -> Option<&str> {
        Some(self.discovery.snapshot_marker.as_str()).filter(|m| !m.is_empty())
    }
}

fn non_empty(value: &str) -> Result<Option<String>, SettingsError> {
    let expanded = expand_env_vars(value)?;
    let trimmed = expanded.trim();
    Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
}

/// Expand environment variables in a string.
///
/// Supports `${VAR}` and `$VAR` syntax.
pub fn expand_env_vars(s: &str) -> Result<String, SettingsError> {
    let mut result = String::with_capacity(s.len());
    let mut chars = s.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '$' {
            result.push(c);
            continue;
        }

        // Check for ${VAR} or $VAR
        let var_name: String = if chars.next_if_eq(&'{').is_some() {
            let name: String = std::iter::from_fn(|| chars.next_if(|&ch| ch != '}')).collect();
            chars.next_if_eq(&'}');
            name
        } else {
            std::iter::from_fn(|| chars.next_if(|&ch| ch.is_alphanumeric() || ch == '_')).collect()
        };

        if var_name.is_empty() {
            // Just a lone $, keep it
            result.push('$');
            continue;
        }

        let value =
            env::var(&var_name).map_err(|_| SettingsError::MissingEnvVar(var_name.clone()))?;
        result.push_str(&value);
    }

    Ok(result)
}
