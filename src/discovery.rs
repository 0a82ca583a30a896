//! LookML file discovery.
//!
//! Walks a project directory and builds the [`ProjectSources`] snapshot.
//!
//! # Discovery Rules
//!
//! - Every `**/*.lkml` file is scanned for `view:` blocks
//! - `*.model.lkml` files and `.lkml` files under a `models/` directory are
//!   model files; their name (without `.model.lkml` / `.lkml`) is the model
//! - Any `.lkml` file containing `explore:` contributes explores; files that
//!   are not model files own them as `unknown_model`
//! - Hidden directories (`.git`, ...) are skipped
//! - Unreadable files are logged and skipped

use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};
use walkdir::{DirEntry, WalkDir};

use crate::lookml::{ModelSource, ProjectSources, UNKNOWN_MODEL};

/// Errors that can occur during discovery.
#[derive(Debug, thiserror::Error)]
pub enum DiscoveryError {
    /// Project root does not exist.
    #[error("project directory not found: {}", path.display())]
    DirectoryNotFound { path: PathBuf },

    /// Project root is a file.
    #[error("not a directory: {}", path.display())]
    NotADirectory { path: PathBuf },
}

pub type DiscoveryResult<T> = Result<T, DiscoveryError>;

/// What to pick up while walking.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DiscoveryOptions {
    /// Marks views as snapshot-origin by name or path.
    pub snapshot_marker: Option<String>,
    /// Only keep explores from this model.
    pub model: Option<String>,
    /// Keep at most this many model files, in path order.
    pub max_models: Option<usize>,
}

/// Scan a LookML project directory.
pub fn discover_project(root: &Path, options: &DiscoveryOptions) -> DiscoveryResult<ProjectSources> {
    if !root.exists() {
        return Err(DiscoveryError::DirectoryNotFound {
            path: root.to_path_buf(),
        });
    }
    if !root.is_dir() {
        return Err(DiscoveryError::NotADirectory {
            path: root.to_path_buf(),
        });
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .follow_links(false)
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e))
        .filter_map(|e| match e {
            Ok(entry) => Some(entry),
            Err(err) => {
                warn!(error = %err, "skipping unreadable entry");
                None
            }
        })
        .filter(|e| e.file_type().is_file())
        .map(DirEntry::into_path)
        .filter(|p| p.extension().and_then(|e| e.to_str()) == Some("lkml"))
        .collect();
    files.sort();

    let mut sources = ProjectSources::new();
    let mut model_files = 0usize;

    for path in files {
        let relative = relative_name(root, &path);
        let content = match fs::read_to_string(&path) {
            Ok(content) => content,
            Err(err) => {
                warn!(file = %relative, error = %err, "skipping unreadable file");
                continue;
            }
        };

        let views = sources.add_views_from_text(
            &content,
            &relative,
            options.snapshot_marker.as_deref(),
        );
        if !views.is_empty() {
            debug!(file = %relative, views = views.len(), "views found");
        }

        let model = model_name(&relative);
        if model.is_some() {
            if options.max_models.is_some_and(|max| model_files >= max) {
                debug!(file = %relative, "model limit reached, skipping explores");
                continue;
            }
            model_files += 1;
        }

        if !content.contains("explore:") {
            continue;
        }
        let owner = model.unwrap_or_else(|| UNKNOWN_MODEL.to_string());
        if options.model.as_deref().is_some_and(|m| m != owner) {
            continue;
        }
        sources.add_model(ModelSource::new(owner, content, relative));
    }

    info!(
        views = sources.views.len(),
        explore_files = sources.models.len(),
        "project discovered"
    );
    Ok(sources)
}

/// Model name for a model file, None for other files.
pub fn model_name(relative: &str) -> Option<String> {
    let file = relative.rsplit('/').next().unwrap_or(relative);
    if let Some(name) = file.strip_suffix(".model.lkml") {
        return Some(name.to_string());
    }
    let in_models_dir = relative.split('/').rev().skip(1).any(|dir| dir == "models");
    if in_models_dir && !file.ends_with(".view.lkml") {
        return file.strip_suffix(".lkml").map(str::to_string);
    }
    None
}

fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .is_some_and(|name| name.starts_with('.'))
}

/// Path relative to the project root, `/`-separated.
fn relative_name(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}
