//! In-memory snapshot of a LookML project's text.

use std::collections::BTreeMap;

use super::blocks::{find_blocks, strip_hash_comments, BlockKind};

/// One view's definition body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ViewSource {
    /// Body of the `view:` block with `#` comments removed.
    pub text: String,
    /// Defining file, for diagnostics.
    pub file: String,
    /// Qualify with the snapshot project/dataset instead of the defaults.
    pub snapshot_origin: bool,
}

impl ViewSource {
    pub fn new(text: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            file: file.into(),
            snapshot_origin: false,
        }
    }

    pub fn snapshot(mut self, snapshot_origin: bool) -> Self {
        self.snapshot_origin = snapshot_origin;
        self
    }
}

/// A file that may declare explores. `name` is the owning model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelSource {
    pub name: String,
    pub text: String,
    pub file: String,
}

impl ModelSource {
    pub fn new(name: impl Into<String>, text: impl Into<String>, file: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            text: text.into(),
            file: file.into(),
        }
    }
}

/// Everything the analysis reads.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProjectSources {
    pub views: BTreeMap<String, ViewSource>,
    pub models: Vec<ModelSource>,
}

impl ProjectSources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a view. A second definition of the same name (a refinement) is
    /// appended to the first and keeps the first file.
    pub fn add_view(&mut self, name: impl Into<String>, source: ViewSource) {
        let name = name.into();
        match self.views.get_mut(&name) {
            Some(existing) => {
                existing.text.push('\n');
                existing.text.push_str(&source.text);
                existing.snapshot_origin |= source.snapshot_origin;
            }
            None => {
                self.views.insert(name, source);
            }
        }
    }

    /// Add every `view:` block in a file's text. Returns the view names found.
    ///
    /// A view is snapshot-origin when its name or the file contains `snapshot_marker`.
    pub fn add_views_from_text(
        &mut self,
        text: &str,
        file: &str,
        snapshot_marker: Option<&str>,
    ) -> Vec<String> {
        let text = strip_hash_comments(text);
        let marker = snapshot_marker.filter(|m| !m.is_empty());
        let mut names = Vec::new();

        for block in find_blocks(&text, BlockKind::View) {
            let snapshot =
                marker.is_some_and(|m| block.name.contains(m) || file.contains(m));
            self.add_view(block.name, ViewSource::new(block.body, file).snapshot(snapshot));
            names.push(block.name.to_string());
        }
        names
    }

    pub fn add_model(&mut self, source: ModelSource) {
        self.models.push(source);
    }

    pub fn is_empty(&self) -> bool {
        self.views.is_empty() && self.models.is_empty()
    }
}
