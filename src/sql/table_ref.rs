//! Table identifiers as written in source.

use std::fmt;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Trailing `_YYYYMMDD`-style shard suffix.
static DATE_SUFFIX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"_\d{8}$").unwrap());

/// Characters allowed in an unquoted identifier segment.
///
/// `-` covers BigQuery project ids, `*` covers wildcard tables.
fn is_segment_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '_' | '-' | '*')
}

/// Suffix variant stripped from a table's final segment.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
#[serde(rename_all = "snake_case")]
pub enum SuffixVariant {
    #[default]
    None,
    /// `_streaming` companion table.
    Streaming,
    /// Date-sharded table (`events_20240101`).
    DatePartitioned,
}

/// Qualification could not complete a reference.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum QualifyError {
    #[error("no default project configured")]
    MissingProject,

    #[error("no default dataset configured")]
    MissingDataset,
}

/// A table reference: 1 to 3 dotted segments plus the detected suffix variant.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TableReference {
    segments: Vec<String>,
    variant: SuffixVariant,
}

impl TableReference {
    /// Build a reference from already-split segments.
    ///
    /// Returns None unless there are 1 to 3 non-empty segments. The suffix
    /// rules run on the final segment.
    pub fn from_segments<I, S>(segments: I) -> Option<Self>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let mut segments: Vec<String> = segments.into_iter().map(Into::into).collect();
        if segments.is_empty() || segments.len() > 3 || segments.iter().any(|s| s.is_empty()) {
            return None;
        }

        let last = segments.pop()?;
        let (base, variant) = strip_suffix(&last);
        if base.is_empty() {
            return None;
        }
        segments.push(base.to_string());

        Some(Self { segments, variant })
    }

    /// Parse a single identifier.
    ///
    /// Accepts bare dotted names (`ds.table`), names quoted whole or per
    /// segment with backticks (`` `p.ds.t` ``, `` `p`.ds.`t` ``) or T-SQL
    /// brackets (`[dbo].[t]`). Whitespace around dots is ignored and a
    /// trailing `;` is dropped. LookML substitutions (`${...}`) and anything
    /// else outside the identifier alphabet are rejected.
    pub fn parse(ident: &str) -> Option<Self> {
        let ident = ident.trim().trim_end_matches(';').trim();
        if ident.is_empty() {
            return None;
        }

        let mut segments = Vec::new();
        let mut current = String::new();
        let mut chars = ident.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '`' | '[' => {
                    let close = if c == '`' { '`' } else { ']' };
                    let mut closed = false;
                    for ch in chars.by_ref() {
                        if ch == close {
                            closed = true;
                            break;
                        }
                        if ch == '.' {
                            segments.push(std::mem::take(&mut current));
                        } else {
                            current.push(ch);
                        }
                    }
                    if !closed {
                        return None;
                    }
                }
                '.' => segments.push(std::mem::take(&mut current)),
                c if c.is_whitespace() => {
                    // Only allowed next to a dot.
                    while chars.peek().is_some_and(|ch| ch.is_whitespace()) {
                        chars.next();
                    }
                    let next_is_dot = chars.peek() == Some(&'.');
                    let prev_was_dot = current.is_empty() && !segments.is_empty();
                    if !next_is_dot && !prev_was_dot {
                        return None;
                    }
                }
                c if is_segment_char(c) => current.push(c),
                _ => return None,
            }
        }
        segments.push(current);

        let segments: Vec<String> = segments.into_iter().map(|s| s.trim().to_string()).collect();
        if segments
            .iter()
            .any(|s| s.is_empty() || !s.chars().all(is_segment_char))
        {
            return None;
        }

        Self::from_segments(segments)
    }

    pub fn segments(&self) -> &[String] {
        &self.segments
    }

    /// The table name segment.
    pub fn table(&self) -> &str {
        self.segments.last().map(String::as_str).unwrap_or_default()
    }

    pub fn variant(&self) -> SuffixVariant {
        self.variant
    }

    pub fn is_fully_qualified(&self) -> bool {
        self.segments.len() == 3
    }

    /// Case-insensitive identity used for deduplication.
    pub fn key(&self) -> String {
        self.to_string().to_lowercase()
    }

    /// Same logical table, ignoring case and suffix variant.
    pub fn same_table(&self, other: &TableReference) -> bool {
        self.key() == other.key()
    }

    /// Fill in missing project/dataset segments.
    ///
    /// Three segments are returned unchanged. Two segments get the project
    /// prepended, one segment gets project and dataset.
    pub fn qualify(
        &self,
        project: Option<&str>,
        dataset: Option<&str>,
    ) -> Result<TableReference, QualifyError> {
        let segments = match self.segments.len() {
            3 => return Ok(self.clone()),
            2 => {
                let project = present(project).ok_or(QualifyError::MissingProject)?;
                let mut segments = vec![project.to_string()];
                segments.extend(self.segments.iter().cloned());
                segments
            }
            _ => {
                let project = present(project).ok_or(QualifyError::MissingProject)?;
                let dataset = present(dataset).ok_or(QualifyError::MissingDataset)?;
                vec![
                    project.to_string(),
                    dataset.to_string(),
                    self.table().to_string(),
                ]
            }
        };

        Ok(Self {
            segments,
            variant: self.variant,
        })
    }
}

impl fmt::Display for TableReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.segments.join("."))
    }
}

fn present(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Strip `_streaming` first, then a date shard suffix. A streaming shard
/// keeps the streaming variant.
fn strip_suffix(segment: &str) -> (&str, SuffixVariant) {
    let (base, variant) = match segment.strip_suffix("_streaming") {
        Some(base) => (base, SuffixVariant::Streaming),
        None => (segment, SuffixVariant::None),
    };
    match DATE_SUFFIX.find(base) {
        Some(m) if variant == SuffixVariant::Streaming => (&base[..m.start()], variant),
        Some(m) => (&base[..m.start()], SuffixVariant::DatePartitioned),
        None => (base, variant),
    }
}
