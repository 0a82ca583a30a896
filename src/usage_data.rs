//! Explore usage CSV loading.
//!
//! Two layouts are accepted:
//!
//! - a header naming an explore column and a count column (headers
//!   containing `explore`, `count`/`usage`), optionally a `model` column
//! - anything else: column 0 is the explore name, column 2 the count, and
//!   the count applies to that explore name in every model
//!
//! Counts may use thousands separators (`1,234`).

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::{info, warn};

use crate::analysis::UsageData;

/// Errors that can occur when loading usage data.
#[derive(Debug, thiserror::Error)]
pub enum UsageDataError {
    /// Failed to open file
    #[error("Failed to open usage file: {0}")]
    FileOpen(#[from] std::io::Error),

    /// Failed to parse CSV
    #[error("Failed to parse usage CSV: {0}")]
    CsvParse(#[from] csv::Error),

    /// A count that is not a non-negative integer
    #[error("Invalid usage count {value:?} on line {line}")]
    InvalidCount { line: u64, value: String },
}

pub type UsageDataResult<T> = Result<T, UsageDataError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Columns {
    model: Option<usize>,
    explore: usize,
    count: usize,
}

impl Columns {
    const POSITIONAL: Columns = Columns {
        model: None,
        explore: 0,
        count: 2,
    };

    fn from_header(header: &csv::StringRecord) -> Option<Columns> {
        let names: Vec<String> = header.iter().map(|h| h.trim().to_lowercase()).collect();

        let explore = find_column(&names, |n| n.contains("explore"))?;
        let count = find_column(&names, |n| n.contains("count") || n.contains("usage"))?;
        let model = find_column(&names, |n| n.contains("model"));
        Some(Columns {
            model,
            explore,
            count,
        })
    }
}

/// Load a usage file. A missing file means no usage source.
pub fn load_usage_file(path: &Path) -> UsageDataResult<Option<UsageData>> {
    if !path.exists() {
        warn!(
            file = %path.display(),
            "usage file does not exist, calculated usage will be NULL"
        );
        return Ok(None);
    }

    let file = File::open(path)?;
    let usage = read_usage(BufReader::new(file))?;
    info!(file = %path.display(), explores = usage.len(), "usage loaded");
    Ok(Some(usage))
}

/// Parse usage CSV from any reader. The first row is always a header.
pub fn read_usage<R: Read>(reader: R) -> UsageDataResult<UsageData> {
    let mut csv_reader = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = Columns::from_header(csv_reader.headers()?).unwrap_or(Columns::POSITIONAL);
    let mut usage = UsageData::new();

    for result in csv_reader.records() {
        let record = result?;
        let line = record.position().map(|p| p.line()).unwrap_or_default();

        let (Some(explore), Some(raw)) = (record.get(columns.explore), record.get(columns.count))
        else {
            continue;
        };
        if explore.is_empty() {
            continue;
        }

        let count = parse_count(raw).ok_or_else(|| UsageDataError::InvalidCount {
            line,
            value: raw.to_string(),
        })?;
        let model = columns
            .model
            .and_then(|idx| record.get(idx))
            .filter(|m| !m.is_empty());
        usage.insert(model, explore, count);
    }

    Ok(usage)
}

fn find_column(names: &[String], pred: impl Fn(&str) -> bool) -> Option<usize> {
    names.iter().position(|n| pred(n.as_str()))
}

fn parse_count(raw: &str) -> Option<u64> {
    raw.replace(',', "").trim().parse().ok()
}
