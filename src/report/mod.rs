//! Report emission.
//!
//! Writes an [`AnalysisOutput`] to disk:
//!
//! - `view_analysis.csv`: one row per view ([`view_report`])
//! - `export_command.txt` / `export_command_active.txt`: BigQuery export
//!   scripts per physical table ([`export`])
//! - `analysis.json`: the whole output as JSON

pub mod export;
pub mod view_report;

use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::info;

use crate::analysis::AnalysisOutput;

pub use export::{export_script, ExportFiles, ExportScripts};
pub use view_report::{log_summary, report_rows, write_view_csv, ReportRow};

pub const VIEW_REPORT_FILE: &str = "view_analysis.csv";
pub const JSON_REPORT_FILE: &str = "analysis.json";

#[derive(Debug, Error)]
pub enum ReportError {
    #[error("Failed to write report: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to write CSV: {0}")]
    Csv(#[from] ::csv::Error),

    #[error("Failed to serialize JSON: {0}")]
    Json(#[from] serde_json::Error),
}

pub type ReportResult<T> = Result<T, ReportError>;

/// Write `view_analysis.csv` into `dir`, creating the directory if needed.
pub fn write_view_report(
    output: &AnalysisOutput,
    dir: &Path,
    include_source_detail: bool,
) -> ReportResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(VIEW_REPORT_FILE);
    let file = BufWriter::new(File::create(&path)?);
    write_view_csv(output, file, include_source_detail)?;
    info!(file = %path.display(), views = output.views.len(), "view report written");
    Ok(path)
}

/// Write the export command files into `dir`.
pub fn write_export_commands(
    output: &AnalysisOutput,
    dir: &Path,
    bucket: &str,
) -> ReportResult<ExportFiles> {
    fs::create_dir_all(dir)?;
    let scripts = ExportScripts::build(output, bucket);
    scripts.write_to(dir)
}

/// Write `analysis.json` into `dir`.
pub fn write_json(output: &AnalysisOutput, dir: &Path) -> ReportResult<PathBuf> {
    fs::create_dir_all(dir)?;
    let path = dir.join(JSON_REPORT_FILE);
    let file = BufWriter::new(File::create(&path)?);
    serde_json::to_writer_pretty(file, output)?;
    info!(file = %path.display(), "json report written");
    Ok(path)
}
