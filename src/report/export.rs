//! BigQuery `EXPORT DATA` scripts, one per physical table.
//!
//! Every fully-qualified table referenced by a view gets one script in
//! `export_command.txt`. When usage data exists, the tables of views with
//! usage above zero are also written to `export_command_active.txt`.
//! Unnest views have no table of their own and are skipped.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use tracing::{debug, info};

use super::ReportResult;
use crate::analysis::{AnalysisOutput, CitationType};
use crate::sql::TableReference;

pub const EXPORT_FILE: &str = "export_command.txt";
pub const ACTIVE_EXPORT_FILE: &str = "export_command_active.txt";

/// Export script for one table, None unless it has project, dataset and table.
pub fn export_script(table: &TableReference, bucket: &str) -> Option<String> {
    let [project, dataset, name] = table.segments() else {
        return None;
    };
    let bucket = bucket.trim_start_matches("gs://").trim_end_matches('/');
    let short_name = name.replace('*', "");

    Some(format!(
        "BEGIN
EXPORT DATA
  OPTIONS (
    uri = 'gs://{bucket}/{project}/{dataset}/{short_name}/*.parquet',
    format = 'PARQUET',
    compression = \"SNAPPY\",
    overwrite = true)
AS (
  SELECT *
  FROM `{project}.{dataset}.{short_name}`
);
EXCEPTION WHEN ERROR THEN
SELECT 1; -- Skip if table does not exist or other issues
END;
"
    ))
}

/// Scripts for a run, in first-reference order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ExportScripts {
    pub all: Vec<String>,
    /// None without usage data.
    pub active: Option<Vec<String>>,
    /// Views skipped for having no exportable table.
    pub skipped_views: usize,
}

/// Paths written by [`ExportScripts::write_to`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportFiles {
    pub all: PathBuf,
    pub active: Option<PathBuf>,
}

impl ExportScripts {
    pub fn build(output: &AnalysisOutput, bucket: &str) -> Self {
        let mut seen: HashSet<String> = HashSet::new();
        let mut active_seen: HashSet<String> = HashSet::new();
        let mut scripts = ExportScripts {
            active: output.usage_available.then(Vec::new),
            ..Default::default()
        };

        for record in &output.views {
            if record.citation == Some(CitationType::Unnest) {
                scripts.skipped_views += 1;
                continue;
            }

            let mut exported_any = false;
            let is_active = record.usage.count().is_some_and(|n| n > 0);
            for table in record.tables() {
                let Some(script) = export_script(table, bucket) else {
                    debug!(view = %record.name, table = %table, "table not fully qualified, not exported");
                    continue;
                };
                exported_any = true;
                let key = table.key();

                if seen.insert(key.clone()) {
                    scripts.all.push(script.clone());
                }
                if let Some(active) = scripts.active.as_mut() {
                    if is_active && active_seen.insert(key) {
                        active.push(script);
                    }
                }
            }
            if !exported_any {
                scripts.skipped_views += 1;
            }
        }

        info!(
            tables = scripts.all.len(),
            active = scripts.active.as_ref().map(Vec::len),
            skipped_views = scripts.skipped_views,
            "export commands generated"
        );
        scripts
    }

    pub fn write_to(&self, dir: &Path) -> ReportResult<ExportFiles> {
        let all = dir.join(EXPORT_FILE);
        fs::write(&all, self.all.concat())?;

        let active = match &self.active {
            Some(scripts) => {
                let path = dir.join(ACTIVE_EXPORT_FILE);
                fs::write(&path, scripts.concat())?;
                Some(path)
            }
            None => None,
        };

        info!(file = %all.display(), "export commands written");
        Ok(ExportFiles { all, active })
    }
}
