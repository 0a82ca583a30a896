//! `view_analysis.csv` rows.

use std::cmp::Ordering;
use std::io::Write;

use tracing::info;

use super::ReportResult;
use crate::analysis::{AnalysisOutput, SourceKind, Usage, ViewRecord};
use crate::lookml::normalized_definition;

const HEADER: [&str; 6] = [
    "view_name",
    "explore_count",
    "calculated_usage",
    "table_name",
    "citation_type",
    "additional_tables",
];

const DETAIL_HEADER: [&str; 2] = ["source_type", "source_definition"];

/// Views listed in the run summary.
const TOP_VIEWS: usize = 20;

/// One report line, already formatted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReportRow {
    pub view_name: String,
    pub explore_count: usize,
    pub usage: Usage,
    pub table_name: String,
    pub citation_type: String,
    pub additional_tables: String,
    pub source_type: String,
    pub source_definition: String,
}

impl ReportRow {
    fn from_record(record: &ViewRecord, explore_count: usize) -> Self {
        let (source_type, source_definition) = match &record.source {
            Some(detail) => (detail.kind.as_str(), normalized_definition(detail)),
            None => (SourceKind::Unknown.as_str(), String::new()),
        };

        Self {
            view_name: record.name.clone(),
            explore_count,
            usage: record.usage,
            table_name: record
                .primary_table
                .as_ref()
                .map(ToString::to_string)
                .unwrap_or_default(),
            citation_type: record
                .citation
                .map(|c| c.as_str())
                .unwrap_or("unknown")
                .to_string(),
            additional_tables: record
                .additional_tables
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(";"),
            source_type: source_type.to_string(),
            source_definition,
        }
    }

    fn fields(&self, include_source_detail: bool) -> Vec<String> {
        let mut fields = vec![
            self.view_name.clone(),
            self.explore_count.to_string(),
            self.usage.to_string(),
            self.table_name.clone(),
            self.citation_type.clone(),
            self.additional_tables.clone(),
        ];
        if include_source_detail {
            fields.push(self.source_type.clone());
            fields.push(self.source_definition.clone());
        }
        fields
    }
}

/// Rows in report order.
///
/// With usage data: usage descending, then explore count descending.
/// Without: explore count descending, then view name descending.
pub fn report_rows(output: &AnalysisOutput) -> Vec<ReportRow> {
    let mut rows: Vec<ReportRow> = output
        .views
        .iter()
        .map(|r| ReportRow::from_record(r, output.explore_count(&r.name)))
        .collect();

    if output.usage_available {
        rows.sort_by(|a, b| {
            b.usage
                .count()
                .cmp(&a.usage.count())
                .then_with(|| b.explore_count.cmp(&a.explore_count))
                .then_with(|| a.view_name.cmp(&b.view_name))
        });
    } else {
        rows.sort_by(|a, b| match b.explore_count.cmp(&a.explore_count) {
            Ordering::Equal => b.view_name.cmp(&a.view_name),
            other => other,
        });
    }
    rows
}

/// Write the view report as CSV.
pub fn write_view_csv<W: Write>(
    output: &AnalysisOutput,
    writer: W,
    include_source_detail: bool,
) -> ReportResult<()> {
    let mut csv_writer = csv::Writer::from_writer(writer);

    let mut header: Vec<&str> = HEADER.to_vec();
    if include_source_detail {
        header.extend(DETAIL_HEADER);
    }
    csv_writer.write_record(&header)?;

    for row in report_rows(output) {
        csv_writer.write_record(row.fields(include_source_detail))?;
    }
    csv_writer.flush()?;
    Ok(())
}

/// Log views per citation type and the most used views.
pub fn log_summary(output: &AnalysisOutput) {
    for (citation, count) in output.citation_counts() {
        info!(citation, views = count, "citation summary");
    }

    if !output.usage_available {
        info!("no usage data, skipping top views");
        return;
    }
    for (rank, row) in report_rows(output).iter().take(TOP_VIEWS).enumerate() {
        info!(
            rank = rank + 1,
            view = %row.view_name,
            usage = %row.usage,
            citation = %row.citation_type,
            "top view"
        );
    }
}
