//! lookml-lineage CLI - Table lineage and usage for LookML views
//!
//! Usage:
//!   lookml-lineage analyze <project-dir> [--explore-usage-file <csv>] [--export-gs-bucket <bucket>]
//!   lookml-lineage list <project-dir>
//!
//! Examples:
//!   lookml-lineage analyze ./looker --explore-usage-file explore_usage.csv
//!   lookml-lineage analyze ./looker --export-gs-bucket gs://exports --output-dir reports
//!   lookml-lineage analyze ./looker --format json --include-source-info
//!   lookml-lineage list ./looker --model ecommerce

use clap::{Args, Parser, Subcommand, ValueEnum};
use lookml_lineage::analysis::{analyze, AnalysisOutput};
use lookml_lineage::config::{AnalysisConfig, Settings, SettingsError};
use lookml_lineage::discovery::{discover_project, DiscoveryOptions};
use lookml_lineage::logging::init_logging;
use lookml_lineage::lookml::ProjectSources;
use lookml_lineage::report::{self, log_summary};
use lookml_lineage::usage_data::load_usage_file;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Parser)]
#[command(name = "lookml-lineage")]
#[command(about = "Derive physical table lineage and usage for every view in a LookML project")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Analyze a project and write reports
    Analyze {
        /// LookML project directory
        project: PathBuf,

        #[command(flatten)]
        source: SourceArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// List views and explores in a project
    List {
        /// LookML project directory
        project: PathBuf,

        #[command(flatten)]
        source: SourceArgs,
    },
}

#[derive(Args)]
struct SourceArgs {
    /// Config file (default: $LOOKML_LINEAGE_CONFIG, ./lookml-lineage.toml, user config dir)
    #[arg(long)]
    config: Option<PathBuf>,

    /// Only analyze explores of this model
    #[arg(long)]
    model: Option<String>,

    /// Scan at most this many model files
    #[arg(long)]
    max_models: Option<usize>,

    /// Project for unqualified tables
    #[arg(long)]
    default_project: Option<String>,

    /// Dataset for unqualified tables
    #[arg(long)]
    default_dataset: Option<String>,

    /// Project for unqualified tables of snapshot views
    #[arg(long)]
    snapshot_project: Option<String>,

    /// Dataset for unqualified tables of snapshot views
    #[arg(long)]
    snapshot_dataset: Option<String>,

    /// Debug logging
    #[arg(short, long)]
    verbose: bool,
}

#[derive(Args)]
struct OutputArgs {
    /// Add source_type and source_definition columns
    #[arg(long)]
    include_source_info: bool,

    /// Directory to write reports to
    #[arg(short, long)]
    output_dir: Option<PathBuf>,

    /// Bucket for export commands (e.g. gs://exports)
    #[arg(long)]
    export_gs_bucket: Option<String>,

    /// Explore usage CSV
    #[arg(long)]
    explore_usage_file: Option<PathBuf>,

    /// Report format
    #[arg(short, long, default_value = "csv")]
    format: OutputFormat,
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// view_analysis.csv plus export commands
    Csv,
    /// analysis.json
    Json,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    match cli.command {
        Commands::Analyze {
            project,
            source,
            output,
        } => cmd_analyze(project, source, output),
        Commands::List { project, source } => cmd_list(project, source),
    }
}

fn cmd_analyze(project: PathBuf, source: SourceArgs, output: OutputArgs) -> ExitCode {
    init_logging(source.verbose);

    let mut settings = match load_settings(&source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    apply_output_overrides(&mut settings, &output);

    let config = match settings.to_analysis_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let bucket = match settings.export_bucket() {
        Ok(b) => b,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(sources) = discover(&project, &settings, source.max_models) else {
        return ExitCode::FAILURE;
    };

    let usage = match settings.output.usage_file.as_deref() {
        Some(path) => match load_usage_file(Path::new(path)) {
            Ok(usage) => usage,
            Err(e) => {
                eprintln!("Error reading usage file '{}': {}", path, e);
                return ExitCode::FAILURE;
            }
        },
        None => None,
    };

    let analysis = match analyze(&sources, usage.as_ref(), &config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Analysis error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let dir = settings
        .output
        .directory
        .as_deref()
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from("."));

    let written = match output.format {
        OutputFormat::Csv => write_csv_reports(&analysis, &dir, &config, bucket.as_deref()),
        OutputFormat::Json => report::write_json(&analysis, &dir).map(|p| vec![p]),
    };

    match written {
        Ok(paths) => {
            log_summary(&analysis);
            for path in paths {
                println!("{}", path.display());
            }
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Report error: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn cmd_list(project: PathBuf, source: SourceArgs) -> ExitCode {
    init_logging(source.verbose);

    let settings = match load_settings(&source) {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let config = match settings.to_analysis_config() {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let Some(sources) = discover(&project, &settings, source.max_models) else {
        return ExitCode::FAILURE;
    };

    let analysis = match analyze(&sources, None, &config) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Analysis error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    println!("Project: {}", project.display());
    println!();

    println!("Views:");
    for view in &analysis.views {
        let citation = view.citation.map(|c| c.as_str()).unwrap_or("unknown");
        match &view.primary_table {
            Some(table) => println!("  - {} ({}: {})", view.name, citation, table),
            None => println!("  - {} ({})", view.name, citation),
        }
    }
    println!();

    if analysis.explores.is_empty() {
        println!("No explores defined.");
    } else {
        println!("Explores:");
        for explore in &analysis.explores {
            println!("  - {} (views: {})", explore.key, explore.views.join(", "));
        }
    }

    if !analysis.diagnostics.is_empty() {
        println!();
        println!("Diagnostics:");
        for diag in &analysis.diagnostics {
            println!("  {}", diag);
        }
    }

    ExitCode::SUCCESS
}

/// Settings from `--config` or the default search path, with CLI overrides applied.
fn load_settings(source: &SourceArgs) -> Result<Settings, SettingsError> {
    let mut settings = match &source.config {
        Some(path) => Settings::from_file(path)?,
        None => Settings::load()?,
    };

    let project = &mut settings.project;
    for (value, slot) in [
        (&source.default_project, &mut project.default_project),
        (&source.default_dataset, &mut project.default_dataset),
        (&source.snapshot_project, &mut project.snapshot_project),
        (&source.snapshot_dataset, &mut project.snapshot_dataset),
    ] {
        if let Some(value) = value {
            *slot = value.clone();
        }
    }
    if source.model.is_some() {
        settings.discovery.model = source.model.clone();
    }
    Ok(settings)
}

fn apply_output_overrides(settings: &mut Settings, output: &OutputArgs) {
    if output.include_source_info {
        settings.output.include_source_detail = true;
    }
    if let Some(dir) = &output.output_dir {
        settings.output.directory = Some(dir.display().to_string());
    }
    if let Some(bucket) = &output.export_gs_bucket {
        settings.output.export_bucket = Some(bucket.clone());
    }
    if let Some(file) = &output.explore_usage_file {
        settings.output.usage_file = Some(file.display().to_string());
    }
}

fn discover(project: &Path, settings: &Settings, max_models: Option<usize>) -> Option<ProjectSources> {
    let options = DiscoveryOptions {
        snapshot_marker: settings.snapshot_marker().map(str::to_string),
        model: settings.discovery.model.clone(),
        max_models,
    };

    match discover_project(project, &options) {
        Ok(sources) => Some(sources),
        Err(e) => {
            eprintln!("Error reading project '{}': {}", project.display(), e);
            None
        }
    }
}

fn write_csv_reports(
    analysis: &AnalysisOutput,
    dir: &Path,
    config: &AnalysisConfig,
    bucket: Option<&str>,
) -> report::ReportResult<Vec<PathBuf>> {
    let mut paths = vec![report::write_view_report(
        analysis,
        dir,
        config.include_source_detail,
    )?];

    if let Some(bucket) = bucket {
        let files = report::write_export_commands(analysis, dir, bucket)?;
        paths.push(files.all);
        paths.extend(files.active);
    }
    Ok(paths)
}
