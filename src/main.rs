use std::path::{Path, PathBuf};

use anyhow::Context;
use chrono::Utc;
use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use class_analytics::{
    aggregate, aggregate_class, compare, exam_types, input, report, to_series, AnalyticsError,
    ChartKind, ChartSource, ClassAnalyticsSnapshot, ComparisonResult, ScoreRecord, YearMetrics,
};

#[derive(Parser)]
#[command(name = "class-analytics")]
#[command(about = "Class performance snapshots and academic year comparisons", long_about = None)]
struct Cli {
    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    Json,
    Markdown,
}

#[derive(Subcommand)]
enum Commands {
    /// Summarize score records for one class and exam filter
    Snapshot {
        /// Score records as .json or .csv
        #[arg(long)]
        records: PathBuf,
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        exam_type: Option<String>,
        /// Rankings shown in the markdown report
        #[arg(long, default_value_t = 10)]
        top: usize,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Compare 2 to 5 academic years in the given order
    Compare {
        /// Year metrics as a JSON array
        #[arg(long)]
        years: PathBuf,
        #[arg(long, value_enum, default_value_t = OutputFormat::Markdown)]
        format: OutputFormat,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// Emit chart labels and series as JSON
    Chart {
        /// trend, distribution, ranking or growth
        #[arg(long)]
        kind: ChartKind,
        /// Score records, for distribution and ranking charts
        #[arg(long, conflicts_with = "years", required_unless_present = "years")]
        records: Option<PathBuf>,
        /// Year metrics, for trend and growth charts
        #[arg(long)]
        years: Option<PathBuf>,
        #[arg(long)]
        class: Option<String>,
        #[arg(long)]
        exam_type: Option<String>,
        #[arg(long)]
        out: Option<PathBuf>,
    },
    /// List exam types present in a records file
    ExamTypes {
        #[arg(long)]
        records: PathBuf,
    },
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Snapshot {
            records,
            class,
            exam_type,
            top,
            format,
            out,
        } => {
            let records = input::load_records(&records)?;
            let snapshot = class_snapshot(&records, class.as_deref(), exam_type.as_deref())?;

            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&snapshot)?,
                OutputFormat::Markdown => report::snapshot_report(
                    class.as_deref(),
                    exam_type.as_deref(),
                    Utc::now().date_naive(),
                    &snapshot,
                    top,
                ),
            };
            emit(&rendered, out.as_deref())?;
        }
        Commands::Compare { years, format, out } => {
            let years = input::load_years(&years)?;
            let Some(result) = compare_or_prompt(&years)? else {
                return Ok(());
            };

            let rendered = match format {
                OutputFormat::Json => serde_json::to_string_pretty(&result)?,
                OutputFormat::Markdown => report::comparison_report(Utc::now().date_naive(), &result),
            };
            emit(&rendered, out.as_deref())?;
        }
        Commands::Chart {
            kind,
            records,
            years,
            class,
            exam_type,
            out,
        } => {
            let chart = if let Some(path) = records {
                let records = input::load_records(&path)?;
                let snapshot = class_snapshot(&records, class.as_deref(), exam_type.as_deref())?;
                to_series(ChartSource::Snapshot(&snapshot), kind)
            } else if let Some(path) = years {
                let years = input::load_years(&path)?;
                let Some(result) = compare_or_prompt(&years)? else {
                    return Ok(());
                };
                to_series(ChartSource::Comparison(&result), kind)
            } else {
                anyhow::bail!("either --records or --years is required");
            };

            if chart.is_empty() {
                tracing::info!(kind = %kind, "no data for chart");
            }
            emit(&serde_json::to_string_pretty(&chart)?, out.as_deref())?;
        }
        Commands::ExamTypes { records } => {
            let records = input::load_records(&records)?;
            let types = exam_types(&records);
            if types.is_empty() {
                println!("No exam types found.");
                return Ok(());
            }
            for exam_type in types {
                println!("- {exam_type}");
            }
        }
    }

    Ok(())
}

fn init_tracing(verbose: bool) {
    let default = if verbose {
        "class_analytics=debug"
    } else {
        "class_analytics=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| default.into()))
        .with_writer(std::io::stderr)
        .init();
}

fn class_snapshot(
    records: &[ScoreRecord],
    class: Option<&str>,
    exam_type: Option<&str>,
) -> anyhow::Result<ClassAnalyticsSnapshot> {
    let result = match class {
        Some(class_id) => aggregate_class(records, class_id, exam_type),
        None => aggregate(records, exam_type),
    };
    or_placeholder(result)
}

/// An out-of-bounds year selection prints a prompt instead of failing.
fn compare_or_prompt(years: &[YearMetrics]) -> anyhow::Result<Option<ComparisonResult>> {
    match compare(years) {
        Ok(result) => Ok(Some(result)),
        Err(err @ AnalyticsError::InvalidSelection(_)) => {
            println!("Select between 2 and 5 academic years to compare ({err}).");
            Ok(None)
        }
        Err(err) => Err(err.into()),
    }
}

/// An empty selection is shown as a placeholder snapshot, not a failure.
fn or_placeholder(
    result: Result<ClassAnalyticsSnapshot, AnalyticsError>,
) -> anyhow::Result<ClassAnalyticsSnapshot> {
    match result {
        Ok(snapshot) => Ok(snapshot),
        Err(AnalyticsError::EmptyInput(reason)) => {
            tracing::info!(%reason, "rendering empty snapshot");
            Ok(ClassAnalyticsSnapshot::empty())
        }
        Err(err) => Err(err.into()),
    }
}

fn emit(rendered: &str, out: Option<&Path>) -> anyhow::Result<()> {
    match out {
        Some(path) => {
            std::fs::write(path, rendered)
                .with_context(|| format!("failed to write {}", path.display()))?;
            println!("Written to {}.", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
