//! CLI entry point for the traffic fines pipeline.
//!
//! Provides subcommands for exporting the canonical record set, computing
//! headline metrics, printing single rollups and writing the full dashboard
//! report.

use anyhow::{Context, Result, bail};
use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};
use std::ffi::OsStr;
use std::path::Path;
use tracing::{debug, info, warn};
use tracing_subscriber::{
    EnvFilter, Layer,
    filter::LevelFilter,
    fmt::{self, format::FmtSpan},
    layer::SubscriberExt,
    util::SubscriberInitExt,
};
use traffic_fines::{
    analyzers::{
        aggregate::{
            aggregate_by_infraction, aggregate_by_location, aggregate_by_period,
            aggregate_by_period_in_range, aggregate_by_vehicle, aggregate_by_vehicle_in_year,
            aggregate_by_weekday, top_n,
        },
        report::build_report,
        types::PeriodUnit,
    },
    config::PipelineConfig,
    filter::{DateField, filter_by_period},
    metrics::{MetricsSnapshot, compute_metrics},
    normalize::normalize_date,
    output::{append_record, print_json, print_pretty, write_json, write_records},
    parser::load_table,
    pipeline::Pipeline,
    record::{FineRecord, PaymentStatus},
    services::geocode::StaticGeocoder,
};

#[derive(Parser)]
#[command(name = "traffic_fines")]
#[command(about = "Normalize and summarize traffic fine exports", long_about = None)]
struct Cli {
    #[command(flatten)]
    global: GlobalArgs,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args)]
struct GlobalArgs {
    /// JSON pipeline config (falls back to FINES_CONFIG_PATH)
    #[arg(long, global = true, env = "FINES_CONFIG_PATH")]
    config: Option<String>,

    /// Keep only fines with this payment status (e.g. PAID, UNPAID)
    #[arg(long, global = true)]
    status: Option<String>,

    /// Keep fines queried on or after this date
    #[arg(long, global = true, value_parser = parse_date)]
    from: Option<NaiveDate>,

    /// Keep fines queried on or before this date
    #[arg(long, global = true, value_parser = parse_date)]
    to: Option<NaiveDate>,
}

#[derive(Subcommand)]
enum Commands {
    /// Normalize and deduplicate an export, writing canonical CSV
    Process {
        /// Path to a CSV export (optionally .gz)
        #[arg(value_name = "SOURCE")]
        source: String,

        /// CSV file to write the canonical records to
        #[arg(short, long, default_value = "fines_canonical.csv")]
        output: String,
    },
    /// Print headline metrics as JSON
    Metrics {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// CSV file to append a timestamped snapshot to
        #[arg(long)]
        history: Option<String>,
    },
    /// Print one rollup as JSON
    Aggregate {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// Dimension to group by
        #[arg(long, value_enum)]
        by: Dimension,

        /// Bucket width for the period series
        #[arg(long, value_enum, default_value_t = Unit::Month)]
        unit: Unit,

        /// First day of the period series range
        #[arg(long, value_parser = parse_date, requires = "end")]
        start: Option<NaiveDate>,

        /// Last day of the period series range
        #[arg(long, value_parser = parse_date, requires = "start")]
        end: Option<NaiveDate>,

        /// Year for the vehicle ranking (defaults to the current local year)
        #[arg(long)]
        year: Option<i32>,

        /// Keep only the first N entries of a ranking
        #[arg(long)]
        top: Option<usize>,
    },
    /// Write the full dashboard report as JSON
    Report {
        #[arg(value_name = "SOURCE")]
        source: String,

        /// JSON file to write the report to
        #[arg(short, long, default_value = "fines_report.json")]
        output: String,

        /// Bucket width for the period series
        #[arg(long, value_enum, default_value_t = Unit::Month)]
        unit: Unit,

        /// JSON object mapping location names to [lat, lon]
        #[arg(long)]
        geo: Option<String>,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum Dimension {
    Vehicle,
    Infraction,
    Location,
    Period,
    Weekday,
}

#[derive(Clone, Copy, ValueEnum)]
enum Unit {
    Week,
    Month,
}

impl From<Unit> for PeriodUnit {
    fn from(unit: Unit) -> Self {
        match unit {
            Unit::Week => PeriodUnit::Week,
            Unit::Month => PeriodUnit::Month,
        }
    }
}

fn parse_date(raw: &str) -> Result<NaiveDate, String> {
    normalize_date(raw).ok_or_else(|| format!("unrecognized date '{raw}'"))
}

fn main() -> Result<()> {
    dotenvy::dotenv().ok(); // Load .env file

    // Logging setup: colored stderr + JSON rolling log file
    let log_file_path =
        std::env::var("LOG_FILE_PATH").unwrap_or_else(|_| "logs/traffic_fines.log".to_string());
    let log_dir = Path::new(&log_file_path)
        .parent()
        .unwrap_or(Path::new("logs"));
    let log_file_name = Path::new(&log_file_path)
        .file_name()
        .unwrap_or(OsStr::new("traffic_fines.log"));

    let file_appender = tracing_appender::rolling::daily(log_dir, log_file_name);
    let (non_blocking_file, _file_guard) = tracing_appender::non_blocking(file_appender);

    let stderr_layer = fmt::layer()
        .with_target(true)
        .with_span_events(FmtSpan::CLOSE)
        .with_ansi(true)
        .with_writer(std::io::stderr)
        .with_filter(
            EnvFilter::builder()
                .with_default_directive(LevelFilter::INFO.into())
                .from_env_lossy(),
        );

    let json_layer = fmt::layer()
        .json()
        .with_current_span(true)
        .with_span_list(true)
        .with_writer(non_blocking_file)
        .with_filter(
            EnvFilter::builder()
                .with_env_var("RUST_LOG_JSON")
                .with_default_directive(LevelFilter::DEBUG.into())
                .from_env_lossy(),
        );

    tracing_subscriber::registry()
        .with(stderr_layer)
        .with(json_layer)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Process { source, output } => {
            let records = load_records(&source, &cli.global)?;
            write_records(&output, &records)?;
        }
        Commands::Metrics { source, history } => {
            let records = load_records(&source, &cli.global)?;
            let metrics = compute_metrics(&records);
            print_json(&metrics)?;

            if let Some(history) = history {
                let snapshot = MetricsSnapshot::from_metrics(&metrics).with_source(&source);
                append_record(&history, &snapshot)?;
                info!(path = %history, "Metrics snapshot appended");
            }
        }
        Commands::Aggregate {
            source,
            by,
            unit,
            start,
            end,
            year,
            top,
        } => {
            let records = load_records(&source, &cli.global)?;
            match by {
                Dimension::Vehicle => {
                    let rollups = match year {
                        Some(year) => aggregate_by_vehicle_in_year(&records, year),
                        None => aggregate_by_vehicle(&records),
                    };
                    print_json(&ranked(rollups, top))?;
                }
                Dimension::Infraction => {
                    print_json(&ranked(aggregate_by_infraction(&records), top))?;
                }
                Dimension::Location => {
                    print_json(&ranked(aggregate_by_location(&records), top))?;
                }
                Dimension::Period => {
                    let buckets = match (start, end) {
                        (Some(start), Some(end)) => {
                            if start > end {
                                bail!("--start {start} is after --end {end}");
                            }
                            aggregate_by_period_in_range(&records, unit.into(), start, end)
                        }
                        _ => aggregate_by_period(&records, unit.into()),
                    };
                    print_json(&buckets)?;
                }
                Dimension::Weekday => print_json(&aggregate_by_weekday(&records))?,
            }
        }
        Commands::Report {
            source,
            output,
            unit,
            geo,
        } => {
            let records = load_records(&source, &cli.global)?;
            let mut report = build_report(&records, unit.into());
            if let Some(geo) = geo {
                let geocoder = StaticGeocoder::load(&geo)?;
                debug!(entries = geocoder.len(), "Coordinates loaded");
                report = report.with_geolocation(&geocoder);
            }
            print_pretty(&report.metrics);
            write_json(&output, &report)?;
        }
    }

    Ok(())
}

fn ranked<T>(rollups: Vec<T>, top: Option<usize>) -> Vec<T> {
    match top {
        Some(n) => top_n(rollups, n),
        None => rollups,
    }
}

/// Loads `source`, runs the pipeline and applies the global period filter.
fn load_records(source: &str, global: &GlobalArgs) -> Result<Vec<FineRecord>> {
    let mut config = match &global.config {
        Some(path) => PipelineConfig::load(path)?,
        None => PipelineConfig::default(),
    };
    if let Some(status) = &global.status {
        config = config.with_status(PaymentStatus::parse(status));
    }

    let table = load_table(source)?;
    let set = Pipeline::new(config)
        .process(&table)
        .with_context(|| format!("failed to process '{source}'"))?;

    let report = set.report();
    if report.unparsed_amounts + report.unparsed_dates > 0 {
        warn!(
            amounts = report.unparsed_amounts,
            dates = report.unparsed_dates,
            "Some cells could not be read"
        );
    }

    let records = set.into_records();
    Ok(match (global.from, global.to) {
        (None, None) => records,
        (from, to) => filter_by_period(
            &records,
            from.unwrap_or(NaiveDate::MIN),
            to.unwrap_or(NaiveDate::MAX),
            DateField::Query,
        ),
    })
}
