//! csvpivot CLI - Pivot CSV files from the command line
//!
//! Usage:
//!   csvpivot describe <file.csv>
//!   csvpivot preview <file.csv> [--limit <n>]
//!   csvpivot long <file.csv> --rows <col>... --measure <col> [--agg <agg>] [--filter <spec>]...
//!   csvpivot wide <file.csv> --rows <col>... --column <col> --measure <col> [--max-cols <n>]
//!
//! Examples:
//!   csvpivot long sales.csv --rows region --measure qty --agg sum
//!   csvpivot long sales.csv --rows region --measure qty --filter region:contains:es
//!   csvpivot wide sales.csv --rows year --column region --measure qty --format xlsx -o out.xlsx

use clap::{Args, Parser, Subcommand, ValueEnum};
use csvpivot::config::Settings;
use csvpivot::executor::ResultTable;
use csvpivot::export::{to_csv_bytes, to_xlsx_bytes};
use csvpivot::filter::{build_where, FilterSpec};
use csvpivot::pivot::{Aggregation, PivotRequest};
use csvpivot::session::PivotSession;
use csvpivot::source::TabularSource;
use csvpivot::PivotError;
use std::fs;
use std::io::Write;
use std::path::PathBuf;
use std::process::ExitCode;
use std::str::FromStr;

#[derive(Parser)]
#[command(name = "csvpivot")]
#[command(about = "csvpivot - Pivot tables over CSV files")]
#[command(version)]
struct Cli {
    /// Settings file (defaults to the usual lookup order)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the columns of a CSV file and their detected types
    Describe {
        /// Path to the CSV file
        file: PathBuf,
    },

    /// Show the first rows of a CSV file
    Preview {
        /// Path to the CSV file
        file: PathBuf,

        /// Number of rows (defaults to pivot.preview_limit)
        #[arg(short, long)]
        limit: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Long pivot: one row per group with a single value column
    Long {
        #[command(flatten)]
        pivot: PivotArgs,

        #[command(flatten)]
        output: OutputArgs,
    },

    /// Wide pivot: one value column per distinct value of --column
    Wide {
        #[command(flatten)]
        pivot: PivotArgs,

        /// Column whose distinct values become output columns
        #[arg(short, long)]
        column: String,

        /// Ceiling on distinct values (defaults to pivot.max_pivot_cols)
        #[arg(long)]
        max_cols: Option<u64>,

        #[command(flatten)]
        output: OutputArgs,
    },
}

#[derive(Args)]
struct PivotArgs {
    /// Path to the CSV file
    file: PathBuf,

    /// Row dimension, repeatable
    #[arg(short, long = "rows", value_name = "COLUMN")]
    rows: Vec<String>,

    /// Aggregated column (ignored for count)
    #[arg(short, long, default_value = "")]
    measure: String,

    /// Aggregation function: sum, count, avg, min or max
    #[arg(short, long, default_value = "sum", value_parser = parse_aggregation)]
    agg: Aggregation,

    /// Filter as col:op[:value], repeatable
    #[arg(short, long = "filter", value_name = "SPEC")]
    filters: Vec<String>,

    /// JSON file holding an array of {"col", "op", "value"} filters
    #[arg(long)]
    filters_json: Option<PathBuf>,

    /// Maximum number of output rows (defaults to pivot.preview_limit)
    #[arg(short, long)]
    limit: Option<u64>,
}

#[derive(Args)]
struct OutputArgs {
    /// Output format
    #[arg(long, default_value = "csv")]
    format: FormatArg,

    /// Write to a file instead of stdout
    #[arg(short, long)]
    output: Option<PathBuf>,
}

#[derive(Clone, ValueEnum)]
enum FormatArg {
    /// Comma-separated values
    Csv,
    /// Excel workbook (requires --output)
    Xlsx,
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    let settings = match &cli.config {
        Some(path) => Settings::from_file(path),
        None => Settings::load(),
    };
    let settings = match settings {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let session = match PivotSession::connect(&settings).await {
        Ok(s) => s,
        Err(e) => {
            eprintln!("Failed to start engine: {}", e);
            return ExitCode::FAILURE;
        }
    };

    let result = match cli.command {
        Commands::Describe { file } => cmd_describe(&session, file).await,
        Commands::Preview {
            file,
            limit,
            output,
        } => {
            let rows = limit.unwrap_or(settings.pivot.preview_limit);
            match session.preview(&TabularSource::path(file), rows).await {
                Ok(table) => write_table(&table, &output),
                Err(e) => Err(report(e)),
            }
        }
        Commands::Long { pivot, output } => {
            cmd_long(&session, &settings, pivot, &output).await
        }
        Commands::Wide {
            pivot,
            column,
            max_cols,
            output,
        } => {
            let max_cols = max_cols.unwrap_or(settings.pivot.max_pivot_cols);
            cmd_wide(&session, &settings, pivot, column, max_cols, &output).await
        }
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_describe<E>(session: &PivotSession<E>, file: PathBuf) -> Result<(), String>
where
    E: csvpivot::QueryExecutor,
{
    let source = TabularSource::path(&file);
    let columns = session
        .describe_columns(&source)
        .await
        .map_err(report)?;

    println!("File: {}", file.display());
    println!();
    for column in &columns {
        println!("  - {} ({})", column.name, column.raw_type);
    }
    Ok(())
}

async fn cmd_long<E>(
    session: &PivotSession<E>,
    settings: &Settings,
    args: PivotArgs,
    output: &OutputArgs,
) -> Result<(), String>
where
    E: csvpivot::QueryExecutor,
{
    let (source, request) = prepare_request(session, settings, args).await?;
    let table = session
        .run_long_pivot(&source, &request)
        .await
        .map_err(report)?;
    write_table(&table, output)
}

async fn cmd_wide<E>(
    session: &PivotSession<E>,
    settings: &Settings,
    args: PivotArgs,
    column: String,
    max_cols: u64,
    output: &OutputArgs,
) -> Result<(), String>
where
    E: csvpivot::QueryExecutor,
{
    let (source, request) = prepare_request(session, settings, args).await?;
    let request = request.wide(column).with_max_distinct_cols(max_cols);
    let table = session
        .run_wide_pivot(&source, &request)
        .await
        .map_err(report)?;
    write_table(&table, output)
}

/// Resolve filters against the file's column types and build the request.
async fn prepare_request<E>(
    session: &PivotSession<E>,
    settings: &Settings,
    args: PivotArgs,
) -> Result<(TabularSource, PivotRequest), String>
where
    E: csvpivot::QueryExecutor,
{
    let source = TabularSource::path(&args.file);
    let aggregation = args.agg;
    if args.measure.is_empty() && aggregation != Aggregation::Count {
        return Err(format!("--measure is required for {}", aggregation));
    }

    let mut filters = match &args.filters_json {
        Some(path) => {
            let content = fs::read_to_string(path)
                .map_err(|e| format!("reading '{}': {}", path.display(), e))?;
            serde_json::from_str::<Vec<FilterSpec>>(&content)
                .map_err(|e| format!("parsing '{}': {}", path.display(), e))?
        }
        None => Vec::new(),
    };
    for spec in &args.filters {
        filters.push(parse_filter(spec)?);
    }

    let where_sql = if filters.is_empty() {
        String::new()
    } else {
        let types = session
            .column_types(&source)
            .await
            .map_err(report)?;
        build_where(&filters, &types).map_err(report)?
    };

    let request = PivotRequest::new(args.rows, args.measure, aggregation)
        .with_where(where_sql)
        .with_limit(args.limit.unwrap_or(settings.pivot.preview_limit));
    Ok((source, request))
}

fn parse_aggregation(s: &str) -> Result<Aggregation, String> {
    Aggregation::from_str(s).map_err(|e| e.to_string())
}

/// Label pivot errors so bad input reads differently from engine trouble.
fn report(err: PivotError) -> String {
    if err.is_user_error() {
        format!("invalid request: {}", err)
    } else {
        err.to_string()
    }
}

/// Parse `col:op[:value]`. The value may itself contain colons.
fn parse_filter(spec: &str) -> Result<FilterSpec, String> {
    let mut parts = spec.splitn(3, ':');
    match (parts.next(), parts.next(), parts.next()) {
        (Some(col), Some(op), value) if !col.is_empty() && !op.is_empty() => {
            Ok(FilterSpec::new(col, op, value.unwrap_or("")))
        }
        _ => Err(format!(
            "invalid filter '{}': expected col:op[:value]",
            spec
        )),
    }
}

fn write_table(table: &ResultTable, output: &OutputArgs) -> Result<(), String> {
    let bytes = match output.format {
        FormatArg::Csv => to_csv_bytes(table),
        FormatArg::Xlsx => {
            if output.output.is_none() {
                return Err("xlsx output requires --output".to_string());
            }
            to_xlsx_bytes(table)
        }
    }
    .map_err(|e| e.to_string())?;

    match &output.output {
        Some(path) => fs::write(path, bytes)
            .map_err(|e| format!("writing '{}': {}", path.display(), e)),
        None => std::io::stdout()
            .write_all(&bytes)
            .map_err(|e| e.to_string()),
    }
}
