//! Tabula CLI - validate and run report definitions.
//!
//! Usage:
//!   tabula fields
//!   tabula validate <report.json>
//!   tabula run <report.json> <rows.json> [--format <json|csv|chart|pdf>]
//!
//! Examples:
//!   tabula --config tabula.toml validate reports/revenue.json
//!   tabula run reports/revenue.json snapshots/orders.json --format csv

use clap::{Parser, Subcommand, ValueEnum};
use std::fs;
use std::path::PathBuf;
use std::process::ExitCode;

use tabula::config::Settings;
use tabula::execute::{CancellationToken, MemoryRowSource, ReportExecutor};
use tabula::export;
use tabula::model::ReportConfig;
use tabula::registry::FieldRegistry;
use tabula::shape::ReportResult;
use tabula::validate::{validate, ValidatedConfig};

#[derive(Parser)]
#[command(name = "tabula")]
#[command(about = "Tabula - an ad-hoc report definition and execution engine")]
#[command(version)]
struct Cli {
    /// Path to the settings file carrying the field catalogue
    #[arg(short, long, default_value = "tabula.toml", global = true)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the reportable fields, grouped by table
    Fields,

    /// Validate a report definition without running it
    Validate {
        /// Path to the report definition (JSON)
        report: PathBuf,
    },

    /// Run a report over a JSON row snapshot
    Run {
        /// Path to the report definition (JSON)
        report: PathBuf,

        /// Path to the row snapshot (JSON array of flat objects)
        rows: PathBuf,

        /// Output format
        #[arg(short, long, default_value = "json")]
        format: OutputFormat,
    },
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// Shaped result as JSON
    Json,
    /// CSV (table and summary results)
    Csv,
    /// Chart image payload as JSON
    Chart,
    /// PDF document payload as JSON
    Pdf,
}

#[tokio::main]
async fn main() -> ExitCode {
    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let settings = match Settings::from_file(&cli.config) {
        Ok(settings) => settings,
        Err(e) => {
            eprintln!("Error loading settings '{}': {}", cli.config.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let registry = match settings.registry() {
        Ok(registry) => registry,
        Err(e) => {
            eprintln!("Error building field registry: {}", e);
            return ExitCode::FAILURE;
        }
    };

    match cli.command {
        Commands::Fields => cmd_fields(&registry),
        Commands::Validate { report } => cmd_validate(&registry, report),
        Commands::Run {
            report,
            rows,
            format,
        } => cmd_run(&settings, &registry, report, rows, format).await,
    }
}

fn cmd_fields(registry: &FieldRegistry) -> ExitCode {
    for (table, fields) in registry.by_table() {
        println!("{}", table);
        for field in fields {
            println!("  {:<30} {:<8} {}", field.id, field.field_type.to_string(), field.label);
        }
    }
    ExitCode::SUCCESS
}

fn cmd_validate(registry: &FieldRegistry, report: PathBuf) -> ExitCode {
    let config = match load_config(&report) {
        Ok(config) => config,
        Err(code) => return code,
    };

    match validate(&config, registry) {
        Ok(validated) => {
            println!("report '{}' is valid", validated.name());
            ExitCode::SUCCESS
        }
        Err(errors) => {
            eprintln!("report '{}' has {} problem(s):", config.name, errors.len());
            for error in errors {
                eprintln!("  - {}", error);
            }
            ExitCode::FAILURE
        }
    }
}

async fn cmd_run(
    settings: &Settings,
    registry: &FieldRegistry,
    report: PathBuf,
    rows: PathBuf,
    format: OutputFormat,
) -> ExitCode {
    let config = match load_config(&report) {
        Ok(config) => config,
        Err(code) => return code,
    };

    let validated = match validate(&config, registry) {
        Ok(validated) => validated,
        Err(errors) => {
            eprintln!("report '{}' has {} problem(s):", config.name, errors.len());
            for error in errors {
                eprintln!("  - {}", error);
            }
            return ExitCode::FAILURE;
        }
    };

    let raw_rows = match fs::read_to_string(&rows) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error reading rows '{}': {}", rows.display(), e);
            return ExitCode::FAILURE;
        }
    };
    let source = match MemoryRowSource::from_json(&raw_rows) {
        Ok(source) => source,
        Err(e) => {
            eprintln!("Error parsing rows '{}': {}", rows.display(), e);
            return ExitCode::FAILURE;
        }
    };

    let executor = ReportExecutor::new().with_options(settings.evaluator_options());
    let cancel = CancellationToken::new();
    let result = match executor.execute(&validated, &source, &cancel).await {
        Ok(result) => result,
        Err(e) => {
            eprintln!("Report failed: {}", e);
            return ExitCode::FAILURE;
        }
    };

    emit(&validated, &result, format)
}

fn emit(validated: &ValidatedConfig, result: &ReportResult, format: OutputFormat) -> ExitCode {
    match format {
        OutputFormat::Json => match serde_json::to_string_pretty(result) {
            Ok(json) => {
                println!("{}", json);
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Error serializing result: {}", e);
                ExitCode::FAILURE
            }
        },
        OutputFormat::Csv => match export::to_csv(result) {
            Ok(bytes) => {
                print!("{}", String::from_utf8_lossy(&bytes));
                ExitCode::SUCCESS
            }
            Err(e) => {
                eprintln!("Export failed: {}", e);
                ExitCode::FAILURE
            }
        },
        OutputFormat::Chart => match export::to_chart_image(result, validated.name()) {
            Ok(spec) => print_json(&spec),
            Err(e) => {
                eprintln!("Export failed: {}", e);
                ExitCode::FAILURE
            }
        },
        OutputFormat::Pdf => match export::to_pdf(result, validated.name()) {
            Ok(doc) => print_json(&doc),
            Err(e) => {
                eprintln!("Export failed: {}", e);
                ExitCode::FAILURE
            }
        },
    }
}

fn print_json<T: serde::Serialize>(value: &T) -> ExitCode {
    match serde_json::to_string_pretty(value) {
        Ok(json) => {
            println!("{}", json);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error serializing payload: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn load_config(path: &PathBuf) -> Result<ReportConfig, ExitCode> {
    let raw = match fs::read_to_string(path) {
        Ok(raw) => raw,
        Err(e) => {
            eprintln!("Error reading report '{}': {}", path.display(), e);
            return Err(ExitCode::FAILURE);
        }
    };
    match serde_json::from_str(&raw) {
        Ok(config) => Ok(config),
        Err(e) => {
            eprintln!("Error parsing report '{}': {}", path.display(), e);
            Err(ExitCode::FAILURE)
        }
    }
}
