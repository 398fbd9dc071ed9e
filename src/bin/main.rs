//! gaarf CLI - Compile report queries against a schema
//!
//! Usage:
//!   gaarf compile <query.sql> [--schema <schema.json>] [--macro name=value]... [--param name=value]... [--output text|json]
//!   gaarf expand <query.sql> [--macro name=value]... [--param name=value]...
//!   gaarf resources [--schema <schema.json>]
//!
//! Examples:
//!   gaarf compile queries/campaigns.sql --schema schema/v14.json --macro start_date=:YYYYMMDD-7
//!   gaarf expand queries/campaigns.sql --macro start_date=:YYYYMM-1
//!   gaarf compile queries/templated.sql --param metrics=metrics.clicks,metrics.cost_micros --output json

use clap::{Parser, Subcommand, ValueEnum};
use gaarf::compile::{expand_query, prepare_query, PrepareOptions};
use gaarf::config::Settings;
use gaarf::macros::{parse_assignment, MacroMap, MacroValue, SystemClock};
use gaarf::retry::with_retry;
use gaarf::schema::{Schema, SchemaError};
use gaarf::template::TemplateParams;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use tracing::warn;

/// Attempt cap for reading the schema when `[retry] max_attempts` is unset.
const DEFAULT_SCHEMA_ATTEMPTS: u32 = 3;

#[derive(Parser)]
#[command(name = "gaarf")]
#[command(about = "gaarf - Compile report queries with macros and templates against a resource schema")]
#[command(version)]
struct Cli {
    /// Enable debug logging (overridden by RUST_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to a gaarf.toml config file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Compile a query file and print its columns
    Compile {
        /// Path to the query file
        file: PathBuf,

        /// Path to the JSON schema descriptor (defaults to [schema] path in config)
        #[arg(short, long)]
        schema: Option<PathBuf>,

        /// Macro value as name=value (repeatable)
        #[arg(short = 'm', long = "macro", value_parser = parse_macro)]
        macros: Vec<(String, MacroValue)>,

        /// Template parameter as name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        output: OutputFormat,
    },

    /// Apply templates and macros to a query file and print the result
    Expand {
        /// Path to the query file
        file: PathBuf,

        /// Macro value as name=value (repeatable)
        #[arg(short = 'm', long = "macro", value_parser = parse_macro)]
        macros: Vec<(String, MacroValue)>,

        /// Template parameter as name=value (repeatable)
        #[arg(short, long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },

    /// List the resources a schema can select from
    Resources {
        /// Path to the JSON schema descriptor (defaults to [schema] path in config)
        #[arg(short, long)]
        schema: Option<PathBuf>,
    },
}

#[derive(Clone, ValueEnum)]
enum OutputFormat {
    /// Normalized query plus a column table
    Text,
    /// Compiled query as JSON
    Json,
}

fn parse_macro(s: &str) -> Result<(String, MacroValue), String> {
    parse_assignment(s).ok_or_else(|| format!("expected name=value, got '{}'", s))
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    parse_assignment(s)
        .map(|(name, value)| (name, value.to_string()))
        .ok_or_else(|| format!("expected name=value, got '{}'", s))
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

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

    match cli.command {
        Commands::Compile {
            file,
            schema,
            macros,
            params,
            output,
        } => cmd_compile(&settings, file, schema, macros, params, output).await,
        Commands::Expand {
            file,
            macros,
            params,
        } => cmd_expand(&settings, file, macros, params),
        Commands::Resources { schema } => cmd_resources(&settings, schema).await,
    }
}

fn init_tracing(verbose: bool) {
    let default_level = if verbose {
        tracing::Level::DEBUG
    } else {
        tracing::Level::WARN
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(default_level.into()),
        )
        .with_writer(io::stderr)
        .init();
}

async fn cmd_compile(
    settings: &Settings,
    file: PathBuf,
    schema_path: Option<PathBuf>,
    macros: Vec<(String, MacroValue)>,
    params: Vec<(String, String)>,
    output: OutputFormat,
) -> ExitCode {
    let Some(text) = read_query(&file) else {
        return ExitCode::FAILURE;
    };
    let Some(schema) = load_schema(settings, schema_path).await else {
        return ExitCode::FAILURE;
    };

    let mut macros = settings.merged_macros(macros.into_iter().collect());
    let template_params = template_params(settings, params);
    let clock = SystemClock;
    let mut options = PrepareOptions::new(&clock);
    if let Some(params) = &template_params {
        options = options.with_template(params);
    }

    let prepared = match prepare_query(&text, &mut macros, &schema, options) {
        Ok(p) => p,
        Err(e) => {
            eprintln!("Compilation error: {}", e);
            return ExitCode::FAILURE;
        }
    };
    let query = prepared.query;

    match output {
        OutputFormat::Text => {
            println!("-- Source: {}", file.display());
            println!(
                "-- Resource: {} ({})",
                query.resource().name,
                query.resource().type_name
            );
            println!("{}", query.query_text());
            println!();
            for column in query.columns() {
                let repeated = if column.field_type.repeated { "[]" } else { "" };
                let customizer = match column.customizer {
                    Some(c) => format!(" {}", serde_json::to_string(c).unwrap_or_default()),
                    None => String::new(),
                };
                println!(
                    "{:>3}  {:<30} {:<40} {}:{}{}{}",
                    column.index,
                    column.name,
                    column.field,
                    column.field_type.kind,
                    column.field_type.type_name,
                    repeated,
                    customizer
                );
            }
        }
        OutputFormat::Json => match serde_json::to_string_pretty(&query) {
            Ok(json) => println!("{}", json),
            Err(e) => {
                eprintln!("Error serializing compiled query: {}", e);
                return ExitCode::FAILURE;
            }
        },
    }

    ExitCode::SUCCESS
}

fn cmd_expand(
    settings: &Settings,
    file: PathBuf,
    macros: Vec<(String, MacroValue)>,
    params: Vec<(String, String)>,
) -> ExitCode {
    let Some(text) = read_query(&file) else {
        return ExitCode::FAILURE;
    };

    let mut macros: MacroMap = settings.merged_macros(macros.into_iter().collect());
    let template_params = template_params(settings, params);
    let clock = SystemClock;
    let mut options = PrepareOptions::new(&clock);
    if let Some(params) = &template_params {
        options = options.with_template(params);
    }

    match expand_query(&text, &mut macros, options) {
        Ok(expanded) => {
            for name in &expanded.unresolved_macros {
                warn!("macro '{}' is used in the query but not specified", name);
            }
            println!("{}", expanded.text);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Expansion error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn cmd_resources(settings: &Settings, schema_path: Option<PathBuf>) -> ExitCode {
    let Some(schema) = load_schema(settings, schema_path).await else {
        return ExitCode::FAILURE;
    };

    println!("Namespace: {}", schema.namespace());
    println!();
    println!("Resources:");
    for name in schema.resource_names() {
        match schema.resource(name) {
            Ok(def) => println!("  - {} ({})", name, def.name),
            Err(e) => println!("  - {} (unresolved: {})", name, e),
        }
    }

    ExitCode::SUCCESS
}

fn read_query(file: &Path) -> Option<String> {
    match fs::read_to_string(file) {
        Ok(s) => Some(s),
        Err(e) => {
            eprintln!("Error reading file '{}': {}", file.display(), e);
            None
        }
    }
}

/// Template rendering is enabled only when some parameter is configured.
fn template_params(settings: &Settings, params: Vec<(String, String)>) -> Option<TemplateParams> {
    let overrides: TemplateParams = params
        .into_iter()
        .map(|(name, value)| (name, serde_json::Value::String(value)))
        .collect();
    let merged = settings.merged_template_params(overrides);
    (!merged.is_empty()).then_some(merged)
}

/// Load the schema, retrying transient read failures per the [retry] settings.
async fn load_schema(settings: &Settings, schema_path: Option<PathBuf>) -> Option<Schema> {
    let path = match schema_path {
        Some(p) => p,
        None => match settings.schema.resolved_path() {
            Ok(Some(p)) => p,
            Ok(None) => {
                eprintln!("No schema given: pass --schema or set [schema] path in gaarf.toml");
                return None;
            }
            Err(e) => {
                eprintln!("Configuration error: {}", e);
                return None;
            }
        },
    };

    let options = match settings.retry.to_options() {
        Ok(o) if o.max_attempts.is_none() => o.with_max_attempts(DEFAULT_SCHEMA_ATTEMPTS),
        Ok(o) => o,
        Err(e) => {
            eprintln!("Configuration error: {}", e);
            return None;
        }
    };

    let result = with_retry(
        || async { Schema::from_file(&path) },
        |error: &SchemaError, attempt| is_transient(error) && options.retry_up_to_max(attempt),
        &options,
    )
    .await;

    match result {
        Ok(schema) => Some(schema),
        Err(e) => {
            eprintln!("Error loading schema '{}': {}", path.display(), e);
            None
        }
    }
}

fn is_transient(error: &SchemaError) -> bool {
    match error {
        SchemaError::Read { source, .. } => matches!(
            source.kind(),
            io::ErrorKind::Interrupted | io::ErrorKind::TimedOut | io::ErrorKind::WouldBlock
        ),
        _ => false,
    }
}
