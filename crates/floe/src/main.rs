use std::num::NonZeroU64;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use floe_common::config::SplitPolicyKind;
use floe_common::Settings;
use floe_connector_file::{FileConnector, TableHandle};
use tracing::debug;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Configuration file; defaults to $FLOE_CONFIG_PATH or crates/common/config/default.toml.
    #[arg(short, long)]
    config: Option<String>,

    /// Data location to inspect, overriding any configuration file.
    #[arg(short, long, conflicts_with = "config")]
    location: Option<String>,

    #[arg(long, value_enum)]
    policy: Option<PolicyArg>,

    #[arg(long)]
    lines_per_split: Option<NonZeroU64>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
enum PolicyArg {
    PerFile,
    PerLineRange,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List schema names.
    Schemas,
    /// List the tables of a schema.
    Tables { schema: String },
    /// Show a table's storage path and columns.
    Describe { schema: String, table: String },
    /// Plan a table's splits and print them as JSON, one per line.
    Splits { schema: String, table: String },
}

fn resolve_settings(args: &Args) -> Result<Settings> {
    let mut settings = match (&args.location, &args.config) {
        (Some(location), _) => Settings::from_location(location.clone()),
        (None, Some(path)) => Settings::load(Some(path))
            .with_context(|| format!("failed to load configuration from {path}"))?,
        (None, None) => Settings::new().context("failed to load configuration")?,
    };

    if let Some(policy) = args.policy {
        settings.file.split_policy = match policy {
            PolicyArg::PerFile => SplitPolicyKind::PerFile,
            PolicyArg::PerLineRange => SplitPolicyKind::PerLineRange,
        };
    }
    if let Some(lines) = args.lines_per_split {
        settings.file.lines_per_split = lines.get();
    }
    settings.validate()?;
    Ok(settings)
}

fn run(args: &Args, out: &mut impl std::io::Write) -> Result<()> {
    let settings = resolve_settings(args)?;
    debug!(?settings, "resolved settings");
    let connector = FileConnector::new(&settings)?;
    let registry = connector.registry();

    match &args.command {
        Command::Schemas => {
            for name in registry.schema_names()? {
                writeln!(out, "{name}")?;
            }
        }
        Command::Tables { schema } => {
            for name in registry.table_names(schema)? {
                writeln!(out, "{name}")?;
            }
        }
        Command::Describe { schema, table } => {
            let definition = registry
                .table(schema, table)?
                .with_context(|| format!("table {schema}.{table} does not exist"))?;
            writeln!(out, "path\t{}", definition.storage_path)?;
            for column in &definition.columns {
                writeln!(out, "{}\t{}", column.name, column.data_type)?;
            }
        }
        Command::Splits { schema, table } => {
            let mut splits = connector
                .split_manager()
                .get_splits(&TableHandle::new(schema.as_str(), table.as_str()))?;
            // Listing order is filesystem-dependent; sort for stable output.
            splits.sort();
            for split in &splits {
                writeln!(out, "{}", serde_json::to_string(split)?)?;
            }
        }
    }
    Ok(())
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();
    run(&args, &mut std::io::stdout().lock())
}
