//! snackcheck - black-box command tests mined from source conventions
//!
//! ## Commands
//!
//! - `inspect`: show the metadata mined for a command
//! - `mutation` / `variables` / `scenarios`: show what a suite would submit
//! - `run`: run the generated suites against the application
//! - `events` / `read-models` / `count`: query the local datastore
//! - `datastore`: back up or restore the local datastore around a run

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde::Serialize;
use tracing::{info, warn, Level};

use snackcheck_client::StaticTokenIssuer;
use snackcheck_core::{
    build_mutation, build_read_model_query, generate_battery, load_command_metadata, PollConfig,
    SuiteConfig, SuiteReport, SuiteRunner, VariableSets,
};
use snackcheck_store::{
    backup_datastores, restore_datastores, EventStore, LocalCounters, DEFAULT_BACKUP_SUFFIX,
};

#[derive(Parser)]
#[command(name = "snackcheck")]
#[command(author = "Stevedores Org")]
#[command(version = env!("CARGO_PKG_VERSION"))]
#[command(about = "Convention-mined black-box tests for event-sourced commands", long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit JSON-formatted log lines
    #[arg(long, global = true)]
    json: bool,

    /// Directory holding the command sources
    #[arg(long, global = true, env = "SNACKCHECK_COMMANDS_DIR")]
    commands_dir: Option<PathBuf>,

    /// Local provider datastore directory
    #[arg(long, global = true, env = "SNACKCHECK_STORE_DIR")]
    store_dir: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show the metadata mined for a command (JSON)
    Inspect {
        /// Command name, e.g. OrderSnack
        command: String,
    },

    /// Print the mutation document for a command
    Mutation { command: String },

    /// Print the synthesized variable sets for a command (JSON)
    Variables { command: String },

    /// List the scenarios generated for a command
    Scenarios { command: String },

    /// Print the list query for an entity's read model
    ReadModelQuery {
        /// Entity name, e.g. Fruit
        entity: String,

        /// Fields to select on each item
        #[arg(short, long)]
        field: Vec<String>,
    },

    /// Run the generated suites
    Run {
        /// Commands to test
        #[arg(required = true)]
        commands: Vec<String>,

        /// GraphQL endpoint of the application
        #[arg(long, env = "SNACKCHECK_GRAPHQL_URL")]
        graphql_url: Option<String>,

        /// Delay between event-store polls
        #[arg(long)]
        poll_interval_ms: Option<u64>,

        /// Give up polling after this long
        #[arg(long)]
        poll_timeout_ms: Option<u64>,

        /// Back up the datastore first and restore it afterwards
        #[arg(long)]
        isolate: bool,

        /// Write the reports as JSON to this file
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Look up event-store records by `{Entity}-{id}-{event|snapshot}` key
    Events {
        primary_key: String,

        /// Newest records first
        #[arg(long)]
        newest_first: bool,
    },

    /// Look up read-model records by id and read model name
    ReadModels { id: String, read_model: String },

    /// Count the items in a datastore table
    Count {
        #[arg(value_enum)]
        table: Table,

        /// Read model name (required for `read-models`)
        #[arg(long)]
        read_model: Option<String>,
    },

    /// Back up or restore the local datastore
    Datastore {
        #[command(subcommand)]
        action: DatastoreAction,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Table {
    Events,
    ReadModels,
    Subscriptions,
    Connections,
}

#[derive(Subcommand)]
enum DatastoreAction {
    /// Copy every table file to `<file>.<suffix>`
    Backup {
        #[arg(long, default_value = DEFAULT_BACKUP_SUFFIX)]
        suffix: String,
    },
    /// Discard changes and move the backups back into place
    Restore {
        #[arg(long, default_value = DEFAULT_BACKUP_SUFFIX)]
        suffix: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let mut config = SuiteConfig::from_env();
    if cli.verbose {
        config.log = config.log.with_level(Level::DEBUG);
    }
    if cli.json {
        config.log = config.log.with_json(true);
    }
    snackcheck_core::init_logging(&config.log);

    if let Some(dir) = cli.commands_dir {
        config = config.with_commands_dir(dir);
    }
    if let Some(dir) = cli.store_dir {
        config = config.with_store_dir(dir);
    }

    match cli.command {
        Commands::Inspect { command } => cmd_inspect(&config, &command).await,
        Commands::Mutation { command } => cmd_mutation(&config, &command).await,
        Commands::Variables { command } => cmd_variables(&config, &command).await,
        Commands::Scenarios { command } => cmd_scenarios(&config, &command).await,
        Commands::ReadModelQuery { entity, field } => cmd_read_model_query(&entity, &field),
        Commands::Run {
            commands,
            graphql_url,
            poll_interval_ms,
            poll_timeout_ms,
            isolate,
            output,
        } => {
            if let Some(url) = graphql_url {
                config = config.with_graphql_url(&url);
            }
            let poll = PollConfig::new(
                poll_interval_ms.unwrap_or(config.poll.interval_ms),
                poll_timeout_ms.unwrap_or(config.poll.timeout_ms),
            );
            config = config.with_poll(poll);
            cmd_run(&config, &commands, isolate, output.as_deref()).await
        }
        Commands::Events {
            primary_key,
            newest_first,
        } => cmd_events(&config.with_newest_first(newest_first), &primary_key).await,
        Commands::ReadModels { id, read_model } => {
            cmd_read_models(&config, &id, &read_model).await
        }
        Commands::Count { table, read_model } => {
            cmd_count(&config.store_dir, table, read_model.as_deref()).await
        }
        Commands::Datastore { action } => match action {
            DatastoreAction::Backup { suffix } => cmd_backup(&config.store_dir, &suffix),
            DatastoreAction::Restore { suffix } => cmd_restore(&config.store_dir, &suffix),
        },
    }
}

/// Show mined metadata
async fn cmd_inspect(config: &SuiteConfig, command: &str) -> Result<()> {
    let metadata = load_command_metadata(&config.commands_dir, command)
        .await
        .with_context(|| format!("Failed to load metadata for {command}"))?;
    println!("{}", serde_json::to_string_pretty(&metadata)?);
    Ok(())
}

async fn cmd_mutation(config: &SuiteConfig, command: &str) -> Result<()> {
    let metadata = load_command_metadata(&config.commands_dir, command)
        .await
        .with_context(|| format!("Failed to load metadata for {command}"))?;
    let mutation = build_mutation(&metadata.command_name, &metadata.parameters)?;
    print!("{mutation}");
    Ok(())
}

async fn cmd_variables(config: &SuiteConfig, command: &str) -> Result<()> {
    let metadata = load_command_metadata(&config.commands_dir, command)
        .await
        .with_context(|| format!("Failed to load metadata for {command}"))?;
    let sets = VariableSets::synthesize(&metadata.parameters)?;
    println!("{}", serde_json::to_string_pretty(&sets)?);
    Ok(())
}

async fn cmd_scenarios(config: &SuiteConfig, command: &str) -> Result<()> {
    let metadata = load_command_metadata(&config.commands_dir, command)
        .await
        .with_context(|| format!("Failed to load metadata for {command}"))?;
    let sets = VariableSets::synthesize(&metadata.parameters)?;
    let mutation = build_mutation(&metadata.command_name, &metadata.parameters)?;

    for scenario in generate_battery(&metadata, &mutation, &sets) {
        println!(
            "{:<24} {:<28} {}",
            scenario.kind.label(),
            scenario.actor.to_string(),
            scenario.name
        );
    }
    Ok(())
}

fn cmd_read_model_query(entity: &str, fields: &[String]) -> Result<()> {
    let fields: Vec<&str> = fields.iter().map(String::as_str).collect();
    let query = build_read_model_query(&format!("{entity}ReadModel"), &fields)?;
    print!("{query}");
    Ok(())
}

/// Per-run totals written alongside the reports.
#[derive(Debug, Serialize)]
struct RunSummary {
    passed: usize,
    failed: usize,
    reports: Vec<SuiteReport>,
}

/// Run suites, optionally inside a datastore backup/restore pair.
async fn cmd_run(
    config: &SuiteConfig,
    commands: &[String],
    isolate: bool,
    output: Option<&Path>,
) -> Result<()> {
    let tokens = StaticTokenIssuer::from_env().context("Failed to read role tokens")?;
    let runner = SuiteRunner::new(config.session(Arc::new(tokens)));

    let backed_up = if isolate {
        backup_datastores(&config.store_dir, DEFAULT_BACKUP_SUFFIX)
            .context("Failed to back up the local datastore")?
            .len()
    } else {
        0
    };
    if isolate && backed_up == 0 {
        warn!(dir = %config.store_dir.display(), "Datastore is empty, nothing to restore after the run");
    }

    let result = run_suites(&runner, config, commands).await;

    if backed_up > 0 {
        restore_datastores(&config.store_dir, DEFAULT_BACKUP_SUFFIX)
            .context("Failed to restore the local datastore")?;
    }
    let summary = result?;

    if let Some(path) = output {
        std::fs::write(path, serde_json::to_string_pretty(&summary)?)
            .with_context(|| format!("Failed to write {}", path.display()))?;
        info!(path = %path.display(), "Wrote suite reports");
    }

    if summary.failed > 0 {
        bail!("{} of {} scenarios failed", summary.failed, summary.passed + summary.failed);
    }
    Ok(())
}

async fn run_suites(
    runner: &SuiteRunner,
    config: &SuiteConfig,
    commands: &[String],
) -> Result<RunSummary> {
    let mut summary = RunSummary {
        passed: 0,
        failed: 0,
        reports: Vec::with_capacity(commands.len()),
    };

    for command in commands {
        let metadata = load_command_metadata(&config.commands_dir, command)
            .await
            .with_context(|| format!("Failed to load metadata for {command}"))?;
        let report = runner
            .run(&metadata)
            .await
            .with_context(|| format!("Failed to build the suite for {command}"))?;

        println!("{}", report.command_name);
        for outcome in &report.outcomes {
            let mark = if outcome.passed { "ok  " } else { "FAIL" };
            println!("  {mark} {} ({}ms)", outcome.name, outcome.duration_ms);
            if let Some(error) = &outcome.error {
                println!("       {error}");
            }
        }
        println!(
            "  {} passed, {} failed in {}ms",
            report.passed_count(),
            report.failed_count(),
            report.duration_ms
        );
        println!();

        summary.passed += report.passed_count();
        summary.failed += report.failed_count();
        summary.reports.push(report);
    }
    Ok(summary)
}

async fn cmd_events(config: &SuiteConfig, primary_key: &str) -> Result<()> {
    let records = config
        .event_store()
        .events(primary_key)
        .await
        .with_context(|| format!("Failed to query events for {primary_key}"))?;

    if records.is_empty() {
        println!("No records found for '{primary_key}'");
        return Ok(());
    }
    for record in records {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

async fn cmd_read_models(config: &SuiteConfig, id: &str, read_model: &str) -> Result<()> {
    let records = config
        .event_store()
        .read_models(id, read_model)
        .await
        .with_context(|| format!("Failed to query {read_model} records"))?;

    if records.is_empty() {
        println!("No {read_model} records found for '{id}'");
        return Ok(());
    }
    for record in records {
        println!("{}", serde_json::to_string(&record)?);
    }
    Ok(())
}

async fn count_items(store_dir: &Path, table: Table, read_model: Option<&str>) -> Result<usize> {
    let counters = LocalCounters::new(store_dir);
    let count = match table {
        Table::Events => counters.events().await?,
        Table::ReadModels => {
            let name = read_model.context("--read-model is required for read-models")?;
            counters.read_models(name).await?
        }
        Table::Subscriptions => counters.subscriptions().await?,
        Table::Connections => counters.connections().await?,
    };
    Ok(count)
}

async fn cmd_count(store_dir: &Path, table: Table, read_model: Option<&str>) -> Result<()> {
    let count = count_items(store_dir, table, read_model).await?;
    println!("{count}");
    Ok(())
}

fn cmd_backup(store_dir: &Path, suffix: &str) -> Result<()> {
    let written = backup_datastores(store_dir, suffix)
        .with_context(|| format!("Failed to back up {}", store_dir.display()))?;
    for path in written {
        println!("  {}", path.display());
    }
    Ok(())
}

fn cmd_restore(store_dir: &Path, suffix: &str) -> Result<()> {
    let restored = restore_datastores(store_dir, suffix)
        .with_context(|| format!("Failed to restore {}", store_dir.display()))?;
    for path in restored {
        println!("  {}", path.display());
    }
    Ok(())
}
