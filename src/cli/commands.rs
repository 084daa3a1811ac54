//! CLI command definitions for promoforge.
//!
//! This module provides the command-line interface for driving promotion
//! workflows: starting a run for an event, polling status, cancelling, and
//! regenerating individual assets on a finished run.

use crate::collaborators::RemoteCollaborator;
use crate::config::PromoConfig;
use crate::notify::HttpNotifier;
use crate::steps::{default_registry, PipelineDeps};
use crate::store::RedisStateStore;
use crate::workflow::{Orchestrator, RegenerationController, StateRecord, WorkflowStatus};
use clap::Parser;
use serde_json::{Map, Value};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

/// Poll interval while waiting for a run to finish.
const POLL_INTERVAL: Duration = Duration::from_millis(500);

/// Promotional asset workflow runner for community events.
#[derive(Parser)]
#[command(name = "promoforge")]
#[command(about = "Generate and file promotional assets for community events")]
#[command(version)]
#[command(
    long_about = "promoforge runs a durable multi-step workflow that generates promotional \
assets (flyer, social captions, broadcast message) for a community event and files them into \
storage, calendar, and task-tracker services.\n\nExample usage:\n  promoforge run --event \
./event.json"
)]
pub struct Cli {
    /// The subcommand to execute.
    #[command(subcommand)]
    pub command: Commands,

    /// Log level (trace, debug, info, warn, error).
    #[arg(short, long, default_value = "info", global = true)]
    pub log_level: String,
}

/// Available CLI subcommands.
#[derive(clap::Subcommand)]
pub enum Commands {
    /// Start a promotion workflow for an event and wait for it to finish.
    Run(RunArgs),

    /// Show the current status of a workflow run.
    Status(StatusArgs),

    /// Cancel an in-progress workflow run.
    Cancel(CancelArgs),

    /// Re-run selected steps of a finished workflow.
    #[command(alias = "regen")]
    Regenerate(RegenerateArgs),
}

/// Arguments for `promoforge run`.
#[derive(Parser, Debug)]
pub struct RunArgs {
    /// Path to a JSON file with the event details (title, description,
    /// start_date, location, ...).
    #[arg(short, long)]
    pub event: String,

    /// Path to a JSON file with generation preferences (flyer_style,
    /// target_audience, tone, ...).
    #[arg(short, long)]
    pub preferences: Option<String>,

    /// Path to a JSON file with requester info forwarded to the calendar
    /// service.
    #[arg(short, long)]
    pub user: Option<String>,

    /// Run id to use instead of a generated UUID.
    #[arg(long)]
    pub run_id: Option<String>,

    /// Return immediately after starting instead of waiting for completion.
    #[arg(long)]
    pub no_wait: bool,

    /// Output the final record as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `promoforge status`.
#[derive(Parser, Debug)]
pub struct StatusArgs {
    /// Run id to look up.
    pub run_id: String,

    /// Output the record as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Arguments for `promoforge cancel`.
#[derive(Parser, Debug)]
pub struct CancelArgs {
    /// Run id to cancel.
    pub run_id: String,
}

/// Arguments for `promoforge regenerate`.
#[derive(Parser, Debug)]
pub struct RegenerateArgs {
    /// Run id whose assets should be regenerated.
    pub run_id: String,

    /// Comma-separated step names to re-run (e.g. create_flyer,create_social_content).
    #[arg(short, long)]
    pub steps: String,

    /// Path to a JSON file with preference overrides merged before the replay.
    #[arg(short, long)]
    pub preferences: Option<String>,

    /// Output the final record as JSON.
    #[arg(short = 'j', long)]
    pub json: bool,
}

/// Parse CLI arguments without running a command.
pub fn parse_cli() -> Cli {
    Cli::parse()
}

/// Run the CLI by parsing arguments and executing the command.
///
/// This is a convenience function that parses CLI args and runs the command.
/// For more control over logging initialization, use `parse_cli()` and `run_with_cli()`.
pub async fn run() -> anyhow::Result<()> {
    run_with_cli(parse_cli()).await
}

/// Run the CLI with the parsed arguments.
///
/// This is the main entry point for the promoforge CLI.
pub async fn run_with_cli(cli: Cli) -> anyhow::Result<()> {
    match cli.command {
        Commands::Run(args) => {
            run_start_command(args).await?;
        }
        Commands::Status(args) => {
            run_status_command(args).await?;
        }
        Commands::Cancel(args) => {
            run_cancel_command(args).await?;
        }
        Commands::Regenerate(args) => {
            run_regenerate_command(args).await?;
        }
    }
    Ok(())
}

// ============================================================================
// Wiring
// ============================================================================

/// Builds the orchestrator from configuration: Redis store, one remote
/// collaborator per service, callback notifier, and the default registry.
async fn build_orchestrator(config: &PromoConfig) -> anyhow::Result<Orchestrator> {
    let store = Arc::new(RedisStateStore::connect(&config.redis_url, config.state_ttl_secs).await?);

    let generator = |service: &str, endpoint: &Option<String>| {
        Arc::new(RemoteCollaborator::new(
            service,
            endpoint.clone(),
            config.collaborator_token.clone(),
            config.collaborator_timeout,
        ))
    };

    let deps = PipelineDeps {
        flyer: generator("flyer", &config.flyer_endpoint),
        social: generator("social", &config.social_endpoint),
        broadcast: generator("broadcast", &config.broadcast_endpoint),
        storage: generator("storage", &config.storage_endpoint),
        calendar: generator("calendar", &config.calendar_endpoint),
        tracker: generator("tracker", &config.tracker_endpoint),
    };

    let notifier = Arc::new(HttpNotifier::new(
        config.callback_url.clone(),
        config.callback_token.clone(),
        config.notify_timeout,
    ));

    Ok(Orchestrator::new(
        store,
        Arc::new(default_registry(deps)),
        notifier,
        config.estimated_run_duration,
    ))
}

/// Reads a JSON object from a file, or returns an empty map when no path was
/// given.
fn read_json_object(path: Option<&str>) -> anyhow::Result<Map<String, Value>> {
    let Some(path) = path else {
        return Ok(Map::new());
    };
    let contents = std::fs::read_to_string(Path::new(path))
        .map_err(|e| anyhow::anyhow!("Failed to read {}: {}", path, e))?;
    let value: Value = serde_json::from_str(&contents)
        .map_err(|e| anyhow::anyhow!("Invalid JSON in {}: {}", path, e))?;
    match value {
        Value::Object(map) => Ok(map),
        _ => anyhow::bail!("{} must contain a JSON object", path),
    }
}

// ============================================================================
// Command Implementation
// ============================================================================

async fn run_start_command(args: RunArgs) -> anyhow::Result<()> {
    let config = PromoConfig::from_env()?;
    let orchestrator = build_orchestrator(&config).await?;

    let event_data = read_json_object(Some(&args.event))?;
    let preferences = read_json_object(args.preferences.as_deref())?;
    let user_info = read_json_object(args.user.as_deref())?;

    let run_id = args
        .run_id
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());
    let event_id = event_data
        .get("id")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| uuid::Uuid::new_v4().to_string());

    info!(run_id = %run_id, event_id = %event_id, "Starting promotion workflow");
    let record = orchestrator
        .start_workflow(&run_id, &event_id, event_data, preferences, user_info)
        .await;

    if args.no_wait {
        print_record(&record, args.json)?;
        return Ok(());
    }

    let record = wait_for_terminal(&orchestrator, &run_id).await?;
    print_record(&record, args.json)?;
    if record.status == WorkflowStatus::Failed {
        anyhow::bail!("Workflow {} failed", run_id);
    }
    Ok(())
}

/// Polls until the run leaves InProgress, logging each step transition.
async fn wait_for_terminal(
    orchestrator: &Orchestrator,
    run_id: &str,
) -> anyhow::Result<StateRecord> {
    let mut last_step = String::new();
    loop {
        let record = orchestrator
            .get_status(run_id)
            .await?
            .ok_or_else(|| anyhow::anyhow!("Workflow {} disappeared from the store", run_id))?;

        if record.current_step != last_step {
            info!(
                run_id = %run_id,
                step = %record.current_step,
                progress = record.progress_percentage,
                "Workflow progress"
            );
            last_step = record.current_step.clone();
        }

        if record.status.is_terminal() {
            return Ok(record);
        }
        tokio::time::sleep(POLL_INTERVAL).await;
    }
}

async fn run_status_command(args: StatusArgs) -> anyhow::Result<()> {
    let config = PromoConfig::from_env()?;
    let orchestrator = build_orchestrator(&config).await?;

    match orchestrator.get_status(&args.run_id).await? {
        Some(record) => print_record(&record, args.json)?,
        None => anyhow::bail!("No workflow found for run id {}", args.run_id),
    }
    Ok(())
}

async fn run_cancel_command(args: CancelArgs) -> anyhow::Result<()> {
    let config = PromoConfig::from_env()?;
    let orchestrator = build_orchestrator(&config).await?;

    if orchestrator.cancel(&args.run_id).await {
        println!("Cancelled workflow {}", args.run_id);
        Ok(())
    } else {
        anyhow::bail!(
            "Workflow {} was not cancellable (unknown or already finished)",
            args.run_id
        )
    }
}

async fn run_regenerate_command(args: RegenerateArgs) -> anyhow::Result<()> {
    let config = PromoConfig::from_env()?;
    let orchestrator = build_orchestrator(&config).await?;

    let step_names: Vec<String> = args
        .steps
        .split(',')
        .map(|s| s.trim().to_string())
        .filter(|s| !s.is_empty())
        .collect();
    if step_names.is_empty() {
        anyhow::bail!("--steps must name at least one step");
    }
    let overrides = read_json_object(args.preferences.as_deref())?;

    let controller = RegenerationController::new(
        orchestrator.store(),
        orchestrator.registry(),
        orchestrator.notifier(),
    );
    let record = controller
        .regenerate(&args.run_id, &step_names, overrides)
        .await?;
    print_record(&record, args.json)?;
    Ok(())
}

/// Prints a record either as pretty JSON or as a short human summary.
fn print_record(record: &StateRecord, json: bool) -> anyhow::Result<()> {
    if json {
        println!("{}", serde_json::to_string_pretty(record)?);
        return Ok(());
    }

    println!("Run:       {}", record.run_id);
    println!("Event:     {}", record.event_id);
    println!("Status:    {}", record.status.as_str());
    println!("Step:      {}", record.current_step);
    println!("Progress:  {}%", record.progress_percentage);
    if !record.completed_steps.is_empty() {
        println!("Completed: {}", record.completed_steps.join(", "));
    }
    if !record.failed_steps.is_empty() {
        println!("Failed:    {}", record.failed_steps.join(", "));
    }
    if let Some(message) = &record.error_message {
        println!("Error:     {}", message);
    }
    if !record.artifacts.is_empty() {
        let keys: Vec<&str> = record.artifact_keys().into_keys().collect();
        println!("Artifacts: {}", keys.join(", "));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn test_cli_structure() {
        Cli::command().debug_assert();
    }

    #[test]
    fn test_run_command_defaults() {
        let cli = Cli::parse_from(["promoforge", "run", "--event", "./event.json"]);
        match cli.command {
            Commands::Run(args) => {
                assert_eq!(args.event, "./event.json");
                assert!(args.preferences.is_none());
                assert!(args.user.is_none());
                assert!(args.run_id.is_none());
                assert!(!args.no_wait);
                assert!(!args.json);
            }
            _ => panic!("Expected Run command"),
        }
        assert_eq!(cli.log_level, "info");
    }

    #[test]
    fn test_regenerate_command_with_options() {
        let cli = Cli::parse_from([
            "promoforge",
            "regen",
            "run-42",
            "--steps",
            "create_flyer, create_social_content",
            "--preferences",
            "./overrides.json",
            "--json",
        ]);
        match cli.command {
            Commands::Regenerate(args) => {
                assert_eq!(args.run_id, "run-42");
                assert_eq!(args.steps, "create_flyer, create_social_content");
                assert_eq!(args.preferences.as_deref(), Some("./overrides.json"));
                assert!(args.json);
            }
            _ => panic!("Expected Regenerate command"),
        }
    }

    #[test]
    fn test_status_command() {
        let cli = Cli::parse_from(["promoforge", "status", "run-42", "-j"]);
        match cli.command {
            Commands::Status(args) => {
                assert_eq!(args.run_id, "run-42");
                assert!(args.json);
            }
            _ => panic!("Expected Status command"),
        }
    }

    #[test]
    fn test_step_name_splitting() {
        let names: Vec<String> = "create_flyer, ,create_social_content"
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();
        assert_eq!(names, vec!["create_flyer", "create_social_content"]);
    }
}
