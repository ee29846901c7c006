//! Command-line interface

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{bail, Result};
use clap::{Parser, Subcommand};
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use devteam_sdk::{
    log_aggregate_stats, log_file_saved, log_info, log_stats, log_step_complete_console,
    log_step_failed_console, log_step_start_console, log_warning, BuildOptions, BuildResult,
    CostEntry, DevTeamRuntime, RunEvent,
};

use crate::build::PAYMENT_ROLE_ID;
use crate::config::{Config, Provider};
use crate::cost::{estimate_workflow_cost, format_cost_estimate, DEFAULT_TOKENS_PER_STEP};
use crate::mcp_server::serve_stdio;
use crate::mcp_tools::create_devteam_tool_server;
use crate::runtime::StudioRuntime;
use crate::utils::preview;
use crate::workflow_file::WorkflowFile;

/// How long to keep draining events after an operation returns
const EVENT_DRAIN_TIMEOUT: Duration = Duration::from_secs(1);

/// Characters of each context value shown after a workflow run
const CONTEXT_PREVIEW_CHARS: usize = 200;

/// AI development team: build apps and run role workflows
#[derive(Parser, Debug, Clone)]
#[command(name = "devteam", version, about)]
pub struct Cli {
    /// Config file (YAML); defaults to the platform config directory
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Completion provider
    #[arg(long, value_enum, global = true)]
    pub provider: Option<Provider>,

    /// Model name passed to the provider
    #[arg(long, global = true)]
    pub model: Option<String>,

    /// Abort once tracked spend exceeds this many dollars
    #[arg(long, global = true)]
    pub max_cost: Option<f64>,

    /// Stream completions for workflow runs
    #[arg(long, global = true)]
    pub stream: bool,

    /// Print the cost report after each command
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Write run events to stderr as JSON lines instead of console output
    #[arg(long, global = true)]
    pub json_events: bool,

    /// Where generated apps are written
    #[arg(long, global = true)]
    pub output_dir: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Build an app from a natural-language description
    Build {
        description: String,

        /// Never stop to suggest marketplace roles
        #[arg(long)]
        no_marketplace: bool,

        /// License the payment role with this key before building
        #[arg(long)]
        license_key: Option<String>,
    },

    /// Run a YAML workflow file
    Run { workflow: PathBuf },

    /// Purchase a marketplace role
    Purchase {
        role: String,

        #[arg(long)]
        license_key: Option<String>,

        /// Defaults to the configured user
        #[arg(long)]
        user: Option<String>,
    },

    /// List team and marketplace roles
    Roles,

    /// Estimate the cost of a workflow before running it
    Estimate {
        #[arg(long, default_value_t = 3)]
        steps: usize,

        #[arg(long, default_value_t = DEFAULT_TOKENS_PER_STEP)]
        tokens_per_step: u64,
    },

    /// Serve the devteam tools over stdio JSON-RPC
    Serve,
}

impl Cli {
    /// Overlay command-line flags on a loaded config
    pub fn apply_to(&self, config: &mut Config) {
        if let Some(provider) = self.provider {
            config.provider = Some(provider);
        }
        if let Some(model) = &self.model {
            config.model = Some(model.clone());
        }
        if let Some(max_cost) = self.max_cost {
            config.max_cost = Some(max_cost);
        }
        if let Some(output_dir) = &self.output_dir {
            config.output_dir = output_dir.clone();
        }
        config.streaming |= self.stream;
        config.verbose |= self.verbose;
        if let Command::Build { no_marketplace: true, .. } = self.command {
            config.use_marketplace = false;
        }
    }
}

pub async fn run(cli: Cli, config: Config) -> Result<()> {
    if let Command::Estimate {
        steps,
        tokens_per_step,
    } = cli.command
    {
        let cost = estimate_workflow_cost(steps, tokens_per_step);
        log_info!(
            "Estimated cost for {} steps at {} tokens each: {}",
            steps,
            tokens_per_step,
            format_cost_estimate(cost)
        );
        return Ok(());
    }

    let runtime = Arc::new(StudioRuntime::from_config(&config)?);

    if let Command::Serve = cli.command {
        let server = create_devteam_tool_server(runtime.clone(), runtime.user_id());
        return serve_stdio(server).await;
    }

    let printer = spawn_event_printer(runtime.subscribe_events(), cli.json_events);
    let outcome = match cli.command {
        Command::Build {
            description,
            license_key,
            ..
        } => build(&runtime, &description, license_key.as_deref(), config.use_marketplace).await,
        Command::Run { workflow } => run_workflow_file(&runtime, &workflow).await,
        Command::Purchase {
            role,
            license_key,
            user,
        } => {
            let user = user.unwrap_or_else(|| runtime.user_id().to_string());
            purchase(&runtime, &role, &user, license_key.as_deref()).await
        }
        Command::Roles => {
            list_roles(&runtime).await;
            Ok(())
        }
        Command::Estimate { .. } | Command::Serve => Ok(()),
    };

    if tokio::time::timeout(EVENT_DRAIN_TIMEOUT, printer).await.is_err() {
        tracing::debug!("Event printer still waiting, leaving it behind");
    }
    if config.verbose {
        println!();
        print_call_stats(&runtime.ledger().entries());
        println!("\n{}", runtime.cost_report().await);
    }
    outcome
}

/// One statistics line per tracked completion call; returns how many were printed
fn print_call_stats(entries: &[CostEntry]) -> usize {
    for entry in entries {
        log_stats!(
            format!("{}/{}", entry.provider, entry.model),
            entry.cost,
            entry.prompt_tokens,
            entry.completion_tokens
        );
    }
    entries.len()
}

async fn build(
    runtime: &StudioRuntime,
    description: &str,
    license_key: Option<&str>,
    use_marketplace: bool,
) -> Result<()> {
    if let Some(key) = license_key {
        purchase(runtime, PAYMENT_ROLE_ID, runtime.user_id(), Some(key)).await?;
    }

    log_info!("Building: {}", description);
    match runtime.build_app(description, BuildOptions { use_marketplace }).await {
        BuildResult::Success {
            summary,
            deployment_location,
            ..
        } => {
            println!("\n{}", summary);
            log_info!("App written to {}", deployment_location);
            Ok(())
        }
        BuildResult::Suggestion { message, .. } => {
            println!("\n{}", message);
            log_info!(
                "Re-run with --license-key <KEY> to include it, or --no-marketplace to build without it"
            );
            Ok(())
        }
        BuildResult::Error { message } => bail!(message),
    }
}

async fn run_workflow_file(runtime: &StudioRuntime, path: &std::path::Path) -> Result<()> {
    let workflow = WorkflowFile::load(path).await?;
    if !workflow.name.is_empty() {
        log_info!("Running workflow '{}' ({} steps)", workflow.name, workflow.steps.len());
    }

    let run = runtime.run_workflow(workflow.steps).await?;
    println!();
    for (key, value) in run.context.iter() {
        let text = match value {
            serde_json::Value::String(text) => text.clone(),
            other => other.to_string(),
        };
        println!("\x1b[1m{}\x1b[0m: {}", key, preview(&text, CONTEXT_PREVIEW_CHARS));
    }
    log_info!("Run {} cost ${:.4}", run.run_id, run.total_cost);
    Ok(())
}

async fn purchase(
    runtime: &StudioRuntime,
    role_id: &str,
    user_id: &str,
    license_key: Option<&str>,
) -> Result<()> {
    let outcome = runtime.purchase_role(role_id, user_id, license_key).await;
    if !outcome.success {
        bail!(outcome.message);
    }
    log_info!(outcome.message);
    Ok(())
}

async fn list_roles(runtime: &StudioRuntime) {
    println!("Team roles:");
    for id in runtime.orchestrator().registry().ids() {
        println!("  {}", id);
    }

    println!("\nMarketplace roles:");
    for role in runtime.list_marketplace_roles().await {
        let licensed = if runtime.marketplace().has_license(&role.id, runtime.user_id()) {
            " (licensed)"
        } else {
            ""
        };
        println!(
            "  {} - {} ${} ★{} by {}{}",
            role.id, role.name, role.price, role.rating, role.author, licensed
        );
        println!("      {}", role.description);
    }
}

/// Print events until the first terminal one
fn spawn_event_printer(mut rx: broadcast::Receiver<RunEvent>, json: bool) -> JoinHandle<()> {
    tokio::spawn(async move {
        let started = Instant::now();
        let mut completed_steps = 0usize;
        loop {
            let event = match rx.recv().await {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(skipped)) => {
                    tracing::warn!(skipped, "Event printer lagged");
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => break,
            };

            if json {
                event.emit();
            } else {
                if let RunEvent::StepCompleted { .. } = event {
                    completed_steps += 1;
                }
                print_event(&event, completed_steps, started);
            }
            if event.is_terminal() {
                break;
            }
        }
    })
}

fn print_event(event: &RunEvent, completed_steps: usize, started: Instant) {
    match event {
        RunEvent::RunStarted { total_steps, .. } => {
            log_info!("Starting run ({} steps)", total_steps);
        }
        RunEvent::StepStarted {
            step,
            total_steps,
            role,
            output_key,
            ..
        } => {
            log_step_start_console!(step, total_steps, role, output_key);
        }
        RunEvent::StreamChunk { content, .. } => {
            print!("{}", content);
            let _ = std::io::stdout().flush();
        }
        RunEvent::StepCompleted { step, cost, .. } => {
            log_step_complete_console!(step, cost);
        }
        RunEvent::StepFailed { step, error, .. } => {
            log_step_failed_console!(step, error);
        }
        RunEvent::BudgetExceeded { spent, limit, .. } => {
            log_warning!("Budget exceeded: ${:.4} spent, limit ${:.4}", spent, limit);
        }
        RunEvent::MarketplaceSuggestion { role_id, price, .. } => {
            log_info!("Marketplace role suggested: {} (${})", role_id, price);
        }
        RunEvent::FilesGenerated { path, count, .. } => {
            log_file_saved!(format!("{} ({} files)", path, count));
        }
        RunEvent::RunCompleted { total_cost, .. } => {
            log_aggregate_stats!(completed_steps, started.elapsed().as_millis(), total_cost);
        }
        RunEvent::RunFailed { error, .. } => {
            log_warning!("Run failed: {}", error);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_config() {
        let cli = Cli::parse_from([
            "devteam",
            "--provider",
            "scripted",
            "--max-cost",
            "0.5",
            "--stream",
            "--output-dir",
            "apps",
            "build",
            "a todo app",
            "--no-marketplace",
        ]);
        let mut config = Config::default();
        cli.apply_to(&mut config);

        assert_eq!(config.provider, Some(Provider::Scripted));
        assert_eq!(config.max_cost, Some(0.5));
        assert!(config.streaming);
        assert!(!config.use_marketplace);
        assert_eq!(config.output_dir, PathBuf::from("apps"));
    }

    #[test]
    fn test_unset_flags_keep_config() {
        let cli = Cli::parse_from(["devteam", "roles"]);
        let mut config = Config {
            model: Some("claude-3-haiku-20240307".to_string()),
            streaming: true,
            ..Default::default()
        };
        cli.apply_to(&mut config);

        assert_eq!(config.model.as_deref(), Some("claude-3-haiku-20240307"));
        assert!(config.streaming);
        assert!(config.use_marketplace);
    }

    #[test]
    fn test_subcommand_arguments() {
        let cli = Cli::parse_from([
            "devteam",
            "purchase",
            "stripe-expert",
            "--license-key",
            "DEMO-2024",
        ]);
        match cli.command {
            Command::Purchase {
                role,
                license_key,
                user,
            } => {
                assert_eq!(role, "stripe-expert");
                assert_eq!(license_key.as_deref(), Some("DEMO-2024"));
                assert!(user.is_none());
            }
            other => panic!("unexpected command: {:?}", other),
        }

        let cli = Cli::parse_from(["devteam", "estimate", "--steps", "5"]);
        assert!(matches!(
            cli.command,
            Command::Estimate {
                steps: 5,
                tokens_per_step: DEFAULT_TOKENS_PER_STEP
            }
        ));
    }

    #[test]
    fn test_call_stats_cover_every_entry() {
        let ledger = crate::cost::CostTracker::new();
        assert_eq!(print_call_stats(&ledger.entries()), 0);

        ledger.track("mock", "mock-model", 100, 50, 0.01, "product-manager");
        ledger.track("mock", "mock-model", 100, 50, 0.01, "frontend-developer");
        assert_eq!(print_call_stats(&ledger.entries()), 2);
    }
}
