//! Shared fixtures for the integration tests

use std::path::Path;
use std::sync::Arc;

use serde_json::Value;

use devteam::build::BuildPipeline;
use devteam::config::{Config, Provider};
use devteam::cost::CostTracker;
use devteam::events::EventBus;
use devteam::marketplace::MarketplaceRegistry;
use devteam::orchestrator::{Orchestrator, OrchestratorConfig};
use devteam::progress::ProgressTracker;
use devteam::registry::RoleRegistry;
use devteam::roles::{RoleSource, ScriptedRole, TeamMember};
use devteam::runtime::StudioRuntime;
use devteam_sdk::WorkflowStep;

pub fn step(role: &str, input: impl Into<Value>, output_key: &str) -> WorkflowStep {
    WorkflowStep::new(role, input, output_key)
}

/// Orchestrator over the scripted team with its own ledger
pub fn scripted_orchestrator() -> Orchestrator {
    orchestrator_with(RoleRegistry::with_scripted_roles(), CostTracker::new(), OrchestratorConfig::default())
}

pub fn orchestrator_with(registry: RoleRegistry, ledger: CostTracker, config: OrchestratorConfig) -> Orchestrator {
    Orchestrator::new(Arc::new(registry), ledger)
        .with_progress(ProgressTracker::new())
        .with_events(EventBus::default())
        .with_config(config)
}

/// Scripted team whose product manager bills `cost` per execution
pub fn billed_registry(ledger: &CostTracker, cost: f64) -> RoleRegistry {
    let mut registry = RoleRegistry::with_scripted_roles();
    registry.register_role(Arc::new(
        ScriptedRole::member(TeamMember::ProductManager).with_billing(ledger.clone(), cost),
    ));
    registry
}

/// Build pipeline over the scripted team writing into `output_dir`
pub fn scripted_pipeline(output_dir: &Path, marketplace: MarketplaceRegistry) -> BuildPipeline {
    BuildPipeline::new(scripted_orchestrator(), marketplace, RoleSource::Scripted, output_dir)
}

pub fn scripted_runtime(output_dir: &Path) -> StudioRuntime {
    let config = Config {
        provider: Some(Provider::Scripted),
        output_dir: output_dir.to_path_buf(),
        ..Default::default()
    };
    StudioRuntime::from_config(&config).unwrap()
}
