//! In-process runtime shared by the CLI and the tool server

use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use tokio::sync::broadcast;

use devteam_sdk::{
    async_trait, BuildOptions, BuildResult, CompletionBackend, CostReport, DevTeamError,
    DevTeamRuntime, MarketplaceRoleMetadata, ProjectProgress, PurchaseOutcome, RunEvent,
    WorkflowRun, WorkflowStep,
};

use crate::backend::{BackendRegistry, ClaudeBackend, MockBackend};
use crate::build::BuildPipeline;
use crate::config::{Config, Provider};
use crate::cost::CostTracker;
use crate::events::EventBus;
use crate::marketplace::MarketplaceRegistry;
use crate::orchestrator::{ExecutionMode, Orchestrator, OrchestratorConfig};
use crate::progress::ProgressTracker;
use crate::roles::RoleSource;

/// Runtime wiring the team, the marketplace and one cost ledger together.
///
/// Workflow runs and builds share the ledger, the progress table and the
/// event bus, so progress and events of either kind are queryable by run id.
pub struct StudioRuntime {
    orchestrator: Orchestrator,
    builder: BuildPipeline,
    marketplace: MarketplaceRegistry,
    user_id: String,
}

impl StudioRuntime {
    /// Runtime for the configured provider
    pub fn from_config(config: &Config) -> Result<Self> {
        let ledger = CostTracker::new();
        let provider = config.resolved_provider();

        let backend = match provider {
            Provider::Scripted => None,
            provider => {
                let backends = Self::backends(config, &ledger)?;
                let backend = backends.get(Some(provider.as_str())).with_context(|| {
                    format!("ANTHROPIC_API_KEY is required for the {} provider", provider)
                })?;
                Some(backend)
            }
        };

        tracing::info!(provider = %provider, "Initialising runtime");
        Ok(Self::new(backend, ledger, config))
    }

    /// Every backend the configuration can reach. The mock is always present;
    /// the Claude backend needs an API key.
    fn backends(config: &Config, ledger: &CostTracker) -> Result<BackendRegistry> {
        let mut backends = BackendRegistry::new();
        backends.register(Arc::new(MockBackend::new(ledger.clone())));

        if let Some(api_key) = &config.api_key {
            let mut claude = ClaudeBackend::new(api_key.clone(), ledger.clone());
            if let Some(model) = &config.model {
                claude = claude.with_model(model.clone());
            }
            if let Some(secs) = config.timeout_secs {
                claude = claude.with_timeout(Duration::from_secs(secs))?;
            }
            backends.register(Arc::new(claude));
        }
        Ok(backends)
    }

    /// Scripted roles when `backend` is `None`, LLM roles otherwise
    pub fn new(backend: Option<Arc<dyn CompletionBackend>>, ledger: CostTracker, config: &Config) -> Self {
        let roles = match &backend {
            Some(backend) => RoleSource::Llm(backend.clone()),
            None => RoleSource::Scripted,
        };
        let mode = if roles.is_scripted() {
            ExecutionMode::Direct
        } else {
            ExecutionMode::Completion
        };

        let workflow_config = OrchestratorConfig {
            max_cost: config.max_cost,
            streaming: config.streaming,
            allow_rebinding: false,
            mode,
            model: config.model.clone(),
        };
        let build_config = OrchestratorConfig {
            mode: ExecutionMode::Direct,
            streaming: false,
            ..workflow_config.clone()
        };

        let mut orchestrator = Orchestrator::new(Arc::new(roles.team_registry()), ledger)
            .with_progress(ProgressTracker::new())
            .with_events(EventBus::default())
            .with_config(workflow_config);
        if let Some(backend) = backend {
            orchestrator = orchestrator.with_backend(backend);
        }

        let marketplace = MarketplaceRegistry::new();
        let builder = BuildPipeline::new(
            orchestrator.clone().with_config(build_config),
            marketplace.clone(),
            roles,
            config.output_dir.clone(),
        )
        .with_user_id(config.user_id.clone());

        Self {
            orchestrator,
            builder,
            marketplace,
            user_id: config.user_id.clone(),
        }
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn marketplace(&self) -> &MarketplaceRegistry {
        &self.marketplace
    }

    pub fn ledger(&self) -> &CostTracker {
        self.orchestrator.ledger()
    }

    /// User purchases default to
    pub fn user_id(&self) -> &str {
        &self.user_id
    }
}

#[async_trait]
impl DevTeamRuntime for StudioRuntime {
    async fn build_app(&self, description: &str, options: BuildOptions) -> BuildResult {
        self.builder.build(description, options).await
    }

    async fn run_workflow(&self, steps: Vec<WorkflowStep>) -> devteam_sdk::Result<WorkflowRun> {
        self.orchestrator.run_workflow(&steps).await
    }

    async fn get_progress(&self, run_id: &str) -> Option<ProjectProgress> {
        self.orchestrator.progress().get(run_id)
    }

    async fn purchase_role(
        &self,
        role_id: &str,
        user_id: &str,
        license_key: Option<&str>,
    ) -> PurchaseOutcome {
        match license_key {
            Some(key) => self.marketplace.purchase_with_key(role_id, user_id, key),
            None => self.marketplace.purchase(role_id, user_id),
        }
    }

    async fn list_marketplace_roles(&self) -> Vec<MarketplaceRoleMetadata> {
        self.marketplace.list()
    }

    fn subscribe_events(&self) -> broadcast::Receiver<RunEvent> {
        self.orchestrator.events().subscribe()
    }

    async fn get_events(&self, run_id: &str, limit: Option<usize>) -> devteam_sdk::Result<Vec<RunEvent>> {
        self.orchestrator
            .events()
            .events(run_id, limit)
            .ok_or_else(|| DevTeamError::RunNotFound(run_id.to_string()))
    }

    async fn cost_report(&self) -> CostReport {
        self.ledger().summary()
    }
}
