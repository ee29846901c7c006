// ============================================================================
// Runtime API
// ============================================================================

use async_trait::async_trait;
use tokio::sync::broadcast;

use crate::error::Result;
use crate::events::RunEvent;
use crate::types::{
    BuildOptions, BuildResult, CostReport, MarketplaceRoleMetadata, ProjectProgress,
    PurchaseOutcome, WorkflowRun, WorkflowStep,
};

/// Runtime surface for building apps and running workflows.
/// Shared by the CLI and the tool server.
#[async_trait]
pub trait DevTeamRuntime: Send + Sync {
    /// Run the full app build flow for a natural-language description
    async fn build_app(&self, description: &str, options: BuildOptions) -> BuildResult;

    /// Execute an ordered workflow and return its context and cost
    async fn run_workflow(&self, steps: Vec<WorkflowStep>) -> Result<WorkflowRun>;

    /// Progress snapshot of a build or workflow run
    async fn get_progress(&self, run_id: &str) -> Option<ProjectProgress>;

    /// Purchase a premium role for a user, optionally validating a license key
    async fn purchase_role(
        &self,
        role_id: &str,
        user_id: &str,
        license_key: Option<&str>,
    ) -> PurchaseOutcome;

    async fn list_marketplace_roles(&self) -> Vec<MarketplaceRoleMetadata>;

    /// Subscribe to events from every run started after this call
    fn subscribe_events(&self) -> broadcast::Receiver<RunEvent>;

    /// Buffered events of one run, most recent `limit` when set
    async fn get_events(&self, run_id: &str, limit: Option<usize>) -> Result<Vec<RunEvent>>;

    async fn cost_report(&self) -> CostReport;
}
