//! App build flow: requirements, frontend, backend, optional payments, files
//!
//! Runs the core team through the orchestrator one phase at a time. After
//! the requirements phase the build may stop with a marketplace suggestion
//! when the app needs payments and the payment role is not licensed.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use serde_json::json;
use uuid::Uuid;

use devteam_sdk::{
    BuildOptions, BuildResult, DevTeamError, MarketplaceRoleMetadata, Role, RunEvent, StepStatus,
    WorkflowStep,
};

use crate::generator::{generate_app, AppArtifacts};
use crate::marketplace::MarketplaceRegistry;
use crate::orchestrator::{Orchestrator, RunState};
use crate::roles::{RoleSource, TeamMember};

/// Progress phases of a build, in order
pub const BUILD_PHASES: [&str; 5] = [
    "Requirements Analysis",
    "Frontend Development",
    "Backend Development",
    "Integration",
    "Deployment",
];

/// Marketplace role offered when an app needs payments
pub const PAYMENT_ROLE_ID: &str = "stripe-expert";

pub const DEFAULT_USER_ID: &str = "current-user";

/// True when the requirements or the description mention payments
pub fn needs_payments(requirements: &str, description: &str) -> bool {
    let requirements = requirements.to_lowercase();
    let description = description.to_lowercase();
    requirements.contains("payment") || description.contains("payment") || description.contains("stripe")
}

pub fn suggestion_message(role: &MarketplaceRoleMetadata) -> String {
    format!(
        "I noticed your app needs payment processing. The {} role can add professional Stripe integration with:
• Secure checkout flow
• Subscription management
• Customer portal
• Automated invoicing
• Webhook handling

This premium role costs ${} and will save hours of development time.",
        role.name, role.price
    )
}

fn summary(app_name: &str, with_payments: bool, total_cost: f64, seconds: u64) -> String {
    let mut lines = vec![
        format!("Created {} with:", app_name),
        "• Requirements analysis by AI Product Manager".to_string(),
        "• Frontend built by AI Frontend Developer".to_string(),
        "• Backend API by AI Backend Developer".to_string(),
    ];
    if with_payments {
        lines.push("• Professional Stripe integration".to_string());
    }
    lines.push("• Ready for deployment".to_string());
    lines.push(String::new());
    lines.push(format!("Total AI cost: ${:.2}", total_cost));
    lines.push(format!("Time: {} seconds", seconds));
    lines.join("\n")
}

/// Drives [`BUILD_PHASES`] for one app description
#[derive(Clone)]
pub struct BuildPipeline {
    orchestrator: Orchestrator,
    marketplace: MarketplaceRegistry,
    roles: RoleSource,
    output_dir: PathBuf,
    user_id: String,
}

impl BuildPipeline {
    /// `orchestrator` must resolve the core team ids
    pub fn new(
        orchestrator: Orchestrator,
        marketplace: MarketplaceRegistry,
        roles: RoleSource,
        output_dir: impl Into<PathBuf>,
    ) -> Self {
        Self {
            orchestrator,
            marketplace,
            roles,
            output_dir: output_dir.into(),
            user_id: DEFAULT_USER_ID.to_string(),
        }
    }

    /// User whose licenses gate premium roles
    pub fn with_user_id(mut self, user_id: impl Into<String>) -> Self {
        self.user_id = user_id.into();
        self
    }

    pub fn orchestrator(&self) -> &Orchestrator {
        &self.orchestrator
    }

    pub fn output_dir(&self) -> &Path {
        &self.output_dir
    }

    pub async fn build(&self, description: &str, options: BuildOptions) -> BuildResult {
        let run_id = format!("project-{}", Uuid::new_v4());
        let mut state = RunState::new(run_id.clone());

        match self.run(&mut state, description, options).await {
            Ok(result) => result,
            Err(err) => {
                tracing::error!(run_id = %run_id, error = %err, "Build failed");
                self.orchestrator.events().publish(RunEvent::RunFailed {
                    run_id,
                    error: err.to_string(),
                });
                BuildResult::Error {
                    message: format!("Error building app: {}", err),
                }
            }
        }
    }

    async fn run(
        &self,
        state: &mut RunState,
        description: &str,
        options: BuildOptions,
    ) -> anyhow::Result<BuildResult> {
        let started = Instant::now();
        let run_id = state.run_id.clone();
        let progress = self.orchestrator.progress();
        let events = self.orchestrator.events();

        progress.create(&run_id, BUILD_PHASES);
        events.publish(RunEvent::RunStarted {
            run_id: run_id.clone(),
            total_steps: BUILD_PHASES.len(),
        });
        tracing::info!(run_id = %run_id, "Starting app build");

        let requirements_step = WorkflowStep::new(
            TeamMember::ProductManager.id(),
            description,
            "requirements",
        );
        self.phase(state, 0, &requirements_step, None).await?;

        let requirements = state.context.get_text("requirements").unwrap_or_default();
        let payments = needs_payments(&requirements, description);

        let payment_role = if payments {
            self.marketplace.get_role_metadata(PAYMENT_ROLE_ID)
        } else {
            None
        };
        if let Some(role) = &payment_role {
            if options.use_marketplace && !self.marketplace.has_license(&role.id, &self.user_id) {
                tracing::info!(run_id = %run_id, role = %role.id, "Suggesting marketplace role");
                events.publish(RunEvent::MarketplaceSuggestion {
                    run_id: run_id.clone(),
                    role_id: role.id.clone(),
                    price: role.price,
                });
                return Ok(BuildResult::Suggestion {
                    run_id,
                    message: suggestion_message(role),
                    role_id: role.id.clone(),
                    role_name: role.name.clone(),
                    price: role.price,
                    capabilities: role.capabilities.clone(),
                });
            }
        }

        let frontend_step = WorkflowStep::new(
            TeamMember::FrontendDeveloper.id(),
            json!({"requirements": "{{requirements}}"}),
            "frontend_code",
        );
        self.phase(state, 1, &frontend_step, None).await?;

        let backend_step = WorkflowStep::new(
            TeamMember::BackendDeveloper.id(),
            json!({"requirements": "{{requirements}}"}),
            "backend_code",
        );
        self.phase(state, 2, &backend_step, None).await?;

        let licensed_role = payment_role.filter(|role| self.marketplace.has_license(&role.id, &self.user_id));
        let payment_code = match licensed_role {
            Some(metadata) => {
                let role = self.marketplace.create_executable_role(&metadata, &self.roles);
                let step = WorkflowStep::new(
                    metadata.id.clone(),
                    json!({"task": "Add Stripe payment integration", "project": description}),
                    "payment_code",
                );
                self.phase(state, 3, &step, Some(role)).await?;
                state.context.get_text("payment_code")
            }
            None => {
                progress.update(&run_id, 60, BUILD_PHASES[3], Some(StepStatus::Running), None);
                progress.update(&run_id, 80, BUILD_PHASES[3], Some(StepStatus::Completed), None);
                None
            }
        };

        progress.update(&run_id, 80, BUILD_PHASES[4], Some(StepStatus::Running), None);
        let app_name = format!("app-{}", run_id);
        let artifacts = AppArtifacts {
            name: app_name.clone(),
            requirements,
            frontend_code: state.context.get_text("frontend_code").unwrap_or_default(),
            backend_code: state.context.get_text("backend_code").unwrap_or_default(),
            payment_code,
        };
        let with_payments = artifacts.has_payments();

        let (root, count) = match generate_app(&self.output_dir, &artifacts).await {
            Ok(generated) => generated,
            Err(err) => {
                progress.update(&run_id, 80, BUILD_PHASES[4], Some(StepStatus::Error), None);
                return Err(err);
            }
        };
        events.publish(RunEvent::FilesGenerated {
            run_id: run_id.clone(),
            path: root.display().to_string(),
            count,
        });
        progress.update(&run_id, 100, BUILD_PHASES[4], Some(StepStatus::Completed), None);

        events.publish(RunEvent::RunCompleted {
            run_id: run_id.clone(),
            total_cost: state.total_cost,
        });
        tracing::info!(run_id = %run_id, total_cost = state.total_cost, "App build completed");

        Ok(BuildResult::Success {
            summary: summary(&app_name, with_payments, state.total_cost, started.elapsed().as_secs()),
            run_id,
            total_cost: state.total_cost,
            deployment_location: root.display().to_string(),
        })
    }

    /// Run one role phase with its progress bookkeeping.
    ///
    /// Phase `n` moves the percentage from `n * 20` to `(n + 1) * 20`.
    async fn phase(
        &self,
        state: &mut RunState,
        phase: usize,
        step: &WorkflowStep,
        role: Option<Arc<dyn Role>>,
    ) -> Result<(), DevTeamError> {
        let name = BUILD_PHASES[phase];
        let start = (phase * 20) as u8;
        let progress = self.orchestrator.progress();
        progress.update(&state.run_id, start, name, Some(StepStatus::Running), None);

        let index = phase + 1;
        let total = BUILD_PHASES.len();
        let outcome = match role {
            Some(role) => {
                self.orchestrator
                    .execute_resolved(state, index, total, step, role)
                    .await
            }
            None => self.orchestrator.execute_step(state, index, total, step).await,
        };

        match outcome {
            Ok(result) => {
                progress.update(
                    &state.run_id,
                    start + 20,
                    name,
                    Some(StepStatus::Completed),
                    Some(result.cost),
                );
                Ok(())
            }
            Err(err) => {
                progress.update(&state.run_id, start, name, Some(StepStatus::Error), None);
                Err(err)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_payment_detection() {
        assert!(needs_payments("Users pay via Payment plans", "todo"));
        assert!(needs_payments("", "todo app with Stripe"));
        assert!(needs_payments("", "accept payments"));
        assert!(!needs_payments("todo list", "a simple todo app"));
    }

    #[test]
    fn test_summary_lines() {
        let text = summary("app-x", true, 0.126, 3);
        assert!(text.starts_with("Created app-x with:\n"));
        assert!(text.contains("• Professional Stripe integration\n"));
        assert!(text.ends_with("Total AI cost: $0.13\nTime: 3 seconds"));

        assert!(!summary("app-x", false, 0.0, 0).contains("Stripe"));
    }

    #[test]
    fn test_suggestion_message_names_role_and_price() {
        let marketplace = MarketplaceRegistry::new();
        let role = marketplace.get_role_metadata(PAYMENT_ROLE_ID).unwrap();
        let message = suggestion_message(&role);
        assert!(message.contains("The Stripe Payment Expert role"));
        assert!(message.ends_with("costs $29 and will save hours of development time."));
    }
}
