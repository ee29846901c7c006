//! Workflow orchestrator: ordered step execution over a shared context

pub mod prompt;

use std::collections::HashSet;
use std::sync::Arc;

use futures::StreamExt;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use uuid::Uuid;

use devteam_sdk::{
    ChatMessage, CompletionBackend, CompletionOptions, DevTeamError, Result, Role, RoleResult,
    RunEvent, StepRecord, StepStatus, StreamAccumulator, WorkflowContext, WorkflowRun,
    WorkflowStep,
};

use crate::cost::CostTracker;
use crate::events::EventBus;
use crate::progress::ProgressTracker;
use crate::registry::RoleRegistry;
use crate::template::substitute;

pub use prompt::format_input;

/// How a step's role produces its result
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExecutionMode {
    /// Call `Role::execute` with the materialised input
    #[default]
    Direct,
    /// Drive the completion backend with the role's prompt and parser
    Completion,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OrchestratorConfig {
    /// Soft ceiling on the ledger total, checked before every step
    pub max_cost: Option<f64>,
    /// Stream completions chunk by chunk (completion mode only)
    pub streaming: bool,
    /// Let a later step overwrite an earlier step's output key
    pub allow_rebinding: bool,
    pub mode: ExecutionMode,
    /// Model override passed to the backend (completion mode only)
    pub model: Option<String>,
}

/// Mutable state of one run.
///
/// Keys are only ever added to `context`, once per successful step.
#[derive(Debug, Clone)]
pub struct RunState {
    pub run_id: String,
    pub context: WorkflowContext,
    pub total_cost: f64,
    pub records: Vec<StepRecord>,
}

impl RunState {
    pub fn new(run_id: impl Into<String>) -> Self {
        Self {
            run_id: run_id.into(),
            context: WorkflowContext::new(),
            total_cost: 0.0,
            records: Vec::new(),
        }
    }

    pub fn into_run(self) -> WorkflowRun {
        WorkflowRun {
            run_id: self.run_id,
            context: self.context,
            total_cost: self.total_cost,
            steps: self.records,
        }
    }
}

/// Percentage after `done` of `total` steps
fn linear_percentage(done: usize, total: usize) -> u8 {
    if total == 0 {
        return 100;
    }
    ((done as f64 * 100.0 / total as f64).round() as u64).min(100) as u8
}

/// Rejects workflows in which two steps write the same key
pub fn check_output_keys(steps: &[WorkflowStep]) -> Result<()> {
    let mut seen = HashSet::new();
    for step in steps {
        if !seen.insert(step.output_key.as_str()) {
            return Err(DevTeamError::DuplicateOutputKey(step.output_key.clone()));
        }
    }
    Ok(())
}

/// Executes workflows step by step.
///
/// Steps run strictly in order; each one sees the outputs of every earlier
/// step through `{{key}}` placeholders. The first failing step aborts the
/// run and is marked `error` in progress.
#[derive(Clone)]
pub struct Orchestrator {
    registry: Arc<RoleRegistry>,
    backend: Option<Arc<dyn CompletionBackend>>,
    ledger: CostTracker,
    progress: ProgressTracker,
    events: EventBus,
    config: OrchestratorConfig,
}

impl Orchestrator {
    pub fn new(registry: Arc<RoleRegistry>, ledger: CostTracker) -> Self {
        Self {
            registry,
            backend: None,
            ledger,
            progress: ProgressTracker::new(),
            events: EventBus::default(),
            config: OrchestratorConfig::default(),
        }
    }

    pub fn with_backend(mut self, backend: Arc<dyn CompletionBackend>) -> Self {
        self.backend = Some(backend);
        self
    }

    pub fn with_progress(mut self, progress: ProgressTracker) -> Self {
        self.progress = progress;
        self
    }

    pub fn with_events(mut self, events: EventBus) -> Self {
        self.events = events;
        self
    }

    pub fn with_config(mut self, config: OrchestratorConfig) -> Self {
        self.config = config;
        self
    }

    pub fn registry(&self) -> &RoleRegistry {
        &self.registry
    }

    pub fn ledger(&self) -> &CostTracker {
        &self.ledger
    }

    pub fn progress(&self) -> &ProgressTracker {
        &self.progress
    }

    pub fn events(&self) -> &EventBus {
        &self.events
    }

    pub fn config(&self) -> &OrchestratorConfig {
        &self.config
    }

    /// Run a workflow under a fresh run id
    pub async fn run_workflow(&self, steps: &[WorkflowStep]) -> Result<WorkflowRun> {
        let mut state = RunState::new(Uuid::new_v4().to_string());
        self.execute_steps(&mut state, steps).await?;
        Ok(state.into_run())
    }

    /// Run `steps` into `state`.
    ///
    /// On failure `state` holds the outputs of the steps that completed
    /// before the failing one.
    pub async fn execute_steps(&self, state: &mut RunState, steps: &[WorkflowStep]) -> Result<()> {
        if self.config.allow_rebinding {
            if let Err(DevTeamError::DuplicateOutputKey(key)) = check_output_keys(steps) {
                tracing::warn!(output_key = %key, "Output key is bound by more than one step");
            }
        } else {
            check_output_keys(steps)?;
        }

        let run_id = state.run_id.clone();
        let total = steps.len();
        self.progress
            .create(&run_id, steps.iter().map(|s| s.output_key.clone()));
        self.events.publish(RunEvent::RunStarted {
            run_id: run_id.clone(),
            total_steps: total,
        });
        tracing::info!(run_id = %run_id, steps = total, "Starting workflow run");

        for (offset, step) in steps.iter().enumerate() {
            let index = offset + 1;
            let before = linear_percentage(offset, total);
            self.progress.update(
                &run_id,
                before,
                &step.output_key,
                Some(StepStatus::Running),
                None,
            );

            match self.execute_step(state, index, total, step).await {
                Ok(result) => {
                    self.progress.update(
                        &run_id,
                        linear_percentage(index, total),
                        &step.output_key,
                        Some(StepStatus::Completed),
                        Some(result.cost),
                    );
                }
                Err(err) => {
                    self.progress.update(
                        &run_id,
                        before,
                        &step.output_key,
                        Some(StepStatus::Error),
                        None,
                    );
                    self.events.publish(RunEvent::RunFailed {
                        run_id: run_id.clone(),
                        error: err.to_string(),
                    });
                    return Err(err);
                }
            }
        }

        self.events.publish(RunEvent::RunCompleted {
            run_id: run_id.clone(),
            total_cost: state.total_cost,
        });
        tracing::info!(run_id = %run_id, total_cost = state.total_cost, "Workflow run completed");
        Ok(())
    }

    /// Resolve the step's role through the registry and run it
    pub async fn execute_step(
        &self,
        state: &mut RunState,
        index: usize,
        total: usize,
        step: &WorkflowStep,
    ) -> Result<RoleResult> {
        let role = match self.registry.get_role(&step.role) {
            Ok(role) => role,
            Err(err) => return Err(self.step_failed(state, index, step, err)),
        };
        self.execute_resolved(state, index, total, step, role).await
    }

    /// Run one step with an already resolved role.
    ///
    /// `index` is 1-based. The result is stored under the step's output key
    /// and recorded on `state`. Failures come back wrapped in
    /// [`DevTeamError::Step`].
    pub async fn execute_resolved(
        &self,
        state: &mut RunState,
        index: usize,
        total: usize,
        step: &WorkflowStep,
        role: Arc<dyn Role>,
    ) -> Result<RoleResult> {
        if let Err(err) = self.check_budget(&state.run_id) {
            return Err(self.step_failed(state, index, step, err));
        }

        self.events.publish(RunEvent::StepStarted {
            run_id: state.run_id.clone(),
            step: index,
            total_steps: total,
            role: step.role.clone(),
            output_key: step.output_key.clone(),
        });
        tracing::info!(step = index, total, role = %step.role, output_key = %step.output_key, "Executing step");

        let input = substitute(&step.input, &state.context);
        tracing::debug!(step = index, input = %input, "Materialised step input");

        let outcome = match self.config.mode {
            ExecutionMode::Direct => role.execute(&input, &state.context).await,
            ExecutionMode::Completion => self.complete_step(state, index, role.as_ref(), &input).await,
        };
        let result = match outcome {
            Ok(result) => result,
            Err(err) => return Err(self.step_failed(state, index, step, err)),
        };

        state.context.insert(step.output_key.clone(), result.output.clone());
        state.total_cost += result.cost;
        state.records.push(StepRecord {
            role: step.role.clone(),
            output_key: step.output_key.clone(),
            cost: result.cost,
            next_steps: result.next_steps.clone(),
            dependencies: result.dependencies.clone(),
        });

        self.events.publish(RunEvent::StepCompleted {
            run_id: state.run_id.clone(),
            step: index,
            role: step.role.clone(),
            cost: result.cost,
        });
        tracing::info!(step = index, role = %step.role, cost = result.cost, "Step completed");

        Ok(result)
    }

    fn check_budget(&self, run_id: &str) -> Result<()> {
        let Some(limit) = self.config.max_cost else {
            return Ok(());
        };
        let spent = self.ledger.total_cost();
        if spent > limit {
            tracing::warn!(run_id, spent, limit, "Cost limit exceeded, aborting run");
            self.events.publish(RunEvent::BudgetExceeded {
                run_id: run_id.to_string(),
                spent,
                limit,
            });
            return Err(DevTeamError::BudgetExceeded { spent, limit });
        }
        Ok(())
    }

    fn step_failed(
        &self,
        state: &RunState,
        index: usize,
        step: &WorkflowStep,
        err: DevTeamError,
    ) -> DevTeamError {
        tracing::error!(step = index, role = %step.role, error = %err, "Step failed");
        self.events.publish(RunEvent::StepFailed {
            run_id: state.run_id.clone(),
            step: index,
            role: step.role.clone(),
            error: err.to_string(),
        });
        DevTeamError::at_step(index, step.role.clone(), step.output_key.clone(), err)
    }

    async fn complete_step(
        &self,
        state: &RunState,
        index: usize,
        role: &dyn Role,
        input: &Value,
    ) -> Result<RoleResult> {
        let backend = self
            .backend
            .as_ref()
            .ok_or_else(|| DevTeamError::completion("No completion backend configured"))?;

        let messages = [
            ChatMessage::system(role.system_prompt()),
            ChatMessage::user(format_input(input, &state.context)),
        ];
        let options = CompletionOptions {
            temperature: role.temperature(),
            max_tokens: role.max_tokens(),
            model: self.config.model.clone(),
            purpose: role.id().to_string(),
        };

        let (text, cost) = if self.config.streaming {
            let mut stream = backend.stream(&messages, &options).await?;
            let mut acc = StreamAccumulator::new();
            while let Some(chunk) = stream.next().await {
                let chunk = chunk?;
                if !chunk.content.is_empty() {
                    self.events.publish(RunEvent::StreamChunk {
                        run_id: state.run_id.clone(),
                        step: index,
                        content: chunk.content.clone(),
                    });
                }
                if acc.push(&chunk) {
                    break;
                }
            }
            if !acc.is_complete() {
                return Err(DevTeamError::completion(
                    "Stream ended without an end-of-stream signal",
                ));
            }
            tracing::debug!(step = index, chunks = acc.chunk_count(), "Stream finished");

            let cost = match acc.cost() {
                Some(cost) => cost,
                None => {
                    let prompt_tokens: u64 =
                        messages.iter().map(|m| backend.count_tokens(&m.content)).sum();
                    let completion_tokens = backend.count_tokens(acc.text());
                    tracing::debug!(step = index, "Backend reported no stream cost, estimating");
                    backend.estimate_cost(
                        prompt_tokens,
                        completion_tokens,
                        options.model.as_deref().unwrap_or_default(),
                    )
                }
            };
            (acc.into_text(), cost)
        } else {
            let completion = backend.complete(&messages, &options).await?;
            (completion.text, completion.cost)
        };

        let output = role.output_parser().parse(&text);
        Ok(RoleResult::new(output).with_cost(cost))
    }
}
