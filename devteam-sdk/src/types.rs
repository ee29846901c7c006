//! Data model shared by the orchestrator, marketplace and runtime consumers.

use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::context::WorkflowContext;

// ============================================================================
// Workflow Types
// ============================================================================

/// One pipeline stage: which role runs, on what input, and where its result goes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WorkflowStep {
    /// Role identifier, resolved through the role registry
    pub role: String,

    /// Arbitrary input; string leaves may contain `{{key}}` placeholders
    #[serde(default)]
    pub input: Value,

    /// Context key under which the step result is stored
    #[serde(alias = "outputKey")]
    pub output_key: String,
}

impl WorkflowStep {
    pub fn new(
        role: impl Into<String>,
        input: impl Into<Value>,
        output_key: impl Into<String>,
    ) -> Self {
        Self {
            role: role.into(),
            input: input.into(),
            output_key: output_key.into(),
        }
    }
}

/// Output of a single role execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoleResult {
    /// Text or structured payload
    pub output: Value,

    /// Suggested follow-on step identifiers (advisory)
    #[serde(default)]
    pub next_steps: Vec<String>,

    /// Inputs downstream steps are expected to need (advisory)
    #[serde(default)]
    pub dependencies: Vec<String>,

    /// Monetary cost attributed to this invocation
    #[serde(default)]
    pub cost: f64,
}

impl RoleResult {
    pub fn new(output: impl Into<Value>) -> Self {
        Self {
            output: output.into(),
            next_steps: Vec::new(),
            dependencies: Vec::new(),
            cost: 0.0,
        }
    }

    /// Negative figures are clamped to zero
    pub fn with_cost(mut self, cost: f64) -> Self {
        self.cost = cost.max(0.0);
        self
    }

    pub fn with_next_steps<I, S>(mut self, steps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.next_steps = steps.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_dependencies<I, S>(mut self, deps: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.dependencies = deps.into_iter().map(Into::into).collect();
        self
    }

    /// Output as display text (strings verbatim, structured output as JSON)
    pub fn output_text(&self) -> String {
        match &self.output {
            Value::String(text) => text.clone(),
            other => other.to_string(),
        }
    }
}

/// Per-step record of a finished run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StepRecord {
    pub role: String,
    pub output_key: String,
    pub cost: f64,
    #[serde(default)]
    pub next_steps: Vec<String>,
    #[serde(default)]
    pub dependencies: Vec<String>,
}

/// Result of a successful workflow run
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkflowRun {
    pub run_id: String,
    pub context: WorkflowContext,
    /// Sum of the step costs of this run only
    pub total_cost: f64,
    pub steps: Vec<StepRecord>,
}

// ============================================================================
// Cost Types
// ============================================================================

/// One tracked completion call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostEntry {
    pub provider: String,
    pub model: String,
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub cost: f64,
    /// Free-text tag, usually the role identifier
    pub purpose: String,
    pub recorded_at: DateTime<Utc>,
}

/// Aggregated view of a cost ledger
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CostReport {
    pub total_cost: f64,
    pub calls: usize,
    /// Keyed by `provider/model`
    pub by_model: BTreeMap<String, f64>,
    pub by_purpose: BTreeMap<String, f64>,
}

impl std::fmt::Display for CostReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "Cost Report")?;
        writeln!(f, "===========")?;
        writeln!(f, "Total: ${:.4} ({} calls)", self.total_cost, self.calls)?;
        if !self.by_model.is_empty() {
            writeln!(f)?;
            writeln!(f, "By provider/model:")?;
            for (model, cost) in &self.by_model {
                writeln!(f, "  {}: ${:.4}", model, cost)?;
            }
        }
        if !self.by_purpose.is_empty() {
            writeln!(f)?;
            writeln!(f, "By purpose:")?;
            for (purpose, cost) in &self.by_purpose {
                writeln!(f, "  {}: ${:.4}", purpose, cost)?;
            }
        }
        Ok(())
    }
}

// ============================================================================
// Progress Types
// ============================================================================

/// Status of one step in a progress record
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StepStatus {
    Pending,
    Running,
    Completed,
    Error,
}

impl std::fmt::Display for StepStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StepStatus::Pending => write!(f, "pending"),
            StepStatus::Running => write!(f, "running"),
            StepStatus::Completed => write!(f, "completed"),
            StepStatus::Error => write!(f, "error"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StepProgress {
    pub name: String,
    pub status: StepStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cost: Option<f64>,
}

/// Progress snapshot of one build or workflow run
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProjectProgress {
    pub run_id: String,
    /// 0-100
    pub percentage: u8,
    pub current_step: String,
    pub started_at: DateTime<Utc>,
    /// Seconds since `started_at`, computed when the snapshot is taken
    pub elapsed_seconds: u64,
    pub steps: Vec<StepProgress>,
}

impl ProjectProgress {
    /// True once every step is completed or any step failed
    pub fn is_finished(&self) -> bool {
        self.steps.iter().any(|s| s.status == StepStatus::Error)
            || self.steps.iter().all(|s| s.status == StepStatus::Completed)
    }
}

// ============================================================================
// Marketplace Types
// ============================================================================

/// Catalog entry for a premium role
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketplaceRoleMetadata {
    pub id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub capabilities: Vec<String>,
    pub author: String,
    pub version: String,
    pub rating: f32,
    pub downloads: u64,
}

/// Outcome of a purchase attempt
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PurchaseOutcome {
    pub success: bool,
    pub message: String,
}

impl PurchaseOutcome {
    pub fn ok(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }

    pub fn failed(message: impl Into<String>) -> Self {
        Self {
            success: false,
            message: message.into(),
        }
    }
}

// ============================================================================
// Build Types
// ============================================================================

/// Options for the app build flow
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BuildOptions {
    /// Offer premium marketplace roles when the content calls for them
    #[serde(default = "default_true")]
    pub use_marketplace: bool,
}

fn default_true() -> bool {
    true
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            use_marketplace: true,
        }
    }
}

/// Result of the app build flow
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum BuildResult {
    Success {
        run_id: String,
        summary: String,
        total_cost: f64,
        deployment_location: String,
    },
    /// The build stopped early to offer a premium role
    Suggestion {
        run_id: String,
        message: String,
        role_id: String,
        role_name: String,
        price: f64,
        capabilities: Vec<String>,
    },
    Error {
        message: String,
    },
}

impl BuildResult {
    pub fn run_id(&self) -> Option<&str> {
        match self {
            BuildResult::Success { run_id, .. } | BuildResult::Suggestion { run_id, .. } => {
                Some(run_id)
            }
            BuildResult::Error { .. } => None,
        }
    }
}
