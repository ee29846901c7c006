//! Structured run events
//!
//! Runs publish these on a broadcast channel and keep them in a per-run
//! buffer. `emit` writes one event as a prefixed JSON line to stderr for
//! consumers that parse process output.

use serde::{Deserialize, Serialize};

/// Line prefix used by [`RunEvent::emit`]
pub const EVENT_PREFIX: &str = "__DEVTEAM_EVENT__:";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RunEvent {
    RunStarted {
        run_id: String,
        total_steps: usize,
    },
    StepStarted {
        run_id: String,
        step: usize,
        total_steps: usize,
        role: String,
        output_key: String,
    },
    /// Incremental text from a streaming completion
    StreamChunk {
        run_id: String,
        step: usize,
        content: String,
    },
    StepCompleted {
        run_id: String,
        step: usize,
        role: String,
        cost: f64,
    },
    StepFailed {
        run_id: String,
        step: usize,
        role: String,
        error: String,
    },
    BudgetExceeded {
        run_id: String,
        spent: f64,
        limit: f64,
    },
    MarketplaceSuggestion {
        run_id: String,
        role_id: String,
        price: f64,
    },
    FilesGenerated {
        run_id: String,
        path: String,
        count: usize,
    },
    RunCompleted {
        run_id: String,
        total_cost: f64,
    },
    RunFailed {
        run_id: String,
        error: String,
    },
}

impl RunEvent {
    pub fn run_id(&self) -> &str {
        match self {
            RunEvent::RunStarted { run_id, .. }
            | RunEvent::StepStarted { run_id, .. }
            | RunEvent::StreamChunk { run_id, .. }
            | RunEvent::StepCompleted { run_id, .. }
            | RunEvent::StepFailed { run_id, .. }
            | RunEvent::BudgetExceeded { run_id, .. }
            | RunEvent::MarketplaceSuggestion { run_id, .. }
            | RunEvent::FilesGenerated { run_id, .. }
            | RunEvent::RunCompleted { run_id, .. }
            | RunEvent::RunFailed { run_id, .. } => run_id,
        }
    }

    /// True for the events that end a run
    pub fn is_terminal(&self) -> bool {
        matches!(
            self,
            RunEvent::RunCompleted { .. }
                | RunEvent::RunFailed { .. }
                | RunEvent::MarketplaceSuggestion { .. }
        )
    }

    /// Emit this event to stderr as `__DEVTEAM_EVENT__:<json>`
    pub fn emit(&self) {
        if let Ok(json) = serde_json::to_string(self) {
            use std::io::Write;
            eprintln!("{}{}", EVENT_PREFIX, json);
            let _ = std::io::stderr().flush();
        }
    }

    /// Parse a line produced by [`RunEvent::emit`]
    pub fn parse_line(line: &str) -> Option<RunEvent> {
        line.strip_prefix(EVENT_PREFIX)
            .and_then(|json| serde_json::from_str(json).ok())
    }
}
