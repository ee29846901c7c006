//! Cost ledger and cost estimation helpers

use std::collections::BTreeMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use devteam_sdk::{CostEntry, CostReport};

use crate::utils::lock;

/// Append-only record of completion spend.
///
/// Cloning yields another handle to the same ledger. Every run and backend
/// holding a clone accumulates into one total; create separate trackers to
/// keep runs isolated. Entries are never removed.
#[derive(Debug, Clone, Default)]
pub struct CostTracker {
    entries: Arc<Mutex<Vec<CostEntry>>>,
}

impl CostTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one completion call
    pub fn track(
        &self,
        provider: &str,
        model: &str,
        prompt_tokens: u64,
        completion_tokens: u64,
        cost: f64,
        purpose: &str,
    ) {
        tracing::debug!(provider, model, prompt_tokens, completion_tokens, cost, purpose, "Tracked completion cost");
        lock(&self.entries).push(CostEntry {
            provider: provider.to_string(),
            model: model.to_string(),
            prompt_tokens,
            completion_tokens,
            cost: cost.max(0.0),
            purpose: purpose.to_string(),
            recorded_at: Utc::now(),
        });
    }

    pub fn total_cost(&self) -> f64 {
        lock(&self.entries).iter().map(|e| e.cost).sum()
    }

    pub fn cost_by_purpose(&self, purpose: &str) -> f64 {
        lock(&self.entries)
            .iter()
            .filter(|e| e.purpose == purpose)
            .map(|e| e.cost)
            .sum()
    }

    pub fn entries(&self) -> Vec<CostEntry> {
        lock(&self.entries).clone()
    }

    pub fn len(&self) -> usize {
        lock(&self.entries).len()
    }

    pub fn is_empty(&self) -> bool {
        lock(&self.entries).is_empty()
    }

    /// Breakdown by provider/model and by purpose
    pub fn summary(&self) -> CostReport {
        let entries = lock(&self.entries);
        let mut by_model = BTreeMap::new();
        let mut by_purpose = BTreeMap::new();

        for entry in entries.iter() {
            *by_model
                .entry(format!("{}/{}", entry.provider, entry.model))
                .or_insert(0.0) += entry.cost;
            *by_purpose.entry(entry.purpose.clone()).or_insert(0.0) += entry.cost;
        }

        CostReport {
            total_cost: entries.iter().map(|e| e.cost).sum(),
            calls: entries.len(),
            by_model,
            by_purpose,
        }
    }

    /// Human-readable report
    pub fn report(&self) -> String {
        self.summary().to_string()
    }
}

// Sonnet pricing per million tokens, used for up-front estimates
const ESTIMATE_INPUT_PER_MILLION: f64 = 3.0;
const ESTIMATE_OUTPUT_PER_MILLION: f64 = 15.0;

/// Default tokens assumed per step by [`estimate_workflow_cost`]
pub const DEFAULT_TOKENS_PER_STEP: u64 = 2000;

/// Rough up-front cost of a workflow; output is assumed to be half the input
pub fn estimate_workflow_cost(steps: usize, tokens_per_step: u64) -> f64 {
    let input_tokens = steps as f64 * tokens_per_step as f64;
    let output_tokens = steps as f64 * (tokens_per_step as f64 / 2.0);

    input_tokens / 1_000_000.0 * ESTIMATE_INPUT_PER_MILLION
        + output_tokens / 1_000_000.0 * ESTIMATE_OUTPUT_PER_MILLION
}

/// Format a cost for display, in cents below one cent
pub fn format_cost_estimate(cost: f64) -> String {
    if cost < 0.01 {
        format!("{:.2}¢", cost * 100.0)
    } else {
        format!("${:.2}", cost)
    }
}
