//! Per-run progress records

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use chrono::Utc;
use devteam_sdk::{ProjectProgress, StepProgress, StepStatus};

use crate::utils::lock;

/// Progress records keyed by run id.
///
/// Clones share the same table. Each run is expected to have a single
/// writer; distinct runs never touch each other's records. Records stay in
/// memory until [`ProgressTracker::prune_finished`] is called.
#[derive(Debug, Clone, Default)]
pub struct ProgressTracker {
    runs: Arc<Mutex<HashMap<String, ProjectProgress>>>,
}

impl ProgressTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start a record with every step pending. Replaces an existing record for `run_id`.
    pub fn create<I, S>(&self, run_id: &str, step_names: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let progress = ProjectProgress {
            run_id: run_id.to_string(),
            percentage: 0,
            current_step: "Starting".to_string(),
            started_at: Utc::now(),
            elapsed_seconds: 0,
            steps: step_names
                .into_iter()
                .map(|name| StepProgress {
                    name: name.into(),
                    status: StepStatus::Pending,
                    cost: None,
                })
                .collect(),
        };
        lock(&self.runs).insert(run_id.to_string(), progress);
    }

    /// Advance the record of `run_id`.
    ///
    /// The percentage never decreases and is capped at 100. When `status` is
    /// given, the first step named `current_step` that is not yet completed
    /// takes it (a cost of zero is not recorded). Completing a step flips the
    /// following step to pending. Returns false when the run is unknown.
    pub fn update(
        &self,
        run_id: &str,
        percentage: u8,
        current_step: &str,
        status: Option<StepStatus>,
        cost: Option<f64>,
    ) -> bool {
        let mut runs = lock(&self.runs);
        let Some(progress) = runs.get_mut(run_id) else {
            tracing::debug!(run_id, "Progress update for unknown run");
            return false;
        };

        progress.percentage = progress.percentage.max(percentage.min(100));
        progress.current_step = current_step.to_string();

        let Some(status) = status else {
            return true;
        };

        let index = progress
            .steps
            .iter()
            .position(|s| s.name == current_step && s.status != StepStatus::Completed)
            .or_else(|| progress.steps.iter().rposition(|s| s.name == current_step));

        if let Some(index) = index {
            let step = &mut progress.steps[index];
            step.status = status;
            if let Some(cost) = cost.filter(|c| *c > 0.0) {
                step.cost = Some(cost);
            }

            if status == StepStatus::Completed {
                if let Some(next) = progress.steps.get_mut(index + 1) {
                    if next.status != StepStatus::Completed {
                        next.status = StepStatus::Pending;
                    }
                }
            }
        }

        true
    }

    /// Current snapshot with elapsed time computed now
    pub fn get(&self, run_id: &str) -> Option<ProjectProgress> {
        lock(&self.runs).get(run_id).map(|progress| {
            let mut snapshot = progress.clone();
            snapshot.elapsed_seconds = (Utc::now() - progress.started_at).num_seconds().max(0) as u64;
            snapshot
        })
    }

    pub fn run_ids(&self) -> Vec<String> {
        let mut ids: Vec<String> = lock(&self.runs).keys().cloned().collect();
        ids.sort();
        ids
    }

    /// Drop records of finished runs, returning how many were removed
    pub fn prune_finished(&self) -> usize {
        let mut runs = lock(&self.runs);
        let before = runs.len();
        runs.retain(|_, progress| !progress.is_finished());
        before - runs.len()
    }
}
