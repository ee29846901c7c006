//! Progress records of workflow runs

use devteam::cost::CostTracker;
use devteam::orchestrator::{OrchestratorConfig, RunState};
use devteam_sdk::StepStatus;

use super::common::*;

#[tokio::test]
async fn test_successful_run_reaches_one_hundred() {
    let ledger = CostTracker::new();
    let orchestrator = orchestrator_with(billed_registry(&ledger, 0.05), ledger, OrchestratorConfig::default());

    let run = orchestrator
        .run_workflow(&[
            step("product-manager", "a todo app", "requirements"),
            step("backend-developer", "{{requirements}}", "backend_code"),
        ])
        .await
        .unwrap();

    let progress = orchestrator.progress().get(&run.run_id).unwrap();
    assert_eq!(progress.percentage, 100);
    assert!(progress.is_finished());
    assert!(progress.steps.iter().all(|s| s.status == StepStatus::Completed));
    assert_eq!(progress.steps[0].name, "requirements");
    assert_eq!(progress.steps[0].cost, Some(0.05));
    // Zero-cost steps carry no cost
    assert_eq!(progress.steps[1].cost, None);
}

#[tokio::test]
async fn test_failed_run_keeps_percentage_of_completed_steps() {
    let orchestrator = scripted_orchestrator();
    let mut state = RunState::new("run-partial");

    let result = orchestrator
        .execute_steps(
            &mut state,
            &[
                step("product-manager", "a todo app", "requirements"),
                step("frontend-developer", "{{requirements}}", "frontend_code"),
                step("qa-engineer", "{{frontend_code}}", "test_plan"),
                step("backend-developer", "{{requirements}}", "backend_code"),
            ],
        )
        .await;
    assert!(result.is_err());

    let progress = orchestrator.progress().get("run-partial").unwrap();
    assert_eq!(progress.percentage, 50);
    assert_eq!(progress.current_step, "test_plan");
    assert_eq!(progress.steps[2].status, StepStatus::Error);
    assert!(progress.is_finished());
}

#[test]
fn test_prune_drops_only_finished_runs() {
    let orchestrator = scripted_orchestrator();
    let progress = orchestrator.progress();
    progress.create("done", ["a"]);
    progress.update("done", 100, "a", Some(StepStatus::Completed), None);
    progress.create("running", ["a", "b"]);
    progress.update("running", 0, "a", Some(StepStatus::Running), None);

    assert_eq!(progress.prune_finished(), 1);
    assert!(progress.get("done").is_none());
    assert!(progress.get("running").is_some());
}
