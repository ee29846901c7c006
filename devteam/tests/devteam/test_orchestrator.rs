//! Orchestrator ordering, failure propagation and budget enforcement

use std::sync::Arc;

use serde_json::json;

use devteam::backend::MockBackend;
use devteam::cost::CostTracker;
use devteam::orchestrator::{ExecutionMode, OrchestratorConfig, RunState};
use devteam::registry::RoleRegistry;
use devteam_sdk::{DevTeamError, RunEvent, StepStatus};

use super::common::*;

#[tokio::test]
async fn test_context_keys_follow_step_order() {
    let orchestrator = scripted_orchestrator();
    let run = orchestrator
        .run_workflow(&[
            step("product-manager", "a todo app", "requirements"),
            step("frontend-developer", json!({"requirements": "{{requirements}}"}), "frontend_code"),
            step("backend-developer", json!({"requirements": "{{requirements}}"}), "backend_code"),
        ])
        .await
        .unwrap();

    let keys: Vec<&str> = run.context.keys().collect();
    assert_eq!(keys, ["requirements", "frontend_code", "backend_code"]);
    assert_eq!(run.steps.len(), 3);
    assert_eq!(run.steps[0].next_steps, ["frontend_design", "backend_architecture"]);
    assert_eq!(run.total_cost, 0.0);
}

#[tokio::test]
async fn test_end_to_end_scripted_team() {
    let orchestrator = scripted_orchestrator();
    let run = orchestrator
        .run_workflow(&[
            step("product-manager", "Create a todo app", "requirements"),
            step("frontend-developer", json!({"requirements": "{{requirements}}"}), "frontend_code"),
        ])
        .await
        .unwrap();

    assert!(run.context.get_text("requirements").unwrap().contains("todo"));
    assert!(run.context.get_text("frontend_code").unwrap().contains("React"));
}

#[tokio::test]
async fn test_unregistered_role_stops_run() {
    let orchestrator = scripted_orchestrator();
    let mut state = RunState::new("run-missing-role");

    let err = orchestrator
        .execute_steps(
            &mut state,
            &[
                step("product-manager", "a todo app", "requirements"),
                step("designer", "{{requirements}}", "design"),
                step("backend-developer", "{{requirements}}", "backend_code"),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), DevTeamError::RoleNotFound(id) if id == "designer"));
    assert_eq!(err.failed_step(), Some(2));

    let keys: Vec<&str> = state.context.keys().collect();
    assert_eq!(keys, ["requirements"]);

    let progress = orchestrator.progress().get("run-missing-role").unwrap();
    assert_eq!(progress.steps[0].status, StepStatus::Completed);
    assert_eq!(progress.steps[1].status, StepStatus::Error);
    assert_ne!(progress.steps[2].status, StepStatus::Completed);

    let events = orchestrator.events().events("run-missing-role", None).unwrap();
    assert!(matches!(events.last(), Some(RunEvent::RunFailed { .. })));
}

#[tokio::test]
async fn test_budget_blocks_the_next_step() {
    let ledger = CostTracker::new();
    let config = OrchestratorConfig {
        max_cost: Some(0.01),
        ..Default::default()
    };
    let orchestrator = orchestrator_with(billed_registry(&ledger, 0.02), ledger.clone(), config);
    let mut state = RunState::new("run-budget");

    let err = orchestrator
        .execute_steps(
            &mut state,
            &[
                step("product-manager", "a todo app", "requirements"),
                step("frontend-developer", "{{requirements}}", "frontend_code"),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err.root_cause(),
        DevTeamError::BudgetExceeded { limit, .. } if *limit == 0.01
    ));
    assert_eq!(err.failed_step(), Some(2));
    assert!(!state.context.contains_key("frontend_code"));
    assert!((ledger.total_cost() - 0.02).abs() < 1e-9);

    let events = orchestrator.events().events("run-budget", None).unwrap();
    assert!(events.iter().any(|e| matches!(e, RunEvent::BudgetExceeded { .. })));
    assert!(!events
        .iter()
        .any(|e| matches!(e, RunEvent::StepStarted { step: 2, .. })));
}

#[tokio::test]
async fn test_budget_counts_backend_spend() {
    let ledger = CostTracker::new();
    let backend = Arc::new(MockBackend::new(ledger.clone()).with_cost_per_call(0.02));
    let config = OrchestratorConfig {
        max_cost: Some(0.01),
        mode: ExecutionMode::Completion,
        ..Default::default()
    };
    let orchestrator =
        orchestrator_with(RoleRegistry::with_scripted_roles(), ledger.clone(), config).with_backend(backend);

    let err = orchestrator
        .run_workflow(&[
            step("product-manager", "a todo app", "requirements"),
            step("frontend-developer", "{{requirements}}", "frontend_code"),
        ])
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), DevTeamError::BudgetExceeded { .. }));
    assert_eq!(ledger.len(), 1);
}

#[tokio::test]
async fn test_duplicate_output_keys_rejected_before_running() {
    let ledger = CostTracker::new();
    let orchestrator = orchestrator_with(billed_registry(&ledger, 0.5), ledger.clone(), OrchestratorConfig::default());
    let mut state = RunState::new("run-duplicate");

    let err = orchestrator
        .execute_steps(
            &mut state,
            &[
                step("product-manager", "a", "out"),
                step("backend-developer", "b", "out"),
            ],
        )
        .await
        .unwrap_err();

    assert!(matches!(err, DevTeamError::DuplicateOutputKey(key) if key == "out"));
    assert!(ledger.is_empty());
    assert!(state.context.is_empty());
    assert!(orchestrator.progress().get("run-duplicate").is_none());
}

#[tokio::test]
async fn test_rebinding_keeps_the_later_output() {
    let orchestrator = scripted_orchestrator().with_config(OrchestratorConfig {
        allow_rebinding: true,
        ..Default::default()
    });

    let run = orchestrator
        .run_workflow(&[
            step("product-manager", "a todo app", "code"),
            step("backend-developer", "{{code}}", "code"),
        ])
        .await
        .unwrap();

    assert_eq!(run.context.len(), 1);
    assert!(run.context.get_text("code").unwrap().starts_with("// api/todos.ts"));
}

#[tokio::test]
async fn test_backend_failure_is_reported_per_step() {
    let ledger = CostTracker::new();
    let backend = Arc::new(MockBackend::new(ledger.clone()).with_failure("rate limited"));
    let config = OrchestratorConfig {
        mode: ExecutionMode::Completion,
        ..Default::default()
    };
    let orchestrator =
        orchestrator_with(RoleRegistry::with_scripted_roles(), ledger, config).with_backend(backend);

    let err = orchestrator
        .run_workflow(&[step("product-manager", "a todo app", "requirements")])
        .await
        .unwrap_err();

    assert!(matches!(err.root_cause(), DevTeamError::Completion(msg) if msg.contains("rate limited")));
    assert_eq!(err.failed_step(), Some(1));
}
