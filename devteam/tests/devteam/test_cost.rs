//! Cost ledger sharing across runs and tasks

use std::sync::Arc;

use devteam::cost::{estimate_workflow_cost, format_cost_estimate, CostTracker};
use devteam::orchestrator::OrchestratorConfig;

use super::common::*;

#[tokio::test]
async fn test_concurrent_tracking_totals_commute() {
    let ledger = CostTracker::new();
    let mut handles = Vec::new();
    for i in 0..20u32 {
        let ledger = ledger.clone();
        handles.push(tokio::spawn(async move {
            let cost = f64::from(i % 4 + 1) * 0.25;
            ledger.track("mock", "mock-model", 10, 5, cost, &format!("track-{}", i % 2));
        }));
    }
    for handle in handles {
        handle.await.unwrap();
    }

    // 5 x (0.25 + 0.5 + 0.75 + 1.0)
    assert_eq!(ledger.len(), 20);
    assert!((ledger.total_cost() - 12.5).abs() < 1e-9);
    assert!(
        (ledger.cost_by_purpose("track-0") + ledger.cost_by_purpose("track-1") - ledger.total_cost()).abs()
            < 1e-9
    );
}

#[tokio::test]
async fn test_concurrent_runs_share_one_ledger() {
    let ledger = CostTracker::new();
    let orchestrator = Arc::new(orchestrator_with(
        billed_registry(&ledger, 0.03),
        ledger.clone(),
        OrchestratorConfig::default(),
    ));

    let runs: Vec<_> = (0..4)
        .map(|i| {
            let orchestrator = orchestrator.clone();
            tokio::spawn(async move {
                orchestrator
                    .run_workflow(&[step("product-manager", format!("app {}", i), "requirements")])
                    .await
            })
        })
        .collect();

    for run in runs {
        let run = run.await.unwrap().unwrap();
        // Each run reports only its own spend
        assert!((run.total_cost - 0.03).abs() < 1e-9);
    }
    assert!((ledger.total_cost() - 0.12).abs() < 1e-9);

    let report = ledger.summary();
    assert_eq!(report.calls, 4);
    assert!((report.by_purpose["product-manager"] - 0.12).abs() < 1e-9);
}

#[test]
fn test_estimate_helpers() {
    // 3 steps x 2000 in at $3/M plus 3 x 1000 out at $15/M
    let cost = estimate_workflow_cost(3, 2000);
    assert!((cost - 0.063).abs() < 1e-9);
    assert_eq!(format_cost_estimate(cost), "$0.06");
    assert_eq!(format_cost_estimate(0.005), "0.50¢");
}
