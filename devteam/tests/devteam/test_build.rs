//! App build flow: marketplace suggestion, plain build and licensed payments

use devteam::build::{BuildPipeline, BUILD_PHASES, DEFAULT_USER_ID, PAYMENT_ROLE_ID};
use devteam::marketplace::MarketplaceRegistry;
use devteam_sdk::{BuildOptions, BuildResult, RunEvent, StepStatus};

use super::common::*;

fn success_location(result: &BuildResult) -> std::path::PathBuf {
    match result {
        BuildResult::Success {
            deployment_location, ..
        } => std::path::PathBuf::from(deployment_location),
        other => panic!("expected success, got {:?}", other),
    }
}

fn progress_of(pipeline: &BuildPipeline, result: &BuildResult) -> devteam_sdk::ProjectProgress {
    let run_id = result.run_id().unwrap();
    pipeline.orchestrator().progress().get(run_id).unwrap()
}

#[tokio::test]
async fn test_payment_app_gets_marketplace_suggestion() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = scripted_pipeline(dir.path(), MarketplaceRegistry::new());

    let result = pipeline
        .build("A todo app with payment processing", BuildOptions::default())
        .await;

    match &result {
        BuildResult::Suggestion {
            role_id,
            price,
            message,
            ..
        } => {
            assert_eq!(role_id, PAYMENT_ROLE_ID);
            assert_eq!(*price, 29.0);
            assert!(message.starts_with("I noticed your app needs payment processing."));
        }
        other => panic!("expected suggestion, got {:?}", other),
    }

    let progress = progress_of(&pipeline, &result);
    assert_eq!(progress.percentage, 20);
    assert_eq!(progress.steps[0].status, StepStatus::Completed);
    assert_eq!(progress.steps[1].status, StepStatus::Pending);

    // Nothing is written before the user decides
    assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);

    let events = pipeline
        .orchestrator()
        .events()
        .events(result.run_id().unwrap(), None)
        .unwrap();
    assert!(matches!(events.last(), Some(RunEvent::MarketplaceSuggestion { .. })));
}

#[tokio::test]
async fn test_plain_app_is_generated() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = scripted_pipeline(dir.path(), MarketplaceRegistry::new());

    let result = pipeline.build("A simple todo app", BuildOptions::default()).await;
    let root = success_location(&result);

    assert!(root.starts_with(dir.path()));
    assert!(root.join("package.json").exists());
    assert!(root.join("src/app/api/todos/route.ts").exists());
    assert!(!root.join("docs/payments.md").exists());
    let requirements = std::fs::read_to_string(root.join("docs/requirements.md")).unwrap();
    assert!(requirements.contains("Todo Application Requirements"));

    let progress = progress_of(&pipeline, &result);
    assert_eq!(progress.percentage, 100);
    assert_eq!(progress.steps.len(), BUILD_PHASES.len());
    assert!(progress.steps.iter().all(|s| s.status == StepStatus::Completed));

    if let BuildResult::Success { summary, run_id, .. } = &result {
        assert!(run_id.starts_with("project-"));
        assert!(summary.starts_with(&format!("Created app-{} with:", run_id)));
        assert!(!summary.contains("Stripe"));
    }
}

#[tokio::test]
async fn test_opting_out_of_marketplace_skips_payments() {
    let dir = tempfile::tempdir().unwrap();
    let pipeline = scripted_pipeline(dir.path(), MarketplaceRegistry::new());

    let result = pipeline
        .build(
            "A todo app with stripe payments",
            BuildOptions {
                use_marketplace: false,
            },
        )
        .await;

    let root = success_location(&result);
    assert!(!root.join("docs/payments.md").exists());
}

#[tokio::test]
async fn test_licensed_payment_role_runs() {
    let dir = tempfile::tempdir().unwrap();
    let marketplace = MarketplaceRegistry::new();
    assert!(marketplace.purchase(PAYMENT_ROLE_ID, DEFAULT_USER_ID).success);
    let pipeline = scripted_pipeline(dir.path(), marketplace);

    let result = pipeline
        .build("A todo app with stripe payments", BuildOptions::default())
        .await;
    let root = success_location(&result);

    let payments = std::fs::read_to_string(root.join("docs/payments.md")).unwrap();
    assert!(payments.contains("stripe.checkout.sessions.create"));
    assert!(root.join("src/app/api/create-checkout-session/route.ts").exists());

    if let BuildResult::Success { summary, .. } = &result {
        assert!(summary.contains("• Professional Stripe integration"));
    }

    let events = pipeline
        .orchestrator()
        .events()
        .events(result.run_id().unwrap(), None)
        .unwrap();
    assert!(events
        .iter()
        .any(|e| matches!(e, RunEvent::StepCompleted { role, .. } if role == PAYMENT_ROLE_ID)));
    assert!(events
        .iter()
        .any(|e| matches!(e, RunEvent::FilesGenerated { .. })));
}

#[tokio::test]
async fn test_license_is_per_user() {
    let dir = tempfile::tempdir().unwrap();
    let marketplace = MarketplaceRegistry::new();
    marketplace.purchase(PAYMENT_ROLE_ID, "someone-else");
    let pipeline = scripted_pipeline(dir.path(), marketplace);

    let result = pipeline
        .build("A todo app with payment plans", BuildOptions::default())
        .await;
    assert!(matches!(result, BuildResult::Suggestion { .. }));
}
