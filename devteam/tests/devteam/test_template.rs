//! Placeholder substitution as seen by running steps

use serde_json::json;

use devteam::template::{placeholders, substitute};
use devteam_sdk::WorkflowContext;

use super::common::*;

#[test]
fn test_substitution_is_idempotent_on_resolved_input() {
    let mut ctx = WorkflowContext::new();
    ctx.insert("requirements", json!("a todo app"));
    let input = json!({"requirements": "{{requirements}}", "note": "see {{missing}}"});

    let once = substitute(&input, &ctx);
    let twice = substitute(&once, &ctx);

    assert_eq!(once, twice);
    assert_eq!(once["requirements"], "a todo app");
    assert_eq!(once["note"], "see {{missing}}");
}

#[test]
fn test_placeholders_in_step_inputs() {
    let steps = [
        step("product-manager", "a todo app", "requirements"),
        step(
            "frontend-developer",
            json!({"requirements": "{{requirements}}"}),
            "frontend_code",
        ),
    ];
    assert!(placeholders(&steps[0].input).is_empty());
    assert_eq!(placeholders(&steps[1].input), vec!["requirements"]);
}

#[tokio::test]
async fn test_forward_reference_stays_literal() {
    let orchestrator = scripted_orchestrator();
    let run = orchestrator
        .run_workflow(&[
            step("product-manager", "build {{frontend_code}}", "requirements"),
            step("frontend-developer", "{{requirements}}", "frontend_code"),
        ])
        .await
        .unwrap();

    let requirements = run.context.get_text("requirements").unwrap();
    assert!(requirements.ends_with("Input: build {{frontend_code}}"));
}

#[tokio::test]
async fn test_later_steps_see_earlier_outputs() {
    let orchestrator = scripted_orchestrator();
    let run = orchestrator
        .run_workflow(&[
            step("product-manager", "a todo app", "requirements"),
            step(
                "frontend-developer",
                json!({"requirements": "{{requirements}}"}),
                "frontend_code",
            ),
        ])
        .await
        .unwrap();

    let frontend = run.context.get_text("frontend_code").unwrap();
    assert!(frontend.contains("Implementation based on: # Todo Application Requirements"));
}
