//! Tool server over a scripted runtime

use std::sync::Arc;

use serde_json::{json, Value};

use devteam::mcp_server::{handle_request, JsonRpcRequest};
use devteam::mcp_tools::{create_devteam_tool_server, ToolServer};
use devteam::runtime::StudioRuntime;
use devteam_sdk::DevTeamRuntime;

use super::common::*;

fn server(runtime: Arc<StudioRuntime>) -> ToolServer {
    let user = runtime.user_id().to_string();
    create_devteam_tool_server(runtime, &user)
}

fn run_id_of(text: &str) -> &str {
    text.rsplit("Run ID: ").next().unwrap().trim()
}

#[tokio::test]
async fn test_lists_all_tools() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(Arc::new(scripted_runtime(dir.path())));

    let response = handle_request(
        &server,
        JsonRpcRequest {
            jsonrpc: "2.0".to_string(),
            id: Some(json!(1)),
            method: "tools/list".to_string(),
            params: Value::Null,
        },
    )
    .await
    .unwrap();

    let tools = response.result.unwrap()["tools"].clone();
    let names: Vec<&str> = tools
        .as_array()
        .unwrap()
        .iter()
        .map(|t| t["name"].as_str().unwrap())
        .collect();
    assert_eq!(
        names,
        [
            "build_app",
            "check_progress",
            "purchase_role",
            "list_marketplace_roles",
            "run_workflow",
            "get_cost_report"
        ]
    );
    assert!(tools[0]["inputSchema"]["required"]
        .as_array()
        .unwrap()
        .contains(&json!("description")));
}

#[tokio::test]
async fn test_build_then_check_progress() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(Arc::new(scripted_runtime(dir.path())));

    let built = server
        .call("build_app", json!({"description": "A simple todo app"}))
        .await
        .unwrap();
    assert!(!built.is_error);
    assert!(built.first_text().starts_with("✅ App successfully built!"));

    let run_id = run_id_of(built.first_text()).to_string();
    let progress = server
        .call("check_progress", json!({"run_id": run_id}))
        .await
        .unwrap();
    assert!(progress.first_text().starts_with("Progress: 100%"));
    assert!(progress.first_text().contains("Requirements Analysis (completed)"));

    let missing = server
        .call("check_progress", json!({"run_id": "nope"}))
        .await
        .unwrap();
    assert!(missing.is_error);
}

#[tokio::test]
async fn test_suggestion_then_purchase_then_build() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(scripted_runtime(dir.path()));
    let server = server(runtime.clone());

    let suggested = server
        .call("build_app", json!({"description": "A todo app with payments"}))
        .await
        .unwrap();
    assert!(suggested.first_text().contains("Stripe Payment Expert"));
    assert!(suggested.first_text().contains("purchase_role"));

    let rejected = server
        .call("purchase_role", json!({"role_id": "stripe-expert", "license_key": "WRONG-KEY"}))
        .await
        .unwrap();
    assert!(rejected.is_error);
    assert!(!runtime.marketplace().has_license("stripe-expert", runtime.user_id()));

    let purchased = server
        .call("purchase_role", json!({"role_id": "stripe-expert", "license_key": "DEMO-2024"}))
        .await
        .unwrap();
    assert!(!purchased.is_error);
    assert!(runtime.marketplace().has_license("stripe-expert", runtime.user_id()));

    let built = server
        .call("build_app", json!({"description": "A todo app with payments"}))
        .await
        .unwrap();
    assert!(built.first_text().contains("Professional Stripe integration"));
}

#[tokio::test]
async fn test_run_workflow_tool_returns_context() {
    let dir = tempfile::tempdir().unwrap();
    let runtime = Arc::new(scripted_runtime(dir.path()));
    let server = server(runtime.clone());

    let result = server
        .call(
            "run_workflow",
            json!({"steps": [
                {"role": "product-manager", "input": "a todo app", "output_key": "requirements"},
                {"role": "frontend-developer", "input": {"requirements": "{{requirements}}"}, "outputKey": "frontend_code"}
            ]}),
        )
        .await
        .unwrap();
    assert!(!result.is_error);

    let run: Value = serde_json::from_str(result.first_text()).unwrap();
    let keys: Vec<&String> = run["context"].as_object().unwrap().keys().collect();
    assert_eq!(keys, ["requirements", "frontend_code"]);

    let failed = server
        .call(
            "run_workflow",
            json!({"steps": [{"role": "designer", "input": "x", "output_key": "design"}]}),
        )
        .await
        .unwrap();
    assert!(failed.is_error);
    assert!(failed.first_text().contains("Role not found: designer"));

    let report = server.call("get_cost_report", json!({})).await.unwrap();
    assert!(report.first_text().starts_with("Cost Report"));
    assert_eq!(runtime.cost_report().await.calls, 0);
}

#[tokio::test]
async fn test_marketplace_listing() {
    let dir = tempfile::tempdir().unwrap();
    let server = server(Arc::new(scripted_runtime(dir.path())));

    let listing = server.call("list_marketplace_roles", json!({})).await.unwrap();
    let roles: Value = serde_json::from_str(listing.first_text()).unwrap();
    assert_eq!(roles[0]["id"], "stripe-expert");
    assert_eq!(roles[0]["price"], 29.0);
}
