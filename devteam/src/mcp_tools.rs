//! Tool definitions exposed by the stdio tool server

use std::future::Future;
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use devteam_sdk::{BuildOptions, BuildResult, DevTeamRuntime, StepStatus, WorkflowStep};

pub const SERVER_NAME: &str = "devteam";
pub const SERVER_VERSION: &str = "1.0.0";

// ============================================================================
// Tool plumbing
// ============================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ToolContent {
    Text { text: String },
}

/// Result of one tool call
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolResult {
    pub content: Vec<ToolContent>,
    #[serde(rename = "isError", default, skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            content: vec![ToolContent::Text { text: text.into() }],
            is_error: true,
        }
    }

    /// Text of the first content block
    pub fn first_text(&self) -> &str {
        match self.content.first() {
            Some(ToolContent::Text { text }) => text,
            None => "",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDefinition {
    pub name: String,
    pub description: String,
    pub input_schema: Value,
}

type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ToolResult> + Send + Sync>;

pub struct Tool {
    definition: ToolDefinition,
    handler: ToolHandler,
}

impl Tool {
    pub fn new<F, Fut>(name: &str, description: &str, input_schema: Value, handler: F) -> Self
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult> + Send + 'static,
    {
        Self {
            definition: ToolDefinition {
                name: name.to_string(),
                description: description.to_string(),
                input_schema,
            },
            handler: Arc::new(move |args| -> BoxFuture<'static, ToolResult> {
                Box::pin(handler(args))
            }),
        }
    }

    pub fn definition(&self) -> &ToolDefinition {
        &self.definition
    }
}

/// Named set of tools
pub struct ToolServer {
    name: String,
    version: String,
    tools: Vec<Tool>,
}

impl ToolServer {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            version: "0.1.0".to_string(),
            tools: Vec::new(),
        }
    }

    pub fn version(mut self, version: impl Into<String>) -> Self {
        self.version = version.into();
        self
    }

    pub fn tool(mut self, tool: Tool) -> Self {
        self.tools.push(tool);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn server_version(&self) -> &str {
        &self.version
    }

    pub fn definitions(&self) -> Vec<ToolDefinition> {
        self.tools.iter().map(|t| t.definition.clone()).collect()
    }

    /// Invoke a tool by name; `None` when no such tool exists
    pub async fn call(&self, name: &str, arguments: Value) -> Option<ToolResult> {
        let tool = self.tools.iter().find(|t| t.definition.name == name)?;
        tracing::debug!(tool = name, "Calling tool");
        Some((tool.handler)(arguments).await)
    }
}

// ============================================================================
// devteam tools
// ============================================================================

/// Tool server over a runtime. Purchases without a `user_id` argument are
/// made for `default_user`.
pub fn create_devteam_tool_server(runtime: Arc<dyn DevTeamRuntime>, default_user: &str) -> ToolServer {
    ToolServer::new(SERVER_NAME)
        .version(SERVER_VERSION)
        .tool(build_app_tool(runtime.clone()))
        .tool(check_progress_tool(runtime.clone()))
        .tool(purchase_role_tool(runtime.clone(), default_user.to_string()))
        .tool(list_marketplace_roles_tool(runtime.clone()))
        .tool(run_workflow_tool(runtime.clone()))
        .tool(get_cost_report_tool(runtime))
}

fn str_arg<'a>(args: &'a Value, name: &str) -> Option<&'a str> {
    args.get(name).and_then(Value::as_str).filter(|s| !s.is_empty())
}

/// Tool: build_app
fn build_app_tool(runtime: Arc<dyn DevTeamRuntime>) -> Tool {
    Tool::new(
        "build_app",
        "Build a complete application from a natural-language description using the AI development team",
        json!({
            "type": "object",
            "properties": {
                "description": {"type": "string", "description": "What the app should do"},
                "use_marketplace": {"type": "boolean", "default": true}
            },
            "required": ["description"]
        }),
        move |args| {
            let runtime = runtime.clone();
            async move {
                let Some(description) = str_arg(&args, "description") else {
                    return ToolResult::error("Error: Missing description");
                };
                let options = BuildOptions {
                    use_marketplace: args
                        .get("use_marketplace")
                        .and_then(Value::as_bool)
                        .unwrap_or(true),
                };

                match runtime.build_app(description, options).await {
                    BuildResult::Success {
                        run_id,
                        summary,
                        total_cost,
                        deployment_location,
                    } => ToolResult::text(format!(
                        "✅ App successfully built!\n\n{}\n\n🚀 Live at: {}\n💰 Total cost: ${:.2}\n\nRun ID: {}",
                        summary, deployment_location, total_cost, run_id
                    )),
                    BuildResult::Suggestion { run_id, message, .. } => ToolResult::text(format!(
                        "{}\n\nUse the purchase_role tool to add this capability.\n\nRun ID: {}",
                        message, run_id
                    )),
                    BuildResult::Error { message } => ToolResult::error(format!("Error: {}", message)),
                }
            }
        },
    )
}

/// Tool: check_progress
fn check_progress_tool(runtime: Arc<dyn DevTeamRuntime>) -> Tool {
    Tool::new(
        "check_progress",
        "Check the progress of a build or workflow run",
        json!({
            "type": "object",
            "properties": {"run_id": {"type": "string"}},
            "required": ["run_id"]
        }),
        move |args| {
            let runtime = runtime.clone();
            async move {
                let Some(run_id) = str_arg(&args, "run_id") else {
                    return ToolResult::error("Error: Missing run_id");
                };
                let Some(progress) = runtime.get_progress(run_id).await else {
                    return ToolResult::error(format!("Error: Run not found: {}", run_id));
                };

                let mut text = format!(
                    "Progress: {}%\nCurrent step: {}\nElapsed: {}s\n\nSteps:",
                    progress.percentage, progress.current_step, progress.elapsed_seconds
                );
                for step in &progress.steps {
                    let marker = match step.status {
                        StepStatus::Completed => "✓",
                        StepStatus::Running => "…",
                        StepStatus::Error => "✗",
                        StepStatus::Pending => " ",
                    };
                    text.push_str(&format!("\n  [{}] {} ({})", marker, step.name, step.status));
                    if let Some(cost) = step.cost {
                        text.push_str(&format!(" ${:.4}", cost));
                    }
                }
                ToolResult::text(text)
            }
        },
    )
}

/// Tool: purchase_role
fn purchase_role_tool(runtime: Arc<dyn DevTeamRuntime>, default_user: String) -> Tool {
    Tool::new(
        "purchase_role",
        "Purchase a premium marketplace role",
        json!({
            "type": "object",
            "properties": {
                "role_id": {"type": "string"},
                "user_id": {"type": "string"},
                "license_key": {"type": "string"}
            },
            "required": ["role_id"]
        }),
        move |args| {
            let runtime = runtime.clone();
            let default_user = default_user.clone();
            async move {
                let Some(role_id) = str_arg(&args, "role_id") else {
                    return ToolResult::error("Error: Missing role_id");
                };
                let user_id = str_arg(&args, "user_id").unwrap_or(default_user.as_str());
                let outcome = runtime
                    .purchase_role(role_id, user_id, str_arg(&args, "license_key"))
                    .await;

                if outcome.success {
                    ToolResult::text(outcome.message)
                } else {
                    ToolResult::error(format!("Error: {}", outcome.message))
                }
            }
        },
    )
}

/// Tool: list_marketplace_roles
fn list_marketplace_roles_tool(runtime: Arc<dyn DevTeamRuntime>) -> Tool {
    Tool::new(
        "list_marketplace_roles",
        "List premium roles available in the marketplace",
        json!({"type": "object", "properties": {}}),
        move |_args| {
            let runtime = runtime.clone();
            async move {
                let roles = runtime.list_marketplace_roles().await;
                match serde_json::to_string_pretty(&roles) {
                    Ok(json) => ToolResult::text(json),
                    Err(e) => ToolResult::error(format!("Error: {}", e)),
                }
            }
        },
    )
}

/// Tool: run_workflow
fn run_workflow_tool(runtime: Arc<dyn DevTeamRuntime>) -> Tool {
    Tool::new(
        "run_workflow",
        "Run an ordered list of role steps; inputs may reference earlier outputs as {{key}}",
        json!({
            "type": "object",
            "properties": {
                "steps": {
                    "type": "array",
                    "items": {
                        "type": "object",
                        "properties": {
                            "role": {"type": "string"},
                            "input": {},
                            "output_key": {"type": "string"}
                        },
                        "required": ["role", "output_key"]
                    }
                }
            },
            "required": ["steps"]
        }),
        move |args| {
            let runtime = runtime.clone();
            async move {
                let steps: Vec<WorkflowStep> =
                    match serde_json::from_value(args.get("steps").cloned().unwrap_or(Value::Null)) {
                        Ok(steps) => steps,
                        Err(e) => return ToolResult::error(format!("Error: Invalid steps: {}", e)),
                    };

                match runtime.run_workflow(steps).await {
                    Ok(run) => match serde_json::to_string_pretty(&run) {
                        Ok(json) => ToolResult::text(json),
                        Err(e) => ToolResult::error(format!("Error: {}", e)),
                    },
                    Err(e) => ToolResult::error(format!("Error: {}", e)),
                }
            }
        },
    )
}

/// Tool: get_cost_report
fn get_cost_report_tool(runtime: Arc<dyn DevTeamRuntime>) -> Tool {
    Tool::new(
        "get_cost_report",
        "Report AI spend by provider/model and by role",
        json!({"type": "object", "properties": {}}),
        move |_args| {
            let runtime = runtime.clone();
            async move { ToolResult::text(runtime.cost_report().await.to_string()) }
        },
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_unknown_tool_is_none() {
        let server = ToolServer::new("t").tool(Tool::new(
            "echo",
            "Echo",
            json!({"type": "object"}),
            |args| async move { ToolResult::text(args.to_string()) },
        ));

        assert_eq!(server.definitions().len(), 1);
        assert_eq!(server.call("echo", json!(1)).await.unwrap().first_text(), "1");
        assert!(server.call("missing", json!({})).await.is_none());
    }

    #[test]
    fn test_tool_result_serialization() {
        let ok = serde_json::to_value(ToolResult::text("hi")).unwrap();
        assert_eq!(ok, json!({"content": [{"type": "text", "text": "hi"}]}));

        let err = serde_json::to_value(ToolResult::error("bad")).unwrap();
        assert_eq!(err["isError"], true);
    }
}
