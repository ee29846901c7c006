//! Roles backed by a completion backend

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use devteam_sdk::{
    ChatMessage, CompletionBackend, CompletionOptions, JsonOrText, MarketplaceRoleMetadata,
    OutputParser, Result, Role, RoleResult, WorkflowContext,
};

use super::{team_prompt, RequirementsParser, TeamMember};

/// A team member that asks a completion backend for its output.
///
/// The system prompt is the member's prompt in the shared team framing; the
/// user message is a task prompt built from the step input.
pub struct LlmRole {
    id: String,
    name: String,
    prompt: String,
    member: Option<TeamMember>,
    backend: Arc<dyn CompletionBackend>,
    parser: Arc<dyn OutputParser>,
}

impl LlmRole {
    pub fn member(member: TeamMember, backend: Arc<dyn CompletionBackend>) -> Self {
        let parser: Arc<dyn OutputParser> = match member {
            TeamMember::ProductManager => Arc::new(RequirementsParser),
            _ => Arc::new(JsonOrText),
        };
        Self {
            id: member.id().to_string(),
            name: member.name().to_string(),
            prompt: team_prompt(member.name(), member.prompt()),
            member: Some(member),
            backend,
            parser,
        }
    }

    /// Premium role for a catalog entry. Known members keep their own prompt.
    pub fn for_marketplace(
        metadata: &MarketplaceRoleMetadata,
        backend: Arc<dyn CompletionBackend>,
    ) -> Self {
        if let Some(member) = TeamMember::from_id(&metadata.id) {
            return Self {
                name: metadata.name.clone(),
                ..Self::member(member, backend)
            };
        }

        let prompt = format!(
            "{}\n\nYour capabilities:\n{}",
            metadata.description,
            metadata
                .capabilities
                .iter()
                .map(|c| format!("- {}", c))
                .collect::<Vec<_>>()
                .join("\n")
        );
        Self {
            id: metadata.id.clone(),
            name: metadata.name.clone(),
            prompt: team_prompt(&metadata.name, &prompt),
            member: None,
            backend,
            parser: Arc::new(JsonOrText),
        }
    }

    /// User message for one execution
    pub fn task_prompt(&self, input: &Value) -> String {
        match self.member {
            Some(TeamMember::ProductManager) => {
                let details = match input {
                    Value::String(text) => format!("Project Description: {}", text),
                    other => format!(
                        "Project Details:\n{}",
                        serde_json::to_string_pretty(other).unwrap_or_else(|_| other.to_string())
                    ),
                };
                format!(
                    "Please analyze the following project request and create comprehensive requirements:

{details}

Provide a detailed requirements document including:
1. Project title and overview
2. Core features with priorities (MVP vs future)
3. User stories
4. Technical requirements
5. MVP scope
6. Future enhancements

Format the response as valid JSON."
                )
            }
            Some(TeamMember::FrontendDeveloper) => format!(
                "Requirements: {}

Create the complete frontend implementation for these requirements.
Use Next.js 14 with App Router, TypeScript, and Tailwind CSS.
Output the actual component code files.",
                field_text(input, "requirements")
            ),
            Some(TeamMember::BackendDeveloper) => format!(
                "Requirements: {}

Create the complete backend implementation for these requirements.
Use Next.js API routes with TypeScript.
Include proper validation and error handling.",
                field_text(input, "requirements")
            ),
            Some(TeamMember::StripeExpert) => format!(
                "Project Context: {}
Task: {}

Implement a complete Stripe payment system for this project.
Include checkout, subscriptions, customer portal, and webhooks.
Use Next.js API routes and React components.

Provide:
1. Installation instructions
2. Environment variables needed
3. Complete API routes code
4. React components for checkout
5. Webhook handler implementation
6. Testing steps",
                input.get("project").map(text_of).unwrap_or_default(),
                field_text(input, "task")
            ),
            None => format!("Task: {}", field_text(input, "task")),
        }
    }
}

fn text_of(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

/// `input[field]` when present, otherwise the whole input as text
fn field_text(input: &Value, field: &str) -> String {
    input
        .get(field)
        .map(text_of)
        .unwrap_or_else(|| text_of(input))
}

#[async_trait]
impl Role for LlmRole {
    fn id(&self) -> &str {
        &self.id
    }

    fn name(&self) -> &str {
        &self.name
    }

    fn system_prompt(&self) -> String {
        self.prompt.clone()
    }

    fn output_parser(&self) -> Arc<dyn OutputParser> {
        self.parser.clone()
    }

    async fn execute(&self, input: &Value, _context: &WorkflowContext) -> Result<RoleResult> {
        let messages = [
            ChatMessage::system(self.system_prompt()),
            ChatMessage::user(self.task_prompt(input)),
        ];
        let options = CompletionOptions {
            temperature: self.temperature(),
            max_tokens: self.max_tokens(),
            model: None,
            purpose: self.id.clone(),
        };

        let completion = self.backend.complete(&messages, &options).await?;
        tracing::debug!(
            role = %self.id,
            model = %completion.model,
            cost = completion.cost,
            "Role completion finished"
        );

        let mut result = RoleResult::new(self.parser.parse(&completion.text)).with_cost(completion.cost);
        if let Some(member) = self.member {
            result = result
                .with_next_steps(member.next_steps().iter().copied())
                .with_dependencies(member.dependencies().iter().copied());
        }
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::MockBackend;
    use crate::cost::CostTracker;
    use serde_json::json;

    fn backend(ledger: &CostTracker) -> Arc<dyn CompletionBackend> {
        Arc::new(MockBackend::new(ledger.clone()).with_cost_per_call(0.01))
    }

    #[tokio::test]
    async fn test_product_manager_parses_requirements() {
        let ledger = CostTracker::new();
        let role = LlmRole::member(TeamMember::ProductManager, backend(&ledger));

        let result = role
            .execute(&json!("A todo app"), &WorkflowContext::new())
            .await
            .unwrap();

        assert_eq!(result.output["title"], "Mock App Requirements");
        assert_eq!(result.cost, 0.01);
        assert_eq!(ledger.cost_by_purpose("product-manager"), 0.01);
    }

    #[tokio::test]
    async fn test_frontend_keeps_text_output() {
        let ledger = CostTracker::new();
        let role = LlmRole::member(TeamMember::FrontendDeveloper, backend(&ledger));
        let result = role
            .execute(&json!({"requirements": "todo list"}), &WorkflowContext::new())
            .await
            .unwrap();

        assert!(result.output.is_string());
        assert_eq!(result.next_steps, vec!["integrate_api"]);
    }

    #[test]
    fn test_task_prompts() {
        let ledger = CostTracker::new();
        let pm = LlmRole::member(TeamMember::ProductManager, backend(&ledger));
        assert!(pm
            .task_prompt(&json!("A todo app"))
            .contains("Project Description: A todo app"));
        assert!(pm
            .task_prompt(&json!({"name": "todo"}))
            .contains("Project Details:\n{"));

        let stripe = LlmRole::member(TeamMember::StripeExpert, backend(&ledger));
        let prompt = stripe.task_prompt(&json!({
            "task": "Add Stripe payment integration",
            "project": "A paid todo app"
        }));
        assert!(prompt.starts_with("Project Context: A paid todo app\nTask: Add Stripe payment integration"));
    }

    #[tokio::test]
    async fn test_backend_failure_propagates() {
        let backend: Arc<dyn CompletionBackend> =
            Arc::new(MockBackend::new(CostTracker::new()).with_failure("down"));
        let role = LlmRole::member(TeamMember::BackendDeveloper, backend);
        assert!(role.execute(&json!("x"), &WorkflowContext::new()).await.is_err());
    }
}
