//! Offline backend with scripted responses

use std::collections::HashMap;

use async_trait::async_trait;
use futures::stream;

use devteam_sdk::{
    ChatMessage, ChunkStream, Completion, CompletionBackend, CompletionOptions, DevTeamError,
    Result, StreamChunk,
};

use crate::cost::CostTracker;

pub const MOCK_MODEL: &str = "mock-model";

const PRODUCT_MANAGER_RESPONSE: &str = r#"{
  "title": "Mock App Requirements",
  "overview": "A modern web application built with Next.js",
  "features": [
    "User authentication",
    "CRUD operations",
    "Responsive design"
  ],
  "technicalRequirements": {
    "frontend": "Next.js with TypeScript",
    "styling": "Tailwind CSS",
    "database": "PostgreSQL",
    "deployment": "Vercel"
  }
}"#;

const FRONTEND_RESPONSE: &str = r#"// Mock React Component
import React from 'react';

export default function AppComponent() {
  return (
    <div className="container mx-auto p-4">
      <h1 className="text-3xl font-bold">Mock App</h1>
      <p>This is a mock response for testing</p>
    </div>
  );
}"#;

const BACKEND_RESPONSE: &str = r#"// Mock API Route
export async function GET(request: Request) {
  return Response.json({
    message: "Mock API response",
    data: []
  });
}"#;

const STRIPE_RESPONSE: &str = r#"// Mock Stripe checkout route
import Stripe from 'stripe';

export async function POST() {
  return Response.json({ sessionId: "cs_test_mock" });
}"#;

/// Completion backend that answers from a table keyed by request purpose.
///
/// Requests are matched on [`CompletionOptions::purpose`], which the
/// orchestrator and the roles set to the role id. Unknown purposes get an
/// echo of the last message. Each call reports a flat cost (zero by default)
/// to the ledger.
pub struct MockBackend {
    responses: HashMap<String, String>,
    cost_per_call: f64,
    failure: Option<String>,
    ledger: CostTracker,
}

impl MockBackend {
    pub fn new(ledger: CostTracker) -> Self {
        let responses = [
            ("product-manager", PRODUCT_MANAGER_RESPONSE),
            ("frontend-developer", FRONTEND_RESPONSE),
            ("backend-developer", BACKEND_RESPONSE),
            ("stripe-expert", STRIPE_RESPONSE),
        ]
        .into_iter()
        .map(|(purpose, text)| (purpose.to_string(), text.to_string()))
        .collect();

        Self {
            responses,
            cost_per_call: 0.0,
            failure: None,
            ledger,
        }
    }

    /// Script the response for one purpose
    pub fn with_response(mut self, purpose: impl Into<String>, text: impl Into<String>) -> Self {
        self.responses.insert(purpose.into(), text.into());
        self
    }

    pub fn with_cost_per_call(mut self, cost: f64) -> Self {
        self.cost_per_call = cost.max(0.0);
        self
    }

    /// Make every call fail with a backend error
    pub fn with_failure(mut self, message: impl Into<String>) -> Self {
        self.failure = Some(message.into());
        self
    }

    fn response_for(&self, messages: &[ChatMessage], options: &CompletionOptions) -> String {
        self.responses
            .get(&options.purpose)
            .cloned()
            .unwrap_or_else(|| {
                let last = messages.last().map(|m| m.content.as_str()).unwrap_or_default();
                format!("Mock response for: {}", last)
            })
    }
}

#[async_trait]
impl CompletionBackend for MockBackend {
    fn name(&self) -> &str {
        "mock"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion> {
        if let Some(message) = &self.failure {
            return Err(DevTeamError::completion(message.clone()));
        }

        let text = self.response_for(messages, options);
        let (prompt_tokens, completion_tokens) = (100, 50);
        self.ledger.track(
            self.name(),
            MOCK_MODEL,
            prompt_tokens,
            completion_tokens,
            self.cost_per_call,
            &options.purpose,
        );

        Ok(Completion {
            text,
            prompt_tokens,
            completion_tokens,
            cost: self.cost_per_call,
            model: MOCK_MODEL.to_string(),
        })
    }

    /// Streams the scripted response word by word
    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChunkStream> {
        let completion = self.complete(messages, options).await?;
        let chunks: Vec<Result<StreamChunk>> = completion
            .text
            .split_inclusive(' ')
            .map(|word| Ok(StreamChunk::text(word)))
            .chain(std::iter::once(Ok(StreamChunk::finished(completion.cost))))
            .collect();

        Ok(Box::pin(stream::iter(chunks)))
    }

    /// Flat per-call cost regardless of token counts
    fn estimate_cost(&self, _prompt_tokens: u64, _completion_tokens: u64, _model: &str) -> f64 {
        self.cost_per_call
    }
}
