//! Role contract and output parsing strategies

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;

use crate::context::WorkflowContext;
use crate::error::Result;
use crate::types::RoleResult;

/// Turns raw completion text into the value stored in the workflow context.
///
/// Parsers never fail: when the text does not have the expected shape they
/// degrade to a best-effort structure that keeps the raw text.
pub trait OutputParser: Send + Sync {
    fn parse(&self, raw: &str) -> Value;
}

impl<F> OutputParser for F
where
    F: Fn(&str) -> Value + Send + Sync,
{
    fn parse(&self, raw: &str) -> Value {
        self(raw)
    }
}

/// Parse the whole response as JSON, otherwise keep it as text
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonOrText;

impl OutputParser for JsonOrText {
    fn parse(&self, raw: &str) -> Value {
        serde_json::from_str(raw.trim()).unwrap_or_else(|_| Value::String(raw.to_string()))
    }
}

/// A named unit of work in a workflow
#[async_trait]
pub trait Role: Send + Sync {
    fn id(&self) -> &str;

    /// Display name
    fn name(&self) -> &str;

    /// Full system prompt sent ahead of the user message
    fn system_prompt(&self) -> String;

    fn temperature(&self) -> f32 {
        0.7
    }

    fn max_tokens(&self) -> u32 {
        4096
    }

    /// Strategy used when the orchestrator drives the completion itself
    fn output_parser(&self) -> Arc<dyn OutputParser> {
        Arc::new(JsonOrText)
    }

    async fn execute(&self, input: &Value, context: &WorkflowContext) -> Result<RoleResult>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_json_or_text_parses_json() {
        assert_eq!(JsonOrText.parse(r#" {"title": "Todo"} "#), json!({"title": "Todo"}));
    }

    #[test]
    fn test_json_or_text_keeps_plain_text() {
        assert_eq!(JsonOrText.parse("not json"), json!("not json"));
    }

    #[test]
    fn test_closure_parser() {
        let upper = |raw: &str| Value::String(raw.to_uppercase());
        assert_eq!(upper.parse("abc"), json!("ABC"));
    }
}
