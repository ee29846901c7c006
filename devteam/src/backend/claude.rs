//! Anthropic Messages API backend

use std::time::Duration;

use async_stream::stream;
use async_trait::async_trait;
use futures::{Stream, StreamExt};
use serde::Deserialize;
use serde_json::{json, Value};

use devteam_sdk::{
    ChatMessage, ChatRole, ChunkStream, Completion, CompletionBackend, CompletionOptions,
    DevTeamError, Result, StreamChunk,
};

use crate::cost::CostTracker;

pub const DEFAULT_MODEL: &str = "claude-3-5-sonnet-20241022";
const API_URL: &str = "https://api.anthropic.com/v1/messages";
const API_VERSION: &str = "2023-06-01";

/// (input, output) price in dollars per million tokens.
/// Model families are matched by name; unknown models are priced as sonnet.
pub fn model_pricing(model: &str) -> (f64, f64) {
    let model = model.to_ascii_lowercase();
    if model.contains("opus") {
        (15.0, 75.0)
    } else if model.contains("haiku") {
        (0.25, 1.25)
    } else {
        (3.0, 15.0)
    }
}

#[derive(Debug, Deserialize)]
struct ApiResponse {
    content: Vec<ContentBlock>,
    model: Option<String>,
    usage: Usage,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
enum ContentBlock {
    Text { text: String },
    #[serde(other)]
    Other,
}

#[derive(Debug, Default, Deserialize)]
struct Usage {
    #[serde(default)]
    input_tokens: u64,
    #[serde(default)]
    output_tokens: u64,
}

/// One decoded server-sent event of a streaming response
#[derive(Debug, PartialEq)]
enum SseEvent {
    Text(String),
    InputTokens(u64),
    OutputTokens(u64),
    Stop,
    Error(String),
    Ignored,
}

fn parse_sse_event(raw: &str) -> SseEvent {
    let data: String = raw
        .lines()
        .filter_map(|line| line.strip_prefix("data:"))
        .map(str::trim)
        .collect();
    if data.is_empty() {
        return SseEvent::Ignored;
    }
    let Ok(value) = serde_json::from_str::<Value>(&data) else {
        return SseEvent::Ignored;
    };

    match value["type"].as_str() {
        Some("content_block_delta") if value["delta"]["type"] == "text_delta" => {
            SseEvent::Text(value["delta"]["text"].as_str().unwrap_or_default().to_string())
        }
        Some("message_start") => {
            SseEvent::InputTokens(value["message"]["usage"]["input_tokens"].as_u64().unwrap_or(0))
        }
        Some("message_delta") => {
            SseEvent::OutputTokens(value["usage"]["output_tokens"].as_u64().unwrap_or(0))
        }
        Some("message_stop") => SseEvent::Stop,
        Some("error") => SseEvent::Error(
            value["error"]["message"]
                .as_str()
                .unwrap_or("unknown streaming error")
                .to_string(),
        ),
        _ => SseEvent::Ignored,
    }
}

/// Splits raw response bytes into complete server-sent events.
///
/// Bytes stay buffered until a blank line closes the event, so a multi-byte
/// character split across two reads is decoded whole.
#[derive(Debug, Default)]
struct SseDecoder {
    buffer: Vec<u8>,
}

impl SseDecoder {
    fn push(&mut self, data: &[u8]) -> Vec<String> {
        // `\r` never occurs inside a multi-byte UTF-8 sequence
        self.buffer.extend(data.iter().copied().filter(|&b| b != b'\r'));

        let mut events = Vec::new();
        while let Some(end) = self.buffer.windows(2).position(|w| w == b"\n\n") {
            let raw: Vec<u8> = self.buffer.drain(..end + 2).collect();
            events.push(String::from_utf8_lossy(&raw).into_owned());
        }
        events
    }
}

/// Turn a streaming response body into text chunks. The usage reported by the
/// stream is charged to `ledger` and carried on the end-of-stream chunk.
fn sse_chunks<S, B, E>(mut bytes: S, ledger: CostTracker, model: String, purpose: String) -> ChunkStream
where
    S: Stream<Item = std::result::Result<B, E>> + Send + Unpin + 'static,
    B: AsRef<[u8]> + Send + 'static,
    E: std::fmt::Display + Send + 'static,
{
    let chunks = stream! {
        let mut decoder = SseDecoder::default();
        let mut usage = Usage::default();
        let mut finished = false;

        while let Some(next) = bytes.next().await {
            let data = match next {
                Ok(data) => data,
                Err(e) => {
                    yield Err(DevTeamError::completion(format!("Claude streaming failed: {}", e)));
                    return;
                }
            };

            for raw in decoder.push(data.as_ref()) {
                match parse_sse_event(&raw) {
                    SseEvent::Text(text) => {
                        yield Ok(StreamChunk::text(text));
                    }
                    SseEvent::InputTokens(n) => usage.input_tokens = n,
                    SseEvent::OutputTokens(n) => usage.output_tokens = n,
                    SseEvent::Stop => finished = true,
                    SseEvent::Error(message) => {
                        yield Err(DevTeamError::completion(format!("Claude streaming failed: {}", message)));
                        return;
                    }
                    SseEvent::Ignored => {}
                }
            }
            if finished {
                break;
            }
        }

        if !finished {
            yield Err(DevTeamError::completion("Claude stream ended before message_stop"));
            return;
        }

        let (input_price, output_price) = model_pricing(&model);
        let cost = usage.input_tokens as f64 / 1_000_000.0 * input_price
            + usage.output_tokens as f64 / 1_000_000.0 * output_price;
        ledger.track("claude", &model, usage.input_tokens, usage.output_tokens, cost, &purpose);
        yield Ok(StreamChunk::finished(cost));
    };

    Box::pin(chunks)
}

/// Claude completion backend.
///
/// Every call is recorded on the cost ledger handed to [`ClaudeBackend::new`].
pub struct ClaudeBackend {
    api_key: String,
    model: String,
    api_url: String,
    http: reqwest::Client,
    ledger: CostTracker,
}

impl ClaudeBackend {
    pub fn new(api_key: impl Into<String>, ledger: CostTracker) -> Self {
        Self {
            api_key: api_key.into(),
            model: DEFAULT_MODEL.to_string(),
            api_url: API_URL.to_string(),
            http: reqwest::Client::new(),
            ledger,
        }
    }

    pub fn with_model(mut self, model: impl Into<String>) -> Self {
        self.model = model.into();
        self
    }

    pub fn with_api_url(mut self, url: impl Into<String>) -> Self {
        self.api_url = url.into();
        self
    }

    /// Fail requests that take longer than `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Result<Self> {
        self.http = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| DevTeamError::completion(format!("Failed to build HTTP client: {}", e)))?;
        Ok(self)
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    fn model_for(&self, options: &CompletionOptions) -> String {
        options.model.clone().unwrap_or_else(|| self.model.clone())
    }

    fn request_body(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
        model: &str,
        stream: bool,
    ) -> Value {
        let system: Vec<&str> = messages
            .iter()
            .filter(|m| m.role == ChatRole::System)
            .map(|m| m.content.as_str())
            .collect();
        let conversation: Vec<Value> = messages
            .iter()
            .filter(|m| m.role != ChatRole::System)
            .map(|m| json!({"role": m.role, "content": m.content}))
            .collect();

        let mut body = json!({
            "model": model,
            "max_tokens": options.max_tokens,
            "temperature": options.temperature,
            "messages": conversation,
        });
        if !system.is_empty() {
            body["system"] = Value::String(system.join("\n\n"));
        }
        if stream {
            body["stream"] = Value::Bool(true);
        }
        body
    }

    async fn send(&self, body: &Value) -> Result<reqwest::Response> {
        let resp = self
            .http
            .post(&self.api_url)
            .header("x-api-key", &self.api_key)
            .header("anthropic-version", API_VERSION)
            .header("content-type", "application/json")
            .json(body)
            .send()
            .await
            .map_err(|e| DevTeamError::completion(format!("Failed to call Claude API: {}", e)))?;

        let status = resp.status();
        if !status.is_success() {
            let body = resp.text().await.unwrap_or_default();
            return Err(DevTeamError::completion(format!(
                "Claude API error {}: {}",
                status, body
            )));
        }
        Ok(resp)
    }
}

#[async_trait]
impl CompletionBackend for ClaudeBackend {
    fn name(&self) -> &str {
        "claude"
    }

    async fn complete(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<Completion> {
        let model = self.model_for(options);
        let body = self.request_body(messages, options, &model, false);

        tracing::debug!(model = %model, purpose = %options.purpose, "Calling Claude");
        let resp: ApiResponse = self
            .send(&body)
            .await?
            .json()
            .await
            .map_err(|e| DevTeamError::completion(format!("Failed to parse Claude response: {}", e)))?;

        let text = resp
            .content
            .iter()
            .filter_map(|block| match block {
                ContentBlock::Text { text } => Some(text.as_str()),
                ContentBlock::Other => None,
            })
            .collect::<Vec<_>>()
            .join("");
        let model = resp.model.unwrap_or(model);
        let cost = self.estimate_cost(resp.usage.input_tokens, resp.usage.output_tokens, &model);

        self.ledger.track(
            self.name(),
            &model,
            resp.usage.input_tokens,
            resp.usage.output_tokens,
            cost,
            &options.purpose,
        );

        Ok(Completion {
            text,
            prompt_tokens: resp.usage.input_tokens,
            completion_tokens: resp.usage.output_tokens,
            cost,
            model,
        })
    }

    async fn stream(
        &self,
        messages: &[ChatMessage],
        options: &CompletionOptions,
    ) -> Result<ChunkStream> {
        let model = self.model_for(options);
        let body = self.request_body(messages, options, &model, true);

        tracing::debug!(model = %model, purpose = %options.purpose, "Streaming from Claude");
        let bytes = self.send(&body).await?.bytes_stream().boxed();
        Ok(sse_chunks(bytes, self.ledger.clone(), model, options.purpose.clone()))
    }

    fn estimate_cost(&self, prompt_tokens: u64, completion_tokens: u64, model: &str) -> f64 {
        let (input, output) = model_pricing(model);
        prompt_tokens as f64 / 1_000_000.0 * input + completion_tokens as f64 / 1_000_000.0 * output
    }
}
