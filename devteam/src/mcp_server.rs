//! Line-delimited JSON-RPC tool server on stdin/stdout

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::mcp_tools::ToolServer;

pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub const PARSE_ERROR: i64 = -32700;
pub const METHOD_NOT_FOUND: i64 = -32601;
pub const INVALID_PARAMS: i64 = -32602;
pub const INTERNAL_ERROR: i64 = -32603;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcRequest {
    #[serde(default)]
    pub jsonrpc: String,
    /// Absent for notifications
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String,
    pub id: Value,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn failure(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Answer one request. Notifications get no response.
pub async fn handle_request(server: &ToolServer, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
    tracing::debug!(method = %request.method, "Tool server request");
    let Some(id) = request.id else {
        return None;
    };

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::success(
            id,
            json!({
                "protocolVersion": PROTOCOL_VERSION,
                "capabilities": {"tools": {}},
                "serverInfo": {"name": server.name(), "version": server.server_version()}
            }),
        ),
        "ping" => JsonRpcResponse::success(id, json!({})),
        "tools/list" => JsonRpcResponse::success(id, json!({"tools": server.definitions()})),
        "tools/call" => {
            let Some(name) = request.params.get("name").and_then(Value::as_str) else {
                return Some(JsonRpcResponse::failure(id, INVALID_PARAMS, "Missing tool name"));
            };
            let arguments = request
                .params
                .get("arguments")
                .cloned()
                .unwrap_or_else(|| json!({}));

            match server.call(name, arguments).await {
                Some(result) => match serde_json::to_value(&result) {
                    Ok(value) => JsonRpcResponse::success(id, value),
                    Err(e) => JsonRpcResponse::failure(id, INTERNAL_ERROR, format!("Server error: {}", e)),
                },
                None => JsonRpcResponse::failure(id, INVALID_PARAMS, format!("Unknown tool: {}", name)),
            }
        }
        other => JsonRpcResponse::failure(id, METHOD_NOT_FOUND, format!("Method not found: {}", other)),
    };
    Some(response)
}

/// Answer one raw line; `None` for notifications and blank lines
pub async fn handle_line(server: &ToolServer, line: &str) -> Option<JsonRpcResponse> {
    let line = line.trim();
    if line.is_empty() {
        return None;
    }
    match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(request) => handle_request(server, request).await,
        Err(e) => {
            tracing::warn!(error = %e, "Malformed JSON-RPC message");
            Some(JsonRpcResponse::failure(Value::Null, PARSE_ERROR, format!("Parse error: {}", e)))
        }
    }
}

/// Serve requests from stdin until it closes
pub async fn serve_stdio(server: ToolServer) -> Result<()> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = tokio::io::stdout();
    tracing::info!(server = server.name(), version = server.server_version(), "Tool server listening on stdio");

    while let Some(line) = lines.next_line().await.context("Failed to read stdin")? {
        let Some(response) = handle_line(&server, &line).await else {
            continue;
        };
        let mut payload = serde_json::to_string(&response)?;
        payload.push('\n');
        stdout.write_all(payload.as_bytes()).await?;
        stdout.flush().await?;
    }

    tracing::info!("Tool server input closed");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp_tools::{Tool, ToolResult};

    fn server() -> ToolServer {
        ToolServer::new("devteam").version("1.0.0").tool(Tool::new(
            "greet",
            "Greets",
            json!({"type": "object"}),
            |args| async move {
                ToolResult::text(format!("hello {}", args["name"].as_str().unwrap_or("?")))
            },
        ))
    }

    #[tokio::test]
    async fn test_initialize_reports_server_info() {
        let response = handle_line(&server(), r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        let result = response.result.unwrap();
        assert_eq!(result["serverInfo"]["name"], "devteam");
        assert_eq!(result["serverInfo"]["version"], "1.0.0");
    }

    #[tokio::test]
    async fn test_tools_call() {
        let response = handle_line(
            &server(),
            r#"{"jsonrpc":"2.0","id":"a","method":"tools/call","params":{"name":"greet","arguments":{"name":"sam"}}}"#,
        )
        .await
        .unwrap();
        assert_eq!(response.id, json!("a"));
        assert_eq!(response.result.unwrap()["content"][0]["text"], "hello sam");
    }

    #[tokio::test]
    async fn test_errors() {
        let server = server();

        let unknown = handle_line(&server, r#"{"jsonrpc":"2.0","id":2,"method":"resources/list"}"#)
            .await
            .unwrap();
        assert_eq!(unknown.error.unwrap().code, METHOD_NOT_FOUND);

        let bad_tool = handle_line(
            &server,
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"nope"}}"#,
        )
        .await
        .unwrap();
        assert_eq!(bad_tool.error.unwrap().code, INVALID_PARAMS);

        let garbage = handle_line(&server, "{not json").await.unwrap();
        assert_eq!(garbage.error.unwrap().code, PARSE_ERROR);
    }

    #[tokio::test]
    async fn test_notifications_get_no_response() {
        let server = server();
        assert!(handle_line(&server, r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#)
            .await
            .is_none());
        assert!(handle_line(&server, "   ").await.is_none());
    }
}
