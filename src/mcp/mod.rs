//! Minimal MCP (JSON-RPC 2.0) request handling for the tool server.

mod stdio;

use serde::{Deserialize, Deserializer, Serialize};
use serde_json::{json, Value};

use crate::session::OpsSession;
use crate::tools::{self, catalog, help};

pub use stdio::serve;

pub const PROTOCOL_VERSION: &str = "2024-11-05";
pub const SERVER_NAME: &str = "ops-mcp";

const PARSE_ERROR: i64 = -32700;
const METHOD_NOT_FOUND: i64 = -32601;
const INVALID_PARAMS: i64 = -32602;

const INSTRUCTIONS: &str = "Tools for the EPO Open Patent Services API. \
Call authenticate_ops_env (or authenticate_ops) first, then search and retrieve patent data. \
Read the mcp://ops-api-help resource for query syntax and examples.";

#[derive(Debug, Deserialize)]
pub struct JsonRpcRequest {
    #[allow(dead_code)]
    jsonrpc: Option<String>,
    /// `None` only when the member is absent; `"id": null` is `Some(Value::Null)`.
    #[serde(default, deserialize_with = "present_value")]
    pub id: Option<Value>,
    pub method: String,
    #[serde(default)]
    pub params: Option<Value>,
}

fn present_value<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<Value>, D::Error> {
    Value::deserialize(deserializer).map(Some)
}

#[derive(Debug, Serialize)]
pub struct JsonRpcResponse {
    jsonrpc: &'static str,
    id: Value,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
pub struct JsonRpcError {
    code: i64,
    message: String,
}

impl JsonRpcResponse {
    fn ok(id: Value, result: Value) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: Some(result),
            error: None,
        }
    }

    fn err(id: Value, code: i64, message: impl Into<String>) -> Self {
        Self {
            jsonrpc: "2.0",
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message: message.into(),
            }),
        }
    }
}

/// Handle one line of input. Returns the serialized response, or `None` for
/// notifications.
pub async fn handle_line(session: &OpsSession, line: &str) -> Option<String> {
    let response = match serde_json::from_str::<JsonRpcRequest>(line) {
        Ok(request) => handle_request(session, request).await?,
        Err(err) => {
            tracing::warn!(error = %err, "unparsable JSON-RPC message");
            JsonRpcResponse::err(Value::Null, PARSE_ERROR, format!("Parse error: {err}"))
        }
    };
    match serde_json::to_string(&response) {
        Ok(serialized) => Some(serialized),
        Err(err) => {
            tracing::error!(error = %err, "failed to serialize JSON-RPC response");
            None
        }
    }
}

/// Dispatch a parsed request. Notifications (no `id`) produce no response.
pub async fn handle_request(
    session: &OpsSession,
    request: JsonRpcRequest,
) -> Option<JsonRpcResponse> {
    let Some(id) = request.id else {
        tracing::debug!(method = %request.method, "notification received");
        return None;
    };
    let params = request.params.unwrap_or(Value::Null);

    let response = match request.method.as_str() {
        "initialize" => JsonRpcResponse::ok(id, initialize_result()),
        "ping" => JsonRpcResponse::ok(id, json!({})),
        "tools/list" => JsonRpcResponse::ok(id, catalog::tool_definitions().clone()),
        "tools/call" => match params.get("name").and_then(Value::as_str) {
            Some(name) => {
                let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);
                tracing::info!(tool = name, "tool call");
                let envelope = tools::call_tool(session, name, arguments).await;
                JsonRpcResponse::ok(id, tool_result(&envelope))
            }
            None => JsonRpcResponse::err(id, INVALID_PARAMS, "tools/call requires a 'name'"),
        },
        "resources/list" => JsonRpcResponse::ok(
            id,
            json!({
                "resources": [{
                    "uri": help::HELP_URI,
                    "name": help::HELP_NAME,
                    "description": "Usage guide for the EPO OPS tools",
                    "mimeType": help::HELP_MIME_TYPE
                }]
            }),
        ),
        "resources/read" => match params.get("uri").and_then(Value::as_str) {
            Some(help::HELP_URI) => JsonRpcResponse::ok(
                id,
                json!({
                    "contents": [{
                        "uri": help::HELP_URI,
                        "mimeType": help::HELP_MIME_TYPE,
                        "text": help::HELP_TEXT
                    }]
                }),
            ),
            Some(other) => {
                JsonRpcResponse::err(id, INVALID_PARAMS, format!("Unknown resource: {other}"))
            }
            None => JsonRpcResponse::err(id, INVALID_PARAMS, "resources/read requires a 'uri'"),
        },
        other => JsonRpcResponse::err(id, METHOD_NOT_FOUND, format!("Method not found: {other}")),
    };
    Some(response)
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "capabilities": { "tools": {}, "resources": {} },
        "serverInfo": { "name": SERVER_NAME, "version": env!("CARGO_PKG_VERSION") },
        "instructions": INSTRUCTIONS
    })
}

/// Wrap a tool envelope as MCP `tools/call` content.
fn tool_result(envelope: &Value) -> Value {
    let text = serde_json::to_string_pretty(envelope).unwrap_or_else(|_| envelope.to_string());
    json!({
        "content": [{ "type": "text", "text": text }],
        "isError": envelope.get("error").is_some()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::AppConfig;

    async fn roundtrip(line: &str) -> Option<Value> {
        let session = OpsSession::new(AppConfig::default());
        handle_line(&session, line)
            .await
            .map(|out| serde_json::from_str(&out).unwrap())
    }

    #[tokio::test]
    async fn test_initialize() {
        let response = roundtrip(r#"{"jsonrpc":"2.0","id":1,"method":"initialize","params":{}}"#)
            .await
            .unwrap();
        assert_eq!(response["id"], 1);
        assert_eq!(response["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(response["result"]["serverInfo"]["name"], SERVER_NAME);
    }

    #[tokio::test]
    async fn test_notification_has_no_response() {
        let response =
            roundtrip(r#"{"jsonrpc":"2.0","method":"notifications/initialized"}"#).await;
        assert!(response.is_none());
    }

    #[tokio::test]
    async fn test_null_id_is_answered() {
        let response = roundtrip(r#"{"jsonrpc":"2.0","id":null,"method":"ping"}"#)
            .await
            .expect("explicit null id is a request");
        assert!(response["id"].is_null());
        assert_eq!(response["result"], json!({}));
    }

    #[tokio::test]
    async fn test_parse_error() {
        let response = roundtrip("{not json").await.unwrap();
        assert_eq!(response["error"]["code"], PARSE_ERROR);
        assert!(response["id"].is_null());
    }

    #[tokio::test]
    async fn test_unknown_method() {
        let response = roundtrip(r#"{"jsonrpc":"2.0","id":"a","method":"sampling/create"}"#)
            .await
            .unwrap();
        assert_eq!(response["id"], "a");
        assert_eq!(response["error"]["code"], METHOD_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_tools_list() {
        let response = roundtrip(r#"{"jsonrpc":"2.0","id":2,"method":"tools/list"}"#)
            .await
            .unwrap();
        assert_eq!(response["result"]["tools"].as_array().unwrap().len(), 13);
    }

    #[tokio::test]
    async fn test_tools_call_unauthenticated_is_error_content() {
        let response = roundtrip(
            r#"{"jsonrpc":"2.0","id":3,"method":"tools/call","params":{"name":"search_patents","arguments":{"query":"ti=solar"}}}"#,
        )
        .await
        .unwrap();
        assert_eq!(response["result"]["isError"], true);
        let text = response["result"]["content"][0]["text"].as_str().unwrap();
        let envelope: Value = serde_json::from_str(text).unwrap();
        assert!(envelope["error"]
            .as_str()
            .unwrap()
            .starts_with("Not authenticated"));
    }

    #[tokio::test]
    async fn test_tools_call_requires_name() {
        let response =
            roundtrip(r#"{"jsonrpc":"2.0","id":4,"method":"tools/call","params":{}}"#)
                .await
                .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }

    #[tokio::test]
    async fn test_resources_read_help() {
        let response = roundtrip(
            r#"{"jsonrpc":"2.0","id":5,"method":"resources/read","params":{"uri":"mcp://ops-api-help"}}"#,
        )
        .await
        .unwrap();
        let text = response["result"]["contents"][0]["text"].as_str().unwrap();
        assert!(text.contains("authenticate_ops_env"));

        let response = roundtrip(
            r#"{"jsonrpc":"2.0","id":6,"method":"resources/read","params":{"uri":"mcp://other"}}"#,
        )
        .await
        .unwrap();
        assert_eq!(response["error"]["code"], INVALID_PARAMS);
    }
}
