//! hri mcp - MCP (Model Context Protocol) server mode
//!
//! Exposes the recruiter tools over JSON-RPC on stdio. Every line on stdout
//! is one JSON-RPC response; logs go to stderr only.
//!
//! # Output Safety
//!
//! Responses MUST always be valid JSON with no ANSI escape codes. See
//! [`sanitize_mcp_output`] and [`validate_mcp_json`].

use std::io::{self, BufRead, Write};

use clap::{Args, Subcommand};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, warn};

use crate::app::AppContext;
use crate::cli::output::{emit_json, robot_ok};
use crate::error::Result;
use crate::tools::{ToolDefinition, Tools, definitions, error_payload};

/// MCP server protocol version
const PROTOCOL_VERSION: &str = "2024-11-05";
const SERVER_NAME: &str = "hri";
const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Strip ANSI escape codes from a string.
///
/// Handles CSI (`ESC [ ... final`), OSC (`ESC ] ... BEL|ST`) and two-byte
/// escapes.
#[must_use]
pub fn strip_ansi(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\x1b' {
            result.push(c);
            continue;
        }
        match chars.peek() {
            Some('[') => {
                chars.next();
                while let Some(ch) = chars.next() {
                    if (0x40..=0x7E).contains(&(ch as u32)) {
                        break;
                    }
                }
            }
            Some(']') => {
                chars.next();
                while let Some(ch) = chars.next() {
                    if ch == '\x07' {
                        break;
                    }
                    if ch == '\x1b' && chars.peek() == Some(&'\\') {
                        chars.next();
                        break;
                    }
                }
            }
            Some(_) => {
                chars.next();
            }
            None => {}
        }
    }

    result
}

#[must_use]
pub fn contains_ansi(s: &str) -> bool {
    s.contains('\x1b')
}

/// Strip ANSI codes, warning when any were present.
#[must_use]
pub fn sanitize_mcp_output(s: &str) -> String {
    if contains_ansi(s) {
        warn!("MCP output contained ANSI codes; stripping");
        strip_ansi(s)
    } else {
        s.to_string()
    }
}

/// Reject JSON that would corrupt the MCP transport.
pub fn validate_mcp_json(json: &str) -> std::result::Result<(), String> {
    if contains_ansi(json) {
        Err("MCP response contains ANSI escape codes".to_string())
    } else {
        Ok(())
    }
}

fn serialize_response_safe(response: &JsonRpcResponse) -> String {
    match serde_json::to_string(response) {
        Ok(json) => sanitize_mcp_output(&json),
        Err(e) => {
            warn!(error = %e, "failed to serialize JSON-RPC response");
            let fallback = JsonRpcResponse::error(
                None,
                INTERNAL_ERROR,
                format!("Failed to serialize response: {e}"),
                None,
            );
            serde_json::to_string(&fallback).unwrap_or_else(|_| {
                r#"{"jsonrpc":"2.0","error":{"code":-32603,"message":"Serialization failed"}}"#
                    .to_string()
            })
        }
    }
}

#[derive(Args, Debug)]
pub struct McpArgs {
    #[command(subcommand)]
    pub command: McpCommand,
}

#[derive(Subcommand, Debug)]
pub enum McpCommand {
    /// Start MCP server with stdio transport
    Serve(ServeArgs),
    /// List available MCP tools
    Tools,
}

#[derive(Args, Debug)]
pub struct ServeArgs {
    /// Echo protocol traffic to stderr
    #[arg(long)]
    pub debug: bool,
}

#[derive(Debug, Deserialize)]
struct JsonRpcRequest {
    jsonrpc: String,
    id: Option<Value>,
    method: String,
    #[serde(default)]
    params: Value,
}

#[derive(Debug, Serialize)]
struct JsonRpcResponse {
    jsonrpc: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<JsonRpcError>,
}

#[derive(Debug, Serialize)]
struct JsonRpcError {
    code: i32,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<Value>,
}

impl JsonRpcResponse {
    fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    fn error(id: Option<Value>, code: i32, message: String, data: Option<Value>) -> Self {
        Self {
            jsonrpc: "2.0".to_string(),
            id,
            result: None,
            error: Some(JsonRpcError {
                code,
                message,
                data,
            }),
        }
    }

    /// Success carrying any serializable result.
    fn from_result<T: Serialize>(id: Option<Value>, result: &T) -> Self {
        match serde_json::to_value(result) {
            Ok(value) => Self::success(id, value),
            Err(e) => Self::error(id, INTERNAL_ERROR, format!("serialize result: {e}"), None),
        }
    }
}

// JSON-RPC 2.0 error codes
const PARSE_ERROR: i32 = -32700;
const INVALID_REQUEST: i32 = -32600;
const METHOD_NOT_FOUND: i32 = -32601;
const INVALID_PARAMS: i32 = -32602;
const INTERNAL_ERROR: i32 = -32603;

#[derive(Debug, Serialize)]
struct ServerCapabilities {
    tools: ToolsCapability,
}

#[derive(Debug, Serialize)]
struct ToolsCapability {
    #[serde(rename = "listChanged")]
    list_changed: bool,
}

#[derive(Debug, Serialize)]
struct ServerInfo {
    name: String,
    version: String,
}

#[derive(Debug, Serialize)]
struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    protocol_version: String,
    capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    server_info: ServerInfo,
}

#[derive(Debug, Serialize)]
struct ToolsListResult {
    tools: Vec<ToolDefinition>,
}

#[derive(Debug, Serialize)]
struct ToolResult {
    content: Vec<ToolContent>,
    #[serde(rename = "isError", skip_serializing_if = "Option::is_none")]
    is_error: Option<bool>,
}

#[derive(Debug, Serialize)]
struct ToolContent {
    #[serde(rename = "type")]
    content_type: String,
    text: String,
}

impl ToolResult {
    fn text(text: &str) -> Self {
        Self {
            content: vec![ToolContent {
                content_type: "text".to_string(),
                text: sanitize_mcp_output(text),
            }],
            is_error: None,
        }
    }

    fn error(message: &str) -> Self {
        Self {
            is_error: Some(true),
            ..Self::text(message)
        }
    }
}

pub fn run(ctx: &AppContext, args: &McpArgs) -> Result<()> {
    match &args.command {
        McpCommand::Serve(serve_args) => run_stdio_server(&ctx.tools(), serve_args.debug),
        McpCommand::Tools => run_tools(ctx),
    }
}

fn run_tools(ctx: &AppContext) -> Result<()> {
    let tools = definitions();
    if ctx.robot_mode {
        return emit_json(&robot_ok(serde_json::json!({
            "tools": tools,
            "count": tools.len()
        })));
    }
    println!("Available MCP Tools:\n");
    for tool in &tools {
        println!("  {} - {}", tool.name, tool.description);
    }
    println!("\n{} tools available.", tools.len());
    Ok(())
}

fn run_stdio_server(tools: &Tools, debug: bool) -> Result<()> {
    if debug {
        eprintln!("[hri-mcp] {SERVER_NAME} v{SERVER_VERSION}, protocol {PROTOCOL_VERSION}");
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(l) => l,
            Err(e) => {
                warn!(error = %e, "stdin read error");
                break;
            }
        };

        if line.trim().is_empty() {
            continue;
        }
        if debug {
            eprintln!("[hri-mcp] <- {line}");
        }

        let Some(response) = handle_request(tools, &line) else {
            continue;
        };
        let response_json = serialize_response_safe(&response);
        if let Err(e) = validate_mcp_json(&response_json) {
            warn!("MCP response validation failed after sanitization: {e}");
        }
        if debug {
            eprintln!("[hri-mcp] -> {response_json}");
        }
        if writeln!(stdout, "{response_json}").is_err() {
            break;
        }
        let _ = stdout.flush();
    }

    debug!("MCP server shutting down");
    Ok(())
}

/// `None` for notifications, which get no response.
fn handle_request(tools: &Tools, line: &str) -> Option<JsonRpcResponse> {
    let request: JsonRpcRequest = match serde_json::from_str(line) {
        Ok(r) => r,
        Err(e) => {
            return Some(JsonRpcResponse::error(
                None,
                PARSE_ERROR,
                format!("Parse error: {e}"),
                None,
            ));
        }
    };

    if request.jsonrpc != "2.0" {
        return Some(JsonRpcResponse::error(
            request.id,
            INVALID_REQUEST,
            "Invalid JSON-RPC version".to_string(),
            None,
        ));
    }

    match request.method.as_str() {
        "initialize" => Some(handle_initialize(request.id)),
        "initialized" | "notifications/initialized" => handle_initialized(request.id),
        "tools/list" => Some(JsonRpcResponse::from_result(
            request.id,
            &ToolsListResult {
                tools: definitions(),
            },
        )),
        "tools/call" => Some(handle_tools_call(tools, request.id, &request.params)),
        "ping" | "shutdown" => Some(JsonRpcResponse::success(request.id, serde_json::json!({}))),
        "resources/list" => Some(JsonRpcResponse::success(
            request.id,
            serde_json::json!({"resources": []}),
        )),
        "resources/templates/list" => Some(JsonRpcResponse::success(
            request.id,
            serde_json::json!({"resourceTemplates": []}),
        )),
        _ if request.id.is_none() => None,
        _ => Some(JsonRpcResponse::error(
            request.id,
            METHOD_NOT_FOUND,
            format!("Method not found: {}", request.method),
            None,
        )),
    }
}

fn handle_initialize(id: Option<Value>) -> JsonRpcResponse {
    JsonRpcResponse::from_result(
        id,
        &InitializeResult {
            protocol_version: PROTOCOL_VERSION.to_string(),
            capabilities: ServerCapabilities {
                tools: ToolsCapability {
                    list_changed: false,
                },
            },
            server_info: ServerInfo {
                name: SERVER_NAME.to_string(),
                version: SERVER_VERSION.to_string(),
            },
        },
    )
}

fn handle_initialized(id: Option<Value>) -> Option<JsonRpcResponse> {
    id.map(|id| JsonRpcResponse::success(Some(id), serde_json::json!({})))
}

/// Tool failures become an `isError` result, never a protocol error.
fn handle_tools_call(tools: &Tools, id: Option<Value>, params: &Value) -> JsonRpcResponse {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return JsonRpcResponse::error(
            id,
            INVALID_PARAMS,
            "Missing required parameter: name".to_string(),
            None,
        );
    };
    let arguments = params
        .get("arguments")
        .cloned()
        .unwrap_or_else(|| serde_json::json!({}));
    debug!(tool = name, "tools/call");

    let result = match tools.call(name, &arguments) {
        Ok(value) => serde_json::to_string_pretty(&value)
            .map_or_else(|e| ToolResult::error(&e.to_string()), |text| ToolResult::text(&text)),
        Err(err) => {
            warn!(tool = name, error = %err, "tool call failed");
            ToolResult::error(&error_payload(&err).to_string())
        }
    };
    JsonRpcResponse::from_result(id, &result)
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use serde_json::json;

    use super::*;
    use crate::search::{HashEmbedder, HybridSearch};
    use crate::storage::{Database, VectorIndex, VectorStore};
    use crate::test_utils::fixtures::alice;

    fn tools() -> Tools {
        let db = Arc::new(Database::open_in_memory().unwrap());
        let vectors = Arc::new(VectorStore::in_memory("t", Arc::new(HashEmbedder::new(128))));
        let candidate = alice();
        db.upsert_candidate(&candidate).unwrap();
        vectors
            .upsert_embedding(
                &candidate.id,
                &candidate.embedding_text(),
                crate::storage::vector::candidate_metadata(&candidate),
            )
            .unwrap();
        let vectors: Arc<dyn VectorIndex> = vectors;
        let search = Arc::new(HybridSearch::new(Arc::clone(&db), vectors));
        Tools::new(search, db)
    }

    fn call(tools: &Tools, request: &Value) -> Value {
        let response = handle_request(tools, &request.to_string()).unwrap();
        serde_json::from_str(&serialize_response_safe(&response)).unwrap()
    }

    #[test]
    fn test_strip_ansi() {
        assert_eq!(strip_ansi("\x1b[1;32mok\x1b[0m"), "ok");
        assert_eq!(strip_ansi("\x1b]0;title\x07text"), "text");
        assert!(!contains_ansi(&sanitize_mcp_output("\x1b[31mred")));
    }

    #[test]
    fn test_initialize() {
        let tools = tools();
        let value = call(&tools, &json!({"jsonrpc": "2.0", "id": 1, "method": "initialize"}));
        assert_eq!(value["result"]["protocolVersion"], PROTOCOL_VERSION);
        assert_eq!(value["result"]["serverInfo"]["name"], "hri");
    }

    #[test]
    fn test_notifications_get_no_response() {
        let tools = tools();
        let line = json!({"jsonrpc": "2.0", "method": "notifications/initialized"}).to_string();
        assert!(handle_request(&tools, &line).is_none());
        let line = json!({"jsonrpc": "2.0", "method": "notifications/cancelled"}).to_string();
        assert!(handle_request(&tools, &line).is_none());
    }

    #[test]
    fn test_handle_initialized_with_id() {
        let response = handle_initialized(Some(json!(42))).unwrap();
        assert!(response.result.is_some());
        assert!(response.error.is_none());
    }

    #[test]
    fn test_tools_list_has_every_tool() {
        let tools = tools();
        let value = call(&tools, &json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"}));
        let names: Vec<&str> = value["result"]["tools"]
            .as_array()
            .unwrap()
            .iter()
            .map(|t| t["name"].as_str().unwrap())
            .collect();
        assert_eq!(names, crate::tools::TOOL_NAMES);
    }

    #[test]
    fn test_tools_call_returns_text_content() {
        let tools = tools();
        let value = call(
            &tools,
            &json!({
                "jsonrpc": "2.0",
                "id": 3,
                "method": "tools/call",
                "params": {
                    "name": "semantic_search_experience_tool",
                    "arguments": {"query": "cloud infrastructure"}
                }
            }),
        );
        assert!(value["result"].get("isError").is_none());
        let text = value["result"]["content"][0]["text"].as_str().unwrap();
        let hits: Value = serde_json::from_str(text).unwrap();
        assert_eq!(hits[0]["name"], "Alice");
    }

    #[test]
    fn test_tool_error_is_result_not_crash() {
        let tools = tools();
        let value = call(
            &tools,
            &json!({
                "jsonrpc": "2.0",
                "id": 4,
                "method": "tools/call",
                "params": {"name": "search_by_education", "arguments": {}}
            }),
        );
        assert_eq!(value["result"]["isError"], true);
        let text = value["result"]["content"][0]["text"].as_str().unwrap();
        let payload: Value = serde_json::from_str(text).unwrap();
        assert_eq!(payload["error"]["kind"], "validation");
    }

    #[test]
    fn test_protocol_errors() {
        let tools = tools();
        let value: Value =
            serde_json::from_str(&serialize_response_safe(&handle_request(&tools, "{").unwrap()))
                .unwrap();
        assert_eq!(value["error"]["code"], PARSE_ERROR);

        let value = call(&tools, &json!({"jsonrpc": "1.0", "id": 5, "method": "ping"}));
        assert_eq!(value["error"]["code"], INVALID_REQUEST);

        let value = call(&tools, &json!({"jsonrpc": "2.0", "id": 6, "method": "nope"}));
        assert_eq!(value["error"]["code"], METHOD_NOT_FOUND);

        let value = call(
            &tools,
            &json!({"jsonrpc": "2.0", "id": 7, "method": "tools/call", "params": {}}),
        );
        assert_eq!(value["error"]["code"], INVALID_PARAMS);
    }
}
