//! MCP Server implementation
//!
//! Transport-independent JSON-RPC dispatch plus the stdio transport.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};

use crate::error::{McpDemoError, McpError, Result};
use crate::mcp::tools::ToolHandler;
use crate::mcp::types::*;

const SERVER_VERSION: &str = env!("CARGO_PKG_VERSION");

/// MCP server dispatching to a tool handler
pub struct McpServer<H: ToolHandler> {
    /// Tool handler
    tool_handler: Arc<H>,

    /// Set once a client sent `notifications/initialized`. Process-wide, so
    /// it only describes the single stdio client; HTTP sessions carry their
    /// own flag.
    initialized: AtomicBool,
}

impl<H: ToolHandler> McpServer<H> {
    /// Create a new MCP server
    pub fn new(tool_handler: H) -> Self {
        Self {
            tool_handler: Arc::new(tool_handler),
            initialized: AtomicBool::new(false),
        }
    }

    pub fn name(&self) -> &str {
        self.tool_handler.server_name()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized.load(Ordering::Relaxed)
    }

    /// Run the server on stdio, one JSON-RPC message per line
    pub async fn run_stdio(&self) -> Result<()> {
        let mut lines = BufReader::new(tokio::io::stdin()).lines();
        let mut stdout = tokio::io::stdout();

        tracing::info!(server = self.name(), "Serving MCP over stdio");

        while let Some(line) = lines.next_line().await? {
            if line.trim().is_empty() {
                continue;
            }

            if let Some(response) = self.handle_message(&line).await {
                let mut payload = serde_json::to_string(&response)?;
                payload.push('\n');
                stdout.write_all(payload.as_bytes()).await?;
                stdout.flush().await?;
            }
        }

        tracing::info!("stdin closed, stopping");
        Ok(())
    }

    /// Handle one raw JSON-RPC message. `None` for notifications.
    pub async fn handle_message(&self, message: &str) -> Option<JsonRpcResponse> {
        match serde_json::from_str::<JsonRpcRequest>(message) {
            Ok(request) => self.handle_request(request).await,
            Err(e) => {
                tracing::warn!("Unreadable JSON-RPC message: {}", e);
                Some(JsonRpcResponse::error(None, JsonRpcError::parse_error(e.to_string())))
            }
        }
    }

    /// Handle a parsed JSON-RPC request. `None` for notifications.
    pub async fn handle_request(&self, request: JsonRpcRequest) -> Option<JsonRpcResponse> {
        if request.is_notification() {
            if request.method == methods::INITIALIZED {
                self.initialized.store(true, Ordering::Relaxed);
                tracing::debug!("Client initialized");
            } else {
                tracing::debug!(method = %request.method, "Ignoring notification");
            }
            return None;
        }

        tracing::debug!(method = %request.method, "Handling request");

        let id = request.id.clone();
        let outcome = match request.method.as_str() {
            methods::INITIALIZE => self.handle_initialize(request.params),
            methods::PING => Ok(serde_json::json!({})),
            methods::LIST_TOOLS => self.handle_list_tools(),
            methods::CALL_TOOL => self.handle_call_tool(request.params).await,
            other => Err(JsonRpcError::method_not_found(other)),
        };

        Some(match outcome {
            Ok(result) => JsonRpcResponse::success(id, result),
            Err(error) => JsonRpcResponse::error(id, error),
        })
    }

    fn handle_initialize(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let requested = params
            .map(serde_json::from_value::<InitializeParams>)
            .transpose()
            .map_err(|e| JsonRpcError::invalid_params(e.to_string()))?;

        if let Some(client) = requested.as_ref().and_then(|p| p.client_info.as_ref()) {
            tracing::info!(client = %client.name, version = %client.version, "Client connected");
        }

        let result = InitializeResult {
            protocol_version: negotiate_version(
                requested.as_ref().map(|p| p.protocol_version.as_str()),
            )
            .to_string(),
            server_info: ServerInfo {
                name: self.name().to_string(),
                version: SERVER_VERSION.to_string(),
            },
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability::default()),
            },
        };

        to_result(&result)
    }

    fn handle_list_tools(&self) -> std::result::Result<Value, JsonRpcError> {
        to_result(&ListToolsResult {
            tools: self.tool_handler.list_tools(),
        })
    }

    async fn handle_call_tool(&self, params: Option<Value>) -> std::result::Result<Value, JsonRpcError> {
        let params: CallToolParams = params
            .ok_or_else(|| JsonRpcError::invalid_params("Missing tool parameters"))
            .and_then(|p| {
                serde_json::from_value(p)
                    .map_err(|e| JsonRpcError::invalid_params(format!("Invalid tool parameters: {}", e)))
            })?;

        tracing::info!(tool = %params.name, "Calling tool");

        match self.tool_handler.call_tool(&params.name, params.arguments).await {
            Ok(result) => to_result(&result),
            Err(McpDemoError::Mcp(e @ McpError::UnknownTool { .. })) => {
                tracing::warn!("{}", e);
                Err(JsonRpcError::invalid_params(e.to_string()))
            }
            Err(e) => {
                tracing::error!(tool = %params.name, "Tool call failed: {}", e);
                Err(JsonRpcError::internal_error(e.to_string()))
            }
        }
    }
}

fn to_result<T: serde::Serialize>(value: &T) -> std::result::Result<Value, JsonRpcError> {
    serde_json::to_value(value).map_err(|e| JsonRpcError::internal_error(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mcp::tools::DatasetTools;
    use serde_json::json;

    fn server() -> McpServer<DatasetTools> {
        McpServer::new(DatasetTools::new())
    }

    fn call(server: &McpServer<DatasetTools>, message: Value) -> Option<JsonRpcResponse> {
        tokio_test::block_on(server.handle_message(&message.to_string()))
    }

    #[test]
    fn test_initialize() {
        let server = server();
        let resp = call(
            &server,
            json!({"jsonrpc": "2.0", "id": 1, "method": "initialize",
                   "params": {"protocolVersion": "2024-11-05", "capabilities": {},
                              "clientInfo": {"name": "test", "version": "0"}}}),
        )
        .unwrap();

        let result = resp.result.unwrap();
        assert_eq!(result["protocolVersion"], "2024-11-05");
        assert_eq!(result["serverInfo"]["name"], "dataset-analyzer");
        assert!(result["capabilities"]["tools"].is_object());
    }

    #[test]
    fn test_initialized_notification() {
        let server = server();
        assert!(!server.is_initialized());

        let resp = call(&server, json!({"jsonrpc": "2.0", "method": "notifications/initialized"}));
        assert!(resp.is_none());
        assert!(server.is_initialized());
    }

    #[test]
    fn test_parse_error() {
        let resp = tokio_test::block_on(server().handle_message("{not json")).unwrap();
        assert_eq!(resp.error.unwrap().code, -32700);
        assert!(resp.id.is_none());
    }

    #[test]
    fn test_unknown_method() {
        let resp = call(&server(), json!({"jsonrpc": "2.0", "id": "a", "method": "resources/list"})).unwrap();
        assert_eq!(resp.error.unwrap().code, -32601);
        assert_eq!(resp.id, Some(RequestId::String("a".into())));
    }

    #[test]
    fn test_list_tools() {
        let resp = call(&server(), json!({"jsonrpc": "2.0", "id": 2, "method": "tools/list"})).unwrap();
        let tools = &resp.result.unwrap()["tools"];
        assert_eq!(tools.as_array().unwrap().len(), 1);
        assert_eq!(tools[0]["name"], "analyze_dataset");
        assert!(tools[0]["inputSchema"]["properties"]["csv_data"].is_object());
    }

    #[test]
    fn test_unknown_tool_is_invalid_params() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 3, "method": "tools/call",
                   "params": {"name": "drop_table", "arguments": {}}}),
        )
        .unwrap();

        let error = resp.error.unwrap();
        assert_eq!(error.code, -32602);
        assert_eq!(error.message, "Unknown tool: drop_table");
    }

    #[test]
    fn test_call_tool_empty_dataset() {
        let resp = call(
            &server(),
            json!({"jsonrpc": "2.0", "id": 4, "method": "tools/call",
                   "params": {"name": "analyze_dataset", "arguments": {"csv_data": ""}}}),
        )
        .unwrap();

        let result = resp.result.unwrap();
        assert_eq!(
            result["content"][0]["text"],
            "The provided dataset is empty or contains no valid data."
        );
    }
}
