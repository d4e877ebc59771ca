use crate::configuration::Settings;
use crate::connectors::{ConnectorError, DownstreamConnector};
use serde_json::{json, Map, Value};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tracing::Instrument;

use super::protocol::{
    CallToolParams, InitializeParams, InitializeResult, JsonRpcError, JsonRpcRequest,
    JsonRpcResponse, McpMethod, ServerCapabilities, ServerInfo, ToolListResponse,
    ToolsCapability,
};
use super::registry::ToolRegistry;
use super::session::{HandshakeState, McpSession};

/// Turns one JSON-RPC request into exactly one JSON-RPC response.
///
/// Shared by every HTTP worker; the only mutable state is the advisory
/// handshake progress in [`McpSession`].
pub struct Dispatcher {
    registry: Arc<ToolRegistry>,
    connector: Arc<dyn DownstreamConnector>,
    session: McpSession,
    protocol_version: String,
    server_name: String,
    strict_tool_names: bool,
    deadline: Duration,
}

impl Dispatcher {
    pub fn new(
        registry: Arc<ToolRegistry>,
        connector: Arc<dyn DownstreamConnector>,
        settings: &Settings,
    ) -> Self {
        Self {
            registry,
            connector,
            session: McpSession::new(),
            protocol_version: settings.mcp.protocol_version.clone(),
            server_name: settings.mcp.server_name.clone(),
            strict_tool_names: settings.mcp.strict_tool_names,
            deadline: settings.downstream.deadline(),
        }
    }

    pub fn state(&self) -> HandshakeState {
        self.session.state()
    }

    pub fn session_id(&self) -> &str {
        &self.session.id
    }

    pub async fn handle(&self, req: JsonRpcRequest) -> JsonRpcResponse {
        let started = Instant::now();
        let JsonRpcRequest { id, method, params } = req;

        let outcome = match &method {
            McpMethod::Initialize => Ok(self.handle_initialize(&params)),
            McpMethod::Initialized => Ok(self.handle_initialized()),
            McpMethod::ToolsList => Ok(self.handle_tools_list()),
            McpMethod::ToolsCall => self.handle_tools_call(&params).await,
            McpMethod::Unknown(_) => Err(JsonRpcError::method_not_found()),
        };

        let elapsed_ms = started.elapsed().as_millis() as u64;
        match outcome {
            Ok(result) => {
                tracing::info!(
                    session_id = %self.session.id,
                    method = %method,
                    outcome = "success",
                    state = %self.session.state(),
                    elapsed_ms = elapsed_ms,
                    "JSON-RPC request handled"
                );
                JsonRpcResponse::success(id, result)
            }
            Err(error) => {
                tracing::info!(
                    session_id = %self.session.id,
                    method = %method,
                    outcome = "error",
                    code = error.code,
                    error = %error.message,
                    state = %self.session.state(),
                    elapsed_ms = elapsed_ms,
                    "JSON-RPC request handled"
                );
                JsonRpcResponse::error(id, error)
            }
        }
    }

    /// Handle MCP initialize method
    fn handle_initialize(&self, params: &Map<String, Value>) -> Value {
        // Clients that send nothing or something odd still get the handshake
        match serde_json::from_value::<InitializeParams>(Value::Object(params.clone())) {
            Ok(params) => tracing::info!(
                session_id = %self.session.id,
                "MCP client initialized: protocol_version={}, client={}",
                params.protocol_version.as_deref().unwrap_or("unspecified"),
                params
                    .client_info
                    .as_ref()
                    .map(|c| c.name.as_str())
                    .unwrap_or("unknown")
            ),
            Err(err) => tracing::debug!(
                session_id = %self.session.id,
                "Unreadable initialize params: {}",
                err
            ),
        }

        self.session.mark_handshaken();

        let result = InitializeResult {
            protocol_version: self.protocol_version.clone(),
            capabilities: ServerCapabilities {
                tools: Some(ToolsCapability {
                    list_changed: Some(false),
                }),
            },
            server_info: ServerInfo {
                name: self.server_name.clone(),
                version: env!("CARGO_PKG_VERSION").to_string(),
            },
        };

        serde_json::to_value(result).unwrap_or_else(|_| json!({}))
    }

    fn handle_initialized(&self) -> Value {
        self.session.mark_ready();
        json!({ "ok": true })
    }

    /// Handle tools/list method
    fn handle_tools_list(&self) -> Value {
        let tools = self.registry.list_tools();

        tracing::debug!("Listing {} available tools", tools.len());

        serde_json::to_value(ToolListResponse { tools })
            .unwrap_or_else(|_| json!({ "tools": [] }))
    }

    /// Handle tools/call method
    async fn handle_tools_call(
        &self,
        params: &Map<String, Value>,
    ) -> Result<Value, JsonRpcError> {
        let call = CallToolParams::from_params(params)?;

        if self.strict_tool_names && !self.registry.has_tool(&call.name) {
            tracing::warn!("Tool not found: {}", call.name);
            return Err(JsonRpcError::invalid_params(&format!(
                "Unknown tool: {}",
                call.name
            )));
        }

        let tool_span = tracing::info_span!("mcp_tool_call", tool = %call.name);

        let forwarded = tokio::time::timeout(
            self.deadline,
            self.connector.forward(&call.name, &call.arguments),
        )
        .instrument(tool_span)
        .await
        .unwrap_or_else(|_| {
            Err(ConnectorError::Timeout(
                "Downstream deadline exceeded".to_string(),
            ))
        });

        forwarded.map_err(|err| {
            tracing::error!(tool = %call.name, "Tool call failed: {}", err);
            err.to_rpc_error()
        })
    }
}
