use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::fmt;

pub const JSONRPC_VERSION: &str = "2.0";

/// Methods the bridge understands. Anything else lands in `Unknown`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum McpMethod {
    Initialize,
    Initialized,
    ToolsList,
    ToolsCall,
    Unknown(String),
}

impl McpMethod {
    /// A non-string method (null, number, object) is kept as its JSON text.
    pub fn from_value(value: &Value) -> Self {
        match value {
            Value::String(name) => Self::from(name.as_str()),
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Self::Initialize => "initialize",
            Self::Initialized => "notifications/initialized",
            Self::ToolsList => "tools/list",
            Self::ToolsCall => "tools/call",
            Self::Unknown(name) => name.as_str(),
        }
    }
}

impl From<&str> for McpMethod {
    fn from(name: &str) -> Self {
        match name {
            "initialize" => Self::Initialize,
            "notifications/initialized" => Self::Initialized,
            "tools/list" => Self::ToolsList,
            "tools/call" => Self::ToolsCall,
            other => Self::Unknown(other.to_string()),
        }
    }
}

impl From<String> for McpMethod {
    fn from(name: String) -> Self {
        Self::from(name.as_str())
    }
}

impl fmt::Display for McpMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Why an inbound body could not become a [`JsonRpcRequest`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MalformedRequest {
    NotAnObject,
    MissingMethod,
}

impl fmt::Display for MalformedRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NotAnObject => f.write_str("Request body must be a JSON object"),
            Self::MissingMethod => f.write_str("Missing method"),
        }
    }
}

/// JSON-RPC 2.0 Request structure
///
/// The `jsonrpc` marker is not enforced; clients in the wild omit it.
#[derive(Debug, Clone, PartialEq)]
pub struct JsonRpcRequest {
    /// `None` when the field is absent, `Some(Value::Null)` for an explicit null
    pub id: Option<Value>,
    pub method: McpMethod,
    pub params: Map<String, Value>,
}

impl JsonRpcRequest {
    pub fn new(id: Option<Value>, method: impl Into<McpMethod>, params: Value) -> Self {
        let params = match params {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self {
            id,
            method: method.into(),
            params,
        }
    }

    /// Non-object `params` are treated as empty.
    pub fn from_value(value: Value) -> Result<Self, MalformedRequest> {
        let mut object = match value {
            Value::Object(object) => object,
            _ => return Err(MalformedRequest::NotAnObject),
        };

        let method = object
            .get("method")
            .map(McpMethod::from_value)
            .ok_or(MalformedRequest::MissingMethod)?;
        let id = object.remove("id");
        let params = match object.remove("params") {
            Some(Value::Object(params)) => params,
            _ => Map::new(),
        };

        Ok(Self { id, method, params })
    }
}

/// JSON-RPC 2.0 Response structure
///
/// Built only through [`JsonRpcResponse::success`] and [`JsonRpcResponse::error`],
/// so exactly one of `result` / `error` is set.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcResponse {
    pub jsonrpc: String, // Must be "2.0"
    #[serde(skip_serializing_if = "Option::is_none")]
    pub id: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<Value>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<JsonRpcError>,
}

impl JsonRpcResponse {
    pub fn success(id: Option<Value>, result: Value) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: Some(result),
            error: None,
        }
    }

    pub fn error(id: Option<Value>, error: JsonRpcError) -> Self {
        Self {
            jsonrpc: JSONRPC_VERSION.to_string(),
            id,
            result: None,
            error: Some(error),
        }
    }

    pub fn is_error(&self) -> bool {
        self.error.is_some()
    }
}

/// JSON-RPC 2.0 Error structure
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JsonRpcError {
    pub code: i32,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<Value>,
}

impl JsonRpcError {
    pub const METHOD_NOT_FOUND: i32 = -32601;
    pub const INVALID_PARAMS: i32 = -32602;
    pub const SERVER_ERROR: i32 = -32000;

    pub fn method_not_found() -> Self {
        Self {
            code: Self::METHOD_NOT_FOUND,
            message: "Method not found".to_string(),
            data: None,
        }
    }

    pub fn invalid_params(msg: &str) -> Self {
        Self {
            code: Self::INVALID_PARAMS,
            message: "Invalid params".to_string(),
            data: Some(serde_json::json!({ "error": msg })),
        }
    }

    /// Downstream failures surface under the implementation-defined server error code.
    pub fn server_error(message: String, data: Option<Value>) -> Self {
        Self {
            code: Self::SERVER_ERROR,
            message,
            data,
        }
    }
}

// MCP-specific types

/// MCP Tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Tool {
    pub name: String,
    pub description: String,
    #[serde(rename = "inputSchema", alias = "input_schema")]
    pub input_schema: Value, // JSON Schema for parameters
}

/// Response for tools/list method
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolListResponse {
    pub tools: Vec<Tool>,
}

/// Validated `tools/call` parameters
#[derive(Debug, Clone, PartialEq)]
pub struct CallToolParams {
    pub name: String,
    pub arguments: Map<String, Value>,
}

impl CallToolParams {
    /// `name` must be a non-empty string and `arguments` an object.
    pub fn from_params(params: &Map<String, Value>) -> Result<Self, JsonRpcError> {
        let name = match params.get("name") {
            Some(Value::String(name)) if !name.is_empty() => name.clone(),
            Some(_) => return Err(JsonRpcError::invalid_params("params.name must be a non-empty string")),
            None => return Err(JsonRpcError::invalid_params("Missing params.name")),
        };
        let arguments = match params.get("arguments") {
            Some(Value::Object(arguments)) => arguments.clone(),
            Some(_) => {
                return Err(JsonRpcError::invalid_params(
                    "params.arguments must be an object",
                ))
            }
            None => return Err(JsonRpcError::invalid_params("Missing params.arguments")),
        };

        Ok(Self { name, arguments })
    }
}

/// MCP Initialize request parameters
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeParams {
    #[serde(rename = "protocolVersion", default)]
    pub protocol_version: Option<String>,
    #[serde(default)]
    pub capabilities: Option<Value>,
    #[serde(rename = "clientInfo", skip_serializing_if = "Option::is_none")]
    pub client_info: Option<ClientInfo>,
}

/// Client information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ClientInfo {
    pub name: String,
    #[serde(default)]
    pub version: Option<String>,
}

/// MCP Initialize response
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct InitializeResult {
    #[serde(rename = "protocolVersion")]
    pub protocol_version: String,
    pub capabilities: ServerCapabilities,
    #[serde(rename = "serverInfo")]
    pub server_info: ServerInfo,
}

/// Server capabilities
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerCapabilities {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub tools: Option<ToolsCapability>,
}

/// Tools capability
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolsCapability {
    #[serde(rename = "listChanged", skip_serializing_if = "Option::is_none")]
    pub list_changed: Option<bool>,
}

/// Server information
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerInfo {
    pub name: String,
    pub version: String,
}
