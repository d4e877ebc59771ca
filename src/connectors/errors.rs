use crate::mcp::JsonRpcError;
use serde_json::{json, Value};

/// Errors that can occur while talking to the downstream executor
#[derive(Debug, Clone, thiserror::Error)]
pub enum ConnectorError {
    /// Connection refused, DNS failure or another I/O level problem
    #[error("Downstream unreachable: {0}")]
    Transport(String),
    /// No response within the per-attempt timeout or the overall deadline
    #[error("Downstream timeout: {0}")]
    Timeout(String),
    /// A response arrived with status >= 400
    #[error("Downstream returned HTTP {status}")]
    Status { status: u16, body: Value },
    /// Internal error in connector
    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConnectorError {
    /// Whether a response was received at all.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Timeout(_))
    }

    pub fn to_rpc_error(&self) -> JsonRpcError {
        let data = match self {
            Self::Status { status, body } => Some(json!({ "status": status, "body": body })),
            _ => None,
        };
        JsonRpcError::server_error(self.to_string(), data)
    }
}

impl From<reqwest::Error> for ConnectorError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            Self::Timeout(format!("Request timeout: {}", err))
        } else if err.is_connect() {
            Self::Transport(format!("Connection failed: {}", err))
        } else if err.is_builder() {
            Self::Internal(err.to_string())
        } else {
            Self::Transport(err.to_string())
        }
    }
}
