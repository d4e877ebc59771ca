//! Downstream executor connector
//!
//! Forwards `(method, params)` to the operator-configured endpoint. The
//! endpoint may expect either envelope shape, so the client tries the direct
//! shape first and the wrapped shape once when that fails.

use super::config::DownstreamConfig;
use super::errors::ConnectorError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::fmt;
use std::sync::Arc;

pub mod client;
#[cfg(test)]
pub mod mock;

pub use client::DownstreamClient;
#[cfg(test)]
pub use mock::MockDownstreamConnector;

#[async_trait]
pub trait DownstreamConnector: Send + Sync {
    /// Deliver one call and return the normalized result body
    async fn forward(
        &self,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ConnectorError>;
}

/// Payload layouts accepted by different downstream configurations
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EnvelopeShape {
    /// `{method, params}`
    Direct,
    /// `{event: {body: {method, params}}}`
    Wrapped,
}

impl EnvelopeShape {
    pub fn build(self, method: &str, params: &Map<String, Value>) -> Value {
        let call = json!({ "method": method, "params": params });
        match self {
            Self::Direct => call,
            Self::Wrapped => json!({ "event": { "body": call } }),
        }
    }
}

impl fmt::Display for EnvelopeShape {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Direct => f.write_str("direct"),
            Self::Wrapped => f.write_str("wrapped"),
        }
    }
}

/// Strip a `body` wrapper added by the executor; `null` becomes `{ok: true}`.
pub fn normalize_body(body: Value) -> Value {
    let body = match body {
        Value::Object(mut object) => match object.remove("body") {
            Some(inner) if !inner.is_null() => inner,
            Some(inner) => {
                object.insert("body".to_string(), inner);
                Value::Object(object)
            }
            None => Value::Object(object),
        },
        other => other,
    };

    if body.is_null() {
        json!({ "ok": true })
    } else {
        body
    }
}

pub fn init(
    config: &DownstreamConfig,
) -> Result<Arc<dyn DownstreamConnector>, ConnectorError> {
    let client = DownstreamClient::new(config.clone())?;
    tracing::info!(
        url = %config.url,
        timeout_ms = config.timeout_ms,
        fallback_on_transport_error = config.fallback_on_transport_error,
        "Downstream connector initialized"
    );
    Ok(Arc::new(client))
}
