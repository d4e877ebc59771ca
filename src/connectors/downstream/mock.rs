use super::DownstreamConnector;
use crate::connectors::errors::ConnectorError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use std::sync::Mutex;

/// Records every forwarded call and answers with a canned outcome
pub struct MockDownstreamConnector {
    outcome: Result<Value, ConnectorError>,
    calls: Mutex<Vec<(String, Map<String, Value>)>>,
}

impl MockDownstreamConnector {
    pub fn returning(result: Value) -> Self {
        Self {
            outcome: Ok(result),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn failing(err: ConnectorError) -> Self {
        Self {
            outcome: Err(err),
            calls: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> Vec<(String, Map<String, Value>)> {
        self.calls.lock().map(|calls| calls.clone()).unwrap_or_default()
    }
}

impl Default for MockDownstreamConnector {
    fn default() -> Self {
        Self::returning(json!({ "ok": true }))
    }
}

#[async_trait]
impl DownstreamConnector for MockDownstreamConnector {
    async fn forward(
        &self,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ConnectorError> {
        if let Ok(mut calls) = self.calls.lock() {
            calls.push((method.to_string(), params.clone()));
        }
        self.outcome.clone()
    }
}
