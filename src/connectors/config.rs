use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Downstream action executor connector configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownstreamConfig {
    /// Endpoint receiving the forwarded envelopes (e.g., a workflow webhook URL)
    pub url: String,
    /// HTTP request timeout per attempt, in milliseconds
    pub timeout_ms: u64,
    /// Also try the wrapped envelope when the direct attempt fails without a response
    pub fallback_on_transport_error: bool,
}

impl DownstreamConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }

    /// Upper bound for a whole forward: both attempts plus slack.
    pub fn deadline(&self) -> Duration {
        self.timeout() * 2 + Duration::from_millis(500)
    }
}

impl Default for DownstreamConfig {
    fn default() -> Self {
        Self {
            url: "http://127.0.0.1:8080/".to_string(),
            timeout_ms: 15000,
            fallback_on_transport_error: true,
        }
    }
}
