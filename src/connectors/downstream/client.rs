use super::{normalize_body, DownstreamConnector, EnvelopeShape};
use crate::connectors::config::DownstreamConfig;
use crate::connectors::errors::ConnectorError;
use async_trait::async_trait;
use serde_json::{json, Map, Value};
use tracing::Instrument;

/// Raw outcome of one POST; non-2xx statuses are not errors at this level.
#[derive(Debug, Clone, PartialEq)]
pub struct DownstreamResponse {
    pub status: u16,
    pub body: Value,
}

impl DownstreamResponse {
    pub fn is_failure(&self) -> bool {
        self.status >= 400
    }
}

/// HTTP-based downstream client
pub struct DownstreamClient {
    pub(crate) url: String,
    pub(crate) http_client: reqwest::Client,
    pub(crate) fallback_on_transport_error: bool,
}

impl DownstreamClient {
    pub fn new(config: DownstreamConfig) -> Result<Self, ConnectorError> {
        let http_client = reqwest::Client::builder()
            .timeout(config.timeout())
            .build()
            .map_err(|err| {
                ConnectorError::Internal(format!("Failed to create HTTP client: {}", err))
            })?;

        Ok(Self {
            url: config.url,
            http_client,
            fallback_on_transport_error: config.fallback_on_transport_error,
        })
    }

    /// One POST with the given shape. Bodies that are not JSON, or that cannot
    /// be read to the end, decode to `{}`.
    pub async fn attempt(
        &self,
        shape: EnvelopeShape,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<DownstreamResponse, ConnectorError> {
        let span = tracing::debug_span!("downstream_attempt", shape = %shape, method = %method);
        let envelope = shape.build(method, params);

        let resp = self
            .http_client
            .post(&self.url)
            .json(&envelope)
            .send()
            .instrument(span.clone())
            .await
            .map_err(|err| {
                tracing::debug!(shape = %shape, error = %err, "Downstream request failed");
                ConnectorError::from(err)
            })?;

        let status = resp.status().as_u16();
        // A status arrived, so the attempt counts even when the body breaks off
        let text = resp.text().instrument(span).await.unwrap_or_else(|err| {
            tracing::warn!(shape = %shape, status = status, error = %err, "Downstream body unreadable");
            String::new()
        });
        let body = serde_json::from_str::<Value>(&text).unwrap_or_else(|_| json!({}));

        tracing::debug!(shape = %shape, status = status, "Downstream responded");
        Ok(DownstreamResponse { status, body })
    }
}

#[async_trait]
impl DownstreamConnector for DownstreamClient {
    #[tracing::instrument(name = "Forward to downstream", skip(self, params))]
    async fn forward(
        &self,
        method: &str,
        params: &Map<String, Value>,
    ) -> Result<Value, ConnectorError> {
        match self.attempt(EnvelopeShape::Direct, method, params).await {
            Ok(resp) if !resp.is_failure() => return Ok(normalize_body(resp.body)),
            Ok(resp) => {
                tracing::warn!(
                    status = resp.status,
                    "Direct envelope rejected, retrying with wrapped envelope"
                );
            }
            Err(err) if err.is_transport() && self.fallback_on_transport_error => {
                tracing::warn!(
                    error = %err,
                    "Direct envelope got no response, retrying with wrapped envelope"
                );
            }
            Err(err) => return Err(err),
        }

        let resp = self.attempt(EnvelopeShape::Wrapped, method, params).await?;
        if resp.is_failure() {
            tracing::error!(status = resp.status, "Wrapped envelope rejected by downstream");
            return Err(ConnectorError::Status {
                status: resp.status,
                body: resp.body,
            });
        }

        Ok(normalize_body(resp.body))
    }
}
