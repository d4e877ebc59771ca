use crate::connectors::DownstreamConfig;
use crate::mcp::Tool;

const DEFAULT_CONFIG_FILE: &str = "configuration";

#[derive(Debug, Clone, serde::Deserialize)]
pub struct Settings {
    pub app_host: String,
    pub app_port: u16,
    pub downstream: DownstreamConfig,
    pub sse: SseSettings,
    pub mcp: McpSettings,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct SseSettings {
    pub ping_interval_ms: u64,
    /// Frames buffered per client before a write counts as failed
    pub channel_capacity: usize,
}

#[derive(Debug, Clone, serde::Deserialize)]
pub struct McpSettings {
    pub server_name: String,
    pub protocol_version: String,
    /// Reject tools/call for names missing from the registry
    pub strict_tool_names: bool,
    /// Replaces the built-in tool catalog when present
    #[serde(default)]
    pub tools: Option<Vec<Tool>>,
}

#[derive(Debug, thiserror::Error)]
pub enum ConfigurationError {
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

impl SseSettings {
    pub fn ping_interval(&self) -> std::time::Duration {
        std::time::Duration::from_millis(self.ping_interval_ms)
    }
}

impl Settings {
    pub fn address(&self) -> String {
        format!("{}:{}", self.app_host, self.app_port)
    }

    /// Reject values the server cannot start with.
    pub fn validate(&self) -> Result<(), ConfigurationError> {
        let url = reqwest::Url::parse(&self.downstream.url).map_err(|err| {
            ConfigurationError::Invalid(format!(
                "downstream.url {:?} is not a valid URL: {}",
                self.downstream.url, err
            ))
        })?;
        if url.scheme() != "http" && url.scheme() != "https" {
            return Err(ConfigurationError::Invalid(format!(
                "downstream.url must use http or https, got {}",
                url.scheme()
            )));
        }
        if self.downstream.timeout_ms == 0 {
            return Err(ConfigurationError::Invalid(
                "downstream.timeout_ms must be greater than zero".to_string(),
            ));
        }
        if self.sse.ping_interval_ms == 0 {
            return Err(ConfigurationError::Invalid(
                "sse.ping_interval_ms must be greater than zero".to_string(),
            ));
        }
        if self.sse.channel_capacity == 0 {
            return Err(ConfigurationError::Invalid(
                "sse.channel_capacity must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

fn builder_with_defaults(
) -> Result<config::ConfigBuilder<config::builder::DefaultState>, config::ConfigError> {
    config::Config::builder()
        .set_default("app_host", "0.0.0.0")?
        .set_default("app_port", 3000_i64)?
        .set_default("downstream.url", "http://127.0.0.1:8080/")?
        .set_default("downstream.timeout_ms", 15000_i64)?
        .set_default("downstream.fallback_on_transport_error", true)?
        .set_default("sse.ping_interval_ms", 15000_i64)?
        .set_default("sse.channel_capacity", 16_i64)?
        .set_default("mcp.server_name", "mcp-bridge")?
        .set_default("mcp.protocol_version", "2024-11-05")?
        .set_default("mcp.strict_tool_names", false)
}

pub fn get_configuration() -> Result<Settings, ConfigurationError> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let file_name =
        std::env::var("APP_CONFIG").unwrap_or_else(|_| DEFAULT_CONFIG_FILE.to_string());

    let mut builder = builder_with_defaults()?
        // .json, .toml, .yaml, .yml
        .add_source(config::File::with_name(&file_name).required(false));

    // Deployment platforms hand these out directly
    if let Ok(port) = std::env::var("PORT") {
        builder = builder.set_override("app_port", port)?;
    }
    if let Ok(url) = std::env::var("DOWNSTREAM_URL") {
        builder = builder.set_override("downstream.url", url)?;
    }

    let settings: Settings = builder.build()?.try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}

/// Settings built from defaults only, pointed at `downstream_url`.
pub fn default_settings(downstream_url: &str) -> Result<Settings, ConfigurationError> {
    let settings: Settings = builder_with_defaults()?
        .set_override("downstream.url", downstream_url)?
        .build()?
        .try_deserialize()?;
    settings.validate()?;

    Ok(settings)
}
