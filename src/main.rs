use anyhow::Context;
use mcp_bridge::configuration::get_configuration;
use mcp_bridge::startup::run;
use mcp_bridge::telemetry::{get_subscriber, init_subscriber};
use std::net::TcpListener;

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    let subscriber = get_subscriber("mcp-bridge".into(), "info".into(), std::io::stdout);
    init_subscriber(subscriber)?;

    let settings = get_configuration().context("Failed to read configuration.")?;

    tracing::info!(
        downstream = %settings.downstream.url,
        port = settings.app_port,
        "Starting MCP bridge"
    );

    let address = settings.address();
    let listener =
        TcpListener::bind(&address).with_context(|| format!("failed to bind to {}", address))?;
    tracing::info!("Start server at {:?}", &address);

    run(listener, settings)?.await?;
    Ok(())
}
