pub mod configuration;
pub mod connectors;
pub mod mcp;
pub mod routes;
pub mod startup;
pub mod telemetry;
