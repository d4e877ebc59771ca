//! External Service Connectors
//!
//! The bridge talks to exactly one external service, the downstream action
//! executor. Routes and the dispatcher only see the [`DownstreamConnector`]
//! trait, so tests swap in a recording mock or point the HTTP client at a
//! local stub server.
//!
//! ## Testing
//!
//! ```ignore
//! #[cfg(test)]
//! mod tests {
//!     use connectors::downstream::MockDownstreamConnector;
//!
//!     #[tokio::test]
//!     async fn test_dispatch_without_http() {
//!         let connector = Arc::new(MockDownstreamConnector::default());
//!         // Drive the dispatcher, then inspect connector.calls()
//!     }
//! }
//! ```

pub mod config;
pub mod downstream;
pub mod errors;

pub use config::DownstreamConfig;
pub use downstream::{DownstreamClient, DownstreamConnector, EnvelopeShape};
pub use errors::ConnectorError;

pub use downstream::init as init_downstream;
