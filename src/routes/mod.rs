pub mod events;
pub mod health_checks;
pub mod rpc;

pub use events::events_handler;
pub use health_checks::*;
pub use rpc::{rpc_handler, RequestError};
