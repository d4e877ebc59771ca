pub mod dispatcher;
pub mod protocol;
pub mod registry;
pub mod session;
pub mod sse;

pub use dispatcher::Dispatcher;
pub use protocol::*;
pub use registry::{DuplicateTool, ToolRegistry};
pub use session::{HandshakeState, McpSession};
pub use sse::{
    connected_frame, ping_frame, sse_frame, Broadcast, BroadcastReport, ClientCount,
    ClientHandle, Connect, Disconnect, SseBroadcaster, SseClientStream,
};
