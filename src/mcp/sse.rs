use actix::{Actor, AsyncContext, Context, Handler, Message, MessageResult};
use actix_web::web::Bytes;
use futures::Stream;
use serde_json::{json, Value};
use std::collections::HashMap;
use std::convert::Infallible;
use std::pin::Pin;
use std::task::Poll;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use uuid::Uuid;

/// Format one SSE frame. `event` is omitted for plain data frames.
pub fn sse_frame(event: Option<&str>, data: &Value) -> Bytes {
    let data = serde_json::to_string(data).unwrap_or_else(|_| "{}".to_string());
    match event {
        Some(event) => Bytes::from(format!("event: {}\ndata: {}\n\n", event, data)),
        None => Bytes::from(format!("data: {}\n\n", data)),
    }
}

pub fn connected_frame() -> Bytes {
    sse_frame(None, &json!({ "jsonrpc": "2.0", "id": 1, "result": "connected" }))
}

pub fn ping_frame() -> Bytes {
    sse_frame(None, &json!({ "jsonrpc": "2.0", "id": 0, "method": "ping" }))
}

/// Owns the table of open event streams.
///
/// Every insert, removal and broadcast happens inside this actor, so the
/// timer never sees a client that is halfway through disconnecting.
pub struct SseBroadcaster {
    clients: HashMap<Uuid, mpsc::Sender<Bytes>>,
    ping_interval: Duration,
    channel_capacity: usize,
}

impl SseBroadcaster {
    pub fn new(ping_interval: Duration, channel_capacity: usize) -> Self {
        Self {
            clients: HashMap::new(),
            ping_interval,
            channel_capacity: channel_capacity.max(1),
        }
    }

    /// Write `frame` to every client; a closed or stalled client is dropped.
    fn broadcast(&mut self, frame: &Bytes) -> BroadcastReport {
        let mut report = BroadcastReport::default();

        self.clients.retain(|id, sink| match sink.try_send(frame.clone()) {
            Ok(()) => {
                report.delivered += 1;
                true
            }
            Err(TrySendError::Closed(_)) => {
                tracing::info!(client_id = %id, "SSE client gone, deregistering");
                report.dropped += 1;
                false
            }
            Err(TrySendError::Full(_)) => {
                tracing::warn!(client_id = %id, "SSE client not reading, deregistering");
                report.dropped += 1;
                false
            }
        });

        report
    }
}

impl Actor for SseBroadcaster {
    type Context = Context<Self>;

    fn started(&mut self, ctx: &mut Self::Context) {
        tracing::info!(
            interval_ms = self.ping_interval.as_millis() as u64,
            "SSE broadcaster started"
        );
        ctx.run_interval(self.ping_interval, |act, _ctx| {
            let report = act.broadcast(&ping_frame());
            tracing::debug!(
                delivered = report.delivered,
                dropped = report.dropped,
                "SSE keep-alive tick"
            );
        });
    }

    fn stopped(&mut self, _ctx: &mut Self::Context) {
        tracing::info!(clients = self.clients.len(), "SSE broadcaster stopped");
    }
}

/// Register a new stream; the connected frame is already queued on return
#[derive(Message)]
#[rtype(result = "ClientHandle")]
pub struct Connect;

#[derive(Message)]
#[rtype(result = "()")]
pub struct Disconnect {
    pub id: Uuid,
}

/// Push a frame to all clients outside the timer
#[derive(Message)]
#[rtype(result = "BroadcastReport")]
pub struct Broadcast(pub Bytes);

#[derive(Message)]
#[rtype(result = "usize")]
pub struct ClientCount;

#[derive(Debug, Default, Clone, Copy, PartialEq, Eq)]
pub struct BroadcastReport {
    pub delivered: usize,
    pub dropped: usize,
}

/// Receiving half of one registered client
#[derive(Debug)]
pub struct ClientHandle {
    pub id: Uuid,
    pub frames: mpsc::Receiver<Bytes>,
}

impl Handler<Connect> for SseBroadcaster {
    type Result = MessageResult<Connect>;

    fn handle(&mut self, _msg: Connect, _ctx: &mut Self::Context) -> Self::Result {
        let (sink, frames) = mpsc::channel(self.channel_capacity);
        let mut id = Uuid::new_v4();
        while self.clients.contains_key(&id) {
            id = Uuid::new_v4();
        }

        if let Err(err) = sink.try_send(connected_frame()) {
            tracing::warn!(client_id = %id, "Connected frame not queued: {}", err);
        }
        self.clients.insert(id, sink);

        tracing::info!(client_id = %id, clients = self.clients.len(), "SSE client connected");
        MessageResult(ClientHandle { id, frames })
    }
}

impl Handler<Disconnect> for SseBroadcaster {
    type Result = ();

    fn handle(&mut self, msg: Disconnect, _ctx: &mut Self::Context) {
        if self.clients.remove(&msg.id).is_some() {
            tracing::info!(
                client_id = %msg.id,
                clients = self.clients.len(),
                "SSE client disconnected"
            );
        }
    }
}

impl Handler<Broadcast> for SseBroadcaster {
    type Result = MessageResult<Broadcast>;

    fn handle(&mut self, msg: Broadcast, _ctx: &mut Self::Context) -> Self::Result {
        MessageResult(self.broadcast(&msg.0))
    }
}

impl Handler<ClientCount> for SseBroadcaster {
    type Result = usize;

    fn handle(&mut self, _msg: ClientCount, _ctx: &mut Self::Context) -> usize {
        self.clients.len()
    }
}

/// Response body for one event stream.
///
/// Dropping it (the transport closed) deregisters the client.
pub struct SseClientStream {
    id: Uuid,
    frames: mpsc::Receiver<Bytes>,
    broadcaster: actix::Addr<SseBroadcaster>,
}

impl SseClientStream {
    pub fn new(handle: ClientHandle, broadcaster: actix::Addr<SseBroadcaster>) -> Self {
        Self {
            id: handle.id,
            frames: handle.frames,
            broadcaster,
        }
    }
}

impl Stream for SseClientStream {
    type Item = Result<Bytes, Infallible>;

    fn poll_next(
        mut self: Pin<&mut Self>,
        cx: &mut std::task::Context<'_>,
    ) -> Poll<Option<Self::Item>> {
        match self.frames.poll_recv(cx) {
            Poll::Ready(frame) => Poll::Ready(frame.map(Ok)),
            Poll::Pending => Poll::Pending,
        }
    }
}

impl Drop for SseClientStream {
    fn drop(&mut self) {
        self.broadcaster.do_send(Disconnect { id: self.id });
    }
}
