use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};

/// Advisory MCP handshake progress. Requests are never rejected based on it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandshakeState {
    Uninitialized,
    Handshaken,
    Ready,
}

impl HandshakeState {
    fn from_u8(value: u8) -> Self {
        match value {
            1 => Self::Handshaken,
            2 => Self::Ready,
            _ => Self::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            Self::Uninitialized => 0,
            Self::Handshaken => 1,
            Self::Ready => 2,
        }
    }
}

impl fmt::Display for HandshakeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Uninitialized => "uninitialized",
            Self::Handshaken => "handshaken",
            Self::Ready => "ready",
        };
        f.write_str(name)
    }
}

/// Process-wide MCP session state; `id` tags every dispatcher log line
#[derive(Debug)]
pub struct McpSession {
    pub id: String,
    state: AtomicU8,
}

impl McpSession {
    pub fn new() -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            state: AtomicU8::new(HandshakeState::Uninitialized.as_u8()),
        }
    }

    pub fn state(&self) -> HandshakeState {
        HandshakeState::from_u8(self.state.load(Ordering::Acquire))
    }

    /// `initialize` never moves a session back out of `Ready`.
    pub fn mark_handshaken(&self) -> HandshakeState {
        let _ = self.state.compare_exchange(
            HandshakeState::Uninitialized.as_u8(),
            HandshakeState::Handshaken.as_u8(),
            Ordering::AcqRel,
            Ordering::Acquire,
        );
        self.state()
    }

    /// Accepted from any state; reconnecting clients skip `initialize`.
    pub fn mark_ready(&self) -> HandshakeState {
        self.state
            .store(HandshakeState::Ready.as_u8(), Ordering::Release);
        HandshakeState::Ready
    }
}

impl Default for McpSession {
    fn default() -> Self {
        Self::new()
    }
}
