//! Byte-frame transport for Tilehall.
//!
//! The gateway only needs two things from the network: a stream of
//! accepted connections ([`Transport`]) and, per connection, a way to
//! push and pull whole frames ([`Connection`]). Framing, upgrades and
//! ping/pong stay in here.
//!
//! # Feature Flags
//!
//! - `websocket` (default): [`WebSocketTransport`] on `tokio-tungstenite`

#![allow(async_fn_in_trait)]

mod error;
#[cfg(feature = "websocket")]
mod websocket;

pub use error::TransportError;
#[cfg(feature = "websocket")]
pub use websocket::{WebSocketConnection, WebSocketTransport};

use std::fmt;

/// Process-unique connection number, used to correlate log lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConnectionId(u64);

impl ConnectionId {
    pub fn new(id: u64) -> Self {
        Self(id)
    }
}

impl fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "conn-{}", self.0)
    }
}

/// A listener handing out established connections.
pub trait Transport: Send + Sync + 'static {
    type Connection: Connection;
    type Error: std::error::Error + Send + Sync;

    /// Waits for the next client and completes its handshake.
    async fn accept(&mut self) -> Result<Self::Connection, Self::Error>;
}

/// One client connection carrying whole frames.
///
/// `send` and `recv` take `&self` and must be usable concurrently: the
/// gateway runs a writer task draining the room's outbound events while
/// the reader loop is parked in `recv`.
pub trait Connection: Send + Sync + 'static {
    type Error: std::error::Error + Send + Sync;

    /// Sends one frame.
    async fn send(&self, data: &[u8]) -> Result<(), Self::Error>;

    /// Waits for the next data frame. `Ok(None)` once the peer has
    /// closed.
    async fn recv(&self) -> Result<Option<Vec<u8>>, Self::Error>;

    /// Starts the closing handshake.
    async fn close(&self) -> Result<(), Self::Error>;

    fn id(&self) -> ConnectionId;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_connection_id_display() {
        assert_eq!(ConnectionId::new(7).to_string(), "conn-7");
    }

    #[test]
    fn test_transport_error_messages() {
        let err = TransportError::Handshake("bad upgrade".into());
        assert_eq!(err.to_string(), "handshake failed: bad upgrade");

        let io = std::io::Error::new(std::io::ErrorKind::BrokenPipe, "peer gone");
        assert!(TransportError::SendFailed(io).to_string().contains("peer gone"));
    }
}
