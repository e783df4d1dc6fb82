//! `TilehallServer` builder and accept loop.
//!
//! Ties the layers together: transport → protocol → session → room.

use std::sync::Arc;
use std::time::Duration;

use tilehall_protocol::{Codec, JsonCodec};
use tilehall_room::{ClaimPolicy, NoClaims, RoomConfig, RoomRegistry};
use tilehall_transport::{Transport, WebSocketTransport};

use crate::handler::handle_connection;
use crate::{Lobby, ServerConfig, TilehallError};

/// Shared server state passed to each connection task.
pub(crate) struct ServerState<C: Codec> {
    pub(crate) registry: Arc<RoomRegistry>,
    pub(crate) lobby: Lobby,
    pub(crate) codec: C,
    pub(crate) idle_timeout: Duration,
}

/// Builder for configuring and starting a Tilehall server.
///
/// ```rust,no_run
/// use std::time::Duration;
///
/// use tilehall::prelude::*;
///
/// # async fn start() -> Result<(), TilehallError> {
/// let server = TilehallServer::builder()
///     .bind("0.0.0.0:8080")
///     .idle_timeout(Duration::from_secs(120))
///     .build()
///     .await?;
/// server.run().await
/// # }
/// ```
pub struct TilehallServerBuilder {
    config: ServerConfig,
    policy: Arc<dyn ClaimPolicy>,
}

impl TilehallServerBuilder {
    /// Creates a builder with [`ServerConfig::default`] and no claims.
    pub fn new() -> Self {
        Self {
            config: ServerConfig::default(),
            policy: Arc::new(NoClaims),
        }
    }

    /// Sets the address to bind to.
    pub fn bind(mut self, addr: &str) -> Self {
        self.config.bind_addr = addr.to_string();
        self
    }

    /// Sets the number of seats per room.
    pub fn max_seats(mut self, seats: usize) -> Self {
        self.config.max_seats = seats;
        self
    }

    /// Sets how long a silent connection is kept open.
    pub fn idle_timeout(mut self, timeout: Duration) -> Self {
        self.config.idle_timeout = timeout;
        self
    }

    /// Sets how long a lobby seat waits for its player to connect.
    pub fn connect_grace(mut self, grace: Duration) -> Self {
        self.config.connect_grace = grace;
        self
    }

    /// Sets the configuration used for every room.
    pub fn room_config(mut self, room: RoomConfig) -> Self {
        self.config.room = room;
        self
    }

    /// Replaces the whole configuration.
    pub fn config(mut self, config: ServerConfig) -> Self {
        self.config = config;
        self
    }

    /// Sets how rooms resolve claims on discards.
    pub fn claim_policy(mut self, policy: Arc<dyn ClaimPolicy>) -> Self {
        self.policy = policy;
        self
    }

    /// Binds the listener and builds the server with the JSON codec.
    pub async fn build(self) -> Result<TilehallServer<JsonCodec>, TilehallError> {
        let transport = WebSocketTransport::bind(&self.config.bind_addr).await?;

        let registry = Arc::new(RoomRegistry::with_policy(self.config.room, self.policy));
        let state = Arc::new(ServerState {
            registry: Arc::clone(&registry),
            lobby: Lobby::new(registry, self.config.max_seats, self.config.connect_grace),
            codec: JsonCodec,
            idle_timeout: self.config.idle_timeout,
        });

        Ok(TilehallServer { transport, state })
    }
}

impl Default for TilehallServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

/// A bound Tilehall server.
///
/// Call [`run()`](Self::run) to start accepting connections.
pub struct TilehallServer<C: Codec> {
    transport: WebSocketTransport,
    state: Arc<ServerState<C>>,
}

impl TilehallServer<JsonCodec> {
    pub fn builder() -> TilehallServerBuilder {
        TilehallServerBuilder::new()
    }
}

impl<C> TilehallServer<C>
where
    C: Codec + Clone,
{
    /// Returns the local address the server is bound to.
    pub fn local_addr(&self) -> std::io::Result<std::net::SocketAddr> {
        self.transport.local_addr()
    }

    /// The room registry, for embedding applications and tests.
    pub fn registry(&self) -> Arc<RoomRegistry> {
        Arc::clone(&self.state.registry)
    }

    /// Runs the accept loop until the process is terminated.
    ///
    /// Each connection is handled on its own task; a failed handshake
    /// or connection is logged and doesn't stop the loop.
    pub async fn run(mut self) -> Result<(), TilehallError> {
        tracing::info!("tilehall server running");

        loop {
            match self.transport.accept().await {
                Ok(conn) => {
                    let state = Arc::clone(&self.state);
                    tokio::spawn(async move {
                        if let Err(e) = handle_connection(conn, state).await {
                            tracing::debug!(error = %e, "connection ended with error");
                        }
                    });
                }
                Err(e) => {
                    tracing::warn!(error = %e, "accept failed");
                }
            }
        }
    }
}
