//! Server configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use tilehall_room::RoomConfig;

/// Everything the server needs at startup. Assembled by
/// [`TilehallServerBuilder`](crate::TilehallServerBuilder).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServerConfig {
    /// Address to listen on.
    pub bind_addr: String,

    /// Seats per room. The lobby refuses joins beyond this.
    pub max_seats: usize,

    /// A connection that sends nothing for this long is closed (and the
    /// player leaves their room).
    pub idle_timeout: Duration,

    /// How long a seat granted by the lobby is held for a player who has
    /// not opened their room connection yet.
    pub connect_grace: Duration,

    /// Settings for every room this server creates.
    pub room: RoomConfig,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: "127.0.0.1:8080".to_string(),
            max_seats: 4,
            idle_timeout: Duration::from_secs(300),
            connect_grace: Duration::from_secs(60),
            room: RoomConfig::default(),
        }
    }
}
