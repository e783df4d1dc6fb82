//! # Tilehall
//!
//! Real-time multiplayer mahjong rooms over WebSocket.
//!
//! Players use the `/lobby` connection to create or join a table, then
//! open a room connection and play: the server deals, keeps turn order,
//! validates discards, and relays every move to the table. Each room is
//! an isolated actor task; see [`tilehall_room`].
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use tilehall::prelude::*;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), TilehallError> {
//!     let server = TilehallServer::builder()
//!         .bind("0.0.0.0:8080")
//!         .build()
//!         .await?;
//!     server.run().await
//! }
//! ```

mod config;
mod error;
mod handler;
mod lobby;
mod server;

pub use config::ServerConfig;
pub use error::{LobbyError, TilehallError};
pub use lobby::Lobby;
pub use server::{TilehallServer, TilehallServerBuilder};

/// Everything needed to run or embed a server.
pub mod prelude {
    pub use crate::{
        Lobby, LobbyError, ServerConfig, TilehallError, TilehallServer, TilehallServerBuilder,
    };
    pub use tilehall_protocol::{
        ActionKind, ClientEvent, Codec, JsonCodec, LobbyRequest, LobbyResponse, PlayerId,
        RoomCode, RoomState, ServerEvent, Tile,
    };
    pub use tilehall_room::{
        ClaimContext, ClaimPolicy, ClaimResolution, NoClaims, RoomConfig, RoomError,
        RoomRegistry,
    };
}
