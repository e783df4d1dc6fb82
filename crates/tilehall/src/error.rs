//! Unified error types for the Tilehall server.

use tilehall_protocol::ProtocolError;
use tilehall_room::RoomError;
use tilehall_transport::TransportError;

/// Why a lobby request failed.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LobbyError {
    /// `playerName` was missing or blank.
    #[error("player name is required")]
    EmptyName,

    /// The room refused or couldn't be reached.
    #[error(transparent)]
    Room(#[from] RoomError),
}

impl LobbyError {
    /// HTTP-style status sent back in the `error` response.
    pub fn status(&self) -> u16 {
        match self {
            Self::EmptyName => 400,
            Self::Room(err) => room_status(err),
        }
    }
}

/// HTTP-style status for a room refusal.
pub(crate) fn room_status(err: &RoomError) -> u16 {
    match err {
        RoomError::NotFound(_)
        | RoomError::PlayerNotFound(..)
        | RoomError::Unavailable(_) => 404,
        RoomError::WrongSecret(_) => 401,
        RoomError::RoomFull(_) | RoomError::NotOwner(_) => 403,
        RoomError::NotJoinable(_)
        | RoomError::Closed(_)
        | RoomError::AlreadyInRoom(..)
        | RoomError::Superseded { .. }
        | RoomError::InvalidStateTransition { .. } => 409,
        _ => 400,
    }
}

/// Top-level error that wraps every crate-specific error.
///
/// The `#[from]` on each variant lets `?` convert sub-crate errors.
#[derive(Debug, thiserror::Error)]
pub enum TilehallError {
    /// Socket-level failure (bind, accept, send, recv).
    #[error(transparent)]
    Transport(#[from] TransportError),

    /// A frame couldn't be encoded or decoded.
    #[error(transparent)]
    Protocol(#[from] ProtocolError),

    /// A room operation failed.
    #[error(transparent)]
    Room(#[from] RoomError),

    /// A lobby request failed.
    #[error(transparent)]
    Lobby(#[from] LobbyError),
}
