//! Error types for the room layer.

use tilehall_protocol::{PlayerId, RoomCode, RoomState, Tile};
use tilehall_session::LinkId;

/// Errors that can occur during room operations.
///
/// Game-move refusals (`NotYourTurn`, `TileNotInHand`, …) are ordinary
/// values here, never panics: the room logs them and, if configured,
/// reports them to the offending player.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RoomError {
    /// The room does not exist.
    #[error("room {0} not found")]
    NotFound(RoomCode),

    /// The player has no seat in this room.
    #[error("player {0} not in room {1}")]
    PlayerNotFound(PlayerId, RoomCode),

    /// The player already has a seat in this room.
    #[error("player {0} already in room {1}")]
    AlreadyInRoom(PlayerId, RoomCode),

    /// The lifecycle doesn't allow this move (e.g. starting twice).
    #[error("cannot move room from {from} to {to}")]
    InvalidStateTransition { from: RoomState, to: RoomState },

    /// The room has already dealt and admits no new players.
    #[error("room is {0}, not accepting players")]
    NotJoinable(RoomState),

    /// No tiles left to draw.
    #[error("the wall is exhausted")]
    DeckExhausted,

    /// A game move arrived while no hand is being played.
    #[error("no hand in progress (room is {0})")]
    NotPlaying(RoomState),

    /// A game move from someone other than the current player.
    #[error("it is not {0}'s turn")]
    NotYourTurn(PlayerId),

    /// The player tried to discard a tile they don't hold.
    #[error("tile {0} is not in hand")]
    TileNotInHand(Tile),

    /// Only the owner may start the game.
    #[error("player {0} is not the room owner")]
    NotOwner(PlayerId),

    /// Too few seated players to deal.
    #[error("need at least {need} players, have {have}")]
    NotEnoughPlayers { have: usize, need: usize },

    /// Every seat is taken.
    #[error("room {0} is full")]
    RoomFull(RoomCode),

    /// The join secret didn't match.
    #[error("wrong password for room {0}")]
    WrongSecret(RoomCode),

    /// A connection ended after the player had already reconnected, so
    /// its departure no longer applies.
    #[error("connection {link} of player {player_id} was replaced")]
    Superseded { player_id: PlayerId, link: LinkId },

    /// The room has emptied and is being torn down.
    #[error("room {0} is closed")]
    Closed(RoomCode),

    /// The room's actor is gone or its command channel closed.
    #[error("room {0} is unavailable")]
    Unavailable(RoomCode),
}
