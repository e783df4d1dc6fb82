//! Identity types, room lifecycle, and the read-only views that rooms
//! hand out to clients.
//!
//! Views are separate structs, not `Serialize` impls on the live room.
//! A view contains only what it names: never another player's hand,
//! the room secret, nor the undealt wall.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::Tile;

// ---------------------------------------------------------------------------
// Identity types
// ---------------------------------------------------------------------------

/// Opaque identifier for a player.
///
/// Issued by the server when a player creates or joins a room and then
/// presented by the client when it opens its room connection, so it must
/// not be guessable: ids are 128 random bits rendered as 32 hex chars
/// (see `tilehall_session::generate_player_id`).
///
/// `#[serde(transparent)]` keeps it a plain JSON string.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PlayerId(pub String);

impl PlayerId {
    /// Borrows the id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for PlayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for PlayerId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Short, human-shareable room code (e.g. `"K3Q9ZD"`).
///
/// Players type or paste this to join a friend's table, so it is short
/// and uses only unambiguous uppercase alphanumerics.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoomCode(pub String);

impl RoomCode {
    /// Length of a generated room code.
    pub const LEN: usize = 6;

    /// Characters a room code is drawn from (no `0/O`, `1/I`).
    pub const ALPHABET: &'static [u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";

    /// Borrows the code as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns `true` if `s` has the shape of a generated code.
    pub fn is_valid(s: &str) -> bool {
        s.len() == Self::LEN && s.bytes().all(|b| Self::ALPHABET.contains(&b))
    }
}

impl fmt::Display for RoomCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RoomCode {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

// ---------------------------------------------------------------------------
// Recipient
// ---------------------------------------------------------------------------

/// Who an outbound event is addressed to.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Recipient {
    /// Every player in the room.
    All,
    /// One player.
    Player(PlayerId),
    /// Everyone except one player (e.g. "X joined" is not sent to X).
    AllExcept(PlayerId),
}

impl Recipient {
    /// Returns `true` if `player` should receive an event sent here.
    pub fn includes(&self, player: &PlayerId) -> bool {
        match self {
            Self::All => true,
            Self::Player(id) => id == player,
            Self::AllExcept(id) => id != player,
        }
    }
}

// ---------------------------------------------------------------------------
// RoomState
// ---------------------------------------------------------------------------

/// Lifecycle state of a room.
///
/// ```text
/// Waiting → Playing → Finished
/// ```
///
/// - **Waiting**: accepting joins, nothing dealt.
/// - **Playing**: wall in play, turns advancing.
/// - **Finished**: terminal; no further game mutation is accepted.
///
/// A room can also be destroyed from any state when its last player
/// leaves. That is a registry removal, not a state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RoomState {
    Waiting,
    Playing,
    Finished,
}

impl RoomState {
    /// Returns `true` if the room accepts new players.
    pub fn is_joinable(&self) -> bool {
        matches!(self, Self::Waiting)
    }

    /// Returns `true` while a hand is being played.
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Playing)
    }

    /// The only state this one may move to, if any.
    pub fn next(self) -> Option<Self> {
        match self {
            Self::Waiting => Some(Self::Playing),
            Self::Playing => Some(Self::Finished),
            Self::Finished => None,
        }
    }

    /// Returns `true` if moving to `target` follows the strict order.
    pub fn can_transition_to(self, target: Self) -> bool {
        self.next() == Some(target)
    }
}

impl fmt::Display for RoomState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Waiting => f.write_str("waiting"),
            Self::Playing => f.write_str("playing"),
            Self::Finished => f.write_str("finished"),
        }
    }
}

// ---------------------------------------------------------------------------
// ActionKind
// ---------------------------------------------------------------------------

/// A claim or declaration a player can request out of normal turn order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionKind {
    /// Complete a run with the last discard.
    Chow,
    /// Complete a triplet with the last discard.
    Pung,
    /// Complete a quad.
    Kong,
    /// Declare a winning hand.
    Win,
    /// Decline any claim on the last discard.
    Pass,
}

impl fmt::Display for ActionKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Self::Chow => "chow",
            Self::Pung => "pung",
            Self::Kong => "kong",
            Self::Win => "win",
            Self::Pass => "pass",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// Views
// ---------------------------------------------------------------------------

/// What other players may see about a player.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublicPlayer {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
}

/// A seat at the table during play: the public view plus hand size.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SeatView {
    pub id: PlayerId,
    pub name: String,
    pub score: i32,
    pub tile_count: usize,
}

/// Public snapshot of a hand in progress.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameSnapshot {
    pub game_state: RoomState,
    /// Seats in turn order.
    pub players: Vec<SeatView>,
    pub current_player_index: usize,
    #[serde(rename = "currentPlayerID")]
    pub current_player_id: Option<PlayerId>,
    pub discarded_tiles: Vec<Tile>,
    /// Tiles left in the wall. The wall itself is never exposed.
    pub remaining_tiles: usize,
    pub last_played_tile: Option<Tile>,
}

/// Room metadata sent to a player when their connection attaches.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomInfo {
    pub id: RoomCode,
    /// Players in turn order.
    pub players: Vec<PublicPlayer>,
    pub owner: Option<PublicPlayer>,
    pub game_state: RoomState,
    /// Present while a hand is in progress, so a late connection can
    /// render the table.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game: Option<GameSnapshot>,
}

/// A row in the lobby's room list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RoomListEntry {
    pub id: RoomCode,
    pub player_count: usize,
    pub game_state: RoomState,
    pub has_password: bool,
    pub owner: Option<PublicPlayer>,
}
