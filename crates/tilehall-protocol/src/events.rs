//! Typed events exchanged between clients and the server.
//!
//! Every frame on the wire has the same outer shape:
//!
//! ```json
//! { "type": "play_tile", "data": { "tile": "5p" } }
//! ```
//!
//! That is serde's "adjacently tagged" enum representation
//! (`#[serde(tag = "type", content = "data")]`). Each variant carries its
//! own strongly typed payload, so once a frame has been decoded at the
//! gateway nothing downstream inspects strings or untyped maps.
//!
//! Events without a payload are written as empty struct variants
//! (`GameStart {}`) so they accept the `"data": {}` the browser client
//! always sends.

use serde::{Deserialize, Serialize};

use crate::{
    ActionKind, GameSnapshot, PlayerId, PublicPlayer, RoomCode, RoomInfo,
    RoomListEntry, Tile,
};

// ---------------------------------------------------------------------------
// Room connection: client → server
// ---------------------------------------------------------------------------

/// What a seated player can send over their room connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ClientEvent {
    /// Table chat, relayed to everyone.
    Chat { content: String },

    /// Owner asks to deal and start the hand.
    GameStart {},

    /// Discard a tile from hand. Only valid on your own turn.
    PlayTile { tile: Tile },

    /// Claim/declaration request (chow, pung, kong, win, pass).
    Action {
        #[serde(rename = "actionType")]
        action_type: ActionKind,
        #[serde(default)]
        tiles: Vec<Tile>,
    },

    /// Leave the room for good.
    LeaveRoom {},
}

// ---------------------------------------------------------------------------
// Room connection: server → client
// ---------------------------------------------------------------------------

/// What a room sends to its players.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum ServerEvent {
    /// Sent to a player when their connection attaches.
    RoomInfo(RoomInfo),

    /// Someone else connected to the room.
    PlayerJoined { player: PublicPlayer },

    /// Your own hand. Unicast only.
    YourTiles { tiles: Vec<Tile> },

    /// The hand has been dealt.
    GameStarted { state: GameSnapshot },

    /// Relayed table chat.
    Chat {
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        #[serde(rename = "playerName")]
        player_name: String,
        content: String,
    },

    /// A player discarded a tile.
    TilePlayed {
        #[serde(rename = "playerID")]
        player_id: PlayerId,
        tile: Tile,
    },

    /// You drew a tile. Unicast only.
    NewTile { tile: Tile },

    /// It is now this player's turn.
    TurnChanged {
        #[serde(rename = "playerID")]
        player_id: PlayerId,
    },

    /// A player left the room.
    PlayerLeft {
        #[serde(rename = "playerID")]
        player_id: PlayerId,
    },

    /// Room ownership moved to another player.
    NewOwner {
        #[serde(rename = "ownerID")]
        owner_id: PlayerId,
    },

    /// The hand is over.
    GameFinished { reason: String },

    /// Your last request was refused. Only sent when the room is
    /// configured to report rejections.
    Rejected { reason: String },

    /// Connection-level failure (unknown room, unknown player, bad frame).
    /// `code` follows HTTP conventions.
    Error { code: u16, message: String },
}

// ---------------------------------------------------------------------------
// Lobby connection
// ---------------------------------------------------------------------------

/// Requests accepted on the lobby connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LobbyRequest {
    /// Open a new room and take its first seat as owner.
    CreateRoom {
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(default)]
        password: String,
    },

    /// Take a seat in an existing room.
    JoinRoom {
        #[serde(rename = "roomID")]
        room_id: RoomCode,
        #[serde(rename = "playerName")]
        player_name: String,
        #[serde(default)]
        password: String,
    },

    /// List open rooms.
    ListRooms {},
}

/// Responses on the lobby connection.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", content = "data", rename_all = "snake_case")]
pub enum LobbyResponse {
    /// You have a seat. Connect to `/ws/{roomID}?playerID={playerID}`.
    RoomJoined {
        #[serde(rename = "roomID")]
        room_id: RoomCode,
        #[serde(rename = "playerID")]
        player_id: PlayerId,
    },

    /// Current rooms.
    RoomList { rooms: Vec<RoomListEntry> },

    /// The request failed. `code` follows HTTP conventions.
    Error { code: u16, message: String },
}
