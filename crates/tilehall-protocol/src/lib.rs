//! Wire protocol for Tilehall.
//!
//! This crate is the shared vocabulary of every other layer:
//!
//! - **Tiles** ([`Tile`], [`Suit`], [`Wind`], [`Dragon`]): the 34 faces
//!   and their string codes.
//! - **Identity and views** ([`PlayerId`], [`RoomCode`], [`RoomState`],
//!   [`RoomInfo`], [`GameSnapshot`], …): what a client is allowed to see.
//! - **Events** ([`ClientEvent`], [`ServerEvent`], [`LobbyRequest`],
//!   [`LobbyResponse`]): closed, tagged sets of messages.
//! - **Codec** ([`Codec`], [`JsonCodec`]): events to bytes and back.
//!
//! ```text
//! Transport (frames) → Protocol (typed events) → Room (state machine)
//! ```

mod codec;
mod error;
mod events;
mod tile;
mod types;

pub use codec::Codec;
#[cfg(feature = "json")]
pub use codec::JsonCodec;
pub use error::ProtocolError;
pub use events::{ClientEvent, LobbyRequest, LobbyResponse, ServerEvent};
pub use tile::{Dragon, Suit, Tile, Wind};
pub use types::{
    ActionKind, GameSnapshot, PlayerId, PublicPlayer, Recipient, RoomCode,
    RoomInfo, RoomListEntry, RoomState, SeatView,
};
