//! Per-player session state for Tilehall.
//!
//! A [`PlayerSession`] is everything a room knows about one seated
//! player: who they are, what they hold, their score, and where to send
//! their events.
//!
//! # How it fits in the stack
//!
//! ```text
//! Room Layer (above)       ← owns one PlayerSession per seat
//!     ↕
//! Session Layer (this crate)
//!     ↕
//! Protocol Layer (below)   ← PlayerId, Tile, ServerEvent
//! ```

mod id;
mod player;

pub use id::generate_player_id;
pub use player::{LinkId, PlayerSession, PlayerSink};
