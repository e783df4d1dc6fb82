//! The per-player record held by a room.
//!
//! A session can exist without a live connection: the lobby seats a
//! player before their browser opens the room socket, and a room keeps
//! the seat until the player leaves. Sending to a player with no sink is
//! therefore a normal, silent no-op.

use std::fmt;

use tilehall_protocol::{PlayerId, PublicPlayer, SeatView, ServerEvent, Tile};
use tokio::sync::mpsc;

use crate::generate_player_id;

/// Outbound channel from a room to a player's connection writer.
///
/// Unbounded: the room actor never waits on a slow client. Ordering
/// per player is the channel's FIFO order.
pub type PlayerSink = mpsc::UnboundedSender<ServerEvent>;

/// Identifies one attach of a sink to a player.
///
/// Each attach gets a new link, so when a connection ends the room can
/// tell whether it was still the player's live one or had already been
/// replaced by a reconnect.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LinkId(u64);

impl fmt::Display for LinkId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "link-{}", self.0)
    }
}

/// One seated player.
#[derive(Debug)]
pub struct PlayerSession {
    id: PlayerId,
    name: String,
    hand: Vec<Tile>,
    score: i32,
    sink: Option<PlayerSink>,
    /// Number of attaches so far; the current link is the latest.
    links: u64,
}

impl PlayerSession {
    /// Creates a player with a fresh id, an empty hand and zero score.
    pub fn create(name: impl Into<String>) -> Self {
        Self::with_id(generate_player_id(), name)
    }

    /// Creates a player with a caller-chosen id.
    pub fn with_id(id: PlayerId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            hand: Vec::new(),
            score: 0,
            sink: None,
            links: 0,
        }
    }

    pub fn id(&self) -> &PlayerId {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn score(&self) -> i32 {
        self.score
    }

    /// The tiles in hand, in the order they were received.
    pub fn hand(&self) -> &[Tile] {
        &self.hand
    }

    pub fn hand_len(&self) -> usize {
        self.hand.len()
    }

    /// Returns `true` if the hand contains at least one `tile`.
    pub fn holds(&self, tile: Tile) -> bool {
        self.hand.contains(&tile)
    }

    /// Adds a tile to the end of the hand.
    pub fn receive(&mut self, tile: Tile) {
        self.hand.push(tile);
    }

    /// Removes the first copy of `tile` from the hand.
    ///
    /// Returns `false` (hand unchanged) if the tile isn't held.
    pub fn take_tile(&mut self, tile: Tile) -> bool {
        match self.hand.iter().position(|t| *t == tile) {
            Some(index) => {
                self.hand.remove(index);
                true
            }
            None => false,
        }
    }

    /// Empties the hand and returns what was in it.
    pub fn clear_hand(&mut self) -> Vec<Tile> {
        std::mem::take(&mut self.hand)
    }

    /// The only representation of this player sent to *other* players.
    pub fn public_view(&self) -> PublicPlayer {
        PublicPlayer {
            id: self.id.clone(),
            name: self.name.clone(),
            score: self.score,
        }
    }

    /// Public view plus hand size, for table snapshots.
    pub fn seat_view(&self) -> SeatView {
        SeatView {
            id: self.id.clone(),
            name: self.name.clone(),
            score: self.score,
            tile_count: self.hand.len(),
        }
    }

    /// Connects an outbound sink, replacing any previous one, and
    /// returns the new link.
    ///
    /// Dropping the replaced sink ends the old connection's writer.
    pub fn attach(&mut self, sink: PlayerSink) -> LinkId {
        self.links += 1;
        self.sink = Some(sink);
        LinkId(self.links)
    }

    /// The link of the attached sink, if any.
    pub fn link(&self) -> Option<LinkId> {
        self.sink.as_ref().map(|_| LinkId(self.links))
    }

    /// Returns `true` if a sink was ever attached.
    pub fn has_connected(&self) -> bool {
        self.links > 0
    }

    /// Drops the outbound sink. The player keeps their seat.
    pub fn detach(&mut self) {
        self.sink = None;
    }

    /// Returns `true` if a sink is attached and its receiver is alive.
    pub fn is_connected(&self) -> bool {
        self.sink.as_ref().is_some_and(|s| !s.is_closed())
    }

    /// Best-effort delivery. Never blocks and never fails: with no sink,
    /// or a sink whose connection has gone, the event is dropped.
    pub fn send(&self, event: ServerEvent) {
        if let Some(sink) = &self.sink {
            if sink.send(event).is_err() {
                tracing::trace!(player_id = %self.id, "sink closed, event dropped");
            }
        }
    }
}
