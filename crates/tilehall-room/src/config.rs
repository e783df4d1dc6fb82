//! Room configuration.

use serde::{Deserialize, Serialize};

/// Settings shared by every room a registry creates.
///
/// Passed in at construction; rooms never read global state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RoomConfig {
    /// Minimum seated players before the owner may start.
    pub min_players: usize,

    /// Tiles dealt to each player at the start of a hand. The starting
    /// player receives one more.
    pub hand_size: usize,

    /// Send a `rejected` event back to a player whose move was refused.
    /// Off by default: refused moves are logged and otherwise ignored.
    pub notify_rejections: bool,

    /// Finish the hand when a turn begins with an empty wall, instead of
    /// continuing without draws.
    pub finish_on_exhausted_wall: bool,

    /// Capacity of each room actor's command channel.
    pub channel_size: usize,

    /// Fixed seed for shuffling and starting-seat selection. `None`
    /// seeds each room from the OS.
    pub rng_seed: Option<u64>,
}

impl Default for RoomConfig {
    fn default() -> Self {
        Self {
            min_players: 2,
            hand_size: 13,
            notify_rejections: false,
            finish_on_exhausted_wall: false,
            channel_size: 64,
            rng_seed: None,
        }
    }
}
