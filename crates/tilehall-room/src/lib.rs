//! Rooms for Tilehall.
//!
//! A room is one table: up to a handful of seated players, a shuffled
//! wall, and a turn pointer. Each room runs as its own Tokio task (actor
//! model) that owns a [`Room`] state machine; the rest of the server
//! talks to it through a [`RoomHandle`].
//!
//! # Key types
//!
//! - [`Deck`]: the 136-tile wall
//! - [`Room`]: the synchronous turn-based state machine
//! - [`RoomHandle`]: send commands to a running room actor
//! - [`RoomRegistry`]: create, find and remove rooms by code
//! - [`ClaimPolicy`]: decides whether a discard is claimed
//! - [`RoomConfig`]: dealing and reporting settings

mod actor;
mod claims;
mod config;
mod deck;
mod error;
mod registry;
mod room;

pub use actor::RoomHandle;
pub use claims::{ActionRequest, ClaimContext, ClaimPolicy, ClaimResolution, NoClaims};
pub use config::RoomConfig;
pub use deck::Deck;
pub use error::RoomError;
pub use registry::RoomRegistry;
pub use room::{Room, RoomStats};
