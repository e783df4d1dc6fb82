//! Claim resolution hook.
//!
//! Players may ask to claim a discard (chow, pung, kong, win) or pass.
//! The room only records those requests. Deciding which claim wins, if
//! any, belongs to a [`ClaimPolicy`], which the room consults after every
//! discard and before the turn moves on.
//!
//! Requests are standing declarations. The room resolves a discard the
//! moment it is played, without a claim window, so the policy sees the
//! requests made *before* that discard: "pung on east" sent while the
//! previous player was still thinking. A request sent in reply to a
//! `tile_played` is therefore weighed at the following discard. Each
//! request carries the discard that was on the table when it was made
//! ([`ActionRequest::last_discard`]) so a policy can tell the two apart.

use std::fmt;

use tilehall_protocol::{ActionKind, PlayerId, Tile};

/// A claim or declaration recorded by the room.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionRequest {
    pub player_id: PlayerId,
    pub kind: ActionKind,
    pub tiles: Vec<Tile>,
    /// The most recent discard when the request was made, if any.
    pub last_discard: Option<Tile>,
}

/// What a policy sees when a tile has just been discarded.
#[derive(Debug)]
pub struct ClaimContext<'a> {
    /// Who discarded.
    pub discarder: &'a PlayerId,
    /// The tile that was discarded.
    pub tile: Tile,
    /// Seated players in turn order.
    pub seats: &'a [PlayerId],
    /// Requests recorded since the previous discard, oldest first. None
    /// of them can have seen `tile`.
    pub requests: &'a [ActionRequest],
}

/// Outcome of a policy decision.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ClaimResolution {
    /// No claim; the turn passes to the next seat as usual.
    Proceed,
    /// The turn goes to `claimant` instead, without a draw.
    Claimed { claimant: PlayerId },
}

/// Decides whether a discard is claimed.
///
/// Implementations must be cheap and must not block: they run on the
/// room actor.
pub trait ClaimPolicy: Send + Sync + 'static {
    fn resolve(&self, ctx: &ClaimContext<'_>) -> ClaimResolution;
}

/// Never grants a claim.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoClaims;

impl ClaimPolicy for NoClaims {
    fn resolve(&self, _ctx: &ClaimContext<'_>) -> ClaimResolution {
        ClaimResolution::Proceed
    }
}

impl fmt::Debug for dyn ClaimPolicy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("ClaimPolicy")
    }
}
