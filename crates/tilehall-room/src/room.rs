//! The turn-based room state machine.
//!
//! [`Room`] is plain synchronous state. Exactly one owner drives it at a
//! time (the room actor, see [`crate::RoomHandle`]), so nothing in here
//! locks, awaits, or panics on bad input. Every refused move comes back
//! as a [`RoomError`] and leaves the room untouched.
//!
//! Turn order is seat order: `players[current]` holds the turn, and a
//! normal advance moves to `(current + 1) % players.len()`.

use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tilehall_protocol::{
    ActionKind, GameSnapshot, PlayerId, Recipient, RoomCode, RoomInfo,
    RoomListEntry, RoomState, ServerEvent, Tile,
};
use tilehall_session::{LinkId, PlayerSession, PlayerSink};

use crate::{
    ActionRequest, ClaimContext, ClaimPolicy, ClaimResolution, Deck,
    RoomConfig, RoomError,
};

/// Counters for checking a room's invariants from outside the actor.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoomStats {
    pub state: RoomState,
    pub current_index: usize,
    /// Tiles left in the wall.
    pub deck: usize,
    /// Hand sizes in seat order.
    pub hands: Vec<usize>,
    pub discards: usize,
    /// Tiles taken out of play when a player left mid-hand.
    pub forfeited: usize,
    pub pending_actions: usize,
}

impl RoomStats {
    /// Every tile the room is accounting for. Equals
    /// [`Tile::FULL_SET`] from the deal until the room is dropped.
    pub fn tile_total(&self) -> usize {
        self.deck + self.hands.iter().sum::<usize>() + self.discards + self.forfeited
    }
}

/// One table: its players, its wall, and whose turn it is.
pub struct Room {
    code: RoomCode,
    secret: Option<String>,
    config: RoomConfig,
    state: RoomState,
    players: Vec<PlayerSession>,
    owner: Option<PlayerId>,
    deck: Deck,
    discards: Vec<Tile>,
    forfeited: Vec<Tile>,
    current: usize,
    last_played: Option<Tile>,
    pending: Vec<ActionRequest>,
    policy: Arc<dyn ClaimPolicy>,
    rng: StdRng,
}

impl Room {
    /// Creates an empty room in `Waiting`.
    ///
    /// An empty `secret` is the same as none.
    pub fn new(
        code: RoomCode,
        secret: Option<String>,
        config: RoomConfig,
        policy: Arc<dyn ClaimPolicy>,
    ) -> Self {
        let rng = match config.rng_seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_os_rng(),
        };
        Self {
            code,
            secret: secret.filter(|s| !s.is_empty()),
            config,
            state: RoomState::Waiting,
            players: Vec::new(),
            owner: None,
            deck: Deck::empty(),
            discards: Vec::new(),
            forfeited: Vec::new(),
            current: 0,
            last_played: None,
            pending: Vec::new(),
            policy,
            rng,
        }
    }

    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    pub fn state(&self) -> RoomState {
        self.state
    }

    pub fn config(&self) -> &RoomConfig {
        &self.config
    }

    pub fn has_secret(&self) -> bool {
        self.secret.is_some()
    }

    /// Returns `true` if `given` matches the join secret. A room without
    /// a secret only accepts an empty one.
    pub fn check_secret(&self, given: &str) -> bool {
        self.secret.as_deref().unwrap_or("") == given
    }

    /// Seated players in turn order.
    pub fn players(&self) -> &[PlayerSession] {
        &self.players
    }

    pub fn player(&self, player_id: &PlayerId) -> Option<&PlayerSession> {
        self.players.iter().find(|p| p.id() == player_id)
    }

    pub fn len(&self) -> usize {
        self.players.len()
    }

    pub fn is_empty(&self) -> bool {
        self.players.is_empty()
    }

    pub fn owner(&self) -> Option<&PlayerId> {
        self.owner.as_ref()
    }

    pub fn current_index(&self) -> usize {
        self.current
    }

    /// The player holding the turn, if anyone is seated.
    pub fn current_player(&self) -> Option<&PlayerSession> {
        self.players.get(self.current)
    }

    pub fn deck_len(&self) -> usize {
        self.deck.len()
    }

    pub fn discards(&self) -> &[Tile] {
        &self.discards
    }

    pub fn forfeited(&self) -> &[Tile] {
        &self.forfeited
    }

    pub fn last_played(&self) -> Option<Tile> {
        self.last_played
    }

    /// Claims recorded since the last discard.
    pub fn pending_actions(&self) -> &[ActionRequest] {
        &self.pending
    }

    /// Wall + hands + discards + forfeited.
    pub fn tile_count(&self) -> usize {
        self.deck.len()
            + self.players.iter().map(PlayerSession::hand_len).sum::<usize>()
            + self.discards.len()
            + self.forfeited.len()
    }

    pub fn stats(&self) -> RoomStats {
        RoomStats {
            state: self.state,
            current_index: self.current,
            deck: self.deck.len(),
            hands: self.players.iter().map(PlayerSession::hand_len).collect(),
            discards: self.discards.len(),
            forfeited: self.forfeited.len(),
            pending_actions: self.pending.len(),
        }
    }

    // -----------------------------------------------------------------
    // Membership
    // -----------------------------------------------------------------

    /// Appends a player to the end of the seat order.
    ///
    /// No capacity, state or duplicate checks: callers enforce their own
    /// admission policy first (see the actor's join handling).
    pub fn add_player(&mut self, player: PlayerSession) {
        tracing::debug!(room_code = %self.code, player_id = %player.id(), "player seated");
        self.players.push(player);
    }

    /// Removes the first player with this id and returns them.
    ///
    /// Raw removal: owner, turn pointer and hand are left as they are.
    /// Use [`Room::depart`] for a player leaving the table.
    pub fn remove_player(&mut self, player_id: &PlayerId) -> Option<PlayerSession> {
        let index = self.seat_of(player_id)?;
        Some(self.players.remove(index))
    }

    pub fn set_owner(&mut self, player_id: PlayerId) {
        self.owner = Some(player_id);
    }

    /// A player leaves the table for good. Returns how many remain.
    ///
    /// Everyone left is told `player_left`. Then:
    /// - the owner seat passes to the first remaining player;
    /// - a seat before the current one shifts the turn index down;
    /// - if the leaver held the turn mid-hand, the player now in that
    ///   seat (wrapping) takes the turn and draws;
    /// - the leaver's hand goes to the forfeited pile;
    /// - a hand with fewer than two players left is finished.
    pub fn depart(&mut self, player_id: &PlayerId) -> Result<usize, RoomError> {
        let index = self
            .seat_of(player_id)
            .ok_or_else(|| self.not_seated(player_id))?;

        let mut player = self.players.remove(index);
        player.detach();
        let hand = player.clear_hand();
        tracing::info!(
            room_code = %self.code,
            %player_id,
            players = self.players.len(),
            forfeited = hand.len(),
            "player left"
        );
        self.forfeited.extend(hand);

        self.broadcast_all(ServerEvent::PlayerLeft {
            player_id: player_id.clone(),
        });

        if self.players.is_empty() {
            self.owner = None;
            self.current = 0;
            return Ok(0);
        }

        if self.owner.as_ref() == Some(player_id) {
            let owner_id = self.players[0].id().clone();
            tracing::info!(room_code = %self.code, %owner_id, "owner reassigned");
            self.set_owner(owner_id.clone());
            self.broadcast_all(ServerEvent::NewOwner { owner_id });
        }

        let held_turn = index == self.current;
        if index < self.current {
            self.current -= 1;
        }
        if self.current >= self.players.len() {
            self.current = 0;
        }

        if self.state.is_active() {
            if self.players.len() < 2 {
                self.finish("not enough players");
            } else if held_turn {
                self.begin_turn();
            }
        }

        Ok(self.players.len())
    }

    /// Connects a seated player's outbound sink and returns its link.
    ///
    /// The player gets `room_info` (and `your_tiles` mid-hand); everyone
    /// else gets `player_joined`. A live previous connection is replaced.
    pub fn attach(&mut self, player_id: &PlayerId, sink: PlayerSink) -> Result<LinkId, RoomError> {
        let index = self
            .seat_of(player_id)
            .ok_or_else(|| self.not_seated(player_id))?;

        let reconnect = self.players[index].is_connected();
        let link = self.players[index].attach(sink);
        if reconnect {
            tracing::debug!(room_code = %self.code, %player_id, %link, "replaced previous connection");
        }

        let info = self.room_info();
        let player = &self.players[index];
        player.send(ServerEvent::RoomInfo(info));
        if self.state.is_active() {
            player.send(ServerEvent::YourTiles {
                tiles: player.hand().to_vec(),
            });
        }
        let public = player.public_view();
        self.broadcast_except(ServerEvent::PlayerJoined { player: public }, player_id);

        tracing::info!(room_code = %self.code, %player_id, %link, "player connected");
        Ok(link)
    }

    /// The connection `link` has ended. The player departs only if that
    /// was their current connection; after a reconnect the old link is
    /// [`RoomError::Superseded`] and nothing changes.
    pub fn disconnect(&mut self, player_id: &PlayerId, link: LinkId) -> Result<usize, RoomError> {
        let current = self
            .player(player_id)
            .ok_or_else(|| self.not_seated(player_id))?
            .link();
        if current != Some(link) {
            return Err(RoomError::Superseded {
                player_id: player_id.clone(),
                link,
            });
        }
        self.depart(player_id)
    }

    /// Departs a player who was seated but never opened a connection.
    ///
    /// Returns `None` (and changes nothing) once the player has connected
    /// at least once; from then on their connection's end handles it.
    pub fn expire_unconnected(&mut self, player_id: &PlayerId) -> Result<Option<usize>, RoomError> {
        let player = self
            .player(player_id)
            .ok_or_else(|| self.not_seated(player_id))?;
        if player.has_connected() {
            return Ok(None);
        }
        tracing::info!(room_code = %self.code, %player_id, "seat never connected, releasing");
        self.depart(player_id).map(Some)
    }

    // -----------------------------------------------------------------
    // Game flow
    // -----------------------------------------------------------------

    /// Shuffles a fresh wall and deals.
    ///
    /// Each player gets `hand_size` tiles, dealt one at a time around the
    /// table. A uniformly chosen starting player gets one more and holds
    /// the first turn. Each player is sent their own `your_tiles`.
    ///
    /// Only checks the lifecycle. Minimum player count and ownership are
    /// the caller's concern.
    pub fn start_game(&mut self) -> Result<(), RoomError> {
        if !self.state.can_transition_to(RoomState::Playing) {
            return Err(RoomError::InvalidStateTransition {
                from: self.state,
                to: RoomState::Playing,
            });
        }
        let seats = self.players.len();
        if seats == 0 {
            return Err(RoomError::NotEnoughPlayers { have: 0, need: 1 });
        }
        if seats * self.config.hand_size + 1 > Tile::FULL_SET {
            return Err(RoomError::DeckExhausted);
        }

        let mut deck = Deck::build();
        deck.shuffle_with(&mut self.rng);

        self.discards.clear();
        self.forfeited.clear();
        self.pending.clear();
        self.last_played = None;
        for player in &mut self.players {
            player.clear_hand();
        }

        for _ in 0..self.config.hand_size {
            for player in &mut self.players {
                player.receive(deck.draw()?);
            }
        }
        let starter = self.rng.random_range(0..seats);
        self.players[starter].receive(deck.draw()?);

        self.deck = deck;
        self.current = starter;
        self.state = RoomState::Playing;

        tracing::info!(
            room_code = %self.code,
            players = seats,
            starter = %self.players[starter].id(),
            remaining = self.deck.len(),
            "game started"
        );

        for player in &self.players {
            player.send(ServerEvent::YourTiles {
                tiles: player.hand().to_vec(),
            });
        }
        Ok(())
    }

    /// The current player discards `tile`.
    ///
    /// On success everyone sees `tile_played`, the claim policy is
    /// consulted, and the turn moves on.
    pub fn play_tile(&mut self, player_id: &PlayerId, tile: Tile) -> Result<(), RoomError> {
        self.require_playing()?;
        let index = self
            .seat_of(player_id)
            .ok_or_else(|| self.not_seated(player_id))?;
        if index != self.current {
            return Err(RoomError::NotYourTurn(player_id.clone()));
        }
        if !self.players[index].take_tile(tile) {
            return Err(RoomError::TileNotInHand(tile));
        }

        self.discards.push(tile);
        self.last_played = Some(tile);
        tracing::debug!(room_code = %self.code, %player_id, %tile, "tile played");
        self.broadcast_all(ServerEvent::TilePlayed {
            player_id: player_id.clone(),
            tile,
        });

        match self.resolve_claims(player_id, tile) {
            ClaimResolution::Proceed => self.advance_turn(),
            ClaimResolution::Claimed { claimant } => match self.seat_of(&claimant) {
                Some(seat) if seat != index => {
                    tracing::info!(room_code = %self.code, %claimant, %tile, "discard claimed");
                    self.current = seat;
                    self.broadcast_all(ServerEvent::TurnChanged { player_id: claimant });
                }
                _ => {
                    tracing::warn!(
                        room_code = %self.code,
                        %claimant,
                        "claim policy named an ineligible claimant"
                    );
                    self.advance_turn();
                }
            },
        }
        Ok(())
    }

    /// Records a claim or declaration for the claim policy to weigh at
    /// the next discard.
    pub fn handle_player_action(
        &mut self,
        player_id: &PlayerId,
        kind: ActionKind,
        tiles: Vec<Tile>,
    ) -> Result<(), RoomError> {
        self.require_playing()?;
        if self.seat_of(player_id).is_none() {
            return Err(self.not_seated(player_id));
        }
        tracing::info!(
            room_code = %self.code,
            %player_id,
            action = %kind,
            tiles = tiles.len(),
            "action requested"
        );
        self.pending.push(ActionRequest {
            player_id: player_id.clone(),
            kind,
            tiles,
            last_discard: self.last_played,
        });
        Ok(())
    }

    /// Relays table chat to everyone, sender included.
    pub fn chat(&self, player_id: &PlayerId, content: String) -> Result<(), RoomError> {
        let player = self
            .player(player_id)
            .ok_or_else(|| self.not_seated(player_id))?;
        self.broadcast_all(ServerEvent::Chat {
            player_id: player_id.clone(),
            player_name: player.name().to_string(),
            content,
        });
        Ok(())
    }

    /// Ends the hand. A no-op unless the room is `Playing`.
    pub fn finish(&mut self, reason: &str) {
        if !self.state.can_transition_to(RoomState::Finished) {
            return;
        }
        self.state = RoomState::Finished;
        tracing::info!(room_code = %self.code, reason, "game finished");
        self.broadcast_all(ServerEvent::GameFinished {
            reason: reason.to_string(),
        });
    }

    fn advance_turn(&mut self) {
        if self.players.is_empty() {
            return;
        }
        self.current = (self.current + 1) % self.players.len();
        self.begin_turn();
    }

    /// Draws for the player at `current` and announces the turn.
    fn begin_turn(&mut self) {
        let Some(player) = self.players.get_mut(self.current) else {
            return;
        };
        match self.deck.draw() {
            Ok(tile) => {
                player.receive(tile);
                player.send(ServerEvent::NewTile { tile });
            }
            Err(_) if self.config.finish_on_exhausted_wall => {
                self.finish("wall exhausted");
                return;
            }
            Err(_) => {
                tracing::debug!(room_code = %self.code, "wall exhausted, no draw");
            }
        }
        let player_id = self.players[self.current].id().clone();
        self.broadcast_all(ServerEvent::TurnChanged { player_id });
    }

    fn resolve_claims(&mut self, discarder: &PlayerId, tile: Tile) -> ClaimResolution {
        let requests = std::mem::take(&mut self.pending);
        let seats: Vec<PlayerId> = self.players.iter().map(|p| p.id().clone()).collect();
        let ctx = ClaimContext {
            discarder,
            tile,
            seats: &seats,
            requests: &requests,
        };
        self.policy.resolve(&ctx)
    }

    // -----------------------------------------------------------------
    // Views and delivery
    // -----------------------------------------------------------------

    /// What a player sees on connecting.
    pub fn room_info(&self) -> RoomInfo {
        RoomInfo {
            id: self.code.clone(),
            players: self.players.iter().map(PlayerSession::public_view).collect(),
            owner: self.owner_session().map(PlayerSession::public_view),
            game_state: self.state,
            game: self.state.is_active().then(|| self.game_snapshot()),
        }
    }

    /// The public table: seats, discards, wall size. No hands.
    pub fn game_snapshot(&self) -> GameSnapshot {
        GameSnapshot {
            game_state: self.state,
            players: self.players.iter().map(PlayerSession::seat_view).collect(),
            current_player_index: self.current,
            current_player_id: self.current_player().map(|p| p.id().clone()),
            discarded_tiles: self.discards.clone(),
            remaining_tiles: self.deck.len(),
            last_played_tile: self.last_played,
        }
    }

    /// The lobby's row for this room.
    pub fn summary(&self) -> RoomListEntry {
        RoomListEntry {
            id: self.code.clone(),
            player_count: self.players.len(),
            game_state: self.state,
            has_password: self.has_secret(),
            owner: self.owner_session().map(PlayerSession::public_view),
        }
    }

    /// Sends `event` to every seated player `recipient` covers.
    pub fn deliver(&self, recipient: &Recipient, event: &ServerEvent) {
        for player in self.players.iter().filter(|p| recipient.includes(p.id())) {
            player.send(event.clone());
        }
    }

    pub fn broadcast_all(&self, event: ServerEvent) {
        self.deliver(&Recipient::All, &event);
    }

    pub fn broadcast_except(&self, event: ServerEvent, except: &PlayerId) {
        self.deliver(&Recipient::AllExcept(except.clone()), &event);
    }

    pub fn send_to(&self, player_id: &PlayerId, event: ServerEvent) {
        if let Some(player) = self.player(player_id) {
            player.send(event);
        }
    }

    fn owner_session(&self) -> Option<&PlayerSession> {
        self.owner.as_ref().and_then(|id| self.player(id))
    }

    fn seat_of(&self, player_id: &PlayerId) -> Option<usize> {
        self.players.iter().position(|p| p.id() == player_id)
    }

    fn not_seated(&self, player_id: &PlayerId) -> RoomError {
        RoomError::PlayerNotFound(player_id.clone(), self.code.clone())
    }

    fn require_playing(&self) -> Result<(), RoomError> {
        if self.state.is_active() {
            Ok(())
        } else {
            Err(RoomError::NotPlaying(self.state))
        }
    }
}
