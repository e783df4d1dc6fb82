//! Room actor: an isolated Tokio task that owns one [`Room`].
//!
//! Player connections never touch a `Room` directly. They send commands
//! down a bounded channel and, where they need an answer, wait on a
//! oneshot reply. The actor applies commands one at a time, so all
//! mutation of a room is serialized without locks.

use tilehall_protocol::{
    ClientEvent, GameSnapshot, PlayerId, RoomCode, RoomInfo, RoomListEntry, ServerEvent,
};
use tilehall_session::{LinkId, PlayerSession, PlayerSink};
use tokio::sync::{mpsc, oneshot};

use crate::{Room, RoomError, RoomStats};

/// Commands sent to a room actor through its channel.
pub(crate) enum RoomCommand {
    /// Seat a new player.
    Join {
        player: PlayerSession,
        secret: String,
        max_seats: usize,
        reply: oneshot::Sender<Result<PlayerId, RoomError>>,
    },

    /// Connect a seated player's outbound sink.
    Attach {
        player_id: PlayerId,
        sink: PlayerSink,
        reply: oneshot::Sender<Result<LinkId, RoomError>>,
    },

    /// A player leaves for good. Replies with the number remaining.
    ///
    /// With a `link`, only if that is still the player's connection.
    Leave {
        player_id: PlayerId,
        link: Option<LinkId>,
        reply: oneshot::Sender<Result<usize, RoomError>>,
    },

    /// Release the seat if the player never connected.
    Expire {
        player_id: PlayerId,
        reply: oneshot::Sender<Result<Option<usize>, RoomError>>,
    },

    /// An inbound event from a seated player.
    Event {
        player_id: PlayerId,
        event: ClientEvent,
    },

    Info {
        reply: oneshot::Sender<RoomInfo>,
    },

    Summary {
        reply: oneshot::Sender<RoomListEntry>,
    },

    Snapshot {
        reply: oneshot::Sender<GameSnapshot>,
    },

    Stats {
        reply: oneshot::Sender<RoomStats>,
    },

    Shutdown,
}

/// Handle to a running room actor.
///
/// Cheap to clone. Every method fails with [`RoomError::Unavailable`]
/// once the actor has stopped.
#[derive(Debug, Clone)]
pub struct RoomHandle {
    code: RoomCode,
    sender: mpsc::Sender<RoomCommand>,
}

impl RoomHandle {
    pub fn code(&self) -> &RoomCode {
        &self.code
    }

    /// Returns `true` once the actor has stopped.
    pub fn is_closed(&self) -> bool {
        self.sender.is_closed()
    }

    /// Seats `player` if the room is waiting, `secret` matches and fewer
    /// than `max_seats` are taken. The first player seated becomes owner.
    pub async fn join(
        &self,
        player: PlayerSession,
        secret: impl Into<String>,
        max_seats: usize,
    ) -> Result<PlayerId, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RoomCommand::Join {
                player,
                secret: secret.into(),
                max_seats,
                reply,
            },
            rx,
        )
        .await?
    }

    /// Connects a seated player's outbound sink. The returned link
    /// identifies this connection in [`disconnect`](Self::disconnect).
    pub async fn attach(&self, player_id: PlayerId, sink: PlayerSink) -> Result<LinkId, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Attach { player_id, sink, reply }, rx)
            .await?
    }

    /// Removes a player. Returns how many players remain.
    pub async fn leave(&self, player_id: PlayerId) -> Result<usize, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Leave { player_id, link: None, reply }, rx)
            .await?
    }

    /// Removes a player whose connection `link` ended, unless they have
    /// reconnected since ([`RoomError::Superseded`]).
    pub async fn disconnect(&self, player_id: PlayerId, link: LinkId) -> Result<usize, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(
            RoomCommand::Leave {
                player_id,
                link: Some(link),
                reply,
            },
            rx,
        )
        .await?
    }

    /// Releases a seat whose player never connected. `Ok(None)` if they
    /// did connect.
    pub async fn expire_unconnected(&self, player_id: PlayerId) -> Result<Option<usize>, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Expire { player_id, reply }, rx)
            .await?
    }

    /// Forwards an inbound event (fire-and-forget).
    ///
    /// Waits only for channel capacity, never for the event to be
    /// applied. Refusals are handled inside the room.
    pub async fn dispatch(&self, player_id: PlayerId, event: ClientEvent) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Event { player_id, event })
            .await
            .map_err(|_| self.unavailable())
    }

    pub async fn info(&self) -> Result<RoomInfo, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Info { reply }, rx).await
    }

    pub async fn summary(&self) -> Result<RoomListEntry, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Summary { reply }, rx).await
    }

    pub async fn snapshot(&self) -> Result<GameSnapshot, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Snapshot { reply }, rx).await
    }

    pub async fn stats(&self) -> Result<RoomStats, RoomError> {
        let (reply, rx) = oneshot::channel();
        self.request(RoomCommand::Stats { reply }, rx).await
    }

    /// Tells the actor to stop.
    pub async fn shutdown(&self) -> Result<(), RoomError> {
        self.sender
            .send(RoomCommand::Shutdown)
            .await
            .map_err(|_| self.unavailable())
    }

    async fn request<T>(
        &self,
        command: RoomCommand,
        rx: oneshot::Receiver<T>,
    ) -> Result<T, RoomError> {
        self.sender
            .send(command)
            .await
            .map_err(|_| self.unavailable())?;
        rx.await.map_err(|_| self.unavailable())
    }

    fn unavailable(&self) -> RoomError {
        RoomError::Unavailable(self.code.clone())
    }
}

/// The task-side half: a room plus its command receiver.
struct RoomActor {
    room: Room,
    /// Set when the last player leaves. A closed room admits no one.
    closed: bool,
    receiver: mpsc::Receiver<RoomCommand>,
}

impl RoomActor {
    async fn run(mut self) {
        tracing::info!(room_code = %self.room.code(), "room actor started");

        while let Some(command) = self.receiver.recv().await {
            match command {
                RoomCommand::Join {
                    player,
                    secret,
                    max_seats,
                    reply,
                } => {
                    let _ = reply.send(self.handle_join(player, &secret, max_seats));
                }
                RoomCommand::Attach {
                    player_id,
                    sink,
                    reply,
                } => {
                    let result = if self.closed {
                        Err(RoomError::Closed(self.room.code().clone()))
                    } else {
                        self.room.attach(&player_id, sink)
                    };
                    let _ = reply.send(result);
                }
                RoomCommand::Leave {
                    player_id,
                    link,
                    reply,
                } => {
                    let result = match link {
                        Some(link) => self.room.disconnect(&player_id, link),
                        None => self.room.depart(&player_id),
                    };
                    if let Ok(remaining) = result {
                        self.mark_if_empty(remaining);
                    }
                    let _ = reply.send(result);
                }
                RoomCommand::Expire { player_id, reply } => {
                    let result = self.room.expire_unconnected(&player_id);
                    if let Ok(Some(remaining)) = result {
                        self.mark_if_empty(remaining);
                    }
                    let _ = reply.send(result);
                }
                RoomCommand::Event { player_id, event } => {
                    if let Err(err) = self.handle_event(&player_id, event) {
                        self.reject(&player_id, err);
                    }
                }
                RoomCommand::Info { reply } => {
                    let _ = reply.send(self.room.room_info());
                }
                RoomCommand::Summary { reply } => {
                    let _ = reply.send(self.room.summary());
                }
                RoomCommand::Snapshot { reply } => {
                    let _ = reply.send(self.room.game_snapshot());
                }
                RoomCommand::Stats { reply } => {
                    let _ = reply.send(self.room.stats());
                }
                RoomCommand::Shutdown => {
                    tracing::info!(room_code = %self.room.code(), "room shutting down");
                    break;
                }
            }
        }

        tracing::info!(room_code = %self.room.code(), "room actor stopped");
    }

    fn handle_join(
        &mut self,
        player: PlayerSession,
        secret: &str,
        max_seats: usize,
    ) -> Result<PlayerId, RoomError> {
        let code = self.room.code().clone();
        if self.closed {
            return Err(RoomError::Closed(code));
        }
        if !self.room.state().is_joinable() {
            return Err(RoomError::NotJoinable(self.room.state()));
        }
        if !self.room.check_secret(secret) {
            return Err(RoomError::WrongSecret(code));
        }
        if self.room.player(player.id()).is_some() {
            return Err(RoomError::AlreadyInRoom(player.id().clone(), code));
        }
        if self.room.len() >= max_seats {
            return Err(RoomError::RoomFull(code));
        }

        let player_id = player.id().clone();
        self.room.add_player(player);
        if self.room.owner().is_none() {
            self.room.set_owner(player_id.clone());
        }
        tracing::info!(
            room_code = %code,
            %player_id,
            players = self.room.len(),
            "player joined"
        );
        Ok(player_id)
    }

    fn mark_if_empty(&mut self, remaining: usize) {
        if remaining == 0 {
            self.closed = true;
            tracing::debug!(room_code = %self.room.code(), "room emptied, closing");
        }
    }

    fn handle_event(&mut self, player_id: &PlayerId, event: ClientEvent) -> Result<(), RoomError> {
        match event {
            ClientEvent::Chat { content } => self.room.chat(player_id, content),
            ClientEvent::GameStart {} => self.handle_start(player_id),
            ClientEvent::PlayTile { tile } => self.room.play_tile(player_id, tile),
            ClientEvent::Action { action_type, tiles } => {
                self.room.handle_player_action(player_id, action_type, tiles)
            }
            ClientEvent::LeaveRoom {} => {
                // Departures go through `RoomRegistry::depart` so an
                // emptied room also leaves the registry.
                tracing::trace!(room_code = %self.room.code(), %player_id, "leave_room ignored by actor");
                Ok(())
            }
        }
    }

    fn handle_start(&mut self, player_id: &PlayerId) -> Result<(), RoomError> {
        if self.room.owner() != Some(player_id) {
            return Err(RoomError::NotOwner(player_id.clone()));
        }
        let need = self.room.config().min_players;
        if self.room.len() < need {
            return Err(RoomError::NotEnoughPlayers {
                have: self.room.len(),
                need,
            });
        }
        self.room.start_game()?;
        let state = self.room.game_snapshot();
        self.room.broadcast_all(ServerEvent::GameStarted { state });
        Ok(())
    }

    fn reject(&self, player_id: &PlayerId, err: RoomError) {
        tracing::debug!(
            room_code = %self.room.code(),
            %player_id,
            error = %err,
            "request rejected"
        );
        if self.room.config().notify_rejections {
            self.room.send_to(
                player_id,
                ServerEvent::Rejected {
                    reason: err.to_string(),
                },
            );
        }
    }
}

/// Hands `room` to a new actor task and returns a handle to it.
///
/// `channel_size` from the room's config bounds the command queue. When
/// it is full, senders wait, which throttles a flooding client at its
/// own reader.
pub(crate) fn spawn_room(room: Room) -> RoomHandle {
    let code = room.code().clone();
    let (tx, rx) = mpsc::channel(room.config().channel_size.max(1));
    let actor = RoomActor {
        room,
        closed: false,
        receiver: rx,
    };

    tokio::spawn(actor.run());

    RoomHandle { code, sender: tx }
}
