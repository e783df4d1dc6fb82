//! The lobby: create a room, join one, or list them.
//!
//! A successful create or join seats the player and hands back their id.
//! The player then opens `/ws/{roomID}?playerID={playerID}` to play. A
//! seat nobody connects to within the grace period is released, so
//! abandoned rooms don't pile up in the registry.

use std::sync::Arc;
use std::time::Duration;

use tilehall_protocol::{LobbyRequest, LobbyResponse, PlayerId, RoomCode, RoomListEntry};
use tilehall_room::{RoomError, RoomRegistry};
use tilehall_session::PlayerSession;

use crate::LobbyError;

/// Seats players in rooms.
pub struct Lobby {
    registry: Arc<RoomRegistry>,
    max_seats: usize,
    connect_grace: Duration,
}

impl Lobby {
    pub fn new(registry: Arc<RoomRegistry>, max_seats: usize, connect_grace: Duration) -> Self {
        Self {
            registry,
            max_seats,
            connect_grace,
        }
    }

    /// Opens a room and seats its creator as owner.
    pub async fn create_room(
        &self,
        player_name: &str,
        password: &str,
    ) -> Result<(RoomCode, PlayerId), LobbyError> {
        let name = validate_name(player_name)?;
        let (handle, player_id) = self
            .registry
            .create_seated(Some(password.to_string()), PlayerSession::create(name))
            .await;
        let code = handle.code().clone();
        self.release_if_unconnected(code.clone(), player_id.clone());
        Ok((code, player_id))
    }

    /// Seats a player in an existing room.
    pub async fn join_room(
        &self,
        code: &RoomCode,
        player_name: &str,
        password: &str,
    ) -> Result<PlayerId, LobbyError> {
        let name = validate_name(player_name)?;
        let handle = self
            .registry
            .get(code)
            .await
            .ok_or_else(|| RoomError::NotFound(code.clone()))?;
        let player_id = handle
            .join(PlayerSession::create(name), password, self.max_seats)
            .await?;
        self.release_if_unconnected(code.clone(), player_id.clone());
        Ok(player_id)
    }

    pub async fn list_rooms(&self) -> Vec<RoomListEntry> {
        self.registry.summaries().await
    }

    /// Answers one lobby request.
    pub async fn handle(&self, request: LobbyRequest) -> LobbyResponse {
        let result = match request {
            LobbyRequest::CreateRoom {
                player_name,
                password,
            } => self.create_room(&player_name, &password).await,
            LobbyRequest::JoinRoom {
                room_id,
                player_name,
                password,
            } => self
                .join_room(&room_id, &player_name, &password)
                .await
                .map(|player_id| (room_id, player_id)),
            LobbyRequest::ListRooms {} => {
                return LobbyResponse::RoomList {
                    rooms: self.list_rooms().await,
                };
            }
        };

        match result {
            Ok((room_id, player_id)) => {
                tracing::info!(room_code = %room_id, %player_id, "seat granted");
                LobbyResponse::RoomJoined { room_id, player_id }
            }
            Err(err) => {
                tracing::debug!(error = %err, "lobby request refused");
                LobbyResponse::Error {
                    code: err.status(),
                    message: err.to_string(),
                }
            }
        }
    }

    /// After the grace period, frees the seat if its player never opened
    /// a room connection.
    fn release_if_unconnected(&self, code: RoomCode, player_id: PlayerId) {
        let registry = Arc::clone(&self.registry);
        let grace = self.connect_grace;
        tokio::spawn(async move {
            tokio::time::sleep(grace).await;
            match registry.expire_unconnected(&code, &player_id).await {
                Ok(Some(remaining)) => {
                    tracing::info!(room_code = %code, %player_id, remaining, "unclaimed seat released");
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::trace!(room_code = %code, %player_id, error = %e, "seat already gone");
                }
            }
        });
    }
}

fn validate_name(name: &str) -> Result<&str, LobbyError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LobbyError::EmptyName);
    }
    Ok(name)
}
