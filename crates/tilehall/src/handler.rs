//! Per-connection handler: routing, lobby loop, and room sessions.
//!
//! Each accepted connection gets its own Tokio task running this
//! handler. The upgrade request target picks the flow:
//!
//! - `/lobby` → answer [`LobbyRequest`]s until the client goes away
//! - `/ws/{roomID}?playerID={playerID}` → play in a room
//! - anything else → `error{400}` and close

use std::sync::Arc;
use std::time::Duration;

use tilehall_protocol::{ClientEvent, Codec, LobbyRequest, LobbyResponse, PlayerId, RoomCode, ServerEvent};
use tilehall_room::{RoomError, RoomHandle, RoomRegistry};
use tilehall_session::LinkId;
use tilehall_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::TilehallError;
use crate::error::room_status;
use crate::server::ServerState;

/// Where a connection wants to go.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) enum Route {
    Lobby,
    Room { code: RoomCode, player_id: PlayerId },
    Invalid(&'static str),
}

/// Parses an upgrade request target (`path[?query]`).
pub(crate) fn parse_route(target: &str) -> Route {
    let (path, query) = target.split_once('?').unwrap_or((target, ""));

    if path == "/lobby" {
        return Route::Lobby;
    }

    let Some(code) = path.strip_prefix("/ws/") else {
        return Route::Invalid("unknown path");
    };
    let player_id = query
        .split('&')
        .find_map(|pair| pair.strip_prefix("playerID="))
        .unwrap_or("");

    if code.is_empty() || code.contains('/') || player_id.is_empty() {
        return Route::Invalid("missing roomID or playerID");
    }
    Route::Room {
        code: RoomCode::from(code),
        player_id: PlayerId::from(player_id),
    }
}

/// Drop guard that takes the player out of their room when the session
/// ends.
///
/// Runs even if the handler panics. `Drop` is synchronous, so the
/// departure is a fire-and-forget task. Unless the player asked to
/// leave, the departure is tied to this session's link: if the player
/// has reconnected meanwhile, the room keeps them.
struct DepartureGuard {
    registry: Arc<RoomRegistry>,
    code: RoomCode,
    player_id: PlayerId,
    link: LinkId,
    left: bool,
}

impl Drop for DepartureGuard {
    fn drop(&mut self) {
        let registry = Arc::clone(&self.registry);
        let code = self.code.clone();
        let player_id = self.player_id.clone();
        let link = self.link;
        let left = self.left;
        tokio::spawn(async move {
            let result = if left {
                registry.depart(&code, &player_id).await
            } else {
                registry.disconnect(&code, &player_id, link).await
            };
            match result {
                Ok(remaining) => {
                    tracing::debug!(room_code = %code, %player_id, remaining, "departure complete");
                }
                Err(e) => {
                    tracing::debug!(room_code = %code, %player_id, error = %e, "departure skipped");
                }
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TilehallError>
where
    C: Codec + Clone,
{
    let conn_id = conn.id();
    tracing::debug!(%conn_id, target = conn.target(), "handling new connection");

    match parse_route(conn.target()) {
        Route::Lobby => run_lobby(conn, state).await,
        Route::Room { code, player_id } => run_room_session(conn, state, code, player_id).await,
        Route::Invalid(reason) => {
            tracing::debug!(%conn_id, reason, "rejecting connection");
            send_error(&conn, &state.codec, 400, reason).await?;
            conn.close().await?;
            Ok(())
        }
    }
}

/// Answers lobby requests until the client closes or goes idle.
async fn run_lobby<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), TilehallError> {
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "lobby session started");

    while let Some(data) = next_frame(&conn, state.idle_timeout).await {
        let response = match state.codec.decode::<LobbyRequest>(&data) {
            Ok(request) => state.lobby.handle(request).await,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode lobby request");
                LobbyResponse::Error {
                    code: 400,
                    message: format!("invalid request: {e}"),
                }
            }
        };
        let bytes = state.codec.encode(&response)?;
        conn.send(&bytes).await?;
    }
    let _ = conn.close().await;
    Ok(())
}

/// Plays one seated player's connection to a room.
async fn run_room_session<C>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
    code: RoomCode,
    player_id: PlayerId,
) -> Result<(), TilehallError>
where
    C: Codec + Clone,
{
    let Some(room) = state.registry.get(&code).await else {
        let err = RoomError::NotFound(code);
        send_error(&conn, &state.codec, room_status(&err), &err.to_string()).await?;
        return Ok(());
    };

    let (sink, events) = mpsc::unbounded_channel();
    let link = match room.attach(player_id.clone(), sink).await {
        Ok(link) => link,
        Err(err) => {
            send_error(&conn, &state.codec, room_status(&err), &err.to_string()).await?;
            return Ok(());
        }
    };

    // From here on the player holds a connected seat; leaving the
    // function for any reason gives it up.
    let mut guard = DepartureGuard {
        registry: Arc::clone(&state.registry),
        code: code.clone(),
        player_id: player_id.clone(),
        link,
        left: false,
    };
    tracing::info!(room_code = %code, %player_id, %link, "room session started");

    let conn = Arc::new(conn);
    let writer = tokio::spawn(write_events(Arc::clone(&conn), events, state.codec.clone()));

    guard.left = read_events(&conn, &state, &room, &player_id).await?;

    writer.abort();
    let _ = conn.close().await;
    tracing::info!(room_code = %code, %player_id, %link, "room session ended");
    Ok(())
    // guard drops here → departure fires.
}

/// Forwards inbound events to the room until the connection ends.
/// Returns `true` if the player asked to leave the room.
async fn read_events<C: Codec>(
    conn: &WebSocketConnection,
    state: &ServerState<C>,
    room: &RoomHandle,
    player_id: &PlayerId,
) -> Result<bool, TilehallError> {
    while let Some(data) = next_frame(conn, state.idle_timeout).await {
        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "failed to decode client event");
                send_error(conn, &state.codec, 400, &format!("invalid message: {e}")).await?;
                continue;
            }
        };

        if matches!(event, ClientEvent::LeaveRoom {}) {
            tracing::info!(%player_id, "player asked to leave");
            return Ok(true);
        }

        if let Err(e) = room.dispatch(player_id.clone(), event).await {
            tracing::debug!(%player_id, error = %e, "room went away");
            break;
        }
    }
    Ok(false)
}

/// Drains a player's outbound events into the socket, in order.
async fn write_events<C: Codec>(
    conn: Arc<WebSocketConnection>,
    mut events: mpsc::UnboundedReceiver<ServerEvent>,
    codec: C,
) {
    while let Some(event) = events.recv().await {
        let bytes = match codec.encode(&event) {
            Ok(bytes) => bytes,
            Err(e) => {
                tracing::warn!(error = %e, "failed to encode server event");
                continue;
            }
        };
        if let Err(e) = conn.send(&bytes).await {
            tracing::debug!(conn_id = %conn.id(), error = %e, "send failed, stopping writer");
            break;
        }
    }
}

/// Waits for the next frame. `None` on close, error or idle timeout.
async fn next_frame(conn: &WebSocketConnection, idle: Duration) -> Option<Vec<u8>> {
    let conn_id = conn.id();
    match tokio::time::timeout(idle, conn.recv()).await {
        Ok(Ok(Some(data))) => Some(data),
        Ok(Ok(None)) => {
            tracing::debug!(%conn_id, "connection closed cleanly");
            None
        }
        Ok(Err(e)) => {
            tracing::debug!(%conn_id, error = %e, "recv error");
            None
        }
        Err(_) => {
            tracing::info!(%conn_id, "connection timed out");
            None
        }
    }
}

/// Sends an `error` event straight to the socket.
async fn send_error(
    conn: &WebSocketConnection,
    codec: &impl Codec,
    code: u16,
    message: &str,
) -> Result<(), TilehallError> {
    let event = ServerEvent::Error {
        code,
        message: message.to_string(),
    };
    let bytes = codec.encode(&event)?;
    conn.send(&bytes).await?;
    Ok(())
}
