//! End-to-end tests: real server, real WebSocket clients.

use std::sync::Arc;
use std::time::Duration;

use futures_util::{SinkExt, StreamExt};
use serde::Serialize;
use serde::de::DeserializeOwned;
use tilehall::prelude::*;
use tokio_tungstenite::tungstenite::Message;

// =========================================================================
// Helpers
// =========================================================================

type ClientWs = tokio_tungstenite::WebSocketStream<
    tokio_tungstenite::MaybeTlsStream<tokio::net::TcpStream>,
>;

const WAIT: Duration = Duration::from_secs(5);

/// Starts a server on a random port.
async fn start_with(builder: TilehallServerBuilder) -> (String, Arc<RoomRegistry>) {
    let server = builder
        .bind("127.0.0.1:0")
        .room_config(RoomConfig {
            rng_seed: Some(3),
            ..RoomConfig::default()
        })
        .build()
        .await
        .expect("server should build");

    let addr = server
        .local_addr()
        .expect("should have local addr")
        .to_string();
    let registry = server.registry();

    tokio::spawn(async move {
        let _ = server.run().await;
    });

    (addr, registry)
}

async fn start_server() -> (String, Arc<RoomRegistry>) {
    start_with(TilehallServer::builder()).await
}

async fn connect(addr: &str, path: &str) -> ClientWs {
    let (ws, _) = tokio_tungstenite::connect_async(format!("ws://{addr}{path}"))
        .await
        .expect("should connect");
    ws
}

async fn send<T: Serialize>(ws: &mut ClientWs, value: &T) {
    let text = serde_json::to_string(value).expect("encode");
    ws.send(Message::text(text)).await.expect("send");
}

/// Next data frame, decoded.
async fn recv<T: DeserializeOwned>(ws: &mut ClientWs) -> T {
    loop {
        let msg = tokio::time::timeout(WAIT, ws.next())
            .await
            .expect("timed out waiting for a frame")
            .expect("stream ended")
            .expect("websocket error");
        if msg.is_text() || msg.is_binary() {
            return serde_json::from_slice(&msg.into_data()).expect("decode");
        }
    }
}

/// Skips events until one matches.
async fn recv_until(ws: &mut ClientWs, pred: impl Fn(&ServerEvent) -> bool) -> ServerEvent {
    loop {
        let event: ServerEvent = recv(ws).await;
        if pred(&event) {
            return event;
        }
    }
}

/// Returns `true` once the server has closed the connection.
async fn closed_by_server(ws: &mut ClientWs) -> bool {
    loop {
        match tokio::time::timeout(WAIT, ws.next()).await {
            Err(_) => return false,
            Ok(None) | Ok(Some(Err(_))) | Ok(Some(Ok(Message::Close(_)))) => return true,
            Ok(Some(Ok(_))) => continue,
        }
    }
}

async fn create_room(lobby: &mut ClientWs, name: &str, password: &str) -> (RoomCode, PlayerId) {
    send(
        lobby,
        &LobbyRequest::CreateRoom {
            player_name: name.into(),
            password: password.into(),
        },
    )
    .await;
    match recv(lobby).await {
        LobbyResponse::RoomJoined { room_id, player_id } => (room_id, player_id),
        other => panic!("expected room_joined, got {other:?}"),
    }
}

async fn join_room(
    lobby: &mut ClientWs,
    code: &RoomCode,
    name: &str,
    password: &str,
) -> LobbyResponse {
    send(
        lobby,
        &LobbyRequest::JoinRoom {
            room_id: code.clone(),
            player_name: name.into(),
            password: password.into(),
        },
    )
    .await;
    recv(lobby).await
}

fn joined_id(response: LobbyResponse) -> PlayerId {
    match response {
        LobbyResponse::RoomJoined { player_id, .. } => player_id,
        other => panic!("expected room_joined, got {other:?}"),
    }
}

/// Opens a room connection and consumes its `room_info`.
async fn enter(addr: &str, code: &RoomCode, player_id: &PlayerId) -> ClientWs {
    let mut ws = connect(addr, &format!("/ws/{code}?playerID={player_id}")).await;
    match recv(&mut ws).await {
        ServerEvent::RoomInfo(_) => ws,
        other => panic!("expected room_info, got {other:?}"),
    }
}

// =========================================================================
// Lobby
// =========================================================================

#[tokio::test]
async fn test_lobby_create_and_list() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;

    let (code, owner) = create_room(&mut lobby, "alice", "secret").await;
    assert!(RoomCode::is_valid(code.as_str()));

    send(&mut lobby, &LobbyRequest::ListRooms {}).await;
    match recv(&mut lobby).await {
        LobbyResponse::RoomList { rooms } => {
            assert_eq!(rooms.len(), 1);
            assert_eq!(rooms[0].id, code);
            assert_eq!(rooms[0].player_count, 1);
            assert!(rooms[0].has_password);
            assert_eq!(rooms[0].owner.as_ref().map(|o| &o.id), Some(&owner));
        }
        other => panic!("expected room_list, got {other:?}"),
    }
}

#[tokio::test]
async fn test_lobby_join_errors() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, _) = create_room(&mut lobby, "alice", "abc").await;

    let wrong = join_room(&mut lobby, &code, "bob", "xyz").await;
    assert!(matches!(wrong, LobbyResponse::Error { code: 401, .. }));

    let missing = join_room(&mut lobby, &RoomCode::from("ZZZZZZ"), "bob", "").await;
    assert!(matches!(missing, LobbyResponse::Error { code: 404, .. }));

    for name in ["bob", "carol", "dave"] {
        joined_id(join_room(&mut lobby, &code, name, "abc").await);
    }
    let full = join_room(&mut lobby, &code, "erin", "abc").await;
    assert!(matches!(full, LobbyResponse::Error { code: 403, .. }));
}

#[tokio::test]
async fn test_lobby_bad_request() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;

    lobby.send(Message::text("not json")).await.unwrap();
    assert!(matches!(
        recv::<LobbyResponse>(&mut lobby).await,
        LobbyResponse::Error { code: 400, .. }
    ));

    // The connection survives a bad frame.
    send(&mut lobby, &LobbyRequest::ListRooms {}).await;
    assert!(matches!(
        recv::<LobbyResponse>(&mut lobby).await,
        LobbyResponse::RoomList { .. }
    ));
}

// =========================================================================
// Routing
// =========================================================================

#[tokio::test]
async fn test_unknown_path_rejected() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr, "/nowhere").await;

    assert!(matches!(
        recv::<ServerEvent>(&mut ws).await,
        ServerEvent::Error { code: 400, .. }
    ));
    assert!(closed_by_server(&mut ws).await);
}

#[tokio::test]
async fn test_room_connection_unknown_room() {
    let (addr, _) = start_server().await;
    let mut ws = connect(&addr, "/ws/ZZZZZZ?playerID=nobody").await;

    assert!(matches!(
        recv::<ServerEvent>(&mut ws).await,
        ServerEvent::Error { code: 404, .. }
    ));
}

#[tokio::test]
async fn test_room_connection_unknown_player() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, _) = create_room(&mut lobby, "alice", "").await;

    let mut ws = connect(&addr, &format!("/ws/{code}?playerID=ghost")).await;
    assert!(matches!(
        recv::<ServerEvent>(&mut ws).await,
        ServerEvent::Error { code: 404, .. }
    ));
}

// =========================================================================
// Playing
// =========================================================================

#[tokio::test]
async fn test_full_game_flow() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, alice) = create_room(&mut lobby, "alice", "").await;
    let bob = joined_id(join_room(&mut lobby, &code, "bob", "").await);

    let mut alice_ws = enter(&addr, &code, &alice).await;
    let mut bob_ws = enter(&addr, &code, &bob).await;

    match recv(&mut alice_ws).await {
        ServerEvent::PlayerJoined { player } => assert_eq!(player.id, bob),
        other => panic!("expected player_joined, got {other:?}"),
    }

    send(&mut alice_ws, &ClientEvent::GameStart {}).await;

    let mut seats = Vec::new();
    for (id, mut ws) in [(alice.clone(), alice_ws), (bob.clone(), bob_ws)] {
        let tiles = match recv(&mut ws).await {
            ServerEvent::YourTiles { tiles } => tiles,
            other => panic!("expected your_tiles, got {other:?}"),
        };
        let state = match recv(&mut ws).await {
            ServerEvent::GameStarted { state } => state,
            other => panic!("expected game_started, got {other:?}"),
        };
        assert_eq!(state.remaining_tiles, 136 - 27);
        seats.push((id, ws, tiles, state.current_player_id));
    }

    let current = seats[0].3.clone().expect("someone holds the turn");
    let cur = seats.iter().position(|s| s.0 == current).unwrap();
    let other = 1 - cur;
    assert_eq!(seats[cur].2.len(), 14);
    assert_eq!(seats[other].2.len(), 13);

    let tile = seats[cur].2[0];
    send(&mut seats[cur].1, &ClientEvent::PlayTile { tile }).await;

    let played = ServerEvent::TilePlayed {
        player_id: current.clone(),
        tile,
    };
    let turn = ServerEvent::TurnChanged {
        player_id: seats[other].0.clone(),
    };

    assert_eq!(recv::<ServerEvent>(&mut seats[cur].1).await, played);
    assert_eq!(recv::<ServerEvent>(&mut seats[cur].1).await, turn);

    assert_eq!(recv::<ServerEvent>(&mut seats[other].1).await, played);
    assert!(matches!(
        recv::<ServerEvent>(&mut seats[other].1).await,
        ServerEvent::NewTile { .. }
    ));
    assert_eq!(recv::<ServerEvent>(&mut seats[other].1).await, turn);
}

#[tokio::test]
async fn test_out_of_turn_play_is_silent() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, alice) = create_room(&mut lobby, "alice", "").await;
    let bob = joined_id(join_room(&mut lobby, &code, "bob", "").await);
    let mut alice_ws = enter(&addr, &code, &alice).await;
    let mut bob_ws = enter(&addr, &code, &bob).await;

    send(&mut alice_ws, &ClientEvent::GameStart {}).await;
    let ServerEvent::YourTiles { tiles: bob_tiles } =
        recv_until(&mut bob_ws, |e| matches!(e, ServerEvent::YourTiles { .. })).await
    else {
        unreachable!()
    };
    let ServerEvent::GameStarted { state } =
        recv_until(&mut bob_ws, |e| matches!(e, ServerEvent::GameStarted { .. })).await
    else {
        unreachable!()
    };

    // Whoever is *not* on turn tries to discard, then chats.
    let (waiting_ws, waiting_tile) = if state.current_player_id.as_ref() == Some(&bob) {
        let ServerEvent::YourTiles { tiles } =
            recv_until(&mut alice_ws, |e| matches!(e, ServerEvent::YourTiles { .. })).await
        else {
            unreachable!()
        };
        (&mut alice_ws, tiles[0])
    } else {
        (&mut bob_ws, bob_tiles[0])
    };

    send(waiting_ws, &ClientEvent::PlayTile { tile: waiting_tile }).await;
    send(waiting_ws, &ClientEvent::Chat { content: "oops".into() }).await;

    // The refused discard produces nothing; the chat is the next event.
    match recv_until(waiting_ws, |e| !matches!(e, ServerEvent::GameStarted { .. })).await {
        ServerEvent::Chat { content, .. } => assert_eq!(content, "oops"),
        other => panic!("expected chat, got {other:?}"),
    }
}

#[tokio::test]
async fn test_bad_client_event_reports_error() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, alice) = create_room(&mut lobby, "alice", "").await;
    let mut ws = enter(&addr, &code, &alice).await;

    ws.send(Message::text(r#"{"type":"fly","data":{}}"#)).await.unwrap();
    assert!(matches!(
        recv::<ServerEvent>(&mut ws).await,
        ServerEvent::Error { code: 400, .. }
    ));

    send(&mut ws, &ClientEvent::Chat { content: "still here".into() }).await;
    match recv(&mut ws).await {
        ServerEvent::Chat { player_name, content, .. } => {
            assert_eq!(player_name, "alice");
            assert_eq!(content, "still here");
        }
        other => panic!("expected chat, got {other:?}"),
    }
}

// =========================================================================
// Leaving
// =========================================================================

#[tokio::test]
async fn test_owner_disconnect_reassigns_owner() {
    let (addr, _) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, alice) = create_room(&mut lobby, "alice", "").await;
    let bob = joined_id(join_room(&mut lobby, &code, "bob", "").await);
    let mut alice_ws = enter(&addr, &code, &alice).await;
    let mut bob_ws = enter(&addr, &code, &bob).await;
    recv::<ServerEvent>(&mut alice_ws).await; // player_joined

    alice_ws.close(None).await.unwrap();

    assert_eq!(
        recv::<ServerEvent>(&mut bob_ws).await,
        ServerEvent::PlayerLeft { player_id: alice }
    );
    assert_eq!(
        recv::<ServerEvent>(&mut bob_ws).await,
        ServerEvent::NewOwner { owner_id: bob }
    );
}

#[tokio::test]
async fn test_leave_room_destroys_empty_room() {
    let (addr, registry) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, alice) = create_room(&mut lobby, "alice", "").await;
    let mut ws = enter(&addr, &code, &alice).await;

    send(&mut ws, &ClientEvent::LeaveRoom {}).await;
    assert!(closed_by_server(&mut ws).await);

    let mut gone = false;
    for _ in 0..100 {
        if registry.get(&code).await.is_none() {
            gone = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert!(gone, "empty room should be removed");

    send(&mut lobby, &LobbyRequest::ListRooms {}).await;
    assert_eq!(
        recv::<LobbyResponse>(&mut lobby).await,
        LobbyResponse::RoomList { rooms: vec![] }
    );
}

#[tokio::test]
async fn test_reconnect_keeps_seat_when_old_connection_closes() {
    let (addr, registry) = start_server().await;
    let mut lobby = connect(&addr, "/lobby").await;
    let (code, alice) = create_room(&mut lobby, "alice", "").await;
    let bob = joined_id(join_room(&mut lobby, &code, "bob", "").await);

    let mut bob_ws = enter(&addr, &code, &bob).await;
    let mut alice_old = enter(&addr, &code, &alice).await;
    let mut alice_new = enter(&addr, &code, &alice).await;
    for _ in 0..2 {
        assert!(matches!(
            recv::<ServerEvent>(&mut bob_ws).await,
            ServerEvent::PlayerJoined { .. }
        ));
    }

    alice_old.close(None).await.unwrap();
    tokio::time::sleep(Duration::from_millis(200)).await;

    let info = registry.get(&code).await.expect("room still open").info().await.unwrap();
    let seated: Vec<_> = info.players.iter().map(|p| p.id.clone()).collect();
    assert_eq!(seated, vec![alice.clone(), bob.clone()]);

    // Nothing was announced; the next thing bob sees is alice talking.
    send(&mut alice_new, &ClientEvent::Chat { content: "back".into() }).await;
    match recv(&mut bob_ws).await {
        ServerEvent::Chat { player_id, .. } => assert_eq!(player_id, alice),
        other => panic!("expected chat, got {other:?}"),
    }

    // Closing the live connection departs exactly once.
    alice_new.close(None).await.unwrap();
    assert_eq!(
        recv::<ServerEvent>(&mut bob_ws).await,
        ServerEvent::PlayerLeft { player_id: alice }
    );
    assert_eq!(
        recv::<ServerEvent>(&mut bob_ws).await,
        ServerEvent::NewOwner { owner_id: bob.clone() }
    );
    send(&mut bob_ws, &ClientEvent::Chat { content: "alone".into() }).await;
    match recv(&mut bob_ws).await {
        ServerEvent::Chat { player_id, .. } => assert_eq!(player_id, bob),
        other => panic!("expected chat, got {other:?}"),
    }
}

#[tokio::test]
async fn test_unclaimed_rooms_are_released() {
    let (addr, registry) =
        start_with(TilehallServer::builder().connect_grace(Duration::from_millis(300))).await;
    let mut lobby = connect(&addr, "/lobby").await;
    for name in ["a", "b", "c", "d", "e"] {
        create_room(&mut lobby, name, "").await;
    }
    let (kept, owner) = create_room(&mut lobby, "f", "").await;
    let _owner_ws = enter(&addr, &kept, &owner).await;
    lobby.close(None).await.unwrap();

    let mut remaining = usize::MAX;
    for _ in 0..300 {
        remaining = registry.len().await;
        if remaining == 1 {
            break;
        }
        tokio::time::sleep(Duration::from_millis(10)).await;
    }
    assert_eq!(remaining, 1, "only the room with a connected player stays");
    assert!(registry.get(&kept).await.is_some());
}

#[tokio::test]
async fn test_idle_connection_closed() {
    let (addr, _) =
        start_with(TilehallServer::builder().idle_timeout(Duration::from_millis(100))).await;
    let mut lobby = connect(&addr, "/lobby").await;

    assert!(closed_by_server(&mut lobby).await);
}
