//! Per-connection handler: identity assignment and event routing.
//!
//! Each accepted connection gets its own task running this handler. The
//! flow:
//!
//!   1. Derive the player's opaque id from the connection id and send
//!      `Welcome` so the client knows who it is.
//!   2. Spawn a writer task pumping room broadcasts out to the socket.
//!   3. Loop: decode `ClientEvent`s and route them through the registry.
//!   4. On disconnect, leave whatever room the player was in.

use std::sync::Arc;

use cuckoo_engine::PlayerId;
use cuckoo_protocol::{ClientEvent, Codec, RoomCode, ServerEvent};
use cuckoo_room::PlayerSender;
use cuckoo_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;

use crate::ServerError;
use crate::server::ServerState;

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection(
    conn: WebSocketConnection,
    state: Arc<ServerState>,
) -> Result<(), ServerError> {
    // No authentication layer: the connection id IS the player identity.
    let player_id = PlayerId(conn.id().into_inner());
    tracing::info!(conn = %conn.id(), %player_id, "connection opened");

    let welcome = state.codec.encode(&ServerEvent::Welcome { player_id })?;
    conn.send(&welcome).await?;

    // Everything a room wants this player to see flows through this
    // channel; the writer task serializes it onto the socket.
    let (sender, mut events) = mpsc::unbounded_channel::<ServerEvent>();
    let writer = {
        let conn = conn.clone();
        let codec = state.codec;
        tokio::spawn(async move {
            while let Some(event) = events.recv().await {
                let bytes = match codec.encode(&event) {
                    Ok(bytes) => bytes,
                    Err(e) => {
                        tracing::error!(error = %e, "failed to encode server event");
                        continue;
                    }
                };
                if conn.send(&bytes).await.is_err() {
                    break;
                }
            }
        })
    };

    let result = read_loop(&conn, &state, player_id, &sender).await;

    // Disconnect cleanup: drop room membership (the roster shrinks in a
    // lobby; a running game keeps the seat and just stops hearing from
    // this player).
    {
        let mut registry = state.registry.lock().await;
        if registry.player_room(&player_id).is_some() {
            if let Err(e) = registry.leave_room(player_id).await {
                tracing::debug!(%player_id, error = %e, "leave on disconnect failed");
            }
        }
    }
    drop(sender);
    writer.abort();

    tracing::info!(%player_id, "connection closed");
    result
}

/// Receives and dispatches client events until the socket closes.
async fn read_loop(
    conn: &WebSocketConnection,
    state: &Arc<ServerState>,
    player_id: PlayerId,
    sender: &PlayerSender,
) -> Result<(), ServerError> {
    loop {
        let data = match conn.recv().await {
            Ok(Some(data)) => data,
            Ok(None) => return Ok(()),
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "recv error");
                return Ok(());
            }
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%player_id, error = %e, "undecodable client event");
                let _ = sender.send(ServerEvent::ActionError {
                    message: format!("invalid message: {e}"),
                });
                continue;
            }
        };

        dispatch(state, player_id, sender, event).await;
    }
}

/// Routes one decoded client event. Validation failures are answered on
/// this player's channel only; they never touch shared state.
async fn dispatch(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    sender: &PlayerSender,
    event: ClientEvent,
) {
    match event {
        ClientEvent::CreateRoom { player_name } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry.create_room(player_id, player_name, sender.clone()).await
            };
            if let Err(e) = result {
                let _ = sender.send(ServerEvent::JoinError { message: e.to_string() });
            }
        }

        ClientEvent::JoinRoom { room_code, player_name } => {
            let result = {
                let mut registry = state.registry.lock().await;
                registry
                    .join_room(player_id, &room_code, player_name, sender.clone())
                    .await
            };
            if let Err(e) = result {
                let _ = sender.send(ServerEvent::JoinError { message: e.to_string() });
            }
        }

        ClientEvent::StartGame { room_code, starting_lives } => {
            let Some(room) = member_room(state, player_id, &room_code, sender).await else {
                return;
            };
            if let Err(e) = room.start_game(player_id, starting_lives).await {
                let _ = sender.send(ServerEvent::ActionError { message: e.to_string() });
            }
        }

        ClientEvent::PlayerAction { room_code, action } => {
            let Some(room) = member_room(state, player_id, &room_code, sender).await else {
                return;
            };
            if let Err(e) = room.action(player_id, action).await {
                let _ = sender.send(ServerEvent::ActionError { message: e.to_string() });
            }
        }
    }
}

/// Looks up the room for a game request, checking the caller is actually
/// a member; a caller-supplied room code is never trusted on its own.
async fn member_room(
    state: &Arc<ServerState>,
    player_id: PlayerId,
    room_code: &RoomCode,
    sender: &PlayerSender,
) -> Option<cuckoo_room::RoomHandle> {
    let registry = state.registry.lock().await;
    let room = match registry.player_room(&player_id) {
        Some(current) if current == room_code => registry.get(room_code),
        _ => None,
    };
    drop(registry);

    if room.is_none() {
        let _ = sender.send(ServerEvent::ActionError {
            message: "you are not in this room".into(),
        });
    }
    room
}
