//! WebSocket connection lifecycle.
//!
//! One socket per participant, bound to a room by a signed token. The
//! same endpoint serves the waiting lobby and the live game: once the
//! creator starts the game, already-connected sockets carry on.

use std::sync::Arc;

use axum::extract::ws::{Message, WebSocket};
use axum::extract::{Path, Query, State, WebSocketUpgrade};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use futures::{SinkExt, StreamExt};
use serde::Deserialize;
use tokio::sync::mpsc;
use uuid::Uuid;

use crate::auth;
use crate::game::engine::{GameConfig, GameEngine, GamePhase, Player};
use crate::http::routes::AppState;
use crate::lobby::manager::LobbyStatus;
use crate::session::{self, GameRoom};
use crate::ws::{ClientToServer, ServerToClient};

#[derive(Deserialize)]
pub struct WsQuery {
    pub token: String,
}

pub async fn ws_handler(
    State(state): State<AppState>,
    Path(room_id): Path<Uuid>,
    Query(WsQuery { token }): Query<WsQuery>,
    ws: WebSocketUpgrade,
) -> Result<impl IntoResponse, (StatusCode, String)> {
    let (tok_room, player_id) = auth::verify_token(&token)
        .map_err(|_| (StatusCode::UNAUTHORIZED, "invalid token".to_string()))?;
    if tok_room != room_id {
        return Err((StatusCode::UNAUTHORIZED, "token-room mismatch".to_string()));
    }
    if !state.games.contains_key(&room_id) && state.lobbies.get(room_id).is_none() {
        return Err((StatusCode::NOT_FOUND, "room not found".to_string()));
    }
    Ok(ws.on_upgrade(move |socket| handle_socket(state, room_id, player_id, socket)))
}

async fn handle_socket(state: AppState, room_id: Uuid, player_id: Uuid, socket: WebSocket) {
    let (ws_tx, mut ws_rx) = socket.split();
    let (tx, mut rx) = mpsc::unbounded_channel::<ServerToClient>();

    // forward server pushes to the socket
    tokio::spawn(async move {
        let mut ws_tx = ws_tx;
        while let Some(msg) = rx.recv().await {
            let text = serde_json::to_string(&msg).unwrap();
            if ws_tx.send(Message::Text(text)).await.is_err() {
                break;
            }
        }
    });

    let conns = state.conns_for(room_id);
    conns.attach(player_id, tx.clone());

    let view = state.games.get(&room_id).map(|r| r.view_for(player_id));
    let lobby = state.lobbies.get(room_id);
    let _ = tx.send(ServerToClient::Welcome {
        player_id,
        lobby: lobby.clone(),
        view,
    });
    if let Some(lobby) = lobby {
        conns.broadcast(&ServerToClient::LobbyUpdate { lobby });
    }

    while let Some(Ok(msg)) = ws_rx.next().await {
        match msg {
            Message::Text(text) => match serde_json::from_str::<ClientToServer>(&text) {
                Ok(msg) => {
                    if handle_client_msg(&state, room_id, player_id, &tx, msg) {
                        break;
                    }
                }
                Err(err) => {
                    let _ = tx.send(ServerToClient::Error {
                        message: format!("bad message: {}", err),
                    });
                }
            },
            Message::Close(_) => break,
            _ => {}
        }
    }

    conns.detach(player_id);
    // a dropped socket mid-game counts as desertion, same as an explicit leave
    handle_departure(&state, room_id, player_id);
    tracing::debug!(%room_id, %player_id, "ws closed");
}

/// Returns true when the connection should close.
fn handle_client_msg(
    state: &AppState,
    room_id: Uuid,
    player_id: Uuid,
    tx: &mpsc::UnboundedSender<ServerToClient>,
    msg: ClientToServer,
) -> bool {
    match msg {
        ClientToServer::Ping => {
            let _ = tx.send(ServerToClient::Pong);
        }
        ClientToServer::Chat { text } => {
            if let Some(room) = game_room(state, room_id) {
                session::handle_chat(&room, &player_id.to_string(), &text);
            }
        }
        ClientToServer::PickWord { word } => {
            if let Some(room) = game_room(state, room_id) {
                session::handle_pick_word(&room, &player_id.to_string(), &word);
            }
        }
        ClientToServer::NextRound => {
            if let Some(room) = game_room(state, room_id) {
                session::handle_advance(&room);
                finish_if_ended(state, room_id, &room);
            }
        }
        ClientToServer::Start => start_lobby_game(state, room_id, player_id, tx),
        ClientToServer::Leave => return true,
    }
    false
}

fn game_room(state: &AppState, room_id: Uuid) -> Option<Arc<GameRoom>> {
    state.games.get(&room_id).map(|r| r.clone())
}

fn start_lobby_game(
    state: &AppState,
    room_id: Uuid,
    player_id: Uuid,
    tx: &mpsc::UnboundedSender<ServerToClient>,
) {
    if state.games.contains_key(&room_id) {
        // duplicate start; the game is already running
        return;
    }
    let lobby = match state.lobbies.start(room_id, player_id) {
        Ok(lobby) => lobby,
        Err(err) => {
            let _ = tx.send(ServerToClient::Error {
                message: err.to_string(),
            });
            return;
        }
    };
    let players: Vec<Player> = lobby
        .players
        .iter()
        .map(|p| Player::human(p.id.to_string(), p.name.clone()))
        .collect();
    let engine = match GameEngine::new(players, GameConfig::default()) {
        Ok(engine) => engine,
        Err(err) => {
            let _ = tx.send(ServerToClient::Error {
                message: err.to_string(),
            });
            return;
        }
    };
    let conns = state.conns_for(room_id);
    let room = GameRoom::new(room_id, engine, conns.clone(), state.stats.clone());
    state.games.insert(room_id, room.clone());
    conns.broadcast(&ServerToClient::LobbyUpdate { lobby });
    conns.broadcast(&ServerToClient::GameStart { room_id });
    if let Err(err) = session::start_game(&room) {
        tracing::error!(%room_id, %err, "failed to start game");
    }
}

fn handle_departure(state: &AppState, room_id: Uuid, player_id: Uuid) {
    let is_multiplayer = state.lobbies.get(room_id).is_some();
    if let Some(room) = game_room(state, room_id) {
        if is_multiplayer {
            session::handle_departure(&room, &player_id.to_string());
            finish_if_ended(state, room_id, &room);
        } else {
            // a solo game dies with its only human; no desertion on record
            state.games.remove(&room_id);
        }
    }
    match state.lobbies.leave(room_id, player_id) {
        Ok(Some(lobby)) => {
            state
                .conns_for(room_id)
                .broadcast(&ServerToClient::LobbyUpdate { lobby });
        }
        Ok(None) | Err(_) => {}
    }
}

fn finish_if_ended(state: &AppState, room_id: Uuid, room: &Arc<GameRoom>) {
    if room.phase() == GamePhase::GameEnded {
        if let Ok(lobby) = state.lobbies.set_status(room_id, LobbyStatus::Finished) {
            state
                .conns_for(room_id)
                .broadcast(&ServerToClient::LobbyUpdate { lobby });
        }
    }
}
