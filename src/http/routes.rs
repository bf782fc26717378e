//! HTTP routes: solo game creation, lobby CRUD, health.

use std::sync::Arc;
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use dashmap::DashMap;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::auth;
use crate::game::engine::{GameConfig, GameEngine, GamePhase, Player};
use crate::lobby::manager::{Lobby, LobbyError, LobbyManager};
use crate::session::{self, GameRoom, RoomConns};
use crate::stats::{MemoryStats, PlayerStats};

#[derive(Clone)]
pub struct AppState {
    pub lobbies: Arc<LobbyManager>,
    pub games: Arc<DashMap<Uuid, Arc<GameRoom>>>,
    pub conns: Arc<DashMap<Uuid, Arc<RoomConns>>>,
    pub stats: Arc<MemoryStats>,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            lobbies: Arc::new(LobbyManager::new()),
            games: Arc::new(DashMap::new()),
            conns: Arc::new(DashMap::new()),
            stats: Arc::new(MemoryStats::new()),
        }
    }

    /// Connection registry of a room, created on first use.
    pub fn conns_for(&self, room: Uuid) -> Arc<RoomConns> {
        self.conns.entry(room).or_default().clone()
    }

    /// Drop finished games nobody is watching, stale finished lobbies,
    /// and connection registries pointing at neither.
    pub fn prune(&self, max_age: Duration) {
        self.lobbies.prune_finished(max_age);
        self.games
            .retain(|_, room| !(room.phase() == GamePhase::GameEnded && room.conns_empty()));
        self.conns.retain(|id, conns| {
            !conns.is_empty() || self.games.contains_key(id) || self.lobbies.get(*id).is_some()
        });
    }
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

// Map errors to 500 for JSON endpoints
fn internal_error<E: std::fmt::Display>(err: E) -> (StatusCode, String) {
    (StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
}

fn lobby_error(err: LobbyError) -> (StatusCode, String) {
    let code = match err {
        LobbyError::NotFound => StatusCode::NOT_FOUND,
        LobbyError::EmptyName => StatusCode::BAD_REQUEST,
        LobbyError::NotWaiting | LobbyError::NotEnoughPlayers => StatusCode::CONFLICT,
        LobbyError::NotCreator => StatusCode::FORBIDDEN,
    };
    (code, err.to_string())
}

pub async fn health() -> &'static str {
    "ok"
}

#[derive(Debug, Deserialize)]
pub struct CreateSoloRequest {
    #[serde(default)]
    pub name: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct JoinResponse {
    pub room_id: Uuid,
    pub player_id: Uuid,
    pub token: String,
}

/// Create a solo game against the bot; the first round starts at once,
/// with the human drawing first.
pub async fn create_solo(
    State(state): State<AppState>,
    Json(req): Json<CreateSoloRequest>,
) -> Result<Json<JoinResponse>, (StatusCode, String)> {
    let player_id = Uuid::new_v4();
    let name = req.name.unwrap_or_else(|| "You".to_string());
    let players = vec![Player::human(player_id.to_string(), name), Player::bot()];
    let engine = GameEngine::new(players, GameConfig::default()).map_err(internal_error)?;
    let room_id = Uuid::new_v4();
    let room = GameRoom::new(room_id, engine, state.conns_for(room_id), state.stats.clone());
    state.games.insert(room_id, room.clone());
    session::start_game(&room).map_err(internal_error)?;
    let token = auth::issue_token(room_id, player_id).map_err(internal_error)?;
    Ok(Json(JoinResponse {
        room_id,
        player_id,
        token,
    }))
}

#[derive(Debug, Deserialize)]
pub struct CreateLobbyRequest {
    pub name: String,
    pub player_name: String,
}

#[derive(Debug, Serialize)]
pub struct LobbyJoinResponse {
    pub lobby: Lobby,
    pub player_id: Uuid,
    pub token: String,
}

pub async fn create_lobby(
    State(state): State<AppState>,
    Json(req): Json<CreateLobbyRequest>,
) -> Result<Json<LobbyJoinResponse>, (StatusCode, String)> {
    let player_id = Uuid::new_v4();
    let lobby = state
        .lobbies
        .create(&req.name, player_id, &req.player_name)
        .map_err(lobby_error)?;
    let token = auth::issue_token(lobby.id, player_id).map_err(internal_error)?;
    Ok(Json(LobbyJoinResponse {
        lobby,
        player_id,
        token,
    }))
}

pub async fn list_lobbies(State(state): State<AppState>) -> Json<Vec<Lobby>> {
    Json(state.lobbies.list_waiting())
}

/// Cumulative stats of one player; unknown players read as zeroes.
pub async fn player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Json<PlayerStats> {
    Json(state.stats.get(&player_id))
}

#[derive(Debug, Deserialize)]
pub struct JoinLobbyRequest {
    pub player_name: String,
}

pub async fn join_lobby(
    State(state): State<AppState>,
    Path(id): Path<Uuid>,
    Json(req): Json<JoinLobbyRequest>,
) -> Result<Json<LobbyJoinResponse>, (StatusCode, String)> {
    let player_id = Uuid::new_v4();
    let lobby = state
        .lobbies
        .join(id, player_id, &req.player_name)
        .map_err(lobby_error)?;
    // push the fresh roster to everyone already connected
    state
        .conns_for(id)
        .broadcast(&crate::ws::ServerToClient::LobbyUpdate {
            lobby: lobby.clone(),
        });
    let token = auth::issue_token(id, player_id).map_err(internal_error)?;
    Ok(Json(LobbyJoinResponse {
        lobby,
        player_id,
        token,
    }))
}
