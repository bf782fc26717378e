//! Websocket wire messages and connection handling.

pub mod connection;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::game::engine::GameView;
use crate::lobby::manager::Lobby;

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerToClient {
    Welcome {
        player_id: Uuid,
        lobby: Option<Lobby>,
        view: Option<GameView>,
    },
    LobbyUpdate {
        lobby: Lobby,
    },
    GameStart {
        room_id: Uuid,
    },
    GameUpdate {
        view: GameView,
    },
    RoundEnded {
        message: String,
    },
    GameOver {
        message: String,
    },
    Error {
        message: String,
    },
    Pong,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientToServer {
    Ping,
    /// Chat text; evaluated as a guess while someone else is drawing.
    Chat { text: String },
    /// Drawer's pick from the offered words.
    PickWord { word: String },
    /// Acknowledge the round summary and move on.
    NextRound,
    /// Creator starts the game from the waiting lobby.
    Start,
    Leave,
}
