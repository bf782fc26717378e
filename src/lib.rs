//! Backend for szkic, a browser drawing-and-guessing party game: players
//! take turns drawing a secret word while the others guess it in chat,
//! either solo against a scripted bot or against other humans via lobbies.

pub mod auth;
pub mod config;
pub mod game;
pub mod http;
pub mod lobby;
pub mod session;
pub mod stats;
pub mod telemetry;
pub mod ws;
