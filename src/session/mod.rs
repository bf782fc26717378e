//! Per-game runtime.
//!
//! A room serializes every mutation of its engine — socket messages, the
//! 1 Hz round clock, bot callbacks — through one mutex, then interprets
//! the effects the engine returned: spawning timers, recording stats off
//! the gameplay path, and pushing fresh snapshots to every participant.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;
use tokio::sync::mpsc::UnboundedSender;
use uuid::Uuid;

use crate::game::engine::{Effect, GameEngine, GamePhase, GameView, Outcome};
use crate::stats::StatsSink;
use crate::ws::ServerToClient;

/// Connected sockets of one room (a waiting lobby or a live game).
#[derive(Default)]
pub struct RoomConns {
    senders: Mutex<HashMap<Uuid, UnboundedSender<ServerToClient>>>,
}

impl RoomConns {
    pub fn attach(&self, player: Uuid, tx: UnboundedSender<ServerToClient>) {
        self.senders.lock().insert(player, tx);
    }

    pub fn detach(&self, player: Uuid) {
        self.senders.lock().remove(&player);
    }

    pub fn is_empty(&self) -> bool {
        self.senders.lock().is_empty()
    }

    pub fn broadcast(&self, msg: &ServerToClient) {
        for tx in self.senders.lock().values() {
            let _ = tx.send(msg.clone());
        }
    }

    fn snapshot(&self) -> Vec<(Uuid, UnboundedSender<ServerToClient>)> {
        self.senders
            .lock()
            .iter()
            .map(|(id, tx)| (*id, tx.clone()))
            .collect()
    }
}

pub struct GameRoom {
    pub id: Uuid,
    engine: Mutex<GameEngine>,
    conns: Arc<RoomConns>,
    stats: Arc<dyn StatsSink>,
}

impl GameRoom {
    pub fn new(
        id: Uuid,
        engine: GameEngine,
        conns: Arc<RoomConns>,
        stats: Arc<dyn StatsSink>,
    ) -> Arc<Self> {
        Arc::new(Self {
            id,
            engine: Mutex::new(engine),
            conns,
            stats,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.engine.lock().phase()
    }

    pub fn view_for(&self, player: Uuid) -> GameView {
        self.engine.lock().view_for(&player.to_string())
    }

    pub fn conns_empty(&self) -> bool {
        self.conns.is_empty()
    }

    /// Push a fresh snapshot to every connected participant. Snapshots
    /// are complete states, so re-sending one is always safe.
    fn broadcast_views(&self) {
        let engine = self.engine.lock();
        for (player, tx) in self.conns.snapshot() {
            let _ = tx.send(ServerToClient::GameUpdate {
                view: engine.view_for(&player.to_string()),
            });
        }
    }
}

/// Kick off the first round.
pub fn start_game(room: &Arc<GameRoom>) -> anyhow::Result<()> {
    let effects = room.engine.lock().start_round()?;
    apply_effects(room, effects);
    room.broadcast_views();
    Ok(())
}

pub fn handle_chat(room: &Arc<GameRoom>, player_id: &str, text: &str) {
    let text = text.trim();
    if text.is_empty() {
        return;
    }
    let effects = room.engine.lock().submit_guess(player_id, text);
    apply_effects(room, effects);
    room.broadcast_views();
}

pub fn handle_pick_word(room: &Arc<GameRoom>, player_id: &str, word: &str) {
    let effects = {
        let mut engine = room.engine.lock();
        if !engine.is_drawer(player_id) {
            return;
        }
        engine.select_word(word)
    };
    apply_effects(room, effects);
    room.broadcast_views();
}

pub fn handle_advance(room: &Arc<GameRoom>) {
    let effects = match room.engine.lock().advance() {
        Ok(effects) => effects,
        Err(err) => {
            tracing::warn!(room = %room.id, %err, "cannot advance round");
            return;
        }
    };
    apply_effects(room, effects);
    room.broadcast_views();
}

pub fn handle_departure(room: &Arc<GameRoom>, player_id: &str) {
    let effects = room.engine.lock().handle_departure(player_id);
    apply_effects(room, effects);
    room.broadcast_views();
}

fn apply_effects(room: &Arc<GameRoom>, effects: Vec<Effect>) {
    for effect in effects {
        match effect {
            Effect::StartClock { seq } => spawn_clock(room.clone(), seq),
            Effect::BotSketch { seq, delay } => spawn_bot_sketch(room.clone(), seq, delay),
            Effect::BotGuess { seq, delay } => spawn_bot_guess(room.clone(), seq, delay),
            Effect::RoundOver { message } => {
                room.conns.broadcast(&ServerToClient::RoundEnded { message })
            }
            Effect::GameOver { message } => {
                room.conns.broadcast(&ServerToClient::GameOver { message })
            }
            Effect::Stat { player_id, outcome } => record_stat(room, player_id, outcome),
        }
    }
}

/// 1 Hz countdown for one round; exits as soon as the engine moved on.
fn spawn_clock(room: Arc<GameRoom>, seq: u64) {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(Duration::from_secs(1)).await;
            let effects = {
                let mut engine = room.engine.lock();
                if engine.round_seq() != seq || !engine.phase().is_drawing() {
                    return;
                }
                engine.tick(seq)
            };
            apply_effects(&room, effects);
            room.broadcast_views();
        }
    });
}

fn spawn_bot_sketch(room: Arc<GameRoom>, seq: u64, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let effects = room.engine.lock().bot_sketch_done(seq);
        apply_effects(&room, effects);
        room.broadcast_views();
    });
}

fn spawn_bot_guess(room: Arc<GameRoom>, seq: u64, delay: Duration) {
    tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        let effects = room.engine.lock().bot_guess(seq);
        if effects.is_empty() {
            // the round moved on before the attempt fired
            return;
        }
        apply_effects(&room, effects);
        room.broadcast_views();
    });
}

fn record_stat(room: &Arc<GameRoom>, player_id: String, outcome: Outcome) {
    let stats = room.stats.clone();
    tokio::spawn(async move {
        if let Err(err) = stats.record(&player_id, outcome) {
            // best effort: the game carries on with stale stats
            tracing::warn!(%player_id, %err, "stat update failed");
        }
    });
}
