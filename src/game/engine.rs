//! The round/turn state machine driving both solo and multiplayer games.
//!
//! The engine is a plain value: every operation mutates it synchronously
//! and returns the deferred work it caused as [`Effect`]s. Timers and the
//! bot live outside. Deferred callbacks carry the `round_seq` they were
//! scheduled under and are discarded once the rounds have moved on, so a
//! stale timer can never touch a later round.

use std::time::Duration;

use rand::rngs::StdRng;
use rand::SeedableRng;
use serde::Serialize;

use crate::game::{bot, scoring, turns, words};

pub const DEFAULT_MAX_ROUNDS: u32 = 10;
pub const ROUND_SECONDS: u32 = 60;
const WORD_CHOICES: usize = 3;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum GamePhase {
    Idle,
    WordSelection,
    PlayerDrawing,
    BotDrawing,
    EndOfRound,
    GameEnded,
}

impl GamePhase {
    pub fn is_drawing(self) -> bool {
        matches!(self, GamePhase::PlayerDrawing | GamePhase::BotDrawing)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Player {
    pub id: String,
    pub name: String,
    pub score: u32,
    pub is_drawing: bool,
    pub is_bot: bool,
}

impl Player {
    pub fn human(id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            score: 0,
            is_drawing: false,
            is_bot: false,
        }
    }

    pub fn bot() -> Self {
        Self {
            id: bot::BOT_ID.to_string(),
            name: bot::BOT_NAME.to_string(),
            score: 0,
            is_drawing: false,
            is_bot: true,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ChatMessage {
    pub id: u64,
    pub sender: String,
    pub text: String,
}

/// Game-level outcome recorded against a player's cumulative stats.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Win,
    Loss,
    Desertion,
}

/// Deferred work produced by an engine operation, interpreted by the
/// session layer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    /// The round clock should start counting down at 1 Hz.
    StartClock { seq: u64 },
    /// The bot drawer finishes "sketching" after the delay.
    BotSketch { seq: u64, delay: Duration },
    /// The bot's single guess attempt against the current round.
    BotGuess { seq: u64, delay: Duration },
    RoundOver { message: String },
    GameOver { message: String },
    Stat { player_id: String, outcome: Outcome },
}

#[derive(Debug, thiserror::Error)]
pub enum GameError {
    #[error("cannot start a round with no players")]
    EmptyRoster,
}

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub max_rounds: u32,
    pub round_seconds: u32,
    pub words: Vec<String>,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            max_rounds: DEFAULT_MAX_ROUNDS,
            round_seconds: ROUND_SECONDS,
            words: words::default_pool(),
        }
    }
}

/// Per-viewer snapshot handed to the presentation layer. The drawer sees
/// the full word, everyone else the masked form; snapshots are complete
/// states, never deltas, so re-delivery is harmless.
#[derive(Debug, Clone, Serialize)]
pub struct GameView {
    pub phase: GamePhase,
    pub round: u32,
    pub max_rounds: u32,
    pub time_left: u32,
    pub word: String,
    pub word_choices: Vec<String>,
    pub players: Vec<Player>,
    pub chat: Vec<ChatMessage>,
    pub you: String,
}

pub struct GameEngine {
    players: Vec<Player>,
    config: GameConfig,
    round: u32,
    round_seq: u64,
    phase: GamePhase,
    secret_word: String,
    word_choices: Vec<String>,
    time_left: u32,
    chat: Vec<ChatMessage>,
    next_chat_id: u64,
    rng: StdRng,
}

impl GameEngine {
    pub fn new(players: Vec<Player>, config: GameConfig) -> Result<Self, GameError> {
        Self::with_rng(players, config, StdRng::from_entropy())
    }

    #[cfg(test)]
    pub(crate) fn new_seeded(
        players: Vec<Player>,
        config: GameConfig,
        seed: u64,
    ) -> Result<Self, GameError> {
        Self::with_rng(players, config, StdRng::seed_from_u64(seed))
    }

    fn with_rng(players: Vec<Player>, config: GameConfig, rng: StdRng) -> Result<Self, GameError> {
        if players.is_empty() {
            return Err(GameError::EmptyRoster);
        }
        Ok(Self {
            players,
            config,
            round: 1,
            round_seq: 0,
            phase: GamePhase::Idle,
            secret_word: String::new(),
            word_choices: Vec::new(),
            time_left: 0,
            chat: Vec::new(),
            next_chat_id: 0,
            rng,
        })
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn round(&self) -> u32 {
        self.round
    }

    pub fn round_seq(&self) -> u64 {
        self.round_seq
    }

    pub fn time_left(&self) -> u32 {
        self.time_left
    }

    pub fn players(&self) -> &[Player] {
        &self.players
    }

    pub fn score_of(&self, player_id: &str) -> Option<u32> {
        self.players.iter().find(|p| p.id == player_id).map(|p| p.score)
    }

    pub fn is_drawer(&self, player_id: &str) -> bool {
        self.players.iter().any(|p| p.id == player_id && p.is_drawing)
    }

    /// Begin the current round: rotate the drawer, reset the clock and
    /// transcript, and either offer word choices (human drawer) or let
    /// the bot pick its word and start sketching.
    pub fn start_round(&mut self) -> Result<Vec<Effect>, GameError> {
        if self.players.is_empty() {
            return Err(GameError::EmptyRoster);
        }
        if self.phase == GamePhase::GameEnded {
            return Ok(Vec::new());
        }
        self.round_seq += 1;
        let drawer = turns::drawer_index(self.round, self.players.len());
        for (i, p) in self.players.iter_mut().enumerate() {
            p.is_drawing = i == drawer;
        }
        self.secret_word.clear();
        self.word_choices.clear();
        self.time_left = self.config.round_seconds;
        self.chat.clear();
        self.system_message(format!("Round {} started.", self.round));

        let mut effects = Vec::new();
        if self.players[drawer].is_bot {
            self.secret_word = words::draw(&self.config.words, &mut self.rng, 1)
                .pop()
                .unwrap_or_default();
            self.phase = GamePhase::BotDrawing;
            effects.push(Effect::StartClock { seq: self.round_seq });
            effects.push(Effect::BotSketch {
                seq: self.round_seq,
                delay: bot::SKETCH_DELAY,
            });
        } else {
            self.word_choices = words::draw(&self.config.words, &mut self.rng, WORD_CHOICES);
            self.phase = GamePhase::WordSelection;
        }
        Ok(effects)
    }

    /// The word choices currently on offer to the human drawer.
    pub fn offered_words(&self) -> &[String] {
        match self.phase {
            GamePhase::WordSelection => &self.word_choices,
            _ => &[],
        }
    }

    /// Drawer picks one of the offered words; the drawing phase begins
    /// and, when a bot is among the guessers, its attempt is planned.
    pub fn select_word(&mut self, word: &str) -> Vec<Effect> {
        if self.phase != GamePhase::WordSelection {
            return Vec::new();
        }
        if !self.word_choices.iter().any(|w| w == word) {
            return Vec::new();
        }
        self.secret_word = word.to_string();
        self.word_choices.clear();
        self.phase = GamePhase::PlayerDrawing;
        let mut effects = vec![Effect::StartClock { seq: self.round_seq }];
        if self.players.iter().any(|p| p.is_bot && !p.is_drawing) {
            if let Some(delay) = bot::plan_guess(&mut self.rng) {
                effects.push(Effect::BotGuess {
                    seq: self.round_seq,
                    delay,
                });
            }
        }
        effects
    }

    /// A chat submission. Always recorded in the transcript; evaluated as
    /// a guess only while a round is being drawn and the sender is not
    /// the drawer.
    pub fn submit_guess(&mut self, guesser_id: &str, text: &str) -> Vec<Effect> {
        let sender = match self.players.iter().find(|p| p.id == guesser_id) {
            Some(p) => p.name.clone(),
            None => return Vec::new(),
        };
        self.push_message(sender, text.to_string());
        if !self.phase.is_drawing() || self.is_drawer(guesser_id) {
            return Vec::new();
        }
        if scoring::is_correct_guess(text, &self.secret_word) {
            self.end_round(Some(guesser_id.to_string()))
        } else {
            Vec::new()
        }
    }

    /// One second elapsed on the round clock. No-op for stale timers and
    /// outside drawing phases; ends the round at zero.
    pub fn tick(&mut self, seq: u64) -> Vec<Effect> {
        if seq != self.round_seq || !self.phase.is_drawing() {
            return Vec::new();
        }
        self.time_left = self.time_left.saturating_sub(1);
        if self.time_left == 0 {
            self.end_round(None)
        } else {
            Vec::new()
        }
    }

    /// The bot's scheduled guess attempt firing. A stale attempt (the
    /// round moved on, or the bot is no longer guessing) is discarded.
    pub fn bot_guess(&mut self, seq: u64) -> Vec<Effect> {
        if seq != self.round_seq || self.phase != GamePhase::PlayerDrawing {
            return Vec::new();
        }
        let secret = self.secret_word.clone();
        self.submit_guess(bot::BOT_ID, &secret)
    }

    /// The bot drawer finished its sketching delay.
    pub fn bot_sketch_done(&mut self, seq: u64) -> Vec<Effect> {
        if seq != self.round_seq || self.phase != GamePhase::BotDrawing {
            return Vec::new();
        }
        self.system_message("Bot put the pencil down. Guess away!".to_string());
        Vec::new()
    }

    fn end_round(&mut self, guesser_id: Option<String>) -> Vec<Effect> {
        self.phase = GamePhase::EndOfRound;
        let word = std::mem::take(&mut self.secret_word);
        let drawer = self.players.iter().position(|p| p.is_drawing);
        let message = match guesser_id {
            Some(guesser_id) => {
                let (guesser_pts, drawer_pts) = scoring::guessed_points(self.time_left);
                let mut guesser_name = String::new();
                let mut drawer_name = String::new();
                for (i, p) in self.players.iter_mut().enumerate() {
                    if p.id == guesser_id {
                        p.score += guesser_pts;
                        guesser_name = p.name.clone();
                    } else if Some(i) == drawer {
                        p.score += drawer_pts;
                        drawer_name = p.name.clone();
                    }
                }
                format!(
                    "{guesser_name} guessed the word \"{word}\"! \
                     {guesser_name} +{guesser_pts}, {drawer_name} +{drawer_pts}."
                )
            }
            None => {
                let mut drawer_name = String::new();
                if let Some(i) = drawer {
                    self.players[i].score += scoring::TIMEOUT_DRAWER_POINTS;
                    drawer_name = self.players[i].name.clone();
                }
                format!(
                    "Time is up! Nobody guessed \"{word}\". {drawer_name} +{}.",
                    scoring::TIMEOUT_DRAWER_POINTS
                )
            }
        };
        self.system_message(message.clone());
        vec![Effect::RoundOver { message }]
    }

    /// Move past the round summary: start the next round, or finish the
    /// game once the last round has been played. A no-op in every other
    /// phase, so repeated calls are harmless.
    pub fn advance(&mut self) -> Result<Vec<Effect>, GameError> {
        if self.phase != GamePhase::EndOfRound {
            return Ok(Vec::new());
        }
        self.round += 1;
        if self.round > self.config.max_rounds {
            Ok(self.finish_game())
        } else {
            self.phase = GamePhase::Idle;
            self.start_round()
        }
    }

    fn finish_game(&mut self) -> Vec<Effect> {
        self.phase = GamePhase::GameEnded;
        for p in &mut self.players {
            p.is_drawing = false;
        }
        let top = self.players.iter().map(|p| p.score).max().unwrap_or(0);
        let mut standings: Vec<&Player> = self.players.iter().collect();
        standings.sort_by(|a, b| b.score.cmp(&a.score));
        let summary = standings
            .iter()
            .map(|p| format!("{} {} pts", p.name, p.score))
            .collect::<Vec<_>>()
            .join(", ");
        let message = format!("Game over! Final standings: {summary}.");
        let mut effects = vec![Effect::GameOver {
            message: message.clone(),
        }];
        for p in &self.players {
            if p.is_bot {
                continue;
            }
            effects.push(Effect::Stat {
                player_id: p.id.clone(),
                outcome: if p.score == top {
                    Outcome::Win
                } else {
                    Outcome::Loss
                },
            });
        }
        self.system_message(message);
        effects
    }

    /// A participant left. Idempotent on roster membership — desertion
    /// notifications may arrive more than once. A mid-draw departure
    /// abandons the round without scoring; when exactly one player is
    /// left the game ends immediately, crediting the remainder with the
    /// win and the departed with a desertion.
    pub fn handle_departure(&mut self, player_id: &str) -> Vec<Effect> {
        let Some(idx) = self.players.iter().position(|p| p.id == player_id) else {
            return Vec::new();
        };
        if self.phase == GamePhase::GameEnded {
            self.players.remove(idx);
            return Vec::new();
        }
        let departed = self.players.remove(idx);
        self.system_message(format!("{} left the game.", departed.name));
        if departed.is_drawing
            && matches!(
                self.phase,
                GamePhase::WordSelection | GamePhase::PlayerDrawing | GamePhase::BotDrawing
            )
        {
            // invalidate any clock/bot callbacks still in flight
            self.round_seq += 1;
            self.secret_word.clear();
            self.word_choices.clear();
            self.phase = GamePhase::EndOfRound;
            self.system_message("Round abandoned.".to_string());
        }
        match self.players.len() {
            0 => {
                self.phase = GamePhase::GameEnded;
                let message = "All players left the game.".to_string();
                vec![Effect::GameOver { message }]
            }
            1 => {
                self.phase = GamePhase::GameEnded;
                self.players[0].is_drawing = false;
                let winner = self.players[0].clone();
                let message = format!("{} won! {} deserted the game.", winner.name, departed.name);
                self.system_message(message.clone());
                let mut effects = vec![Effect::GameOver { message }];
                if !winner.is_bot {
                    effects.push(Effect::Stat {
                        player_id: winner.id,
                        outcome: Outcome::Win,
                    });
                }
                if !departed.is_bot {
                    effects.push(Effect::Stat {
                        player_id: departed.id,
                        outcome: Outcome::Desertion,
                    });
                }
                effects
            }
            _ => Vec::new(),
        }
    }

    pub fn view_for(&self, viewer_id: &str) -> GameView {
        let is_drawer = self.is_drawer(viewer_id);
        let word = if self.secret_word.is_empty() {
            String::new()
        } else if is_drawer {
            self.secret_word.clone()
        } else {
            words::mask(&self.secret_word)
        };
        let word_choices = if is_drawer && self.phase == GamePhase::WordSelection {
            self.word_choices.clone()
        } else {
            Vec::new()
        };
        GameView {
            phase: self.phase,
            round: self.round,
            max_rounds: self.config.max_rounds,
            time_left: self.time_left,
            word,
            word_choices,
            players: self.players.clone(),
            chat: self.chat.clone(),
            you: viewer_id.to_string(),
        }
    }

    fn system_message(&mut self, text: String) {
        self.push_message("System".to_string(), text);
    }

    fn push_message(&mut self, sender: String, text: String) {
        self.next_chat_id += 1;
        self.chat.push(ChatMessage {
            id: self.next_chat_id,
            sender,
            text,
        });
    }
}
