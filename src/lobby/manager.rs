//! Registry of multiplayer lobbies.

use std::time::Duration;

use dashmap::DashMap;
use serde::Serialize;
use time::OffsetDateTime;
use uuid::Uuid;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum LobbyStatus {
    Waiting,
    InGame,
    Finished,
}

#[derive(Debug, Clone, Serialize)]
pub struct LobbyPlayer {
    pub id: Uuid,
    pub name: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct Lobby {
    pub id: Uuid,
    pub name: String,
    pub status: LobbyStatus,
    pub creator: Uuid,
    pub players: Vec<LobbyPlayer>,
    #[serde(skip)]
    pub created_at: OffsetDateTime,
}

#[derive(thiserror::Error, Debug)]
pub enum LobbyError {
    #[error("lobby not found")]
    NotFound,
    #[error("lobby name cannot be empty")]
    EmptyName,
    #[error("lobby is not accepting players")]
    NotWaiting,
    #[error("only the creator can start the game")]
    NotCreator,
    #[error("at least two players are needed to start")]
    NotEnoughPlayers,
}

#[derive(Clone, Default)]
pub struct LobbyManager {
    lobbies: DashMap<Uuid, Lobby>,
}

impl LobbyManager {
    pub fn new() -> Self {
        Self {
            lobbies: DashMap::new(),
        }
    }

    /// Create a lobby with the creator already seated.
    pub fn create(&self, name: &str, creator: Uuid, creator_name: &str) -> Result<Lobby, LobbyError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(LobbyError::EmptyName);
        }
        self.remove_from_waiting(creator);
        let lobby = Lobby {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status: LobbyStatus::Waiting,
            creator,
            players: vec![LobbyPlayer {
                id: creator,
                name: creator_name.to_string(),
            }],
            created_at: OffsetDateTime::now_utc(),
        };
        self.lobbies.insert(lobby.id, lobby.clone());
        Ok(lobby)
    }

    /// Lobbies still open for players, newest first.
    pub fn list_waiting(&self) -> Vec<Lobby> {
        let mut waiting: Vec<Lobby> = self
            .lobbies
            .iter()
            .filter(|l| l.status == LobbyStatus::Waiting)
            .map(|l| l.clone())
            .collect();
        waiting.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        waiting
    }

    pub fn get(&self, id: Uuid) -> Option<Lobby> {
        self.lobbies.get(&id).map(|l| l.clone())
    }

    /// Seat a player. A player sits in at most one waiting lobby at a
    /// time, so any previous seat is vacated first. Joining a lobby one
    /// is already in is a no-op.
    pub fn join(&self, id: Uuid, player: Uuid, name: &str) -> Result<Lobby, LobbyError> {
        // check the target first so a bad id doesn't unseat the player
        {
            let entry = self.lobbies.get(&id).ok_or(LobbyError::NotFound)?;
            if entry.status != LobbyStatus::Waiting {
                return Err(LobbyError::NotWaiting);
            }
            if entry.players.iter().any(|p| p.id == player) {
                return Ok(entry.clone());
            }
        }
        self.remove_from_waiting(player);
        let mut entry = self.lobbies.get_mut(&id).ok_or(LobbyError::NotFound)?;
        entry.players.push(LobbyPlayer {
            id: player,
            name: name.to_string(),
        });
        Ok(entry.clone())
    }

    /// Unseat a player. Returns the updated lobby, or `None` when the
    /// last player left and the lobby was deleted. Removing an absent
    /// player is a no-op.
    pub fn leave(&self, id: Uuid, player: Uuid) -> Result<Option<Lobby>, LobbyError> {
        let mut entry = self.lobbies.get_mut(&id).ok_or(LobbyError::NotFound)?;
        entry.players.retain(|p| p.id != player);
        if entry.players.is_empty() {
            drop(entry);
            self.lobbies.remove(&id);
            return Ok(None);
        }
        Ok(Some(entry.clone()))
    }

    /// Creator kicks the lobby into its game.
    pub fn start(&self, id: Uuid, requester: Uuid) -> Result<Lobby, LobbyError> {
        let mut entry = self.lobbies.get_mut(&id).ok_or(LobbyError::NotFound)?;
        if entry.creator != requester {
            return Err(LobbyError::NotCreator);
        }
        if entry.status != LobbyStatus::Waiting {
            return Err(LobbyError::NotWaiting);
        }
        if entry.players.len() < 2 {
            return Err(LobbyError::NotEnoughPlayers);
        }
        entry.status = LobbyStatus::InGame;
        Ok(entry.clone())
    }

    pub fn set_status(&self, id: Uuid, status: LobbyStatus) -> Result<Lobby, LobbyError> {
        let mut entry = self.lobbies.get_mut(&id).ok_or(LobbyError::NotFound)?;
        entry.status = status;
        Ok(entry.clone())
    }

    /// Drop finished lobbies older than `max_age`.
    pub fn prune_finished(&self, max_age: Duration) {
        let cutoff = OffsetDateTime::now_utc() - time::Duration::seconds(max_age.as_secs() as i64);
        self.lobbies
            .retain(|_, l| !(l.status == LobbyStatus::Finished && l.created_at < cutoff));
    }

    fn remove_from_waiting(&self, player: Uuid) {
        self.lobbies.retain(|_, l| {
            if l.status == LobbyStatus::Waiting {
                l.players.retain(|p| p.id != player);
            }
            !(l.status == LobbyStatus::Waiting && l.players.is_empty())
        });
    }
}
