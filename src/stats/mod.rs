//! Cumulative player stats (wins, losses, desertions).
//!
//! Recording is best-effort: the session layer fires increments off the
//! gameplay path and only logs failures, so a broken sink can never stall
//! or roll back a game.

use dashmap::DashMap;
use serde::Serialize;

use crate::game::engine::Outcome;

#[derive(Debug, Default, Clone, Serialize)]
pub struct PlayerStats {
    pub wins: u32,
    pub losses: u32,
    pub desertions: u32,
}

pub trait StatsSink: Send + Sync {
    fn record(&self, player_id: &str, outcome: Outcome) -> anyhow::Result<()>;
}

/// In-process sink keyed by player id.
#[derive(Default)]
pub struct MemoryStats {
    entries: DashMap<String, PlayerStats>,
}

impl MemoryStats {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, player_id: &str) -> PlayerStats {
        self.entries
            .get(player_id)
            .map(|e| e.clone())
            .unwrap_or_default()
    }
}

impl StatsSink for MemoryStats {
    fn record(&self, player_id: &str, outcome: Outcome) -> anyhow::Result<()> {
        let mut entry = self.entries.entry(player_id.to_string()).or_default();
        match outcome {
            Outcome::Win => entry.wins += 1,
            Outcome::Loss => entry.losses += 1,
            Outcome::Desertion => entry.desertions += 1,
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn increments_accumulate_per_player() {
        let stats = MemoryStats::new();
        stats.record("a", Outcome::Win).unwrap();
        stats.record("a", Outcome::Win).unwrap();
        stats.record("a", Outcome::Desertion).unwrap();
        stats.record("b", Outcome::Loss).unwrap();
        let a = stats.get("a");
        assert_eq!((a.wins, a.losses, a.desertions), (2, 0, 1));
        let b = stats.get("b");
        assert_eq!((b.wins, b.losses, b.desertions), (0, 1, 0));
        // unknown players read as zeroes
        let c = stats.get("c");
        assert_eq!((c.wins, c.losses, c.desertions), (0, 0, 0));
    }
}
