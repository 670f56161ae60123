//! Player statistics domain types.

use derive_new::new;
use serde::{Deserialize, Serialize};
use tracing::instrument;

/// Aggregate statistics for one player, as held by the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PlayerStats {
    /// Best score recorded.
    pub high_score: u32,
    /// Games reported.
    pub games_played: u32,
    /// Games reported as won.
    pub games_won: u32,
    /// Games reported as lost.
    pub games_lost: u32,
}

impl PlayerStats {
    /// Folds one reported game into the aggregates.
    ///
    /// Mirrors the ledger's `UpdateStats` operation.
    #[instrument]
    pub fn record(&mut self, update: StatsUpdate) {
        self.high_score = self.high_score.max(update.score);
        self.games_played = self.games_played.saturating_add(1);
        if update.won {
            self.games_won = self.games_won.saturating_add(1);
        } else {
            self.games_lost = self.games_lost.saturating_add(1);
        }
    }

    /// Win rate as a percentage (0.0–100.0).
    #[instrument]
    pub fn win_rate(&self) -> f64 {
        if self.games_played == 0 {
            0.0
        } else {
            (self.games_won as f64 / self.games_played as f64) * 100.0
        }
    }
}

/// One game result reported to the ledger.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, new)]
pub struct StatsUpdate {
    /// Final score.
    pub score: u32,
    /// Whether the game was won.
    pub won: bool,
}
