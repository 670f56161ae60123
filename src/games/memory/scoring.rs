//! Final scoring of a finished session.

use serde::Serialize;
use tracing::instrument;

use super::types::Difficulty;

/// Points deducted per completed move.
pub const MOVE_PENALTY: i64 = 10;

/// Points deducted per elapsed second.
pub const SECOND_PENALTY: i64 = 5;

/// Settled result of one session, produced once at termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Outcome {
    moves: u32,
    elapsed_seconds: u64,
    score: u32,
    won: bool,
}

impl Outcome {
    /// Settles a session, applying the score formula.
    #[instrument]
    pub fn settle(difficulty: Difficulty, moves: u32, elapsed_seconds: u64, won: bool) -> Self {
        Self {
            moves,
            elapsed_seconds,
            score: score(difficulty, moves, elapsed_seconds),
            won,
        }
    }

    /// Moves made.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Whole seconds played.
    pub fn elapsed_seconds(&self) -> u64 {
        self.elapsed_seconds
    }

    /// Final score.
    pub fn score(&self) -> u32 {
        self.score
    }

    /// Whether the board was cleared.
    pub fn won(&self) -> bool {
        self.won
    }

    /// Elapsed time as `mm:ss`.
    pub fn clock(&self) -> String {
        format_clock(self.elapsed_seconds)
    }
}

/// `max(0, base - moves * 10 - seconds * 5)`.
#[instrument]
pub fn score(difficulty: Difficulty, moves: u32, elapsed_seconds: u64) -> u32 {
    let seconds = i64::try_from(elapsed_seconds).unwrap_or(i64::MAX);
    let raw = i64::from(difficulty.base_score())
        .saturating_sub(i64::from(moves).saturating_mul(MOVE_PENALTY))
        .saturating_sub(seconds.saturating_mul(SECOND_PENALTY));
    u32::try_from(raw.max(0)).unwrap_or(u32::MAX)
}

/// Formats whole seconds as zero-padded `mm:ss`.
pub fn format_clock(elapsed_seconds: u64) -> String {
    format!("{:02}:{:02}", elapsed_seconds / 60, elapsed_seconds % 60)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn easy_example_scores_680() {
        assert_eq!(score(Difficulty::Easy, 12, 40), 680);
    }

    #[test]
    fn score_floors_at_zero() {
        assert_eq!(score(Difficulty::Medium, 150, 500), 0);
    }

    #[test]
    fn huge_elapsed_does_not_overflow() {
        assert_eq!(score(Difficulty::Hard, u32::MAX, u64::MAX), 0);
    }

    #[test]
    fn perfect_hard_game_keeps_most_points() {
        assert_eq!(score(Difficulty::Hard, 32, 0), 2680);
    }

    #[test]
    fn clock_pads_minutes_and_seconds() {
        assert_eq!(format_clock(0), "00:00");
        assert_eq!(format_clock(65), "01:05");
        assert_eq!(format_clock(3600), "60:00");
    }

    #[test]
    fn settle_records_inputs() {
        let outcome = Outcome::settle(Difficulty::Easy, 8, 30, true);
        assert_eq!(outcome.moves(), 8);
        assert_eq!(outcome.elapsed_seconds(), 30);
        assert_eq!(outcome.score(), 770);
        assert!(outcome.won());
        assert_eq!(outcome.clock(), "00:30");
    }
}
