//! Core domain types for the memory-matching game.

use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, EnumString};
use tracing::instrument;

/// Card symbol drawn from the symbol catalog.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(transparent)]
pub struct Symbol(&'static str);

impl Symbol {
    /// Wraps a catalog entry.
    pub const fn new(glyph: &'static str) -> Self {
        Self(glyph)
    }

    /// Returns the glyph shown on the card face.
    pub fn glyph(&self) -> &'static str {
        self.0
    }
}

impl std::fmt::Display for Symbol {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.pad(self.0)
    }
}

/// Ordinal position of a card in the deck.
pub type CardId = usize;

/// A single card on the board.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Card {
    id: CardId,
    symbol: Symbol,
    is_flipped: bool,
    is_matched: bool,
}

impl Card {
    /// Creates a face-down, unmatched card.
    pub fn new(id: CardId, symbol: Symbol) -> Self {
        Self {
            id,
            symbol,
            is_flipped: false,
            is_matched: false,
        }
    }

    /// Position of this card in the deck.
    pub fn id(&self) -> CardId {
        self.id
    }

    /// Symbol on the card face.
    pub fn symbol(&self) -> Symbol {
        self.symbol
    }

    /// Whether the card is face-up.
    pub fn is_flipped(&self) -> bool {
        self.is_flipped
    }

    /// Whether the card belongs to a resolved pair.
    pub fn is_matched(&self) -> bool {
        self.is_matched
    }

    pub(super) fn set_flipped(&mut self, flipped: bool) {
        self.is_flipped = flipped;
    }

    pub(super) fn set_matched(&mut self) {
        self.is_matched = true;
    }
}

/// Difficulty tier, which fixes the grid size and the base score.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Default,
    Serialize,
    Deserialize,
    Display,
    EnumString,
    EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase", ascii_case_insensitive)]
pub enum Difficulty {
    /// 4x4 grid, 8 pairs.
    #[default]
    Easy,
    /// 6x6 grid, 18 pairs.
    Medium,
    /// 8x8 grid, 32 pairs.
    Hard,
}

impl Difficulty {
    /// Side length of the square grid.
    #[instrument]
    pub fn grid_side(self) -> usize {
        match self {
            Self::Easy => 4,
            Self::Medium => 6,
            Self::Hard => 8,
        }
    }

    /// Number of symbol pairs dealt for this tier.
    #[instrument]
    pub fn pair_count(self) -> usize {
        let side = self.grid_side();
        side * side / 2
    }

    /// Score awarded before move and time penalties.
    #[instrument]
    pub fn base_score(self) -> u32 {
        match self {
            Self::Easy => 1000,
            Self::Medium => 2000,
            Self::Hard => 3000,
        }
    }
}

/// Lifecycle status of a game session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum GameStatus {
    /// No deck dealt yet.
    Idle,
    /// Accepting reveals.
    Running,
    /// Two mismatched cards face-up, waiting for the deferred flip-back.
    Resolving,
    /// Every pair matched.
    Won,
}

impl GameStatus {
    /// Returns true once the session can no longer change.
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Won)
    }
}
