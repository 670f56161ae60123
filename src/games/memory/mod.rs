//! Memory-match game: deck generation, session state machine, scoring.

mod deck;
mod game;
mod scoring;
mod types;

pub use deck::{Deck, DeckError, DeckGenerator, SYMBOL_CATALOG};
pub use game::{GameSession, Generation, IgnoreReason, RevealOutcome, UnflipTicket};
pub use scoring::{MOVE_PENALTY, Outcome, SECOND_PENALTY, format_clock, score};
pub use types::{Card, CardId, Difficulty, GameStatus, Symbol};
