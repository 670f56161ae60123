//! Game session state machine: reveal sequencing, match resolution, timing.
//!
//! The session is total over its input alphabet. Invalid reveals are reported
//! as [`RevealOutcome::Ignored`] and leave the state untouched; they are never
//! errors. A mismatch does not flip cards back by itself: it hands out an
//! [`UnflipTicket`] that the owner redeems through
//! [`GameSession::resolve_mismatch`] once the flip-back delay has elapsed.

use serde::Serialize;
use tokio::time::Instant;
use tracing::{debug, info, instrument, warn};

use super::deck::Deck;
use super::types::{Card, CardId, GameStatus};

/// Monotonic token identifying one dealt deck within a session object.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize)]
pub struct Generation(u64);

impl Generation {
    fn next(self) -> Self {
        Self(self.0 + 1)
    }
}

impl std::fmt::Display for Generation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Claim on a pending flip-back, bound to the deck it was issued for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UnflipTicket {
    generation: Generation,
    cards: [CardId; 2],
}

impl UnflipTicket {
    /// Deck generation the ticket was issued for.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// The two mismatched cards.
    pub fn cards(&self) -> [CardId; 2] {
        self.cards
    }
}

/// Why a reveal was dropped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, derive_more::Display)]
pub enum IgnoreReason {
    /// Session is idle or already won.
    #[display("session is not running")]
    NotRunning,
    /// No card with that id in the current deck.
    #[display("no such card")]
    UnknownCard,
    /// Card is already face-up.
    #[display("card already flipped")]
    AlreadyFlipped,
    /// Card belongs to a resolved pair.
    #[display("card already matched")]
    AlreadyMatched,
    /// Two cards are face-up awaiting resolution.
    #[display("board locked during resolution")]
    BoardLocked,
}

/// Result of a reveal.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RevealOutcome {
    /// The reveal was dropped and nothing changed.
    Ignored(IgnoreReason),
    /// First card of a pair turned face-up.
    Revealed(CardId),
    /// Second card matched the first.
    Matched {
        /// The matched pair.
        cards: [CardId; 2],
        /// True when this pair completed the board.
        won: bool,
    },
    /// Second card differs from the first; redeem the ticket after the delay.
    Mismatched(UnflipTicket),
}

/// One memory-match game over a dealt deck.
#[derive(Debug, Clone)]
pub struct GameSession {
    cards: Vec<Card>,
    flipped: Vec<CardId>,
    matched_pairs: usize,
    total_pairs: usize,
    moves: u32,
    status: GameStatus,
    started_at: Option<Instant>,
    finished_at: Option<Instant>,
    generation: Generation,
}

impl GameSession {
    /// Creates an idle session with no deck.
    #[instrument]
    pub fn new() -> Self {
        Self {
            cards: Vec::new(),
            flipped: Vec::with_capacity(2),
            matched_pairs: 0,
            total_pairs: 0,
            moves: 0,
            status: GameStatus::Idle,
            started_at: None,
            finished_at: None,
            generation: Generation::default(),
        }
    }

    /// Deals a fresh deck and starts the clock, discarding any previous board.
    ///
    /// An empty deck is won on the spot.
    #[instrument(skip(self, deck), fields(cards = deck.len()))]
    pub fn start(&mut self, deck: Deck) -> Generation {
        let now = Instant::now();
        self.total_pairs = deck.pair_count();
        self.cards = deck.into_cards();
        self.flipped.clear();
        self.matched_pairs = 0;
        self.moves = 0;
        self.started_at = Some(now);
        self.generation = self.generation.next();

        if self.total_pairs == 0 {
            self.status = GameStatus::Won;
            self.finished_at = Some(now);
            info!(generation = %self.generation, "Empty deck dealt, session won immediately");
        } else {
            self.status = GameStatus::Running;
            self.finished_at = None;
            info!(generation = %self.generation, total_pairs = self.total_pairs, "Session started");
        }

        self.generation
    }

    /// Turns a card face-up and resolves the pair when it is the second one.
    #[instrument(skip(self), fields(generation = %self.generation, status = %self.status))]
    pub fn reveal(&mut self, card_id: CardId) -> RevealOutcome {
        if let Some(reason) = self.check_reveal(card_id) {
            debug!(card_id, %reason, "Reveal ignored");
            return RevealOutcome::Ignored(reason);
        }

        self.cards[card_id].set_flipped(true);
        self.flipped.push(card_id);

        let [first, second] = match self.flipped[..] {
            [first, second] => [first, second],
            _ => {
                debug!(card_id, "First card revealed");
                return RevealOutcome::Revealed(card_id);
            }
        };

        self.moves += 1;

        if self.cards[first].symbol() != self.cards[second].symbol() {
            self.status = GameStatus::Resolving;
            debug!(first, second, moves = self.moves, "Mismatch, board locked");
            return RevealOutcome::Mismatched(UnflipTicket {
                generation: self.generation,
                cards: [first, second],
            });
        }

        self.cards[first].set_matched();
        self.cards[second].set_matched();
        self.flipped.clear();
        self.matched_pairs += 1;

        let won = self.matched_pairs == self.total_pairs;
        if won {
            self.status = GameStatus::Won;
            self.finished_at = Some(Instant::now());
            info!(moves = self.moves, elapsed = self.elapsed_seconds(), "All pairs matched");
        } else {
            debug!(first, second, matched = self.matched_pairs, "Pair matched");
        }

        RevealOutcome::Matched {
            cards: [first, second],
            won,
        }
    }

    fn check_reveal(&self, card_id: CardId) -> Option<IgnoreReason> {
        if self.status == GameStatus::Idle || self.status.is_terminal() {
            return Some(IgnoreReason::NotRunning);
        }

        let card = match self.cards.get(card_id) {
            Some(card) => card,
            None => return Some(IgnoreReason::UnknownCard),
        };

        if card.is_matched() {
            Some(IgnoreReason::AlreadyMatched)
        } else if card.is_flipped() {
            Some(IgnoreReason::AlreadyFlipped)
        } else if self.flipped.len() >= 2 {
            Some(IgnoreReason::BoardLocked)
        } else {
            None
        }
    }

    /// Flips a mismatched pair back face-down.
    ///
    /// Returns false, changing nothing, when the ticket belongs to an earlier
    /// deck or no longer describes the pending pair.
    #[instrument(skip(self), fields(current = %self.generation))]
    pub fn resolve_mismatch(&mut self, ticket: UnflipTicket) -> bool {
        if ticket.generation != self.generation {
            warn!(ticket_generation = %ticket.generation, "Dropping flip-back for a discarded deck");
            return false;
        }

        if self.status != GameStatus::Resolving || self.flipped[..] != ticket.cards[..] {
            warn!(status = %self.status, "Dropping flip-back that does not match the pending pair");
            return false;
        }

        for id in ticket.cards {
            self.cards[id].set_flipped(false);
        }
        self.flipped.clear();
        self.status = GameStatus::Running;
        debug!(cards = ?ticket.cards, "Mismatched pair flipped back");
        true
    }

    /// Whole seconds since the deck was dealt, frozen once the session is won.
    pub fn elapsed_seconds(&self) -> u64 {
        match (self.started_at, self.finished_at) {
            (Some(start), Some(end)) => end.duration_since(start).as_secs(),
            (Some(start), None) => start.elapsed().as_secs(),
            (None, _) => 0,
        }
    }

    /// Cards in deck order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    /// Ids of face-up cards awaiting resolution.
    pub fn flipped(&self) -> &[CardId] {
        &self.flipped
    }

    /// Pairs matched so far.
    pub fn matched_pairs(&self) -> usize {
        self.matched_pairs
    }

    /// Pairs in the dealt deck.
    pub fn total_pairs(&self) -> usize {
        self.total_pairs
    }

    /// Completed two-card attempts.
    pub fn moves(&self) -> u32 {
        self.moves
    }

    /// Current lifecycle status.
    pub fn status(&self) -> GameStatus {
        self.status
    }

    /// Token of the deck currently dealt.
    pub fn generation(&self) -> Generation {
        self.generation
    }

    /// Fraction of pairs matched, 0.0 for an empty deck.
    pub fn progress(&self) -> f64 {
        if self.total_pairs == 0 {
            0.0
        } else {
            self.matched_pairs as f64 / self.total_pairs as f64
        }
    }

    /// Clears the board back to idle.
    #[instrument(skip(self), fields(generation = %self.generation))]
    pub fn reset(&mut self) {
        self.cards.clear();
        self.flipped.clear();
        self.matched_pairs = 0;
        self.total_pairs = 0;
        self.moves = 0;
        self.status = GameStatus::Idle;
        self.started_at = None;
        self.finished_at = None;
        // Advance so tickets for the discarded deck cannot apply.
        self.generation = self.generation.next();
        debug!("Session reset to idle");
    }

    /// Formats the board as a human-readable grid.
    ///
    /// Face-down cards show their id so they can be picked by number.
    pub fn display(&self, columns: usize) -> String {
        let columns = columns.max(1);
        let mut result = String::new();
        for (row, chunk) in self.cards.chunks(columns).enumerate() {
            if row > 0 {
                result.push('\n');
            }
            let cells: Vec<String> = chunk
                .iter()
                .map(|card| {
                    if card.is_flipped() || card.is_matched() {
                        format!("{:>3}", card.symbol())
                    } else {
                        format!("{:>3}", card.id())
                    }
                })
                .collect();
            result.push_str(&cells.join(" "));
        }
        result
    }
}

impl Default for GameSession {
    fn default() -> Self {
        Self::new()
    }
}
