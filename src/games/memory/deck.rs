//! Deck generation: symbol selection, pairing, and shuffling.

use std::collections::HashMap;

use rand::Rng;
use serde::Serialize;
use tracing::{debug, instrument};

use super::types::{Card, Difficulty, Symbol};

/// Ordered symbol catalog. Decks always draw from the front.
pub const SYMBOL_CATALOG: [&str; 32] = [
    "🐶", "🐱", "🐭", "🐹", "🐰", "🦊", "🐻", "🐼", "🐨", "🐯", "🦁", "🐮", "🐷", "🐸", "🐵", "🐔",
    "🐧", "🐦", "🐤", "🦆", "🦅", "🦉", "🦇", "🐺", "🐗", "🐴", "🦄", "🐝", "🐛", "🦋", "🐌", "🐞",
];

/// Errors raised while building a deck.
#[derive(Debug, Clone, PartialEq, Eq, derive_more::Display, derive_more::Error)]
pub enum DeckError {
    /// The catalog holds fewer symbols than the requested pair count.
    #[display("Requested {} pairs but the catalog only has {} symbols", requested, available)]
    InsufficientSymbols {
        /// Pairs the difficulty asked for.
        requested: usize,
        /// Symbols present in the catalog.
        available: usize,
    },

    /// A hand-built symbol list contains a symbol that does not appear exactly twice.
    #[display("Symbol {} appears {} times, expected 2", symbol, count)]
    UnpairedSymbol {
        /// Offending symbol.
        symbol: Symbol,
        /// Number of occurrences found.
        count: usize,
    },
}

/// Ordered sequence of cards for one session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Deck {
    cards: Vec<Card>,
}

impl Deck {
    /// Builds a deck from symbols in deal order.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::UnpairedSymbol`] unless every symbol appears exactly twice.
    #[instrument(skip(symbols), fields(len = symbols.len()))]
    pub fn from_symbols(symbols: Vec<Symbol>) -> Result<Self, DeckError> {
        let mut counts: HashMap<Symbol, usize> = HashMap::new();
        for symbol in &symbols {
            *counts.entry(*symbol).or_default() += 1;
        }

        if let Some((symbol, count)) = counts.into_iter().find(|(_, count)| *count != 2) {
            return Err(DeckError::UnpairedSymbol { symbol, count });
        }

        Ok(Self::deal(symbols))
    }

    fn deal(symbols: Vec<Symbol>) -> Self {
        let cards = symbols
            .into_iter()
            .enumerate()
            .map(|(id, symbol)| Card::new(id, symbol))
            .collect();
        Self { cards }
    }

    /// Number of pairs in the deck.
    pub fn pair_count(&self) -> usize {
        self.cards.len() / 2
    }

    /// Number of cards in the deck.
    pub fn len(&self) -> usize {
        self.cards.len()
    }

    /// Returns true for a deck with no cards.
    pub fn is_empty(&self) -> bool {
        self.cards.is_empty()
    }

    /// Cards in deal order.
    pub fn cards(&self) -> &[Card] {
        &self.cards
    }

    pub(super) fn into_cards(self) -> Vec<Card> {
        self.cards
    }
}

/// Builds shuffled, paired decks from a fixed symbol catalog.
#[derive(Debug, Clone, Copy)]
pub struct DeckGenerator {
    catalog: &'static [&'static str],
}

impl DeckGenerator {
    /// Creates a generator over [`SYMBOL_CATALOG`].
    pub fn new() -> Self {
        Self {
            catalog: &SYMBOL_CATALOG,
        }
    }

    /// Creates a generator over a custom catalog.
    pub fn with_catalog(catalog: &'static [&'static str]) -> Self {
        Self { catalog }
    }

    /// Deals a shuffled deck for the difficulty using the thread-local RNG.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::InsufficientSymbols`] if the catalog is too small.
    #[instrument(skip(self))]
    pub fn generate(&self, difficulty: Difficulty) -> Result<Deck, DeckError> {
        self.generate_with(difficulty, &mut rand::thread_rng())
    }

    /// Deals a shuffled deck for the difficulty using the given RNG.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError::InsufficientSymbols`] if the catalog is too small.
    #[instrument(skip(self, rng))]
    pub fn generate_with<R: Rng + ?Sized>(
        &self,
        difficulty: Difficulty,
        rng: &mut R,
    ) -> Result<Deck, DeckError> {
        let pair_count = difficulty.pair_count();
        if pair_count > self.catalog.len() {
            return Err(DeckError::InsufficientSymbols {
                requested: pair_count,
                available: self.catalog.len(),
            });
        }

        let catalog: &'static [&'static str] = self.catalog;
        let selected = catalog[..pair_count].iter().map(|glyph| Symbol::new(*glyph));
        let mut symbols: Vec<Symbol> = selected.clone().chain(selected).collect();
        shuffle(&mut symbols, rng);

        debug!(pair_count, cards = symbols.len(), "Deck dealt");
        Ok(Deck::deal(symbols))
    }
}

impl Default for DeckGenerator {
    fn default() -> Self {
        Self::new()
    }
}

/// Fisher–Yates: walk down from the last index, swapping with a uniform index in `[0, i]`.
fn shuffle<T, R: Rng + ?Sized>(items: &mut [T], rng: &mut R) {
    for i in (1..items.len()).rev() {
        let j = rng.gen_range(0..=i);
        items.swap(i, j);
    }
}
