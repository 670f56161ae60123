//! Tests for deck generation.

use std::collections::HashMap;

use rand::SeedableRng;
use rand::rngs::StdRng;
use strum::IntoEnumIterator;

use memory_match::{Deck, DeckError, DeckGenerator, Difficulty, SYMBOL_CATALOG, Symbol};

fn symbol_counts(deck: &Deck) -> HashMap<Symbol, usize> {
    let mut counts = HashMap::new();
    for card in deck.cards() {
        *counts.entry(card.symbol()).or_insert(0) += 1;
    }
    counts
}

#[test]
fn test_every_difficulty_deals_exact_pairs() {
    let generator = DeckGenerator::new();
    for difficulty in Difficulty::iter() {
        let deck = generator.generate(difficulty).expect("Deck generation failed");

        assert_eq!(deck.len(), 2 * difficulty.pair_count());
        assert_eq!(deck.pair_count(), difficulty.pair_count());

        let counts = symbol_counts(&deck);
        assert_eq!(counts.len(), difficulty.pair_count());
        assert!(counts.values().all(|&n| n == 2), "{difficulty}: {counts:?}");
    }
}

#[test]
fn test_grid_sizes_and_base_scores() {
    assert_eq!(Difficulty::Easy.pair_count(), 8);
    assert_eq!(Difficulty::Medium.pair_count(), 18);
    assert_eq!(Difficulty::Hard.pair_count(), 32);
    assert_eq!(Difficulty::Easy.base_score(), 1000);
    assert_eq!(Difficulty::Medium.base_score(), 2000);
    assert_eq!(Difficulty::Hard.base_score(), 3000);
}

#[test]
fn test_symbols_come_from_front_of_catalog() {
    let deck = DeckGenerator::new()
        .generate(Difficulty::Easy)
        .expect("Deck generation failed");
    let counts = symbol_counts(&deck);
    for glyph in &SYMBOL_CATALOG[..8] {
        assert_eq!(counts.get(&Symbol::new(*glyph)), Some(&2), "missing {glyph}");
    }
}

#[test]
fn test_cards_start_face_down_with_ordinal_ids() {
    let deck = DeckGenerator::new()
        .generate(Difficulty::Medium)
        .expect("Deck generation failed");
    for (index, card) in deck.cards().iter().enumerate() {
        assert_eq!(card.id(), index);
        assert!(!card.is_flipped());
        assert!(!card.is_matched());
    }
}

#[test]
fn test_shuffle_preserves_multiset() {
    let mut rng = StdRng::seed_from_u64(42);
    let deck = DeckGenerator::new()
        .generate_with(Difficulty::Hard, &mut rng)
        .expect("Deck generation failed");

    let mut shuffled: Vec<&str> = deck.cards().iter().map(|c| c.symbol().glyph()).collect();
    let mut unshuffled: Vec<&str> = SYMBOL_CATALOG.iter().chain(SYMBOL_CATALOG.iter()).copied().collect();
    shuffled.sort_unstable();
    unshuffled.sort_unstable();
    assert_eq!(shuffled, unshuffled);
}

#[test]
fn test_seeded_generation_is_reproducible() {
    let generator = DeckGenerator::new();
    let a = generator
        .generate_with(Difficulty::Medium, &mut StdRng::seed_from_u64(9))
        .expect("Deck generation failed");
    let b = generator
        .generate_with(Difficulty::Medium, &mut StdRng::seed_from_u64(9))
        .expect("Deck generation failed");
    assert_eq!(a, b);
}

#[test]
fn test_repeated_generation_varies_order() {
    let generator = DeckGenerator::new();
    let first = generator.generate(Difficulty::Hard).expect("Deck generation failed");
    let differs = (0..20).any(|_| {
        generator.generate(Difficulty::Hard).expect("Deck generation failed") != first
    });
    assert!(differs, "20 consecutive 64-card decks came out identical");
}

#[test]
fn test_first_position_is_roughly_uniform() {
    // Easy decks: 8 symbols, each should land in slot 0 about 1/8 of the time.
    let generator = DeckGenerator::new();
    let mut rng = StdRng::seed_from_u64(2024);
    let trials = 8000;
    let mut hits: HashMap<Symbol, usize> = HashMap::new();
    for _ in 0..trials {
        let deck = generator
            .generate_with(Difficulty::Easy, &mut rng)
            .expect("Deck generation failed");
        *hits.entry(deck.cards()[0].symbol()).or_insert(0) += 1;
    }

    assert_eq!(hits.len(), 8);
    for (symbol, count) in hits {
        assert!((800..1200).contains(&count), "{symbol} landed first {count} times");
    }
}

#[test]
fn test_small_catalog_reports_insufficient_symbols() {
    static TINY: [&str; 10] = ["a", "b", "c", "d", "e", "f", "g", "h", "i", "j"];
    let generator = DeckGenerator::with_catalog(&TINY);

    assert!(generator.generate(Difficulty::Easy).is_ok());
    let err = generator
        .generate(Difficulty::Medium)
        .expect_err("18 pairs from 10 symbols should fail");
    assert_eq!(
        err,
        DeckError::InsufficientSymbols {
            requested: 18,
            available: 10
        }
    );
}

#[test]
fn test_from_symbols_rejects_unpaired() {
    let a = Symbol::new("a");
    let b = Symbol::new("b");

    assert!(Deck::from_symbols(vec![a, b, b, a]).is_ok());
    assert!(matches!(
        Deck::from_symbols(vec![a, b, a]),
        Err(DeckError::UnpairedSymbol { count: 1, .. })
    ));
    assert!(matches!(
        Deck::from_symbols(vec![a, a, a, a]),
        Err(DeckError::UnpairedSymbol { count: 4, .. })
    ));
    assert!(Deck::from_symbols(Vec::new()).expect("empty deck").is_empty());
}

#[test]
fn test_difficulty_parses_case_insensitively() {
    assert_eq!("easy".parse::<Difficulty>().ok(), Some(Difficulty::Easy));
    assert_eq!("HARD".parse::<Difficulty>().ok(), Some(Difficulty::Hard));
    assert!("impossible".parse::<Difficulty>().is_err());
    assert_eq!(Difficulty::Medium.to_string(), "medium");
}
