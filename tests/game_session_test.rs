//! Tests for the game session state machine.

use std::time::Duration;

use memory_match::{
    Deck, GameSession, GameStatus, IgnoreReason, RevealOutcome, Symbol,
};

/// Deck laid out as `A B A B C C`: pairs at (0,2), (1,3), (4,5).
fn small_deck() -> Deck {
    let a = Symbol::new("A");
    let b = Symbol::new("B");
    let c = Symbol::new("C");
    Deck::from_symbols(vec![a, b, a, b, c, c]).expect("Valid deck")
}

fn running_session() -> GameSession {
    let mut session = GameSession::new();
    session.start(small_deck());
    session
}

fn assert_buffer_invariants(session: &GameSession) {
    assert!(session.flipped().len() <= 2);
    for &id in session.flipped() {
        assert!(!session.cards()[id].is_matched());
        assert!(session.cards()[id].is_flipped());
    }
    assert!(session.matched_pairs() <= session.total_pairs());
}

#[test]
fn test_new_session_is_idle_and_rejects_reveals() {
    let mut session = GameSession::new();
    assert_eq!(session.status(), GameStatus::Idle);
    assert_eq!(
        session.reveal(0),
        RevealOutcome::Ignored(IgnoreReason::NotRunning)
    );
    assert_eq!(session.elapsed_seconds(), 0);
}

#[test]
fn test_start_resets_counters() {
    let session = running_session();
    assert_eq!(session.status(), GameStatus::Running);
    assert_eq!(session.moves(), 0);
    assert_eq!(session.matched_pairs(), 0);
    assert_eq!(session.total_pairs(), 3);
    assert!(session.flipped().is_empty());
}

#[test]
fn test_match_resolves_immediately() {
    let mut session = running_session();

    assert_eq!(session.reveal(0), RevealOutcome::Revealed(0));
    assert_eq!(session.moves(), 0);

    let outcome = session.reveal(2);
    assert_eq!(
        outcome,
        RevealOutcome::Matched {
            cards: [0, 2],
            won: false
        }
    );
    assert_eq!(session.moves(), 1);
    assert_eq!(session.matched_pairs(), 1);
    assert!(session.cards()[0].is_matched());
    assert!(session.cards()[2].is_matched());
    assert!(session.flipped().is_empty());
    assert_eq!(session.status(), GameStatus::Running);
    assert_buffer_invariants(&session);
}

#[test]
fn test_mismatch_locks_board_until_resolved() {
    let mut session = running_session();

    session.reveal(0);
    let ticket = match session.reveal(1) {
        RevealOutcome::Mismatched(ticket) => ticket,
        other => panic!("Expected mismatch, got {other:?}"),
    };

    assert_eq!(session.moves(), 1);
    assert_eq!(session.status(), GameStatus::Resolving);
    assert_eq!(ticket.cards(), [0, 1]);
    assert_eq!(session.flipped(), &[0, 1]);
    assert_buffer_invariants(&session);

    // Every other card is locked out while the pair is pending.
    for id in 2..6 {
        assert_eq!(
            session.reveal(id),
            RevealOutcome::Ignored(IgnoreReason::BoardLocked)
        );
    }
    assert_eq!(
        session.reveal(0),
        RevealOutcome::Ignored(IgnoreReason::AlreadyFlipped)
    );
    assert_eq!(session.moves(), 1);

    assert!(session.resolve_mismatch(ticket));
    assert_eq!(session.status(), GameStatus::Running);
    assert!(session.flipped().is_empty());
    assert!(!session.cards()[0].is_flipped());
    assert!(!session.cards()[1].is_flipped());

    // Redeeming twice does nothing.
    assert!(!session.resolve_mismatch(ticket));
}

#[test]
fn test_reveal_is_idempotent_on_flipped_and_matched_cards() {
    let mut session = running_session();

    session.reveal(4);
    let before = session.clone();
    assert_eq!(
        session.reveal(4),
        RevealOutcome::Ignored(IgnoreReason::AlreadyFlipped)
    );
    assert_eq!(session.cards(), before.cards());
    assert_eq!(session.flipped(), before.flipped());
    assert_eq!(session.moves(), before.moves());

    session.reveal(5);
    let before = session.clone();
    assert_eq!(
        session.reveal(5),
        RevealOutcome::Ignored(IgnoreReason::AlreadyMatched)
    );
    assert_eq!(session.cards(), before.cards());
    assert_eq!(session.matched_pairs(), before.matched_pairs());
    assert_eq!(session.moves(), before.moves());
}

#[test]
fn test_unknown_card_is_ignored() {
    let mut session = running_session();
    assert_eq!(
        session.reveal(99),
        RevealOutcome::Ignored(IgnoreReason::UnknownCard)
    );
    assert!(session.flipped().is_empty());
}

#[test]
fn test_full_match_wins_and_freezes_state() {
    let mut session = running_session();

    session.reveal(0);
    session.reveal(2);
    session.reveal(1);
    session.reveal(3);
    session.reveal(4);
    let last = session.reveal(5);

    assert_eq!(
        last,
        RevealOutcome::Matched {
            cards: [4, 5],
            won: true
        }
    );
    assert_eq!(session.status(), GameStatus::Won);
    assert_eq!(session.matched_pairs(), 3);
    assert_eq!(session.moves(), 3);
    assert_eq!(session.progress(), 1.0);

    let frozen = session.clone();
    for id in 0..6 {
        assert_eq!(
            session.reveal(id),
            RevealOutcome::Ignored(IgnoreReason::NotRunning)
        );
    }
    assert_eq!(session.cards(), frozen.cards());
    assert_eq!(session.moves(), frozen.moves());
}

#[test]
fn test_buffer_never_exceeds_two_during_play() {
    let mut session = running_session();
    let script = [0, 1, 2, 3, 4, 5, 0, 2, 1, 3, 4, 5];
    for id in script {
        session.reveal(id);
        assert_buffer_invariants(&session);
        if session.status() == GameStatus::Resolving {
            let cards = session.flipped().to_vec();
            assert_eq!(cards.len(), 2);
        }
    }
}

#[test]
fn test_empty_deck_is_won_on_start() {
    let mut session = GameSession::new();
    session.start(Deck::from_symbols(Vec::new()).expect("Empty deck"));

    assert_eq!(session.status(), GameStatus::Won);
    assert_eq!(session.total_pairs(), 0);
    assert_eq!(session.progress(), 0.0);
    assert_eq!(session.display(4), "");
    assert_eq!(
        session.reveal(0),
        RevealOutcome::Ignored(IgnoreReason::NotRunning)
    );
}

#[test]
fn test_restart_invalidates_old_ticket() {
    let mut session = running_session();
    let first_generation = session.generation();

    session.reveal(0);
    let ticket = match session.reveal(1) {
        RevealOutcome::Mismatched(ticket) => ticket,
        other => panic!("Expected mismatch, got {other:?}"),
    };
    assert_eq!(ticket.generation(), first_generation);

    let second_generation = session.start(small_deck());
    assert!(second_generation > first_generation);

    session.reveal(0);
    session.reveal(1);
    let snapshot = session.clone();

    // The old ticket names the same card ids but must not touch the new deck.
    assert!(!session.resolve_mismatch(ticket));
    assert_eq!(session.cards(), snapshot.cards());
    assert_eq!(session.flipped(), snapshot.flipped());
    assert_eq!(session.status(), GameStatus::Resolving);
}

#[test]
fn test_reset_returns_to_idle() {
    let mut session = running_session();
    session.reveal(0);
    let generation = session.generation();

    session.reset();
    assert_eq!(session.status(), GameStatus::Idle);
    assert!(session.cards().is_empty());
    assert!(session.generation() > generation);
}

#[test]
fn test_display_shows_ids_and_faces() {
    let mut session = running_session();
    session.reveal(0);
    session.reveal(2);

    assert_eq!(session.display(3), "  A   1   A\n  3   4   5");
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_counts_whole_seconds() {
    let mut session = running_session();
    assert_eq!(session.elapsed_seconds(), 0);

    tokio::time::advance(Duration::from_millis(2500)).await;
    assert_eq!(session.elapsed_seconds(), 2);

    tokio::time::advance(Duration::from_secs(40)).await;
    assert_eq!(session.elapsed_seconds(), 42);
}

#[tokio::test(start_paused = true)]
async fn test_elapsed_stops_at_win() {
    let mut session = running_session();
    tokio::time::advance(Duration::from_secs(7)).await;

    for id in [0, 2, 1, 3, 4, 5] {
        session.reveal(id);
    }
    assert_eq!(session.status(), GameStatus::Won);

    tokio::time::advance(Duration::from_secs(60)).await;
    assert_eq!(session.elapsed_seconds(), 7);
}
