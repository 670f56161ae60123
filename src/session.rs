//! Session lifecycle: dealing, reveal forwarding, deferred flip-back, and
//! reporting finished games to the stats gateway.
//!
//! Everything that mutates the board runs on the controller's own timeline.
//! Timers and gateway calls are spawned tasks that post a [`ControllerEvent`]
//! back into the controller's queue; callers drain the queue with
//! [`SessionController::next_event`] and apply each event with
//! [`SessionController::handle_event`]. Methods that spawn tasks must be called
//! from inside a Tokio runtime.

use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio::sync::mpsc;
use tokio::task::AbortHandle;
use tracing::{debug, info, instrument, warn};

use crate::PlayerId;
use crate::games::memory::{
    Card, Deck, DeckError, DeckGenerator, Difficulty, GameSession, GameStatus, Generation,
    Outcome, RevealOutcome, UnflipTicket,
};
use crate::stats::{GatewayError, PlayerStats, StatsGateway, read_stats_or_default};

/// Default delay before a mismatched pair flips back.
pub const UNFLIP_DELAY: Duration = Duration::from_millis(1000);

/// Result posted back to the controller by a timer or gateway task.
#[derive(Debug)]
pub enum ControllerEvent {
    /// Flip-back delay elapsed for a mismatched pair.
    FlipBack(UnflipTicket),
    /// A plain stats read finished.
    StatsLoaded {
        /// Request sequence number, used to drop superseded reads.
        seq: u64,
        /// Stats to display (zeroed on failure).
        stats: PlayerStats,
        /// Read failure, if any.
        error: Option<GatewayError>,
    },
    /// A finished game was written and the aggregates read back.
    OutcomeReported {
        /// Deck the report belongs to.
        generation: Generation,
        /// Write result.
        write: Result<(), GatewayError>,
        /// Stats read after the write (zeroed on failure).
        stats: PlayerStats,
        /// Read failure, if any.
        read_error: Option<GatewayError>,
    },
}

/// Serializable snapshot of everything a front end needs to draw.
#[derive(Debug, Clone, Serialize)]
pub struct ControllerView {
    /// Player the session belongs to.
    pub player_id: PlayerId,
    /// Difficulty of the current deck.
    pub difficulty: Difficulty,
    /// Lifecycle status.
    pub status: GameStatus,
    /// Cards in deck order.
    pub cards: Vec<Card>,
    /// Completed two-card attempts.
    pub moves: u32,
    /// Whole seconds on the clock.
    pub elapsed_seconds: u64,
    /// Pairs matched so far.
    pub matched_pairs: usize,
    /// Pairs in the deck.
    pub total_pairs: usize,
    /// Aggregates last read from the gateway.
    pub stats: PlayerStats,
    /// Settled result once the board is cleared.
    pub outcome: Option<Outcome>,
    /// Most recent gateway failure, for display.
    pub last_error: Option<String>,
}

/// Owns one player's game session and bridges it to the stats gateway.
pub struct SessionController {
    gateway: Arc<dyn StatsGateway>,
    player: PlayerId,
    generator: DeckGenerator,
    unflip_delay: Duration,
    difficulty: Difficulty,
    session: GameSession,
    pending_unflip: Option<AbortHandle>,
    outcome: Option<Outcome>,
    stats: PlayerStats,
    last_error: Option<GatewayError>,
    stats_seq: u64,
    events_tx: mpsc::UnboundedSender<ControllerEvent>,
    events_rx: mpsc::UnboundedReceiver<ControllerEvent>,
}

impl std::fmt::Debug for SessionController {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SessionController")
            .field("gateway", &self.gateway.name())
            .field("player", &self.player)
            .field("difficulty", &self.difficulty)
            .field("session", &self.session)
            .field("outcome", &self.outcome)
            .field("stats", &self.stats)
            .finish_non_exhaustive()
    }
}

impl SessionController {
    /// Creates a controller with an idle session.
    #[instrument(skip(gateway), fields(gateway = gateway.name()))]
    pub fn new(gateway: Arc<dyn StatsGateway>, player: PlayerId) -> Self {
        info!(player = %player, "Creating SessionController");
        let (events_tx, events_rx) = mpsc::unbounded_channel();
        Self {
            gateway,
            player,
            generator: DeckGenerator::new(),
            unflip_delay: UNFLIP_DELAY,
            difficulty: Difficulty::default(),
            session: GameSession::new(),
            pending_unflip: None,
            outcome: None,
            stats: PlayerStats::default(),
            last_error: None,
            stats_seq: 0,
            events_tx,
            events_rx,
        }
    }

    /// Replaces the flip-back delay.
    pub fn with_unflip_delay(mut self, delay: Duration) -> Self {
        self.unflip_delay = delay;
        self
    }

    /// Replaces the deck generator.
    pub fn with_generator(mut self, generator: DeckGenerator) -> Self {
        self.generator = generator;
        self
    }

    /// Deals a fresh deck for the difficulty and starts the clock.
    ///
    /// An unfinished session is abandoned without reporting an outcome.
    ///
    /// # Errors
    ///
    /// Returns [`DeckError`] if the generator cannot build the deck; the
    /// current session is left untouched in that case.
    #[instrument(skip(self), fields(player = %self.player))]
    pub fn start_new_session(&mut self, difficulty: Difficulty) -> Result<Generation, DeckError> {
        let deck = self.generator.generate(difficulty)?;
        Ok(self.start_with_deck(difficulty, deck))
    }

    /// Starts a session over a prepared deck.
    #[instrument(skip(self, deck), fields(player = %self.player, cards = deck.len()))]
    pub fn start_with_deck(&mut self, difficulty: Difficulty, deck: Deck) -> Generation {
        self.discard_current("restart");
        self.difficulty = difficulty;
        self.outcome = None;

        let generation = self.session.start(deck);
        info!(%generation, %difficulty, "New session dealt");

        if self.session.status() == GameStatus::Won {
            self.on_terminal();
        }
        generation
    }

    /// Clears the board without reporting an outcome.
    #[instrument(skip(self), fields(player = %self.player))]
    pub fn abandon(&mut self) {
        self.discard_current("abandon");
        self.session.reset();
        self.outcome = None;
    }

    fn discard_current(&mut self, reason: &str) {
        if let Some(handle) = self.pending_unflip.take() {
            handle.abort();
            debug!(reason, "Cancelled pending flip-back");
        }
        if matches!(
            self.session.status(),
            GameStatus::Running | GameStatus::Resolving
        ) {
            info!(
                reason,
                generation = %self.session.generation(),
                moves = self.session.moves(),
                "Unfinished session discarded, no outcome reported"
            );
        }
    }

    /// Forwards a reveal to the session and schedules whatever it requires.
    #[instrument(skip(self))]
    pub fn on_reveal(&mut self, card_id: usize) -> RevealOutcome {
        let outcome = self.session.reveal(card_id);
        match outcome {
            RevealOutcome::Mismatched(ticket) => self.schedule_flip_back(ticket),
            RevealOutcome::Matched { won: true, .. } => self.on_terminal(),
            RevealOutcome::Matched { won: false, .. }
            | RevealOutcome::Revealed(_)
            | RevealOutcome::Ignored(_) => {}
        }
        outcome
    }

    fn schedule_flip_back(&mut self, ticket: UnflipTicket) {
        let tx = self.events_tx.clone();
        let delay = self.unflip_delay;
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver lives as long as the controller.
            let _ = tx.send(ControllerEvent::FlipBack(ticket));
        });
        if let Some(previous) = self.pending_unflip.replace(handle.abort_handle()) {
            previous.abort();
        }
        debug!(cards = ?ticket.cards(), delay_ms = delay.as_millis() as u64, "Flip-back scheduled");
    }

    /// Settles the finished session once and reports it in the background.
    fn on_terminal(&mut self) {
        if self.outcome.is_some() {
            return;
        }

        let outcome = Outcome::settle(
            self.difficulty,
            self.session.moves(),
            self.session.elapsed_seconds(),
            true,
        );
        self.outcome = Some(outcome);
        // Reads issued before the write must not overwrite the reported totals.
        self.stats_seq += 1;
        info!(
            score = outcome.score(),
            moves = outcome.moves(),
            elapsed = %outcome.clock(),
            "Session won"
        );

        let gateway = Arc::clone(&self.gateway);
        let player = self.player.clone();
        let generation = self.session.generation();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let write = gateway
                .write_outcome(&player, outcome.score(), outcome.won())
                .await;
            if let Err(err) = &write {
                warn!(error = %err, "Failed to report outcome");
            }
            let (stats, read_error) = read_stats_or_default(gateway.as_ref(), &player).await;
            let _ = tx.send(ControllerEvent::OutcomeReported {
                generation,
                write,
                stats,
                read_error,
            });
        });
    }

    /// Reads the player's aggregates in the background.
    #[instrument(skip(self), fields(player = %self.player))]
    pub fn refresh_stats(&mut self) {
        self.stats_seq += 1;
        let seq = self.stats_seq;
        let gateway = Arc::clone(&self.gateway);
        let player = self.player.clone();
        let tx = self.events_tx.clone();
        tokio::spawn(async move {
            let (stats, error) = read_stats_or_default(gateway.as_ref(), &player).await;
            let _ = tx.send(ControllerEvent::StatsLoaded { seq, stats, error });
        });
    }

    /// Waits for the next timer or gateway result.
    pub async fn next_event(&mut self) -> Option<ControllerEvent> {
        self.events_rx.recv().await
    }

    /// Applies a posted event. Returns false when it was stale and dropped.
    #[instrument(skip(self, event))]
    pub fn handle_event(&mut self, event: ControllerEvent) -> bool {
        match event {
            ControllerEvent::FlipBack(ticket) => {
                if ticket.generation() == self.session.generation() {
                    self.pending_unflip = None;
                }
                self.session.resolve_mismatch(ticket)
            }
            ControllerEvent::StatsLoaded { seq, stats, error } => {
                if seq != self.stats_seq {
                    debug!(seq, latest = self.stats_seq, "Dropping superseded stats read");
                    return false;
                }
                self.stats = stats;
                self.last_error = error;
                true
            }
            ControllerEvent::OutcomeReported {
                generation,
                write,
                stats,
                read_error,
            } => {
                if generation != self.session.generation() {
                    debug!(
                        %generation,
                        current = %self.session.generation(),
                        "Dropping outcome report for a superseded session"
                    );
                    // The write has landed by now; fetch fresh aggregates instead.
                    self.refresh_stats();
                    return false;
                }
                self.stats = stats;
                self.last_error = write.err().or(read_error);
                true
            }
        }
    }

    /// Waits for one event and applies it.
    pub async fn process_next(&mut self) -> bool {
        match self.next_event().await {
            Some(event) => self.handle_event(event),
            None => false,
        }
    }

    /// Snapshot for display.
    pub fn view(&self) -> ControllerView {
        ControllerView {
            player_id: self.player.clone(),
            difficulty: self.difficulty,
            status: self.session.status(),
            cards: self.session.cards().to_vec(),
            moves: self.session.moves(),
            elapsed_seconds: self.session.elapsed_seconds(),
            matched_pairs: self.session.matched_pairs(),
            total_pairs: self.session.total_pairs(),
            stats: self.stats,
            outcome: self.outcome,
            last_error: self.last_error.as_ref().map(ToString::to_string),
        }
    }

    /// The owned game session.
    pub fn session(&self) -> &GameSession {
        &self.session
    }

    /// Difficulty of the current deck.
    pub fn difficulty(&self) -> Difficulty {
        self.difficulty
    }

    /// Settled outcome of the current session, once won.
    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Aggregates last accepted from the gateway.
    pub fn stats(&self) -> PlayerStats {
        self.stats
    }

    /// Most recent gateway failure.
    pub fn last_error(&self) -> Option<&GatewayError> {
        self.last_error.as_ref()
    }

    /// Whether a flip-back timer is outstanding.
    pub fn has_pending_flip_back(&self) -> bool {
        self.pending_unflip.is_some()
    }

    /// Player this controller reports for.
    pub fn player(&self) -> &PlayerId {
        &self.player
    }
}
