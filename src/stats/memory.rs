//! In-process stats store applying ledger semantics.

use std::collections::HashMap;
use std::sync::Mutex;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};

use tracing::{debug, info, instrument};

use crate::PlayerId;
use crate::stats::{GatewayError, PlayerStats, StatsGateway, StatsUpdate};

/// Stats gateway backed by a map, with switchable failures for tests.
#[derive(Debug, Default)]
pub struct InMemoryGateway {
    players: Mutex<HashMap<PlayerId, PlayerStats>>,
    fail_reads: AtomicBool,
    reject_writes: AtomicBool,
    writes: AtomicUsize,
}

impl InMemoryGateway {
    /// Creates an empty store.
    #[instrument]
    pub fn new() -> Self {
        info!("Creating InMemoryGateway");
        Self::default()
    }

    /// Seeds the aggregates for a player.
    #[instrument(skip(self))]
    pub fn insert(&self, player: PlayerId, stats: PlayerStats) {
        self.players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .insert(player, stats);
    }

    /// Makes every read fail as unreachable while set.
    pub fn set_fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    /// Makes every write come back rejected while set.
    pub fn set_reject_writes(&self, reject: bool) {
        self.reject_writes.store(reject, Ordering::SeqCst);
    }

    /// Number of writes that reached the store, accepted or not.
    pub fn write_count(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }

    /// Current aggregates for a player without going through the gateway.
    pub fn snapshot(&self, player: &PlayerId) -> PlayerStats {
        self.players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner())
            .get(player)
            .copied()
            .unwrap_or_default()
    }
}

#[async_trait::async_trait]
impl StatsGateway for InMemoryGateway {
    #[instrument(skip(self), fields(player = %player))]
    async fn read_stats(&self, player: &PlayerId) -> Result<PlayerStats, GatewayError> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(GatewayError::unreachable("In-memory store is offline"));
        }
        let stats = self.snapshot(player);
        debug!(?stats, "Read stats");
        Ok(stats)
    }

    #[instrument(skip(self), fields(player = %player))]
    async fn write_outcome(
        &self,
        player: &PlayerId,
        score: u32,
        won: bool,
    ) -> Result<(), GatewayError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(GatewayError::rejected("Operation status: Rejected"));
        }

        let mut players = self
            .players
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        let stats = players.entry(player.clone()).or_default();
        stats.record(StatsUpdate::new(score, won));
        debug!(?stats, "Outcome recorded");
        Ok(())
    }

    fn name(&self) -> &str {
        "in-memory"
    }
}
