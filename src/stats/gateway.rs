//! Capability interface over the player statistics backend.

use tracing::{instrument, warn};

use crate::PlayerId;
use crate::stats::{GatewayError, PlayerStats};

/// Reads and writes a player's aggregate statistics.
///
/// Implementations do not retry; callers decide what a failure means.
#[async_trait::async_trait]
pub trait StatsGateway: Send + Sync {
    /// Fetches the aggregates for a player.
    async fn read_stats(&self, player: &PlayerId) -> Result<PlayerStats, GatewayError>;

    /// Reports one finished game.
    async fn write_outcome(
        &self,
        player: &PlayerId,
        score: u32,
        won: bool,
    ) -> Result<(), GatewayError>;

    /// Short name for logs.
    fn name(&self) -> &str;
}

/// Reads stats, substituting zeroed aggregates on failure.
///
/// The error is handed back alongside the fallback so it can be shown or logged.
#[instrument(skip(gateway), fields(gateway = gateway.name(), player = %player))]
pub async fn read_stats_or_default(
    gateway: &dyn StatsGateway,
    player: &PlayerId,
) -> (PlayerStats, Option<GatewayError>) {
    match gateway.read_stats(player).await {
        Ok(stats) => (stats, None),
        Err(err) => {
            warn!(error = %err, "Stats unavailable, using zeroed fallback");
            (PlayerStats::default(), Some(err))
        }
    }
}
