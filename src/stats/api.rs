//! Stats gateway backed by the player-facing REST surface.

use serde::Deserialize;
use tracing::{debug, info, instrument, warn};

use crate::PlayerId;
use crate::stats::{GatewayError, PlayerStats, StatsGateway, StatsUpdate};

#[derive(Debug, Deserialize)]
struct ErrorBody {
    error: String,
}

/// HTTP client for `/api/player-stats/{player_id}`.
#[derive(Debug, Clone)]
pub struct StatsApiGateway {
    base_url: String,
    client: reqwest::Client,
}

impl StatsApiGateway {
    /// Creates a client against the server at `base_url`.
    #[instrument(skip_all, fields(base_url = %base_url))]
    pub fn new(base_url: String) -> Self {
        info!("Creating StatsApiGateway");
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::new(),
        }
    }

    fn url(&self, player: &PlayerId) -> String {
        format!("{}/api/player-stats/{}", self.base_url, player)
    }

    fn error_message(status: reqwest::StatusCode, body: &str) -> String {
        serde_json::from_str::<ErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or_else(|_| format!("HTTP {}", status))
    }
}

#[async_trait::async_trait]
impl StatsGateway for StatsApiGateway {
    #[instrument(skip(self), fields(player = %player))]
    async fn read_stats(&self, player: &PlayerId) -> Result<PlayerStats, GatewayError> {
        let response = self.client.get(self.url(player)).send().await?;
        let status = response.status();
        let body = response.text().await?;
        debug!(%status, body = %body, "Stats API response");

        if !status.is_success() {
            return Err(GatewayError::unreachable(Self::error_message(status, &body)));
        }

        serde_json::from_str(&body)
            .map_err(|e| GatewayError::invalid_response(format!("Invalid stats body: {}", e)))
    }

    #[instrument(skip(self), fields(player = %player))]
    async fn write_outcome(
        &self,
        player: &PlayerId,
        score: u32,
        won: bool,
    ) -> Result<(), GatewayError> {
        let response = self
            .client
            .post(self.url(player))
            .json(&StatsUpdate::new(score, won))
            .send()
            .await?;
        let status = response.status();

        if status.is_success() {
            debug!("Stats update accepted");
            return Ok(());
        }

        let body = response.text().await.unwrap_or_default();
        warn!(%status, body = %body, "Stats update refused");
        Err(GatewayError::rejected(Self::error_message(status, &body)))
    }

    fn name(&self) -> &str {
        "stats-api"
    }
}
