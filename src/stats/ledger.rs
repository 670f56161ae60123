//! Stats gateway speaking the ledger's GraphQL query/mutation protocol.

use std::collections::HashMap;
use std::sync::Mutex;

use serde::Deserialize;
use serde_json::{Value, json};
use tracing::{debug, info, instrument, warn};

use crate::PlayerId;
use crate::config::LedgerConfig;
use crate::stats::{GatewayError, GatewayErrorKind, PlayerStats, StatsGateway, StatsUpdate};

const STATS_QUERY: &str = r#"
query GetPlayerStats($chainId: ChainId!, $applicationId: ApplicationId!) {
  applicationQuery(chainId: $chainId, applicationId: $applicationId, query: "{\"GetPlayerStats\": {}}") {
    value
  }
}"#;

const UPDATE_MUTATION: &str = r#"
mutation ExecuteOperation($chainId: ChainId!, $applicationId: ApplicationId!, $operation: String!) {
  executeOperation(chainId: $chainId, applicationId: $applicationId, operation: $operation) {
    status
  }
}"#;

const PING_QUERY: &str = "{ chains { id } }";

const ACCEPTED: &str = "Accepted";

/// GraphQL response envelope. `error` is the relay's transport-failure shape.
#[derive(Debug, Deserialize)]
struct GraphQlResponse<T> {
    data: Option<T>,
    #[serde(default)]
    errors: Vec<GraphQlError>,
    error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GraphQlError {
    message: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ApplicationQueryData {
    application_query: ApplicationQueryValue,
}

#[derive(Debug, Deserialize)]
struct ApplicationQueryValue {
    value: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ExecuteOperationData {
    execute_operation: OperationStatus,
}

#[derive(Debug, Deserialize)]
struct OperationStatus {
    status: String,
}

/// Contract query response, externally tagged.
#[derive(Debug, Deserialize)]
enum QueryResponse {
    PlayerStats(PlayerStats),
}

/// Contract operation, externally tagged.
#[derive(Debug, serde::Serialize)]
enum Operation {
    UpdateStats(StatsUpdate),
}

/// Maps players to the chain holding their stats.
///
/// Every player currently lands on the default chain; the mapping is cached so
/// per-player chains can be slotted in without touching callers.
#[derive(Debug)]
struct ChainDirectory {
    default_chain: String,
    assigned: Mutex<HashMap<PlayerId, String>>,
}

impl ChainDirectory {
    fn new(default_chain: String) -> Self {
        Self {
            default_chain,
            assigned: Mutex::new(HashMap::new()),
        }
    }

    fn chain_for(&self, player: &PlayerId) -> String {
        let mut assigned = self
            .assigned
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        assigned
            .entry(player.clone())
            .or_insert_with(|| self.default_chain.clone())
            .clone()
    }
}

/// Stats gateway talking to the ledger GraphQL endpoint, directly or via the relay.
#[derive(Debug)]
pub struct LedgerGateway {
    client: reqwest::Client,
    endpoint: String,
    application_id: String,
    chains: ChainDirectory,
}

impl LedgerGateway {
    /// Creates a gateway from ledger configuration.
    #[instrument(skip(config), fields(endpoint = %config.graphql_endpoint()))]
    pub fn new(config: &LedgerConfig) -> Self {
        info!("Creating LedgerGateway");
        Self::with_client(reqwest::Client::new(), config)
    }

    /// Creates a gateway reusing an existing HTTP client.
    pub fn with_client(client: reqwest::Client, config: &LedgerConfig) -> Self {
        Self {
            client,
            endpoint: config.graphql_endpoint().clone(),
            application_id: config.application_id().clone(),
            chains: ChainDirectory::new(config.chain_id().clone()),
        }
    }

    /// Endpoint requests are posted to.
    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// Checks that the endpoint answers GraphQL.
    ///
    /// # Errors
    ///
    /// Returns [`GatewayError`] if the endpoint is unreachable or answers with errors.
    #[instrument(skip(self), fields(endpoint = %self.endpoint))]
    pub async fn ping(&self) -> Result<(), GatewayError> {
        let response: GraphQlResponse<Value> = self.post(json!({ "query": PING_QUERY })).await?;
        if let Some(error) = response.error {
            return Err(GatewayError::unreachable(error));
        }
        if let Some(first) = response.errors.first() {
            return Err(GatewayError::invalid_response(first.message.clone()));
        }
        info!("Ledger endpoint reachable");
        Ok(())
    }

    async fn post<T: serde::de::DeserializeOwned>(
        &self,
        body: Value,
    ) -> Result<GraphQlResponse<T>, GatewayError> {
        let response = self.client.post(&self.endpoint).json(&body).send().await?;
        let status = response.status();
        let text = response.text().await?;
        debug!(%status, body = %text, "Ledger response");

        serde_json::from_str(&text).map_err(|e| {
            let message = format!("HTTP {}: unparseable body: {}", status, e);
            if status.is_success() {
                GatewayError::invalid_response(message)
            } else {
                GatewayError::unreachable(message)
            }
        })
    }
}

#[async_trait::async_trait]
impl StatsGateway for LedgerGateway {
    #[instrument(skip(self), fields(player = %player))]
    async fn read_stats(&self, player: &PlayerId) -> Result<PlayerStats, GatewayError> {
        let chain_id = self.chains.chain_for(player);
        let body = json!({
            "query": STATS_QUERY,
            "variables": {
                "chainId": chain_id,
                "applicationId": self.application_id,
            },
        });

        let response: GraphQlResponse<ApplicationQueryData> = self.post(body).await?;
        if let Some(error) = response.error {
            return Err(GatewayError::unreachable(error));
        }
        if let Some(first) = response.errors.first() {
            return Err(GatewayError::invalid_response(first.message.clone()));
        }

        let data = response
            .data
            .ok_or_else(|| GatewayError::invalid_response("Missing data in query response"))?;
        let QueryResponse::PlayerStats(stats) =
            serde_json::from_str(&data.application_query.value).map_err(|e| {
                GatewayError::invalid_response(format!("Invalid response format: {}", e))
            })?;

        debug!(?stats, "Player stats loaded from ledger");
        Ok(stats)
    }

    #[instrument(skip(self), fields(player = %player))]
    async fn write_outcome(
        &self,
        player: &PlayerId,
        score: u32,
        won: bool,
    ) -> Result<(), GatewayError> {
        let chain_id = self.chains.chain_for(player);
        let operation = serde_json::to_string(&Operation::UpdateStats(StatsUpdate::new(score, won)))
            .map_err(|e| GatewayError::rejected(format!("Unencodable operation: {}", e)))?;
        let body = json!({
            "query": UPDATE_MUTATION,
            "variables": {
                "chainId": chain_id,
                "applicationId": self.application_id,
                "operation": operation,
            },
        });

        // Writes only fail as rejected or unreachable.
        let response: GraphQlResponse<ExecuteOperationData> =
            self.post(body).await.map_err(|err| match err.kind() {
                GatewayErrorKind::InvalidResponse => GatewayError::rejected(err.message),
                GatewayErrorKind::Unreachable | GatewayErrorKind::Rejected => err,
            })?;
        if let Some(error) = response.error {
            return Err(GatewayError::unreachable(error));
        }
        if let Some(first) = response.errors.first() {
            return Err(GatewayError::rejected(first.message.clone()));
        }

        let status = response
            .data
            .ok_or_else(|| GatewayError::rejected("Missing data in mutation response"))?
            .execute_operation
            .status;

        if status != ACCEPTED {
            warn!(%status, "Ledger did not accept stats update");
            return Err(GatewayError::rejected(format!("Operation status: {}", status)));
        }

        info!(score, won, "Stats update accepted");
        Ok(())
    }

    fn name(&self) -> &str {
        "ledger"
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn operation_encodes_as_tagged_update() {
        let encoded =
            serde_json::to_string(&Operation::UpdateStats(StatsUpdate::new(680, true))).unwrap();
        assert_eq!(encoded, r#"{"UpdateStats":{"score":680,"won":true}}"#);
    }

    #[test]
    fn query_value_decodes_player_stats() {
        let value = r#"{"PlayerStats":{"high_score":5,"games_played":2,"games_won":1,"games_lost":1}}"#;
        let QueryResponse::PlayerStats(stats) = serde_json::from_str(value).unwrap();
        assert_eq!(stats.high_score, 5);
        assert_eq!(stats.games_lost, 1);
    }

    #[test]
    fn chain_directory_defaults_and_caches() {
        let directory = ChainDirectory::new("chain-a".to_string());
        let player = PlayerId::new("p");
        assert_eq!(directory.chain_for(&player), "chain-a");
        assert_eq!(directory.chain_for(&player), "chain-a");
        assert_eq!(
            directory
                .assigned
                .lock()
                .unwrap()
                .len(),
            1
        );
    }
}
