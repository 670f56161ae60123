//! HTTP surface: player-facing stats routes and the ledger relay.

use std::sync::Arc;

use axum::extract::rejection::JsonRejection;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::{Value, json};
use tracing::{debug, error, info, instrument, warn};

use crate::PlayerId;
use crate::stats::{StatsGateway, StatsUpdate};

/// Forwards raw GraphQL payloads to the ledger endpoint.
#[derive(Debug, Clone)]
pub struct LedgerRelay {
    client: reqwest::Client,
    endpoint: String,
}

impl LedgerRelay {
    /// Creates a relay targeting `endpoint`.
    #[instrument]
    pub fn new(endpoint: String) -> Self {
        info!("Creating LedgerRelay");
        Self {
            client: reqwest::Client::new(),
            endpoint,
        }
    }

    /// Posts the payload and returns the ledger's JSON answer untouched.
    ///
    /// # Errors
    ///
    /// Returns the transport error if the ledger cannot be reached or its
    /// answer is not JSON.
    #[instrument(skip(self, payload), fields(endpoint = %self.endpoint))]
    pub async fn forward(&self, payload: &Value) -> Result<(StatusCode, Value), reqwest::Error> {
        let response = self.client.post(&self.endpoint).json(payload).send().await?;
        let status = StatusCode::from_u16(response.status().as_u16())
            .unwrap_or(StatusCode::BAD_GATEWAY);
        let body: Value = response.json().await?;
        debug!(%status, "Relayed ledger response");
        Ok((status, body))
    }
}

/// Shared state for request handlers.
#[derive(Clone)]
pub struct AppState {
    gateway: Arc<dyn StatsGateway>,
    relay: Option<LedgerRelay>,
}

impl std::fmt::Debug for AppState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppState")
            .field("gateway", &self.gateway.name())
            .field("relay", &self.relay)
            .finish()
    }
}

impl AppState {
    /// Creates handler state over a stats gateway and an optional relay.
    pub fn new(gateway: Arc<dyn StatsGateway>, relay: Option<LedgerRelay>) -> Self {
        Self { gateway, relay }
    }
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

fn error_response(status: StatusCode, message: impl Into<String>) -> Response {
    (
        status,
        Json(ErrorBody {
            error: message.into(),
        }),
    )
        .into_response()
}

/// Builds the application router.
#[instrument]
pub fn router(state: AppState) -> Router {
    Router::new()
        .route(
            "/api/player-stats/{player_id}",
            get(get_player_stats).post(update_player_stats),
        )
        .route("/api/ledger-proxy", post(ledger_proxy))
        .with_state(state)
}

#[instrument(skip(state))]
async fn get_player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
) -> Response {
    let player = PlayerId::new(player_id);
    match state.gateway.read_stats(&player).await {
        Ok(stats) => Json(stats).into_response(),
        Err(err) => {
            error!(error = %err, "Error getting player stats");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.message)
        }
    }
}

#[instrument(skip(state, body))]
async fn update_player_stats(
    State(state): State<AppState>,
    Path(player_id): Path<String>,
    body: Result<Json<StatsUpdate>, JsonRejection>,
) -> Response {
    let Json(update) = match body {
        Ok(body) => body,
        Err(rejection) => {
            warn!(error = %rejection, "Invalid stats update body");
            return error_response(StatusCode::BAD_REQUEST, "Invalid request body");
        }
    };

    let player = PlayerId::new(player_id);
    match state
        .gateway
        .write_outcome(&player, update.score, update.won)
        .await
    {
        Ok(()) => Json(json!({ "success": true })).into_response(),
        Err(err) => {
            error!(error = %err, "Error updating player stats");
            error_response(StatusCode::INTERNAL_SERVER_ERROR, err.message)
        }
    }
}

#[instrument(skip(state, payload))]
async fn ledger_proxy(State(state): State<AppState>, Json(payload): Json<Value>) -> Response {
    let Some(relay) = state.relay.as_ref() else {
        return error_response(StatusCode::SERVICE_UNAVAILABLE, "Ledger relay is not configured");
    };

    match relay.forward(&payload).await {
        Ok((status, body)) => (status, Json(body)).into_response(),
        Err(err) => {
            error!(error = %err, "Error proxying to ledger GraphQL");
            error_response(
                StatusCode::INTERNAL_SERVER_ERROR,
                "Failed to connect to ledger service",
            )
        }
    }
}

/// Binds `host:port` and serves the router until the process stops.
///
/// # Errors
///
/// Returns an I/O error if the listener cannot bind or the server fails.
#[instrument(skip(state))]
pub async fn serve(host: &str, port: u16, state: AppState) -> std::io::Result<()> {
    let listener = tokio::net::TcpListener::bind((host, port)).await?;
    info!(address = %listener.local_addr()?, "Stats server listening");
    axum::serve(listener, router(state)).await
}
