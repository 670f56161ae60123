//! Application configuration: TOML file plus environment overrides.

use std::path::Path;
use std::time::Duration;

use derive_getters::Getters;
use derive_more::{Display, Error};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, instrument, warn};

use crate::games::memory::Difficulty;

/// Environment variable overriding the ledger GraphQL endpoint.
pub const ENV_GRAPHQL_ENDPOINT: &str = "LEDGER_GRAPHQL_ENDPOINT";
/// Environment variable overriding the default chain id.
pub const ENV_CHAIN_ID: &str = "LEDGER_CHAIN_ID";
/// Environment variable overriding the application id.
pub const ENV_APPLICATION_ID: &str = "LEDGER_APPLICATION_ID";
/// Environment variable overriding the HTTP port.
pub const ENV_PORT: &str = "PORT";

/// Where the ledger lives and which application holds the stats.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct LedgerConfig {
    /// GraphQL endpoint of the ledger service.
    graphql_endpoint: String,
    /// Chain used for players without a chain of their own.
    chain_id: String,
    /// Application holding the stats contract.
    application_id: String,
}

impl LedgerConfig {
    /// Creates a ledger configuration.
    pub fn new(graphql_endpoint: String, chain_id: String, application_id: String) -> Self {
        Self {
            graphql_endpoint,
            chain_id,
            application_id,
        }
    }
}

impl Default for LedgerConfig {
    fn default() -> Self {
        Self {
            graphql_endpoint: "http://localhost:8080/graphql".to_string(),
            chain_id: String::new(),
            application_id: String::new(),
        }
    }
}

/// HTTP listener settings.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct ServerConfig {
    /// Host to bind to.
    host: String,
    /// Port to bind to.
    port: u16,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3000,
        }
    }
}

/// Gameplay tuning.
#[derive(Debug, Clone, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    /// Difficulty used when none is given.
    difficulty: Difficulty,
    /// Delay before a mismatched pair flips back, in milliseconds.
    unflip_delay_ms: u64,
}

impl GameConfig {
    /// Flip-back delay as a duration.
    pub fn unflip_delay(&self) -> Duration {
        Duration::from_millis(self.unflip_delay_ms)
    }
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            difficulty: Difficulty::default(),
            unflip_delay_ms: 1000,
        }
    }
}

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Getters, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Ledger connection.
    ledger: LedgerConfig,
    /// HTTP server.
    server: ServerConfig,
    /// Gameplay.
    game: GameConfig,
}

impl AppConfig {
    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file cannot be read or parsed.
    #[instrument(skip(path), fields(path = %path.as_ref().display()))]
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        debug!("Loading config from file");
        let content = std::fs::read_to_string(path.as_ref())
            .map_err(|e| ConfigError::new(format!("Failed to read config file: {}", e)))?;
        Self::from_toml(&content)
    }

    /// Parses configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the text is not valid configuration.
    #[instrument(skip(content))]
    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content)
            .map_err(|e| ConfigError::new(format!("Failed to parse config: {}", e)))?;
        info!(endpoint = %config.ledger.graphql_endpoint, "Config loaded successfully");
        Ok(config)
    }

    /// Loads the file when given, else defaults, then applies environment overrides.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the file or an override is invalid.
    #[instrument(skip(path))]
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let mut config = match path {
            Some(path) => Self::from_file(path)?,
            None => Self::default(),
        };
        config.apply_overrides(|key| std::env::var(key).ok())?;
        Ok(config)
    }

    /// Applies overrides from a key lookup (the process environment in production).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] if the port override is not a number.
    #[instrument(skip(self, lookup))]
    pub fn apply_overrides(
        &mut self,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<(), ConfigError> {
        if let Some(endpoint) = lookup(ENV_GRAPHQL_ENDPOINT) {
            debug!(%endpoint, "Overriding ledger endpoint");
            self.ledger.graphql_endpoint = endpoint;
        }
        if let Some(chain_id) = lookup(ENV_CHAIN_ID) {
            self.ledger.chain_id = chain_id;
        }
        if let Some(application_id) = lookup(ENV_APPLICATION_ID) {
            self.ledger.application_id = application_id;
        }
        if let Some(port) = lookup(ENV_PORT) {
            self.server.port = port.parse().map_err(|_| {
                warn!(%port, "Malformed port override");
                ConfigError::new(format!("Invalid {} value: '{}'", ENV_PORT, port))
            })?;
        }
        Ok(())
    }

    /// Overrides the listener address.
    pub fn set_listen(&mut self, host: Option<String>, port: Option<u16>) {
        if let Some(host) = host {
            self.server.host = host;
        }
        if let Some(port) = port {
            self.server.port = port;
        }
    }
}

/// Configuration error.
#[derive(Debug, Clone, Display, Error)]
#[display("Config error: {} at {}:{}", message, file, line)]
pub struct ConfigError {
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl ConfigError {
    /// Creates a new configuration error.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(message: String) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            message,
            line: loc.line(),
            file: loc.file(),
        }
    }
}
