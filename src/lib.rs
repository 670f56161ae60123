//! Memory Match library - card-matching game engine with ledger-backed stats
//!
//! # Architecture
//!
//! - **Games**: deck generation, the reveal/match state machine, and scoring
//! - **Session**: lifecycle controller with deferred flip-back and stats reporting
//! - **Stats**: gateway trait over the player statistics backend (ledger
//!   GraphQL, REST stats API, or in-memory)
//! - **Server**: player-facing stats routes and the ledger relay
//!
//! # Example
//!
//! ```no_run
//! use std::sync::Arc;
//! use memory_match::{Difficulty, InMemoryGateway, PlayerId, SessionController};
//!
//! # async fn example() -> anyhow::Result<()> {
//! let gateway = Arc::new(InMemoryGateway::new());
//! let mut controller = SessionController::new(gateway, PlayerId::generate());
//! controller.refresh_stats();
//! controller.start_new_session(Difficulty::Easy)?;
//! controller.on_reveal(0);
//! # Ok(())
//! # }
//! ```

#![warn(missing_docs)]
#![forbid(unsafe_code)]

// Private module declarations
mod config;
mod games;
mod identity;
mod session;
mod stats;

/// HTTP server and ledger relay.
pub mod server;

// Crate-level exports - Configuration
pub use config::{
    AppConfig, ConfigError, ENV_APPLICATION_ID, ENV_CHAIN_ID, ENV_GRAPHQL_ENDPOINT, ENV_PORT,
    GameConfig, LedgerConfig, ServerConfig,
};

// Crate-level exports - Player identity
pub use identity::PlayerId;

// Crate-level exports - Session management
pub use session::{ControllerEvent, ControllerView, SessionController, UNFLIP_DELAY};

// Crate-level exports - Stats gateway
pub use stats::{
    GatewayError, GatewayErrorKind, InMemoryGateway, LedgerGateway, PlayerStats, StatsApiGateway,
    StatsGateway, StatsUpdate, read_stats_or_default,
};

// Crate-level exports - Game types (memory match)
pub use games::memory::{
    Card, CardId, Deck, DeckError, DeckGenerator, Difficulty, GameSession, GameStatus, Generation,
    IgnoreReason, MOVE_PENALTY, Outcome, RevealOutcome, SECOND_PENALTY, SYMBOL_CATALOG, Symbol,
    UnflipTicket, format_clock, score,
};
