//! Player statistics: gateway trait, backends, and wire types.

mod api;
mod error;
mod gateway;
mod ledger;
mod memory;
mod models;

pub use api::StatsApiGateway;
pub use error::{GatewayError, GatewayErrorKind};
pub use gateway::{StatsGateway, read_stats_or_default};
pub use ledger::LedgerGateway;
pub use memory::InMemoryGateway;
pub use models::{PlayerStats, StatsUpdate};
