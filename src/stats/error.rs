//! Stats gateway error types.

use derive_more::{Display, Error};
use tracing::instrument;

/// Category of a gateway failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Display)]
pub enum GatewayErrorKind {
    /// The backing service could not be reached.
    #[display("unreachable")]
    Unreachable,
    /// The backing service answered with something that is not player stats.
    #[display("invalid response")]
    InvalidResponse,
    /// The backing service refused the operation.
    #[display("rejected")]
    Rejected,
}

/// Stats gateway error with location tracking.
#[derive(Debug, Clone, Display, Error)]
#[display("Stats gateway {}: {} at {}:{}", kind, message, file, line)]
pub struct GatewayError {
    /// Failure category.
    pub kind: GatewayErrorKind,
    /// Error message.
    pub message: String,
    /// Line number where error occurred.
    pub line: u32,
    /// Source file where error occurred.
    pub file: &'static str,
}

impl GatewayError {
    /// Creates a new gateway error with caller location tracking.
    #[track_caller]
    #[instrument(skip(message))]
    pub fn new(kind: GatewayErrorKind, message: impl Into<String>) -> Self {
        let loc = std::panic::Location::caller();
        Self {
            kind,
            message: message.into(),
            line: loc.line(),
            file: loc.file(),
        }
    }

    /// Backing service could not be reached.
    #[track_caller]
    pub fn unreachable(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Unreachable, message)
    }

    /// Payload could not be decoded into player stats.
    #[track_caller]
    pub fn invalid_response(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::InvalidResponse, message)
    }

    /// Operation not accepted by the backing service.
    #[track_caller]
    pub fn rejected(message: impl Into<String>) -> Self {
        Self::new(GatewayErrorKind::Rejected, message)
    }

    /// Failure category.
    pub fn kind(&self) -> GatewayErrorKind {
        self.kind
    }
}

impl From<reqwest::Error> for GatewayError {
    #[track_caller]
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            Self::invalid_response(format!("Undecodable response: {}", err))
        } else {
            Self::unreachable(format!("Transport error: {}", err))
        }
    }
}
