use thiserror::Error;

/// Errors reported when a heartbeat reply cannot be matched. The monitor
/// ignores these; they exist for logging.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum HeartbeatError {
    /// No outstanding probe with this id, most likely already timed out
    #[error("No outstanding heartbeat probe with id {id}")]
    UnknownProbe { id: String },

    /// A ping was handed to the pong path, or vice versa
    #[error("Expected a heartbeat {expected}")]
    UnexpectedType { expected: &'static str },

    /// The monitor is stopped
    #[error("Heartbeat monitor is not running")]
    NotRunning,
}
