use thiserror::Error;

use crate::types::ConnectionId;

/// Errors reported by a [`Transport`](super::Transport)
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransportError {
    /// Tried to send as a client before a connection was established
    #[error("Transport is not connected to a server")]
    NotConnected,

    /// Tried to reach peers before listening
    #[error("Transport is not listening for peers")]
    NotListening,

    /// The given peer is not connected
    #[error("Peer {connection} is not connected")]
    UnknownPeer { connection: ConnectionId },

    /// The payload could not be handed to the peer
    #[error("Failed to send {payload_size} byte(s): {reason}")]
    SendFailed { payload_size: usize, reason: String },

    #[error("Failed to listen on {host}:{port}: {reason}")]
    ListenFailed {
        host: String,
        port: u16,
        reason: String,
    },

    #[error("Failed to connect to {host}:{port}: {reason}")]
    ConnectFailed {
        host: String,
        port: u16,
        reason: String,
    },

    /// The underlying channel was closed by the other side
    #[error("Transport channel closed")]
    ChannelClosed,
}
