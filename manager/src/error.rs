use thiserror::Error;

use syncnet_shared::{IdentityError, MessageError, RpcError, SyncVarError, TransportError};

/// Errors surfaced by the [`NetworkManager`](crate::NetworkManager) to the
/// code driving it. Failures caused by remote traffic are logged and dropped
/// instead and never show up here.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum NetworkManagerError {
    /// The entity handed to registration exposes no NetworkIdentity
    #[error("Entity '{entity}' has no NetworkIdentity and cannot be registered")]
    MissingRequiredComponent { entity: String },

    /// The operation is not valid in the current connection state
    #[error("Cannot {operation} while {state}")]
    InvalidConnectionState {
        state: &'static str,
        operation: &'static str,
    },

    /// The configuration cannot be used
    #[error("Invalid network configuration: {reason}")]
    InvalidConfig { reason: String },

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("SyncVar error: {0}")]
    SyncVar(#[from] SyncVarError),

    #[error("RPC error: {0}")]
    Rpc(#[from] RpcError),

    #[error("Message error: {0}")]
    Message(#[from] MessageError),

    #[error("Transport error: {0}")]
    Transport(#[from] TransportError),
}
