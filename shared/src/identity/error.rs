use thiserror::Error;

use crate::types::NetworkId;

/// Errors that can occur while registering or looking up NetworkIdentities
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum IdentityError {
    /// The requested network id is already held by another identity
    #[error("Network id {network_id} is already in use")]
    IdAlreadyInUse { network_id: NetworkId },

    /// `0` is reserved for "unassigned" and can never be registered
    #[error("Network id {network_id} is reserved and cannot be registered")]
    InvalidNetworkId { network_id: NetworkId },

    /// Operation requires a registered identity
    #[error("Network id {network_id} is not registered - operation '{operation}' requires registration")]
    NotRegistered {
        network_id: NetworkId,
        operation: &'static str,
    },

    /// Every id up to `u32::MAX` has been handed out
    #[error("Network id space exhausted")]
    IdSpaceExhausted,
}
