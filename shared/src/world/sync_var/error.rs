use thiserror::Error;

use crate::types::NetworkId;

/// Errors raised on the SyncVar paths. Only used for logging and for
/// callers that want to inspect a drop; none of them stop the network loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncVarError {
    /// No identity is registered under the network id
    #[error("No object registered under network id {network_id}")]
    UnknownTarget { network_id: NetworkId },

    /// The identity has no attached component of that type
    #[error("Object {network_id} has no component of type {component_type}")]
    UnknownComponent {
        network_id: NetworkId,
        component_type: String,
    },

    /// The component does not expose a SyncVar of that name
    #[error("Component {component_type} has no SyncVar named {property}")]
    UnknownField {
        component_type: String,
        property: String,
    },

    /// The incoming value could not be stored in the field
    #[error("Cannot store value in {component_type}.{property}: {reason}")]
    InvalidValue {
        component_type: String,
        property: String,
        reason: String,
    },

    /// The write came from a side without authority over the object
    #[error("Write to {component_type}.{property} on object {network_id} rejected: no authority")]
    UnauthorizedWrite {
        network_id: NetworkId,
        component_type: String,
        property: String,
    },

    /// A panic occurred while the component lock was held
    #[error("Lock on component {component_type} is poisoned")]
    BehaviourLockPoisoned { component_type: String },
}
