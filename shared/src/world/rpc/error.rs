use thiserror::Error;

use crate::types::NetworkId;

/// Errors raised while routing or dispatching an RPC. Inbound failures are
/// logged and dropped by the dispatcher, never propagated to the network loop.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RpcError {
    /// No identity is registered under the network id
    #[error("No object registered under network id {network_id}")]
    UnknownTarget { network_id: NetworkId },

    /// The identity has no attached component of that type
    #[error("Object {network_id} has no component of type {component_type}")]
    UnknownComponent {
        network_id: NetworkId,
        component_type: String,
    },

    /// The component type declares no RPC of that name
    #[error("Component {component_type} has no RPC method {method}")]
    UnknownMethod {
        component_type: String,
        method: String,
    },

    /// The method exists but was declared with the other RPC kind
    #[error("{component_type}.{method} is not a {expected}")]
    KindMismatch {
        component_type: String,
        method: String,
        expected: &'static str,
    },

    /// The method requires authority this side does not hold
    #[error("{kind} {component_type}.{method} on object {network_id} rejected: no authority")]
    Unauthorized {
        network_id: NetworkId,
        component_type: String,
        method: String,
        kind: &'static str,
    },

    /// An RPC arrived that cannot be addressed to a process in this role
    #[error("{kind} {component_type}.{method} cannot be received by a {role}")]
    WrongDirection {
        component_type: String,
        method: String,
        kind: &'static str,
        role: &'static str,
    },

    /// Arguments did not match what the method expects
    #[error("Invalid arguments for {component_type}.{method}: {reason}")]
    InvalidArguments {
        component_type: String,
        method: String,
        reason: String,
    },

    /// The method body itself failed
    #[error("{component_type}.{method} failed: {reason}")]
    InvocationFailed {
        component_type: String,
        method: String,
        reason: String,
    },

    /// A panic occurred while the component lock was held
    #[error("Lock on component {component_type} is poisoned")]
    BehaviourLockPoisoned { component_type: String },
}
