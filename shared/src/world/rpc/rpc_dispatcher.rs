use log::{debug, trace, warn};

use crate::{
    backends::Timestamp,
    identity::{identity_registry::IdentityRegistry, network_identity::NetworkIdentity},
    messages::message::RpcMessage,
    types::{ConnectionId, NetworkId, SyncValue},
    world::{
        behaviour::BehaviourRef,
        descriptor::{DescriptorCache, RpcDescriptor, RpcKind},
        pending::{PendingQueue, PendingRpc},
        rpc::{error::RpcError, role_channel::RoleAccessor, rpc_hook::RpcHook},
    },
};

/// Batches outgoing RPC records and invokes incoming ones on the resolved
/// component, enforcing the authority rules declared per method.
pub struct RpcDispatcher {
    descriptors: DescriptorCache<RpcDescriptor>,
    pending: PendingQueue<PendingRpc>,
    role: RoleAccessor,
}

impl RpcDispatcher {
    pub fn new(role: RoleAccessor) -> Self {
        Self {
            descriptors: DescriptorCache::new(),
            pending: PendingQueue::new(),
            role,
        }
    }

    /// Discover the component type's ClientRpcs and Commands (once per type)
    /// and, if it has any, install an [`RpcHook`] on the instance.
    ///
    /// Returns whether a hook was installed.
    pub fn register_component(
        &mut self,
        identity: &NetworkIdentity,
        behaviour: &BehaviourRef,
    ) -> Result<bool, RpcError> {
        let mut behaviour = behaviour
            .write()
            .map_err(|_| RpcError::BehaviourLockPoisoned {
                component_type: "<unknown>".to_string(),
            })?;

        let kind = behaviour.kind();
        let descriptors = self
            .descriptors
            .discover(kind, || behaviour.rpc_descriptors());
        if descriptors.is_empty() {
            return Ok(false);
        }

        behaviour.install_rpc_hook(RpcHook::new(
            identity,
            kind,
            descriptors,
            &self.role,
            &self.pending,
        ));
        debug!(
            "RpcDispatcher: hooked {} RPC(s) on {} for object {}",
            descriptors.len(),
            kind,
            identity.network_id()
        );
        Ok(true)
    }

    // Outgoing

    pub fn enqueue_client_rpc(
        &self,
        network_id: NetworkId,
        component_type: &str,
        method_name: &str,
        args: Vec<SyncValue>,
    ) {
        self.enqueue(network_id, component_type, method_name, args, RpcKind::ClientRpc, None);
    }

    /// Queue a ClientRpc delivered only to `target`
    pub fn enqueue_target_rpc(
        &self,
        target: ConnectionId,
        network_id: NetworkId,
        component_type: &str,
        method_name: &str,
        args: Vec<SyncValue>,
    ) {
        self.enqueue(
            network_id,
            component_type,
            method_name,
            args,
            RpcKind::ClientRpc,
            Some(target),
        );
    }

    pub fn enqueue_command(
        &self,
        network_id: NetworkId,
        component_type: &str,
        method_name: &str,
        args: Vec<SyncValue>,
    ) {
        self.enqueue(network_id, component_type, method_name, args, RpcKind::Command, None);
    }

    fn enqueue(
        &self,
        network_id: NetworkId,
        component_type: &str,
        method_name: &str,
        args: Vec<SyncValue>,
        kind: RpcKind,
        target: Option<ConnectionId>,
    ) {
        self.pending.push(PendingRpc {
            network_id,
            component_type: component_type.to_string(),
            method_name: method_name.to_string(),
            args,
            is_client_rpc: kind.is_client_rpc(),
            target,
            timestamp: Timestamp::now_millis(),
        });
    }

    /// Take every queued record in FIFO order, leaving the queue empty
    pub fn drain_pending(&self) -> Vec<PendingRpc> {
        self.pending.drain()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear_pending(&self) {
        self.pending.clear();
    }

    pub fn descriptors(&self, component_type: &str) -> Option<&'static [RpcDescriptor]> {
        self.descriptors.get(component_type)
    }

    // Incoming

    /// Resolve and invoke an incoming RPC. Every failure is logged and the
    /// record dropped; the returned error is informational.
    pub fn dispatch(&self, registry: &IdentityRegistry, message: &RpcMessage) -> Result<(), RpcError> {
        let result = self.try_dispatch(registry, message);
        match &result {
            Ok(()) => trace!(
                "RpcDispatcher: invoked {}.{} on object {}",
                message.component_type,
                message.method_name,
                message.network_id
            ),
            Err(error) => warn!("RpcDispatcher: dropping incoming RPC: {}", error),
        }
        result
    }

    fn try_dispatch(&self, registry: &IdentityRegistry, message: &RpcMessage) -> Result<(), RpcError> {
        let network_id = message.network_id;
        let component_type = message.component_type.as_str();
        let method = message.method_name.as_str();
        let kind = RpcKind::from_is_client_rpc(message.is_client_rpc);

        let identity = registry
            .find(network_id)
            .ok_or(RpcError::UnknownTarget { network_id })?;

        let behaviour =
            identity
                .find_behaviour(component_type)
                .ok_or_else(|| RpcError::UnknownComponent {
                    network_id,
                    component_type: component_type.to_string(),
                })?;

        let mut behaviour = behaviour
            .write()
            .map_err(|_| RpcError::BehaviourLockPoisoned {
                component_type: component_type.to_string(),
            })?;

        let descriptors = self
            .descriptors
            .get(component_type)
            .unwrap_or_else(|| behaviour.rpc_descriptors());
        let mut named = descriptors
            .iter()
            .filter(|descriptor| descriptor.method == method)
            .peekable();
        if named.peek().is_none() {
            return Err(RpcError::UnknownMethod {
                component_type: component_type.to_string(),
                method: method.to_string(),
            });
        }
        let descriptor = named
            .find(|descriptor| descriptor.kind == kind)
            .ok_or_else(|| RpcError::KindMismatch {
                component_type: component_type.to_string(),
                method: method.to_string(),
                expected: kind.name(),
            })?;

        if descriptor.requires_authority && !identity.has_authority() {
            return Err(RpcError::Unauthorized {
                network_id,
                component_type: component_type.to_string(),
                method: method.to_string(),
                kind: kind.name(),
            });
        }

        behaviour.invoke_rpc(method, &message.args)
    }
}
