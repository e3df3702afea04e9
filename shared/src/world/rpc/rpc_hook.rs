use log::{debug, trace, warn};

use crate::{
    backends::Timestamp,
    identity::network_identity::NetworkIdentity,
    types::{ConnectionId, SyncValue},
    world::{
        descriptor::{RpcDescriptor, RpcKind},
        pending::{PendingQueue, PendingRpc},
        rpc::{
            role_channel::RoleAccessor,
            rpc_route::{route_call, RpcRoute},
        },
    },
};

/// Installed into a component that declares RPCs. Each RPC wrapper asks the
/// hook how to proceed and runs its body only on [`RpcRoute::RunLocally`]:
///
/// ```ignore
/// pub fn cmd_fire(&mut self, power: u32) -> RpcRoute {
///     let route = self.rpc_hook.as_ref()
///         .map(|hook| hook.call("cmd_fire", vec![power.into()]))
///         .unwrap_or(RpcRoute::RunLocally);
///     if route.runs_locally() { self.fire(power); }
///     route
/// }
/// ```
#[derive(Clone)]
pub struct RpcHook {
    identity: NetworkIdentity,
    kind: &'static str,
    descriptors: &'static [RpcDescriptor],
    role: RoleAccessor,
    pending: PendingQueue<PendingRpc>,
}

impl RpcHook {
    pub(crate) fn new(
        identity: &NetworkIdentity,
        kind: &'static str,
        descriptors: &'static [RpcDescriptor],
        role: &RoleAccessor,
        pending: &PendingQueue<PendingRpc>,
    ) -> Self {
        Self {
            identity: identity.clone(),
            kind,
            descriptors,
            role: role.clone(),
            pending: pending.clone(),
        }
    }

    pub fn identity(&self) -> &NetworkIdentity {
        &self.identity
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn descriptor(&self, method: &str) -> Option<&'static RpcDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.method == method)
    }

    /// Route a local call to `method`, queueing a record when the call must
    /// travel over the network
    pub fn call(&self, method: &str, args: Vec<SyncValue>) -> RpcRoute {
        self.route(method, args, None)
    }

    /// Like [`call`](Self::call), but a ClientRpc is delivered only to
    /// `target`. Commands always go to the server, so the target is ignored
    /// for them.
    pub fn call_target(&self, target: ConnectionId, method: &str, args: Vec<SyncValue>) -> RpcRoute {
        self.route(method, args, Some(target))
    }

    fn route(&self, method: &str, args: Vec<SyncValue>, target: Option<ConnectionId>) -> RpcRoute {
        let Some(descriptor) = self.descriptor(method) else {
            warn!(
                "RpcHook: {}.{} is not a declared RPC, running locally",
                self.kind, method
            );
            return RpcRoute::RunLocally;
        };

        if !self.identity.is_registered() {
            trace!(
                "RpcHook: {}.{} called on an unregistered object, running locally",
                self.kind, method
            );
            return RpcRoute::RunLocally;
        }

        let route = route_call(self.role.role(), self.identity.has_authority(), descriptor);
        match route {
            RpcRoute::RunLocally => {}
            RpcRoute::EnqueueAndReturn => {
                let is_client_rpc = descriptor.kind == RpcKind::ClientRpc;
                trace!(
                    "RpcHook: queueing {} {}.{} for object {}",
                    descriptor.kind.name(),
                    self.kind,
                    method,
                    self.identity.network_id()
                );
                self.pending.push(PendingRpc {
                    network_id: self.identity.network_id(),
                    component_type: self.kind.to_string(),
                    method_name: method.to_string(),
                    args,
                    is_client_rpc,
                    target: if is_client_rpc { target } else { None },
                    timestamp: Timestamp::now_millis(),
                });
            }
            RpcRoute::Reject => {
                debug!(
                    "RpcHook: {} {}.{} rejected on object {}: no authority",
                    descriptor.kind.name(),
                    self.kind,
                    method,
                    self.identity.network_id()
                );
            }
        }
        route
    }
}
