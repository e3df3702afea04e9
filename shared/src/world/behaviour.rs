use std::sync::{Arc, RwLock, Weak};

use crate::{
    identity::network_identity::NetworkIdentity,
    types::SyncValue,
    world::{
        descriptor::{RpcDescriptor, SyncVarDescriptor},
        rpc::{error::RpcError, rpc_hook::RpcHook},
        sync_var::{change_hook::ChangeHook, error::SyncVarError},
    },
};

/// Shared handle to a replicated component. The host container owns it.
pub type BehaviourRef = Arc<RwLock<dyn NetworkBehaviour>>;
pub type WeakBehaviourRef = Weak<RwLock<dyn NetworkBehaviour>>;

/// A replicated component attached to a networked object.
///
/// Descriptor tables are `'static`: they are declared once per component
/// type and cached by [`kind`](NetworkBehaviour::kind) on first
/// registration. Field access is by property name so the change tracker and
/// dispatcher can work on any component through a trait object.
pub trait NetworkBehaviour: Send + Sync + 'static {
    /// Component type name, used for matching on the wire
    fn kind(&self) -> &'static str;

    fn sync_var_descriptors(&self) -> &'static [SyncVarDescriptor] {
        &[]
    }

    fn rpc_descriptors(&self) -> &'static [RpcDescriptor] {
        &[]
    }

    /// Receives the hook that the component's explicit mutators must write
    /// through. Only called when the type declares at least one SyncVar.
    fn install_change_hook(&mut self, hook: ChangeHook) {
        let _ = hook;
    }

    /// Receives the hook that the component's RPC wrappers route through.
    /// Only called when the type declares at least one RPC.
    fn install_rpc_hook(&mut self, hook: RpcHook) {
        let _ = hook;
    }

    /// Current value of a SyncVar field, `None` if the field is unknown
    fn read_sync_var(&self, property: &str) -> Option<SyncValue> {
        let _ = property;
        None
    }

    /// Raw store into a SyncVar field, no authority check and no hook
    fn write_sync_var(&mut self, property: &str, value: SyncValue) -> Result<(), SyncVarError> {
        let _ = value;
        Err(SyncVarError::UnknownField {
            component_type: self.kind().to_string(),
            property: property.to_string(),
        })
    }

    /// Called after a SyncVar value was applied, locally or from the network
    fn on_sync_var_changed(&mut self, hook: &str, old: Option<&SyncValue>, new: &SyncValue) {
        let _ = (hook, old, new);
    }

    /// Run the body of an RPC method
    fn invoke_rpc(&mut self, method: &str, args: &[SyncValue]) -> Result<(), RpcError> {
        let _ = args;
        Err(RpcError::UnknownMethod {
            component_type: self.kind().to_string(),
            method: method.to_string(),
        })
    }
}

/// The narrow view of the host engine's entity container this crate relies
/// on. Entities are never created or destroyed from here.
pub trait HostEntity {
    /// Name used in diagnostics
    fn name(&self) -> &str;

    fn network_identity(&self) -> Option<NetworkIdentity>;

    fn behaviours(&self) -> Vec<BehaviourRef>;

    fn behaviour(&self, kind: &str) -> Option<BehaviourRef> {
        self.behaviours().into_iter().find(|behaviour| {
            behaviour
                .read()
                .map(|behaviour| behaviour.kind() == kind)
                .unwrap_or(false)
        })
    }
}
