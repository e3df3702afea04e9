use log::{debug, warn};

use crate::{
    identity::{identity_registry::IdentityRegistry, network_identity::NetworkIdentity},
    types::{NetworkId, SyncValue},
    world::{
        behaviour::BehaviourRef,
        descriptor::{DescriptorCache, SyncVarDescriptor},
        pending::{PendingChange, PendingQueue},
        sync_var::{change_hook::ChangeHook, error::SyncVarError},
    },
};

/// Detects accepted SyncVar writes and batches them for the next tick, and
/// applies SyncVar values that arrive from the network.
pub struct ChangeTracker {
    descriptors: DescriptorCache<SyncVarDescriptor>,
    pending: PendingQueue<PendingChange>,
}

impl ChangeTracker {
    pub fn new() -> Self {
        Self {
            descriptors: DescriptorCache::new(),
            pending: PendingQueue::new(),
        }
    }

    /// Discover the component type's SyncVars (once per type) and, if it has
    /// any, install a [`ChangeHook`] on the instance.
    ///
    /// Returns whether a hook was installed.
    pub fn register_component(
        &mut self,
        identity: &NetworkIdentity,
        behaviour: &BehaviourRef,
    ) -> Result<bool, SyncVarError> {
        let mut behaviour = behaviour
            .write()
            .map_err(|_| SyncVarError::BehaviourLockPoisoned {
                component_type: "<unknown>".to_string(),
            })?;

        let kind = behaviour.kind();
        let descriptors = self
            .descriptors
            .discover(kind, || behaviour.sync_var_descriptors());
        if descriptors.is_empty() {
            return Ok(false);
        }

        behaviour.install_change_hook(ChangeHook::new(
            identity,
            kind,
            descriptors,
            &self.pending,
        ));
        debug!(
            "ChangeTracker: hooked {} SyncVar(s) on {} for object {}",
            descriptors.len(),
            kind,
            identity.network_id()
        );
        Ok(true)
    }

    /// Apply a value received from the network. Authority is not checked:
    /// the sender was trusted by the time the message got here.
    ///
    /// Unknown objects, components and fields are logged and dropped; the
    /// returned error is informational.
    pub fn apply_incoming(
        &self,
        registry: &IdentityRegistry,
        network_id: NetworkId,
        component_type: &str,
        property_name: &str,
        value: SyncValue,
    ) -> Result<(), SyncVarError> {
        let result = self.try_apply_incoming(
            registry,
            network_id,
            component_type,
            property_name,
            value,
        );
        if let Err(error) = &result {
            warn!("ChangeTracker: dropping incoming SyncVar: {}", error);
        }
        result
    }

    fn try_apply_incoming(
        &self,
        registry: &IdentityRegistry,
        network_id: NetworkId,
        component_type: &str,
        property_name: &str,
        value: SyncValue,
    ) -> Result<(), SyncVarError> {
        let identity = registry
            .find(network_id)
            .ok_or(SyncVarError::UnknownTarget { network_id })?;

        let behaviour = identity.find_behaviour(component_type).ok_or_else(|| {
            SyncVarError::UnknownComponent {
                network_id,
                component_type: component_type.to_string(),
            }
        })?;

        let mut behaviour =
            behaviour
                .write()
                .map_err(|_| SyncVarError::BehaviourLockPoisoned {
                    component_type: component_type.to_string(),
                })?;

        let descriptors = self
            .descriptors
            .get(component_type)
            .unwrap_or_else(|| behaviour.sync_var_descriptors());
        // only declared SyncVars may be written from the network
        let descriptor = descriptors
            .iter()
            .find(|descriptor| descriptor.property == property_name);
        let (Some(descriptor), Some(old)) = (descriptor, behaviour.read_sync_var(property_name))
        else {
            return Err(SyncVarError::UnknownField {
                component_type: component_type.to_string(),
                property: property_name.to_string(),
            });
        };

        behaviour.write_sync_var(property_name, value.clone())?;

        if let Some(hook) = descriptor.on_changed {
            behaviour.on_sync_var_changed(hook, Some(&old), &value);
        }

        Ok(())
    }

    /// Take every queued change in FIFO order, leaving the queue empty
    pub fn drain_pending(&self) -> Vec<PendingChange> {
        self.pending.drain()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn clear_pending(&self) {
        self.pending.clear();
    }

    pub fn descriptors(&self, component_type: &str) -> Option<&'static [SyncVarDescriptor]> {
        self.descriptors.get(component_type)
    }
}

impl Default for ChangeTracker {
    fn default() -> Self {
        Self::new()
    }
}
