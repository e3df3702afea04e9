use log::{debug, trace, warn};

use crate::{
    backends::Timestamp,
    identity::network_identity::NetworkIdentity,
    types::SyncValue,
    world::{
        behaviour::NetworkBehaviour,
        descriptor::SyncVarDescriptor,
        pending::{PendingChange, PendingQueue},
        sync_var::error::SyncVarError,
    },
};

/// Outcome of a write made through a [`ChangeHook`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum FieldWrite {
    /// Stored, `on_changed` ran, and a change record was queued
    Accepted,
    /// New value equals the current one, nothing happened
    Unchanged,
    /// No authority: the field was rolled back and nothing was queued
    Rejected,
    /// Stored, but nothing was queued: the field has no SyncVar descriptor
    /// or the object is no longer registered
    NotReplicated,
    /// The component has no such field
    UnknownField,
    /// The component refused the value, the field is unchanged
    InvalidValue,
}

impl FieldWrite {
    pub fn is_accepted(self) -> bool {
        self == FieldWrite::Accepted
    }
}

/// Installed into a component that declares SyncVars. The component's
/// explicit mutators write through it:
///
/// ```ignore
/// pub fn set_health(&mut self, value: i32) -> FieldWrite {
///     match self.change_hook.clone() {
///         Some(hook) => hook.write(self, "health", value.into()),
///         None => { self.health = value; FieldWrite::NotReplicated }
///     }
/// }
/// ```
#[derive(Clone)]
pub struct ChangeHook {
    identity: NetworkIdentity,
    kind: &'static str,
    descriptors: &'static [SyncVarDescriptor],
    pending: PendingQueue<PendingChange>,
}

impl ChangeHook {
    pub(crate) fn new(
        identity: &NetworkIdentity,
        kind: &'static str,
        descriptors: &'static [SyncVarDescriptor],
        pending: &PendingQueue<PendingChange>,
    ) -> Self {
        Self {
            identity: identity.clone(),
            kind,
            descriptors,
            pending: pending.clone(),
        }
    }

    pub fn identity(&self) -> &NetworkIdentity {
        &self.identity
    }

    pub fn kind(&self) -> &'static str {
        self.kind
    }

    pub fn descriptor(&self, property: &str) -> Option<&'static SyncVarDescriptor> {
        self.descriptors
            .iter()
            .find(|descriptor| descriptor.property == property)
    }

    /// Write `value` into `property` of `behaviour`, enforcing authority.
    ///
    /// A rejected write leaves the field at its old value and queues
    /// nothing; the rejection is only reported through the return value.
    pub fn write(
        &self,
        behaviour: &mut dyn NetworkBehaviour,
        property: &str,
        value: SyncValue,
    ) -> FieldWrite {
        let Some(old) = behaviour.read_sync_var(property) else {
            warn!(
                "ChangeHook: component {} has no field {}",
                self.kind, property
            );
            return FieldWrite::UnknownField;
        };

        if old == value {
            return FieldWrite::Unchanged;
        }

        if let Err(error) = behaviour.write_sync_var(property, value.clone()) {
            warn!("ChangeHook: {}", error);
            return match error {
                SyncVarError::InvalidValue { .. } => FieldWrite::InvalidValue,
                _ => FieldWrite::UnknownField,
            };
        }

        let Some(descriptor) = self.descriptor(property) else {
            return FieldWrite::NotReplicated;
        };

        // unregistered objects keep their hook but stay local
        if !self.identity.is_registered() {
            trace!(
                "ChangeHook: {}.{} written on an unregistered object",
                self.kind, property
            );
            return FieldWrite::NotReplicated;
        }

        if descriptor.authority_only && !self.identity.has_authority() {
            let rejection = SyncVarError::UnauthorizedWrite {
                network_id: self.identity.network_id(),
                component_type: self.kind.to_string(),
                property: property.to_string(),
            };
            debug!("ChangeHook: {}", rejection);
            if let Err(error) = behaviour.write_sync_var(property, old) {
                warn!("ChangeHook: rollback failed: {}", error);
            }
            return FieldWrite::Rejected;
        }

        if let Some(hook) = descriptor.on_changed {
            behaviour.on_sync_var_changed(hook, Some(&old), &value);
        }

        self.pending.push(PendingChange {
            network_id: self.identity.network_id(),
            component_type: self.kind.to_string(),
            property_name: property.to_string(),
            new_value: value,
            timestamp: Timestamp::now_millis(),
        });

        FieldWrite::Accepted
    }
}
