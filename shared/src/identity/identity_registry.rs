use std::collections::{BTreeSet, HashMap};

use log::{debug, info, warn};

use crate::{
    identity::{error::IdentityError, network_identity::NetworkIdentity},
    types::{NetworkId, OwnerId, SERVER_OWNER_ID, UNASSIGNED_NETWORK_ID},
};

/// Allocates network ids, maps them to identities, and tracks the local
/// player and the set of objects held by every owner.
pub struct IdentityRegistry {
    identities: HashMap<NetworkId, NetworkIdentity>,
    owners: HashMap<OwnerId, BTreeSet<NetworkId>>,
    local_player: Option<NetworkId>,
    next_network_id: NetworkId,
}

impl IdentityRegistry {
    pub fn new() -> Self {
        Self {
            identities: HashMap::new(),
            owners: HashMap::new(),
            local_player: None,
            next_network_id: 1,
        }
    }

    /// Register an identity, either under `explicit_id` or under the next
    /// unused id. An explicit id advances the internal counter past itself.
    ///
    /// Returns an error, leaving the registry untouched, if the id is taken
    /// or reserved.
    pub fn register(
        &mut self,
        identity: &NetworkIdentity,
        explicit_id: Option<NetworkId>,
    ) -> Result<NetworkId, IdentityError> {
        let current_id = identity.network_id();
        if let Some(existing) = self.identities.get(&current_id) {
            if existing.ptr_eq(identity) {
                return Err(IdentityError::IdAlreadyInUse {
                    network_id: current_id,
                });
            }
        }

        let network_id = match explicit_id {
            Some(network_id) => {
                if network_id == UNASSIGNED_NETWORK_ID {
                    return Err(IdentityError::InvalidNetworkId { network_id });
                }
                if self.identities.contains_key(&network_id) {
                    return Err(IdentityError::IdAlreadyInUse { network_id });
                }
                if network_id >= self.next_network_id {
                    self.next_network_id = network_id.saturating_add(1);
                }
                network_id
            }
            None => self.allocate_network_id()?,
        };

        identity.set_network_id(network_id);
        self.owners
            .entry(identity.owner_id())
            .or_default()
            .insert(network_id);
        self.identities.insert(network_id, identity.clone());

        if identity.is_local_player() {
            self.set_local_player_inner(network_id);
        }

        info!(
            "IdentityRegistry: registered network id {} (owner {})",
            network_id,
            identity.owner_id()
        );

        Ok(network_id)
    }

    fn allocate_network_id(&mut self) -> Result<NetworkId, IdentityError> {
        let mut candidate = self.next_network_id;
        while self.identities.contains_key(&candidate) {
            candidate = candidate
                .checked_add(1)
                .ok_or(IdentityError::IdSpaceExhausted)?;
        }
        // saturates at MAX, the next allocation then reports exhaustion
        self.next_network_id = candidate.saturating_add(1);
        Ok(candidate)
    }

    /// Remove an identity. No-op for an unknown id.
    pub fn unregister(&mut self, network_id: NetworkId) -> Option<NetworkIdentity> {
        let identity = self.identities.remove(&network_id)?;

        self.remove_from_owner(identity.owner_id(), network_id);
        if self.local_player == Some(network_id) {
            self.local_player = None;
        }
        identity.release();

        info!("IdentityRegistry: unregistered network id {}", network_id);

        Some(identity)
    }

    pub fn find(&self, network_id: NetworkId) -> Option<&NetworkIdentity> {
        self.identities.get(&network_id)
    }

    pub fn contains(&self, network_id: NetworkId) -> bool {
        self.identities.contains_key(&network_id)
    }

    /// All identities currently held by `owner_id`, ordered by network id
    pub fn objects_by_owner(&self, owner_id: OwnerId) -> Vec<NetworkIdentity> {
        let Some(network_ids) = self.owners.get(&owner_id) else {
            return Vec::new();
        };
        network_ids
            .iter()
            .filter_map(|network_id| self.identities.get(network_id))
            .cloned()
            .collect()
    }

    pub fn network_ids(&self) -> Vec<NetworkId> {
        let mut output: Vec<NetworkId> = self.identities.keys().copied().collect();
        output.sort_unstable();
        output
    }

    pub fn len(&self) -> usize {
        self.identities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.identities.is_empty()
    }

    // Local player

    pub fn local_player(&self) -> Option<&NetworkIdentity> {
        self.local_player
            .and_then(|network_id| self.identities.get(&network_id))
    }

    /// Make `identity` the local player. The previous holder loses the flag
    /// (but keeps whatever authority it had); the new one gains authority.
    pub fn set_local_player(&mut self, identity: &NetworkIdentity) -> Result<(), IdentityError> {
        let network_id = identity.network_id();
        if !self.identities.contains_key(&network_id) {
            return Err(IdentityError::NotRegistered {
                network_id,
                operation: "set_local_player",
            });
        }
        self.set_local_player_inner(network_id);
        Ok(())
    }

    fn set_local_player_inner(&mut self, network_id: NetworkId) {
        if let Some(previous_id) = self.local_player {
            if previous_id != network_id {
                if let Some(previous) = self.identities.get(&previous_id) {
                    previous.set_local_player(false);
                }
            }
        }
        if let Some(identity) = self.identities.get(&network_id) {
            identity.set_local_player(true);
            self.local_player = Some(network_id);
        }
    }

    // Authority

    /// Hand ownership of an object to `owner_id` and mark it authoritative
    pub fn grant_authority(
        &mut self,
        network_id: NetworkId,
        owner_id: OwnerId,
    ) -> Result<(), IdentityError> {
        let identity = self
            .identities
            .get(&network_id)
            .cloned()
            .ok_or(IdentityError::NotRegistered {
                network_id,
                operation: "grant_authority",
            })?;

        self.move_owner(identity.owner_id(), owner_id, network_id);
        identity.set_authority(owner_id, true);

        debug!(
            "IdentityRegistry: network id {} now owned by {} with authority",
            network_id, owner_id
        );
        Ok(())
    }

    /// Return an object to the server and drop local authority over it
    pub fn revoke_authority(&mut self, network_id: NetworkId) -> Result<(), IdentityError> {
        let identity = self
            .identities
            .get(&network_id)
            .cloned()
            .ok_or(IdentityError::NotRegistered {
                network_id,
                operation: "revoke_authority",
            })?;

        self.revoke(&identity);
        Ok(())
    }

    fn revoke(&mut self, identity: &NetworkIdentity) {
        let network_id = identity.network_id();
        self.move_owner(identity.owner_id(), SERVER_OWNER_ID, network_id);
        if self.local_player == Some(network_id) {
            self.local_player = None;
        }
        identity.set_local_player(false);
        identity.set_authority(SERVER_OWNER_ID, false);
    }

    /// Revoke authority over everything `owner_id` held and transfer it to
    /// the server. Must run before the owner's connection is torn down.
    ///
    /// Returns the network ids that were transferred.
    pub fn cleanup_disconnected_owner(&mut self, owner_id: OwnerId) -> Vec<NetworkId> {
        if owner_id == SERVER_OWNER_ID {
            warn!("IdentityRegistry: refusing to clean up objects owned by the server");
            return Vec::new();
        }

        let identities = self.objects_by_owner(owner_id);
        let mut transferred = Vec::with_capacity(identities.len());
        for identity in identities {
            transferred.push(identity.network_id());
            self.revoke(&identity);
        }
        self.owners.remove(&owner_id);

        if !transferred.is_empty() {
            info!(
                "IdentityRegistry: transferred {} object(s) from disconnected owner {} to server",
                transferred.len(),
                owner_id
            );
        }
        transferred
    }

    // Owner index

    fn move_owner(&mut self, from: OwnerId, to: OwnerId, network_id: NetworkId) {
        if from != to {
            self.remove_from_owner(from, network_id);
        }
        self.owners.entry(to).or_default().insert(network_id);
    }

    fn remove_from_owner(&mut self, owner_id: OwnerId, network_id: NetworkId) {
        if let Some(network_ids) = self.owners.get_mut(&owner_id) {
            network_ids.remove(&network_id);
            if network_ids.is_empty() {
                self.owners.remove(&owner_id);
            }
        }
    }
}

impl Default for IdentityRegistry {
    fn default() -> Self {
        Self::new()
    }
}
