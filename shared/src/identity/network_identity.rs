use std::{
    fmt,
    sync::{Arc, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard},
};

use crate::{
    types::{NetworkId, OwnerId, SERVER_OWNER_ID, UNASSIGNED_NETWORK_ID},
    world::behaviour::{BehaviourRef, WeakBehaviourRef},
};

// IdentityData
struct IdentityData {
    network_id: NetworkId,
    owner_id: OwnerId,
    has_authority: bool,
    is_local_player: bool,
    // the host container owns the behaviours, we only point back at them
    behaviours: Vec<WeakBehaviourRef>,
}

/// The network identity of one replicated object.
///
/// This is a cheap-clone handle: every clone observes the same id, owner and
/// authority state. Authority and ownership are only mutated through the
/// [`IdentityRegistry`](crate::IdentityRegistry), which keeps the
/// local-player invariant.
#[derive(Clone)]
pub struct NetworkIdentity {
    data: Arc<RwLock<IdentityData>>,
}

impl NetworkIdentity {
    /// Create an unassigned, server-owned identity without authority
    pub fn new() -> Self {
        Self::with_owner(SERVER_OWNER_ID)
    }

    /// Create an unassigned identity owned by `owner_id`, without authority
    pub fn with_owner(owner_id: OwnerId) -> Self {
        Self {
            data: Arc::new(RwLock::new(IdentityData {
                network_id: UNASSIGNED_NETWORK_ID,
                owner_id,
                has_authority: false,
                is_local_player: false,
                behaviours: Vec::new(),
            })),
        }
    }

    fn read(&self) -> RwLockReadGuard<'_, IdentityData> {
        self.data.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, IdentityData> {
        self.data.write().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn network_id(&self) -> NetworkId {
        self.read().network_id
    }

    pub fn is_registered(&self) -> bool {
        self.network_id() != UNASSIGNED_NETWORK_ID
    }

    pub fn owner_id(&self) -> OwnerId {
        self.read().owner_id
    }

    pub fn has_authority(&self) -> bool {
        self.read().has_authority
    }

    pub fn is_local_player(&self) -> bool {
        self.read().is_local_player
    }

    /// Returns true if both handles point at the same identity
    pub fn ptr_eq(&self, other: &NetworkIdentity) -> bool {
        Arc::ptr_eq(&self.data, &other.data)
    }

    // Behaviours

    /// Live behaviours attached to this identity, in attach order
    pub fn behaviours(&self) -> Vec<BehaviourRef> {
        self.read()
            .behaviours
            .iter()
            .filter_map(|weak| weak.upgrade())
            .collect()
    }

    /// Find an attached behaviour by exact component type name
    pub fn find_behaviour(&self, kind: &str) -> Option<BehaviourRef> {
        self.behaviours().into_iter().find(|behaviour| {
            behaviour
                .read()
                .map(|behaviour| behaviour.kind() == kind)
                .unwrap_or(false)
        })
    }

    pub fn behaviour_count(&self) -> usize {
        self.read()
            .behaviours
            .iter()
            .filter(|weak| weak.strong_count() > 0)
            .count()
    }

    /// Record a back-reference to a component the host container owns
    pub fn attach_behaviour(&self, behaviour: &BehaviourRef) {
        let mut data = self.write();
        data.behaviours.retain(|weak| weak.strong_count() > 0);
        if data
            .behaviours
            .iter()
            .any(|weak| std::ptr::addr_eq(weak.as_ptr(), Arc::as_ptr(behaviour)))
        {
            return;
        }
        data.behaviours.push(Arc::downgrade(behaviour));
    }

    // Crate-only mutation, driven by IdentityRegistry

    pub(crate) fn set_network_id(&self, network_id: NetworkId) {
        self.write().network_id = network_id;
    }

    pub(crate) fn set_authority(&self, owner_id: OwnerId, has_authority: bool) {
        let mut data = self.write();
        data.owner_id = owner_id;
        data.has_authority = has_authority;
    }

    pub(crate) fn set_local_player(&self, is_local_player: bool) {
        let mut data = self.write();
        data.is_local_player = is_local_player;
        if is_local_player {
            data.has_authority = true;
        }
    }

    pub(crate) fn release(&self) {
        let mut data = self.write();
        data.network_id = UNASSIGNED_NETWORK_ID;
        data.owner_id = SERVER_OWNER_ID;
        data.has_authority = false;
        data.is_local_player = false;
        data.behaviours.clear();
    }
}

impl Default for NetworkIdentity {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NetworkIdentity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let data = self.read();
        f.debug_struct("NetworkIdentity")
            .field("network_id", &data.network_id)
            .field("owner_id", &data.owner_id)
            .field("has_authority", &data.has_authority)
            .field("is_local_player", &data.is_local_player)
            .field("behaviours", &data.behaviours.len())
            .finish()
    }
}
