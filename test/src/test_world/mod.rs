/// Minimal host container for tests: a named entity carrying an optional
/// identity and a list of components

use syncnet_shared::{BehaviourRef, HostEntity, NetworkIdentity, OwnerId};

pub struct TestEntity {
    name: String,
    identity: Option<NetworkIdentity>,
    behaviours: Vec<BehaviourRef>,
}

impl TestEntity {
    /// A server-owned networked entity
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            identity: Some(NetworkIdentity::new()),
            behaviours: Vec::new(),
        }
    }

    pub fn owned_by(name: &str, owner_id: OwnerId) -> Self {
        Self {
            name: name.to_string(),
            identity: Some(NetworkIdentity::with_owner(owner_id)),
            behaviours: Vec::new(),
        }
    }

    /// An entity that was never made networked
    pub fn without_identity(name: &str) -> Self {
        Self {
            name: name.to_string(),
            identity: None,
            behaviours: Vec::new(),
        }
    }

    pub fn with_behaviour(mut self, behaviour: BehaviourRef) -> Self {
        self.behaviours.push(behaviour);
        self
    }

    pub fn identity(&self) -> Option<&NetworkIdentity> {
        self.identity.as_ref()
    }
}

impl HostEntity for TestEntity {
    fn name(&self) -> &str {
        &self.name
    }

    fn network_identity(&self) -> Option<NetworkIdentity> {
        self.identity.clone()
    }

    fn behaviours(&self) -> Vec<BehaviourRef> {
        self.behaviours.clone()
    }
}
