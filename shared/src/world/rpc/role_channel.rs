use std::sync::{Arc, PoisonError, RwLock};

use crate::types::NetworkRole;

// RoleChannel
#[derive(Clone)]
struct RoleChannel {
    role: Arc<RwLock<Option<NetworkRole>>>,
}

impl RoleChannel {
    fn role(&self) -> Option<NetworkRole> {
        *self.role.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn set_role(&self, role: Option<NetworkRole>) {
        *self.role.write().unwrap_or_else(PoisonError::into_inner) = role;
    }
}

/// Creates the mutator/accessor pair for the active role. The coordinator
/// keeps the mutator, everything that needs to know "am I server or client"
/// holds an accessor.
pub fn new_role_channel() -> (RoleMutator, RoleAccessor) {
    let channel = RoleChannel {
        role: Arc::new(RwLock::new(None)),
    };
    (
        RoleMutator {
            channel: channel.clone(),
        },
        RoleAccessor { channel },
    )
}

// RoleAccessor
#[derive(Clone)]
pub struct RoleAccessor {
    channel: RoleChannel,
}

impl RoleAccessor {
    /// `None` while no role is active
    pub fn role(&self) -> Option<NetworkRole> {
        self.channel.role()
    }

    pub fn is_server(&self) -> bool {
        self.role().map(NetworkRole::is_server).unwrap_or(false)
    }

    pub fn is_client(&self) -> bool {
        self.role().map(NetworkRole::is_client).unwrap_or(false)
    }
}

// RoleMutator
// no Clone necessary
pub struct RoleMutator {
    channel: RoleChannel,
}

impl RoleMutator {
    pub fn set_role(&self, role: Option<NetworkRole>) {
        self.channel.set_role(role);
    }

    pub fn accessor(&self) -> RoleAccessor {
        RoleAccessor {
            channel: self.channel.clone(),
        }
    }
}
