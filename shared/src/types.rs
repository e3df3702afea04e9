use serde::{Deserialize, Serialize};

/// Per-object network identifier. `0` means "not yet assigned".
pub type NetworkId = u32;
/// Owner of a replicated object. `0` means the server owns it.
pub type OwnerId = u32;
/// Dynamic value carried by SyncVar updates and RPC arguments.
pub type SyncValue = serde_json::Value;

pub const UNASSIGNED_NETWORK_ID: NetworkId = 0;
pub const SERVER_OWNER_ID: OwnerId = 0;

/// Identifies one side of a transport link. On a server every connected
/// client gets its own id, and that id doubles as the client's `OwnerId`.
/// The server itself is always `ConnectionId::SERVER`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ConnectionId(u32);

impl ConnectionId {
    pub const SERVER: ConnectionId = ConnectionId(SERVER_OWNER_ID);

    pub fn new(value: u32) -> Self {
        Self(value)
    }

    pub fn value(&self) -> u32 {
        self.0
    }

    pub fn owner_id(&self) -> OwnerId {
        self.0
    }

    pub fn is_server(&self) -> bool {
        self.0 == SERVER_OWNER_ID
    }
}

impl std::fmt::Display for ConnectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "conn#{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum NetworkRole {
    Server,
    Client,
    /// Server and client in the same process.
    Host,
}

impl NetworkRole {
    pub fn is_server(self) -> bool {
        matches!(self, NetworkRole::Server | NetworkRole::Host)
    }

    pub fn is_client(self) -> bool {
        matches!(self, NetworkRole::Client | NetworkRole::Host)
    }

    pub fn name(self) -> &'static str {
        match self {
            NetworkRole::Server => "server",
            NetworkRole::Client => "client",
            NetworkRole::Host => "host",
        }
    }
}
