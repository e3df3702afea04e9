use std::{mem, vec::IntoIter};

use syncnet_shared::ConnectionId;

use crate::NetworkManagerError;

/// Everything that happened during one [`update`](crate::NetworkManager::update),
/// read by event type.
pub struct NetworkEvents {
    connections: Vec<()>,
    disconnections: Vec<String>,
    peer_connections: Vec<ConnectionId>,
    peer_disconnections: Vec<(ConnectionId, String)>,
    peer_timeouts: Vec<ConnectionId>,
    errors: Vec<NetworkManagerError>,

    empty: bool,
}

impl NetworkEvents {
    pub(crate) fn new() -> Self {
        Self {
            connections: Vec::new(),
            disconnections: Vec::new(),
            peer_connections: Vec::new(),
            peer_disconnections: Vec::new(),
            peer_timeouts: Vec::new(),
            errors: Vec::new(),

            empty: true,
        }
    }

    // Public

    pub fn is_empty(&self) -> bool {
        self.empty
    }

    pub fn read<V: Event>(&mut self) -> V::Iter {
        V::iter(self)
    }

    pub fn has<V: Event>(&self) -> bool {
        V::has(self)
    }

    /// Move every event of `other` after the ones already held
    pub fn append(&mut self, mut other: NetworkEvents) {
        self.connections.append(&mut other.connections);
        self.disconnections.append(&mut other.disconnections);
        self.peer_connections.append(&mut other.peer_connections);
        self.peer_disconnections.append(&mut other.peer_disconnections);
        self.peer_timeouts.append(&mut other.peer_timeouts);
        self.errors.append(&mut other.errors);
        self.empty = self.empty && other.empty;
    }

    // Crate-public

    pub(crate) fn push_connection(&mut self) {
        self.connections.push(());
        self.empty = false;
    }

    pub(crate) fn push_disconnection(&mut self, reason: &str) {
        self.disconnections.push(reason.to_string());
        self.empty = false;
    }

    pub(crate) fn push_peer_connection(&mut self, connection: ConnectionId) {
        self.peer_connections.push(connection);
        self.empty = false;
    }

    pub(crate) fn push_peer_disconnection(&mut self, connection: ConnectionId, reason: &str) {
        self.peer_disconnections.push((connection, reason.to_string()));
        self.empty = false;
    }

    pub(crate) fn push_peer_timeout(&mut self, connection: ConnectionId) {
        self.peer_timeouts.push(connection);
        self.empty = false;
    }

    pub(crate) fn push_error(&mut self, error: NetworkManagerError) {
        self.errors.push(error);
        self.empty = false;
    }
}

impl Default for NetworkEvents {
    fn default() -> Self {
        Self::new()
    }
}

// Event Trait
pub trait Event {
    type Iter;

    fn iter(events: &mut NetworkEvents) -> Self::Iter;

    fn has(events: &NetworkEvents) -> bool;
}

// ConnectEvent
/// Client side: the connection to the server is up
pub struct ConnectEvent;
impl Event for ConnectEvent {
    type Iter = IntoIter<()>;

    fn iter(events: &mut NetworkEvents) -> Self::Iter {
        let list = mem::take(&mut events.connections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &NetworkEvents) -> bool {
        !events.connections.is_empty()
    }
}

// DisconnectEvent
/// Client side: the connection to the server closed, with the reason
pub struct DisconnectEvent;
impl Event for DisconnectEvent {
    type Iter = IntoIter<String>;

    fn iter(events: &mut NetworkEvents) -> Self::Iter {
        let list = mem::take(&mut events.disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &NetworkEvents) -> bool {
        !events.disconnections.is_empty()
    }
}

// PeerConnectEvent
pub struct PeerConnectEvent;
impl Event for PeerConnectEvent {
    type Iter = IntoIter<ConnectionId>;

    fn iter(events: &mut NetworkEvents) -> Self::Iter {
        let list = mem::take(&mut events.peer_connections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &NetworkEvents) -> bool {
        !events.peer_connections.is_empty()
    }
}

// PeerDisconnectEvent
/// Raised after the peer's objects had their authority cleaned up
pub struct PeerDisconnectEvent;
impl Event for PeerDisconnectEvent {
    type Iter = IntoIter<(ConnectionId, String)>;

    fn iter(events: &mut NetworkEvents) -> Self::Iter {
        let list = mem::take(&mut events.peer_disconnections);
        IntoIterator::into_iter(list)
    }

    fn has(events: &NetworkEvents) -> bool {
        !events.peer_disconnections.is_empty()
    }
}

// PeerTimeoutEvent
/// A connection's heartbeat monitor declared it dead. On a client the
/// connection id is [`ConnectionId::SERVER`].
pub struct PeerTimeoutEvent;
impl Event for PeerTimeoutEvent {
    type Iter = IntoIter<ConnectionId>;

    fn iter(events: &mut NetworkEvents) -> Self::Iter {
        let list = mem::take(&mut events.peer_timeouts);
        IntoIterator::into_iter(list)
    }

    fn has(events: &NetworkEvents) -> bool {
        !events.peer_timeouts.is_empty()
    }
}

// ErrorEvent
pub struct ErrorEvent;
impl Event for ErrorEvent {
    type Iter = IntoIter<NetworkManagerError>;

    fn iter(events: &mut NetworkEvents) -> Self::Iter {
        let list = mem::take(&mut events.errors);
        IntoIterator::into_iter(list)
    }

    fn has(events: &NetworkEvents) -> bool {
        !events.errors.is_empty()
    }
}
