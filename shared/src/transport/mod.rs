pub mod error;

use crate::{transport::error::TransportError, types::ConnectionId};

/// Something that happened on the transport since the last poll
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportEvent {
    /// Client side: the connection to the server is up
    Connected,
    /// Client side: the connection to the server went away
    Disconnected { reason: String },
    /// Server side: a peer joined
    PeerConnected(ConnectionId),
    /// Server side: a peer left
    PeerDisconnected {
        connection: ConnectionId,
        reason: String,
    },
    /// An opaque payload arrived. On a client `from` is always the server.
    Message {
        from: ConnectionId,
        payload: Box<[u8]>,
    },
    Error(TransportError),
}

/// The wire underneath the replication layer. Payloads are opaque; framing,
/// handshakes and delivery are the implementation's business. Sending is
/// fire-and-forget and must not block on delivery.
pub trait Transport: Send {
    /// Start accepting peers
    fn listen(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Begin connecting to a server. Completion is reported as
    /// [`TransportEvent::Connected`].
    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError>;

    /// Send to one peer, or to every peer (the server, for a client) when
    /// `to` is `None`
    fn send(&mut self, payload: &[u8], to: Option<ConnectionId>) -> Result<(), TransportError>;

    /// Drop a single peer
    fn disconnect_peer(&mut self, connection: ConnectionId, reason: &str) -> Result<(), TransportError>;

    /// Tear everything down. Further sends fail until the next listen/connect.
    fn close(&mut self);

    /// Poll the next pending event, if any
    fn receive(&mut self) -> Option<TransportEvent>;
}
