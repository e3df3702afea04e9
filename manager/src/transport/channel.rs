use std::{
    collections::{BTreeMap, HashMap},
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex, MutexGuard, PoisonError,
    },
};

use async_channel::{Receiver, Sender, TryRecvError};
use log::{debug, info};

use syncnet_shared::{ConnectionId, Transport, TransportError, TransportEvent};

type Inbox = Sender<TransportEvent>;

struct ListenerSlot {
    inbox: Inbox,
    peers: BTreeMap<ConnectionId, Inbox>,
}

struct HubState {
    listeners: HashMap<(String, u16), ListenerSlot>,
    next_connection: u32,
}

/// An in-process network. Endpoints created from the same hub can listen
/// on and connect to `host:port` pairs without touching a socket; every
/// payload travels over an unbounded channel.
#[derive(Clone)]
pub struct ChannelHub {
    state: Arc<Mutex<HubState>>,
}

impl ChannelHub {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(HubState {
                listeners: HashMap::new(),
                next_connection: 1,
            })),
        }
    }

    /// A fresh endpoint, neither listening nor connected
    pub fn endpoint(&self) -> ChannelTransport {
        let (inbox, receiver) = async_channel::unbounded();
        ChannelTransport {
            hub: self.clone(),
            inbox,
            receiver,
            mode: EndpointMode::Idle,
            drop_switch: DropSwitch::new(),
        }
    }

    fn lock(&self) -> MutexGuard<'_, HubState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Default for ChannelHub {
    fn default() -> Self {
        Self::new()
    }
}

/// While engaged, everything the endpoint sends is silently lost
#[derive(Clone)]
pub struct DropSwitch {
    engaged: Arc<AtomicBool>,
}

impl DropSwitch {
    fn new() -> Self {
        Self {
            engaged: Arc::new(AtomicBool::new(false)),
        }
    }

    pub fn engage(&self) {
        self.engaged.store(true, Ordering::SeqCst);
    }

    pub fn release(&self) {
        self.engaged.store(false, Ordering::SeqCst);
    }

    pub fn is_engaged(&self) -> bool {
        self.engaged.load(Ordering::SeqCst)
    }
}

enum EndpointMode {
    Idle,
    Listening {
        address: (String, u16),
    },
    Connected {
        address: (String, u16),
        connection: ConnectionId,
        server: Inbox,
    },
}

/// One end of a [`ChannelHub`] link
pub struct ChannelTransport {
    hub: ChannelHub,
    inbox: Inbox,
    receiver: Receiver<TransportEvent>,
    mode: EndpointMode,
    drop_switch: DropSwitch,
}

impl ChannelTransport {
    pub fn drop_switch(&self) -> DropSwitch {
        self.drop_switch.clone()
    }

    /// On a connected client, the id the server knows it by
    pub fn connection_id(&self) -> Option<ConnectionId> {
        match &self.mode {
            EndpointMode::Connected { connection, .. } => Some(*connection),
            _ => None,
        }
    }

    fn deliver(inbox: &Inbox, event: TransportEvent) -> Result<(), TransportError> {
        inbox
            .try_send(event)
            .map_err(|_| TransportError::ChannelClosed)
    }

    fn drain_inbox(&self) {
        while self.receiver.try_recv().is_ok() {}
    }
}

impl Transport for ChannelTransport {
    fn listen(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let address = (host.to_string(), port);
        let listen_failed = |reason: &str| TransportError::ListenFailed {
            host: host.to_string(),
            port,
            reason: reason.to_string(),
        };
        if !matches!(self.mode, EndpointMode::Idle) {
            return Err(listen_failed("endpoint already in use"));
        }

        let mut hub = self.hub.lock();
        if hub.listeners.contains_key(&address) {
            return Err(listen_failed("address already in use"));
        }
        hub.listeners.insert(
            address.clone(),
            ListenerSlot {
                inbox: self.inbox.clone(),
                peers: BTreeMap::new(),
            },
        );
        info!("ChannelTransport: listening on {}:{}", host, port);
        self.mode = EndpointMode::Listening { address };
        Ok(())
    }

    fn connect(&mut self, host: &str, port: u16) -> Result<(), TransportError> {
        let address = (host.to_string(), port);
        let connect_failed = |reason: &str| TransportError::ConnectFailed {
            host: host.to_string(),
            port,
            reason: reason.to_string(),
        };
        if !matches!(self.mode, EndpointMode::Idle) {
            return Err(connect_failed("endpoint already in use"));
        }

        let mut hub = self.hub.lock();
        let connection = ConnectionId::new(hub.next_connection);
        let Some(slot) = hub.listeners.get_mut(&address) else {
            return Err(connect_failed("nothing is listening"));
        };
        slot.peers.insert(connection, self.inbox.clone());
        let server = slot.inbox.clone();
        hub.next_connection += 1;
        drop(hub);

        Self::deliver(&server, TransportEvent::PeerConnected(connection))?;
        Self::deliver(&self.inbox, TransportEvent::Connected)?;
        debug!("ChannelTransport: {} connected to {}:{}", connection, host, port);
        self.mode = EndpointMode::Connected {
            address,
            connection,
            server,
        };
        Ok(())
    }

    fn send(&mut self, payload: &[u8], to: Option<ConnectionId>) -> Result<(), TransportError> {
        match &self.mode {
            EndpointMode::Idle => Err(TransportError::NotConnected),
            EndpointMode::Connected {
                connection, server, ..
            } => {
                if self.drop_switch.is_engaged() {
                    return Ok(());
                }
                Self::deliver(
                    server,
                    TransportEvent::Message {
                        from: *connection,
                        payload: payload.into(),
                    },
                )
            }
            EndpointMode::Listening { address } => {
                let hub = self.hub.lock();
                let Some(slot) = hub.listeners.get(address) else {
                    return Err(TransportError::NotListening);
                };
                if let Some(connection) = to {
                    if !slot.peers.contains_key(&connection) {
                        return Err(TransportError::UnknownPeer { connection });
                    }
                }
                if self.drop_switch.is_engaged() {
                    return Ok(());
                }
                for (connection, inbox) in &slot.peers {
                    if to.is_some_and(|target| target != *connection) {
                        continue;
                    }
                    Self::deliver(
                        inbox,
                        TransportEvent::Message {
                            from: ConnectionId::SERVER,
                            payload: payload.into(),
                        },
                    )?;
                }
                Ok(())
            }
        }
    }

    fn disconnect_peer(&mut self, connection: ConnectionId, reason: &str) -> Result<(), TransportError> {
        let EndpointMode::Listening { address } = &self.mode else {
            return Err(TransportError::NotListening);
        };
        let peer = {
            let mut hub = self.hub.lock();
            hub.listeners
                .get_mut(address)
                .and_then(|slot| slot.peers.remove(&connection))
        };
        let Some(peer) = peer else {
            return Err(TransportError::UnknownPeer { connection });
        };

        // the client may already be gone, that is fine
        let _ = Self::deliver(
            &peer,
            TransportEvent::Disconnected {
                reason: reason.to_string(),
            },
        );
        Self::deliver(
            &self.inbox,
            TransportEvent::PeerDisconnected {
                connection,
                reason: reason.to_string(),
            },
        )
    }

    fn close(&mut self) {
        match std::mem::replace(&mut self.mode, EndpointMode::Idle) {
            EndpointMode::Idle => {}
            EndpointMode::Listening { address } => {
                let slot = self.hub.lock().listeners.remove(&address);
                if let Some(slot) = slot {
                    for inbox in slot.peers.values() {
                        let _ = Self::deliver(
                            inbox,
                            TransportEvent::Disconnected {
                                reason: "server closed".to_string(),
                            },
                        );
                    }
                }
                info!("ChannelTransport: stopped listening on {}:{}", address.0, address.1);
            }
            EndpointMode::Connected {
                address,
                connection,
                server,
            } => {
                let removed = self
                    .hub
                    .lock()
                    .listeners
                    .get_mut(&address)
                    .and_then(|slot| slot.peers.remove(&connection));
                if removed.is_some() {
                    let _ = Self::deliver(
                        &server,
                        TransportEvent::PeerDisconnected {
                            connection,
                            reason: "client closed".to_string(),
                        },
                    );
                }
            }
        }
        self.drain_inbox();
    }

    fn receive(&mut self) -> Option<TransportEvent> {
        match self.receiver.try_recv() {
            Ok(event) => {
                if matches!(event, TransportEvent::Disconnected { .. }) {
                    self.mode = EndpointMode::Idle;
                }
                Some(event)
            }
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Closed) => Some(TransportEvent::Error(TransportError::ChannelClosed)),
        }
    }
}
