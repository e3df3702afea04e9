use std::{collections::BTreeMap, mem, time::Instant};

use log::{debug, info, trace, warn};

use syncnet_shared::{
    decode, encode, new_role_channel, ChangeTracker, ConnectionId, HeartbeatEvent,
    HeartbeatMessage, HeartbeatMonitor, HeartbeatStats, HeartbeatType, HostEntity,
    IdentityError, IdentityRegistry, MessageError, NetworkId, NetworkIdentity, NetworkMessage,
    NetworkRole, RoleAccessor, RoleMutator, RpcDispatcher, RpcMessage, SyncVarMessage, Timer,
    Transport, TransportEvent, SERVER_OWNER_ID,
};

use crate::{
    events::NetworkEvents,
    manager::{connection_state::ConnectionState, probe_sender::TransportProbeSender},
    network_config::NetworkConfig,
    NetworkManagerError,
};

/// Coordinates replication for one process: owns the active role, the
/// identity registry, the change tracker and the RPC dispatcher, and moves
/// their traffic through a [`Transport`].
///
/// Driven by polling: call [`update`](Self::update) regularly with the
/// current time. It handles inbound traffic, runs the heartbeat monitors and
/// fires the replication tick at the configured sync rate.
pub struct NetworkManager {
    config: NetworkConfig,
    transport: Box<dyn Transport>,
    state: ConnectionState,
    role_mutator: RoleMutator,
    role: RoleAccessor,
    registry: IdentityRegistry,
    change_tracker: ChangeTracker,
    rpc_dispatcher: RpcDispatcher,
    connections: BTreeMap<ConnectionId, HeartbeatMonitor>,
    sync_timer: Option<Timer>,
    events: NetworkEvents,
}

impl NetworkManager {
    pub fn new<T: Transport + 'static>(
        config: NetworkConfig,
        transport: T,
    ) -> Result<Self, NetworkManagerError> {
        config.validate()?;

        let (role_mutator, role) = new_role_channel();
        Ok(Self {
            config,
            transport: Box::new(transport),
            state: ConnectionState::Disconnected,
            rpc_dispatcher: RpcDispatcher::new(role.clone()),
            role_mutator,
            role,
            registry: IdentityRegistry::new(),
            change_tracker: ChangeTracker::new(),
            connections: BTreeMap::new(),
            sync_timer: None,
            events: NetworkEvents::new(),
        })
    }

    // Lifecycle

    /// Listen on the configured address and act as the server
    pub fn start_server(&mut self) -> Result<(), NetworkManagerError> {
        self.listen(NetworkRole::Server, "start server")
    }

    /// Listen on the configured address and act as server and client at once
    pub fn start_host(&mut self) -> Result<(), NetworkManagerError> {
        self.listen(NetworkRole::Host, "start host")
    }

    fn listen(&mut self, role: NetworkRole, operation: &'static str) -> Result<(), NetworkManagerError> {
        self.require_state(ConnectionState::Disconnected, operation)?;
        self.state = ConnectionState::Connecting;

        if let Err(error) = self.transport.listen(&self.config.host, self.config.port) {
            warn!("NetworkManager: failed to {}: {}", operation, error);
            self.state = ConnectionState::Disconnected;
            return Err(error.into());
        }

        self.state = ConnectionState::Connected;
        self.role_mutator.set_role(Some(role));
        self.claim_server_objects();
        info!(
            "NetworkManager: {} listening on {}:{}",
            role.name(),
            self.config.host,
            self.config.port
        );
        Ok(())
    }

    /// Connect to the server at the configured address
    pub fn connect(&mut self) -> Result<(), NetworkManagerError> {
        let (host, port) = (self.config.host.clone(), self.config.port);
        self.connect_to_server(&host, port)
    }

    /// Begin connecting to a server. The manager stays `Connecting` until
    /// the transport confirms, then raises a
    /// [`ConnectEvent`](crate::ConnectEvent).
    pub fn connect_to_server(&mut self, host: &str, port: u16) -> Result<(), NetworkManagerError> {
        self.require_state(ConnectionState::Disconnected, "connect")?;
        self.state = ConnectionState::Connecting;

        if let Err(error) = self.transport.connect(host, port) {
            warn!("NetworkManager: failed to connect to {}:{}: {}", host, port, error);
            self.state = ConnectionState::Disconnected;
            return Err(error.into());
        }

        info!("NetworkManager: connecting to {}:{}", host, port);
        Ok(())
    }

    /// Close the transport and drop every per-connection and pending state
    pub fn disconnect(&mut self) -> Result<(), NetworkManagerError> {
        if self.state == ConnectionState::Disconnected {
            return Err(NetworkManagerError::InvalidConnectionState {
                state: self.state.name(),
                operation: "disconnect",
            });
        }

        if self.acts_as_server() {
            let peers: Vec<ConnectionId> = self.connections.keys().copied().collect();
            for connection in peers {
                self.registry.cleanup_disconnected_owner(connection.owner_id());
            }
        }
        self.transport.close();
        self.reset();
        info!("NetworkManager: disconnected");
        Ok(())
    }

    fn reset(&mut self) {
        self.state = ConnectionState::Disconnected;
        self.role_mutator.set_role(None);
        self.connections.clear();
        self.sync_timer = None;
        self.change_tracker.clear_pending();
        self.rpc_dispatcher.clear_pending();
    }

    fn require_state(
        &self,
        expected: ConnectionState,
        operation: &'static str,
    ) -> Result<(), NetworkManagerError> {
        if self.state != expected {
            return Err(NetworkManagerError::InvalidConnectionState {
                state: self.state.name(),
                operation,
            });
        }
        Ok(())
    }

    // Objects

    /// Register an entity's identity under the next free network id and
    /// hook every replicated component it carries
    pub fn register_network_object(
        &mut self,
        entity: &dyn HostEntity,
    ) -> Result<NetworkId, NetworkManagerError> {
        self.register_network_object_with_id(entity, None)
    }

    /// Like [`register_network_object`](Self::register_network_object), but
    /// under an id agreed on elsewhere when `explicit_id` is given
    pub fn register_network_object_with_id(
        &mut self,
        entity: &dyn HostEntity,
        explicit_id: Option<NetworkId>,
    ) -> Result<NetworkId, NetworkManagerError> {
        let identity =
            entity
                .network_identity()
                .ok_or_else(|| NetworkManagerError::MissingRequiredComponent {
                    entity: entity.name().to_string(),
                })?;

        let network_id = self.registry.register(&identity, explicit_id)?;
        if self.acts_as_server() && identity.owner_id() == SERVER_OWNER_ID {
            self.registry.grant_authority(network_id, SERVER_OWNER_ID)?;
        }

        for behaviour in entity.behaviours() {
            identity.attach_behaviour(&behaviour);
            self.change_tracker.register_component(&identity, &behaviour)?;
            self.rpc_dispatcher.register_component(&identity, &behaviour)?;
        }

        info!(
            "NetworkManager: registered '{}' as network id {} ({} component(s))",
            entity.name(),
            network_id,
            identity.behaviour_count()
        );
        Ok(network_id)
    }

    pub fn unregister_network_object(
        &mut self,
        network_id: NetworkId,
    ) -> Result<NetworkIdentity, NetworkManagerError> {
        self.registry.unregister(network_id).ok_or_else(|| {
            IdentityError::NotRegistered {
                network_id,
                operation: "unregister",
            }
            .into()
        })
    }

    /// Server-owned objects registered before the server started get their
    /// authority now
    fn claim_server_objects(&mut self) {
        let unclaimed: Vec<NetworkId> = self
            .registry
            .network_ids()
            .into_iter()
            .filter(|network_id| {
                self.registry.find(*network_id).is_some_and(|identity| {
                    identity.owner_id() == SERVER_OWNER_ID && !identity.has_authority()
                })
            })
            .collect();
        for network_id in unclaimed {
            if let Err(error) = self.registry.grant_authority(network_id, SERVER_OWNER_ID) {
                warn!("NetworkManager: could not claim object {}: {}", network_id, error);
            }
        }
    }

    // Update loop

    /// Handle everything the transport delivered, run the heartbeat monitors
    /// and fire the replication tick when due. Returns what happened.
    pub fn update(&mut self, now: Instant) -> NetworkEvents {
        self.receive_transport_events(now);
        self.update_heartbeats(now);

        if self.state == ConnectionState::Connected {
            let interval = self.config.tick_interval();
            let timer = self
                .sync_timer
                .get_or_insert_with(|| Timer::new(interval, now));
            let ringing = timer.ringing(now);
            if ringing {
                timer.reset(now);
                self.tick();
            }
        }

        mem::take(&mut self.events)
    }

    /// One replication tick. A server (or host) broadcasts every pending
    /// SyncVar change, then every pending ClientRpc, unicasting targeted
    /// ones. A client only sends its pending Commands to the server; its
    /// SyncVar queue is never drained.
    ///
    /// Returns how many records were handed to the transport.
    pub fn tick(&mut self) -> usize {
        if self.state != ConnectionState::Connected {
            return 0;
        }
        let Some(role) = self.role.role() else {
            return 0;
        };

        let mut sent = 0;
        if role.is_server() {
            for change in self.change_tracker.drain_pending() {
                if self.send_message(NetworkMessage::SyncVar(SyncVarMessage::from(change)), None) {
                    sent += 1;
                }
            }
        }

        for rpc in self.rpc_dispatcher.drain_pending() {
            let to = match (role.is_server(), rpc.is_client_rpc) {
                (true, true) => rpc.target,
                (false, false) => None,
                (true, false) => {
                    debug!(
                        "NetworkManager: dropping Command {}.{}, the server has no upstream",
                        rpc.component_type, rpc.method_name
                    );
                    continue;
                }
                (false, true) => {
                    debug!(
                        "NetworkManager: dropping ClientRpc {}.{}, clients cannot originate them",
                        rpc.component_type, rpc.method_name
                    );
                    continue;
                }
            };
            if self.send_message(NetworkMessage::Rpc(RpcMessage::from(rpc)), to) {
                sent += 1;
            }
        }

        if sent > 0 {
            trace!("NetworkManager: tick sent {} record(s)", sent);
        }
        sent
    }

    fn send_message(&mut self, message: NetworkMessage, to: Option<ConnectionId>) -> bool {
        let payload = match encode(&message) {
            Ok(payload) => payload,
            Err(error) => {
                warn!("NetworkManager: {}", error);
                self.events.push_error(error.into());
                return false;
            }
        };
        match self.transport.send(&payload, to) {
            Ok(()) => true,
            Err(error) => {
                warn!("NetworkManager: failed to send {} record: {}", message.kind(), error);
                self.events.push_error(error.into());
                false
            }
        }
    }

    fn receive_transport_events(&mut self, now: Instant) {
        while let Some(event) = self.transport.receive() {
            match event {
                TransportEvent::Connected => self.on_connected(now),
                TransportEvent::Disconnected { reason } => self.on_disconnected(&reason),
                TransportEvent::PeerConnected(connection) => self.on_peer_connected(connection, now),
                TransportEvent::PeerDisconnected { connection, reason } => {
                    self.on_peer_disconnected(connection, &reason)
                }
                TransportEvent::Message { from, payload } => self.receive_message(from, &payload, now),
                TransportEvent::Error(error) => {
                    warn!("NetworkManager: transport error: {}", error);
                    self.events.push_error(error.into());
                }
            }
        }
    }

    fn on_connected(&mut self, now: Instant) {
        if self.state != ConnectionState::Connecting {
            warn!(
                "NetworkManager: ignoring transport connect while {}",
                self.state.name()
            );
            return;
        }

        self.state = ConnectionState::Connected;
        self.role_mutator.set_role(Some(NetworkRole::Client));
        let monitor = self.start_monitor(now);
        self.connections.insert(ConnectionId::SERVER, monitor);
        info!("NetworkManager: connected to server");
        self.events.push_connection();
    }

    fn on_disconnected(&mut self, reason: &str) {
        if self.state == ConnectionState::Disconnected || self.acts_as_server() {
            return;
        }
        self.reset();
        info!("NetworkManager: disconnected from server: {}", reason);
        self.events.push_disconnection(reason);
    }

    fn on_peer_connected(&mut self, connection: ConnectionId, now: Instant) {
        if !self.acts_as_server() {
            warn!("NetworkManager: ignoring peer {} while not serving", connection);
            return;
        }

        if self.connections.len() >= self.config.max_connections {
            warn!(
                "NetworkManager: refusing {}, already at {} connection(s)",
                connection, self.config.max_connections
            );
            if let Err(error) = self.transport.disconnect_peer(connection, "server full") {
                self.events.push_error(error.into());
            }
            return;
        }

        let monitor = self.start_monitor(now);
        self.connections.insert(connection, monitor);
        info!("NetworkManager: peer {} connected", connection);
        self.events.push_peer_connection(connection);
    }

    /// Authority held by the peer goes back to the server before anyone
    /// hears about the disconnect
    fn on_peer_disconnected(&mut self, connection: ConnectionId, reason: &str) {
        if self.connections.remove(&connection).is_none() {
            trace!("NetworkManager: {} was not a tracked peer", connection);
            return;
        }

        let transferred = self.registry.cleanup_disconnected_owner(connection.owner_id());
        for network_id in transferred {
            if let Err(error) = self.registry.grant_authority(network_id, SERVER_OWNER_ID) {
                warn!("NetworkManager: could not reclaim object {}: {}", network_id, error);
            }
        }
        info!("NetworkManager: peer {} disconnected: {}", connection, reason);
        self.events.push_peer_disconnection(connection, reason);
    }

    fn start_monitor(&self, now: Instant) -> HeartbeatMonitor {
        let mut monitor = HeartbeatMonitor::new(&self.config.heartbeat);
        monitor.start(now);
        monitor
    }

    // Inbound

    fn receive_message(&mut self, from: ConnectionId, payload: &[u8], now: Instant) {
        let message = match decode(payload) {
            Ok(message) => message,
            Err(MessageError::UnknownKind { kind }) => {
                warn!(
                    "NetworkManager: dropping message of unknown kind '{}' from {}",
                    kind, from
                );
                return;
            }
            Err(error) => {
                trace!("NetworkManager: dropping payload from {}: {}", from, error);
                return;
            }
        };

        match message {
            NetworkMessage::SyncVar(message) => self.receive_sync_var(from, message),
            NetworkMessage::Rpc(message) => self.receive_rpc(from, message),
            NetworkMessage::Heartbeat(message) => self.receive_heartbeat(from, message, now),
        }
    }

    fn receive_sync_var(&mut self, from: ConnectionId, message: SyncVarMessage) {
        if self.acts_as_server() {
            warn!(
                "NetworkManager: dropping SyncVar {}.{} from {}, state only flows from the server",
                message.component_type, message.property_name, from
            );
            return;
        }

        // failures are logged inside
        let _ = self.change_tracker.apply_incoming(
            &self.registry,
            message.network_id,
            &message.component_type,
            &message.property_name,
            message.value,
        );
    }

    fn receive_rpc(&mut self, from: ConnectionId, message: RpcMessage) {
        let Some(role) = self.role.role() else {
            trace!("NetworkManager: dropping RPC from {}, no role active", from);
            return;
        };

        let misdirected = if message.is_client_rpc {
            role.is_server()
        } else {
            role == NetworkRole::Client
        };
        if misdirected {
            warn!(
                "NetworkManager: dropping {} {}.{} from {}, a {} never receives it",
                if message.is_client_rpc { "ClientRpc" } else { "Command" },
                message.component_type,
                message.method_name,
                from,
                role.name()
            );
            return;
        }

        // failures are logged inside
        let _ = self.rpc_dispatcher.dispatch(&self.registry, &message);
    }

    fn receive_heartbeat(&mut self, from: ConnectionId, message: HeartbeatMessage, now: Instant) {
        match message.heartbeat_type {
            HeartbeatType::Ping => {
                let pong = match HeartbeatMonitor::answer_ping(&message) {
                    Ok(pong) => pong,
                    Err(error) => {
                        trace!("NetworkManager: {}", error);
                        return;
                    }
                };
                let to = self.reply_target(from);
                if !self.send_message(NetworkMessage::Heartbeat(pong), to) {
                    debug!("NetworkManager: pong to {} was not sent", from);
                }
            }
            HeartbeatType::Pong => {
                let Some(monitor) = self.connections.get_mut(&from) else {
                    trace!("NetworkManager: pong from untracked {}", from);
                    return;
                };
                if let Err(error) = monitor.receive_pong(&message, now) {
                    trace!("NetworkManager: ignoring pong from {}: {}", from, error);
                }
            }
        }
    }

    fn update_heartbeats(&mut self, now: Instant) {
        let serving = self.acts_as_server();
        let mut timed_out = Vec::new();

        for (connection, monitor) in self.connections.iter_mut() {
            let to = if serving { Some(*connection) } else { None };
            let mut sender = TransportProbeSender::new(self.transport.as_mut(), to);
            match monitor.update(now, &mut sender) {
                Some(HeartbeatEvent::ConnectionLost) => timed_out.push(*connection),
                Some(HeartbeatEvent::ConnectionRestored) => {
                    info!("NetworkManager: heartbeat to {} restored", connection)
                }
                None => {}
            }
        }

        for connection in timed_out {
            warn!("NetworkManager: heartbeat to {} timed out", connection);
            self.events.push_peer_timeout(connection);
            if serving {
                if let Err(error) = self.transport.disconnect_peer(connection, "heartbeat timeout") {
                    debug!("NetworkManager: could not drop {}: {}", connection, error);
                }
                self.on_peer_disconnected(connection, "heartbeat timeout");
            }
        }
    }

    fn reply_target(&self, from: ConnectionId) -> Option<ConnectionId> {
        if self.acts_as_server() {
            Some(from)
        } else {
            None
        }
    }

    fn acts_as_server(&self) -> bool {
        self.role.role().is_some_and(NetworkRole::is_server)
    }

    // Accessors

    pub fn config(&self) -> &NetworkConfig {
        &self.config
    }

    pub fn state(&self) -> ConnectionState {
        self.state
    }

    pub fn role(&self) -> Option<NetworkRole> {
        self.role.role()
    }

    pub fn is_server(&self) -> bool {
        self.acts_as_server()
    }

    pub fn is_client(&self) -> bool {
        self.role.role().is_some_and(NetworkRole::is_client)
    }

    pub fn registry(&self) -> &IdentityRegistry {
        &self.registry
    }

    pub fn registry_mut(&mut self) -> &mut IdentityRegistry {
        &mut self.registry
    }

    pub fn change_tracker(&self) -> &ChangeTracker {
        &self.change_tracker
    }

    pub fn rpc_dispatcher(&self) -> &RpcDispatcher {
        &self.rpc_dispatcher
    }

    /// Connected peers on a server, `[ConnectionId::SERVER]` on a connected
    /// client
    pub fn connections(&self) -> Vec<ConnectionId> {
        self.connections.keys().copied().collect()
    }

    pub fn heartbeat_stats(&self, connection: ConnectionId) -> Option<&HeartbeatStats> {
        self.connections.get(&connection).map(HeartbeatMonitor::stats)
    }
}
