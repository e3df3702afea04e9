/// A server and any number of clients wired over one in-memory hub, driven
/// by a manual clock

use std::time::{Duration, Instant};

use log::trace;

use syncnet::{
    transport::{ChannelHub, DropSwitch},
    NetworkConfig, NetworkEvents, NetworkManager, PeerConnectEvent,
};
use syncnet_shared::ConnectionId;

pub fn test_config(port: u16) -> NetworkConfig {
    NetworkConfig {
        port,
        ..Default::default()
    }
}

pub struct TestClient {
    pub manager: NetworkManager,
    /// The id the server knows this client by, also its owner id
    pub connection: ConnectionId,
    /// Loses everything this client sends while engaged
    pub drop_switch: DropSwitch,
}

/// Events produced by one [`TestNetwork::step`]
pub struct StepEvents {
    pub server: NetworkEvents,
    pub clients: Vec<NetworkEvents>,
}

pub struct TestNetwork {
    hub: ChannelHub,
    config: NetworkConfig,
    pub now: Instant,
    pub server: NetworkManager,
    pub server_drop_switch: DropSwitch,
    pub clients: Vec<TestClient>,
}

impl TestNetwork {
    /// Start a server on `config`'s address
    pub fn new(config: NetworkConfig) -> Self {
        let hub = ChannelHub::new();
        let endpoint = hub.endpoint();
        let server_drop_switch = endpoint.drop_switch();
        let mut server = NetworkManager::new(config.clone(), endpoint).unwrap();
        server.start_server().unwrap();

        Self {
            hub,
            config,
            now: Instant::now(),
            server,
            server_drop_switch,
            clients: Vec::new(),
        }
    }

    /// Connect a new client and let both sides see the connection. Returns
    /// the client's index.
    pub fn connect_client(&mut self) -> usize {
        let endpoint = self.hub.endpoint();
        let drop_switch = endpoint.drop_switch();
        let mut manager = NetworkManager::new(self.config.clone(), endpoint).unwrap();
        manager
            .connect_to_server(&self.config.host, self.config.port)
            .unwrap();
        manager.update(self.now);

        let mut events = self.server.update(self.now);
        let connection = events
            .read::<PeerConnectEvent>()
            .last()
            .expect("server should see the new peer");
        trace!("TestNetwork: client connected as {}", connection);

        self.clients.push(TestClient {
            manager,
            connection,
            drop_switch,
        });
        self.clients.len() - 1
    }

    pub fn client(&mut self, index: usize) -> &mut NetworkManager {
        &mut self.clients[index].manager
    }

    pub fn advance(&mut self, by: Duration) {
        self.now += by;
    }

    /// Update the server, then every client, then the server again so
    /// replies sent during this step are delivered both ways
    pub fn step(&mut self) -> StepEvents {
        let mut server = self.server.update(self.now);
        let clients = self
            .clients
            .iter_mut()
            .map(|client| client.manager.update(self.now))
            .collect();
        server.append(self.server.update(self.now));
        StepEvents { server, clients }
    }

    /// Server tick followed by delivery to every client
    pub fn server_tick(&mut self) -> usize {
        let sent = self.server.tick();
        for client in self.clients.iter_mut() {
            client.manager.update(self.now);
        }
        sent
    }

    /// Client tick followed by delivery to the server
    pub fn client_tick(&mut self, index: usize) -> usize {
        let sent = self.clients[index].manager.tick();
        self.server.update(self.now);
        sent
    }
}
