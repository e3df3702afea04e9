/// Tests for the NetworkManager lifecycle, registration and connection
/// bookkeeping

use std::time::{Duration, Instant};

use syncnet::{
    transport::ChannelHub, ConnectEvent, ConnectionState, DisconnectEvent, NetworkConfig,
    NetworkManager, NetworkManagerError, PeerConnectEvent, PeerDisconnectEvent,
};
use syncnet_shared::{
    BehaviourRef, ConnectionId, IdentityError, NetworkRole, TransportError, SERVER_OWNER_ID,
};
use syncnet_test::{test_config, Health, TestEntity, TestNetwork};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn server(hub: &ChannelHub, config: &NetworkConfig) -> NetworkManager {
    let mut server = NetworkManager::new(config.clone(), hub.endpoint()).unwrap();
    server.start_server().unwrap();
    server
}

#[test]
fn zero_sync_rate_is_rejected() {
    init_logging();
    let config = NetworkConfig {
        sync_rate: 0,
        ..test_config(7000)
    };
    assert!(matches!(
        NetworkManager::new(config, ChannelHub::new().endpoint()),
        Err(NetworkManagerError::InvalidConfig { .. })
    ));
}

#[test]
fn config_loads_from_json() {
    let config = NetworkConfig::from_json_str(
        r#"{"host": "0.0.0.0", "maxConnections": 4, "heartbeatInterval": 500}"#,
    )
    .unwrap();
    assert_eq!(config.host, "0.0.0.0");
    assert_eq!(config.max_connections, 4);
    assert_eq!(config.sync_rate, 20);
    assert_eq!(config.heartbeat.heartbeat_interval, Duration::from_millis(500));
}

#[test]
fn server_start_sets_role_and_state() {
    init_logging();
    let hub = ChannelHub::new();
    let mut manager = NetworkManager::new(test_config(7001), hub.endpoint()).unwrap();
    assert_eq!(manager.state(), ConnectionState::Disconnected);
    assert_eq!(manager.role(), None);

    manager.start_server().unwrap();

    assert_eq!(manager.state(), ConnectionState::Connected);
    assert_eq!(manager.role(), Some(NetworkRole::Server));
    assert!(manager.is_server());
    assert!(!manager.is_client());
    assert_eq!(
        manager.start_server(),
        Err(NetworkManagerError::InvalidConnectionState {
            state: "connected",
            operation: "start server",
        })
    );
    assert!(matches!(
        manager.connect(),
        Err(NetworkManagerError::InvalidConnectionState { .. })
    ));
}

#[test]
fn host_is_server_and_client() {
    init_logging();
    let hub = ChannelHub::new();
    let mut manager = NetworkManager::new(test_config(7002), hub.endpoint()).unwrap();

    manager.start_host().unwrap();

    assert_eq!(manager.role(), Some(NetworkRole::Host));
    assert!(manager.is_server());
    assert!(manager.is_client());
}

#[test]
fn failed_listen_falls_back_to_disconnected() {
    init_logging();
    let hub = ChannelHub::new();
    let config = test_config(7003);
    let _first = server(&hub, &config);

    let mut second = NetworkManager::new(config, hub.endpoint()).unwrap();
    assert!(matches!(
        second.start_server(),
        Err(NetworkManagerError::Transport(TransportError::ListenFailed { .. }))
    ));
    assert_eq!(second.state(), ConnectionState::Disconnected);
    assert_eq!(second.role(), None);
}

#[test]
fn failed_connect_falls_back_to_disconnected() {
    init_logging();
    let mut client = NetworkManager::new(test_config(7004), ChannelHub::new().endpoint()).unwrap();

    assert!(matches!(
        client.connect(),
        Err(NetworkManagerError::Transport(TransportError::ConnectFailed { .. }))
    ));
    assert_eq!(client.state(), ConnectionState::Disconnected);
}

#[test]
fn client_is_connecting_until_transport_confirms() {
    init_logging();
    let hub = ChannelHub::new();
    let config = test_config(7005);
    let mut server = server(&hub, &config);
    let mut client = NetworkManager::new(config, hub.endpoint()).unwrap();
    let now = Instant::now();

    client.connect().unwrap();
    assert_eq!(client.state(), ConnectionState::Connecting);
    assert_eq!(client.role(), None);

    let mut events = client.update(now);
    assert_eq!(events.read::<ConnectEvent>().count(), 1);
    assert_eq!(client.state(), ConnectionState::Connected);
    assert_eq!(client.role(), Some(NetworkRole::Client));
    assert_eq!(client.connections(), vec![ConnectionId::SERVER]);

    let mut events = server.update(now);
    let peers: Vec<_> = events.read::<PeerConnectEvent>().collect();
    assert_eq!(peers.len(), 1);
    assert_eq!(server.connections(), peers);
}

#[test]
fn disconnect_requires_an_active_connection() {
    init_logging();
    let mut manager = NetworkManager::new(test_config(7006), ChannelHub::new().endpoint()).unwrap();
    assert_eq!(
        manager.disconnect(),
        Err(NetworkManagerError::InvalidConnectionState {
            state: "disconnected",
            operation: "disconnect",
        })
    );
}

#[test]
fn server_disconnect_resets_and_notifies_clients() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7007));
    let index = network.connect_client();

    network.server.disconnect().unwrap();
    assert_eq!(network.server.state(), ConnectionState::Disconnected);
    assert_eq!(network.server.role(), None);
    assert!(network.server.connections().is_empty());

    let now = network.now;
    let mut events = network.client(index).update(now);
    assert_eq!(
        events.read::<DisconnectEvent>().collect::<Vec<_>>(),
        vec!["server closed".to_string()]
    );
    assert_eq!(network.client(index).state(), ConnectionState::Disconnected);
    assert_eq!(network.client(index).role(), None);
}

#[test]
fn client_disconnect_is_seen_by_server() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7008));
    let index = network.connect_client();
    let connection = network.clients[index].connection;

    network.client(index).disconnect().unwrap();
    let mut events = network.server.update(network.now);

    assert_eq!(
        events.read::<PeerDisconnectEvent>().collect::<Vec<_>>(),
        vec![(connection, "client closed".to_string())]
    );
    assert!(network.server.connections().is_empty());
    assert_eq!(network.client(index).state(), ConnectionState::Disconnected);
}

#[test]
fn peers_beyond_max_connections_are_refused() {
    init_logging();
    let hub = ChannelHub::new();
    let config = NetworkConfig {
        max_connections: 1,
        ..test_config(7009)
    };
    let mut server = server(&hub, &config);
    let now = Instant::now();

    let mut first = NetworkManager::new(config.clone(), hub.endpoint()).unwrap();
    first.connect().unwrap();
    first.update(now);
    assert!(server.update(now).has::<PeerConnectEvent>());

    let mut second = NetworkManager::new(config, hub.endpoint()).unwrap();
    second.connect().unwrap();
    second.update(now);
    let server_events = server.update(now);
    assert!(!server_events.has::<PeerConnectEvent>());
    assert!(!server_events.has::<PeerDisconnectEvent>());
    assert_eq!(server.connections().len(), 1);

    let mut events = second.update(now);
    assert_eq!(
        events.read::<DisconnectEvent>().collect::<Vec<_>>(),
        vec!["server full".to_string()]
    );
    assert_eq!(second.state(), ConnectionState::Disconnected);
    assert_eq!(first.state(), ConnectionState::Connected);
}

#[test]
fn registration_requires_identity() {
    init_logging();
    let mut manager = NetworkManager::new(test_config(7010), ChannelHub::new().endpoint()).unwrap();

    assert_eq!(
        manager.register_network_object(&TestEntity::without_identity("ghost")),
        Err(NetworkManagerError::MissingRequiredComponent {
            entity: "ghost".to_string()
        })
    );
    assert!(manager.registry().is_empty());
}

#[test]
fn registration_hooks_components() {
    init_logging();
    let hub = ChannelHub::new();
    let mut server = server(&hub, &test_config(7011));
    let health = Health::shared(100);
    let behaviour: BehaviourRef = health.clone();
    let entity = TestEntity::new("crate").with_behaviour(behaviour);

    assert_eq!(server.register_network_object(&entity), Ok(1));

    let identity = entity.identity().unwrap();
    assert_eq!(identity.network_id(), 1);
    assert_eq!(identity.behaviour_count(), 1);
    assert!(identity.has_authority());
    assert!(health.read().unwrap().is_hooked());
    assert!(server.change_tracker().descriptors("Health").is_some());
}

#[test]
fn explicit_id_collision_surfaces_identity_error() {
    init_logging();
    let mut manager = NetworkManager::new(test_config(7012), ChannelHub::new().endpoint()).unwrap();
    manager
        .register_network_object_with_id(&TestEntity::new("a"), Some(3))
        .unwrap();

    assert_eq!(
        manager.register_network_object_with_id(&TestEntity::new("b"), Some(3)),
        Err(NetworkManagerError::Identity(IdentityError::IdAlreadyInUse {
            network_id: 3
        }))
    );
}

#[test]
fn server_claims_objects_registered_before_start() {
    init_logging();
    let hub = ChannelHub::new();
    let mut manager = NetworkManager::new(test_config(7013), hub.endpoint()).unwrap();
    let owned = TestEntity::owned_by("pet", 4);
    let unowned = TestEntity::new("door");
    manager.register_network_object(&owned).unwrap();
    manager.register_network_object(&unowned).unwrap();
    assert!(!unowned.identity().unwrap().has_authority());

    manager.start_server().unwrap();

    assert!(unowned.identity().unwrap().has_authority());
    assert_eq!(unowned.identity().unwrap().owner_id(), SERVER_OWNER_ID);
    assert!(!owned.identity().unwrap().has_authority());
}

#[test]
fn client_registration_does_not_grant_authority() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7014));
    let index = network.connect_client();
    let entity = TestEntity::new("crate");

    network.client(index).register_network_object(&entity).unwrap();

    assert!(!entity.identity().unwrap().has_authority());
}

#[test]
fn unregister_releases_identity() {
    init_logging();
    let mut manager = NetworkManager::new(test_config(7015), ChannelHub::new().endpoint()).unwrap();
    let entity = TestEntity::new("crate");
    let network_id = manager.register_network_object(&entity).unwrap();

    let identity = manager.unregister_network_object(network_id).unwrap();
    assert!(identity.ptr_eq(entity.identity().unwrap()));
    assert!(!identity.is_registered());
    assert_eq!(
        manager.unregister_network_object(network_id).unwrap_err(),
        NetworkManagerError::Identity(IdentityError::NotRegistered {
            network_id,
            operation: "unregister",
        })
    );
}

#[test]
fn tick_does_nothing_while_disconnected() {
    init_logging();
    let mut manager = NetworkManager::new(test_config(7016), ChannelHub::new().endpoint()).unwrap();
    assert_eq!(manager.tick(), 0);
    assert!(manager.update(Instant::now()).is_empty());
}

#[test]
fn heartbeats_run_on_every_connection() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7017));
    let index = network.connect_client();
    let connection = network.clients[index].connection;

    network.step();

    let server_stats = network.server.heartbeat_stats(connection).unwrap();
    assert_eq!(server_stats.total_sent, 1);
    assert_eq!(server_stats.total_received, 1);
    assert!(server_stats.is_alive);

    let client_stats = network
        .client(index)
        .heartbeat_stats(ConnectionId::SERVER)
        .unwrap();
    assert_eq!(client_stats.total_sent, 1);
    assert_eq!(client_stats.total_received, 1);
    assert!(network.server.heartbeat_stats(ConnectionId::new(99)).is_none());
}
