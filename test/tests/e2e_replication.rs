/// End-to-end SyncVar and RPC replication between a server and its clients
/// over the in-memory transport

use std::{
    sync::{Arc, RwLock},
    time::{Duration, Instant},
};

use serde_json::json;
use syncnet::{transport::ChannelHub, ErrorEvent, NetworkManager};
use syncnet_shared::{
    decode, encode, BehaviourRef, ChangeTracker, FieldWrite, IdentityRegistry, NetworkIdentity,
    NetworkMessage, RpcMessage, RpcRoute, SyncVarMessage, Transport, TransportEvent,
};
use syncnet_test::{test_config, Health, TestEntity, TestNetwork, Weapon};

fn init_logging() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn health_entity(name: &str, health: i64) -> (TestEntity, Arc<RwLock<Health>>) {
    let component = Health::shared(health);
    let behaviour: BehaviourRef = component.clone();
    (TestEntity::new(name).with_behaviour(behaviour), component)
}

fn weapon_entity(entity: TestEntity) -> (TestEntity, Arc<RwLock<Weapon>>) {
    let component = Weapon::shared();
    let behaviour: BehaviourRef = component.clone();
    (entity.with_behaviour(behaviour), component)
}

/// A registered Health on each side of the network, all under network id 1
struct HealthMirror {
    _entities: Vec<TestEntity>,
    server: Arc<RwLock<Health>>,
    clients: Vec<Arc<RwLock<Health>>>,
}

fn mirror_health(network: &mut TestNetwork) -> HealthMirror {
    let mut entities = Vec::new();
    let (entity, server) = health_entity("player", 100);
    assert_eq!(network.server.register_network_object(&entity), Ok(1));
    entities.push(entity);

    let mut clients = Vec::new();
    for client in network.clients.iter_mut() {
        let (entity, health) = health_entity("player", 100);
        assert_eq!(client.manager.register_network_object(&entity), Ok(1));
        entities.push(entity);
        clients.push(health);
    }

    HealthMirror {
        _entities: entities,
        server,
        clients,
    }
}

#[test]
fn syncvar_change_round_trips_through_the_codec() {
    init_logging();

    // writer side
    let mut registry = IdentityRegistry::new();
    let mut tracker = ChangeTracker::new();
    let identity = NetworkIdentity::new();
    assert_eq!(registry.register(&identity, None), Ok(1));
    registry.grant_authority(1, 7).unwrap();
    let health = Health::shared(100);
    let behaviour: BehaviourRef = health.clone();
    identity.attach_behaviour(&behaviour);
    tracker.register_component(&identity, &behaviour).unwrap();

    assert_eq!(health.write().unwrap().set_health(80), FieldWrite::Accepted);
    let pending = tracker.drain_pending();
    assert_eq!(pending.len(), 1);
    let bytes = encode(&NetworkMessage::SyncVar(SyncVarMessage::from(pending[0].clone()))).unwrap();

    // reader side
    let mut peer_registry = IdentityRegistry::new();
    let mut peer_tracker = ChangeTracker::new();
    let peer_identity = NetworkIdentity::new();
    peer_registry.register(&peer_identity, Some(1)).unwrap();
    let peer_health = Health::shared(100);
    let peer_behaviour: BehaviourRef = peer_health.clone();
    peer_identity.attach_behaviour(&peer_behaviour);
    peer_tracker
        .register_component(&peer_identity, &peer_behaviour)
        .unwrap();

    let NetworkMessage::SyncVar(message) = decode(&bytes).unwrap() else {
        panic!("expected a syncvar message");
    };
    peer_tracker
        .apply_incoming(
            &peer_registry,
            message.network_id,
            &message.component_type,
            &message.property_name,
            message.value,
        )
        .unwrap();

    let peer_health = peer_health.read().unwrap();
    assert_eq!(peer_health.health(), 80);
    assert_eq!(peer_health.changes(), &[(Some(json!(100)), json!(80))]);
}

#[test]
fn server_syncvar_reaches_every_client() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7100));
    network.connect_client();
    network.connect_client();
    let mirror = mirror_health(&mut network);

    assert_eq!(mirror.server.write().unwrap().set_health(80), FieldWrite::Accepted);
    assert_eq!(network.server_tick(), 1);

    for client in &mirror.clients {
        let client = client.read().unwrap();
        assert_eq!(client.health(), 80);
        assert_eq!(client.changes(), &[(Some(json!(100)), json!(80))]);
    }
    assert_eq!(network.server.change_tracker().pending_len(), 0);
}

#[test]
fn sync_rate_drives_the_tick() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7101));
    let index = network.connect_client();
    let mirror = mirror_health(&mut network);

    mirror.server.write().unwrap().set_health(60);
    network.advance(Duration::from_millis(49));
    network.step();
    assert_eq!(mirror.clients[index].read().unwrap().health(), 100);

    // 20 ticks per second
    network.advance(Duration::from_millis(1));
    network.step();
    assert_eq!(mirror.clients[index].read().unwrap().health(), 60);
}

#[test]
fn client_syncvars_never_leave_the_client() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7102));
    let index = network.connect_client();
    let mirror = mirror_health(&mut network);

    {
        let mut health = mirror.clients[index].write().unwrap();
        assert_eq!(health.set_health(10), FieldWrite::Rejected);
        assert_eq!(health.set_regen(3), FieldWrite::Accepted);
    }
    assert_eq!(network.client_tick(index), 0);

    assert_eq!(mirror.server.read().unwrap().regen(), 0);
    assert_eq!(mirror.clients[index].read().unwrap().health(), 100);
    assert_eq!(network.client(index).change_tracker().pending_len(), 1);
}

#[test]
fn command_reaches_the_server() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7103));
    let index = network.connect_client();
    let owner = network.clients[index].connection.owner_id();

    let (server_entity, server_weapon) = weapon_entity(TestEntity::owned_by("gun", owner));
    let network_id = network.server.register_network_object(&server_entity).unwrap();
    network
        .server
        .registry_mut()
        .grant_authority(network_id, owner)
        .unwrap();

    let (client_entity, client_weapon) = weapon_entity(TestEntity::owned_by("gun", owner));
    network.client(index).register_network_object(&client_entity).unwrap();
    network
        .client(index)
        .registry_mut()
        .grant_authority(network_id, owner)
        .unwrap();

    assert_eq!(
        client_weapon.write().unwrap().cmd_fire(5),
        RpcRoute::EnqueueAndReturn
    );
    assert_eq!(network.client_tick(index), 1);

    assert_eq!(server_weapon.read().unwrap().shots(), &[5]);
    assert!(client_weapon.read().unwrap().shots().is_empty());
}

#[test]
fn client_without_authority_sends_nothing() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7104));
    let index = network.connect_client();

    let (server_entity, server_weapon) = weapon_entity(TestEntity::new("turret"));
    network.server.register_network_object(&server_entity).unwrap();
    let (client_entity, client_weapon) = weapon_entity(TestEntity::new("turret"));
    network.client(index).register_network_object(&client_entity).unwrap();

    assert_eq!(client_weapon.write().unwrap().cmd_fire(5), RpcRoute::Reject);
    assert_eq!(network.client_tick(index), 0);
    assert!(server_weapon.read().unwrap().shots().is_empty());
    assert!(client_weapon.read().unwrap().shots().is_empty());
}

#[test]
fn client_rpc_is_broadcast() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7105));
    network.connect_client();
    network.connect_client();

    let (server_entity, server_weapon) = weapon_entity(TestEntity::new("turret"));
    network.server.register_network_object(&server_entity).unwrap();
    let mut client_weapons = Vec::new();
    let mut client_entities = Vec::new();
    for client in network.clients.iter_mut() {
        let (entity, weapon) = weapon_entity(TestEntity::new("turret"));
        client.manager.register_network_object(&entity).unwrap();
        client_entities.push(entity);
        client_weapons.push(weapon);
    }

    assert_eq!(
        server_weapon.write().unwrap().rpc_flash("red"),
        RpcRoute::EnqueueAndReturn
    );
    assert_eq!(network.server_tick(), 1);

    assert!(server_weapon.read().unwrap().flashes().is_empty());
    for weapon in &client_weapons {
        assert_eq!(weapon.read().unwrap().flashes(), &["red".to_string()]);
    }
}

#[test]
fn targeted_client_rpc_reaches_one_client() {
    init_logging();
    let mut network = TestNetwork::new(test_config(7106));
    network.connect_client();
    let target_index = network.connect_client();
    let target = network.clients[target_index].connection;

    let (server_entity, server_weapon) = weapon_entity(TestEntity::new("turret"));
    network.server.register_network_object(&server_entity).unwrap();
    let mut client_weapons = Vec::new();
    let mut client_entities = Vec::new();
    for client in network.clients.iter_mut() {
        let (entity, weapon) = weapon_entity(TestEntity::new("turret"));
        client.manager.register_network_object(&entity).unwrap();
        client_entities.push(entity);
        client_weapons.push(weapon);
    }

    server_weapon.write().unwrap().rpc_flash_to(target, "blue");
    assert_eq!(network.server_tick(), 1);

    assert!(client_weapons[0].read().unwrap().flashes().is_empty());
    assert_eq!(
        client_weapons[target_index].read().unwrap().flashes(),
        &["blue".to_string()]
    );
}

#[test]
fn host_runs_commands_and_queues_client_rpcs() {
    init_logging();
    let hub = ChannelHub::new();
    let mut host = NetworkManager::new(test_config(7107), hub.endpoint()).unwrap();
    host.start_host().unwrap();
    let (entity, weapon) = weapon_entity(TestEntity::new("turret"));
    host.register_network_object(&entity).unwrap();

    assert_eq!(weapon.write().unwrap().cmd_fire(2), RpcRoute::RunLocally);
    assert_eq!(weapon.write().unwrap().rpc_flash("red"), RpcRoute::EnqueueAndReturn);

    assert_eq!(weapon.read().unwrap().shots(), &[2]);
    assert!(weapon.read().unwrap().flashes().is_empty());
    assert_eq!(host.rpc_dispatcher().pending_len(), 1);
}

#[test]
fn tick_sends_syncvars_before_rpcs() {
    init_logging();
    let hub = ChannelHub::new();
    let config = test_config(7108);
    let now = Instant::now();
    let mut server = NetworkManager::new(config.clone(), hub.endpoint()).unwrap();
    server.start_server().unwrap();

    let mut observer = hub.endpoint();
    observer.connect(&config.host, config.port).unwrap();
    server.update(now);

    let (entity, health) = health_entity("boss", 100);
    let (entity, weapon) = weapon_entity(entity);
    server.register_network_object(&entity).unwrap();

    // queued in the opposite order
    weapon.write().unwrap().rpc_flash("red");
    health.write().unwrap().set_health(90);
    assert_eq!(server.tick(), 2);

    let mut kinds = Vec::new();
    while let Some(event) = observer.receive() {
        if let TransportEvent::Message { payload, .. } = event {
            match decode(&payload).unwrap() {
                NetworkMessage::Heartbeat(_) => {}
                message => kinds.push(message.kind()),
            }
        }
    }
    assert_eq!(kinds, vec!["syncvar", "rpc"]);
}

#[test]
fn misdirected_traffic_is_dropped() {
    init_logging();
    let hub = ChannelHub::new();
    let config = test_config(7109);
    let now = Instant::now();
    let mut server = NetworkManager::new(config.clone(), hub.endpoint()).unwrap();
    server.start_server().unwrap();
    let (entity, health) = health_entity("boss", 100);
    let (entity, weapon) = weapon_entity(entity);
    server.register_network_object(&entity).unwrap();

    let mut rogue = hub.endpoint();
    rogue.connect(&config.host, config.port).unwrap();

    let sync_var = NetworkMessage::SyncVar(SyncVarMessage {
        network_id: 1,
        component_type: "Health".to_string(),
        property_name: "health".to_string(),
        value: json!(1),
        timestamp: 0,
    });
    let client_rpc = NetworkMessage::Rpc(RpcMessage {
        network_id: 1,
        component_type: "Weapon".to_string(),
        method_name: "rpc_flash".to_string(),
        args: vec![json!("red")],
        is_client_rpc: true,
        timestamp: 0,
    });
    rogue.send(&encode(&sync_var).unwrap(), None).unwrap();
    rogue.send(&encode(&client_rpc).unwrap(), None).unwrap();
    rogue.send(br#"{"kind":"chat","text":"hi"}"#, None).unwrap();
    rogue.send(b"\x00garbage", None).unwrap();

    let events = server.update(now);

    assert!(!events.has::<ErrorEvent>());
    assert_eq!(health.read().unwrap().health(), 100);
    assert!(weapon.read().unwrap().flashes().is_empty());
    assert_eq!(server.connections().len(), 1);
}
