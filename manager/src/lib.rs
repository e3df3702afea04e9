//! # Syncnet
//! Replication coordinator for a client/server game: drives SyncVar and RPC
//! traffic between a server and its clients at a fixed tick rate, over any
//! [`Transport`](syncnet_shared::Transport), with per-connection heartbeat
//! monitoring.

#![deny(
    trivial_casts,
    trivial_numeric_casts,
    unstable_features,
    unused_import_braces
)]

#[macro_use]
extern crate cfg_if;

pub mod transport;
pub mod shared {
    pub use syncnet_shared::{
        decode, encode, new_role_channel, route_call, BehaviourRef, ChangeHook, ChangeTracker,
        ConnectionId, DescriptorCache, FieldWrite, HeartbeatConfig, HeartbeatError,
        HeartbeatEvent, HeartbeatMessage, HeartbeatMonitor, HeartbeatStats, HeartbeatType,
        HostEntity, IdentityError, IdentityRegistry, MessageError, NetworkBehaviour, NetworkId,
        NetworkIdentity, NetworkMessage, NetworkRole, OwnerId, PendingChange, PendingRpc,
        ProbeSender, RoleAccessor, RoleMutator, RpcDescriptor, RpcDispatcher, RpcError, RpcHook,
        RpcKind, RpcMessage, RpcRoute, SyncValue, SyncVarDescriptor, SyncVarError,
        SyncVarMessage, Timer, Timestamp, Transport, TransportError, TransportEvent,
        SERVER_OWNER_ID, UNASSIGNED_NETWORK_ID,
    };
}

mod error;
mod events;
mod manager;
mod network_config;

cfg_if! {
    if #[cfg(feature = "tokio_runtime")] {
        mod runtime;
        pub use runtime::{spawn_network_loop, NetworkLoopHandle};
    }
}

pub use error::NetworkManagerError;
pub use events::{
    ConnectEvent, DisconnectEvent, ErrorEvent, Event, NetworkEvents, PeerConnectEvent,
    PeerDisconnectEvent, PeerTimeoutEvent,
};
pub use manager::{ConnectionState, NetworkManager};
pub use network_config::NetworkConfig;
