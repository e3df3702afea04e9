//! # Syncnet Shared
//! Identity, authority, SyncVar, RPC and heartbeat primitives shared by the
//! syncnet network manager and every peer built on it.

#![deny(trivial_numeric_casts, unstable_features, unused_import_braces)]

mod backends;
mod connection;
mod identity;
mod messages;
mod transport;
mod types;
mod world;

pub use backends::{TimeError, Timer, Timestamp};
pub use connection::{
    error::HeartbeatError,
    heartbeat_config::{duration_millis, HeartbeatConfig},
    heartbeat_monitor::{HeartbeatEvent, HeartbeatMonitor, ProbeSender},
    heartbeat_stats::{HeartbeatStats, RttHistory},
    probe_store::ProbeStore,
};
pub use identity::{
    error::IdentityError, identity_registry::IdentityRegistry, network_identity::NetworkIdentity,
};
pub use messages::{
    codec::{decode, encode},
    error::MessageError,
    message::{
        HeartbeatMessage, HeartbeatType, NetworkMessage, RpcMessage, SyncVarMessage,
        HEARTBEAT_KIND, RPC_KIND, SYNCVAR_KIND,
    },
};
pub use transport::{error::TransportError, Transport, TransportEvent};
pub use types::{
    ConnectionId, NetworkId, NetworkRole, OwnerId, SyncValue, SERVER_OWNER_ID,
    UNASSIGNED_NETWORK_ID,
};
pub use world::{
    behaviour::{BehaviourRef, HostEntity, NetworkBehaviour, WeakBehaviourRef},
    descriptor::{DescriptorCache, RpcDescriptor, RpcKind, SyncVarDescriptor},
    pending::{PendingChange, PendingQueue, PendingRpc},
    rpc::{
        error::RpcError,
        role_channel::{new_role_channel, RoleAccessor, RoleMutator},
        rpc_dispatcher::RpcDispatcher,
        rpc_hook::RpcHook,
        rpc_route::{route_call, RpcRoute},
    },
    sync_var::{
        change_hook::{ChangeHook, FieldWrite},
        change_tracker::ChangeTracker,
        error::SyncVarError,
    },
};
