use serde::{Deserialize, Serialize};

use crate::{
    types::{NetworkId, SyncValue},
    world::pending::{PendingChange, PendingRpc},
};

pub const SYNCVAR_KIND: &str = "syncvar";
pub const RPC_KIND: &str = "rpc";
pub const HEARTBEAT_KIND: &str = "heartbeat";

/// Everything that crosses the wire, discriminated by `kind`
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind")]
pub enum NetworkMessage {
    #[serde(rename = "syncvar")]
    SyncVar(SyncVarMessage),
    #[serde(rename = "rpc")]
    Rpc(RpcMessage),
    #[serde(rename = "heartbeat")]
    Heartbeat(HeartbeatMessage),
}

impl NetworkMessage {
    pub fn kind(&self) -> &'static str {
        match self {
            NetworkMessage::SyncVar(_) => SYNCVAR_KIND,
            NetworkMessage::Rpc(_) => RPC_KIND,
            NetworkMessage::Heartbeat(_) => HEARTBEAT_KIND,
        }
    }

    pub fn is_known_kind(kind: &str) -> bool {
        matches!(kind, SYNCVAR_KIND | RPC_KIND | HEARTBEAT_KIND)
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncVarMessage {
    pub network_id: NetworkId,
    pub component_type: String,
    pub property_name: String,
    pub value: SyncValue,
    pub timestamp: i64,
}

impl From<PendingChange> for SyncVarMessage {
    fn from(change: PendingChange) -> Self {
        Self {
            network_id: change.network_id,
            component_type: change.component_type,
            property_name: change.property_name,
            value: change.new_value,
            timestamp: change.timestamp,
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RpcMessage {
    pub network_id: NetworkId,
    pub component_type: String,
    pub method_name: String,
    #[serde(default)]
    pub args: Vec<SyncValue>,
    pub is_client_rpc: bool,
    pub timestamp: i64,
}

impl From<PendingRpc> for RpcMessage {
    fn from(rpc: PendingRpc) -> Self {
        Self {
            network_id: rpc.network_id,
            component_type: rpc.component_type,
            method_name: rpc.method_name,
            args: rpc.args,
            is_client_rpc: rpc.is_client_rpc,
            timestamp: rpc.timestamp,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HeartbeatType {
    Ping,
    Pong,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HeartbeatMessage {
    pub id: String,
    pub timestamp: i64,
    pub sequence_number: u32,
    #[serde(rename = "type")]
    pub heartbeat_type: HeartbeatType,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payload: Option<Vec<u8>>,
}

impl HeartbeatMessage {
    /// The reply to a ping: same id and sequence, the responder's clock
    pub fn pong_for(ping: &HeartbeatMessage, timestamp: i64) -> Self {
        Self {
            id: ping.id.clone(),
            timestamp,
            sequence_number: ping.sequence_number,
            heartbeat_type: HeartbeatType::Pong,
            payload: ping.payload.clone(),
        }
    }
}
