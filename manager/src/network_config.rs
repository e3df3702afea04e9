use std::{default::Default, time::Duration};

use serde::{Deserialize, Serialize};

use syncnet_shared::HeartbeatConfig;

use crate::error::NetworkManagerError;

/// Contains Config properties which will be used by the NetworkManager.
///
/// Loads from JSON using the option names `host`, `port`,
/// `maxConnections`, `syncRate` plus the flattened heartbeat options;
/// anything missing keeps its default.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct NetworkConfig {
    /// Address to listen on (server) or connect to (client)
    pub host: String,
    pub port: u16,
    /// Peers beyond this many are dropped as soon as they connect
    pub max_connections: usize,
    /// Replication ticks per second
    pub sync_rate: u32,
    /// Configuration used to monitor RTT, jitter and loss on every connection
    #[serde(flatten)]
    pub heartbeat: HeartbeatConfig,
}

impl NetworkConfig {
    pub fn from_json_str(json: &str) -> Result<Self, NetworkManagerError> {
        serde_json::from_str(json).map_err(|error| NetworkManagerError::InvalidConfig {
            reason: error.to_string(),
        })
    }

    /// Delay between two replication ticks
    pub fn tick_interval(&self) -> Duration {
        Duration::from_secs(1) / self.sync_rate.max(1)
    }

    pub(crate) fn validate(&self) -> Result<(), NetworkManagerError> {
        if self.sync_rate == 0 {
            return Err(NetworkManagerError::InvalidConfig {
                reason: "syncRate must be at least 1".to_string(),
            });
        }
        Ok(())
    }
}

impl Default for NetworkConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 7777,
            max_connections: 16,
            sync_rate: 20,
            heartbeat: HeartbeatConfig::default(),
        }
    }
}
