use std::{default::Default, time::Duration};

use serde::{Deserialize, Serialize};

/// Contains Config properties which will be used by every HeartbeatMonitor
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct HeartbeatConfig {
    /// Base delay between two probes
    #[serde(with = "duration_millis")]
    pub heartbeat_interval: Duration,
    /// How long a probe may stay unanswered before it counts as lost
    #[serde(with = "duration_millis")]
    pub heartbeat_timeout: Duration,
    /// Consecutive losses after which the connection is considered dead
    pub max_consecutive_loss: u32,
    /// Size in bytes of the filler payload attached to each ping
    pub heartbeat_packet_size: usize,
    /// Adapt the probe interval to the observed loss rate and RTT
    pub adaptive_heartbeat: bool,
    /// Number of RTT samples kept for the rolling statistics
    pub rtt_history_size: usize,
}

impl Default for HeartbeatConfig {
    fn default() -> Self {
        Self {
            heartbeat_interval: Duration::from_millis(2000),
            heartbeat_timeout: Duration::from_millis(5000),
            max_consecutive_loss: 3,
            heartbeat_packet_size: 32,
            adaptive_heartbeat: false,
            rtt_history_size: 20,
        }
    }
}

/// (De)serializes a `Duration` as whole milliseconds
pub mod duration_millis {
    use std::time::Duration;

    use serde::{Deserialize, Deserializer, Serializer};

    pub fn serialize<S: Serializer>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u64(duration.as_millis() as u64)
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Duration, D::Error> {
        u64::deserialize(deserializer).map(Duration::from_millis)
    }
}
