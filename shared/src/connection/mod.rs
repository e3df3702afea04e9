pub mod error;
pub mod heartbeat_config;
pub mod heartbeat_monitor;
pub mod heartbeat_stats;
pub mod probe_store;
