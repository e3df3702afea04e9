mod connection_state;
mod network_manager;
mod probe_sender;

pub use connection_state::ConnectionState;
pub use network_manager::NetworkManager;
