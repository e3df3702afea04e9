pub mod error;
pub mod identity_registry;
pub mod network_identity;
