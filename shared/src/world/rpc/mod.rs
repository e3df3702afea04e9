pub mod error;
pub mod role_channel;
pub mod rpc_dispatcher;
pub mod rpc_hook;
pub mod rpc_route;
