pub mod behaviour;
pub mod descriptor;
pub mod pending;
pub mod rpc;
pub mod sync_var;
