use crate::{
    types::NetworkRole,
    world::descriptor::{RpcDescriptor, RpcKind},
};

/// What a local call to an RPC method must do
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum RpcRoute {
    /// Execute the method body here
    RunLocally,
    /// Queue an RPC record for the next tick and skip the body
    EnqueueAndReturn,
    /// Drop the call, the body does not run
    Reject,
}

impl RpcRoute {
    pub fn runs_locally(self) -> bool {
        self == RpcRoute::RunLocally
    }
}

/// Decide how a local call is handled, given the process role, whether the
/// object's identity holds authority, and the method's descriptor.
///
/// | kind      | server / host      | client only                             | no role    |
/// |-----------|--------------------|-----------------------------------------|------------|
/// | Command   | RunLocally         | Reject without authority, else Enqueue  | RunLocally |
/// | ClientRpc | EnqueueAndReturn   | RunLocally                              | RunLocally |
pub fn route_call(
    role: Option<NetworkRole>,
    has_authority: bool,
    descriptor: &RpcDescriptor,
) -> RpcRoute {
    let Some(role) = role else {
        return RpcRoute::RunLocally;
    };

    match descriptor.kind {
        RpcKind::Command => {
            if role.is_server() {
                RpcRoute::RunLocally
            } else if descriptor.requires_authority && !has_authority {
                RpcRoute::Reject
            } else {
                RpcRoute::EnqueueAndReturn
            }
        }
        RpcKind::ClientRpc => {
            if role.is_server() {
                RpcRoute::EnqueueAndReturn
            } else {
                RpcRoute::RunLocally
            }
        }
    }
}
