use std::collections::HashMap;

/// Declares one replicated field of a component type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct SyncVarDescriptor {
    pub property: &'static str,
    /// Only the authoritative side may originate changes
    pub authority_only: bool,
    /// Name passed to `on_sync_var_changed` after a value is applied
    pub on_changed: Option<&'static str>,
}

impl SyncVarDescriptor {
    pub const fn new(property: &'static str) -> Self {
        Self {
            property,
            authority_only: true,
            on_changed: None,
        }
    }

    pub const fn authority_only(mut self, authority_only: bool) -> Self {
        self.authority_only = authority_only;
        self
    }

    pub const fn on_changed(mut self, hook: &'static str) -> Self {
        self.on_changed = Some(hook);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum RpcKind {
    /// server -> client(s)
    ClientRpc,
    /// client -> server
    Command,
}

impl RpcKind {
    pub fn from_is_client_rpc(is_client_rpc: bool) -> Self {
        if is_client_rpc {
            RpcKind::ClientRpc
        } else {
            RpcKind::Command
        }
    }

    pub fn is_client_rpc(self) -> bool {
        self == RpcKind::ClientRpc
    }

    pub fn name(self) -> &'static str {
        match self {
            RpcKind::ClientRpc => "ClientRpc",
            RpcKind::Command => "Command",
        }
    }
}

/// Declares one remotely invocable method of a component type
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct RpcDescriptor {
    pub method: &'static str,
    pub kind: RpcKind,
    pub requires_authority: bool,
}

impl RpcDescriptor {
    pub const fn command(method: &'static str) -> Self {
        Self {
            method,
            kind: RpcKind::Command,
            requires_authority: true,
        }
    }

    pub const fn client_rpc(method: &'static str) -> Self {
        Self {
            method,
            kind: RpcKind::ClientRpc,
            requires_authority: true,
        }
    }

    pub const fn requires_authority(mut self, requires_authority: bool) -> Self {
        self.requires_authority = requires_authority;
        self
    }
}

/// Descriptor tables keyed by component type name. Each type is asked for
/// its table once; every later lookup is served from here.
pub struct DescriptorCache<D: 'static> {
    tables: HashMap<&'static str, &'static [D]>,
}

impl<D: 'static> DescriptorCache<D> {
    pub fn new() -> Self {
        Self {
            tables: HashMap::new(),
        }
    }

    /// Returns the cached table for `kind`, calling `discover` on a miss
    pub fn discover(
        &mut self,
        kind: &'static str,
        discover: impl FnOnce() -> &'static [D],
    ) -> &'static [D] {
        *self.tables.entry(kind).or_insert_with(discover)
    }

    pub fn get(&self, kind: &str) -> Option<&'static [D]> {
        self.tables.get(kind).copied()
    }

    pub fn contains(&self, kind: &str) -> bool {
        self.tables.contains_key(kind)
    }

    pub fn len(&self) -> usize {
        self.tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tables.is_empty()
    }
}

impl<D: 'static> Default for DescriptorCache<D> {
    fn default() -> Self {
        Self::new()
    }
}
