use std::{
    mem,
    sync::{Arc, Mutex, MutexGuard, PoisonError},
};

use crate::types::{ConnectionId, NetworkId, SyncValue};

/// A SyncVar write accepted locally and waiting for the next tick
#[derive(Clone, Debug, PartialEq)]
pub struct PendingChange {
    pub network_id: NetworkId,
    pub component_type: String,
    pub property_name: String,
    pub new_value: SyncValue,
    pub timestamp: i64,
}

/// An RPC invocation waiting for the next tick
#[derive(Clone, Debug, PartialEq)]
pub struct PendingRpc {
    pub network_id: NetworkId,
    pub component_type: String,
    pub method_name: String,
    pub args: Vec<SyncValue>,
    pub is_client_rpc: bool,
    /// Single recipient for a targeted ClientRpc, `None` broadcasts
    pub target: Option<ConnectionId>,
    pub timestamp: i64,
}

/// FIFO queue shared between the hooks that fill it and the tick that
/// drains it. Drain swaps the whole buffer out under one lock, so a record
/// is either in this drain or the next one, never both.
pub struct PendingQueue<T> {
    records: Arc<Mutex<Vec<T>>>,
}

impl<T> PendingQueue<T> {
    pub fn new() -> Self {
        Self {
            records: Arc::new(Mutex::new(Vec::new())),
        }
    }

    // the buffer is only ever pushed to or swapped, so a poisoned lock still
    // guards a valid Vec
    fn lock(&self) -> MutexGuard<'_, Vec<T>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn push(&self, record: T) {
        self.lock().push(record);
    }

    /// Return every queued record in insertion order and leave the queue empty
    pub fn drain(&self) -> Vec<T> {
        mem::take(&mut *self.lock())
    }

    pub fn clear(&self) {
        self.lock().clear();
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }
}

impl<T> Clone for PendingQueue<T> {
    fn clone(&self) -> Self {
        Self {
            records: self.records.clone(),
        }
    }
}

impl<T> Default for PendingQueue<T> {
    fn default() -> Self {
        Self::new()
    }
}
