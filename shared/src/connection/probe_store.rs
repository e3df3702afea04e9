use std::{
    collections::HashMap,
    time::{Duration, Instant},
};

/// Outstanding probes by id, with the instant each one left
pub struct ProbeStore {
    probes: HashMap<String, Instant>,
}

impl ProbeStore {
    pub fn new() -> Self {
        Self {
            probes: HashMap::new(),
        }
    }

    pub fn insert(&mut self, id: String, sent_at: Instant) {
        self.probes.insert(id, sent_at);
    }

    /// Remove a probe, returning when it was sent
    pub fn remove(&mut self, id: &str) -> Option<Instant> {
        self.probes.remove(id)
    }

    /// Remove every probe sent more than `timeout` before `now`, returning
    /// how many were removed
    pub fn remove_expired(&mut self, now: Instant, timeout: Duration) -> usize {
        let before = self.probes.len();
        self.probes
            .retain(|_, sent_at| now.saturating_duration_since(*sent_at) <= timeout);
        before - self.probes.len()
    }

    pub fn clear(&mut self) {
        self.probes.clear();
    }

    pub fn len(&self) -> usize {
        self.probes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.probes.is_empty()
    }
}

impl Default for ProbeStore {
    fn default() -> Self {
        Self::new()
    }
}
