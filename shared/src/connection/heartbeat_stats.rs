use std::{collections::VecDeque, time::Instant};

/// Weight kept from the previous jitter estimate on each new sample
const JITTER_SMOOTHING: f32 = 0.9;

/// Snapshot of one connection's heartbeat quality. RTT figures are in
/// milliseconds.
#[derive(Clone, Debug, PartialEq)]
pub struct HeartbeatStats {
    pub average_rtt: f32,
    pub min_rtt: f32,
    pub max_rtt: f32,
    pub last_rtt: Option<f32>,
    pub jitter: f32,
    pub consecutive_loss: u32,
    pub lost_packets: u64,
    pub total_sent: u64,
    pub total_received: u64,
    pub packet_loss_rate: f32,
    pub last_heartbeat: Option<Instant>,
    pub is_alive: bool,
}

impl HeartbeatStats {
    pub fn new() -> Self {
        Self {
            average_rtt: 0.0,
            min_rtt: 0.0,
            max_rtt: 0.0,
            last_rtt: None,
            jitter: 0.0,
            consecutive_loss: 0,
            lost_packets: 0,
            total_sent: 0,
            total_received: 0,
            packet_loss_rate: 0.0,
            last_heartbeat: None,
            is_alive: false,
        }
    }

    pub(crate) fn record_sample(&mut self, rtt_millis: f32, history: &RttHistory, now: Instant) {
        if let Some(previous) = self.last_rtt {
            self.jitter = self.jitter * JITTER_SMOOTHING
                + (rtt_millis - previous).abs() * (1.0 - JITTER_SMOOTHING);
        }
        self.last_rtt = Some(rtt_millis);
        self.average_rtt = history.average();
        self.min_rtt = history.min();
        self.max_rtt = history.max();
        self.consecutive_loss = 0;
        self.total_received += 1;
        self.last_heartbeat = Some(now);
        self.recompute_loss_rate();
    }

    pub(crate) fn record_losses(&mut self, count: usize) {
        self.consecutive_loss = self.consecutive_loss.saturating_add(count as u32);
        self.lost_packets += count as u64;
        self.recompute_loss_rate();
    }

    /// A probe that never left counts against liveness only, it was never
    /// part of `total_sent`
    pub(crate) fn record_send_failure(&mut self) {
        self.consecutive_loss = self.consecutive_loss.saturating_add(1);
    }

    fn recompute_loss_rate(&mut self) {
        self.packet_loss_rate = if self.total_sent == 0 {
            0.0
        } else {
            self.lost_packets as f32 / self.total_sent as f32
        };
    }
}

impl Default for HeartbeatStats {
    fn default() -> Self {
        Self::new()
    }
}

/// Bounded ring buffer of the most recent RTT samples
pub struct RttHistory {
    samples: VecDeque<f32>,
    capacity: usize,
}

impl RttHistory {
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        Self {
            samples: VecDeque::with_capacity(capacity),
            capacity,
        }
    }

    pub fn push(&mut self, rtt_millis: f32) {
        if self.samples.len() == self.capacity {
            self.samples.pop_front();
        }
        self.samples.push_back(rtt_millis);
    }

    pub fn average(&self) -> f32 {
        if self.samples.is_empty() {
            return 0.0;
        }
        self.samples.iter().sum::<f32>() / self.samples.len() as f32
    }

    pub fn min(&self) -> f32 {
        self.samples.iter().copied().reduce(f32::min).unwrap_or(0.0)
    }

    pub fn max(&self) -> f32 {
        self.samples.iter().copied().reduce(f32::max).unwrap_or(0.0)
    }

    pub fn len(&self) -> usize {
        self.samples.len()
    }

    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }

    pub fn clear(&mut self) {
        self.samples.clear();
    }
}
