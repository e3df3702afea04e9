use std::time::{Duration, Instant};

use log::{debug, trace, warn};

use crate::{
    backends::Timestamp,
    connection::{
        error::HeartbeatError,
        heartbeat_config::HeartbeatConfig,
        heartbeat_stats::{HeartbeatStats, RttHistory},
        probe_store::ProbeStore,
    },
    messages::message::{HeartbeatMessage, HeartbeatType},
    transport::error::TransportError,
};

const MIN_ADAPTIVE_INTERVAL: Duration = Duration::from_millis(1000);
const MAX_ADAPTIVE_INTERVAL: Duration = Duration::from_millis(15000);
const HIGH_LOSS_RATE: f32 = 0.05;
const LOW_LOSS_RATE: f32 = 0.01;
const LOW_RTT_MILLIS: f32 = 50.0;

/// Where the monitor hands its pings. Implemented by whatever owns the
/// connection.
pub trait ProbeSender {
    fn send_probe(&mut self, probe: &HeartbeatMessage) -> Result<(), TransportError>;
}

/// Liveness transitions reported by [`HeartbeatMonitor::update`]
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum HeartbeatEvent {
    ConnectionLost,
    ConnectionRestored,
}

/// Per-connection liveness prober. Sends sequenced pings, matches pongs to
/// measure RTT, and derives an alive verdict from consecutive loss and the
/// age of the last successful exchange.
pub struct HeartbeatMonitor {
    config: HeartbeatConfig,
    running: bool,
    next_probe_at: Option<Instant>,
    sequence_number: u32,
    probes: ProbeStore,
    history: RttHistory,
    stats: HeartbeatStats,
    last_success: Option<Instant>,
    reported_alive: bool,
}

impl HeartbeatMonitor {
    pub fn new(config: &HeartbeatConfig) -> Self {
        Self {
            config: config.clone(),
            running: false,
            next_probe_at: None,
            sequence_number: 0,
            probes: ProbeStore::new(),
            history: RttHistory::new(config.rtt_history_size),
            stats: HeartbeatStats::new(),
            last_success: None,
            reported_alive: false,
        }
    }

    /// Begin probing. The first ping goes out on the next `update`.
    pub fn start(&mut self, now: Instant) {
        if self.running {
            return;
        }
        self.running = true;
        self.next_probe_at = Some(now);
        self.last_success = Some(now);
        self.stats.is_alive = true;
        self.reported_alive = true;
    }

    /// Cancel scheduling and forget every outstanding probe
    pub fn stop(&mut self) {
        self.running = false;
        self.next_probe_at = None;
        self.probes.clear();
    }

    pub fn is_running(&self) -> bool {
        self.running
    }

    pub fn is_alive(&self) -> bool {
        self.stats.is_alive
    }

    pub fn stats(&self) -> &HeartbeatStats {
        &self.stats
    }

    pub fn outstanding_probes(&self) -> usize {
        self.probes.len()
    }

    pub fn next_probe_at(&self) -> Option<Instant> {
        self.next_probe_at
    }

    /// Send a probe if one is due, sweep timed out probes, and report a
    /// liveness transition since the last call
    pub fn update(&mut self, now: Instant, sender: &mut dyn ProbeSender) -> Option<HeartbeatEvent> {
        if !self.running {
            return None;
        }

        if self.next_probe_at.is_some_and(|due| now >= due) {
            // a failed send is counted as a loss inside, the next tick retries
            let _ = self.send_probe(now, sender);
            self.next_probe_at = Some(now + self.next_interval());
        }
        self.sweep_timeouts(now);
        self.evaluate_liveness(now);

        if self.stats.is_alive == self.reported_alive {
            return None;
        }
        self.reported_alive = self.stats.is_alive;
        if self.stats.is_alive {
            debug!("HeartbeatMonitor: connection restored");
            Some(HeartbeatEvent::ConnectionRestored)
        } else {
            warn!(
                "HeartbeatMonitor: connection lost after {} consecutive missed heartbeat(s)",
                self.stats.consecutive_loss
            );
            Some(HeartbeatEvent::ConnectionLost)
        }
    }

    /// Build and send the next ping. On success the probe is recorded as
    /// outstanding; on failure it counts toward consecutive loss right away.
    pub fn send_probe(&mut self, now: Instant, sender: &mut dyn ProbeSender) -> Result<(), TransportError> {
        self.sequence_number = self.sequence_number.wrapping_add(1);
        let probe = HeartbeatMessage {
            id: format!("hb-{}-{:08x}", self.sequence_number, fastrand::u32(..)),
            timestamp: Timestamp::now_millis(),
            sequence_number: self.sequence_number,
            heartbeat_type: HeartbeatType::Ping,
            payload: self.probe_payload(),
        };

        match sender.send_probe(&probe) {
            Ok(()) => {
                trace!(
                    "HeartbeatMonitor: sent ping #{} ({})",
                    probe.sequence_number,
                    probe.id
                );
                self.probes.insert(probe.id, now);
                self.stats.total_sent += 1;
                Ok(())
            }
            Err(error) => {
                debug!(
                    "HeartbeatMonitor: ping #{} failed to send: {}",
                    probe.sequence_number, error
                );
                self.stats.record_send_failure();
                self.evaluate_liveness(now);
                Err(error)
            }
        }
    }

    fn probe_payload(&self) -> Option<Vec<u8>> {
        if self.config.heartbeat_packet_size == 0 {
            return None;
        }
        Some(
            (0..self.config.heartbeat_packet_size)
                .map(|_| fastrand::u8(..))
                .collect(),
        )
    }

    /// The reply to a peer's ping
    pub fn answer_ping(ping: &HeartbeatMessage) -> Result<HeartbeatMessage, HeartbeatError> {
        if ping.heartbeat_type != HeartbeatType::Ping {
            return Err(HeartbeatError::UnexpectedType { expected: "ping" });
        }
        Ok(HeartbeatMessage::pong_for(ping, Timestamp::now_millis()))
    }

    /// Match a pong to its outstanding probe and fold the RTT into the
    /// statistics. Returns the RTT in milliseconds.
    pub fn receive_pong(&mut self, pong: &HeartbeatMessage, now: Instant) -> Result<f32, HeartbeatError> {
        if pong.heartbeat_type != HeartbeatType::Pong {
            return Err(HeartbeatError::UnexpectedType { expected: "pong" });
        }
        if !self.running {
            return Err(HeartbeatError::NotRunning);
        }
        let sent_at = self
            .probes
            .remove(&pong.id)
            .ok_or_else(|| HeartbeatError::UnknownProbe { id: pong.id.clone() })?;

        let rtt_millis = now.saturating_duration_since(sent_at).as_secs_f32() * 1000.0;
        self.history.push(rtt_millis);
        self.stats.record_sample(rtt_millis, &self.history, now);
        self.last_success = Some(now);
        self.stats.is_alive = true;
        trace!(
            "HeartbeatMonitor: pong #{} rtt {:.1}ms",
            pong.sequence_number,
            rtt_millis
        );
        Ok(rtt_millis)
    }

    /// Count every probe older than the timeout as lost. Returns how many
    /// were swept.
    pub fn sweep_timeouts(&mut self, now: Instant) -> usize {
        let lost = self
            .probes
            .remove_expired(now, self.config.heartbeat_timeout);
        if lost > 0 {
            debug!("HeartbeatMonitor: {} heartbeat(s) timed out", lost);
            self.stats.record_losses(lost);
            self.evaluate_liveness(now);
        }
        lost
    }

    /// Delay until the next probe. Fixed unless adaptive probing is on.
    pub fn next_interval(&self) -> Duration {
        let base = self.config.heartbeat_interval;
        if !self.config.adaptive_heartbeat {
            return base;
        }

        if self.stats.packet_loss_rate > HIGH_LOSS_RATE {
            (base / 2).max(MIN_ADAPTIVE_INTERVAL)
        } else if self.stats.packet_loss_rate < LOW_LOSS_RATE && self.stats.average_rtt < LOW_RTT_MILLIS {
            base.mul_f32(1.5).min(MAX_ADAPTIVE_INTERVAL)
        } else {
            base
        }
    }

    fn evaluate_liveness(&mut self, now: Instant) {
        let recent = self.last_success.map_or(true, |at| {
            now.saturating_duration_since(at) < self.config.heartbeat_timeout * 2
        });
        self.stats.is_alive = self.stats.consecutive_loss < self.config.max_consecutive_loss && recent;
    }
}
