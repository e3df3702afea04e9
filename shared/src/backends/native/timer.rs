use std::time::{Duration, Instant};

/// A fixed-period timer polled with an explicit `now`, so the owner decides
/// which clock drives it.
#[derive(Clone, Debug)]
pub struct Timer {
    duration: Duration,
    last: Instant,
}

impl Timer {
    pub fn new(duration: Duration, now: Instant) -> Self {
        Self {
            duration,
            last: now,
        }
    }

    /// Restart the period from `now`
    pub fn reset(&mut self, now: Instant) {
        self.last = now;
    }

    /// Returns whether the period has elapsed since the last reset
    pub fn ringing(&self, now: Instant) -> bool {
        now.saturating_duration_since(self.last) >= self.duration
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    pub fn set_duration(&mut self, duration: Duration) {
        self.duration = duration;
    }

    /// The instant the timer next rings
    pub fn deadline(&self) -> Instant {
        self.last + self.duration
    }
}
