use std::time::Duration;

/// Fires once a fixed interval of application time has elapsed since it was
/// last reset. Time is supplied by the caller in seconds.
#[derive(Clone, Debug)]
pub struct Timer {
    interval: f64,
    last: f64,
}

impl Timer {
    pub fn new(interval: Duration, now: f64) -> Self {
        Self {
            interval: interval.as_secs_f64(),
            last: now,
        }
    }

    pub fn reset(&mut self, now: f64) {
        self.last = now;
    }

    pub fn ringing(&self, now: f64) -> bool {
        now - self.last >= self.interval
    }

    /// Seconds since the last reset
    pub fn elapsed(&self, now: f64) -> f64 {
        now - self.last
    }
}
