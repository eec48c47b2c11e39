use std::time::{Duration, Instant};

// (job age upper bound, minimum interval between copies)
const SCHEDULE: [(Duration, Duration); 3] = [
    (Duration::from_secs(20), Duration::from_millis(450)),
    (Duration::from_secs(60), Duration::from_millis(1350)),
    (Duration::from_secs(120), Duration::from_millis(2700)),
];
const LATE_INTERVAL: Duration = Duration::from_millis(4500);

/// Adaptive throttle for buffer copy-back during a render.
///
/// Copies are allowed every 450ms for the first 20s of a job, then every 1350ms until 60s,
/// every 2700ms until 120s and every 4500ms after that.
#[derive(Clone, Copy, Debug)]
pub struct BufferUpdateTimer {
    started: Instant,
    last_update: Instant,
}

impl BufferUpdateTimer {
    /// Timer for a job starting now.
    pub fn new() -> Self {
        Self::started_at(Instant::now())
    }

    /// Timer for a job that started at `start`.
    pub fn started_at(start: Instant) -> Self {
        Self {
            started: start,
            last_update: start,
        }
    }

    /// Minimum interval between copies for a job of age `elapsed`.
    pub fn interval_for(elapsed: Duration) -> Duration {
        SCHEDULE
            .iter()
            .find(|(until, _)| elapsed < *until)
            .map_or(LATE_INTERVAL, |(_, interval)| *interval)
    }

    /// [`should_update_at`](Self::should_update_at) with the current time.
    pub fn should_update(&mut self) -> bool {
        self.should_update_at(Instant::now())
    }

    /// Return `true` when a copy is due at `now`, and restart the interval if so.
    pub fn should_update_at(&mut self, now: Instant) -> bool {
        let interval = Self::interval_for(now.saturating_duration_since(self.started));
        if now.saturating_duration_since(self.last_update) < interval {
            return false;
        }
        self.last_update = now;
        true
    }
}

impl Default for BufferUpdateTimer {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
#[path = "../../tests/unit/session/timer.rs"]
mod tests;
