/// A one-shot warning boundary: fires the first tick remaining time is at or
/// below `remaining_secs`, then never again for the session.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Threshold {
    pub remaining_secs: u64,
    pub message: String,
}

impl Threshold {
    pub fn minutes(minutes: u64) -> Self {
        Self {
            remaining_secs: minutes * 60,
            message: format!("{} minutes remaining", minutes),
        }
    }
}

/// Reference behavior: warn at 30 minutes and at 5 minutes.
pub fn default_thresholds() -> Vec<Threshold> {
    vec![Threshold::minutes(30), Threshold::minutes(5)]
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TimerEvent {
    Warning(String),
    Expired,
}

/// Remaining-time tracker. Every tick recomputes from the start timestamp,
/// so delayed or dropped ticks (suspended process, backgrounded terminal)
/// self-correct instead of drifting the way a decrement-per-tick counter
/// would.
#[derive(Debug)]
pub struct Timer {
    duration_secs: u64,
    started_at_ms: i64,
    thresholds: Vec<Threshold>,
    fired: Vec<bool>,
    expired: bool,
}

impl Timer {
    pub fn new(duration_secs: u64, started_at_ms: i64, thresholds: Vec<Threshold>) -> Self {
        let fired = vec![false; thresholds.len()];
        Self {
            duration_secs,
            started_at_ms,
            thresholds,
            fired,
            expired: false,
        }
    }

    pub fn started_at_ms(&self) -> i64 {
        self.started_at_ms
    }

    /// Whole seconds since the start timestamp. A start timestamp in the
    /// future (clock skew) clamps to zero, never negative.
    pub fn elapsed_secs(&self, now_ms: i64) -> u64 {
        let elapsed_ms = now_ms.saturating_sub(self.started_at_ms);
        if elapsed_ms <= 0 {
            0
        } else {
            (elapsed_ms / 1000) as u64
        }
    }

    pub fn remaining_secs(&self, now_ms: i64) -> u64 {
        self.duration_secs.saturating_sub(self.elapsed_secs(now_ms))
    }

    pub fn is_expired(&self) -> bool {
        self.expired
    }

    /// Advance the timer to `now_ms`, returning any threshold/expiry events
    /// that fire on this tick. Expiry is raised exactly once; after that the
    /// timer reports expired and ticks yield nothing.
    pub fn tick(&mut self, now_ms: i64) -> Vec<TimerEvent> {
        if self.expired {
            return Vec::new();
        }
        let remaining = self.remaining_secs(now_ms);
        let mut events = Vec::new();
        if remaining > 0 {
            for (idx, threshold) in self.thresholds.iter().enumerate() {
                if !self.fired[idx] && remaining <= threshold.remaining_secs {
                    self.fired[idx] = true;
                    events.push(TimerEvent::Warning(threshold.message.clone()));
                }
            }
        } else {
            self.expired = true;
            events.push(TimerEvent::Expired);
        }
        events
    }
}
