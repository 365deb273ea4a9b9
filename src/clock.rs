use chrono::Utc;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

/// Wall-clock time provider. Injected so the whole engine can run against a
/// fake clock in tests; elapsed/remaining time is always derived from this,
/// never from accumulated tick counts.
pub trait Clock {
    /// Current wall-clock time as milliseconds since the Unix epoch.
    fn now_ms(&self) -> i64;
}

/// Production clock backed by the system time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> i64 {
        Utc::now().timestamp_millis()
    }
}

/// Manually advanced clock for tests. Cloning shares the underlying instant,
/// so a test can keep a handle while the engine owns another.
#[derive(Debug, Clone, Default)]
pub struct FakeClock {
    ms: Arc<AtomicI64>,
}

impl FakeClock {
    pub fn at(ms: i64) -> Self {
        let clock = Self::default();
        clock.set_ms(ms);
        clock
    }

    pub fn set_ms(&self, ms: i64) {
        self.ms.store(ms, Ordering::Relaxed);
    }

    pub fn advance_secs(&self, secs: i64) {
        self.ms.fetch_add(secs * 1000, Ordering::Relaxed);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.ms.fetch_add(ms, Ordering::Relaxed);
    }
}

impl Clock for FakeClock {
    fn now_ms(&self) -> i64 {
        self.ms.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_monotonic_enough() {
        let clock = SystemClock;
        let a = clock.now_ms();
        let b = clock.now_ms();
        assert!(b >= a);
        assert!(a > 0);
    }

    #[test]
    fn fake_clock_advances() {
        let clock = FakeClock::at(1_000);
        assert_eq!(clock.now_ms(), 1_000);
        clock.advance_secs(3);
        assert_eq!(clock.now_ms(), 4_000);
        clock.advance_ms(500);
        assert_eq!(clock.now_ms(), 4_500);
    }

    #[test]
    fn fake_clock_clones_share_time() {
        let clock = FakeClock::at(0);
        let handle = clock.clone();
        handle.advance_secs(60);
        assert_eq!(clock.now_ms(), 60_000);
    }
}
