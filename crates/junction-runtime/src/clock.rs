//! Injected time source.
//!
//! The session reads the time once per cycle through [`Clock::now`].
//! [`SystemClock`] follows wall-clock time; [`ManualClock`] only moves when
//! told to, so replays and tests do not depend on real time.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use junction_types::Timestamp;

/// Provides the current time.
pub trait Clock: Send + Sync {
    fn now(&self) -> Timestamp;
}

/// Wall-clock time in seconds since the Unix epoch.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> Timestamp {
        let micros = chrono::Utc::now().timestamp_micros();
        Timestamp::from_secs(micros as f64 / 1_000_000.0)
    }
}

/// A clock that only changes when [`set`][ManualClock::set] or
/// [`advance`][ManualClock::advance] is called.
///
/// Clones share the same reading, so a test can keep a handle while the
/// session owns another.
///
/// ```
/// use junction_runtime::clock::{Clock, ManualClock};
/// use junction_types::Timestamp;
///
/// let clock = ManualClock::new(Timestamp::from_secs(100.0));
/// let handle = clock.clone();
/// handle.advance(2.5);
/// assert_eq!(clock.now(), Timestamp::from_secs(102.5));
/// ```
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    bits: Arc<AtomicU64>,
}

impl ManualClock {
    pub fn new(start: Timestamp) -> Self {
        Self {
            bits: Arc::new(AtomicU64::new(start.as_secs().to_bits())),
        }
    }

    pub fn set(&self, now: Timestamp) {
        self.bits.store(now.as_secs().to_bits(), Ordering::SeqCst);
    }

    /// Move the clock forward by `secs`.
    pub fn advance(&self, secs: f64) {
        self.set(self.now().offset(secs));
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Timestamp {
        Timestamp::from_secs(f64::from_bits(self.bits.load(Ordering::SeqCst)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manual_clock_defaults_to_zero() {
        assert_eq!(ManualClock::default().now(), Timestamp::from_secs(0.0));
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(Timestamp::from_secs(10.0));
        let handle = clock.clone();
        handle.set(Timestamp::from_secs(42.0));
        assert_eq!(clock.now(), Timestamp::from_secs(42.0));
        clock.advance(-2.0);
        assert_eq!(handle.now(), Timestamp::from_secs(40.0));
    }

    #[test]
    fn system_clock_is_after_2020() {
        // 2020-01-01T00:00:00Z
        assert!(SystemClock.now().as_secs() > 1_577_836_800.0);
    }
}
