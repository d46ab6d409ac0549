//! # Clock Abstraction
//!
//! Every time-dependent decision in the registry — issuance timestamps,
//! expiry checks, revocation timestamps, DID creation times — goes through
//! a [`Clock`] capability instead of calling `Utc::now()` directly. Tests
//! inject a [`ManualClock`] and walk a credential across its expiry instant
//! deterministically; production wires in [`SystemClock`].

use chrono::{DateTime, Duration, TimeZone, Utc};
use parking_lot::Mutex;
use std::sync::Arc;

/// Source of the current time for registry decisions.
///
/// Implementations must be cheap to call and safe to share across threads;
/// the registry service consults the clock inside its write lock.
pub trait Clock: Send + Sync {
    /// The current instant in UTC.
    fn now(&self) -> DateTime<Utc>;

    /// The current instant as Unix seconds. Convenience for wire formats
    /// that carry integer timestamps.
    fn now_unix(&self) -> i64 {
        self.now().timestamp()
    }
}

/// The real wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A settable clock for tests.
///
/// Starts at a fixed instant and only moves when told to. Cloning shares
/// the underlying instant, so a clone handed to a service and one kept by
/// the test observe the same advances.
#[derive(Debug, Clone)]
pub struct ManualClock {
    instant: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    /// Create a clock frozen at the given instant.
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            instant: Arc::new(Mutex::new(start)),
        }
    }

    /// Create a clock frozen at the given Unix-seconds timestamp.
    pub fn at_unix(secs: i64) -> Self {
        let start = Utc
            .timestamp_opt(secs, 0)
            .single()
            .unwrap_or_else(|| Utc.timestamp_opt(0, 0).unwrap());
        Self::new(start)
    }

    /// Move the clock forward by the given duration.
    pub fn advance(&self, by: Duration) {
        let mut instant = self.instant.lock();
        *instant += by;
    }

    /// Jump the clock to an absolute instant. May move backwards — useful
    /// for checking that the registry never trusts the clock to be monotonic.
    pub fn set(&self, to: DateTime<Utc>) {
        *self.instant.lock() = to;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.instant.lock()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn system_clock_is_roughly_now() {
        let clock = SystemClock;
        let delta = (Utc::now() - clock.now()).num_seconds().abs();
        assert!(delta <= 1);
    }

    #[test]
    fn manual_clock_is_frozen_until_advanced() {
        let clock = ManualClock::at_unix(1_700_000_000);
        assert_eq!(clock.now_unix(), 1_700_000_000);
        assert_eq!(clock.now_unix(), 1_700_000_000);

        clock.advance(Duration::seconds(90));
        assert_eq!(clock.now_unix(), 1_700_000_090);
    }

    #[test]
    fn manual_clock_clones_share_state() {
        let clock = ManualClock::at_unix(1_000);
        let handle = clock.clone();
        clock.advance(Duration::seconds(5));
        assert_eq!(handle.now_unix(), 1_005);
    }

    #[test]
    fn manual_clock_can_jump_backwards() {
        let clock = ManualClock::at_unix(2_000);
        clock.set(Utc.timestamp_opt(1_000, 0).unwrap());
        assert_eq!(clock.now_unix(), 1_000);
    }
}
