//! Clock
//!
//! Time is always read through an injected [`Clock`] so that schedule checks
//! are deterministic under test.

use std::sync::{Arc, RwLock};

use chrono::{DateTime, Duration, Local, Utc};
pub use mockable::{Clock, DefaultClock};

/// Clock shared between orchestrators and stores
pub type SharedClock = Arc<dyn Clock + Send + Sync>;

/// The system clock
pub fn system_clock() -> SharedClock {
    Arc::new(DefaultClock)
}

/// A clock frozen at a fixed instant until moved explicitly.
#[derive(Debug)]
pub struct FixedClock(RwLock<DateTime<Utc>>);

impl FixedClock {
    pub fn new(now: DateTime<Utc>) -> Self {
        Self(RwLock::new(now))
    }

    /// Move the clock to `now`
    pub fn set(&self, now: DateTime<Utc>) {
        match self.0.write() {
            Ok(mut guard) => *guard = now,
            Err(poisoned) => *poisoned.into_inner() = now,
        }
    }

    pub fn advance(&self, delta: Duration) {
        let now = self.utc() + delta;
        self.set(now);
    }
}

impl Clock for FixedClock {
    fn local(&self) -> DateTime<Local> {
        self.utc().with_timezone(&Local)
    }

    fn utc(&self) -> DateTime<Utc> {
        match self.0.read() {
            Ok(guard) => *guard,
            Err(poisoned) => *poisoned.into_inner(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_fixed_clock_is_frozen_until_moved() {
        let start = Utc.with_ymd_and_hms(2018, 7, 17, 12, 0, 0).unwrap();
        let clock = FixedClock::new(start);
        assert_eq!(clock.utc(), start);
        assert_eq!(clock.utc(), start);

        clock.advance(Duration::hours(1));
        assert_eq!(clock.utc(), start + Duration::hours(1));

        clock.set(start);
        assert_eq!(clock.utc(), start);
    }
}
