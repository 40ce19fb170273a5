//! Venue-local clock abstraction.
//!
//! The POS reports order timestamps in the venue's wall-clock time with no
//! offset, so everything downstream works in naive local time. Cache expiry and
//! the current-hour clip read time through the [`Clock`] trait, which keeps that
//! logic testable without sleeping.

use std::sync::Arc;

use chrono::{NaiveDate, NaiveDateTime};
use parking_lot::RwLock;

/// Source of the current venue-local time.
pub trait Clock: Send + Sync {
    /// Current wall-clock time at the venue.
    fn now(&self) -> NaiveDateTime;

    /// Current calendar date at the venue.
    fn today(&self) -> NaiveDate {
        self.now().date()
    }
}

/// Clock backed by the host's local time.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        chrono::Local::now().naive_local()
    }
}

/// Manually set clock for tests and local development.
///
/// Cloning shares the underlying instant, so a test can hold one handle and
/// advance time for services holding another.
#[derive(Clone)]
pub struct ManualClock {
    now: Arc<RwLock<NaiveDateTime>>,
}

impl ManualClock {
    pub fn new(start: NaiveDateTime) -> Self {
        Self {
            now: Arc::new(RwLock::new(start)),
        }
    }

    /// Move the clock to an absolute instant.
    pub fn set(&self, to: NaiveDateTime) {
        *self.now.write() = to;
    }

    /// Advance the clock by a (possibly negative) duration.
    pub fn advance(&self, delta: chrono::Duration) {
        let mut now = self.now.write();
        *now += delta;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.read()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    fn noon() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 7, 1)
            .unwrap()
            .and_hms_opt(12, 0, 0)
            .unwrap()
    }

    #[test]
    fn manual_clock_advances_shared_handle() {
        let clock = ManualClock::new(noon());
        let other = clock.clone();

        other.advance(chrono::Duration::minutes(90));

        assert_eq!(clock.now(), noon() + chrono::Duration::minutes(90));
        assert_eq!(clock.today(), NaiveDate::from_ymd_opt(2024, 7, 1).unwrap());
    }

    #[test]
    fn manual_clock_set_overrides() {
        let clock = ManualClock::new(noon());
        let later = NaiveDate::from_ymd_opt(2024, 7, 2)
            .unwrap()
            .and_hms_opt(9, 30, 0)
            .unwrap();

        clock.set(later);

        assert_eq!(clock.now(), later);
        assert_eq!(clock.today(), later.date());
    }
}
