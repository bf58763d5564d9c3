//! Wall-clock abstraction.
//!
//! The state machine never reads the system time itself. The driver asks a
//! [`Clock`] for "now" and "today" and passes both into each transition, so
//! tests can step time forward deterministically with [`ManualClock`].

use std::cell::Cell;

use chrono::{DateTime, Duration, Local, NaiveDate, TimeZone, Utc};

pub trait Clock {
    /// Milliseconds since the Unix epoch.
    fn now_ms(&self) -> u64;

    /// The current local calendar day.
    fn today(&self) -> NaiveDate;
}

/// The real clock, using the machine's local time zone for calendar days.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_ms(&self) -> u64 {
        Utc::now().timestamp_millis().max(0) as u64
    }

    fn today(&self) -> NaiveDate {
        Local::now().date_naive()
    }
}

/// A clock that only moves when told to. Calendar days are taken in UTC.
#[derive(Debug)]
pub struct ManualClock {
    now_ms: Cell<u64>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now_ms: Cell::new(start.timestamp_millis().max(0) as u64),
        }
    }

    /// Start at midnight UTC of the given day plus `hour` hours.
    pub fn on_day(day: NaiveDate, hour: u32) -> Self {
        let start = day
            .and_hms_opt(hour.min(23), 0, 0)
            .map(|naive| Utc.from_utc_datetime(&naive))
            .unwrap_or_default();
        Self::new(start)
    }

    pub fn advance(&self, by: Duration) {
        let delta = by.num_milliseconds();
        let now = self.now_ms.get();
        let next = if delta >= 0 {
            now.saturating_add(delta as u64)
        } else {
            now.saturating_sub(delta.unsigned_abs())
        };
        self.now_ms.set(next);
    }

    pub fn set_ms(&self, now_ms: u64) {
        self.now_ms.set(now_ms);
    }
}

impl Clock for ManualClock {
    fn now_ms(&self) -> u64 {
        self.now_ms.get()
    }

    fn today(&self) -> NaiveDate {
        DateTime::<Utc>::from_timestamp_millis(self.now_ms.get() as i64)
            .unwrap_or_default()
            .date_naive()
    }
}
