// src/clock.rs
use std::sync::{Arc, Mutex};

use chrono::{
    DateTime, Duration, Local, LocalResult, NaiveDateTime, Offset, SecondsFormat, TimeZone, Utc,
};
use chrono_tz::Tz;

/// Wall-clock source for request dates and point timestamps.
pub trait Clock: Send + Sync {
    fn now(&self) -> DateTime<Utc>;
}

#[derive(Debug, Default, Clone, Copy)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock that only moves when told to; each reading advances it by `step`.
#[derive(Debug)]
pub struct ManualClock {
    now: Mutex<DateTime<Utc>>,
    step: Duration,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self::with_step(start, Duration::zero())
    }

    pub fn with_step(start: DateTime<Utc>, step: Duration) -> Self {
        Self {
            now: Mutex::new(start),
            step,
        }
    }

    pub fn advance(&self, by: Duration) {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        *now += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        let mut now = self.now.lock().unwrap_or_else(|p| p.into_inner());
        let current = *now;
        *now += self.step;
        current
    }
}

/// Produces point timestamps.
///
/// With an assumed zone, the host's naive local wall-clock reading is taken to
/// be a reading in that zone before converting to UTC. Without one, the host
/// offset is trusted as-is.
#[derive(Clone)]
pub struct Timestamper {
    zone: Option<Tz>,
    clock: Arc<dyn Clock>,
}

impl Timestamper {
    pub fn new(zone: Option<Tz>) -> Self {
        Self {
            zone,
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn zone(&self) -> Option<Tz> {
        self.zone
    }

    pub fn now(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        match self.zone {
            Some(tz) => localize(now.with_timezone(&Local).naive_local(), tz),
            None => now,
        }
    }
}

impl std::fmt::Debug for Timestamper {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Timestamper")
            .field("zone", &self.zone)
            .finish_non_exhaustive()
    }
}

/// Interpret `naive` as wall-clock time in `tz` and convert to UTC.
///
/// Readings that fall in a DST transition resolve to standard time: the later
/// instant when the hour repeats, the pre-jump offset when it is skipped.
pub fn localize(naive: NaiveDateTime, tz: Tz) -> DateTime<Utc> {
    match tz.from_local_datetime(&naive) {
        LocalResult::Single(dt) => dt.with_timezone(&Utc),
        LocalResult::Ambiguous(_, standard) => standard.with_timezone(&Utc),
        LocalResult::None => {
            let before = tz
                .from_local_datetime(&(naive - Duration::hours(3)))
                .latest()
                .map(|dt| dt.offset().fix().local_minus_utc());
            let offset = Duration::seconds(i64::from(before.unwrap_or(0)));
            Utc.from_utc_datetime(&(naive - offset))
        }
    }
}

/// ISO-8601 with explicit offset, e.g. `2024-01-15T11:00:00.000000+00:00`.
pub fn iso8601(at: DateTime<Utc>) -> String {
    at.to_rfc3339_opts(SecondsFormat::Micros, false)
}
