//! Time-interval overlap between two events

use chrono::{DateTime, Duration, Utc};

use famcal_core::Event;

const MILLIS_PER_MINUTE: i64 = 60_000;

/// The intersection of two time intervals
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Overlap {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

impl Overlap {
    /// Intersect `[a_start, a_end)` with `[b_start, b_end)`.
    ///
    /// Returns `None` unless the intersection is non-empty; touching
    /// endpoints do not overlap.
    pub fn between(
        a_start: DateTime<Utc>,
        a_end: DateTime<Utc>,
        b_start: DateTime<Utc>,
        b_end: DateTime<Utc>,
    ) -> Option<Self> {
        let start = a_start.max(b_start);
        let end = a_end.min(b_end);
        (start < end).then_some(Self { start, end })
    }

    /// Intersect the time ranges of two events
    pub fn of_events(a: &Event, b: &Event) -> Option<Self> {
        Self::between(a.start, a.end, b.start, b.end)
    }

    pub fn duration(&self) -> Duration {
        self.end - self.start
    }

    /// Overlap in whole minutes, rounded half up from millisecond precision.
    pub fn minutes(&self) -> i64 {
        let ms = self.duration().num_milliseconds();
        (ms + MILLIS_PER_MINUTE / 2).div_euclid(MILLIS_PER_MINUTE)
    }
}
