//! Sleep session extraction.
//!
//! A sleep session is derived from a `slept` event followed by a `woke` event.
//! Sessions are recomputed on every call and never stored.
//!
//! # Pairing
//!
//! [`extract_sleep_sessions`] is the reference algorithm used by every report:
//! after filtering to sleep markers and sorting by time, only *immediately
//! adjacent* `slept`→`woke` pairs form a session. A `slept` followed by another
//! `slept` is skipped and never pairs later, so duplicate records under-count
//! sleep. [`extract_sleep_sessions_tolerant`] is a separate algorithm that
//! pairs each `woke` with the latest open `slept`; switching between them
//! changes historical totals.

use chrono::{DateTime, FixedOffset, NaiveDate};

use crate::event::Event;
use crate::event_type::EventType;

/// A paired sleep interval.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SleepSession {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl SleepSession {
    /// Session length in minutes.
    ///
    /// A `woke` recorded at or before its `slept` (clock skew, back-dated
    /// entries) yields zero rather than a negative length.
    #[allow(clippy::cast_precision_loss)]
    pub fn duration_minutes(&self) -> f64 {
        let ms = (self.end - self.start).num_milliseconds();
        if ms <= 0 { 0.0 } else { ms as f64 / 60_000.0 }
    }

    /// The local day the session is attributed to (its start day).
    pub fn day(&self) -> NaiveDate {
        self.start.date_naive()
    }
}

/// Sleep markers sorted ascending by time; ties keep input order.
fn sorted_sleep_markers<'a, I>(events: I) -> Vec<(EventType, DateTime<FixedOffset>)>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut markers: Vec<_> = events
        .into_iter()
        .filter_map(|e| {
            e.kind
                .known()
                .filter(|t| t.is_sleep_marker())
                .map(|t| (t, e.timestamp))
        })
        .collect();
    // sort_by_key is stable
    markers.sort_by_key(|(_, ts)| *ts);
    markers
}

/// Extracts sessions from immediately adjacent `slept`→`woke` pairs.
pub fn extract_sleep_sessions<'a, I>(events: I) -> Vec<SleepSession>
where
    I: IntoIterator<Item = &'a Event>,
{
    let markers = sorted_sleep_markers(events);
    let mut sessions = Vec::new();

    let mut i = 0;
    while i + 1 < markers.len() {
        let (current, start) = markers[i];
        let (next, end) = markers[i + 1];
        if current == EventType::Slept && next == EventType::Woke {
            sessions.push(SleepSession { start, end });
            i += 2;
        } else {
            i += 1;
        }
    }

    sessions
}

/// Extracts sessions by pairing each `woke` with the most recent unmatched
/// `slept`.
///
/// Repeated `slept` records before a `woke` collapse onto the latest one; a
/// `woke` with no open `slept` is ignored.
pub fn extract_sleep_sessions_tolerant<'a, I>(events: I) -> Vec<SleepSession>
where
    I: IntoIterator<Item = &'a Event>,
{
    let mut open: Option<DateTime<FixedOffset>> = None;
    let mut sessions = Vec::new();

    for (kind, ts) in sorted_sleep_markers(events) {
        match kind {
            EventType::Slept => open = Some(ts),
            EventType::Woke => {
                if let Some(start) = open.take() {
                    sessions.push(SleepSession { start, end: ts });
                }
            }
            _ => {}
        }
    }

    sessions
}
