//! Event store abstraction and time windows.

use chrono::{DateTime, Duration, FixedOffset};

use crate::event::Event;
use crate::types::{EventId, SubjectId};

/// A closed time range `[start, end]` used to scope aggregation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    #[must_use]
    pub const fn new(start: DateTime<FixedOffset>, end: DateTime<FixedOffset>) -> Self {
        Self { start, end }
    }

    /// The window of the given length that ends at `now`.
    #[must_use]
    pub fn ending_at(now: DateTime<FixedOffset>, length: Duration) -> Self {
        Self {
            start: now - length,
            end: now,
        }
    }

    /// The last `days` days up to and including `now`.
    #[must_use]
    pub fn last_days(now: DateTime<FixedOffset>, days: i64) -> Self {
        Self::ending_at(now, Duration::days(days))
    }

    pub fn contains(&self, timestamp: DateTime<FixedOffset>) -> bool {
        self.start <= timestamp && timestamp <= self.end
    }

    /// Iterates over the events of `events` that fall inside this window.
    pub fn select<'a>(&self, events: &'a [Event]) -> impl Iterator<Item = &'a Event> + use<'a> {
        let window = *self;
        events.iter().filter(move |e| window.contains(e.timestamp))
    }
}

/// Persistence for one account's care events.
///
/// Implementations return events in ascending timestamp order, ties broken by
/// insertion order.
pub trait EventStore {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Lists a subject's events, optionally restricted to a window.
    fn list_events(
        &self,
        subject: &SubjectId,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Event>, Self::Error>;

    /// Appends an event and returns it as stored.
    fn append_event(&mut self, subject: &SubjectId, event: Event) -> Result<Event, Self::Error>;

    /// Deletes one event. Returns false if no such event exists.
    fn delete_event(&mut self, subject: &SubjectId, id: &EventId) -> Result<bool, Self::Error>;
}
