//! Care events as recorded by a parent.

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::event_type::{EventKind, EventType};
use crate::types::EventId;

/// Rejection of an event whose fields cannot be trusted for time arithmetic.
#[derive(Debug, Error)]
pub enum InvalidEventError {
    /// The event has no identifier.
    #[error("event ID cannot be empty")]
    EmptyId,
    /// The event has no type tag.
    #[error("event {event_id} has an empty type")]
    EmptyType { event_id: String },
    /// The event has no timestamp at all.
    #[error("event {event_id} is missing a timestamp")]
    MissingTimestamp { event_id: String },
    /// The timestamp is not valid RFC 3339.
    #[error("invalid timestamp for event {event_id}: {timestamp}")]
    MalformedTimestamp {
        event_id: String,
        timestamp: String,
        #[source]
        source: chrono::ParseError,
    },
}

/// A single logged care event.
///
/// The timestamp keeps the UTC offset it was recorded with. Calendar days and
/// hours of the day are always taken in that offset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "RawEvent")]
pub struct Event {
    pub id: EventId,
    pub kind: EventKind,
    pub timestamp: DateTime<FixedOffset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

impl Event {
    /// Creates an event with a freshly generated ID.
    pub fn new(kind: impl Into<EventKind>, timestamp: DateTime<FixedOffset>) -> Self {
        Self {
            id: EventId::generate(),
            kind: kind.into(),
            timestamp,
            notes: None,
        }
    }

    #[must_use]
    pub fn with_notes(mut self, notes: impl Into<String>) -> Self {
        self.notes = Some(notes.into());
        self
    }

    /// Returns true if this event is of the given known type.
    pub fn is(&self, event_type: EventType) -> bool {
        self.kind.known() == Some(event_type)
    }

    /// The local calendar day the event occurred on.
    pub fn day(&self) -> NaiveDate {
        self.timestamp.date_naive()
    }

    /// The local hour (0-23) the event occurred in.
    pub fn hour(&self) -> u32 {
        self.timestamp.hour()
    }
}

/// An event as it arrives from storage or import, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RawEvent {
    #[serde(default)]
    pub id: String,
    #[serde(default, alias = "type")]
    pub kind: String,
    #[serde(default)]
    pub timestamp: Option<String>,
    #[serde(default)]
    pub notes: Option<String>,
}

impl TryFrom<RawEvent> for Event {
    type Error = InvalidEventError;

    fn try_from(raw: RawEvent) -> Result<Self, Self::Error> {
        let id = EventId::new(raw.id.clone()).map_err(|_| InvalidEventError::EmptyId)?;

        if raw.kind.trim().is_empty() {
            return Err(InvalidEventError::EmptyType { event_id: raw.id });
        }

        let Some(timestamp) = raw.timestamp.filter(|t| !t.trim().is_empty()) else {
            return Err(InvalidEventError::MissingTimestamp { event_id: raw.id });
        };
        let parsed = DateTime::parse_from_rfc3339(&timestamp).map_err(|source| {
            InvalidEventError::MalformedTimestamp {
                event_id: raw.id.clone(),
                timestamp: timestamp.clone(),
                source,
            }
        })?;

        Ok(Self {
            id,
            kind: EventKind::from(raw.kind.as_str()),
            timestamp: parsed,
            notes: raw.notes.filter(|n| !n.is_empty()),
        })
    }
}
