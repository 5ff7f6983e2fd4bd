//! Event type enum as the single source of truth for event type strings.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Canonical care event types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum EventType {
    Slept,
    Woke,
    Fed,
    Cried,
    DiaperChanged,
    Vaccinated,
    Note,
}

impl EventType {
    /// All variants, in display order.
    pub const ALL: [Self; 7] = [
        Self::Slept,
        Self::Woke,
        Self::Fed,
        Self::Cried,
        Self::DiaperChanged,
        Self::Vaccinated,
        Self::Note,
    ];

    /// String representation for storage.
    #[must_use]
    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Slept => "slept",
            Self::Woke => "woke",
            Self::Fed => "fed",
            Self::Cried => "cried",
            Self::DiaperChanged => "diaper_changed",
            Self::Vaccinated => "vaccinated",
            Self::Note => "note",
        }
    }

    /// Returns true for the two event types that delimit sleep.
    #[must_use]
    pub const fn is_sleep_marker(self) -> bool {
        matches!(self, Self::Slept | Self::Woke)
    }
}

impl fmt::Display for EventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for EventType {
    type Err = UnknownEventType;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "slept" | "dormiu" => Ok(Self::Slept),
            "woke" | "acordou" => Ok(Self::Woke),
            "fed" | "mamada" => Ok(Self::Fed),
            "cried" | "choro" => Ok(Self::Cried),
            "diaper_changed" | "fralda" => Ok(Self::DiaperChanged),
            "vaccinated" | "vacina" => Ok(Self::Vaccinated),
            "note" | "observacao" => Ok(Self::Note),
            _ => Err(UnknownEventType(s.to_string())),
        }
    }
}

impl Serialize for EventType {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventType {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Error type for unknown event type strings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownEventType(String);

impl fmt::Display for UnknownEventType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown event type: {}", self.0)
    }
}

impl std::error::Error for UnknownEventType {}

/// The type tag carried by a stored event.
///
/// Records written by newer clients may carry types this build does not know.
/// Those are kept as `Unknown` so that generic counts still include them while
/// type-specific counts skip them.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EventKind {
    Known(EventType),
    Unknown(String),
}

impl EventKind {
    /// Returns the known event type, if any.
    #[must_use]
    pub const fn known(&self) -> Option<EventType> {
        match self {
            Self::Known(t) => Some(*t),
            Self::Unknown(_) => None,
        }
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        match self {
            Self::Known(t) => t.as_str(),
            Self::Unknown(s) => s,
        }
    }
}

impl From<EventType> for EventKind {
    fn from(value: EventType) -> Self {
        Self::Known(value)
    }
}

impl From<&str> for EventKind {
    fn from(value: &str) -> Self {
        value
            .parse::<EventType>()
            .map_or_else(|_| Self::Unknown(value.to_string()), Self::Known)
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for EventKind {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for EventKind {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(Self::from(s.as_str()))
    }
}
