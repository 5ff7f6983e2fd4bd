//! Storage layer for the `BabyFlow` care log.
//!
//! Provides persistence for care events and gamification stats using `rusqlite`.
//!
//! # Thread Safety
//!
//! The [`Database`] type wraps a `rusqlite::Connection`, which is `Send` but not `Sync`.
//! A `Database` instance can be moved between threads but cannot be shared across
//! threads without external synchronization. Separate processes writing the same
//! file are serialized by SQLite; stats updates take an `IMMEDIATE` lock for the
//! whole read-modify-write.
//!
//! # Schema
//!
//! ## Timestamp Format
//!
//! Each event stores two timestamps:
//! - `timestamp`: RFC 3339 with the offset the event was recorded in, so the
//!   local day and hour survive a round trip
//! - `utc_timestamp`: the same instant normalized to UTC with millisecond
//!   precision, used for ordering and range filters
//!
//! Ties on `utc_timestamp` are broken by `seq`, the insertion order.
//!
//! ## Versioning
//!
//! Events carry a `schema_version` column; rows with a version this build does
//! not understand are rejected with [`DbError::UnsupportedSchema`]. User stats are
//! stored as a JSON document tagged with a top-level `version` field.

use std::path::Path;

use bf_core::{
    Event, EventId, EventStore, InvalidEventError, RawEvent, SubjectId, TimeWindow, TrackOutcome,
    UserStats, UserStatsRepository,
};
use chrono::{DateTime, FixedOffset, SecondsFormat, Utc};
use rusqlite::{Connection, OptionalExtension, TransactionBehavior, params};
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

/// Event row layout understood by this build.
pub const EVENT_SCHEMA_VERSION: i64 = 1;

/// Stats document layout understood by this build.
pub const STATS_VERSION: u64 = 1;

/// Database errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// An error from the underlying database.
    #[error("sqlite error: {0}")]
    Sqlite(#[from] rusqlite::Error),
    /// A stored event failed validation.
    #[error(transparent)]
    InvalidEvent(#[from] InvalidEventError),
    /// A stored event was written with an unknown row layout.
    #[error("event {event_id} has unsupported schema version {version}")]
    UnsupportedSchema { event_id: String, version: i64 },
    /// An event with this ID already exists.
    #[error("event {0} already exists")]
    DuplicateEvent(String),
    /// The stored stats document could not be decoded.
    #[error("invalid stats for {subject}: {message}")]
    InvalidStats { subject: String, message: String },
}

/// Database connection wrapper.
///
/// See the [module documentation](self) for thread safety considerations.
pub struct Database {
    conn: Connection,
}

#[derive(Serialize)]
struct StatsDocumentRef<'a> {
    version: u64,
    #[serde(flatten)]
    stats: &'a UserStats,
}

impl Database {
    /// Opens a database at the given path, creating it if necessary.
    ///
    /// The database schema is automatically initialized on first open.
    pub fn open(path: &Path) -> Result<Self, DbError> {
        let conn = Connection::open(path)?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Opens an in-memory database.
    ///
    /// Useful for testing. The database is destroyed when the connection closes.
    pub fn open_in_memory() -> Result<Self, DbError> {
        let conn = Connection::open_in_memory()?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Initializes the database schema.
    ///
    /// This is idempotent - safe to call on an already-initialized database.
    fn init(&self) -> Result<(), DbError> {
        self.conn.execute_batch(
            "
            -- Events table: one row per care event
            -- timestamp: RFC 3339 in the recording offset
            -- utc_timestamp: normalized UTC, fixed width for lexicographic ordering
            -- type: canonical event type, or an unrecognized tag kept verbatim
            CREATE TABLE IF NOT EXISTS events (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT NOT NULL UNIQUE,
                subject_id TEXT NOT NULL,
                timestamp TEXT NOT NULL,
                utc_timestamp TEXT NOT NULL,
                type TEXT NOT NULL,
                schema_version INTEGER NOT NULL DEFAULT 1,
                notes TEXT
            );

            CREATE INDEX IF NOT EXISTS idx_events_subject_time ON events(subject_id, utc_timestamp);
            CREATE INDEX IF NOT EXISTS idx_events_type ON events(type);

            -- Gamification state, one versioned JSON document per subject
            CREATE TABLE IF NOT EXISTS user_stats (
                subject_id TEXT PRIMARY KEY,
                data TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );
            ",
        )?;
        Ok(())
    }

    /// Inserts a batch of events, ignoring duplicates by ID.
    ///
    /// Returns the number of events actually inserted.
    pub fn import_events(&mut self, subject: &SubjectId, events: &[Event]) -> Result<usize, DbError> {
        if events.is_empty() {
            return Ok(0);
        }
        let tx = self.conn.transaction()?;
        let mut inserted = 0;
        for event in events {
            inserted += insert_event(&tx, subject, event)?;
        }
        tx.commit()?;
        tracing::info!(subject = %subject, inserted, total = events.len(), "imported events");
        Ok(inserted)
    }

    /// Number of stored events for a subject.
    pub fn count_events(&self, subject: &SubjectId) -> Result<usize, DbError> {
        let count: i64 = self.conn.query_row(
            "SELECT COUNT(*) FROM events WHERE subject_id = ?",
            [subject.as_str()],
            |row| row.get(0),
        )?;
        Ok(usize::try_from(count).unwrap_or_default())
    }

    /// The most recent event for a subject, if any.
    pub fn latest_event(&self, subject: &SubjectId) -> Result<Option<Event>, DbError> {
        let row = self
            .conn
            .query_row(
                "
                SELECT id, type, timestamp, schema_version, notes
                FROM events
                WHERE subject_id = ?
                ORDER BY utc_timestamp DESC, seq DESC
                LIMIT 1
                ",
                [subject.as_str()],
                read_row,
            )
            .optional()?;
        row.map(EventRow::into_event).transpose()
    }
}

/// Columns read back for one event.
struct EventRow {
    id: String,
    kind: String,
    timestamp: String,
    schema_version: i64,
    notes: Option<String>,
}

impl EventRow {
    fn into_event(self) -> Result<Event, DbError> {
        if self.schema_version != EVENT_SCHEMA_VERSION {
            return Err(DbError::UnsupportedSchema {
                event_id: self.id,
                version: self.schema_version,
            });
        }
        let raw = RawEvent {
            id: self.id,
            kind: self.kind,
            timestamp: Some(self.timestamp),
            notes: self.notes,
        };
        Ok(Event::try_from(raw)?)
    }
}

fn read_row(row: &rusqlite::Row<'_>) -> rusqlite::Result<EventRow> {
    Ok(EventRow {
        id: row.get(0)?,
        kind: row.get(1)?,
        timestamp: row.get(2)?,
        schema_version: row.get(3)?,
        notes: row.get(4)?,
    })
}

fn format_utc(timestamp: DateTime<FixedOffset>) -> String {
    timestamp
        .with_timezone(&Utc)
        .to_rfc3339_opts(SecondsFormat::Millis, true)
}

fn format_local(timestamp: DateTime<FixedOffset>) -> String {
    timestamp.to_rfc3339_opts(SecondsFormat::AutoSi, false)
}

fn insert_event(conn: &Connection, subject: &SubjectId, event: &Event) -> Result<usize, DbError> {
    let inserted = conn.execute(
        "
        INSERT OR IGNORE INTO events
        (id, subject_id, timestamp, utc_timestamp, type, schema_version, notes)
        VALUES (?, ?, ?, ?, ?, ?, ?)
        ",
        params![
            event.id.as_str(),
            subject.as_str(),
            format_local(event.timestamp),
            format_utc(event.timestamp),
            event.kind.as_str(),
            EVENT_SCHEMA_VERSION,
            event.notes,
        ],
    )?;
    Ok(inserted)
}

fn load_stats(conn: &Connection, subject: &SubjectId) -> Result<Option<UserStats>, DbError> {
    let data: Option<String> = conn
        .query_row(
            "SELECT data FROM user_stats WHERE subject_id = ?",
            [subject.as_str()],
            |row| row.get(0),
        )
        .optional()?;
    data.map(|data| {
        decode_stats(&data).map_err(|message| DbError::InvalidStats {
            subject: subject.to_string(),
            message,
        })
    })
    .transpose()
}

fn decode_stats(data: &str) -> Result<UserStats, String> {
    let value: Value = serde_json::from_str(data).map_err(|e| e.to_string())?;
    match value.get("version").and_then(Value::as_u64) {
        Some(STATS_VERSION) => {}
        Some(other) => return Err(format!("unsupported stats version {other}")),
        None => return Err("missing stats version".to_string()),
    }
    serde_json::from_value(value).map_err(|e| e.to_string())
}

fn store_stats(conn: &Connection, subject: &SubjectId, stats: &UserStats) -> Result<(), DbError> {
    let data = serde_json::to_string(&StatsDocumentRef {
        version: STATS_VERSION,
        stats,
    })
    .map_err(|e| DbError::InvalidStats {
        subject: subject.to_string(),
        message: e.to_string(),
    })?;
    conn.execute(
        "
        INSERT INTO user_stats (subject_id, data, updated_at)
        VALUES (?, ?, ?)
        ON CONFLICT(subject_id) DO UPDATE SET
            data = excluded.data,
            updated_at = excluded.updated_at
        ",
        params![
            subject.as_str(),
            data,
            Utc::now().to_rfc3339_opts(SecondsFormat::Millis, true)
        ],
    )?;
    Ok(())
}

impl EventStore for Database {
    type Error = DbError;

    fn list_events(
        &self,
        subject: &SubjectId,
        window: Option<&TimeWindow>,
    ) -> Result<Vec<Event>, DbError> {
        let (start, end) = window.map_or_else(
            || (String::new(), "9999".to_string()),
            |w| (format_utc(w.start), format_utc(w.end)),
        );
        let mut stmt = self.conn.prepare(
            "
            SELECT id, type, timestamp, schema_version, notes
            FROM events
            WHERE subject_id = ? AND utc_timestamp >= ? AND utc_timestamp <= ?
            ORDER BY utc_timestamp ASC, seq ASC
            ",
        )?;
        let rows = stmt.query_map(params![subject.as_str(), start, end], read_row)?;

        let mut events = Vec::new();
        for row in rows {
            let event = row?.into_event()?;
            // The SQL range works on millisecond-truncated values.
            if window.is_none_or(|w| w.contains(event.timestamp)) {
                events.push(event);
            }
        }
        Ok(events)
    }

    fn append_event(&mut self, subject: &SubjectId, event: Event) -> Result<Event, DbError> {
        if insert_event(&self.conn, subject, &event)? == 0 {
            return Err(DbError::DuplicateEvent(event.id.to_string()));
        }
        tracing::info!(subject = %subject, id = %event.id, kind = %event.kind, "appended event");
        Ok(event)
    }

    fn delete_event(&mut self, subject: &SubjectId, id: &EventId) -> Result<bool, DbError> {
        let deleted = self.conn.execute(
            "DELETE FROM events WHERE subject_id = ? AND id = ?",
            params![subject.as_str(), id.as_str()],
        )?;
        if deleted > 0 {
            tracing::info!(subject = %subject, id = %id, "deleted event");
        }
        Ok(deleted > 0)
    }
}

impl UserStatsRepository for Database {
    type Error = DbError;

    fn get(&self, subject: &SubjectId) -> Result<Option<UserStats>, DbError> {
        load_stats(&self.conn, subject)
    }

    fn put(&mut self, subject: &SubjectId, stats: &UserStats) -> Result<(), DbError> {
        store_stats(&self.conn, subject, stats)
    }

    fn update<F>(&mut self, subject: &SubjectId, f: F) -> Result<TrackOutcome, DbError>
    where
        F: FnOnce(UserStats) -> TrackOutcome,
    {
        let tx = self
            .conn
            .transaction_with_behavior(TransactionBehavior::Immediate)?;
        let current = load_stats(&tx, subject)?.unwrap_or_default();
        let outcome = f(current);
        store_stats(&tx, subject, &outcome.stats)?;
        tx.commit()?;
        Ok(outcome)
    }
}
