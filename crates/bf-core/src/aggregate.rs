//! Daily and multi-day aggregation.
//!
//! All functions here are pure and total: any well-formed event list,
//! including the empty one, yields a zeroed structure rather than an error.
//! Events are bucketed by the local calendar day of their timestamp.

use std::collections::{BTreeMap, BTreeSet};

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::Serialize;

use crate::event::Event;
use crate::event_type::EventType;
use crate::session::{SleepSession, extract_sleep_sessions};

/// Four fixed local-hour quadrants of the day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum TimeOfDay {
    /// 00:00-05:59
    Overnight,
    /// 06:00-11:59
    Morning,
    /// 12:00-17:59
    Afternoon,
    /// 18:00-23:59
    Evening,
}

impl TimeOfDay {
    pub const ALL: [Self; 4] = [Self::Overnight, Self::Morning, Self::Afternoon, Self::Evening];

    #[must_use]
    pub const fn from_hour(hour: u32) -> Self {
        match hour {
            0..=5 => Self::Overnight,
            6..=11 => Self::Morning,
            12..=17 => Self::Afternoon,
            _ => Self::Evening,
        }
    }

    #[must_use]
    pub const fn index(self) -> usize {
        self as usize
    }

    #[must_use]
    pub const fn label(self) -> &'static str {
        match self {
            Self::Overnight => "overnight (0-6h)",
            Self::Morning => "morning (6-12h)",
            Self::Afternoon => "afternoon (12-18h)",
            Self::Evening => "evening (18-24h)",
        }
    }
}

/// Statistics for one local calendar day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DailyStats {
    pub day: NaiveDate,
    /// Sum of sessions that started on this day.
    pub total_sleep_minutes: f64,
    /// Number of `slept` events, including ones that never completed a session.
    pub nap_count: u32,
    /// Number of completed sessions that started on this day.
    pub session_count: u32,
    pub feeding_count: u32,
    pub diaper_count: u32,
    pub cry_count: u32,
    /// All events on this day, including unrecognized types.
    pub event_count: u32,
    /// Feedings per [`TimeOfDay`] quadrant.
    pub feeding_buckets: [u32; 4],
}

impl DailyStats {
    #[must_use]
    pub const fn empty(day: NaiveDate) -> Self {
        Self {
            day,
            total_sleep_minutes: 0.0,
            nap_count: 0,
            session_count: 0,
            feeding_count: 0,
            diaper_count: 0,
            cry_count: 0,
            event_count: 0,
            feeding_buckets: [0; 4],
        }
    }
}

fn stats_for_day(events: &[Event], sessions: &[SleepSession], day: NaiveDate) -> DailyStats {
    let mut stats = DailyStats::empty(day);

    for session in sessions.iter().filter(|s| s.day() == day) {
        stats.total_sleep_minutes += session.duration_minutes();
        stats.session_count += 1;
    }

    for event in events.iter().filter(|e| e.day() == day) {
        stats.event_count += 1;
        match event.kind.known() {
            Some(EventType::Slept) => stats.nap_count += 1,
            Some(EventType::Fed) => {
                stats.feeding_count += 1;
                stats.feeding_buckets[TimeOfDay::from_hour(event.hour()).index()] += 1;
            }
            Some(EventType::DiaperChanged) => stats.diaper_count += 1,
            Some(EventType::Cried) => stats.cry_count += 1,
            _ => {}
        }
    }

    stats
}

/// Computes statistics for a single day.
///
/// Sessions are paired over the whole input, so a session that starts late on
/// `day` and ends the next morning still counts toward `day`.
pub fn aggregate_daily(events: &[Event], day: NaiveDate) -> DailyStats {
    let sessions = extract_sleep_sessions(events);
    stats_for_day(events, &sessions, day)
}

/// Computes statistics for every day in `start..=end`, zeroed days included.
pub fn aggregate_window(events: &[Event], start: NaiveDate, end: NaiveDate) -> Vec<DailyStats> {
    let sessions = extract_sleep_sessions(events);
    start
        .iter_days()
        .take_while(|day| *day <= end)
        .map(|day| stats_for_day(events, &sessions, day))
        .collect()
}

fn round1(value: f64) -> f64 {
    (value * 10.0).round() / 10.0
}

/// Average count of `event_type` per active day, rounded to one decimal.
///
/// The denominator is the number of distinct days with at least one event of
/// any type; zero active days yields `0.0`.
#[allow(clippy::cast_precision_loss)]
pub fn average_daily_count(events: &[Event], event_type: EventType) -> f64 {
    let active_days: BTreeSet<NaiveDate> = events.iter().map(Event::day).collect();
    if active_days.is_empty() {
        return 0.0;
    }
    let total = events.iter().filter(|e| e.is(event_type)).count();
    round1(total as f64 / active_days.len() as f64)
}

/// Average sleep minutes per day that has at least one session.
#[allow(clippy::cast_precision_loss)]
pub fn average_daily_sleep_minutes(events: &[Event]) -> f64 {
    let mut by_day: BTreeMap<NaiveDate, f64> = BTreeMap::new();
    for session in extract_sleep_sessions(events) {
        *by_day.entry(session.day()).or_insert(0.0) += session.duration_minutes();
    }
    if by_day.is_empty() {
        return 0.0;
    }
    by_day.values().sum::<f64>() / by_day.len() as f64
}

/// Regularity of one event type within a quadrant of the day.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeOfDayPattern {
    pub period: TimeOfDay,
    /// Number of events in the quadrant.
    pub frequency: u32,
    /// Mean minutes between consecutive events in the quadrant; 0 with fewer than two.
    pub average_interval_minutes: f64,
    /// 0-100, higher is more regular.
    pub consistency: f64,
}

/// Score the regularity of a series of intervals on a 0-100 scale.
///
/// `100 - 100 * stddev / mean`, clamped. Fewer than two intervals, or a zero
/// mean, carry no evidence either way and score the neutral 50.
#[allow(clippy::cast_precision_loss)]
pub fn consistency_score(intervals: &[f64]) -> f64 {
    const NEUTRAL: f64 = 50.0;

    if intervals.len() < 2 {
        return NEUTRAL;
    }
    let n = intervals.len() as f64;
    let mean = intervals.iter().sum::<f64>() / n;
    if mean <= 0.0 {
        return NEUTRAL;
    }
    let variance = intervals.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / n;
    let score = 100.0 - variance.sqrt() / mean * 100.0;
    score.clamp(0.0, 100.0)
}

/// Per-quadrant frequency and regularity of `event_type`.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
pub fn time_of_day_patterns(events: &[Event], event_type: EventType) -> Vec<TimeOfDayPattern> {
    let mut buckets: [Vec<DateTime<FixedOffset>>; 4] = Default::default();
    for event in events.iter().filter(|e| e.is(event_type)) {
        buckets[TimeOfDay::from_hour(event.hour()).index()].push(event.timestamp);
    }

    TimeOfDay::ALL
        .iter()
        .zip(buckets.iter_mut())
        .map(|(period, timestamps)| {
            timestamps.sort();
            let intervals: Vec<f64> = timestamps
                .windows(2)
                .map(|pair| (pair[1] - pair[0]).num_milliseconds() as f64 / 60_000.0)
                .collect();
            let average_interval_minutes = if intervals.is_empty() {
                0.0
            } else {
                intervals.iter().sum::<f64>() / intervals.len() as f64
            };
            TimeOfDayPattern {
                period: *period,
                frequency: timestamps.len() as u32,
                average_interval_minutes,
                consistency: consistency_score(&intervals),
            }
        })
        .collect()
}

/// Feeding regularity per quadrant of the day.
pub fn feeding_patterns(events: &[Event]) -> Vec<TimeOfDayPattern> {
    time_of_day_patterns(events, EventType::Fed)
}

/// Snapshot of the current day for the dashboard header.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TodaySummary {
    pub stats: DailyStats,
    /// Most recent timestamp of each event type logged today.
    pub latest: BTreeMap<EventType, DateTime<FixedOffset>>,
}

/// Summarizes the local day containing `now`.
pub fn today_summary(events: &[Event], now: DateTime<FixedOffset>) -> TodaySummary {
    let today = now.date_naive();
    let stats = aggregate_daily(events, today);

    let mut latest: BTreeMap<EventType, DateTime<FixedOffset>> = BTreeMap::new();
    for event in events.iter().filter(|e| e.day() == today) {
        if let Some(kind) = event.kind.known() {
            latest
                .entry(kind)
                .and_modify(|ts| *ts = (*ts).max(event.timestamp))
                .or_insert(event.timestamp);
        }
    }

    TodaySummary { stats, latest }
}
