//! Short-term trend classification.

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use crate::event::Event;
use crate::event_type::EventType;

/// Relative change (percent) a metric must exceed to count as moving.
const DEADBAND_PERCENT: f64 = 10.0;

/// Dashboard sleep trend thresholds, in average minutes per day.
const SLEEP_TREND_UP_MINUTES: f64 = 600.0;
const SLEEP_TREND_DOWN_MINUTES: f64 = 480.0;

/// Direction of a metric.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Trend {
    Up,
    Down,
    Stable,
}

impl Trend {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Up => "up",
            Self::Down => "down",
            Self::Stable => "stable",
        }
    }
}

/// Whether a trend is good or bad news for the parent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendAssessment {
    Favorable,
    Unfavorable,
    Neutral,
}

impl TrendAssessment {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Favorable => "favorable",
            Self::Unfavorable => "unfavorable",
            Self::Neutral => "neutral",
        }
    }
}

/// Metrics shown with a trend on the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum TrendMetric {
    Feeding,
    Crying,
    Sleep,
}

impl TrendMetric {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Feeding => "feeding",
            Self::Crying => "crying",
            Self::Sleep => "sleep",
        }
    }

    /// Maps a direction to its meaning for this metric.
    ///
    /// More feeding and more sleep read as good; more crying reads as bad.
    #[must_use]
    pub const fn assess(self, trend: Trend) -> TrendAssessment {
        let good_when_up = match self {
            Self::Feeding | Self::Sleep => true,
            Self::Crying => false,
        };
        match (trend, good_when_up) {
            (Trend::Stable, _) => TrendAssessment::Neutral,
            (Trend::Up, true) | (Trend::Down, false) => TrendAssessment::Favorable,
            (Trend::Up, false) | (Trend::Down, true) => TrendAssessment::Unfavorable,
        }
    }
}

/// Classifies a change from `previous` to `recent` with a ±10% deadband.
///
/// With no baseline (`previous == 0`) there is nothing to compare against and
/// the result is always `Stable`.
#[allow(clippy::cast_precision_loss)]
pub fn classify_change(recent: usize, previous: usize) -> Trend {
    if previous == 0 {
        return Trend::Stable;
    }
    let change = (recent as f64 - previous as f64) / previous as f64 * 100.0;
    if change > DEADBAND_PERCENT {
        Trend::Up
    } else if change < -DEADBAND_PERCENT {
        Trend::Down
    } else {
        Trend::Stable
    }
}

/// Compares the last three days against the four days before them.
///
/// Recent is `[now - 3d, now]`, previous is `[now - 7d, now - 3d)`.
pub fn classify_trend(event_type: EventType, events: &[Event], now: DateTime<FixedOffset>) -> Trend {
    let recent_start = now - Duration::days(3);
    let previous_start = now - Duration::days(7);

    let (mut recent, mut previous) = (0, 0);
    for event in events.iter().filter(|e| e.is(event_type)) {
        let ts = event.timestamp;
        if ts >= recent_start && ts <= now {
            recent += 1;
        } else if ts >= previous_start && ts < recent_start {
            previous += 1;
        }
    }

    tracing::debug!(%event_type, recent, previous, "classifying trend");
    classify_change(recent, previous)
}

/// Sleep is trended against absolute thresholds rather than a prior window.
pub fn classify_sleep_trend(average_minutes_per_day: f64) -> Trend {
    if average_minutes_per_day > SLEEP_TREND_UP_MINUTES {
        Trend::Up
    } else if average_minutes_per_day < SLEEP_TREND_DOWN_MINUTES {
        Trend::Down
    } else {
        Trend::Stable
    }
}
