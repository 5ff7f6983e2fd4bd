//! Sleep quality labels.
//!
//! Two scales exist and are deliberately separate: the fine scale drives the
//! insight panel and the assistant, the coarse scale labels the dashboard.
//! The same average can land in different bands on each.

use std::fmt;

use serde::Serialize;

/// Qualitative sleep band.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SleepQuality {
    NeedsImprovement,
    Regular,
    Good,
    Excellent,
}

impl SleepQuality {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::NeedsImprovement => "needs improvement",
            Self::Regular => "regular",
            Self::Good => "good",
            Self::Excellent => "excellent",
        }
    }
}

impl fmt::Display for SleepQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

fn classify(avg_minutes_per_day: f64, [excellent, good, regular]: [f64; 3]) -> SleepQuality {
    if avg_minutes_per_day >= excellent {
        SleepQuality::Excellent
    } else if avg_minutes_per_day >= good {
        SleepQuality::Good
    } else if avg_minutes_per_day >= regular {
        SleepQuality::Regular
    } else {
        SleepQuality::NeedsImprovement
    }
}

/// Fine scale: 14 h / 12 h / 10 h.
pub fn classify_sleep_quality_fine(avg_minutes_per_day: f64) -> SleepQuality {
    classify(avg_minutes_per_day, [840.0, 720.0, 600.0])
}

/// Coarse scale: 11 h / 9 h / 7 h.
pub fn classify_sleep_quality_coarse(avg_minutes_per_day: f64) -> SleepQuality {
    classify(avg_minutes_per_day, [660.0, 540.0, 420.0])
}
