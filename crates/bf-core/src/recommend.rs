//! Rule-based sleep analysis and care recommendations.

use chrono::{DateTime, Duration, FixedOffset};
use serde::Serialize;

use crate::event::Event;
use crate::event_type::EventType;
use crate::quality::{SleepQuality, classify_sleep_quality_fine};
use crate::session::extract_sleep_sessions;
use crate::store::TimeWindow;

/// Length of the sleep analysis window, in days. Averages divide by this
/// regardless of how many days actually carry data.
pub const ANALYSIS_DAYS: i64 = 7;

/// Summary of the last week of sleep plus the last day of cries and feedings.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepAnalysis {
    pub total_sleep_minutes: f64,
    pub daily_average_minutes: f64,
    pub sessions_per_day: f64,
    /// Mean session length; 0 with no sessions.
    pub average_session_minutes: f64,
    pub quality: SleepQuality,
    pub cries_last_24h: usize,
    pub feedings_last_24h: usize,
}

#[allow(clippy::cast_precision_loss)]
pub fn analyze_sleep_pattern(events: &[Event], now: DateTime<FixedOffset>) -> SleepAnalysis {
    let week = TimeWindow::last_days(now, ANALYSIS_DAYS);
    let sessions = extract_sleep_sessions(week.select(events));

    let total_sleep_minutes: f64 = sessions.iter().map(|s| s.duration_minutes()).sum();
    let average_session_minutes = if sessions.is_empty() {
        0.0
    } else {
        total_sleep_minutes / sessions.len() as f64
    };
    let daily_average_minutes = total_sleep_minutes / ANALYSIS_DAYS as f64;

    let day = TimeWindow::ending_at(now, Duration::hours(24));
    let count = |t: EventType| day.select(events).filter(|e| e.is(t)).count();

    SleepAnalysis {
        total_sleep_minutes,
        daily_average_minutes,
        sessions_per_day: sessions.len() as f64 / ANALYSIS_DAYS as f64,
        average_session_minutes,
        quality: classify_sleep_quality_fine(daily_average_minutes),
        cries_last_24h: count(EventType::Cried),
        feedings_last_24h: count(EventType::Fed),
    }
}

struct Rule {
    applies: fn(&SleepAnalysis) -> bool,
    message: &'static str,
}

const TWELVE_HOURS: f64 = 720.0;

static RULES: &[Rule] = &[
    Rule {
        applies: |a| a.daily_average_minutes < TWELVE_HOURS,
        message: "Try to establish a more consistent sleep routine.",
    },
    Rule {
        applies: |a| a.daily_average_minutes < TWELVE_HOURS,
        message: "Create a calm, dark environment for naps.",
    },
    Rule {
        applies: |a| a.sessions_per_day < 3.0,
        message: "Consider adding more naps during the day.",
    },
    Rule {
        applies: |a| a.average_session_minutes < 30.0,
        message: "Very short naps can point to discomfort or an unsuitable sleep environment.",
    },
    Rule {
        applies: |a| a.cries_last_24h > 5,
        message: "Many crying episodes in the last 24 hours: check hunger, diaper and comfort.",
    },
    Rule {
        applies: |a| a.feedings_last_24h < 6,
        message: "Make sure the baby is feeding often enough.",
    },
];

static AFFIRMATIONS: [&str; 2] = [
    "Keep up the current routine, it is working well!",
    "Keep consistent times for going to sleep and waking up.",
];

/// Evaluates every rule against the analysis. Never returns an empty list.
pub fn recommendations_for(analysis: &SleepAnalysis) -> Vec<String> {
    let fired: Vec<String> = RULES
        .iter()
        .filter(|rule| (rule.applies)(analysis))
        .map(|rule| rule.message.to_owned())
        .collect();

    tracing::debug!(fired = fired.len(), "evaluated recommendation rules");

    if fired.is_empty() {
        AFFIRMATIONS.iter().map(|&m| m.to_owned()).collect()
    } else {
        fired
    }
}

/// Analyzes the event history and returns ordered recommendations.
pub fn generate_recommendations(events: &[Event], now: DateTime<FixedOffset>) -> Vec<String> {
    recommendations_for(&analyze_sleep_pattern(events, now))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    /// A week of four 3.5 h sessions per day, seven feedings the last day.
    fn healthy_week(now: DateTime<FixedOffset>) -> Vec<Event> {
        let mut events = Vec::new();
        for day in 1..=7 {
            let base = now - Duration::days(day);
            for nap in 0..4 {
                let start = base + Duration::hours(nap * 5);
                events.push(Event::new(EventType::Slept, start));
                events.push(Event::new(
                    EventType::Woke,
                    start + Duration::minutes(210),
                ));
            }
        }
        for i in 0..7 {
            events.push(Event::new(EventType::Fed, now - Duration::hours(i * 3)));
        }
        events
    }

    #[test]
    fn empty_history_fires_all_low_rules() {
        let now = at("2025-03-08T12:00:00Z");
        let recs = generate_recommendations(&[], now);
        assert_eq!(
            recs,
            vec![
                "Try to establish a more consistent sleep routine.",
                "Create a calm, dark environment for naps.",
                "Consider adding more naps during the day.",
                "Very short naps can point to discomfort or an unsuitable sleep environment.",
                "Make sure the baby is feeding often enough.",
            ]
        );
    }

    #[test]
    fn nothing_fires_yields_exactly_two_affirmations() {
        let now = at("2025-03-08T12:00:00Z");
        let events = healthy_week(now);
        let analysis = analyze_sleep_pattern(&events, now);
        assert!(analysis.daily_average_minutes >= 720.0);
        assert!(analysis.sessions_per_day >= 3.0);
        assert_eq!(analysis.feedings_last_24h, 7);

        let recs = recommendations_for(&analysis);
        assert_eq!(recs.len(), 2);
        assert_eq!(recs[0], AFFIRMATIONS[0]);
        assert_eq!(recs[1], AFFIRMATIONS[1]);
    }

    #[test]
    fn crying_rule_needs_more_than_five() {
        let now = at("2025-03-08T12:00:00Z");
        let mut events = healthy_week(now);
        for i in 0..5 {
            events.push(Event::new(EventType::Cried, now - Duration::hours(i)));
        }
        assert_eq!(generate_recommendations(&events, now).len(), 2);

        events.push(Event::new(EventType::Cried, now - Duration::hours(6)));
        let recs = generate_recommendations(&events, now);
        assert_eq!(recs.len(), 1);
        assert!(recs[0].starts_with("Many crying episodes"));
    }

    #[test]
    fn daily_average_divides_by_seven() {
        let now = at("2025-03-08T12:00:00Z");
        let events = vec![
            Event::new(EventType::Slept, now - Duration::hours(10)),
            Event::new(EventType::Woke, now - Duration::hours(3)),
        ];
        let analysis = analyze_sleep_pattern(&events, now);
        assert!((analysis.total_sleep_minutes - 420.0).abs() < 1e-9);
        assert!((analysis.daily_average_minutes - 60.0).abs() < 1e-9);
        assert!((analysis.average_session_minutes - 420.0).abs() < 1e-9);
        assert_eq!(analysis.quality, SleepQuality::NeedsImprovement);
    }

    #[test]
    fn events_outside_the_week_are_ignored() {
        let now = at("2025-03-08T12:00:00Z");
        let events = vec![
            Event::new(EventType::Slept, now - Duration::days(9)),
            Event::new(EventType::Woke, now - Duration::days(8)),
        ];
        let analysis = analyze_sleep_pattern(&events, now);
        assert!(analysis.total_sleep_minutes.abs() < f64::EPSILON);
    }
}
