//! Longer-range analytics available on the premium plan.

use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset, NaiveDate, Timelike};
use serde::Serialize;

use crate::event::Event;
use crate::event_type::EventType;
use crate::session::extract_sleep_sessions;
use crate::store::TimeWindow;

pub const SLEEP_TREND_DAYS: i64 = 30;
pub const BEHAVIOR_DAYS: i64 = 7;

/// One day of the 30-day sleep trend.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SleepTrendDay {
    pub day: NaiveDate,
    pub total_hours: f64,
    pub session_count: u32,
    /// Sessions that started between 22:00 and 05:59.
    pub night_wakings: u32,
    /// 0-100.
    pub quality: i32,
}

/// Heuristic 0-100 score for one day of sleep.
pub fn sleep_quality_score(hours: f64, sessions: u32, night_wakings: u32) -> i32 {
    let mut score: i32 = 50;

    if (12.0..=16.0).contains(&hours) {
        score += 30;
    } else if (10.0..12.0).contains(&hours) {
        score += 15;
    } else if hours < 10.0 {
        score -= 20;
    }

    match sessions {
        3 | 4 => score += 10,
        0 | 1 => score -= 10,
        _ => {}
    }

    let penalty = i32::try_from(night_wakings).unwrap_or(i32::MAX).saturating_mul(10);
    score.saturating_sub(penalty).clamp(0, 100)
}

/// Per-day sleep metrics for every day in the last 30 days that has events.
pub fn sleep_trends(events: &[Event], now: DateTime<FixedOffset>) -> Vec<SleepTrendDay> {
    let window = TimeWindow::last_days(now, SLEEP_TREND_DAYS);

    let mut days: BTreeMap<NaiveDate, (f64, u32, u32)> =
        window.select(events).map(|e| (e.day(), (0.0, 0, 0))).collect();

    for session in extract_sleep_sessions(window.select(events)) {
        let entry = days.entry(session.day()).or_insert((0.0, 0, 0));
        entry.0 += session.duration_minutes();
        entry.1 += 1;
        let hour = session.start.hour();
        if hour >= 22 || hour < 6 {
            entry.2 += 1;
        }
    }

    days.into_iter()
        .map(|(day, (minutes, sessions, wakings))| {
            let total_hours = minutes / 60.0;
            SleepTrendDay {
                day,
                total_hours,
                session_count: sessions,
                night_wakings: wakings,
                quality: sleep_quality_score(total_hours, sessions, wakings),
            }
        })
        .collect()
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightSeverity {
    Info,
    Warning,
    Success,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BehaviorInsight {
    pub severity: InsightSeverity,
    pub title: &'static str,
    pub description: &'static str,
}

/// Weekly behaviour observations.
pub fn behavior_insights(events: &[Event], now: DateTime<FixedOffset>) -> Vec<BehaviorInsight> {
    let week = TimeWindow::last_days(now, BEHAVIOR_DAYS);
    let count = |pred: &dyn Fn(&Event) -> bool| week.select(events).filter(|e| pred(e)).count();

    let cries = count(&|e| e.is(EventType::Cried));
    let sleep_records = count(&|e| e.kind.known().is_some_and(EventType::is_sleep_marker));
    let feedings = count(&|e| e.is(EventType::Fed));

    let mut insights = Vec::new();
    if cries > 20 {
        insights.push(BehaviorInsight {
            severity: InsightSeverity::Warning,
            title: "More crying than usual",
            description: "The baby has cried more than normal over the last 7 days. \
                          This can point to discomfort, colic or a routine that needs adjusting.",
        });
    }
    if sleep_records < 14 {
        insights.push(BehaviorInsight {
            severity: InsightSeverity::Info,
            title: "Few sleep records",
            description: "Record more sleep events to get a more accurate picture of the baby's rest.",
        });
    }
    if (42..=56).contains(&feedings) {
        insights.push(BehaviorInsight {
            severity: InsightSeverity::Success,
            title: "Healthy feeding pattern",
            description: "The baby is feeding at an adequate frequency (6-8 times a day). Keep it up!",
        });
    }
    insights
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum RecommendationCategory {
    Sleep,
    Feeding,
    Routine,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    Low,
    Medium,
    High,
}

impl Priority {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

/// A premium action item with its expected effect.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PremiumRecommendation {
    pub category: RecommendationCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub priority: Priority,
    pub impact: &'static str,
}

/// Weekly feedings below this (6 a day) trigger the feeding item.
const WEEKLY_FEEDING_TARGET: usize = 42;

/// Premium action plan for the last 7 days. Always includes the sleep routine
/// and transition ritual items.
pub fn premium_recommendations(events: &[Event], now: DateTime<FixedOffset>) -> Vec<PremiumRecommendation> {
    let week = TimeWindow::last_days(now, BEHAVIOR_DAYS);
    let feedings = week.select(events).filter(|e| e.is(EventType::Fed)).count();

    let mut recommendations = vec![PremiumRecommendation {
        category: RecommendationCategory::Sleep,
        title: "Establish a consistent sleep routine",
        description: "Put the baby down at the same time every day. It helps regulate the body clock \
                      and improves sleep quality.",
        priority: Priority::High,
        impact: "30-40% better sleep quality within 2 weeks",
    }];
    if feedings < WEEKLY_FEEDING_TARGET {
        recommendations.push(PremiumRecommendation {
            category: RecommendationCategory::Feeding,
            title: "Feed more often",
            description: "The baby is feeding less than recommended. Offer the breast or bottle \
                          every 2-3 hours during the day.",
            priority: Priority::High,
            impact: "Better weight gain and development",
        });
    }
    recommendations.push(PremiumRecommendation {
        category: RecommendationCategory::Routine,
        title: "Create transition rituals",
        description: "Set up bedtime rituals (bath, massage, soft music) to signal that it is \
                      time to rest.",
        priority: Priority::Medium,
        impact: "20-30% less time to fall asleep",
    });
    recommendations
}
