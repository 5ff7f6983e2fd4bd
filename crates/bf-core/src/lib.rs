//! Core domain logic for the `BabyFlow` care log.
//!
//! This crate contains the fundamental types and logic for:
//! - Events: validated care records and their types
//! - Aggregation: sleep sessions, daily statistics, trends and quality labels
//! - Guidance: rule-based recommendations and the keyword-routed assistant
//! - Gamification: streaks, XP and achievements
//!
//! Everything here is synchronous and free of I/O. Storage lives behind the
//! [`EventStore`] and [`UserStatsRepository`] traits; time comes from a
//! [`Clock`] or an explicit `now` argument.

mod aggregate;
pub mod analytics;
pub mod assistant;
mod clock;
mod event;
pub mod event_type;
pub mod gamification;
pub mod plan;
mod quality;
pub mod recommend;
mod session;
mod store;
mod trend;
pub mod types;

pub use aggregate::{
    DailyStats, TimeOfDay, TimeOfDayPattern, TodaySummary, aggregate_daily, aggregate_window,
    average_daily_count, average_daily_sleep_minutes, consistency_score, feeding_patterns,
    time_of_day_patterns, today_summary,
};
pub use assistant::{ChatMessage, ChatRole, respond_to_message};
pub use clock::{Clock, FixedClock, SystemClock};
pub use event::{Event, InvalidEventError, RawEvent};
pub use event_type::{EventKind, EventType, UnknownEventType};
pub use gamification::{
    Achievement, AchievementId, MemoryStatsRepository, StatsTracker, TrackOutcome, UserStats,
    UserStatsRepository, track_event, unlock_premium,
};
pub use plan::{Plan, PlanFeatures, Subscription};
pub use quality::{SleepQuality, classify_sleep_quality_coarse, classify_sleep_quality_fine};
pub use recommend::{SleepAnalysis, analyze_sleep_pattern, generate_recommendations};
pub use session::{SleepSession, extract_sleep_sessions, extract_sleep_sessions_tolerant};
pub use store::{EventStore, TimeWindow};
pub use trend::{
    Trend, TrendAssessment, TrendMetric, classify_change, classify_sleep_trend, classify_trend,
};
pub use types::{EventId, SubjectId, ValidationError};
