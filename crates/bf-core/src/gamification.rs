//! Streaks, experience points and achievements.
//!
//! [`track_event`] is a pure state transition. Persistence goes through the
//! [`UserStatsRepository`] trait, and [`StatsTracker`] ties a repository to a
//! [`Clock`] to perform the read-modify-write.

use std::collections::HashMap;
use std::convert::Infallible;
use std::fmt;

use chrono::{DateTime, FixedOffset, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::clock::Clock;
use crate::event_type::{EventKind, EventType};
use crate::types::SubjectId;

/// XP granted for every tracked event.
pub const XP_PER_EVENT: u64 = 5;
/// XP needed per level.
pub const XP_PER_LEVEL: u64 = 100;

/// Identifies one of the fixed achievements.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AchievementId {
    FirstEvent,
    WeekStreak,
    MonthStreak,
    HundredEvents,
    SleepMaster,
    FeedingPro,
    DiaperChampion,
    PremiumUser,
}

impl AchievementId {
    pub const ALL: [Self; 8] = [
        Self::FirstEvent,
        Self::WeekStreak,
        Self::MonthStreak,
        Self::HundredEvents,
        Self::SleepMaster,
        Self::FeedingPro,
        Self::DiaperChampion,
        Self::PremiumUser,
    ];

    #[must_use]
    pub const fn target(self) -> u64 {
        match self {
            Self::FirstEvent | Self::PremiumUser => 1,
            Self::WeekStreak => 7,
            Self::MonthStreak => 30,
            Self::HundredEvents | Self::FeedingPro => 100,
            Self::SleepMaster => 50,
            Self::DiaperChampion => 200,
        }
    }

    #[must_use]
    pub const fn title(self) -> &'static str {
        match self {
            Self::FirstEvent => "First Record",
            Self::WeekStreak => "Strong Week",
            Self::MonthStreak => "Dedicated Month",
            Self::HundredEvents => "Centenarian",
            Self::SleepMaster => "Sleep Master",
            Self::FeedingPro => "Feeding Pro",
            Self::DiaperChampion => "Diaper Champion",
            Self::PremiumUser => "Premium User",
        }
    }

    #[must_use]
    pub const fn description(self) -> &'static str {
        match self {
            Self::FirstEvent => "Record your first activity",
            Self::WeekStreak => "Use the app 7 days in a row",
            Self::MonthStreak => "Use the app 30 days in a row",
            Self::HundredEvents => "Record 100 activities",
            Self::SleepMaster => "Record 50 sleep events",
            Self::FeedingPro => "Record 100 feedings",
            Self::DiaperChampion => "Record 200 diaper changes",
            Self::PremiumUser => "Subscribe to the Premium plan",
        }
    }
}

impl fmt::Display for AchievementId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.title())
    }
}

/// Progress toward one achievement.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Achievement {
    pub id: AchievementId,
    pub progress: u64,
    pub target: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unlocked_at: Option<DateTime<FixedOffset>>,
}

impl Achievement {
    #[must_use]
    pub const fn new(id: AchievementId) -> Self {
        Self {
            id,
            progress: 0,
            target: id.target(),
            unlocked_at: None,
        }
    }

    pub const fn is_unlocked(&self) -> bool {
        self.unlocked_at.is_some()
    }

    /// Raises progress (never lowers it) and unlocks once the target is met.
    /// Returns true if this call unlocked the achievement.
    fn advance(&mut self, progress: u64, now: DateTime<FixedOffset>) -> bool {
        if self.is_unlocked() {
            return false;
        }
        self.progress = self.progress.max(progress);
        if self.progress >= self.target {
            self.unlocked_at = Some(now);
            return true;
        }
        false
    }
}

/// Per-account engagement state.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserStats {
    pub total_events: u64,
    pub days_active: u32,
    pub current_streak: u32,
    pub longest_streak: u32,
    pub last_active_date: Option<NaiveDate>,
    pub xp: u64,
    pub level: u64,
    /// Lifetime `slept` + `woke` events.
    #[serde(default)]
    pub sleep_events: u64,
    #[serde(default)]
    pub feeding_events: u64,
    #[serde(default)]
    pub diaper_events: u64,
    pub achievements: Vec<Achievement>,
}

impl Default for UserStats {
    fn default() -> Self {
        Self {
            total_events: 0,
            days_active: 0,
            current_streak: 0,
            longest_streak: 0,
            last_active_date: None,
            xp: 0,
            level: 1,
            sleep_events: 0,
            feeding_events: 0,
            diaper_events: 0,
            achievements: AchievementId::ALL.into_iter().map(Achievement::new).collect(),
        }
    }
}

impl UserStats {
    pub fn achievement(&self, id: AchievementId) -> Option<&Achievement> {
        self.achievements.iter().find(|a| a.id == id)
    }

    /// Adds any achievement missing from a document written by an older build.
    fn ensure_achievements(&mut self) {
        for id in AchievementId::ALL {
            if self.achievement(id).is_none() {
                self.achievements.push(Achievement::new(id));
            }
        }
    }

    /// Percentage of achievements unlocked, rounded.
    #[allow(
        clippy::cast_precision_loss,
        clippy::cast_possible_truncation,
        clippy::cast_sign_loss
    )]
    pub fn overall_progress(&self) -> u32 {
        if self.achievements.is_empty() {
            return 0;
        }
        let unlocked = self.achievements.iter().filter(|a| a.is_unlocked()).count();
        (unlocked as f64 / self.achievements.len() as f64 * 100.0).round() as u32
    }

    fn progress_for(&self, id: AchievementId) -> Option<u64> {
        match id {
            AchievementId::FirstEvent => Some(self.total_events.min(1)),
            AchievementId::WeekStreak | AchievementId::MonthStreak => {
                Some(u64::from(self.current_streak))
            }
            AchievementId::HundredEvents => Some(self.total_events),
            AchievementId::SleepMaster => Some(self.sleep_events),
            AchievementId::FeedingPro => Some(self.feeding_events),
            AchievementId::DiaperChampion => Some(self.diaper_events),
            AchievementId::PremiumUser => None,
        }
    }
}

/// Result of a stats transition.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TrackOutcome {
    pub stats: UserStats,
    /// Achievements unlocked by this transition, in table order.
    pub unlocked: Vec<AchievementId>,
    /// The new level, if it went up.
    pub level_up: Option<u64>,
}

/// Applies one tracked event to the stats.
pub fn track_event(mut stats: UserStats, kind: &EventKind, now: DateTime<FixedOffset>) -> TrackOutcome {
    stats.ensure_achievements();
    let today = now.date_naive();

    stats.total_events += 1;
    match kind.known() {
        Some(EventType::Slept | EventType::Woke) => stats.sleep_events += 1,
        Some(EventType::Fed) => stats.feeding_events += 1,
        Some(EventType::DiaperChanged) => stats.diaper_events += 1,
        _ => {}
    }

    let previous_level = stats.level;
    stats.xp += XP_PER_EVENT;
    stats.level = stats.xp / XP_PER_LEVEL + 1;
    let level_up = (stats.level > previous_level).then_some(stats.level);

    // A last active date after today (clock moved back) counts as today.
    match stats.last_active_date {
        Some(last) if last >= today => {}
        Some(last) if today.pred_opt() == Some(last) => {
            stats.current_streak += 1;
            stats.days_active += 1;
        }
        _ => {
            stats.current_streak = 1;
            stats.days_active += 1;
        }
    }
    stats.longest_streak = stats.longest_streak.max(stats.current_streak);
    stats.last_active_date = stats.last_active_date.max(Some(today));

    let mut unlocked = Vec::new();
    for i in 0..stats.achievements.len() {
        let id = stats.achievements[i].id;
        if let Some(progress) = stats.progress_for(id) {
            if stats.achievements[i].advance(progress, now) {
                unlocked.push(id);
            }
        }
    }

    if !unlocked.is_empty() {
        tracing::info!(?unlocked, "achievements unlocked");
    }

    TrackOutcome {
        stats,
        unlocked,
        level_up,
    }
}

/// Unlocks the premium achievement. Has no effect if already unlocked.
pub fn unlock_premium(mut stats: UserStats, now: DateTime<FixedOffset>) -> TrackOutcome {
    stats.ensure_achievements();
    let mut unlocked = Vec::new();
    if let Some(premium) = stats
        .achievements
        .iter_mut()
        .find(|a| a.id == AchievementId::PremiumUser)
    {
        if premium.advance(1, now) {
            unlocked.push(premium.id);
        }
    }

    TrackOutcome {
        stats,
        unlocked,
        level_up: None,
    }
}

/// Persistence for per-subject [`UserStats`].
pub trait UserStatsRepository {
    type Error: std::error::Error + Send + Sync + 'static;

    /// Returns the stored stats, or `None` if the subject has none yet.
    fn get(&self, subject: &SubjectId) -> Result<Option<UserStats>, Self::Error>;

    fn put(&mut self, subject: &SubjectId, stats: &UserStats) -> Result<(), Self::Error>;

    /// Reads, transforms and writes back the stats for `subject`.
    ///
    /// Implementations backed by shared storage should override this to run
    /// the whole cycle atomically.
    fn update<F>(&mut self, subject: &SubjectId, f: F) -> Result<TrackOutcome, Self::Error>
    where
        F: FnOnce(UserStats) -> TrackOutcome,
    {
        let current = self.get(subject)?.unwrap_or_default();
        let outcome = f(current);
        self.put(subject, &outcome.stats)?;
        Ok(outcome)
    }
}

/// In-process repository, used by tests and one-shot computations.
#[derive(Debug, Default)]
pub struct MemoryStatsRepository {
    stats: HashMap<SubjectId, UserStats>,
}

impl MemoryStatsRepository {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

impl UserStatsRepository for MemoryStatsRepository {
    type Error = Infallible;

    fn get(&self, subject: &SubjectId) -> Result<Option<UserStats>, Self::Error> {
        Ok(self.stats.get(subject).cloned())
    }

    fn put(&mut self, subject: &SubjectId, stats: &UserStats) -> Result<(), Self::Error> {
        self.stats.insert(subject.clone(), stats.clone());
        Ok(())
    }
}

/// Applies gamification transitions against a repository at the clock's time.
#[derive(Debug)]
pub struct StatsTracker<R, C> {
    repo: R,
    clock: C,
}

impl<R: UserStatsRepository, C: Clock> StatsTracker<R, C> {
    pub const fn new(repo: R, clock: C) -> Self {
        Self { repo, clock }
    }

    pub fn track(&mut self, subject: &SubjectId, kind: &EventKind) -> Result<TrackOutcome, R::Error> {
        let now = self.clock.now();
        self.repo.update(subject, |stats| track_event(stats, kind, now))
    }

    pub fn unlock_premium(&mut self, subject: &SubjectId) -> Result<TrackOutcome, R::Error> {
        let now = self.clock.now();
        self.repo.update(subject, |stats| unlock_premium(stats, now))
    }

    pub fn stats(&self, subject: &SubjectId) -> Result<UserStats, R::Error> {
        Ok(self.repo.get(subject)?.unwrap_or_default())
    }

}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::FixedClock;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn fed() -> EventKind {
        EventType::Fed.into()
    }

    fn progress(stats: &UserStats, id: AchievementId) -> u64 {
        stats.achievement(id).unwrap().progress
    }

    #[test]
    fn first_event_unlocks_first_event_achievement() {
        let now = at("2025-03-08T12:00:00Z");
        let outcome = track_event(UserStats::default(), &fed(), now);
        assert_eq!(outcome.unlocked, vec![AchievementId::FirstEvent]);
        assert_eq!(outcome.stats.total_events, 1);
        assert_eq!(outcome.stats.current_streak, 1);
        assert_eq!(outcome.stats.days_active, 1);
        assert_eq!(outcome.stats.xp, 5);
        assert_eq!(outcome.level_up, None);
        assert_eq!(
            outcome.stats.achievement(AchievementId::FirstEvent).unwrap().unlocked_at,
            Some(now)
        );
    }

    #[test]
    fn streak_continues_from_yesterday() {
        let stats = UserStats {
            current_streak: 6,
            longest_streak: 6,
            last_active_date: NaiveDate::from_ymd_opt(2025, 3, 7),
            ..UserStats::default()
        };
        let outcome = track_event(stats, &fed(), at("2025-03-08T09:00:00Z"));
        assert_eq!(outcome.stats.current_streak, 7);
        assert_eq!(outcome.stats.longest_streak, 7);
        assert!(outcome.unlocked.contains(&AchievementId::WeekStreak));
    }

    #[test]
    fn same_day_keeps_streak_and_days_active() {
        let stats = UserStats {
            current_streak: 3,
            days_active: 3,
            last_active_date: NaiveDate::from_ymd_opt(2025, 3, 8),
            ..UserStats::default()
        };
        let outcome = track_event(stats, &fed(), at("2025-03-08T21:00:00Z"));
        assert_eq!(outcome.stats.current_streak, 3);
        assert_eq!(outcome.stats.days_active, 3);
    }

    #[test]
    fn last_active_date_in_the_future_counts_as_today() {
        let stats = UserStats {
            current_streak: 4,
            longest_streak: 4,
            days_active: 4,
            last_active_date: NaiveDate::from_ymd_opt(2025, 3, 10),
            ..UserStats::default()
        };
        let outcome = track_event(stats, &fed(), at("2025-03-08T12:00:00Z"));
        assert_eq!(outcome.stats.current_streak, 4);
        assert_eq!(outcome.stats.days_active, 4);
        assert_eq!(outcome.stats.last_active_date, NaiveDate::from_ymd_opt(2025, 3, 10));
    }

    #[test]
    fn gap_resets_streak_but_keeps_longest() {
        let stats = UserStats {
            current_streak: 10,
            longest_streak: 10,
            last_active_date: NaiveDate::from_ymd_opt(2025, 3, 5),
            ..UserStats::default()
        };
        let outcome = track_event(stats, &fed(), at("2025-03-08T12:00:00Z"));
        assert_eq!(outcome.stats.current_streak, 1);
        assert_eq!(outcome.stats.longest_streak, 10);
    }

    #[test]
    fn streak_progress_never_decreases() {
        let mut stats = UserStats {
            current_streak: 5,
            last_active_date: NaiveDate::from_ymd_opt(2025, 3, 7),
            ..UserStats::default()
        };
        stats = track_event(stats, &fed(), at("2025-03-08T12:00:00Z")).stats;
        assert_eq!(progress(&stats, AchievementId::WeekStreak), 6);

        stats = track_event(stats, &fed(), at("2025-03-20T12:00:00Z")).stats;
        assert_eq!(stats.current_streak, 1);
        assert_eq!(progress(&stats, AchievementId::WeekStreak), 6);
    }

    #[test]
    fn level_up_is_reported_at_hundred_xp() {
        let stats = UserStats {
            xp: 95,
            level: 1,
            ..UserStats::default()
        };
        let outcome = track_event(stats, &fed(), at("2025-03-08T12:00:00Z"));
        assert_eq!(outcome.stats.xp, 100);
        assert_eq!(outcome.stats.level, 2);
        assert_eq!(outcome.level_up, Some(2));
    }

    #[test]
    fn unlocked_achievement_keeps_its_timestamp() {
        let first = at("2025-03-08T12:00:00Z");
        let stats = track_event(UserStats::default(), &fed(), first).stats;
        let stats = track_event(stats, &fed(), at("2025-03-09T12:00:00Z")).stats;
        let achievement = stats.achievement(AchievementId::FirstEvent).unwrap();
        assert_eq!(achievement.unlocked_at, Some(first));
    }

    #[test]
    fn type_counters_drive_type_achievements() {
        let stats = UserStats {
            sleep_events: 49,
            diaper_events: 10,
            ..UserStats::default()
        };
        let outcome = track_event(stats, &EventType::Woke.into(), at("2025-03-08T12:00:00Z"));
        assert!(outcome.unlocked.contains(&AchievementId::SleepMaster));
        assert_eq!(progress(&outcome.stats, AchievementId::DiaperChampion), 10);

        // unknown types count toward totals only
        let outcome = track_event(outcome.stats, &EventKind::from("bath"), at("2025-03-08T13:00:00Z"));
        assert_eq!(outcome.stats.total_events, 2);
        assert_eq!(outcome.stats.sleep_events, 50);
    }

    #[test]
    fn premium_unlocks_once() {
        let now = at("2025-03-08T12:00:00Z");
        let outcome = unlock_premium(UserStats::default(), now);
        assert_eq!(outcome.unlocked, vec![AchievementId::PremiumUser]);
        let again = unlock_premium(outcome.stats, at("2025-03-09T12:00:00Z"));
        assert!(again.unlocked.is_empty());
        assert_eq!(
            again.stats.achievement(AchievementId::PremiumUser).unwrap().unlocked_at,
            Some(now)
        );
        assert_eq!(again.stats.overall_progress(), 13);
    }

    #[test]
    fn missing_achievements_are_restored() {
        let stats = UserStats {
            achievements: Vec::new(),
            ..UserStats::default()
        };
        let outcome = track_event(stats, &fed(), at("2025-03-08T12:00:00Z"));
        assert_eq!(outcome.stats.achievements.len(), AchievementId::ALL.len());
    }

    #[test]
    fn tracker_persists_through_repository() {
        let subject = SubjectId::new("ana").unwrap();
        let clock = FixedClock(at("2025-03-08T12:00:00Z"));
        let mut tracker = StatsTracker::new(MemoryStatsRepository::new(), clock);

        tracker.track(&subject, &fed()).unwrap();
        let outcome = tracker.track(&subject, &fed()).unwrap();
        assert_eq!(outcome.stats.total_events, 2);
        assert!(outcome.unlocked.is_empty());

        let stored = tracker.stats(&subject).unwrap();
        assert_eq!(stored, outcome.stats);

        let other = SubjectId::new("bia").unwrap();
        assert_eq!(tracker.stats(&other).unwrap(), UserStats::default());
    }
}
