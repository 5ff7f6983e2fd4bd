//! Stats command for streaks, XP and achievements.

use std::io::Write;

use anyhow::Result;
use bf_core::gamification::XP_PER_LEVEL;
use bf_core::{UserStats, UserStatsRepository};
use serde::Serialize;

use super::open_database;
use super::util::progress_bar;
use crate::Config;

#[derive(Serialize)]
struct JsonStats<'a> {
    #[serde(flatten)]
    stats: &'a UserStats,
    overall_progress: u32,
}

/// Formats the human-readable gamification summary.
pub fn format_stats(stats: &UserStats) -> String {
    let mut lines = vec![
        format!(
            "Level {} · {} XP ({}/{XP_PER_LEVEL} to next level)",
            stats.level,
            stats.xp,
            stats.xp % XP_PER_LEVEL
        ),
        format!(
            "Streak: {} day(s) (longest {})",
            stats.current_streak, stats.longest_streak
        ),
        format!("Days active: {}", stats.days_active),
        format!("Records: {}", stats.total_events),
        format!("Achievements: {}% unlocked", stats.overall_progress()),
    ];
    for achievement in &stats.achievements {
        let mark = if achievement.is_unlocked() { "[x]" } else { "[ ]" };
        let progress = achievement.progress.min(achievement.target);
        lines.push(format!(
            "{mark} {:<16}{} {progress}/{}",
            achievement.id.title(),
            progress_bar(progress, achievement.target),
            achievement.target
        ));
    }
    lines.join("\n") + "\n"
}

pub fn run<W: Write>(writer: &mut W, json: bool, config: &Config) -> Result<()> {
    let subject = config.subject_id()?;
    let db = open_database(config)?;
    let stats = db.get(&subject)?.unwrap_or_default();

    if json {
        let doc = JsonStats {
            stats: &stats,
            overall_progress: stats.overall_progress(),
        };
        writeln!(writer, "{}", serde_json::to_string_pretty(&doc)?)?;
    } else {
        write!(writer, "{}", format_stats(&stats))?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bf_core::{EventType, Plan, track_event};
    use chrono::DateTime;
    use insta::assert_snapshot;

    use crate::commands::test_config;

    fn three_day_streak() -> UserStats {
        let mut stats = UserStats::default();
        for day in ["2025-03-06", "2025-03-07", "2025-03-08"] {
            let now = DateTime::parse_from_rfc3339(&format!("{day}T09:00:00Z")).unwrap();
            stats = track_event(stats, &EventType::Fed.into(), now).stats;
        }
        stats
    }

    #[test]
    fn text_summary() {
        assert_snapshot!(format_stats(&three_day_streak()), @r"
        Level 1 · 15 XP (15/100 to next level)
        Streak: 3 day(s) (longest 3)
        Days active: 3
        Records: 3
        Achievements: 13% unlocked
        [x] First Record    ██████████ 1/1
        [ ] Strong Week     ████░░░░░░ 3/7
        [ ] Dedicated Month █░░░░░░░░░ 3/30
        [ ] Centenarian     █░░░░░░░░░ 3/100
        [ ] Sleep Master    ░░░░░░░░░░ 0/50
        [ ] Feeding Pro     █░░░░░░░░░ 3/100
        [ ] Diaper Champion ░░░░░░░░░░ 0/200
        [ ] Premium User    ░░░░░░░░░░ 0/1
        ");
    }

    #[test]
    fn json_reads_stored_stats() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Free);
        let mut db = open_database(&config).unwrap();
        db.put(&config.subject_id().unwrap(), &three_day_streak()).unwrap();

        let mut output = Vec::new();
        run(&mut output, true, &config).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        assert_eq!(json["current_streak"], 3);
        assert_eq!(json["feeding_events"], 3);
        assert_eq!(json["overall_progress"], 13);
        assert_eq!(json["achievements"][0]["id"], "first_event");
    }

    #[test]
    fn missing_stats_show_defaults() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Free);
        let mut output = Vec::new();
        run(&mut output, false, &config).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("Level 1 · 0 XP (0/100 to next level)\nStreak: 0 day(s)"));
    }
}
