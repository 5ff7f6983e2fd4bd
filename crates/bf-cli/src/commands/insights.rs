//! Insights command: sleep analysis, recommendations and premium analytics.

use std::io::{self, Write};

use anyhow::Result;
use bf_core::analytics::{
    BehaviorInsight, InsightSeverity, PremiumRecommendation, SleepTrendDay, behavior_insights,
    premium_recommendations, sleep_trends,
};
use bf_core::plan::visible_history;
use bf_core::recommend::recommendations_for;
use bf_core::{Clock, Event, EventStore, Plan, SleepAnalysis, analyze_sleep_pattern};
use chrono::{DateTime, FixedOffset};

use super::open_database;
use super::util::format_minutes;
use crate::Config;

fn severity_tag(severity: InsightSeverity) -> &'static str {
    match severity {
        InsightSeverity::Info => "[info]",
        InsightSeverity::Warning => "[warning]",
        InsightSeverity::Success => "[ok]",
    }
}

fn write_analysis<W: Write>(writer: &mut W, analysis: &SleepAnalysis) -> io::Result<()> {
    writeln!(writer, "SLEEP ANALYSIS (last 7 days)")?;
    writeln!(writer, "────────────────────────────")?;
    writeln!(writer, "Total sleep:       {}", format_minutes(analysis.total_sleep_minutes))?;
    writeln!(
        writer,
        "Daily average:     {} ({})",
        format_minutes(analysis.daily_average_minutes),
        analysis.quality
    )?;
    writeln!(writer, "Sessions per day:  {:.1}", analysis.sessions_per_day)?;
    writeln!(
        writer,
        "Average session:   {}",
        format_minutes(analysis.average_session_minutes)
    )?;
    writeln!(
        writer,
        "Last 24h:          {} crying episode(s), {} feeding(s)",
        analysis.cries_last_24h, analysis.feedings_last_24h
    )
}

fn write_behavior<W: Write>(writer: &mut W, insights: &[BehaviorInsight]) -> io::Result<()> {
    writeln!(writer, "BEHAVIOR (last 7 days)")?;
    writeln!(writer, "──────────────────────")?;
    if insights.is_empty() {
        writeln!(writer, "Nothing unusual this week.")?;
    }
    for insight in insights {
        writeln!(
            writer,
            "{} {}: {}",
            severity_tag(insight.severity),
            insight.title,
            insight.description
        )?;
    }
    Ok(())
}

fn write_action_plan<W: Write>(writer: &mut W, plan: &[PremiumRecommendation]) -> io::Result<()> {
    writeln!(writer, "ACTION PLAN")?;
    writeln!(writer, "───────────")?;
    for rec in plan {
        writeln!(writer, "[{}] {}", rec.priority.as_str(), rec.title)?;
        writeln!(writer, "    {}", rec.description)?;
        writeln!(writer, "    Expected: {}", rec.impact)?;
    }
    Ok(())
}

fn write_sleep_trend<W: Write>(writer: &mut W, days: &[SleepTrendDay]) -> io::Result<()> {
    writeln!(writer, "SLEEP TREND (last 30 days)")?;
    writeln!(writer, "──────────────────────────")?;
    if days.is_empty() {
        writeln!(writer, "No events in the last 30 days.")?;
    }
    for day in days {
        writeln!(
            writer,
            "{}  {:>5.1}h  {} session(s)  {} night waking(s)  quality {}",
            day.day, day.total_hours, day.session_count, day.night_wakings, day.quality
        )?;
    }
    Ok(())
}

/// Writes insights for the events visible under `plan`.
pub fn write_insights<W: Write>(
    writer: &mut W,
    events: &[Event],
    plan: Plan,
    now: DateTime<FixedOffset>,
) -> io::Result<()> {
    let analysis = analyze_sleep_pattern(events, now);
    write_analysis(writer, &analysis)?;

    writeln!(writer)?;
    writeln!(writer, "RECOMMENDATIONS")?;
    writeln!(writer, "───────────────")?;
    for (i, rec) in recommendations_for(&analysis).iter().enumerate() {
        writeln!(writer, "{}. {rec}", i + 1)?;
    }

    writeln!(writer)?;
    if plan.features().analytics {
        write_behavior(writer, &behavior_insights(events, now))?;
        writeln!(writer)?;
        write_action_plan(writer, &premium_recommendations(events, now))?;
        writeln!(writer)?;
        write_sleep_trend(writer, &sleep_trends(events, now))?;
    } else {
        writeln!(
            writer,
            "Behavior insights, the action plan and the 30-day sleep trend are available on the premium plan."
        )?;
    }
    Ok(())
}

pub fn run<W: Write>(writer: &mut W, config: &Config, clock: &dyn Clock) -> Result<()> {
    let now = clock.now();
    let subject = config.subject_id()?;
    let plan = config.subscription().effective_plan(now);
    let db = open_database(config)?;

    let events = db.list_events(&subject, None)?;
    let events: Vec<Event> = visible_history(&events, plan, now).into_iter().cloned().collect();

    write_insights(writer, &events, plan, now)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bf_core::EventType;
    use chrono::Duration;
    use insta::assert_snapshot;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn render(events: &[Event], plan: Plan, now: DateTime<FixedOffset>) -> String {
        let mut output = Vec::new();
        write_insights(&mut output, events, plan, now).unwrap();
        String::from_utf8(output).unwrap()
    }

    #[test]
    fn free_plan_without_history() {
        let now = at("2025-03-08T12:00:00Z");
        assert_snapshot!(render(&[], Plan::Free, now), @r"
        SLEEP ANALYSIS (last 7 days)
        ────────────────────────────
        Total sleep:       0m
        Daily average:     0m (needs improvement)
        Sessions per day:  0.0
        Average session:   0m
        Last 24h:          0 crying episode(s), 0 feeding(s)

        RECOMMENDATIONS
        ───────────────
        1. Try to establish a more consistent sleep routine.
        2. Create a calm, dark environment for naps.
        3. Consider adding more naps during the day.
        4. Very short naps can point to discomfort or an unsuitable sleep environment.
        5. Make sure the baby is feeding often enough.

        Behavior insights, the action plan and the 30-day sleep trend are available on the premium plan.
        ");
    }

    #[test]
    fn premium_plan_adds_behavior_and_trend() {
        let now = at("2025-03-08T12:00:00Z");
        let events = vec![
            Event::new(EventType::Slept, at("2025-03-06T23:00:00Z")),
            Event::new(EventType::Woke, at("2025-03-07T05:00:00Z")),
            Event::new(EventType::Fed, now - Duration::hours(1)),
        ];
        let output = render(&events, Plan::Premium, now);

        assert!(output.contains("Total sleep:       6h 0m"));
        assert!(output.contains("[info] Few sleep records:"));
        assert!(output.contains("2025-03-06    6.0h  1 session(s)  1 night waking(s)  quality 10"));
        assert!(output.contains("2025-03-08    0.0h  0 session(s)  0 night waking(s)  quality 20"));
        assert!(output.contains("[high] Feed more often\n"));
        assert!(output.contains("[medium] Create transition rituals\n    Set up bedtime rituals"));
        assert!(!output.contains("premium plan"));
    }
}
