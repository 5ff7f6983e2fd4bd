//! Log command for recording a care event.

use std::io::Write;

use anyhow::{Context, Result, bail};
use bf_core::gamification::XP_PER_EVENT;
use bf_core::plan::can_add_event;
use bf_core::{
    Clock, Event, EventStore, EventType, Plan, StatsTracker, TimeWindow, TrackOutcome,
};
use chrono::Duration;
use clap::Args;

use super::open_database;
use super::util::{format_time, parse_at, start_of_day};
use crate::Config;

#[derive(Debug, Args)]
pub struct LogArgs {
    /// Event type (slept, woke, fed, cried, diaper_changed, vaccinated, note).
    pub event_type: String,

    /// When it happened: RFC 3339, HH:MM, or "N minutes|hours|days ago". Defaults to now.
    #[arg(long)]
    pub at: Option<String>,

    /// Free-text note.
    #[arg(long)]
    pub notes: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &LogArgs, config: &Config, clock: &dyn Clock) -> Result<()> {
    let now = clock.now();
    let event_type: EventType = args.event_type.parse().with_context(|| {
        let valid: Vec<_> = EventType::ALL.iter().map(EventType::as_str).collect();
        format!("expected one of: {}", valid.join(", "))
    })?;
    let timestamp = match &args.at {
        Some(at) => parse_at(at, now)?,
        None => now,
    };
    let subject = config.subject_id()?;
    let plan = config.subscription().effective_plan(now);

    let mut db = open_database(config)?;

    let day_start = start_of_day(timestamp)?;
    let same_day = TimeWindow::new(day_start, day_start + Duration::days(1));
    let logged_that_day = db
        .list_events(&subject, Some(&same_day))?
        .iter()
        .filter(|e| e.day() == timestamp.date_naive())
        .count();
    if !can_add_event(plan, logged_that_day) {
        bail!(
            "the {plan} plan allows {} events per day; upgrade to premium for unlimited logging",
            plan.features().max_daily_events.unwrap_or_default()
        );
    }

    let mut event = Event::new(event_type, timestamp);
    if let Some(notes) = args.notes.as_deref().filter(|n| !n.trim().is_empty()) {
        event = event.with_notes(notes);
    }
    let event = db.append_event(&subject, event)?;
    writeln!(
        writer,
        "Logged {} at {} ({})",
        event.kind,
        format_time(event.timestamp),
        event.id
    )?;

    // The event is already committed; a stats failure must not fail the log.
    let mut tracker = StatsTracker::new(db, clock);
    let tracked = tracker.track(&subject, &event.kind).and_then(|outcome| {
        let premium = if plan == Plan::Premium {
            Some(tracker.unlock_premium(&subject)?)
        } else {
            None
        };
        Ok((outcome, premium))
    });

    match tracked {
        Ok((outcome, premium)) => {
            write_outcome(writer, &outcome)?;
            if let Some(premium) = &premium {
                write_outcome(writer, premium)?;
            }
            writeln!(
                writer,
                "+{XP_PER_EVENT} XP · streak {} day(s)",
                outcome.stats.current_streak
            )?;
        }
        Err(err) => {
            tracing::warn!(%subject, error = %err, "event saved but stats were not updated");
            writeln!(writer, "Stats were not updated: {err}")?;
        }
    }

    Ok(())
}

fn write_outcome<W: Write>(writer: &mut W, outcome: &TrackOutcome) -> Result<()> {
    for id in &outcome.unlocked {
        writeln!(writer, "Achievement unlocked: {} - {}", id.title(), id.description())?;
    }
    if let Some(level) = outcome.level_up {
        writeln!(writer, "Level up! You reached level {level}")?;
    }
    Ok(())
}
