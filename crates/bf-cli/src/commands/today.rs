//! Today command for the current day's summary.

use std::io::Write;

use anyhow::Result;
use bf_core::{Clock, EventStore, TimeWindow, TodaySummary, today_summary};
use chrono::Duration;

use super::open_database;
use super::util::{format_minutes, start_of_day};
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, clock: &dyn Clock) -> Result<()> {
    let now = clock.now();
    let subject = config.subject_id()?;
    let db = open_database(config)?;

    let day_start = start_of_day(now)?;
    let window = TimeWindow::new(day_start, day_start + Duration::days(1));
    let events = db.list_events(&subject, Some(&window))?;

    let summary = today_summary(&events, now);
    write_summary(writer, &summary)
}

fn write_summary<W: Write>(writer: &mut W, summary: &TodaySummary) -> Result<()> {
    let stats = &summary.stats;
    writeln!(writer, "Today ({})", stats.day)?;
    writeln!(
        writer,
        "Sleep: {} across {} session(s), {} nap(s) started",
        format_minutes(stats.total_sleep_minutes),
        stats.session_count,
        stats.nap_count
    )?;
    writeln!(writer, "Feedings: {}", stats.feeding_count)?;
    writeln!(writer, "Diaper changes: {}", stats.diaper_count)?;
    writeln!(writer, "Crying episodes: {}", stats.cry_count)?;
    writeln!(writer, "Records: {}", stats.event_count)?;

    if !summary.latest.is_empty() {
        writeln!(writer, "Latest:")?;
        for (kind, ts) in &summary.latest {
            writeln!(writer, "- {kind}: {}", ts.format("%H:%M"))?;
        }
    }
    Ok(())
}
