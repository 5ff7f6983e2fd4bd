//! Status command for showing the database and the latest record.

use std::io::Write;

use anyhow::Result;
use bf_core::Clock;

use super::open_database;
use super::util::format_time;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, clock: &dyn Clock) -> Result<()> {
    let subject = config.subject_id()?;
    let db = open_database(config)?;
    let plan = config.subscription().effective_plan(clock.now());

    writeln!(writer, "BabyFlow status")?;
    writeln!(writer, "Database: {}", config.database_path.display())?;
    writeln!(writer, "Subject: {subject}")?;
    match config.premium_expires_at {
        Some(expiry) if config.plan != plan => {
            writeln!(writer, "Plan: {plan} ({} expired {})", config.plan, format_time(expiry))?;
        }
        _ => writeln!(writer, "Plan: {plan}")?,
    }

    let count = db.count_events(&subject)?;
    writeln!(writer, "Events: {count}")?;
    if let Some(event) = db.latest_event(&subject)? {
        writeln!(
            writer,
            "Last event: {} at {} ({})",
            event.kind,
            format_time(event.timestamp),
            event.id
        )?;
    } else {
        writeln!(writer, "No events recorded.")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bf_core::{Event, EventId, EventStore, EventType, FixedClock, Plan};
    use chrono::{DateTime, FixedOffset};
    use insta::assert_snapshot;

    use crate::commands::test_config;

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    #[test]
    fn status_shows_last_event() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Free);
        let subject = config.subject_id().unwrap();
        let mut db = open_database(&config).unwrap();

        let mut first = Event::new(EventType::Slept, at("2025-03-08T09:00:00-03:00"));
        first.id = EventId::new("event-a").unwrap();
        let mut second = Event::new(EventType::Woke, at("2025-03-08T10:30:00-03:00"));
        second.id = EventId::new("event-b").unwrap();
        db.append_event(&subject, second).unwrap();
        db.append_event(&subject, first).unwrap();

        let mut output = Vec::new();
        run(&mut output, &config, &FixedClock(at("2025-03-08T12:00:00-03:00"))).unwrap();
        let output = String::from_utf8(output).unwrap();
        let output = output.replace(&config.database_path.display().to_string(), "[TEMP]/babyflow.db");
        assert_snapshot!(output, @r"
        BabyFlow status
        Database: [TEMP]/babyflow.db
        Subject: default
        Plan: free
        Events: 2
        Last event: woke at 2025-03-08 10:30 (event-b)
        ");
    }

    #[test]
    fn expired_premium_reports_free() {
        let temp = tempfile::tempdir().unwrap();
        let mut config = test_config(temp.path(), Plan::Premium);
        config.premium_expires_at = Some(at("2025-03-01T00:00:00Z"));

        let mut output = Vec::new();
        run(&mut output, &config, &FixedClock(at("2025-03-08T12:00:00Z"))).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.contains("Plan: free (premium expired 2025-03-01 00:00)"));
        assert!(output.contains("No events recorded."));
    }
}
