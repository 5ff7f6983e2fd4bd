//! Events command for dumping stored events.
//!
//! Outputs events from the local database as JSONL, oldest first. The free
//! plan only exposes the last 7 days of history.

use std::io::Write;

use anyhow::Result;
use bf_core::plan::visible_history;
use bf_core::{Clock, EventStore};
use chrono::{DateTime, FixedOffset};
use clap::Args;

use super::open_database;
use super::util::parse_at;
use crate::Config;

#[derive(Debug, Args)]
pub struct EventsArgs {
    /// Only events at or after this time.
    #[arg(long)]
    pub after: Option<String>,

    /// Only events at or before this time.
    #[arg(long)]
    pub before: Option<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &EventsArgs, config: &Config, clock: &dyn Clock) -> Result<()> {
    let now = clock.now();
    let after = args.after.as_deref().map(|s| parse_at(s, now)).transpose()?;
    let before = args.before.as_deref().map(|s| parse_at(s, now)).transpose()?;

    let subject = config.subject_id()?;
    let plan = config.subscription().effective_plan(now);
    let db = open_database(config)?;
    let events = db.list_events(&subject, None)?;

    let in_bounds = |ts: DateTime<FixedOffset>| {
        after.is_none_or(|a| ts >= a) && before.is_none_or(|b| ts <= b)
    };
    for event in visible_history(&events, plan, now)
        .into_iter()
        .filter(|e| in_bounds(e.timestamp))
    {
        let json = serde_json::to_string(event)?;
        writeln!(writer, "{json}")?;
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bf_core::{Event, EventType, FixedClock, Plan};
    use insta::assert_snapshot;

    use crate::commands::{open_database, test_config};

    fn at(s: &str) -> DateTime<FixedOffset> {
        DateTime::parse_from_rfc3339(s).unwrap()
    }

    fn seed(config: &Config) {
        let mut db = open_database(config).unwrap();
        let subject = config.subject_id().unwrap();
        for (id, kind, ts) in [
            ("old", "fed", "2025-02-20T08:00:00-03:00"),
            ("a", "slept", "2025-03-07T21:00:00-03:00"),
            ("b", "woke", "2025-03-08T05:30:00-03:00"),
        ] {
            let mut event = Event::new(EventType::Fed, at(ts));
            event.id = bf_core::EventId::new(id).unwrap();
            event.kind = kind.into();
            db.append_event(&subject, event).unwrap();
        }
    }

    #[test]
    fn free_plan_dumps_last_week_as_jsonl() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Free);
        seed(&config);

        let mut output = Vec::new();
        let args = EventsArgs {
            after: None,
            before: None,
        };
        run(&mut output, &args, &config, &FixedClock(at("2025-03-08T12:00:00-03:00"))).unwrap();
        assert_snapshot!(String::from_utf8(output).unwrap(), @r#"
        {"id":"a","kind":"slept","timestamp":"2025-03-07T21:00:00-03:00"}
        {"id":"b","kind":"woke","timestamp":"2025-03-08T05:30:00-03:00"}
        "#);
    }

    #[test]
    fn premium_plan_sees_everything_within_bounds() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Premium);
        seed(&config);

        let clock = FixedClock(at("2025-03-08T12:00:00-03:00"));
        let mut output = Vec::new();
        let args = EventsArgs {
            after: None,
            before: None,
        };
        run(&mut output, &args, &config, &clock).unwrap();
        assert_eq!(String::from_utf8(output).unwrap().lines().count(), 3);

        let mut output = Vec::new();
        let args = EventsArgs {
            after: Some("2025-03-08T00:00:00-03:00".to_string()),
            before: None,
        };
        run(&mut output, &args, &config, &clock).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert_eq!(output.lines().count(), 1);
        assert!(output.contains(r#""id":"b""#));
    }
}
