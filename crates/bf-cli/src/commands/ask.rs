//! Ask command for the care assistant.

use std::io::Write;

use anyhow::{Result, bail};
use bf_core::plan::visible_history;
use bf_core::{Clock, Event, EventStore, respond_to_message};
use clap::Args;

use super::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct AskArgs {
    /// Question for the assistant, e.g. "why is the baby crying?"
    #[arg(required = true, num_args = 1..)]
    pub message: Vec<String>,
}

pub fn run<W: Write>(writer: &mut W, args: &AskArgs, config: &Config, clock: &dyn Clock) -> Result<()> {
    let message = args.message.join(" ");
    if message.trim().is_empty() {
        bail!("message must not be empty");
    }

    let now = clock.now();
    let subject = config.subject_id()?;
    let plan = config.subscription().effective_plan(now);
    let db = open_database(config)?;

    let events = db.list_events(&subject, None)?;
    let events: Vec<Event> = visible_history(&events, plan, now).into_iter().cloned().collect();

    writeln!(writer, "{}", respond_to_message(&message, &events, &[], now))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bf_core::{EventType, FixedClock, Plan};
    use chrono::DateTime;

    use crate::commands::test_config;

    #[test]
    fn answers_from_stored_events() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Free);
        let now = DateTime::parse_from_rfc3339("2025-03-08T12:00:00Z").unwrap();
        let subject = config.subject_id().unwrap();
        let mut db = open_database(&config).unwrap();
        for hours in [1, 4, 7] {
            db.append_event(&subject, Event::new(EventType::Fed, now - chrono::Duration::hours(hours)))
                .unwrap();
        }

        let args = AskArgs {
            message: vec!["is".into(), "she".into(), "hungry?".into()],
        };
        let mut output = Vec::new();
        run(&mut output, &args, &config, &FixedClock(now)).unwrap();
        let output = String::from_utf8(output).unwrap();
        assert!(output.starts_with("About feeding:\n\nLast 24 hours: 3 feedings"));
    }

    #[test]
    fn blank_message_is_rejected() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Free);
        let args = AskArgs {
            message: vec!["  ".into()],
        };
        let now = DateTime::parse_from_rfc3339("2025-03-08T12:00:00Z").unwrap();
        assert!(run(&mut Vec::new(), &args, &config, &FixedClock(now)).is_err());
    }
}
