//! Export command for the full event history.
//!
//! Writes every stored event as one pretty-printed JSON array. Only plans
//! with data export enabled may run it; `bf events` remains the
//! history-limited view.

use std::io::Write;

use anyhow::{Result, bail};
use bf_core::{Clock, EventStore};

use super::open_database;
use crate::Config;

pub fn run<W: Write>(writer: &mut W, config: &Config, clock: &dyn Clock) -> Result<()> {
    let plan = config.subscription().effective_plan(clock.now());
    if !plan.features().export_data {
        bail!("data export is not available on the {plan} plan; upgrade to premium to export");
    }

    let subject = config.subject_id()?;
    let db = open_database(config)?;
    let events = db.list_events(&subject, None)?;
    tracing::info!(count = events.len(), "exporting events");

    writeln!(writer, "{}", serde_json::to_string_pretty(&events)?)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    use bf_core::{Event, EventId, EventType, FixedClock, Plan};
    use chrono::DateTime;

    use crate::commands::test_config;

    fn seed(config: &Config) {
        let mut db = open_database(config).unwrap();
        let subject = config.subject_id().unwrap();
        for (id, ts) in [("old", "2024-01-10T08:00:00Z"), ("new", "2025-03-08T08:00:00Z")] {
            let mut event = Event::new(EventType::Fed, DateTime::parse_from_rfc3339(ts).unwrap());
            event.id = EventId::new(id).unwrap();
            db.append_event(&subject, event).unwrap();
        }
    }

    fn clock() -> FixedClock {
        FixedClock(DateTime::parse_from_rfc3339("2025-03-08T12:00:00Z").unwrap())
    }

    #[test]
    fn premium_exports_entire_history() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Premium);
        seed(&config);

        let mut output = Vec::new();
        run(&mut output, &config, &clock()).unwrap();
        let json: serde_json::Value = serde_json::from_slice(&output).unwrap();
        let ids: Vec<_> = json
            .as_array()
            .unwrap()
            .iter()
            .map(|e| e["id"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(ids, vec!["old", "new"]);
    }

    #[test]
    fn free_plan_cannot_export() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path(), Plan::Free);
        seed(&config);

        let mut output = Vec::new();
        let err = run(&mut output, &config, &clock()).unwrap_err();
        assert_eq!(
            err.to_string(),
            "data export is not available on the free plan; upgrade to premium to export"
        );
        assert!(output.is_empty());
    }
}
