//! Delete command for removing a single event.

use std::io::Write;

use anyhow::{Result, bail};
use bf_core::{EventId, EventStore};
use clap::Args;

use super::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct DeleteArgs {
    /// ID of the event to delete.
    pub id: String,
}

pub fn run<W: Write>(writer: &mut W, args: &DeleteArgs, config: &Config) -> Result<()> {
    let id = EventId::new(args.id.trim())?;
    let subject = config.subject_id()?;
    let mut db = open_database(config)?;

    if !db.delete_event(&subject, &id)? {
        bail!("event not found: {id}");
    }
    writeln!(writer, "Deleted event {id}")?;
    Ok(())
}
