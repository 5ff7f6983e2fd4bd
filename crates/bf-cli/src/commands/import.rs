//! Import command for loading events from JSONL.
//!
//! Each line is one event object with `id`, `type` (or `kind`), `timestamp`
//! and optional `notes`. Legacy type names are accepted. Every line is
//! validated before anything is written; events whose ID already exists are
//! skipped.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use bf_core::{Event, RawEvent};
use clap::Args;

use super::open_database;
use crate::Config;

#[derive(Debug, Args)]
pub struct ImportArgs {
    /// JSONL file to read, or "-" for stdin.
    pub path: PathBuf,
}

pub fn run<W: Write>(writer: &mut W, args: &ImportArgs, config: &Config) -> Result<()> {
    let reader: Box<dyn BufRead> = if args.path.as_os_str() == "-" {
        Box::new(BufReader::new(io::stdin()))
    } else {
        let file = File::open(&args.path)
            .with_context(|| format!("failed to open {}", args.path.display()))?;
        Box::new(BufReader::new(file))
    };
    let events = parse_events(reader)?;

    let subject = config.subject_id()?;
    let mut db = open_database(config)?;
    let inserted = db.import_events(&subject, &events)?;

    writeln!(
        writer,
        "Imported {inserted} events ({} duplicates skipped)",
        events.len() - inserted
    )?;
    Ok(())
}

fn parse_events<R: BufRead>(reader: R) -> Result<Vec<Event>> {
    let mut events = Vec::new();
    for (index, line) in reader.lines().enumerate() {
        let line_no = index + 1;
        let line = line.with_context(|| format!("failed to read line {line_no}"))?;
        if line.trim().is_empty() {
            continue;
        }
        let raw: RawEvent = serde_json::from_str(&line)
            .with_context(|| format!("line {line_no}: invalid JSON"))?;
        let event = Event::try_from(raw).with_context(|| format!("line {line_no}"))?;
        events.push(event);
    }
    Ok(events)
}
