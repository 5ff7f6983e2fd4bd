//! Command-line argument definitions.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

use crate::commands::{
    ask::AskArgs, delete::DeleteArgs, events::EventsArgs, import::ImportArgs, log::LogArgs,
};

/// Infant care log.
///
/// Records sleep, feeding, crying and diaper events and turns them into daily
/// summaries, trends, recommendations and streaks.
#[derive(Debug, Parser)]
#[command(name = "bf", version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Path to config file.
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Record a care event.
    Log(LogArgs),

    /// Dump stored events as JSONL.
    Events(EventsArgs),

    /// Export the full history as a JSON array (premium).
    Export,

    /// Delete one event by ID.
    Delete(DeleteArgs),

    /// Import events from a JSONL file.
    Import(ImportArgs),

    /// Summarize today.
    Today,

    /// Show the 7-day dashboard.
    Report {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show sleep analysis, recommendations and behaviour insights.
    Insights,

    /// Ask the care assistant a question.
    Ask(AskArgs),

    /// Show streaks, level and achievements.
    Stats {
        /// Output as JSON.
        #[arg(long)]
        json: bool,
    },

    /// Show database and plan status.
    Status,
}
