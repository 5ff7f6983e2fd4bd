//! CLI subcommand implementations.

pub mod ask;
pub mod delete;
pub mod events;
pub mod export;
pub mod import;
pub mod insights;
pub mod log;
pub mod report;
pub mod stats;
pub mod status;
pub mod today;
pub mod util;

use anyhow::{Context, Result};
use bf_db::Database;

use crate::Config;

/// Opens the configured database, creating its parent directory if needed.
pub fn open_database(config: &Config) -> Result<Database> {
    if let Some(parent) = config.database_path.parent() {
        std::fs::create_dir_all(parent).context("failed to create database directory")?;
    }
    Database::open(&config.database_path)
        .with_context(|| format!("failed to open {}", config.database_path.display()))
}

#[cfg(test)]
pub(crate) fn test_config(dir: &std::path::Path, plan: bf_core::Plan) -> Config {
    Config {
        database_path: dir.join("babyflow.db"),
        subject: "default".to_string(),
        plan,
        premium_expires_at: None,
    }
}
