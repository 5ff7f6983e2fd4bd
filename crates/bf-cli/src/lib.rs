//! `BabyFlow` CLI library.
//!
//! This crate provides the `bf` command-line interface over the care log.

mod cli;
pub mod commands;
mod config;

pub use cli::{Cli, Commands};
pub use config::Config;
