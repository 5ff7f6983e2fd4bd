use std::io::Write;

use anyhow::{Context, Result};
use bf_core::SystemClock;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use bf_cli::commands::{
    ask, delete, events, export, import, insights, log, report, stats, status, today,
};
use bf_cli::{Cli, Commands, Config};

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::from_default_env()
    };
    // try_init so repeated initialization (e.g. in tests) is not a panic
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let Some(command) = &cli.command else {
        use clap::CommandFactory;
        Cli::command().print_help()?;
        println!();
        return Ok(());
    };

    let config = Config::load_from(cli.config.as_deref()).context("failed to load configuration")?;
    tracing::debug!(?config, "loaded configuration");

    let clock = SystemClock;
    let stdout = std::io::stdout();
    let mut out = stdout.lock();

    match command {
        Commands::Log(args) => log::run(&mut out, args, &config, &clock)?,
        Commands::Events(args) => events::run(&mut out, args, &config, &clock)?,
        Commands::Export => export::run(&mut out, &config, &clock)?,
        Commands::Delete(args) => delete::run(&mut out, args, &config)?,
        Commands::Import(args) => import::run(&mut out, args, &config)?,
        Commands::Today => today::run(&mut out, &config, &clock)?,
        Commands::Report { json } => report::run(&mut out, *json, &config, &clock)?,
        Commands::Insights => insights::run(&mut out, &config, &clock)?,
        Commands::Ask(args) => ask::run(&mut out, args, &config, &clock)?,
        Commands::Stats { json } => stats::run(&mut out, *json, &config)?,
        Commands::Status => status::run(&mut out, &config, &clock)?,
    }

    out.flush()?;
    Ok(())
}
