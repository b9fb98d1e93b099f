//! Milestone CLI
//!
//! Command-line interface for weighted project plan completion.

use anyhow::Context;
use clap::Parser;
use env_logger::Env;
use log::{debug, error};

use milestone::cli::{commands, Cli, Commands};
use milestone::config::Settings;
use milestone::report::ReportFilter;
use milestone::PlanError;

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(Env::default().default_filter_or(level)).init();

    debug!("Milestone v{}", env!("CARGO_PKG_VERSION"));

    let settings = Settings::load(cli.config.as_deref()).context("failed to load settings")?;

    match cli.command {
        Some(cmd) => {
            if let Err(err) = handle_command(cmd, &settings) {
                error!("[{}] {}", err.error_code(), err);
                if let Some(hint) = err.recovery_suggestion() {
                    eprintln!("hint: {}", hint);
                }
                std::process::exit(1);
            }
            Ok(())
        }
        None => {
            println!("Milestone v{}", env!("CARGO_PKG_VERSION"));
            println!("Use --help for available commands");
            Ok(())
        }
    }
}

fn handle_command(cmd: Commands, settings: &Settings) -> Result<(), PlanError> {
    match cmd {
        Commands::Completion { plan, policy } => commands::completion(&plan, policy, settings),
        Commands::Breakdown { plan } => commands::breakdown(&plan, settings),
        Commands::Done {
            plan,
            sequence,
            undo,
        } => commands::done(&plan, sequence, undo, settings),
        Commands::Import {
            sheet,
            output,
            name,
        } => commands::import(&sheet, &output, name.as_deref(), settings),
        Commands::Export { plan, output } => commands::export(&plan, &output),
        Commands::Milestones { plan } => commands::milestones(&plan),
        Commands::Durations { plan } => commands::durations(&plan, settings),
        Commands::Report {
            dir,
            from,
            to,
            today,
        } => commands::report(&dir, ReportFilter { from, to }, today, settings),
        Commands::Reminders { dir, today } => commands::reminders(&dir, today, settings),
        Commands::Payments { dir, today } => commands::payments(&dir, today),
        Commands::Payment { plan, action } => commands::payment(&plan, action),
        Commands::Migrate { plan } => commands::migrate(&plan),
    }
}
