//! CLI Module
//!
//! Command-line interface for milestone plans.

pub mod commands;

use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Parser, Subcommand};

use crate::config::CONFIG_ENV_VAR;
use crate::payment::PaymentStage;
use crate::progress::WeightPolicy;

/// Milestone - project plan progress and schedule reports
#[derive(Parser, Debug)]
#[command(name = "milestone")]
#[command(version, about, long_about = None)]
pub struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Settings file (JSON)
    #[arg(short, long, global = true, env = CONFIG_ENV_VAR)]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print a plan's completion percentage
    #[command(name = "completion")]
    Completion {
        /// Path to the plan file
        plan: PathBuf,

        /// Negative weight handling (defaults to the settings file)
        #[arg(long, value_enum)]
        policy: Option<WeightPolicy>,
    },

    /// Show completion per section
    #[command(name = "breakdown")]
    Breakdown {
        /// Path to the plan file
        plan: PathBuf,
    },

    /// Mark a task line done (or not done)
    #[command(name = "done")]
    Done {
        /// Path to the plan file
        plan: PathBuf,

        /// Sequence of the task line
        sequence: i64,

        /// Clear the done flag instead of setting it
        #[arg(long)]
        undo: bool,
    },

    /// Import sheet rows into a plan
    #[command(name = "import")]
    Import {
        /// Sheet file (JSON array of rows)
        sheet: PathBuf,

        /// Plan file to create or append to
        #[arg(short, long)]
        output: PathBuf,

        /// Project name for a new plan (defaults to the sheet file name)
        #[arg(short, long)]
        name: Option<String>,
    },

    /// Export a plan as sheet rows
    #[command(name = "export")]
    Export {
        /// Path to the plan file
        plan: PathBuf,

        /// Sheet file to write
        #[arg(short, long)]
        output: PathBuf,
    },

    /// Tag tasks with their milestone and list milestones
    #[command(name = "milestones")]
    Milestones {
        /// Path to the plan file
        plan: PathBuf,
    },

    /// Planned and actual working days per task
    #[command(name = "durations")]
    Durations {
        /// Path to the plan file
        plan: PathBuf,
    },

    /// Planned vs actual report over a directory of plans
    #[command(name = "report")]
    Report {
        /// Directory containing plan files
        dir: PathBuf,

        /// Only projects with a planned date on/after this date
        #[arg(long)]
        from: Option<NaiveDate>,

        /// Only projects with a planned date on/before this date
        #[arg(long)]
        to: Option<NaiveDate>,

        /// Reference date (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// List deadline reminders due for a directory of plans
    #[command(name = "reminders")]
    Reminders {
        /// Directory containing plan files
        dir: PathBuf,

        /// Reference date (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// List payment notices due for a directory of plans
    #[command(name = "payments")]
    Payments {
        /// Directory containing plan files
        dir: PathBuf,

        /// Reference date (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Show or update a plan's payment milestones
    #[command(name = "payment")]
    Payment {
        /// Path to the plan file
        plan: PathBuf,

        #[command(subcommand)]
        action: PaymentAction,
    },

    /// Upgrade a plan file to the current schema
    #[command(name = "migrate")]
    Migrate {
        /// Path to the plan file
        plan: PathBuf,
    },
}

#[derive(Subcommand, Debug, Clone)]
pub enum PaymentAction {
    /// Print the payment milestones
    Status,

    /// Mark a payment milestone as paid
    Done {
        #[arg(value_enum)]
        stage: PaymentStage,
    },

    /// Postpone the next notice for a payment milestone
    Snooze {
        #[arg(value_enum)]
        stage: PaymentStage,

        /// Reference date (defaults to today)
        #[arg(long)]
        today: Option<NaiveDate>,
    },

    /// Clear done, snooze and notice flags
    Reset,
}
