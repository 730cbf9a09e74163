use clap::{Parser, Subcommand};
use std::path::PathBuf;

use crate::cron::DEFAULT_EXPORT_FILE;
use crate::dashboard::DEFAULT_OUTPUT;

/// ForzudoOS - context-aware training reminders
#[derive(Parser, Debug)]
#[command(name = "forzudo", version, about, long_about = None)]
pub struct Cli {
  #[command(subcommand)]
  pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
  /// Parse a reminder phrase and show the resulting intent
  Parse {
    /// Text to parse
    text: String,
  },

  /// Create a reminder
  Recordar {
    /// Reminder text
    text: String,

    /// User id
    #[arg(long, default_value = "juan")]
    user: String,
  },

  /// Show the current training status
  Status,

  /// Evaluate all active reminders
  Check,

  /// Add a workout (JSON payload) to the workouts database
  Sync {
    /// Workout JSON, e.g. '{"ejercicio": "Press Militar", "fecha": "2026-03-02"}'
    #[arg(long)]
    data: String,
  },

  /// Create the Notion databases under a parent page
  Setup {
    /// Parent page id (falls back to FORZUDO_PARENT_PAGE)
    #[arg(long)]
    parent_page: Option<String>,
  },

  /// Write the dashboard data snapshot
  Dashboard {
    #[arg(long, default_value = DEFAULT_OUTPUT)]
    output: PathBuf,
  },

  /// Host cron job definitions
  Cron {
    #[command(subcommand)]
    cron_command: CronCommands,
  },
}

#[derive(Subcommand, Debug)]
pub enum CronCommands {
  /// List the standard jobs
  List,

  /// Export the jobs as JSON
  Export {
    #[arg(long, default_value = DEFAULT_EXPORT_FILE)]
    output: PathBuf,
  },

  /// Print registration instructions
  Register,
}
