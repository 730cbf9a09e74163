pub mod cron;
pub mod reminders;
pub mod workouts;

use crate::cli::{Cli, Commands};
use crate::config::Config;

/// Dispatch a parsed command line. Output goes to stdout; errors propagate
/// to the binary, which reports them and exits non-zero.
pub async fn run(cli: Cli, config: Config) -> anyhow::Result<()> {
  match cli.command {
    Commands::Parse { text } => reminders::parse(&text),
    Commands::Recordar { text, user } => reminders::recordar(&config, &text, &user).await,
    Commands::Check => reminders::check(&config).await,
    Commands::Status => workouts::status(&config).await,
    Commands::Sync { data } => workouts::sync(&config, &data).await,
    Commands::Setup { parent_page } => workouts::setup(&config, parent_page).await,
    Commands::Dashboard { output } => workouts::dashboard(&config, &output).await,
    Commands::Cron { cron_command } => cron::run(cron_command),
  }
}
