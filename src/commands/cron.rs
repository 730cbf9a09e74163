use crate::cli::CronCommands;
use crate::cron::{self, standard_jobs};

const DEFAULT_USER: &str = "juan";

pub fn run(command: CronCommands) -> anyhow::Result<()> {
  let jobs = standard_jobs(DEFAULT_USER);

  match command {
    CronCommands::List => print!("{}", cron::render_list(&jobs)),
    CronCommands::Export { output } => {
      cron::export(&jobs, &output)?;
      println!("Jobs exportados a: {}", output.display());
      println!("   Total: {} jobs", jobs.len());
    }
    CronCommands::Register => print!("{}", cron::registration_instructions(&jobs)?),
  }
  Ok(())
}
