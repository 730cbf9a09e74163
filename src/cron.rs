//! Host cron jobs
//!
//! The binary never schedules itself: an external cron runner invokes
//! `forzudo check` / `forzudo status`. These are the job definitions handed
//! to that runner, as JSON.

use serde::Serialize;
use std::fs;
use std::path::Path;

pub const DEFAULT_EXPORT_FILE: &str = "forzudo-cron-jobs.json";
const CHECK_INTERVAL_HOURS: u64 = 6;
const SUMMARY_HOUR: u32 = 7;
const SUMMARY_TZ: &str = "Europe/Madrid";
const DELOAD_DAYS_BEFORE: u32 = 3;
const JOB_TIMEOUT_SECONDS: u32 = 60;

const HOUR_MS: u64 = 60 * 60 * 1000;

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Schedule {
  #[serde(rename_all = "camelCase")]
  Every { every_ms: u64 },
  Cron { expr: String, tz: String },
}

impl std::fmt::Display for Schedule {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Schedule::Every { every_ms } => write!(f, "every {}h", every_ms / HOUR_MS),
      Schedule::Cron { expr, tz } => write!(f, "cron '{}' ({})", expr, tz),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Payload {
  pub kind: String,
  pub message: String,
  pub timeout_seconds: u32,
}

impl Payload {
  fn agent_turn(message: String) -> Self {
    Self {
      kind: "agentTurn".to_string(),
      message,
      timeout_seconds: JOB_TIMEOUT_SECONDS,
    }
  }
}

/// One job in the runner's format. `id` is ours and not exported.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct HostCronJob {
  #[serde(skip)]
  pub id: String,
  pub name: String,
  pub schedule: Schedule,
  pub payload: Payload,
  pub session_target: String,
  pub enabled: bool,
}

impl HostCronJob {
  fn new(id: &str, name: &str, schedule: Schedule, message: String) -> Self {
    Self {
      id: id.to_string(),
      name: name.to_string(),
      schedule,
      payload: Payload::agent_turn(message),
      session_target: "isolated".to_string(),
      enabled: true,
    }
  }
}

pub fn check_workouts_job(user_id: &str, interval_hours: u64) -> HostCronJob {
  HostCronJob::new(
    "check_workouts",
    "ForzudoOS - Check Workouts",
    Schedule::Every { every_ms: interval_hours * HOUR_MS },
    format!(
      "ForzudoOS Cron Job: Check Workouts\n\n\
       Ejecuta el check de recordatorios para el usuario {user_id}.\n\n\
       1. Ejecuta: forzudo check\n\
       2. Si hay recordatorios disparados, envía el mensaje al usuario.\n\
       3. Responde con el número de checks, los recordatorios disparados y el estado."
    ),
  )
}

pub fn daily_summary_job(user_id: &str, hour: u32, minute: u32) -> HostCronJob {
  HostCronJob::new(
    "daily_summary",
    "ForzudoOS - Daily Summary",
    Schedule::Cron {
      expr: format!("{} {} * * *", minute, hour),
      tz: SUMMARY_TZ.to_string(),
    },
    format!(
      "ForzudoOS Cron Job: Daily Summary\n\n\
       Envía el resumen diario al usuario {user_id}.\n\n\
       1. Obtén el estado: forzudo status\n\
       2. Envía un mensaje con el estado del ciclo 5/3/1, el próximo entreno con pesos y las alertas."
    ),
  )
}

pub fn deload_warning_job(user_id: &str, days_before: u32) -> HostCronJob {
  HostCronJob::new(
    "deload_warning",
    "ForzudoOS - Deload Warning",
    Schedule::Every { every_ms: 24 * HOUR_MS },
    format!(
      "ForzudoOS Cron Job: Deload Warning\n\n\
       Verifica si el usuario {user_id} está a {days_before} días o menos del deload.\n\n\
       1. Ejecuta: forzudo status\n\
       2. Si la semana del macro es >= {}, avisa: \"Deload en X días. Prepárate para la semana de recuperación.\"",
      7u32.saturating_sub(days_before)
    ),
  )
}

/// The three standard jobs, in registration order
pub fn standard_jobs(user_id: &str) -> Vec<HostCronJob> {
  vec![
    check_workouts_job(user_id, CHECK_INTERVAL_HOURS),
    daily_summary_job(user_id, SUMMARY_HOUR, 0),
    deload_warning_job(user_id, DELOAD_DAYS_BEFORE),
  ]
}

pub fn to_json(jobs: &[HostCronJob]) -> serde_json::Result<String> {
  serde_json::to_string_pretty(jobs)
}

pub fn export(jobs: &[HostCronJob], path: &Path) -> std::io::Result<()> {
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    fs::create_dir_all(dir)?;
  }
  fs::write(path, to_json(jobs)?)?;
  tracing::info!(path = %path.display(), jobs = jobs.len(), "cron jobs exported");
  Ok(())
}

pub fn render_list(jobs: &[HostCronJob]) -> String {
  let mut out = String::from("ForzudoOS - Cron Jobs\n");
  for job in jobs {
    out.push_str(&format!("\n{}\n   ID: {}\n   Schedule: {}\n", job.name, job.id, job.schedule));
  }
  out
}

/// Manual registration steps for the cron runner
pub fn registration_instructions(jobs: &[HostCronJob]) -> serde_json::Result<String> {
  let mut out = String::from("Jobs a crear:\n");
  for job in jobs {
    out.push_str(&format!("  - {} ({})\n", job.name, job.id));
  }
  out.push_str(&format!(
    "\nPara registrarlos todos a la vez:\n   forzudo cron export --output {0}\n   openclaw cron add --job \"$(cat {0})\"\n\nO uno a uno:\n",
    DEFAULT_EXPORT_FILE
  ));
  for job in jobs {
    out.push_str(&format!("\n   # {}\n   cron add '{}'\n", job.name, serde_json::to_string(job)?));
  }
  Ok(out)
}
