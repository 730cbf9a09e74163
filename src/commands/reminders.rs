use crate::config::Config;
use crate::models::ReminderIntent;
use crate::parser::{self, to_cron_job};
use crate::scheduler::{Scheduler, TriggeredJob};

/// ---------------------------------------------------------------------------
/// Parse
/// ---------------------------------------------------------------------------

pub fn describe_intent(intent: &ReminderIntent) -> anyhow::Result<String> {
  let job = serde_json::to_string_pretty(&to_cron_job(intent))?;
  Ok(format!(
    "Texto: {}\nTrigger: {}\nDatos: {}\nAcción: {}\nContexto: {:?}\n\nJob:\n{}",
    intent.raw_text,
    intent.trigger_type,
    serde_json::Value::Object(intent.trigger_data.clone()),
    intent.action_type,
    intent.context_needed,
    job
  ))
}

pub fn parse(text: &str) -> anyhow::Result<()> {
  println!("{}", describe_intent(&parser::parse(text))?);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Create Reminder
/// ---------------------------------------------------------------------------

pub async fn recordar(config: &Config, text: &str, user: &str) -> anyhow::Result<()> {
  let intent = parser::parse(text);
  let scheduler = Scheduler::new(config)?;
  let job = scheduler.create_job(user, intent).await?;

  println!("Recordatorio creado: {}", job.id);
  println!("   Tipo: {}", job.intent.trigger_type);
  println!("   Estado: {}", job.status);
  if let Some(remote_id) = &job.remote_id {
    println!("   Notion: {}", remote_id);
  }
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Run Checks
/// ---------------------------------------------------------------------------

pub fn describe_triggered(triggered: &[TriggeredJob]) -> String {
  if triggered.is_empty() {
    return "No hay recordatorios pendientes".to_string();
  }

  let mut out = format!("{} recordatorio(s) disparado(s):\n", triggered.len());
  for t in triggered {
    out.push_str(&format!(
      "\nJob: {}\nUsuario: {}\nRazón: {}\nMensaje:\n{}\n{}\n",
      t.job_id,
      t.user_id,
      t.reason,
      t.message,
      "-".repeat(40)
    ));
  }
  out
}

pub async fn check(config: &Config) -> anyhow::Result<()> {
  let scheduler = Scheduler::new(config)?;
  let triggered = scheduler.run_checks().await?;
  println!("{}", describe_triggered(&triggered));
  Ok(())
}
