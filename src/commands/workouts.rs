use anyhow::{bail, Context};
use chrono::Utc;
use std::path::Path;

use crate::config::Config;
use crate::context::render_summary;
use crate::dashboard::{self, RECENT_DAYS};
use crate::models::NewWorkout;
use crate::notion::NotionClient;
use crate::scheduler::Scheduler;

/// ---------------------------------------------------------------------------
/// Status
/// ---------------------------------------------------------------------------

/// Rendered summary, from the remote last session when it can be read and
/// from the calendar estimate otherwise
pub async fn status(config: &Config) -> anyhow::Result<()> {
  let scheduler = Scheduler::new(config)?;

  let last = match scheduler.workouts() {
    Some(log) => match log.last_session().await {
      Ok(last) => last,
      Err(e) => {
        println!("No se pudo leer de Notion: {}", e);
        println!("Mostrando estado estimado:\n");
        None
      }
    },
    None => None,
  };

  let ctx = scheduler.context_builder().build(last);
  println!("{}", render_summary(&ctx));
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Sync Workout
/// ---------------------------------------------------------------------------

pub fn parse_workout(data: &str) -> anyhow::Result<NewWorkout> {
  serde_json::from_str(data).context("invalid workout JSON")
}

pub async fn sync(config: &Config, data: &str) -> anyhow::Result<()> {
  let Some(workouts_db) = config.workouts_db.as_deref() else {
    bail!("FORZUDO_WORKOUTS_DB is not set");
  };
  let workout = parse_workout(data)?;

  config.require_token()?;
  let client = NotionClient::new(config.notion.clone())?;
  let page_id = client.create_workout_entry(workouts_db, &workout).await?;

  println!("Entreno sincronizado: {}", page_id);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Setup
/// ---------------------------------------------------------------------------

const PARENT_PAGE_HELP: &str = "Para obtener el ID de una página:
1. Abre Notion en el navegador
2. Ve a la página donde quieras crear las bases de datos
3. La URL tiene este formato: https://notion.so/workspace/[PAGE_ID]
4. Copia el PAGE_ID (32 caracteres)";

pub async fn setup(config: &Config, parent_page: Option<String>) -> anyhow::Result<()> {
  let Some(parent) = parent_page.or_else(|| config.parent_page.clone()) else {
    println!("{}", PARENT_PAGE_HELP);
    bail!("--parent-page or FORZUDO_PARENT_PAGE is required");
  };

  config.require_token()?;
  let client = NotionClient::new(config.notion.clone())?;

  println!("Configurando ForzudoOS en Notion...");
  println!("   Página padre: {}", parent);

  let created = client.setup(&parent).await?;

  println!("\nSetup completado!");
  println!("\nAñade estas variables a tu .env:");
  println!("FORZUDO_REMINDERS_DB=\"{}\"", created.reminders_db);
  println!("FORZUDO_WORKOUTS_DB=\"{}\"", created.workouts_db);
  Ok(())
}

/// ---------------------------------------------------------------------------
/// Dashboard
/// ---------------------------------------------------------------------------

pub async fn dashboard(config: &Config, output: &Path) -> anyhow::Result<()> {
  let scheduler = Scheduler::new(config)?;

  let workouts = match scheduler.workouts() {
    Some(log) => log.recent_sessions(RECENT_DAYS).await.unwrap_or_else(|e| {
      tracing::warn!("could not load workouts from Notion: {}", e);
      Vec::new()
    }),
    None => Vec::new(),
  };

  let now = Utc::now();
  let ctx = scheduler.context_builder().build_at(now, workouts.first().cloned());
  let data = dashboard::build(now, &ctx, &workouts);
  dashboard::write(&data, output)?;

  println!("Datos generados: {}", output.display());
  println!("   Ciclo: {} (Macro {})", data.cycle.week_name, data.cycle.macro_num);
  println!("   Entrenos: {}", data.workouts.len());
  println!("   Alertas: {}", data.alerts.len());
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_parse_workout_rejects_garbage() {
    assert!(parse_workout("not json").is_err());
    assert!(parse_workout(r#"{"fecha": "2026-03-02"}"#).is_err());
    assert_eq!(
      parse_workout(r#"{"exercise": "Sentadilla Zercher", "date": "2026-03-05"}"#).unwrap().exercise,
      "Sentadilla Zercher"
    );
  }

  #[tokio::test]
  async fn test_sync_requires_workouts_db() {
    let config = Config::local("/tmp/forzudo-test");
    let err = sync(&config, r#"{"ejercicio": "x", "fecha": "2026-03-02"}"#).await.unwrap_err();
    assert!(err.to_string().contains("FORZUDO_WORKOUTS_DB"));
  }

  #[tokio::test]
  async fn test_setup_requires_parent_page() {
    let config = Config::local("/tmp/forzudo-test");
    assert!(setup(&config, None).await.is_err());
  }

  #[tokio::test]
  async fn test_setup_requires_token() {
    let config = Config::local("/tmp/forzudo-test");
    let err = setup(&config, Some("parent".into())).await.unwrap_err();
    assert!(err.to_string().contains("NOTION_TOKEN"));
  }

  #[tokio::test]
  async fn test_dashboard_local_only() {
    let dir = tempfile::tempdir().unwrap();
    let config = Config::local(dir.path());
    let output = dir.path().join("docs").join("data.json");

    dashboard(&config, &output).await.unwrap();
    assert!(output.exists());
  }
}
