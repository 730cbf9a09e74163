//! Reminder orchestration
//!
//! Creation: parsed intent -> local store (must succeed) -> remote mirror
//! (best effort). Evaluation: active jobs -> workout context -> trigger
//! decision -> persisted counters.

use chrono::{DateTime, Utc};
use serde::Serialize;
use uuid::Uuid;

use crate::config::Config;
use crate::context::{render_summary, ContextBuilder, WorkoutContext, MISSED_WORKOUT_HOURS};
use crate::models::{ReminderIntent, ReminderJob, SessionFact, TriggerType};
use crate::notion::{NotionClient, NotionError};
use crate::store::{JobStore, LocalJobStore, NotionJobStore, StoreError};

const DEFAULT_DAYS_BEFORE_DELOAD: u64 = 3;

#[derive(Debug, thiserror::Error)]
pub enum SchedulerError {
  #[error(transparent)]
  Store(#[from] StoreError),

  #[error(transparent)]
  Notion(#[from] NotionError),
}

/// Why a job fired and what to tell the user
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggerResult {
  pub reason: String,
  pub message: String,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TriggeredJob {
  pub job_id: String,
  pub user_id: String,
  pub reason: String,
  pub message: String,
}

/// Read side of the workouts database
#[derive(Debug, Clone)]
pub struct WorkoutLog {
  client: NotionClient,
  database_id: String,
}

impl WorkoutLog {
  pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
    Self {
      client,
      database_id: database_id.into(),
    }
  }

  pub async fn last_session(&self) -> Result<Option<SessionFact>, NotionError> {
    self.client.get_last_session(&self.database_id).await
  }

  pub async fn recent_sessions(&self, days: i64) -> Result<Vec<SessionFact>, NotionError> {
    self.client.recent_sessions(&self.database_id, days).await
  }
}

pub struct Scheduler {
  local: LocalJobStore,
  remote: Option<NotionJobStore>,
  workouts: Option<WorkoutLog>,
  context: ContextBuilder,
}

/// 8 hex chars from a random v4 uuid
fn new_job_id() -> String {
  Uuid::new_v4().simple().to_string().chars().take(8).collect()
}

impl Scheduler {
  /// Wire the stores from configuration. Remote features are enabled only
  /// when both the token and the matching database id are present.
  pub fn new(config: &Config) -> Result<Self, SchedulerError> {
    let client = if config.has_notion_token() {
      Some(NotionClient::new(config.notion.clone())?)
    } else {
      if config.reminders_db.is_some() || config.workouts_db.is_some() {
        tracing::warn!("Notion database configured without NOTION_TOKEN; running local-only");
      }
      None
    };

    let remote = match (&client, &config.reminders_db) {
      (Some(client), Some(db)) => Some(NotionJobStore::new(client.clone(), db.clone())),
      _ => None,
    };
    let workouts = match (&client, &config.workouts_db) {
      (Some(client), Some(db)) => Some(WorkoutLog::new(client.clone(), db.clone())),
      _ => None,
    };

    Ok(Self {
      local: LocalJobStore::new(&config.data_dir),
      remote,
      workouts,
      context: ContextBuilder::calendar(config.program_start),
    })
  }

  /// Local-only scheduler, mostly for tests
  pub fn with_local(local: LocalJobStore, context: ContextBuilder) -> Self {
    Self {
      local,
      remote: None,
      workouts: None,
      context,
    }
  }

  pub fn with_remote(mut self, remote: NotionJobStore) -> Self {
    self.remote = Some(remote);
    self
  }

  pub fn with_workouts(mut self, workouts: WorkoutLog) -> Self {
    self.workouts = Some(workouts);
    self
  }

  pub fn local_store(&self) -> &LocalJobStore {
    &self.local
  }

  pub fn workouts(&self) -> Option<&WorkoutLog> {
    self.workouts.as_ref()
  }

  pub fn context_builder(&self) -> &ContextBuilder {
    &self.context
  }

  // -------------------------------------------------------------------------
  // Creation
  // -------------------------------------------------------------------------

  pub async fn create_job(&self, user_id: &str, intent: ReminderIntent) -> Result<ReminderJob, SchedulerError> {
    let mut job = ReminderJob::new(new_job_id(), user_id, intent, Utc::now());
    self.local.save(&mut job).await?;
    tracing::info!(job = %job.id, user = %job.user_id, kind = %job.intent.trigger_type, "reminder created");

    if let Some(remote) = &self.remote {
      match remote.save(&mut job).await {
        Ok(()) => {
          // keep the back-reference locally
          self.local.save(&mut job).await?;
        }
        Err(e) => tracing::warn!(job = %job.id, "could not save reminder to Notion: {}", e),
      }
    }

    Ok(job)
  }

  // -------------------------------------------------------------------------
  // Evaluation
  // -------------------------------------------------------------------------

  /// Best available last session; remote failures count as "no data"
  pub async fn last_session(&self) -> Option<SessionFact> {
    let workouts = self.workouts.as_ref()?;
    match workouts.last_session().await {
      Ok(session) => session,
      Err(e) => {
        tracing::warn!("could not read last session from Notion: {}", e);
        None
      }
    }
  }

  /// Decide whether `job` fires under `ctx`. `last_checked` is always
  /// stamped and the job persisted; only the no-training branch counts
  /// triggers.
  pub async fn evaluate(
    &self,
    job: &mut ReminderJob,
    ctx: &WorkoutContext,
    now: DateTime<Utc>,
  ) -> Result<Option<TriggerResult>, SchedulerError> {
    job.last_checked = Some(now);
    let count_before = job.trigger_count;

    let result = match job.intent.trigger_type {
      TriggerType::Conditional => match job.intent.trigger_str("condition") {
        Some("no_training") => {
          let threshold = job
            .intent
            .trigger_data
            .get("hours")
            .and_then(serde_json::Value::as_f64)
            .unwrap_or(MISSED_WORKOUT_HOURS);

          match ctx.hours_since_last {
            Some(hours) if hours > threshold => {
              job.trigger_count += 1;
              Some(TriggerResult {
                reason: format!("No training for {:.0}h", hours),
                message: render_summary(ctx),
              })
            }
            _ => None,
          }
        }
        _ => None,
      },
      TriggerType::EventBased => match job.intent.trigger_str("event") {
        Some("deload") => {
          let days_before = job
            .intent
            .trigger_u64("days_before")
            .unwrap_or(DEFAULT_DAYS_BEFORE_DELOAD);

          if u64::from(ctx.days_until_deload) <= days_before {
            Some(TriggerResult {
              reason: format!("Deload in {} days", ctx.days_until_deload),
              message: render_summary(ctx),
            })
          } else {
            None
          }
        }
        _ => None,
      },
      TriggerType::TimeBased | TriggerType::Recurring => None,
    };

    let counted = job.trigger_count != count_before;
    self.persist(job, counted).await?;
    Ok(result)
  }

  async fn persist(&self, job: &ReminderJob, counted: bool) -> Result<(), SchedulerError> {
    self.local.record_evaluation(job)?;

    if let (Some(remote), Some(page_id), Some(checked)) = (&self.remote, job.remote_id.as_deref(), job.last_checked) {
      if let Err(e) = remote.record_check(page_id, checked, counted).await {
        tracing::warn!(job = %job.id, "could not update reminder in Notion: {}", e);
      }
    }
    Ok(())
  }

  async fn active_jobs(&self) -> Result<Vec<ReminderJob>, SchedulerError> {
    if let Some(remote) = &self.remote {
      match remote.list_active().await {
        Ok(jobs) if !jobs.is_empty() => return Ok(jobs),
        Ok(_) => tracing::debug!("no active reminders in Notion; using local store"),
        Err(e) => tracing::warn!("could not list reminders from Notion, using local store: {}", e),
      }
    }
    Ok(self.local.list_active().await?)
  }

  /// Evaluate every active job once, in store order
  pub async fn run_checks(&self) -> Result<Vec<TriggeredJob>, SchedulerError> {
    self.run_checks_at(Utc::now()).await
  }

  pub async fn run_checks_at(&self, now: DateTime<Utc>) -> Result<Vec<TriggeredJob>, SchedulerError> {
    let jobs = self.active_jobs().await?;
    if jobs.is_empty() {
      return Ok(Vec::new());
    }

    let last_session = self.last_session().await;
    let mut triggered = Vec::new();

    for mut job in jobs {
      let ctx = self.context.build_at(now, last_session.clone());
      if let Some(result) = self.evaluate(&mut job, &ctx, now).await? {
        tracing::info!(job = %job.id, reason = %result.reason, "reminder triggered");
        triggered.push(TriggeredJob {
          job_id: job.id,
          user_id: job.user_id,
          reason: result.reason,
          message: result.message,
        });
      }
    }

    tracing::info!(triggered = triggered.len(), "checks complete");
    Ok(triggered)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::context::FixedSessions;
  use crate::models::JobStatus;
  use crate::parser::parse;
  use crate::test_utils::{client_with, mock_client, mock_job, mock_session, reminder_page, silent_server, temp_store};
  use chrono::Duration;
  use mockito::Matcher;
  use serde_json::json;

  fn scheduler(store: LocalJobStore, sessions: u32) -> Scheduler {
    Scheduler::with_local(store, ContextBuilder::new(Box::new(FixedSessions(sessions))))
  }

  fn ctx_with_hours(sessions: u32, hours: Option<f64>) -> (DateTime<Utc>, WorkoutContext) {
    let now = Utc::now();
    let last = hours.map(|h| mock_session(now - Duration::milliseconds((h * 3_600_000.0) as i64)));
    let ctx = ContextBuilder::new(Box::new(FixedSessions(sessions))).build_at(now, last);
    (now, ctx)
  }

  #[tokio::test]
  async fn test_create_job_persists_locally() {
    let (_dir, store) = temp_store();
    let scheduler = scheduler(store, 0);

    let job = scheduler
      .create_job("juan", parse("avísame si no entreno en 48h"))
      .await
      .unwrap();

    assert_eq!(job.id.len(), 8);
    assert!(job.id.chars().all(|c| c.is_ascii_hexdigit()));
    assert_eq!(job.status, JobStatus::Active);
    assert!(job.remote_id.is_none());

    let stored = scheduler.local_store().get(&job.id).await.unwrap().unwrap();
    assert_eq!(stored, job);
  }

  #[tokio::test]
  async fn test_create_job_survives_remote_failure() {
    let (_dir, store) = temp_store();
    let mut server = mockito::Server::new_async().await;
    let _mock = server.mock("POST", "/pages").with_status(401).create_async().await;

    let scheduler = scheduler(store, 0).with_remote(NotionJobStore::new(mock_client(&server.url()), "rem-db"));
    let job = scheduler.create_job("juan", parse("estirar")).await.unwrap();

    assert!(job.remote_id.is_none());
    assert!(scheduler.local_store().get(&job.id).await.unwrap().is_some());
  }

  #[tokio::test]
  async fn test_create_job_stores_remote_id() {
    let (_dir, store) = temp_store();
    let mut server = mockito::Server::new_async().await;
    let _mock = server
      .mock("POST", "/pages")
      .with_body(r#"{"id": "page-77"}"#)
      .create_async()
      .await;

    let scheduler = scheduler(store, 0).with_remote(NotionJobStore::new(mock_client(&server.url()), "rem-db"));
    let job = scheduler.create_job("juan", parse("estirar")).await.unwrap();

    let stored = scheduler.local_store().get(&job.id).await.unwrap().unwrap();
    assert_eq!(stored.remote_id.as_deref(), Some("page-77"));
  }

  #[tokio::test]
  async fn test_no_training_triggers_and_counts() {
    let (_dir, store) = temp_store();
    let scheduler = scheduler(store, 0);
    let mut job = mock_job("a1b2c3d4", "juan", "avísame si no entreno en 24h");
    let (now, ctx) = ctx_with_hours(0, Some(30.0));

    let result = scheduler.evaluate(&mut job, &ctx, now).await.unwrap().unwrap();

    assert_eq!(job.trigger_count, 1);
    assert_eq!(job.last_checked, Some(now));
    assert_eq!(result.reason, "No training for 30h");
    assert!(!result.message.is_empty());

    let stored = scheduler.local_store().get("a1b2c3d4").await.unwrap().unwrap();
    assert_eq!(stored.trigger_count, 1);
  }

  #[tokio::test]
  async fn test_threshold_is_strict() {
    let (_dir, store) = temp_store();
    let scheduler = scheduler(store, 0);
    let mut job = mock_job("a1b2c3d4", "juan", "avísame si no entreno en 48h");

    let (now, ctx) = ctx_with_hours(0, Some(48.0));
    assert!(scheduler.evaluate(&mut job, &ctx, now).await.unwrap().is_none());
    assert_eq!(job.trigger_count, 0);

    let (now, ctx) = ctx_with_hours(0, Some(48.1));
    assert!(scheduler.evaluate(&mut job, &ctx, now).await.unwrap().is_some());
    assert_eq!(job.trigger_count, 1);
  }

  #[tokio::test]
  async fn test_no_data_is_no_decision() {
    let (_dir, store) = temp_store();
    let scheduler = scheduler(store, 0);
    let mut job = mock_job("a1b2c3d4", "juan", "avísame si no entreno en 24h");
    let (now, ctx) = ctx_with_hours(0, None);

    assert!(scheduler.evaluate(&mut job, &ctx, now).await.unwrap().is_none());
    assert_eq!(job.trigger_count, 0);
    assert_eq!(job.last_checked, Some(now));
  }

  #[tokio::test]
  async fn test_no_data_still_stamps_remote_check() {
    let (_dir, store) = temp_store();
    let mut server = mockito::Server::new_async().await;
    let now = Utc::now();
    // exact body: Último Check only, Contador untouched
    let patch = server
      .mock("PATCH", "/pages/page-1")
      .match_body(Matcher::Json(json!({
        "properties": { "Último Check": { "date": { "start": now.to_rfc3339() } } },
      })))
      .with_body(r#"{"id": "page-1"}"#)
      .create_async()
      .await;
    let get = server.mock("GET", "/pages/page-1").expect(0).create_async().await;

    let scheduler = scheduler(store, 0).with_remote(NotionJobStore::new(mock_client(&server.url()), "rem-db"));
    let mut job = mock_job("a1b2c3d4", "juan", "avísame si no entreno en 24h");
    job.remote_id = Some("page-1".to_string());
    let ctx = ContextBuilder::new(Box::new(FixedSessions(0))).build_at(now, None);

    assert!(scheduler.evaluate(&mut job, &ctx, now).await.unwrap().is_none());

    patch.assert_async().await;
    get.assert_async().await;
    let stored = scheduler.local_store().get("a1b2c3d4").await.unwrap().unwrap();
    assert_eq!(stored.last_checked, Some(now));
    assert_eq!(stored.trigger_count, 0);
  }

  #[tokio::test]
  async fn test_deload_warning_boundary_is_inclusive() {
    let (_dir, store) = temp_store();
    let scheduler = scheduler(store, 0);
    let mut job = mock_job("a1b2c3d4", "juan", "avísame del deload 2 días antes");

    let (now, ctx) = ctx_with_hours(4 * 4, Some(10.0));
    assert_eq!(ctx.days_until_deload, 2);
    let result = scheduler.evaluate(&mut job, &ctx, now).await.unwrap().unwrap();

    assert_eq!(result.reason, "Deload in 2 days");
    assert_eq!(job.trigger_count, 0);
  }

  #[tokio::test]
  async fn test_deload_warning_does_not_count() {
    let (_dir, store) = temp_store();
    let scheduler = scheduler(store, 0);
    let mut job = mock_job("a1b2c3d4", "juan", "avísame del deload 3 días antes");

    // week 5 of the macro: 2 days until deload
    let (now, ctx) = ctx_with_hours(4 * 4, Some(10.0));
    let result = scheduler.evaluate(&mut job, &ctx, now).await.unwrap().unwrap();

    assert_eq!(result.reason, "Deload in 2 days");
    assert_eq!(job.trigger_count, 0);

    // week 1: 6 days away
    let (now, ctx) = ctx_with_hours(0, Some(10.0));
    assert!(scheduler.evaluate(&mut job, &ctx, now).await.unwrap().is_none());
  }

  #[tokio::test]
  async fn test_time_based_only_stamps_last_checked() {
    let (_dir, store) = temp_store();
    let scheduler = scheduler(store, 0);
    let mut job = mock_job("a1b2c3d4", "juan", "qué toca hoy");
    let (now, ctx) = ctx_with_hours(0, Some(100.0));

    assert!(scheduler.evaluate(&mut job, &ctx, now).await.unwrap().is_none());

    let stored = scheduler.local_store().get("a1b2c3d4").await.unwrap().unwrap();
    assert_eq!(stored.last_checked, Some(now));
    assert_eq!(stored.trigger_count, 0);
  }

  #[tokio::test]
  async fn test_run_checks_uses_local_when_remote_fails() {
    let (_dir, store) = temp_store();
    let mut server = mockito::Server::new_async().await;
    let _query = server
      .mock("POST", "/databases/rem-db/query")
      .with_status(502)
      .create_async()
      .await;
    let _workouts = server
      .mock("POST", "/databases/wk-db/query")
      .with_body(
        json!({
          "results": [crate::test_utils::workout_page(
            "Press Militar",
            &(Utc::now() - Duration::hours(72)).to_rfc3339(),
          )],
          "has_more": false,
        })
        .to_string(),
      )
      .create_async()
      .await;

    let client = mock_client(&server.url());
    let scheduler = scheduler(store, 0)
      .with_remote(NotionJobStore::new(client.clone(), "rem-db"))
      .with_workouts(WorkoutLog::new(client, "wk-db"));

    let mut fires = mock_job("00000001", "juan", "avísame si no entreno en 48h");
    let mut quiet = mock_job("00000002", "ana", "comprar creatina");
    scheduler.local_store().save(&mut fires).await.unwrap();
    scheduler.local_store().save(&mut quiet).await.unwrap();

    let triggered = scheduler.run_checks().await.unwrap();

    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].job_id, "00000001");
    assert_eq!(triggered[0].user_id, "juan");
    assert!(triggered[0].message.contains("sin entrenar"));
  }

  #[tokio::test]
  async fn test_run_checks_uses_local_when_remote_times_out() {
    let (_dir, store) = temp_store();
    let (_listener, url) = silent_server();
    let client = client_with(&url, std::time::Duration::ZERO, std::time::Duration::from_millis(200));

    let scheduler = Scheduler::with_local(store, ContextBuilder::new(Box::new(FixedSessions(4 * 4))))
      .with_remote(NotionJobStore::new(client, "rem-db"));
    let mut job = mock_job("00000003", "juan", "avísame del deload 3 días antes");
    scheduler.local_store().save(&mut job).await.unwrap();

    let triggered = scheduler.run_checks().await.unwrap();

    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].job_id, "00000003");
    let stored = scheduler.local_store().get("00000003").await.unwrap().unwrap();
    assert!(stored.last_checked.is_some());
  }

  #[tokio::test]
  async fn test_run_checks_prefers_remote_jobs() {
    let (_dir, store) = temp_store();
    let mut server = mockito::Server::new_async().await;
    let descriptor = serde_json::to_string(&crate::parser::to_cron_job(&parse("avísame del deload 3 días antes"))).unwrap();
    let _query = server
      .mock("POST", "/databases/rem-db/query")
      .with_body(
        json!({
          "results": [reminder_page("page-1", "avísame del deload 3 días antes", "evento", "activo", &descriptor, "juan", "j1")],
          "has_more": false,
        })
        .to_string(),
      )
      .create_async()
      .await;
    let patch = server
      .mock("PATCH", "/pages/page-1")
      .with_body(r#"{"id": "page-1"}"#)
      .create_async()
      .await;

    let scheduler = Scheduler::with_local(store, ContextBuilder::new(Box::new(FixedSessions(5 * 4))))
      .with_remote(NotionJobStore::new(mock_client(&server.url()), "rem-db"));

    // a local-only job that must not be evaluated while the remote has jobs
    let mut local_only = mock_job("00000009", "juan", "avísame del deload 3 días antes");
    scheduler.local_store().save(&mut local_only).await.unwrap();

    let triggered = scheduler.run_checks().await.unwrap();

    assert_eq!(triggered.len(), 1);
    assert_eq!(triggered[0].job_id, "j1");
    assert_eq!(triggered[0].reason, "Deload in 1 days");
    patch.assert_async().await;

    let rebuilt = scheduler.local_store().get("j1").await.unwrap().unwrap();
    assert_eq!(rebuilt.remote_id.as_deref(), Some("page-1"));
    let untouched = scheduler.local_store().get("00000009").await.unwrap().unwrap();
    assert!(untouched.last_checked.is_none());
  }

  #[tokio::test]
  async fn test_run_checks_empty_store() {
    let (_dir, store) = temp_store();
    assert!(scheduler(store, 0).run_checks().await.unwrap().is_empty());
  }
}
