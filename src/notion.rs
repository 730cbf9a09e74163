//! Notion API client
//!
//! Remote collaborator for the reminders and workouts databases. Every call
//! waits the configured rate-limit floor first and is bounded by a request
//! timeout; callers decide whether a failure is fatal.

use chrono::{DateTime, Duration, NaiveDate, Utc};
use reqwest::{Client, Method};
use serde_json::{json, Map, Value};
use url::Url;

use crate::config::NotionConfig;
use crate::models::{NewWorkout, SessionFact};
use crate::parser::CronDescriptor;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

const NOTION_VERSION: &str = "2022-06-28";
const PAGE_SIZE: u32 = 100;
/// Title property is capped to keep the Notion list view readable
pub const REMINDER_NAME_MAX_CHARS: usize = 50;
const LAST_SESSION_LOOKBACK_DAYS: i64 = 30;

// Reminders database properties
const P_NAME: &str = "Nombre";
const P_KIND: &str = "Tipo";
const P_STATUS: &str = "Estado";
const P_CONDITION: &str = "Condición";
const P_LAST_CHECK: &str = "Último Check";
const P_COUNTER: &str = "Contador";
const P_USER: &str = "User ID";
const P_JOB: &str = "Job ID";

// Workouts database properties
const P_EXERCISE: &str = "Ejercicio";
const P_DATE: &str = "Fecha";
const P_DAY: &str = "Día BBB";
const P_WEEK: &str = "Semana";
const P_TOP: &str = "Peso Top";
const P_REPS: &str = "Reps";
const P_VOLUME: &str = "Volumen";
const P_HEVY: &str = "Hevy ID";
const P_SYNCED: &str = "Sincronizado";

/// ---------------------------------------------------------------------------
/// Error Handling
/// ---------------------------------------------------------------------------

#[derive(Debug, thiserror::Error)]
pub enum NotionError {
  #[error("Missing configuration: {0}")]
  MissingConfig(String),

  #[error("HTTP request failed: {0}")]
  Request(#[from] reqwest::Error),

  #[error("Invalid API URL: {0}")]
  Url(#[from] url::ParseError),

  #[error("Notion API error {status}: {body}")]
  Api { status: u16, body: String },

  #[error("Unexpected response: {0}")]
  Parse(String),
}

/// ---------------------------------------------------------------------------
/// Records
/// ---------------------------------------------------------------------------

/// Reminder page as stored in the remote reminders database
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteReminder {
  pub id: String,
  pub name: String,
  pub kind: String,
  pub status: String,
  /// `None` when the stored JSON is missing or unreadable
  pub condition: Option<CronDescriptor>,
  pub last_checked: Option<DateTime<Utc>>,
  pub trigger_count: u32,
  pub user_id: String,
  pub job_id: String,
  pub created_time: Option<DateTime<Utc>>,
}

/// Fields for a new reminder page
#[derive(Debug, Clone)]
pub struct NewReminder<'a> {
  pub name: &'a str,
  pub kind: &'a str,
  pub condition: &'a CronDescriptor,
  pub user_id: &'a str,
  pub job_id: &'a str,
}

#[derive(Debug, Clone, Default)]
pub struct ReminderFilter<'a> {
  pub status: Option<&'a str>,
  pub user_id: Option<&'a str>,
  pub job_id: Option<&'a str>,
}

/// Partial update of a reminder page; `None` fields are left untouched
#[derive(Debug, Clone, Default)]
pub struct ReminderUpdate<'a> {
  pub status: Option<&'a str>,
  pub last_checked: Option<DateTime<Utc>>,
  pub trigger_count: Option<u32>,
}

/// Ids of the databases created by `setup`
#[derive(Debug, Clone)]
pub struct CreatedDatabases {
  pub reminders_db: String,
  pub workouts_db: String,
}

/// ---------------------------------------------------------------------------
/// Property Helpers
/// ---------------------------------------------------------------------------

fn prop<'a>(props: &'a Value, name: &str) -> &'a Value {
  &props[name]
}

fn first_plain_text(items: &Value) -> String {
  items
    .get(0)
    .and_then(|t| t.get("plain_text"))
    .and_then(Value::as_str)
    .unwrap_or_default()
    .to_string()
}

fn title(props: &Value, name: &str) -> String {
  first_plain_text(&prop(props, name)["title"])
}

fn rich_text(props: &Value, name: &str) -> String {
  first_plain_text(&prop(props, name)["rich_text"])
}

fn select(props: &Value, name: &str) -> String {
  prop(props, name)["select"]["name"]
    .as_str()
    .unwrap_or_default()
    .to_string()
}

fn number(props: &Value, name: &str) -> Option<f64> {
  prop(props, name)["number"].as_f64()
}

fn date(props: &Value, name: &str) -> Option<DateTime<Utc>> {
  prop(props, name)["date"]["start"].as_str().and_then(parse_notion_date)
}

/// Notion dates are either full RFC 3339 timestamps or bare `YYYY-MM-DD`
pub fn parse_notion_date(raw: &str) -> Option<DateTime<Utc>> {
  if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
    return Some(dt.with_timezone(&Utc));
  }
  NaiveDate::parse_from_str(raw, "%Y-%m-%d")
    .ok()
    .and_then(|d| d.and_hms_opt(0, 0, 0))
    .map(|naive| naive.and_utc())
}

fn text_value(content: &str) -> Value {
  json!([{ "text": { "content": content } }])
}

fn reminder_from_page(page: &Value) -> Result<RemoteReminder, NotionError> {
  let id = page["id"]
    .as_str()
    .ok_or_else(|| NotionError::Parse("page without id".into()))?
    .to_string();
  let props = &page["properties"];

  let condition = serde_json::from_str::<CronDescriptor>(&rich_text(props, P_CONDITION)).ok();

  Ok(RemoteReminder {
    id,
    name: title(props, P_NAME),
    kind: select(props, P_KIND),
    status: select(props, P_STATUS),
    condition,
    last_checked: date(props, P_LAST_CHECK),
    trigger_count: number(props, P_COUNTER).map_or(0, |n| n.max(0.0) as u32),
    user_id: rich_text(props, P_USER),
    job_id: rich_text(props, P_JOB),
    created_time: page["created_time"].as_str().and_then(parse_notion_date),
  })
}

fn session_from_page(page: &Value) -> Option<SessionFact> {
  let props = &page["properties"];
  Some(SessionFact {
    exercise: title(props, P_EXERCISE),
    performed_at: date(props, P_DATE)?,
    day_label: select(props, P_DAY),
    week: number(props, P_WEEK).map_or(0, |n| n.max(0.0) as u32),
    top_load: number(props, P_TOP).unwrap_or(0.0),
    reps: rich_text(props, P_REPS),
    volume: number(props, P_VOLUME).unwrap_or(0.0),
    hevy_id: rich_text(props, P_HEVY),
  })
}

fn select_options(options: &[(&str, &str)]) -> Value {
  let options: Vec<Value> = options
    .iter()
    .map(|(name, color)| json!({ "name": name, "color": color }))
    .collect();
  json!({ "select": { "options": options } })
}

/// ---------------------------------------------------------------------------
/// Client
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone)]
pub struct NotionClient {
  http: Client,
  config: NotionConfig,
}

impl NotionClient {
  pub fn new(config: NotionConfig) -> Result<Self, NotionError> {
    if config.token.is_empty() {
      return Err(NotionError::MissingConfig("NOTION_TOKEN".into()));
    }
    let http = Client::builder().timeout(config.timeout).build()?;
    Ok(Self { http, config })
  }

  fn endpoint(&self, path: &str) -> Result<Url, NotionError> {
    Ok(Url::parse(&format!(
      "{}{}",
      self.config.api_base.trim_end_matches('/'),
      path
    ))?)
  }

  async fn send(&self, method: Method, path: &str, body: Option<&Value>) -> Result<Value, NotionError> {
    tokio::time::sleep(self.config.rate_limit_delay).await;

    let url = self.endpoint(path)?;
    tracing::debug!(%method, %url, "notion request");

    let mut request = self
      .http
      .request(method, url)
      .bearer_auth(&self.config.token)
      .header("Notion-Version", NOTION_VERSION);
    if let Some(body) = body {
      request = request.json(body);
    }

    let response = request.send().await?;
    let status = response.status();
    if !status.is_success() {
      let body = response.text().await.unwrap_or_default();
      return Err(NotionError::Api { status: status.as_u16(), body });
    }

    let text = response.text().await?;
    serde_json::from_str(&text).map_err(|e| {
      let preview: String = text.chars().take(500).collect();
      tracing::warn!("Failed to parse Notion response (first 500 chars): {}", preview);
      NotionError::Parse(e.to_string())
    })
  }

  /// Query a database, following `has_more` / `next_cursor` pagination
  pub async fn query_database(&self, database_id: &str, mut body: Map<String, Value>) -> Result<Vec<Value>, NotionError> {
    body.insert("page_size".into(), json!(PAGE_SIZE));
    let path = format!("/databases/{}/query", database_id);
    let mut results = Vec::new();

    loop {
      let data = self.send(Method::POST, &path, Some(&Value::Object(body.clone()))).await?;

      if let Some(pages) = data["results"].as_array() {
        results.extend(pages.iter().cloned());
      }

      match (data["has_more"].as_bool(), data["next_cursor"].as_str()) {
        (Some(true), Some(cursor)) => {
          body.insert("start_cursor".into(), json!(cursor));
        }
        _ => break,
      }
    }

    Ok(results)
  }

  async fn create_page(&self, body: Value) -> Result<String, NotionError> {
    let data = self.send(Method::POST, "/pages", Some(&body)).await?;
    data["id"]
      .as_str()
      .map(str::to_string)
      .ok_or_else(|| NotionError::Parse("created page without id".into()))
  }

  // -------------------------------------------------------------------------
  // Reminders
  // -------------------------------------------------------------------------

  pub async fn create_reminder(&self, database_id: &str, reminder: &NewReminder<'_>) -> Result<String, NotionError> {
    let condition = serde_json::to_string(reminder.condition).map_err(|e| NotionError::Parse(e.to_string()))?;
    let name: String = reminder.name.chars().take(REMINDER_NAME_MAX_CHARS).collect();

    let body = json!({
      "parent": { "database_id": database_id },
      "properties": {
        P_NAME: { "title": text_value(&name) },
        P_KIND: { "select": { "name": reminder.kind } },
        P_STATUS: { "select": { "name": "activo" } },
        P_CONDITION: { "rich_text": text_value(&condition) },
        P_COUNTER: { "number": 0 },
        P_USER: { "rich_text": text_value(reminder.user_id) },
        P_JOB: { "rich_text": text_value(reminder.job_id) },
      },
    });

    self.create_page(body).await
  }

  pub async fn query_reminders(&self, database_id: &str, filter: &ReminderFilter<'_>) -> Result<Vec<RemoteReminder>, NotionError> {
    let mut filters = Vec::new();
    if let Some(status) = filter.status {
      filters.push(json!({ "property": P_STATUS, "select": { "equals": status } }));
    }
    if let Some(user_id) = filter.user_id {
      filters.push(json!({ "property": P_USER, "rich_text": { "equals": user_id } }));
    }
    if let Some(job_id) = filter.job_id {
      filters.push(json!({ "property": P_JOB, "rich_text": { "equals": job_id } }));
    }

    let mut body = Map::new();
    match filters.len() {
      0 => {}
      1 => {
        body.insert("filter".into(), filters.remove(0));
      }
      _ => {
        body.insert("filter".into(), json!({ "and": filters }));
      }
    }

    self
      .query_database(database_id, body)
      .await?
      .iter()
      .map(reminder_from_page)
      .collect()
  }

  pub async fn get_reminder(&self, page_id: &str) -> Result<RemoteReminder, NotionError> {
    let page = self.send(Method::GET, &format!("/pages/{}", page_id), None).await?;
    reminder_from_page(&page)
  }

  pub async fn update_reminder(&self, page_id: &str, update: &ReminderUpdate<'_>) -> Result<(), NotionError> {
    let mut props = Map::new();
    if let Some(status) = update.status {
      props.insert(P_STATUS.into(), json!({ "select": { "name": status } }));
    }
    if let Some(checked) = update.last_checked {
      props.insert(P_LAST_CHECK.into(), json!({ "date": { "start": checked.to_rfc3339() } }));
    }
    if let Some(count) = update.trigger_count {
      props.insert(P_COUNTER.into(), json!({ "number": count }));
    }
    if props.is_empty() {
      return Ok(());
    }

    let body = json!({ "properties": props });
    self.send(Method::PATCH, &format!("/pages/{}", page_id), Some(&body)).await?;
    Ok(())
  }

  // -------------------------------------------------------------------------
  // Workouts
  // -------------------------------------------------------------------------

  /// Sessions on or after `days` ago, newest first
  pub async fn recent_sessions(&self, database_id: &str, days: i64) -> Result<Vec<SessionFact>, NotionError> {
    let since = (Utc::now() - Duration::days(days)).format("%Y-%m-%d").to_string();

    let mut body = Map::new();
    body.insert(
      "filter".into(),
      json!({ "property": P_DATE, "date": { "on_or_after": since } }),
    );
    body.insert(
      "sorts".into(),
      json!([{ "property": P_DATE, "direction": "descending" }]),
    );

    let mut sessions: Vec<SessionFact> = self
      .query_database(database_id, body)
      .await?
      .iter()
      .filter_map(session_from_page)
      .collect();
    sessions.sort_by(|a, b| b.performed_at.cmp(&a.performed_at));
    Ok(sessions)
  }

  pub async fn get_last_session(&self, database_id: &str) -> Result<Option<SessionFact>, NotionError> {
    Ok(self
      .recent_sessions(database_id, LAST_SESSION_LOOKBACK_DAYS)
      .await?
      .into_iter()
      .next())
  }

  pub async fn create_workout_entry(&self, database_id: &str, workout: &NewWorkout) -> Result<String, NotionError> {
    let body = json!({
      "parent": { "database_id": database_id },
      "properties": {
        P_EXERCISE: { "title": text_value(&workout.exercise) },
        P_DATE: { "date": { "start": workout.date } },
        P_DAY: { "select": { "name": workout.day_label } },
        P_WEEK: { "number": workout.week },
        P_TOP: { "number": workout.top_load },
        P_REPS: { "rich_text": text_value(&workout.reps) },
        P_VOLUME: { "number": workout.volume },
        P_HEVY: { "rich_text": text_value(&workout.hevy_id) },
        P_SYNCED: { "checkbox": true },
      },
    });

    self.create_page(body).await
  }

  // -------------------------------------------------------------------------
  // Setup
  // -------------------------------------------------------------------------

  async fn create_database(&self, parent_page_id: &str, title: &str, properties: Value) -> Result<String, NotionError> {
    let body = json!({
      "parent": { "page_id": parent_page_id },
      "title": [{ "type": "text", "text": { "content": title } }],
      "properties": properties,
    });
    let data = self.send(Method::POST, "/databases", Some(&body)).await?;
    data["id"]
      .as_str()
      .map(str::to_string)
      .ok_or_else(|| NotionError::Parse("created database without id".into()))
  }

  pub async fn create_reminders_database(&self, parent_page_id: &str) -> Result<String, NotionError> {
    let properties = json!({
      P_NAME: { "title": {} },
      P_KIND: select_options(&[
        ("condicional", "blue"),
        ("temporal", "green"),
        ("recurrente", "yellow"),
        ("evento", "purple"),
      ]),
      P_STATUS: select_options(&[
        ("activo", "green"),
        ("pausado", "yellow"),
        ("disparado", "orange"),
        ("completado", "gray"),
      ]),
      P_CONDITION: { "rich_text": {} },
      P_LAST_CHECK: { "date": {} },
      P_COUNTER: { "number": {} },
      P_USER: { "rich_text": {} },
      P_JOB: { "rich_text": {} },
    });
    self
      .create_database(parent_page_id, "ForzudoOS - Recordatorios", properties)
      .await
  }

  pub async fn create_workouts_database(&self, parent_page_id: &str) -> Result<String, NotionError> {
    let properties = json!({
      P_EXERCISE: { "title": {} },
      P_DATE: { "date": {} },
      P_DAY: select_options(&[
        ("Día 1 - OHP", "orange"),
        ("Día 2 - Deadlift", "red"),
        ("Día 3 - Bench", "blue"),
        ("Día 4 - Squat", "green"),
      ]),
      P_WEEK: { "number": {} },
      P_TOP: { "number": {} },
      P_REPS: { "rich_text": {} },
      P_VOLUME: { "number": {} },
      P_HEVY: { "rich_text": {} },
      P_SYNCED: { "checkbox": {} },
    });
    self
      .create_database(parent_page_id, "ForzudoOS - Entrenos", properties)
      .await
  }

  pub async fn setup(&self, parent_page_id: &str) -> Result<CreatedDatabases, NotionError> {
    let reminders_db = self.create_reminders_database(parent_page_id).await?;
    tracing::info!(%reminders_db, "created reminders database");
    let workouts_db = self.create_workouts_database(parent_page_id).await?;
    tracing::info!(%workouts_db, "created workouts database");
    Ok(CreatedDatabases { reminders_db, workouts_db })
  }
}

/// ---------------------------------------------------------------------------
/// Tests
/// ---------------------------------------------------------------------------
