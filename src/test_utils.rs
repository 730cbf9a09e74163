//! Test utilities and helpers for unit testing
//!
//! This module provides common test infrastructure including:
//! - Job store setup in temporary directories
//! - Mock data factories
//! - Notion page fixtures for mockito responses
//! - Helper assertions

use chrono::{DateTime, NaiveDate, Utc};
use serde_json::{json, Value};
use std::net::TcpListener;
use std::time::Duration;
use tempfile::TempDir;

use crate::config::NotionConfig;
use crate::models::{ReminderJob, SessionFact};
use crate::notion::NotionClient;
use crate::parser::parse;
use crate::store::LocalJobStore;

/// ---------------------------------------------------------------------------
/// Store Test Utilities
/// ---------------------------------------------------------------------------

/// Local store rooted in a fresh temporary directory.
/// Keep the `TempDir` alive for as long as the store is used.
pub fn temp_store() -> (TempDir, LocalJobStore) {
  let dir = tempfile::tempdir().expect("Failed to create temp dir");
  let store = LocalJobStore::new(dir.path());
  (dir, store)
}

/// ---------------------------------------------------------------------------
/// Mock Data Factories
/// ---------------------------------------------------------------------------

pub fn program_start() -> NaiveDate {
  NaiveDate::from_ymd_opt(2026, 2, 20).unwrap()
}

/// Session performed at `at`, day 1 of week 1
pub fn mock_session(at: DateTime<Utc>) -> SessionFact {
  SessionFact {
    exercise: "Press Militar".to_string(),
    performed_at: at,
    day_label: "Día 1 - OHP".to_string(),
    week: 1,
    top_load: 50.0,
    reps: "5+".to_string(),
    volume: 1850.0,
    hevy_id: "hevy_test".to_string(),
  }
}

/// Active job built from parsing `text`
pub fn mock_job(id: &str, user_id: &str, text: &str) -> ReminderJob {
  ReminderJob::new(id.to_string(), user_id, parse(text), Utc::now())
}

/// ---------------------------------------------------------------------------
/// Notion Fixtures
/// ---------------------------------------------------------------------------

/// Client pointed at a mockito server, with no rate-limit delay
pub fn mock_client(base_url: &str) -> NotionClient {
  client_with(base_url, Duration::ZERO, Duration::from_secs(5))
}

pub fn client_with(base_url: &str, rate_limit_delay: Duration, timeout: Duration) -> NotionClient {
  let mut config = NotionConfig::new("test-token");
  config.api_base = base_url.to_string();
  config.rate_limit_delay = rate_limit_delay;
  config.timeout = timeout;
  NotionClient::new(config).expect("Failed to build test client")
}

/// Listener that accepts connections but never answers.
/// Keep the listener alive for as long as the URL is used.
pub fn silent_server() -> (TcpListener, String) {
  let listener = TcpListener::bind("127.0.0.1:0").expect("Failed to bind listener");
  let url = format!("http://{}", listener.local_addr().expect("No local addr"));
  (listener, url)
}

fn text(content: &str) -> Value {
  if content.is_empty() {
    json!([])
  } else {
    json!([{ "plain_text": content, "text": { "content": content } }])
  }
}

/// Page from the reminders database as returned by the query endpoint
pub fn reminder_page(
  id: &str,
  name: &str,
  kind: &str,
  status: &str,
  condition: &str,
  user_id: &str,
  job_id: &str,
) -> Value {
  json!({
    "object": "page",
    "id": id,
    "created_time": "2026-03-01T09:00:00.000Z",
    "properties": {
      "Nombre": { "title": text(name) },
      "Tipo": { "select": { "name": kind } },
      "Estado": { "select": { "name": status } },
      "Condición": { "rich_text": text(condition) },
      "Último Check": { "date": null },
      "Contador": { "number": 0 },
      "User ID": { "rich_text": text(user_id) },
      "Job ID": { "rich_text": text(job_id) },
    },
  })
}

/// Page from the workouts database; an empty `date` leaves Fecha unset
pub fn workout_page(exercise: &str, date: &str) -> Value {
  let fecha = if date.is_empty() {
    Value::Null
  } else {
    json!({ "start": date })
  };

  json!({
    "object": "page",
    "id": format!("wk-{}", exercise.to_lowercase().replace(' ', "-")),
    "properties": {
      "Ejercicio": { "title": text(exercise) },
      "Fecha": { "date": fecha },
      "Día BBB": { "select": { "name": "Día 1 - OHP" } },
      "Semana": { "number": 1 },
      "Peso Top": { "number": 50.0 },
      "Reps": { "rich_text": text("5+") },
      "Volumen": { "number": 1850.0 },
      "Hevy ID": { "rich_text": text("hevy_1") },
    },
  })
}

/// ---------------------------------------------------------------------------
/// Helper Assertions
/// ---------------------------------------------------------------------------

/// Assert that two f64 values are approximately equal
#[macro_export]
macro_rules! assert_approx_eq {
  ($left:expr, $right:expr, $epsilon:expr) => {
    let left_val = $left;
    let right_val = $right;
    let diff = (left_val - right_val).abs();
    assert!(
      diff < $epsilon,
      "assertion failed: `(left ≈ right)`\n  left: `{:?}`,\n right: `{:?}`,\n  diff: `{:?}`,\n epsilon: `{:?}`",
      left_val,
      right_val,
      diff,
      $epsilon
    );
  };
}
