use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Last recorded session, as read from the workouts database
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionFact {
  pub exercise: String,
  pub performed_at: DateTime<Utc>,
  pub day_label: String,
  pub week: u32,
  pub top_load: f64,
  pub reps: String,
  pub volume: f64,
  pub hevy_id: String,
}

/// For inserting new workouts via `sync --data` (Hevy/BBD export payload)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewWorkout {
  #[serde(alias = "ejercicio")]
  pub exercise: String,
  /// ISO date or datetime, passed through to the remote date property
  #[serde(alias = "fecha")]
  pub date: String,
  #[serde(default, alias = "dia_bbb")]
  pub day_label: String,
  #[serde(default, alias = "semana")]
  pub week: u32,
  #[serde(default, alias = "peso_top")]
  pub top_load: f64,
  #[serde(default)]
  pub reps: String,
  #[serde(default, alias = "volumen")]
  pub volume: f64,
  #[serde(default)]
  pub hevy_id: String,
}
