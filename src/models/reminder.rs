use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// String-keyed parameters carried by an intent (`trigger_data`, `action_data`).
pub type Params = Map<String, Value>;

/// ---------------------------------------------------------------------------
/// Trigger / Action Kinds
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TriggerType {
  /// "mañana a las 9", "qué toca hoy"
  TimeBased,
  /// "si no entreno en 48h"
  Conditional,
  /// "todos los lunes"
  Recurring,
  /// "3 días antes del deload"
  EventBased,
}

impl TriggerType {
  pub fn as_str(&self) -> &'static str {
    match self {
      TriggerType::TimeBased => "TIME_BASED",
      TriggerType::Conditional => "CONDITIONAL",
      TriggerType::Recurring => "RECURRING",
      TriggerType::EventBased => "EVENT_BASED",
    }
  }

  /// Label used by the remote reminders database ("Tipo" select)
  pub fn remote_label(&self) -> &'static str {
    match self {
      TriggerType::TimeBased => "temporal",
      TriggerType::Conditional => "condicional",
      TriggerType::Recurring => "recurrente",
      TriggerType::EventBased => "evento",
    }
  }

  /// Unknown labels fall back to `TimeBased`, which is never auto-evaluated
  pub fn from_remote_label(label: &str) -> Self {
    match label {
      "condicional" => TriggerType::Conditional,
      "recurrente" => TriggerType::Recurring,
      "evento" => TriggerType::EventBased,
      _ => TriggerType::TimeBased,
    }
  }
}

impl std::fmt::Display for TriggerType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ActionType {
  Notify,
  Ask,
  Remind,
}

impl std::fmt::Display for ActionType {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      ActionType::Notify => write!(f, "NOTIFY"),
      ActionType::Ask => write!(f, "ASK"),
      ActionType::Remind => write!(f, "REMIND"),
    }
  }
}

/// ---------------------------------------------------------------------------
/// Reminder Intent
/// ---------------------------------------------------------------------------

/// Structured reading of a reminder phrase. Built by `parser::parse`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderIntent {
  pub raw_text: String,
  pub trigger_type: TriggerType,
  pub trigger_data: Params,
  pub action_type: ActionType,
  pub action_data: Params,
  pub context_needed: Vec<String>,
}

impl ReminderIntent {
  pub fn trigger_str(&self, key: &str) -> Option<&str> {
    self.trigger_data.get(key).and_then(Value::as_str)
  }

  pub fn trigger_u64(&self, key: &str) -> Option<u64> {
    self.trigger_data.get(key).and_then(Value::as_u64)
  }

  pub fn action_str(&self, key: &str) -> Option<&str> {
    self.action_data.get(key).and_then(Value::as_str)
  }
}

/// ---------------------------------------------------------------------------
/// Reminder Job
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
  #[default]
  Active,
  Paused,
  Triggered,
  Completed,
}

impl JobStatus {
  /// Label used by the remote reminders database ("Estado" select)
  pub fn remote_label(&self) -> &'static str {
    match self {
      Self::Active => "activo",
      Self::Paused => "pausado",
      Self::Triggered => "disparado",
      Self::Completed => "completado",
    }
  }

  pub fn from_remote_label(label: &str) -> Option<Self> {
    match label {
      "activo" => Some(Self::Active),
      "pausado" => Some(Self::Paused),
      "disparado" => Some(Self::Triggered),
      "completado" => Some(Self::Completed),
      _ => None,
    }
  }
}

impl std::fmt::Display for JobStatus {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Self::Active => write!(f, "active"),
      Self::Paused => write!(f, "paused"),
      Self::Triggered => write!(f, "triggered"),
      Self::Completed => write!(f, "completed"),
    }
  }
}

impl std::str::FromStr for JobStatus {
  type Err = String;
  fn from_str(s: &str) -> Result<Self, Self::Err> {
    match s {
      "active" => Ok(Self::Active),
      "paused" => Ok(Self::Paused),
      "triggered" => Ok(Self::Triggered),
      "completed" => Ok(Self::Completed),
      _ => Err(format!("Unknown job status: {}", s)),
    }
  }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReminderJob {
  pub id: String,
  pub user_id: String,
  pub intent: ReminderIntent,
  pub status: JobStatus,
  pub created_at: DateTime<Utc>,
  #[serde(default)]
  pub last_checked: Option<DateTime<Utc>>,
  #[serde(default)]
  pub trigger_count: u32,
  /// Page id in the remote reminders database, if the job was mirrored there
  #[serde(default, skip_serializing_if = "Option::is_none")]
  pub remote_id: Option<String>,
}

impl ReminderJob {
  pub fn new(id: String, user_id: &str, intent: ReminderIntent, created_at: DateTime<Utc>) -> Self {
    Self {
      id,
      user_id: user_id.to_string(),
      intent,
      status: JobStatus::Active,
      created_at,
      last_checked: None,
      trigger_count: 0,
      remote_id: None,
    }
  }

  pub fn is_active(&self) -> bool {
    self.status == JobStatus::Active
  }
}
