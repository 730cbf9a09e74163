//! Rule-based reminder classifier
//!
//! Maps Spanish reminder phrases onto structured trigger/action descriptors.
//! Patterns are tried in priority order and the first match wins; anything
//! unrecognised becomes a plain notification carrying the raw text.

use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::models::{ActionType, Params, ReminderIntent, TriggerType};

/// ---------------------------------------------------------------------------
/// Patterns
/// ---------------------------------------------------------------------------

/// "si no entreno en 48h", "no he entrenado en 2d"
static NO_TRAINING: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"no\s+(?:he\s+)?entren(?:o|ado)\s+(?:en\s+)?([0-9]+)\s*([hd])?").unwrap()
});

/// "avísame del deload 3 días antes"
static DELOAD_WARNING: Lazy<Regex> = Lazy::new(|| {
  Regex::new(r"(?:av[íi]same|avisa|recuerda).*\bdeload\b.*?([0-9]+)\s*d[ií]as?\s*(?:antes)?").unwrap()
});

/// "qué toca hoy", "toca mañana"
static NEXT_SESSION: Lazy<Regex> =
  Lazy::new(|| Regex::new(r"(?:qu[eé]\s+)?toca\s+(?:hoy|mañana|pasado)?").unwrap());

const DEFAULT_CHECK_INTERVAL_HOURS: u64 = 6;
const DEFAULT_THRESHOLD_HOURS: u64 = 48;
const DEFAULT_DAYS_BEFORE: u64 = 3;

fn params(value: Value) -> Params {
  match value {
    Value::Object(map) => map,
    _ => Params::new(),
  }
}

/// ASCII digits only; quantities beyond u64 saturate instead of dropping the match
fn quantity(digits: &str) -> u64 {
  digits.parse().unwrap_or(u64::MAX)
}

fn strings(keys: &[&str]) -> Vec<String> {
  keys.iter().map(|k| k.to_string()).collect()
}

/// ---------------------------------------------------------------------------
/// Classification
/// ---------------------------------------------------------------------------

/// Parse a reminder phrase. Never fails: unmatched input becomes a
/// TIME_BASED/NOTIFY intent whose message is the original text.
pub fn parse(text: &str) -> ReminderIntent {
  let lowered = text.trim().to_lowercase();

  parse_no_training(text, &lowered)
    .or_else(|| parse_deload_warning(text, &lowered))
    .or_else(|| parse_next_session(text, &lowered))
    .unwrap_or_else(|| ReminderIntent {
      raw_text: text.to_string(),
      trigger_type: TriggerType::TimeBased,
      trigger_data: params(json!({ "when": "unspecified" })),
      action_type: ActionType::Notify,
      action_data: params(json!({ "message": text })),
      context_needed: Vec::new(),
    })
}

fn parse_no_training(raw: &str, lowered: &str) -> Option<ReminderIntent> {
  let caps = NO_TRAINING.captures(lowered)?;
  let amount = quantity(caps.get(1)?.as_str());
  let unit = caps.get(2).map_or("h", |m| m.as_str());
  let hours = if unit == "d" { amount.saturating_mul(24) } else { amount };

  Some(ReminderIntent {
    raw_text: raw.to_string(),
    trigger_type: TriggerType::Conditional,
    trigger_data: params(json!({
      "condition": "no_training",
      "hours": hours,
      "check_interval": (hours / 4).min(DEFAULT_CHECK_INTERVAL_HOURS),
    })),
    action_type: ActionType::Remind,
    action_data: params(json!({
      "message": format!("Llevas más de {}{} sin entrenar", amount, unit),
    })),
    context_needed: strings(&["last_workout", "next_session", "current_cycle"]),
  })
}

fn parse_deload_warning(raw: &str, lowered: &str) -> Option<ReminderIntent> {
  let caps = DELOAD_WARNING.captures(lowered)?;
  let days = quantity(caps.get(1)?.as_str());

  Some(ReminderIntent {
    raw_text: raw.to_string(),
    trigger_type: TriggerType::EventBased,
    trigger_data: params(json!({ "event": "deload", "days_before": days })),
    action_type: ActionType::Remind,
    action_data: params(json!({ "message": format!("Deload en {} días", days) })),
    context_needed: strings(&["cycle_position", "deload_date"]),
  })
}

fn parse_next_session(raw: &str, lowered: &str) -> Option<ReminderIntent> {
  if !NEXT_SESSION.is_match(lowered) {
    return None;
  }

  Some(ReminderIntent {
    raw_text: raw.to_string(),
    trigger_type: TriggerType::TimeBased,
    trigger_data: params(json!({ "when": "now" })),
    action_type: ActionType::Ask,
    action_data: params(json!({ "query": "next_session" })),
    context_needed: strings(&["next_session", "current_cycle", "last_workout"]),
  })
}

/// ---------------------------------------------------------------------------
/// Cron Descriptor
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CronAction {
  Notify,
  NotifyWithContext,
}

/// Schedulable form of an intent. Stored as JSON in the remote "Condición"
/// property, so it must stay readable back into trigger parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum CronDescriptor {
  Conditional {
    check_every_hours: u64,
    condition: String,
    threshold_hours: u64,
    action: CronAction,
    context: Vec<String>,
  },
  EventBased {
    event: String,
    days_before: u64,
    action: CronAction,
    context: Vec<String>,
  },
  Simple {
    action: CronAction,
    message: String,
  },
}

impl CronDescriptor {
  /// Rebuild the `trigger_data` map this descriptor was derived from
  pub fn trigger_data(&self) -> Params {
    match self {
      CronDescriptor::Conditional { check_every_hours, condition, threshold_hours, .. } => {
        params(json!({
          "condition": condition,
          "hours": threshold_hours,
          "check_interval": check_every_hours,
        }))
      }
      CronDescriptor::EventBased { event, days_before, .. } => {
        params(json!({ "event": event, "days_before": days_before }))
      }
      CronDescriptor::Simple { .. } => params(json!({ "when": "unspecified" })),
    }
  }

  pub fn context(&self) -> &[String] {
    match self {
      CronDescriptor::Conditional { context, .. } | CronDescriptor::EventBased { context, .. } => {
        context
      }
      CronDescriptor::Simple { .. } => &[],
    }
  }
}

pub fn to_cron_job(intent: &ReminderIntent) -> CronDescriptor {
  match intent.trigger_type {
    TriggerType::Conditional => CronDescriptor::Conditional {
      check_every_hours: intent
        .trigger_u64("check_interval")
        .unwrap_or(DEFAULT_CHECK_INTERVAL_HOURS),
      condition: intent.trigger_str("condition").unwrap_or_default().to_string(),
      threshold_hours: intent.trigger_u64("hours").unwrap_or(DEFAULT_THRESHOLD_HOURS),
      action: CronAction::NotifyWithContext,
      context: intent.context_needed.clone(),
    },
    TriggerType::EventBased => CronDescriptor::EventBased {
      event: intent.trigger_str("event").unwrap_or_default().to_string(),
      days_before: intent.trigger_u64("days_before").unwrap_or(DEFAULT_DAYS_BEFORE),
      action: CronAction::NotifyWithContext,
      context: intent.context_needed.clone(),
    },
    TriggerType::TimeBased | TriggerType::Recurring => CronDescriptor::Simple {
      action: CronAction::Notify,
      message: intent.action_str("message").unwrap_or_default().to_string(),
    },
  }
}
