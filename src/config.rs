//! Runtime configuration, collected once from the environment
//!
//! Every component receives what it needs through `Config`; nothing below the
//! binary reads environment variables directly.

use chrono::NaiveDate;
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// ---------------------------------------------------------------------------
/// Configuration Constants
/// ---------------------------------------------------------------------------

pub const NOTION_API_BASE: &str = "https://api.notion.com/v1";
/// Notion allows ~3 requests/s; this floor is applied before every call
pub const RATE_LIMIT_DELAY: Duration = Duration::from_millis(350);
pub const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
const DEFAULT_PROGRAM_START: &str = "2026-02-20";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
  #[error("Missing configuration: {0}")]
  Missing(String),

  #[error("Invalid value for {key}: {reason}")]
  Invalid { key: String, reason: String },
}

/// Connection settings for the Notion API
#[derive(Debug, Clone)]
pub struct NotionConfig {
  pub token: String,
  pub api_base: String,
  pub rate_limit_delay: Duration,
  pub timeout: Duration,
}

impl NotionConfig {
  pub fn new(token: impl Into<String>) -> Self {
    Self {
      token: token.into(),
      api_base: NOTION_API_BASE.to_string(),
      rate_limit_delay: RATE_LIMIT_DELAY,
      timeout: REQUEST_TIMEOUT,
    }
  }
}

#[derive(Debug, Clone)]
pub struct Config {
  /// Directory holding `jobs.json`
  pub data_dir: PathBuf,
  pub reminders_db: Option<String>,
  pub workouts_db: Option<String>,
  pub parent_page: Option<String>,
  pub notion: NotionConfig,
  /// Anchor for the calendar-based session estimate
  pub program_start: NaiveDate,
}

fn non_empty(key: &str) -> Option<String> {
  env::var(key).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

pub fn default_program_start() -> NaiveDate {
  NaiveDate::parse_from_str(DEFAULT_PROGRAM_START, "%Y-%m-%d").unwrap_or(NaiveDate::MIN)
}

impl Config {
  /// Read `FORZUDO_*` / `NOTION_*` variables. Unset remote ids simply disable
  /// the matching remote feature.
  pub fn from_env() -> Result<Self, ConfigError> {
    let data_dir = non_empty("FORZUDO_DATA")
      .map(PathBuf::from)
      .unwrap_or_else(|| env::temp_dir().join("forzudo"));

    let program_start = match non_empty("FORZUDO_PROGRAM_START") {
      Some(raw) => NaiveDate::parse_from_str(&raw, "%Y-%m-%d").map_err(|e| ConfigError::Invalid {
        key: "FORZUDO_PROGRAM_START".into(),
        reason: e.to_string(),
      })?,
      None => default_program_start(),
    };

    let mut notion = NotionConfig::new(non_empty("NOTION_TOKEN").unwrap_or_default());
    if let Some(base) = non_empty("NOTION_API_BASE") {
      notion.api_base = base;
    }

    Ok(Self {
      data_dir,
      reminders_db: non_empty("FORZUDO_REMINDERS_DB"),
      workouts_db: non_empty("FORZUDO_WORKOUTS_DB"),
      parent_page: non_empty("FORZUDO_PARENT_PAGE"),
      notion,
      program_start,
    })
  }

  /// Local-only configuration rooted at `data_dir`
  pub fn local(data_dir: impl Into<PathBuf>) -> Self {
    Self {
      data_dir: data_dir.into(),
      reminders_db: None,
      workouts_db: None,
      parent_page: None,
      notion: NotionConfig::new(""),
      program_start: default_program_start(),
    }
  }

  pub fn jobs_file(&self) -> PathBuf {
    self.data_dir.join("jobs.json")
  }

  pub fn has_notion_token(&self) -> bool {
    !self.notion.token.is_empty()
  }

  /// Token is required for any remote call
  pub fn require_token(&self) -> Result<&str, ConfigError> {
    if self.has_notion_token() {
      Ok(&self.notion.token)
    } else {
      Err(ConfigError::Missing("NOTION_TOKEN".into()))
    }
  }
}
