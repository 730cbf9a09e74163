//! Static dashboard snapshot
//!
//! `data.json` consumed by the static dashboard page. Regenerated
//! periodically; field names are camelCase for the page's JavaScript.

use chrono::{DateTime, Datelike, Duration, Utc};
use serde::Serialize;
use std::fs;
use std::path::Path;

use crate::context::WorkoutContext;
use crate::cycle::{self, Lift, Reps, WorkingSet, SESSIONS_PER_WEEK};
use crate::models::SessionFact;

pub const DEFAULT_OUTPUT: &str = "docs/data.json";
/// Window of workouts included in the snapshot
pub const RECENT_DAYS: i64 = 30;
const UPCOMING_DAYS: i64 = 7;
const MAX_STREAK: u32 = 7;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardData {
  pub generated_at: DateTime<Utc>,
  pub cycle: CycleSummary,
  pub next_session: SessionPlan,
  pub last_workout: Option<WorkoutRow>,
  pub workouts: Vec<WorkoutRow>,
  pub upcoming: Vec<UpcomingSession>,
  pub alerts: Vec<Alert>,
  pub stats: Stats,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CycleSummary {
  pub week_in_macro: u32,
  pub week_type: u8,
  pub week_name: String,
  pub macro_num: u32,
  pub tm_bumps_completed: u32,
  pub completed_weeks: u32,
  pub is_deload_week: bool,
  pub days_until_deload: u32,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SessionPlan {
  pub day_name: String,
  pub focus: String,
  pub main_lift: Lift,
  pub week_name: String,
  pub macro_num: u32,
  pub week_in_macro: u32,
  pub working_sets: Vec<DashboardSet>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UpcomingSession {
  /// `YYYY-MM-DD`
  pub date: String,
  pub day_name: String,
  pub focus: String,
  pub main_lift: Lift,
  pub week_name: String,
  pub working_sets: Vec<DashboardSet>,
}

/// Working set as the page reads it: `weight`, `reps`, `pct`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DashboardSet {
  pub weight: u32,
  pub reps: Reps,
  pub pct: f64,
}

impl From<&WorkingSet> for DashboardSet {
  fn from(set: &WorkingSet) -> Self {
    Self {
      weight: set.load,
      reps: set.reps,
      pct: set.percentage,
    }
  }
}

fn dashboard_sets(sets: &[WorkingSet]) -> Vec<DashboardSet> {
  sets.iter().map(DashboardSet::from).collect()
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WorkoutRow {
  pub ejercicio: String,
  pub fecha: DateTime<Utc>,
  pub dia_bbb: String,
  pub semana: u32,
  pub peso_top: f64,
  pub reps: String,
  pub volumen: f64,
  pub hevy_id: String,
}

impl From<&SessionFact> for WorkoutRow {
  fn from(s: &SessionFact) -> Self {
    Self {
      ejercicio: s.exercise.clone(),
      fecha: s.performed_at,
      dia_bbb: s.day_label.clone(),
      semana: s.week,
      peso_top: s.top_load,
      reps: s.reps.clone(),
      volumen: s.volume,
      hevy_id: s.hevy_id.clone(),
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum AlertLevel {
  Success,
  Warning,
  Error,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Alert {
  #[serde(rename = "type")]
  pub level: AlertLevel,
  pub message: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
  pub total_sessions: u32,
  pub total_volume: f64,
  pub current_streak: u32,
}

/// ---------------------------------------------------------------------------
/// Builders
/// ---------------------------------------------------------------------------

/// Mon-Thu training days over the next week, starting today
pub fn upcoming_sessions(today: DateTime<Utc>, ctx: &WorkoutContext) -> Vec<UpcomingSession> {
  (0..UPCOMING_DAYS)
    .map(|offset| today + Duration::days(offset))
    .filter_map(|date| {
      let weekday = date.weekday().num_days_from_monday();
      if weekday >= SESSIONS_PER_WEEK {
        return None;
      }
      let session = cycle::next_session(weekday + 1, &ctx.cycle_state);
      Some(UpcomingSession {
        date: date.format("%Y-%m-%d").to_string(),
        day_name: session.day_label,
        focus: session.focus,
        main_lift: session.main_lift,
        week_name: session.week_name,
        working_sets: dashboard_sets(&session.working_sets),
      })
    })
    .collect()
}

pub fn alerts(ctx: &WorkoutContext) -> Vec<Alert> {
  let mut alerts = Vec::new();

  if (1..=3).contains(&ctx.days_until_deload) {
    alerts.push(Alert {
      level: AlertLevel::Warning,
      message: format!("Deload en {} días", ctx.days_until_deload),
    });
  }

  if let (true, Some(hours)) = (ctx.missed_workout, ctx.hours_since_last) {
    alerts.push(Alert {
      level: AlertLevel::Error,
      message: format!("Llevas {:.0}h sin entrenar", hours),
    });
  }

  if ctx.is_deload_week() {
    alerts.push(Alert {
      level: AlertLevel::Success,
      message: "Semana de deload - recupera bien".to_string(),
    });
  }

  if alerts.is_empty() {
    alerts.push(Alert {
      level: AlertLevel::Success,
      message: "Todo en orden, forzudo".to_string(),
    });
  }

  alerts
}

/// Consecutive-day streak, simplified: zero unless the newest workout was
/// today or yesterday, otherwise the workout count capped at a week.
pub fn current_streak(now: DateTime<Utc>, workouts: &[SessionFact]) -> u32 {
  let Some(latest) = workouts.iter().map(|w| w.performed_at).max() else {
    return 0;
  };
  if (now - latest).num_days() > 1 {
    return 0;
  }
  u32::try_from(workouts.len()).unwrap_or(u32::MAX).min(MAX_STREAK)
}

/// Assemble the snapshot. `workouts` are expected newest first.
pub fn build(now: DateTime<Utc>, ctx: &WorkoutContext, workouts: &[SessionFact]) -> DashboardData {
  let rows: Vec<WorkoutRow> = workouts.iter().map(WorkoutRow::from).collect();
  let state = &ctx.cycle_state;
  let next = &ctx.next_session;

  DashboardData {
    generated_at: now,
    cycle: CycleSummary {
      week_in_macro: state.week_in_macro,
      week_type: state.week_type,
      week_name: state.week_name.clone(),
      macro_num: state.macro_num,
      tm_bumps_completed: state.tm_bumps_completed,
      completed_weeks: state.completed_weeks,
      is_deload_week: ctx.is_deload_week(),
      days_until_deload: ctx.days_until_deload,
    },
    next_session: SessionPlan {
      day_name: next.day_label.clone(),
      focus: next.focus.clone(),
      main_lift: next.main_lift,
      week_name: next.week_name.clone(),
      macro_num: next.macro_num,
      week_in_macro: next.week_in_macro,
      working_sets: dashboard_sets(&next.working_sets),
    },
    last_workout: rows.first().cloned(),
    upcoming: upcoming_sessions(now, ctx),
    alerts: alerts(ctx),
    stats: Stats {
      total_sessions: state.completed_weeks * SESSIONS_PER_WEEK,
      total_volume: workouts.iter().map(|w| w.volume).sum(),
      current_streak: current_streak(now, workouts),
    },
    workouts: rows,
  }
}

pub fn write(data: &DashboardData, path: &Path) -> std::io::Result<()> {
  if let Some(dir) = path.parent().filter(|d| !d.as_os_str().is_empty()) {
    fs::create_dir_all(dir)?;
  }
  fs::write(path, serde_json::to_string_pretty(data)?)?;
  tracing::info!(path = %path.display(), "dashboard data written");
  Ok(())
}
