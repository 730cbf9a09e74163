//! Workout context for reminder evaluation
//!
//! Combines the last recorded session (if any) with the periodization engine
//! into the facts a reminder needs: hours since training, cycle position and
//! the next session's working sets.

use chrono::{DateTime, NaiveDate, Utc};
use serde::Serialize;

use crate::cycle::{self, CycleState, NextSession, MACRO_CYCLE_LENGTH, SESSIONS_PER_WEEK};
use crate::models::SessionFact;

/// Hours without training after which a session counts as missed
pub const MISSED_WORKOUT_HOURS: f64 = 48.0;

/// ---------------------------------------------------------------------------
/// Session Counting
/// ---------------------------------------------------------------------------

/// Source of the session count fed into the cycle engine
pub trait SessionCounter: Send + Sync {
  fn total_sessions(&self, now: DateTime<Utc>) -> u32;
}

/// Estimate from calendar time: every whole week since the program start
/// counts as a full training week. Not an actual count of logged sessions.
#[derive(Debug, Clone)]
pub struct CalendarEstimate {
  pub program_start: NaiveDate,
  pub sessions_per_week: u32,
}

impl CalendarEstimate {
  pub fn new(program_start: NaiveDate) -> Self {
    Self {
      program_start,
      sessions_per_week: SESSIONS_PER_WEEK,
    }
  }
}

impl SessionCounter for CalendarEstimate {
  fn total_sessions(&self, now: DateTime<Utc>) -> u32 {
    let days = (now.date_naive() - self.program_start).num_days().max(0);
    let weeks = u32::try_from(days / 7).unwrap_or(u32::MAX);
    weeks.saturating_mul(self.sessions_per_week)
  }
}

/// A known session count, e.g. from an exact log
#[derive(Debug, Clone, Copy)]
pub struct FixedSessions(pub u32);

impl SessionCounter for FixedSessions {
  fn total_sessions(&self, _now: DateTime<Utc>) -> u32 {
    self.0
  }
}

/// ---------------------------------------------------------------------------
/// Workout Context
/// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Serialize)]
pub struct WorkoutContext {
  pub last_session: Option<SessionFact>,
  pub hours_since_last: Option<f64>,
  pub cycle_state: CycleState,
  pub next_session: NextSession,
  pub needs_deload: bool,
  pub missed_workout: bool,
  pub days_until_deload: u32,
}

impl WorkoutContext {
  pub fn is_deload_week(&self) -> bool {
    self.cycle_state.is_deload_week()
  }
}

pub struct ContextBuilder {
  counter: Box<dyn SessionCounter>,
}

impl ContextBuilder {
  pub fn new(counter: Box<dyn SessionCounter>) -> Self {
    Self { counter }
  }

  pub fn calendar(program_start: NaiveDate) -> Self {
    Self::new(Box::new(CalendarEstimate::new(program_start)))
  }

  pub fn build(&self, last_session: Option<SessionFact>) -> WorkoutContext {
    self.build_at(Utc::now(), last_session)
  }

  pub fn build_at(&self, now: DateTime<Utc>, last_session: Option<SessionFact>) -> WorkoutContext {
    let total_sessions = self.counter.total_sessions(now);
    let cycle_state = cycle::cycle_state(total_sessions);

    let hours_since_last = last_session
      .as_ref()
      .map(|s| (now - s.performed_at).num_milliseconds() as f64 / 3_600_000.0);

    // Day rotation 1 -> 2 -> 3 -> 4 -> 1
    let next_day = total_sessions % SESSIONS_PER_WEEK + 1;
    let next_session = cycle::next_session(next_day, &cycle_state);

    WorkoutContext {
      needs_deload: cycle_state.week_in_macro == MACRO_CYCLE_LENGTH,
      missed_workout: hours_since_last.is_some_and(|h| h > MISSED_WORKOUT_HOURS),
      days_until_deload: cycle_state.days_until_deload(),
      last_session,
      hours_since_last,
      cycle_state,
      next_session,
    }
  }
}

/// ---------------------------------------------------------------------------
/// Rendering
/// ---------------------------------------------------------------------------

/// Human-readable summary used as the body of triggered reminders and `status`
pub fn render_summary(ctx: &WorkoutContext) -> String {
  let Some(last) = &ctx.last_session else {
    return "No tengo registro de entrenamientos recientes. ¿Empezamos?".to_string();
  };

  let mut lines = Vec::new();

  match ctx.hours_since_last {
    Some(hours) if ctx.missed_workout => lines.push(format!("Llevas {:.0}h sin entrenar", hours)),
    _ if ctx.is_deload_week() => lines.push("Semana de deload - recuperación activa".to_string()),
    _ => lines.push(format!("{} (macro {})", ctx.cycle_state.week_name, ctx.cycle_state.macro_num)),
  }

  lines.push(String::new());
  lines.push(format!(
    "Último: {} ({})",
    last.exercise,
    last.performed_at.format("%d/%m")
  ));

  if !ctx.is_deload_week() {
    let ns = &ctx.next_session;
    lines.push(String::new());
    lines.push(format!("Próximo: {}", ns.day_label));
    lines.push(format!("   Focus: {}", ns.focus));
    if !ns.working_sets.is_empty() {
      lines.push("   Sets:".to_string());
      for (i, set) in ns.working_sets.iter().enumerate() {
        lines.push(format!("     {}. {}kg x {}", i + 1, set.load, set.reps));
      }
    }
  }

  if (1..=3).contains(&ctx.days_until_deload) {
    lines.push(String::new());
    lines.push(format!("Deload en {} días", ctx.days_until_deload));
  }

  lines.join("\n")
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::test_utils::{mock_session, program_start};
  use chrono::{Duration, TimeZone};

  fn builder(sessions: u32) -> ContextBuilder {
    ContextBuilder::new(Box::new(FixedSessions(sessions)))
  }

  #[test]
  fn test_calendar_estimate_counts_whole_weeks() {
    let estimate = CalendarEstimate::new(program_start());
    let start = Utc.with_ymd_and_hms(2026, 2, 20, 12, 0, 0).unwrap();

    assert_eq!(estimate.total_sessions(start), 0);
    assert_eq!(estimate.total_sessions(start + Duration::days(6)), 0);
    assert_eq!(estimate.total_sessions(start + Duration::days(7)), 4);
    assert_eq!(estimate.total_sessions(start + Duration::days(22)), 12);
  }

  #[test]
  fn test_calendar_estimate_before_start_is_zero() {
    let estimate = CalendarEstimate::new(program_start());
    let before = Utc.with_ymd_and_hms(2026, 1, 1, 0, 0, 0).unwrap();
    assert_eq!(estimate.total_sessions(before), 0);
  }

  #[test]
  fn test_no_last_session_has_no_hours() {
    let ctx = builder(0).build(None);
    assert!(ctx.hours_since_last.is_none());
    assert!(!ctx.missed_workout);
    assert_eq!(ctx.cycle_state.week_in_macro, 1);
  }

  #[test]
  fn test_hours_since_last_and_missed_flag() {
    let now = Utc::now();
    let ctx = builder(0).build_at(now, Some(mock_session(now - Duration::hours(30))));
    crate::assert_approx_eq!(ctx.hours_since_last.unwrap(), 30.0, 1e-6);
    assert!(!ctx.missed_workout);

    let ctx = builder(0).build_at(now, Some(mock_session(now - Duration::minutes(48 * 60 + 6))));
    assert!(ctx.missed_workout);
  }

  #[test]
  fn test_exactly_48_hours_is_not_missed() {
    let now = Utc::now();
    let ctx = builder(0).build_at(now, Some(mock_session(now - Duration::hours(48))));
    assert!(!ctx.missed_workout);
  }

  #[test]
  fn test_days_until_deload() {
    assert_eq!(builder(0).build(None).days_until_deload, 6);
    assert_eq!(builder(5 * 4).build(None).days_until_deload, 1);

    let deload = builder(6 * 4).build(None);
    assert_eq!(deload.days_until_deload, 0);
    assert!(deload.needs_deload);
    assert!(deload.is_deload_week());
  }

  #[test]
  fn test_next_session_rotates_by_session_count() {
    assert_eq!(builder(0).build(None).next_session.day_number, 1);
    assert_eq!(builder(5).build(None).next_session.day_number, 2);
    assert_eq!(builder(7).build(None).next_session.day_number, 4);
  }

  #[test]
  fn test_render_without_session_prompts_to_start() {
    let ctx = builder(0).build(None);
    assert!(render_summary(&ctx).contains("No tengo registro"));
  }

  #[test]
  fn test_render_missed_workout_lists_sets() {
    let now = Utc::now();
    let ctx = builder(0).build_at(now, Some(mock_session(now - Duration::hours(60))));
    let text = render_summary(&ctx);

    assert!(text.starts_with("Llevas 60h sin entrenar"));
    assert!(text.contains("Próximo: BBB Día 1 - OHP"));
    assert!(text.contains("1. 38kg x 5"));
    assert!(text.contains("3. 50kg x 5+"));
  }

  #[test]
  fn test_render_deload_week_hides_sets() {
    let now = Utc::now();
    let ctx = builder(6 * 4).build_at(now, Some(mock_session(now - Duration::hours(10))));
    let text = render_summary(&ctx);

    assert!(text.starts_with("Semana de deload"));
    assert!(!text.contains("Próximo:"));
  }

  #[test]
  fn test_render_deload_countdown() {
    let now = Utc::now();
    let ctx = builder(4 * 4).build_at(now, Some(mock_session(now - Duration::hours(10))));
    assert!(render_summary(&ctx).contains("Deload en 2 días"));
  }
}
