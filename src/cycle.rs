//! 5/3/1 Periodization Engine
//!
//! Pure, deterministic mapping from a session count to a position in the
//! repeating 7-week macro-cycle:
//! - weeks 1-3: 5s / 3s / 531 (first mini-cycle)
//! - weeks 4-6: 5s / 3s / 531 again, after the first training-max bump
//! - week 7: deload
//!
//! Training maxes rise after every completed 3-week block, so the loads for
//! any session are recomputed from the base table plus the bump count.

use serde::{Serialize, Serializer};

pub const SESSIONS_PER_WEEK: u32 = 4;
pub const MACRO_CYCLE_LENGTH: u32 = 7;
pub const DELOAD_WEEK_TYPE: u8 = 4;
/// Smallest plate increment, in kg
pub const PLATE_UNIT: f64 = 2.0;

// ---------------------------------------------------------------------------
/// Lifts and their training-max tables
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Lift {
    Ohp,
    Deadlift,
    Bench,
    Squat,
}

impl Lift {
    /// Starting training max in kg
    pub fn base_training_max(&self) -> f64 {
        match self {
            Lift::Ohp => 58.0,
            Lift::Deadlift => 140.0,
            Lift::Bench => 76.0,
            Lift::Squat => 80.0,
        }
    }

    /// Added to the training max on every bump
    pub fn increment(&self) -> f64 {
        match self {
            Lift::Ohp | Lift::Bench => 2.0,
            Lift::Deadlift | Lift::Squat => 4.0,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Lift::Ohp => "ohp",
            Lift::Deadlift => "deadlift",
            Lift::Bench => "bench",
            Lift::Squat => "squat",
        }
    }
}

impl std::fmt::Display for Lift {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

// ---------------------------------------------------------------------------
/// Week prescriptions
// ---------------------------------------------------------------------------

/// Prescribed reps; `amrap` marks the "as many as possible" top set (5+)
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Reps {
    pub count: u8,
    pub amrap: bool,
}

impl Reps {
    const fn fixed(count: u8) -> Self {
        Self { count, amrap: false }
    }

    const fn plus(count: u8) -> Self {
        Self { count, amrap: true }
    }
}

impl std::fmt::Display for Reps {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.amrap {
            write!(f, "{}+", self.count)
        } else {
            write!(f, "{}", self.count)
        }
    }
}

impl Serialize for Reps {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.collect_str(self)
    }
}

struct WeekPlan {
    name: &'static str,
    sets: [(f64, Reps); 3],
}

static WEEK_PLANS: [WeekPlan; 4] = [
    WeekPlan {
        name: "Semana 5s",
        sets: [(0.65, Reps::fixed(5)), (0.75, Reps::fixed(5)), (0.85, Reps::plus(5))],
    },
    WeekPlan {
        name: "Semana 3s",
        sets: [(0.70, Reps::fixed(3)), (0.80, Reps::fixed(3)), (0.90, Reps::plus(3))],
    },
    WeekPlan {
        name: "Semana 531",
        sets: [(0.75, Reps::fixed(5)), (0.85, Reps::fixed(3)), (0.95, Reps::plus(1))],
    },
    WeekPlan {
        name: "Deload",
        sets: [(0.40, Reps::fixed(5)), (0.50, Reps::fixed(5)), (0.60, Reps::fixed(5))],
    },
];

fn week_plan(week_type: u8) -> Option<&'static WeekPlan> {
    match week_type {
        1..=4 => WEEK_PLANS.get(usize::from(week_type - 1)),
        _ => None,
    }
}

pub fn week_name(week_type: u8) -> &'static str {
    week_plan(week_type).map_or("?", |plan| plan.name)
}

// ---------------------------------------------------------------------------
/// Training days
// ---------------------------------------------------------------------------

struct TrainingDay {
    label: &'static str,
    lift: Lift,
    focus: &'static str,
}

static TRAINING_DAYS: [TrainingDay; 4] = [
    TrainingDay { label: "BBB Día 1 - OHP", lift: Lift::Ohp, focus: "Press + Hombros" },
    TrainingDay { label: "BBB Día 2 - Deadlift", lift: Lift::Deadlift, focus: "Peso Muerto" },
    TrainingDay { label: "BBB Día 3 - Bench", lift: Lift::Bench, focus: "Press de Banca" },
    TrainingDay { label: "BBB Día 4 - Zercher", lift: Lift::Squat, focus: "Sentadilla Zercher" },
];

/// Unknown day numbers fall back to day 1
fn training_day(day_number: u32) -> (u32, &'static TrainingDay) {
    match day_number {
        1..=4 => (day_number, &TRAINING_DAYS[(day_number - 1) as usize]),
        _ => (1, &TRAINING_DAYS[0]),
    }
}

// ---------------------------------------------------------------------------
/// Cycle State: where the athlete is in the macro-cycle
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CycleState {
    /// 1-7
    pub week_in_macro: u32,
    /// 1=5s, 2=3s, 3=531, 4=deload
    pub week_type: u8,
    pub week_name: String,
    pub macro_num: u32,
    pub tm_bumps_completed: u32,
    pub completed_weeks: u32,
}

impl CycleState {
    pub fn is_deload_week(&self) -> bool {
        self.week_type == DELOAD_WEEK_TYPE
    }

    /// `7 - week_in_macro`, clamped to 0 once the deload week has arrived
    pub fn days_until_deload(&self) -> u32 {
        MACRO_CYCLE_LENGTH.saturating_sub(self.week_in_macro)
    }
}

/// Week role within the macro-cycle: 1-3 as-is, 4-6 repeat 1-3, 7 is deload
pub fn week_type_for(week_in_macro: u32) -> u8 {
    match week_in_macro {
        1..=3 => week_in_macro as u8,
        4..=6 => (week_in_macro - 3) as u8,
        _ => DELOAD_WEEK_TYPE,
    }
}

/// Compute the cycle position after `total_sessions` sessions
pub fn cycle_state(total_sessions: u32) -> CycleState {
    let completed_weeks = total_sessions / SESSIONS_PER_WEEK;
    let macro_num = completed_weeks / MACRO_CYCLE_LENGTH + 1;
    let week_in_macro = completed_weeks % MACRO_CYCLE_LENGTH + 1;
    let week_type = week_type_for(week_in_macro);

    // Two bumps per finished macro-cycle, plus one per finished block in this one
    let mut tm_bumps_completed = 2 * (macro_num - 1);
    if week_in_macro > 3 {
        tm_bumps_completed += 1;
    }
    if week_in_macro > 6 {
        tm_bumps_completed += 1;
    }

    CycleState {
        week_in_macro,
        week_type,
        week_name: week_name(week_type).to_string(),
        macro_num,
        tm_bumps_completed,
        completed_weeks,
    }
}

// ---------------------------------------------------------------------------
/// Loads
// ---------------------------------------------------------------------------

pub fn effective_training_max(lift: Lift, tm_bumps: u32) -> f64 {
    lift.base_training_max() + lift.increment() * f64::from(tm_bumps)
}

/// Round to the nearest plate unit, ties to even (52.5 units -> 52)
pub fn round_to_plate(weight: f64) -> u32 {
    ((weight / PLATE_UNIT).round_ties_even() * PLATE_UNIT) as u32
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct WorkingSet {
    /// kg, always a multiple of the plate unit
    pub load: u32,
    pub reps: Reps,
    pub percentage: f64,
}

/// Working sets for `lift` in the given week type. `None` for an unknown week type.
pub fn expected_weights(lift: Lift, week_type: u8, tm_bumps: u32) -> Option<Vec<WorkingSet>> {
    let plan = week_plan(week_type)?;
    let tm = effective_training_max(lift, tm_bumps);

    Some(
        plan.sets
            .iter()
            .map(|&(percentage, reps)| WorkingSet {
                load: round_to_plate(tm * percentage),
                reps,
                percentage,
            })
            .collect(),
    )
}

// ---------------------------------------------------------------------------
/// Next Session
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextSession {
    pub day_number: u32,
    pub day_label: String,
    pub focus: String,
    pub main_lift: Lift,
    pub week_name: String,
    pub macro_num: u32,
    pub week_in_macro: u32,
    /// Still filled in on deload weeks; callers decide whether to show them
    pub working_sets: Vec<WorkingSet>,
}

pub fn next_session(day_number: u32, state: &CycleState) -> NextSession {
    let (day_number, day) = training_day(day_number);
    let working_sets =
        expected_weights(day.lift, state.week_type, state.tm_bumps_completed).unwrap_or_default();

    NextSession {
        day_number,
        day_label: day.label.to_string(),
        focus: day.focus.to_string(),
        main_lift: day.lift,
        week_name: state.week_name.clone(),
        macro_num: state.macro_num,
        week_in_macro: state.week_in_macro,
        working_sets,
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
