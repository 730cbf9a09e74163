pub mod reminder;
pub mod workout;

pub use reminder::{ActionType, JobStatus, Params, ReminderIntent, ReminderJob, TriggerType};
pub use workout::{NewWorkout, SessionFact};
