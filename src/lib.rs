pub mod cli;
pub mod commands;
pub mod config;
pub mod context;
pub mod cron;
pub mod cycle;
pub mod dashboard;
pub mod models;
pub mod notion;
pub mod parser;
pub mod scheduler;
pub mod store;

#[cfg(test)]
pub mod test_utils;

pub use config::{Config, ConfigError};
pub use context::{ContextBuilder, WorkoutContext};
pub use parser::parse;
pub use scheduler::{Scheduler, SchedulerError, TriggeredJob};
