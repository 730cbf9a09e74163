//! Persistence of reminder jobs
//!
//! `LocalJobStore` is the source of truth and must succeed; `NotionJobStore`
//! mirrors jobs remotely and its failures are tolerated by the scheduler.

mod local;
mod remote;

pub use local::LocalJobStore;
pub use remote::NotionJobStore;

use crate::models::{JobStatus, ReminderJob};
use crate::notion::NotionError;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
  #[error("Job file I/O failed: {0}")]
  Io(#[from] std::io::Error),

  #[error("Job file is not valid JSON: {0}")]
  Json(#[from] serde_json::Error),

  #[error("Remote store error: {0}")]
  Notion(#[from] NotionError),
}

/// Shared surface of the local and remote job stores
#[allow(async_fn_in_trait)]
pub trait JobStore {
  /// Insert or replace `job`. Backends may write back identifiers they assign.
  async fn save(&self, job: &mut ReminderJob) -> Result<(), StoreError>;

  async fn get(&self, id: &str) -> Result<Option<ReminderJob>, StoreError>;

  async fn list_active(&self) -> Result<Vec<ReminderJob>, StoreError>;

  async fn list_for_user(&self, user_id: &str) -> Result<Vec<ReminderJob>, StoreError>;

  /// Unknown ids are a no-op
  async fn set_status(&self, id: &str, status: JobStatus) -> Result<(), StoreError>;
}
