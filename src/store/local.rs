use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use super::{JobStore, StoreError};
use crate::models::{JobStatus, ReminderJob};

type JobMap = BTreeMap<String, ReminderJob>;

/// Jobs kept in a single pretty-printed JSON object (`id -> job`). Every
/// mutation reads the whole file and rewrites it; there is no locking.
#[derive(Debug, Clone)]
pub struct LocalJobStore {
  path: PathBuf,
}

impl LocalJobStore {
  /// Store backed by `<data_dir>/jobs.json`
  pub fn new(data_dir: impl AsRef<Path>) -> Self {
    Self {
      path: data_dir.as_ref().join("jobs.json"),
    }
  }

  pub fn path(&self) -> &Path {
    &self.path
  }

  fn load_all(&self) -> Result<JobMap, StoreError> {
    if !self.path.exists() {
      return Ok(JobMap::new());
    }
    let raw = fs::read_to_string(&self.path)?;
    if raw.trim().is_empty() {
      return Ok(JobMap::new());
    }
    Ok(serde_json::from_str(&raw)?)
  }

  fn save_all(&self, jobs: &JobMap) -> Result<(), StoreError> {
    if let Some(dir) = self.path.parent() {
      fs::create_dir_all(dir)?;
    }
    fs::write(&self.path, serde_json::to_string_pretty(jobs)?)?;
    Ok(())
  }

  fn collect(jobs: JobMap, keep: impl Fn(&ReminderJob) -> bool) -> Vec<ReminderJob> {
    let mut out: Vec<ReminderJob> = jobs.into_values().filter(|j| keep(j)).collect();
    out.sort_by(|a, b| a.created_at.cmp(&b.created_at).then_with(|| a.id.cmp(&b.id)));
    out
  }

  /// Persist the outcome of an evaluation. When the job is already stored
  /// only the bookkeeping fields are updated, so a job rebuilt from the
  /// remote store does not overwrite the richer local intent.
  pub fn record_evaluation(&self, job: &ReminderJob) -> Result<(), StoreError> {
    let mut jobs = self.load_all()?;
    match jobs.get_mut(&job.id) {
      Some(stored) => {
        stored.last_checked = job.last_checked;
        stored.trigger_count = job.trigger_count;
        if job.remote_id.is_some() {
          stored.remote_id.clone_from(&job.remote_id);
        }
      }
      None => {
        jobs.insert(job.id.clone(), job.clone());
      }
    }
    self.save_all(&jobs)
  }
}

impl JobStore for LocalJobStore {
  async fn save(&self, job: &mut ReminderJob) -> Result<(), StoreError> {
    let mut jobs = self.load_all()?;
    jobs.insert(job.id.clone(), job.clone());
    self.save_all(&jobs)
  }

  async fn get(&self, id: &str) -> Result<Option<ReminderJob>, StoreError> {
    Ok(self.load_all()?.remove(id))
  }

  async fn list_active(&self) -> Result<Vec<ReminderJob>, StoreError> {
    Ok(Self::collect(self.load_all()?, ReminderJob::is_active))
  }

  async fn list_for_user(&self, user_id: &str) -> Result<Vec<ReminderJob>, StoreError> {
    Ok(Self::collect(self.load_all()?, |j| j.user_id == user_id))
  }

  async fn set_status(&self, id: &str, status: JobStatus) -> Result<(), StoreError> {
    let mut jobs = self.load_all()?;
    match jobs.get_mut(id) {
      Some(job) => {
        job.status = status;
        self.save_all(&jobs)
      }
      None => Ok(()),
    }
  }
}
