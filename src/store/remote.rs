use chrono::{DateTime, Utc};

use super::{JobStore, StoreError};
use crate::models::{JobStatus, ReminderIntent, ReminderJob, TriggerType};
use crate::notion::{NewReminder, NotionClient, ReminderFilter, ReminderUpdate, RemoteReminder};
use crate::parser::{self, to_cron_job};

/// Mirror of reminder jobs in the Notion reminders database
#[derive(Debug, Clone)]
pub struct NotionJobStore {
  client: NotionClient,
  database_id: String,
}

/// Rebuild a job from its remote page. The remote schema only keeps the
/// title, kind and cron descriptor, so the action kind is recovered by
/// re-parsing the title and `action_data` comes back empty.
fn job_from_remote(record: RemoteReminder) -> Option<ReminderJob> {
  let Some(status) = JobStatus::from_remote_label(&record.status) else {
    tracing::warn!(page = %record.id, status = %record.status, "skipping reminder with unknown status");
    return None;
  };

  let id = if record.job_id.is_empty() {
    record.id.chars().take(8).collect()
  } else {
    record.job_id.clone()
  };

  let intent = ReminderIntent {
    trigger_type: TriggerType::from_remote_label(&record.kind),
    trigger_data: record
      .condition
      .as_ref()
      .map(|c| c.trigger_data())
      .unwrap_or_default(),
    action_type: parser::parse(&record.name).action_type,
    action_data: Default::default(),
    context_needed: record
      .condition
      .as_ref()
      .map(|c| c.context().to_vec())
      .unwrap_or_default(),
    raw_text: record.name,
  };

  Some(ReminderJob {
    id,
    user_id: record.user_id,
    intent,
    status,
    created_at: record
      .created_time
      .or(record.last_checked)
      .unwrap_or_else(Utc::now),
    last_checked: record.last_checked,
    trigger_count: record.trigger_count,
    remote_id: Some(record.id),
  })
}

impl NotionJobStore {
  pub fn new(client: NotionClient, database_id: impl Into<String>) -> Self {
    Self {
      client,
      database_id: database_id.into(),
    }
  }

  async fn query(&self, filter: ReminderFilter<'_>) -> Result<Vec<ReminderJob>, StoreError> {
    let records = self.client.query_reminders(&self.database_id, &filter).await?;
    Ok(records.into_iter().filter_map(job_from_remote).collect())
  }

  /// Record an evaluation on the remote page. With `increment` the remote
  /// counter is read back and bumped, since it may differ from the local one.
  pub async fn record_check(
    &self,
    remote_id: &str,
    checked_at: DateTime<Utc>,
    increment: bool,
  ) -> Result<(), StoreError> {
    let trigger_count = if increment {
      let current = self.client.get_reminder(remote_id).await?;
      Some(current.trigger_count.saturating_add(1))
    } else {
      None
    };

    self
      .client
      .update_reminder(
        remote_id,
        &ReminderUpdate {
          status: None,
          last_checked: Some(checked_at),
          trigger_count,
        },
      )
      .await?;
    Ok(())
  }
}

impl JobStore for NotionJobStore {
  async fn save(&self, job: &mut ReminderJob) -> Result<(), StoreError> {
    let descriptor = to_cron_job(&job.intent);
    let page_id = self
      .client
      .create_reminder(
        &self.database_id,
        &NewReminder {
          name: &job.intent.raw_text,
          kind: job.intent.trigger_type.remote_label(),
          condition: &descriptor,
          user_id: &job.user_id,
          job_id: &job.id,
        },
      )
      .await?;

    tracing::debug!(job = %job.id, page = %page_id, "reminder mirrored to Notion");
    job.remote_id = Some(page_id);
    Ok(())
  }

  async fn get(&self, id: &str) -> Result<Option<ReminderJob>, StoreError> {
    let mut jobs = self
      .query(ReminderFilter { job_id: Some(id), ..Default::default() })
      .await?;
    Ok(if jobs.is_empty() { None } else { Some(jobs.remove(0)) })
  }

  async fn list_active(&self) -> Result<Vec<ReminderJob>, StoreError> {
    self
      .query(ReminderFilter {
        status: Some(JobStatus::Active.remote_label()),
        ..Default::default()
      })
      .await
  }

  async fn list_for_user(&self, user_id: &str) -> Result<Vec<ReminderJob>, StoreError> {
    self
      .query(ReminderFilter { user_id: Some(user_id), ..Default::default() })
      .await
  }

  async fn set_status(&self, id: &str, status: JobStatus) -> Result<(), StoreError> {
    let Some(job) = self.get(id).await? else {
      return Ok(());
    };
    let Some(page_id) = job.remote_id.as_deref() else {
      return Ok(());
    };

    self
      .client
      .update_reminder(
        page_id,
        &ReminderUpdate {
          status: Some(status.remote_label()),
          last_checked: Some(Utc::now()),
          trigger_count: None,
        },
      )
      .await?;
    Ok(())
  }
}
