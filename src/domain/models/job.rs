use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::domain::DomainError;

use super::store::current_timestamp;

/// The kind of asynchronous work a job represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobType {
    Index,
    Clone,
}

/// `pending → running → (completed | failed | cancelled)`. Transitions are
/// strictly monotonic; terminal states are immutable (§3 "Job").
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
    Cancelled,
}

impl JobStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed | JobStatus::Cancelled)
    }

    /// Whether transitioning from `self` to `next` is a legal move.
    pub fn can_transition_to(&self, next: JobStatus) -> bool {
        use JobStatus::*;
        if self.is_terminal() {
            return false;
        }
        matches!(
            (self, next),
            (Pending, Running)
                | (Pending, Cancelled)
                | (Pending, Failed)
                | (Running, Completed)
                | (Running, Failed)
                | (Running, Cancelled)
        )
    }
}

/// Store-identifying details attached to a job record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct JobDetails {
    pub store_name: Option<String>,
    pub store_id: Option<String>,
    pub source: Option<String>,
}

/// Durable record describing one asynchronous indexing or cloning operation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Job {
    id: String,
    job_type: JobType,
    status: JobStatus,
    message: String,
    percent: u8,
    error: Option<String>,
    created_at: i64,
    updated_at: i64,
    details: JobDetails,
}

impl Job {
    pub fn new(job_type: JobType, details: JobDetails, message: impl Into<String>) -> Self {
        let now = current_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            job_type,
            status: JobStatus::Pending,
            message: message.into(),
            percent: 0,
            error: None,
            created_at: now,
            updated_at: now,
            details,
        }
    }

    /// Reconstitutes from persisted data (used by the job repository adapter).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        job_type: JobType,
        status: JobStatus,
        message: String,
        percent: u8,
        error: Option<String>,
        created_at: i64,
        updated_at: i64,
        details: JobDetails,
    ) -> Self {
        Self {
            id,
            job_type,
            status,
            message,
            percent,
            error,
            created_at,
            updated_at,
            details,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn job_type(&self) -> JobType {
        self.job_type
    }

    pub fn status(&self) -> JobStatus {
        self.status
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub fn percent(&self) -> u8 {
        self.percent
    }

    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn details(&self) -> &JobDetails {
        &self.details
    }

    pub fn is_active(&self) -> bool {
        matches!(self.status, JobStatus::Pending | JobStatus::Running)
    }

    /// Applies a status/message/percent/error update, enforcing the
    /// monotonic status guard and the "percent only increases" rule (§4.7).
    /// Rejected updates return a validation error rather than silently
    /// clamping, so a buggy caller is surfaced rather than masked.
    pub fn apply_update(
        &mut self,
        status: Option<JobStatus>,
        message: Option<String>,
        percent: Option<u8>,
        error: Option<String>,
    ) -> Result<(), DomainError> {
        if let Some(next) = status {
            if next != self.status {
                if !self.status.can_transition_to(next) {
                    return Err(DomainError::invalid_input(format!(
                        "illegal job transition {:?} -> {:?}",
                        self.status, next
                    )));
                }
                self.status = next;
            }
        }
        if let Some(pct) = percent {
            if pct < self.percent {
                return Err(DomainError::invalid_input(format!(
                    "job percent must be monotonically increasing: {} -> {}",
                    self.percent, pct
                )));
            }
            self.percent = pct;
        }
        if let Some(msg) = message {
            self.message = msg;
        }
        if error.is_some() {
            self.error = error;
        }
        self.updated_at = current_timestamp();
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fresh() -> Job {
        Job::new(JobType::Index, JobDetails::default(), "queued")
    }

    #[test]
    fn pending_to_running_to_completed() {
        let mut job = fresh();
        job.apply_update(Some(JobStatus::Running), None, None, None).unwrap();
        assert_eq!(job.status(), JobStatus::Running);
        job.apply_update(Some(JobStatus::Completed), None, Some(100), None)
            .unwrap();
        assert_eq!(job.status(), JobStatus::Completed);
    }

    #[test]
    fn terminal_states_reject_further_transitions() {
        let mut job = fresh();
        job.apply_update(Some(JobStatus::Cancelled), None, None, None).unwrap();
        let err = job
            .apply_update(Some(JobStatus::Running), None, None, None)
            .unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn percent_must_not_decrease() {
        let mut job = fresh();
        job.apply_update(None, None, Some(50), None).unwrap();
        let err = job.apply_update(None, None, Some(10), None).unwrap_err();
        assert!(err.is_validation());
    }

    #[test]
    fn cancel_only_valid_from_pending_or_running() {
        let mut job = fresh();
        job.apply_update(Some(JobStatus::Completed), None, Some(100), None)
            .unwrap();
        let err = job
            .apply_update(Some(JobStatus::Cancelled), None, None, None)
            .unwrap_err();
        assert!(err.is_validation());
    }
}
