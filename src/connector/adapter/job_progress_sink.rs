//! Bridges the indexer's `{start, progress, complete, error}` event stream
//! (§4.3) onto a job record on disk, so the out-of-process worker (§4.7)
//! can report back through the same `JobManagerUseCase::update_job` path a
//! foreground caller would use. Percent is derived from `current/total`,
//! matching §4.7's "partial progress is reported via percent monotonically
//! increasing".

use std::sync::Arc;

use async_trait::async_trait;
use tracing::warn;

use crate::application::{IndexProgressEvent, JobManagerUseCase, ProgressSink};
use crate::domain::JobStatus;

pub struct JobProgressSink {
    job_manager: Arc<JobManagerUseCase>,
    job_id: String,
}

impl JobProgressSink {
    pub fn new(job_manager: Arc<JobManagerUseCase>, job_id: impl Into<String>) -> Self {
        Self {
            job_manager,
            job_id: job_id.into(),
        }
    }
}

#[async_trait]
impl ProgressSink for JobProgressSink {
    /// Only `Start`/`Progress` update the job here; `Complete` and `Error`
    /// are left to the worker binary, which knows the run's final
    /// `IndexOutcome` (including whether it was cancelled) and picks the
    /// correct terminal status once — doing it here too would race the
    /// explicit `cancel_job` transition and hit the monotonic-status guard.
    async fn report(&self, event: IndexProgressEvent) {
        let (status, message, percent) = match event {
            IndexProgressEvent::Start { total_files } => (Some(JobStatus::Running), Some(format!("indexing {total_files} files")), Some(0)),
            IndexProgressEvent::Progress { current, total, file } => {
                let percent = if total == 0 { 0 } else { ((current * 100) / total).min(99) as u8 };
                (None, Some(format!("indexing {file}")), Some(percent))
            }
            IndexProgressEvent::Complete { .. } | IndexProgressEvent::Error { .. } => return,
        };

        if let Err(err) = self.job_manager.update_job(&self.job_id, status, message, percent, None).await {
            warn!(job_id = %self.job_id, error = %err, "failed to persist job progress");
        }
    }
}
