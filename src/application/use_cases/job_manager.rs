//! Job lifecycle orchestration (§4.7): create, list, fetch, cancel. All
//! status/percent mutation goes through `Job::apply_update` so the
//! monotonic-transition guard is enforced in exactly one place.

use std::sync::Arc;

use crate::application::JobRepository;
use crate::domain::{DomainError, Job, JobDetails, JobStatus, JobType};

pub struct JobManagerUseCase {
    jobs: Arc<dyn JobRepository>,
}

impl JobManagerUseCase {
    pub fn new(jobs: Arc<dyn JobRepository>) -> Self {
        Self { jobs }
    }

    pub async fn create_job(&self, job_type: JobType, details: JobDetails, message: impl Into<String>) -> Result<Job, DomainError> {
        let job = Job::new(job_type, details, message);
        self.jobs.save(&job).await?;
        Ok(job)
    }

    pub async fn get_job(&self, id: &str) -> Result<Job, DomainError> {
        self.jobs
            .get(id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("no job '{id}'")))
    }

    pub async fn list_jobs(&self, status: Option<JobStatus>) -> Result<Vec<Job>, DomainError> {
        self.jobs.list(status).await
    }

    pub async fn list_active_jobs(&self) -> Result<Vec<Job>, DomainError> {
        self.jobs.list_active().await
    }

    pub async fn update_job(
        &self,
        id: &str,
        status: Option<JobStatus>,
        message: Option<String>,
        percent: Option<u8>,
        error: Option<String>,
    ) -> Result<Job, DomainError> {
        let mut job = self.get_job(id).await?;
        job.apply_update(status, message, percent, error)?;
        self.jobs.save(&job).await?;
        Ok(job)
    }

    /// Cancels a job if it is still pending or running. Cancelling an
    /// already-terminal job is a validation error, not a no-op, so a caller
    /// racing a completion finds out rather than silently doing nothing.
    pub async fn cancel_job(&self, id: &str) -> Result<Job, DomainError> {
        self.update_job(id, Some(JobStatus::Cancelled), Some("cancelled by caller".into()), None, None)
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryJobs {
        jobs: Mutex<HashMap<String, Job>>,
    }

    #[async_trait]
    impl JobRepository for InMemoryJobs {
        async fn save(&self, job: &Job) -> Result<(), DomainError> {
            self.jobs.lock().unwrap().insert(job.id().to_string(), job.clone());
            Ok(())
        }
        async fn get(&self, id: &str) -> Result<Option<Job>, DomainError> {
            Ok(self.jobs.lock().unwrap().get(id).cloned())
        }
        async fn list(&self, status: Option<JobStatus>) -> Result<Vec<Job>, DomainError> {
            let jobs = self.jobs.lock().unwrap();
            Ok(jobs
                .values()
                .filter(|j| status.map(|s| j.status() == s).unwrap_or(true))
                .cloned()
                .collect())
        }
        async fn list_active(&self) -> Result<Vec<Job>, DomainError> {
            Ok(self.jobs.lock().unwrap().values().filter(|j| j.is_active()).cloned().collect())
        }
    }

    fn use_case() -> JobManagerUseCase {
        JobManagerUseCase::new(Arc::new(InMemoryJobs::default()))
    }

    #[tokio::test]
    async fn create_and_fetch() {
        let use_case = use_case();
        let job = use_case.create_job(JobType::Index, JobDetails::default(), "queued").await.unwrap();
        let fetched = use_case.get_job(job.id()).await.unwrap();
        assert_eq!(fetched.status(), JobStatus::Pending);
    }

    #[tokio::test]
    async fn update_progresses_status() {
        let use_case = use_case();
        let job = use_case.create_job(JobType::Index, JobDetails::default(), "queued").await.unwrap();
        let updated = use_case
            .update_job(job.id(), Some(JobStatus::Running), Some("indexing".into()), Some(10), None)
            .await
            .unwrap();
        assert_eq!(updated.status(), JobStatus::Running);
        assert_eq!(updated.percent(), 10);
    }

    #[tokio::test]
    async fn cancel_terminal_job_fails() {
        let use_case = use_case();
        let job = use_case.create_job(JobType::Index, JobDetails::default(), "queued").await.unwrap();
        use_case
            .update_job(job.id(), Some(JobStatus::Completed), None, Some(100), None)
            .await
            .unwrap();
        let err = use_case.cancel_job(job.id()).await.unwrap_err();
        assert!(err.is_validation());
    }

    #[tokio::test]
    async fn list_active_excludes_terminal() {
        let use_case = use_case();
        let a = use_case.create_job(JobType::Index, JobDetails::default(), "a").await.unwrap();
        let b = use_case.create_job(JobType::Index, JobDetails::default(), "b").await.unwrap();
        use_case
            .update_job(b.id(), Some(JobStatus::Completed), None, Some(100), None)
            .await
            .unwrap();
        let active = use_case.list_active_jobs().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), a.id());
    }
}
