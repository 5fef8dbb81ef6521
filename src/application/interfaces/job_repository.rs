use async_trait::async_trait;

use crate::domain::{DomainError, Job, JobStatus};

/// Persistence for job records under `jobs/<jobId>.json`, written
/// atomically (write-then-rename) by whoever mutates a job (§4.7).
#[async_trait]
pub trait JobRepository: Send + Sync {
    async fn save(&self, job: &Job) -> Result<(), DomainError>;

    async fn get(&self, id: &str) -> Result<Option<Job>, DomainError>;

    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<Job>, DomainError>;

    async fn list_active(&self) -> Result<Vec<Job>, DomainError>;
}
