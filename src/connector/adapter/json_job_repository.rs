//! `JobRepository` backed by one JSON file per job under `jobs/<jobId>.json`
//! (§4.7, §6), written atomically. `list`/`list_active` scan the directory
//! rather than maintaining a separate index — job counts are small enough
//! (one file per in-flight or recently finished operation) that a directory
//! listing is simpler than a secondary index to keep consistent.

use std::path::PathBuf;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::JobRepository;
use crate::domain::{DomainError, Job, JobStatus};

use super::json_fs::{atomic_write_json, read_json_opt};

pub struct JsonJobRepository {
    dir: PathBuf,
    lock: Mutex<()>,
}

impl JsonJobRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: data_dir.into().join("jobs"),
            lock: Mutex::new(()),
        }
    }

    fn job_path(&self, id: &str) -> PathBuf {
        self.dir.join(format!("{id}.json"))
    }
}

#[async_trait]
impl JobRepository for JsonJobRepository {
    async fn save(&self, job: &Job) -> Result<(), DomainError> {
        let _guard = self.lock.lock().await;
        atomic_write_json(&self.job_path(job.id()), job)
    }

    async fn get(&self, id: &str) -> Result<Option<Job>, DomainError> {
        let _guard = self.lock.lock().await;
        read_json_opt(&self.job_path(id))
    }

    async fn list(&self, status: Option<JobStatus>) -> Result<Vec<Job>, DomainError> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.read_all_locked()?;
        if let Some(status) = status {
            jobs.retain(|j| j.status() == status);
        }
        jobs.sort_by_key(|j| std::cmp::Reverse(j.created_at()));
        Ok(jobs)
    }

    async fn list_active(&self) -> Result<Vec<Job>, DomainError> {
        let _guard = self.lock.lock().await;
        let mut jobs = self.read_all_locked()?;
        jobs.retain(|j| j.is_active());
        jobs.sort_by_key(|j| std::cmp::Reverse(j.created_at()));
        Ok(jobs)
    }
}

impl JsonJobRepository {
    fn read_all_locked(&self) -> Result<Vec<Job>, DomainError> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut jobs = Vec::new();
        for entry in std::fs::read_dir(&self.dir).map_err(|e| DomainError::fatal(format!("failed to read jobs directory: {e}")))? {
            let entry = entry.map_err(|e| DomainError::fatal(format!("failed to read jobs directory entry: {e}")))?;
            let path = entry.path();
            if path.extension().and_then(|e| e.to_str()) != Some("json") {
                continue;
            }
            if let Some(job) = read_json_opt::<Job>(&path)? {
                jobs.push(job);
            }
        }
        Ok(jobs)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{JobDetails, JobType};
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_then_get_roundtrips() {
        let dir = tempdir().unwrap();
        let repo = JsonJobRepository::new(dir.path());
        let job = Job::new(JobType::Index, JobDetails::default(), "queued");
        repo.save(&job).await.unwrap();

        let fetched = repo.get(job.id()).await.unwrap().unwrap();
        assert_eq!(fetched.id(), job.id());
    }

    #[tokio::test]
    async fn get_missing_job_is_none() {
        let dir = tempdir().unwrap();
        let repo = JsonJobRepository::new(dir.path());
        assert!(repo.get("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_filters_by_status() {
        let dir = tempdir().unwrap();
        let repo = JsonJobRepository::new(dir.path());
        let mut running = Job::new(JobType::Index, JobDetails::default(), "start");
        running.apply_update(Some(JobStatus::Running), None, None, None).unwrap();
        let pending = Job::new(JobType::Index, JobDetails::default(), "queued");
        repo.save(&running).await.unwrap();
        repo.save(&pending).await.unwrap();

        let running_jobs = repo.list(Some(JobStatus::Running)).await.unwrap();
        assert_eq!(running_jobs.len(), 1);
        assert_eq!(running_jobs[0].id(), running.id());
    }

    #[tokio::test]
    async fn list_active_excludes_terminal_jobs() {
        let dir = tempdir().unwrap();
        let repo = JsonJobRepository::new(dir.path());
        let mut done = Job::new(JobType::Index, JobDetails::default(), "start");
        done.apply_update(Some(JobStatus::Completed), None, Some(100), None).unwrap();
        let pending = Job::new(JobType::Index, JobDetails::default(), "queued");
        repo.save(&done).await.unwrap();
        repo.save(&pending).await.unwrap();

        let active = repo.list_active().await.unwrap();
        assert_eq!(active.len(), 1);
        assert_eq!(active[0].id(), pending.id());
    }
}
