//! Out-of-process indexing worker (§4.7): spawned once per job by
//! `connector::commands::dispatch("store:index", ...)`, reads the job id from
//! `argv[1]` and the data directory from `CODESEARCH_DATA_DIR`, runs the
//! indexer, and reports back exclusively by rewriting `jobs/<id>.json`
//! (write-then-rename, via `JsonJobRepository`). Never talks to its parent
//! over stdio; the job record is the entire contract.

use std::sync::Arc;
use std::time::Duration;

use coderetrieval::application::{FlagCancellationToken, JobManagerUseCase, ProgressSink};
use coderetrieval::connector::adapter::JobProgressSink;
use coderetrieval::connector::config::{Config, DATA_DIR_ENV_VAR};
use coderetrieval::connector::container::{Container, ContainerConfig};
use coderetrieval::domain::{JobStatus, JobType};
use tracing::{error, info, warn};

/// How often the cancellation-watcher polls the job record on disk.
const CANCEL_POLL_INTERVAL: Duration = Duration::from_millis(500);

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt().with_target(false).init();

    let job_id = match std::env::args().nth(1) {
        Some(id) => id,
        None => {
            error!("usage: coderetrieval-worker <job-id>");
            std::process::exit(1);
        }
    };

    let data_dir = std::env::var(DATA_DIR_ENV_VAR).unwrap_or_else(|_| Config::resolve(None, false).data_dir.to_string_lossy().to_string());

    if let Err(err) = run(&job_id, data_dir).await {
        error!(job_id = %job_id, error = %err, "worker exited with an error");
        std::process::exit(1);
    }
}

async fn run(job_id: &str, data_dir: String) -> anyhow::Result<()> {
    let container = Container::new(ContainerConfig::new(data_dir))?;
    let job_manager = Arc::new(container.job_manager_use_case());

    let job = job_manager.get_job(job_id).await?;
    let store_id = job
        .details()
        .store_id
        .clone()
        .ok_or_else(|| anyhow::anyhow!("job '{job_id}' has no store id attached"))?;
    let store = container.store_catalog_use_case().get(&store_id).await?;
    let force = job.details().source.as_deref() == Some("force=true");

    job_manager
        .update_job(job_id, Some(JobStatus::Running), Some("worker started".to_string()), Some(0), None)
        .await?;

    let cancellation = Arc::new(FlagCancellationToken::new());
    let watcher = spawn_cancellation_watcher(job_manager.clone(), job_id.to_string(), cancellation.clone());

    let progress: Arc<dyn ProgressSink> = Arc::new(JobProgressSink::new(job_manager.clone(), job_id.to_string()));
    let outcome = match job.job_type() {
        JobType::Index => {
            container
                .index_store_use_case()
                .execute_cancellable(&store, force, progress, cancellation.clone())
                .await
        }
        JobType::Clone => {
            // Cloning a remote is handled outside this crate (§1 "version
            // bumpers / export-import / quality harness → not built" covers
            // the adjacent out-of-scope collaborators); a `Clone` job only
            // ever builds the code graph for an already-materialized tree.
            container.build_code_graph_use_case().execute(&store).await.map(|_| coderetrieval::application::IndexOutcome {
                documents_indexed: 0,
                chunks_created: 0,
                time_ms: 0,
                cancelled: false,
            })
        }
    };

    watcher.abort();

    match outcome {
        Ok(result) if result.cancelled => {
            info!(job_id, "index run observed cancellation");
            finalize_status(&job_manager, job_id, JobStatus::Cancelled, "cancelled mid-run".to_string(), Some(100), None).await;
        }
        Ok(result) => {
            info!(job_id, documents_indexed = result.documents_indexed, chunks_created = result.chunks_created, "index run completed");
            finalize_status(
                &job_manager,
                job_id,
                JobStatus::Completed,
                format!("indexed {} documents, {} chunks", result.documents_indexed, result.chunks_created),
                Some(100),
                None,
            )
            .await;
        }
        Err(err) => {
            warn!(job_id, error = %err, "index run failed");
            finalize_status(&job_manager, job_id, JobStatus::Failed, err.to_string(), None, Some(err.to_string())).await;
        }
    }

    Ok(())
}

/// Applies the run's final status. A rejected transition means an external
/// `cancel_job` call already moved the job to a terminal state before this
/// worker got to it — the cancellation watcher already observed that race,
/// so it is logged, not propagated as a worker failure.
async fn finalize_status(job_manager: &JobManagerUseCase, job_id: &str, status: JobStatus, message: String, percent: Option<u8>, error: Option<String>) {
    if let Err(err) = job_manager.update_job(job_id, Some(status), Some(message), percent, error).await {
        warn!(job_id, status = ?status, error = %err, "final job status update rejected; job already left in a terminal state");
    }
}

/// Polls the job record for an externally-set `Cancelled` status and flips
/// `cancellation` once observed. Runs until the index run finishes (the
/// caller aborts this task right after `execute_cancellable` returns).
fn spawn_cancellation_watcher(
    job_manager: Arc<JobManagerUseCase>,
    job_id: String,
    cancellation: Arc<FlagCancellationToken>,
) -> tokio::task::JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            tokio::time::sleep(CANCEL_POLL_INTERVAL).await;
            match job_manager.get_job(&job_id).await {
                Ok(job) if job.status() == JobStatus::Cancelled => {
                    cancellation.cancel();
                    break;
                }
                Ok(_) => continue,
                Err(err) => {
                    warn!(job_id = %job_id, error = %err, "cancellation watcher failed to read job record");
                    break;
                }
            }
        }
    })
}
