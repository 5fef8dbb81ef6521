//! The `execute` subcommand registry (§6): a fixed set of named operations
//! dispatched by both the MCP `execute` tool and the CLI's non-search
//! subcommands, so the two surfaces never drift apart. Mirrors the donor's
//! own single-table-of-routes style (it dispatched HTTP routes to
//! controllers; this dispatches command names to handlers over the same
//! `Container`).

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::warn;

use crate::connector::config::DATA_DIR_ENV_VAR;
use crate::connector::container::Container;
use crate::domain::{DomainError, Job, JobDetails, JobStatus, JobType, Store, StoreKind};

/// Name and one-line description of a registered command, returned by the
/// `help`/`commands` entries so a caller can discover the surface without
/// reading documentation.
#[derive(Debug, Clone, Serialize)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
}

pub const COMMANDS: &[CommandSpec] = &[
    CommandSpec { name: "stores", description: "list every store in the catalog" },
    CommandSpec { name: "store:info", description: "look up one store by id or name" },
    CommandSpec {
        name: "store:create",
        description: "register a new store ({name, kind: file|repo|web, path?, url?, branch?, depth?})",
    },
    CommandSpec {
        name: "store:index",
        description: "spawn a background index job for a store ({idOrName, force?})",
    },
    CommandSpec { name: "store:delete", description: "cascade-delete a store ({idOrName})" },
    CommandSpec { name: "jobs", description: "list jobs, optionally only active ones ({activeOnly?})" },
    CommandSpec { name: "job:status", description: "look up one job by id ({id})" },
    CommandSpec { name: "job:cancel", description: "cancel a pending or running job ({id})" },
    CommandSpec { name: "help", description: "list every registered command" },
    CommandSpec { name: "commands", description: "alias for help" },
];

#[derive(Debug, Serialize)]
pub struct StoreOutput {
    pub id: String,
    pub name: String,
    pub kind: String,
    pub root_path: Option<String>,
    pub status: String,
}

impl From<&Store> for StoreOutput {
    fn from(store: &Store) -> Self {
        let status = match store.status() {
            crate::domain::IndexingStatus::NotIndexed => "not_indexed".to_string(),
            crate::domain::IndexingStatus::Indexing => "indexing".to_string(),
            crate::domain::IndexingStatus::Indexed => "indexed".to_string(),
            crate::domain::IndexingStatus::Failed { reason } => format!("failed: {reason}"),
        };
        Self {
            id: store.id().to_string(),
            name: store.name().to_string(),
            kind: store.type_name().to_string(),
            root_path: store.kind().root_path().map(str::to_string),
            status,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct JobOutput {
    pub id: String,
    pub job_type: &'static str,
    pub status: &'static str,
    pub message: String,
    pub percent: u8,
    pub error: Option<String>,
}

impl From<&Job> for JobOutput {
    fn from(job: &Job) -> Self {
        Self {
            id: job.id().to_string(),
            job_type: match job.job_type() {
                JobType::Index => "index",
                JobType::Clone => "clone",
            },
            status: match job.status() {
                JobStatus::Pending => "pending",
                JobStatus::Running => "running",
                JobStatus::Completed => "completed",
                JobStatus::Failed => "failed",
                JobStatus::Cancelled => "cancelled",
            },
            message: job.message().to_string(),
            percent: job.percent(),
            error: job.error().map(str::to_string),
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoreCreateArgs {
    name: String,
    kind: String,
    path: Option<String>,
    url: Option<String>,
    branch: Option<String>,
    depth: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct IdOrNameArgs {
    id_or_name: String,
}

#[derive(Debug, Deserialize, Default)]
#[serde(rename_all = "camelCase")]
struct StoreIndexArgs {
    id_or_name: String,
    #[serde(default)]
    force: bool,
}

#[derive(Debug, Deserialize, Default)]
struct JobsArgs {
    #[serde(default)]
    active_only: bool,
}

#[derive(Debug, Deserialize)]
struct IdArgs {
    id: String,
}

fn parse_args<T: serde::de::DeserializeOwned>(args: Value) -> Result<T, DomainError> {
    serde_json::from_value(args).map_err(|err| DomainError::invalid_input(format!("malformed arguments: {err}")))
}

fn store_kind_from_args(args: &StoreCreateArgs) -> Result<StoreKind, DomainError> {
    match args.kind.as_str() {
        "file" => {
            let path = args.path.clone().ok_or_else(|| DomainError::invalid_input("a file store requires 'path'"))?;
            Ok(StoreKind::File { path })
        }
        "repo" => {
            let url = args.url.clone().ok_or_else(|| DomainError::invalid_input("a repo store requires 'url'"))?;
            let path = args.path.clone().ok_or_else(|| DomainError::invalid_input("a repo store requires 'path'"))?;
            Ok(StoreKind::Repo { url, branch: args.branch.clone(), path })
        }
        "web" => {
            let url = args.url.clone().ok_or_else(|| DomainError::invalid_input("a web store requires 'url'"))?;
            Ok(StoreKind::Web { url, depth: args.depth.unwrap_or(1) })
        }
        other => Err(DomainError::invalid_input(format!("unknown store kind '{other}'; expected file, repo, or web"))),
    }
}

/// Dispatches one `execute` invocation by name, returning the command's
/// result as a JSON value so both the MCP tool and the CLI can render it.
pub async fn dispatch(container: &Container, name: &str, args: Value) -> Result<Value, DomainError> {
    match name {
        "stores" => {
            let stores = container.store_catalog_use_case().list().await?;
            let out: Vec<StoreOutput> = stores.iter().map(StoreOutput::from).collect();
            Ok(serde_json::to_value(out)?)
        }
        "store:info" => {
            let args: IdOrNameArgs = parse_args(args)?;
            let store = container.store_catalog_use_case().get(&args.id_or_name).await?;
            Ok(serde_json::to_value(StoreOutput::from(&store))?)
        }
        "store:create" => {
            let args: StoreCreateArgs = parse_args(args)?;
            let kind = store_kind_from_args(&args)?;
            let store = container.store_catalog_use_case().create(args.name, kind).await?;
            Ok(serde_json::to_value(StoreOutput::from(&store))?)
        }
        "store:index" => {
            let args: StoreIndexArgs = parse_args(args)?;
            let store = container.store_catalog_use_case().get(&args.id_or_name).await?;
            let job = container
                .job_manager_use_case()
                .create_job(
                    JobType::Index,
                    JobDetails {
                        store_name: Some(store.name().to_string()),
                        store_id: Some(store.id().to_string()),
                        source: Some(format!("force={}", args.force)),
                    },
                    "queued",
                )
                .await?;
            spawn_worker(container.data_dir(), job.id())?;
            Ok(serde_json::to_value(JobOutput::from(&job))?)
        }
        "store:delete" => {
            let args: IdOrNameArgs = parse_args(args)?;
            container.store_catalog_use_case().delete(&args.id_or_name).await?;
            Ok(serde_json::json!({ "deleted": true }))
        }
        "jobs" => {
            let args: JobsArgs = parse_args(args).unwrap_or_default();
            let job_manager = container.job_manager_use_case();
            let jobs = if args.active_only { job_manager.list_active_jobs().await? } else { job_manager.list_jobs(None).await? };
            let out: Vec<JobOutput> = jobs.iter().map(JobOutput::from).collect();
            Ok(serde_json::to_value(out)?)
        }
        "job:status" => {
            let args: IdArgs = parse_args(args)?;
            let job = container.job_manager_use_case().get_job(&args.id).await?;
            Ok(serde_json::to_value(JobOutput::from(&job))?)
        }
        "job:cancel" => {
            let args: IdArgs = parse_args(args)?;
            let job = container.job_manager_use_case().cancel_job(&args.id).await?;
            Ok(serde_json::to_value(JobOutput::from(&job))?)
        }
        "help" | "commands" => Ok(serde_json::to_value(COMMANDS)?),
        other => Err(DomainError::invalid_input(format!("unknown command '{other}'; see 'help' for the registered list"))),
    }
}

/// Spawns the out-of-process worker for `job_id` (§4.7): the job id as its
/// sole argument, the data directory via `CODESEARCH_DATA_DIR`. The child is
/// detached — we never await it, and it reports back solely by rewriting the
/// job record on disk.
fn spawn_worker(data_dir: &Path, job_id: &str) -> Result<(), DomainError> {
    let worker_path = worker_binary_path()?;
    let mut command = tokio::process::Command::new(worker_path);
    command
        .arg(job_id)
        .env(DATA_DIR_ENV_VAR, data_dir)
        .stdin(std::process::Stdio::null())
        .stdout(std::process::Stdio::null())
        .stderr(std::process::Stdio::null());

    match command.spawn() {
        Ok(mut child) => {
            // Detached: we deliberately never `.wait()` on the child. Drop the
            // handle so the runtime doesn't keep a zombie-reaping task alive
            // for a process we track purely through its job record.
            let job_id = job_id.to_string();
            tokio::spawn(async move {
                if let Err(err) = child.wait().await {
                    warn!(job_id = %job_id, error = %err, "failed to reap worker process");
                }
            });
            Ok(())
        }
        Err(err) => Err(DomainError::fatal(format!("failed to spawn worker for job '{job_id}': {err}"))),
    }
}

fn worker_binary_path() -> Result<PathBuf, DomainError> {
    let exe = std::env::current_exe().map_err(|err| DomainError::internal(format!("cannot resolve current executable: {err}")))?;
    let dir = exe.parent().ok_or_else(|| DomainError::internal("current executable has no parent directory"))?;
    let name = if cfg!(windows) { "coderetrieval-worker.exe" } else { "coderetrieval-worker" };
    Ok(dir.join(name))
}
