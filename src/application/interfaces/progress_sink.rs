use async_trait::async_trait;

/// One step of the indexer's `{start, progress, complete, error}` event
/// stream (§4.3). Generalizes the donor's direct `indicatif::ProgressBar`
/// calls into a port so the same indexer code can drive a CLI progress bar,
/// a job record on disk, both, or neither (tests).
#[derive(Debug, Clone)]
pub enum IndexProgressEvent {
    Start { total_files: u64 },
    Progress { current: u64, total: u64, file: String },
    Complete { documents_indexed: u64, chunks_created: u64, time_ms: u64 },
    Error { message: String },
}

#[async_trait]
pub trait ProgressSink: Send + Sync {
    async fn report(&self, event: IndexProgressEvent);
}

/// Discards every event. The default when no caller wants progress
/// reporting (unit tests, one-shot CLI commands with `--quiet`).
pub struct NoopProgressSink;

#[async_trait]
impl ProgressSink for NoopProgressSink {
    async fn report(&self, _event: IndexProgressEvent) {}
}
