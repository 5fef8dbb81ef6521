use async_trait::async_trait;

use crate::domain::{DomainError, FileHash};

/// Persistence for per-file content hashes, used to detect changed and
/// removed files on re-index without re-embedding unchanged content.
#[async_trait]
pub trait FileHashRepository: Send + Sync {
    /// Saves a batch of file hashes for a store, replacing any existing
    /// entry for the same `(store_id, file_path)` pair.
    async fn save_batch(&self, hashes: &[FileHash]) -> Result<(), DomainError>;

    /// All known file hashes for a store.
    async fn find_by_store(&self, store_id: &str) -> Result<Vec<FileHash>, DomainError>;

    /// Deletes hash records for the given paths within a store (paths that
    /// no longer exist on disk after a re-index walk).
    async fn delete_by_paths(&self, store_id: &str, paths: &[String]) -> Result<(), DomainError>;

    /// Deletes all file hashes for a store (used by store deletion).
    async fn delete_by_store(&self, store_id: &str) -> Result<(), DomainError>;
}
