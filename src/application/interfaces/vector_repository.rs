use async_trait::async_trait;

use crate::domain::{Chunk, DomainError};

/// One scored hit from a vector or full-text search over a store's table,
/// before RRF fusion and boosting.
#[derive(Debug, Clone)]
pub struct RankedChunk {
    pub chunk: Chunk,
    pub score: f32,
}

/// The opaque per-store vector/FTS table. A store's working data never
/// leaves this trait's boundary — the ranker only ever sees `RankedChunk`s.
#[async_trait]
pub trait VectorRepository: Send + Sync {
    /// Creates (or recreates, if `force`) the table backing `store_id`.
    async fn ensure_table(&self, store_id: &str, force: bool) -> Result<(), DomainError>;

    /// Inserts a batch of chunks, already embedded.
    async fn insert_batch(&self, store_id: &str, chunks: &[Chunk]) -> Result<(), DomainError>;

    /// k-nearest-neighbors over `query_embedding`, limited to `limit` hits.
    async fn vector_search(
        &self,
        store_id: &str,
        query_embedding: &[f32],
        limit: usize,
    ) -> Result<Vec<RankedChunk>, DomainError>;

    /// Full-text search over the tokenized content index, limited to `limit` hits.
    async fn fts_search(
        &self,
        store_id: &str,
        query: &str,
        limit: usize,
    ) -> Result<Vec<RankedChunk>, DomainError>;

    /// Deletes every chunk belonging to `file_path` within `store_id` (used
    /// for incremental re-index of changed/removed files). Returns the
    /// number of chunks deleted.
    async fn delete_by_file_path(&self, store_id: &str, file_path: &str) -> Result<u64, DomainError>;

    /// Drops the whole table for `store_id` (used by store deletion).
    async fn drop_table(&self, store_id: &str) -> Result<(), DomainError>;

    /// Number of chunks currently stored for `store_id`.
    async fn count(&self, store_id: &str) -> Result<u64, DomainError>;
}
