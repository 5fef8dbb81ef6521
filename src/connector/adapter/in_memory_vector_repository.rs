//! `VectorRepository` backed by a process-local `HashMap`, used in tests
//! and for stores too small to warrant a DuckDB file (§1 "an in-memory
//! implementation for tests and for stores too small to warrant a database
//! file", per `SPEC_FULL.md` §1). Cosine similarity and a naive term-overlap
//! scorer stand in for the DuckDB adapter's `vss` HNSW index and its
//! LIKE-based term scorer, applied over every chunk currently held for the
//! store rather than an indexed structure — acceptable since this adapter
//! never backs a corpus the DuckDB adapter wouldn't instead.

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::application::{RankedChunk, VectorRepository};
use crate::domain::{Chunk, DomainError};

#[derive(Default)]
struct StoreTable {
    chunks: HashMap<String, Chunk>,
}

#[derive(Default)]
pub struct InMemoryVectorRepository {
    tables: Mutex<HashMap<String, StoreTable>>,
}

impl InMemoryVectorRepository {
    pub fn new() -> Self {
        Self::default()
    }
}

fn cosine(a: &[f32], b: &[f32]) -> f32 {
    if a.len() != b.len() || a.is_empty() {
        return 0.0;
    }
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        0.0
    } else {
        dot / (norm_a * norm_b)
    }
}

/// Crude keyword-overlap score: count of distinct lowercase query terms
/// (length >= 3) present in the chunk content, case-insensitive.
fn term_score(query: &str, content: &str) -> f32 {
    let content_lower = content.to_lowercase();
    let terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_lowercase())
        .collect();
    if terms.is_empty() {
        return 0.0;
    }
    let hits = terms.iter().filter(|t| content_lower.contains(t.as_str())).count();
    hits as f32 / terms.len() as f32
}

#[async_trait]
impl VectorRepository for InMemoryVectorRepository {
    async fn ensure_table(&self, store_id: &str, force: bool) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().await;
        if force || !tables.contains_key(store_id) {
            tables.insert(store_id.to_string(), StoreTable::default());
        }
        Ok(())
    }

    async fn insert_batch(&self, store_id: &str, chunks: &[Chunk]) -> Result<(), DomainError> {
        let mut tables = self.tables.lock().await;
        let table = tables.entry(store_id.to_string()).or_default();
        for chunk in chunks {
            table.chunks.insert(chunk.id().to_string(), chunk.clone());
        }
        Ok(())
    }

    async fn vector_search(&self, store_id: &str, query_embedding: &[f32], limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
        let tables = self.tables.lock().await;
        let Some(table) = tables.get(store_id) else {
            return Ok(Vec::new());
        };
        let mut scored: Vec<RankedChunk> = table
            .chunks
            .values()
            .map(|chunk| RankedChunk {
                chunk: chunk.clone(),
                score: cosine(query_embedding, chunk.embedding()),
            })
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn fts_search(&self, store_id: &str, query: &str, limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
        let tables = self.tables.lock().await;
        let Some(table) = tables.get(store_id) else {
            return Ok(Vec::new());
        };
        let mut scored: Vec<RankedChunk> = table
            .chunks
            .values()
            .map(|chunk| RankedChunk {
                chunk: chunk.clone(),
                score: term_score(query, chunk.content()),
            })
            .filter(|hit| hit.score > 0.0)
            .collect();
        scored.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(std::cmp::Ordering::Equal));
        scored.truncate(limit);
        Ok(scored)
    }

    async fn delete_by_file_path(&self, store_id: &str, file_path: &str) -> Result<u64, DomainError> {
        let mut tables = self.tables.lock().await;
        let Some(table) = tables.get_mut(store_id) else {
            return Ok(0);
        };
        let before = table.chunks.len();
        table.chunks.retain(|_, chunk| chunk.source() != file_path);
        Ok((before - table.chunks.len()) as u64)
    }

    async fn drop_table(&self, store_id: &str) -> Result<(), DomainError> {
        self.tables.lock().await.remove(store_id);
        Ok(())
    }

    async fn count(&self, store_id: &str) -> Result<u64, DomainError> {
        Ok(self.tables.lock().await.get(store_id).map(|t| t.chunks.len() as u64).unwrap_or(0))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::FileTypeTag;

    fn chunk(store_id: &str, source: &str, content: &str, embedding: Vec<f32>) -> Chunk {
        Chunk::new(store_id, source, FileTypeTag::Source, content, embedding, "hash", 0, 1)
    }

    #[tokio::test]
    async fn insert_then_vector_search_ranks_closest_first() {
        let repo = InMemoryVectorRepository::new();
        repo.ensure_table("s1", false).await.unwrap();
        repo.insert_batch(
            "s1",
            &[
                chunk("s1", "a.rs", "fn a() {}", vec![1.0, 0.0]),
                chunk("s1", "b.rs", "fn b() {}", vec![0.0, 1.0]),
            ],
        )
        .await
        .unwrap();

        let hits = repo.vector_search("s1", &[1.0, 0.0], 10).await.unwrap();
        assert_eq!(hits[0].chunk.source(), "a.rs");
    }

    #[tokio::test]
    async fn fts_search_matches_content_terms() {
        let repo = InMemoryVectorRepository::new();
        repo.ensure_table("s1", false).await.unwrap();
        repo.insert_batch("s1", &[chunk("s1", "readme.md", "how to install foo", vec![0.0, 0.0])])
            .await
            .unwrap();

        let hits = repo.fts_search("s1", "install foo", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
    }

    #[tokio::test]
    async fn delete_by_file_path_removes_only_that_source() {
        let repo = InMemoryVectorRepository::new();
        repo.ensure_table("s1", false).await.unwrap();
        repo.insert_batch(
            "s1",
            &[chunk("s1", "a.rs", "x", vec![1.0]), chunk("s1", "b.rs", "y", vec![1.0])],
        )
        .await
        .unwrap();

        let deleted = repo.delete_by_file_path("s1", "a.rs").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.count("s1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn force_ensure_table_clears_existing_rows() {
        let repo = InMemoryVectorRepository::new();
        repo.ensure_table("s1", false).await.unwrap();
        repo.insert_batch("s1", &[chunk("s1", "a.rs", "x", vec![1.0])]).await.unwrap();
        repo.ensure_table("s1", true).await.unwrap();
        assert_eq!(repo.count("s1").await.unwrap(), 0);
    }
}
