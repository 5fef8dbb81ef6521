//! `VectorRepository` backed by DuckDB's `vss` extension for cosine
//! similarity and a LIKE-based term scorer for full-text search (§4.4). One
//! DuckDB file per store under `lance/<storeId>/chunks.duckdb` — the spec
//! names this directory `lance/` as an opaque per-store table (§6); the
//! teacher's own `DuckdbVectorRepository` already treats DuckDB + the `vss`
//! HNSW index as its vector-store backend, so that choice carries over
//! unchanged, only the schema (one `chunks` table per store file, keyed by
//! this pipeline's `Chunk` fields rather than the teacher's `CodeChunk`)
//! and the per-store-file layout are new.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection, Row};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::{RankedChunk, VectorRepository};
use crate::domain::{Chunk, DomainError, FileTypeTag};

/// Matches `EmbeddingConfig::default().dimensions()`. DuckDB's `FLOAT[N]`
/// column type is fixed-width, so every store in a given deployment must
/// share one embedding dimensionality (§1 treats the embedding model as a
/// single opaque function).
const VECTOR_DIMENSIONS: usize = 384;

pub struct DuckdbVectorRepository {
    data_dir: PathBuf,
    /// One connection per store, opened lazily on first use and kept open
    /// for the lifetime of the repository (DuckDB allows only one writer
    /// per file, so sharing the connection across calls avoids re-opening
    /// it under concurrent requests).
    connections: Mutex<std::collections::HashMap<String, Arc<Mutex<Connection>>>>,
}

impl DuckdbVectorRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            connections: Mutex::new(std::collections::HashMap::new()),
        }
    }

    fn store_dir(&self, store_id: &str) -> PathBuf {
        self.data_dir.join("lance").join(store_id)
    }

    fn db_path(&self, store_id: &str) -> PathBuf {
        self.store_dir(store_id).join("chunks.duckdb")
    }

    async fn connection(&self, store_id: &str) -> Result<Arc<Mutex<Connection>>, DomainError> {
        let mut guard = self.connections.lock().await;
        if let Some(conn) = guard.get(store_id) {
            return Ok(conn.clone());
        }
        std::fs::create_dir_all(self.store_dir(store_id))
            .map_err(|e| DomainError::fatal(format!("failed to create store directory: {e}")))?;
        let conn = Connection::open(self.db_path(store_id))
            .map_err(|e| DomainError::fatal(format!("failed to open DuckDB database: {e}")))?;
        Self::initialize(&conn)?;
        let conn = Arc::new(Mutex::new(conn));
        guard.insert(store_id.to_string(), conn.clone());
        Ok(conn)
    }

    fn initialize(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch("INSTALL vss; LOAD vss; SET hnsw_enable_experimental_persistence = true;")
            .map_err(|e| DomainError::fatal(format!("failed to load vss extension: {e}")))?;
        conn.execute_batch(&format!(
            r#"
            CREATE TABLE IF NOT EXISTS chunks (
                id TEXT PRIMARY KEY,
                source TEXT NOT NULL,
                file_type TEXT NOT NULL,
                content TEXT NOT NULL,
                vector FLOAT[{dim}] NOT NULL,
                content_hash TEXT NOT NULL,
                chunk_index INTEGER NOT NULL,
                total_chunks INTEGER NOT NULL,
                indexed_at BIGINT NOT NULL,
                section_header TEXT,
                declaration_name TEXT,
                depth INTEGER
            );
            CREATE INDEX IF NOT EXISTS chunks_source_idx ON chunks(source);
            CREATE INDEX IF NOT EXISTS chunks_embedding_hnsw_idx ON chunks USING HNSW (vector) WITH (metric = 'cosine');
            "#,
            dim = VECTOR_DIMENSIONS,
        ))
        .map_err(|e| DomainError::fatal(format!("failed to initialize chunk schema: {e}")))?;
        Ok(())
    }

    fn vector_literal(vector: &[f32]) -> Result<String, DomainError> {
        if vector.len() != VECTOR_DIMENSIONS {
            return Err(DomainError::invalid_input(format!(
                "expected embedding dimension {VECTOR_DIMENSIONS}, got {}",
                vector.len()
            )));
        }
        let mut literal = String::with_capacity(vector.len() * 8 + 16);
        literal.push('[');
        for (i, v) in vector.iter().enumerate() {
            if i > 0 {
                literal.push_str(", ");
            }
            literal.push_str(&v.to_string());
        }
        literal.push(']');
        literal.push_str(&format!("::FLOAT[{VECTOR_DIMENSIONS}]"));
        Ok(literal)
    }

    fn row_to_chunk(row: &Row, store_id: &str) -> Result<Chunk, duckdb::Error> {
        Ok(Chunk::reconstitute(
            row.get::<_, String>(0)?,
            store_id.to_string(),
            row.get::<_, String>(1)?,
            FileTypeTag::parse(&row.get::<_, String>(2)?),
            row.get::<_, String>(3)?,
            Vec::new(),
            row.get::<_, String>(5)?,
            row.get::<_, i64>(6)? as usize,
            row.get::<_, i64>(7)? as usize,
            row.get::<_, i64>(8)?,
            row.get::<_, Option<String>>(9)?,
            row.get::<_, Option<String>>(10)?,
            row.get::<_, Option<i64>>(11)?.map(|d| d as u32),
        ))
    }
}

#[async_trait]
impl VectorRepository for DuckdbVectorRepository {
    async fn ensure_table(&self, store_id: &str, force: bool) -> Result<(), DomainError> {
        if force {
            self.drop_table(store_id).await?;
            let mut guard = self.connections.lock().await;
            guard.remove(store_id);
        }
        self.connection(store_id).await?;
        Ok(())
    }

    async fn insert_batch(&self, store_id: &str, chunks: &[Chunk]) -> Result<(), DomainError> {
        if chunks.is_empty() {
            return Ok(());
        }
        let conn = self.connection(store_id).await?;
        let mut conn = conn.lock().await;
        let tx = conn
            .transaction()
            .map_err(|e| DomainError::fatal(format!("failed to begin transaction: {e}")))?;
        for chunk in chunks {
            let array_lit = Self::vector_literal(chunk.embedding())?;
            let sql = format!(
                "INSERT OR REPLACE INTO chunks \
                 (id, source, file_type, content, vector, content_hash, chunk_index, total_chunks, indexed_at, section_header, declaration_name, depth) \
                 VALUES (?, ?, ?, ?, {array_lit}, ?, ?, ?, ?, ?, ?, ?)"
            );
            tx.execute(
                &sql,
                params![
                    chunk.id(),
                    chunk.source(),
                    chunk.file_type().as_str(),
                    chunk.content(),
                    chunk.content_hash(),
                    chunk.chunk_index() as i64,
                    chunk.total_chunks() as i64,
                    chunk.indexed_at(),
                    chunk.section_header(),
                    chunk.declaration_name(),
                    chunk.depth().map(|d| d as i64),
                ],
            )
            .map_err(|e| DomainError::fatal(format!("failed to insert chunk {}: {e}", chunk.id())))?;
        }
        tx.commit().map_err(|e| DomainError::fatal(format!("failed to commit insert: {e}")))?;
        debug!(store_id, count = chunks.len(), "inserted chunks");
        Ok(())
    }

    async fn vector_search(&self, store_id: &str, query_embedding: &[f32], limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
        let conn = self.connection(store_id).await?;
        let conn = conn.lock().await;
        let array_lit = Self::vector_literal(query_embedding)?;
        let sql = format!(
            "SELECT id, source, file_type, content, content_hash, chunk_index, total_chunks, indexed_at, \
                    section_header, declaration_name, depth, \
                    1.0 - array_cosine_distance(vector, {array_lit}) AS score \
             FROM chunks ORDER BY array_cosine_distance(vector, {array_lit}) LIMIT ?"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::fatal(format!("failed to prepare vector search: {e}")))?;
        let mut rows = stmt
            .query(params![limit as i64])
            .map_err(|e| DomainError::fatal(format!("failed to run vector search: {e}")))?;

        let mut hits = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::fatal(format!("failed to read row: {e}")))? {
            let score: f32 = row.get(11).map_err(|e| DomainError::fatal(format!("failed to read score: {e}")))?;
            let chunk = Self::row_to_chunk(row, store_id).map_err(|e| DomainError::fatal(format!("failed to parse chunk row: {e}")))?;
            hits.push(RankedChunk { chunk, score });
        }
        Ok(hits)
    }

    async fn fts_search(&self, store_id: &str, query: &str, limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
        let terms: Vec<String> = query
            .split(|c: char| !c.is_alphanumeric())
            .filter(|t| t.len() >= 3)
            .map(|t| t.to_lowercase())
            .collect();
        if terms.is_empty() {
            return Ok(vec![]);
        }

        let conn = self.connection(store_id).await?;
        let conn = conn.lock().await;

        let mut score_parts = Vec::with_capacity(terms.len());
        let mut where_parts = Vec::with_capacity(terms.len());
        for term in &terms {
            let safe = term.replace('\\', "\\\\").replace('\'', "''").replace('%', "\\%").replace('_', "\\_");
            score_parts.push(format!(
                "(CASE WHEN LOWER(content) LIKE '%{safe}%' ESCAPE '\\' THEN 1.0 ELSE 0.0 END \
                  + CASE WHEN LOWER(COALESCE(declaration_name, '')) LIKE '%{safe}%' ESCAPE '\\' THEN 2.0 ELSE 0.0 END)"
            ));
            where_parts.push(format!("LOWER(content) LIKE '%{safe}%' ESCAPE '\\'"));
        }
        let max_score = (terms.len() * 3) as f64;
        let score_expr = format!("({}) / {max_score:.1}", score_parts.join(" + "));
        let where_expr = where_parts.join(" OR ");

        let sql = format!(
            "SELECT id, source, file_type, content, content_hash, chunk_index, total_chunks, indexed_at, \
                    section_header, declaration_name, depth, CAST({score_expr} AS FLOAT) AS score \
             FROM chunks WHERE ({where_expr}) ORDER BY score DESC LIMIT ?"
        );
        let mut stmt = conn
            .prepare(&sql)
            .map_err(|e| DomainError::fatal(format!("failed to prepare fts search: {e}")))?;
        let mut rows = stmt
            .query(params![limit as i64])
            .map_err(|e| DomainError::fatal(format!("failed to run fts search: {e}")))?;

        let mut hits = Vec::new();
        while let Some(row) = rows.next().map_err(|e| DomainError::fatal(format!("failed to read row: {e}")))? {
            let score: f32 = row.get(11).map_err(|e| DomainError::fatal(format!("failed to read score: {e}")))?;
            if score <= 0.0 {
                continue;
            }
            let chunk = Self::row_to_chunk(row, store_id).map_err(|e| DomainError::fatal(format!("failed to parse chunk row: {e}")))?;
            hits.push(RankedChunk { chunk, score });
        }
        Ok(hits)
    }

    async fn delete_by_file_path(&self, store_id: &str, file_path: &str) -> Result<u64, DomainError> {
        let conn = self.connection(store_id).await?;
        let conn = conn.lock().await;
        let deleted = conn
            .execute("DELETE FROM chunks WHERE source = ?", params![file_path])
            .map_err(|e| DomainError::fatal(format!("failed to delete chunks for {file_path}: {e}")))?;
        Ok(deleted as u64)
    }

    async fn drop_table(&self, store_id: &str) -> Result<(), DomainError> {
        {
            let mut guard = self.connections.lock().await;
            guard.remove(store_id);
        }
        let dir = self.store_dir(store_id);
        if dir.exists() {
            std::fs::remove_dir_all(&dir).map_err(|e| DomainError::fatal(format!("failed to remove store directory: {e}")))?;
        }
        Ok(())
    }

    async fn count(&self, store_id: &str) -> Result<u64, DomainError> {
        if !self.db_path(store_id).exists() {
            return Ok(0);
        }
        let conn = self.connection(store_id).await?;
        let conn = conn.lock().await;
        let count: i64 = conn
            .query_row("SELECT COUNT(*) FROM chunks", [], |row| row.get(0))
            .map_err(|e| DomainError::fatal(format!("failed to count chunks: {e}")))?;
        Ok(count as u64)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::tempdir;

    fn chunk(id: &str, source: &str, content: &str, vector: Vec<f32>) -> Chunk {
        Chunk::reconstitute(
            id.to_string(),
            "store-1".to_string(),
            source.to_string(),
            FileTypeTag::Source,
            content.to_string(),
            vector,
            "hash".to_string(),
            0,
            1,
            0,
            None,
            None,
            None,
        )
    }

    fn unit_vector(dim: usize, hot_index: usize) -> Vec<f32> {
        let mut v = vec![0.0; dim];
        v[hot_index] = 1.0;
        v
    }

    #[tokio::test]
    async fn insert_then_count_roundtrips() {
        let dir = tempdir().unwrap();
        let repo = DuckdbVectorRepository::new(dir.path());
        repo.ensure_table("store-1", false).await.unwrap();
        let v = unit_vector(VECTOR_DIMENSIONS, 0);
        repo.insert_batch("store-1", &[chunk("store-1-hash", "a.rs", "install the package", v)]).await.unwrap();
        assert_eq!(repo.count("store-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn vector_search_ranks_closest_first() {
        let dir = tempdir().unwrap();
        let repo = DuckdbVectorRepository::new(dir.path());
        repo.ensure_table("store-1", false).await.unwrap();
        let near = unit_vector(VECTOR_DIMENSIONS, 0);
        let mut far = vec![0.0; VECTOR_DIMENSIONS];
        far[1] = 1.0;
        repo.insert_batch(
            "store-1",
            &[chunk("store-1-near", "near.rs", "alpha", near.clone()), chunk("store-1-far", "far.rs", "beta", far)],
        )
        .await
        .unwrap();

        let hits = repo.vector_search("store-1", &near, 10).await.unwrap();
        assert_eq!(hits[0].chunk.id(), "store-1-near");
        assert!(hits[0].score > hits[1].score);
    }

    #[tokio::test]
    async fn fts_search_matches_content_terms() {
        let dir = tempdir().unwrap();
        let repo = DuckdbVectorRepository::new(dir.path());
        repo.ensure_table("store-1", false).await.unwrap();
        let v = unit_vector(VECTOR_DIMENSIONS, 0);
        repo.insert_batch(
            "store-1",
            &[
                chunk("store-1-a", "a.rs", "how to install the package", v.clone()),
                chunk("store-1-b", "b.rs", "unrelated content entirely", v),
            ],
        )
        .await
        .unwrap();

        let hits = repo.fts_search("store-1", "install package", 10).await.unwrap();
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].chunk.id(), "store-1-a");
    }

    #[tokio::test]
    async fn delete_by_file_path_removes_only_that_source() {
        let dir = tempdir().unwrap();
        let repo = DuckdbVectorRepository::new(dir.path());
        repo.ensure_table("store-1", false).await.unwrap();
        let v = unit_vector(VECTOR_DIMENSIONS, 0);
        repo.insert_batch("store-1", &[chunk("store-1-a", "a.rs", "x", v.clone()), chunk("store-1-b", "b.rs", "y", v)]).await.unwrap();

        let deleted = repo.delete_by_file_path("store-1", "a.rs").await.unwrap();
        assert_eq!(deleted, 1);
        assert_eq!(repo.count("store-1").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn drop_table_removes_store_directory() {
        let dir = tempdir().unwrap();
        let repo = DuckdbVectorRepository::new(dir.path());
        repo.ensure_table("store-1", false).await.unwrap();
        repo.drop_table("store-1").await.unwrap();
        assert!(!dir.path().join("lance").join("store-1").exists());
    }
}
