//! `FileHashRepository` backed by a single shared DuckDB file (distinct
//! from the per-store `lance/<storeId>/chunks.duckdb` files the vector
//! repository uses, since file hashes are small, store-tagged rows that
//! don't benefit from a per-store file). Grounded on the teacher's own
//! `DuckdbFileHashRepository`: same table-per-connection shape, same
//! transaction-then-batch-insert pattern, only the key column renamed from
//! `repository_id` to `store_id` to match `SPEC_FULL.md`'s store model.

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use duckdb::{params, Connection};
use tokio::sync::Mutex;
use tracing::debug;

use crate::application::FileHashRepository;
use crate::domain::{DomainError, FileHash};

pub struct DuckdbFileHashRepository {
    conn: Arc<Mutex<Connection>>,
}

impl DuckdbFileHashRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Result<Self, DomainError> {
        let data_dir = data_dir.into();
        std::fs::create_dir_all(&data_dir).map_err(|e| DomainError::fatal(format!("failed to create data directory: {e}")))?;
        let conn = Connection::open(data_dir.join("file_hashes.duckdb"))
            .map_err(|e| DomainError::fatal(format!("failed to open file hash database: {e}")))?;
        Self::initialize_schema(&conn)?;
        Ok(Self { conn: Arc::new(Mutex::new(conn)) })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), DomainError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS file_hashes (
                store_id TEXT NOT NULL,
                file_path TEXT NOT NULL,
                content_hash TEXT NOT NULL,
                PRIMARY KEY (store_id, file_path)
            );
            CREATE INDEX IF NOT EXISTS idx_file_hashes_store ON file_hashes(store_id);
            "#,
        )
        .map_err(|e| DomainError::fatal(format!("failed to initialize file_hashes schema: {e}")))?;
        Ok(())
    }
}

#[async_trait]
impl FileHashRepository for DuckdbFileHashRepository {
    async fn save_batch(&self, hashes: &[FileHash]) -> Result<(), DomainError> {
        if hashes.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(|e| DomainError::fatal(format!("failed to begin transaction: {e}")))?;
        {
            let mut stmt = tx
                .prepare("INSERT OR REPLACE INTO file_hashes (store_id, file_path, content_hash) VALUES (?, ?, ?)")
                .map_err(|e| DomainError::fatal(format!("failed to prepare statement: {e}")))?;
            for hash in hashes {
                stmt.execute(params![hash.store_id(), hash.file_path(), hash.content_hash()])
                    .map_err(|e| DomainError::fatal(format!("failed to save file hash: {e}")))?;
            }
        }
        tx.commit().map_err(|e| DomainError::fatal(format!("failed to commit: {e}")))?;
        debug!(count = hashes.len(), "saved file hashes");
        Ok(())
    }

    async fn find_by_store(&self, store_id: &str) -> Result<Vec<FileHash>, DomainError> {
        let conn = self.conn.lock().await;
        let mut stmt = conn
            .prepare("SELECT store_id, file_path, content_hash FROM file_hashes WHERE store_id = ?")
            .map_err(|e| DomainError::fatal(format!("failed to prepare statement: {e}")))?;
        let rows = stmt
            .query_map(params![store_id], |row| {
                Ok(FileHash::new(row.get::<_, String>(0)?, row.get::<_, String>(1)?, row.get::<_, String>(2)?))
            })
            .map_err(|e| DomainError::fatal(format!("failed to query file hashes: {e}")))?;

        let mut hashes = Vec::new();
        for row in rows {
            hashes.push(row.map_err(|e| DomainError::fatal(format!("failed to read row: {e}")))?);
        }
        Ok(hashes)
    }

    async fn delete_by_paths(&self, store_id: &str, paths: &[String]) -> Result<(), DomainError> {
        if paths.is_empty() {
            return Ok(());
        }
        let mut conn = self.conn.lock().await;
        let tx = conn.transaction().map_err(|e| DomainError::fatal(format!("failed to begin transaction: {e}")))?;
        {
            let mut stmt = tx
                .prepare("DELETE FROM file_hashes WHERE store_id = ? AND file_path = ?")
                .map_err(|e| DomainError::fatal(format!("failed to prepare statement: {e}")))?;
            for path in paths {
                stmt.execute(params![store_id, path]).map_err(|e| DomainError::fatal(format!("failed to delete file hash: {e}")))?;
            }
        }
        tx.commit().map_err(|e| DomainError::fatal(format!("failed to commit: {e}")))?;
        Ok(())
    }

    async fn delete_by_store(&self, store_id: &str) -> Result<(), DomainError> {
        let conn = self.conn.lock().await;
        conn.execute("DELETE FROM file_hashes WHERE store_id = ?", params![store_id])
            .map_err(|e| DomainError::fatal(format!("failed to delete file hashes: {e}")))?;
        Ok(())
    }
}
