//! `CodeGraphRepository` backed by one JSON file per store under
//! `code-graph/<storeId>.json` (§6), written atomically. Absence is a
//! normal `Ok(None)`, matching the trait's degrade-gracefully contract.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::application::CodeGraphRepository;
use crate::domain::{CodeGraph, DomainError};

use super::json_fs::{atomic_write_json, read_json_opt};

pub struct JsonCodeGraphRepository {
    dir: PathBuf,
}

impl JsonCodeGraphRepository {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self { dir: data_dir.into().join("code-graph") }
    }

    fn path(&self, store_id: &str) -> PathBuf {
        self.dir.join(format!("{store_id}.json"))
    }
}

#[async_trait]
impl CodeGraphRepository for JsonCodeGraphRepository {
    async fn save(&self, store_id: &str, graph: &CodeGraph) -> Result<(), DomainError> {
        atomic_write_json(&self.path(store_id), graph)
    }

    async fn load(&self, store_id: &str) -> Result<Option<CodeGraph>, DomainError> {
        read_json_opt(&self.path(store_id))
    }

    async fn delete(&self, store_id: &str) -> Result<(), DomainError> {
        let path = self.path(store_id);
        if path.exists() {
            std::fs::remove_file(&path).map_err(|e| DomainError::fatal(format!("failed to delete code graph for {store_id}: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{GraphEdge, RelationKind};
    use tempfile::tempdir;

    #[tokio::test]
    async fn save_then_load_roundtrips() {
        let dir = tempdir().unwrap();
        let repo = JsonCodeGraphRepository::new(dir.path());
        let mut graph = CodeGraph::default();
        graph.add_edge("a.rs:foo".into(), "b.rs:bar".into(), RelationKind::Calls);
        repo.save("store-1", &graph).await.unwrap();

        let loaded = repo.load("store-1").await.unwrap().unwrap();
        assert_eq!(loaded.edges().len(), 1);
    }

    #[tokio::test]
    async fn load_missing_store_is_none() {
        let dir = tempdir().unwrap();
        let repo = JsonCodeGraphRepository::new(dir.path());
        assert!(repo.load("missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn delete_is_idempotent() {
        let dir = tempdir().unwrap();
        let repo = JsonCodeGraphRepository::new(dir.path());
        repo.save("store-1", &CodeGraph::default()).await.unwrap();
        repo.delete("store-1").await.unwrap();
        repo.delete("store-1").await.unwrap();
        assert!(repo.load("store-1").await.unwrap().is_none());
    }
}
