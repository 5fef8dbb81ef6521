//! Store lifecycle orchestration (§4.8): create, list, look up, and
//! cascade-delete stores. Thin glue over `StoreCatalogRepository` plus the
//! ordered cleanup a delete requires across the vector table, the cloned
//! working tree, and the optional code graph.

use std::sync::Arc;

use tracing::info;

use crate::application::{CodeGraphRepository, FileHashRepository, StoreCatalogRepository, VectorRepository};
use crate::domain::{DomainError, Store, StoreKind};

pub struct StoreCatalogUseCase {
    catalog: Arc<dyn StoreCatalogRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    code_graph_repo: Arc<dyn CodeGraphRepository>,
    file_hash_repo: Arc<dyn FileHashRepository>,
}

impl StoreCatalogUseCase {
    pub fn new(
        catalog: Arc<dyn StoreCatalogRepository>,
        vector_repo: Arc<dyn VectorRepository>,
        code_graph_repo: Arc<dyn CodeGraphRepository>,
        file_hash_repo: Arc<dyn FileHashRepository>,
    ) -> Self {
        Self {
            catalog,
            vector_repo,
            code_graph_repo,
            file_hash_repo,
        }
    }

    /// Creates a store record and its (initially empty) vector table.
    /// Fetching a repo's remote or crawling a web root happens later, in the
    /// indexer; this only registers the intent.
    pub async fn create(&self, name: String, kind: StoreKind) -> Result<Store, DomainError> {
        if name.trim().is_empty() {
            return Err(DomainError::invalid_input("store name must not be empty"));
        }
        if let Some(existing) = self.catalog.get_by_id_or_name(&name).await? {
            return Err(DomainError::already_exists(format!(
                "a store named '{}' already exists (id {})",
                name,
                existing.id()
            )));
        }
        let store = Store::new(name, kind);
        self.vector_repo.ensure_table(store.id(), false).await?;
        let created = self.catalog.create(store).await?;
        info!(store_id = created.id(), "created store");
        Ok(created)
    }

    pub async fn get(&self, id_or_name: &str) -> Result<Store, DomainError> {
        self.catalog
            .get_by_id_or_name(id_or_name)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("no store matching '{id_or_name}'")))
    }

    pub async fn list(&self) -> Result<Vec<Store>, DomainError> {
        self.catalog.list().await
    }

    /// Cascading delete: vector table, then the cloned working tree (repo
    /// stores only), then file hashes and the code graph, then the catalog
    /// record itself — the record is the source of truth for "does this
    /// store exist", so it is removed last.
    pub async fn delete(&self, id_or_name: &str) -> Result<(), DomainError> {
        let store = self.get(id_or_name).await?;
        self.vector_repo.drop_table(store.id()).await?;
        if let StoreKind::Repo { path, .. } = store.kind() {
            if let Err(err) = std::fs::remove_dir_all(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    return Err(DomainError::transient_io(format!(
                        "failed to remove working tree {path}: {err}"
                    )));
                }
            }
        }
        self.file_hash_repo.delete_by_store(store.id()).await?;
        self.code_graph_repo.delete(store.id()).await?;
        self.catalog.delete(store.id()).await?;
        info!(store_id = store.id(), "deleted store");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::RankedChunk;
    use crate::domain::{CodeGraph, Chunk};
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;

    #[derive(Default)]
    struct InMemoryCatalog {
        stores: Mutex<HashMap<String, Store>>,
    }

    #[async_trait]
    impl StoreCatalogRepository for InMemoryCatalog {
        async fn create(&self, store: Store) -> Result<Store, DomainError> {
            self.stores.lock().unwrap().insert(store.id().to_string(), store.clone());
            Ok(store)
        }
        async fn get_by_id_or_name(&self, needle: &str) -> Result<Option<Store>, DomainError> {
            Ok(self.stores.lock().unwrap().values().find(|s| s.matches_id_or_name(needle)).cloned())
        }
        async fn list(&self) -> Result<Vec<Store>, DomainError> {
            Ok(self.stores.lock().unwrap().values().cloned().collect())
        }
        async fn save(&self, store: &Store) -> Result<(), DomainError> {
            self.stores.lock().unwrap().insert(store.id().to_string(), store.clone());
            Ok(())
        }
        async fn delete(&self, id: &str) -> Result<(), DomainError> {
            self.stores.lock().unwrap().remove(id);
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullVectorRepo;

    #[async_trait]
    impl VectorRepository for NullVectorRepo {
        async fn ensure_table(&self, _store_id: &str, _force: bool) -> Result<(), DomainError> {
            Ok(())
        }
        async fn insert_batch(&self, _store_id: &str, _chunks: &[Chunk]) -> Result<(), DomainError> {
            Ok(())
        }
        async fn vector_search(&self, _store_id: &str, _q: &[f32], _limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
            Ok(vec![])
        }
        async fn fts_search(&self, _store_id: &str, _q: &str, _limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
            Ok(vec![])
        }
        async fn delete_by_file_path(&self, _store_id: &str, _file_path: &str) -> Result<u64, DomainError> {
            Ok(0)
        }
        async fn drop_table(&self, _store_id: &str) -> Result<(), DomainError> {
            Ok(())
        }
        async fn count(&self, _store_id: &str) -> Result<u64, DomainError> {
            Ok(0)
        }
    }

    #[derive(Default)]
    struct NullCodeGraphRepo;

    #[async_trait]
    impl CodeGraphRepository for NullCodeGraphRepo {
        async fn save(&self, _store_id: &str, _graph: &CodeGraph) -> Result<(), DomainError> {
            Ok(())
        }
        async fn load(&self, _store_id: &str) -> Result<Option<CodeGraph>, DomainError> {
            Ok(None)
        }
        async fn delete(&self, _store_id: &str) -> Result<(), DomainError> {
            Ok(())
        }
    }

    #[derive(Default)]
    struct NullFileHashRepo;

    #[async_trait]
    impl FileHashRepository for NullFileHashRepo {
        async fn save_batch(&self, _hashes: &[crate::domain::FileHash]) -> Result<(), DomainError> {
            Ok(())
        }
        async fn find_by_store(&self, _store_id: &str) -> Result<Vec<crate::domain::FileHash>, DomainError> {
            Ok(vec![])
        }
        async fn delete_by_paths(&self, _store_id: &str, _paths: &[String]) -> Result<(), DomainError> {
            Ok(())
        }
        async fn delete_by_store(&self, _store_id: &str) -> Result<(), DomainError> {
            Ok(())
        }
    }

    fn use_case() -> StoreCatalogUseCase {
        StoreCatalogUseCase::new(
            Arc::new(InMemoryCatalog::default()),
            Arc::new(NullVectorRepo::default()),
            Arc::new(NullCodeGraphRepo::default()),
            Arc::new(NullFileHashRepo::default()),
        )
    }

    #[tokio::test]
    async fn create_then_get_roundtrips() {
        let use_case = use_case();
        let created = use_case
            .create("docs".into(), StoreKind::File { path: "/tmp/docs".into() })
            .await
            .unwrap();
        let fetched = use_case.get(created.id()).await.unwrap();
        assert_eq!(fetched.name(), "docs");
    }

    #[tokio::test]
    async fn duplicate_name_rejected() {
        let use_case = use_case();
        use_case.create("docs".into(), StoreKind::File { path: "/tmp/a".into() }).await.unwrap();
        let err = use_case
            .create("docs".into(), StoreKind::File { path: "/tmp/b".into() })
            .await
            .unwrap_err();
        assert!(err.is_already_exists());
    }

    #[tokio::test]
    async fn delete_removes_from_catalog() {
        let use_case = use_case();
        let created = use_case.create("docs".into(), StoreKind::File { path: "/tmp/docs".into() }).await.unwrap();
        use_case.delete(created.id()).await.unwrap();
        let err = use_case.get(created.id()).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
