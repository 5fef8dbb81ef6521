//! Dependency-injection container wiring every connector-layer adapter into
//! the application layer's use cases (§6 ambient stack). One struct holding
//! `Arc<dyn Trait>` fields, accessor methods constructing use cases on
//! demand — the same shape the donor's own `Container`/`ContainerConfig`
//! uses, narrowed to this pipeline's adapter set (one DuckDB file per store
//! for vectors, JSON-file-backed catalog/job/code-graph repositories, no
//! reranking or query expansion).

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;

use crate::application::{
    BuildCodeGraphUseCase, CodeGraphRepository, EmbeddingService, FileHashRepository, GraphExtractorService, IndexStoreUseCase,
    JobManagerUseCase, JobRepository, ResultCacheUseCase, ResultEnricherUseCase, SearchUseCase, StoreCatalogRepository, StoreCatalogUseCase,
    VectorRepository,
};
use crate::connector::adapter::{
    DuckdbFileHashRepository, DuckdbVectorRepository, InMemoryVectorRepository, JsonCodeGraphRepository, JsonJobRepository,
    JsonStoreCatalogRepository, MockEmbedding, TreeSitterGraphExtractor,
};

#[derive(Debug, Clone)]
pub struct ContainerConfig {
    pub data_dir: PathBuf,
    /// Use the in-memory vector repository instead of DuckDB. Used by
    /// tests and by stores the caller knows are small/throwaway; the
    /// shipped CLI/MCP binaries never set this (§1 "a DuckDB-backed
    /// implementation is the shipped default").
    pub in_memory_vectors: bool,
}

impl ContainerConfig {
    pub fn new(data_dir: impl Into<PathBuf>) -> Self {
        Self {
            data_dir: data_dir.into(),
            in_memory_vectors: false,
        }
    }
}

pub struct Container {
    catalog: Arc<dyn StoreCatalogRepository>,
    jobs: Arc<dyn JobRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    file_hash_repo: Arc<dyn FileHashRepository>,
    code_graph_repo: Arc<dyn CodeGraphRepository>,
    embedding_service: Arc<dyn EmbeddingService>,
    graph_extractor: Arc<dyn GraphExtractorService>,
    result_enricher: Arc<ResultEnricherUseCase>,
    result_cache: Arc<ResultCacheUseCase>,
    data_dir: PathBuf,
}

impl Container {
    pub fn new(config: ContainerConfig) -> Result<Self> {
        std::fs::create_dir_all(&config.data_dir)?;

        let catalog: Arc<dyn StoreCatalogRepository> = Arc::new(JsonStoreCatalogRepository::new(&config.data_dir));
        let jobs: Arc<dyn JobRepository> = Arc::new(JsonJobRepository::new(&config.data_dir));
        let vector_repo: Arc<dyn VectorRepository> = if config.in_memory_vectors {
            Arc::new(InMemoryVectorRepository::new())
        } else {
            Arc::new(DuckdbVectorRepository::new(&config.data_dir))
        };
        let file_hash_repo: Arc<dyn FileHashRepository> = Arc::new(DuckdbFileHashRepository::new(&config.data_dir)?);
        let code_graph_repo: Arc<dyn CodeGraphRepository> = Arc::new(JsonCodeGraphRepository::new(&config.data_dir));
        let embedding_service: Arc<dyn EmbeddingService> = Arc::new(MockEmbedding::new());
        let graph_extractor: Arc<dyn GraphExtractorService> = Arc::new(TreeSitterGraphExtractor::new());
        let result_enricher = Arc::new(ResultEnricherUseCase::new(code_graph_repo.clone()));
        let result_cache = Arc::new(ResultCacheUseCase::new(catalog.clone(), vector_repo.clone(), result_enricher.clone()));

        Ok(Self {
            catalog,
            jobs,
            vector_repo,
            file_hash_repo,
            code_graph_repo,
            embedding_service,
            graph_extractor,
            result_enricher,
            result_cache,
            data_dir: config.data_dir,
        })
    }

    pub fn store_catalog_use_case(&self) -> StoreCatalogUseCase {
        StoreCatalogUseCase::new(self.catalog.clone(), self.vector_repo.clone(), self.code_graph_repo.clone(), self.file_hash_repo.clone())
    }

    pub fn job_manager_use_case(&self) -> JobManagerUseCase {
        JobManagerUseCase::new(self.jobs.clone())
    }

    pub fn index_store_use_case(&self) -> IndexStoreUseCase {
        IndexStoreUseCase::new(self.catalog.clone(), self.vector_repo.clone(), self.embedding_service.clone(), self.file_hash_repo.clone())
    }

    pub fn search_use_case(&self) -> SearchUseCase {
        SearchUseCase::new(self.catalog.clone(), self.vector_repo.clone(), self.embedding_service.clone())
    }

    pub fn result_enricher_use_case(&self) -> Arc<ResultEnricherUseCase> {
        self.result_enricher.clone()
    }

    pub fn result_cache_use_case(&self) -> Arc<ResultCacheUseCase> {
        self.result_cache.clone()
    }

    pub fn build_code_graph_use_case(&self) -> BuildCodeGraphUseCase {
        BuildCodeGraphUseCase::new(self.code_graph_repo.clone(), self.graph_extractor.clone())
    }

    pub fn catalog_repo(&self) -> Arc<dyn StoreCatalogRepository> {
        self.catalog.clone()
    }

    pub fn job_repo(&self) -> Arc<dyn JobRepository> {
        self.jobs.clone()
    }

    pub fn data_dir(&self) -> &std::path::Path {
        &self.data_dir
    }
}
