//! The Indexer (§4.3): walk a store's root, classify/chunk/embed/insert each
//! file, and report progress. Grounded in `IndexRepositoryUseCase::index`'s
//! walk-hash-chunk-embed-insert loop, generalized from "repo only" to any
//! `Store` with a root path and from a SQLite-backed metadata repository to
//! the `VectorRepository` + `StoreCatalogRepository` port pair.

use std::path::Path;
use std::sync::Arc;
use std::time::Instant;

use ignore::WalkBuilder;
use tracing::{info, warn};

use crate::application::{
    CancellationToken, EmbeddingService, FileHashRepository, IndexProgressEvent, NeverCancelled, ProgressSink, StoreCatalogRepository,
    VectorRepository,
};
use crate::domain::services::{chunker, classifier};
use crate::domain::{compute_file_hash, Chunk, DomainError, FileHash, IndexingStatus, Store, StoreKind};

/// Above this fraction of unreadable/unembeddable files, the run fails with
/// a diagnostic rather than silently completing on a mostly-empty corpus
/// (§7 "transient I/O errors ... if the skip count exceeds a fraction").
const SKIP_FRACTION_THRESHOLD: f64 = 0.3;

const MARKDOWN_EXTENSIONS: &[&str] = &["md", "mdx"];

#[derive(Debug, Clone)]
pub struct IndexOutcome {
    pub documents_indexed: u64,
    pub chunks_created: u64,
    pub time_ms: u64,
    /// Set when a `CancellationToken` tripped before the run finished. For a
    /// `force` run this means the previous table was left untouched (the
    /// rewrite was buffered and never committed); for a non-`force` run it
    /// means some files were diffed and committed before the stop, which is
    /// a valid intermediate state of the incremental path (§9 Open Question
    /// #1 resolution — only the recreate-table path needs all-or-nothing).
    pub cancelled: bool,
}

pub struct IndexStoreUseCase {
    catalog: Arc<dyn StoreCatalogRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    embedding: Arc<dyn EmbeddingService>,
    file_hashes: Arc<dyn FileHashRepository>,
}

impl IndexStoreUseCase {
    pub fn new(
        catalog: Arc<dyn StoreCatalogRepository>,
        vector_repo: Arc<dyn VectorRepository>,
        embedding: Arc<dyn EmbeddingService>,
        file_hashes: Arc<dyn FileHashRepository>,
    ) -> Self {
        Self {
            catalog,
            vector_repo,
            embedding,
            file_hashes,
        }
    }

    /// Indexes `store`. `force` recreates the vector table from scratch
    /// (the job manager's "re-index from scratch" semantics, §4.7); without
    /// it, the indexer diffs against previously recorded file hashes and
    /// evicts chunks for files that changed or disappeared (§9's stale-chunk
    /// resolution — see DESIGN.md).
    pub async fn execute(&self, store: &Store, force: bool, progress: Arc<dyn ProgressSink>) -> Result<IndexOutcome, DomainError> {
        self.execute_cancellable(store, force, progress, Arc::new(NeverCancelled)).await
    }

    /// Same as [`Self::execute`], but polls `cancellation` between files
    /// (§4.7, §5). On a `force` run, chunks are staged in memory and the
    /// table is only wiped and rewritten once the walk finishes without a
    /// cancellation — this is what keeps a cancelled recreate-table run from
    /// leaving a half-populated table (§8 "Cancellation").
    pub async fn execute_cancellable(
        &self,
        store: &Store,
        force: bool,
        progress: Arc<dyn ProgressSink>,
        cancellation: Arc<dyn CancellationToken>,
    ) -> Result<IndexOutcome, DomainError> {
        let root = match store.kind() {
            StoreKind::Web { .. } => {
                return Err(DomainError::invalid_input(
                    "indexing a web store is not implemented; the crawler is an external collaborator",
                ));
            }
            other => other
                .root_path()
                .ok_or_else(|| DomainError::invalid_input("store has no root path to index"))?
                .to_string(),
        };
        let root_path = Path::new(&root);
        let start = Instant::now();

        if !force {
            self.vector_repo.ensure_table(store.id(), false).await?;
        }

        let previous_hashes: std::collections::HashMap<String, String> = if force {
            std::collections::HashMap::new()
        } else {
            self.file_hashes
                .find_by_store(store.id())
                .await?
                .into_iter()
                .map(|h| (h.file_path().to_string(), h.content_hash().to_string()))
                .collect()
        };

        let entries: Vec<_> = WalkBuilder::new(root_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter(|entry| !classifier::is_ignored_path(entry.path()))
            .collect();

        let total_files = entries.len() as u64;
        progress.report(IndexProgressEvent::Start { total_files }).await;
        info!(store_id = store.id(), total_files, "starting index");

        let mut documents_indexed: u64 = 0;
        let mut chunks_created: u64 = 0;
        let mut skipped: u64 = 0;
        let mut seen_paths: std::collections::HashSet<String> = std::collections::HashSet::new();
        let mut staged_chunks: Vec<Chunk> = Vec::new();
        let mut staged_hashes: Vec<FileHash> = Vec::new();
        let mut was_cancelled = false;

        for (current, entry) in entries.iter().enumerate() {
            if cancellation.is_cancelled() {
                was_cancelled = true;
                break;
            }

            let path = entry.path();
            let relative = path.strip_prefix(root_path).unwrap_or(path).to_string_lossy().to_string();
            progress
                .report(IndexProgressEvent::Progress {
                    current: current as u64 + 1,
                    total: total_files,
                    file: relative.clone(),
                })
                .await;

            let content = match std::fs::read(path) {
                Ok(bytes) => match String::from_utf8(bytes) {
                    Ok(text) => text,
                    Err(_) => {
                        skipped += 1;
                        continue;
                    }
                },
                Err(err) => {
                    warn!(file = %relative, error = %err, "skipping unreadable file");
                    skipped += 1;
                    continue;
                }
            };

            seen_paths.insert(relative.clone());
            let content_hash = compute_file_hash(&content);
            if let Some(previous) = previous_hashes.get(&relative) {
                if previous == &content_hash {
                    continue;
                }
                self.vector_repo.delete_by_file_path(store.id(), &relative).await?;
            }

            let file_type = classifier::classify(path);
            let extension = path.extension().and_then(|e| e.to_str()).unwrap_or("");
            let preset = if MARKDOWN_EXTENSIONS.contains(&extension) {
                chunker::ChunkPreset::DOCS
            } else {
                chunker::ChunkPreset::CODE
            };
            let spans = chunker::chunk(&content, extension, preset);
            let total_chunks = spans.len();
            if total_chunks == 0 {
                continue;
            }

            let texts: Vec<String> = spans.iter().map(|s| s.content.clone()).collect();
            let embeddings = match self.embedding.embed_texts(&texts).await {
                Ok(vectors) => vectors,
                Err(err) => {
                    warn!(file = %relative, error = %err, "skipping file that failed to embed");
                    skipped += 1;
                    continue;
                }
            };

            let mut chunks = Vec::with_capacity(total_chunks);
            for (index, (span, embedding)) in spans.into_iter().zip(embeddings.into_iter()).enumerate() {
                let mut chunk = Chunk::new(
                    store.id(),
                    relative.clone(),
                    file_type,
                    span.content,
                    embedding,
                    content_hash.clone(),
                    index,
                    total_chunks,
                );
                if let Some(header) = span.section_header {
                    chunk = chunk.with_section_header(header);
                }
                if let Some(name) = span.declaration_name {
                    chunk = chunk.with_declaration_name(name);
                }
                chunks.push(chunk);
            }

            let hash_record = FileHash::new(store.id().to_string(), relative.clone(), content_hash);
            if force {
                staged_chunks.extend(chunks.iter().cloned());
                staged_hashes.push(hash_record);
            } else {
                self.vector_repo.insert_batch(store.id(), &chunks).await?;
                self.file_hashes.save_batch(&[hash_record]).await?;
            }

            documents_indexed += 1;
            chunks_created += chunks.len() as u64;
        }

        if force {
            if was_cancelled {
                // Nothing has touched the vector store yet; the previous
                // table (if any) is exactly as it was before this call.
                let time_ms = start.elapsed().as_millis() as u64;
                progress
                    .report(IndexProgressEvent::Error {
                        message: "index run cancelled before the rewritten table was committed".to_string(),
                    })
                    .await;
                return Ok(IndexOutcome {
                    documents_indexed,
                    chunks_created,
                    time_ms,
                    cancelled: true,
                });
            }
            self.vector_repo.ensure_table(store.id(), true).await?;
            self.vector_repo.insert_batch(store.id(), &staged_chunks).await?;
            self.file_hashes.delete_by_store(store.id()).await?;
            if !staged_hashes.is_empty() {
                self.file_hashes.save_batch(&staged_hashes).await?;
            }
        }

        let removed_paths: Vec<String> = previous_hashes
            .keys()
            .filter(|path| !seen_paths.contains(*path))
            .cloned()
            .collect();
        for path in &removed_paths {
            self.vector_repo.delete_by_file_path(store.id(), path).await?;
        }
        if !removed_paths.is_empty() {
            self.file_hashes.delete_by_paths(store.id(), &removed_paths).await?;
        }

        if was_cancelled {
            let time_ms = start.elapsed().as_millis() as u64;
            progress
                .report(IndexProgressEvent::Error {
                    message: format!("index run cancelled after {documents_indexed} of {total_files} files"),
                })
                .await;
            return Ok(IndexOutcome {
                documents_indexed,
                chunks_created,
                time_ms,
                cancelled: true,
            });
        }

        if total_files > 0 && (skipped as f64 / total_files as f64) > SKIP_FRACTION_THRESHOLD {
            let message = format!(
                "{skipped} of {total_files} files were unreadable or failed to embed, exceeding the {:.0}% skip threshold",
                SKIP_FRACTION_THRESHOLD * 100.0
            );
            progress.report(IndexProgressEvent::Error { message: message.clone() }).await;
            return Err(DomainError::transient_io(message));
        }

        let time_ms = start.elapsed().as_millis() as u64;
        progress
            .report(IndexProgressEvent::Complete {
                documents_indexed,
                chunks_created,
                time_ms,
            })
            .await;

        let mut updated = store.clone();
        updated.set_status(IndexingStatus::Indexed);
        self.catalog.save(&updated).await?;

        info!(store_id = store.id(), documents_indexed, chunks_created, time_ms, "index complete");

        Ok(IndexOutcome {
            documents_indexed,
            chunks_created,
            time_ms,
            cancelled: false,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::{NoopProgressSink, RankedChunk};
    use crate::domain::EmbeddingConfig;
    use async_trait::async_trait;
    use std::collections::HashMap;
    use std::sync::Mutex;
    use tempfile::tempdir;

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
    struct InMemoryVectorRepo {
        chunks: Mutex<HashMap<String, Vec<Chunk>>>,
    }

    #[async_trait]
    impl VectorRepository for InMemoryVectorRepo {
        async fn ensure_table(&self, store_id: &str, force: bool) -> Result<(), DomainError> {
            if force {
                self.chunks.lock().unwrap().remove(store_id);
            }
            self.chunks.lock().unwrap().entry(store_id.to_string()).or_default();
            Ok(())
        }
        async fn insert_batch(&self, store_id: &str, chunks: &[Chunk]) -> Result<(), DomainError> {
            self.chunks
                .lock()
                .unwrap()
                .entry(store_id.to_string())
                .or_default()
                .extend_from_slice(chunks);
            Ok(())
        }
        async fn vector_search(&self, _store_id: &str, _q: &[f32], _limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
            Ok(vec![])
        }
        async fn fts_search(&self, _store_id: &str, _q: &str, _limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
            Ok(vec![])
        }
        async fn delete_by_file_path(&self, store_id: &str, file_path: &str) -> Result<u64, DomainError> {
            let mut guard = self.chunks.lock().unwrap();
            if let Some(chunks) = guard.get_mut(store_id) {
                let before = chunks.len();
                chunks.retain(|c| c.source() != file_path);
                return Ok((before - chunks.len()) as u64);
            }
            Ok(0)
        }
        async fn drop_table(&self, store_id: &str) -> Result<(), DomainError> {
            self.chunks.lock().unwrap().remove(store_id);
            Ok(())
        }
        async fn count(&self, store_id: &str) -> Result<u64, DomainError> {
            Ok(self.chunks.lock().unwrap().get(store_id).map(|c| c.len()).unwrap_or(0) as u64)
        }
    }

    struct DeterministicEmbedding {
        config: EmbeddingConfig,
    }

    #[async_trait]
    impl EmbeddingService for DeterministicEmbedding {
        async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
            Ok(vec![text.len() as f32; 4])
        }
        async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
            let mut out = Vec::with_capacity(texts.len());
            for t in texts {
                out.push(self.embed_text(t).await?);
            }
            Ok(out)
        }
        async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
            self.embed_text(query).await
        }
        fn config(&self) -> &EmbeddingConfig {
            &self.config
        }
    }

    #[derive(Default)]
    struct InMemoryFileHashes {
        hashes: Mutex<HashMap<(String, String), String>>,
    }

    #[async_trait]
    impl FileHashRepository for InMemoryFileHashes {
        async fn save_batch(&self, hashes: &[FileHash]) -> Result<(), DomainError> {
            let mut guard = self.hashes.lock().unwrap();
            for h in hashes {
                guard.insert((h.store_id().to_string(), h.file_path().to_string()), h.content_hash().to_string());
            }
            Ok(())
        }
        async fn find_by_store(&self, store_id: &str) -> Result<Vec<FileHash>, DomainError> {
            let guard = self.hashes.lock().unwrap();
            Ok(guard
                .iter()
                .filter(|((sid, _), _)| sid == store_id)
                .map(|((sid, path), hash)| FileHash::new(sid.clone(), path.clone(), hash.clone()))
                .collect())
        }
        async fn delete_by_paths(&self, store_id: &str, paths: &[String]) -> Result<(), DomainError> {
            let mut guard = self.hashes.lock().unwrap();
            for path in paths {
                guard.remove(&(store_id.to_string(), path.clone()));
            }
            Ok(())
        }
        async fn delete_by_store(&self, store_id: &str) -> Result<(), DomainError> {
            self.hashes.lock().unwrap().retain(|(sid, _), _| sid != store_id);
            Ok(())
        }
    }

    fn use_case() -> (IndexStoreUseCase, Arc<InMemoryVectorRepo>) {
        let vector_repo = Arc::new(InMemoryVectorRepo::default());
        let use_case = IndexStoreUseCase::new(
            Arc::new(InMemoryCatalog::default()),
            vector_repo.clone(),
            Arc::new(DeterministicEmbedding { config: EmbeddingConfig::default() }),
            Arc::new(InMemoryFileHashes::default()),
        );
        (use_case, vector_repo)
    }

    #[tokio::test]
    async fn indexes_a_small_directory() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("README.md"), "# Intro\nhello world\n").unwrap();
        std::fs::write(dir.path().join("main.rs"), "fn main() {}\n").unwrap();

        let (use_case, vector_repo) = use_case();
        let store = Store::new("fixture", StoreKind::File { path: dir.path().to_string_lossy().to_string() });
        let outcome = use_case.execute(&store, false, Arc::new(NoopProgressSink)).await.unwrap();

        assert_eq!(outcome.documents_indexed, 2);
        assert!(vector_repo.count(store.id()).await.unwrap() >= 2);
    }

    #[tokio::test]
    async fn reindex_unchanged_file_is_a_noop() {
        let dir = tempdir().unwrap();
        std::fs::write(dir.path().join("a.rs"), "fn a() {}\n").unwrap();

        let (use_case, vector_repo) = use_case();
        let store = Store::new("fixture", StoreKind::File { path: dir.path().to_string_lossy().to_string() });
        use_case.execute(&store, false, Arc::new(NoopProgressSink)).await.unwrap();
        let first_count = vector_repo.count(store.id()).await.unwrap();

        use_case.execute(&store, false, Arc::new(NoopProgressSink)).await.unwrap();
        let second_count = vector_repo.count(store.id()).await.unwrap();

        assert_eq!(first_count, second_count);
    }

    #[tokio::test]
    async fn web_store_is_rejected() {
        let (use_case, _vector_repo) = use_case();
        let store = Store::new("web", StoreKind::Web { url: "https://example.com".into(), depth: 1 });
        let err = use_case.execute(&store, false, Arc::new(NoopProgressSink)).await.unwrap_err();
        assert!(err.is_validation());
    }
}
