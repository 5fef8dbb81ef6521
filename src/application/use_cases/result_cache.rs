//! Recency-biased cache of search hits for zero-latency follow-up lookups
//! (§4.9). No `lru` crate in the dependency tree, so the eviction policy is
//! hand-rolled: a `HashMap` plus a recency queue, following the same
//! "small explicit state machine over a crate dependency" preference the
//! donor shows for `code_unit`'s brace scan.
//!
//! The full-result cache (capacity ≈ 1000, per §4.9) is what `get_full_context`
//! reads on a hit. A second, larger "fallback index" (store id + content
//! prefix + originating query) is kept alongside it so that the documented
//! miss behavior — "look up the source store for the id, issue a narrow
//! re-query using a prefix of the previously cached content" — has something
//! to re-query with even after the full record has aged out of the smaller
//! cache. This two-tier split is not named explicitly in the source
//! material; it is the most direct implementation of the literal miss
//! behavior without inventing persistence the cache isn't meant to have.

use std::collections::{HashMap, VecDeque};
use std::sync::Arc;
use std::sync::Mutex;

use crate::application::{ResultEnricherUseCase, StoreCatalogRepository, VectorRepository};
use crate::domain::{Chunk, DetailLevel, DomainError, Intent, SearchResult};

const FULL_CACHE_CAPACITY: usize = 1000;
const FALLBACK_INDEX_CAPACITY: usize = 5000;
const FALLBACK_REQUERY_LIMIT: usize = 5;
/// Length of the content prefix kept for the fallback re-query.
const CONTENT_PREFIX_LEN: usize = 200;

struct Lru<V> {
    capacity: usize,
    order: VecDeque<String>,
    entries: HashMap<String, V>,
}

impl<V> Lru<V> {
    fn new(capacity: usize) -> Self {
        Self {
            capacity,
            order: VecDeque::new(),
            entries: HashMap::new(),
        }
    }

    fn touch(&mut self, key: &str) {
        if let Some(pos) = self.order.iter().position(|k| k == key) {
            self.order.remove(pos);
        }
        self.order.push_back(key.to_string());
    }

    fn get(&mut self, key: &str) -> Option<&V> {
        if self.entries.contains_key(key) {
            self.touch(key);
            self.entries.get(key)
        } else {
            None
        }
    }

    fn put(&mut self, key: String, value: V) {
        if !self.entries.contains_key(&key) && self.entries.len() >= self.capacity {
            if let Some(oldest) = self.order.pop_front() {
                self.entries.remove(&oldest);
            }
        }
        self.touch(&key);
        self.entries.insert(key, value);
    }
}

struct FallbackRecord {
    store_id: String,
    content_prefix: String,
    query: String,
    intent: Intent,
}

struct CacheState {
    full: Lru<SearchResult>,
    fallback: Lru<FallbackRecord>,
}

pub struct ResultCacheUseCase {
    catalog: Arc<dyn StoreCatalogRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    enricher: Arc<ResultEnricherUseCase>,
    state: Mutex<CacheState>,
}

impl ResultCacheUseCase {
    pub fn new(catalog: Arc<dyn StoreCatalogRepository>, vector_repo: Arc<dyn VectorRepository>, enricher: Arc<ResultEnricherUseCase>) -> Self {
        Self {
            catalog,
            vector_repo,
            enricher,
            state: Mutex::new(CacheState {
                full: Lru::new(FULL_CACHE_CAPACITY),
                fallback: Lru::new(FALLBACK_INDEX_CAPACITY),
            }),
        }
    }

    /// Records a search hit. `result` should already be enriched to `Full`
    /// detail, since `get_full_context` returns cache hits as-is (§6:
    /// "returns the cached result elevated to full detail").
    pub fn put(&self, chunk: &Chunk, result: SearchResult, query: &str, intent: Intent) {
        let id = result.id().to_string();
        let prefix: String = chunk.content().chars().take(CONTENT_PREFIX_LEN).collect();
        let mut state = self.state.lock().unwrap();
        state.fallback.put(
            id.clone(),
            FallbackRecord {
                store_id: chunk.store_id().to_string(),
                content_prefix: prefix,
                query: query.to_string(),
                intent,
            },
        );
        state.full.put(id, result);
    }

    pub async fn get_full_context(&self, id: &str) -> Result<SearchResult, DomainError> {
        if let Some(result) = self.state.lock().unwrap().full.get(id) {
            return Ok(result.clone());
        }

        let fallback = {
            let mut state = self.state.lock().unwrap();
            match state.fallback.get(id) {
                Some(record) => FallbackRecord {
                    store_id: record.store_id.clone(),
                    content_prefix: record.content_prefix.clone(),
                    query: record.query.clone(),
                    intent: record.intent,
                },
                None => {
                    return Err(DomainError::not_found(format!(
                        "result '{id}' is not cached and has no fallback record; re-run the search"
                    )));
                }
            }
        };

        self.catalog
            .get_by_id_or_name(&fallback.store_id)
            .await?
            .ok_or_else(|| DomainError::not_found(format!("result '{id}' references store '{}' which no longer exists", fallback.store_id)))?;

        let hits = self
            .vector_repo
            .fts_search(&fallback.store_id, &fallback.content_prefix, FALLBACK_REQUERY_LIMIT)
            .await?;
        let chunk = hits
            .into_iter()
            .map(|h| h.chunk)
            .find(|c| c.content().starts_with(fallback.content_prefix.as_str()) || c.id() == id)
            .ok_or_else(|| DomainError::not_found(format!("result '{id}' no longer matches any indexed chunk")))?;

        let hit = crate::application::RankedHit { chunk: chunk.clone(), score: 1.0 };
        let mut enriched = self.enricher.enrich(vec![hit], &fallback.query, fallback.intent, DetailLevel::Full).await?;
        let result = enriched.remove(0);
        self.put(&chunk, result.clone(), &fallback.query, fallback.intent);
        Ok(result)
    }
}
