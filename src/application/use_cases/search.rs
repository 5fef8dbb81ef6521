//! The Ranker (§4.4): vector / FTS / hybrid retrieval over one or more
//! stores, RRF fusion, context-aware boosting, source dedup, and page-local
//! normalization. The per-store vector+FTS fetch mirrors the donor's
//! `SearchCodeUseCase::execute_hybrid`'s `tokio::join!` precedent; the fusion
//! step reuses `rrf_fuse` verbatim with this pipeline's own constants.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::Arc;

use tracing::debug;

use crate::application::use_cases::rrf_fuse::rrf_fuse;
use crate::application::{EmbeddingService, RankedChunk, StoreCatalogRepository, VectorRepository};
use crate::domain::services::boosts::{file_type_boost, framework_boost};
use crate::domain::services::intent::classify as classify_intent;
use crate::domain::{Chunk, DomainError, Intent, SearchMode, SearchQuery};

/// Overfetch multiplier for a single-mode (vector-only or FTS-only) search.
const SINGLE_MODE_OVERFETCH: usize = 3;
/// Overfetch multiplier per leg in hybrid mode (§4.4: "each fetching 2·limit").
const HYBRID_OVERFETCH: usize = 2;
/// Upper bound on distinct-source candidates carried into dedup/boosting, so
/// a pathologically large corpus doesn't make every search O(all chunks).
const FUSED_CANDIDATE_CAP: usize = 500;

#[derive(Debug, Clone)]
pub struct RankedHit {
    pub chunk: Chunk,
    pub score: f32,
}

#[derive(Debug, Clone)]
pub struct SearchOutcome {
    pub hits: Vec<RankedHit>,
    pub intent: Intent,
    pub mode: SearchMode,
}

pub struct SearchUseCase {
    catalog: Arc<dyn StoreCatalogRepository>,
    vector_repo: Arc<dyn VectorRepository>,
    embedding: Arc<dyn EmbeddingService>,
}

impl SearchUseCase {
    pub fn new(catalog: Arc<dyn StoreCatalogRepository>, vector_repo: Arc<dyn VectorRepository>, embedding: Arc<dyn EmbeddingService>) -> Self {
        Self {
            catalog,
            vector_repo,
            embedding,
        }
    }

    pub async fn execute(&self, query: &SearchQuery) -> Result<SearchOutcome, DomainError> {
        if query.text().trim().is_empty() {
            return Err(DomainError::invalid_input("search query must not be empty"));
        }

        let store_ids = self.resolve_store_ids(query).await?;
        let intent = query.intent().unwrap_or_else(|| classify_intent(query.text()));
        let mode = query.mode();

        let fused: Vec<(Chunk, f32)> = match mode {
            SearchMode::Vector => {
                let hits = self.fetch_vector(&store_ids, query.text(), query.limit() * SINGLE_MODE_OVERFETCH).await?;
                rank_by_score(hits)
            }
            SearchMode::Fts => {
                let hits = self.fetch_fts(&store_ids, query.text(), query.limit() * SINGLE_MODE_OVERFETCH).await?;
                rank_by_score(hits)
            }
            SearchMode::Hybrid => {
                let per_leg = query.limit() * HYBRID_OVERFETCH;
                let (vector_hits, fts_hits) = tokio::join!(
                    self.fetch_vector(&store_ids, query.text(), per_leg),
                    self.fetch_fts(&store_ids, query.text(), per_leg),
                );
                rrf_fuse(vector_hits?, fts_hits?, FUSED_CANDIDATE_CAP)
            }
        };

        let query_terms = distinct_terms(query.text());
        let boosted: Vec<(Chunk, f32, i64)> = fused
            .into_iter()
            .map(|(chunk, score)| {
                let boost = file_type_boost(chunk.file_type(), intent) * framework_boost(query.text(), chunk.source(), chunk.content());
                let indexed_at = chunk.indexed_at();
                (chunk, score * boost, indexed_at)
            })
            .collect();

        let deduped = dedup_by_source(boosted, &query_terms);
        let mut ranked = tie_break(deduped, &query_terms);
        ranked.truncate(query.limit());
        normalize_page(&mut ranked);

        debug!(query = query.text(), mode = ?mode, intent = ?intent, results = ranked.len(), "search complete");

        Ok(SearchOutcome {
            hits: ranked.into_iter().map(|(chunk, score)| RankedHit { chunk, score }).collect(),
            intent,
            mode,
        })
    }

    async fn resolve_store_ids(&self, query: &SearchQuery) -> Result<Vec<String>, DomainError> {
        match query.stores() {
            Some(names) => {
                let mut ids = Vec::with_capacity(names.len());
                for name in names {
                    let store = self
                        .catalog
                        .get_by_id_or_name(name)
                        .await?
                        .ok_or_else(|| DomainError::not_found(format!("no store matching '{name}'")))?;
                    ids.push(store.id().to_string());
                }
                Ok(ids)
            }
            None => Ok(self.catalog.list().await?.into_iter().map(|s| s.id().to_string()).collect()),
        }
    }

    async fn fetch_vector(&self, store_ids: &[String], query_text: &str, per_store_limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
        let query_embedding = self.embedding.embed_query(query_text).await?;
        let mut hits = Vec::new();
        for store_id in store_ids {
            hits.extend(self.vector_repo.vector_search(store_id, &query_embedding, per_store_limit).await?);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Ok(hits)
    }

    async fn fetch_fts(&self, store_ids: &[String], query_text: &str, per_store_limit: usize) -> Result<Vec<RankedChunk>, DomainError> {
        let mut hits = Vec::new();
        for store_id in store_ids {
            hits.extend(self.vector_repo.fts_search(store_id, query_text, per_store_limit).await?);
        }
        hits.sort_by(|a, b| b.score.partial_cmp(&a.score).unwrap_or(Ordering::Equal));
        Ok(hits)
    }
}

fn rank_by_score(hits: Vec<RankedChunk>) -> Vec<(Chunk, f32)> {
    hits.into_iter().map(|h| (h.chunk, h.score)).collect()
}

/// Lowercased, deduplicated query terms of length ≥ 3 (§4.4 dedup rule).
fn distinct_terms(query: &str) -> Vec<String> {
    let mut terms: Vec<String> = query
        .split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_lowercase())
        .collect();
    terms.sort();
    terms.dedup();
    terms
}

fn count_matching_terms(content: &str, terms: &[String]) -> usize {
    let haystack = content.to_lowercase();
    terms.iter().filter(|t| haystack.contains(t.as_str())).count()
}

/// Collapses chunks sharing the same source to one representative: the
/// chunk containing the most distinct query terms, ties by higher score
/// (§4.4 "Deduplication by source").
fn dedup_by_source(candidates: Vec<(Chunk, f32, i64)>, query_terms: &[String]) -> Vec<(Chunk, f32, i64)> {
    let mut by_source: HashMap<String, (Chunk, f32, i64, usize)> = HashMap::new();
    for (chunk, score, indexed_at) in candidates {
        let term_hits = count_matching_terms(chunk.content(), query_terms);
        let key = chunk.source().to_string();
        match by_source.get(&key) {
            Some((_, existing_score, _, existing_hits)) => {
                let better = term_hits > *existing_hits || (term_hits == *existing_hits && score > *existing_score);
                if better {
                    by_source.insert(key, (chunk, score, indexed_at, term_hits));
                }
            }
            None => {
                by_source.insert(key, (chunk, score, indexed_at, term_hits));
            }
        }
    }
    by_source.into_values().map(|(chunk, score, indexed_at, _)| (chunk, score, indexed_at)).collect()
}

/// Tie-breaking across all modes (§4.4): higher score, then more distinct
/// query terms, then earlier-inserted chunk.
fn tie_break(mut candidates: Vec<(Chunk, f32, i64)>, query_terms: &[String]) -> Vec<(Chunk, f32)> {
    candidates.sort_by(|a, b| {
        b.1.partial_cmp(&a.1)
            .unwrap_or(Ordering::Equal)
            .then_with(|| count_matching_terms(b.0.content(), query_terms).cmp(&count_matching_terms(a.0.content(), query_terms)))
            .then_with(|| a.2.cmp(&b.2))
    });
    candidates.into_iter().map(|(chunk, score, _)| (chunk, score)).collect()
}

/// Min-max normalizes scores to `[0, 1]` within the page, top = 1.0. Leaves
/// scores untouched when fewer than two results exist or all scores are
/// equal, since a range of zero has no meaningful normalization (§4.4,
/// §8 "Ranker normalization").
fn normalize_page(ranked: &mut [(Chunk, f32)]) {
    if ranked.len() < 2 {
        return;
    }
    let max = ranked.iter().map(|(_, s)| *s).fold(f32::MIN, f32::max);
    let min = ranked.iter().map(|(_, s)| *s).fold(f32::MAX, f32::min);
    if (max - min).abs() < f32::EPSILON {
        return;
    }
    for (_, score) in ranked.iter_mut() {
        *score = (*score - min) / (max - min);
    }
}
