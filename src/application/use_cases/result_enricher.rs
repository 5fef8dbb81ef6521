//! Builds `SearchResult`s from ranked hits at the requested `DetailLevel`
//! (§4.5). Thin orchestration over the pure derivation functions in
//! `domain::services::enricher`: this layer's only job is loading the
//! optional `CodeGraph` a store may have and threading it through.

use std::sync::Arc;

use crate::application::{CodeGraphRepository, RankedHit};
use crate::domain::services::enricher::{build_context, build_full, build_summary};
use crate::domain::{CodeGraph, DetailLevel, DomainError, Intent, SearchResult};

pub struct ResultEnricherUseCase {
    code_graph_repo: Arc<dyn CodeGraphRepository>,
}

impl ResultEnricherUseCase {
    pub fn new(code_graph_repo: Arc<dyn CodeGraphRepository>) -> Self {
        Self { code_graph_repo }
    }

    pub async fn enrich(
        &self,
        hits: Vec<RankedHit>,
        query: &str,
        intent: Intent,
        detail: DetailLevel,
    ) -> Result<Vec<SearchResult>, DomainError> {
        let mut graphs: std::collections::HashMap<String, Option<CodeGraph>> = std::collections::HashMap::new();
        let mut results = Vec::with_capacity(hits.len());

        for hit in hits {
            let summary = build_summary(&hit.chunk, query, intent);
            let mut result = SearchResult::new(hit.chunk.id(), hit.chunk.store_id(), hit.chunk.source(), hit.score, summary);

            if detail.wants_context() || detail.wants_full() {
                let graph = self.graph_for(hit.chunk.store_id(), &mut graphs).await?;
                result = result.with_context(build_context(&hit.chunk, graph.as_ref()));
                if detail.wants_full() {
                    result = result.with_full(build_full(&hit.chunk, graph.as_ref()));
                }
            }

            results.push(result);
        }

        Ok(results)
    }

    async fn graph_for<'a>(
        &self,
        store_id: &str,
        cache: &'a mut std::collections::HashMap<String, Option<CodeGraph>>,
    ) -> Result<&'a Option<CodeGraph>, DomainError> {
        if !cache.contains_key(store_id) {
            let graph = self.code_graph_repo.load(store_id).await?;
            cache.insert(store_id.to_string(), graph);
        }
        Ok(cache.get(store_id).unwrap())
    }
}
