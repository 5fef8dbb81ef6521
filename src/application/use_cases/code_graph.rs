//! Builds a store's optional code graph (§3, §4.5): walk the store's root,
//! extract `calls` edges from every file in a language the configured
//! `GraphExtractorService` supports, and persist the result. Mirrors
//! `IndexStoreUseCase`'s walk (same ignore rules) but skips chunking and
//! embedding entirely — this is a parse-only pass.

use std::path::Path;
use std::sync::Arc;

use ignore::WalkBuilder;
use tracing::{info, warn};

use crate::application::{CodeGraphRepository, GraphExtractorService};
use crate::domain::services::classifier;
use crate::domain::{CodeGraph, DomainError, Language, Store};

pub struct BuildCodeGraphUseCase {
    code_graph_repo: Arc<dyn CodeGraphRepository>,
    extractor: Arc<dyn GraphExtractorService>,
}

impl BuildCodeGraphUseCase {
    pub fn new(code_graph_repo: Arc<dyn CodeGraphRepository>, extractor: Arc<dyn GraphExtractorService>) -> Self {
        Self { code_graph_repo, extractor }
    }

    pub async fn execute(&self, store: &Store) -> Result<CodeGraph, DomainError> {
        let root = store
            .kind()
            .root_path()
            .ok_or_else(|| DomainError::invalid_input("building a code graph for a web store is not implemented; it has no working tree"))?
            .to_string();
        let root_path = Path::new(&root);

        let mut graph = CodeGraph::default();
        let mut files_parsed = 0u64;

        for entry in WalkBuilder::new(root_path)
            .hidden(false)
            .git_ignore(true)
            .git_global(true)
            .git_exclude(true)
            .build()
            .filter_map(|entry| entry.ok())
            .filter(|entry| entry.path().is_file())
            .filter(|entry| !classifier::is_ignored_path(entry.path()))
        {
            let path = entry.path();
            let language = Language::from_path(path);
            if !self.extractor.supports_language(language) {
                continue;
            }
            let relative = path.strip_prefix(root_path).unwrap_or(path).to_string_lossy().to_string();
            let content = match std::fs::read_to_string(path) {
                Ok(text) => text,
                Err(err) => {
                    warn!(file = %relative, error = %err, "skipping unreadable file during graph build");
                    continue;
                }
            };

            let edges = self.extractor.extract_edges(&content, &relative, language).await?;
            for edge in edges {
                graph.add_edge(edge.caller, edge.callee, edge.relation);
            }
            files_parsed += 1;
        }

        self.code_graph_repo.save(store.id(), &graph).await?;
        info!(store_id = store.id(), files_parsed, edges = graph.edges().len(), "built code graph");
        Ok(graph)
    }
}
