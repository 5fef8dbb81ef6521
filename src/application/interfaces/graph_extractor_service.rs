use async_trait::async_trait;

use crate::domain::{DomainError, GraphEdge, Language};

/// Extracts `calls` edges from source text for the optional code graph
/// (§3, §4.5's `usage`/`relatedCode` fields). A port to an external parsing
/// capability (tree-sitter), kept at this layer rather than `domain::services`
/// to match where the donor keeps its own `VectorRepository`/`ParserService`
/// ports — traits over external collaborators belong in `application`, not
/// in the framework-free domain layer.
#[async_trait]
pub trait GraphExtractorService: Send + Sync {
    async fn extract_edges(
        &self,
        content: &str,
        file_path: &str,
        language: Language,
    ) -> Result<Vec<GraphEdge>, DomainError>;

    fn supported_languages(&self) -> Vec<Language>;

    fn supports_language(&self, language: Language) -> bool {
        self.supported_languages().contains(&language)
    }
}
