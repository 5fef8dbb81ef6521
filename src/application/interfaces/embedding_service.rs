use async_trait::async_trait;

use crate::domain::{DomainError, EmbeddingConfig};

/// The embedding model runtime, kept opaque behind this port (§1). Operates
/// on raw text rather than a domain type, since chunk content and query
/// strings are embedded identically.
#[async_trait]
pub trait EmbeddingService: Send + Sync {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError>;

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError>;

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError>;

    fn config(&self) -> &EmbeddingConfig;
}
