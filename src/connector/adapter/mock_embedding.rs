use async_trait::async_trait;
use rand::Rng;
use rand::SeedableRng;
use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};
use tracing::debug;

use crate::application::EmbeddingService;
use crate::domain::{DomainError, EmbeddingConfig};

/// Deterministic stand-in for a real embedding model (§1 treats the model
/// as opaque): hashes the input text, seeds an RNG from the hash, and
/// L2-normalizes the result, so the same text always embeds to the same
/// vector without requiring a model download. Grounded on the teacher's
/// own `MockEmbedding`, adapted from its chunk-specific `embed_chunk`/
/// `embed_chunks` shape to this port's raw-text `embed_text`/`embed_texts`.
pub struct MockEmbedding {
    config: EmbeddingConfig,
}

impl MockEmbedding {
    pub fn new() -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), 384, 512),
        }
    }

    pub fn with_dimensions(dimensions: usize) -> Self {
        Self {
            config: EmbeddingConfig::new("mock-embedding".to_string(), dimensions, 512),
        }
    }

    fn generate_embedding(&self, text: &str) -> Vec<f32> {
        let mut hasher = DefaultHasher::new();
        text.hash(&mut hasher);
        let seed = hasher.finish();

        let mut rng = rand::rngs::StdRng::seed_from_u64(seed);
        let mut vector: Vec<f32> = (0..self.config.dimensions()).map(|_| rng.gen_range(-1.0..1.0)).collect();

        let magnitude: f32 = vector.iter().map(|x| x * x).sum::<f32>().sqrt();
        if magnitude > 0.0 {
            for x in &mut vector {
                *x /= magnitude;
            }
        }

        vector
    }
}

impl Default for MockEmbedding {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl EmbeddingService for MockEmbedding {
    async fn embed_text(&self, text: &str) -> Result<Vec<f32>, DomainError> {
        let vector = self.generate_embedding(text);
        debug!(dimensions = vector.len(), "generated mock embedding");
        Ok(vector)
    }

    async fn embed_texts(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, DomainError> {
        let results: Vec<Vec<f32>> = texts.iter().map(|text| self.generate_embedding(text)).collect();
        debug!(count = results.len(), "generated mock embeddings");
        Ok(results)
    }

    async fn embed_query(&self, query: &str) -> Result<Vec<f32>, DomainError> {
        Ok(self.generate_embedding(query))
    }

    fn config(&self) -> &EmbeddingConfig {
        &self.config
    }
}
