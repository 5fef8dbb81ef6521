use async_trait::async_trait;

use crate::domain::{CodeGraph, DomainError};

/// Persistence for a store's optional code graph. Absence of a saved graph
/// is not an error — callers degrade to zeroed usage stats (§3).
#[async_trait]
pub trait CodeGraphRepository: Send + Sync {
    async fn save(&self, store_id: &str, graph: &CodeGraph) -> Result<(), DomainError>;

    async fn load(&self, store_id: &str) -> Result<Option<CodeGraph>, DomainError>;

    async fn delete(&self, store_id: &str) -> Result<(), DomainError>;
}
