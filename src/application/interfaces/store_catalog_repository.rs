use async_trait::async_trait;

use crate::domain::{DomainError, Store};

/// Persistence for the store catalog (§4.8), a single JSON document on disk
/// holding every known store's metadata.
#[async_trait]
pub trait StoreCatalogRepository: Send + Sync {
    async fn create(&self, store: Store) -> Result<Store, DomainError>;

    /// Looks a store up by id first, then by exact name.
    async fn get_by_id_or_name(&self, needle: &str) -> Result<Option<Store>, DomainError>;

    async fn list(&self) -> Result<Vec<Store>, DomainError>;

    async fn save(&self, store: &Store) -> Result<(), DomainError>;

    /// Removes the catalog record. Callers are responsible for the ordered
    /// cleanup (vector table, cloned tree) that must happen first.
    async fn delete(&self, id: &str) -> Result<(), DomainError>;
}
