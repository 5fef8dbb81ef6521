mod cancellation;
mod code_graph_repository;
mod embedding_service;
mod file_hash_repository;
mod graph_extractor_service;
mod job_repository;
mod progress_sink;
mod store_catalog_repository;
mod vector_repository;

pub use cancellation::*;
pub use code_graph_repository::*;
pub use embedding_service::*;
pub use file_hash_repository::*;
pub use graph_extractor_service::*;
pub use job_repository::*;
pub use progress_sink::*;
pub use store_catalog_repository::*;
pub use vector_repository::*;
