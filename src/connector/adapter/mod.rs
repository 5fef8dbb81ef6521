mod duckdb_file_hash_repository;
mod duckdb_vector_repository;
mod in_memory_vector_repository;
mod job_progress_sink;
mod json_code_graph_repository;
mod json_fs;
mod json_job_repository;
mod json_store_catalog_repository;
pub mod mcp;
mod mock_embedding;
mod treesitter_graph_extractor;

pub use duckdb_file_hash_repository::*;
pub use duckdb_vector_repository::*;
pub use in_memory_vector_repository::*;
pub use job_progress_sink::*;
pub use json_code_graph_repository::*;
pub use json_job_repository::*;
pub use json_store_catalog_repository::*;
pub use mock_embedding::*;
pub use treesitter_graph_extractor::*;
