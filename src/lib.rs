//! # coderetrieval
//!
//! A local-first code knowledge retrieval engine: it ingests directories,
//! cloned repositories, and crawled web stores, chunks and classifies their
//! content, and serves hybrid vector+full-text ranked retrieval with
//! progressive-context result enrichment to an AI coding assistant over an
//! MCP stdio tool server.
//!
//! ## Architecture
//!
//! The crate follows the same three-layer split as its donor codebase:
//!
//! - `domain`: models, error taxonomy, and pure services (chunker,
//!   classifier, code-unit extraction, intent classification, ranking
//!   boosts, result enrichment) — framework-free.
//! - `application`: use cases (indexing, search, job management, store
//!   catalog, result cache, code graph) and the interfaces (ports) the
//!   connector layer implements.
//! - `connector`: adapters (DuckDB-backed vector store, JSON-file-backed
//!   catalog/job/code-graph repositories, tree-sitter call-graph extractor,
//!   mock embedding service) plus the CLI and MCP stdio server.

pub mod application;
pub mod connector;
pub mod domain;

pub use application::*;
pub use connector::*;
pub use domain::*;
