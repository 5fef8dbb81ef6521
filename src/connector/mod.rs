//! # Connector Layer
//!
//! External integrations implementing the application layer's interfaces,
//! plus the two process entry surfaces (CLI, MCP stdio server) that wire
//! them together via `Container`:
//! - `adapter`: DuckDB-backed vector store, JSON-file-backed catalog/job/
//!   code-graph repositories, tree-sitter call-graph extractor, mock
//!   embedding service, MCP tool server.
//! - `cli` / `commands`: the `coderetrieval` binary's subcommand surface and
//!   the shared `execute` registry it dispatches through alongside the MCP
//!   `execute` tool.
//! - `config` / `container`: data-directory resolution and dependency
//!   wiring.

pub mod adapter;
pub mod cli;
pub mod commands;
pub mod config;
pub mod container;

pub use adapter::*;
pub use config::*;
pub use container::*;
