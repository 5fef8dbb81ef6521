//! CLI surface (§2 ambient stack): a `clap`-derived `Cli`/`Commands` pair
//! mirroring the donor's own `Cli`/`Commands` shape, narrowed to this
//! pipeline's store/job/search model. Non-search subcommands are thin
//! wrappers over `connector::commands::dispatch`, so the CLI and the MCP
//! `execute` tool never diverge on behavior.

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "coderetrieval")]
#[command(author, version, about = "Local-first code knowledge retrieval engine", long_about = None)]
pub struct Cli {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Data directory holding the catalog, job records, and vector stores.
    #[arg(short, long, global = true)]
    pub data_dir: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Search indexed stores.
    Search {
        query: String,

        /// Query purpose: how-to, implementation, conceptual, comparison, debugging.
        #[arg(long)]
        intent: Option<String>,

        /// Progressive context level: minimal, contextual, full.
        #[arg(long, default_value = "minimal")]
        detail: String,

        #[arg(short, long, default_value = "10")]
        limit: usize,

        #[arg(short, long)]
        stores: Option<Vec<String>>,
    },

    /// List every store in the catalog.
    Stores,

    /// Look up one store by id or name.
    StoreInfo { id_or_name: String },

    /// Register a new store.
    StoreCreate {
        name: String,

        /// file, repo, or web.
        kind: String,

        #[arg(long)]
        path: Option<String>,

        #[arg(long)]
        url: Option<String>,

        #[arg(long)]
        branch: Option<String>,

        #[arg(long)]
        depth: Option<u32>,
    },

    /// Spawn a background index job for a store.
    StoreIndex {
        id_or_name: String,

        /// Recreate the vector table from scratch instead of diffing.
        #[arg(short, long)]
        force: bool,
    },

    /// Cascade-delete a store.
    StoreDelete { id_or_name: String },

    /// List jobs.
    Jobs {
        #[arg(short, long)]
        active_only: bool,
    },

    /// Look up one job by id.
    JobStatus { id: String },

    /// Cancel a pending or running job.
    JobCancel { id: String },

    /// Start the MCP stdio tool server.
    Mcp,
}
