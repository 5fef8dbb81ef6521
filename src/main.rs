//! `coderetrieval` CLI entry point. Parses `connector::cli::Cli`, resolves
//! the data directory (§6 "single data-dir env var" / `--data-dir` flag),
//! wires a `Container`, and either runs `search` directly against the
//! ranker, starts the MCP stdio server, or routes every other subcommand
//! through the same `connector::commands::dispatch` registry the MCP
//! `execute` tool uses — so the CLI and the MCP surface never diverge.

use std::sync::Arc;

use anyhow::{anyhow, Result};
use clap::Parser;
use tracing::Level;
use tracing_subscriber::FmtSubscriber;

use coderetrieval::connector::adapter::mcp::CodeRetrievalMcpServer;
use coderetrieval::connector::cli::{Cli, Commands};
use coderetrieval::connector::commands;
use coderetrieval::connector::config::Config;
use coderetrieval::connector::container::{Container, ContainerConfig};
use coderetrieval::domain::{DetailLevel, DomainError, Intent, SearchQuery, StoreKind};

fn parse_intent(raw: &str) -> Result<Intent, DomainError> {
    match raw {
        "how-to" | "howto" => Ok(Intent::HowTo),
        "implementation" => Ok(Intent::Implementation),
        "conceptual" => Ok(Intent::Conceptual),
        "comparison" => Ok(Intent::Comparison),
        "debugging" => Ok(Intent::Debugging),
        other => Err(DomainError::invalid_input(format!("unknown intent '{other}'"))),
    }
}

fn parse_detail(raw: &str) -> Result<DetailLevel, DomainError> {
    match raw {
        "minimal" => Ok(DetailLevel::Minimal),
        "contextual" => Ok(DetailLevel::Contextual),
        "full" => Ok(DetailLevel::Full),
        other => Err(DomainError::invalid_input(format!("unknown detail level '{other}'"))),
    }
}

fn store_kind_from_cli(kind: &str, path: Option<String>, url: Option<String>, branch: Option<String>, depth: Option<u32>) -> Result<StoreKind> {
    match kind {
        "file" => Ok(StoreKind::File { path: path.ok_or_else(|| anyhow!("a file store requires --path"))? }),
        "repo" => Ok(StoreKind::Repo {
            url: url.ok_or_else(|| anyhow!("a repo store requires --url"))?,
            branch,
            path: path.ok_or_else(|| anyhow!("a repo store requires --path"))?,
        }),
        "web" => Ok(StoreKind::Web { url: url.ok_or_else(|| anyhow!("a web store requires --url"))?, depth: depth.unwrap_or(1) }),
        other => Err(anyhow!("unknown store kind '{other}'; expected file, repo, or web")),
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    let level = if cli.verbose { Level::DEBUG } else { Level::INFO };
    let subscriber = FmtSubscriber::builder().with_max_level(level).with_target(false).finish();
    tracing::subscriber::set_global_default(subscriber).map_err(|err| anyhow!(err))?;

    let config = Config::resolve(cli.data_dir, cli.verbose);
    let container = Arc::new(Container::new(ContainerConfig::new(config.data_dir.clone()))?);

    match cli.command {
        Commands::Mcp => {
            run_mcp_server(container).await?;
        }

        Commands::Search { query, intent, detail, limit, stores } => {
            let mut search_query = SearchQuery::new(&query).with_limit(limit);
            if let Some(raw) = intent {
                search_query = search_query.with_intent(parse_intent(&raw)?);
            }
            let requested_detail = parse_detail(&detail)?;
            search_query = search_query.with_detail(requested_detail);
            if let Some(stores) = stores {
                search_query = search_query.with_stores(stores);
            }

            let outcome = container.search_use_case().execute(&search_query).await?;
            let enriched = container
                .result_enricher_use_case()
                .enrich(outcome.hits.clone(), &query, outcome.intent, DetailLevel::Full)
                .await?;

            let cache = container.result_cache_use_case();
            for (hit, result) in outcome.hits.iter().zip(enriched.iter()) {
                cache.put(&hit.chunk, result.clone(), &query, outcome.intent);
            }

            if enriched.is_empty() {
                println!("No results found.");
            } else {
                println!("Found {} results ({:?} mode, {:?} intent):\n", enriched.len(), outcome.mode, outcome.intent);
                for (i, result) in enriched.iter().enumerate() {
                    let summary = result.summary();
                    println!("{}. {} — {} (score: {:.3})", i + 1, summary.name, summary.location, result.score());
                    println!("   {}", summary.purpose);
                    println!("   {}", summary.relevance_reason);
                    if requested_detail.wants_full() {
                        if let Some(full) = result.full() {
                            println!("   --- complete code ---");
                            for line in full.complete_code.lines().take(10) {
                                println!("   | {line}");
                            }
                        }
                    }
                    println!();
                }
            }
        }

        Commands::StoreCreate { name, kind, path, url, branch, depth } => {
            let kind = store_kind_from_cli(&kind, path, url, branch, depth)?;
            let store = container.store_catalog_use_case().create(name, kind).await?;
            println!("Created store '{}' ({})", store.name(), store.id());
        }

        Commands::StoreIndex { id_or_name, force } => {
            let value = commands::dispatch(
                &container,
                "store:index",
                serde_json::json!({ "idOrName": id_or_name, "force": force }),
            )
            .await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::Stores => {
            let value = commands::dispatch(&container, "stores", serde_json::json!({})).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::StoreInfo { id_or_name } => {
            let value = commands::dispatch(&container, "store:info", serde_json::json!({ "idOrName": id_or_name })).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::StoreDelete { id_or_name } => {
            let value = commands::dispatch(&container, "store:delete", serde_json::json!({ "idOrName": id_or_name })).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::Jobs { active_only } => {
            let value = commands::dispatch(&container, "jobs", serde_json::json!({ "activeOnly": active_only })).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::JobStatus { id } => {
            let value = commands::dispatch(&container, "job:status", serde_json::json!({ "id": id })).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }

        Commands::JobCancel { id } => {
            let value = commands::dispatch(&container, "job:cancel", serde_json::json!({ "id": id })).await?;
            println!("{}", serde_json::to_string_pretty(&value)?);
        }
    }

    Ok(())
}

async fn run_mcp_server(container: Arc<Container>) -> Result<()> {
    use rmcp::transport::stdio;
    use rmcp::ServiceExt;

    let server = CodeRetrievalMcpServer::new(container);
    let service = server.serve(stdio()).await.map_err(|err| anyhow!("failed to start MCP server: {err}"))?;
    service.waiting().await.map_err(|err| anyhow!("MCP server exited with an error: {err}"))?;
    Ok(())
}
