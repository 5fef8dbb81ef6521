use std::sync::Arc;
use std::time::Instant;

use rmcp::handler::server::tool::ToolRouter;
use rmcp::handler::server::wrapper::Parameters;
use rmcp::model::{CallToolResult, Content, Implementation, ProtocolVersion, ServerCapabilities, ServerInfo};
use rmcp::tool;
use rmcp::tool_handler;
use rmcp::tool_router;
use rmcp::ErrorData as McpError;
use rmcp::ServerHandler;

use crate::connector::container::Container;
use crate::domain::{DetailLevel, DomainError, Intent, SearchQuery};

use super::tools::{ExecuteToolInput, GetFullContextInput, SearchResultOutput, SearchToolInput, SearchToolOutput};

/// Server-side maximum for the number of results a single search can return.
const MAX_LIMIT: usize = 100;

fn domain_error_content(err: DomainError) -> CallToolResult {
    CallToolResult::success(vec![Content::text(format!("error: {err}"))])
}

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

/// MCP stdio tool server exposing exactly three tools (§6): `search`,
/// `get_full_context`, `execute`.
#[derive(Clone)]
pub struct CodeRetrievalMcpServer {
    container: Arc<Container>,
    tool_router: ToolRouter<Self>,
}

#[tool_router]
impl CodeRetrievalMcpServer {
    pub fn new(container: Arc<Container>) -> Self {
        Self {
            container,
            tool_router: Self::tool_router(),
        }
    }

    /// Searches indexed stores with hybrid vector+full-text ranking and
    /// returns progressively-detailed results.
    #[tool(name = "search")]
    async fn search(&self, params: Parameters<SearchToolInput>) -> Result<CallToolResult, McpError> {
        let started = Instant::now();
        let input = params.0;

        let result = async {
            let limit = input.limit.min(MAX_LIMIT);
            let mut query = SearchQuery::new(&input.query).with_limit(limit);
            if let Some(raw) = &input.intent {
                query = query.with_intent(parse_intent(raw)?);
            }
            let requested_detail = match &input.detail {
                Some(raw) => parse_detail(raw)?,
                None => DetailLevel::Minimal,
            };
            query = query.with_detail(requested_detail);
            if let Some(stores) = input.stores {
                query = query.with_stores(stores);
            }

            let outcome = self.container.search_use_case().execute(&query).await?;
            let chunks: Vec<_> = outcome.hits.iter().map(|hit| hit.chunk.clone()).collect();
            let enriched = self
                .container
                .result_enricher_use_case()
                .enrich(outcome.hits, input.query.as_str(), outcome.intent, DetailLevel::Full)
                .await?;

            let cache = self.container.result_cache_use_case();
            for (chunk, result) in chunks.iter().zip(enriched.iter()) {
                cache.put(chunk, result.clone(), input.query.as_str(), outcome.intent);
            }

            let results: Vec<SearchResultOutput> = enriched.iter().map(|r| SearchResultOutput::at_detail(r, requested_detail)).collect();
            Ok::<_, DomainError>(SearchToolOutput {
                total_results: results.len(),
                results,
                mode: format!("{:?}", outcome.mode).to_lowercase(),
                time_ms: started.elapsed().as_millis() as u64,
            })
        }
        .await;

        match result {
            Ok(output) => {
                let json = serde_json::to_string_pretty(&output).map_err(|e| McpError::internal_error(format!("failed to serialize results: {e}"), None))?;
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
            // §7: searches never throw through the tool boundary; errors
            // surface as a textual envelope instead.
            Err(err) => Ok(domain_error_content(err)),
        }
    }

    /// Returns a previously returned result elevated to full detail,
    /// re-querying the originating store on a cold cache.
    #[tool(name = "get_full_context")]
    async fn get_full_context(&self, params: Parameters<GetFullContextInput>) -> Result<CallToolResult, McpError> {
        let input = params.0;
        match self.container.result_cache_use_case().get_full_context(&input.result_id).await {
            Ok(result) => {
                let output = SearchResultOutput::at_detail(&result, DetailLevel::Full);
                let json = serde_json::to_string_pretty(&output).map_err(|e| McpError::internal_error(format!("failed to serialize result: {e}"), None))?;
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
            Err(err) => Ok(domain_error_content(err)),
        }
    }

    /// Dispatches a named subcommand (`stores`, `store:info`, `store:create`,
    /// `store:index`, `store:delete`, `jobs`, `job:status`, `job:cancel`,
    /// `help`, `commands`) against the store/job management surface.
    #[tool(name = "execute")]
    async fn execute(&self, params: Parameters<ExecuteToolInput>) -> Result<CallToolResult, McpError> {
        let input = params.0;
        let args = input.args.unwrap_or_else(|| serde_json::json!({}));
        match crate::connector::commands::dispatch(&self.container, &input.command, args).await {
            Ok(value) => {
                let json = serde_json::to_string_pretty(&value).map_err(|e| McpError::internal_error(format!("failed to serialize result: {e}"), None))?;
                Ok(CallToolResult::success(vec![Content::text(json)]))
            }
            Err(err) => Ok(domain_error_content(err)),
        }
    }
}

#[tool_handler]
impl ServerHandler for CodeRetrievalMcpServer {
    fn get_info(&self) -> ServerInfo {
        ServerInfo {
            protocol_version: ProtocolVersion::V_2024_11_05,
            capabilities: ServerCapabilities::builder().enable_tools().build(),
            server_info: Implementation::from_build_env(),
            instructions: Some(
                "Local-first code knowledge retrieval server. Use `search` to find relevant code \
                 by natural-language query, `get_full_context` to elevate a previous result to \
                 full detail, and `execute` to manage stores and index jobs (see the `help` \
                 command)."
                    .into(),
            ),
        }
    }
}
