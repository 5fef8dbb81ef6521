use schemars::JsonSchema;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::domain::{ContextLayer, FullLayer, SearchResult, Summary};

fn default_limit() -> usize {
    10
}

/// Input for the `search` tool (§6).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct SearchToolInput {
    /// Natural language query describing the code to find.
    pub query: String,

    /// Query purpose classification; inferred from `query` when omitted.
    pub intent: Option<String>,

    /// Progressive context level: "minimal" (default), "contextual", or "full".
    pub detail: Option<String>,

    /// Maximum number of results to return (default: 10, server cap: 100).
    #[serde(default = "default_limit")]
    pub limit: usize,

    /// Restrict the search to these store ids/names; all stores when omitted.
    pub stores: Option<Vec<String>>,
}

#[derive(Debug, Serialize)]
pub struct SearchResultOutput {
    pub id: String,
    pub store_id: String,
    pub source: String,
    pub score: f32,
    pub summary: Summary,
    pub context: Option<ContextLayer>,
    pub full: Option<FullLayer>,
}

impl SearchResultOutput {
    /// Projects `result` down to `requested` detail. `result` itself is
    /// always enriched to `Full` before being cached (§4.9), so trimming
    /// happens here rather than by re-enriching per request.
    pub fn at_detail(result: &SearchResult, requested: crate::domain::DetailLevel) -> Self {
        Self {
            id: result.id().to_string(),
            store_id: result.store_id().to_string(),
            source: result.source().to_string(),
            score: result.score(),
            summary: result.summary().clone(),
            context: if requested.wants_context() { result.context().cloned() } else { None },
            full: if requested.wants_full() { result.full().cloned() } else { None },
        }
    }
}

#[derive(Debug, Serialize)]
pub struct SearchToolOutput {
    pub results: Vec<SearchResultOutput>,
    pub total_results: usize,
    pub mode: String,
    pub time_ms: u64,
}

/// Input for the `get_full_context` tool (§6).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct GetFullContextInput {
    pub result_id: String,
}

/// Input for the `execute` tool (§6).
#[derive(Debug, Deserialize, JsonSchema)]
pub struct ExecuteToolInput {
    pub command: String,
    pub args: Option<Value>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::DetailLevel;

    fn result() -> SearchResult {
        let summary = Summary {
            r#type: "function".into(),
            name: "install".into(),
            signature: "install()".into(),
            purpose: "installs things".into(),
            location: "src/lib.rs".into(),
            relevance_reason: "matches: install".into(),
        };
        SearchResult::new("store-1-hash", "store-1", "src/lib.rs", 0.9, summary)
            .with_context(ContextLayer { interfaces: vec![], key_imports: vec![], related_concepts: vec![], usage: Default::default() })
            .with_full(FullLayer { complete_code: "fn install() {}".into(), related_code: vec![], documentation: None, tests: None })
    }

    #[test]
    fn minimal_detail_omits_context_and_full() {
        let output = SearchResultOutput::at_detail(&result(), DetailLevel::Minimal);
        assert!(output.context.is_none());
        assert!(output.full.is_none());
    }

    #[test]
    fn full_detail_includes_everything_cached() {
        let output = SearchResultOutput::at_detail(&result(), DetailLevel::Full);
        assert!(output.context.is_some());
        assert!(output.full.is_some());
    }
}
