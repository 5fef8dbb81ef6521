use serde::{Deserialize, Serialize};

/// Ranking mode requested of the ranker (§4.4).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SearchMode {
    Vector,
    Fts,
    Hybrid,
}

impl Default for SearchMode {
    fn default() -> Self {
        SearchMode::Hybrid
    }
}

/// Query purpose classification (§4.4.1), used to adjust file-type weights.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    HowTo,
    Implementation,
    Conceptual,
    Comparison,
    Debugging,
}

impl Default for Intent {
    fn default() -> Self {
        Intent::HowTo
    }
}

impl Intent {
    pub fn as_str(&self) -> &'static str {
        match self {
            Intent::HowTo => "how-to",
            Intent::Implementation => "implementation",
            Intent::Conceptual => "conceptual",
            Intent::Comparison => "comparison",
            Intent::Debugging => "debugging",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Progressive context detail level requested by the caller (§4.5).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DetailLevel {
    Minimal,
    Contextual,
    Full,
}

impl Default for DetailLevel {
    fn default() -> Self {
        DetailLevel::Minimal
    }
}

impl DetailLevel {
    pub fn wants_context(&self) -> bool {
        *self >= DetailLevel::Contextual
    }

    pub fn wants_full(&self) -> bool {
        *self == DetailLevel::Full
    }
}

/// A query issued to the ranker.
#[derive(Debug, Clone)]
pub struct SearchQuery {
    text: String,
    stores: Option<Vec<String>>,
    intent: Option<Intent>,
    detail: DetailLevel,
    limit: usize,
    mode: SearchMode,
}

impl SearchQuery {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            stores: None,
            intent: None,
            detail: DetailLevel::Minimal,
            limit: 10,
            mode: SearchMode::Hybrid,
        }
    }

    pub fn with_stores(mut self, stores: Vec<String>) -> Self {
        self.stores = Some(stores);
        self
    }

    pub fn with_intent(mut self, intent: Intent) -> Self {
        self.intent = Some(intent);
        self
    }

    pub fn with_detail(mut self, detail: DetailLevel) -> Self {
        self.detail = detail;
        self
    }

    pub fn with_limit(mut self, limit: usize) -> Self {
        self.limit = limit.max(1);
        self
    }

    pub fn with_mode(mut self, mode: SearchMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    pub fn stores(&self) -> Option<&[String]> {
        self.stores.as_deref()
    }

    pub fn intent(&self) -> Option<Intent> {
        self.intent
    }

    pub fn detail(&self) -> DetailLevel {
        self.detail
    }

    pub fn limit(&self) -> usize {
        self.limit
    }

    pub fn mode(&self) -> SearchMode {
        self.mode
    }
}

/// Always-present cheap summary (§4.5 "minimal").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Summary {
    pub r#type: String,
    pub name: String,
    pub signature: String,
    pub purpose: String,
    pub location: String,
    pub relevance_reason: String,
}

/// `{calledBy, calls}` counts from the code graph, zeroed when absent.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize)]
pub struct UsageCounts {
    pub called_by: usize,
    pub calls: usize,
}

/// Added at `contextual` detail (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ContextLayer {
    pub interfaces: Vec<String>,
    pub key_imports: Vec<String>,
    pub related_concepts: Vec<String>,
    pub usage: UsageCounts,
}

/// One edge of the code graph projected into a result's `full` layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RelatedCodeRecord {
    pub file: String,
    pub summary: String,
    pub relationship: String,
}

/// Added at `full` detail (§4.5).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FullLayer {
    pub complete_code: String,
    pub related_code: Vec<RelatedCodeRecord>,
    pub documentation: Option<String>,
    pub tests: Option<String>,
}

/// One hit in a search result page. `summary` is always present; `context`
/// and `full` are populated according to the requested `DetailLevel`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    id: String,
    store_id: String,
    source: String,
    score: f32,
    summary: Summary,
    context: Option<ContextLayer>,
    full: Option<FullLayer>,
}

impl SearchResult {
    pub fn new(id: impl Into<String>, store_id: impl Into<String>, source: impl Into<String>, score: f32, summary: Summary) -> Self {
        Self {
            id: id.into(),
            store_id: store_id.into(),
            source: source.into(),
            score,
            summary,
            context: None,
            full: None,
        }
    }

    pub fn with_context(mut self, context: ContextLayer) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_full(mut self, full: FullLayer) -> Self {
        self.full = Some(full);
        self
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn score(&self) -> f32 {
        self.score
    }

    pub fn set_score(&mut self, score: f32) {
        self.score = score;
    }

    pub fn summary(&self) -> &Summary {
        &self.summary
    }

    pub fn context(&self) -> Option<&ContextLayer> {
        self.context.as_ref()
    }

    pub fn full(&self) -> Option<&FullLayer> {
        self.full.as_ref()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_level_ordering() {
        assert!(DetailLevel::Full.wants_context());
        assert!(DetailLevel::Full.wants_full());
        assert!(DetailLevel::Contextual.wants_context());
        assert!(!DetailLevel::Contextual.wants_full());
        assert!(!DetailLevel::Minimal.wants_context());
    }

    #[test]
    fn query_builder_clamps_limit() {
        let query = SearchQuery::new("find x").with_limit(0);
        assert_eq!(query.limit(), 1);
    }
}
