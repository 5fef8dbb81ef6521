use serde::{Deserialize, Serialize};

use super::UsageCounts;

/// The relation an edge of the code graph represents. The spec frames this
/// as "primarily `calls`"; kept as an enum rather than a bare string so a
/// future relation (e.g. `imports`) is a variant, not a typo-prone literal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RelationKind {
    Calls,
}

impl RelationKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            RelationKind::Calls => "calls",
        }
    }
}

/// One directed edge of the code graph: `caller` calls `callee`. Nodes are
/// identified by `file:symbolName` (§3).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GraphEdge {
    pub caller: String,
    pub callee: String,
    pub relation: RelationKind,
}

/// A directed multigraph over symbols, used only for enrichment. An absent
/// graph degrades gracefully to empty usage stats (§3, §4.5).
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeGraph {
    edges: Vec<GraphEdge>,
}

impl CodeGraph {
    pub fn new(edges: Vec<GraphEdge>) -> Self {
        Self { edges }
    }

    pub fn edges(&self) -> &[GraphEdge] {
        &self.edges
    }

    pub fn add_edge(&mut self, caller: String, callee: String, relation: RelationKind) {
        self.edges.push(GraphEdge {
            caller,
            callee,
            relation,
        });
    }

    /// Nodes that `node` calls.
    pub fn calls_from<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |e| e.caller == node)
    }

    /// Nodes that call `node`.
    pub fn called_by<'a>(&'a self, node: &'a str) -> impl Iterator<Item = &'a GraphEdge> {
        self.edges.iter().filter(move |e| e.callee == node)
    }

    pub fn usage_counts(&self, node: &str) -> UsageCounts {
        UsageCounts {
            called_by: self.called_by(node).count(),
            calls: self.calls_from(node).count(),
        }
    }

    /// Up to `limit` related-code records, `calls` edges first then
    /// `called_by` edges, matching the enricher's `full.relatedCode` field
    /// (§4.5: "labeled `calls this` or `called by this`").
    pub fn related(&self, node: &str, limit: usize) -> Vec<(String, &'static str)> {
        let mut out: Vec<(String, &'static str)> = self
            .calls_from(node)
            .map(|e| (e.callee.clone(), "calls this"))
            .chain(self.called_by(node).map(|e| (e.caller.clone(), "called by this")))
            .collect();
        out.truncate(limit);
        out
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn usage_counts_zero_when_absent() {
        let graph = CodeGraph::default();
        let counts = graph.usage_counts("file.rs:foo");
        assert_eq!(counts.called_by, 0);
        assert_eq!(counts.calls, 0);
    }

    #[test]
    fn usage_counts_and_related() {
        let mut graph = CodeGraph::default();
        graph.add_edge("a.rs:foo".into(), "b.rs:bar".into(), RelationKind::Calls);
        graph.add_edge("c.rs:baz".into(), "a.rs:foo".into(), RelationKind::Calls);

        let counts = graph.usage_counts("a.rs:foo");
        assert_eq!(counts.calls, 1);
        assert_eq!(counts.called_by, 1);

        let related = graph.related("a.rs:foo", 10);
        assert_eq!(related.len(), 2);
        assert!(related.iter().any(|(n, rel)| n == "b.rs:bar" && *rel == "calls this"));
        assert!(related.iter().any(|(n, rel)| n == "c.rs:baz" && *rel == "called by this"));
    }

    #[test]
    fn related_respects_limit() {
        let mut graph = CodeGraph::default();
        for i in 0..5 {
            graph.add_edge("a:foo".into(), format!("b:{i}"), RelationKind::Calls);
        }
        assert_eq!(graph.related("a:foo", 3).len(), 3);
    }
}
