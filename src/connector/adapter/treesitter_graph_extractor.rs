//! `GraphExtractorService` over tree-sitter, scoped to `calls` edges only
//! (§3, §4.5) rather than the teacher's full symbol/reference/import graph.
//! Grounded directly on the teacher's own `TreeSitterParser`: the same
//! two-query approach (one query collecting named declarations as line-
//! range "scopes", one query collecting call-expression callees), the same
//! `lookup_enclosing_scope` tightest-containing-range lookup to attribute a
//! call to its enclosing function, reduced to the single relation the code
//! graph actually models.

use async_trait::async_trait;
use streaming_iterator::StreamingIterator;
use tree_sitter::{Parser, Query, QueryCursor};

use crate::application::GraphExtractorService;
use crate::domain::{DomainError, GraphEdge, Language, RelationKind};

pub struct TreeSitterGraphExtractor;

impl TreeSitterGraphExtractor {
    pub fn new() -> Self {
        Self
    }

    fn ts_language(language: Language) -> Option<tree_sitter::Language> {
        match language {
            Language::Rust => Some(tree_sitter_rust::LANGUAGE.into()),
            Language::Python => Some(tree_sitter_python::LANGUAGE.into()),
            Language::JavaScript => Some(tree_sitter_javascript::LANGUAGE.into()),
            Language::TypeScript => Some(tree_sitter_typescript::LANGUAGE_TYPESCRIPT.into()),
            Language::Go => Some(tree_sitter_go::LANGUAGE.into()),
            _ => None,
        }
    }

    /// Declaration query: one `@name` capture plus a wrapping capture
    /// identifying the declaration node, used to derive enclosing scopes.
    fn declaration_query(language: Language) -> &'static str {
        match language {
            Language::Rust => "(function_item name: (identifier) @name) @scope",
            Language::Python => "(function_definition name: (identifier) @name) @scope",
            Language::JavaScript => {
                "(function_declaration name: (identifier) @name) @scope \
                 (method_definition name: (property_identifier) @name) @scope"
            }
            Language::TypeScript => {
                "(function_declaration name: (identifier) @name) @scope \
                 (method_definition name: (property_identifier) @name) @scope"
            }
            Language::Go => {
                "(function_declaration name: (identifier) @name) @scope \
                 (method_declaration name: (field_identifier) @name) @scope"
            }
            _ => "",
        }
    }

    /// Call query: one `@callee` capture per call expression, including
    /// method calls (`obj.method()`).
    fn call_query(language: Language) -> &'static str {
        match language {
            Language::Rust => {
                "(call_expression function: (identifier) @callee) \
                 (call_expression function: (field_expression field: (field_identifier) @callee)) \
                 (call_expression function: (scoped_identifier name: (identifier) @callee))"
            }
            Language::Python => {
                "(call function: (identifier) @callee) \
                 (call function: (attribute attribute: (identifier) @callee))"
            }
            Language::JavaScript | Language::TypeScript => {
                "(call_expression function: (identifier) @callee) \
                 (call_expression function: (member_expression property: (property_identifier) @callee))"
            }
            Language::Go => {
                "(call_expression function: (identifier) @callee) \
                 (call_expression function: (selector_expression field: (field_identifier) @callee))"
            }
            _ => "",
        }
    }

    fn collect_scopes(content: &str, tree: &tree_sitter::Tree, ts_language: &tree_sitter::Language, language: Language) -> Vec<(usize, usize, String)> {
        let query_source = Self::declaration_query(language);
        if query_source.is_empty() {
            return Vec::new();
        }
        let query = match Query::new(ts_language, query_source) {
            Ok(q) => q,
            Err(_) => return Vec::new(),
        };
        let capture_names: Vec<&str> = query.capture_names().to_vec();
        let mut cursor = QueryCursor::new();
        let text_bytes = content.as_bytes();
        let mut matches_iter = cursor.matches(&query, tree.root_node(), text_bytes);

        let mut scopes = Vec::new();
        while let Some(query_match) = matches_iter.next() {
            let mut name = None;
            let mut scope_node = None;
            for capture in query_match.captures {
                let capture_name = capture_names.get(capture.index as usize).copied().unwrap_or("");
                if capture_name == "name" {
                    name = Some(content[capture.node.byte_range()].to_string());
                } else {
                    scope_node = Some(capture.node);
                }
            }
            if let (Some(node), Some(name)) = (scope_node, name) {
                scopes.push((node.start_position().row, node.end_position().row, name));
            }
        }
        scopes
    }

    fn enclosing_scope(scopes: &[(usize, usize, String)], line: usize) -> Option<&str> {
        scopes
            .iter()
            .filter(|(start, end, _)| *start <= line && line <= *end)
            .min_by_key(|(start, end, _)| end - start)
            .map(|(_, _, name)| name.as_str())
    }
}

impl Default for TreeSitterGraphExtractor {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl GraphExtractorService for TreeSitterGraphExtractor {
    async fn extract_edges(&self, content: &str, file_path: &str, language: Language) -> Result<Vec<GraphEdge>, DomainError> {
        let Some(ts_language) = Self::ts_language(language) else {
            return Ok(Vec::new());
        };

        let mut parser = Parser::new();
        parser
            .set_language(&ts_language)
            .map_err(|e| DomainError::fatal(format!("failed to set tree-sitter language: {e}")))?;
        let Some(tree) = parser.parse(content, None) else {
            return Ok(Vec::new());
        };

        let scopes = Self::collect_scopes(content, &tree, &ts_language, language);

        let call_query_source = Self::call_query(language);
        if call_query_source.is_empty() {
            return Ok(Vec::new());
        }
        let query = Query::new(&ts_language, call_query_source)
            .map_err(|e| DomainError::fatal(format!("failed to build call query: {e}")))?;
        let capture_names: Vec<&str> = query.capture_names().to_vec();
        let mut cursor = QueryCursor::new();
        let text_bytes = content.as_bytes();
        let mut matches_iter = cursor.matches(&query, tree.root_node(), text_bytes);

        let mut edges = Vec::new();
        while let Some(query_match) = matches_iter.next() {
            for capture in query_match.captures {
                let capture_name = capture_names.get(capture.index as usize).copied().unwrap_or("");
                if capture_name != "callee" {
                    continue;
                }
                let callee_name = &content[capture.node.byte_range()];
                let line = capture.node.start_position().row;
                let Some(caller_name) = Self::enclosing_scope(&scopes, line) else {
                    continue;
                };
                edges.push(GraphEdge {
                    caller: format!("{file_path}:{caller_name}"),
                    callee: format!("{file_path}:{callee_name}"),
                    relation: RelationKind::Calls,
                });
            }
        }
        Ok(edges)
    }

    fn supported_languages(&self) -> Vec<Language> {
        vec![Language::Rust, Language::Python, Language::JavaScript, Language::TypeScript, Language::Go]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn extracts_rust_function_calls() {
        let extractor = TreeSitterGraphExtractor::new();
        let content = "fn helper() -> i32 { 1 }\nfn main() { helper(); }\n";
        let edges = extractor.extract_edges(content, "lib.rs", Language::Rust).await.unwrap();
        assert!(edges.iter().any(|e| e.caller == "lib.rs:main" && e.callee == "lib.rs:helper"));
    }

    #[tokio::test]
    async fn extracts_python_calls_within_function() {
        let extractor = TreeSitterGraphExtractor::new();
        let content = "def helper():\n    pass\n\ndef main():\n    helper()\n";
        let edges = extractor.extract_edges(content, "app.py", Language::Python).await.unwrap();
        assert!(edges.iter().any(|e| e.caller == "app.py:main" && e.callee == "app.py:helper"));
    }

    #[tokio::test]
    async fn unsupported_language_returns_empty() {
        let extractor = TreeSitterGraphExtractor::new();
        let edges = extractor.extract_edges("resource \"x\" {}", "main.tf", Language::HCL).await.unwrap();
        assert!(edges.is_empty());
    }

    #[tokio::test]
    async fn supports_language_matches_supported_list() {
        let extractor = TreeSitterGraphExtractor::new();
        assert!(extractor.supports_language(Language::Rust));
        assert!(!extractor.supports_language(Language::Php));
    }

    #[tokio::test]
    async fn call_outside_any_function_is_skipped() {
        let extractor = TreeSitterGraphExtractor::new();
        let content = "helper();\n";
        let edges = extractor.extract_edges(content, "top.js", Language::JavaScript).await.unwrap();
        assert!(edges.is_empty());
    }
}
