//! Progressive-context result enrichment (§4.5): pure derivation of the
//! `summary`/`context`/`full` layers from a chunk, the query that matched
//! it, and (for `context`/`full`) an optional code graph. No donor
//! equivalent — the donor crate has no progressive-detail feature — built
//! fresh in the style of the other pure services in this module (free
//! functions over `domain` types, no framework dependency).

use once_cell::sync::Lazy;
use regex::Regex;

use super::code_unit::extract_unit;
use crate::domain::{Chunk, CodeGraph, ContextLayer, FullLayer, Intent, RelatedCodeRecord, Summary, UsageCounts};

const STOP_WORDS: &[&str] = &[
    "the", "and", "for", "with", "that", "this", "from", "have", "are", "was", "were", "been",
    "will", "would", "could", "should", "into", "their", "what", "when", "where", "which",
    "while", "about", "there", "these", "those", "your", "such", "than", "then", "them", "they",
];

const CODE_KEYWORDS: &[&str] = &[
    "function", "const", "return", "import", "export", "class", "interface", "type", "enum",
    "public", "private", "static", "async", "await", "default", "struct", "impl", "fn", "pub",
    "let", "var", "mod", "use",
];

static INTERFACE_DECL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\binterface\s+(\w+)").unwrap());
static IMPORT_LINE: Lazy<Regex> = Lazy::new(|| Regex::new(r#"(?m)^\s*(import\s.+|.*\brequire\(['"][^'"]+['"]\).*|use\s+[\w:]+.*;)\s*$"#).unwrap());
static FN_SIGNATURE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"(?x) (?P<name>[A-Za-z_]\w*) \s* \( (?P<params>[^)]*) \) \s* (?: :\s*(?P<ret_ts>[\w<>\[\],\s|&]+) | ->\s*(?P<ret_rs>[\w<>:,\s&']+) )? ").unwrap()
});
static IDENTIFIER: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z_][A-Za-z0-9_]*").unwrap());
static WORD: Lazy<Regex> = Lazy::new(|| Regex::new(r"[A-Za-z][A-Za-z']{2,}").unwrap());

/// `type, name, signature, purpose, location, relevanceReason` (§4.5 minimal).
pub fn build_summary(chunk: &Chunk, query: &str, intent: Intent) -> Summary {
    let name = resolve_name(chunk);
    let r#type = infer_type(chunk, &name);
    let signature = extract_signature(chunk.content());
    let purpose = extract_purpose(chunk.content(), query);
    let location = chunk.source().to_string();
    let relevance_reason = relevance_reason(chunk.content(), query, intent);

    Summary {
        r#type,
        name,
        signature,
        purpose,
        location,
        relevance_reason,
    }
}

/// `interfaces, keyImports, relatedConcepts, usage` (§4.5 contextual).
pub fn build_context(chunk: &Chunk, graph: Option<&CodeGraph>) -> ContextLayer {
    let interfaces = INTERFACE_DECL
        .captures_iter(chunk.content())
        .map(|c| c[1].to_string())
        .collect();
    let key_imports = IMPORT_LINE
        .find_iter(chunk.content())
        .map(|m| m.as_str().trim().to_string())
        .take(5)
        .collect();
    let related_concepts = top_related_concepts(chunk.content());
    let usage = graph
        .map(|g| g.usage_counts(&node_id(chunk)))
        .unwrap_or(UsageCounts { called_by: 0, calls: 0 });

    ContextLayer {
        interfaces,
        key_imports,
        related_concepts,
        usage,
    }
}

/// `completeCode, relatedCode, documentation, tests` (§4.5 full).
pub fn build_full(chunk: &Chunk, graph: Option<&CodeGraph>) -> FullLayer {
    let complete_code = extract_unit(chunk.content(), 0).map(str::to_string).unwrap_or_else(|| chunk.content().to_string());
    let related_code = graph
        .map(|g| {
            g.related(&node_id(chunk), 10)
                .into_iter()
                .map(|(node, relationship)| {
                    let (file, name) = node.rsplit_once(':').unwrap_or((node.as_str(), ""));
                    RelatedCodeRecord {
                        file: file.to_string(),
                        summary: name.to_string(),
                        relationship: relationship.to_string(),
                    }
                })
                .collect()
        })
        .unwrap_or_default();
    let documentation = extract_leading_doc_comment(chunk.content());

    FullLayer {
        complete_code,
        related_code,
        documentation,
        tests: None,
    }
}

fn node_id(chunk: &Chunk) -> String {
    format!("{}:{}", chunk.source(), resolve_name(chunk))
}

fn resolve_name(chunk: &Chunk) -> String {
    if let Some(name) = chunk.declaration_name() {
        return name.to_string();
    }
    longest_identifier_near_top(chunk.content()).unwrap_or_else(|| "(anonymous)".to_string())
}

fn longest_identifier_near_top(content: &str) -> Option<String> {
    content
        .lines()
        .take(3)
        .flat_map(|line| IDENTIFIER.find_iter(line).map(|m| m.as_str().to_string()))
        .filter(|ident| ident.len() >= 3 && !CODE_KEYWORDS.contains(&ident.to_lowercase().as_str()))
        .max_by_key(|ident| ident.len())
}

fn infer_type(chunk: &Chunk, name: &str) -> String {
    if chunk.declaration_name().is_some() {
        let first_lines: String = chunk.content().lines().take(3).collect::<Vec<_>>().join(" ");
        let lower = first_lines.to_lowercase();
        if lower.contains("interface ") {
            "interface".to_string()
        } else if lower.contains("class ") {
            "class".to_string()
        } else if lower.contains("enum ") {
            "enum".to_string()
        } else if lower.contains(&format!("type {name}")) || lower.contains("type ") {
            "type".to_string()
        } else {
            "function".to_string()
        }
    } else if chunk.file_type().is_documentation() {
        "documentation".to_string()
    } else {
        "function".to_string()
    }
}

/// First line of the declaration, stripped of common visibility/async
/// prefixes, reduced to `name(params): returnType` when that pattern
/// applies (§4.5).
fn extract_signature(content: &str) -> String {
    let first_line = content.lines().next().unwrap_or("").trim();
    let mut stripped = first_line;
    for prefix in ["export default ", "export ", "pub async ", "pub ", "async ", "default "] {
        if let Some(rest) = stripped.strip_prefix(prefix) {
            stripped = rest;
        }
    }
    if let Some(caps) = FN_SIGNATURE.captures(stripped) {
        let name = &caps["name"];
        let params = caps.name("params").map(|m| m.as_str()).unwrap_or("");
        let ret = caps
            .name("ret_ts")
            .or_else(|| caps.name("ret_rs"))
            .map(|m| m.as_str().trim())
            .unwrap_or("");
        if ret.is_empty() {
            return format!("{name}({params})");
        }
        return format!("{name}({params}): {ret}");
    }
    stripped.trim_end_matches('{').trim().to_string()
}

/// Scores each line favoring query-term presence, sentence-ending
/// punctuation, and call-like code; a leading JSDoc comment is preferred
/// outright when present. Truncated to ~150 chars at a sentence boundary.
fn extract_purpose(content: &str, query: &str) -> String {
    if let Some(doc) = extract_leading_doc_comment(content) {
        if let Some(first_sentence) = doc.split(['.', '\n']).find(|s| !s.trim().is_empty()) {
            return truncate_at_sentence(first_sentence.trim());
        }
    }

    let query_terms = lowercase_terms(query);
    let mut best_line = "";
    let mut best_score = i32::MIN;
    for line in content.lines() {
        let trimmed = line.trim();
        if trimmed.is_empty() {
            continue;
        }
        let mut score = 0;
        let lower = trimmed.to_lowercase();
        score += query_terms.iter().filter(|t| lower.contains(t.as_str())).count() as i32 * 3;
        if trimmed.ends_with('.') || trimmed.ends_with('!') || trimmed.ends_with('?') {
            score += 2;
        }
        if trimmed.contains("=>") || IDENTIFIER.is_match(trimmed) && trimmed.contains('(') {
            score += 1;
        }
        if score > best_score {
            best_score = score;
            best_line = trimmed;
        }
    }
    if best_line.is_empty() {
        return String::new();
    }
    truncate_at_sentence(best_line)
}

fn truncate_at_sentence(text: &str) -> String {
    const MAX: usize = 150;
    if text.chars().count() <= MAX {
        return text.to_string();
    }
    let truncated: String = text.chars().take(MAX).collect();
    match truncated.rfind(['.', '!', '?']) {
        Some(idx) if idx > 0 => truncated[..=idx].to_string(),
        _ => match truncated.rfind(' ') {
            Some(idx) => format!("{}…", &truncated[..idx]),
            None => format!("{truncated}…"),
        },
    }
}

fn relevance_reason(content: &str, query: &str, intent: Intent) -> String {
    let query_terms = lowercase_terms(query);
    let lower = content.to_lowercase();
    let matched: Vec<&str> = query_terms.iter().filter(|t| lower.contains(t.as_str())).map(|s| s.as_str()).collect();
    if matched.is_empty() {
        format!("semantically similar ({intent} intent)")
    } else {
        format!("matches: {}", matched.join(", "))
    }
}

fn lowercase_terms(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|t| t.len() >= 3)
        .map(|t| t.to_lowercase())
        .collect()
}

fn top_related_concepts(content: &str) -> Vec<String> {
    use std::collections::HashMap;
    let mut counts: HashMap<String, usize> = HashMap::new();
    for m in WORD.find_iter(content) {
        let word = m.as_str().to_lowercase();
        if word.len() < 4 || STOP_WORDS.contains(&word.as_str()) || CODE_KEYWORDS.contains(&word.as_str()) {
            continue;
        }
        *counts.entry(word).or_insert(0) += 1;
    }
    let mut ranked: Vec<(String, usize)> = counts.into_iter().collect();
    ranked.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
    ranked.into_iter().take(5).map(|(word, _)| word).collect()
}

/// Leading `/** ... */` or contiguous `//` comment block, markers stripped.
fn extract_leading_doc_comment(content: &str) -> Option<String> {
    let trimmed = content.trim_start();
    if let Some(rest) = trimmed.strip_prefix("/**") {
        let end = rest.find("*/")?;
        let body = &rest[..end];
        let cleaned: Vec<&str> = body
            .lines()
            .map(|line| line.trim().trim_start_matches('*').trim())
            .filter(|line| !line.is_empty())
            .collect();
        if cleaned.is_empty() {
            return None;
        }
        return Some(cleaned.join(" "));
    }
    let comment_lines: Vec<&str> = trimmed
        .lines()
        .take_while(|line| line.trim_start().starts_with("//"))
        .map(|line| line.trim_start().trim_start_matches('/').trim())
        .collect();
    if comment_lines.is_empty() {
        None
    } else {
        Some(comment_lines.join(" "))
    }
}
