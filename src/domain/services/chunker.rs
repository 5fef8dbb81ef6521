//! Splits a text blob into an ordered sequence of retrieval chunks (§4.2).
//! Three strategies, chosen by file extension: Markdown (ATX headers),
//! code (top-level declarations via the brace-aware scanner in
//! `code_unit`), and sliding window (the default, and the fallback for the
//! other two when no headers/declarations are found).

use once_cell::sync::Lazy;
use regex::Regex;

use super::code_unit::brace_scan_from;

/// `chunkSize`/`chunkOverlap` pair. The two named presets from §4.2.
#[derive(Debug, Clone, Copy)]
pub struct ChunkPreset {
    pub chunk_size: usize,
    pub chunk_overlap: usize,
}

impl ChunkPreset {
    pub const CODE: ChunkPreset = ChunkPreset {
        chunk_size: 768,
        chunk_overlap: 100,
    };
    pub const WEB: ChunkPreset = ChunkPreset {
        chunk_size: 1200,
        chunk_overlap: 200,
    };
    pub const DOCS: ChunkPreset = ChunkPreset {
        chunk_size: 1200,
        chunk_overlap: 200,
    };
}

/// One produced chunk, before it is wrapped into a `domain::Chunk` with
/// store/embedding/hash metadata by the indexer.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChunkSpan {
    pub content: String,
    pub start_offset: usize,
    pub end_offset: usize,
    pub section_header: Option<String>,
    pub declaration_name: Option<String>,
}

const CODE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// Dispatches to the strategy appropriate for `extension` (without the
/// leading dot).
pub fn chunk(text: &str, extension: &str, preset: ChunkPreset) -> Vec<ChunkSpan> {
    if extension.eq_ignore_ascii_case("md") {
        chunk_markdown(text, preset)
    } else if CODE_EXTENSIONS.contains(&extension.to_lowercase().as_str()) {
        chunk_code(text, preset)
    } else {
        sliding_window(text, 0, preset, None, None)
    }
}

fn char_len(s: &str) -> usize {
    s.chars().count()
}

/// Produces chunks of up to `chunkSize` characters with `chunkOverlap`
/// overlap between consecutive chunks; `step = chunkSize - chunkOverlap`.
/// Offsets are relative to the original document via `base_offset`.
pub fn sliding_window(
    text: &str,
    base_offset: usize,
    preset: ChunkPreset,
    section_header: Option<&str>,
    declaration_name: Option<&str>,
) -> Vec<ChunkSpan> {
    let chars: Vec<(usize, char)> = text.char_indices().collect();
    let total_chars = chars.len();

    if total_chars == 0 {
        return vec![ChunkSpan {
            content: String::new(),
            start_offset: base_offset,
            end_offset: base_offset,
            section_header: section_header.map(String::from),
            declaration_name: declaration_name.map(String::from),
        }];
    }

    let chunk_size = preset.chunk_size.max(1);
    let overlap = preset.chunk_overlap.min(chunk_size.saturating_sub(1));
    let step = (chunk_size - overlap).max(1);

    let mut spans = Vec::new();
    let mut start_char = 0usize;
    while start_char < total_chars {
        let end_char = (start_char + chunk_size).min(total_chars);
        let start_byte = chars[start_char].0;
        let end_byte = if end_char < total_chars {
            chars[end_char].0
        } else {
            text.len()
        };
        spans.push(ChunkSpan {
            content: text[start_byte..end_byte].to_string(),
            start_offset: base_offset + start_byte,
            end_offset: base_offset + end_byte,
            section_header: None,
            declaration_name: None,
        });
        if end_char >= total_chars {
            break;
        }
        start_char += step;
    }

    // Only the first sub-chunk carries the inherited header/declaration name;
    // callers that want it on every sub-chunk (the code strategy) set it
    // themselves after this call returns.
    if let Some(first) = spans.first_mut() {
        first.section_header = section_header.map(String::from);
        first.declaration_name = declaration_name.map(String::from);
    }
    spans
}

static ATX_HEADER: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?m)^(#{1,4})[ \t]+(.+?)[ \t]*$").unwrap());

fn chunk_markdown(text: &str, preset: ChunkPreset) -> Vec<ChunkSpan> {
    let headers: Vec<(usize, String)> = ATX_HEADER
        .captures_iter(text)
        .map(|c| {
            let m = c.get(0).unwrap();
            (m.start(), c.get(2).unwrap().as_str().trim().to_string())
        })
        .collect();

    if headers.is_empty() {
        return sliding_window(text, 0, preset, None, None);
    }

    let mut spans = Vec::new();
    for (idx, (offset, title)) in headers.iter().enumerate() {
        let section_end = headers.get(idx + 1).map(|h| h.0).unwrap_or(text.len());
        let section_text = &text[*offset..section_end];
        if char_len(section_text) <= preset.chunk_size {
            spans.push(ChunkSpan {
                content: section_text.to_string(),
                start_offset: *offset,
                end_offset: section_end,
                section_header: Some(title.clone()),
                declaration_name: None,
            });
        } else {
            spans.extend(sliding_window(section_text, *offset, preset, Some(title), None));
        }
    }
    spans
}

static DECLARATION: Lazy<Regex> = Lazy::new(|| {
    Regex::new(
        r"(?m)^(?:export[ \t]+)?(?:default[ \t]+)?(?:async[ \t]+)?(?:function\*?[ \t]+(?P<func>[A-Za-z_$][\w$]*)|class[ \t]+(?P<cls>[A-Za-z_$][\w$]*)|interface[ \t]+(?P<iface>[A-Za-z_$][\w$]*)|type[ \t]+(?P<ty>[A-Za-z_$][\w$]*)[ \t]*=|enum[ \t]+(?P<enm>[A-Za-z_$][\w$]*)|(?:const|let|var)[ \t]+(?P<bind>[A-Za-z_$][\w$]*)[ \t]*=)",
    )
    .unwrap()
});

fn declaration_name(caps: &regex::Captures) -> Option<String> {
    for group in ["func", "cls", "iface", "ty", "enm", "bind"] {
        if let Some(m) = caps.name(group) {
            return Some(m.as_str().to_string());
        }
    }
    None
}

/// Extends `decl_start` backward over a contiguous leading doc comment
/// (`/** ... */` block or a run of `//` lines) so it is included in the
/// declaration's span, matching the enricher's preference for JSDoc-style
/// comments (§4.5).
fn include_leading_comment(text: &str, decl_start: usize) -> usize {
    let prefix = &text[..decl_start];
    let trimmed = prefix.trim_end();
    if trimmed.is_empty() {
        return decl_start;
    }
    if trimmed.ends_with("*/") {
        if let Some(open) = trimmed.rfind("/*") {
            let line_start = trimmed[..open].rfind('\n').map(|i| i + 1).unwrap_or(0);
            return line_start;
        }
    }
    let mut idx = trimmed.len();
    let mut last_comment_line_start = None;
    loop {
        let line_start = trimmed[..idx].rfind('\n').map(|i| i + 1).unwrap_or(0);
        let line = trimmed[line_start..idx].trim();
        if line.starts_with("//") {
            last_comment_line_start = Some(line_start);
            if line_start == 0 {
                break;
            }
            idx = line_start - 1;
        } else {
            break;
        }
    }
    last_comment_line_start.unwrap_or(decl_start)
}

fn chunk_code(text: &str, preset: ChunkPreset) -> Vec<ChunkSpan> {
    let declarations: Vec<(usize, String)> = DECLARATION
        .captures_iter(text)
        .filter_map(|caps| {
            let name = declaration_name(&caps)?;
            let keyword_start = caps.get(0).unwrap().start();
            Some((include_leading_comment(text, keyword_start), name))
        })
        .collect();

    if declarations.is_empty() {
        return sliding_window(text, 0, preset, None, None);
    }

    let mut spans = Vec::new();
    for (idx, (start, name)) in declarations.iter().enumerate() {
        let bound = declarations.get(idx + 1).map(|(s, _)| *s).unwrap_or(text.len());
        let end = match brace_scan_from(&text[..bound], *start) {
            Some(close) => close,
            None => text[*start..bound].trim_end().len() + *start,
        };
        let content = &text[*start..end];
        if char_len(content) <= preset.chunk_size {
            spans.push(ChunkSpan {
                content: content.to_string(),
                start_offset: *start,
                end_offset: end,
                section_header: None,
                declaration_name: Some(name.clone()),
            });
        } else {
            let mut sub = sliding_window(content, *start, preset, None, Some(name));
            for s in sub.iter_mut() {
                s.declaration_name = Some(name.clone());
            }
            spans.extend(sub);
        }
    }
    spans
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sliding_window_covers_short_text() {
        let text = "hello world";
        let spans = sliding_window(text, 0, ChunkPreset::CODE, None, None);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].start_offset, 0);
        assert_eq!(spans[0].end_offset, text.len());
    }

    #[test]
    fn sliding_window_steps_by_size_minus_overlap() {
        let preset = ChunkPreset { chunk_size: 10, chunk_overlap: 2 };
        let text = "a".repeat(25);
        let spans = sliding_window(&text, 0, preset, None, None);
        // step = 8; starts at 0, 8, 16, 24 -> 4 windows
        assert_eq!(spans.len(), 4);
        for w in spans.windows(2) {
            assert!(w[1].start_offset > w[0].start_offset);
            assert!(w[0].end_offset <= text.len());
        }
        assert_eq!(spans.last().unwrap().end_offset, text.len());
    }

    #[test]
    fn markdown_splits_on_headers() {
        let text = "# Intro\nintro text\n\n# Usage\nusage text\n\n# API\napi text\n";
        let spans = chunk_markdown(text, ChunkPreset::DOCS);
        assert_eq!(spans.len(), 3);
        assert_eq!(spans[0].section_header.as_deref(), Some("Intro"));
        assert_eq!(spans[1].section_header.as_deref(), Some("Usage"));
        assert_eq!(spans[2].section_header.as_deref(), Some("API"));
    }

    #[test]
    fn markdown_without_headers_falls_back_to_sliding_window() {
        let text = "just some prose with no headers at all";
        let spans = chunk_markdown(text, ChunkPreset::DOCS);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].section_header.is_none());
    }

    #[test]
    fn oversized_markdown_section_only_tags_first_subchunk() {
        let preset = ChunkPreset { chunk_size: 20, chunk_overlap: 2 };
        let body: String = std::iter::repeat('x').take(100).collect();
        let text = format!("# Big\n{body}\n");
        let spans = chunk_markdown(&text, preset);
        assert!(spans.len() > 1);
        assert_eq!(spans[0].section_header.as_deref(), Some("Big"));
        assert!(spans[1].section_header.is_none());
    }

    #[test]
    fn code_strategy_yields_one_chunk_per_declaration() {
        let text = "function foo() {\n  return 1;\n}\n\nfunction bar() {\n  return 2;\n}\n";
        let spans = chunk_code(text, ChunkPreset::CODE);
        assert_eq!(spans.len(), 2);
        assert_eq!(spans[0].declaration_name.as_deref(), Some("foo"));
        assert_eq!(spans[1].declaration_name.as_deref(), Some("bar"));
    }

    #[test]
    fn code_strategy_handles_export_and_const_arrow() {
        let text = "export const handler = () => {\n  doWork();\n};\n";
        let spans = chunk_code(text, ChunkPreset::CODE);
        assert_eq!(spans.len(), 1);
        assert_eq!(spans[0].declaration_name.as_deref(), Some("handler"));
    }

    #[test]
    fn code_strategy_propagates_name_to_every_subchunk() {
        let preset = ChunkPreset { chunk_size: 20, chunk_overlap: 2 };
        let body: String = std::iter::repeat('a').take(100).collect();
        let text = format!("function big() {{\n{body}\n}}\n");
        let spans = chunk_code(&text, preset);
        assert!(spans.len() > 1);
        assert!(spans.iter().all(|s| s.declaration_name.as_deref() == Some("big")));
    }

    #[test]
    fn code_with_no_declarations_falls_back_to_sliding_window() {
        let text = "console.log('just a statement');\n";
        let spans = chunk_code(text, ChunkPreset::CODE);
        assert_eq!(spans.len(), 1);
        assert!(spans[0].declaration_name.is_none());
    }

    #[test]
    fn other_extensions_use_sliding_window_directly() {
        let text = "def foo():\n    return 1\n";
        let spans = chunk(text, "py", ChunkPreset::CODE);
        assert_eq!(spans.len(), 1);
    }
}
