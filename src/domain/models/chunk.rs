use serde::{Deserialize, Serialize};

use super::FileTypeTag;

/// The unit of retrieval (§3 "Document / Chunk"). Each chunk belongs to
/// exactly one store; `content_hash` is over the whole source file, not the
/// chunk, and is identical for every chunk produced from that file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Chunk {
    id: String,
    store_id: String,
    /// Source path (file/repo stores) or url (web stores).
    source: String,
    file_type: FileTypeTag,
    content: String,
    embedding: Vec<f32>,
    content_hash: String,
    chunk_index: usize,
    total_chunks: usize,
    indexed_at: i64,
    /// Nearest preceding Markdown header, when chunked from a `.md` file.
    section_header: Option<String>,
    /// Declaration name, when chunked from a recognized top-level code
    /// declaration.
    declaration_name: Option<String>,
    /// Crawl depth, for chunks sourced from a web store.
    depth: Option<u32>,
}

impl Chunk {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        store_id: impl Into<String>,
        source: impl Into<String>,
        file_type: FileTypeTag,
        content: impl Into<String>,
        embedding: Vec<f32>,
        content_hash: impl Into<String>,
        chunk_index: usize,
        total_chunks: usize,
    ) -> Self {
        let store_id = store_id.into();
        let content_hash = content_hash.into();
        let id = build_id(&store_id, &content_hash, chunk_index, total_chunks);
        Self {
            id,
            store_id,
            source: source.into(),
            file_type,
            content: content.into(),
            embedding,
            content_hash,
            chunk_index,
            total_chunks,
            indexed_at: super::store::current_timestamp(),
            section_header: None,
            declaration_name: None,
            depth: None,
        }
    }

    /// Reconstitutes from persisted data (used by vector-store adapters).
    #[allow(clippy::too_many_arguments)]
    pub fn reconstitute(
        id: String,
        store_id: String,
        source: String,
        file_type: FileTypeTag,
        content: String,
        embedding: Vec<f32>,
        content_hash: String,
        chunk_index: usize,
        total_chunks: usize,
        indexed_at: i64,
        section_header: Option<String>,
        declaration_name: Option<String>,
        depth: Option<u32>,
    ) -> Self {
        Self {
            id,
            store_id,
            source,
            file_type,
            content,
            embedding,
            content_hash,
            chunk_index,
            total_chunks,
            indexed_at,
            section_header,
            declaration_name,
            depth,
        }
    }

    pub fn with_section_header(mut self, header: impl Into<String>) -> Self {
        self.section_header = Some(header.into());
        self
    }

    pub fn with_declaration_name(mut self, name: impl Into<String>) -> Self {
        self.declaration_name = Some(name.into());
        self
    }

    pub fn with_depth(mut self, depth: u32) -> Self {
        self.depth = Some(depth);
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

    pub fn file_type(&self) -> FileTypeTag {
        self.file_type
    }

    pub fn content(&self) -> &str {
        &self.content
    }

    pub fn embedding(&self) -> &[f32] {
        &self.embedding
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }

    pub fn chunk_index(&self) -> usize {
        self.chunk_index
    }

    pub fn total_chunks(&self) -> usize {
        self.total_chunks
    }

    pub fn indexed_at(&self) -> i64 {
        self.indexed_at
    }

    pub fn section_header(&self) -> Option<&str> {
        self.section_header.as_deref()
    }

    pub fn declaration_name(&self) -> Option<&str> {
        self.declaration_name.as_deref()
    }

    pub fn depth(&self) -> Option<u32> {
        self.depth
    }

    pub fn is_single_chunk_file(&self) -> bool {
        self.total_chunks <= 1
    }
}

/// Builds the document id grammar `{storeId}-{hex-content-hash}[-{chunkIndex}]`
/// (§6). A single-chunk file omits the trailing index.
pub fn build_id(store_id: &str, content_hash: &str, chunk_index: usize, total_chunks: usize) -> String {
    if total_chunks <= 1 {
        format!("{store_id}-{content_hash}")
    } else {
        format!("{store_id}-{content_hash}-{chunk_index}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_chunk_id_has_no_index_suffix() {
        let id = build_id("store-1", "deadbeef", 0, 1);
        assert_eq!(id, "store-1-deadbeef");
    }

    #[test]
    fn multi_chunk_id_carries_index() {
        let id = build_id("store-1", "deadbeef", 2, 5);
        assert_eq!(id, "store-1-deadbeef-2");
    }

    #[test]
    fn same_file_yields_same_hash_across_chunks() {
        let a = Chunk::new(
            "s",
            "file.rs",
            FileTypeTag::Source,
            "part one",
            vec![0.1, 0.2],
            "hash123",
            0,
            2,
        );
        let b = Chunk::new(
            "s",
            "file.rs",
            FileTypeTag::Source,
            "part two",
            vec![0.3, 0.4],
            "hash123",
            1,
            2,
        );
        assert_eq!(a.content_hash(), b.content_hash());
        assert_ne!(a.id(), b.id());
    }
}
