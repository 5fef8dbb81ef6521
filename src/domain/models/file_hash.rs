use serde::{Deserialize, Serialize};

/// A file's content hash as of its last successful index, used to detect
/// changed and removed files on re-index (§9 stale-chunk Open Question —
/// see DESIGN.md).
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileHash {
    store_id: String,
    file_path: String,
    content_hash: String,
}

impl FileHash {
    pub fn new(store_id: String, file_path: String, content_hash: String) -> Self {
        Self {
            store_id,
            file_path,
            content_hash,
        }
    }

    pub fn store_id(&self) -> &str {
        &self.store_id
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    pub fn content_hash(&self) -> &str {
        &self.content_hash
    }
}

/// Computes SHA-256 hash of file content.
pub fn compute_file_hash(content: &str) -> String {
    use sha2::{Digest, Sha256};
    let hash = Sha256::digest(content.as_bytes());
    format!("{:x}", hash)
}
