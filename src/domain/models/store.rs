use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// The type-specific payload of a `Store`. A tagged sum so the indexer can
/// match the variant rather than probing optional fields (§9 "Runtime
/// polymorphism over store variants").
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoreKind {
    /// On-disk directory path.
    File { path: String },
    /// Cloned git remote with optional branch, materialized as a directory.
    Repo {
        url: String,
        branch: Option<String>,
        path: String,
    },
    /// Crawl root URL with depth, materialized as crawled pages.
    Web { url: String, depth: u32 },
}

impl StoreKind {
    pub fn type_name(&self) -> &'static str {
        match self {
            StoreKind::File { .. } => "file",
            StoreKind::Repo { .. } => "repo",
            StoreKind::Web { .. } => "web",
        }
    }

    /// The directory this store's content is materialized under, when it has
    /// one. Web stores have no working tree on disk.
    pub fn root_path(&self) -> Option<&str> {
        match self {
            StoreKind::File { path } => Some(path),
            StoreKind::Repo { path, .. } => Some(path),
            StoreKind::Web { .. } => None,
        }
    }

    /// The remote url for stores that clone one, used by cascading delete to
    /// decide whether a working tree must be removed.
    pub fn remote_url(&self) -> Option<&str> {
        match self {
            StoreKind::Repo { url, .. } => Some(url.as_str()),
            StoreKind::Web { url, .. } => Some(url.as_str()),
            StoreKind::File { .. } => None,
        }
    }
}

/// Current indexing status of a store, tracked alongside the catalog record
/// so the CLI and MCP `execute` tool can answer `store:info` without
/// consulting the job log.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "snake_case")]
pub enum IndexingStatus {
    NotIndexed,
    Indexing,
    Indexed,
    Failed { reason: String },
}

impl IndexingStatus {
    pub fn is_indexed(&self) -> bool {
        matches!(self, IndexingStatus::Indexed)
    }

    pub fn is_in_progress(&self) -> bool {
        matches!(self, IndexingStatus::Indexing)
    }

    pub fn is_failed(&self) -> bool {
        matches!(self, IndexingStatus::Failed { .. })
    }
}

/// A named collection of indexable content (§3 "Store").
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Store {
    id: String,
    name: String,
    kind: StoreKind,
    status: IndexingStatus,
    created_at: i64,
    updated_at: i64,
}

impl Store {
    pub fn new(name: impl Into<String>, kind: StoreKind) -> Self {
        let now = current_timestamp();
        Self {
            id: Uuid::new_v4().to_string(),
            name: name.into(),
            kind,
            status: IndexingStatus::NotIndexed,
            created_at: now,
            updated_at: now,
        }
    }

    /// Reconstitutes from persisted data (used by the catalog adapter).
    pub fn reconstitute(
        id: String,
        name: String,
        kind: StoreKind,
        status: IndexingStatus,
        created_at: i64,
        updated_at: i64,
    ) -> Self {
        Self {
            id,
            name,
            kind,
            status,
            created_at,
            updated_at,
        }
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> &StoreKind {
        &self.kind
    }

    pub fn status(&self) -> &IndexingStatus {
        &self.status
    }

    pub fn created_at(&self) -> i64 {
        self.created_at
    }

    pub fn updated_at(&self) -> i64 {
        self.updated_at
    }

    pub fn set_status(&mut self, status: IndexingStatus) {
        self.status = status;
        self.updated_at = current_timestamp();
    }

    pub fn matches_id_or_name(&self, needle: &str) -> bool {
        self.id == needle || self.name == needle
    }

    pub fn type_name(&self) -> &'static str {
        self.kind.type_name()
    }
}

pub(crate) fn current_timestamp() -> i64 {
    std::time::SystemTime::now()
        .duration_since(std::time::UNIX_EPOCH)
        .map(|d| d.as_secs() as i64)
        .unwrap_or(0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_store_root_path() {
        let store = Store::new(
            "my-project",
            StoreKind::File {
                path: "/tmp/my-project".to_string(),
            },
        );
        assert_eq!(store.kind().root_path(), Some("/tmp/my-project"));
        assert_eq!(store.kind().remote_url(), None);
        assert_eq!(store.type_name(), "file");
    }

    #[test]
    fn repo_store_has_remote_url() {
        let store = Store::new(
            "vendored",
            StoreKind::Repo {
                url: "https://example.com/a.git".to_string(),
                branch: Some("main".to_string()),
                path: "/tmp/vendored".to_string(),
            },
        );
        assert_eq!(store.kind().remote_url(), Some("https://example.com/a.git"));
    }

    #[test]
    fn web_store_has_no_root_path() {
        let store = Store::new(
            "docs-site",
            StoreKind::Web {
                url: "https://example.com".to_string(),
                depth: 2,
            },
        );
        assert_eq!(store.kind().root_path(), None);
    }

    #[test]
    fn matches_id_or_name() {
        let store = Store::new(
            "my-project",
            StoreKind::File {
                path: "/tmp".to_string(),
            },
        );
        assert!(store.matches_id_or_name("my-project"));
        assert!(store.matches_id_or_name(store.id()));
        assert!(!store.matches_id_or_name("other"));
    }
}
