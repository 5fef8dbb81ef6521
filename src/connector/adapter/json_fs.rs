//! Shared write-then-rename JSON persistence helpers used by the catalog,
//! job, and code-graph repositories (§6: "every on-disk record is written
//! atomically"). No teacher precedent (its own persistence is entirely
//! DuckDB-backed); grounded instead in the general write-temp-then-rename
//! idiom the rest of the corpus's file-based adapters use for durability,
//! built here once rather than duplicated per repository.

use std::path::Path;

use serde::{de::DeserializeOwned, Serialize};

use crate::domain::DomainError;

/// Serializes `value` as pretty JSON into a sibling temp file, then renames
/// it over `path`. `rename` is atomic on the same filesystem, so a reader
/// never observes a partially written file.
pub fn atomic_write_json<T: Serialize>(path: &Path, value: &T) -> Result<(), DomainError> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent).map_err(|e| DomainError::fatal(format!("failed to create directory {}: {e}", parent.display())))?;
    }
    let tmp_path = path.with_extension("json.tmp");
    let json = serde_json::to_vec_pretty(value)?;
    std::fs::write(&tmp_path, json).map_err(|e| DomainError::fatal(format!("failed to write {}: {e}", tmp_path.display())))?;
    std::fs::rename(&tmp_path, path).map_err(|e| DomainError::fatal(format!("failed to rename {} into place: {e}", path.display())))?;
    Ok(())
}

/// Reads and deserializes `path` if it exists, `None` if it doesn't.
pub fn read_json_opt<T: DeserializeOwned>(path: &Path) -> Result<Option<T>, DomainError> {
    if !path.exists() {
        return Ok(None);
    }
    let bytes = std::fs::read(path).map_err(|e| DomainError::fatal(format!("failed to read {}: {e}", path.display())))?;
    let value = serde_json::from_slice(&bytes)?;
    Ok(Some(value))
}
