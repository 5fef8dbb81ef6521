use thiserror::Error;

/// The four stable error kinds of the retrieval pipeline (see §7 of the
/// design doc): validation, not-found, transient I/O, and fatal. Every
/// fallible operation in `domain` and `application` returns one of these;
/// adapters translate their own error types (DuckDB, I/O, JSON) into the
/// appropriate variant at the boundary.
#[derive(Debug, Error)]
pub enum DomainError {
    /// Malformed arguments, a zero-length query, an unknown store name.
    /// Surfaced to the caller verbatim; never retried.
    #[error("validation error: {0}")]
    InvalidInput(String),

    /// A store, job, or result id that does not exist.
    #[error("not found: {0}")]
    NotFound(String),

    /// A record with the given identity already exists.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// A single file unreadable, a single embedding call failed. Logged and
    /// skipped by the caller; the run continues unless the skip fraction
    /// crosses the diagnostic threshold.
    #[error("transient I/O error: {0}")]
    TransientIo(String),

    /// Vector-store corruption, disk full, worker crash. The store is left
    /// in its prior state if at all possible; recoverable only by re-index.
    #[error("fatal error: {0}")]
    Fatal(String),

    #[error("I/O error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    pub fn already_exists(msg: impl Into<String>) -> Self {
        Self::AlreadyExists(msg.into())
    }

    pub fn transient_io(msg: impl Into<String>) -> Self {
        Self::TransientIo(msg.into())
    }

    pub fn fatal(msg: impl Into<String>) -> Self {
        Self::Fatal(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    pub fn is_not_found(&self) -> bool {
        matches!(self, Self::NotFound(_))
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Self::AlreadyExists(_))
    }

    pub fn is_validation(&self) -> bool {
        matches!(self, Self::InvalidInput(_))
    }

    /// Errors a caller may reasonably skip-and-continue over.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::TransientIo(_) | Self::IoError(_))
    }

    /// Errors that should abort an in-progress job or run entirely.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Fatal(_) | Self::Internal(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn predicates_match_constructors() {
        assert!(DomainError::not_found("store x").is_not_found());
        assert!(DomainError::already_exists("store x").is_already_exists());
        assert!(DomainError::invalid_input("bad query").is_validation());
        assert!(DomainError::transient_io("read failed").is_transient());
        assert!(DomainError::fatal("disk full").is_fatal());
    }

    #[test]
    fn display_includes_message() {
        let err = DomainError::not_found("job-123");
        assert!(err.to_string().contains("job-123"));
    }
}
