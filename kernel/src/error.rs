// Error Taxonomy
//
// Every fallible kernel operation reports one of these categories.
// Callers are expected to branch on them: NotFound may be semantically
// meaningful, AlreadyExists/VersionConflict mean "retry with a new
// attempt", Corruption is fatal to the operation and never auto-repaired.

/// Kernel-wide error type.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum MetaError {
    /// The requested metadata or log object does not exist.
    ///
    /// Never retried internally: absence can be the answer.
    #[error("not found: {0}")]
    NotFound(String),

    /// An object with this key already exists and objects are immutable.
    #[error("already exists: {0}")]
    AlreadyExists(String),

    /// Another transaction won the race for this version number.
    ///
    /// The caller must retry with a freshly assigned version.
    #[error("version conflict: version {version} already assigned to txn {holder}")]
    VersionConflict { version: u64, holder: u64 },

    /// Malformed or out-of-order metadata/log state.
    #[error("corruption: {0}")]
    Corruption(String),

    /// Invalid caller-supplied parameters, detected before any I/O.
    #[error("invalid argument: {0}")]
    InvalidArgument(String),

    /// The underlying store failed in a way that is not one of the above.
    #[error("storage error: {0}")]
    Storage(String),
}

/// Convenience alias used throughout the kernel.
pub type Result<T> = std::result::Result<T, MetaError>;

impl MetaError {
    pub fn is_not_found(&self) -> bool {
        matches!(self, MetaError::NotFound(_))
    }
}
