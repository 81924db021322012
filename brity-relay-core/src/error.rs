//! Unified error type definition

use serde::Serialize;
use thiserror::Error;

/// Core layer error type
#[derive(Error, Debug, Serialize, PartialEq, Eq)]
#[serde(tag = "code", content = "details")]
pub enum CoreError {
    /// Candidate record is missing fields or carries a malformed payload
    #[error("Validation error: {0}")]
    Validation(String),

    /// Another record already uses this account ID
    #[error("Duplicate account ID: {0}")]
    DuplicateId(String),

    /// Account not found
    #[error("Account not found: {0}")]
    NotFound(String),

    /// The storage lock could not be acquired in time
    #[error("Account store is busy (waited {waited_ms} ms for the lock)")]
    StoreBusy { waited_ms: u64 },

    /// Writing, flushing or replacing the storage file failed
    #[error("Persistence error: {0}")]
    Persistence(String),

    /// The storage file exists but cannot be parsed as an account set
    #[error("Corrupt account storage: {0}")]
    Corrupt(String),
}

impl CoreError {
    /// Whether it is expected behavior (caller input, missing resource, contention).
    ///
    /// Level `warn` should be used when returning `true` and level `error` when returning `false`.
    /// **Please update this method when new variants are added.**
    #[must_use]
    pub fn is_expected(&self) -> bool {
        match self {
            Self::Validation(_)
            | Self::DuplicateId(_)
            | Self::NotFound(_)
            | Self::StoreBusy { .. } => true,
            Self::Persistence(_) | Self::Corrupt(_) => false,
        }
    }

    /// Only lock contention is worth retrying; everything else fails the same way again.
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StoreBusy { .. })
    }

    pub(crate) fn missing_field() -> Self {
        Self::Validation("missing required field".to_string())
    }

    pub(crate) fn malformed(field: &str) -> Self {
        Self::Validation(format!("malformed {field} payload"))
    }
}

/// Core layer Result type alias
pub type CoreResult<T> = std::result::Result<T, CoreError>;
