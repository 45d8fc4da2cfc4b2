//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Keep this focused on deterministic, business/domain failures (validation,
/// lookups). Storage failures belong to the persistence layer.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// A value failed validation (blank name, negative stock, oversell).
    #[error("validation failed: {0}")]
    Validation(String),

    /// A requested entity was not found.
    #[error("not found: {0}")]
    NotFound(String),
}

impl DomainError {
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        Self::NotFound(msg.into())
    }

    /// Whether this error must stop the caller's operation.
    ///
    /// Validation failures are hard errors; a missing entity is reported but
    /// leaves the caller free to continue.
    pub fn is_hard(&self) -> bool {
        matches!(self, Self::Validation(_))
    }
}
