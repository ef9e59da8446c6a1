//! Domain error model.

use thiserror::Error;

/// Result type used across the domain layer.
pub type DomainResult<T> = Result<T, DomainError>;

/// Domain-level error.
///
/// Every failure surfaced to a caller picks exactly one of these kinds; the
/// HTTP layer maps the kind to a status code. Infrastructure failures are
/// folded into [`DomainError::Internal`] after being logged.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DomainError {
    /// No (or an invalid) session.
    #[error("unauthenticated")]
    Unauthenticated,

    /// Authenticated, but lacking role, ownership or department match.
    #[error("forbidden: {0}")]
    Forbidden(String),

    /// The id does not resolve to a record of the expected sub-kind.
    #[error("{0} not found")]
    NotFound(String),

    /// A value failed validation (missing field, bad enum value, bad dates,
    /// duplicate unique name).
    #[error("validation failed: {0}")]
    Validation(String),

    /// An identifier was invalid (e.g. parse failure).
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// The operation conflicts with current state (e.g. department still has users).
    #[error("conflict: {0}")]
    Conflict(String),

    /// Unexpected persistence failure. The message is for logs only.
    #[error("internal error: {0}")]
    Internal(String),
}

impl DomainError {
    pub fn forbidden(msg: impl Into<String>) -> Self {
        Self::Forbidden(msg.into())
    }

    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    pub fn invalid_id(msg: impl Into<String>) -> Self {
        Self::InvalidId(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        Self::Conflict(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }

    /// Stable, machine-readable kind used in error payloads.
    pub fn kind(&self) -> &'static str {
        match self {
            DomainError::Unauthenticated => "unauthenticated",
            DomainError::Forbidden(_) => "forbidden",
            DomainError::NotFound(_) => "not_found",
            DomainError::Validation(_) => "validation_error",
            DomainError::InvalidId(_) => "invalid_id",
            DomainError::Conflict(_) => "conflict",
            DomainError::Internal(_) => "internal_error",
        }
    }
}

/// Turn a policy decision into a `Forbidden` error.
pub fn ensure(allowed: bool, msg: impl Into<String>) -> DomainResult<()> {
    if allowed {
        Ok(())
    } else {
        Err(DomainError::Forbidden(msg.into()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ensure_maps_false_to_forbidden() {
        assert!(ensure(true, "nope").is_ok());
        assert_eq!(
            ensure(false, "cannot edit").unwrap_err(),
            DomainError::Forbidden("cannot edit".to_string())
        );
    }

    #[test]
    fn kinds_are_stable() {
        assert_eq!(DomainError::not_found("post").kind(), "not_found");
        assert_eq!(DomainError::not_found("post").to_string(), "post not found");
        assert_eq!(DomainError::conflict("x").kind(), "conflict");
    }
}
