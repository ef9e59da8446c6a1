use thiserror::Error;

use intraportal_core::DomainError;

/// Storage operation error.
///
/// These are infrastructure failures as opposed to domain errors. Only
/// constraint violations carry meaning for the caller; everything else
/// surfaces as an internal error.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("store unavailable: {0}")]
    Unavailable(String),

    #[error("query failed: {0}")]
    Query(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("unique constraint violated: {0}")]
    UniqueViolation(String),

    #[error("row is still referenced: {0}")]
    ForeignKeyViolation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

impl From<StoreError> for DomainError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::UniqueViolation(what) => DomainError::validation(format!("{what} already exists")),
            StoreError::ForeignKeyViolation(what) => DomainError::conflict(format!("{what} is still in use")),
            other => {
                tracing::error!(error = %other, "store operation failed");
                DomainError::internal(other.to_string())
            }
        }
    }
}

/// Map SQLx errors to `StoreError`.
///
/// | SQLx error | Postgres code | StoreError |
/// |---|---|---|
/// | Database | `23505` | `UniqueViolation` |
/// | Database | `23503` | `ForeignKeyViolation` |
/// | Database | other | `Query` |
/// | PoolClosed / PoolTimedOut / Io | | `Unavailable` |
/// | ColumnDecode / Decode | | `Corrupt` |
pub(crate) fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    match err {
        sqlx::Error::Database(db_err) => {
            let msg = format!("{operation}: {}", db_err.message());
            match db_err.code().as_deref() {
                Some("23505") => StoreError::UniqueViolation(constraint_subject(db_err.constraint())),
                Some("23503") => StoreError::ForeignKeyViolation(constraint_subject(db_err.constraint())),
                _ => StoreError::Query(msg),
            }
        }
        sqlx::Error::PoolClosed | sqlx::Error::PoolTimedOut => {
            StoreError::Unavailable(format!("connection pool unavailable in {operation}"))
        }
        sqlx::Error::Io(e) => StoreError::Unavailable(format!("{operation}: {e}")),
        sqlx::Error::ColumnDecode { .. } | sqlx::Error::Decode(_) => {
            StoreError::Corrupt(format!("{operation}: {err}"))
        }
        other => StoreError::Query(format!("{operation}: {other}")),
    }
}

/// Human name for the constraint that fired.
fn constraint_subject(constraint: Option<&str>) -> String {
    match constraint {
        Some("users_email_key") => "email".to_string(),
        Some("departments_name_key") => "department name".to_string(),
        Some("users_department_id_fkey") => "department".to_string(),
        Some(other) => other.to_string(),
        None => "record".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn constraint_violations_keep_their_meaning() {
        let d: DomainError = StoreError::UniqueViolation("email".into()).into();
        assert!(matches!(d, DomainError::Validation(ref m) if m == "email already exists"));

        let d: DomainError = StoreError::ForeignKeyViolation("department".into()).into();
        assert!(matches!(d, DomainError::Conflict(_)));

        let d: DomainError = StoreError::Unavailable("down".into()).into();
        assert!(matches!(d, DomainError::Internal(_)));
    }

    #[test]
    fn pool_errors_are_unavailable() {
        assert!(matches!(
            map_sqlx_error("list", sqlx::Error::PoolClosed),
            StoreError::Unavailable(_)
        ));
        assert!(matches!(
            map_sqlx_error("get", sqlx::Error::RowNotFound),
            StoreError::Query(_)
        ));
    }
}
