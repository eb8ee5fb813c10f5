// Storage errors
// Decision: Callers must distinguish duplicates and outages from bugs, so these
// get their own variants instead of a bare anyhow::Error

use thiserror::Error;

pub type Result<T> = std::result::Result<T, StorageError>;

#[derive(Debug, Error)]
pub enum StorageError {
    /// A unique field (username, email, ...) is already taken
    #[error("{0} already exists")]
    Conflict(String),

    /// The store did not answer in time or the connection is gone
    #[error("storage unavailable: {0}")]
    Unavailable(String),

    #[error("storage error: {0}")]
    Internal(#[from] anyhow::Error),
}

impl StorageError {
    pub fn conflict(field: impl Into<String>) -> Self {
        StorageError::Conflict(field.into())
    }

    pub fn unavailable(msg: impl Into<String>) -> Self {
        StorageError::Unavailable(msg.into())
    }
}

impl From<sqlx::Error> for StorageError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::Database(ref db_err) if db_err.is_unique_violation() => {
                let field = db_err
                    .constraint()
                    .map(field_from_constraint)
                    .unwrap_or("record");
                StorageError::conflict(field)
            }
            sqlx::Error::PoolTimedOut | sqlx::Error::PoolClosed | sqlx::Error::Io(_) => {
                StorageError::unavailable(err.to_string())
            }
            other => StorageError::Internal(other.into()),
        }
    }
}

/// Map a Postgres unique constraint name (e.g. `accounts_email_key`) to the column it guards
fn field_from_constraint(constraint: &str) -> &str {
    if constraint.ends_with("_pkey") {
        return "record";
    }
    constraint
        .strip_suffix("_key")
        .and_then(|rest| rest.rsplit('_').next())
        .unwrap_or("record")
}
