//! # Database and Engine Error Types
//!
//! ## Error Flow
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Error Propagation                                    │
//! │                                                                         │
//! │  SQLite Error (sqlx::Error)                                            │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  DbError ← Adds context and categorization                             │
//! │       │                                                                 │
//! │       ├──────────────────────┐                                          │
//! │       ▼                      ▼                                          │
//! │  LendingError::Store    LendingError::Core ◄── CoreError (rules)        │
//! │       │                      │                                          │
//! │       ▼                      ▼                                          │
//! │   "STORE_ERROR"     "NOT_FOUND" / "REJECTED" / "VALIDATION_ERROR"       │
//! │                                                                         │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! A caller can always tell a refused operation (business outcome) from a
//! failed one (infrastructure) with [`LendingError::is_business`].

use libris_core::{CoreError, EntityKind, RejectReason, ValidationError};
use serde::Serialize;
use thiserror::Error;

// =============================================================================
// Database Error
// =============================================================================

/// Database operation errors.
#[derive(Debug, Error)]
pub enum DbError {
    /// A row expected by an update was not there.
    #[error("{entity} not found: {id}")]
    NotFound { entity: String, id: String },

    /// Unique constraint violation.
    ///
    /// ## When This Occurs
    /// - Duplicate ISBN, email or membership number slipping past the
    ///   pre-insert check
    /// - A second fine for the same loan
    #[error("Duplicate {field}: '{value}' already exists")]
    UniqueViolation { field: String, value: String },

    /// Foreign key constraint violation.
    #[error("Foreign key violation: {message}")]
    ForeignKeyViolation { message: String },

    /// CHECK constraint violation (e.g., available copies out of range).
    #[error("Check constraint violation: {message}")]
    CheckViolation { message: String },

    /// A guarded update found the row changed since it was read.
    ///
    /// ## When This Occurs
    /// Two writers raced for the same book copy count or the same fine.
    #[error("Concurrent update of {entity} {id}")]
    Conflict { entity: String, id: String },

    #[error("Connection failed: {0}")]
    ConnectionFailed(String),

    #[error("Migration failed: {0}")]
    MigrationFailed(String),

    #[error("Query failed: {0}")]
    QueryFailed(String),

    #[error("Transaction failed: {0}")]
    TransactionFailed(String),

    /// Pool exhausted (all connections in use).
    #[error("Connection pool exhausted")]
    PoolExhausted,

    #[error("Internal database error: {0}")]
    Internal(String),
}

impl DbError {
    /// Creates a NotFound error for a given entity type and ID.
    pub fn not_found(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::NotFound {
            entity: entity.into(),
            id: id.into(),
        }
    }

    /// Creates a Conflict error for a guarded update that matched no row.
    pub fn conflict(entity: impl Into<String>, id: impl Into<String>) -> Self {
        DbError::Conflict {
            entity: entity.into(),
            id: id.into(),
        }
    }
}

/// Convert sqlx errors to DbError.
///
/// ## Error Mapping
/// ```text
/// sqlx::Error::RowNotFound    → DbError::NotFound
/// sqlx::Error::Database       → Analyze message for constraint type
/// sqlx::Error::PoolTimedOut   → DbError::PoolExhausted
/// Other                       → DbError::Internal
/// ```
impl From<sqlx::Error> for DbError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => DbError::NotFound {
                entity: "Record".to_string(),
                id: "unknown".to_string(),
            },

            sqlx::Error::Database(db_err) => {
                let msg = db_err.message();

                // SQLite constraint messages:
                //   "UNIQUE constraint failed: <table>.<column>"
                //   "FOREIGN KEY constraint failed"
                //   "CHECK constraint failed: <expr>"
                if msg.contains("UNIQUE constraint failed") {
                    let field = msg
                        .split("UNIQUE constraint failed: ")
                        .nth(1)
                        .unwrap_or("unknown")
                        .to_string();
                    DbError::UniqueViolation {
                        field,
                        value: "unknown".to_string(),
                    }
                } else if msg.contains("FOREIGN KEY constraint failed") {
                    DbError::ForeignKeyViolation {
                        message: msg.to_string(),
                    }
                } else if msg.contains("CHECK constraint failed") {
                    DbError::CheckViolation {
                        message: msg.to_string(),
                    }
                } else {
                    DbError::QueryFailed(msg.to_string())
                }
            }

            sqlx::Error::PoolTimedOut => DbError::PoolExhausted,

            sqlx::Error::PoolClosed => DbError::ConnectionFailed("Pool is closed".to_string()),

            _ => DbError::Internal(err.to_string()),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for DbError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        DbError::MigrationFailed(err.to_string())
    }
}

/// Result type for database operations.
pub type DbResult<T> = Result<T, DbError>;

// =============================================================================
// Lending Error
// =============================================================================

/// Machine-readable class of a [`LendingError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    /// Referenced id does not resolve (404)
    NotFound,
    /// A lending rule refused the operation (409/422)
    Rejected,
    /// Input validation failed (400)
    ValidationError,
    /// Store failure (500)
    StoreError,
}

/// Error returned by every [`crate::LendingEngine`] operation.
#[derive(Debug, Error)]
pub enum LendingError {
    /// Business outcome: not found, rejected, or invalid input.
    #[error(transparent)]
    Core(#[from] CoreError),

    /// Infrastructure failure. Nothing was committed.
    #[error("Store failure: {0}")]
    Store(#[from] DbError),
}

impl LendingError {
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        LendingError::Core(CoreError::not_found(entity, id))
    }

    /// True for rule outcomes the caller should show as-is.
    pub fn is_business(&self) -> bool {
        matches!(self, LendingError::Core(_))
    }

    /// True for infrastructure failures.
    pub fn is_store(&self) -> bool {
        matches!(self, LendingError::Store(_))
    }

    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            LendingError::Core(err) => err.reject_reason(),
            LendingError::Store(_) => None,
        }
    }

    /// The entity kind for a NotFound outcome.
    pub fn missing_entity(&self) -> Option<EntityKind> {
        match self {
            LendingError::Core(CoreError::NotFound { entity, .. }) => Some(*entity),
            _ => None,
        }
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            LendingError::Core(CoreError::NotFound { .. }) => ErrorCode::NotFound,
            LendingError::Core(CoreError::Rejected(_)) => ErrorCode::Rejected,
            LendingError::Core(CoreError::Validation(_)) => ErrorCode::ValidationError,
            // Stored copy counts out of range: the store is inconsistent
            LendingError::Core(CoreError::CopyCountOverflow { .. }) => ErrorCode::StoreError,
            LendingError::Store(_) => ErrorCode::StoreError,
        }
    }
}

impl From<RejectReason> for LendingError {
    fn from(reason: RejectReason) -> Self {
        LendingError::Core(CoreError::Rejected(reason))
    }
}

impl From<ValidationError> for LendingError {
    fn from(err: ValidationError) -> Self {
        LendingError::Core(CoreError::Validation(err))
    }
}

/// Result type for lending engine operations.
pub type LendingResult<T> = Result<T, LendingError>;
