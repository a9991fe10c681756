//! # Error Types
//!
//! Domain-specific error types for libris-core.
//!
//! ## Error Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Error Types                                     │
//! │                                                                         │
//! │  libris-core errors (this file)                                        │
//! │  ├── CoreError        - Lending rule outcomes                          │
//! │  │   ├── NotFound     - referenced id does not resolve                 │
//! │  │   └── Rejected     - a business rule failed (RejectReason)          │
//! │  └── ValidationError  - Input validation failures                      │
//! │                                                                         │
//! │  libris-db errors (separate crate)                                     │
//! │  ├── DbError          - Store failures (never a business rejection)    │
//! │  └── LendingError     - CoreError | DbError, what callers see          │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rejections carry a [`RejectReason`] whose [`RejectReason::as_str`] text is
//! stable, so an API surface can pass it through verbatim.

use std::fmt;

use serde::{Deserialize, Serialize};
use thiserror::Error;

// =============================================================================
// Entity Kind
// =============================================================================

/// The kind of entity a lookup failed for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    Book,
    Member,
    /// A lending transaction (see [`crate::types::Loan`]).
    Transaction,
    Fine,
}

impl EntityKind {
    pub const fn as_str(&self) -> &'static str {
        match self {
            EntityKind::Book => "Book",
            EntityKind::Member => "Member",
            EntityKind::Transaction => "Transaction",
            EntityKind::Fine => "Fine",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Reject Reason
// =============================================================================

/// Why a lending operation was refused.
///
/// ## Borrow Checks (first failure wins)
/// ```text
/// Book exists? ──► Member exists? ──► MemberSuspended? ──► UnpaidFines?
///                                                               │
///                          BookUnavailable? ◄── BorrowLimitReached?
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RejectReason {
    MemberSuspended,
    UnpaidFines,
    BorrowLimitReached,
    BookUnavailable,
    AlreadyReturned,
    AlreadyPaid,
}

impl RejectReason {
    /// Stable, human-readable reason text.
    pub const fn as_str(&self) -> &'static str {
        match self {
            RejectReason::MemberSuspended => "member suspended",
            RejectReason::UnpaidFines => "unpaid fines",
            RejectReason::BorrowLimitReached => "borrow limit reached",
            RejectReason::BookUnavailable => "book unavailable",
            RejectReason::AlreadyReturned => "already returned",
            RejectReason::AlreadyPaid => "already paid",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =============================================================================
// Core Error
// =============================================================================

/// Core business logic errors.
///
/// Every variant is terminal for the call that produced it: nothing is
/// retried and nothing was written.
#[derive(Debug, Error)]
pub enum CoreError {
    /// A referenced id does not resolve.
    #[error("{entity} not found: {id}")]
    NotFound { entity: EntityKind, id: String },

    /// A business rule refused the operation.
    ///
    /// ## User Workflow
    /// ```text
    /// Borrow("dune", "ada")
    ///      │
    ///      ▼
    /// ada has 3 active loans
    ///      │
    ///      ▼
    /// Rejected(BorrowLimitReached)
    ///      │
    ///      ▼
    /// API shows: "borrow limit reached"
    /// ```
    #[error("{0}")]
    Rejected(RejectReason),

    /// Returning a copy would push available copies above the total.
    ///
    /// Only reachable when stored data already violates the copy invariant.
    #[error("Book {book_id} already has all {total} copies on the shelf")]
    CopyCountOverflow { book_id: String, total: i64 },

    /// Validation error (wraps ValidationError).
    #[error("Validation error: {0}")]
    Validation(#[from] ValidationError),
}

impl CoreError {
    /// Creates a NotFound error for a given entity kind and id.
    pub fn not_found(entity: EntityKind, id: impl Into<String>) -> Self {
        CoreError::NotFound {
            entity,
            id: id.into(),
        }
    }

    /// Returns the rejection reason, if this is a rule rejection.
    pub fn reject_reason(&self) -> Option<RejectReason> {
        match self {
            CoreError::Rejected(reason) => Some(*reason),
            _ => None,
        }
    }
}

impl From<RejectReason> for CoreError {
    fn from(reason: RejectReason) -> Self {
        CoreError::Rejected(reason)
    }
}

// =============================================================================
// Validation Error
// =============================================================================

/// Input validation errors.
///
/// These errors occur when catalog or membership input doesn't meet
/// requirements. Checked before any entity is written.
#[derive(Debug, Error)]
pub enum ValidationError {
    /// A required field is missing or empty.
    #[error("{field} is required")]
    Required { field: String },

    /// Field value is too long.
    #[error("{field} must be at most {max} characters")]
    TooLong { field: String, max: usize },

    /// Numeric value is out of range.
    #[error("{field} must be between {min} and {max}")]
    OutOfRange { field: String, min: i64, max: i64 },

    /// Invalid format (e.g., invalid ISBN, invalid email).
    #[error("{field} has invalid format: {reason}")]
    InvalidFormat { field: String, reason: String },

    /// Duplicate value (e.g., duplicate ISBN).
    #[error("{field} '{value}' already exists")]
    Duplicate { field: String, value: String },
}

/// Convenience type alias for Results with CoreError.
pub type CoreResult<T> = Result<T, CoreError>;

// =============================================================================
// Unit Tests
// =============================================================================
