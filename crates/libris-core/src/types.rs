//! # Domain Types
//!
//! Entities of the lending workflow.
//!
//! ## Type Hierarchy
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                         Domain Types                                    │
//! │                                                                         │
//! │  ┌─────────────────┐   ┌─────────────────┐   ┌─────────────────┐       │
//! │  │      Book       │   │      Loan       │   │      Fine       │       │
//! │  │  ─────────────  │   │  ─────────────  │   │  ─────────────  │       │
//! │  │  id (UUID)      │◄──│  book_id (FK)   │◄──│  loan_id (FK)   │       │
//! │  │  isbn (unique)  │   │  member_id (FK) │   │  member_id (FK) │       │
//! │  │  total_copies   │   │  due_date       │   │  amount_cents   │       │
//! │  │  available_...  │   │  returned_at    │   │  paid_at        │       │
//! │  └─────────────────┘   └────────┬────────┘   └────────┬────────┘       │
//! │                                 │                     │                 │
//! │                        ┌────────▼─────────────────────▼──┐              │
//! │                        │            Member               │              │
//! │                        │  id, email, membership_number   │              │
//! │                        └─────────────────────────────────┘              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Links between entities are plain foreign-key ids. There is no object
//! graph: anything reachable from a loan is looked up by key in the store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, RejectReason};
use crate::money::Money;

// =============================================================================
// Book
// =============================================================================

/// Shelf status of a title.
///
/// ## State Machine
/// ```text
///   Available ──(last copy borrowed)──► Borrowed
///       ▲                                   │
///       └────────(a copy returned)──────────┘
///
///   Reserved, Maintenance: never entered or left by the lending rules
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum BookStatus {
    Available,
    Borrowed,
    Reserved,
    Maintenance,
}

impl Default for BookStatus {
    fn default() -> Self {
        BookStatus::Available
    }
}

/// A catalogued title and its copy counts.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Book {
    /// Unique identifier (UUID v4).
    pub id: String,
    pub title: String,
    pub author: String,
    /// ISBN as entered (unique across the catalog).
    pub isbn: String,
    pub category: String,
    /// Number of physical copies owned. Fixed at creation.
    pub total_copies: i64,
    /// Copies currently on the shelf. Always within `0..=total_copies`.
    pub available_copies: i64,
    pub status: BookStatus,
    pub created_at: DateTime<Utc>,
}

impl Book {
    /// Checks if at least one copy is on the shelf.
    #[inline]
    pub fn is_available(&self) -> bool {
        self.available_copies > 0
    }

    /// Takes one copy off the shelf for a loan.
    ///
    /// Marks the title `Borrowed` when the last copy leaves.
    pub fn take_copy(&mut self) -> CoreResult<()> {
        if self.available_copies < 1 {
            return Err(RejectReason::BookUnavailable.into());
        }

        self.available_copies -= 1;
        if self.available_copies == 0 {
            self.status = BookStatus::Borrowed;
        }

        Ok(())
    }

    /// Puts one copy back on the shelf after a return.
    pub fn restore_copy(&mut self) -> CoreResult<()> {
        if self.available_copies >= self.total_copies {
            return Err(CoreError::CopyCountOverflow {
                book_id: self.id.clone(),
                total: self.total_copies,
            });
        }

        self.available_copies += 1;
        if self.status == BookStatus::Borrowed {
            self.status = BookStatus::Available;
        }

        Ok(())
    }
}

/// Input for cataloguing a new title.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewBook {
    pub title: String,
    pub author: String,
    pub isbn: String,
    pub category: String,
    pub total_copies: i64,
}

// =============================================================================
// Member
// =============================================================================

/// Standing of a library member.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum MemberStatus {
    Active,
    /// Suspended members may still return books and pay fines,
    /// but cannot borrow.
    Suspended,
}

impl Default for MemberStatus {
    fn default() -> Self {
        MemberStatus::Active
    }
}

/// A registered library member.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Member {
    pub id: String,
    pub name: String,
    /// Contact email (unique).
    pub email: String,
    /// Number printed on the library card (unique).
    pub membership_number: String,
    pub status: MemberStatus,
    pub created_at: DateTime<Utc>,
}

impl Member {
    #[inline]
    pub fn is_suspended(&self) -> bool {
        self.status == MemberStatus::Suspended
    }
}

/// Input for registering a new member.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NewMember {
    pub name: String,
    pub email: String,
    pub membership_number: String,
}

// =============================================================================
// Loan
// =============================================================================

/// Lifecycle of a loan.
///
/// `Active → Returned` is the only transition. Whether a loan is overdue is
/// derived from its due date at query time (see [`Loan::is_overdue`]), not
/// stored.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::Type))]
#[cfg_attr(feature = "sqlx", sqlx(rename_all = "lowercase"))]
#[serde(rename_all = "snake_case")]
pub enum LoanStatus {
    Active,
    Returned,
}

impl Default for LoanStatus {
    fn default() -> Self {
        LoanStatus::Active
    }
}

/// One copy of a book lent to one member (a lending transaction).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Loan {
    pub id: String,
    pub book_id: String,
    pub member_id: String,
    pub borrowed_at: DateTime<Utc>,
    pub due_date: DateTime<Utc>,
    pub returned_at: Option<DateTime<Utc>>,
    pub status: LoanStatus,
}

impl Loan {
    #[inline]
    pub fn is_active(&self) -> bool {
        self.status == LoanStatus::Active
    }

    /// Active and strictly past its due date at `now`.
    pub fn is_overdue(&self, now: DateTime<Utc>) -> bool {
        self.is_active() && self.due_date < now
    }

    /// Closes the loan.
    pub fn mark_returned(&mut self, now: DateTime<Utc>) -> CoreResult<()> {
        if self.status == LoanStatus::Returned {
            return Err(RejectReason::AlreadyReturned.into());
        }

        self.returned_at = Some(now);
        self.status = LoanStatus::Returned;
        Ok(())
    }
}

// =============================================================================
// Fine
// =============================================================================

/// A late-return penalty, tied to exactly one loan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "sqlx", derive(sqlx::FromRow))]
pub struct Fine {
    pub id: String,
    pub member_id: String,
    pub loan_id: String,
    /// Amount in cents (never negative).
    pub amount_cents: i64,
    pub created_at: DateTime<Utc>,
    /// `None` while unpaid.
    pub paid_at: Option<DateTime<Utc>>,
}

impl Fine {
    #[inline]
    pub fn amount(&self) -> Money {
        Money::from_cents(self.amount_cents)
    }

    #[inline]
    pub fn is_paid(&self) -> bool {
        self.paid_at.is_some()
    }

    /// Settles the fine and returns the payment confirmation.
    ///
    /// One-way: a paid fine stays paid.
    pub fn mark_paid(&mut self, now: DateTime<Utc>) -> CoreResult<FinePayment> {
        if self.is_paid() {
            return Err(RejectReason::AlreadyPaid.into());
        }

        self.paid_at = Some(now);
        Ok(FinePayment {
            fine_id: self.id.clone(),
            amount: self.amount(),
            paid_at: now,
        })
    }
}

/// Confirmation returned after a fine is paid.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FinePayment {
    pub fine_id: String,
    pub amount: Money,
    pub paid_at: DateTime<Utc>,
}

// =============================================================================
// Unit Tests
// =============================================================================
