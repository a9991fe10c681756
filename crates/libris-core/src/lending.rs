//! # Lending Rules
//!
//! The decisions behind borrow, return and fine payment.
//!
//! Nothing here touches storage. The store loads what a rule needs, hands it
//! over, and writes back whatever the rule decided. That keeps every rule
//! testable with plain values.
//!
//! ## Borrow Decision
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  check_borrow(standing, book)                                           │
//! │                                                                         │
//! │  standing.status == Suspended?      ──► Rejected("member suspended")    │
//! │  standing.has_unpaid_fines?         ──► Rejected("unpaid fines")        │
//! │  standing.active_loans >= max (3)?  ──► Rejected("borrow limit reached")│
//! │  book.available_copies < 1?         ──► Rejected("book unavailable")    │
//! │                                                                         │
//! │  otherwise OK                                                           │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Fine Decision
//! ```text
//!   due_date            returned_at
//!      │◄── overdue days = floor((returned_at - due_date) / 1 day) ──►│
//!
//!   0 whole days  ──► no fine
//!   n whole days  ──► n × daily_fine
//! ```

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::error::{CoreResult, RejectReason};
use crate::money::Money;
use crate::types::{Book, Member, MemberStatus};
use crate::{DEFAULT_DAILY_FINE_CENTS, DEFAULT_LOAN_PERIOD_DAYS, DEFAULT_MAX_ACTIVE_LOANS};

// =============================================================================
// Borrower Standing
// =============================================================================

/// What the borrow rule needs to know about a member.
///
/// Gathered by the store inside the same unit of work as the borrow itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BorrowerStanding {
    pub status: MemberStatus,
    pub has_unpaid_fines: bool,
    pub active_loans: i64,
}

impl BorrowerStanding {
    pub fn of(member: &Member, has_unpaid_fines: bool, active_loans: i64) -> Self {
        BorrowerStanding {
            status: member.status,
            has_unpaid_fines,
            active_loans,
        }
    }
}

// =============================================================================
// Lending Policy
// =============================================================================

/// Tunable lending limits.
///
/// Defaults: 14-day loans, 3 active loans per member, $0.50 per late day.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LendingPolicy {
    pub loan_period_days: i64,
    pub max_active_loans: i64,
    pub daily_fine: Money,
}

impl Default for LendingPolicy {
    fn default() -> Self {
        LendingPolicy {
            loan_period_days: DEFAULT_LOAN_PERIOD_DAYS,
            max_active_loans: DEFAULT_MAX_ACTIVE_LOANS,
            daily_fine: Money::from_cents(DEFAULT_DAILY_FINE_CENTS),
        }
    }
}

impl LendingPolicy {
    /// Decides whether `standing` may borrow a copy of `book`.
    ///
    /// Checks run in a fixed order and the first failure wins, so a
    /// suspended member with unpaid fines is told "member suspended".
    pub fn check_borrow(&self, standing: &BorrowerStanding, book: &Book) -> CoreResult<()> {
        if standing.status == MemberStatus::Suspended {
            return Err(RejectReason::MemberSuspended.into());
        }

        if standing.has_unpaid_fines {
            return Err(RejectReason::UnpaidFines.into());
        }

        if standing.active_loans >= self.max_active_loans {
            return Err(RejectReason::BorrowLimitReached.into());
        }

        if !book.is_available() {
            return Err(RejectReason::BookUnavailable.into());
        }

        Ok(())
    }

    /// Due date for a loan starting at `borrowed_at`.
    pub fn due_date(&self, borrowed_at: DateTime<Utc>) -> DateTime<Utc> {
        borrowed_at + Duration::days(self.loan_period_days)
    }

    /// Whole days between `due_date` and `returned_at`, rounded down.
    ///
    /// Zero when returned on or before the due date.
    pub fn overdue_days(&self, due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> i64 {
        if returned_at <= due_date {
            return 0;
        }

        (returned_at - due_date).num_days()
    }

    /// Fine owed for a return at `returned_at`, if any.
    ///
    /// Only strictly positive whole overdue days are charged, and only a
    /// positive amount is a fine: a zero daily rate never fines anyone.
    pub fn fine_for(&self, due_date: DateTime<Utc>, returned_at: DateTime<Utc>) -> Option<Money> {
        let days = self.overdue_days(due_date, returned_at);
        if days < 1 {
            return None;
        }

        Some(self.daily_fine.times(days)).filter(Money::is_positive)
    }
}

// =============================================================================
// Unit Tests
// =============================================================================
