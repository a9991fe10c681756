//! # Loan Repository
//!
//! Database operations for loans (lending transactions).
//!
//! ## Loan Lifecycle
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                       Loan Lifecycle                                    │
//! │                                                                         │
//! │  1. BORROW                                                             │
//! │     └── insert() → Loan { status: active, due_date: +14 days }         │
//! │                                                                         │
//! │  2. (QUERY TIME) OVERDUE                                               │
//! │     └── list_overdue(now) → active AND due_date < now                  │
//! │         (status is never rewritten)                                    │
//! │                                                                         │
//! │  3. RETURN                                                             │
//! │     └── mark_returned() → Loan { status: returned, returned_at }       │
//! │         terminal                                                       │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::Loan;

pub(crate) async fn fetch_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Loan>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let loan = sqlx::query_as::<_, Loan>(
        r#"
        SELECT id, book_id, member_id, borrowed_at, due_date, returned_at, status
        FROM loans
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(loan)
}

/// Number of loans the member has not returned yet.
pub(crate) async fn count_active_for_member<'e, E>(executor: E, member_id: &str) -> DbResult<i64>
where
    E: Executor<'e, Database = Sqlite>,
{
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM loans WHERE member_id = ?1 AND status = 'active'",
    )
    .bind(member_id)
    .fetch_one(executor)
    .await?;

    Ok(count)
}

pub(crate) async fn insert<'e, E>(executor: E, loan: &Loan) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %loan.id, book_id = %loan.book_id, member_id = %loan.member_id, "Inserting loan");

    sqlx::query(
        r#"
        INSERT INTO loans (
            id, book_id, member_id,
            borrowed_at, due_date, returned_at, status
        ) VALUES (
            ?1, ?2, ?3,
            ?4, ?5, ?6, ?7
        )
        "#,
    )
    .bind(&loan.id)
    .bind(&loan.book_id)
    .bind(&loan.member_id)
    .bind(loan.borrowed_at)
    .bind(loan.due_date)
    .bind(loan.returned_at)
    .bind(loan.status)
    .execute(executor)
    .await?;

    Ok(())
}

/// Persists a return. Only an active loan can be closed.
pub(crate) async fn mark_returned<'e, E>(executor: E, loan: &Loan) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    let returned_at = loan
        .returned_at
        .ok_or_else(|| DbError::Internal(format!("loan {} has no return time", loan.id)))?;

    let result = sqlx::query(
        r#"
        UPDATE loans SET
            returned_at = ?2,
            status = 'returned'
        WHERE id = ?1 AND status = 'active'
        "#,
    )
    .bind(&loan.id)
    .bind(returned_at)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict("Loan", &loan.id));
    }

    Ok(())
}

/// Read access to loans.
#[derive(Debug, Clone)]
pub struct LoanRepository {
    pool: SqlitePool,
}

impl LoanRepository {
    pub fn new(pool: SqlitePool) -> Self {
        LoanRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Loan>> {
        fetch_by_id(&self.pool, id).await
    }

    /// All loans of a member, newest first.
    pub async fn list_for_member(&self, member_id: &str) -> DbResult<Vec<Loan>> {
        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, book_id, member_id, borrowed_at, due_date, returned_at, status
            FROM loans
            WHERE member_id = ?1
            ORDER BY borrowed_at DESC, id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(loans)
    }

    pub async fn count_active_for_member(&self, member_id: &str) -> DbResult<i64> {
        count_active_for_member(&self.pool, member_id).await
    }

    /// Active loans whose due date is before `now`, oldest due first.
    pub async fn list_overdue(&self, now: DateTime<Utc>) -> DbResult<Vec<Loan>> {
        debug!(%now, "Listing overdue loans");

        let loans = sqlx::query_as::<_, Loan>(
            r#"
            SELECT id, book_id, member_id, borrowed_at, due_date, returned_at, status
            FROM loans
            WHERE status = 'active'
            ORDER BY due_date, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        // Compared in Rust: stored timestamps are text, and only chrono knows
        // they are instants.
        let mut overdue: Vec<Loan> = loans.into_iter().filter(|loan| loan.is_overdue(now)).collect();
        overdue.sort_by_key(|loan| loan.due_date);
        Ok(overdue)
    }
}
