//! # Fine Repository
//!
//! Database operations for late-return fines.
//!
//! A fine row is written once, by the return that caused it, and updated at
//! most once more when it is paid.

use chrono::{DateTime, Utc};
use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::Fine;

pub(crate) async fn fetch_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Fine>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let fine = sqlx::query_as::<_, Fine>(
        r#"
        SELECT id, member_id, loan_id, amount_cents, created_at, paid_at
        FROM fines
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(fine)
}

/// True when the member owes at least one fine.
pub(crate) async fn has_unpaid_for_member<'e, E>(executor: E, member_id: &str) -> DbResult<bool>
where
    E: Executor<'e, Database = Sqlite>,
{
    let unpaid: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM fines WHERE member_id = ?1 AND paid_at IS NULL",
    )
    .bind(member_id)
    .fetch_one(executor)
    .await?;

    Ok(unpaid > 0)
}

pub(crate) async fn insert<'e, E>(executor: E, fine: &Fine) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(
        id = %fine.id,
        loan_id = %fine.loan_id,
        amount_cents = fine.amount_cents,
        "Inserting fine"
    );

    sqlx::query(
        r#"
        INSERT INTO fines (
            id, member_id, loan_id, amount_cents, created_at, paid_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6
        )
        "#,
    )
    .bind(&fine.id)
    .bind(&fine.member_id)
    .bind(&fine.loan_id)
    .bind(fine.amount_cents)
    .bind(fine.created_at)
    .bind(fine.paid_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Records payment. Matches only a still-unpaid row.
pub(crate) async fn mark_paid<'e, E>(executor: E, id: &str, paid_at: DateTime<Utc>) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %id, "Marking fine paid");

    let result = sqlx::query("UPDATE fines SET paid_at = ?2 WHERE id = ?1 AND paid_at IS NULL")
        .bind(id)
        .bind(paid_at)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict("Fine", id));
    }

    Ok(())
}

/// Read access to fines.
#[derive(Debug, Clone)]
pub struct FineRepository {
    pool: SqlitePool,
}

impl FineRepository {
    pub fn new(pool: SqlitePool) -> Self {
        FineRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Fine>> {
        fetch_by_id(&self.pool, id).await
    }

    /// The fine charged for a loan, if its return was late.
    pub async fn get_by_loan(&self, loan_id: &str) -> DbResult<Option<Fine>> {
        let fine = sqlx::query_as::<_, Fine>(
            r#"
            SELECT id, member_id, loan_id, amount_cents, created_at, paid_at
            FROM fines
            WHERE loan_id = ?1
            "#,
        )
        .bind(loan_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(fine)
    }

    /// All fines of a member, newest first.
    pub async fn list_for_member(&self, member_id: &str) -> DbResult<Vec<Fine>> {
        let fines = sqlx::query_as::<_, Fine>(
            r#"
            SELECT id, member_id, loan_id, amount_cents, created_at, paid_at
            FROM fines
            WHERE member_id = ?1
            ORDER BY created_at DESC, id
            "#,
        )
        .bind(member_id)
        .fetch_all(&self.pool)
        .await?;

        Ok(fines)
    }

    pub async fn has_unpaid_for_member(&self, member_id: &str) -> DbResult<bool> {
        has_unpaid_for_member(&self.pool, member_id).await
    }
}
