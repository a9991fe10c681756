//! # Member Repository
//!
//! Database operations for library members.

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::{Member, MemberStatus};

pub(crate) async fn fetch_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Member>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let member = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, name, email, membership_number, status, created_at
        FROM members
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(member)
}

pub(crate) async fn fetch_by_email<'e, E>(executor: E, email: &str) -> DbResult<Option<Member>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let member = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, name, email, membership_number, status, created_at
        FROM members
        WHERE email = ?1
        "#,
    )
    .bind(email)
    .fetch_optional(executor)
    .await?;

    Ok(member)
}

pub(crate) async fn fetch_by_membership_number<'e, E>(
    executor: E,
    membership_number: &str,
) -> DbResult<Option<Member>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let member = sqlx::query_as::<_, Member>(
        r#"
        SELECT id, name, email, membership_number, status, created_at
        FROM members
        WHERE membership_number = ?1
        "#,
    )
    .bind(membership_number)
    .fetch_optional(executor)
    .await?;

    Ok(member)
}

pub(crate) async fn insert<'e, E>(executor: E, member: &Member) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %member.id, membership_number = %member.membership_number, "Inserting member");

    sqlx::query(
        r#"
        INSERT INTO members (
            id, name, email, membership_number, status, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5, ?6
        )
        "#,
    )
    .bind(&member.id)
    .bind(&member.name)
    .bind(&member.email)
    .bind(&member.membership_number)
    .bind(member.status)
    .bind(member.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

pub(crate) async fn update_status<'e, E>(
    executor: E,
    id: &str,
    status: MemberStatus,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %id, ?status, "Updating member status");

    let result = sqlx::query("UPDATE members SET status = ?2 WHERE id = ?1")
        .bind(id)
        .bind(status)
        .execute(executor)
        .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::not_found("Member", id));
    }

    Ok(())
}

/// Read access to members.
#[derive(Debug, Clone)]
pub struct MemberRepository {
    pool: SqlitePool,
}

impl MemberRepository {
    pub fn new(pool: SqlitePool) -> Self {
        MemberRepository { pool }
    }

    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Member>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Looks a member up by the number on their library card.
    pub async fn get_by_membership_number(&self, number: &str) -> DbResult<Option<Member>> {
        fetch_by_membership_number(&self.pool, number).await
    }

    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM members")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
