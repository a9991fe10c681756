//! # Unit of Work
//!
//! One database transaction spanning every read and write of a single
//! lending operation.
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │  let mut uow = db.begin().await?;                                       │
//! │                                                                         │
//! │  uow.book(id)            ─┐                                             │
//! │  uow.member(id)           │  reads see the transaction's own writes     │
//! │  uow.update_book_copies   │                                             │
//! │  uow.insert_loan         ─┘                                             │
//! │                                                                         │
//! │  uow.commit().await?     → all of it lands                              │
//! │  drop(uow) / early `?`   → rolled back, nothing lands                   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Dropping a `UnitOfWork` without calling [`UnitOfWork::commit`] rolls the
//! transaction back.

use chrono::{DateTime, Utc};
use sqlx::{Sqlite, SqlitePool, Transaction};
use tracing::debug;

use crate::error::{DbError, DbResult};
use crate::repository::{book, fine, loan, member};
use libris_core::{Book, Fine, Loan, Member, MemberStatus};

pub struct UnitOfWork {
    tx: Transaction<'static, Sqlite>,
}

impl UnitOfWork {
    /// Opens a transaction on a pooled connection.
    pub async fn begin(pool: &SqlitePool) -> DbResult<Self> {
        let tx = pool
            .begin()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work started");
        Ok(UnitOfWork { tx })
    }

    // -------------------------------------------------------------------------
    // Reads
    // -------------------------------------------------------------------------

    pub async fn book(&mut self, id: &str) -> DbResult<Option<Book>> {
        book::fetch_by_id(&mut *self.tx, id).await
    }

    pub async fn book_by_isbn(&mut self, isbn: &str) -> DbResult<Option<Book>> {
        book::fetch_by_isbn(&mut *self.tx, isbn).await
    }

    pub async fn member(&mut self, id: &str) -> DbResult<Option<Member>> {
        member::fetch_by_id(&mut *self.tx, id).await
    }

    pub async fn member_by_email(&mut self, email: &str) -> DbResult<Option<Member>> {
        member::fetch_by_email(&mut *self.tx, email).await
    }

    pub async fn member_by_membership_number(&mut self, number: &str) -> DbResult<Option<Member>> {
        member::fetch_by_membership_number(&mut *self.tx, number).await
    }

    pub async fn loan(&mut self, id: &str) -> DbResult<Option<Loan>> {
        loan::fetch_by_id(&mut *self.tx, id).await
    }

    pub async fn fine(&mut self, id: &str) -> DbResult<Option<Fine>> {
        fine::fetch_by_id(&mut *self.tx, id).await
    }

    pub async fn count_active_loans(&mut self, member_id: &str) -> DbResult<i64> {
        loan::count_active_for_member(&mut *self.tx, member_id).await
    }

    pub async fn has_unpaid_fines(&mut self, member_id: &str) -> DbResult<bool> {
        fine::has_unpaid_for_member(&mut *self.tx, member_id).await
    }

    // -------------------------------------------------------------------------
    // Writes
    // -------------------------------------------------------------------------

    pub async fn insert_book(&mut self, book: &Book) -> DbResult<()> {
        book::insert(&mut *self.tx, book).await
    }

    /// Fails with [`DbError::Conflict`] if the stored available count is no
    /// longer `expected_available`.
    pub async fn update_book_copies(&mut self, book: &Book, expected_available: i64) -> DbResult<()> {
        book::update_copies(&mut *self.tx, book, expected_available).await
    }

    pub async fn insert_member(&mut self, member: &Member) -> DbResult<()> {
        member::insert(&mut *self.tx, member).await
    }

    pub async fn update_member_status(&mut self, id: &str, status: MemberStatus) -> DbResult<()> {
        member::update_status(&mut *self.tx, id, status).await
    }

    pub async fn insert_loan(&mut self, loan: &Loan) -> DbResult<()> {
        loan::insert(&mut *self.tx, loan).await
    }

    pub async fn mark_loan_returned(&mut self, loan: &Loan) -> DbResult<()> {
        loan::mark_returned(&mut *self.tx, loan).await
    }

    pub async fn insert_fine(&mut self, fine: &Fine) -> DbResult<()> {
        fine::insert(&mut *self.tx, fine).await
    }

    pub async fn mark_fine_paid(&mut self, id: &str, paid_at: DateTime<Utc>) -> DbResult<()> {
        fine::mark_paid(&mut *self.tx, id, paid_at).await
    }

    /// Makes every write of this unit visible at once.
    pub async fn commit(self) -> DbResult<()> {
        self.tx
            .commit()
            .await
            .map_err(|e| DbError::TransactionFailed(e.to_string()))?;

        debug!("Unit of work committed");
        Ok(())
    }
}

impl std::fmt::Debug for UnitOfWork {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("UnitOfWork").finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Database, DbConfig};
    use libris_core::BookStatus;

    fn sample_book(id: &str, isbn: &str) -> Book {
        Book {
            id: id.to_string(),
            title: "The Left Hand of Darkness".to_string(),
            author: "Ursula K. Le Guin".to_string(),
            isbn: isbn.to_string(),
            category: "Science Fiction".to_string(),
            total_copies: 2,
            available_copies: 2,
            status: BookStatus::Available,
            created_at: Utc::now(),
        }
    }

    #[tokio::test]
    async fn test_commit_makes_writes_visible() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        uow.insert_book(&sample_book("b-1", "9780441478125")).await.unwrap();
        uow.commit().await.unwrap();

        let stored = db.books().get_by_id("b-1").await.unwrap();
        assert!(stored.is_some());
    }

    #[tokio::test]
    async fn test_drop_without_commit_rolls_back() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        {
            let mut uow = db.begin().await.unwrap();
            uow.insert_book(&sample_book("b-1", "9780441478125")).await.unwrap();
            // Visible inside the unit
            assert!(uow.book("b-1").await.unwrap().is_some());
        }

        assert!(db.books().get_by_id("b-1").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_guarded_copy_update_detects_stale_read() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        uow.insert_book(&sample_book("b-1", "9780441478125")).await.unwrap();

        let mut book = uow.book("b-1").await.unwrap().unwrap();
        book.take_copy().unwrap();

        // Stored count is 2, pretend we read 1
        let err = uow.update_book_copies(&book, 1).await.unwrap_err();
        assert!(matches!(err, DbError::Conflict { .. }));

        uow.update_book_copies(&book, 2).await.unwrap();
        uow.commit().await.unwrap();

        let stored = db.books().get_by_id("b-1").await.unwrap().unwrap();
        assert_eq!(stored.available_copies, 1);
    }

    #[tokio::test]
    async fn test_schema_rejects_copy_count_above_total() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        uow.insert_book(&sample_book("b-1", "9780441478125")).await.unwrap();

        let mut book = uow.book("b-1").await.unwrap().unwrap();
        book.available_copies = 3;
        let err = uow.update_book_copies(&book, 2).await.unwrap_err();
        assert!(matches!(err, DbError::CheckViolation { .. }));
    }

    #[tokio::test]
    async fn test_duplicate_isbn_is_unique_violation() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();

        let mut uow = db.begin().await.unwrap();
        uow.insert_book(&sample_book("b-1", "9780441478125")).await.unwrap();
        let err = uow
            .insert_book(&sample_book("b-2", "9780441478125"))
            .await
            .unwrap_err();
        assert!(matches!(err, DbError::UniqueViolation { .. }));
    }
}
