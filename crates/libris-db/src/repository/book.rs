//! # Book Repository
//!
//! Database operations for catalogued titles.
//!
//! ## Copy Count Updates
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────┐
//! │                    Guarded Copy Count Update                        │
//! │                                                                     │
//! │  read:   available_copies = 1                                       │
//! │  rules:  take_copy() → available_copies = 0, status = borrowed      │
//! │  write:  UPDATE books SET available_copies = 0, status = 'borrowed' │
//! │          WHERE id = ? AND available_copies = 1   ← value we read    │
//! │                                                                     │
//! │  0 rows affected → someone else moved a copy → Conflict, rollback   │
//! └─────────────────────────────────────────────────────────────────────┘
//! ```

use sqlx::{Executor, Sqlite, SqlitePool};
use tracing::debug;

use crate::error::{DbError, DbResult};
use libris_core::Book;

// =============================================================================
// Queries
// =============================================================================
// Free functions take any executor so the same SQL runs against the pool
// (repository reads) or inside a unit of work.

pub(crate) async fn fetch_by_id<'e, E>(executor: E, id: &str) -> DbResult<Option<Book>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let book = sqlx::query_as::<_, Book>(
        r#"
        SELECT
            id, title, author, isbn, category,
            total_copies, available_copies, status, created_at
        FROM books
        WHERE id = ?1
        "#,
    )
    .bind(id)
    .fetch_optional(executor)
    .await?;

    Ok(book)
}

pub(crate) async fn fetch_by_isbn<'e, E>(executor: E, isbn: &str) -> DbResult<Option<Book>>
where
    E: Executor<'e, Database = Sqlite>,
{
    let book = sqlx::query_as::<_, Book>(
        r#"
        SELECT
            id, title, author, isbn, category,
            total_copies, available_copies, status, created_at
        FROM books
        WHERE isbn = ?1
        "#,
    )
    .bind(isbn)
    .fetch_optional(executor)
    .await?;

    Ok(book)
}

pub(crate) async fn insert<'e, E>(executor: E, book: &Book) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(id = %book.id, isbn = %book.isbn, "Inserting book");

    sqlx::query(
        r#"
        INSERT INTO books (
            id, title, author, isbn, category,
            total_copies, available_copies, status, created_at
        ) VALUES (
            ?1, ?2, ?3, ?4, ?5,
            ?6, ?7, ?8, ?9
        )
        "#,
    )
    .bind(&book.id)
    .bind(&book.title)
    .bind(&book.author)
    .bind(&book.isbn)
    .bind(&book.category)
    .bind(book.total_copies)
    .bind(book.available_copies)
    .bind(book.status)
    .bind(book.created_at)
    .execute(executor)
    .await?;

    Ok(())
}

/// Writes new copy count and status, provided the stored count still equals
/// `expected_available`.
pub(crate) async fn update_copies<'e, E>(
    executor: E,
    book: &Book,
    expected_available: i64,
) -> DbResult<()>
where
    E: Executor<'e, Database = Sqlite>,
{
    debug!(
        id = %book.id,
        from = expected_available,
        to = book.available_copies,
        "Updating available copies"
    );

    let result = sqlx::query(
        r#"
        UPDATE books SET
            available_copies = ?2,
            status = ?3
        WHERE id = ?1 AND available_copies = ?4
        "#,
    )
    .bind(&book.id)
    .bind(book.available_copies)
    .bind(book.status)
    .bind(expected_available)
    .execute(executor)
    .await?;

    if result.rows_affected() == 0 {
        return Err(DbError::conflict("Book", &book.id));
    }

    Ok(())
}

// =============================================================================
// Repository
// =============================================================================

/// Read access to the catalog.
///
/// ## Usage
/// ```rust,ignore
/// let repo = db.books();
/// let shelf = repo.list_available().await?;
/// ```
#[derive(Debug, Clone)]
pub struct BookRepository {
    pool: SqlitePool,
}

impl BookRepository {
    pub fn new(pool: SqlitePool) -> Self {
        BookRepository { pool }
    }

    /// Gets a book by its ID.
    ///
    /// ## Returns
    /// * `Ok(Some(Book))` - Book found
    /// * `Ok(None)` - Book not found
    pub async fn get_by_id(&self, id: &str) -> DbResult<Option<Book>> {
        fetch_by_id(&self.pool, id).await
    }

    /// Lists the catalog a page at a time, ordered by title.
    pub async fn list(&self, offset: u32, limit: u32) -> DbResult<Vec<Book>> {
        debug!(offset, limit, "Listing books");

        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT
                id, title, author, isbn, category,
                total_copies, available_copies, status, created_at
            FROM books
            ORDER BY title, id
            LIMIT ?1 OFFSET ?2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(books)
    }

    /// Lists every title with at least one copy on the shelf.
    ///
    /// Ordered by title then id, so repeated calls without mutation return
    /// identical results.
    pub async fn list_available(&self) -> DbResult<Vec<Book>> {
        let books = sqlx::query_as::<_, Book>(
            r#"
            SELECT
                id, title, author, isbn, category,
                total_copies, available_copies, status, created_at
            FROM books
            WHERE available_copies > 0
            ORDER BY title, id
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        debug!(count = books.len(), "Available books listed");
        Ok(books)
    }

    /// Counts catalogued titles (for diagnostics).
    pub async fn count(&self) -> DbResult<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM books")
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }
}
