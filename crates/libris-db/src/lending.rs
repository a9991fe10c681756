//! # Lending Engine
//!
//! Borrow, return and fine payment, each applied as one unit of work.
//!
//! ## Operation Shape
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    borrow(book_id, member_id)                           │
//! │                                                                         │
//! │  now = clock.now()                                                      │
//! │  uow = db.begin()                                                       │
//! │    │                                                                    │
//! │    ├── load book, member           → NotFound(Book) / NotFound(Member)  │
//! │    ├── load fines + active loans                                        │
//! │    ├── policy.check_borrow(..)     → Rejected(reason)                   │
//! │    ├── book.take_copy()                                                 │
//! │    ├── insert loan                                                      │
//! │    └── guarded copy update         → Store(Conflict) if raced           │
//! │  uow.commit()                                                           │
//! │                                                                         │
//! │  Any early return drops `uow` → rollback, nothing written.              │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Rule decisions live in `libris_core`; this module only loads what they
//! need and persists what they change.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::error::{LendingError, LendingResult};
use crate::pool::Database;
use libris_core::validation::{normalize_isbn, validate_new_book, validate_new_member};
use libris_core::{
    Book, BookStatus, BorrowerStanding, Clock, EntityKind, Fine, FinePayment, LendingPolicy, Loan,
    LoanStatus, Member, MemberStatus, NewBook, NewMember, SystemClock, ValidationError,
};

/// Page size for [`LendingEngine::list_books`] when none is given.
pub const DEFAULT_PAGE_SIZE: u32 = 100;

/// Applies the lending rules against the store.
///
/// Cheap to clone and safe to share across tasks.
///
/// ## Usage
/// ```rust,ignore
/// let engine = db.lending();
///
/// let loan = engine.borrow(&book.id, &member.id).await?;
/// let loan = engine.return_book(&loan.id).await?;
/// ```
#[derive(Clone)]
pub struct LendingEngine {
    db: Database,
    policy: LendingPolicy,
    clock: Arc<dyn Clock>,
}

impl std::fmt::Debug for LendingEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("LendingEngine")
            .field("db", &self.db)
            .field("policy", &self.policy)
            .finish_non_exhaustive()
    }
}

impl LendingEngine {
    pub fn new(db: Database) -> Self {
        LendingEngine {
            db,
            policy: LendingPolicy::default(),
            clock: Arc::new(SystemClock),
        }
    }

    pub fn with_policy(mut self, policy: LendingPolicy) -> Self {
        self.policy = policy;
        self
    }

    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    pub fn policy(&self) -> &LendingPolicy {
        &self.policy
    }

    pub fn database(&self) -> &Database {
        &self.db
    }

    // =========================================================================
    // Catalog and Membership
    // =========================================================================

    /// Catalogs a new title with all copies on the shelf.
    ///
    /// A second title with the same ISBN is a validation error.
    pub async fn create_book(&self, new: NewBook) -> LendingResult<Book> {
        self.create_book_inner(new)
            .await
            .inspect_err(|err| log_failure("create_book", err))
    }

    async fn create_book_inner(&self, new: NewBook) -> LendingResult<Book> {
        validate_new_book(&new)?;

        let now = self.clock.now();
        let mut uow = self.db.begin().await?;

        let isbn = normalize_isbn(&new.isbn);
        if uow.book_by_isbn(&isbn).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "isbn".to_string(),
                value: isbn,
            }
            .into());
        }

        let book = Book {
            id: Uuid::new_v4().to_string(),
            title: new.title.trim().to_string(),
            author: new.author.trim().to_string(),
            isbn,
            category: new.category.trim().to_string(),
            total_copies: new.total_copies,
            available_copies: new.total_copies,
            status: BookStatus::Available,
            created_at: now,
        };

        uow.insert_book(&book).await?;
        uow.commit().await?;

        info!(book_id = %book.id, isbn = %book.isbn, copies = book.total_copies, "Book created");
        Ok(book)
    }

    /// Registers a new active member.
    ///
    /// Email and membership number must both be unused.
    pub async fn create_member(&self, new: NewMember) -> LendingResult<Member> {
        self.create_member_inner(new)
            .await
            .inspect_err(|err| log_failure("create_member", err))
    }

    async fn create_member_inner(&self, new: NewMember) -> LendingResult<Member> {
        validate_new_member(&new)?;

        let now = self.clock.now();
        let mut uow = self.db.begin().await?;

        let email = new.email.trim().to_string();
        if uow.member_by_email(&email).await?.is_some() {
            return Err(ValidationError::Duplicate {
                field: "email".to_string(),
                value: email,
            }
            .into());
        }

        let membership_number = new.membership_number.trim().to_string();
        if uow
            .member_by_membership_number(&membership_number)
            .await?
            .is_some()
        {
            return Err(ValidationError::Duplicate {
                field: "membership_number".to_string(),
                value: membership_number,
            }
            .into());
        }

        let member = Member {
            id: Uuid::new_v4().to_string(),
            name: new.name.trim().to_string(),
            email,
            membership_number,
            status: MemberStatus::Active,
            created_at: now,
        };

        uow.insert_member(&member).await?;
        uow.commit().await?;

        info!(member_id = %member.id, membership_number = %member.membership_number, "Member registered");
        Ok(member)
    }

    /// Suspends or reinstates a member.
    pub async fn set_member_status(
        &self,
        member_id: &str,
        status: MemberStatus,
    ) -> LendingResult<Member> {
        self.set_member_status_inner(member_id, status)
            .await
            .inspect_err(|err| log_failure("set_member_status", err))
    }

    async fn set_member_status_inner(
        &self,
        member_id: &str,
        status: MemberStatus,
    ) -> LendingResult<Member> {
        let mut uow = self.db.begin().await?;

        let mut member = uow
            .member(member_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Member, member_id))?;

        if member.status == status {
            return Ok(member);
        }

        uow.update_member_status(&member.id, status).await?;
        uow.commit().await?;

        info!(member_id = %member.id, from = ?member.status, to = ?status, "Member status changed");
        member.status = status;
        Ok(member)
    }

    // =========================================================================
    // Lending
    // =========================================================================

    /// Lends one copy of a book to a member.
    ///
    /// ## Checks (first failure wins)
    /// 1. Book exists
    /// 2. Member exists
    /// 3. Member is not suspended
    /// 4. Member has no unpaid fine
    /// 5. Member is below the active loan limit
    /// 6. A copy is on the shelf
    pub async fn borrow(&self, book_id: &str, member_id: &str) -> LendingResult<Loan> {
        self.borrow_inner(book_id, member_id)
            .await
            .inspect_err(|err| log_failure("borrow", err))
    }

    async fn borrow_inner(&self, book_id: &str, member_id: &str) -> LendingResult<Loan> {
        let now = self.clock.now();
        let mut uow = self.db.begin().await?;

        let mut book = uow
            .book(book_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Book, book_id))?;

        let member = uow
            .member(member_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Member, member_id))?;

        let has_unpaid_fines = uow.has_unpaid_fines(&member.id).await?;
        let active_loans = uow.count_active_loans(&member.id).await?;
        let standing = BorrowerStanding::of(&member, has_unpaid_fines, active_loans);

        self.policy.check_borrow(&standing, &book)?;

        let copies_read = book.available_copies;
        book.take_copy()?;

        let loan = Loan {
            id: Uuid::new_v4().to_string(),
            book_id: book.id.clone(),
            member_id: member.id.clone(),
            borrowed_at: now,
            due_date: self.policy.due_date(now),
            returned_at: None,
            status: LoanStatus::Active,
        };

        uow.update_book_copies(&book, copies_read).await?;
        uow.insert_loan(&loan).await?;
        uow.commit().await?;

        info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            member_id = %loan.member_id,
            due_date = %loan.due_date,
            available = book.available_copies,
            "Book borrowed"
        );
        Ok(loan)
    }

    /// Closes a loan, puts the copy back and charges a fine if it is late.
    ///
    /// Only whole days past the due date are charged; a return less than a
    /// day late is free.
    pub async fn return_book(&self, loan_id: &str) -> LendingResult<Loan> {
        self.return_book_inner(loan_id)
            .await
            .inspect_err(|err| log_failure("return_book", err))
    }

    async fn return_book_inner(&self, loan_id: &str) -> LendingResult<Loan> {
        let now = self.clock.now();
        let mut uow = self.db.begin().await?;

        let mut loan = uow
            .loan(loan_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Transaction, loan_id))?;

        loan.mark_returned(now)?;

        let mut book = uow
            .book(&loan.book_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Book, &loan.book_id))?;

        let copies_read = book.available_copies;
        book.restore_copy()?;

        let fine = self.policy.fine_for(loan.due_date, now).map(|amount| Fine {
            id: Uuid::new_v4().to_string(),
            member_id: loan.member_id.clone(),
            loan_id: loan.id.clone(),
            amount_cents: amount.cents(),
            created_at: now,
            paid_at: None,
        });

        uow.mark_loan_returned(&loan).await?;
        uow.update_book_copies(&book, copies_read).await?;
        if let Some(fine) = &fine {
            uow.insert_fine(fine).await?;
        }
        uow.commit().await?;

        info!(
            loan_id = %loan.id,
            book_id = %loan.book_id,
            available = book.available_copies,
            "Book returned"
        );
        if let Some(fine) = &fine {
            info!(
                fine_id = %fine.id,
                member_id = %fine.member_id,
                amount = %fine.amount(),
                "Late return fined"
            );
        }

        Ok(loan)
    }

    /// Settles a fine in full.
    pub async fn pay_fine(&self, fine_id: &str) -> LendingResult<FinePayment> {
        self.pay_fine_inner(fine_id)
            .await
            .inspect_err(|err| log_failure("pay_fine", err))
    }

    async fn pay_fine_inner(&self, fine_id: &str) -> LendingResult<FinePayment> {
        let now = self.clock.now();
        let mut uow = self.db.begin().await?;

        let mut fine = uow
            .fine(fine_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Fine, fine_id))?;

        let payment = fine.mark_paid(now)?;

        uow.mark_fine_paid(&fine.id, now).await?;
        uow.commit().await?;

        info!(fine_id = %payment.fine_id, amount = %payment.amount, "Fine paid");
        Ok(payment)
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Titles with at least one copy on the shelf, by title.
    pub async fn list_available_books(&self) -> LendingResult<Vec<Book>> {
        Ok(self.db.books().list_available().await?)
    }

    /// Active loans past their due date as of now, oldest due first.
    pub async fn list_overdue_loans(&self) -> LendingResult<Vec<Loan>> {
        self.overdue_loans_at(self.clock.now()).await
    }

    /// Active loans past their due date as of `now`.
    pub async fn overdue_loans_at(&self, now: DateTime<Utc>) -> LendingResult<Vec<Loan>> {
        Ok(self.db.loans().list_overdue(now).await?)
    }

    pub async fn get_book(&self, book_id: &str) -> LendingResult<Book> {
        self.db
            .books()
            .get_by_id(book_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Book, book_id))
    }

    /// A page of the catalog by title. `limit` defaults to
    /// [`DEFAULT_PAGE_SIZE`].
    pub async fn list_books(&self, offset: u32, limit: Option<u32>) -> LendingResult<Vec<Book>> {
        let limit = limit.unwrap_or(DEFAULT_PAGE_SIZE);
        Ok(self.db.books().list(offset, limit).await?)
    }

    pub async fn get_member(&self, member_id: &str) -> LendingResult<Member> {
        self.db
            .members()
            .get_by_id(member_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Member, member_id))
    }

    pub async fn get_loan(&self, loan_id: &str) -> LendingResult<Loan> {
        self.db
            .loans()
            .get_by_id(loan_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Transaction, loan_id))
    }

    /// Every loan of a member, newest first.
    pub async fn list_member_loans(&self, member_id: &str) -> LendingResult<Vec<Loan>> {
        let member = self.get_member(member_id).await?;
        Ok(self.db.loans().list_for_member(&member.id).await?)
    }

    pub async fn get_fine(&self, fine_id: &str) -> LendingResult<Fine> {
        self.db
            .fines()
            .get_by_id(fine_id)
            .await?
            .ok_or_else(|| LendingError::not_found(EntityKind::Fine, fine_id))
    }

    /// Every fine of a member, newest first.
    pub async fn list_member_fines(&self, member_id: &str) -> LendingResult<Vec<Fine>> {
        let member = self.get_member(member_id).await?;
        Ok(self.db.fines().list_for_member(&member.id).await?)
    }
}

fn log_failure(operation: &'static str, err: &LendingError) {
    if err.is_store() {
        error!(operation, error = %err, "Lending operation failed");
    } else {
        warn!(operation, code = ?err.code(), reason = %err, "Lending operation refused");
    }
}

// =============================================================================
// Unit Tests
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DbConfig, ErrorCode};
    use chrono::{Duration, TimeZone};
    use libris_core::{ManualClock, Money, RejectReason};

    fn start() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2026, 3, 2, 10, 0, 0).unwrap()
    }

    async fn setup() -> (LendingEngine, Arc<ManualClock>) {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let clock = Arc::new(ManualClock::new(start()));
        let engine = db.lending().with_clock(clock.clone());
        (engine, clock)
    }

    fn new_book(title: &str, isbn: &str, copies: i64) -> NewBook {
        NewBook {
            title: title.to_string(),
            author: "Various".to_string(),
            isbn: isbn.to_string(),
            category: "Fiction".to_string(),
            total_copies: copies,
        }
    }

    fn new_member(n: u32) -> NewMember {
        NewMember {
            name: format!("Member {n}"),
            email: format!("member{n}@example.org"),
            membership_number: format!("LIB-{n:04}"),
        }
    }

    async fn book(engine: &LendingEngine, title: &str, isbn: &str, copies: i64) -> Book {
        engine.create_book(new_book(title, isbn, copies)).await.unwrap()
    }

    async fn member(engine: &LendingEngine, n: u32) -> Member {
        engine.create_member(new_member(n)).await.unwrap()
    }

    fn rejection(err: LendingError) -> RejectReason {
        err.reject_reason()
            .unwrap_or_else(|| panic!("expected a rejection, got {err:?}"))
    }

    /// One member holding one unpaid 3-day fine.
    async fn fined_member(engine: &LendingEngine, clock: &ManualClock) -> (Member, Fine) {
        let dune = book(engine, "Dune", "9780441013593", 1).await;
        let ada = member(engine, 1).await;

        let loan = engine.borrow(&dune.id, &ada.id).await.unwrap();
        clock.set(loan.due_date + Duration::days(3));
        engine.return_book(&loan.id).await.unwrap();

        let fine = engine
            .database()
            .fines()
            .get_by_loan(&loan.id)
            .await
            .unwrap()
            .unwrap();
        (ada, fine)
    }

    // -------------------------------------------------------------------------
    // Borrow
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_borrow_takes_one_copy_and_sets_due_date() {
        let (engine, _clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 2).await;
        let ada = member(&engine, 1).await;

        let loan = engine.borrow(&dune.id, &ada.id).await.unwrap();

        assert_eq!(loan.status, LoanStatus::Active);
        assert_eq!(loan.borrowed_at, start());
        assert_eq!(loan.due_date, start() + Duration::days(14));
        assert!(loan.returned_at.is_none());

        let dune = engine.get_book(&dune.id).await.unwrap();
        assert_eq!(dune.available_copies, 1);
        assert_eq!(dune.status, BookStatus::Available);

        let stored = engine.get_loan(&loan.id).await.unwrap();
        assert_eq!(stored, loan);
    }

    #[tokio::test]
    async fn test_last_copy_marks_book_borrowed_then_unavailable() {
        let (engine, _clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 1).await;
        let ada = member(&engine, 1).await;
        let bob = member(&engine, 2).await;

        engine.borrow(&dune.id, &ada.id).await.unwrap();

        let shelf = engine.get_book(&dune.id).await.unwrap();
        assert_eq!(shelf.available_copies, 0);
        assert_eq!(shelf.status, BookStatus::Borrowed);

        let err = engine.borrow(&dune.id, &bob.id).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::Rejected);
        assert_eq!(err.to_string(), "book unavailable");

        // Nothing written for the refused borrow
        assert!(engine.list_member_loans(&bob.id).await.unwrap().is_empty());
        assert_eq!(engine.get_book(&dune.id).await.unwrap().available_copies, 0);
    }

    #[tokio::test]
    async fn test_borrow_limit_is_three_active_loans() {
        let (engine, _clock) = setup().await;
        let ada = member(&engine, 1).await;
        let isbns = ["9780000000001", "9780000000002", "9780000000003", "9780000000004"];

        let mut books = Vec::new();
        for (i, isbn) in isbns.iter().enumerate() {
            books.push(book(&engine, &format!("Title {i}"), isbn, 1).await);
        }

        for book in &books[..3] {
            engine.borrow(&book.id, &ada.id).await.unwrap();
        }

        let err = engine.borrow(&books[3].id, &ada.id).await.unwrap_err();
        assert_eq!(rejection(err), RejectReason::BorrowLimitReached);
        assert_eq!(engine.get_book(&books[3].id).await.unwrap().available_copies, 1);

        // Returning one frees a slot
        let loans = engine.list_member_loans(&ada.id).await.unwrap();
        engine.return_book(&loans[0].id).await.unwrap();
        engine.borrow(&books[3].id, &ada.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_custom_policy_limit() {
        let db = Database::new(DbConfig::in_memory()).await.unwrap();
        let engine = db.lending_with_policy(LendingPolicy {
            max_active_loans: 1,
            ..LendingPolicy::default()
        });
        let dune = book(&engine, "Dune", "9780441013593", 5).await;
        let ada = member(&engine, 1).await;

        engine.borrow(&dune.id, &ada.id).await.unwrap();
        let err = engine.borrow(&dune.id, &ada.id).await.unwrap_err();
        assert_eq!(rejection(err), RejectReason::BorrowLimitReached);
    }

    #[tokio::test]
    async fn test_suspended_member_cannot_borrow() {
        let (engine, _clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 1).await;
        let ada = member(&engine, 1).await;

        let suspended = engine
            .set_member_status(&ada.id, MemberStatus::Suspended)
            .await
            .unwrap();
        assert!(suspended.is_suspended());

        let err = engine.borrow(&dune.id, &ada.id).await.unwrap_err();
        assert_eq!(err.to_string(), "member suspended");
        assert_eq!(engine.get_book(&dune.id).await.unwrap().available_copies, 1);

        engine
            .set_member_status(&ada.id, MemberStatus::Active)
            .await
            .unwrap();
        engine.borrow(&dune.id, &ada.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_unpaid_fine_blocks_borrow_until_paid() {
        let (engine, clock) = setup().await;
        let (ada, fine) = fined_member(&engine, &clock).await;
        let emma = book(&engine, "Emma", "9780141439587", 1).await;

        let err = engine.borrow(&emma.id, &ada.id).await.unwrap_err();
        assert_eq!(err.to_string(), "unpaid fines");

        engine.pay_fine(&fine.id).await.unwrap();
        engine.borrow(&emma.id, &ada.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_suspension_is_reported_before_unpaid_fines() {
        let (engine, clock) = setup().await;
        let (ada, _fine) = fined_member(&engine, &clock).await;
        let emma = book(&engine, "Emma", "9780141439587", 1).await;

        engine
            .set_member_status(&ada.id, MemberStatus::Suspended)
            .await
            .unwrap();

        let err = engine.borrow(&emma.id, &ada.id).await.unwrap_err();
        assert_eq!(rejection(err), RejectReason::MemberSuspended);
    }

    #[tokio::test]
    async fn test_borrow_unknown_ids() {
        let (engine, _clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 1).await;
        let ada = member(&engine, 1).await;

        let err = engine.borrow("missing-book", &ada.id).await.unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Book));

        let err = engine.borrow(&dune.id, "missing-member").await.unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Member));

        // Book is checked first
        let err = engine.borrow("missing-book", "missing-member").await.unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Book));
        assert_eq!(err.code(), ErrorCode::NotFound);
    }

    // -------------------------------------------------------------------------
    // Return
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_on_time_return_restores_copy_without_fine() {
        let (engine, clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 1).await;
        let ada = member(&engine, 1).await;

        let loan = engine.borrow(&dune.id, &ada.id).await.unwrap();
        clock.advance(Duration::days(5));

        let returned = engine.return_book(&loan.id).await.unwrap();
        assert_eq!(returned.status, LoanStatus::Returned);
        assert_eq!(returned.returned_at, Some(start() + Duration::days(5)));

        let dune = engine.get_book(&dune.id).await.unwrap();
        assert_eq!(dune.available_copies, 1);
        assert_eq!(dune.status, BookStatus::Available);

        assert!(engine.list_member_fines(&ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_return_three_days_late_charges_150_cents() {
        let (engine, clock) = setup().await;
        let (ada, fine) = fined_member(&engine, &clock).await;

        assert_eq!(fine.amount(), Money::from_cents(150));
        assert_eq!(fine.member_id, ada.id);
        assert!(!fine.is_paid());

        let fines = engine.list_member_fines(&ada.id).await.unwrap();
        assert_eq!(fines, vec![fine]);
    }

    #[tokio::test]
    async fn test_return_exactly_at_due_date_is_free() {
        let (engine, clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 1).await;
        let ada = member(&engine, 1).await;

        let loan = engine.borrow(&dune.id, &ada.id).await.unwrap();
        clock.set(loan.due_date);
        engine.return_book(&loan.id).await.unwrap();

        assert!(engine.list_member_fines(&ada.id).await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_partial_days_are_not_charged() {
        let (engine, clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 2).await;
        let ada = member(&engine, 1).await;
        let bob = member(&engine, 2).await;

        // 23 hours late: free
        let loan = engine.borrow(&dune.id, &ada.id).await.unwrap();
        clock.set(loan.due_date + Duration::hours(23));
        engine.return_book(&loan.id).await.unwrap();
        assert!(engine.list_member_fines(&ada.id).await.unwrap().is_empty());

        // 2 days 23 hours late: two days charged
        let loan = engine.borrow(&dune.id, &bob.id).await.unwrap();
        clock.set(loan.due_date + Duration::days(2) + Duration::hours(23));
        engine.return_book(&loan.id).await.unwrap();

        let fines = engine.list_member_fines(&bob.id).await.unwrap();
        assert_eq!(fines.len(), 1);
        assert_eq!(fines[0].amount_cents, 100);
    }

    #[tokio::test]
    async fn test_second_return_is_rejected_without_changes() {
        let (engine, clock) = setup().await;
        let dune = book(&engine, "Dune", "9780441013593", 2).await;
        let ada = member(&engine, 1).await;

        let loan = engine.borrow(&dune.id, &ada.id).await.unwrap();
        clock.set(loan.due_date + Duration::days(1));
        let first = engine.return_book(&loan.id).await.unwrap();

        clock.advance(Duration::days(10));
        let err = engine.return_book(&loan.id).await.unwrap_err();
        assert_eq!(err.to_string(), "already returned");

        assert_eq!(engine.get_loan(&loan.id).await.unwrap(), first);
        assert_eq!(engine.get_book(&dune.id).await.unwrap().available_copies, 2);
        assert_eq!(engine.list_member_fines(&ada.id).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_return_unknown_loan() {
        let (engine, _clock) = setup().await;

        let err = engine.return_book("missing-loan").await.unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Transaction));
        assert_eq!(err.to_string(), "Transaction not found: missing-loan");
    }

    // -------------------------------------------------------------------------
    // Fines
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_pay_fine_once() {
        let (engine, clock) = setup().await;
        let (_ada, fine) = fined_member(&engine, &clock).await;

        clock.advance(Duration::hours(2));
        let paid_at = clock.now();

        let payment = engine.pay_fine(&fine.id).await.unwrap();
        assert_eq!(payment.fine_id, fine.id);
        assert_eq!(payment.amount, Money::from_cents(150));
        assert_eq!(payment.paid_at, paid_at);

        clock.advance(Duration::days(1));
        let err = engine.pay_fine(&fine.id).await.unwrap_err();
        assert_eq!(rejection(err), RejectReason::AlreadyPaid);

        let stored = engine.get_fine(&fine.id).await.unwrap();
        assert_eq!(stored.paid_at, Some(paid_at));
    }

    #[tokio::test]
    async fn test_pay_unknown_fine() {
        let (engine, _clock) = setup().await;

        let err = engine.pay_fine("missing-fine").await.unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Fine));
    }

    // -------------------------------------------------------------------------
    // Queries
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_available_books_ordered_and_stable() {
        let (engine, _clock) = setup().await;
        let ada = member(&engine, 1).await;
        let persuasion = book(&engine, "Persuasion", "9780141439686", 1).await;
        book(&engine, "Emma", "9780141439587", 2).await;
        book(&engine, "Dune", "9780441013593", 1).await;

        engine.borrow(&persuasion.id, &ada.id).await.unwrap();

        let first = engine.list_available_books().await.unwrap();
        let titles: Vec<&str> = first.iter().map(|b| b.title.as_str()).collect();
        assert_eq!(titles, vec!["Dune", "Emma"]);

        let second = engine.list_available_books().await.unwrap();
        assert_eq!(first, second);
    }

    #[tokio::test]
    async fn test_overdue_loans_are_derived_not_stored() {
        let (engine, clock) = setup().await;
        let ada = member(&engine, 1).await;
        let bob = member(&engine, 2).await;
        let dune = book(&engine, "Dune", "9780441013593", 3).await;

        let early = engine.borrow(&dune.id, &ada.id).await.unwrap();
        clock.advance(Duration::days(2));
        let later = engine.borrow(&dune.id, &bob.id).await.unwrap();
        clock.advance(Duration::days(1));
        let returned = engine.borrow(&dune.id, &bob.id).await.unwrap();

        // Not yet due
        assert!(engine.list_overdue_loans().await.unwrap().is_empty());

        engine.return_book(&returned.id).await.unwrap();
        clock.set(later.due_date + Duration::days(1));

        let overdue = engine.list_overdue_loans().await.unwrap();
        let ids: Vec<&str> = overdue.iter().map(|l| l.id.as_str()).collect();
        assert_eq!(ids, vec![early.id.as_str(), later.id.as_str()]);
        assert!(overdue.iter().all(|l| l.status == LoanStatus::Active));

        // Querying never rewrites status
        let stored = engine.get_loan(&early.id).await.unwrap();
        assert_eq!(stored.status, LoanStatus::Active);

        // Only strictly past the due date
        let at_due = engine.overdue_loans_at(early.due_date).await.unwrap();
        assert!(at_due.is_empty());
    }

    #[tokio::test]
    async fn test_list_books_pages_by_title() {
        let (engine, _clock) = setup().await;
        book(&engine, "C", "9780000000003", 1).await;
        book(&engine, "A", "9780000000001", 1).await;
        book(&engine, "B", "9780000000002", 1).await;

        let all = engine.list_books(0, None).await.unwrap();
        assert_eq!(all.len(), 3);

        let page = engine.list_books(1, Some(1)).await.unwrap();
        assert_eq!(page.len(), 1);
        assert_eq!(page[0].title, "B");
    }

    #[tokio::test]
    async fn test_member_listings_require_member() {
        let (engine, _clock) = setup().await;

        let err = engine.list_member_loans("nobody").await.unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Member));

        let err = engine.list_member_fines("nobody").await.unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Member));

        let err = engine
            .set_member_status("nobody", MemberStatus::Suspended)
            .await
            .unwrap_err();
        assert_eq!(err.missing_entity(), Some(EntityKind::Member));
    }

    // -------------------------------------------------------------------------
    // Creation
    // -------------------------------------------------------------------------

    #[tokio::test]
    async fn test_create_book_puts_every_copy_on_shelf() {
        let (engine, _clock) = setup().await;

        let dune = engine
            .create_book(new_book("  Dune ", "978-0-441-01359-3", 4))
            .await
            .unwrap();

        assert_eq!(dune.title, "Dune");
        assert_eq!(dune.isbn, "9780441013593");
        assert_eq!(dune.total_copies, 4);
        assert_eq!(dune.available_copies, 4);
        assert_eq!(dune.status, BookStatus::Available);
        assert_eq!(dune.created_at, start());
        assert_eq!(engine.get_book(&dune.id).await.unwrap(), dune);
    }

    #[tokio::test]
    async fn test_create_book_rejects_bad_input() {
        let (engine, _clock) = setup().await;
        book(&engine, "Dune", "9780441013593", 1).await;

        let err = engine
            .create_book(new_book("Dune Messiah", "9780441013593", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(err.to_string().contains("isbn"));

        let err = engine
            .create_book(new_book("Untitled", "12345", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = engine
            .create_book(new_book("Untitled", "9780000000009", 0))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        assert_eq!(engine.list_books(0, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_isbn_spellings_are_one_title() {
        let (engine, _clock) = setup().await;
        book(&engine, "Dune", "978-0-441-01359-3", 1).await;

        let err = engine
            .create_book(new_book("Dune", "9780441013593", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        let err = engine
            .create_book(new_book("Dune", "978 0441 013593", 1))
            .await
            .unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);

        assert_eq!(engine.list_books(0, None).await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_zero_daily_rate_never_blocks_borrowing() {
        let (engine, clock) = setup().await;
        let engine = engine.with_policy(LendingPolicy {
            daily_fine: Money::zero(),
            ..LendingPolicy::default()
        });
        let dune = book(&engine, "Dune", "9780441013593", 1).await;
        let ada = member(&engine, 1).await;

        let loan = engine.borrow(&dune.id, &ada.id).await.unwrap();
        clock.set(loan.due_date + Duration::days(3));
        engine.return_book(&loan.id).await.unwrap();

        assert!(engine.list_member_fines(&ada.id).await.unwrap().is_empty());
        engine.borrow(&dune.id, &ada.id).await.unwrap();
    }

    #[tokio::test]
    async fn test_create_member_rejects_duplicates() {
        let (engine, _clock) = setup().await;
        let ada = member(&engine, 1).await;
        assert_eq!(ada.status, MemberStatus::Active);

        let mut same_email = new_member(2);
        same_email.email = ada.email.clone();
        let err = engine.create_member(same_email).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
        assert!(err.to_string().contains("email"));

        let mut same_number = new_member(3);
        same_number.membership_number = ada.membership_number.clone();
        let err = engine.create_member(same_number).await.unwrap_err();
        assert!(err.to_string().contains("membership_number"));

        let mut bad_email = new_member(4);
        bad_email.email = "not-an-email".to_string();
        let err = engine.create_member(bad_email).await.unwrap_err();
        assert_eq!(err.code(), ErrorCode::ValidationError);
    }

    // -------------------------------------------------------------------------
    // Concurrency
    // -------------------------------------------------------------------------

    #[test]
    fn test_engine_is_shareable() {
        fn assert_send_sync<T: Send + Sync + Clone + 'static>() {}
        assert_send_sync::<LendingEngine>();
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn test_racing_borrows_of_last_copy() {
        let path = std::env::temp_dir().join(format!("libris-race-{}.db", Uuid::new_v4()));
        let db = Database::new(DbConfig::new(&path)).await.unwrap();
        let engine = db.lending();

        let dune = book(&engine, "Dune", "9780441013593", 1).await;
        let mut members = Vec::new();
        for n in 1..=4 {
            members.push(member(&engine, n).await);
        }

        let handles: Vec<_> = members
            .iter()
            .map(|m| {
                let engine = engine.clone();
                let book_id = dune.id.clone();
                let member_id = m.id.clone();
                tokio::spawn(async move { engine.borrow(&book_id, &member_id).await })
            })
            .collect();

        let mut successes = 0;
        for handle in handles {
            if handle.await.unwrap().is_ok() {
                successes += 1;
            }
        }

        assert_eq!(successes, 1);
        let dune = engine.get_book(&dune.id).await.unwrap();
        assert_eq!(dune.available_copies, 0);

        db.close().await;
        for suffix in ["", "-wal", "-shm"] {
            let _ = std::fs::remove_file(format!("{}{}", path.display(), suffix));
        }
    }
}
