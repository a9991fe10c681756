//! # Repository Module
//!
//! Database repository implementations for Libris.
//!
//! ## Two Ways In
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                    Reads vs. Writes                                     │
//! │                                                                         │
//! │  Reads                                Writes                           │
//! │  ─────                                ──────                           │
//! │  db.books().list_available()          db.begin() → UnitOfWork          │
//! │       │                                    │                            │
//! │       ▼                                    ▼                            │
//! │  BookRepository (&pool)               uow.update_book_copies(..)       │
//! │       │                               uow.insert_loan(..)              │
//! │       │                               uow.commit()                     │
//! │       │                                    │                            │
//! │       └──────────┐          ┌──────────────┘                            │
//! │                  ▼          ▼                                           │
//! │         book::fetch_by_id(executor, id)   ← one SQL statement each     │
//! │                  │                                                      │
//! │                  ▼                                                      │
//! │            SQLite Database                                             │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! Repositories only read. Every write goes through a
//! [`UnitOfWork`](crate::UnitOfWork), so nothing is half-applied.
//!
//! ## Available Repositories
//!
//! - [`BookRepository`](book::BookRepository) - Catalog lookups and listings
//! - [`MemberRepository`](member::MemberRepository) - Member lookups
//! - [`LoanRepository`](loan::LoanRepository) - Loan history and overdue report
//! - [`FineRepository`](fine::FineRepository) - Fines per member and per loan

pub mod book;
pub mod fine;
pub mod loan;
pub mod member;
