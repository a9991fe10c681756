//! # libris-core: Pure Lending Rules for Libris
//!
//! This crate is the **heart** of Libris. It decides whether a borrow,
//! return or fine payment is allowed and what it changes, as pure functions
//! with zero I/O dependencies.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Architecture                              │
//! │                                                                         │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                 API surface (external collaborator)             │   │
//! │  │    POST /transactions/borrow, POST /fines/{id}/pay, ...         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │                                        │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │                libris-db (LendingEngine + store)                │   │
//! │  │      opens a unit of work, loads entities, commits once         │   │
//! │  └─────────────────────────────┬───────────────────────────────────┘   │
//! │                                │ asks                                   │
//! │  ┌─────────────────────────────▼───────────────────────────────────┐   │
//! │  │               ★ libris-core (THIS CRATE) ★                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────┐  ┌───────────┐  ┌───────────┐  ┌───────────┐  │   │
//! │  │   │   types   │  │   money   │  │  lending  │  │ validation│  │   │
//! │  │   │   Book    │  │   Money   │  │  policy   │  │   isbn    │  │   │
//! │  │   │   Loan    │  │  (cents)  │  │   fines   │  │   email   │  │   │
//! │  │   └───────────┘  └───────────┘  └───────────┘  └───────────┘  │   │
//! │  │                                                                 │   │
//! │  │   NO I/O • NO DATABASE • NO NETWORK • PURE FUNCTIONS           │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Modules
//!
//! - [`types`] - Entities (Book, Member, Loan, Fine) and their status enums
//! - [`money`] - Money type with integer arithmetic (no floating point!)
//! - [`lending`] - Borrow/return/payment rules and fine computation
//! - [`clock`] - Source of "now" so rules can be tested at any instant
//! - [`error`] - Domain error types
//! - [`validation`] - Input validation for catalog and membership data
//!
//! ## Example Usage
//!
//! ```rust
//! use chrono::{Duration, TimeZone, Utc};
//! use libris_core::lending::LendingPolicy;
//!
//! let policy = LendingPolicy::default();
//! let due = Utc.with_ymd_and_hms(2026, 3, 1, 12, 0, 0).unwrap();
//!
//! // Three whole days late at $0.50 per day
//! let fine = policy.fine_for(due, due + Duration::days(3)).unwrap();
//! assert_eq!(fine.cents(), 150);
//!
//! // Returned exactly on the due date: no fine
//! assert!(policy.fine_for(due, due).is_none());
//! ```

pub mod clock;
pub mod error;
pub mod lending;
pub mod money;
pub mod types;
pub mod validation;

pub use clock::{Clock, ManualClock, SystemClock};
pub use error::{CoreError, CoreResult, EntityKind, RejectReason, ValidationError};
pub use lending::{BorrowerStanding, LendingPolicy};
pub use money::Money;
pub use types::*;

/// Days between borrowing a book and its due date.
pub const DEFAULT_LOAN_PERIOD_DAYS: i64 = 14;

/// Maximum number of active loans a member may hold at once.
pub const DEFAULT_MAX_ACTIVE_LOANS: i64 = 3;

/// Fine charged per whole day a book is returned late, in cents.
pub const DEFAULT_DAILY_FINE_CENTS: i64 = 50;

/// Upper bound on copies registered for a single title.
pub const MAX_COPIES_PER_TITLE: i64 = 10_000;
