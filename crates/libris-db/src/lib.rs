//! # libris-db: Entity Store and Lending Engine for Libris
//!
//! This crate persists books, members, loans and fines in SQLite (via sqlx)
//! and runs the lending operations against them, one transaction each.
//!
//! ## Architecture Position
//! ```text
//! ┌─────────────────────────────────────────────────────────────────────────┐
//! │                        Libris Data Flow                                 │
//! │                                                                         │
//! │  API handler (borrow / return / pay fine)                              │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     libris-db (THIS CRATE)                      │   │
//! │  │                                                                 │   │
//! │  │   ┌───────────────┐    ┌───────────────┐    ┌──────────────┐  │   │
//! │  │   │ LendingEngine │───►│  UnitOfWork   │    │  Migrations  │  │   │
//! │  │   │ (lending.rs)  │    │ (one tx/op)   │    │  (embedded)  │  │   │
//! │  │   └───────┬───────┘    └───────┬───────┘    └──────────────┘  │   │
//! │  │           │ reads              │ writes                        │   │
//! │  │   ┌───────▼───────┐    ┌───────▼───────┐                      │   │
//! │  │   │ Repositories  │───►│   Database    │                      │   │
//! │  │   │ books, loans  │    │   (pool.rs)   │                      │   │
//! │  │   └───────────────┘    └───────────────┘                      │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! │       │                                                                 │
//! │       ▼                                                                 │
//! │  ┌─────────────────────────────────────────────────────────────────┐   │
//! │  │                     SQLite Database                             │   │
//! │  └─────────────────────────────────────────────────────────────────┘   │
//! └─────────────────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Module Organization
//!
//! - [`pool`] - Connection pool creation and configuration
//! - [`migrations`] - Embedded database migrations
//! - [`error`] - Store and engine error types
//! - [`repository`] - Read access per entity
//! - [`unit_of_work`] - Transaction spanning one operation
//! - [`lending`] - The lending engine
//! - [`config`] - Environment-driven configuration
//!
//! ## Usage
//!
//! ```rust,ignore
//! use libris_db::{Database, DbConfig};
//!
//! let db = Database::new(DbConfig::new("path/to/libris.db")).await?;
//! let engine = db.lending();
//!
//! let loan = engine.borrow(&book_id, &member_id).await?;
//! let overdue = engine.list_overdue_loans().await?;
//! ```

// =============================================================================
// Module Declarations
// =============================================================================

pub mod config;
pub mod error;
pub mod lending;
pub mod migrations;
pub mod pool;
pub mod repository;
pub mod unit_of_work;

// =============================================================================
// Re-exports
// =============================================================================

pub use config::{ConfigError, LibraryConfig};
pub use error::{DbError, DbResult, ErrorCode, LendingError, LendingResult};
pub use lending::{LendingEngine, DEFAULT_PAGE_SIZE};
pub use pool::{Database, DbConfig};
pub use unit_of_work::UnitOfWork;

// Repository re-exports for convenience
pub use repository::book::BookRepository;
pub use repository::fine::FineRepository;
pub use repository::loan::LoanRepository;
pub use repository::member::MemberRepository;
